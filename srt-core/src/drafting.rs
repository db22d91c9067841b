//! Templated acceptance criteria and NFR drafts keyed off a requirement title

use crate::models::{Nfr, Requirement};

/// Three acceptance criteria interpolating `title`
pub fn acceptance_criteria_for(title: &str) -> Vec<String> {
    vec![
        format!(
            "Given a valid account when initiating \"{}\" then the system validates prerequisites",
            title
        ),
        format!("When processing \"{}\" then record audit events", title),
        "Then notify the account owner of the outcome".to_string(),
    ]
}

/// Drafts acceptance criteria for a requirement
pub fn draft_acceptance_criteria(req: &Requirement) -> Vec<String> {
    acceptance_criteria_for(&req.title)
}

/// Drafts the standard availability, latency and security NFRs
pub fn draft_nfrs(_req: &Requirement) -> Vec<Nfr> {
    standard_nfrs()
}

pub fn standard_nfrs() -> Vec<Nfr> {
    vec![
        Nfr::new("availability", "99.9%", Some("CSR-facing workflow")),
        Nfr::new("latency", "P95<500ms", Some("UI response during flow")),
        Nfr::new("security", "PII redaction", Some("Mask sensitive fields in logs")),
    ]
}
