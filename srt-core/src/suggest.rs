//! Rule-based suggestions for impacted applications and typed dependencies.
//!
//! Both rules read small fixed tables and tag every suggestion with the
//! spreadsheet row it came from. They are heuristics: a match means
//! "worth reviewing", not "correct".

use log::debug;
use std::collections::HashSet;

use crate::models::{AppDependency, EdgeType, ImpactedApplication, Provenance};

/// Keyword (matched as a lower-case substring) to the applications it implicates
pub const APP_RULES: &[(&str, &[&str])] = &[
    ("billing", &["BillingSvc", "PaymentsSvc"]),
    (
        "line",
        &["ProvisioningSvc", "AccountSvc", "InventorySvc", "BillingSvc"],
    ),
    ("address", &["AccountSvc", "BillingSvc"]),
    ("discount", &["BillingSvc", "CRM"]),
    ("notification", &["NotificationSvc", "CRM"]),
];

/// A plausible dependency between two known applications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyRule {
    pub from: &'static str,
    pub to: &'static str,
    pub dep_type: EdgeType,
}

pub const DEPENDENCY_RULES: &[DependencyRule] = &[
    DependencyRule {
        from: "AccountSvc",
        to: "BillingSvc",
        dep_type: EdgeType::Api,
    },
    DependencyRule {
        from: "ProvisioningSvc",
        to: "InventorySvc",
        dep_type: EdgeType::Api,
    },
    DependencyRule {
        from: "CRM",
        to: "NotificationSvc",
        dep_type: EdgeType::Event,
    },
    DependencyRule {
        from: "BillingSvc",
        to: "PaymentsSvc",
        dep_type: EdgeType::SharedDb,
    },
];

pub const APP_SUGGESTION_CONFIDENCE: f64 = 0.7;
pub const DEPENDENCY_SUGGESTION_CONFIDENCE: f64 = 0.72;
pub const APP_SUGGESTION_REASON: &str = "rule or hint match";

/// The text and hints a suggestion is derived from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SuggestionSubject {
    /// Row id used for provenance (`excel:{row_id}`)
    pub row_id: String,
    pub title: String,
    pub notes: Option<String>,
    /// Applications the author declared up front
    pub hints: Vec<String>,
}

impl SuggestionSubject {
    /// Title and notes, lower-cased, separated by a space
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.notes.as_deref().unwrap_or("")).to_lowercase()
    }

    fn provenance(&self) -> Provenance {
        Provenance::excel(&self.row_id, self.title.clone())
    }
}

/// Suggests impacted applications from keyword matches plus declared hints.
///
/// Each application appears once; order follows the rule table, then the hints.
pub fn suggest_impacted_apps(subject: &SuggestionSubject) -> Vec<ImpactedApplication> {
    let text = subject.search_text();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut hits: Vec<&str> = Vec::new();

    for (keyword, apps) in APP_RULES {
        if !text.contains(*keyword) {
            continue;
        }
        debug!("Keyword '{}' matched for row {}", keyword, subject.row_id);
        for app in apps.iter().copied() {
            if seen.insert(app) {
                hits.push(app);
            }
        }
    }

    for hint in &subject.hints {
        if seen.insert(hint.as_str()) {
            hits.push(hint.as_str());
        }
    }

    hits.into_iter()
        .map(|app| ImpactedApplication {
            app: app.to_string(),
            reason: APP_SUGGESTION_REASON.to_string(),
            confidence: APP_SUGGESTION_CONFIDENCE,
            provenance: vec![subject.provenance()],
        })
        .collect()
}

/// Filters [`DEPENDENCY_RULES`] to the triples whose endpoints are both in `apps`.
///
/// Only literal table matches are returned; nothing is inferred transitively.
pub fn suggest_dependencies(subject: &SuggestionSubject, apps: &[String]) -> Vec<AppDependency> {
    let present: HashSet<&str> = apps.iter().map(String::as_str).collect();

    DEPENDENCY_RULES
        .iter()
        .filter(|rule| present.contains(rule.from) && present.contains(rule.to))
        .map(|rule| AppDependency {
            from: rule.from.to_string(),
            to: rule.to.to_string(),
            dep_type: rule.dep_type,
            confidence: DEPENDENCY_SUGGESTION_CONFIDENCE,
            provenance: vec![subject.provenance()],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(title: &str) -> SuggestionSubject {
        SuggestionSubject {
            row_id: "r7".to_string(),
            title: title.to_string(),
            notes: None,
            hints: Vec::new(),
        }
    }

    fn names(apps: &[ImpactedApplication]) -> HashSet<String> {
        apps.iter().map(|a| a.app.clone()).collect()
    }

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_billing_keyword_is_deterministic() {
        for _ in 0..3 {
            let apps = suggest_impacted_apps(&subject("Fix Billing cycle"));
            assert_eq!(names(&apps), set(&["BillingSvc", "PaymentsSvc"]));
            for app in &apps {
                assert_eq!(app.confidence, 0.7);
                assert_eq!(app.reason, "rule or hint match");
                assert_eq!(app.provenance, vec![Provenance::excel("r7", "Fix Billing cycle")]);
                assert_eq!(app.provenance[0].source, "excel:r7");
            }
        }
    }

    #[test]
    fn test_each_keyword_rule() {
        let cases: [(&str, &[&str]); 5] = [
            ("billing", &["BillingSvc", "PaymentsSvc"]),
            (
                "line",
                &["ProvisioningSvc", "AccountSvc", "InventorySvc", "BillingSvc"],
            ),
            ("address", &["AccountSvc", "BillingSvc"]),
            ("discount", &["BillingSvc", "CRM"]),
            ("notification", &["NotificationSvc", "CRM"]),
        ];
        for (keyword, expected) in cases {
            let apps = suggest_impacted_apps(&subject(keyword));
            assert_eq!(names(&apps), set(expected), "keyword {}", keyword);
        }
    }

    #[test]
    fn test_union_has_no_duplicates() {
        let mut s = subject("Change address");
        s.notes = Some("and apply a DISCOUNT".to_string());
        s.hints = vec!["CRM".to_string(), "AuthSvc".to_string()];

        let apps = suggest_impacted_apps(&s);
        let list: Vec<&str> = apps.iter().map(|a| a.app.as_str()).collect();
        assert_eq!(list, vec!["AccountSvc", "BillingSvc", "CRM", "AuthSvc"]);
    }

    #[test]
    fn test_notes_are_searched() {
        let mut s = subject("Move customer");
        s.notes = Some("new service address".to_string());
        assert_eq!(
            names(&suggest_impacted_apps(&s)),
            set(&["AccountSvc", "BillingSvc"])
        );
    }

    #[test]
    fn test_no_match_no_hints_is_empty() {
        assert!(suggest_impacted_apps(&subject("Rename a plan")).is_empty());
    }

    #[test]
    fn test_dependency_requires_both_endpoints() {
        let apps = vec!["AccountSvc".to_string(), "CRM".to_string()];
        assert!(suggest_dependencies(&subject("x"), &apps).is_empty());

        let apps = vec!["AccountSvc".to_string(), "BillingSvc".to_string()];
        let deps = suggest_dependencies(&subject("x"), &apps);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].key(), ("AccountSvc", "BillingSvc", EdgeType::Api));
        assert_eq!(deps[0].confidence, 0.72);
        assert_eq!(deps[0].provenance[0].source, "excel:r7");
    }

    #[test]
    fn test_each_dependency_rule() {
        for rule in DEPENDENCY_RULES {
            let apps = vec![rule.from.to_string(), rule.to.to_string()];
            let deps = suggest_dependencies(&subject("x"), &apps);
            assert_eq!(deps.len(), 1);
            assert_eq!(deps[0].key(), (rule.from, rule.to, rule.dep_type));
        }
    }

    #[test]
    fn test_no_transitive_edges() {
        let apps: Vec<String> = ["AccountSvc", "BillingSvc", "PaymentsSvc"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let deps = suggest_dependencies(&subject("x"), &apps);
        let keys: Vec<_> = deps.iter().map(|d| d.key()).collect();
        assert_eq!(
            keys,
            vec![
                ("AccountSvc", "BillingSvc", EdgeType::Api),
                ("BillingSvc", "PaymentsSvc", EdgeType::SharedDb),
            ]
        );
    }
}
