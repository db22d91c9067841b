//! Checklist Engine and Missing-Info Generator
//!
//! Both functions are pure: they read the requirement's current features,
//! impacted applications, dependencies and owners and never look at a
//! previously stored checklist.

use crate::models::{Checklist, ChecklistItem, ChecklistStatus, Feature, MissingInfo, Requirement};

fn any_feature(req: &Requirement, pred: impl Fn(&Feature) -> bool) -> bool {
    req.features.iter().any(pred)
}

/// Computes the nine-field completeness record for a business requirement
pub fn compute_checklist(req: &Requirement) -> Checklist {
    Checklist {
        title: ChecklistStatus::from_bool(!req.title.trim().is_empty()),
        description: ChecklistStatus::from_bool(!req.description.trim().is_empty()),
        capability_map: ChecklistStatus::from_bool(!req.capabilities.is_empty()),
        impacted_apps: ChecklistStatus::from_bool(!req.impacted_applications.is_empty()),
        typed_dependencies: ChecklistStatus::from_bool(!req.app_dependencies.is_empty()),
        acceptance_criteria: ChecklistStatus::from_bool(any_feature(req, |f| {
            !f.acceptance_criteria.is_empty()
        })),
        nfrs: ChecklistStatus::from_bool(any_feature(req, |f| !f.nfrs.is_empty())),
        risks_assumptions_constraints: ChecklistStatus::from_bool(any_feature(
            req,
            Feature::has_risks_assumptions_constraints,
        )),
        owners: ChecklistStatus::from_bool(!req.owners.is_empty()),
    }
}

/// Prompt table in emission order. Fields without an entry never produce a prompt.
const PROMPTS: [(ChecklistItem, &str); 5] = [
    (ChecklistItem::AcceptanceCriteria, "Draft AC for {id}"),
    (
        ChecklistItem::Nfrs,
        "Add NFRs (latency, availability, security) for {id}",
    ),
    (
        ChecklistItem::ImpactedApps,
        "Suggest impacted applications for {id}",
    ),
    (
        ChecklistItem::TypedDependencies,
        "Propose typed dependencies for {id}",
    ),
    (ChecklistItem::Owners, "Assign TPM/SA for {id}"),
];

/// Computes remediation prompts for a business requirement.
///
/// Re-derives the checklist rather than trusting `req.checklist`, which may be stale.
pub fn compute_missing_info(req: &Requirement) -> Vec<MissingInfo> {
    let checklist = compute_checklist(req);

    PROMPTS
        .iter()
        .filter(|(item, _)| checklist.get(*item) == ChecklistStatus::Unsatisfied)
        .map(|(item, template)| MissingInfo {
            item: *item,
            prompt: template.replace("{id}", &req.id),
        })
        .collect()
}

/// Status of a feature node: ✔️ with AC, NFRs and risks; ⚠️ with AC or NFRs; else ❌
pub fn feature_status(feature: &Feature) -> ChecklistStatus {
    let has_ac = !feature.acceptance_criteria.is_empty();
    let has_nfrs = !feature.nfrs.is_empty();
    let has_risks = !feature.risks.is_empty();

    if has_ac && has_nfrs && has_risks {
        ChecklistStatus::Satisfied
    } else if has_ac || has_nfrs {
        ChecklistStatus::Partial
    } else {
        ChecklistStatus::Unsatisfied
    }
}

/// Worst-of status of a requirement, computed from its current state
pub fn requirement_status(req: &Requirement) -> ChecklistStatus {
    compute_checklist(req).overall()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AppDependency, EdgeType, ImpactedApplication, Nfr, Owner, OwnerRole, Provenance,
    };

    fn empty_br() -> Requirement {
        Requirement {
            id: "BR00".to_string(),
            title: "Test".to_string(),
            features: vec![Feature {
                id: "F01".to_string(),
                title: "T".to_string(),
                description: "D".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn complete_br() -> Requirement {
        let mut req = empty_br();
        req.description = "Remove a line".to_string();
        req.capabilities = vec!["Account Management".to_string()];
        req.owners = vec![Owner {
            role: OwnerRole::Tpm,
            name: "Dana".to_string(),
        }];
        req.impacted_applications = vec![ImpactedApplication {
            app: "AccountSvc".to_string(),
            reason: "hint".to_string(),
            confidence: 0.7,
            provenance: vec![Provenance::excel("r1", "Test")],
        }];
        req.app_dependencies = vec![AppDependency {
            from: "AccountSvc".to_string(),
            to: "BillingSvc".to_string(),
            dep_type: EdgeType::Api,
            confidence: 0.72,
            provenance: Vec::new(),
        }];
        let feature = &mut req.features[0];
        feature.acceptance_criteria = vec!["works".to_string()];
        feature.nfrs = vec![Nfr::new("latency", "P95<500ms", None)];
        feature.constraints = vec!["weekend cutover".to_string()];
        req
    }

    #[test]
    fn test_end_to_end_empty_requirement() {
        let req = empty_br();
        let cl = compute_checklist(&req);

        assert_eq!(cl.title, ChecklistStatus::Satisfied);
        for item in ChecklistItem::ALL.iter().skip(1) {
            assert_eq!(cl.get(*item), ChecklistStatus::Unsatisfied, "{}", item);
        }

        let items: Vec<ChecklistItem> = compute_missing_info(&req).iter().map(|m| m.item).collect();
        assert_eq!(
            items,
            vec![
                ChecklistItem::AcceptanceCriteria,
                ChecklistItem::Nfrs,
                ChecklistItem::ImpactedApps,
                ChecklistItem::TypedDependencies,
                ChecklistItem::Owners,
            ]
        );
    }

    #[test]
    fn test_prompt_text_interpolates_id() {
        let prompts: Vec<String> = compute_missing_info(&empty_br())
            .into_iter()
            .map(|m| m.prompt)
            .collect();
        assert_eq!(prompts[0], "Draft AC for BR00");
        assert_eq!(prompts[1], "Add NFRs (latency, availability, security) for BR00");
        assert_eq!(prompts[2], "Suggest impacted applications for BR00");
        assert_eq!(prompts[3], "Propose typed dependencies for BR00");
        assert_eq!(prompts[4], "Assign TPM/SA for BR00");
    }

    #[test]
    fn test_whitespace_title_is_unsatisfied() {
        let mut req = empty_br();
        req.title = "   \t".to_string();
        assert_eq!(compute_checklist(&req).title, ChecklistStatus::Unsatisfied);
    }

    #[test]
    fn test_complete_requirement_has_no_missing_info() {
        let req = complete_br();
        let cl = compute_checklist(&req);
        assert_eq!(cl.overall(), ChecklistStatus::Satisfied);
        assert!(compute_missing_info(&req).is_empty());
    }

    #[test]
    fn test_unprompted_fields_produce_no_entries() {
        let mut req = complete_br();
        req.description.clear();
        req.capabilities.clear();
        req.features[0].constraints.clear();

        let cl = compute_checklist(&req);
        assert_eq!(cl.description, ChecklistStatus::Unsatisfied);
        assert_eq!(cl.capability_map, ChecklistStatus::Unsatisfied);
        assert_eq!(cl.risks_assumptions_constraints, ChecklistStatus::Unsatisfied);
        assert!(compute_missing_info(&req).is_empty());
    }

    #[test]
    fn test_risks_assumptions_constraints_any_list_any_feature() {
        for which in 0..3 {
            let mut req = empty_br();
            req.features.push(Feature::new("F02", "Second"));
            let second = &mut req.features[1];
            match which {
                0 => second.risks.push("orphan charges".to_string()),
                1 => second.assumptions.push("CSR trained".to_string()),
                _ => second.constraints.push("no downtime".to_string()),
            }
            assert_eq!(
                compute_checklist(&req).risks_assumptions_constraints,
                ChecklistStatus::Satisfied
            );
        }
    }

    #[test]
    fn test_acceptance_criteria_any_feature() {
        let mut req = empty_br();
        let mut second = Feature::new("F02", "Second");
        second.acceptance_criteria.push("ok".to_string());
        req.features.push(second);
        assert_eq!(
            compute_checklist(&req).acceptance_criteria,
            ChecklistStatus::Satisfied
        );
    }

    #[test]
    fn test_checklist_is_idempotent_and_ignores_stored_value() {
        let mut req = empty_br();
        req.checklist.acceptance_criteria = ChecklistStatus::Satisfied;
        let first = compute_checklist(&req);
        let second = compute_checklist(&req);
        assert_eq!(first, second);
        assert_eq!(first.acceptance_criteria, ChecklistStatus::Unsatisfied);
    }

    #[test]
    fn test_missing_info_consistent_with_checklist() {
        let mut variants = vec![empty_br(), complete_br()];
        let mut partial = complete_br();
        partial.owners.clear();
        partial.features[0].nfrs.clear();
        variants.push(partial);
        let mut no_features = complete_br();
        no_features.features.clear();
        variants.push(no_features);

        let prompted = [
            ChecklistItem::AcceptanceCriteria,
            ChecklistItem::Nfrs,
            ChecklistItem::ImpactedApps,
            ChecklistItem::TypedDependencies,
            ChecklistItem::Owners,
        ];
        for req in &variants {
            let cl = compute_checklist(req);
            let missing = compute_missing_info(req);
            for item in prompted {
                let listed = missing.iter().any(|m| m.item == item);
                assert_eq!(listed, cl.get(item) == ChecklistStatus::Unsatisfied);
            }
        }
    }

    #[test]
    fn test_monotonic_unlock_after_drafting() {
        let mut req = empty_br();
        req.refresh();
        assert_eq!(req.checklist.acceptance_criteria, ChecklistStatus::Unsatisfied);

        assert!(req.apply_acceptance_criteria(vec!["Then notify the owner".to_string()]));
        assert_eq!(req.checklist.acceptance_criteria, ChecklistStatus::Satisfied);
        assert!(!req
            .missing_info
            .iter()
            .any(|m| m.item == ChecklistItem::AcceptanceCriteria));
    }

    #[test]
    fn test_feature_status() {
        let mut feature = Feature::new("F1", "Flow");
        assert_eq!(feature_status(&feature), ChecklistStatus::Unsatisfied);

        feature.nfrs.push(Nfr::new("availability", "99.9%", None));
        assert_eq!(feature_status(&feature), ChecklistStatus::Partial);

        feature.acceptance_criteria.push("ok".to_string());
        assert_eq!(feature_status(&feature), ChecklistStatus::Partial);

        feature.risks.push("risk".to_string());
        assert_eq!(feature_status(&feature), ChecklistStatus::Satisfied);
    }

    #[test]
    fn test_requirement_status_worst_of() {
        assert_eq!(requirement_status(&empty_br()), ChecklistStatus::Unsatisfied);
        assert_eq!(requirement_status(&complete_br()), ChecklistStatus::Satisfied);
    }
}
