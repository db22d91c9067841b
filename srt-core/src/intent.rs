//! Solution intent pack: a summary derived from the current template state

use serde::{Deserialize, Serialize};

use crate::checklist::compute_missing_info;
use crate::models::{Provenance, Template};

/// Version tag of the dependency map the pack was built from
pub const DEPENDENCY_MAP_SNAPSHOT_ID: &str = "graph:v1";

/// NFR category and target, without notes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NfrTarget {
    pub category: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SolutionIntent {
    pub overview: String,
    /// Owners by name, then the applications they work with
    pub context_actors: Vec<String>,
    pub app_landscape: Vec<String>,
    pub data_flows: Vec<String>,
    pub nfrs: Vec<NfrTarget>,
    pub risks: Vec<String>,
    pub open_questions: Vec<String>,
    pub dependency_map_snapshot_id: String,
    pub provenance: Vec<Provenance>,
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

/// Builds the pack; every list keeps first-seen order without duplicates
pub fn build_solution_intent(template: &Template) -> SolutionIntent {
    let mut intent = SolutionIntent {
        overview: format!("Solution intent for {}", template.title),
        dependency_map_snapshot_id: DEPENDENCY_MAP_SNAPSHOT_ID.to_string(),
        ..Default::default()
    };

    for req in &template.business_requirements {
        for owner in &req.owners {
            if !owner.name.trim().is_empty() {
                push_unique(&mut intent.context_actors, owner.name.clone());
            }
        }
        for app in &req.impacted_applications {
            push_unique(&mut intent.app_landscape, app.app.clone());
        }
        for dep in &req.app_dependencies {
            push_unique(
                &mut intent.data_flows,
                format!("{} → {}: {}", dep.from, dep.to, dep.dep_type),
            );
        }
        for feature in &req.features {
            for nfr in &feature.nfrs {
                push_unique(
                    &mut intent.nfrs,
                    NfrTarget {
                        category: nfr.category.clone(),
                        target: nfr.target.clone(),
                    },
                );
            }
            for risk in &feature.risks {
                push_unique(&mut intent.risks, risk.clone());
            }
        }
        for missing in compute_missing_info(req) {
            intent.open_questions.push(missing.prompt);
        }
    }

    for app in &intent.app_landscape {
        push_unique(&mut intent.context_actors, app.clone());
    }

    if let Some(note) = template.meeting_notes.first() {
        intent
            .provenance
            .push(Provenance::new(format!("meeting:{}", note.id), note.text.clone()));
    }

    intent
}
