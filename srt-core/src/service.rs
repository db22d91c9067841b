//! Invocation boundaries
//!
//! `Assistant` resolves template and requirement ids through a
//! [`TemplateSource`] and hands the pure engines their inputs. Every method
//! returns a structured [`CoreError`] instead of panicking; only the graph
//! endpoint degrades softly.

use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::drafting;
use crate::error::CoreError;
use crate::graph::{self, Graph, GraphView};
use crate::ids::make_artifact_id;
use crate::intent::{self, SolutionIntent};
use crate::models::{AppDependency, ImpactedApplication, Nfr, Provenance, Requirement, Template};
use crate::source::TemplateSource;
use crate::suggest::{self, SuggestionSubject};

/// Request naming one requirement of one template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequirementRef {
    #[serde(rename = "srtId")]
    pub template_id: String,
    #[serde(rename = "brId")]
    pub requirement_id: String,
}

impl RequirementRef {
    pub fn new(template_id: impl Into<String>, requirement_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            requirement_id: requirement_id.into(),
        }
    }
}

/// Drafting needs nothing beyond the requirement reference
pub type DraftRequest = RequirementRef;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuggestRequest {
    #[serde(flatten)]
    pub target: RequirementRef,
    /// Applications the caller already accepted; used by dependency suggestions
    #[serde(rename = "apps", default, skip_serializing_if = "Option::is_none")]
    pub declared_apps: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParseResponse {
    pub brs: Vec<Requirement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestAppsResponse {
    pub impacted: Vec<ImpactedApplication>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestDepsResponse {
    pub dependencies: Vec<AppDependency>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DraftAcResponse {
    pub acceptance_criteria: Vec<String>,
    pub provenance: Vec<Provenance>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DraftNfrsResponse {
    pub nfrs: Vec<Nfr>,
    pub provenance: Vec<Provenance>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateWorkItemsRequest {
    #[serde(default)]
    pub confirm: bool,
    #[serde(rename = "brId")]
    pub requirement_id: String,
}

/// A newly minted work-item artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedArtifact {
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedWorkItems {
    pub created: Vec<CreatedArtifact>,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// Work-item types created per requirement, with their id prefixes
const WORK_ITEM_KINDS: [(&str, &str); 3] = [
    ("BusinessRequirement", "br"),
    ("Epic", "ep"),
    ("Feature", "ft"),
];

/// Entry point for callers holding a template source
pub struct Assistant<S: TemplateSource> {
    source: S,
}

impl<S: TemplateSource> Assistant<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn template(&self, template_id: &str) -> Result<Template, CoreError> {
        match self.source.find_template(template_id)? {
            Some(template) => Ok(template),
            None => {
                warn!("Template '{}' not found", template_id);
                Err(CoreError::template_not_found(template_id))
            }
        }
    }

    /// Returns the parsed requirements of a template
    pub fn parse(&self, template_id: &str) -> Result<ParseResponse, CoreError> {
        let mut template = self.template(template_id)?;
        template.refresh();
        Ok(ParseResponse {
            brs: template.business_requirements,
        })
    }

    /// Suggests impacted applications for one requirement
    pub fn suggest_apps(&self, request: &SuggestRequest) -> Result<SuggestAppsResponse, CoreError> {
        let template = self.template(&request.target.template_id)?;
        let subject = resolve_subject(&template, &request.target.requirement_id)?;
        let impacted = suggest::suggest_impacted_apps(&subject);
        debug!(
            "Suggested {} application(s) for {}",
            impacted.len(),
            request.target.requirement_id
        );
        Ok(SuggestAppsResponse { impacted })
    }

    /// Suggests typed dependencies among the requirement's applications.
    ///
    /// The candidate set is the caller's declared apps, else the source
    /// row's hint, else the requirement's accepted impacted applications.
    pub fn suggest_deps(&self, request: &SuggestRequest) -> Result<SuggestDepsResponse, CoreError> {
        let template = self.template(&request.target.template_id)?;
        let requirement_id = &request.target.requirement_id;
        let subject = resolve_subject(&template, requirement_id)?;

        let apps = match &request.declared_apps {
            Some(apps) => apps.clone(),
            None => template
                .source_row(requirement_id)
                .and_then(|row| row.impacted_apps_hint.clone())
                .or_else(|| {
                    template
                        .requirement(requirement_id)
                        .map(Requirement::impacted_app_names)
                })
                .unwrap_or_default(),
        };

        let dependencies = suggest::suggest_dependencies(&subject, &apps);
        debug!(
            "Suggested {} dependency candidate(s) for {}",
            dependencies.len(),
            requirement_id
        );
        Ok(SuggestDepsResponse { dependencies })
    }

    /// Drafts acceptance criteria for one requirement
    pub fn draft_ac(&self, target: &DraftRequest) -> Result<DraftAcResponse, CoreError> {
        let template = self.template(&target.template_id)?;
        let subject = resolve_subject(&template, &target.requirement_id)?;
        Ok(DraftAcResponse {
            acceptance_criteria: drafting::acceptance_criteria_for(&subject.title),
            provenance: vec![Provenance::excel(&subject.row_id, subject.title.clone())],
        })
    }

    /// Drafts NFRs for one requirement
    pub fn draft_nfrs(&self, target: &DraftRequest) -> Result<DraftNfrsResponse, CoreError> {
        let template = self.template(&target.template_id)?;
        let subject = resolve_subject(&template, &target.requirement_id)?;
        Ok(DraftNfrsResponse {
            nfrs: drafting::standard_nfrs(),
            provenance: vec![Provenance::excel(&subject.row_id, subject.title.clone())],
        })
    }

    /// See [`create_work_items`]; the template source is not consulted
    pub fn create_work_items(
        &self,
        request: &CreateWorkItemsRequest,
    ) -> Result<CreatedWorkItems, CoreError> {
        create_work_items(request)
    }

    /// Builds the render graph of a template; an unknown focus yields an empty graph
    pub fn graph(&self, template_id: &str, view: &GraphView) -> Result<Graph, CoreError> {
        let mut template = self.template(template_id)?;
        template.refresh();
        Ok(graph::build_template_graph(&template, view))
    }

    /// Derives the solution intent pack of a template
    pub fn solution_intent(&self, template_id: &str) -> Result<SolutionIntent, CoreError> {
        let mut template = self.template(template_id)?;
        template.refresh();
        Ok(intent::build_solution_intent(&template))
    }
}

/// Mints BusinessRequirement, Epic and Feature artifacts referencing a requirement.
///
/// Refuses without explicit confirmation; nothing is created in that case.
pub fn create_work_items(request: &CreateWorkItemsRequest) -> Result<CreatedWorkItems, CoreError> {
    if !request.confirm {
        return Err(CoreError::Validation("Confirmation required".to_string()));
    }

    let created = WORK_ITEM_KINDS
        .iter()
        .map(|(artifact_type, prefix)| CreatedArtifact {
            artifact_type: artifact_type.to_string(),
            id: make_artifact_id(prefix),
            reference: request.requirement_id.clone(),
        })
        .collect();

    Ok(CreatedWorkItems {
        created,
        timestamp: Utc::now().timestamp_millis(),
    })
}

/// Finds the text a suggestion or draft is keyed off.
///
/// Prefers the source spreadsheet row; falls back to the requirement itself
/// with its id standing in for the row id.
pub fn resolve_subject(template: &Template, requirement_id: &str) -> Result<SuggestionSubject, CoreError> {
    if let Some(row) = template.source_row(requirement_id) {
        return Ok(SuggestionSubject {
            row_id: row.row_id.clone(),
            title: row.title.clone(),
            notes: row.notes.clone(),
            hints: row.impacted_apps_hint.clone().unwrap_or_default(),
        });
    }

    match template.requirement(requirement_id) {
        Some(req) => Ok(SuggestionSubject {
            row_id: req.id.clone(),
            title: req.title.clone(),
            notes: Some(req.description.clone()).filter(|d| !d.is_empty()),
            hints: Vec::new(),
        }),
        None => {
            warn!(
                "Requirement '{}' not found in template '{}'",
                requirement_id, template.srt_id
            );
            Err(CoreError::requirement_not_found(requirement_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EntityKind;
    use crate::models::{ChecklistStatus, EdgeType, Feature, SourceRow, TemplateLibrary};
    use std::collections::HashSet;

    fn library() -> TemplateLibrary {
        let mut template = Template::new("SRT-1", "Family plan changes");
        template.scope = "Self-service account changes".to_string();

        let mut br1 = Requirement::new("BR01", "Remove phone line from family account");
        br1.features.push(Feature::new("F001", "Line Removal Workflow"));
        let mut br2 = Requirement::new("BR02", "Loyalty points");
        br2.description = "Apply a discount at renewal".to_string();
        br2.impacted_applications = vec![
            ImpactedApplication {
                app: "BillingSvc".to_string(),
                reason: String::new(),
                confidence: 0.7,
                provenance: Vec::new(),
            },
            ImpactedApplication {
                app: "PaymentsSvc".to_string(),
                reason: String::new(),
                confidence: 0.7,
                provenance: Vec::new(),
            },
        ];
        template.business_requirements = vec![br1, br2];
        template.excel_rows = vec![SourceRow {
            row_id: "r1".to_string(),
            br_id: "BR01".to_string(),
            title: "Remove line".to_string(),
            notes: Some("prorated billing".to_string()),
            impacted_apps_hint: Some(vec!["NotificationSvc".to_string()]),
        }];

        TemplateLibrary {
            srts: vec![template],
        }
    }

    fn assistant() -> Assistant<TemplateLibrary> {
        Assistant::new(library())
    }

    fn request(br: &str, apps: Option<&[&str]>) -> SuggestRequest {
        SuggestRequest {
            target: RequirementRef::new("SRT-1", br),
            declared_apps: apps.map(|a| a.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[test]
    fn test_parse_refreshes_checklists() {
        let response = assistant().parse("SRT-1").unwrap();
        assert_eq!(response.brs.len(), 2);
        assert_eq!(response.brs[1].checklist.impacted_apps, ChecklistStatus::Satisfied);
    }

    #[test]
    fn test_parse_unknown_template_is_not_found() {
        match assistant().parse("SRT-404") {
            Err(CoreError::NotFound { kind, id }) => {
                assert_eq!(kind, EntityKind::Template);
                assert_eq!(id, "SRT-404");
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_suggest_apps_uses_row_text_and_hints() {
        let response = assistant().suggest_apps(&request("BR01", None)).unwrap();
        let apps: HashSet<&str> = response.impacted.iter().map(|a| a.app.as_str()).collect();
        let expected: HashSet<&str> = [
            "ProvisioningSvc",
            "AccountSvc",
            "InventorySvc",
            "BillingSvc",
            "PaymentsSvc",
            "NotificationSvc",
        ]
        .into_iter()
        .collect();
        assert_eq!(apps, expected);
        assert_eq!(response.impacted.len(), expected.len());
        assert!(response
            .impacted
            .iter()
            .all(|a| a.provenance[0].source == "excel:r1"));
    }

    #[test]
    fn test_suggest_apps_falls_back_to_requirement_text() {
        let response = assistant().suggest_apps(&request("BR02", None)).unwrap();
        let apps: HashSet<&str> = response.impacted.iter().map(|a| a.app.as_str()).collect();
        assert_eq!(apps, ["BillingSvc", "CRM"].into_iter().collect());
        assert_eq!(response.impacted[0].provenance[0].source, "excel:BR02");
    }

    #[test]
    fn test_unknown_requirement_is_not_found() {
        let a = assistant();
        assert!(a.suggest_apps(&request("BR99", None)).unwrap_err().is_not_found());
        assert!(a.suggest_deps(&request("BR99", None)).unwrap_err().is_not_found());
        let target = RequirementRef::new("SRT-1", "BR99");
        assert!(a.draft_ac(&target).unwrap_err().is_not_found());
        assert!(a.draft_nfrs(&target).unwrap_err().is_not_found());
    }

    #[test]
    fn test_suggest_deps_candidate_sets() {
        let a = assistant();

        let declared = a
            .suggest_deps(&request("BR01", Some(&["AccountSvc", "BillingSvc"])))
            .unwrap();
        assert_eq!(declared.dependencies.len(), 1);
        assert_eq!(declared.dependencies[0].dep_type, EdgeType::Api);

        // Row hint holds only NotificationSvc: no pair matches
        let hinted = a.suggest_deps(&request("BR01", None)).unwrap();
        assert!(hinted.dependencies.is_empty());

        // No row: accepted impacted applications are used
        let accepted = a.suggest_deps(&request("BR02", None)).unwrap();
        assert_eq!(accepted.dependencies.len(), 1);
        assert_eq!(accepted.dependencies[0].dep_type, EdgeType::SharedDb);
    }

    #[test]
    fn test_drafts_carry_provenance() {
        let target = RequirementRef::new("SRT-1", "BR01");
        let ac = assistant().draft_ac(&target).unwrap();
        assert_eq!(ac.acceptance_criteria.len(), 3);
        assert!(ac.acceptance_criteria[0].contains("\"Remove line\""));
        assert_eq!(ac.provenance, vec![Provenance::excel("r1", "Remove line")]);

        let nfrs = assistant().draft_nfrs(&target).unwrap();
        assert_eq!(nfrs.nfrs.len(), 3);
    }

    #[test]
    fn test_create_work_items_requires_confirmation() {
        let refused = assistant().create_work_items(&CreateWorkItemsRequest {
            confirm: false,
            requirement_id: "BR01".to_string(),
        });
        assert!(matches!(refused, Err(CoreError::Validation(_))));

        let created = create_work_items(&CreateWorkItemsRequest {
            confirm: true,
            requirement_id: "BR01".to_string(),
        })
        .unwrap();
        let types: Vec<&str> = created
            .created
            .iter()
            .map(|c| c.artifact_type.as_str())
            .collect();
        assert_eq!(types, vec!["BusinessRequirement", "Epic", "Feature"]);
        assert!(created.created[0].id.starts_with("br-"));
        assert!(created.created[1].id.starts_with("ep-"));
        assert!(created.created[2].id.starts_with("ft-"));
        assert!(created.created.iter().all(|c| c.reference == "BR01"));
        assert!(created.created.iter().all(|c| c.id.len() == 13));
        assert!(created.timestamp > 0);
    }

    #[test]
    fn test_request_wire_format() {
        let req: SuggestRequest =
            serde_json::from_str(r#"{"srtId":"SRT-1","brId":"BR01","apps":["CRM"]}"#).unwrap();
        assert_eq!(req.target, RequirementRef::new("SRT-1", "BR01"));
        assert_eq!(req.declared_apps, Some(vec!["CRM".to_string()]));

        let create: CreateWorkItemsRequest = serde_json::from_str(r#"{"brId":"BR01"}"#).unwrap();
        assert!(!create.confirm);
    }

    #[test]
    fn test_graph_endpoint_degrades_on_unknown_focus() {
        let view = GraphView::Dependency {
            focus: "BR-does-not-exist".to_string(),
        };
        let graph = assistant().graph("SRT-1", &view).unwrap();
        assert!(graph.is_empty());
    }
}
