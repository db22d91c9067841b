pub mod checklist;
pub mod config;
pub mod drafting;
pub mod error;
pub mod export;
pub mod graph;
pub mod ids;
pub mod intent;
pub mod models;
pub mod progress;
pub mod service;
pub mod source;
pub mod storage;
pub mod suggest;

// Re-export commonly used types
pub use checklist::{compute_checklist, compute_missing_info, feature_status, requirement_status};
pub use config::{get_config_path, Config};
pub use error::{CoreError, EntityKind};
pub use graph::{
    build_graph, build_template_graph, EdgeKind, Graph, GraphEdge, GraphMode, GraphNode,
    GraphView, NodeKind, Position,
};
pub use intent::{build_solution_intent, SolutionIntent};
pub use models::{
    AppDependency, Checklist, ChecklistItem, ChecklistStatus, EdgeType, Feature,
    ImpactedApplication, MeetingNote, MissingInfo, Nfr, Owner, OwnerRole, Provenance, Requirement,
    SourceRow, Template, TemplateLibrary,
};
pub use progress::TemplateProgress;
pub use service::{
    create_work_items, Assistant, CreateWorkItemsRequest, CreatedArtifact, CreatedWorkItems,
    DraftRequest, RequirementRef, SuggestRequest,
};
pub use source::TemplateSource;
pub use storage::{Storage, StorageFormat};
pub use suggest::{suggest_dependencies, suggest_impacted_apps, SuggestionSubject};
