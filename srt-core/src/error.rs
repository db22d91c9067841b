use thiserror::Error;

/// What kind of identifier failed to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Template,
    Requirement,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Template => write!(f, "Template"),
            EntityKind::Requirement => write!(f, "Requirement"),
        }
    }
}

/// Errors surfaced at the service boundary
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Template source failed: {0}")]
    Source(#[from] anyhow::Error),
}

impl CoreError {
    pub fn template_not_found(id: &str) -> Self {
        CoreError::NotFound {
            kind: EntityKind::Template,
            id: id.to_string(),
        }
    }

    pub fn requirement_not_found(id: &str) -> Self {
        CoreError::NotFound {
            kind: EntityKind::Requirement,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }
}
