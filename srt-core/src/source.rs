//! Template source abstraction
//!
//! The core does not parse spreadsheets or own persistence. A
//! `TemplateSource` hands it already-parsed templates; the in-memory
//! [`TemplateLibrary`] and the file-backed [`crate::Storage`] both qualify.

use anyhow::Result;

use crate::models::{Template, TemplateLibrary};

/// Supplies parsed templates by id
pub trait TemplateSource {
    /// Loads every template the source knows about
    fn load_library(&self) -> Result<TemplateLibrary>;

    /// Gets one template by id, `None` when the id does not resolve
    fn find_template(&self, srt_id: &str) -> Result<Option<Template>> {
        let library = self.load_library()?;
        Ok(library.srts.into_iter().find(|t| t.answers_to(srt_id)))
    }

    /// Lists the ids of all templates
    fn template_ids(&self) -> Result<Vec<String>> {
        let library = self.load_library()?;
        Ok(library.srts.into_iter().map(|t| t.srt_id).collect())
    }
}

impl TemplateSource for TemplateLibrary {
    fn load_library(&self) -> Result<TemplateLibrary> {
        Ok(self.clone())
    }

    fn find_template(&self, srt_id: &str) -> Result<Option<Template>> {
        Ok(self.template(srt_id).cloned())
    }

    fn template_ids(&self) -> Result<Vec<String>> {
        Ok(self.srts.iter().map(|t| t.srt_id.clone()).collect())
    }
}
