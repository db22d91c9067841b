use serde::{Deserialize, Serialize};

use crate::checklist::compute_checklist;
use crate::models::{ChecklistItem, ChecklistStatus, Requirement};

/// Completeness roll-up across the requirements of a template
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TemplateProgress {
    pub total_requirements: usize,
    /// Requirements whose aggregate status is ✔️
    pub complete: usize,
    /// Requirements with at least one ❌
    pub blocked: usize,
    /// Requirements whose worst value is ⚠️
    pub partial: usize,
    pub total_features: usize,
    /// Share of requirements with acceptance criteria, 0.0 to 1.0
    pub acceptance_criteria_rate: f64,
}

impl TemplateProgress {
    pub fn of(requirements: &[Requirement]) -> Self {
        let mut progress = TemplateProgress {
            total_requirements: requirements.len(),
            ..Default::default()
        };

        let mut with_ac = 0;
        for req in requirements {
            let checklist = compute_checklist(req);
            match checklist.overall() {
                ChecklistStatus::Satisfied => progress.complete += 1,
                ChecklistStatus::Partial => progress.partial += 1,
                ChecklistStatus::Unsatisfied => progress.blocked += 1,
            }
            progress.total_features += req.features.len();
            if checklist.get(ChecklistItem::AcceptanceCriteria) == ChecklistStatus::Satisfied {
                with_ac += 1;
            }
        }

        if !requirements.is_empty() {
            progress.acceptance_criteria_rate = with_ac as f64 / requirements.len() as f64;
        }
        progress
    }

    /// Percentage of complete requirements, 0 when there are none
    pub fn percent_complete(&self) -> u32 {
        if self.total_requirements == 0 {
            return 0;
        }
        ((self.complete as f64 / self.total_requirements as f64) * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Feature;

    #[test]
    fn test_empty() {
        let progress = TemplateProgress::of(&[]);
        assert_eq!(progress.total_requirements, 0);
        assert_eq!(progress.acceptance_criteria_rate, 0.0);
        assert_eq!(progress.percent_complete(), 0);
    }

    #[test]
    fn test_unrefreshed_requirement_is_counted_from_content() {
        let mut req = Requirement::new("BR01", "Stale");
        let mut feature = Feature::new("F1", "Flow");
        feature.acceptance_criteria.push("Then done".to_string());
        req.features.push(feature);
        assert_eq!(
            req.checklist.acceptance_criteria,
            ChecklistStatus::Unsatisfied
        );

        let progress = TemplateProgress::of(&[req]);
        assert_eq!(progress.acceptance_criteria_rate, 1.0);
        assert_eq!(progress.total_features, 1);
    }

    #[test]
    fn test_counts() {
        let bare = Requirement::new("BR01", "Bare");

        let mut drafted = Requirement::new("BR02", "Drafted");
        let mut feature = Feature::new("F1", "Flow");
        feature.acceptance_criteria.push("Then done".to_string());
        drafted.features.push(feature);
        drafted.refresh();

        let progress = TemplateProgress::of(&[bare, drafted]);
        assert_eq!(progress.total_requirements, 2);
        assert_eq!(progress.blocked, 2);
        assert_eq!(progress.complete, 0);
        assert_eq!(progress.partial, 0);
        assert_eq!(progress.total_features, 1);
        assert_eq!(progress.acceptance_criteria_rate, 0.5);
    }
}
