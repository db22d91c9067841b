use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::checklist::{compute_checklist, compute_missing_info};
use crate::graph::Graph;
use crate::models::Template;
use crate::progress::TemplateProgress;

/// Export a render graph as pretty JSON
pub fn export_graph_json(graph: &Graph, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(graph)?;
    fs::write(output_path, json)
        .with_context(|| format!("Failed to write {:?}", output_path))?;

    println!("Exported graph: {}", output_path.display());
    println!(
        "  Nodes: {}, edges: {}",
        graph.nodes.len(),
        graph.edges.len()
    );

    Ok(())
}

/// Renders the Markdown completeness report of a template
pub fn render_status_report(template: &Template) -> String {
    let mut output = String::new();

    // Title
    let title = if !template.title.is_empty() {
        template.title.as_str()
    } else {
        template.srt_id.as_str()
    };
    output.push_str(&format!("# {} - Completeness Report\n\n", title));

    if !template.scope.is_empty() {
        output.push_str(&format!("{}\n\n", template.scope));
    }

    let progress = TemplateProgress::of(&template.business_requirements);
    output.push_str("## Summary\n\n");
    output.push_str(&format!(
        "- Business requirements: {} ({} complete, {} partial, {} blocked)\n",
        progress.total_requirements, progress.complete, progress.partial, progress.blocked
    ));
    output.push_str(&format!("- Features: {}\n", progress.total_features));
    output.push_str(&format!(
        "- Acceptance criteria coverage: {:.0}%\n\n",
        progress.acceptance_criteria_rate * 100.0
    ));

    // Derived from current content; the stored checklist may be stale.
    for req in &template.business_requirements {
        let checklist = compute_checklist(req);
        let missing_info = compute_missing_info(req);

        output.push_str(&format!(
            "## {} - {} {}\n\n",
            req.id,
            req.title,
            checklist.overall()
        ));

        output.push_str("| Item | Status |\n|------|--------|\n");
        for (item, status) in checklist.entries() {
            output.push_str(&format!("| {} | {} |\n", item, status));
        }
        output.push('\n');

        if !missing_info.is_empty() {
            output.push_str("**Missing information:**\n\n");
            for missing in &missing_info {
                output.push_str(&format!("- {}\n", missing.prompt));
            }
            output.push('\n');
        }
    }

    output
}

/// Export the completeness report of a template as Markdown
pub fn export_status_report(template: &Template, output_path: &Path) -> Result<()> {
    let report = render_status_report(template);
    fs::write(output_path, report)
        .with_context(|| format!("Failed to write {:?}", output_path))?;

    println!("Exported status report: {}", output_path.display());
    println!(
        "  Business requirements: {}",
        template.business_requirements.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{build_template_graph, GraphView};
    use crate::models::{Feature, Requirement};
    use tempfile::tempdir;

    fn template() -> Template {
        let mut template = Template::new("SRT-1", "Family plan");
        template.scope = "Account changes".to_string();
        let mut req = Requirement::new("BR01", "Remove line");
        req.features.push(Feature::new("F1", "Removal"));
        req.refresh();
        template.business_requirements.push(req);
        template
    }

    #[test]
    fn test_render_status_report() {
        let report = render_status_report(&template());
        assert!(report.starts_with("# Family plan - Completeness Report"));
        assert!(report.contains("Account changes"));
        assert!(report.contains("## BR01 - Remove line ❌"));
        assert!(report.contains("| title | ✔️ |"));
        assert!(report.contains("| owners | ❌ |"));
        assert!(report.contains("- Draft AC for BR01"));
        assert!(report.contains("- Business requirements: 1 (0 complete, 0 partial, 1 blocked)"));
    }

    #[test]
    fn test_render_ignores_stale_checklist() {
        let mut template = template();
        // Content changed after the last refresh
        template.business_requirements[0].features[0]
            .acceptance_criteria
            .push("Then the line is removed".to_string());

        let report = render_status_report(&template);
        assert!(report.contains("| acceptance_criteria | ✔️ |"));
        assert!(!report.contains("- Draft AC for BR01"));
        assert!(report.contains("- Acceptance criteria coverage: 100%"));
    }

    #[test]
    fn test_render_falls_back_to_id() {
        let report = render_status_report(&Template::new("SRT-9", ""));
        assert!(report.starts_with("# SRT-9 - Completeness Report"));
    }

    #[test]
    fn test_export_files() {
        let dir = tempdir().unwrap();
        let template = template();

        let report_path = dir.path().join("status.md");
        export_status_report(&template, &report_path).unwrap();
        assert_eq!(
            fs::read_to_string(&report_path).unwrap(),
            render_status_report(&template)
        );

        let graph = build_template_graph(&template, &GraphView::Hierarchy);
        let graph_path = dir.path().join("graph.json");
        export_graph_json(&graph, &graph_path).unwrap();
        let parsed: Graph =
            serde_json::from_str(&fs::read_to_string(&graph_path).unwrap()).unwrap();
        assert_eq!(parsed, graph);
    }
}
