mod cli;
mod prompts;

use anyhow::{Context, Result};
use clap::Parser;
use colored::{ColoredString, Colorize};
use log::debug;
use std::path::Path;

use srt_core::export::{export_graph_json, export_status_report};
use srt_core::service::{DraftAcResponse, DraftNfrsResponse};
use srt_core::{
    compute_checklist, compute_missing_info, get_config_path, requirement_status, Assistant,
    ChecklistStatus, Config, CoreError, CreateWorkItemsRequest, GraphView, Requirement,
    RequirementRef, Storage, SuggestRequest, Template, TemplateLibrary, TemplateProgress,
};

use crate::cli::{Cli, Command, ConfigCommand, ExportFormat};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = get_config_path()?;
    let config = Config::load_or_default(&config_path)?;

    match &cli.command {
        Command::Config(cmd) => handle_config_command(cmd, &config_path, &config),
        command => {
            let workspace = Workspace::open(&cli, config)?;
            run_command(command, &workspace)
        }
    }
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

/// The loaded template file plus what is needed to pick a template from it
struct Workspace {
    config: Config,
    storage: Storage,
    library: TemplateLibrary,
    explicit_template: Option<String>,
}

impl Workspace {
    fn open(cli: &Cli, config: Config) -> Result<Self> {
        let data_path = config.resolve_data_path(cli.file.as_deref());
        debug!("Using template file {:?}", data_path);

        let storage = Storage::new(&data_path);
        let library = storage
            .load()
            .with_context(|| format!("Failed to load templates from {:?}", data_path))?;

        Ok(Self {
            config,
            storage,
            library,
            explicit_template: cli.template.clone(),
        })
    }

    fn template_id(&self) -> Result<String> {
        self.config
            .resolve_template_id(self.explicit_template.as_deref(), &self.library)
    }

    fn template(&self) -> Result<&Template> {
        let id = self.template_id()?;
        let template = self
            .library
            .template(&id)
            .ok_or_else(|| CoreError::template_not_found(&id))?;
        Ok(template)
    }

    fn requirement(&self, br_id: &str) -> Result<&Requirement> {
        let requirement = self
            .template()?
            .requirement(br_id)
            .ok_or_else(|| CoreError::requirement_not_found(br_id))?;
        Ok(requirement)
    }

    fn assistant(&self) -> Assistant<TemplateLibrary> {
        Assistant::new(self.library.clone())
    }

    fn target(&self, br_id: &str) -> Result<RequirementRef> {
        Ok(RequirementRef::new(self.template_id()?, br_id))
    }

    /// Applies `update` to one requirement under the storage lock and saves
    fn update_requirement<T>(
        &self,
        br_id: &str,
        update: impl FnOnce(&mut Requirement) -> T,
    ) -> Result<T> {
        let template_id = self.template_id()?;
        let (_, outcome) = self.storage.update_atomically(|library| {
            library
                .template_mut(&template_id)
                .and_then(|t| t.requirement_mut(br_id))
                .map(update)
        })?;

        outcome.with_context(|| {
            format!(
                "{} is not a business requirement of {}; nothing was saved",
                br_id, template_id
            )
        })
    }
}

fn run_command(command: &Command, workspace: &Workspace) -> Result<()> {
    match command {
        Command::List => list_templates(workspace),
        Command::Show { br } => show_requirement(workspace, br),
        Command::Checklist { br } => show_checklist(workspace, br),
        Command::Missing { br } => show_missing(workspace, br),
        Command::Status => show_status(workspace),
        Command::SuggestApps { br, apply } => suggest_apps(workspace, br, *apply),
        Command::SuggestDeps { br, apps, apply } => {
            suggest_deps(workspace, br, apps.clone(), *apply)
        }
        Command::DraftAc { br, apply } => draft_ac(workspace, br, *apply),
        Command::DraftNfrs { br, apply } => draft_nfrs(workspace, br, *apply),
        Command::Graph {
            mode,
            focus,
            output,
        } => {
            let mode = mode.unwrap_or(workspace.config.default_view);
            let view = GraphView::from_mode(mode, focus.as_deref());
            show_graph(workspace, &view, output.as_deref())
        }
        Command::CreateItems { br, yes } => create_items(workspace, br, *yes),
        Command::Intent => show_intent(workspace),
        Command::Export { format, output } => handle_export_command(workspace, *format, output),
        // Handled before the template file is opened
        Command::Config(_) => Ok(()),
    }
}

fn status_glyph(status: ChecklistStatus) -> ColoredString {
    match status {
        ChecklistStatus::Satisfied => status.glyph().green(),
        ChecklistStatus::Partial => status.glyph().yellow(),
        ChecklistStatus::Unsatisfied => status.glyph().red(),
    }
}

fn list_templates(workspace: &Workspace) -> Result<()> {
    if workspace.library.srts.is_empty() {
        println!("{}", "No templates found.".yellow());
        return Ok(());
    }

    for template in &workspace.library.srts {
        println!(
            "{} {}",
            template.srt_id.blue().bold(),
            template.title.bold()
        );
        for req in &template.business_requirements {
            println!(
                "  {:<8} {} {}",
                req.id,
                status_glyph(requirement_status(req)),
                req.title
            );
        }
    }

    Ok(())
}

fn show_requirement(workspace: &Workspace, br_id: &str) -> Result<()> {
    let req = workspace.requirement(br_id)?;

    println!("{}: {}", "ID".blue(), req.id);
    println!("{}: {}", "Title".blue(), req.title);
    println!("{}: {}", "Description".blue(), req.description);
    println!(
        "{}: {}",
        "Status".blue(),
        status_glyph(requirement_status(req))
    );

    if !req.capabilities.is_empty() {
        println!("{}: {}", "Capabilities".blue(), req.capabilities.join(", "));
    }

    if !req.owners.is_empty() {
        let owners = req
            .owners
            .iter()
            .map(|o| format!("{} ({})", o.name, o.role))
            .collect::<Vec<_>>()
            .join(", ");
        println!("{}: {}", "Owners".blue(), owners);
    }

    if !req.features.is_empty() {
        println!("\n{}:", "Features".green());
        for feature in &req.features {
            println!(
                "  {} {} - {}",
                status_glyph(srt_core::feature_status(feature)),
                feature.id,
                feature.title
            );
            for ac in &feature.acceptance_criteria {
                println!("      AC: {}", ac);
            }
            for nfr in &feature.nfrs {
                println!("      NFR: {} {}", nfr.category, nfr.target);
            }
        }
    }

    if !req.impacted_applications.is_empty() {
        println!("\n{}: {}", "Impacted applications".green(), req.impacted_app_names().join(", "));
    }

    if !req.app_dependencies.is_empty() {
        println!("\n{}:", "Dependencies".green());
        for dep in &req.app_dependencies {
            println!("  {} → {} ({})", dep.from, dep.to, dep.dep_type);
        }
    }

    Ok(())
}

fn show_checklist(workspace: &Workspace, br_id: &str) -> Result<()> {
    let req = workspace.requirement(br_id)?;

    let checklist = compute_checklist(req);

    println!("{} {}", req.id.blue().bold(), req.title);
    for (item, status) in checklist.entries() {
        println!("  {:<32} {}", item.to_string(), status_glyph(status));
    }
    println!("  {:<32} {}", "overall".bold(), status_glyph(checklist.overall()));

    Ok(())
}

fn show_missing(workspace: &Workspace, br_id: &str) -> Result<()> {
    let req = workspace.requirement(br_id)?;
    let missing_info = compute_missing_info(req);

    if missing_info.is_empty() {
        println!("{}", format!("{} has no missing information.", req.id).green());
        return Ok(());
    }

    for missing in &missing_info {
        println!("  {} {}", "❌".red(), missing.prompt);
    }

    Ok(())
}

fn show_status(workspace: &Workspace) -> Result<()> {
    let template = workspace.template()?;
    let progress = TemplateProgress::of(&template.business_requirements);

    println!("{} {}", template.srt_id.blue().bold(), template.title.bold());
    println!(
        "Business requirements: {} ({} complete, {} partial, {} blocked)",
        progress.total_requirements,
        progress.complete.to_string().green(),
        progress.partial.to_string().yellow(),
        progress.blocked.to_string().red()
    );
    println!("Features: {}", progress.total_features);
    println!(
        "Acceptance criteria coverage: {:.0}%",
        progress.acceptance_criteria_rate * 100.0
    );
    println!("Complete: {}%", progress.percent_complete());

    Ok(())
}

fn suggest_apps(workspace: &Workspace, br_id: &str, apply: bool) -> Result<()> {
    let request = SuggestRequest {
        target: workspace.target(br_id)?,
        declared_apps: None,
    };
    let response = workspace.assistant().suggest_apps(&request)?;

    if response.impacted.is_empty() {
        println!("{}", "No applications suggested.".yellow());
        return Ok(());
    }

    for app in &response.impacted {
        println!("  {:<18} {:.2}  {}", app.app.cyan(), app.confidence, app.reason);
    }

    if apply {
        let count = response.impacted.len();
        workspace.update_requirement(br_id, |req| {
            req.apply_impacted_applications(response.impacted)
        })?;
        println!(
            "{}",
            format!("Saved {} impacted application(s) to {}", count, br_id).green()
        );
    }

    Ok(())
}

fn suggest_deps(
    workspace: &Workspace,
    br_id: &str,
    apps: Option<Vec<String>>,
    apply: bool,
) -> Result<()> {
    let request = SuggestRequest {
        target: workspace.target(br_id)?,
        declared_apps: apps,
    };
    let response = workspace.assistant().suggest_deps(&request)?;

    if response.dependencies.is_empty() {
        println!("{}", "No dependencies suggested.".yellow());
        return Ok(());
    }

    for dep in &response.dependencies {
        println!(
            "  {} → {} ({}) {:.2}",
            dep.from.cyan(),
            dep.to.cyan(),
            dep.dep_type,
            dep.confidence
        );
    }

    if apply {
        let count = response.dependencies.len();
        workspace.update_requirement(br_id, |req| req.apply_dependencies(response.dependencies))?;
        println!(
            "{}",
            format!("Saved {} dependencies to {}", count, br_id).green()
        );
    }

    Ok(())
}

fn draft_ac(workspace: &Workspace, br_id: &str, apply: bool) -> Result<()> {
    let DraftAcResponse {
        acceptance_criteria,
        provenance,
    } = workspace.assistant().draft_ac(&workspace.target(br_id)?)?;

    for ac in &acceptance_criteria {
        println!("  - {}", ac);
    }
    for p in &provenance {
        println!("  {} {}", "source:".dimmed(), p.source);
    }

    if apply {
        let applied = workspace.update_requirement(br_id, |req| {
            req.apply_acceptance_criteria(acceptance_criteria)
        })?;
        report_feature_apply(br_id, applied, "acceptance criteria");
    }

    Ok(())
}

fn draft_nfrs(workspace: &Workspace, br_id: &str, apply: bool) -> Result<()> {
    let DraftNfrsResponse { nfrs, provenance } =
        workspace.assistant().draft_nfrs(&workspace.target(br_id)?)?;

    for nfr in &nfrs {
        match &nfr.notes {
            Some(notes) => println!("  {:<14} {:<16} {}", nfr.category, nfr.target, notes),
            None => println!("  {:<14} {}", nfr.category, nfr.target),
        }
    }
    for p in &provenance {
        println!("  {} {}", "source:".dimmed(), p.source);
    }

    if apply {
        let applied = workspace.update_requirement(br_id, |req| req.apply_nfrs(nfrs))?;
        report_feature_apply(br_id, applied, "NFRs");
    }

    Ok(())
}

fn report_feature_apply(br_id: &str, applied: bool, what: &str) {
    if applied {
        println!(
            "{}",
            format!("Saved {} to the first feature of {}", what, br_id).green()
        );
    } else {
        println!(
            "{}",
            format!("{} has no features; {} were not saved", br_id, what).yellow()
        );
    }
}

fn show_graph(workspace: &Workspace, view: &GraphView, output: Option<&Path>) -> Result<()> {
    let graph = workspace
        .assistant()
        .graph(&workspace.template_id()?, view)?;

    match output {
        Some(path) => export_graph_json(&graph, path)?,
        None => println!("{}", serde_json::to_string_pretty(&graph)?),
    }

    Ok(())
}

fn create_items(workspace: &Workspace, br_id: &str, skip_confirm: bool) -> Result<()> {
    let confirm = if skip_confirm {
        true
    } else {
        let existing = workspace.template()?.requirement(br_id);
        crate::prompts::confirm_create_items(br_id, existing)?
    };

    let request = CreateWorkItemsRequest {
        confirm,
        requirement_id: br_id.to_string(),
    };

    match workspace.assistant().create_work_items(&request) {
        Ok(items) => {
            println!("{}", "Work items created:".green());
            for artifact in &items.created {
                println!(
                    "  {:<20} {} (ref {})",
                    artifact.artifact_type,
                    artifact.id.cyan(),
                    artifact.reference
                );
            }
            Ok(())
        }
        Err(e @ CoreError::Validation(_)) => {
            println!("{}", e.to_string().yellow());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn show_intent(workspace: &Workspace) -> Result<()> {
    let intent = workspace
        .assistant()
        .solution_intent(&workspace.template_id()?)?;

    println!("{}", intent.overview.bold());

    print_section("Context actors", &intent.context_actors);
    print_section("Application landscape", &intent.app_landscape);
    print_section("Data flows", &intent.data_flows);
    let nfrs: Vec<String> = intent
        .nfrs
        .iter()
        .map(|n| format!("{}: {}", n.category, n.target))
        .collect();
    print_section("NFRs", &nfrs);
    print_section("Risks", &intent.risks);
    print_section("Open questions", &intent.open_questions);

    println!(
        "\n{} {}",
        "dependency map:".dimmed(),
        intent.dependency_map_snapshot_id
    );
    for p in &intent.provenance {
        println!("\n{} {} \"{}\"", "source:".dimmed(), p.source, p.snippet);
    }

    Ok(())
}

fn print_section(heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("\n{}:", heading.green());
    for item in items {
        println!("  - {}", item);
    }
}

fn handle_export_command(workspace: &Workspace, format: ExportFormat, output: &Path) -> Result<()> {
    match format {
        ExportFormat::Status => export_status_report(workspace.template()?, output),
        ExportFormat::Graph => {
            let view = GraphView::from_mode(workspace.config.default_view, None);
            let graph = workspace
                .assistant()
                .graph(&workspace.template_id()?, &view)?;
            export_graph_json(&graph, output)
        }
    }
}

fn handle_config_command(cmd: &ConfigCommand, config_path: &Path, config: &Config) -> Result<()> {
    match cmd {
        ConfigCommand::Init => {
            if Config::create_default(config_path)? {
                println!(
                    "{}",
                    format!("Created config file: {}", config_path.display()).green()
                );
            } else {
                println!(
                    "{}",
                    format!("Config file already exists: {}", config_path.display()).yellow()
                );
            }
        }
        ConfigCommand::Show => {
            println!("{}", "Configuration:".blue().bold());
            println!("{}: {}", "Config file".cyan(), config_path.display());
            println!("{}: {}", "Data path".cyan(), config.data_path);
            println!(
                "{}: {}",
                "Resolved data file".cyan(),
                config.resolve_data_path(None).display()
            );
            println!(
                "{}: {}",
                "Default template".cyan(),
                config.default_template.as_deref().unwrap_or("(none)")
            );
            println!("{}: {}", "Default view".cyan(), config.default_view);
        }
    }

    Ok(())
}
