use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::checklist;

/// Reads an optional value, treating both a missing key and an explicit
/// `null` as the type's default. Applied to every list and free-text field
/// so malformed input coalesces to empty once, at load time.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Completeness value of a single checklist field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ChecklistStatus {
    #[serde(rename = "✔️")]
    Satisfied,
    /// Reserved for aggregated values; no single checklist rule emits it
    #[serde(rename = "⚠️")]
    Partial,
    #[serde(rename = "❌")]
    #[default]
    Unsatisfied,
}

impl ChecklistStatus {
    /// Maps a rule outcome onto the two values the rules can produce
    pub fn from_bool(ok: bool) -> Self {
        if ok {
            ChecklistStatus::Satisfied
        } else {
            ChecklistStatus::Unsatisfied
        }
    }

    /// Ordering used for worst-of aggregation: ❌ > ⚠️ > ✔️
    pub fn severity(self) -> u8 {
        match self {
            ChecklistStatus::Satisfied => 0,
            ChecklistStatus::Partial => 1,
            ChecklistStatus::Unsatisfied => 2,
        }
    }

    /// Returns the worse of two statuses
    pub fn worst(self, other: Self) -> Self {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            ChecklistStatus::Satisfied => "✔️",
            ChecklistStatus::Partial => "⚠️",
            ChecklistStatus::Unsatisfied => "❌",
        }
    }
}

impl fmt::Display for ChecklistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

/// The nine named fields of a checklist
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistItem {
    Title,
    Description,
    CapabilityMap,
    ImpactedApps,
    TypedDependencies,
    AcceptanceCriteria,
    Nfrs,
    RisksAssumptionsConstraints,
    Owners,
}

impl ChecklistItem {
    /// All items in checklist declaration order
    pub const ALL: [ChecklistItem; 9] = [
        ChecklistItem::Title,
        ChecklistItem::Description,
        ChecklistItem::CapabilityMap,
        ChecklistItem::ImpactedApps,
        ChecklistItem::TypedDependencies,
        ChecklistItem::AcceptanceCriteria,
        ChecklistItem::Nfrs,
        ChecklistItem::RisksAssumptionsConstraints,
        ChecklistItem::Owners,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChecklistItem::Title => "title",
            ChecklistItem::Description => "description",
            ChecklistItem::CapabilityMap => "capability_map",
            ChecklistItem::ImpactedApps => "impacted_apps",
            ChecklistItem::TypedDependencies => "typed_dependencies",
            ChecklistItem::AcceptanceCriteria => "acceptance_criteria",
            ChecklistItem::Nfrs => "nfrs",
            ChecklistItem::RisksAssumptionsConstraints => "risks_assumptions_constraints",
            ChecklistItem::Owners => "owners",
        }
    }
}

impl fmt::Display for ChecklistItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Completeness record of a business requirement.
///
/// Always derived by [`checklist::compute_checklist`]; a stored copy is
/// only a cache of the last recomputation and is never read back from a
/// file: [`Requirement`] skips it on load, so stale keys or glyphs cannot
/// fail a load.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Checklist {
    pub title: ChecklistStatus,
    pub description: ChecklistStatus,
    pub capability_map: ChecklistStatus,
    pub impacted_apps: ChecklistStatus,
    pub typed_dependencies: ChecklistStatus,
    pub acceptance_criteria: ChecklistStatus,
    pub nfrs: ChecklistStatus,
    pub risks_assumptions_constraints: ChecklistStatus,
    pub owners: ChecklistStatus,
}

impl Checklist {
    /// Gets the value of a single field
    pub fn get(&self, item: ChecklistItem) -> ChecklistStatus {
        match item {
            ChecklistItem::Title => self.title,
            ChecklistItem::Description => self.description,
            ChecklistItem::CapabilityMap => self.capability_map,
            ChecklistItem::ImpactedApps => self.impacted_apps,
            ChecklistItem::TypedDependencies => self.typed_dependencies,
            ChecklistItem::AcceptanceCriteria => self.acceptance_criteria,
            ChecklistItem::Nfrs => self.nfrs,
            ChecklistItem::RisksAssumptionsConstraints => self.risks_assumptions_constraints,
            ChecklistItem::Owners => self.owners,
        }
    }

    /// Iterates over (item, value) pairs in declaration order
    pub fn entries(&self) -> impl Iterator<Item = (ChecklistItem, ChecklistStatus)> + '_ {
        ChecklistItem::ALL.iter().map(move |item| (*item, self.get(*item)))
    }

    /// Worst value across all fields
    pub fn overall(&self) -> ChecklistStatus {
        self.entries()
            .map(|(_, status)| status)
            .fold(ChecklistStatus::Satisfied, ChecklistStatus::worst)
    }
}

/// A remediation prompt for an unsatisfied checklist field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MissingInfo {
    pub item: ChecklistItem,
    pub prompt: String,
}

/// Records where a derived fact came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Provenance {
    pub source: String,
    #[serde(default, deserialize_with = "nullable")]
    pub snippet: String,
}

impl Provenance {
    pub fn new(source: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            snippet: snippet.into(),
        }
    }

    /// Provenance pointing at a row of the source spreadsheet
    pub fn excel(row_id: &str, snippet: impl Into<String>) -> Self {
        Self::new(format!("excel:{}", row_id), snippet)
    }
}

/// Interaction style of a dependency between two applications
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EdgeType {
    #[serde(rename = "API")]
    Api,
    Event,
    #[serde(rename = "SharedDB")]
    SharedDb,
    Batch,
    File,
    #[serde(rename = "UI")]
    Ui,
}

impl EdgeType {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeType::Api => "API",
            EdgeType::Event => "Event",
            EdgeType::SharedDb => "SharedDB",
            EdgeType::Batch => "Batch",
            EdgeType::File => "File",
            EdgeType::Ui => "UI",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EdgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "api" => Ok(EdgeType::Api),
            "event" => Ok(EdgeType::Event),
            "shareddb" | "shared_db" | "shared-db" => Ok(EdgeType::SharedDb),
            "batch" => Ok(EdgeType::Batch),
            "file" => Ok(EdgeType::File),
            "ui" => Ok(EdgeType::Ui),
            _ => Err(format!("Unknown dependency type: {}", s)),
        }
    }
}

/// Role a person plays for a business requirement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OwnerRole {
    #[serde(rename = "TPM")]
    Tpm,
    #[serde(rename = "SA")]
    Sa,
    #[serde(rename = "PO")]
    Po,
    DevLead,
}

impl fmt::Display for OwnerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerRole::Tpm => write!(f, "TPM"),
            OwnerRole::Sa => write!(f, "SA"),
            OwnerRole::Po => write!(f, "PO"),
            OwnerRole::DevLead => write!(f, "DevLead"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Owner {
    pub role: OwnerRole,
    pub name: String,
}

/// Non-functional requirement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Nfr {
    pub category: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Nfr {
    pub fn new(category: &str, target: &str, notes: Option<&str>) -> Self {
        Self {
            category: category.to_string(),
            target: target.to_string(),
            notes: notes.map(str::to_string),
        }
    }
}

/// Decomposition unit of a business requirement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Feature {
    #[serde(rename = "feature_id")]
    pub id: String,

    #[serde(default, deserialize_with = "nullable")]
    pub title: String,

    #[serde(default, deserialize_with = "nullable")]
    pub description: String,

    #[serde(default, deserialize_with = "nullable")]
    pub acceptance_criteria: Vec<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub nfrs: Vec<Nfr>,

    #[serde(default, deserialize_with = "nullable")]
    pub risks: Vec<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub assumptions: Vec<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub constraints: Vec<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub provenance: Vec<Provenance>,
}

impl Feature {
    /// Creates a feature with empty lists
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// True if any of risks, assumptions or constraints is recorded
    pub fn has_risks_assumptions_constraints(&self) -> bool {
        !self.risks.is_empty() || !self.assumptions.is_empty() || !self.constraints.is_empty()
    }
}

/// An application flagged as affected by a business requirement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImpactedApplication {
    pub app: String,

    #[serde(default, deserialize_with = "nullable")]
    pub reason: String,

    #[serde(default)]
    pub confidence: f64,

    #[serde(default, deserialize_with = "nullable")]
    pub provenance: Vec<Provenance>,
}

/// A typed, directed dependency between two applications
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppDependency {
    pub from: String,
    pub to: String,

    #[serde(rename = "type")]
    pub dep_type: EdgeType,

    #[serde(default)]
    pub confidence: f64,

    #[serde(default, deserialize_with = "nullable")]
    pub provenance: Vec<Provenance>,
}

impl AppDependency {
    /// Identity used when collapsing repeated dependencies
    pub fn key(&self) -> (&str, &str, EdgeType) {
        (&self.from, &self.to, self.dep_type)
    }
}

/// A Business Requirement (BR), the unit of completeness tracking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Requirement {
    /// Identifier unique within a template (e.g., "BR01")
    #[serde(rename = "br_id")]
    pub id: String,

    #[serde(default, deserialize_with = "nullable")]
    pub title: String,

    #[serde(default, deserialize_with = "nullable")]
    pub description: String,

    /// Capability tags
    #[serde(default, deserialize_with = "nullable")]
    pub capabilities: Vec<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub features: Vec<Feature>,

    #[serde(default, deserialize_with = "nullable")]
    pub impacted_applications: Vec<ImpactedApplication>,

    #[serde(default, deserialize_with = "nullable")]
    pub app_dependencies: Vec<AppDependency>,

    #[serde(default, deserialize_with = "nullable")]
    pub owners: Vec<Owner>,

    /// Derived; see [`Requirement::refresh`]. Written out, never read back.
    #[serde(skip_deserializing)]
    pub checklist: Checklist,

    /// Derived; see [`Requirement::refresh`]. Written out, never read back.
    #[serde(skip_deserializing)]
    pub missing_info: Vec<MissingInfo>,
}

impl Requirement {
    /// Creates a requirement with the given id and title and no other content
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let mut req = Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        };
        req.refresh();
        req
    }

    /// Recomputes the derived checklist and missing-info list.
    ///
    /// Must run after every mutation; the mutation helpers below do so.
    pub fn refresh(&mut self) {
        self.checklist = checklist::compute_checklist(self);
        self.missing_info = checklist::compute_missing_info(self);
    }

    /// Names of the impacted applications, first occurrence wins
    pub fn impacted_app_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for app in &self.impacted_applications {
            if !names.contains(&app.app) {
                names.push(app.app.clone());
            }
        }
        names
    }

    /// Replaces the first feature's acceptance criteria.
    ///
    /// Returns false (and changes nothing) when the requirement has no features.
    pub fn apply_acceptance_criteria(&mut self, criteria: Vec<String>) -> bool {
        let applied = match self.features.first_mut() {
            Some(feature) => {
                feature.acceptance_criteria = criteria;
                true
            }
            None => false,
        };
        self.refresh();
        applied
    }

    /// Replaces the first feature's NFRs; same no-feature rule as acceptance criteria
    pub fn apply_nfrs(&mut self, nfrs: Vec<Nfr>) -> bool {
        let applied = match self.features.first_mut() {
            Some(feature) => {
                feature.nfrs = nfrs;
                true
            }
            None => false,
        };
        self.refresh();
        applied
    }

    /// Replaces the impacted application list
    pub fn apply_impacted_applications(&mut self, apps: Vec<ImpactedApplication>) {
        self.impacted_applications = apps;
        self.refresh();
    }

    /// Accepts dependency candidates, replacing the current list
    pub fn apply_dependencies(&mut self, deps: Vec<AppDependency>) {
        self.app_dependencies = deps;
        self.refresh();
    }
}

/// Spreadsheet row a business requirement was parsed from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SourceRow {
    pub row_id: String,
    pub br_id: String,

    #[serde(default, deserialize_with = "nullable")]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Applications the author already named for this row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impacted_apps_hint: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MeetingNote {
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,

    #[serde(default, deserialize_with = "nullable")]
    pub text: String,
}

/// A parsed Solution Requirements Template (SRT)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Template {
    /// Canonical id; filled from `id` when a file only carries that key
    #[serde(default, deserialize_with = "nullable")]
    pub srt_id: String,

    /// Second id key some template files carry next to `srt_id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub title: String,

    #[serde(default, deserialize_with = "nullable")]
    pub scope: String,

    #[serde(default, deserialize_with = "nullable")]
    pub history: String,

    #[serde(default, deserialize_with = "nullable")]
    pub business_requirements: Vec<Requirement>,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub excel_rows: Vec<SourceRow>,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub meeting_notes: Vec<MeetingNote>,
}

impl Template {
    /// Creates an empty template
    pub fn new(srt_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            srt_id: srt_id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// True when either id key equals `id`
    pub fn answers_to(&self, id: &str) -> bool {
        self.srt_id == id || self.id.as_deref() == Some(id)
    }

    /// Gets a business requirement by id
    pub fn requirement(&self, br_id: &str) -> Option<&Requirement> {
        self.business_requirements.iter().find(|r| r.id == br_id)
    }

    /// Gets a mutable reference to a business requirement by id
    pub fn requirement_mut(&mut self, br_id: &str) -> Option<&mut Requirement> {
        self.business_requirements.iter_mut().find(|r| r.id == br_id)
    }

    /// Gets the source row for a business requirement id
    pub fn source_row(&self, br_id: &str) -> Option<&SourceRow> {
        self.excel_rows.iter().find(|r| r.br_id == br_id)
    }

    /// Coalesces the id keys and recomputes derived fields of every requirement
    pub fn refresh(&mut self) {
        if self.srt_id.is_empty() {
            if let Some(id) = &self.id {
                self.srt_id = id.clone();
            }
        }
        for req in &mut self.business_requirements {
            req.refresh();
        }
    }
}

/// Root of a template file: every SRT known to the caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TemplateLibrary {
    #[serde(default, deserialize_with = "nullable")]
    pub srts: Vec<Template>,
}

impl TemplateLibrary {
    /// Creates an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a template by id
    pub fn template(&self, srt_id: &str) -> Option<&Template> {
        self.srts.iter().find(|t| t.answers_to(srt_id))
    }

    /// Gets a mutable reference to a template by id
    pub fn template_mut(&mut self, srt_id: &str) -> Option<&mut Template> {
        self.srts.iter_mut().find(|t| t.answers_to(srt_id))
    }

    /// Recomputes derived fields of every requirement in every template
    pub fn refresh(&mut self) {
        for template in &mut self.srts {
            template.refresh();
        }
    }
}
