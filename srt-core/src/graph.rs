//! Graph Builder
//!
//! Turns business requirements into a node/edge render payload. Two views
//! share one payload shape:
//!
//! | View       | Nodes                              | Edges                         |
//! |------------|------------------------------------|-------------------------------|
//! | Hierarchy  | SRT root, every BR, every feature  | `contains`, `decomposes`      |
//! | Subgraph   | focused BR, its features (radial)  | `decomposes`                  |
//! | Dependency | focused BR, its applications       | `impacts`, typed dependencies |
//!
//! The builder never mutates requirements and never fails. An unknown focus
//! falls back to the full tree in the hierarchy mode and to an empty graph
//! in the dependency mode.
//!
//! Node ids are unique: when two entities share an id the first one is kept
//! and edges belonging to the dropped one are not emitted.

use log::{debug, warn};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::checklist::{feature_status, requirement_status};
use crate::models::{ChecklistStatus, EdgeType, Feature, Requirement, Template};

/// Id of the root node when no template is supplied
pub const ROOT_NODE_ID: &str = "srt-root";

const FEATURE_LABEL_MAX: usize = 20;
const FEATURE_DESCRIPTION_MAX: usize = 60;
const SCOPE_DESCRIPTION_MAX: usize = 100;

/// Which graph shape to build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphView {
    /// SRT → BR → Feature tree
    Hierarchy,
    /// Hierarchy mode with a BR selected: that BR and its features only
    Subgraph { focus: String },
    /// One BR with its applications and typed dependencies
    Dependency { focus: String },
}

impl GraphView {
    /// Builds a view from a mode name and optional focus id.
    ///
    /// Dependency mode without a focus resolves to an empty focus, which
    /// degrades to an empty graph.
    pub fn from_mode(mode: GraphMode, focus: Option<&str>) -> Self {
        match mode {
            GraphMode::Hierarchy => match focus.filter(|f| !f.is_empty()) {
                Some(focus) => GraphView::Subgraph {
                    focus: focus.to_string(),
                },
                None => GraphView::Hierarchy,
            },
            GraphMode::Dependency => GraphView::Dependency {
                focus: focus.unwrap_or_default().to_string(),
            },
        }
    }
}

/// View selector without payload, as accepted on the command line and in config
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GraphMode {
    #[default]
    Hierarchy,
    Dependency,
}

impl FromStr for GraphMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hierarchy" => Ok(GraphMode::Hierarchy),
            "dependency" | "dependencies" => Ok(GraphMode::Dependency),
            _ => Err(format!("Unknown graph mode: {}", s)),
        }
    }
}

impl fmt::Display for GraphMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphMode::Hierarchy => write!(f, "hierarchy"),
            GraphMode::Dependency => write!(f, "dependency"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NodeKind {
    #[serde(rename = "SRT")]
    Srt,
    #[serde(rename = "BR")]
    Br,
    #[serde(rename = "FR", alias = "Feature")]
    Feature,
    Application,
}

/// Edge kind: a structural relation or a typed application dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Contains,
    Decomposes,
    Impacts,
    Dependency(EdgeType),
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::Contains => "contains",
            EdgeKind::Decomposes => "decomposes",
            EdgeKind::Impacts => "impacts",
            EdgeKind::Dependency(t) => t.as_str(),
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EdgeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contains" => Ok(EdgeKind::Contains),
            "decomposes" => Ok(EdgeKind::Decomposes),
            "impacts" => Ok(EdgeKind::Impacts),
            other => other.parse::<EdgeType>().map(EdgeKind::Dependency),
        }
    }
}

impl Serialize for EdgeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EdgeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Layout hint; carries no meaning beyond placement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Completeness of BR and feature nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ChecklistStatus>,
    pub position: Position,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    pub label: String,
}

/// Render payload handed verbatim to the drawing collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Gets a node by id
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Accumulates a graph while keeping node ids unique (first insertion wins)
#[derive(Default)]
struct GraphAccumulator {
    graph: Graph,
    node_ids: HashSet<String>,
}

impl GraphAccumulator {
    fn add_node(&mut self, node: GraphNode) -> bool {
        if !self.node_ids.insert(node.id.clone()) {
            debug!("Collapsing duplicate graph node {}", node.id);
            return false;
        }
        self.graph.nodes.push(node);
        true
    }

    fn has_node(&self, id: &str) -> bool {
        self.node_ids.contains(id)
    }

    fn add_edge(&mut self, kind: EdgeKind, id: String, source: &str, target: &str) {
        self.graph.edges.push(GraphEdge {
            id,
            source: source.to_string(),
            target: target.to_string(),
            kind,
            label: kind.as_str().to_string(),
        });
    }

    fn finish(self) -> Graph {
        self.graph
    }
}

/// Root node details for the hierarchy view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootInfo {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
}

impl Default for RootInfo {
    fn default() -> Self {
        Self {
            id: ROOT_NODE_ID.to_string(),
            label: "SRT".to_string(),
            description: Some("Solution Requirements Template".to_string()),
        }
    }
}

impl RootInfo {
    /// Root labelled after a template
    pub fn for_template(template: &Template) -> Self {
        Self {
            id: format!("SRT-{}", template.srt_id),
            label: if template.title.is_empty() {
                format!("SRT: {}", template.srt_id)
            } else {
                template.title.clone()
            },
            description: if template.scope.is_empty() {
                None
            } else {
                Some(truncate(&template.scope, SCOPE_DESCRIPTION_MAX))
            },
        }
    }
}

/// Builds a graph of `requirements` in the given view with a generic root node
pub fn build_graph(requirements: &[Requirement], view: &GraphView) -> Graph {
    build_graph_with_root(&RootInfo::default(), requirements, view)
}

/// Builds a graph of a whole template, labelling the root after it
pub fn build_template_graph(template: &Template, view: &GraphView) -> Graph {
    build_graph_with_root(
        &RootInfo::for_template(template),
        &template.business_requirements,
        view,
    )
}

/// Dispatches on the view; both branches return the same payload shape
pub fn build_graph_with_root(root: &RootInfo, requirements: &[Requirement], view: &GraphView) -> Graph {
    let graph = match view {
        GraphView::Hierarchy => build_hierarchy(root, requirements),
        GraphView::Subgraph { focus } => match requirements.iter().find(|r| &r.id == focus) {
            Some(req) => build_subgraph(req),
            None => {
                warn!("Focus requirement '{}' not found; showing the full hierarchy", focus);
                build_hierarchy(root, requirements)
            }
        },
        GraphView::Dependency { focus } => match requirements.iter().find(|r| &r.id == focus) {
            Some(req) => build_dependency(req),
            None => {
                warn!("Focus requirement '{}' not found; returning empty graph", focus);
                Graph::default()
            }
        },
    };
    debug!(
        "Built {:?} graph with {} nodes and {} edges",
        view,
        graph.nodes.len(),
        graph.edges.len()
    );
    graph
}

// Grid layout: requirements in a row, features stacked under their requirement.
const BR_SPACING: f64 = 300.0;
const GRID_LEFT: f64 = 50.0;
const ROOT_Y: f64 = 50.0;
const BR_Y: f64 = 250.0;
const FEATURE_Y: f64 = 420.0;
const FEATURE_SPACING: f64 = 120.0;

fn build_hierarchy(root: &RootInfo, requirements: &[Requirement]) -> Graph {
    let mut acc = GraphAccumulator::default();

    let span = requirements.len().saturating_sub(1) as f64 * BR_SPACING;
    acc.add_node(GraphNode {
        id: root.id.clone(),
        kind: NodeKind::Srt,
        label: root.label.clone(),
        description: root.description.clone(),
        status: None,
        position: Position::new(GRID_LEFT + span / 2.0, ROOT_Y),
    });

    for (index, req) in requirements.iter().enumerate() {
        let x = GRID_LEFT + index as f64 * BR_SPACING;

        let added = acc.add_node(GraphNode {
            id: req.id.clone(),
            kind: NodeKind::Br,
            label: req.id.clone(),
            description: Some(req.title.clone()),
            status: Some(requirement_status(req)),
            position: Position::new(x, BR_Y),
        });
        if !added {
            continue;
        }
        acc.add_edge(
            EdgeKind::Contains,
            format!("srt-to-{}", req.id),
            &root.id,
            &req.id,
        );

        for (feature_index, feature) in req.features.iter().enumerate() {
            let position = Position::new(x, FEATURE_Y + feature_index as f64 * FEATURE_SPACING);
            add_feature(&mut acc, req, feature, position);
        }
    }

    acc.finish()
}

fn add_feature(acc: &mut GraphAccumulator, req: &Requirement, feature: &Feature, position: Position) {
    let added = acc.add_node(GraphNode {
        id: feature.id.clone(),
        kind: NodeKind::Feature,
        label: truncate(&feature.title, FEATURE_LABEL_MAX),
        description: Some(truncate(&feature.description, FEATURE_DESCRIPTION_MAX)),
        status: Some(feature_status(feature)),
        position,
    });
    if added {
        acc.add_edge(
            EdgeKind::Decomposes,
            format!("{}-to-{}", req.id, feature.id),
            &req.id,
            &feature.id,
        );
    }
}

// Single-requirement layout: features on a circle around the requirement.
const SUBGRAPH_CENTER_X: f64 = 400.0;
const SUBGRAPH_CENTER_Y: f64 = 150.0;
const SUBGRAPH_RADIUS: f64 = 250.0;

fn build_subgraph(req: &Requirement) -> Graph {
    let mut acc = GraphAccumulator::default();

    acc.add_node(GraphNode {
        id: req.id.clone(),
        kind: NodeKind::Br,
        label: req.id.clone(),
        description: Some(req.title.clone()),
        status: Some(requirement_status(req)),
        position: Position::new(SUBGRAPH_CENTER_X, SUBGRAPH_CENTER_Y),
    });

    let count = req.features.len().max(1) as f64;
    for (index, feature) in req.features.iter().enumerate() {
        let angle = index as f64 * 2.0 * PI / count;
        let position = Position::new(
            SUBGRAPH_CENTER_X + angle.cos() * SUBGRAPH_RADIUS,
            SUBGRAPH_CENTER_Y + angle.sin() * SUBGRAPH_RADIUS,
        );
        add_feature(&mut acc, req, feature, position);
    }

    acc.finish()
}

// Radial layout around the focused requirement.
const CENTER_X: f64 = 400.0;
const CENTER_Y: f64 = 300.0;
const RADIUS: f64 = 300.0;
const OUTER_RADIUS: f64 = 450.0;

fn radial(index: usize, count: usize, radius: f64) -> Position {
    let angle = index as f64 * 2.0 * PI / count.max(1) as f64;
    Position::new(CENTER_X + angle.cos() * radius, CENTER_Y + angle.sin() * radius)
}

fn build_dependency(req: &Requirement) -> Graph {
    let mut acc = GraphAccumulator::default();

    acc.add_node(GraphNode {
        id: req.id.clone(),
        kind: NodeKind::Br,
        label: req.id.clone(),
        description: Some(req.title.clone()),
        status: Some(requirement_status(req)),
        position: Position::new(CENTER_X, CENTER_Y),
    });

    let app_names = req.impacted_app_names();
    for (index, name) in app_names.iter().enumerate() {
        let reason = req
            .impacted_applications
            .iter()
            .find(|a| &a.app == name)
            .map(|a| a.reason.clone())
            .filter(|r| !r.is_empty());

        let added = acc.add_node(GraphNode {
            id: name.clone(),
            kind: NodeKind::Application,
            label: name.clone(),
            description: reason,
            status: None,
            position: radial(index, app_names.len(), RADIUS),
        });
        if !added {
            continue;
        }
        acc.add_edge(
            EdgeKind::Impacts,
            format!("{}-impacts-{}", req.id, name),
            &req.id,
            name,
        );
    }

    // Endpoints not already impacted still get a node so no edge dangles.
    let mut extra: Vec<&str> = Vec::new();
    for dep in &req.app_dependencies {
        for endpoint in [dep.from.as_str(), dep.to.as_str()] {
            if !acc.has_node(endpoint) && !extra.contains(&endpoint) {
                extra.push(endpoint);
            }
        }
    }
    for (index, name) in extra.iter().enumerate() {
        acc.add_node(GraphNode {
            id: name.to_string(),
            kind: NodeKind::Application,
            label: name.to_string(),
            description: None,
            status: None,
            position: radial(index, extra.len(), OUTER_RADIUS),
        });
    }

    let mut seen = HashSet::new();
    for dep in &req.app_dependencies {
        if !seen.insert(dep.key()) {
            continue;
        }
        acc.add_edge(
            EdgeKind::Dependency(dep.dep_type),
            format!("dep-{}-{}-{}", dep.from, dep.to, dep.dep_type),
            &dep.from,
            &dep.to,
        );
    }

    acc.finish()
}

/// Shortens `text` to `max` characters, appending "..." when cut
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
