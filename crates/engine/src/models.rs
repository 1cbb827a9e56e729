//! Core domain models for the workflow builder.
//!
//! These types are the source of truth for what a workflow looks like in
//! memory. They serialise to/from the JSON workflow document exchanged with
//! the canvas and the persistence layer, using the document's camelCase
//! field names.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use nodes::{Category, Handle, NodeDefinition, NodeError, NodeKind};

// ---------------------------------------------------------------------------
// WorkflowStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Editable; the only state nodes and connections may change in.
    #[default]
    Draft,
    /// Published and live; the graph is frozen.
    Active,
    /// Retired; kept for reference.
    Archived,
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft    => write!(f, "draft"),
            Self::Active   => write!(f, "active"),
            Self::Archived => write!(f, "archived"),
        }
    }
}

impl FromStr for WorkflowStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft"    => Ok(Self::Draft),
            "active"   => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            other      => Err(format!("unknown workflow status: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A single step in the workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier within this workflow (referenced by connections).
    pub id: String,
    /// Catalogue key, e.g. `"send_notification"`.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Redundant with the catalogue entry; must agree with it when present.
    /// Kept as written so an unknown category reaches validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Display name chosen by the author.
    #[serde(default)]
    pub name: String,
    /// Type-specific configuration. `null` reads as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub config: Map<String, Value>,
    /// Canvas placement and anything else the editor stores. Opaque here and
    /// written back untouched.
    #[serde(flatten)]
    pub layout: Map<String, Value>,
}

impl Node {
    /// Create a node of a catalogue kind with an empty configuration.
    pub fn new(id: impl Into<String>, kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: kind.as_str().to_owned(),
            category: Some(kind.definition().category.as_str().to_owned()),
            name: name.into(),
            config: Map::new(),
            layout: Map::new(),
        }
    }

    /// Replace the configuration with the given JSON object.
    ///
    /// Non-object values leave the configuration empty.
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = match config {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self
    }

    /// Place the node on the canvas.
    pub fn at(mut self, x: i64, y: i64) -> Self {
        self.layout.insert("x".to_owned(), Value::from(x));
        self.layout.insert("y".to_owned(), Value::from(y));
        self
    }

    /// Catalogue entry for this node's type.
    pub fn definition(&self) -> Result<&'static NodeDefinition, NodeError> {
        nodes::resolve(&self.node_type)
    }

    pub fn kind(&self) -> Option<NodeKind> {
        self.definition().ok().map(|def| def.kind)
    }

    /// The category stated in the document, parsed.
    pub fn declared_category(&self) -> Option<Result<Category, NodeError>> {
        self.category.as_deref().map(str::parse)
    }

    /// The document's category, falling back to the catalogue's.
    ///
    /// An unrecognised category is ignored. `None` only for an unknown type
    /// that also states no usable category.
    pub fn effective_category(&self) -> Option<Category> {
        self.declared_category()
            .and_then(Result::ok)
            .or_else(|| self.definition().ok().map(|def| def.category))
    }

    pub fn is_trigger(&self) -> bool {
        self.effective_category() == Some(Category::Trigger)
    }

    /// Whether the node routes through `branch-if` / `branch-else`.
    pub fn is_branching(&self) -> bool {
        self.definition().map_or(false, NodeDefinition::is_branching)
    }

    /// Name used in messages: the author's, else the catalogue's, else the raw type.
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            return &self.name;
        }
        match self.definition() {
            Ok(def) => def.name,
            Err(_) => &self.node_type,
        }
    }

    // -----------------------------------------------------------------------
    // Configuration access
    //
    // A value counts as set when it is truthy: null, "", 0 and false are all
    // treated as missing, matching how the editor stores cleared fields.
    // -----------------------------------------------------------------------

    /// Whether `key` holds a non-empty value.
    pub fn has_config(&self, key: &str) -> bool {
        self.config.get(key).map_or(false, is_truthy)
    }

    /// `key` rendered as text, if set.
    pub fn config_text(&self, key: &str) -> Option<String> {
        match self.config.get(key)? {
            value if !is_truthy(value) => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// `key` as an integer, if set and numeric (numeric strings included).
    pub fn config_int(&self, key: &str) -> Option<i64> {
        match self.config.get(key)? {
            value if !is_truthy(value) => None,
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => crate::sample::parse_leading_int(s),
            _ => None,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Truthiness of a stored configuration value.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

fn default_to_handle() -> String {
    "input".to_owned()
}

/// Directed, handle-qualified edge from one node to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub from: String,
    #[serde(default)]
    pub from_handle: Handle,
    pub to: String,
    #[serde(default = "default_to_handle")]
    pub to_handle: String,
}

impl Connection {
    /// A `default`-handle connection with a freshly generated ID.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::with_id(format!("conn_{}", Uuid::new_v4().simple()), from, Handle::Default, to)
    }

    /// A connection with an explicit ID and output handle.
    pub fn with_id(
        id: impl Into<String>,
        from: impl Into<String>,
        from_handle: Handle,
        to: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            from_handle,
            to: to.into(),
            to_handle: default_to_handle(),
        }
    }

    /// Same edge, leaving through `handle`.
    pub fn via(mut self, handle: Handle) -> Self {
        self.from_handle = handle;
        self
    }

    /// Whether `other` is the same `(from, fromHandle, to)` edge.
    pub fn same_edge(&self, other: &Connection) -> bool {
        self.from == other.from && self.from_handle == other.from_handle && self.to == other.to
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

fn default_version() -> String {
    "1.0".to_owned()
}

/// A complete workflow document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: WorkflowStatus,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Insertion order is preserved for display; the engines only rely on it
    /// to break ties deterministically.
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Workflow {
    /// A new, empty draft.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("wf_{}", Uuid::new_v4().simple()),
            name: name.into(),
            status: WorkflowStatus::Draft,
            version: default_version(),
            description: None,
            created_at: Some(now),
            updated_at: Some(now),
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Convenience constructor for tests and fixtures.
    pub fn from_parts(
        name: impl Into<String>,
        nodes: Vec<Node>,
        connections: Vec<Connection>,
    ) -> Self {
        Self { nodes, connections, ..Self::new(name) }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
