//! Collaborator interfaces onto the prebuilt graph
//!
//! The query layer never owns graph data. It reads edges through
//! [`GraphStore`] and discovers them through [`SpatialIndex`]; both are
//! implemented elsewhere (and in-memory for tests, see
//! [`crate::test_support`]).

use crate::tilemath::GeoBBox;

pub type EdgeId = u64;
pub type NodeId = u64;

/// Attribute key every conforming graph must carry for tile rendering.
pub const ROAD_CLASS_KEY: &str = "road_class";

/// Road classification driving the level-of-detail policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoadClass {
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    Residential,
    Service,
    Other,
}

impl RoadClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoadClass::Motorway => "motorway",
            RoadClass::Trunk => "trunk",
            RoadClass::Primary => "primary",
            RoadClass::Secondary => "secondary",
            RoadClass::Tertiary => "tertiary",
            RoadClass::Residential => "residential",
            RoadClass::Service => "service",
            RoadClass::Other => "other",
        }
    }
}

/// Kind of a named edge attribute as stored in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Categorical,
    Decimal,
    Boolean,
    Integer,
}

/// A typed attribute value projected from one edge.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Categorical(String),
    Decimal(f64),
    Boolean(bool),
    Integer(i64),
}

impl AttributeValue {
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::Categorical(_) => AttributeKind::Categorical,
            AttributeValue::Decimal(_) => AttributeKind::Decimal,
            AttributeValue::Boolean(_) => AttributeKind::Boolean,
            AttributeValue::Integer(_) => AttributeKind::Integer,
        }
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Categorical(s) => write!(f, "{s}"),
            AttributeValue::Decimal(v) => write!(f, "{v}"),
            AttributeValue::Boolean(v) => write!(f, "{v}"),
            AttributeValue::Integer(v) => write!(f, "{v}"),
        }
    }
}

/// Read-only projection of one directed edge.
///
/// Request-scoped: built per spatial-index hit, dropped after encoding.
/// Geometry is an ordered (lon, lat) polyline that includes the base and
/// adjacent node positions as its first and last points.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeView {
    pub id: EdgeId,
    pub base_node: NodeId,
    pub adj_node: NodeId,
    pub geometry: Vec<(f64, f64)>,
    pub road_class: RoadClass,
    pub name: String,
    pub distance_m: f64,
}

impl EdgeView {
    /// Base and adjacent node positions as (lon, lat).
    ///
    /// Callers must check `geometry.len() >= 2` first; edges with fewer
    /// points are degenerate and skipped by the pipelines.
    pub fn endpoints(&self) -> ((f64, f64), (f64, f64)) {
        (self.geometry[0], self.geometry[self.geometry.len() - 1])
    }
}

/// Spatial index over graph edges.
///
/// The underlying index visits matching edges with a callback; here that
/// is surfaced as a lazy, finite, non-restartable iterator for one bbox.
pub trait SpatialIndex {
    fn edges_in(&self, bbox: &GeoBBox) -> Box<dyn Iterator<Item = EdgeId> + '_>;
}

/// Read access to edge records and the graph's attribute schema.
pub trait GraphStore {
    /// Edge projection for one id, `None` if the id is stale.
    fn edge_view(&self, id: EdgeId) -> Option<EdgeView>;

    /// Kind of a named attribute, `None` when the graph does not store it.
    fn attribute_kind(&self, name: &str) -> Option<AttributeKind>;

    /// Typed value of a named attribute on one edge.
    fn edge_attribute(&self, id: EdgeId, name: &str) -> Option<AttributeValue>;

    fn has_attribute(&self, name: &str) -> bool {
        self.attribute_kind(name).is_some()
    }
}
