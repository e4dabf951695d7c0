//! In-memory collaborators for unit and integration tests
//!
//! [`MemoryGraph`] implements both [`GraphStore`] and [`SpatialIndex`]
//! over an R-tree of edge bounding boxes; [`HaversineRouter`] is a
//! deterministic [`Router`] with uniform travel speed. Both are linear
//! or log-time over small fixtures only.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use geo::HaversineDistance;
use geo::Point as GeoPoint;
use rstar::{primitives::GeomWithData, primitives::Rectangle, RTree, AABB};

use crate::error::QueryError;
use crate::graph::{
    AttributeKind, AttributeValue, EdgeId, EdgeView, GraphStore, NodeId, SpatialIndex,
    ROAD_CLASS_KEY,
};
use crate::router::{PathLeg, Point, ResolvedLocation, Router, SolverParams};
use crate::tilemath::GeoBBox;

/// Great-circle distance in meters between two (lat, lon) pairs.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let p1 = GeoPoint::new(lon1, lat1);
    let p2 = GeoPoint::new(lon2, lat2);
    p1.haversine_distance(&p2)
}

type IndexedEdge = GeomWithData<Rectangle<[f64; 2]>, EdgeId>;

/// In-memory graph store and spatial index over a fixed edge set.
///
/// Declares the `road_class` attribute by default; its per-edge value
/// is derived from each edge's classification.
pub struct MemoryGraph {
    edges: HashMap<EdgeId, EdgeView>,
    attributes: HashMap<String, AttributeKind>,
    values: HashMap<(EdgeId, String), AttributeValue>,
    tree: RTree<IndexedEdge>,
    queries: AtomicUsize,
}

impl MemoryGraph {
    pub fn with_edges(edges: Vec<EdgeView>) -> Self {
        let indexed: Vec<IndexedEdge> = edges
            .iter()
            .filter(|edge| !edge.geometry.is_empty())
            .map(|edge| {
                let mut min = [f64::INFINITY; 2];
                let mut max = [f64::NEG_INFINITY; 2];
                for &(lon, lat) in &edge.geometry {
                    min = [min[0].min(lon), min[1].min(lat)];
                    max = [max[0].max(lon), max[1].max(lat)];
                }
                GeomWithData::new(Rectangle::from_corners(min, max), edge.id)
            })
            .collect();
        let mut attributes = HashMap::new();
        attributes.insert(ROAD_CLASS_KEY.to_string(), AttributeKind::Categorical);
        Self {
            edges: edges.into_iter().map(|edge| (edge.id, edge)).collect(),
            attributes,
            values: HashMap::new(),
            tree: RTree::bulk_load(indexed),
            queries: AtomicUsize::new(0),
        }
    }

    /// Register a named attribute in the graph's schema.
    pub fn declare_attribute(&mut self, name: &str, kind: AttributeKind) {
        self.attributes.insert(name.to_string(), kind);
    }

    /// Remove a capability, e.g. to provoke `MissingCapability`.
    pub fn undeclare_attribute(&mut self, name: &str) {
        self.attributes.remove(name);
    }

    /// Set one edge's value for a declared attribute.
    pub fn set_attribute(&mut self, edge: EdgeId, name: &str, value: AttributeValue) {
        self.values.insert((edge, name.to_string()), value);
    }

    /// Number of bbox queries served so far; lets tests assert that
    /// low-zoom requests never touch the index.
    pub fn queries_served(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }
}

impl GraphStore for MemoryGraph {
    fn edge_view(&self, id: EdgeId) -> Option<EdgeView> {
        self.edges.get(&id).cloned()
    }

    fn attribute_kind(&self, name: &str) -> Option<AttributeKind> {
        self.attributes.get(name).copied()
    }

    fn edge_attribute(&self, id: EdgeId, name: &str) -> Option<AttributeValue> {
        if !self.attributes.contains_key(name) {
            return None;
        }
        if name == ROAD_CLASS_KEY {
            return self
                .edges
                .get(&id)
                .map(|edge| AttributeValue::Categorical(edge.road_class.as_str().to_string()));
        }
        self.values.get(&(id, name.to_string())).cloned()
    }
}

impl SpatialIndex for MemoryGraph {
    fn edges_in(&self, bbox: &GeoBBox) -> Box<dyn Iterator<Item = EdgeId> + '_> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let envelope = AABB::from_corners(
            [bbox.min_lon, bbox.min_lat],
            [bbox.max_lon, bbox.max_lat],
        );
        Box::new(
            self.tree
                .locate_in_envelope_intersecting(&envelope)
                .map(|entry| entry.data),
        )
    }
}

/// Deterministic router: every pair of nodes is directly connected and
/// traversed at a uniform speed.
pub struct HaversineRouter {
    speed_mps: f64,
    nodes: HashMap<NodeId, (f64, f64)>, // (lat, lon)
}

impl HaversineRouter {
    pub fn new(speed_mps: f64) -> Self {
        Self {
            speed_mps,
            nodes: HashMap::new(),
        }
    }

    pub fn add_node(&mut self, id: NodeId, lat: f64, lon: f64) {
        self.nodes.insert(id, (lat, lon));
    }
}

impl Router for HaversineRouter {
    type Context = SolverParams;

    fn create_context(&self, params: &SolverParams) -> Result<Self::Context, QueryError> {
        Ok(params.clone())
    }

    fn resolve(&self, point: Point, ctx: &Self::Context) -> Option<ResolvedLocation> {
        self.nodes
            .iter()
            .map(|(&id, &(lat, lon))| (id, haversine_distance(point.lat, point.lon, lat, lon)))
            .min_by(|(_, d1), (_, d2)| d1.total_cmp(d2))
            .filter(|&(_, distance)| distance <= ctx.snap_max_distance_m)
            .map(|(node, _)| ResolvedLocation { node })
    }

    fn compute_paths(
        &self,
        from: ResolvedLocation,
        to: ResolvedLocation,
        _ctx: &Self::Context,
    ) -> Vec<PathLeg> {
        if from.node == to.node {
            return Vec::new();
        }
        let (Some(&(lat1, lon1)), Some(&(lat2, lon2))) =
            (self.nodes.get(&from.node), self.nodes.get(&to.node))
        else {
            return Vec::new();
        };
        let distance_m = haversine_distance(lat1, lon1, lat2, lon2);
        vec![PathLeg {
            distance_m,
            duration_ms: (distance_m / self.speed_mps * 1000.0) as i64,
        }]
    }
}
