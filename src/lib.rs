//! roadgrid - read-only query layer over a prebuilt road-network graph
//!
//! Answers two request shapes against collaborator-provided graph data:
//! batch shortest-path metrics between two point sets (distance/duration
//! matrices) and rendering of rectangular map tiles (or unbounded CSV
//! exports) of simplified road geometry.
//!
//! The routing engine, spatial index and graph storage stay behind the
//! [`router::Router`], [`graph::SpatialIndex`] and [`graph::GraphStore`]
//! traits; everything in this crate is single-shot, request-scoped
//! computation on top of them.

pub mod api;
pub mod attributes;
pub mod bulk;
pub mod encoder;
pub mod error;
pub mod graph;
pub mod matrix;
pub mod router;
pub mod test_support;
pub mod tile;
pub mod tilemath;
pub mod visibility;

pub use error::QueryError;
pub use graph::{
    AttributeKind, AttributeValue, EdgeId, EdgeView, GraphStore, NodeId, RoadClass, SpatialIndex,
    ROAD_CLASS_KEY,
};
pub use matrix::{solve_matrix, MatrixResult, UNREACHABLE_DISTANCE, UNREACHABLE_DURATION};
pub use router::{PathLeg, Point, ResolvedLocation, Router, SolverParams};
pub use tile::{render_tile, RenderedTile};
pub use tilemath::{GeoBBox, TileAddress};
pub use visibility::{fidelity_for, Fidelity, FULL_GEOMETRY_ZOOM, MIN_RENDER_ZOOM};
