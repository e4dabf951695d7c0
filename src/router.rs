//! Routing collaborator interface
//!
//! Path search lives behind [`Router`]. The matrix solver only needs
//! three operations: build one shared context per request, snap points
//! to graph locations, and compute the path legs between two locations.

use std::str::FromStr;

use crate::error::QueryError;
use crate::graph::NodeId;

/// A requested geographic point, "lat,lon" on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl FromStr for Point {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || QueryError::InvalidPoint(s.to_string());
        let (lat, lon) = s.split_once(',').ok_or_else(invalid)?;
        let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
        let lon: f64 = lon.trim().parse().map_err(|_| invalid())?;
        if !lat.is_finite() || !lon.is_finite() {
            return Err(invalid());
        }
        Ok(Self { lat, lon })
    }
}

/// Settings baked into one solver context.
///
/// Matrix requests never need geometries or turn instructions, so both
/// are disabled; `snap_max_distance_m` bounds how far a waypoint may be
/// from the nearest graph location before it counts as unresolvable.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverParams {
    /// Routing profile name; `None` lets the router pick its default.
    pub profile: Option<String>,
    pub calc_points: bool,
    pub instructions: bool,
    pub snap_max_distance_m: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            profile: None,
            calc_points: false,
            instructions: false,
            snap_max_distance_m: 250.0,
        }
    }
}

/// Graph location a requested point snapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub node: NodeId,
}

/// One leg of a computed path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathLeg {
    pub distance_m: f64,
    pub duration_ms: i64,
}

/// Path search collaborator.
///
/// The context is created once per matrix request and shared read-only
/// across every (origin, destination) pair, so it must be `Sync`.
pub trait Router {
    type Context: Sync;

    fn create_context(&self, params: &SolverParams) -> Result<Self::Context, QueryError>;

    /// Snap a point to the graph; `None` when nothing lies within the
    /// context's snap distance.
    fn resolve(&self, point: Point, ctx: &Self::Context) -> Option<ResolvedLocation>;

    /// Path legs between two resolved locations. An empty result means
    /// no path (or a zero-length one); the caller sums legs either way.
    fn compute_paths(
        &self,
        from: ResolvedLocation,
        to: ResolvedLocation,
        ctx: &Self::Context,
    ) -> Vec<PathLeg>;
}
