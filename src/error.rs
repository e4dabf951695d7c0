//! Error types for the query layer
//!
//! Structural errors (bad bbox, missing graph capability) fail a request
//! before any index query runs. Per-edge and per-attribute problems are
//! handled where they occur and never surface here.

use thiserror::Error;

/// Failure taxonomy for tile, bulk-export and matrix requests.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Bounding box is degenerate (min >= max on either axis).
    #[error("invalid bbox: lon {min_lon}..{max_lon}, lat {min_lat}..{max_lat}")]
    InvalidBBox {
        min_lon: f64,
        max_lon: f64,
        min_lat: f64,
        max_lat: f64,
    },

    /// Tile column or row outside [0, 2^zoom), or zoom out of range.
    #[error("invalid tile address {zoom}/{col}/{row}")]
    InvalidTileAddress { zoom: u32, col: u32, row: u32 },

    /// The graph was built without a capability this request needs,
    /// e.g. the road_class attribute.
    #[error("graph is not configured to store {0}")]
    MissingCapability(String),

    /// A coordinate string did not parse as "lat,lon".
    #[error("invalid point {0:?}: expected \"lat,lon\"")]
    InvalidPoint(String),

    /// The vector-tile encoder rejected a geometry. Fatal for the
    /// request: no partial tile is returned.
    #[error("geometry encoding failed: {0}")]
    GeometryEncoding(#[from] mvt::Error),

    /// Writing a bulk-export row failed.
    #[error("output write failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, QueryError>;
