//! Tile rendering pipeline
//!
//! Orchestrates one tile request: coordinate math, the single spatial
//! index query, per-edge visibility, attribute projection and feature
//! encoding. Structural errors fail before the index is touched.

use std::time::Instant;

use tracing::debug;

use crate::attributes;
use crate::encoder::TileEncoder;
use crate::error::{QueryError, Result};
use crate::graph::{GraphStore, SpatialIndex, ROAD_CLASS_KEY};
use crate::tilemath::TileAddress;
use crate::visibility::{fidelity_for, Fidelity, MIN_RENDER_ZOOM};

/// Result of one tile request. The edge counter is request-local and
/// travels with the payload instead of living in process state.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTile {
    /// Tile in the vector-tile wire format, single layer `roads`.
    pub bytes: Vec<u8>,
    /// Edges accepted by the visibility policy for this tile.
    pub edges_rendered: usize,
}

/// Render one tile.
///
/// Zoom levels below [`MIN_RENDER_ZOOM`] return an empty tile without
/// querying the index. A graph without `road_class` cannot drive the
/// visibility policy and fails with [`QueryError::MissingCapability`].
pub fn render_tile<S, G>(
    index: &S,
    store: &G,
    addr: &TileAddress,
    requested: &[String],
) -> Result<RenderedTile>
where
    S: SpatialIndex + ?Sized,
    G: GraphStore + ?Sized,
{
    if addr.zoom < MIN_RENDER_ZOOM {
        return Ok(RenderedTile {
            bytes: TileEncoder::empty_tile_bytes()?,
            edges_rendered: 0,
        });
    }
    if !store.has_attribute(ROAD_CLASS_KEY) {
        return Err(QueryError::MissingCapability(ROAD_CLASS_KEY.to_string()));
    }
    let bbox = addr.bbox();
    bbox.validate()?;

    let started = Instant::now();
    let mut encoder = TileEncoder::new(bbox);
    let mut edges_rendered = 0usize;

    for edge_id in index.edges_in(&bbox) {
        let Some(edge) = store.edge_view(edge_id) else {
            debug!(edge_id, "stale edge id from index");
            continue;
        };
        if edge.geometry.len() < 2 {
            continue;
        }
        let points = match fidelity_for(addr.zoom, edge.road_class) {
            Fidelity::Skip => continue,
            Fidelity::Full => edge.geometry.clone(),
            Fidelity::Simplified => {
                let (from, to) = edge.endpoints();
                vec![from, to]
            }
        };
        let attrs = attributes::project(store, &edge, requested);
        encoder.add_edge(&edge, &points, &attrs)?;
        edges_rendered += 1;
    }

    let bytes = encoder.finish()?;
    debug!(
        zoom = addr.zoom,
        col = addr.col,
        row = addr.row,
        edges = edges_rendered,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "rendered tile"
    );
    Ok(RenderedTile {
        bytes,
        edges_rendered,
    })
}
