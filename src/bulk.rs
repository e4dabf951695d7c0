//! Bulk CSV export of edges in a bounding box
//!
//! Counterpart of the tile pipeline for export use cases: no tile
//! clipping, no level of detail, one delimited text row per edge,
//! written incrementally as the index yields edges. Output size is
//! unbounded, so rows are never buffered in full.

use std::io::Write;
use std::time::Instant;

use tracing::debug;

use crate::attributes::{is_projectable, FIELD_DELIMITER};
use crate::error::{QueryError, Result};
use crate::graph::{GraphStore, SpatialIndex, ROAD_CLASS_KEY};
use crate::tilemath::GeoBBox;

const LINE_DELIMITER: char = '\n';

/// Fixed column prefix written before any requested attribute columns.
const FIXED_COLUMNS: [&str; 6] = [
    "fromNodeId",
    "fromLat",
    "fromLon",
    "toNodeId",
    "toLat",
    "toLon",
];

/// Request-local counters returned alongside the streamed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkStats {
    pub rows: usize,
}

/// Stream one CSV row per edge inside `bbox` to `out`.
///
/// Header first: the fixed prefix, `name` unless `include_names` is
/// false, `distance`, then every valid requested column in request
/// order. Unknown or malformed column names are dropped from header and
/// rows alike, mirroring the tile attribute policy.
pub fn write_csv<S, G, W>(
    index: &S,
    store: &G,
    bbox: &GeoBBox,
    include_names: bool,
    requested: &[String],
    out: &mut W,
) -> Result<BulkStats>
where
    S: SpatialIndex + ?Sized,
    G: GraphStore + ?Sized,
    W: Write,
{
    if !store.has_attribute(ROAD_CLASS_KEY) {
        return Err(QueryError::MissingCapability(ROAD_CLASS_KEY.to_string()));
    }
    bbox.validate()?;

    // The graph's attribute schema is fixed for the whole request, so
    // the valid column set is computed once, not per edge.
    let columns: Vec<&String> = requested
        .iter()
        .filter(|name| is_projectable(store, name))
        .collect();

    for (i, col) in FIXED_COLUMNS.iter().enumerate() {
        if i > 0 {
            write!(out, "{FIELD_DELIMITER}")?;
        }
        write!(out, "{col}")?;
    }
    if include_names {
        write!(out, "{FIELD_DELIMITER}name")?;
    }
    write!(out, "{FIELD_DELIMITER}distance")?;
    for col in &columns {
        write!(out, "{FIELD_DELIMITER}{col}")?;
    }
    write!(out, "{LINE_DELIMITER}")?;

    let started = Instant::now();
    let mut rows = 0usize;
    for edge_id in index.edges_in(bbox) {
        let Some(edge) = store.edge_view(edge_id) else {
            debug!(edge_id, "stale edge id from index");
            continue;
        };
        if edge.geometry.len() < 2 {
            continue;
        }
        let ((from_lon, from_lat), (to_lon, to_lat)) = edge.endpoints();
        write!(
            out,
            "{},{from_lat},{from_lon},{},{to_lat},{to_lon}",
            edge.base_node, edge.adj_node
        )?;
        if include_names {
            write!(out, "{FIELD_DELIMITER}{}", edge.name)?;
        }
        write!(out, "{FIELD_DELIMITER}{}", edge.distance_m)?;
        for col in &columns {
            write!(out, "{FIELD_DELIMITER}")?;
            if let Some(value) = store.edge_attribute(edge.id, col) {
                write!(out, "{value}")?;
            }
        }
        write!(out, "{LINE_DELIMITER}")?;
        rows += 1;
    }
    out.flush()?;

    debug!(
        rows,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "bulk export finished"
    );
    Ok(BulkStats { rows })
}
