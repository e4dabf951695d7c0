//! Vector-tile feature encoding
//!
//! Takes the polyline chosen by the visibility policy, transforms it
//! into the tile's local integer grid, clips it against the buffered
//! tile envelope and emits MVT line features. Attribute keys and values
//! are interned once per layer by the `mvt` crate, so features share one
//! property dictionary on the wire.

use mvt::{GeomEncoder, GeomType, Layer, Tile};

use crate::error::Result;
use crate::graph::{AttributeValue, EdgeView};
use crate::tilemath::GeoBBox;

/// Local coordinate units per tile side.
pub const TILE_EXTENT: u32 = 4096;

/// Clip margin around the tile, in local units. Avoids rendering
/// artifacts at tile borders.
pub const TILE_BUFFER: f64 = 256.0;

/// Name of the single layer all road features land in.
pub const LAYER_NAME: &str = "roads";

/// Accumulates encoded features for one tile request.
pub struct TileEncoder {
    tile: Tile,
    layer: Option<Layer>,
    bbox: GeoBBox,
}

impl TileEncoder {
    pub fn new(bbox: GeoBBox) -> Self {
        let tile = Tile::new(TILE_EXTENT);
        let layer = tile.create_layer(LAYER_NAME);
        Self {
            tile,
            layer: Some(layer),
            bbox,
        }
    }

    /// Byte sequence of a structurally valid tile with no layers, used
    /// for zoom levels that are defined to be empty.
    pub fn empty_tile_bytes() -> Result<Vec<u8>> {
        Ok(Tile::new(TILE_EXTENT).to_bytes()?)
    }

    /// Encode one edge polyline, returning the number of features
    /// emitted. Zero when the edge lies entirely outside the buffered
    /// envelope or degenerates to a point on the local grid.
    pub fn add_edge(
        &mut self,
        edge: &EdgeView,
        points: &[(f64, f64)],
        attributes: &[(String, AttributeValue)],
    ) -> Result<usize> {
        let local: Vec<(f64, f64)> = points.iter().map(|&p| self.to_local(p)).collect();
        let mut emitted = 0;
        for part in clip_polyline(&local, -TILE_BUFFER, f64::from(TILE_EXTENT) + TILE_BUFFER) {
            let snapped = snap_to_grid(&part);
            if snapped.len() < 2 {
                continue;
            }
            let mut geom = GeomEncoder::new(GeomType::Linestring);
            for (x, y) in snapped {
                geom = geom.point(x, y)?;
            }
            let data = geom.complete()?.encode()?;

            let layer = self.layer.take().expect("layer restored after every feature");
            let mut feature = layer.into_feature(data);
            feature.set_id(edge.id);
            for (key, value) in attributes {
                match value {
                    AttributeValue::Categorical(s) => feature.add_tag_string(key, s),
                    AttributeValue::Decimal(v) => feature.add_tag_double(key, *v),
                    AttributeValue::Boolean(v) => feature.add_tag_bool(key, *v),
                    AttributeValue::Integer(v) => feature.add_tag_sint(key, *v),
                }
            }
            self.layer = Some(feature.into_layer());
            emitted += 1;
        }
        Ok(emitted)
    }

    /// Serialize the accumulated layer into the tile wire format.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if let Some(layer) = self.layer.take() {
            self.tile.add_layer(layer)?;
        }
        Ok(self.tile.to_bytes()?)
    }

    /// Affine (lon, lat) -> tile-local transform. Linear in latitude
    /// over the tile extent, matching how the tile bbox itself was
    /// derived; y grows southwards from the tile's north edge.
    fn to_local(&self, (lon, lat): (f64, f64)) -> (f64, f64) {
        let extent = f64::from(TILE_EXTENT);
        let x = (lon - self.bbox.min_lon) / self.bbox.width() * extent;
        let y = (self.bbox.max_lat - lat) / self.bbox.height() * extent;
        (x, y)
    }
}

/// Round a clipped part onto the integer grid, dropping consecutive
/// duplicates so degenerate runs can be detected by length.
fn snap_to_grid(part: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut out: Vec<(f64, f64)> = Vec::with_capacity(part.len());
    for &(x, y) in part {
        let p = (x.round(), y.round());
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    out
}

/// Clip a polyline against the square [min, max] x [min, max].
///
/// Liang-Barsky per segment; a polyline that leaves and re-enters the
/// window splits into multiple parts.
fn clip_polyline(points: &[(f64, f64)], min: f64, max: f64) -> Vec<Vec<(f64, f64)>> {
    let mut parts: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    for window in points.windows(2) {
        let (a, b) = (window[0], window[1]);
        match clip_segment(a, b, min, max) {
            Some((ca, cb)) => {
                if current.last() != Some(&ca) {
                    if !current.is_empty() {
                        parts.push(std::mem::take(&mut current));
                    }
                    current.push(ca);
                }
                current.push(cb);
            }
            None => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Visible portion of segment a..b inside the window, if any.
fn clip_segment(
    a: (f64, f64),
    b: (f64, f64),
    min: f64,
    max: f64,
) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    for (p, q) in [
        (-dx, a.0 - min),
        (dx, max - a.0),
        (-dy, a.1 - min),
        (dy, max - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None; // parallel and outside
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                if r > t0 {
                    t0 = r;
                }
            } else {
                if r < t0 {
                    return None;
                }
                if r < t1 {
                    t1 = r;
                }
            }
        }
    }
    Some((
        (a.0 + t0 * dx, a.1 + t0 * dy),
        (a.0 + t1 * dx, a.1 + t1 * dy),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RoadClass;

    fn edge(points: Vec<(f64, f64)>) -> EdgeView {
        EdgeView {
            id: 42,
            base_node: 1,
            adj_node: 2,
            geometry: points,
            road_class: RoadClass::Motorway,
            name: "E40".into(),
            distance_m: 900.0,
        }
    }

    fn bbox() -> GeoBBox {
        GeoBBox::new(4.0, 5.0, 50.0, 51.0)
    }

    #[test]
    fn test_clip_keeps_inner_segment() {
        let parts = clip_polyline(&[(10.0, 10.0), (20.0, 20.0)], 0.0, 100.0);
        assert_eq!(parts, vec![vec![(10.0, 10.0), (20.0, 20.0)]]);
    }

    #[test]
    fn test_clip_discards_outside_segment() {
        assert!(clip_polyline(&[(-30.0, -30.0), (-10.0, -20.0)], 0.0, 100.0).is_empty());
    }

    #[test]
    fn test_clip_splits_on_reentry() {
        // leaves through the right edge and comes back
        let line = [(10.0, 50.0), (150.0, 50.0), (150.0, 60.0), (10.0, 60.0)];
        let parts = clip_polyline(&line, 0.0, 100.0);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], vec![(10.0, 50.0), (100.0, 50.0)]);
        assert_eq!(parts[1], vec![(100.0, 60.0), (10.0, 60.0)]);
    }

    #[test]
    fn test_edge_inside_tile_emits_one_feature() {
        let e = edge(vec![(4.2, 50.2), (4.8, 50.8)]);
        let mut enc = TileEncoder::new(bbox());
        let n = enc.add_edge(&e, &e.geometry.clone(), &[]).unwrap();
        assert_eq!(n, 1);
        assert!(!enc.finish().unwrap().is_empty());
    }

    #[test]
    fn test_edge_outside_tile_emits_nothing() {
        let e = edge(vec![(6.0, 52.0), (7.0, 53.0)]);
        let mut enc = TileEncoder::new(bbox());
        let n = enc.add_edge(&e, &e.geometry.clone(), &[]).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_degenerate_run_emits_nothing() {
        // shorter than half a grid unit: collapses to one point
        let e = edge(vec![(4.50000, 50.50000), (4.50001, 50.50001)]);
        let mut enc = TileEncoder::new(bbox());
        let n = enc.add_edge(&e, &e.geometry.clone(), &[]).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_empty_tile_bytes_is_valid() {
        let bytes = TileEncoder::empty_tile_bytes().unwrap();
        let reader = mvt_reader::Reader::new(bytes).unwrap();
        assert!(reader.get_layer_names().unwrap().is_empty());
    }
}
