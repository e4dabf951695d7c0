//! Slippy-map tile addressing and geographic bounding boxes
//!
//! Pure coordinate math: a tile address (zoom, column, row) maps to a
//! WGS84 bbox via the inverse web-mercator transform, and back. No state.

use crate::error::{QueryError, Result};

/// Highest zoom accepted for a tile address. Keeps 2^zoom inside u32.
pub const MAX_ZOOM: u32 = 30;

/// One tile in the standard slippy-map pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileAddress {
    pub zoom: u32,
    pub col: u32,
    pub row: u32,
}

impl TileAddress {
    /// Validated constructor: column and row must lie in [0, 2^zoom).
    pub fn new(zoom: u32, col: u32, row: u32) -> Result<Self> {
        if zoom > MAX_ZOOM || u64::from(col) >= 1u64 << zoom || u64::from(row) >= 1u64 << zoom {
            return Err(QueryError::InvalidTileAddress { zoom, col, row });
        }
        Ok(Self { zoom, col, row })
    }

    /// Geographic bbox of this tile. North-west corner comes from
    /// (col, row), south-east from (col+1, row+1); tile rows count
    /// from north to south.
    pub fn bbox(&self) -> GeoBBox {
        let (min_lon, max_lat) = corner(self.zoom, f64::from(self.col), f64::from(self.row));
        let (max_lon, min_lat) = corner(
            self.zoom,
            f64::from(self.col) + 1.0,
            f64::from(self.row) + 1.0,
        );
        GeoBBox {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        }
    }

    /// Tile containing the given coordinate at the given zoom.
    pub fn containing(lon: f64, lat: f64, zoom: u32) -> Result<Self> {
        let n = f64::from(1u32 << zoom.min(MAX_ZOOM));
        let col = ((lon + 180.0) / 360.0 * n).floor();
        let row = ((1.0 - lat.to_radians().tan().asinh() / std::f64::consts::PI) / 2.0 * n).floor();
        if col < 0.0 || row < 0.0 {
            return Err(QueryError::InvalidTileAddress {
                zoom,
                col: 0,
                row: 0,
            });
        }
        Self::new(zoom, col as u32, row as u32)
    }
}

/// North-west corner of tile (col, row): fractional col/row give
/// positions inside the tile.
fn corner(zoom: u32, col: f64, row: f64) -> (f64, f64) {
    let n = f64::from(1u32 << zoom);
    let lon = col / n * 360.0 - 180.0;
    // latitude rows run north to south
    let lat = (std::f64::consts::PI * (1.0 - 2.0 * row / n)).sinh().atan().to_degrees();
    (lon, lat)
}

/// Axis-aligned WGS84 bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl GeoBBox {
    pub fn new(min_lon: f64, max_lon: f64, min_lat: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        }
    }

    /// Reject degenerate boxes before any index query runs.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_lon < self.max_lon && self.min_lat < self.max_lat)
            || !self.min_lon.is_finite()
            || !self.max_lon.is_finite()
            || !self.min_lat.is_finite()
            || !self.max_lat.is_finite()
        {
            return Err(QueryError::InvalidBBox {
                min_lon: self.min_lon,
                max_lon: self.max_lon,
                min_lat: self.min_lat,
                max_lat: self.max_lat,
            });
        }
        Ok(())
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_ordering_holds_for_valid_addresses() {
        for &(zoom, col, row) in &[(0, 0, 0), (10, 511, 340), (15, 17479, 11344), (14, 8800, 5373)] {
            let bbox = TileAddress::new(zoom, col, row).unwrap().bbox();
            assert!(bbox.min_lon < bbox.max_lon, "{zoom}/{col}/{row}");
            assert!(bbox.min_lat < bbox.max_lat, "{zoom}/{col}/{row}");
            assert!(bbox.validate().is_ok());
        }
    }

    #[test]
    fn test_zoom_zero_covers_the_world() {
        let bbox = TileAddress::new(0, 0, 0).unwrap().bbox();
        assert!((bbox.min_lon - -180.0).abs() < 1e-9);
        assert!((bbox.max_lon - 180.0).abs() < 1e-9);
        // web-mercator latitude cut-off
        assert!((bbox.max_lat - 85.0511).abs() < 1e-3);
        assert!((bbox.min_lat - -85.0511).abs() < 1e-3);
    }

    #[test]
    fn test_containing_inverts_bbox_center() {
        for &(zoom, col, row) in &[(10, 511, 340), (15, 17479, 11344), (12, 2200, 1343)] {
            let addr = TileAddress::new(zoom, col, row).unwrap();
            let bbox = addr.bbox();
            let mid_lon = (bbox.min_lon + bbox.max_lon) / 2.0;
            let mid_lat = (bbox.min_lat + bbox.max_lat) / 2.0;
            assert_eq!(TileAddress::containing(mid_lon, mid_lat, zoom).unwrap(), addr);
        }
    }

    #[test]
    fn test_out_of_range_address_rejected() {
        assert!(TileAddress::new(0, 1, 0).is_err());
        assert!(TileAddress::new(3, 8, 0).is_err());
        assert!(TileAddress::new(3, 0, 8).is_err());
        assert!(TileAddress::new(MAX_ZOOM + 1, 0, 0).is_err());
    }

    #[test]
    fn test_degenerate_bbox_rejected() {
        assert!(GeoBBox::new(1.0, 1.0, 0.0, 1.0).validate().is_err());
        assert!(GeoBBox::new(0.0, 1.0, 2.0, 1.0).validate().is_err());
        assert!(GeoBBox::new(0.0, f64::NAN, 0.0, 1.0).validate().is_err());
        assert!(GeoBBox::new(4.3, 4.4, 50.8, 50.9).validate().is_ok());
    }
}
