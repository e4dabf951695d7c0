//! Per-zoom edge visibility policy
//!
//! Fixed level-of-detail thresholds bound the number of rendered
//! features at low zoom while keeping the visual road hierarchy. The
//! thresholds are part of the tile contract and must not drift.

use crate::graph::RoadClass;

/// Tiles below this zoom are defined to be empty; the pipeline returns
/// an empty tile without querying the index at all.
pub const MIN_RENDER_ZOOM: u32 = 10;

/// From this zoom on every edge renders with its full stored geometry.
pub const FULL_GEOMETRY_ZOOM: u32 = 14;

/// Geometric fidelity chosen for one edge at one zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fidelity {
    /// Not rendered at this zoom.
    Skip,
    /// Straight segment from base to adjacent node.
    Simplified,
    /// Exact stored geometry.
    Full,
}

/// Total, deterministic visibility decision for (zoom, road class).
pub fn fidelity_for(zoom: u32, class: RoadClass) -> Fidelity {
    if zoom >= FULL_GEOMETRY_ZOOM {
        return Fidelity::Full;
    }
    if zoom < MIN_RENDER_ZOOM {
        return Fidelity::Skip;
    }
    let visible = class == RoadClass::Motorway
        || (zoom > 10 && matches!(class, RoadClass::Primary | RoadClass::Trunk))
        || (zoom > 11 && class == RoadClass::Secondary)
        || zoom > 12;
    if visible {
        Fidelity::Simplified
    } else {
        Fidelity::Skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_zoom_skips_everything() {
        for zoom in 0..MIN_RENDER_ZOOM {
            assert_eq!(fidelity_for(zoom, RoadClass::Motorway), Fidelity::Skip);
            assert_eq!(fidelity_for(zoom, RoadClass::Residential), Fidelity::Skip);
        }
    }

    #[test]
    fn test_high_zoom_is_always_full() {
        for zoom in FULL_GEOMETRY_ZOOM..=22 {
            assert_eq!(fidelity_for(zoom, RoadClass::Service), Fidelity::Full);
            assert_eq!(fidelity_for(zoom, RoadClass::Motorway), Fidelity::Full);
        }
    }

    #[test]
    fn test_motorway_visible_at_every_mid_zoom() {
        for zoom in 10..=13 {
            assert_eq!(fidelity_for(zoom, RoadClass::Motorway), Fidelity::Simplified);
        }
    }

    #[test]
    fn test_primary_and_trunk_appear_above_zoom_10() {
        assert_eq!(fidelity_for(10, RoadClass::Primary), Fidelity::Skip);
        assert_eq!(fidelity_for(10, RoadClass::Trunk), Fidelity::Skip);
        for zoom in 11..=13 {
            assert_eq!(fidelity_for(zoom, RoadClass::Primary), Fidelity::Simplified);
            assert_eq!(fidelity_for(zoom, RoadClass::Trunk), Fidelity::Simplified);
        }
    }

    #[test]
    fn test_secondary_appears_above_zoom_11() {
        assert_eq!(fidelity_for(10, RoadClass::Secondary), Fidelity::Skip);
        assert_eq!(fidelity_for(11, RoadClass::Secondary), Fidelity::Skip);
        assert_eq!(fidelity_for(12, RoadClass::Secondary), Fidelity::Simplified);
        assert_eq!(fidelity_for(13, RoadClass::Secondary), Fidelity::Simplified);
    }

    #[test]
    fn test_minor_classes_appear_only_at_zoom_13() {
        for class in [RoadClass::Tertiary, RoadClass::Residential, RoadClass::Service, RoadClass::Other] {
            for zoom in 10..=12 {
                assert_eq!(fidelity_for(zoom, class), Fidelity::Skip, "{class:?}@{zoom}");
            }
            assert_eq!(fidelity_for(13, class), Fidelity::Simplified, "{class:?}@13");
        }
    }

    #[test]
    fn test_decision_is_deterministic() {
        for zoom in 0..=16 {
            for class in [RoadClass::Motorway, RoadClass::Secondary, RoadClass::Other] {
                assert_eq!(fidelity_for(zoom, class), fidelity_for(zoom, class));
            }
        }
    }
}
