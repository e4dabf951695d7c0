//! Batch shortest-path metrics between two point sets
//!
//! One solver context per request, every origin and destination
//! resolved exactly once, then O(N x M) independent pair computations.
//! Rows are computed in parallel: each pair only reads the shared
//! context and writes its own cell.

use std::time::Instant;

use rayon::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::router::{Point, ResolvedLocation, Router, SolverParams};

/// Distance sentinel for a cell whose origin or destination could not
/// be snapped to the graph. A no-path result between two resolved
/// locations stays `0.0` (the sum of an empty leg list).
pub const UNREACHABLE_DISTANCE: f64 = -1.0;

/// Duration sentinel matching [`UNREACHABLE_DISTANCE`].
pub const UNREACHABLE_DURATION: i64 = -1;

/// Pair of equally shaped matrices: rows are origins, columns are
/// destinations. Distances in meters, durations in whole seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixResult {
    pub distances: Vec<Vec<f64>>,
    pub durations: Vec<Vec<i64>>,
}

impl MatrixResult {
    /// (rows, columns) of both matrices.
    pub fn shape(&self) -> (usize, usize) {
        let cols = self.distances.first().map_or(0, Vec::len);
        (self.distances.len(), cols)
    }
}

/// Compute the full origins x destinations matrix pair.
///
/// An empty origin or destination list yields an empty result, not an
/// error: zero rows when there are no origins, N x 0 when there are no
/// destinations.
pub fn solve_matrix<R>(
    router: &R,
    params: &SolverParams,
    origins: &[Point],
    destinations: &[Point],
) -> Result<MatrixResult>
where
    R: Router + Sync,
{
    if origins.is_empty() || destinations.is_empty() {
        return Ok(MatrixResult {
            distances: vec![Vec::new(); origins.len()],
            durations: vec![Vec::new(); origins.len()],
        });
    }

    let started = Instant::now();
    let ctx = router.create_context(params)?;
    let from: Vec<Option<ResolvedLocation>> =
        origins.iter().map(|&p| router.resolve(p, &ctx)).collect();
    let to: Vec<Option<ResolvedLocation>> = destinations
        .iter()
        .map(|&p| router.resolve(p, &ctx))
        .collect();

    let rows: Vec<(Vec<f64>, Vec<i64>)> = from
        .par_iter()
        .map(|origin| {
            let mut distances = Vec::with_capacity(to.len());
            let mut durations = Vec::with_capacity(to.len());
            for destination in &to {
                match (origin, destination) {
                    (Some(a), Some(b)) => {
                        let legs = router.compute_paths(*a, *b, &ctx);
                        distances.push(legs.iter().map(|leg| leg.distance_m).sum());
                        durations.push(legs.iter().map(|leg| leg.duration_ms).sum::<i64>() / 1000);
                    }
                    _ => {
                        distances.push(UNREACHABLE_DISTANCE);
                        durations.push(UNREACHABLE_DURATION);
                    }
                }
            }
            (distances, durations)
        })
        .collect();

    let mut result = MatrixResult {
        distances: Vec::with_capacity(rows.len()),
        durations: Vec::with_capacity(rows.len()),
    };
    for (distances, durations) in rows {
        result.distances.push(distances);
        result.durations.push(durations);
    }
    debug!(
        origins = origins.len(),
        destinations = destinations.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "matrix solved"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::HaversineRouter;

    fn router() -> HaversineRouter {
        let mut router = HaversineRouter::new(1.0); // 1 m/s everywhere
        router.add_node(1, 10.0, 10.0);
        router.add_node(2, 11.0, 10.0);
        router.add_node(3, 10.0, 11.0);
        router
    }

    #[test]
    fn test_empty_inputs_yield_empty_matrices() {
        let r = router();
        let result = solve_matrix(&r, &SolverParams::default(), &[], &[Point::new(10.0, 10.0)]).unwrap();
        assert_eq!(result.shape(), (0, 0));

        let result =
            solve_matrix(&r, &SolverParams::default(), &[Point::new(10.0, 10.0)], &[]).unwrap();
        assert_eq!(result.shape(), (1, 0));
    }

    #[test]
    fn test_same_location_costs_zero() {
        let r = router();
        let p = Point::new(10.0, 10.0);
        let result = solve_matrix(&r, &SolverParams::default(), &[p], &[p]).unwrap();
        assert_eq!(result.distances, vec![vec![0.0]]);
        assert_eq!(result.durations, vec![vec![0]]);
    }

    #[test]
    fn test_matrix_shape_and_proportional_costs() {
        let r = router();
        let origins = [Point::new(10.0, 10.0), Point::new(10.0, 11.0)];
        let destinations = [Point::new(11.0, 10.0)];
        let result = solve_matrix(&r, &SolverParams::default(), &origins, &destinations).unwrap();
        assert_eq!(result.shape(), (2, 1));

        // both legs are about one degree, the diagonal one is longer
        let d0 = result.distances[0][0];
        let d1 = result.distances[1][0];
        assert!(d0 > 100_000.0 && d0 < 120_000.0, "{d0}");
        assert!(d1 > d0, "{d1} vs {d0}");
        // uniform 1 m/s: duration in seconds tracks distance in meters
        assert_eq!(result.durations[0][0], d0.floor() as i64);
    }

    #[test]
    fn test_unresolvable_point_marks_cells_unreachable() {
        let r = router();
        let origins = [Point::new(10.0, 10.0), Point::new(-60.0, 120.0)];
        let destinations = [Point::new(11.0, 10.0)];
        let result = solve_matrix(&r, &SolverParams::default(), &origins, &destinations).unwrap();
        assert!(result.distances[0][0] > 0.0);
        assert_eq!(result.distances[1][0], UNREACHABLE_DISTANCE);
        assert_eq!(result.durations[1][0], UNREACHABLE_DURATION);
    }
}
