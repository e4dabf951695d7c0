//! HTTP transport glue
//!
//! Thin Axum layer over the library: parameter parsing, status mapping
//! and response encoding only. Handlers are generic over the
//! collaborator traits so any engine (or the in-memory test doubles)
//! can sit behind the same routes.

use std::io;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::bulk;
use crate::error::QueryError;
use crate::graph::{GraphStore, SpatialIndex, ROAD_CLASS_KEY};
use crate::matrix::solve_matrix;
use crate::router::{Point, Router, SolverParams};
use crate::tile::render_tile;
use crate::tilemath::{GeoBBox, TileAddress};

const PBF_CONTENT_TYPE: &str = "application/x-protobuf";
const TOOK_HEADER: &str = "x-took-ms";

/// Shared collaborators behind all routes of one server.
pub struct AppState<R, S, G> {
    pub router: R,
    pub index: S,
    pub store: G,
}

/// Build the Axum router over one set of collaborators.
pub fn build_router<R, S, G>(state: Arc<AppState<R, S, G>>) -> axum::Router
where
    R: Router + Send + Sync + 'static,
    R::Context: Send + Sync,
    S: SpatialIndex + Send + Sync + 'static,
    G: GraphStore + Send + Sync + 'static,
{
    axum::Router::new()
        .route("/mvt/{z}/{x}/{y}", get(tile_handler::<R, S, G>))
        .route("/mvt/csv", get(csv_handler::<R, S, G>))
        .route("/distance-matrix", post(matrix_handler::<R, S, G>))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and run the server until the task is cancelled.
pub async fn serve<R, S, G>(state: Arc<AppState<R, S, G>>, port: u16) -> io::Result<()>
where
    R: Router + Send + Sync + 'static,
    R::Context: Send + Sync,
    S: SpatialIndex + Send + Sync + 'static,
    G: GraphStore + Send + Sync + 'static,
{
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "query server listening");
    axum::serve(listener, app).await
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(err: &QueryError) -> Response {
    let status = match err {
        QueryError::InvalidBBox { .. }
        | QueryError::InvalidTileAddress { .. }
        | QueryError::InvalidPoint(_)
        | QueryError::MissingCapability(_) => StatusCode::BAD_REQUEST,
        QueryError::GeometryEncoding(_) | QueryError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

/// Comma-separated `details` parameter to attribute names. Names with
/// an embedded comma are unrepresentable here by construction; the
/// library drops them anyway for non-HTTP callers.
fn split_details(details: Option<String>) -> Vec<String> {
    details
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

// ============ Tile endpoint ============

#[derive(Debug, Deserialize)]
struct TileQuery {
    details: Option<String>,
}

async fn tile_handler<R, S, G>(
    State(state): State<Arc<AppState<R, S, G>>>,
    Path((z, x, y)): Path<(u32, u32, String)>,
    Query(query): Query<TileQuery>,
) -> Response
where
    R: Router + Send + Sync + 'static,
    S: SpatialIndex + Send + Sync + 'static,
    G: GraphStore + Send + Sync + 'static,
{
    let row = y.strip_suffix(".mvt").unwrap_or(&y);
    let Ok(row) = row.parse::<u32>() else {
        return error_response(&QueryError::InvalidTileAddress { zoom: z, col: x, row: 0 });
    };
    let addr = match TileAddress::new(z, x, row) {
        Ok(addr) => addr,
        Err(err) => return error_response(&err),
    };
    let requested = split_details(query.details);

    let started = Instant::now();
    match render_tile(&state.index, &state.store, &addr, &requested) {
        Ok(tile) => {
            debug!(zoom = z, col = x, row, edges = tile.edges_rendered, "tile served");
            (
                [
                    (header::CONTENT_TYPE, PBF_CONTENT_TYPE.to_string()),
                    (
                        header::HeaderName::from_static(TOOK_HEADER),
                        started.elapsed().as_millis().to_string(),
                    ),
                ],
                tile.bytes,
            )
                .into_response()
        }
        Err(err) => error_response(&err),
    }
}

// ============ Bulk CSV endpoint ============

#[derive(Debug, Deserialize)]
struct CsvQuery {
    min_lon: f64,
    max_lon: f64,
    min_lat: f64,
    max_lat: f64,
    #[serde(default)]
    exclude_names: bool,
    details: Option<String>,
}

/// `io::Write` adapter pushing chunks into the response stream.
struct ChannelWriter {
    tx: tokio::sync::mpsc::Sender<Result<Vec<u8>, io::Error>>,
}

impl io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx
            .blocking_send(Ok(buf.to_vec()))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

async fn csv_handler<R, S, G>(
    State(state): State<Arc<AppState<R, S, G>>>,
    Query(query): Query<CsvQuery>,
) -> Response
where
    R: Router + Send + Sync + 'static,
    S: SpatialIndex + Send + Sync + 'static,
    G: GraphStore + Send + Sync + 'static,
{
    let bbox = GeoBBox::new(query.min_lon, query.max_lon, query.min_lat, query.max_lat);
    // Structural checks happen before the response commits to 200.
    if let Err(err) = bbox.validate() {
        return error_response(&err);
    }
    if !state.store.has_attribute(ROAD_CLASS_KEY) {
        return error_response(&QueryError::MissingCapability(ROAD_CLASS_KEY.to_string()));
    }

    let include_names = !query.exclude_names;
    let requested = split_details(query.details);
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Vec<u8>, io::Error>>(16);
    tokio::task::spawn_blocking(move || {
        let mut out = io::BufWriter::new(ChannelWriter { tx });
        if let Err(err) =
            bulk::write_csv(&state.index, &state.store, &bbox, include_names, &requested, &mut out)
        {
            debug!(error = %err, "bulk export aborted");
        }
    });

    (
        [(header::CONTENT_TYPE, "text/csv")],
        Body::from_stream(ReceiverStream::new(rx)),
    )
        .into_response()
}

// ============ Distance-matrix endpoint ============

#[derive(Debug, Deserialize)]
struct MatrixRequest {
    /// Origin points, "lat,lon" per entry.
    origins: Vec<String>,
    /// Destination points, "lat,lon" per entry.
    destinations: Vec<String>,
    profile: Option<String>,
}

#[derive(Debug, Serialize)]
struct MatrixResponse {
    distance_matrix: Vec<Vec<f64>>,
    eta_matrix: Vec<Vec<i64>>,
}

async fn matrix_handler<R, S, G>(
    State(state): State<Arc<AppState<R, S, G>>>,
    Json(request): Json<MatrixRequest>,
) -> Response
where
    R: Router + Send + Sync + 'static,
    R::Context: Send + Sync,
    S: SpatialIndex + Send + Sync + 'static,
    G: GraphStore + Send + Sync + 'static,
{
    let parse = |points: &[String]| -> Result<Vec<Point>, QueryError> {
        points.iter().map(|s| s.parse()).collect()
    };
    let origins = match parse(&request.origins) {
        Ok(points) => points,
        Err(err) => return error_response(&err),
    };
    let destinations = match parse(&request.destinations) {
        Ok(points) => points,
        Err(err) => return error_response(&err),
    };
    let params = SolverParams {
        profile: request.profile,
        ..SolverParams::default()
    };

    match solve_matrix(&state.router, &params, &origins, &destinations) {
        Ok(result) => Json(MatrixResponse {
            distance_matrix: result.distances,
            eta_matrix: result.durations,
        })
        .into_response(),
        Err(err) => error_response(&err),
    }
}

// ============ Health ============

async fn health() -> Response {
    Json(serde_json::json!({ "status": "ok" })).into_response()
}
