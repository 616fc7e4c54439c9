//! HTTP handlers for the NDVI API.

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};

use super::dto::{
    ComputeNdviRequest, ErrorResponse, GenerateTilesRequest, HealthResponse, NdviResponse,
    TileLayerResponse,
};
use super::error::AppError;
use super::state::AppState;

pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: state.service_name.clone(),
        gee_initialized: state.engine.remote_initialized(),
    })
}

/// POST /api/compute-ndvi
pub async fn compute_ndvi(
    State(state): State<AppState>,
    payload: Result<Json<ComputeNdviRequest>, JsonRejection>,
) -> HandlerResult<NdviResponse> {
    let Json(request) = payload?;
    let query = request.into_query()?;

    let series = state.engine.compute_series(query).await?;
    tracing::info!("✅ Returned {} monthly values", series.len());

    Ok(Json(NdviResponse::from(&series)))
}

/// POST /api/generate-tiles
pub async fn generate_tiles(
    State(state): State<AppState>,
    payload: Result<Json<GenerateTilesRequest>, JsonRejection>,
) -> HandlerResult<TileLayerResponse> {
    let Json(request) = payload?;
    let aoi = request.area_of_interest()?;

    let layer = state.engine.tile_layer(aoi, request.view_type).await?;
    tracing::info!("✅ Map {} ready", layer.map_id);

    Ok(Json(TileLayerResponse::from(layer)))
}

pub async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not found".to_string(),
        }),
    )
}
