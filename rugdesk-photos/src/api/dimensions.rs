//! Dimension and edge suggestion endpoints
//!
//! POST /api/dimensions/parse, /api/dimensions/format, /api/dimensions/footage,
//! POST /api/edge-suggestions/match

use axum::{routing::post, Json, Router};
use rugdesk_common::dimensions::{calculate_footage, format_dimension};
use rugdesk_common::edges::{get_suggested_edges_for_service, parse_edge_suggestions};
use rugdesk_common::{DimensionFormat, DimensionInput, EdgeSuggestion, EdgeTag, FootageSummary, RugDimensions};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /api/dimensions/parse request
#[derive(Debug, Deserialize)]
pub struct ParseDimensionRequest {
    /// String or number in `format` notation
    pub raw: DimensionInput,
    #[serde(default)]
    pub format: DimensionFormat,
}

#[derive(Debug, Serialize)]
pub struct ParseDimensionResponse {
    pub feet: f64,
}

/// POST /api/dimensions/format request
#[derive(Debug, Deserialize)]
pub struct FormatDimensionRequest {
    pub feet: f64,
    #[serde(default)]
    pub format: DimensionFormat,
}

#[derive(Debug, Serialize)]
pub struct FormatDimensionResponse {
    pub value: String,
}

/// POST /api/dimensions/footage request
#[derive(Debug, Deserialize)]
pub struct FootageRequest {
    pub dimensions: RugDimensions,
    /// Edge wire names (`end1`, `end2`, `side1`, `side2`)
    #[serde(default)]
    pub edges: Vec<String>,
}

/// POST /api/edge-suggestions/match request
#[derive(Debug, Deserialize)]
pub struct MatchSuggestionRequest {
    pub service_name: String,
    /// Raw suggestion list as produced by the analysis collaborator
    #[serde(default)]
    pub suggestions: Value,
}

#[derive(Debug, Serialize)]
pub struct MatchSuggestionResponse {
    pub suggestion: Option<EdgeSuggestion>,
    /// Suggestions that survived validation
    pub valid_count: usize,
}

/// POST /api/dimensions/parse
pub async fn parse(Json(request): Json<ParseDimensionRequest>) -> Json<ParseDimensionResponse> {
    Json(ParseDimensionResponse {
        feet: request.raw.to_feet(request.format),
    })
}

/// POST /api/dimensions/format
pub async fn format(Json(request): Json<FormatDimensionRequest>) -> Json<FormatDimensionResponse> {
    Json(FormatDimensionResponse {
        value: format_dimension(request.feet, request.format),
    })
}

/// POST /api/dimensions/footage
///
/// Unknown edge names are rejected rather than ignored, so a typo never
/// silently under-bills.
pub async fn footage(Json(request): Json<FootageRequest>) -> ApiResult<Json<FootageSummary>> {
    let edges = request
        .edges
        .iter()
        .map(|name| {
            EdgeTag::from_name(name)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown edge: {}", name)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(calculate_footage(&request.dimensions, &edges)))
}

/// POST /api/edge-suggestions/match
pub async fn match_suggestion(
    Json(request): Json<MatchSuggestionRequest>,
) -> Json<MatchSuggestionResponse> {
    let suggestions = parse_edge_suggestions(&request.suggestions);
    let suggestion = get_suggested_edges_for_service(&request.service_name, &suggestions).cloned();

    Json(MatchSuggestionResponse {
        suggestion,
        valid_count: suggestions.len(),
    })
}

/// Build dimension routes
pub fn dimension_routes() -> Router<AppState> {
    Router::new()
        .route("/api/dimensions/parse", post(parse))
        .route("/api/dimensions/format", post(format))
        .route("/api/dimensions/footage", post(footage))
        .route("/api/edge-suggestions/match", post(match_suggestion))
}
