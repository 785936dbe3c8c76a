use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use property_chat_backend::models::Property;
use property_chat_backend::search::{filter_properties, limit, FilterCriteria};

use crate::api::ApiResponse;
use crate::state::AppState;

/// 结构化搜索请求（不经过大模型）
#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub criteria: FilterCriteria,
    /// Capped at the configured page bound / 不超过配置上限
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub total: usize,
    pub properties: Vec<Property>,
}

/// POST /api/properties/search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Json<ApiResponse<SearchResponse>> {
    let snapshot = state.properties().await;
    let matched = filter_properties(&req.criteria, snapshot.properties());

    let page = req.limit.unwrap_or(state.max_results).min(state.max_results);
    let properties = limit(&matched, page).iter().map(|p| (*p).clone()).collect();

    Json(ApiResponse::success(SearchResponse {
        total: matched.len(),
        properties,
    }))
}
