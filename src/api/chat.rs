use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use property_chat_backend::models::Property;
use property_chat_backend::search::{filter_properties, limit, FilterCriteria};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

/// Top-level reply read by the chat UI, no `ApiResponse` envelope / 聊天接口响应
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub summary: String,
    /// Criteria the query parser produced / 解析出的过滤条件
    pub filters: FilterCriteria,
    /// Matches before the page bound / 截断前的匹配总数
    pub total: usize,
    pub properties: Vec<Property>,
}

/// POST /api/chat - 自然语言房源搜索
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<Value>)> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "No message provided." })),
        ));
    }

    tracing::info!("Received message: {}", message);

    let filters = state.query_parser.parse_query(message).await;
    tracing::debug!("Parsed filters: {:?}", filters);

    let snapshot = state.properties().await;
    let matched = filter_properties(&filters, snapshot.properties());
    tracing::info!("Found {} matching properties", matched.len());

    // The summary sees every match, the payload only the first page
    let summary = state.summarizer.summarize(message, &matched).await;
    let properties = limit(&matched, state.max_results)
        .iter()
        .map(|p| (*p).clone())
        .collect();

    Ok(Json(ChatResponse {
        summary,
        filters,
        total: matched.len(),
        properties,
    }))
}
