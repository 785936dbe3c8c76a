use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /api/health - 健康检查
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let snapshot = state.store.get_all();

    Json(json!({
        "status": "ok",
        "ready": state.store.is_ready(),
        "properties": snapshot.len(),
        "report": snapshot.report(),
        "build_time": env!("BUILD_TIME"),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use property_chat_backend::search::FilterCriteria;

    use crate::api::test_support::*;

    #[tokio::test]
    async fn test_health_reports_store() {
        let (status, body) = get_json(sample_app(FilterCriteria::default()), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["ready"], true);
        assert_eq!(body["properties"], 3);
        assert_eq!(body["report"]["missing_address"], 0);
    }

    #[tokio::test]
    async fn test_health_before_load() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(unavailable_store(dir.path()), FilterCriteria::default(), 10);
        let (status, body) = get_json(app, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], false);
        assert_eq!(body["properties"], 0);
    }
}
