use std::sync::Arc;

use property_chat_backend::ai::{QueryParser, Summarizer};
use property_chat_backend::search::{PropertySnapshot, PropertyStore};

pub struct AppState {
    pub store: Arc<PropertyStore>,
    pub query_parser: Arc<dyn QueryParser>,
    pub summarizer: Arc<dyn Summarizer>,
    /// Result page bound / 单次返回上限
    pub max_results: usize,
}

impl AppState {
    /// 获取房源快照（启动加载失败时按需重试）
    ///
    /// Returns an empty snapshot while the data stays unavailable or while
    /// another request is already loading it.
    pub async fn properties(&self) -> Arc<PropertySnapshot> {
        if self.store.is_ready() {
            return self.store.get_all();
        }

        match self.store.try_load().await {
            Some(Ok(snapshot)) => snapshot,
            Some(Err(e)) => {
                tracing::warn!("Property data unavailable, answering with no results: {}", e);
                self.store.get_all()
            }
            None => {
                tracing::debug!("Property load already running, answering with no results");
                self.store.get_all()
            }
        }
    }
}
