use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod state;

use property_chat_backend::ai::{LlmClient, QueryParser, StaticAssistant, Summarizer};
use property_chat_backend::config;
use property_chat_backend::search::PropertyStore;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "property_chat_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    let app_config = config::load_config()
        .map_err(anyhow::Error::msg)?
        .apply_env();
    tracing::info!("Server will listen on {}:{}", app_config.server.host, app_config.server.port);

    let store = Arc::new(PropertyStore::new(app_config.data.clone()));

    // Readiness gate: populate before accepting queries / 先加载数据再接受请求
    match store.load().await {
        Ok(snapshot) => {
            let report = snapshot.report();
            tracing::info!(
                "Property store ready: {} properties \
                 ({} orphans skipped, {} numbers coerced, {} image lists dropped)",
                snapshot.len(),
                report.skipped(),
                report.coerced_numbers,
                report.malformed_images
            );
        }
        Err(e) => {
            tracing::error!("Failed to load property data on start, will retry on demand: {}", e);
        }
    }

    let (query_parser, summarizer): (Arc<dyn QueryParser>, Arc<dyn Summarizer>) =
        match app_config.llm.resolve_api_key() {
            Some(api_key) => {
                let client = Arc::new(LlmClient::new(&app_config.llm, api_key)?);
                tracing::info!("Using language model {}", app_config.llm.model);
                (client.clone() as Arc<dyn QueryParser>, client as Arc<dyn Summarizer>)
            }
            None => {
                tracing::warn!("No language model API key configured; queries run unfiltered");
                let assistant = Arc::new(StaticAssistant::default());
                (assistant.clone() as Arc<dyn QueryParser>, assistant as Arc<dyn Summarizer>)
            }
        };

    let state = Arc::new(AppState {
        store,
        query_parser,
        summarizer,
        max_results: app_config.search.max_results,
    });

    let app = api::router(state);

    let bind_addr = app_config.get_bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
