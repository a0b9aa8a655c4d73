use std::sync::Arc;

use log::{error, info};
use tokio::net::TcpListener;

use folio::logger::Logger;
use folio::{
    build_router, AppState, Config, DocumentStore, FileStore, PageStore, Renderer, StorageKind,
    TemplateSet, WikiError,
};

#[tokio::main]
async fn main() -> Result<(), WikiError> {
    if let Err(e) = Logger::init() {
        eprintln!("Failed to initialize logger: {e}");
    }

    let config = Config::from_env()?;
    let templates: Arc<dyn Renderer> = Arc::new(TemplateSet::load(&config.templates_dir)?);

    let result = match config.storage {
        StorageKind::Files => {
            let store = FileStore::open(&config.pages_dir).await?;
            serve(&config, AppState::new(store, templates)).await
        }
        StorageKind::Database => {
            let store = DocumentStore::connect_lazy(&config.database_url)?;
            serve(&config, AppState::new(store, templates)).await
        }
    };
    if let Err(e) = &result {
        error!("Server stopped: {}", e);
    }
    result
}

async fn serve<S: PageStore>(config: &Config, state: AppState<S>) -> Result<(), WikiError> {
    let app = build_router(state);
    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    info!("Wiki listening on http://{} ({:?} storage)", addr, config.storage);
    axum::serve(listener, app).await.map_err(WikiError::from)
}
