use std::sync::Arc;

use clap::Parser;

use amoria::config::Settings;
use amoria::domains::character::CharacterRegistry;
use amoria::error::Result;
use amoria::logging::init_tracing;
use amoria::providers::remote::RemoteEngine;
use amoria::providers::sqlite::SqliteConversationStore;
use amoria::server::{self, AppState};
use amoria::services::chat::ConversationService;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::parse();
    init_tracing("amoria_server");

    let registry = Arc::new(CharacterRegistry::load(settings.characters.as_deref())?);
    let store = Arc::new(
        SqliteConversationStore::new(&settings.db, settings.effective_pool_size()).await?,
    );
    let safe_engine = Arc::new(RemoteEngine::safe(
        settings.safe_api_key.clone(),
        settings.safe_base_url.clone(),
        settings.safe_model.clone(),
    ));
    let adult_engine = Arc::new(RemoteEngine::adult(
        settings.adult_api_key.clone(),
        settings.adult_base_url.clone(),
        settings.adult_model.clone(),
    ));
    let service = Arc::new(ConversationService::new(
        store,
        registry,
        safe_engine,
        adult_engine,
    ));

    let state = AppState {
        service,
        jwt_secret: settings.jwt_secret.clone(),
    };
    server::run(state, &settings.host, settings.port).await
}
