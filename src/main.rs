mod config;
mod error;
mod extract;
mod retrieval;
mod routes;
mod session;

use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::error::AppError;
use crate::retrieval::embeddings::{EmbeddingProvider, HttpEmbeddings};
use crate::retrieval::synthesis::{GenerationProvider, GroqClient};
use crate::session::SessionStore;

/// Shared application state. The providers are constructed once at startup
/// and injected here, so every index build and every query go through the
/// same embedding identity.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub session: Arc<SessionStore>,
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub generator: Arc<dyn GenerationProvider>,
}

/// A body that fails JSON deserialization is treated the same as a missing
/// query, keeping the `{"error": ...}` wire shape instead of actix's
/// plain-text default.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::warn!("Malformed JSON body: {}", err);
        AppError::InvalidQuery.into()
    })
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_level = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info".to_string())
        .parse()
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::from_env()?;
    info!("Configuration loaded from environment");

    std::fs::create_dir_all(&config.upload_dir)?;

    let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(HttpEmbeddings::new(
        config.embedding_api_base_url.clone(),
        config.embedding_api_key.clone(),
        config.embedding_model.clone(),
    ));
    info!("Embedding provider ready: {}", embeddings.model_name());

    let generator: Arc<dyn GenerationProvider> = Arc::new(GroqClient::new(
        config.groq_api_base_url.clone(),
        config.groq_api_key.clone(),
        config.groq_model.clone(),
    ));

    let state = web::Data::new(AppState {
        config: config.clone(),
        session: Arc::new(SessionStore::new()),
        embeddings,
        generator,
    });

    let addr = format!("{}:{}", config.host, config.port);
    let cors_allow_origin = config.cors_allow_origin.clone();
    let max_upload_size = config.max_upload_size;

    info!("Server running at http://{}", addr);

    HttpServer::new(move || {
        let cors = if cors_allow_origin == "*" {
            Cors::permissive()
        } else {
            Cors::default()
                .allowed_origin(&cors_allow_origin)
                .allow_any_method()
                .allow_any_header()
        };

        App::new()
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(max_upload_size))
            .app_data(json_config())
            .wrap(cors)
            .wrap(Logger::default())
            .configure(routes::create_routes)
            .service(Files::new("/", "./static").index_file("index.html"))
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
