//! Servidor HTTP Axum que expõe o pipeline JSON-NLP

mod config;
mod handlers;

use std::sync::Arc;

use anyhow::Context;
use jsonnlp_core::{BuiltinLoader, ModelCache};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::handlers::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = config::config_path();
    let config = config::load_config(&path)?;
    info!(path = %path.display(), model = %config.model, "configuração carregada");

    let cache = Arc::new(ModelCache::new(Arc::new(BuiltinLoader)));

    // Carrega o modelo padrão antes da primeira requisição
    let warm = Arc::clone(&cache);
    let (model, coreferences, constituents) = (config.model.clone(), config.coreferences, config.constituents);
    tokio::task::spawn_blocking(move || warm.get_or_load(&model, coreferences, constituents))
        .await
        .context("carga do modelo padrão abortada")?
        .context("falha ao carregar o modelo padrão")?;

    let addr = config.addr();
    let state = Arc::new(AppState { cache, defaults: config });
    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("não foi possível abrir {addr}"))?;
    info!("🚀 Servidor JSON-NLP iniciado em http://{addr}");
    axum::serve(listener, app).await.context("servidor encerrado com erro")?;
    Ok(())
}
