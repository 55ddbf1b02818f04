//! Rotas HTTP: um único endpoint `/` que aceita GET e POST.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use jsonnlp_core::{process, ModelCache, ProcessOptions};
use serde_json::{Map, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ServerConfig;

/// Estado compartilhado da aplicação
pub struct AppState {
    pub cache: Arc<ModelCache>,
    /// Valores usados quando a requisição não informa modelo ou flags
    pub defaults: ServerConfig,
}

/// Campos opcionais que sobrepõem a configuração do servidor
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Overrides {
    pub model: Option<String>,
    pub coreferences: Option<bool>,
    pub constituents: Option<bool>,
}

impl Overrides {
    /// Lê os campos da query string ou do corpo JSON. Devolve o nome do
    /// primeiro campo com valor inválido.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, &'static str> {
        let model = match fields.get("model") {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(name.clone()),
            Some(_) => return Err("model"),
        };
        Ok(Self {
            model,
            coreferences: flag(fields, "coreferences")?,
            constituents: flag(fields, "constituents")?,
        })
    }
}

/// Booleano JSON ou as strings `true`/`false` da query string
fn flag(fields: &Map<String, Value>, name: &'static str) -> Result<Option<bool>, &'static str> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(*value)),
        Some(Value::String(value)) => value.parse().map(Some).map_err(|_| name),
        Some(_) => Err(name),
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(get_handler).post(post_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /?text=...`
async fn get_handler(State(state): State<Arc<AppState>>, Query(params): Query<HashMap<String, String>>) -> Response {
    let fields = params.into_iter().map(|(k, v)| (k, Value::String(v))).collect();
    respond(state, fields).await
}

/// `POST /` com corpo `{"text": "..."}`; corpo que não é um objeto JSON conta como sem texto
async fn post_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let fields: Map<String, Value> = serde_json::from_slice(&body).unwrap_or_default();
    respond(state, fields).await
}

async fn respond(state: Arc<AppState>, fields: Map<String, Value>) -> Response {
    let Some(text) = fields
        .get("text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
    else {
        return no_content();
    };
    let overrides = match Overrides::from_fields(&fields) {
        Ok(overrides) => overrides,
        Err(field) => {
            warn!(field, "parâmetro inválido na requisição");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    let model = overrides.model.unwrap_or_else(|| state.defaults.model.clone());
    let coreferences = overrides.coreferences.unwrap_or(state.defaults.coreferences);
    let constituents = overrides.constituents.unwrap_or(state.defaults.constituents);
    info!(%model, chars = text.chars().count(), "processando texto");

    // O pipeline é síncrono e pesado: roda fora das threads do runtime
    let cache = Arc::clone(&state.cache);
    let result = tokio::task::spawn_blocking(move || -> jsonnlp_core::Result<Value> {
        let language = cache.get_or_load(&model, coreferences, constituents)?;
        let options = ProcessOptions {
            coreferences,
            constituents,
            ..ProcessOptions::default()
        };
        process(&language, &text, &options)?.into_value()
    })
    .await;

    match result {
        Ok(Ok(json)) => (StatusCode::OK, Json(json)).into_response(),
        Ok(Err(err)) => {
            error!(error = %err, "falha ao processar o texto");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(err) => {
            error!(error = %err, "tarefa do pipeline abortada");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// 204 sem corpo, mantendo o tipo JSON
fn no_content() -> Response {
    (StatusCode::NO_CONTENT, [(header::CONTENT_TYPE, "application/json")]).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use jsonnlp_core::BuiltinLoader;
    use tower::ServiceExt;

    fn state() -> Arc<AppState> {
        Arc::new(AppState {
            cache: Arc::new(ModelCache::new(Arc::new(BuiltinLoader))),
            defaults: ServerConfig::default(),
        })
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_uri(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn read_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_get_with_text() {
        let app = router(state());
        let response = app.oneshot(get_uri("/?text=The%20dog%20barked.")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let json = read_json(response).await;
        let documents = json["documents"].as_array().unwrap();
        assert_eq!(documents.len(), 1);
        let tokens = documents[0]["tokenList"].as_array().unwrap();
        assert_eq!(tokens.len(), 4);
        let ids: Vec<u64> = tokens.iter().map(|t| t["id"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_missing_text_is_no_content() {
        for request in [get_uri("/"), get_uri("/?text="), post("{}"), post("not json")] {
            let response = router(state()).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
            assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert!(bytes.is_empty());
        }
    }

    #[tokio::test]
    async fn test_post_with_text() {
        let response = router(state())
            .oneshot(post(r#"{"text": "John Smith arrived. He was tired."}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = read_json(response).await;
        let document = &json["documents"][0];
        assert_eq!(document["sentences"].as_object().unwrap().len(), 2);
        assert_eq!(document["coreferences"].as_array().unwrap().len(), 1);
        assert_eq!(document["constituents"].as_array().unwrap().len(), 2);
        assert_eq!(document["meta"]["DC.language"], "en");
    }

    #[tokio::test]
    async fn test_request_overrides() {
        let response = router(state())
            .oneshot(post(r#"{"text": "The dog barked.", "constituents": false, "model": "xx_unknown"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = read_json(response).await;
        assert!(json["documents"][0].get("constituents").is_none());
        assert!(json["documents"][0].get("dependencies").is_some());
    }

    #[tokio::test]
    async fn test_model_is_cached_between_requests() {
        let state = state();
        for _ in 0..2 {
            let response = router(Arc::clone(&state))
                .oneshot(get_uri("/?text=Hello%20there."))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(state.cache.len(), 1);
        assert!(state.cache.contains("en_core_web_sm", true, true));
    }

    #[tokio::test]
    async fn test_invalid_override_with_text_is_bad_request() {
        let requests = [
            get_uri("/?text=The%20dog%20barked.&coreferences=yes"),
            post(r#"{"text": "The dog barked.", "coreferences": "yes"}"#),
            post(r#"{"text": "The dog barked.", "coreferences": 1}"#),
            post(r#"{"text": "The dog barked.", "model": 3}"#),
        ];
        for request in requests {
            let response = router(state()).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        // sem texto a resposta continua 204, mesmo com parâmetro inválido
        let response = router(state()).oneshot(get_uri("/?coreferences=yes")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_query_string_flags() {
        let response = router(state())
            .oneshot(get_uri("/?text=John%20arrived.%20He%20left.&coreferences=false"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = read_json(response).await;
        assert!(json["documents"][0].get("coreferences").is_none());
        assert!(json["documents"][0].get("constituents").is_some());
    }

    #[test]
    fn test_overrides_from_fields() {
        let fields: Map<String, Value> =
            serde_json::from_str(r#"{"model": "en", "coreferences": "false", "constituents": true}"#).unwrap();
        assert_eq!(
            Overrides::from_fields(&fields).unwrap(),
            Overrides {
                model: Some("en".to_string()),
                coreferences: Some(false),
                constituents: Some(true),
            }
        );
        assert_eq!(Overrides::from_fields(&Map::new()).unwrap(), Overrides::default());

        let fields: Map<String, Value> = serde_json::from_str(r#"{"constituents": "sim"}"#).unwrap();
        assert_eq!(Overrides::from_fields(&fields), Err("constituents"));
    }
}
