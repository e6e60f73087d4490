use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use axum::{
    extract::{RawQuery, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use shared::{
    error::AgentError,
    protocol::{FormRequest, WebResponse},
};
use web_agent::{
    drive, load_settings, FormSession, GeneratorFactory, SessionHandle, SessionRegistry, Settings,
};

mod engine;

use engine::{HtmlGeneratorFactory, InMemoryProcessor};

#[derive(Clone)]
struct AppState {
    settings: Arc<Settings>,
    registry: Arc<SessionRegistry>,
    factory: Arc<dyn GeneratorFactory>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = Arc::new(load_settings());
    let addr: SocketAddr = settings.server_bind.parse()?;
    let state = AppState {
        settings,
        registry: Arc::new(SessionRegistry::new()),
        factory: Arc::new(HtmlGeneratorFactory),
    };
    let app = build_router(state);

    info!(%addr, "form agent listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/forms", get(handle_forms).post(handle_forms))
        .route("/view", get(handle_view))
        .route("/SubmissionResponse", get(handle_submission_response))
        .route("/error.html", get(handle_error_page))
        .with_state(state)
}

async fn handle_forms(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: String,
) -> Response {
    let request = build_form_request(&method, "/forms", query, &headers, &body);
    let response = match request.param("sessionKey").map(str::to_string) {
        Some(key) => match state.registry.get(&key).await {
            Some(handle) => run_session(&handle, &request).await,
            None => {
                warn!(session_key = %key, "exchange for unknown session");
                error_redirect(&state.settings)
            }
        },
        None => start_session(&state, &request).await,
    };
    to_http(response)
}

async fn handle_view(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    // re-issue as an initialization exchange against the view endpoint
    let request = build_form_request(&Method::GET, "/view", query, &headers, "");
    let response = match request.param("sessionKey") {
        Some(key) => match state.registry.get(key).await {
            Some(handle) => run_session(&handle, &request).await,
            None => error_redirect(&state.settings),
        },
        None => error_redirect(&state.settings),
    };
    to_http(response)
}

async fn handle_submission_response(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Response {
    let params = parse_params(query.as_deref().unwrap_or_default());
    let Some(key) = params.get("sessionKey") else {
        return to_http(error_redirect(&state.settings));
    };
    // the submission result was the last thing this session produced; the
    // session is done once it is delivered
    match state.registry.remove(key).await {
        Some(handle) => {
            handle.lock().await.shutdown();
            (
                StatusCode::OK,
                format!("submission response delivered for session {key}\n"),
            )
                .into_response()
        }
        None => to_http(error_redirect(&state.settings)),
    }
}

async fn handle_error_page(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Response {
    let params = parse_params(query.as_deref().unwrap_or_default());
    let message = match params.get("sessionKey") {
        Some(key) => state.registry.take_error(key).await,
        None => None,
    };
    let body = format!(
        "<!DOCTYPE html>\n<html><body><h1>form processing failed</h1><p>{}</p></body></html>\n",
        message.unwrap_or_else(|| "the session was closed".to_string())
    );
    (StatusCode::OK, axum::response::Html(body)).into_response()
}

/// Create, configure and initialize a fresh session, then run the exchange
/// against it. Any failure closes the session and redirects to the error
/// page with the cause retained.
async fn start_session(state: &AppState, request: &FormRequest) -> WebResponse {
    let mut session = FormSession::new(
        Box::new(InMemoryProcessor::new()),
        Arc::clone(&state.factory),
        Arc::clone(&state.settings),
        Arc::clone(&state.registry),
    );
    let prepared = session
        .configure(request)
        .and_then(|()| session.set_form(request))
        .and_then(|()| session.init());
    if let Err(error) = prepared {
        return session.close(&error).await;
    }
    let handle: SessionHandle = Arc::new(Mutex::new(session));
    run_session(&handle, request).await
}

async fn run_session(handle: &SessionHandle, request: &FormRequest) -> WebResponse {
    match drive(handle, request).await {
        Ok(response) => response,
        Err(error) => handle.lock().await.close(&error).await,
    }
}

fn error_redirect(settings: &Settings) -> WebResponse {
    WebResponse::Redirect {
        location: format!("{}/{}", settings.context_path, settings.error_page),
    }
}

fn build_form_request(
    method: &Method,
    servlet_path: &str,
    query: Option<String>,
    headers: &HeaderMap,
    body: &str,
) -> FormRequest {
    let mut params = parse_params(query.as_deref().unwrap_or_default());
    if method == Method::POST {
        params.extend(parse_params(body));
    }
    let request_uri = match query.as_deref() {
        Some(q) if !q.is_empty() => format!("{servlet_path}?{q}"),
        _ => servlet_path.to_string(),
    };
    FormRequest {
        method: method.as_str().to_string(),
        context_path: String::new(),
        servlet_path: servlet_path.to_string(),
        request_uri,
        query_string: query,
        params,
        accept_language: headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        ..FormRequest::default()
    }
}

fn parse_params(encoded: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(encoded.as_bytes())
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect()
}

fn to_http(response: WebResponse) -> Response {
    let mut headers = non_caching_headers();
    match response {
        WebResponse::Redirect { location } => match HeaderValue::from_str(&location) {
            Ok(value) => {
                headers.insert(header::LOCATION, value);
                (StatusCode::FOUND, headers).into_response()
            }
            Err(_) => {
                let error = AgentError::config(format!("unencodable redirect '{location}'"));
                warn!(%error, "dropping redirect");
                (StatusCode::INTERNAL_SERVER_ERROR, headers).into_response()
            }
        },
        WebResponse::Rendered { content_type, body } => {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
            // length is measured before anything is written
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len() as u64));
            (StatusCode::OK, headers, body).into_response()
        }
        WebResponse::Unresolved => (StatusCode::NO_CONTENT, headers).into_response(),
    }
}

fn non_caching_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    headers
}
