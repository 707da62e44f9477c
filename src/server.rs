use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures::Stream;
use log::{error, info};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::assessment::{AssessmentRequest, Assessor};
use crate::error::{GhAssessError, Result};

const CHUNK_BUFFER: usize = 32;

/// Callable-function request envelope: the arguments live under `data`.
#[derive(Debug, Deserialize)]
struct CallableRequest {
    data: Value,
}

#[derive(Clone)]
pub struct AppState {
    assessor: Arc<Assessor>,
}

impl AppState {
    pub fn new(assessor: Assessor) -> Self {
        Self {
            assessor: Arc::new(assessor),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/assess", post(assess))
        .with_state(state)
}

pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn error_body(err: &GhAssessError) -> Value {
    json!({
        "error": {
            "status": err.callable_status(),
            "message": err.to_string(),
        }
    })
}

fn error_response(err: &GhAssessError) -> Response {
    let status = match err {
        GhAssessError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(error_body(err))).into_response()
}

fn parse_request(body: &[u8]) -> Result<AssessmentRequest> {
    let envelope: CallableRequest = serde_json::from_slice(body)
        .map_err(|e| GhAssessError::InvalidArgument(format!("Malformed request: {e}")))?;
    AssessmentRequest::from_value(envelope.data)
}

fn wants_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("text/event-stream"))
}

async fn assess(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(err) => return error_response(&err),
    };

    if wants_stream(&headers) {
        return stream_assessment(state.assessor, request).into_response();
    }

    // nobody listens for chunks on a plain call
    let (tx, _) = mpsc::channel(1);
    match state.assessor.assess(&request, &tx).await {
        Ok(text) => Json(json!({ "result": text })).into_response(),
        Err(err) => {
            error!("Assessment of {} failed: {err}", request.username);
            error_response(&err)
        }
    }
}

fn frame(payload: &Value) -> Event {
    Event::default().data(payload.to_string())
}

fn stream_assessment(
    assessor: Arc<Assessor>,
    request: AssessmentRequest,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (tx, mut rx) = mpsc::channel::<String>(CHUNK_BUFFER);
    let username = request.username.clone();
    let task = tokio::spawn(async move { assessor.assess(&request, &tx).await });

    let frames = async_stream::stream! {
        while let Some(chunk) = rx.recv().await {
            yield Ok::<_, Infallible>(frame(&json!({ "message": chunk })));
        }

        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => Err(GhAssessError::Generation(format!("Assessment task failed: {e}"))),
        };
        match outcome {
            Ok(text) => yield Ok::<_, Infallible>(frame(&json!({ "result": text }))),
            Err(err) => {
                error!("Streaming assessment of {username} failed: {err}");
                yield Ok::<_, Infallible>(frame(&error_body(&err)));
            }
        }
    };

    Sse::new(frames)
}
