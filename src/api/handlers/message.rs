//! Message endpoint
//!
//! `POST` publishes to every open subscriber; `GET ?stream=true` opens a
//! subscriber stream; a plain `GET` answers with a single placeholder message.

use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::api::server::AppState;
use crate::error::{PulseError, Result};
use crate::models::{Message, PublishRequest};
use crate::stream::SubscriberStream;

/// Header carrying the publisher's shared secret
pub const API_KEY_HEADER: &str = "apikey";

// Subscriber streams are readable from any page, whatever `CORS_ORIGINS` says.
const STREAM_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const STREAM_ALLOW_HEADERS: &str = "Content-Type, Authorization, apiKey";

/// Query parameters for `GET /message`
#[derive(Debug, Deserialize, Default)]
pub struct MessageParams {
    pub stream: Option<String>,
}

impl MessageParams {
    fn wants_stream(&self) -> bool {
        self.stream.as_deref() == Some("true")
    }
}

/// `GET /message`
pub async fn get_message(
    State(state): State<AppState>,
    Query(params): Query<MessageParams>,
) -> Result<Response> {
    if !params.wants_stream() {
        return Ok(Json(Message::single_response(state.ids.next_id())).into_response());
    }

    subscribe(&state)
}

fn subscribe(state: &AppState) -> Result<Response> {
    let stream_config = &state.config.stream;
    let welcome = Message::connection_established(state.ids.next_id());
    let stream = SubscriberStream::open(
        &state.registry,
        stream_config.buffer_size,
        &welcome,
        stream_config.max_lifetime(),
    )?;

    if let Some(id) = stream.channel_id() {
        info!(
            "Subscriber {} connected ({} total)",
            id,
            state.registry.len()
        );
    }

    let mut shutdown = state.shutdown.clone();
    let events = stream
        .take_until(async move {
            let stopping = shutdown.wait_for(|stopping| *stopping).await.is_ok();
            if !stopping {
                // Sender gone without a shutdown; leave the stream to its own ceiling.
                std::future::pending::<()>().await;
            }
        })
        .map(|frame| Ok::<_, Infallible>(Event::default().data(frame)));

    let sse = Sse::new(events).keep_alive(KeepAlive::new().interval(stream_config.keepalive()));

    Ok((
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, STREAM_ALLOW_METHODS),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, STREAM_ALLOW_HEADERS),
        ],
        sse,
    )
        .into_response())
}

/// `POST /message`
pub async fn publish_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Message>> {
    authorize(&headers, state.config.auth.api_key.as_deref())?;

    info!("Received message: {}", String::from_utf8_lossy(&body));
    let request = parse_publish(&body)?;

    let message = Message::from_publish(state.ids.next_id(), request);
    let report = state.registry.broadcast(&message)?;
    debug!(
        "Message {} fanned out to {} subscribers",
        message.id, report.delivered
    );

    Ok(Json(message))
}

/// Compare the `apiKey` header byte-for-byte with the configured secret
fn authorize(headers: &HeaderMap, expected: Option<&str>) -> Result<()> {
    let provided = headers.get(API_KEY_HEADER).map(|v| v.as_bytes());

    match (provided, expected) {
        (Some(provided), Some(expected)) if provided == expected.as_bytes() => Ok(()),
        _ => {
            warn!("Rejected publish with missing or invalid API key");
            Err(PulseError::Unauthorized)
        }
    }
}

/// An empty body counts as `{}`
fn parse_publish(body: &[u8]) -> Result<PublishRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(PublishRequest::default());
    }

    serde_json::from_slice(body).map_err(|e| PulseError::MalformedPayload(e.to_string()))
}
