use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/events",
    tag = "events",
    responses((status = 200, description = "Store change feed", content_type = "text/event-stream", body = String))
)]
/// Stream session, player, settings and entitlement changes.
pub async fn events_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let (greeting, receiver) = sse_service::subscribe(&state).await;
    info!("New change feed SSE connection");
    sse_service::to_sse_stream(greeting, receiver)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/events", get(events_stream))
}
