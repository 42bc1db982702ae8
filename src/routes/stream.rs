//! Presence stream route
//!
//! GET /api/map/stream - long-lived server-sent-events connection. Each
//! subscriber gets its own channel registered with the presence hub; frames
//! broadcast by the location store are written to the response body as they
//! arrive. When the client disconnects the body is dropped and its guard
//! removes the registry entry right away; a failed send during broadcast
//! still prunes as a backstop.

use bytes::Bytes;
use futures_util::StreamExt;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::info;

use crate::presence::SubscriberGuard;
use crate::routes::map::authenticate;
use crate::server::AppState;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// GET /api/map/stream
pub async fn handle_presence_stream(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match authenticate(&req, &state) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };

    let (subscriber_id, rx) = state.presence.subscribe();
    info!(
        "Presence stream opened for {} (subscriber {}, {} total)",
        claims.email,
        subscriber_id,
        state.presence.subscriber_count()
    );

    // The guard lives inside the body stream; when the connection ends the
    // body drops and the guard removes the registry entry.
    let guard = SubscriberGuard::new(Arc::clone(&state.presence), subscriber_id);

    // Open the stream with a comment frame so proxies flush headers right away.
    let hello = futures_util::stream::once(futures_util::future::ready(Ok::<_, hyper::Error>(
        Frame::data(Bytes::from_static(b": connected\n\n")),
    )));
    let updates = UnboundedReceiverStream::new(rx).map(move |frame| {
        let _ = &guard;
        Ok(Frame::data(frame))
    });
    let body = BodyExt::boxed(StreamBody::new(hello.chain(updates)));

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/event-stream")
        .header("Cache-Control", "no-cache")
        .header("Connection", "keep-alive")
        .header("Access-Control-Allow-Origin", "*")
        .body(body)
        .unwrap()
}
