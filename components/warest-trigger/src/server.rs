//! axum adapter around [`WarestTrigger`].

use std::sync::Arc;

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;
use warest_common::HeaderList;

use crate::handler::{ChannelItem, WarestTrigger, WebhookRequest};

/// Largest webhook body the listener reads.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone)]
struct TriggerState {
    trigger: Arc<WarestTrigger>,
    sink: UnboundedSender<ChannelItem>,
}

/// Serve the trigger at its configured path; accepted events go to `sink`.
pub fn router(trigger: Arc<WarestTrigger>, sink: UnboundedSender<ChannelItem>) -> Router {
    let path = trigger.config().route();
    Router::new()
        .route(&path, any(handle_webhook))
        .with_state(TriggerState { trigger, sink })
}

async fn handle_webhook(State(state): State<TriggerState>, req: Request<Body>) -> Response {
    let method = req.method().to_string();
    let headers: HeaderList = req
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = match to_bytes(req.into_body(), MAX_BODY_BYTES).await {
        Ok(bytes) => bytes.to_vec(),
        Err(err) => {
            warn!(error = %err, "failed to read webhook body");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let outcome = state.trigger.handle_now(&WebhookRequest {
        method,
        headers,
        body,
    });
    if let Some(item) = outcome.emitted
        && state.sink.send(item).is_err()
    {
        warn!("webhook item dropped: receiver closed");
    }

    let status = StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::OK);
    match outcome.body {
        Some(body) => (status, Json(body)).into_response(),
        None => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TriggerConfig;
    use crate::signature::{HmacAlgorithm, SIGNATURE_HEADER, USERNAME_HEADER, sign};
    use axum::http::HeaderValue;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    fn app() -> (Router, mpsc::UnboundedReceiver<ChannelItem>) {
        let trigger = WarestTrigger::new(TriggerConfig {
            path: "hooks/wa".into(),
            secrets: "old\nabc".into(),
            ..TriggerConfig::default()
        })
        .unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        (router(Arc::new(trigger), tx), rx)
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn signed_post_is_accepted_and_emitted() {
        let (app, mut rx) = app();
        let body = r#"{"event":"presence.update","data":{"jid":"628@s"}}"#;
        let request = Request::builder()
            .method("POST")
            .uri("/hooks/wa")
            .header(
                SIGNATURE_HEADER,
                sign(HmacAlgorithm::Sha256, "abc", "", body.as_bytes()),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"ok": true}));

        let item = rx.try_recv().unwrap();
        assert_eq!(item.channel, "presence_update");
        assert_eq!(item.item["payload"], json!({"jid": "628@s"}));
    }

    #[tokio::test]
    async fn bad_signature_gets_401() {
        let (app, mut rx) = app();
        let request = Request::builder()
            .method("POST")
            .uri("/hooks/wa")
            .header(SIGNATURE_HEADER, "HMAC-SHA256=deadbeef")
            .body(Body::from("{}"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await,
            json!({"ok": false, "message": "Invalid signature"})
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn utf8_username_is_part_of_the_key() {
        let (app, mut rx) = app();
        let body = r#"{"event":"call"}"#;
        let request = Request::builder()
            .method("POST")
            .uri("/hooks/wa")
            .header(
                SIGNATURE_HEADER,
                sign(HmacAlgorithm::Sha256, "abc", "josé", body.as_bytes()),
            )
            .header(
                USERNAME_HEADER,
                HeaderValue::from_bytes("josé".as_bytes()).unwrap(),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let item = rx.try_recv().unwrap();
        assert_eq!(item.channel, "call");
        assert_eq!(item.item["username"], json!("josé"));
    }

    #[tokio::test]
    async fn other_methods_and_paths_are_refused() {
        let (app, _rx) = app();
        let get = Request::builder()
            .method("GET")
            .uri("/hooks/wa")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(get).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let elsewhere = Request::builder()
            .method("POST")
            .uri("/other")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(elsewhere).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
