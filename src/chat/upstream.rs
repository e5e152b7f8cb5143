//! Upstream chat service client
//!
//! The remote chat service is opaque: a streaming POST endpoint that yields
//! incremental text chunks. This client forwards those chunks into a
//! `TokenStream`; when the consumer cancels, the forwarding loop observes
//! the failed send and drops the upstream response mid-body.

use futures_util::StreamExt;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use super::session::ChatMessage;
use super::stream::{StreamError, TokenStreamSender};
use crate::types::{LyceumError, Result};

#[derive(Clone)]
pub struct ChatUpstream {
    http: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct UpstreamRequest<'a> {
    workspace_id: Uuid,
    message: &'a str,
    history: &'a [ChatMessage],
}

impl ChatUpstream {
    pub fn new(url: String, timeout_ms: u64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_default();
        Self { http, url }
    }

    /// Stream the reply for `message` into `sender`.
    ///
    /// Returns Ok(true) when the reply completed, Ok(false) when the
    /// consumer cancelled mid-stream.
    pub async fn stream_reply(
        &self,
        workspace_id: Uuid,
        message: &str,
        history: &[ChatMessage],
        sender: TokenStreamSender,
    ) -> Result<bool> {
        let resp = self
            .http
            .post(&self.url)
            .json(&UpstreamRequest {
                workspace_id,
                message,
                history,
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(LyceumError::Upstream(format!(
                "Chat upstream returned {}",
                resp.status()
            )));
        }

        let mut body = resp.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| LyceumError::Upstream(e.to_string()))?;
            if chunk.is_empty() {
                continue;
            }
            let text = String::from_utf8_lossy(&chunk).into_owned();
            match sender.send(text).await {
                Ok(()) => {}
                Err(StreamError::Cancelled) | Err(StreamError::Closed) => {
                    // Consumer went away: drop the response to tear the
                    // upstream connection down
                    debug!(%workspace_id, "Chat stream cancelled by consumer");
                    return Ok(false);
                }
            }
        }

        match sender.finish("").await {
            Ok(()) => Ok(true),
            Err(_) => {
                warn!(%workspace_id, "Chat consumer vanished at stream end");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::stream::TokenStream;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_streams_body_into_token_stream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Hello from upstream"))
            .mount(&server)
            .await;

        let upstream = ChatUpstream::new(format!("{}/chat", server.uri()), 5000);
        let (sender, stream) = TokenStream::channel(16);

        let task = tokio::spawn({
            let upstream = upstream.clone();
            async move {
                upstream
                    .stream_reply(Uuid::new_v4(), "hi", &[], sender)
                    .await
            }
        });

        let reply = stream.collect().await;
        assert_eq!(reply, "Hello from upstream");
        assert!(task.await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn test_upstream_error_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let upstream = ChatUpstream::new(format!("{}/chat", server.uri()), 5000);
        let (sender, _stream) = TokenStream::channel(16);

        let err = upstream
            .stream_reply(Uuid::new_v4(), "hi", &[], sender)
            .await
            .unwrap_err();
        assert!(matches!(err, LyceumError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_cancelled_consumer_stops_forwarding() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("chunk"))
            .mount(&server)
            .await;

        let upstream = ChatUpstream::new(format!("{}/chat", server.uri()), 5000);
        let (sender, stream) = TokenStream::channel(16);
        drop(stream);

        let completed = upstream
            .stream_reply(Uuid::new_v4(), "hi", &[], sender)
            .await
            .unwrap();
        assert!(!completed);
    }
}
