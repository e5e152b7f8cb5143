//! Streaming chat support
//!
//! Token streaming for incremental chat replies. Unlike a bare callback,
//! the stream is cancellable from the consuming side: dropping the
//! `TokenStream` (or firing its `CancelHandle`) closes the channel, the
//! producer's next send fails and it tears the upstream request down.

use futures::Stream;
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// A chunk of streamed reply
#[derive(Debug, Clone)]
pub struct StreamChunk {
    /// Text content
    pub content: String,
    /// Whether this is the final chunk
    pub is_final: bool,
}

impl StreamChunk {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_final: false,
        }
    }

    pub fn final_chunk(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_final: true,
        }
    }
}

/// Cancellation signal shared between consumer and producer
#[derive(Clone, Debug)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

pin_project! {
    /// Stream of reply chunks
    pub struct TokenStream {
        #[pin]
        receiver: mpsc::Receiver<StreamChunk>,
        // Accumulated content (for transcript finalization)
        accumulated: String,
        complete: bool,
        cancel: CancelHandle,
    }

    impl PinnedDrop for TokenStream {
        fn drop(this: Pin<&mut Self>) {
            // Consumer went away: flag cancellation so the producer stops
            this.cancel.cancel();
        }
    }
}

impl TokenStream {
    /// Create a sender/receiver pair for streaming
    pub fn channel(buffer: usize) -> (TokenStreamSender, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        let cancel = CancelHandle {
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        let sender = TokenStreamSender {
            sender: tx,
            cancel: cancel.clone(),
        };
        let stream = Self {
            receiver: rx,
            accumulated: String::new(),
            complete: false,
            cancel,
        };
        (sender, stream)
    }

    /// Handle that cancels this stream without consuming it
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Accumulated content so far
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    /// Whether the final chunk has been received
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Drain the stream and return the full reply
    pub async fn collect(mut self) -> String {
        use futures::StreamExt;
        while self.next().await.is_some() {}
        std::mem::take(&mut self.accumulated)
    }
}

impl Stream for TokenStream {
    type Item = StreamChunk;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        if this.cancel.is_cancelled() {
            this.receiver.get_mut().close();
            return Poll::Ready(None);
        }

        match this.receiver.get_mut().poll_recv(cx) {
            Poll::Ready(Some(chunk)) => {
                this.accumulated.push_str(&chunk.content);
                if chunk.is_final {
                    *this.complete = true;
                }
                Poll::Ready(Some(chunk))
            }
            Poll::Ready(None) => {
                *this.complete = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Sender side of a token stream
pub struct TokenStreamSender {
    sender: mpsc::Sender<StreamChunk>,
    cancel: CancelHandle,
}

impl TokenStreamSender {
    /// Send a content chunk; fails once the consumer is gone or cancelled
    pub async fn send(&self, content: impl Into<String>) -> Result<(), StreamError> {
        if self.cancel.is_cancelled() {
            return Err(StreamError::Cancelled);
        }
        self.sender
            .send(StreamChunk::content(content))
            .await
            .map_err(|_| StreamError::Closed)
    }

    /// Send the final chunk and finish the stream
    pub async fn finish(self, content: impl Into<String>) -> Result<(), StreamError> {
        if self.cancel.is_cancelled() {
            return Err(StreamError::Cancelled);
        }
        self.sender
            .send(StreamChunk::final_chunk(content))
            .await
            .map_err(|_| StreamError::Closed)
    }

    /// Whether the consumer has cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Error during streaming
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StreamError {
    #[error("Stream closed")]
    Closed,
    #[error("Stream cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_token_stream() {
        let (sender, mut stream) = TokenStream::channel(10);

        tokio::spawn(async move {
            sender.send("Hello").await.unwrap();
            sender.send(", ").await.unwrap();
            sender.send("world").await.unwrap();
            sender.finish("!").await.unwrap();
        });

        let mut chunks = Vec::new();
        while let Some(chunk) = stream.next().await {
            let done = chunk.is_final;
            chunks.push(chunk);
            if done {
                break;
            }
        }

        assert_eq!(chunks.len(), 4);
        assert_eq!(stream.accumulated(), "Hello, world!");
        assert!(stream.is_complete());
    }

    #[tokio::test]
    async fn test_drop_cancels_producer() {
        let (sender, stream) = TokenStream::channel(1);
        drop(stream);

        // The producer observes cancellation on its next send
        assert!(sender.is_cancelled());
        assert_eq!(sender.send("late").await, Err(StreamError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_handle_stops_stream() {
        let (sender, mut stream) = TokenStream::channel(10);
        sender.send("partial").await.unwrap();

        let handle = stream.cancel_handle();
        handle.cancel();

        // Consumer sees end-of-stream, producer sees cancellation
        assert!(stream.next().await.is_none());
        assert_eq!(sender.send("more").await, Err(StreamError::Cancelled));
    }

    #[tokio::test]
    async fn test_collect() {
        let (sender, stream) = TokenStream::channel(10);
        tokio::spawn(async move {
            sender.send("ab").await.unwrap();
            sender.finish("c").await.unwrap();
        });
        assert_eq!(stream.collect().await, "abc");
    }
}
