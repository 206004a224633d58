//! Byte-stream relay for file and stream responses.
//!
//! Once the dispatcher commits a response head, body bytes flow through a
//! [`StreamRelay`]. By then it is too late for the error boundary: a source
//! failure mid-body cannot become a second response. The relay's job is to
//! make that tail end well-defined anyway:
//!
//! - source errors are logged and terminate the body, so the client sees a
//!   truncated transfer instead of a hung connection,
//! - an optional completion hook fires exactly once with the final
//!   [`RelayOutcome`], whether the transfer completed, failed, or was
//!   abandoned by the client disconnecting.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use hyper::body::Frame;
use pylon_core::{ByteStream, RequestId};

/// How a relayed body ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The source stream ended normally.
    Completed,
    /// The source stream yielded an error; the body was truncated.
    Failed,
    /// The relay was dropped before the source ended, typically because the
    /// client disconnected.
    Aborted,
}

type CompletionFn = Box<dyn FnOnce(RelayOutcome) + Send + Sync>;

/// Adapts a fallible byte stream into an infallible body stream.
///
/// Yields `Frame<Bytes>` items suitable for `http_body_util::StreamBody`.
pub(crate) struct StreamRelay {
    source: ByteStream,
    request_id: RequestId,
    on_complete: Option<CompletionFn>,
    bytes_relayed: u64,
    done: bool,
}

impl StreamRelay {
    /// Creates a relay with no completion hook.
    pub(crate) fn new(source: ByteStream, request_id: RequestId) -> Self {
        Self {
            source,
            request_id,
            on_complete: None,
            bytes_relayed: 0,
            done: false,
        }
    }

    /// Creates a relay that calls `on_complete` exactly once when the body
    /// ends, with the outcome it ended in.
    pub(crate) fn with_completion<F>(source: ByteStream, request_id: RequestId, on_complete: F) -> Self
    where
        F: FnOnce(RelayOutcome) + Send + Sync + 'static,
    {
        Self {
            source,
            request_id,
            on_complete: Some(Box::new(on_complete)),
            bytes_relayed: 0,
            done: false,
        }
    }

    fn finish(&mut self, outcome: RelayOutcome) {
        self.done = true;
        if let Some(hook) = self.on_complete.take() {
            hook(outcome);
        }
    }
}

impl Stream for StreamRelay {
    type Item = Result<Frame<Bytes>, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        match this.source.as_mut().poll_next(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(chunk))) => {
                this.bytes_relayed += chunk.len() as u64;
                Poll::Ready(Some(Ok(Frame::data(chunk))))
            }
            Poll::Ready(Some(Err(error))) => {
                // The head is committed; all we can do is truncate and log.
                tracing::error!(
                    request_id = %this.request_id,
                    bytes_relayed = this.bytes_relayed,
                    error = %error,
                    "response stream failed mid-body; truncating"
                );
                this.finish(RelayOutcome::Failed);
                Poll::Ready(None)
            }
            Poll::Ready(None) => {
                this.finish(RelayOutcome::Completed);
                Poll::Ready(None)
            }
        }
    }
}

impl Drop for StreamRelay {
    fn drop(&mut self) {
        if !self.done {
            tracing::debug!(
                request_id = %self.request_id,
                bytes_relayed = self.bytes_relayed,
                "response body dropped before completion"
            );
            self.finish(RelayOutcome::Aborted);
        }
    }
}
