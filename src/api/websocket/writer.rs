//! Single-writer access to a connection's outbound half

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::{Sink, SinkExt};
use tokio::sync::Mutex;
use tracing::debug;

use super::lifecycle::{cancelled, Lifecycle};
use crate::error::{Result, ServiceGraphError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Sent,
    /// Dropped because the connection is closing or already closed
    Suppressed,
}

/// Serializes every write to the sink behind one lock.
///
/// Writes are refused once the lifecycle reaches `Closing`; a write already
/// stalled on a slow peer is abandoned at that point. The sink is closed at
/// most once.
pub struct FrameWriter<W> {
    sink: Mutex<Option<W>>,
    lifecycle: Arc<Lifecycle>,
    sent: AtomicU64,
    suppressed: AtomicU64,
}

impl<W> FrameWriter<W>
where
    W: Sink<String> + Unpin,
    W::Error: Display,
{
    pub fn new(sink: W, lifecycle: Arc<Lifecycle>) -> Self {
        Self {
            sink: Mutex::new(Some(sink)),
            lifecycle,
            sent: AtomicU64::new(0),
            suppressed: AtomicU64::new(0),
        }
    }

    pub async fn send(&self, frame: String) -> Result<WriteOutcome> {
        let mut cancel = self.lifecycle.subscribe();
        let mut guard = self.sink.lock().await;
        let sink = match guard.as_mut() {
            Some(sink) if !self.lifecycle.is_closing() => sink,
            _ => return Ok(self.suppress()),
        };
        tokio::select! {
            sent = sink.send(frame) => {
                sent.map_err(|e| ServiceGraphError::Transport(e.to_string()))?;
            }
            _ = cancelled(&mut cancel) => return Ok(self.suppress()),
        }
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(WriteOutcome::Sent)
    }

    fn suppress(&self) -> WriteOutcome {
        self.suppressed.fetch_add(1, Ordering::Relaxed);
        debug!("write suppressed on closing connection");
        WriteOutcome::Suppressed
    }

    /// Close the sink. Returns `true` only for the call that closed it.
    pub async fn close(&self) -> bool {
        let Some(mut sink) = self.sink.lock().await.take() else {
            return false;
        };
        if let Err(err) = sink.close().await {
            debug!(error = %err, "error while closing sink");
        }
        true
    }

    pub fn frames_sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn frames_suppressed(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::websocket::lifecycle::CloseReason;
    use futures::channel::mpsc;
    use futures::StreamExt;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// A peer that never accepts another frame
    struct StalledSink;

    impl Sink<String> for StalledSink {
        type Error = io::Error;

        fn poll_ready(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Pending
        }

        fn start_send(self: Pin<&mut Self>, _: String) -> io::Result<()> {
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn writer() -> (FrameWriter<mpsc::UnboundedSender<String>>, mpsc::UnboundedReceiver<String>, Arc<Lifecycle>) {
        let (tx, rx) = mpsc::unbounded();
        let lifecycle = Arc::new(Lifecycle::new());
        lifecycle.open();
        (FrameWriter::new(tx, Arc::clone(&lifecycle)), rx, lifecycle)
    }

    #[tokio::test]
    async fn test_send_then_suppress_after_closing() {
        let (writer, mut rx, lifecycle) = writer();
        assert_eq!(writer.send("one".into()).await.unwrap(), WriteOutcome::Sent);

        lifecycle.begin_close(CloseReason::PeerClosed);
        assert_eq!(
            writer.send("two".into()).await.unwrap(),
            WriteOutcome::Suppressed
        );

        assert_eq!(rx.next().await.as_deref(), Some("one"));
        assert_eq!(writer.frames_sent(), 1);
        assert_eq!(writer.frames_suppressed(), 1);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (writer, mut rx, _lifecycle) = writer();
        assert!(writer.close().await);
        assert!(!writer.close().await);
        assert!(rx.next().await.is_none());
        assert_eq!(
            writer.send("late".into()).await.unwrap(),
            WriteOutcome::Suppressed
        );
    }

    #[tokio::test]
    async fn test_send_error_is_transport_error() {
        let (writer, rx, _lifecycle) = writer();
        drop(rx);
        assert!(matches!(
            writer.send("lost".into()).await,
            Err(ServiceGraphError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_stalled_send_released_on_closing() {
        let lifecycle = Arc::new(Lifecycle::new());
        lifecycle.open();
        let writer = Arc::new(FrameWriter::new(StalledSink, Arc::clone(&lifecycle)));

        let pending = tokio::spawn({
            let writer = Arc::clone(&writer);
            async move { writer.send("frame".into()).await }
        });
        tokio::task::yield_now().await;
        lifecycle.begin_close(CloseReason::PeerClosed);

        assert_eq!(pending.await.unwrap().unwrap(), WriteOutcome::Suppressed);
        assert_eq!(writer.frames_sent(), 0);
        assert_eq!(writer.frames_suppressed(), 1);
        assert!(writer.close().await);
    }
}
