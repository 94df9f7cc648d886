//! Periodic snapshot publisher for one streaming connection.
//!
//! Two tasks share a [`Lifecycle`]: the producer waits on an interval timer
//! and writes one frame per tick; the reader only waits for the next inbound
//! item so it notices when the peer goes away. Whichever side sees the
//! connection fail first cancels the other. The producer owns the timer and
//! drops it exactly once on its way out; the sink is closed once after both
//! tasks are done.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Sink, Stream, StreamExt};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::lifecycle::{cancelled, CloseReason, ConnectionState, Lifecycle};
use super::writer::{FrameWriter, WriteOutcome};
use crate::api::state::AppState;
use crate::error::{Result, ServiceGraphError};
use crate::render::OutputFormat;
use crate::source::QueryWindow;

/// Produces the payload for each tick
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn next_frame(&self) -> Result<String>;
}

/// Runs the full query/aggregate/render pipeline for every frame
pub struct SnapshotFrames {
    state: Arc<AppState>,
    format: OutputFormat,
    window: QueryWindow,
}

impl SnapshotFrames {
    pub fn new(state: Arc<AppState>, format: OutputFormat, window: QueryWindow) -> Self {
        Self {
            state,
            format,
            window,
        }
    }
}

#[async_trait]
impl FrameSource for SnapshotFrames {
    async fn next_frame(&self) -> Result<String> {
        let bytes = self.state.render(self.format, &self.window).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// The same payload on every tick
#[derive(Debug, Clone)]
pub struct FixedFrame {
    payload: String,
}

impl FixedFrame {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

#[async_trait]
impl FrameSource for FixedFrame {
    async fn next_frame(&self) -> Result<String> {
        Ok(self.payload.clone())
    }
}

/// Summary of a finished connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub frames_sent: u64,
    pub frames_suppressed: u64,
    /// Ticks whose frame could not be produced
    pub skipped_ticks: u64,
    pub timer_stops: u32,
    pub close_reason: Option<CloseReason>,
    pub final_state: ConnectionState,
}

/// Streams frames on a fixed interval until the connection ends
pub struct StreamPublisher {
    frames: Arc<dyn FrameSource>,
    interval: Duration,
}

impl StreamPublisher {
    /// Fails for a zero interval, which the timer cannot tick on
    pub fn new(frames: Arc<dyn FrameSource>, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(ServiceGraphError::InvalidConfig(
                "publish interval must be positive".to_string(),
            ));
        }
        Ok(Self { frames, interval })
    }

    /// Drive one connection to completion.
    ///
    /// `sink` receives frames; `inbound` is read only to detect disconnect.
    /// Never retries: once this returns the connection is gone.
    pub async fn run<W, R, M, E>(self, sink: W, inbound: R) -> PublishReport
    where
        W: Sink<String> + Send + Unpin + 'static,
        W::Error: Display,
        R: Stream<Item = std::result::Result<M, E>> + Send + Unpin + 'static,
        M: Send + 'static,
        E: Display + Send + 'static,
    {
        let lifecycle = Arc::new(Lifecycle::new());
        let writer = Arc::new(FrameWriter::new(sink, Arc::clone(&lifecycle)));
        lifecycle.open();

        let producer = tokio::spawn(produce(
            Arc::clone(&self.frames),
            self.interval,
            Arc::clone(&writer),
            Arc::clone(&lifecycle),
        ));
        let reader = tokio::spawn(read_until_closed(inbound, Arc::clone(&lifecycle)));

        let (produced, read) = tokio::join!(producer, reader);
        let skipped_ticks = produced.unwrap_or_else(|err| {
            warn!(error = %err, "producer task failed");
            lifecycle.begin_close(CloseReason::WriteError(err.to_string()));
            0
        });
        if let Err(err) = read {
            warn!(error = %err, "reader task failed");
            lifecycle.begin_close(CloseReason::ReadError(err.to_string()));
        }

        writer.close().await;
        lifecycle.finish();

        let report = PublishReport {
            frames_sent: writer.frames_sent(),
            frames_suppressed: writer.frames_suppressed(),
            skipped_ticks,
            timer_stops: lifecycle.timer_stops(),
            close_reason: lifecycle.close_reason(),
            final_state: lifecycle.state(),
        };
        info!(
            frames = report.frames_sent,
            skipped = report.skipped_ticks,
            reason = ?report.close_reason,
            "stream connection closed"
        );
        report
    }
}

/// Producer task; returns the number of skipped ticks
async fn produce<W>(
    frames: Arc<dyn FrameSource>,
    period: Duration,
    writer: Arc<FrameWriter<W>>,
    lifecycle: Arc<Lifecycle>,
) -> u64
where
    W: Sink<String> + Send + Unpin,
    W::Error: Display,
{
    let mut cancel = lifecycle.subscribe();
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut skipped = 0;

    loop {
        tokio::select! {
            _ = cancelled(&mut cancel) => break,
            _ = ticker.tick() => {}
        }

        let frame = tokio::select! {
            _ = cancelled(&mut cancel) => break,
            frame = frames.next_frame() => frame,
        };

        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, "skipping frame");
                skipped += 1;
                continue;
            }
        };

        match writer.send(frame).await {
            Ok(WriteOutcome::Sent) => {}
            Ok(WriteOutcome::Suppressed) => break,
            Err(err) => {
                lifecycle.begin_close(CloseReason::WriteError(err.to_string()));
                break;
            }
        }
    }

    drop(ticker);
    lifecycle.record_timer_stop();
    debug!("producer stopped");
    skipped
}

/// Reader task: no inbound messages are expected, only termination matters
async fn read_until_closed<R, M, E>(mut inbound: R, lifecycle: Arc<Lifecycle>)
where
    R: Stream<Item = std::result::Result<M, E>> + Unpin,
    E: Display,
{
    let mut cancel = lifecycle.subscribe();
    let reason = loop {
        let item = tokio::select! {
            _ = cancelled(&mut cancel) => return,
            item = inbound.next() => item,
        };
        match item {
            Some(Ok(_)) => continue,
            Some(Err(err)) => break CloseReason::ReadError(err.to_string()),
            None => break CloseReason::PeerClosed,
        }
    };
    lifecycle.begin_close(reason);
}
