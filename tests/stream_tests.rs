//! Streaming lifecycle tests, driven on a paused clock

use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::StreamExt;

use service_graph::api::websocket::{
    CloseReason, ConnectionState, FrameSource, SnapshotFrames, StreamPublisher,
};
use service_graph::api::AppState;
use service_graph::{
    DynamicGraph, Edge, OutputFormat, QueryWindow, Result, ServiceGraphConfig, ServiceGraphError,
    StaticGraphSource,
};

type Inbound = std::result::Result<(), io::Error>;

fn state() -> Arc<AppState> {
    let mut builder = DynamicGraph::builder();
    builder.add_edge(Edge::new("A", "B").with_label("reqs/sec", "5"));
    Arc::new(AppState::new(
        Arc::new(StaticGraphSource::new(builder.build())),
        ServiceGraphConfig::default(),
    ))
}

/// Fails every other call, starting with the first
struct Flaky {
    calls: AtomicU32,
}

#[async_trait]
impl FrameSource for Flaky {
    async fn next_frame(&self) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n % 2 == 0 {
            Err(ServiceGraphError::Backend("prometheus unreachable".into()))
        } else {
            Ok(format!("frame-{}", n))
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_two_ticks_then_peer_close() {
    let (out_tx, mut out_rx) = mpsc::unbounded::<String>();
    let (in_tx, in_rx) = mpsc::unbounded::<Inbound>();
    let frames = SnapshotFrames::new(state(), OutputFormat::Nested, QueryWindow::new("5m"));
    let publisher = StreamPublisher::new(Arc::new(frames), Duration::from_secs(1)).unwrap();
    let task = tokio::spawn(publisher.run(out_tx, in_rx));

    for _ in 0..2 {
        let frame = out_rx.next().await.expect("frame");
        let doc: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(doc["name"], "edge");
        assert_eq!(doc["renderer"], "global");
        assert_eq!(doc["nodes"][1]["connections"][0]["metrics"]["normal"], 500.0);
    }

    drop(in_tx);
    let report = task.await.unwrap();

    assert_eq!(report.frames_sent, 2);
    assert_eq!(report.timer_stops, 1);
    assert_eq!(report.close_reason, Some(CloseReason::PeerClosed));
    assert_eq!(report.final_state, ConnectionState::Closed);

    tokio::time::advance(Duration::from_secs(10)).await;
    assert!(out_rx.next().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_write_failure_stops_producer_and_reader() {
    let (out_tx, mut out_rx) = mpsc::unbounded::<String>();
    let (in_tx, in_rx) = mpsc::unbounded::<Inbound>();
    let frames = SnapshotFrames::new(state(), OutputFormat::Flat, QueryWindow::new("5m"));
    let publisher = StreamPublisher::new(Arc::new(frames), Duration::from_secs(1)).unwrap();
    let task = tokio::spawn(publisher.run(out_tx, in_rx));

    assert!(out_rx.next().await.is_some());
    drop(out_rx);

    let report = task.await.unwrap();
    assert_eq!(report.frames_sent, 1);
    assert_eq!(report.timer_stops, 1);
    assert!(matches!(report.close_reason, Some(CloseReason::WriteError(_))));
    // The reader was cancelled and released the inbound half
    assert!(in_tx.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_failed_ticks_are_skipped_not_fatal() {
    let (out_tx, mut out_rx) = mpsc::unbounded::<String>();
    let (in_tx, in_rx) = mpsc::unbounded::<Inbound>();
    let flaky = Flaky {
        calls: AtomicU32::new(0),
    };
    let publisher = StreamPublisher::new(Arc::new(flaky), Duration::from_millis(500)).unwrap();
    let task = tokio::spawn(publisher.run(out_tx, in_rx));

    assert_eq!(out_rx.next().await.as_deref(), Some("frame-1"));
    assert_eq!(out_rx.next().await.as_deref(), Some("frame-3"));
    drop(in_tx);

    let report = task.await.unwrap();
    assert_eq!(report.frames_sent, 2);
    assert_eq!(report.skipped_ticks, 2);
    assert_eq!(report.close_reason, Some(CloseReason::PeerClosed));
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_stream() {
    let (out_tx, mut out_rx) = mpsc::unbounded::<String>();
    let (in_tx, in_rx) = mpsc::unbounded::<Inbound>();
    let frames = SnapshotFrames::new(state(), OutputFormat::Heartbeat, QueryWindow::new("5m"));
    let publisher = StreamPublisher::new(Arc::new(frames), Duration::from_secs(1)).unwrap();
    let task = tokio::spawn(publisher.run(out_tx, in_rx));

    assert_eq!(out_rx.next().await.as_deref(), Some("NGK2.."));
    drop(in_tx);
    assert_eq!(task.await.unwrap().frames_sent, 1);
}
