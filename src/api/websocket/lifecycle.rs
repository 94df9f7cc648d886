//! Per-connection state machine and cancellation signal

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

/// `Connecting -> Open -> Closing -> Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

/// What ended a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer closed the stream
    PeerClosed,
    ReadError(String),
    WriteError(String),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerClosed => f.write_str("peer closed"),
            Self::ReadError(e) => write!(f, "read error: {}", e),
            Self::WriteError(e) => write!(f, "write error: {}", e),
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: ConnectionState,
    reason: Option<CloseReason>,
}

/// Shared by the reader and the producer of one connection.
///
/// The first termination, from either side, moves the connection to
/// `Closing` and fires the cancellation signal; later attempts are no-ops.
#[derive(Debug)]
pub struct Lifecycle {
    inner: Mutex<Inner>,
    cancel: watch::Sender<bool>,
    timer_stops: AtomicU32,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            inner: Mutex::new(Inner {
                state: ConnectionState::Connecting,
                reason: None,
            }),
            cancel,
            timer_stops: AtomicU32::new(0),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    /// `Connecting -> Open`; false from any other state
    pub fn open(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != ConnectionState::Connecting {
            return false;
        }
        inner.state = ConnectionState::Open;
        debug!("connection open");
        true
    }

    /// Enter `Closing` and cancel. Only the first caller gets `true`.
    pub fn begin_close(&self, reason: CloseReason) -> bool {
        let mut inner = self.inner.lock();
        if inner.state >= ConnectionState::Closing {
            return false;
        }
        debug!(reason = %reason, "connection closing");
        inner.state = ConnectionState::Closing;
        inner.reason = Some(reason);
        self.cancel.send_replace(true);
        true
    }

    /// Enter the terminal state
    pub fn finish(&self) {
        let mut inner = self.inner.lock();
        if inner.state < ConnectionState::Closing {
            self.cancel.send_replace(true);
        }
        inner.state = ConnectionState::Closed;
    }

    pub fn is_closing(&self) -> bool {
        self.state() >= ConnectionState::Closing
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.inner.lock().reason.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.cancel.subscribe()
    }

    /// Called by the producer when it drops its interval timer
    pub fn record_timer_stop(&self) {
        self.timer_stops.fetch_add(1, Ordering::SeqCst);
    }

    pub fn timer_stops(&self) -> u32 {
        self.timer_stops.load(Ordering::SeqCst)
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once `rx` observes cancellation (or its sender is gone)
pub async fn cancelled(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|cancelled| *cancelled).await;
}
