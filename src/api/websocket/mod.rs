//! WebSocket streaming of periodic graph snapshots
//!
//! `GET /ws?format=...` upgrades the connection and hands it to a
//! [`StreamPublisher`]. Frames are sent until the peer disconnects or a
//! write fails; nothing is expected from the client.

pub mod handler;
pub mod lifecycle;
pub mod publisher;
pub mod writer;

pub use lifecycle::{CloseReason, ConnectionState, Lifecycle};
pub use publisher::{FixedFrame, FrameSource, PublishReport, SnapshotFrames, StreamPublisher};
pub use writer::{FrameWriter, WriteOutcome};
