//! The transport boundary the engine depends on but never implements: a
//! `Face` for sending outbound sync requests and registering an interest
//! filter for inbound ones, and a segment publisher for replying (with a
//! small retransmit store). Concrete transports (NDN Face, QUIC, whatever)
//! implement these traits; `psync-core` ships only the in-memory
//! implementation in [`crate::testkit`] used by its own tests and the demo.

use crate::error::FaceError;
use async_trait::async_trait;
use bytes::Bytes;
use psync_types::Name;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// A peer request delivered through a registered interest filter.
#[derive(Debug)]
pub struct IncomingRequest {
    pub name: Name,
    pub responder: ReplyResponder,
}

/// One-shot reply channel bound to a single [`IncomingRequest`]. Dropping it
/// without calling [`ReplyResponder::reply`] is equivalent to not answering
/// the interest (the requester's fetch eventually times out).
#[derive(Debug)]
pub struct ReplyResponder {
    inner: oneshot::Sender<Bytes>,
}

impl ReplyResponder {
    pub fn new(inner: oneshot::Sender<Bytes>) -> Self {
        Self { inner }
    }

    pub fn reply(self, bytes: Bytes) {
        let _ = self.inner.send(bytes);
    }
}

#[async_trait]
pub trait Face: Send + Sync {
    /// Issues an outbound request named `name` and awaits its reply.
    /// Dropping the returned future cancels the in-flight fetch: the engine
    /// only ever keeps one outstanding request, and replacing it simply
    /// stops polling the old future.
    async fn send_request(&self, name: Name, lifetime: Duration) -> Result<Bytes, FaceError>;

    /// Registers an interest filter under `prefix`, returning a channel of
    /// inbound peer requests matching it.
    fn register_interest_filter(&self, prefix: Name) -> mpsc::UnboundedReceiver<IncomingRequest>;
}

/// The segment publisher / retransmit store: `publish` caches a reply
/// under its request name (so `reply_from_store` can serve a retransmit
/// without recomputing the diff).
pub trait SegmentPublisher: Send + Sync {
    fn publish(&self, request_name: &Name, content: Bytes, freshness: Duration);
    fn reply_from_store(&self, request_name: &Name) -> Option<Bytes>;
}
