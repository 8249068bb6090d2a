//! In-memory `Face`/`SegmentPublisher` used by this crate's own tests and by
//! the demo binary. Grounds on the teacher's shared-clock pattern
//! (`crates/core/src/node/inner/time.rs`'s `TimestampManager`): an
//! `Arc<Mutex<..>>`-guarded table that every cloned handle reads and writes,
//! standing in for the single process-wide state a real forwarder would own.

use crate::error::FaceError;
use crate::face::{Face, IncomingRequest, ReplyResponder, SegmentPublisher};
use async_trait::async_trait;
use bytes::Bytes;
use psync_types::Name;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};

struct Filter {
    face_id: u64,
    prefix: Name,
    sender: mpsc::UnboundedSender<IncomingRequest>,
}

#[derive(Default)]
struct NetworkInner {
    filters: Vec<Filter>,
}

/// A shared broadcast domain: every [`InMemoryFace`] built from the same
/// network sees every other face's registered interest filter, the way a
/// single NDN forwarder relays an Interest to every face with a matching
/// registration other than the one it arrived on.
#[derive(Clone, Default)]
pub struct InMemoryNetwork {
    inner: Arc<Mutex<NetworkInner>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a new face attached to this network, distinct from every other
    /// face so a peer never receives its own outbound request back.
    pub fn new_face(&self) -> InMemoryFace {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        InMemoryFace {
            id,
            network: self.inner.clone(),
        }
    }
}

pub struct InMemoryFace {
    id: u64,
    network: Arc<Mutex<NetworkInner>>,
}

#[async_trait]
impl Face for InMemoryFace {
    async fn send_request(&self, name: Name, lifetime: Duration) -> Result<Bytes, FaceError> {
        let targets: Vec<_> = {
            let inner = self.network.lock().expect("network lock poisoned");
            inner
                .filters
                .iter()
                .filter(|filter| filter.face_id != self.id && is_prefix_of(&filter.prefix, &name))
                .map(|filter| filter.sender.clone())
                .collect()
        };
        if targets.is_empty() {
            return Err(FaceError::Timeout);
        }

        let mut pending = Vec::with_capacity(targets.len());
        for sender in targets {
            let (tx, rx) = oneshot::channel();
            let request = IncomingRequest {
                name: name.clone(),
                responder: ReplyResponder::new(tx),
            };
            if sender.send(request).is_ok() {
                pending.push(Box::pin(async move {
                    rx.await
                        .map_err(|_| FaceError::Other("peer dropped its responder".into()))
                }));
            }
        }
        if pending.is_empty() {
            return Err(FaceError::Timeout);
        }

        // Any registered peer may answer; the first one to reply wins, same
        // as a multicast Interest satisfied by whichever producer is fastest.
        let race = futures::future::select_ok(pending);
        match tokio::time::timeout(lifetime, race).await {
            Ok(Ok((bytes, _))) => Ok(bytes),
            Ok(Err(_)) => Err(FaceError::Timeout),
            Err(_) => Err(FaceError::Timeout),
        }
    }

    fn register_interest_filter(&self, prefix: Name) -> mpsc::UnboundedReceiver<IncomingRequest> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.network.lock().expect("network lock poisoned").filters.push(Filter {
            face_id: self.id,
            prefix,
            sender: tx,
        });
        rx
    }
}

fn is_prefix_of(prefix: &Name, name: &Name) -> bool {
    if prefix.len() > name.len() {
        return false;
    }
    prefix.components().zip(name.components()).all(|(a, b)| a == b)
}

/// A small in-memory retransmit cache: `publish` keyed by request name,
/// entries pruned lazily on `reply_from_store` once their freshness window
/// has elapsed.
#[derive(Default)]
pub struct InMemorySegmentStore {
    inner: Mutex<HashMap<Name, (Bytes, Instant)>>,
}

impl InMemorySegmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SegmentPublisher for InMemorySegmentStore {
    fn publish(&self, request_name: &Name, content: Bytes, freshness: Duration) {
        self.inner
            .lock()
            .expect("segment store lock poisoned")
            .insert(request_name.clone(), (content, Instant::now() + freshness));
    }

    fn reply_from_store(&self, request_name: &Name) -> Option<Bytes> {
        let mut inner = self.inner.lock().expect("segment store lock poisoned");
        match inner.get(request_name) {
            Some((bytes, expires_at)) if *expires_at > Instant::now() => Some(bytes.clone()),
            Some(_) => {
                inner.remove(request_name);
                None
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_with_no_registered_peers_times_out() {
        let network = InMemoryNetwork::new();
        let face = network.new_face();
        let result = face
            .send_request(Name::from_uri("/psync"), Duration::from_millis(20))
            .await;
        assert!(matches!(result, Err(FaceError::Timeout)));
    }

    #[tokio::test]
    async fn request_reaches_a_registered_peer() {
        let network = InMemoryNetwork::new();
        let requester = network.new_face();
        let responder_face = network.new_face();

        let mut requests = responder_face.register_interest_filter(Name::from_uri("/psync"));

        let send = tokio::spawn(async move {
            requester
                .send_request(
                    Name::from_uri("/psync").push(psync_types::NameComponent::new(&b"iblt"[..])),
                    Duration::from_millis(200),
                )
                .await
        });

        let incoming = requests.recv().await.expect("request delivered");
        incoming.responder.reply(Bytes::from_static(b"reply"));

        assert_eq!(send.await.unwrap().unwrap(), Bytes::from_static(b"reply"));
    }

    #[tokio::test]
    async fn a_face_never_receives_its_own_request() {
        let network = InMemoryNetwork::new();
        let face = network.new_face();
        let _requests = face.register_interest_filter(Name::from_uri("/psync"));

        let result = face
            .send_request(Name::from_uri("/psync/iblt"), Duration::from_millis(20))
            .await;
        assert!(matches!(result, Err(FaceError::Timeout)));
    }

    #[test]
    fn segment_store_expires_entries() {
        let store = InMemorySegmentStore::new();
        let name = Name::from_uri("/psync/iblt");
        store.publish(&name, Bytes::from_static(b"x"), Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.reply_from_store(&name), None);
    }
}
