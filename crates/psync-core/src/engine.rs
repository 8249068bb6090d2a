//! The `SyncEngine` actor: the `FullProducer`-equivalent state machine that
//! drives full-set reconciliation. Structured the way
//! `anvil_zksync_core::node::inner::node_executor::NodeExecutor` is — a
//! task owning an `mpsc::Receiver<EngineCommand>`, addressed externally
//! through a cloneable `SyncEngineHandle` — with the "only one outbound
//! fetch in flight, issuing a new one drops the old" rule realized the way
//! `node::sealer::BlockSealer` realizes "only one in-flight seal command":
//! a freshly assigned future simply replaces, and so cancels, the old one.
//!
//! Grounded throughout on `PSync::FullProducer`
//! (`examples/original_source/PSync/full-producer.cpp`): `sendSyncInterest`,
//! `onSyncInterest` (branches A-D below), `sendSyncData`, `onSyncData`,
//! `satisfyPendingInterests`, `isFutureHash`, `deletePendingInterests`.

use crate::codec::State;
use crate::digest::DigestEngine;
use crate::error::{EngineError, FaceError};
use crate::face::{Face, IncomingRequest, ReplyResponder, SegmentPublisher};
use crate::registry::PrefixRegistry;
use bytes::Bytes;
use futures::future::BoxFuture;
use psync_common::{compress, decompress, Jitter};
use psync_config::SyncConfig;
use psync_iblt::{murmur3_32_str, Iblt};
use psync_types::{Name, NameComponent};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Seed for the "future hash" probe: `murmur3(prefix ++ (currentSeq + 1))`
/// with this seed is checked against a peer's negative set before replying
/// with `prefix`, to detect that the peer already knows about a sequence
/// newer than ours. Independent of `psync_iblt`'s internal cell-placement
/// seeds and of [`crate::digest::IBLT_HASH_SEED`] — all three must still
/// match across peers to interoperate.
pub const N_HASHCHECK: u32 = 0x5f40_b1f7;

/// How often the actor sweeps the waiting list and the pending table for
/// expired entries. Not a protocol constant, purely an implementation
/// polling granularity: coarse enough to be cheap, fine enough that
/// nothing waits much past its actual deadline.
const SWEEP_INTERVAL: Duration = Duration::from_millis(50);

/// One entry of a sync reply the caller has not yet seen, handed to the
/// `on_update` callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingDataInfo {
    pub prefix: Name,
    pub low_seq: u64,
    pub high_seq: u64,
    pub block: Option<Bytes>,
}

type UpdateCallback = Box<dyn Fn(&[MissingDataInfo]) + Send + Sync>;

/// Messages accepted by the running engine, sent through a
/// [`SyncEngineHandle`].
pub enum EngineCommand {
    AddUserPrefix(Name),
    RemoveUserPrefix(Name),
    PublishName {
        prefix: Name,
        seq: Option<u64>,
    },
    PublishNameAndData {
        prefix: Name,
        block: Bytes,
        seq: Option<u64>,
    },
    CurrentSeq {
        prefix: Name,
        reply: oneshot::Sender<Option<u64>>,
    },
}

/// Cloneable external handle to a running [`SyncEngine`]. Every method
/// serializes onto the actor task via its command channel, giving all
/// callers the same single-writer ordering guarantee the actor itself
/// relies on internally.
#[derive(Clone)]
pub struct SyncEngineHandle {
    commands: mpsc::Sender<EngineCommand>,
}

impl SyncEngineHandle {
    pub async fn add_user_prefix(&self, prefix: Name) -> Result<(), EngineError> {
        self.commands
            .send(EngineCommand::AddUserPrefix(prefix))
            .await
            .map_err(|_| EngineError::EngineStopped)
    }

    /// `removeUserNode`: drops a locally registered prefix, erasing its
    /// current published sequence (if any) from the digest as well.
    pub async fn remove_user_node(&self, prefix: Name) -> Result<(), EngineError> {
        self.commands
            .send(EngineCommand::RemoveUserPrefix(prefix))
            .await
            .map_err(|_| EngineError::EngineStopped)
    }

    /// `seq = None` means "one past whatever we last published" (`1` if
    /// never published), matching `publishName`'s `seq.value_or(current + 1)`.
    pub async fn publish_name(&self, prefix: Name, seq: Option<u64>) -> Result<(), EngineError> {
        self.commands
            .send(EngineCommand::PublishName { prefix, seq })
            .await
            .map_err(|_| EngineError::EngineStopped)
    }

    pub async fn publish_name_and_data(
        &self,
        prefix: Name,
        block: Bytes,
        seq: Option<u64>,
    ) -> Result<(), EngineError> {
        self.commands
            .send(EngineCommand::PublishNameAndData { prefix, block, seq })
            .await
            .map_err(|_| EngineError::EngineStopped)
    }

    pub async fn current_seq(&self, prefix: Name) -> Result<Option<u64>, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(EngineCommand::CurrentSeq { prefix, reply })
            .await
            .map_err(|_| EngineError::EngineStopped)?;
        rx.await.map_err(|_| EngineError::EngineStopped)
    }
}

/// A peer request we could not answer yet, kept around so a later local
/// publish can revisit it. Keyed by the full request name (sync prefix plus
/// the peer's IBLT component), matching how `PendingEntryInfoFull` is keyed
/// by `interest.getName()` in the original.
struct PendingEntry {
    peer_iblt: Iblt,
    responder: Option<ReplyResponder>,
    expires_at: Instant,
}

/// A peer request we deferred once (decode failed, or the peer looked
/// ahead of us) to give a concurrent helper a chance to answer first.
/// Keyed the same way as [`PendingEntry`].
struct WaitingEntry {
    peer_iblt: Iblt,
    responder: Option<ReplyResponder>,
    fire_at: Instant,
}

/// The reconciliation core. One instance per sync prefix; `run` consumes it
/// and drives the actor loop until the command channel closes.
pub struct SyncEngine<F, P> {
    sync_prefix: Name,
    config: SyncConfig,
    face: Arc<F>,
    publisher: Arc<P>,
    commands: mpsc::Receiver<EngineCommand>,
    requests: mpsc::UnboundedReceiver<IncomingRequest>,
    jitter: Jitter,
    registry: PrefixRegistry,
    digest: DigestEngine,
    pending: HashMap<Name, PendingEntry>,
    waiting: HashMap<Name, WaitingEntry>,
    /// Set when a branch decides we should stop waiting for the periodic
    /// timer and re-emit our outbound digest request right away (nobody is
    /// helping us satisfy a deferred request). Consumed by `run`.
    restart_requested: bool,
    /// The name of our own last-issued outbound sync request, set every
    /// time [`Self::send_sync_interest`] reissues one. Used by
    /// [`Self::send_sync_data`] to detect the §4.4.4 short-circuit: a reply
    /// we are about to send out under this exact name means our own
    /// in-flight fetch should be dropped and renewed immediately rather
    /// than left to the periodic timer.
    own_request_name: Option<Name>,
    on_update: Option<UpdateCallback>,
}

impl<F, P> SyncEngine<F, P>
where
    F: Face + 'static,
    P: SegmentPublisher + 'static,
{
    /// Builds a new engine and its handle. `on_update` is invoked
    /// synchronously from inside the actor loop whenever `on_sync_data`
    /// applies updates, so it never races a second invocation.
    pub fn new(
        sync_prefix: Name,
        config: SyncConfig,
        face: Arc<F>,
        publisher: Arc<P>,
        on_update: impl Fn(&[MissingDataInfo]) + Send + Sync + 'static,
    ) -> (Self, SyncEngineHandle) {
        let requests = face.register_interest_filter(sync_prefix.clone());
        let (tx, commands) = mpsc::channel(64);
        let engine = Self {
            digest: DigestEngine::new(config.expected_entries),
            registry: PrefixRegistry::new(),
            jitter: Jitter::from_entropy(),
            sync_prefix,
            config,
            face,
            publisher,
            commands,
            requests,
            pending: HashMap::new(),
            waiting: HashMap::new(),
            restart_requested: false,
            own_request_name: None,
            on_update: Some(Box::new(on_update)),
        };
        (engine, SyncEngineHandle { commands: tx })
    }

    /// Like [`Self::new`] but seeded with a fixed jitter RNG, for
    /// reproducible tests.
    pub fn with_seed(
        sync_prefix: Name,
        config: SyncConfig,
        face: Arc<F>,
        publisher: Arc<P>,
        seed: u64,
        on_update: impl Fn(&[MissingDataInfo]) + Send + Sync + 'static,
    ) -> (Self, SyncEngineHandle) {
        let (mut engine, handle) = Self::new(sync_prefix, config, face, publisher, on_update);
        engine.jitter = Jitter::from_seed(seed);
        (engine, handle)
    }

    /// Builds our request name: `syncPrefix ++ <our-IBLT-component>`.
    fn request_name(&self) -> Name {
        let component = NameComponent::new(self.digest.serialize());
        self.sync_prefix.clone().push(component)
    }

    /// Mirrors `isFutureHash`: does `negative` contain the hash of
    /// `prefix`'s next not-yet-seen sequence?
    fn is_future_hash(prefix: &Name, next_seq: u64, negative: &BTreeSet<u32>) -> bool {
        let probe = murmur3_32_str(&prefix.append_number(next_seq).to_uri(), N_HASHCHECK);
        negative.contains(&probe)
    }

    /// (Re)issues our outbound sync request, embedding our current digest,
    /// and returns the in-flight reply future. Callers replace whatever
    /// future they were polling for the previous request with this one,
    /// which is itself the cancellation: the old future is simply dropped.
    async fn send_sync_interest(&mut self) -> BoxFuture<'static, Result<Bytes, FaceError>> {
        let name = self.request_name();
        debug!(request = %name, "sending full sync interest");
        self.own_request_name = Some(name.clone());

        let face = self.face.clone();
        let lifetime = self.config.request_lifetime();
        Box::pin(async move { face.send_request(name, lifetime).await })
    }

    fn next_request_delay(&mut self) -> Duration {
        let (low, high) = self.config.jitter_range();
        self.config.request_lifetime() / 2 + self.jitter.next(low, high)
    }

    /// Handles a freshly arrived peer request: unpacks the IBLT component
    /// from its trailing name component and hands off to the shared branch
    /// logic.
    async fn on_sync_interest(&mut self, request: IncomingRequest) {
        let IncomingRequest { name, responder } = request;

        if let Some(cached) = self.publisher.reply_from_store(&name) {
            responder.reply(cached);
            return;
        }

        let Some(iblt_component) = name.get(name.len().wrapping_sub(1)) else {
            warn!("sync interest carried no IBLT component");
            return;
        };
        let peer_iblt = match DigestEngine::deserialize(
            self.config.expected_entries,
            iblt_component.as_bytes().clone(),
        ) {
            Ok(iblt) => iblt,
            Err(err) => {
                warn!(error = %err, "malformed IBLT component in peer request");
                return;
            }
        };

        self.process_request(name, peer_iblt, Some(responder), false)
            .await;
    }

    /// The branch logic of `onSyncInterest` (A through D), shared between a
    /// first pass over a fresh request and a waiting-list replay.
    /// `is_timed_processing` distinguishes the two, matching the original's
    /// flag of the same purpose.
    async fn process_request(
        &mut self,
        request_name: Name,
        peer_iblt: Iblt,
        responder: Option<ReplyResponder>,
        is_timed_processing: bool,
    ) {
        let diff = match self.digest.diff(&peer_iblt) {
            Ok(diff) => diff,
            Err(err) => {
                warn!(error = %err, "failed to diff against peer IBLT");
                return;
            }
        };

        if !diff.decoded {
            trace!(
                positive = diff.positive.len(),
                negative = diff.negative.len(),
                "cannot decode digest difference"
            );

            let num_own = self.digest.num_elements();
            let num_peer = peer_iblt.num_elements();

            // Branch A: the peer's table has strictly more elements than
            // ours. Either we're behind (defer and hope someone else
            // answers first) or, on the timed replay, give up waiting and
            // go fetch for ourselves.
            if num_peer > num_own {
                if is_timed_processing {
                    trace!(request = %request_name, "nobody helping us, sending a fresh sync interest");
                    self.restart_requested = true;
                } else {
                    self.defer(request_name, peer_iblt, responder);
                }
                return;
            }

            if num_own >= num_peer {
                if num_own == num_peer && diff.positive.is_empty() && !diff.negative.is_empty() {
                    trace!("own and peer table sizes match with nothing to offer");
                    return;
                }
                self.reply_with_everything(&request_name, responder, true).await;
                return;
            }
        }

        // Branch B: decode succeeded but the peer is missing entries we
        // can't yet explain (negative non-empty) — same defer-then-retry
        // shape as branch A.
        if !diff.negative.is_empty() {
            if is_timed_processing {
                trace!(request = %request_name, "nobody helping us, sending a fresh sync interest");
                self.restart_requested = true;
            } else {
                self.defer(request_name, peer_iblt, responder);
            }
            return;
        }

        // Branch C/D: decode succeeded, nothing the peer has that we lack.
        // Reply with whatever of our positive entries survive the
        // future-hash probe, or park the request if there's nothing yet.
        let (state, suppressed) = self.build_positive_reply(diff.positive, &diff.negative);
        if !state.is_empty() {
            self.send_sync_data(&request_name, state, responder, false).await;
            return;
        }
        if suppressed {
            // The peer is already ahead on at least one of our prefixes;
            // it will re-poll with its newer digest shortly, so there's
            // nothing useful to park here.
            return;
        }
        self.pending.insert(
            request_name,
            PendingEntry {
                peer_iblt,
                responder,
                expires_at: Instant::now() + self.config.request_lifetime(),
            },
        );
    }

    /// Schedules a one-shot replay of this request after jitter, unless one
    /// is already scheduled for the same name (duplicate retransmits of an
    /// identical request collapse onto one waiting-list entry, the way PIT
    /// aggregation would at the forwarder).
    fn defer(&mut self, request_name: Name, peer_iblt: Iblt, responder: Option<ReplyResponder>) {
        if self.waiting.contains_key(&request_name) {
            return;
        }
        let (low, high) = self.config.jitter_range();
        let after = self.jitter.next(low, high);
        trace!(request = %request_name, delay_ms = after.as_millis() as u64, "deferring peer request");
        self.waiting.insert(
            request_name,
            WaitingEntry {
                peer_iblt,
                responder,
                fire_at: Instant::now() + after,
            },
        );
    }

    /// Branch A/B's "our table is at least as large, reply with
    /// everything": emits `(prefix++seq, lastBlock?)` for every owned
    /// prefix with `seq != 0`.
    async fn reply_with_everything(
        &mut self,
        request_name: &Name,
        responder: Option<ReplyResponder>,
        low_freshness: bool,
    ) {
        let mut state = State::new();
        for (prefix, entry) in self.registry.entries() {
            if entry.seq != 0 {
                state.add_content(prefix.append_number(entry.seq), entry.last_block.clone());
            }
        }
        if state.is_empty() {
            return;
        }
        self.send_sync_data(request_name, state, responder, low_freshness)
            .await;
    }

    /// Resolves `positive` hashes to prefixes, applies the future-hash
    /// probe, and builds the `State` of whatever survives. Pure (no side
    /// effects) so both a fresh request and a pending-entry replay
    /// (`satisfy_pending`) can share it.
    fn build_positive_reply(&self, positive: BTreeSet<u32>, negative: &BTreeSet<u32>) -> (State, bool) {
        let mut state = State::new();
        let mut suppressed = false;

        for hash in positive {
            let Some(prefix) = self.registry.prefix_of_hash(hash).cloned() else {
                continue;
            };
            let Some(seq) = self.registry.current_seq(&prefix) else {
                continue;
            };
            // Don't sync up sequence number zero: it means "registered but
            // never published".
            if seq == 0 {
                continue;
            }
            if Self::is_future_hash(&prefix, seq + 1, negative) {
                suppressed = true;
                continue;
            }
            let block = self.registry.block_for(&prefix, seq);
            state.add_content(prefix.append_number(seq), block);
        }

        (state, suppressed)
    }

    /// Sends the reply: compress, cache in the segment publisher's
    /// retransmit store, answer the responder if we still have one, and
    /// drop any pending/waiting bookkeeping for this request name.
    async fn send_sync_data(
        &mut self,
        request_name: &Name,
        state: State,
        responder: Option<ReplyResponder>,
        low_freshness: bool,
    ) {
        let encoded = state.encode();
        let compressed = match compress(self.config.content_compression, &encoded) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, "failed to compress sync reply");
                return;
            }
        };
        let freshness = if low_freshness {
            self.config.low_freshness()
        } else {
            self.config.reply_freshness()
        };

        debug!(request = %request_name, bytes = compressed.len(), "sending sync data");
        self.publisher.publish(request_name, compressed.clone(), freshness);

        if let Some(responder) = responder {
            responder.reply(compressed);
        }

        self.pending.remove(request_name);
        self.waiting.remove(request_name);

        // §4.4.4 own-request short-circuit: we just answered a request
        // carrying the exact name of our own outstanding outbound fetch.
        // That fetch is now redundant — drop it and renew immediately
        // instead of waiting for the periodic timer.
        if self.own_request_name.as_ref() == Some(request_name) {
            debug!(request = %request_name, "own outbound request satisfied by our own reply, renewing");
            self.restart_requested = true;
        }
    }

    /// Applies an incoming sync reply: decode, decompress, fold every entry
    /// whose sequence is newer than what we already track into our
    /// registry and digest, and surface the batch through `on_update`.
    async fn on_sync_data(&mut self, reply: Bytes) -> Result<(), EngineError> {
        let decompressed = decompress(self.config.content_compression, &reply)
            .map_err(|err| EngineError::Face(FaceError::Other(err.to_string())))?;
        let state = State::decode(decompressed)?;

        debug!(entries = state.content().len(), "sync data received");

        let mut updates = Vec::new();
        for (name_at_seq, block) in state.content() {
            if name_at_seq.is_empty() {
                continue;
            }
            let prefix = name_at_seq.prefix_drop_last(1);
            let Some(seq) = name_at_seq
                .get(name_at_seq.len() - 1)
                .and_then(|component| component.to_number())
            else {
                continue;
            };

            if !self.registry.contains(&prefix) {
                self.registry.add_prefix(prefix.clone());
            }
            let current = self.registry.current_seq(&prefix).unwrap_or(0);
            if seq > current {
                updates.push(MissingDataInfo {
                    prefix: prefix.clone(),
                    low_seq: current + 1,
                    high_seq: seq,
                    block: block.clone(),
                });
                self.advance_prefix(&prefix, seq, block.clone());
            }
        }

        if !updates.is_empty() {
            if let Some(callback) = &self.on_update {
                callback(&updates);
            }
        }

        Ok(())
    }

    /// `updateSeqNo`: advances the registry and keeps the digest IBLT in
    /// sync (erase the old `(prefix, seq)` hash, if any, insert the new
    /// one).
    fn advance_prefix(&mut self, prefix: &Name, new_seq: u64, block: Option<Bytes>) {
        let Ok((old_hash, new_hash)) = self.registry.advance(prefix, new_seq, block) else {
            warn!(prefix = %prefix, "advancing an unregistered prefix");
            return;
        };
        if let Some(old_hash) = old_hash {
            self.digest.erase_hash(old_hash);
        }
        self.digest.insert_hash(new_hash);
    }

    /// `publishName`/`publishNameAndData`: bump a locally owned prefix's
    /// sequence and try to satisfy anyone waiting on us.
    async fn publish(&mut self, prefix: Name, seq: Option<u64>, block: Option<Bytes>) {
        if !self.registry.contains(&prefix) {
            warn!(prefix = %prefix, "publish on an unregistered prefix");
            return;
        }
        let current = self.registry.current_seq(&prefix).unwrap_or(0);
        let new_seq = seq.unwrap_or(current + 1);
        debug!(prefix = %prefix, seq = new_seq, "publishing");
        self.advance_prefix(&prefix, new_seq, block);
        self.satisfy_pending().await;
    }

    /// `satisfyPendingInterests`: after local state changes, revisit every
    /// parked request and try the positive-reply branch again; drop
    /// entries that are hopeless (diff still undecoded, at or past the
    /// size threshold, or empty on both sides) or that we can now actually
    /// answer.
    async fn satisfy_pending(&mut self) {
        let names: Vec<Name> = self.pending.keys().cloned().collect();
        for name in names {
            let Some(entry) = self.pending.get(&name) else {
                continue;
            };
            let diff = match self.digest.diff(&entry.peer_iblt) {
                Ok(diff) => diff,
                Err(_) => {
                    self.pending.remove(&name);
                    continue;
                }
            };

            if !diff.decoded {
                trace!("decode failed for pending interest");
                let total = diff.positive.len() + diff.negative.len();
                if total >= self.config.effective_threshold() || total == 0 {
                    self.pending.remove(&name);
                }
                continue;
            }

            let (state, _suppressed) = self.build_positive_reply(diff.positive, &diff.negative);
            if state.is_empty() {
                continue;
            }
            let responder = self.pending.remove(&name).and_then(|entry| entry.responder);
            debug!(request = %name, "satisfying pending interest");
            self.send_sync_data(&name, state, responder, false).await;
        }
    }

    /// Sweeps expired pending entries and fires any waiting-list replays
    /// whose jitter delay has elapsed. Run periodically from the main
    /// loop; a no-op when nothing has come due.
    async fn sweep(&mut self) {
        let now = Instant::now();

        let expired: Vec<Name> = self
            .pending
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(name, _)| name.clone())
            .collect();
        for name in expired {
            trace!(request = %name, "erasing expired pending entry");
            self.pending.remove(&name);
        }

        let due: Vec<Name> = self
            .waiting
            .iter()
            .filter(|(_, entry)| entry.fire_at <= now)
            .map(|(name, _)| name.clone())
            .collect();
        for name in due {
            let Some(entry) = self.waiting.remove(&name) else {
                continue;
            };
            self.process_request(name, entry.peer_iblt, entry.responder, true)
                .await;
        }
    }

    async fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::AddUserPrefix(prefix) => {
                self.registry.add_prefix(prefix);
            }
            EngineCommand::RemoveUserPrefix(prefix) => {
                if let Some(hash) = self.registry.remove(&prefix) {
                    self.digest.erase_hash(hash);
                }
            }
            EngineCommand::PublishName { prefix, seq } => {
                self.publish(prefix, seq, None).await;
            }
            EngineCommand::PublishNameAndData { prefix, block, seq } => {
                self.publish(prefix, seq, Some(block)).await;
            }
            EngineCommand::CurrentSeq { prefix, reply } => {
                let _ = reply.send(self.registry.current_seq(&prefix));
            }
        }
    }

    /// Drives the actor until the command channel closes, racing the
    /// command/request channels against the in-flight outbound fetch and
    /// two timers (periodic re-emission, waiting/pending sweep).
    pub async fn run(mut self) {
        let mut outbound_fetch = self.send_sync_interest().await;
        let mut next_request = Box::pin(tokio::time::sleep(self.next_request_delay()));
        let mut sweep_timer = tokio::time::interval(SWEEP_INTERVAL);

        loop {
            tokio::select! {
                biased;

                Some(command) = self.commands.recv() => {
                    self.handle_command(command).await;
                }

                Some(request) = self.requests.recv() => {
                    self.on_sync_interest(request).await;
                }

                result = &mut outbound_fetch => {
                    match result {
                        Ok(reply) => {
                            if let Err(err) = self.on_sync_data(reply).await {
                                warn!(error = %err, "failed to apply sync reply");
                            }
                            trace!("renewing sync interest");
                        }
                        Err(FaceError::Nack) => {
                            let (low, high) = self.config.jitter_range();
                            let after = self.jitter.next(low, high);
                            trace!(delay_ms = after.as_millis() as u64, "outbound request nacked, retrying after jitter");
                            outbound_fetch = self.send_sync_interest().await;
                            next_request.as_mut().reset(Instant::now() + after);
                            continue;
                        }
                        Err(err) => {
                            warn!(error = %err, "outbound sync request failed, waiting for next periodic attempt");
                        }
                    }
                    outbound_fetch = self.send_sync_interest().await;
                    next_request.as_mut().reset(Instant::now() + self.next_request_delay());
                }

                _ = &mut next_request => {
                    outbound_fetch = self.send_sync_interest().await;
                    next_request.as_mut().reset(Instant::now() + self.next_request_delay());
                }

                _ = sweep_timer.tick() => {
                    self.sweep().await;
                }

                else => break,
            }

            if self.restart_requested {
                self.restart_requested = false;
                outbound_fetch = self.send_sync_interest().await;
                next_request.as_mut().reset(Instant::now() + self.next_request_delay());
            }
        }
    }
}
