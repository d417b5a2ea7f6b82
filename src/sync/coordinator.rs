//! Per-domain remote sync coordinator.
//!
//! DESIGN
//! ======
//! Each live domain runs as one tokio task that exclusively owns its sync
//! baseline, debouncer and phase. Nothing else touches them, so the actor
//! needs no locks of its own. It multiplexes five inputs:
//!
//! - store signals: the store listener only reports "mutated", tagged with
//!   whether this domain's loop-prevention guard was held at notification
//!   time,
//! - the remote change feed,
//! - the one-shot hydration read,
//! - the debounce deadline,
//! - completions of in-flight writes.
//!
//! Phase moves `Uninitialized -> Hydrating -> Live`. The first accepted value
//! (hydration read or feed event, whichever lands first) takes the domain
//! Live; a hydration read that resolves afterwards is discarded.
//!
//! Writes are not serialized against each other. Each carries a sequence
//! number and the baseline only moves forward, so a slow older write that
//! completes late never rewinds it.
//!
//! Feed events are row-level. A domain only considers events whose changed
//! column list names it, and never applies an inbound value equal to one of
//! its own writes still awaiting acknowledgement: such a value is this
//! client's past state coming back, and applying it would overwrite a newer
//! local edit.
//!
//! ERROR HANDLING
//! ==============
//! Nothing here escalates. Rejected inbound payloads are logged and
//! dropped without touching the store. A failed write leaves the baseline
//! where it was, so the next local mutation detects the same diff and sends
//! it again. A failed hydration read leaves the store at its defaults.

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod coordinator_test;

use std::collections::BTreeMap;
use std::future::pending;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use super::debounce::{DebounceTiming, Debouncer};
use super::detect::{approx_eq, has_changed};
use super::domain::{SyncDomain, decode, encode_state, try_encode};
use super::guard::RemoteApplyGuard;
use crate::error::ErrorCode;
use crate::identity::{ClientId, now_ms};
use crate::remote::{ChangeEvent, Patch, RemoteStore, TransportError};
use crate::store::Store;

// =============================================================================
// TYPES
// =============================================================================

/// Everything a coordinator needs to reach the remote document.
#[derive(Clone)]
pub struct SyncContext {
    pub remote: Arc<dyn RemoteStore>,
    pub document_id: String,
    pub client_id: ClientId,
    pub epsilon: f64,
}

impl std::fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncContext")
            .field("document_id", &self.document_id)
            .field("client_id", &self.client_id)
            .field("epsilon", &self.epsilon)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Uninitialized,
    Hydrating,
    Live,
}

/// Owner handle for one running coordinator. Dropping it stops the task.
#[derive(Debug)]
pub struct SyncHandle {
    domain: &'static str,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    phase: watch::Receiver<SyncPhase>,
}

impl SyncHandle {
    #[must_use]
    pub fn domain(&self) -> &'static str {
        self.domain
    }

    #[must_use]
    pub fn phase(&self) -> SyncPhase {
        *self.phase.borrow()
    }

    /// Wait until the domain is Live. Returns false if the coordinator
    /// stopped first.
    pub async fn wait_live(&self) -> bool {
        let mut phase = self.phase.clone();
        phase.wait_for(|p| *p == SyncPhase::Live).await.is_ok()
    }

    /// Stop the coordinator and wait for in-flight writes to settle. A
    /// pending debounced change is dropped, not flushed.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            if tx.send(()).is_err() {
                debug!(domain = self.domain, "coordinator already stopped");
            }
        }
        if let Err(e) = (&mut self.task).await {
            warn!(domain = self.domain, error = %e, "coordinator task failed");
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct LocalSignal {
    during_remote_apply: bool,
}

#[derive(Debug)]
struct PushOutcome {
    seq: u64,
    value: Value,
    result: Result<(), TransportError>,
}

type ReadResult = Result<Option<Value>, TransportError>;

// =============================================================================
// SPAWN
// =============================================================================

/// Mount a live coordinator for domain `D` over `store`.
pub fn spawn_coordinator<D: SyncDomain>(ctx: SyncContext, store: Store<D::State>, timing: DebounceTiming) -> SyncHandle {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let (phase_tx, phase_rx) = watch::channel(SyncPhase::Uninitialized);

    let coordinator = Coordinator::<D> {
        ctx,
        store,
        guard: RemoteApplyGuard::new(),
        debouncer: Debouncer::new(timing),
        baseline: None,
        phase: phase_tx,
        push_seq: 0,
        acked_seq: 0,
        in_flight: JoinSet::new(),
        unacked: BTreeMap::new(),
        _domain: PhantomData,
    };
    let task = tokio::spawn(coordinator.run(shutdown_rx));

    SyncHandle { domain: D::NAME, shutdown: Some(shutdown_tx), task, phase: phase_rx }
}

// =============================================================================
// ACTOR
// =============================================================================

struct Coordinator<D: SyncDomain> {
    ctx: SyncContext,
    store: Store<D::State>,
    guard: RemoteApplyGuard,
    debouncer: Debouncer,
    /// Last value known to match the remote column.
    baseline: Option<Value>,
    phase: watch::Sender<SyncPhase>,
    push_seq: u64,
    acked_seq: u64,
    in_flight: JoinSet<PushOutcome>,
    /// Issued writes still awaiting completion, by sequence number.
    unacked: BTreeMap<u64, Value>,
    _domain: PhantomData<D>,
}

impl<D: SyncDomain> Coordinator<D> {
    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        info!(domain = D::NAME, document_id = %self.ctx.document_id, "mounting coordinator");

        // PHASE: LOCAL LISTENER
        // WHY: tag each notification with the guard state at fan-out time;
        // by the time the actor reads the signal the guard may be released.
        let (signal_tx, mut signals) = mpsc::unbounded_channel();
        let guard = self.guard.clone();
        let _subscription = self.store.subscribe(move |_| {
            let signal = LocalSignal { during_remote_apply: guard.is_applying() };
            if signal_tx.send(signal).is_err() {
                trace!(domain = D::NAME, "coordinator gone; store signal dropped");
            }
        });

        // PHASE: CHANGE FEED, THEN HYDRATION READ
        // WHY: subscribing first means no remote write can fall between the
        // read and the feed.
        let mut feed = match self.ctx.remote.subscribe(&self.ctx.document_id).await {
            Ok(rx) => Some(rx),
            Err(e) => {
                warn!(domain = D::NAME, code = e.error_code(), error = %e, "change feed unavailable; live updates disabled");
                None
            }
        };

        self.phase.send_replace(SyncPhase::Hydrating);
        let mut hydration = Some(self.spawn_hydration_read());

        loop {
            let deadline = self.debouncer.deadline();
            tokio::select! {
                biased;

                _ = &mut shutdown => break,
                result = recv_hydration(&mut hydration) => {
                    hydration = None;
                    self.on_hydrated(result).await;
                }
                event = recv_feed(&mut feed) => match event {
                    Some(event) => self.on_remote_event(event).await,
                    None => {
                        warn!(domain = D::NAME, "change feed closed; live updates disabled");
                        feed = None;
                    }
                },
                () = sleep_until_opt(deadline) => {
                    if self.debouncer.poll_fire(Instant::now()) {
                        self.push();
                    }
                }
                Some(signal) = signals.recv() => self.on_local_signal(signal),
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    self.on_push_done(joined);
                }
            }
        }

        self.stop().await;
    }

    fn spawn_hydration_read(&self) -> oneshot::Receiver<ReadResult> {
        let (tx, rx) = oneshot::channel();
        let remote = Arc::clone(&self.ctx.remote);
        let document_id = self.ctx.document_id.clone();
        tokio::spawn(async move {
            let result = remote.read(&document_id, D::COLUMN).await;
            if tx.send(result).is_err() {
                trace!(domain = D::NAME, "coordinator gone before hydration read finished");
            }
        });
        rx
    }

    async fn stop(&mut self) {
        if self.debouncer.cancel() {
            info!(domain = D::NAME, "pending local change dropped at shutdown");
        }
        while let Some(joined) = self.in_flight.join_next().await {
            match joined {
                Ok(PushOutcome { seq, result: Ok(()), .. }) => {
                    debug!(domain = D::NAME, seq, "write settled during shutdown");
                }
                Ok(PushOutcome { seq, result: Err(e), .. }) => {
                    warn!(domain = D::NAME, seq, code = e.error_code(), error = %e, "write failed during shutdown");
                }
                Err(e) => warn!(domain = D::NAME, error = %e, "write task failed during shutdown"),
            }
        }
        info!(domain = D::NAME, document_id = %self.ctx.document_id, "coordinator stopped");
    }

    fn set_live(&self) {
        if *self.phase.borrow() != SyncPhase::Live {
            self.phase.send_replace(SyncPhase::Live);
        }
    }

    fn is_live(&self) -> bool {
        *self.phase.borrow() == SyncPhase::Live
    }

    // -------------------------------------------------------------------------
    // remote -> local
    // -------------------------------------------------------------------------

    async fn on_hydrated(&mut self, result: ReadResult) {
        match result {
            Ok(_) if self.is_live() => {
                debug!(domain = D::NAME, "hydration read arrived after live update; discarded");
            }
            Ok(Some(raw)) => {
                if self.accept_remote(&raw).await {
                    info!(domain = D::NAME, "hydrated from remote");
                }
                self.set_live();
            }
            Ok(None) => {
                info!(domain = D::NAME, "no stored value; keeping defaults");
                self.set_live();
            }
            Err(e) => {
                warn!(domain = D::NAME, code = e.error_code(), error = %e, "hydration read failed; keeping defaults");
                self.set_live();
            }
        }
    }

    async fn on_remote_event(&mut self, event: ChangeEvent) {
        if event.edited_by == Some(self.ctx.client_id) {
            trace!(domain = D::NAME, "ignoring echo of own write");
            return;
        }
        if !event.touches(D::COLUMN) {
            trace!(domain = D::NAME, "change event is for another domain");
            return;
        }
        let Some(raw) = event.column(D::COLUMN).filter(|v| !v.is_null()) else {
            trace!(domain = D::NAME, "change event carries no value for this domain");
            return;
        };
        if self.accept_remote(raw).await {
            self.set_live();
        }
    }

    /// Validate and apply an inbound column value. Returns false when the
    /// payload was rejected.
    async fn accept_remote(&mut self, raw: &Value) -> bool {
        let persisted = match decode::<D>(raw) {
            Ok(p) => p,
            Err(e) => {
                warn!(domain = D::NAME, code = e.error_code(), error = %e, "rejected inbound payload");
                return false;
            }
        };
        let value = match try_encode::<D>(&persisted) {
            Ok(v) => v,
            Err(e) => {
                warn!(domain = D::NAME, code = e.error_code(), error = %e, "inbound payload not re-encodable");
                return false;
            }
        };
        let epsilon = self.ctx.epsilon;

        // Row changed in another column; this domain did not move.
        if self.baseline.as_ref().is_some_and(|base| approx_eq(base, &value, epsilon)) {
            trace!(domain = D::NAME, "inbound value matches baseline");
            return true;
        }

        // Our own write read back before its ack; the ack will set the baseline.
        if self.unacked.values().any(|sent| approx_eq(sent, &value, epsilon)) {
            trace!(domain = D::NAME, "inbound value is an unacknowledged local write");
            return true;
        }

        // Everything up to here is superseded by the remote value.
        self.acked_seq = self.push_seq;

        let local = self.store.read(|state| encode_state::<D>(state));
        if local.as_ref().is_some_and(|l| approx_eq(l, &value, epsilon)) {
            trace!(domain = D::NAME, "inbound value matches local state");
            self.baseline = Some(value);
            return true;
        }

        let store = self.store.clone();
        self.guard
            .apply(move || store.update(|state| D::apply(state, persisted)))
            .await;
        self.baseline = Some(value);
        debug!(domain = D::NAME, "applied remote update");

        self.reconcile();
        true
    }

    /// Catch local writes that interleaved with a remote apply and were
    /// tagged as remote.
    fn reconcile(&mut self) {
        let current = self.store.read(|state| encode_state::<D>(state));
        if let Some(current) = current {
            if has_changed(&current, self.baseline.as_ref(), self.ctx.epsilon) {
                debug!(domain = D::NAME, "local change interleaved with remote apply");
                self.debouncer.schedule(Instant::now());
            }
        }
    }

    // -------------------------------------------------------------------------
    // local -> remote
    // -------------------------------------------------------------------------

    fn on_local_signal(&mut self, signal: LocalSignal) {
        if signal.during_remote_apply {
            trace!(domain = D::NAME, "store change caused by remote apply; not pushing");
            return;
        }
        let Some(current) = self.store.read(|state| encode_state::<D>(state)) else {
            return;
        };
        if has_changed(&current, self.baseline.as_ref(), self.ctx.epsilon) {
            self.debouncer.schedule(Instant::now());
        } else {
            trace!(domain = D::NAME, "store change matches baseline");
        }
    }

    fn push(&mut self) {
        let Some(value) = self.store.read(|state| encode_state::<D>(state)) else {
            return;
        };
        let epsilon = self.ctx.epsilon;
        if !has_changed(&value, self.baseline.as_ref(), epsilon) {
            trace!(domain = D::NAME, "nothing to push");
            return;
        }
        if self
            .unacked
            .last_key_value()
            .is_some_and(|(_, pending)| approx_eq(pending, &value, epsilon))
        {
            trace!(domain = D::NAME, "identical write already in flight");
            return;
        }

        self.push_seq += 1;
        let seq = self.push_seq;
        let patch = Patch { column: D::COLUMN, value: value.clone(), edited_by: self.ctx.client_id, edited_at: now_ms() };
        let remote = Arc::clone(&self.ctx.remote);
        let document_id = self.ctx.document_id.clone();

        debug!(domain = D::NAME, seq, "pushing local change");
        self.unacked.insert(seq, value.clone());
        self.in_flight.spawn(async move {
            let result = remote.update(&document_id, patch).await;
            PushOutcome { seq, value, result }
        });
    }

    fn on_push_done(&mut self, joined: Result<PushOutcome, JoinError>) {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(domain = D::NAME, error = %e, "write task failed");
                // The failed task's sequence is unknown; once nothing is in
                // flight, anything left unacked belonged to it.
                if self.in_flight.is_empty() {
                    self.unacked.clear();
                }
                return;
            }
        };
        self.unacked.remove(&outcome.seq);

        match outcome.result {
            Ok(()) if outcome.seq > self.acked_seq => {
                self.acked_seq = outcome.seq;
                self.baseline = Some(outcome.value);
                debug!(domain = D::NAME, seq = outcome.seq, "write acknowledged");
            }
            Ok(()) => {
                trace!(domain = D::NAME, seq = outcome.seq, "superseded write acknowledged");
            }
            Err(e) => {
                warn!(
                    domain = D::NAME,
                    seq = outcome.seq,
                    code = e.error_code(),
                    retryable = e.retryable(),
                    error = %e,
                    "write failed; change kept for next cycle"
                );
            }
        }
    }
}

// =============================================================================
// SELECT HELPERS
// =============================================================================

async fn recv_feed(feed: &mut Option<mpsc::Receiver<ChangeEvent>>) -> Option<ChangeEvent> {
    match feed {
        Some(rx) => rx.recv().await,
        None => pending().await,
    }
}

async fn recv_hydration(rx: &mut Option<oneshot::Receiver<ReadResult>>) -> ReadResult {
    match rx {
        Some(rx) => match rx.await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Closed),
        },
        None => pending().await,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => pending().await,
    }
}
