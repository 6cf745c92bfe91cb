//! The tracking agent
//!
//! Coordinates everything: routes track calls between immediate dispatch and
//! the durable queue, owns the in-memory session copy and the dispatch
//! cursor, and serializes all of it behind a single lock.
//!
//! All I/O is synchronous on the caller's thread. In immediate mode a track
//! call blocks for the duration of the network attempt; `read_and_dispatch`
//! always does. Hosts that need a responsive UI call these off their UI
//! thread; the agent spawns no threads of its own.

use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::beacon;
use crate::config::CollectorConfig;
use crate::device::DeviceProfile;
use crate::error::{Error, Result};
use crate::session::{self, SessionRecord};
use crate::store::{QueuedEvent, Store};
use crate::transport::Transport;

/// Counters accumulated over the agent's lifetime.
#[derive(Debug, Default, Clone)]
pub struct DispatchStats {
    /// Events persisted to the queue
    pub queued: usize,
    /// Beacons delivered, immediate and drained alike
    pub dispatched: usize,
    /// Transport attempts that failed
    pub failures: usize,
}

/// Transient view of the pending queue: a snapshot plus the index of the
/// next unsent element.
///
/// Never persisted. Rebuilt from the store whenever stale: on first use, on
/// enqueue, and once the index runs past the snapshot. The snapshot is fixed
/// at rebuild time, which bounds one drain pass to a known amount of work;
/// events enqueued mid-pass surface when the cursor is next rebuilt.
struct DispatchCursor {
    snapshot: Vec<QueuedEvent>,
    index: usize,
}

impl DispatchCursor {
    fn exhausted(&self) -> bool {
        self.index >= self.snapshot.len()
    }
}

/// The single mutable region, guarded by the agent's lock.
struct AgentState {
    session: SessionRecord,
    immediate: bool,
    cursor: Option<DispatchCursor>,
    stats: DispatchStats,
}

/// The activity-tracking coordinator.
///
/// Construct one per process through [`AgentCell`]. Track calls never fail
/// visibly: empty input is ignored and persistence or transport trouble is
/// logged and swallowed, so tracking can never take the host down with it.
pub struct TrackingAgent {
    root_prefix: String,
    store: Arc<dyn Store>,
    transport: Arc<dyn Transport>,
    state: Mutex<AgentState>,
}

impl TrackingAgent {
    fn new(
        account_id: &str,
        device: DeviceProfile,
        collector: &CollectorConfig,
        store: Arc<dyn Store>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        if account_id.is_empty() {
            return Err(Error::Config("account id must not be empty".to_string()));
        }
        device.validate()?;
        collector.validate()?;

        let session = session::load_or_create(store.as_ref(), Utc::now().timestamp());
        let root_prefix = beacon::root_prefix(&collector.host, account_id, &device, &session);

        Ok(Self {
            root_prefix,
            store,
            transport,
            state: Mutex::new(AgentState {
                session,
                immediate: false,
                cursor: None,
                stats: DispatchStats::default(),
            }),
        })
    }

    /// Record a page view under `path`.
    ///
    /// An empty path is silently ignored. In immediate mode this blocks on
    /// the network attempt; otherwise the beacon is queued durably.
    pub fn track_page_view(&self, path: &str) {
        if path.is_empty() {
            return;
        }
        let url = format!("{}{}", self.root_prefix, beacon::page_param(path));
        self.route(url);
    }

    /// Record a custom event.
    ///
    /// An empty category is silently ignored. `value` carries the wire
    /// sentinel: negative means "no value".
    pub fn track_event(&self, category: &str, action: &str, label: Option<&str>, value: i64) {
        if category.is_empty() {
            return;
        }
        let url = format!(
            "{}{}",
            self.root_prefix,
            beacon::event_param(category, action, label, value)
        );
        self.route(url);
    }

    /// Toggle dispatch-on-call routing for future track calls.
    ///
    /// Pure state change: queue contents are untouched.
    pub fn set_immediate(&self, immediate: bool) {
        self.state.lock().unwrap().immediate = immediate;
    }

    /// Current routing mode.
    pub fn is_immediate(&self) -> bool {
        self.state.lock().unwrap().immediate
    }

    /// Counters since initialization.
    pub fn stats(&self) -> DispatchStats {
        self.state.lock().unwrap().stats.clone()
    }

    /// The session as loaded and advanced at initialization.
    pub fn session(&self) -> SessionRecord {
        self.state.lock().unwrap().session.clone()
    }

    /// Dispatch the next queued beacon.
    ///
    /// Caller-driven pump: invoke repeatedly (timer, app-pause hook) until it
    /// returns `false`. One call makes at most one network attempt.
    ///
    /// On success the dispatched record is deleted from the store and the
    /// return value says whether the current snapshot holds more. On a
    /// transport failure the record stays queued, the cursor does not move,
    /// and the call returns `false`; the next call re-attempts the same
    /// position.
    pub fn read_and_dispatch(&self) -> bool {
        let mut state = self.state.lock().unwrap();

        let stale = state.cursor.as_ref().map_or(true, DispatchCursor::exhausted);
        if stale {
            state.cursor = Some(self.snapshot_queue());
        }

        let next = match state.cursor.as_ref() {
            Some(cursor) if !cursor.exhausted() => cursor.snapshot[cursor.index].clone(),
            _ => return false,
        };

        match self.transport.send(&next.payload) {
            Ok(()) => {
                state.stats.dispatched += 1;
                // best effort: a leftover row is re-sent at-least-once later
                if let Err(e) = self.store.delete_event(next.id) {
                    tracing::warn!(error = %e, "failed to delete dispatched event");
                }
                match state.cursor.as_mut() {
                    Some(cursor) => {
                        cursor.index += 1;
                        !cursor.exhausted()
                    }
                    None => false,
                }
            }
            Err(e) => {
                state.stats.failures += 1;
                tracing::debug!(error = %e, "beacon dispatch failed, queue retained");
                false
            }
        }
    }

    /// Immediate-vs-queued routing for a finished beacon URL.
    fn route(&self, url: String) {
        let mut state = self.state.lock().unwrap();
        if state.immediate {
            match self.transport.send(&url) {
                Ok(()) => state.stats.dispatched += 1,
                Err(e) => {
                    state.stats.failures += 1;
                    tracing::warn!(error = %e, "immediate beacon dropped");
                }
            }
        } else {
            if let Err(e) = self.store.save_event(&url) {
                tracing::warn!(error = %e, "failed to queue beacon");
                return;
            }
            state.stats.queued += 1;
            state.cursor = Some(self.snapshot_queue());
        }
    }

    /// Snapshot the stored queue from the front.
    fn snapshot_queue(&self) -> DispatchCursor {
        let snapshot = match self.store.events() {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read event queue");
                Vec::new()
            }
        };
        DispatchCursor { snapshot, index: 0 }
    }
}

/// Explicit once-cell for the process-wide agent handle.
///
/// The host's startup path owns one of these (typically in a `static`) and
/// initializes it once. Every call after the first successful one returns
/// the already-constructed agent and ignores its arguments: the first
/// configuration wins for the process lifetime.
///
/// ```
/// use mobeacon::AgentCell;
///
/// static AGENT: AgentCell = AgentCell::new();
/// ```
pub struct AgentCell {
    slot: Mutex<Option<Arc<TrackingAgent>>>,
}

impl AgentCell {
    /// An empty, uninitialized cell.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Construct the agent on first call; return the existing handle after.
    ///
    /// Fails with [`Error::Config`] on an empty account id, an invalid
    /// device profile, or an unusable collector config. A failed call leaves
    /// the cell empty so the host can correct its configuration and retry.
    pub fn initialize(
        &self,
        account_id: &str,
        device: DeviceProfile,
        collector: &CollectorConfig,
        store: Arc<dyn Store>,
        transport: Arc<dyn Transport>,
    ) -> Result<Arc<TrackingAgent>> {
        let mut slot = self.slot.lock().unwrap();
        if let Some(agent) = slot.as_ref() {
            return Ok(agent.clone());
        }

        let agent = Arc::new(TrackingAgent::new(
            account_id, device, collector, store, transport,
        )?);
        *slot = Some(agent.clone());
        Ok(agent)
    }

    /// The configured handle, if initialization has happened.
    pub fn get(&self) -> Option<Arc<TrackingAgent>> {
        self.slot.lock().unwrap().clone()
    }
}

impl Default for AgentCell {
    fn default() -> Self {
        Self::new()
    }
}
