//! Cache refresh and scheduling
//!
//! A [`Refresher`] runs one refresh cycle: read the credential, fetch the
//! links, and publish a new snapshot. Cycles are serialized by a gate; a
//! cycle requested while another is running reports
//! [`RefreshOutcome::Coalesced`] and marks a follow-up as pending, which the
//! running caller picks up before it returns.
//!
//! [`spawn_scheduler`] drives the refresher from a background task. Three
//! sources wake it up:
//!
//! - the interval timer
//! - a credential change (the scheduler subscribes to the credential store)
//! - an explicit [`SchedulerHandle::request_refresh`]
//!
//! Wake-ups that arrive while a cycle is running collapse into a single
//! follow-up cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::{FetchError, LinksClient};
use crate::cache::LinkCache;
use crate::credential::{CredentialStore, SubscriptionId};
use crate::models::LinkRecord;

/// Unread scheduler events kept for a reader
const EVENT_BUFFER: usize = 16;

/// Refresher state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// Waiting for the next trigger
    Idle,
    /// A cycle is in flight
    Refreshing,
}

/// Result of one refresh attempt
#[derive(Debug)]
pub enum RefreshOutcome {
    /// No credential; the cache was emptied without contacting the API
    Cleared,
    /// A new snapshot with this many records was published
    Updated(usize),
    /// The fetch failed; the previous snapshot is kept
    Failed(FetchError),
    /// Another cycle was already running; it runs once more afterwards
    Coalesced,
}

impl RefreshOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, RefreshOutcome::Updated(_))
    }
}

/// Runs refresh cycles against the shared cache
pub struct Refresher {
    client: LinksClient,
    credentials: Arc<CredentialStore>,
    cache: Arc<LinkCache>,
    link_base_url: String,
    gate: Mutex<()>,
    pending: AtomicBool,
    state_tx: watch::Sender<RefreshState>,
}

impl Refresher {
    pub fn new(
        client: LinksClient,
        credentials: Arc<CredentialStore>,
        cache: Arc<LinkCache>,
        link_base_url: &str,
    ) -> Self {
        let (state_tx, _state_rx) = watch::channel(RefreshState::Idle);
        Self {
            client,
            credentials,
            cache,
            link_base_url: link_base_url.trim_end_matches('/').to_string(),
            gate: Mutex::new(()),
            pending: AtomicBool::new(false),
            state_tx,
        }
    }

    /// Current state
    pub fn state(&self) -> RefreshState {
        *self.state_tx.borrow()
    }

    /// Watch state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<RefreshState> {
        self.state_tx.subscribe()
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn cache(&self) -> &Arc<LinkCache> {
        &self.cache
    }

    /// Run one cycle unless one is already in flight
    ///
    /// When a cycle is in flight this returns [`RefreshOutcome::Coalesced`]
    /// and the in-flight caller runs exactly one more cycle once it is done,
    /// however many calls were coalesced. The returned outcome is that of the
    /// last cycle this call ran.
    ///
    /// Failures are logged and absorbed; the cache keeps its last good
    /// snapshot.
    pub async fn refresh_once(&self) -> RefreshOutcome {
        let mut last = None;

        loop {
            let gate = match self.gate.try_lock() {
                Ok(gate) => gate,
                // Another caller took the gate after our cycle and reads the
                // current credential itself.
                Err(_) if last.is_some() => break,
                Err(_) => {
                    self.pending.store(true, Ordering::SeqCst);
                    // The holder may have released between the two attempts
                    match self.gate.try_lock() {
                        Ok(gate) => gate,
                        Err(_) => {
                            debug!("Refresh already in flight, queued a follow-up");
                            return RefreshOutcome::Coalesced;
                        }
                    }
                }
            };

            self.pending.store(false, Ordering::SeqCst);
            {
                let _state = StateGuard::enter(&self.state_tx);
                last = Some(self.run_cycle().await);
            }
            drop(gate);

            // Checked after releasing the gate so a request coalesced right
            // before the release is not lost.
            if !self.pending.load(Ordering::SeqCst) {
                break;
            }
            debug!("Running queued follow-up refresh");
        }

        last.unwrap_or(RefreshOutcome::Coalesced)
    }

    async fn run_cycle(&self) -> RefreshOutcome {
        let credential = self.credentials.get();

        if credential.is_empty() {
            self.cache.clear();
            info!("No API token set, link cache cleared");
            return RefreshOutcome::Cleared;
        }

        match self.client.list_links(&credential).await {
            Ok(entries) => {
                let records: Vec<LinkRecord> = entries
                    .into_iter()
                    .map(|entry| LinkRecord::from_raw(entry, &self.link_base_url))
                    .collect();
                let count = records.len();
                self.cache.replace(records);
                info!("Link cache refreshed with {} link(s)", count);
                RefreshOutcome::Updated(count)
            }
            Err(e) => {
                warn!(kind = e.kind(), "Skipping refresh cycle: {}", e);
                RefreshOutcome::Failed(e)
            }
        }
    }
}

/// Holds `Refreshing` for the lifetime of a cycle, even if the future is dropped
struct StateGuard<'a> {
    tx: &'a watch::Sender<RefreshState>,
}

impl<'a> StateGuard<'a> {
    fn enter(tx: &'a watch::Sender<RefreshState>) -> Self {
        tx.send_replace(RefreshState::Refreshing);
        Self { tx }
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.tx.send_replace(RefreshState::Idle);
    }
}

/// Commands sent to the scheduler task
#[derive(Debug, Clone)]
pub enum SchedulerCommand {
    /// Stop the scheduler after any in-flight cycle
    Shutdown,
}

/// Events emitted by the scheduler task
#[derive(Debug)]
pub enum SchedulerEvent {
    /// A cycle finished
    Completed(RefreshOutcome),
}

/// Handle to control the background scheduler
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
    event_rx: Option<mpsc::Receiver<SchedulerEvent>>,
    trigger: Arc<Notify>,
    credentials: Arc<CredentialStore>,
    subscription: SubscriptionId,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Ask for a refresh outside the timer (explicit reload)
    pub fn request_refresh(&self) {
        debug!("Reload requested");
        self.trigger.notify_one();
    }

    /// Take the event receiver (can only be called once)
    ///
    /// Up to 16 unread outcomes are buffered; cycles that finish while the
    /// buffer is full are not reported.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<SchedulerEvent>> {
        self.event_rx.take()
    }

    /// Detach from the credential store and stop the task
    pub async fn shutdown(self) {
        self.credentials.unsubscribe(self.subscription);
        let _ = self.command_tx.send(SchedulerCommand::Shutdown).await;
        if let Err(e) = self.task.await {
            warn!("Refresh scheduler task ended abnormally: {}", e);
        }
    }
}

/// Spawn the refresh scheduler
///
/// The first timer tick fires one `interval` after spawning. The initial
/// refresh is expected to come from loading the startup credential, which
/// goes through the credential-change path.
pub fn spawn_scheduler(refresher: Arc<Refresher>, interval: Duration) -> SchedulerHandle {
    let (command_tx, command_rx) = mpsc::channel(4);
    let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
    let trigger = Arc::new(Notify::new());

    let credentials = refresher.credentials().clone();
    let listener_trigger = trigger.clone();
    let subscription = credentials.subscribe(move |_| {
        debug!("Credential changed, scheduling refresh");
        listener_trigger.notify_one();
    });

    let task = tokio::spawn(scheduler_loop(
        refresher,
        interval,
        trigger.clone(),
        command_rx,
        event_tx,
    ));

    SchedulerHandle {
        command_tx,
        event_rx: Some(event_rx),
        trigger,
        credentials,
        subscription,
        task,
    }
}

async fn scheduler_loop(
    refresher: Arc<Refresher>,
    interval: Duration,
    trigger: Arc<Notify>,
    mut command_rx: mpsc::Receiver<SchedulerCommand>,
    event_tx: mpsc::Sender<SchedulerEvent>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Refresh scheduler started (interval {:?})", interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                debug!("Scheduled refresh");
            }
            _ = trigger.notified() => {
                debug!("Triggered refresh");
            }
            cmd = command_rx.recv() => {
                match cmd {
                    Some(SchedulerCommand::Shutdown) | None => break,
                }
            }
        }

        let outcome = refresher.refresh_once().await;
        let event = SchedulerEvent::Completed(outcome);
        if let Err(TrySendError::Full(_)) = event_tx.try_send(event) {
            debug!("Event buffer full, dropping refresh outcome");
        }
    }

    info!("Refresh scheduler stopped");
}
