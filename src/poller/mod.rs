//! Sequential allotment status poller
//!
//! A poll run walks the identifier list in order, one request at a time:
//!
//! 1. Reset [`PollState`]: every identifier loading, classifications cleared.
//! 2. For each identifier, ask the backend for its status and record the
//!    classification, then wait [`PollConfig::delay`](crate::config::PollConfig)
//!    before the next one (also after the last one).
//! 3. The first failed request ends the run. Identifiers after it stay loading
//!    until the next run resets them.
//!
//! At most one run is in flight per poller. A second [`StatusPoller::poll_all`]
//! while one is running returns [`Error::PollInProgress`] without touching the
//! running run's state. [`StatusPoller::cancel`] stops the current run at its
//! next request or delay.

mod state;


pub use state::{PollState, Row, RowStatus};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::client::StatusApi;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::{self, SessionStore};
use crate::types::{Classification, Event, Notice, PollReport, StatusQuery};

/// Cancellation token of the run in flight; `None` while idle
type RunSlot = Arc<Mutex<Option<CancellationToken>>>;

fn lock_slot(slot: &RunSlot) -> MutexGuard<'_, Option<CancellationToken>> {
    // The slot holds no invariant a panicking holder could break
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Claims the run slot; frees it when the run ends, however it ends
struct RunGuard {
    slot: RunSlot,
    token: CancellationToken,
}

impl RunGuard {
    fn acquire(slot: &RunSlot) -> Option<Self> {
        let mut current = lock_slot(slot);
        if current.is_some() {
            return None;
        }
        let token = CancellationToken::new();
        *current = Some(token.clone());
        Some(Self {
            slot: Arc::clone(slot),
            token,
        })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        lock_slot(&self.slot).take();
    }
}

/// Polls allotment status for a user's identifiers
///
/// Cloneable; clones share state, the run slot and the event channel.
#[derive(Clone)]
pub struct StatusPoller {
    api: Arc<dyn StatusApi>,
    config: Arc<Config>,
    identifiers: Arc<Vec<String>>,
    session_error: Option<Arc<Error>>,
    selected: Arc<RwLock<String>>,
    state: Arc<RwLock<PollState>>,
    event_tx: broadcast::Sender<Event>,
    session_notice_pending: Arc<AtomicBool>,
    run: RunSlot,
}

impl StatusPoller {
    /// Create a poller for a known identifier list
    pub fn new(api: Arc<dyn StatusApi>, identifiers: Vec<String>, config: Config) -> Self {
        let (event_tx, _rx) = broadcast::channel(256);
        Self {
            api,
            config: Arc::new(config),
            identifiers: Arc::new(identifiers),
            session_error: None,
            selected: Arc::new(RwLock::new(String::new())),
            state: Arc::new(RwLock::new(PollState::default())),
            event_tx,
            session_notice_pending: Arc::new(AtomicBool::new(false)),
            run: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a poller from the profile the authenticator left in the session
    ///
    /// A missing or unreadable profile does not fail the mount: the poller
    /// comes up with no identifiers and [`session_error`](Self::session_error)
    /// reports why. The first [`subscribe`](Self::subscribe) receives the
    /// matching notice. Such a poller never issues requests.
    pub async fn mount(api: Arc<dyn StatusApi>, store: &dyn SessionStore, config: Config) -> Self {
        match session::load_profile(store, &config.session.profile_key).await {
            Ok(profile) => {
                let identifiers = profile.identifiers();
                info!(count = identifiers.len(), "PAN numbers received");
                Self::new(api, identifiers, config)
            }
            Err(e) => {
                error!(error = %e, "Error getting PAN numbers from login");
                let mut poller = Self::new(api, Vec::new(), config);
                poller.session_error = Some(Arc::new(e));
                poller.session_notice_pending.store(true, Ordering::SeqCst);
                poller
            }
        }
    }

    /// Subscribe to poll events
    ///
    /// Nobody can listen before the poller exists, so a notice raised during
    /// [`mount`](Self::mount) is held back and sent once a receiver exists.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        let rx = self.event_tx.subscribe();
        if let Some(e) = &self.session_error
            && self.session_notice_pending.swap(false, Ordering::SeqCst)
        {
            self.event_tx.send(Event::Notice(Notice::from(e.as_ref()))).ok();
        }
        rx
    }

    /// Identifiers this poller checks, in request order
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    /// Why the mount came up empty, if it did
    pub fn session_error(&self) -> Option<&Error> {
        self.session_error.as_deref()
    }

    /// Offerings the user can pick from
    pub fn offerings(&self) -> &[String] {
        &self.config.offerings
    }

    /// Pick the offering [`poll_selected`](Self::poll_selected) checks
    pub async fn select_target(&self, name: impl Into<String>) {
        let name = name.into();
        if !self.config.offerings.is_empty() && !self.config.is_known_offering(&name) {
            warn!(target_name = %name, "selected offering is not in the configured list");
        }
        *self.selected.write().await = name;
    }

    /// Currently selected offering (empty until one is picked)
    pub async fn selected_target(&self) -> String {
        self.selected.read().await.clone()
    }

    /// Snapshot of the current run state
    pub async fn state(&self) -> PollState {
        self.state.read().await.clone()
    }

    /// Whether a run is in flight
    pub fn is_running(&self) -> bool {
        lock_slot(&self.run).is_some()
    }

    /// Stop the in-flight run, if any, at its next suspension point
    pub fn cancel(&self) {
        if let Some(token) = lock_slot(&self.run).as_ref() {
            token.cancel();
        }
    }

    /// Run [`poll_all`](Self::poll_all) over the mounted identifiers and the
    /// selected offering
    pub async fn poll_selected(&self) -> Result<PollReport> {
        let target = self.selected_target().await;
        self.poll_all(&self.identifiers, &target).await
    }

    /// Check every identifier for `target`, strictly one after another
    ///
    /// Returns the first error that stopped the run. Identifiers resolved before
    /// it keep their classification; the rest stay loading.
    pub async fn poll_all(&self, identifiers: &[String], target: &str) -> Result<PollReport> {
        let guard = self.begin_run()?;
        self.run(guard, identifiers, target).await
    }

    /// Spawn [`poll_all`](Self::poll_all) as a background task
    ///
    /// The run is claimed before this returns, so a [`cancel`](Self::cancel)
    /// right after it always reaches the new run.
    pub fn start(
        &self,
        identifiers: Vec<String>,
        target: impl Into<String>,
    ) -> Result<JoinHandle<Result<PollReport>>> {
        let guard = self.begin_run()?;
        let poller = self.clone();
        let target = target.into();
        Ok(tokio::spawn(async move {
            poller.run(guard, &identifiers, &target).await
        }))
    }

    fn begin_run(&self) -> Result<RunGuard> {
        RunGuard::acquire(&self.run).ok_or_else(|| {
            warn!("status check already running, ignoring request");
            let e = Error::PollInProgress;
            self.event_tx.send(Event::Notice(Notice::from(&e))).ok();
            e
        })
    }

    async fn run(&self, guard: RunGuard, identifiers: &[String], target: &str) -> Result<PollReport> {
        let token = guard.token.clone();

        info!(target_name = %target, count = identifiers.len(), "Looking for PAN statuses");
        let started_at = Utc::now();
        *self.state.write().await = PollState::start(identifiers, target, started_at);
        self.event_tx
            .send(Event::RunStarted {
                target: target.to_string(),
                identifiers: identifiers.to_vec(),
            })
            .ok();

        for (index, identifier) in identifiers.iter().enumerate() {
            let query = StatusQuery::new(target, identifier.as_str());

            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => Err(Error::Cancelled),
                result = self.api.ipo_status(&query) => result,
            };

            let classification = match outcome {
                Ok(result) => Classification::from(&result),
                Err(e) => return Err(self.abort(&identifiers[index..], e).await),
            };

            debug!(identifier = %identifier, classification = %classification, "status resolved");
            self.state
                .write()
                .await
                .resolve(identifier, &classification);
            self.event_tx
                .send(Event::Resolved {
                    identifier: identifier.clone(),
                    classification,
                })
                .ok();

            debug!(delay = ?self.config.poll.delay, "Setting a delay");
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    return Err(self.abort(&identifiers[index + 1..], Error::Cancelled).await);
                }
                _ = sleep(self.config.poll.delay) => {}
            }
            debug!("delay is done");
        }

        let report = PollReport {
            target: target.to_string(),
            resolved: identifiers.len(),
            started_at,
            finished_at: Utc::now(),
        };
        info!(target_name = %target, resolved = report.resolved, "status check finished");
        self.event_tx
            .send(Event::RunFinished {
                target: report.target.clone(),
                resolved: report.resolved,
            })
            .ok();
        Ok(report)
    }

    /// End the run early, leaving `pending` loading
    async fn abort(&self, pending: &[String], e: Error) -> Error {
        if matches!(e, Error::Cancelled) {
            info!(pending = pending.len(), "status check cancelled");
        } else {
            error!(error = %e, pending = pending.len(), "status check failed, stopping run");
            self.event_tx.send(Event::Notice(Notice::from(&e))).ok();
        }

        self.state.write().await.table_visible = false;
        self.event_tx
            .send(Event::RunAborted {
                pending: pending.to_vec(),
                error: e.to_string(),
            })
            .ok();
        e
    }
}
