//! The sequencer that drives one force-stop run.
//!
//! All run state lives inside a single spawned task. The tree-change
//! subscription and the deadline supervisor only post messages onto the
//! task's channel, so no two handlers ever run concurrently against the same
//! session and no locking is needed around it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::confirm;
use crate::driver::{ProgressReporter, SettingsDriver, Target};
use crate::errors::AutomationError;
use crate::locator::{self, CandidateLabels};
use crate::quirks::{disabled_policy, DeviceProfile, DisabledPolicy};
use crate::timeouts::{DeadlineKind, DeadlineSupervisor};
use crate::tree::{NodeId, TreeSnapshot};

/// Tunables for one run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Deadline for the settings surface to render a locatable primary
    /// control, counted from the navigation request.
    pub surface_open_timeout: Duration,
    /// Deadline for the confirmation dialog, counted from activation of the
    /// primary control.
    pub confirmation_timeout: Duration,
    /// Device the run executes on, keying the vendor quirk tables.
    pub device: DeviceProfile,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            surface_open_timeout: Duration::from_secs(4),
            confirmation_timeout: Duration::from_secs(3),
            device: DeviceProfile::default(),
        }
    }
}

/// Pipeline state, global to the active run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiState {
    Idle,
    OpeningSurface,
    AwaitingPrimaryControl,
    AwaitingConfirmation,
}

/// Terminal outcome of a run. Cancellation is a distinct variant so a
/// partial count is never mistaken for normal completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Completed { closed_count: usize },
    Cancelled { closed_count: usize },
}

impl RunOutcome {
    pub fn closed_count(&self) -> usize {
        match self {
            RunOutcome::Completed { closed_count } | RunOutcome::Cancelled { closed_count } => {
                *closed_count
            }
        }
    }
}

pub(crate) enum EngineEvent {
    TreeChanged(TreeSnapshot),
    DeadlineElapsed { generation: u64, kind: DeadlineKind },
    Stop,
}

/// The automation pipeline's entry point.
///
/// At most one run is active per engine at a time; a second [`Engine::start`]
/// while one is in flight fails with [`AutomationError::AlreadyRunning`].
pub struct Engine {
    driver: Arc<dyn SettingsDriver>,
    config: EngineConfig,
    active: Arc<AtomicBool>,
}

impl Engine {
    pub fn new(driver: Arc<dyn SettingsDriver>) -> Self {
        Self::with_config(driver, EngineConfig::default())
    }

    pub fn with_config(driver: Arc<dyn SettingsDriver>, config: EngineConfig) -> Self {
        Self {
            driver,
            config,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start a run over `targets`, reporting progress to `progress`.
    ///
    /// The engine's own host and the settings surface owner are removed from
    /// the list first. If nothing remains the run completes immediately with
    /// a count of zero and the progress surface is never shown.
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(skip(self, targets, progress), fields(target_count = targets.len()))]
    pub fn start(
        &self,
        targets: Vec<Target>,
        progress: Arc<dyn ProgressReporter>,
    ) -> Result<RunHandle, AutomationError> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AutomationError::AlreadyRunning);
        }

        let own_identifier = self.driver.self_identifier();
        let surface_owner = self.driver.surface_owner();
        let targets: Vec<Target> = targets
            .into_iter()
            .filter(|target| {
                target.identifier != own_identifier && target.identifier != surface_owner
            })
            .collect();

        let (events, inbox) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = oneshot::channel();

        // Each run carries its own flag. The engine-wide `active` flag only
        // gates concurrent starts; everything cancellation-related checks
        // this one, so a handle left over from an earlier run cannot touch a
        // later one.
        let run_active = Arc::new(AtomicBool::new(true));

        // The driver delivers tree changes on an unspecified thread; gate on
        // the run flag and resynchronize onto the engine task.
        let tree_events = events.clone();
        let subscription_active = run_active.clone();
        self.driver.subscribe(Box::new(move |snapshot| {
            if subscription_active.load(Ordering::SeqCst) {
                let _ = tree_events.send(EngineEvent::TreeChanged(snapshot));
            }
        }));

        let run = RunContext {
            driver: self.driver.clone(),
            progress,
            config: self.config.clone(),
            supervisor: DeadlineSupervisor::new(events.clone()),
            engine_active: self.active.clone(),
            run_active: run_active.clone(),
            authoritative_label: None,
            outcome: Some(outcome_tx),
            session: RunSession {
                targets,
                current_index: 0,
                closed_count: 0,
                cached_label: None,
                state: UiState::Idle,
                started_at: Instant::now(),
            },
        };
        tokio::spawn(run.run(inbox));

        Ok(RunHandle {
            events,
            run_active,
            outcome: outcome_rx,
        })
    }
}

/// Handle to an in-flight run.
pub struct RunHandle {
    events: mpsc::UnboundedSender<EngineEvent>,
    run_active: Arc<AtomicBool>,
    outcome: oneshot::Receiver<RunOutcome>,
}

impl RunHandle {
    /// Cancel the run. Safe to call from any context: the run's flag flips
    /// immediately, turning any in-flight tree or deadline callback into a
    /// no-op, and the engine task then cancels pending deadlines, issues a
    /// best-effort return home, and resolves the handle with
    /// [`RunOutcome::Cancelled`]. The flag belongs to this run alone, so
    /// calling `stop` on a handle whose run already ended does nothing.
    pub fn stop(&self) {
        self.run_active.store(false, Ordering::SeqCst);
        let _ = self.events.send(EngineEvent::Stop);
    }

    pub fn is_running(&self) -> bool {
        self.run_active.load(Ordering::SeqCst)
    }

    /// Await the terminal outcome.
    pub async fn wait(self) -> Result<RunOutcome, AutomationError> {
        self.outcome.await.map_err(|_| {
            AutomationError::Internal("engine task ended without reporting an outcome".to_string())
        })
    }
}

/// Progress of one run. Mutated only from the engine task.
struct RunSession {
    targets: Vec<Target>,
    current_index: usize,
    closed_count: usize,
    cached_label: Option<String>,
    state: UiState,
    started_at: Instant,
}

struct RunContext {
    driver: Arc<dyn SettingsDriver>,
    progress: Arc<dyn ProgressReporter>,
    config: EngineConfig,
    supervisor: DeadlineSupervisor,
    engine_active: Arc<AtomicBool>,
    run_active: Arc<AtomicBool>,
    authoritative_label: Option<String>,
    outcome: Option<oneshot::Sender<RunOutcome>>,
    session: RunSession,
}

impl RunContext {
    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<EngineEvent>) {
        if self.session.targets.is_empty() {
            debug!("no targets remain after exclusions");
            self.finish(RunOutcome::Completed { closed_count: 0 }, false);
            return;
        }

        self.authoritative_label = self
            .driver
            .resolve_authoritative_label(&self.driver.surface_owner());
        debug!(label = ?self.authoritative_label, "authoritative stop label resolved");

        self.progress.show();
        self.advance();

        while self.outcome.is_some() {
            let Some(event) = inbox.recv().await else { break };
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Stop => self.cancel(),
            // stop() already flipped the run terminal; drop stragglers
            _ if !self.run_active.load(Ordering::SeqCst) => {}
            EngineEvent::TreeChanged(snapshot) => self.on_tree_changed(&snapshot),
            EngineEvent::DeadlineElapsed { generation, kind } => self.on_deadline(generation, kind),
        }
    }

    fn on_tree_changed(&mut self, snapshot: &TreeSnapshot) {
        match self.session.state {
            UiState::OpeningSurface | UiState::AwaitingPrimaryControl => {
                self.seek_primary_control(snapshot)
            }
            UiState::AwaitingConfirmation => self.seek_confirmation(snapshot),
            UiState::Idle => {}
        }
    }

    fn seek_primary_control(&mut self, snapshot: &TreeSnapshot) {
        let labels = CandidateLabels::new(
            self.session.cached_label.clone(),
            self.authoritative_label.clone(),
        );
        let Some(found) = locator::locate(snapshot, &labels) else {
            // Surface still rendering; wait for the next tree change.
            self.session.state = UiState::AwaitingPrimaryControl;
            return;
        };

        // Whichever tier matched becomes the cache for the rest of the run.
        self.session.cached_label = Some(found.matched_label.clone());

        if snapshot.attributes(found.node).enabled {
            self.activate_primary(snapshot, found.node);
            return;
        }
        match disabled_policy(&self.config.device) {
            DisabledPolicy::ActivateAnyway => {
                warn!(
                    label = %found.matched_label,
                    "primary control reported disabled; activating anyway for this device class"
                );
                self.activate_primary(snapshot, found.node);
            }
            DisabledPolicy::SkipUnrecoverable => {
                debug!(label = %found.matched_label, "primary control disabled, unrecoverable on this device class");
                self.skip_current();
            }
            DisabledPolicy::TreatAsStopped => {
                debug!(label = %found.matched_label, "primary control disabled, treating target as already stopped");
                self.skip_current();
            }
        }
    }

    fn activate_primary(&mut self, snapshot: &TreeSnapshot, node: NodeId) {
        self.driver.activate_node(snapshot, node);
        self.session.state = UiState::AwaitingConfirmation;
        self.supervisor
            .schedule(self.config.confirmation_timeout, DeadlineKind::Confirmation);
    }

    fn seek_confirmation(&mut self, snapshot: &TreeSnapshot) {
        let cached = self.session.cached_label.as_deref();
        let Some(node) = confirm::resolve_confirmation(snapshot, &self.config.device, cached)
        else {
            // Dialog not rendered yet; stay and wait for the next event.
            return;
        };
        self.driver.activate_node(snapshot, node);
        self.supervisor.cancel();
        self.session.closed_count += 1;
        debug!(closed = self.session.closed_count, "target confirmed closed");
        self.mark_processed();
        self.advance();
    }

    fn on_deadline(&mut self, generation: u64, kind: DeadlineKind) {
        if !self.supervisor.is_current(generation) {
            return;
        }
        self.supervisor.cancel();
        match kind {
            DeadlineKind::SurfaceOpen => {
                warn!(
                    index = self.session.current_index,
                    "timed out waiting for the primary control, skipping target"
                );
                self.mark_processed();
                self.advance();
            }
            DeadlineKind::Confirmation => {
                // Optimistic: the activation most likely took effect even
                // though the dialog was never observed. No post-hoc
                // verification is available.
                warn!(
                    index = self.session.current_index,
                    "timed out waiting for confirmation, counting target as closed"
                );
                self.session.closed_count += 1;
                self.mark_processed();
                self.advance();
            }
        }
    }

    fn skip_current(&mut self) {
        self.supervisor.cancel();
        self.mark_processed();
        self.advance();
    }

    fn mark_processed(&mut self) {
        self.session.current_index += 1;
        self.session.state = UiState::Idle;
    }

    /// Pull the next target, short-circuiting ones that are already stopped
    /// or whose surface cannot be opened, and complete once the index passes
    /// the end of the list.
    fn advance(&mut self) {
        while self.session.current_index < self.session.targets.len() {
            let target = &self.session.targets[self.session.current_index];
            let identifier = target.identifier.clone();
            let label = target.label.clone();
            debug!(
                index = self.session.current_index + 1,
                total = self.session.targets.len(),
                %identifier,
                "processing target"
            );

            if target.already_stopped || self.driver.is_already_stopped(&identifier) {
                debug!(%identifier, "target already stopped, skipping");
                self.session.current_index += 1;
                continue;
            }

            self.progress
                .update(self.session.current_index, self.session.targets.len(), &label);

            self.session.state = UiState::OpeningSurface;
            if let Err(error) = self.driver.open_app_details(&identifier) {
                warn!(%identifier, %error, "failed to open the settings surface, skipping");
                self.session.state = UiState::Idle;
                self.session.current_index += 1;
                continue;
            }
            self.supervisor
                .schedule(self.config.surface_open_timeout, DeadlineKind::SurfaceOpen);
            return;
        }
        self.complete();
    }

    fn complete(&mut self) {
        info!(
            closed = self.session.closed_count,
            elapsed = ?self.session.started_at.elapsed(),
            "run completed"
        );
        self.driver.global_back();
        self.driver.global_home();
        self.finish(
            RunOutcome::Completed {
                closed_count: self.session.closed_count,
            },
            true,
        );
    }

    fn cancel(&mut self) {
        if self.outcome.is_none() {
            return;
        }
        info!(closed = self.session.closed_count, "run cancelled");
        self.driver.global_home();
        self.finish(
            RunOutcome::Cancelled {
                closed_count: self.session.closed_count,
            },
            true,
        );
    }

    fn finish(&mut self, outcome: RunOutcome, hide_progress: bool) {
        self.supervisor.cancel();
        self.session.state = UiState::Idle;
        if hide_progress {
            self.progress.hide();
        }
        self.run_active.store(false, Ordering::SeqCst);
        self.engine_active.store(false, Ordering::SeqCst);
        if let Some(outcome_tx) = self.outcome.take() {
            let _ = outcome_tx.send(outcome);
        }
    }
}
