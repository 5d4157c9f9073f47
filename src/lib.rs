//! Force-stop automation through the system settings UI
//!
//! No direct kill API is exposed to the host, so this crate closes
//! applications the long way round: it navigates to each target's settings
//! surface, locates the stop control in the live accessibility tree,
//! activates it, and handles the confirmation dialog — all driven by
//! asynchronously delivered tree-change events.
//!
//! The host environment is abstracted behind [`SettingsDriver`] and
//! [`ProgressReporter`]; the engine itself owns no platform bindings.
//!
//! ```no_run
//! use std::sync::Arc;
//! use forcestop::{Engine, NullProgress, SettingsDriver};
//!
//! # async fn run(driver: Arc<dyn SettingsDriver>) -> Result<(), forcestop::AutomationError> {
//! let engine = Engine::new(driver.clone());
//! let targets = driver
//!     .enumerate_targets()
//!     .into_iter()
//!     .filter(|t| !t.is_system && !t.already_stopped)
//!     .collect();
//! let handle = engine.start(targets, Arc::new(NullProgress))?;
//! let outcome = handle.wait().await?;
//! println!("closed {} applications", outcome.closed_count());
//! # Ok(())
//! # }
//! ```

pub mod confirm;
pub mod driver;
pub mod engine;
pub mod errors;
pub mod locator;
pub mod quirks;
mod timeouts;
pub mod tree;

#[cfg(test)]
mod tests;

pub use driver::{NullProgress, ProgressReporter, SettingsDriver, Target, TreeChangeCallback};
pub use engine::{Engine, EngineConfig, RunHandle, RunOutcome, UiState};
pub use errors::AutomationError;
pub use locator::{CandidateLabels, LocatedControl, FALLBACK_STOP_LABELS};
pub use quirks::{DeviceClass, DeviceProfile, DisabledPolicy};
pub use timeouts::DeadlineKind;
pub use tree::{NodeAttributes, NodeId, SerializableNode, SnapshotBuilder, TreeSnapshot};
