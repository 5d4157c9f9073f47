//! Collaborator seams between the engine and its host environment.
//!
//! The engine owns no platform bindings. Everything it needs from the
//! outside world — target enumeration, opening the per-app settings surface,
//! activating a node, global navigation, and the tree-change subscription —
//! arrives through [`SettingsDriver`]. Progress display goes out through
//! [`ProgressReporter`].

use serde::{Deserialize, Serialize};

use crate::errors::AutomationError;
use crate::tree::{NodeId, TreeSnapshot};

/// One application the pipeline attempts to force-stop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// Stable identifier understood by the driver (e.g. a package name).
    pub identifier: String,
    /// User-visible label, shown in progress updates.
    pub label: String,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub already_stopped: bool,
}

impl Target {
    pub fn new(identifier: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            label: label.into(),
            is_system: false,
            already_stopped: false,
        }
    }
}

/// Callback invoked by the driver whenever the external tree changes.
///
/// Delivery timing and thread are unspecified; the engine resynchronizes
/// every invocation onto its own serialized event loop.
pub type TreeChangeCallback = Box<dyn Fn(TreeSnapshot) + Send + Sync>;

/// Host-environment operations the engine drives the run through.
///
/// Navigation requests and activations are fire-and-forget: a failure to
/// take effect surfaces later as a per-target timeout, never as a blocked
/// handler.
pub trait SettingsDriver: Send + Sync {
    /// All installed applications eligible for selection, with system and
    /// already-stopped entries flagged so the caller can filter them.
    fn enumerate_targets(&self) -> Vec<Target>;

    /// Identifier of the automation host itself. Excluded from every run.
    fn self_identifier(&self) -> String;

    /// Identifier of the application owning the settings surface. Excluded
    /// from every run; also the scope for authoritative label resolution.
    fn surface_owner(&self) -> String;

    fn is_already_stopped(&self, identifier: &str) -> bool;

    /// Request the per-target settings view. An error here consumes the
    /// target through the open-failure skip path.
    fn open_app_details(&self, identifier: &str) -> Result<(), AutomationError>;

    /// Activate a control in the snapshot delivered by the current event.
    fn activate_node(&self, snapshot: &TreeSnapshot, node: NodeId);

    /// Best-effort global back navigation.
    fn global_back(&self);

    /// Best-effort global home navigation.
    fn global_home(&self);

    /// Resolve the surface owner's own label for the stop control, in the
    /// device's locale. Best-effort; `None` is non-fatal.
    fn resolve_authoritative_label(&self, surface_owner: &str) -> Option<String>;

    /// Register the sole inbound event source for the engine.
    fn subscribe(&self, on_tree_changed: TreeChangeCallback);
}

/// Observes run progress. Implementations must not block; the engine
/// tolerates a reporter that does nothing at all.
pub trait ProgressReporter: Send + Sync {
    fn show(&self);
    fn update(&self, current: usize, total: usize, label: &str);
    fn hide(&self);
}

/// Reporter used when the embedder provides no progress surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressReporter for NullProgress {
    fn show(&self) {}
    fn update(&self, _current: usize, _total: usize, _label: &str) {}
    fn hide(&self) {}
}
