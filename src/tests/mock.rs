//! Recording mocks of the collaborator traits, shared by the scenario tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::driver::{ProgressReporter, SettingsDriver, Target, TreeChangeCallback};
use crate::errors::AutomationError;
use crate::tree::{NodeAttributes, NodeId, SnapshotBuilder, TreeSnapshot};

pub const SELF_ID: &str = "host.automation";
pub const SURFACE_OWNER: &str = "com.android.settings";

/// One observable side effect the engine asked the driver for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverAction {
    Open(String),
    Activate {
        text: Option<String>,
        resource_id: Option<String>,
    },
    Back,
    Home,
}

/// How a scripted `open_app_details` call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFailure {
    Navigation,
    Platform,
}

pub struct MockDriver {
    targets: Vec<Target>,
    stopped: Mutex<HashSet<String>>,
    failing_open: Mutex<HashMap<String, OpenFailure>>,
    authoritative: Mutex<Option<String>>,
    callback: Mutex<Option<TreeChangeCallback>>,
    actions: UnboundedSender<DriverAction>,
}

impl MockDriver {
    pub fn new(targets: Vec<Target>) -> (Arc<Self>, UnboundedReceiver<DriverAction>) {
        let (actions, inbox) = unbounded_channel();
        let driver = Arc::new(Self {
            targets,
            stopped: Mutex::new(HashSet::new()),
            failing_open: Mutex::new(HashMap::new()),
            authoritative: Mutex::new(None),
            callback: Mutex::new(None),
            actions,
        });
        (driver, inbox)
    }

    pub fn mark_stopped(&self, identifier: &str) {
        self.stopped.lock().unwrap().insert(identifier.to_string());
    }

    pub fn fail_open(&self, identifier: &str) {
        self.fail_open_with(identifier, OpenFailure::Navigation);
    }

    pub fn fail_open_with(&self, identifier: &str, failure: OpenFailure) {
        self.failing_open
            .lock()
            .unwrap()
            .insert(identifier.to_string(), failure);
    }

    pub fn set_authoritative_label(&self, label: &str) {
        *self.authoritative.lock().unwrap() = Some(label.to_string());
    }

    /// Push a tree-change event through the registered subscription, the way
    /// the real environment would.
    pub fn deliver(&self, snapshot: TreeSnapshot) {
        let callback = self.callback.lock().unwrap();
        (callback.as_ref().expect("engine has not subscribed"))(snapshot);
    }
}

impl SettingsDriver for MockDriver {
    fn enumerate_targets(&self) -> Vec<Target> {
        self.targets.clone()
    }

    fn self_identifier(&self) -> String {
        SELF_ID.to_string()
    }

    fn surface_owner(&self) -> String {
        SURFACE_OWNER.to_string()
    }

    fn is_already_stopped(&self, identifier: &str) -> bool {
        self.stopped.lock().unwrap().contains(identifier)
    }

    fn open_app_details(&self, identifier: &str) -> Result<(), AutomationError> {
        match self.failing_open.lock().unwrap().get(identifier) {
            Some(OpenFailure::Navigation) => {
                return Err(AutomationError::NavigationFailed(format!(
                    "no details view for {identifier}"
                )))
            }
            Some(OpenFailure::Platform) => {
                return Err(AutomationError::PlatformError(format!(
                    "settings process died opening {identifier}"
                )))
            }
            None => {}
        }
        let _ = self.actions.send(DriverAction::Open(identifier.to_string()));
        Ok(())
    }

    fn activate_node(&self, snapshot: &TreeSnapshot, node: NodeId) {
        let attributes = snapshot.attributes(node);
        let _ = self.actions.send(DriverAction::Activate {
            text: attributes.text.clone(),
            resource_id: attributes.resource_id.clone(),
        });
    }

    fn global_back(&self) {
        let _ = self.actions.send(DriverAction::Back);
    }

    fn global_home(&self) {
        let _ = self.actions.send(DriverAction::Home);
    }

    fn resolve_authoritative_label(&self, _surface_owner: &str) -> Option<String> {
        self.authoritative.lock().unwrap().clone()
    }

    fn subscribe(&self, on_tree_changed: TreeChangeCallback) {
        *self.callback.lock().unwrap() = Some(on_tree_changed);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressCall {
    Show,
    Update(usize, usize, String),
    Hide,
}

#[derive(Default)]
pub struct RecordingProgress {
    pub calls: Mutex<Vec<ProgressCall>>,
}

impl RecordingProgress {
    pub fn was_shown(&self) -> bool {
        self.calls.lock().unwrap().contains(&ProgressCall::Show)
    }
}

impl ProgressReporter for RecordingProgress {
    fn show(&self) {
        self.calls.lock().unwrap().push(ProgressCall::Show);
    }

    fn update(&self, current: usize, total: usize, label: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(ProgressCall::Update(current, total, label.to_string()));
    }

    fn hide(&self) {
        self.calls.lock().unwrap().push(ProgressCall::Hide);
    }
}

pub fn target(identifier: &str) -> Target {
    Target::new(identifier, identifier.to_uppercase())
}

/// An app-details page with one stop control and an uninstall sibling.
pub fn details_page(stop_label: &str, enabled: bool) -> TreeSnapshot {
    let mut builder = SnapshotBuilder::new();
    let root = builder.root(NodeAttributes::new("frame"));
    builder.child(root, NodeAttributes::new("text").text("App info"));
    let row = builder.child(root, NodeAttributes::new("container"));
    builder.child(
        row,
        NodeAttributes::new("button")
            .text(stop_label)
            .clickable(true)
            .enabled(enabled),
    );
    builder.child(
        row,
        NodeAttributes::new("button").text("Uninstall").clickable(true),
    );
    builder.build()
}

/// A page that has rendered but does not carry the stop control yet.
pub fn loading_page() -> TreeSnapshot {
    let mut builder = SnapshotBuilder::new();
    let root = builder.root(NodeAttributes::new("frame"));
    builder.child(root, NodeAttributes::new("text").text("Loading…"));
    builder.build()
}

/// A confirmation dialog whose confirm control carries a structural id.
pub fn confirm_dialog_with_id(resource_id: &str) -> TreeSnapshot {
    let mut builder = SnapshotBuilder::new();
    let root = builder.root(NodeAttributes::new("dialog"));
    builder.child(root, NodeAttributes::new("text").text("Force stop this app?"));
    builder.child(
        root,
        NodeAttributes::new("button")
            .text("Cancel")
            .resource_id("android:id/cancel")
            .clickable(true),
    );
    builder.child(
        root,
        NodeAttributes::new("button")
            .text("Confirm")
            .resource_id(resource_id)
            .clickable(true),
    );
    builder.build()
}

/// A confirmation dialog resolvable only through its label text.
pub fn confirm_dialog_with_text(label: &str) -> TreeSnapshot {
    let mut builder = SnapshotBuilder::new();
    let root = builder.root(NodeAttributes::new("dialog"));
    builder.child(root, NodeAttributes::new("text").text("Force stop this app?"));
    builder.child(root, NodeAttributes::new("button").text(label).clickable(true));
    builder.build()
}
