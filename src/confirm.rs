//! Resolves the confirmation control of the warning dialog.

use tracing::debug;

use crate::locator;
use crate::quirks::{confirm_control_ids, DeviceProfile};
use crate::tree::{NodeId, TreeSnapshot};

/// Affirmative labels searched after the structural ids, spanning the
/// locales the id lookup does not cover.
pub const CONFIRM_LABELS: &[&str] = &["OK", "Aceptar", "Accept"];

/// Find the actionable, enabled confirmation control in a snapshot.
///
/// Resolution order: known structural ids for the device, then affirmative
/// labels, then the cached primary-control label. The last tier covers EMUI
/// dialogs where the confirm control reuses the stop control's own text.
/// `None` means the dialog has not rendered yet; the caller stays in its
/// current state and waits for the next event.
pub fn resolve_confirmation(
    snapshot: &TreeSnapshot,
    profile: &DeviceProfile,
    cached_primary_label: Option<&str>,
) -> Option<NodeId> {
    for resource_id in confirm_control_ids(profile) {
        for node in snapshot.nodes_by_resource_id(resource_id) {
            let attributes = snapshot.attributes(node);
            if attributes.clickable && attributes.enabled {
                debug!(resource_id, ?node, "confirmation control found by id");
                return Some(node);
            }
        }
    }

    let label_tiers = CONFIRM_LABELS.iter().copied().chain(cached_primary_label);
    for label in label_tiers {
        if let Some(node) = locator::find_actionable_by_label(snapshot, label) {
            if snapshot.attributes(node).enabled {
                debug!(label, ?node, "confirmation control found by text");
                return Some(node);
            }
        }
    }
    None
}
