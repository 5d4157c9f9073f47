//! Locates the primary stop control in a tree snapshot.
//!
//! Label text varies by locale and OEM skin, so candidates are tried in
//! tiers: the label cached from an earlier success in the same run, then the
//! label resolved from the settings surface itself, then a fixed fallback
//! table covering common locales. Whichever tier succeeds is written back
//! into the run's cache by the engine.

use tracing::debug;

use crate::tree::{NodeId, TreeSnapshot};

/// Fallback stop-control labels tried after the cached and authoritative
/// tiers, covering English, Spanish, Portuguese, French and German builds.
pub const FALLBACK_STOP_LABELS: &[&str] = &[
    "Force stop",
    "Force close",
    "Forzar detención",
    "Forçar parada",
    "Forcer l'arrêt",
    "Stoppen erzwingen",
];

/// Ordered label candidates for one locate attempt. Tier order is both the
/// search precedence and the cache-write precedence.
#[derive(Debug, Clone, Default)]
pub struct CandidateLabels {
    /// Label that matched earlier in this run, if any. Tried first: UI text
    /// is stable within one locale and build, so the hit rate is high.
    pub cached: Option<String>,
    /// Label resolved from the surface owner's own resources, if available.
    pub authoritative: Option<String>,
    /// Fixed fallback strings, tried last in order.
    pub fallbacks: &'static [&'static str],
}

impl CandidateLabels {
    pub fn new(cached: Option<String>, authoritative: Option<String>) -> Self {
        Self {
            cached,
            authoritative,
            fallbacks: FALLBACK_STOP_LABELS,
        }
    }

    /// Candidate labels in tier order.
    pub fn tiers(&self) -> impl Iterator<Item = &str> {
        self.cached
            .as_deref()
            .into_iter()
            .chain(self.authoritative.as_deref())
            .chain(self.fallbacks.iter().copied())
    }
}

/// A control resolved by the locator, together with the label tier that
/// matched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedControl {
    pub node: NodeId,
    pub matched_label: String,
}

/// Find an actionable control matching any candidate label, trying tiers in
/// order and stopping at the first hit. The returned node may still be
/// disabled; that branch belongs to the vendor quirk resolver.
pub fn locate(snapshot: &TreeSnapshot, labels: &CandidateLabels) -> Option<LocatedControl> {
    for label in labels.tiers() {
        if label.trim().is_empty() {
            continue;
        }
        if let Some(node) = find_actionable_by_label(snapshot, label) {
            debug!(label, ?node, "primary control located");
            return Some(LocatedControl {
                node,
                matched_label: label.to_string(),
            });
        }
    }
    None
}

/// Find a single actionable node whose text or description contains `label`.
///
/// The indexed text lookup runs first; the exhaustive depth-first traversal
/// follows to cover nodes the index misses (description-only nodes). The
/// first qualifying match wins and the search stops immediately.
pub fn find_actionable_by_label(snapshot: &TreeSnapshot, label: &str) -> Option<NodeId> {
    for id in snapshot.indexed_text_matches(label) {
        if let Some(actionable) = actionable_for(snapshot, id) {
            return Some(actionable);
        }
    }
    for id in snapshot.preorder() {
        if matches_label(snapshot, id, label) {
            if let Some(actionable) = actionable_for(snapshot, id) {
                return Some(actionable);
            }
        }
    }
    None
}

fn matches_label(snapshot: &TreeSnapshot, id: NodeId, label: &str) -> bool {
    let attributes = snapshot.attributes(id);
    let content = attributes
        .text
        .as_deref()
        .or(attributes.description.as_deref())
        .unwrap_or("");
    content.to_lowercase().contains(&label.to_lowercase())
}

/// Resolve the node that should receive the activation: the matching node if
/// it is clickable itself, otherwise its immediate parent. Never ascends
/// further: a clickable container higher up may hold several sibling
/// controls, and activating it would trigger the wrong one.
fn actionable_for(snapshot: &TreeSnapshot, id: NodeId) -> Option<NodeId> {
    if snapshot.attributes(id).clickable {
        return Some(id);
    }
    snapshot
        .parent(id)
        .filter(|parent| snapshot.attributes(*parent).clickable)
}
