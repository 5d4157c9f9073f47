//! Device-vendor quirks, expressed as declarative data.
//!
//! OEM skins disagree about what a disabled stop control means and about the
//! structural ids of the confirmation dialog. Both decisions are driven by
//! static tables keyed on the device classification, so a new quirk is an
//! additive row rather than another inline branch.

use serde::{Deserialize, Serialize};

/// Platform level at which several OEM skins moved the confirmation dialog
/// to the `action*` id family and started reporting unreliable enabled state.
pub const MODERN_PLATFORM_LEVEL: u32 = 30;

/// Manufacturer and platform version of the device the run executes on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub manufacturer: String,
    pub platform_level: u32,
}

impl DeviceProfile {
    pub fn new(manufacturer: impl Into<String>, platform_level: u32) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            platform_level,
        }
    }

    pub fn class(&self) -> DeviceClass {
        let manufacturer = self.manufacturer.to_lowercase();
        let matches_any =
            |names: &[&str]| names.iter().any(|name| manufacturer.contains(name));
        if matches_any(&["xiaomi", "redmi", "poco"]) {
            DeviceClass::Miui
        } else if matches_any(&["huawei", "honor"]) {
            DeviceClass::Emui
        } else if matches_any(&["samsung"]) {
            DeviceClass::OneUi
        } else {
            DeviceClass::Generic
        }
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::new("", MODERN_PLATFORM_LEVEL)
    }
}

/// Vendor-skin family the device belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceClass {
    Miui,
    Emui,
    OneUi,
    Generic,
}

/// What to do when the primary control is found but reported disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisabledPolicy {
    /// Disabled is final on this skin. Skip without an activation attempt.
    SkipUnrecoverable,
    /// The reported enabled state is unreliable. Activate anyway and wait
    /// for confirmation under the normal timeout policy.
    ActivateAnyway,
    /// Disabled means the target is already stopped. Skip, not counted.
    TreatAsStopped,
}

struct QuirkRule {
    class: DeviceClass,
    min_platform_level: Option<u32>,
    policy: DisabledPolicy,
}

static DISABLED_QUIRKS: &[QuirkRule] = &[
    QuirkRule {
        class: DeviceClass::Miui,
        min_platform_level: None,
        policy: DisabledPolicy::SkipUnrecoverable,
    },
    QuirkRule {
        class: DeviceClass::Emui,
        min_platform_level: Some(MODERN_PLATFORM_LEVEL),
        policy: DisabledPolicy::ActivateAnyway,
    },
];

/// Resolve the disabled-control policy for a device. First matching rule
/// wins; devices without a matching rule treat disabled as already stopped.
pub fn disabled_policy(profile: &DeviceProfile) -> DisabledPolicy {
    let class = profile.class();
    DISABLED_QUIRKS
        .iter()
        .find(|rule| {
            rule.class == class
                && rule
                    .min_platform_level
                    .map_or(true, |min| profile.platform_level >= min)
        })
        .map(|rule| rule.policy)
        .unwrap_or(DisabledPolicy::TreatAsStopped)
}

/// Platform-default structural ids of the confirmation control.
const CONFIRM_CONTROL_IDS: &[&str] = &[
    "android:id/button1",
    "com.android.settings:id/button1",
    "android:id/button2",
];

/// Extension ids used by OneUi skins and by modern platform builds.
const CONFIRM_CONTROL_IDS_EXTENDED: &[&str] = &[
    "android:id/action1",
    "com.android.settings:id/action1",
    "android:id/action2",
    "com.android.settings:id/action2",
    "android:id/action3",
];

/// Ordered structural ids to try when resolving the confirmation control.
pub fn confirm_control_ids(profile: &DeviceProfile) -> Vec<&'static str> {
    let mut ids = CONFIRM_CONTROL_IDS.to_vec();
    if profile.class() == DeviceClass::OneUi || profile.platform_level >= MODERN_PLATFORM_LEVEL {
        ids.extend_from_slice(CONFIRM_CONTROL_IDS_EXTENDED);
    }
    ids
}
