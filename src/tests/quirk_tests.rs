//! Tests for the declarative vendor quirk tables.

use crate::quirks::{
    confirm_control_ids, disabled_policy, DeviceClass, DeviceProfile, DisabledPolicy,
    MODERN_PLATFORM_LEVEL,
};

#[test]
fn classifies_manufacturers_by_substring() {
    assert_eq!(DeviceProfile::new("Xiaomi", 33).class(), DeviceClass::Miui);
    assert_eq!(DeviceProfile::new("POCO F5", 33).class(), DeviceClass::Miui);
    assert_eq!(DeviceProfile::new("redmi", 33).class(), DeviceClass::Miui);
    assert_eq!(DeviceProfile::new("HUAWEI", 33).class(), DeviceClass::Emui);
    assert_eq!(DeviceProfile::new("Honor", 33).class(), DeviceClass::Emui);
    assert_eq!(DeviceProfile::new("Samsung", 33).class(), DeviceClass::OneUi);
    assert_eq!(DeviceProfile::new("Google", 33).class(), DeviceClass::Generic);
}

#[test]
fn miui_skips_disabled_controls_outright() {
    let profile = DeviceProfile::new("xiaomi", 28);
    assert_eq!(disabled_policy(&profile), DisabledPolicy::SkipUnrecoverable);
}

#[test]
fn emui_activates_anyway_only_on_modern_builds() {
    let modern = DeviceProfile::new("huawei", MODERN_PLATFORM_LEVEL);
    assert_eq!(disabled_policy(&modern), DisabledPolicy::ActivateAnyway);

    let old = DeviceProfile::new("huawei", MODERN_PLATFORM_LEVEL - 1);
    assert_eq!(disabled_policy(&old), DisabledPolicy::TreatAsStopped);
}

#[test]
fn default_policy_treats_disabled_as_stopped() {
    let profile = DeviceProfile::new("google", 33);
    assert_eq!(disabled_policy(&profile), DisabledPolicy::TreatAsStopped);
}

#[test]
fn confirm_ids_extend_for_oneui_and_modern_builds() {
    let base = confirm_control_ids(&DeviceProfile::new("google", 29));
    assert_eq!(
        base,
        vec![
            "android:id/button1",
            "com.android.settings:id/button1",
            "android:id/button2",
        ]
    );

    let oneui = confirm_control_ids(&DeviceProfile::new("samsung", 29));
    assert!(oneui.contains(&"android:id/action1"));
    assert!(oneui.contains(&"android:id/action3"));
    assert_eq!(&oneui[..3], &base[..]);

    let modern = confirm_control_ids(&DeviceProfile::new("google", 30));
    assert!(modern.contains(&"com.android.settings:id/action2"));
}
