//! Lazy loading, dirty tracking, save and reload against the simulated DSLR.

#![cfg(feature = "mock")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use camera_config::{CameraError, MockOp, RawValue, WidgetKind, WidgetValue};
use chrono::{TimeZone, Utc};
use common::{camera, text, value};

#[test]
fn test_tree_loaded_on_first_access() -> anyhow::Result<()> {
    let mut camera = camera();
    assert!(!camera.is_loaded());
    assert_eq!(camera.driver().calls(MockOp::FetchTree), 0);

    let window = camera.window()?;
    assert_eq!(window.kind(), WidgetKind::Window);
    assert_eq!(window.id(), "main");
    assert_eq!(window.children().len(), 5);

    camera.get("iso")?;
    assert!(camera.is_loaded());
    assert_eq!(camera.driver().calls(MockOp::FetchTree), 1);
    Ok(())
}

#[test]
fn test_index_covers_sections_and_leaves() -> anyhow::Result<()> {
    let mut camera = camera();
    let config = camera.config()?;
    assert!(config.contains_key("main"));
    assert!(config.contains_key("capturesettings"));
    assert!(config.contains_key("shutterspeed2"));
    assert!(!config.contains_key("nope"));

    let keys = config.keys();
    let mut sorted = keys.clone();
    sorted.sort_unstable();
    assert_eq!(keys, sorted);
    assert_eq!(config.len(), keys.len());

    let section = config.get("imgsettings").unwrap();
    assert_eq!(section.kind(), WidgetKind::Section);
    assert_eq!(section.label(), "Image Settings");
    assert!(section.child("iso").is_some());
    Ok(())
}

#[test]
fn test_set_then_get() -> anyhow::Result<()> {
    let mut camera = camera();
    assert_eq!(value(&mut camera, "iso"), text("100"));

    camera.set("iso", 800)?;
    assert!(camera.is_dirty());
    assert_eq!(value(&mut camera, "iso"), text("800"));
    assert!(camera.get("iso")?.unwrap().is_changed());

    // Nothing reaches the device before save
    assert_eq!(camera.driver().device_value("iso"), Some(&RawValue::Text("100".into())));
    Ok(())
}

#[test]
fn test_save_pushes_once() -> anyhow::Result<()> {
    let mut camera = camera();
    camera.set("iso", "400")?;
    camera.set("artist", "Jane Doe")?;

    assert!(camera.save()?);
    assert!(!camera.is_dirty());
    assert_eq!(camera.driver().writes(), ["artist", "iso"]);
    assert_eq!(camera.driver().device_value("iso"), Some(&RawValue::Text("400".into())));
    assert!(!camera.get("iso")?.unwrap().is_changed());

    assert!(!camera.save()?);
    assert_eq!(camera.driver().calls(MockOp::PushTree), 1);
    Ok(())
}

#[test]
fn test_save_clean_makes_no_device_call() -> anyhow::Result<()> {
    let mut camera = camera();
    assert!(!camera.save()?);
    assert!(!camera.is_loaded());
    assert_eq!(camera.driver().calls(MockOp::PushTree), 0);
    Ok(())
}

#[test]
fn test_reload_discards_edits() -> anyhow::Result<()> {
    let mut camera = camera();
    camera.set("iso", "3200")?;
    camera.set("focusmode", "Manual")?;
    assert!(camera.is_dirty());

    camera.reload()?;
    assert!(!camera.is_dirty());
    assert_eq!(value(&mut camera, "iso"), text("100"));
    assert_eq!(value(&mut camera, "focusmode"), text("AF-S"));
    assert_eq!(camera.driver().calls(MockOp::FetchTree), 2);
    assert!(camera.driver().writes().is_empty());
    Ok(())
}

#[test]
fn test_reload_sees_device_changes() -> anyhow::Result<()> {
    let mut camera = camera();
    assert_eq!(value(&mut camera, "shutterspeed2"), text("1/125"));

    camera
        .driver_mut()
        .set_device_value("shutterspeed2", RawValue::Text("1/500".into()));
    assert_eq!(value(&mut camera, "shutterspeed2"), text("1/125"));

    camera.reload()?;
    assert_eq!(value(&mut camera, "shutterspeed2"), text("1/500"));
    Ok(())
}

#[test]
fn test_invalid_choice_keeps_state() -> anyhow::Result<()> {
    let mut camera = camera();
    let err = camera.set("iso", "123").unwrap_err();
    match &err {
        CameraError::InvalidChoice { id, value, choices } => {
            assert_eq!(id, "iso");
            assert_eq!(value, "123");
            assert!(choices.contains(&"800".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_validation());
    assert!(!camera.is_dirty());
    assert_eq!(value(&mut camera, "iso"), text("100"));
    Ok(())
}

#[test]
fn test_unknown_key() -> anyhow::Result<()> {
    let mut camera = camera();
    assert!(camera.get("nope")?.is_none());
    assert!(camera.get_mut("nope")?.is_none());

    let err = camera.set("nope", 1).unwrap_err();
    assert!(matches!(err, CameraError::UnknownKey { ref key } if key == "nope"));
    assert_eq!(err.to_string(), "Invalid key: nope");
    assert!(!camera.is_dirty());
    Ok(())
}

#[test]
fn test_readonly_and_button_rejected() -> anyhow::Result<()> {
    let mut camera = camera();
    assert!(camera.get("serialnumber")?.unwrap().is_readonly());
    assert!(matches!(
        camera.set("serialnumber", "0"),
        Err(CameraError::ReadOnly { .. })
    ));
    assert!(matches!(
        camera.set("resetsettings", "now"),
        Err(CameraError::NotSupported { kind: WidgetKind::Button, .. })
    ));
    assert!(matches!(
        camera.get("resetsettings")?.unwrap().value(),
        Err(CameraError::NotSupported { .. })
    ));
    assert!(!camera.is_dirty());
    Ok(())
}

#[test]
fn test_typed_widgets() -> anyhow::Result<()> {
    let mut camera = camera();

    camera.set("manualfocusdrive", 120)?;
    assert_eq!(value(&mut camera, "manualfocusdrive"), WidgetValue::Float(120.0));
    assert!(matches!(
        camera.set("manualfocusdrive", 40000),
        Err(CameraError::OutOfRange { .. })
    ));

    camera.set("exposurecompensation", 1.2)?;
    assert_eq!(value(&mut camera, "exposurecompensation"), WidgetValue::Float(1.0));

    camera.set("autofocusdrive", true)?;
    assert_eq!(value(&mut camera, "autofocusdrive"), WidgetValue::Bool(true));
    assert!(camera.set("autofocusdrive", WidgetValue::Auto).is_err());

    assert_eq!(value(&mut camera, "autoflash"), WidgetValue::Auto);
    camera.set("autoflash", "off")?;
    assert_eq!(value(&mut camera, "autoflash"), WidgetValue::Bool(false));
    camera.set("autoflash", WidgetValue::Auto)?;
    assert_eq!(value(&mut camera, "autoflash"), WidgetValue::Auto);

    let when = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
    camera.set("datetime", when)?;
    assert_eq!(value(&mut camera, "datetime"), WidgetValue::Date(when));

    camera.save()?;
    assert_eq!(
        camera.driver().device_value("datetime"),
        Some(&RawValue::Int(when.timestamp() as i32))
    );
    Ok(())
}

#[test]
fn test_widget_handle_marks_dirty() -> anyhow::Result<()> {
    let mut camera = camera();
    {
        let mut handle = camera.get_mut("f-number")?.unwrap();
        handle.set_value("f/8")?;
        assert_eq!(handle.value()?, text("f/8"));
        assert!(handle.set_value("f/0.95").is_err());
    }
    assert!(camera.is_dirty());
    camera.save()?;
    assert_eq!(camera.driver().writes(), ["f-number"]);
    Ok(())
}

#[test]
fn test_failed_fetch_leaves_cache_empty() {
    let mut camera = camera();
    camera.driver_mut().fail_next(MockOp::FetchTree, -7);

    let err = camera.get("iso").unwrap_err();
    assert_eq!(err.code(), Some(-7));
    assert!(!camera.is_loaded());

    assert!(camera.get("iso").unwrap().is_some());
    assert!(camera.is_loaded());
}

#[test]
fn test_failed_reload_leaves_cache_empty() -> anyhow::Result<()> {
    let mut camera = camera();
    camera.set("iso", "800")?;
    camera.driver_mut().fail_next(MockOp::FetchTree, -52);

    let err = camera.reload().unwrap_err();
    assert_eq!(err.code(), Some(-52));
    assert!(!camera.is_loaded());
    assert!(!camera.is_dirty());

    // The next access fetches again; the discarded edit is gone
    assert_eq!(value(&mut camera, "iso"), text("100"));
    assert!(camera.is_loaded());
    assert_eq!(camera.driver().calls(MockOp::FetchTree), 3);
    Ok(())
}

#[test]
fn test_failed_save_stays_dirty() -> anyhow::Result<()> {
    let mut camera = camera();
    camera.set("iso", "1600")?;
    camera.driver_mut().fail_next(MockOp::PushTree, -110);

    let err = camera.save().unwrap_err();
    assert!(err.is_busy());
    assert!(camera.is_dirty());
    assert!(camera.get("iso")?.unwrap().is_changed());
    assert_eq!(camera.driver().device_value("iso"), Some(&RawValue::Text("100".into())));

    assert!(camera.save()?);
    assert!(!camera.is_dirty());
    assert_eq!(camera.driver().device_value("iso"), Some(&RawValue::Text("1600".into())));
    Ok(())
}

#[test]
fn test_save_single() -> anyhow::Result<()> {
    let mut camera = camera();
    camera.set("iso", "400")?;
    camera.set("artist", "Jane Doe")?;

    assert!(camera.save_single("iso")?);
    assert_eq!(camera.driver().writes(), ["iso"]);
    assert_eq!(camera.driver().calls(MockOp::PushSingle), 1);
    assert!(camera.is_dirty());

    assert!(!camera.save_single("iso")?);
    assert_eq!(camera.driver().calls(MockOp::PushSingle), 1);

    assert!(camera.save_single("artist")?);
    assert!(!camera.is_dirty());
    assert!(matches!(
        camera.save_single("nope"),
        Err(CameraError::UnknownKey { .. })
    ));
    Ok(())
}

#[test]
fn test_update_without_force_skips_unchanged() -> anyhow::Result<()> {
    let mut camera = camera();
    let outcome = camera.update([("iso", "100"), ("focusmode", "AF-C")], false)?;
    assert!(outcome.saved);
    assert!(outcome.is_complete());
    assert_eq!(camera.driver().writes(), ["focusmode"]);
    Ok(())
}

#[test]
fn test_update_with_force_rewrites_everything() -> anyhow::Result<()> {
    let mut camera = camera();
    let outcome = camera.update([("iso", "100"), ("focusmode", "AF-S")], true)?;
    assert!(outcome.saved);
    assert_eq!(camera.driver().writes(), ["iso", "focusmode"]);
    assert!(!camera.is_dirty());
    Ok(())
}

#[test]
fn test_update_continues_past_invalid_entries() -> anyhow::Result<()> {
    let mut camera = camera();
    let outcome = camera.update(
        [
            ("iso", text("123")),
            ("nope", text("x")),
            ("f-number", text("f/8")),
        ],
        false,
    )?;
    assert!(!outcome.is_complete());
    let failed: Vec<&str> = outcome.failures.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(failed, ["iso", "nope"]);
    assert_eq!(camera.driver().writes(), ["f-number"]);
    assert_eq!(camera.driver().calls(MockOp::PushTree), 1);
    Ok(())
}

#[test]
fn test_update_aborts_on_device_error() {
    let mut camera = camera();
    camera.driver_mut().fail_next(MockOp::PushTree, -53);
    let err = camera.update([("iso", "200")], false).unwrap_err();
    assert!(err.is_device());
    assert!(camera.is_dirty());
}
