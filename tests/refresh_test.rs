//! Single-widget refresh and choice-buffer ownership.

#![cfg(feature = "mock")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use camera_config::{MockOp, RawValue, WidgetValue};
use common::{camera, text, value};

#[test]
fn test_refresh_adopts_new_choices_after_program_change() -> anyhow::Result<()> {
    let mut camera = camera();
    assert_eq!(camera.get("whitebalance")?.unwrap().choices().len(), 8);

    camera.set("expprogram", "Auto")?;
    camera.save()?;

    // The cached list is stale until refreshed
    assert_eq!(camera.get("whitebalance")?.unwrap().choices().len(), 8);

    let fresh = camera.refresh_value("whitebalance")?;
    assert_eq!(fresh, text("Automatic"));

    let issued = camera.driver().last_choices_addr("whitebalance").unwrap();
    let wb = camera.get("whitebalance")?.unwrap();
    assert_eq!(wb.choices(), ["Automatic"]);
    assert_eq!(wb.choices().as_ptr() as usize, issued);
    assert!(!wb.is_changed());
    assert!(!camera.is_dirty());

    assert!(camera.set("whitebalance", "Shade").is_err());
    Ok(())
}

#[test]
fn test_repeated_refresh_keeps_one_buffer() -> anyhow::Result<()> {
    let mut camera = camera();
    camera.config()?;

    for round in 0..20 {
        let program = if round % 2 == 0 { "Auto" } else { "M" };
        camera
            .driver_mut()
            .set_device_value("expprogram", RawValue::Text(program.into()));
        camera.refresh_value("whitebalance")?;

        let issued = camera.driver().last_choices_addr("whitebalance").unwrap();
        let expected = camera.driver().device_choices("whitebalance").unwrap().to_vec();
        let wb = camera.get("whitebalance")?.unwrap();
        assert_eq!(wb.choices().as_ptr() as usize, issued);
        assert_eq!(wb.choices(), expected.as_slice());
    }
    assert_eq!(camera.driver().calls(MockOp::FetchSingle), 20);
    assert_eq!(camera.driver().calls(MockOp::FetchTree), 1);
    Ok(())
}

#[test]
fn test_refresh_replaces_value_and_readonly() -> anyhow::Result<()> {
    let mut camera = camera();
    camera.config()?;
    camera
        .driver_mut()
        .set_device_value("iso", RawValue::Text("6400".into()));
    camera.driver_mut().set_device_readonly("iso", true);

    assert_eq!(camera.refresh_value("iso")?, text("6400"));
    assert_eq!(value(&mut camera, "iso"), text("6400"));
    assert!(camera.get("iso")?.unwrap().is_readonly());
    assert!(camera.set("iso", "100").is_err());
    Ok(())
}

#[test]
fn test_refresh_drops_pending_edit_on_that_widget() -> anyhow::Result<()> {
    let mut camera = camera();
    camera.set("focusmode", "Manual")?;
    assert!(camera.get("focusmode")?.unwrap().is_changed());

    assert_eq!(camera.refresh_value("focusmode")?, text("AF-S"));
    let widget = camera.get("focusmode")?.unwrap();
    assert_eq!(widget.value()?, text("AF-S"));
    assert!(!widget.is_changed());
    Ok(())
}

#[test]
fn test_refresh_uncached_returns_value_only() -> anyhow::Result<()> {
    let mut camera = camera();
    assert_eq!(camera.refresh_value("f-number")?, text("f/4"));
    assert!(!camera.is_loaded());
    assert_eq!(camera.driver().calls(MockOp::FetchTree), 0);
    Ok(())
}

#[test]
fn test_refresh_failure_leaves_cache_untouched() -> anyhow::Result<()> {
    let mut camera = camera();
    camera.config()?;
    camera.driver_mut().fail_next(MockOp::FetchSingle, -10);

    let err = camera.refresh_value("whitebalance").unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(camera.get("whitebalance")?.unwrap().choices().len(), 8);

    let err = camera.refresh_value("nope").unwrap_err();
    assert_eq!(err.code(), Some(-2));
    Ok(())
}

#[test]
fn test_refresh_to_auto_makes_toggle_tristate() -> anyhow::Result<()> {
    let mut camera = camera();
    assert!(!camera.get("autofocusdrive")?.unwrap().is_tristate());

    camera
        .driver_mut()
        .set_device_value("autofocusdrive", RawValue::Int(2));
    let fresh = camera.refresh_value("autofocusdrive")?;
    assert_eq!(fresh, WidgetValue::Auto);

    let cached = camera.get("autofocusdrive")?.unwrap();
    assert!(cached.is_tristate());
    assert_eq!(cached.value()?, WidgetValue::Auto);

    // The value just read can be written back
    camera.set("autofocusdrive", fresh)?;
    camera.set("autofocusdrive", false)?;
    camera.set("autofocusdrive", WidgetValue::Auto)?;
    assert_eq!(value(&mut camera, "autofocusdrive"), WidgetValue::Auto);
    Ok(())
}
