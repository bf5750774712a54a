//! Shared helpers for integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

#[cfg(feature = "mock")]
use camera_config::{Camera, MockCamera};
use camera_config::WidgetValue;
use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

// Initialize tracing subscriber once for test logging
static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
});

pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// A camera over the simulated DSLR.
#[cfg(feature = "mock")]
pub fn camera() -> Camera<MockCamera> {
    init_tracing();
    Camera::new(MockCamera::dslr())
}

/// Cached value of `key`, panicking if it is missing.
#[cfg(feature = "mock")]
pub fn value(camera: &mut Camera<MockCamera>, key: &str) -> WidgetValue {
    camera
        .get(key)
        .unwrap()
        .unwrap_or_else(|| panic!("no widget '{key}'"))
        .value()
        .unwrap()
}

pub fn text(s: &str) -> WidgetValue {
    WidgetValue::Text(s.to_string())
}
