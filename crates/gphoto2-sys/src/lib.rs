//! Low-level FFI bindings for libgphoto2.
//!
//! Only the configuration-widget surface is bound: camera open/close, model
//! and port selection, `gp_camera_{get,set}_config`,
//! `gp_camera_{get,set}_single_config`, the `gp_widget_*` accessors
//! (including `gp_widget_set_changed`, which forces a widget to be re-applied)
//! and the result-code string helpers.
//!
//! # Safety
//!
//! All functions in this crate are `unsafe` as they are direct FFI bindings.
//! For a safe wrapper, use the `camera-config` crate with its `libgphoto2`
//! feature instead.
//!
//! # Features
//!
//! - `gphoto2-sdk`: Generate bindings from the system libgphoto2 headers.
//!   Without this feature the crate exposes no items and links nothing.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(dead_code)]
#![allow(missing_docs)]
#![allow(clippy::all)]

include!(concat!(env!("OUT_DIR"), "/bindings.rs"));
