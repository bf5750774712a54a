//! Build script for gphoto2-sys FFI bindings.
//!
//! 1. With `gphoto2-sdk` feature: generates bindings from the system headers
//!    located through pkg-config and links `libgphoto2`.
//! 2. Without the feature: writes an empty bindings module so the workspace
//!    builds on machines without libgphoto2.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=wrapper.h");
    println!("cargo:rerun-if-env-changed=GPHOTO2_INCLUDE_DIR");

    #[cfg(feature = "gphoto2-sdk")]
    generate_bindings();

    #[cfg(not(feature = "gphoto2-sdk"))]
    generate_dummy_bindings();
}

#[cfg(feature = "gphoto2-sdk")]
fn generate_bindings() {
    // pkg-config emits the link flags for libgphoto2 and libgphoto2_port.
    let include_paths: Vec<String> = match pkg_config::probe_library("libgphoto2") {
        Ok(lib) => lib
            .include_paths
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect(),
        Err(_) => {
            println!("cargo:rustc-link-lib=gphoto2");
            println!("cargo:rustc-link-lib=gphoto2_port");
            vec![env::var("GPHOTO2_INCLUDE_DIR").unwrap_or_else(|_| "/usr/include".to_string())]
        }
    };

    let mut builder = bindgen::Builder::default()
        .header("wrapper.h")
        .allowlist_function("gp_camera_.*")
        // Includes gp_widget_set_changed for forced re-application
        .allowlist_function("gp_widget_.*")
        .allowlist_function("gp_context_.*")
        .allowlist_function("gp_abilities_list_.*")
        .allowlist_function("gp_port_info_list_.*")
        .allowlist_function("gp_port_result_as_string")
        .allowlist_function("gp_result_as_string")
        .allowlist_type("CameraWidget.*")
        .allowlist_var("GP_OK")
        .allowlist_var("GP_ERROR.*")
        // Keep constants flat: GP_WIDGET_WINDOW rather than CameraWidgetType_GP_WIDGET_WINDOW
        .default_enum_style(bindgen::EnumVariation::Consts)
        .prepend_enum_name(false)
        .derive_debug(true)
        .derive_default(true)
        .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()));

    for path in &include_paths {
        builder = builder.clang_arg(format!("-I{}", path));
    }

    let bindings = builder
        .generate()
        .expect("Unable to generate libgphoto2 bindings");

    let out_path = PathBuf::from(env::var("OUT_DIR").unwrap());
    bindings
        .write_to_file(out_path.join("bindings.rs"))
        .expect("Couldn't write bindings!");
}

#[cfg(not(feature = "gphoto2-sdk"))]
fn generate_dummy_bindings() {
    let out_path = PathBuf::from(env::var("OUT_DIR").unwrap());
    std::fs::write(
        out_path.join("bindings.rs"),
        "// Dummy bindings when gphoto2-sdk feature is not enabled\npub mod gphoto2_bindings {}\n",
    )
    .expect("Couldn't write dummy bindings!");
}
