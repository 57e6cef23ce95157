//! Build script for recording the build environment and ONNX Runtime guidance.
//!
//! The `onnx` feature links ONNX Runtime through `ort`; this script reports
//! where the runtime will come from and prints hints when it is overridden.

use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // ONNX Runtime location, only relevant with the onnx feature
    if env::var("CARGO_FEATURE_ONNX").is_ok() {
        check_onnx_runtime();
    }

    // Print detected environment
    println!(
        "cargo:rustc-env=BUILD_TARGET={}",
        env::var("TARGET").unwrap_or_default()
    );
    println!("cargo:rustc-env=BUILD_HOST={}", env::var("HOST").unwrap_or_default());
}

fn check_onnx_runtime() {
    println!("cargo:rerun-if-env-changed=ORT_LIB_LOCATION");
    println!("cargo:rerun-if-env-changed=ORT_STRATEGY");

    match env::var("ORT_LIB_LOCATION") {
        Ok(path) if !path.is_empty() => {
            println!("cargo:warning=Using ONNX Runtime from ORT_LIB_LOCATION={path}");
        }
        _ => {
            if env::var("ORT_STRATEGY").as_deref() == Ok("system") {
                println!("cargo:warning=ORT_STRATEGY=system but ORT_LIB_LOCATION is not set.");
                println!("cargo:warning=Point ORT_LIB_LOCATION at the onnxruntime library directory,");
                println!("cargo:warning=or build with --no-default-features for the geometric estimator only.");
            }
        }
    }
}
