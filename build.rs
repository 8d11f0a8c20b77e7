use std::{env, fs, path::PathBuf};

fn main() {
    // Only the firmware images link against cortex-m-rt's `link.x`, which
    // looks for `memory.x` on the linker search path.
    if env::var_os("CARGO_FEATURE_STM32F303").is_none() {
        return;
    }

    let out = PathBuf::from(env::var_os("OUT_DIR").unwrap());
    fs::copy("memory.x", out.join("memory.x")).unwrap();
    println!("cargo:rustc-link-search={}", out.display());
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}
