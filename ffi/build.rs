//! Regenerate `include/farm_ffi.h` from the `extern "C"` surface.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src");

    let crate_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string()));
    let header = crate_dir.join("include").join("farm_ffi.h");

    let generated = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("FARM_FFI_H")
        .with_parse_deps(false)
        .generate();

    let bindings = match generated {
        Ok(bindings) => bindings,
        Err(err) => {
            println!("cargo:warning=skipping C header generation: {err}");
            return;
        }
    };
    if let Some(dir) = header.parent() {
        if let Err(err) = std::fs::create_dir_all(dir) {
            println!("cargo:warning=cannot create {}: {err}", dir.display());
            return;
        }
    }
    // `false` means the header on disk was already up to date.
    if !bindings.write_to_file(&header) && !header.exists() {
        println!("cargo:warning=failed to write {}", header.display());
    }
}
