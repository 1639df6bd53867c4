fn main() {
    println!("cargo:rerun-if-env-changed=FRIED_SRC_DIR");
    println!("cargo:rerun-if-changed=build.rs");

    #[cfg(feature = "vendored")]
    vendored::build();
}

#[cfg(feature = "vendored")]
mod vendored {
    use std::env;
    use std::path::{Path, PathBuf};

    fn locate_src_dir(manifest_dir: &Path) -> PathBuf {
        if let Ok(env) = env::var("FRIED_SRC_DIR") {
            return PathBuf::from(env);
        }

        let workspace_root = manifest_dir
            .parent()
            .expect("fried-sys has no parent dir");

        let submodule_path = workspace_root.join("fried-codec");
        if submodule_path.join("CMakeLists.txt").is_file() {
            return submodule_path;
        }

        // Fallback: sibling checkout.
        workspace_root
            .parent()
            .expect("workspace has no parent dir")
            .join("fried-codec")
    }

    pub fn build() {
        let manifest_dir =
            PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR"));
        let src_dir = locate_src_dir(&manifest_dir);
        if !src_dir.join("CMakeLists.txt").is_file() {
            panic!(
                "Could not find FRIED sources; set FRIED_SRC_DIR (current: {})",
                src_dir.display()
            );
        }

        let target_env = env::var("CARGO_CFG_TARGET_ENV").unwrap_or_default();

        let mut cfg = cmake::Config::new(&src_dir);
        cfg.profile("Release");
        cfg.define("BUILD_SHARED_LIBS", "ON");
        cfg.define("FRIED_BUILD_TESTS", "OFF");
        cfg.define("FRIED_BUILD_TOOLS", "OFF");
        cfg.build_target("fried_shared");
        let dst = cfg.build();

        // The library is opened at runtime, so only its location is exported.
        let lib_dir = if target_env == "msvc" {
            dst.join("build").join("Release")
        } else {
            dst.join("build")
        };
        println!("cargo:rustc-env=FRIED_VENDORED_LIB_DIR={}", lib_dir.display());
        println!(
            "cargo:rerun-if-changed={}",
            src_dir.join("src/fried/fried.hpp").display()
        );
    }
}
