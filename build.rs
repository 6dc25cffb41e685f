use std::env;
use std::path::PathBuf;

// ffmpeg-sys-next finds FFmpeg through pkg-config on Unix. On Windows it
// needs FFMPEG_DIR; point users at a vcpkg install when one is present.
fn main() {
    for variable in ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_TRIPLET"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows")
        || env::var_os("FFMPEG_DIR").is_some()
    {
        return;
    }

    let Some(vcpkg_root) = env::var_os("VCPKG_ROOT") else {
        println!(
            "cargo:warning=stillframes: FFMPEG_DIR is unset; set it to an FFmpeg install with include/ and lib/ (for example a vcpkg ffmpeg package)."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| String::from("x64-windows"));
    let candidate = PathBuf::from(vcpkg_root).join("installed").join(triplet);
    if candidate.join("include").join("libavcodec").is_dir() {
        println!(
            "cargo:warning=stillframes: found FFmpeg under {}; export FFMPEG_DIR to that path.",
            candidate.display()
        );
    } else {
        println!(
            "cargo:warning=stillframes: no FFmpeg headers under {}.",
            candidate.display()
        );
    }
}
