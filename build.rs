//! Detects a nightly toolchain so the `#[bench]` suites in `diff` and
//! `smooth` can be compiled with `feature(test)`.
use rustc_version::{version_meta, Channel};

fn main() {
    println!("cargo:rustc-check-cfg=cfg(rustc_nightly)");

    let meta = version_meta().expect("failed to query rustc version");
    assert!(meta.semver.major >= 1);

    if let Channel::Nightly = meta.channel {
        println!("cargo:rustc-cfg=rustc_nightly");
    }
}
