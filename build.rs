// Build script
//
// Android builds link against libc++_shared so symbols pulled in by Oboe
// (e.g. __cxa_pure_virtual) resolve on all ABIs (arm/x86). Desktop builds
// need nothing extra: cpal links the host audio framework itself.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("android") {
        println!("cargo:rustc-link-lib=c++_shared");
    }
}
