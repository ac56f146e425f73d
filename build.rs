fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Host builds (unit + integration tests) never link ESP-IDF.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
