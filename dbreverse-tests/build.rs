fn main() {
    // Generate models for integration tests
    // The generated code is only used by tests (via include!), so it won't
    // affect normal library compilation
    dbreverse::generate_from_cargo_metadata().expect("dbreverse codegen failed");
}
