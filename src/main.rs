fn main() {
    std::process::exit(legacy_import::run());
}
