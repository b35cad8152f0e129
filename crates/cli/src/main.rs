fn main() -> Result<(), Box<dyn std::error::Error>> {
    factory_finder_cli::run()
}
