fn main() {
    if let Err(e) = outlook::cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
