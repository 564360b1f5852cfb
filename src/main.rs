fn main() {
    if let Err(err) = csv_ndjson::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
