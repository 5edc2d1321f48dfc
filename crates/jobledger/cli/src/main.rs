fn main() {
    if let Err(err) = jobledger_cli::run() {
        jobledger_cli::print_error(&err.to_string());
        std::process::exit(1);
    }
}
