fn main() {
    if let Err(err) = gtdraw::run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
