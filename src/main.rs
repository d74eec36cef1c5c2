use std::process;

fn main() {
    if let Err(e) = buggery::cli::run() {
        process::exit(buggery::cli::report(&e));
    }
}
