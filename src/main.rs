use env_logger::Env;

mod cli;
mod prelude;
mod render;
mod snapshot;
mod tree;
mod tty;
mod who;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(err) = cli::run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
