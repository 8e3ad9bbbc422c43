mod cli;
mod commands;
mod engine;
mod env_loader;
mod error;
mod store;

fn main() {
    env_loader::load_dotenv();

    if let Err(err) = cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
