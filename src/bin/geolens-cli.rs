use clap::Parser;

use geolens::cli::{self, Args};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = cli::run(args).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
