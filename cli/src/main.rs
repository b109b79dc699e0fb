mod argparse;
mod commands;
mod utils;

use argparse::parse_args;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = parse_args();
    utils::init_logger(cli.verbose);

    if let Err(e) = commands::handle_command(cli).await {
        eprintln!("✗ {}", e);
        std::process::exit(1);
    }
}
