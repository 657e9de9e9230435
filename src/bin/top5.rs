mod commands;

use clap::Parser;
use commands::{execute_command, utils::build_board, Commands};
use tokio::task::LocalSet;

/// Top 5 song board client
#[derive(Parser)]
#[command(
    name = "top5",
    about = "Browse, suggest and moderate songs on a Top 5 board",
    long_about = None
)]
struct Cli {
    /// Show detailed debug information
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let board = match build_board() {
        Ok(board) => board,
        Err(e) => {
            eprintln!("❌ Failed to configure client: {e}");
            eprintln!();
            eprintln!("Check the following environment variables:");
            eprintln!("  TOP5_API_URL=http://localhost:8000/api");
            eprintln!("  TOP5_PER_PAGE=6");
            std::process::exit(1);
        }
    };

    if args.verbose {
        match board.current_user() {
            Some(user) => println!("🔐 Session restored for {}", user.email),
            None => println!("👤 Not logged in"),
        }
    }

    // The board's cache refetches in the background with spawn_local.
    let local = LocalSet::new();
    let result = local
        .run_until(async { execute_command(args.command, &board).await })
        .await;

    if let Err(e) = result {
        eprintln!("❌ Command failed: {e}");
        std::process::exit(1);
    }

    Ok(())
}
