//! Luminari's Quest terminal driver.
//!
//! Plays combat encounters against the shadows in a line-oriented terminal
//! session:
//!
//! ```bash
//! cargo run -p luminari -- --shadow veil-of-isolation --profile hero
//! ```
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `info`).

mod headless;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let config = headless::parse_config_from_args(&args);
    headless::run_headless(config).await.map_err(|e| e.into())
}

fn print_help() {
    println!("Luminari's Quest - face your shadows");
    println!();
    println!("USAGE:");
    println!("    luminari [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --shadow <id>      Shadow to face first (default: whisper-of-doubt)");
    println!("    --save <path>      Profile file to load on start and save to");
    println!("    --profile <name>   Use ./<name>_profile.json as the profile file");
    println!("    --seed <n>         Seed for reproducible healing rolls");
    println!("    -h, --help         Show this help");
    println!();
    println!("ENVIRONMENT:");
    println!("    LUMINARI_ENERGY_COST_ENDURE      Energy spent by ENDURE (default 5)");
    println!("    LUMINARI_LOW_ENERGY_THRESHOLD    Low-energy warning threshold (default 20)");
    println!("    LUMINARI_ENEMY_TURN_DELAY_MS     Delay before the shadow acts (default 2500)");
    println!("    RUST_LOG                         Log filter (default info)");
}
