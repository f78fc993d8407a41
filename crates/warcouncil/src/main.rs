//! # War Council CLI (`council`)
//!
//! ```bash
//! council --config ./config/council.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `council analyze "<query>"` | Show the detected intent, tier and parameters |
//! | `council ask "<query>"` | Retrieve and print the advisor context |
//! | `council simulate --attacker .. --defense ..` | Retrieve reference docs for a battle |
//! | `council stats` | Summarize the loaded corpus |
//! | `council completions <shell>` | Print shell completions |
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `warn`), e.g. `RUST_LOG=warcouncil_core=debug council ask ...`.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use warcouncil::simulate::BattleScenario;
use warcouncil::{advisor, config, simulate, stats};

/// War Council: retrieval-grounded strategy advice for a base-building
/// strategy game.
#[derive(Parser)]
#[command(name = "council", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/council.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how a question is interpreted, without retrieval.
    Analyze {
        query: String,

        /// Print the analysis as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Retrieve reference documents for an advisor question.
    Ask {
        query: String,

        /// Print the assembled context as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Retrieve reference documents for a battle scenario.
    Simulate {
        /// Attacking troop name (repeatable).
        #[arg(long = "attacker")]
        attackers: Vec<String>,

        /// Defending building name (repeatable).
        #[arg(long = "defense")]
        defenses: Vec<String>,

        /// Town hall level of the defending base.
        #[arg(long)]
        tier: Option<u32>,

        #[arg(long)]
        json: bool,
    },

    /// Show corpus statistics.
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions.
    Completions { shell: Shell },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // Commands that need no config file.
    match &cli.command {
        Commands::Analyze { query, json } => {
            return advisor::run_analyze(query, *json);
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "council", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Ask { query, json } => {
            advisor::run_ask(&cfg, &query, json).await?;
        }
        Commands::Simulate {
            attackers,
            defenses,
            tier,
            json,
        } => {
            let scenario = BattleScenario {
                attackers,
                defenses,
                tier,
            };
            simulate::run_simulate(&cfg, scenario, json).await?;
        }
        Commands::Stats { json } => {
            stats::run_stats(&cfg, json).await?;
        }
        Commands::Analyze { .. } | Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}
