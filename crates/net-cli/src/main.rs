//! StorNet CLI (stornet)

use anyhow::Result;
use clap::{Parser, Subcommand};

use stornet::commands::{ApplyCommand, ValidateCommand};
use stornet_config::ServiceConf;

#[derive(Parser)]
#[command(name = "stornet")]
#[command(about = "Storage network interface reconciler")]
#[command(version)]
#[command(long_about = "
Storage network interface reconciler

Merges the desired storage-interface definitions into
/etc/network/interfaces, rewriting only the stanzas that changed, and
cycles the changed interfaces through ifdown/ifup around a transactional
file install.

Examples:
  stornet validate                         # Parse the interfaces file
  stornet apply --dry-run                  # Report what would change
  stornet apply                            # Reconcile file and system
  stornet -c /etc/stornet.conf apply       # Use a specific service conf
")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Service configuration file
    #[arg(short, long, default_value = "/etc/stornet.conf", global = true)]
    conf: String,

    /// Interfaces file to reconcile
    #[arg(short, long, default_value = "/etc/network/interfaces", global = true)]
    file: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the interfaces file and the live interfaces
    Apply {
        /// Merge and report only, without touching the system
        #[arg(long)]
        dry_run: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse the interfaces file and report what it defines
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Apply { dry_run, json } => {
            let conf = ServiceConf::load(&cli.conf)
                .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", cli.conf, e));
            match conf {
                Ok(conf) => ApplyCommand::new(conf, cli.file).execute(dry_run, json).await,
                Err(e) => Err(e),
            }
        }
        Commands::Validate => ValidateCommand::new(cli.file).execute().await,
    };

    match result {
        Ok(()) => {
            if !cli.quiet {
                log::info!("Command completed successfully");
            }
            Ok(())
        }
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {}", e);
                if cli.verbose || cli.debug {
                    for err in e.chain().skip(1) {
                        eprintln!("  Caused by: {}", err);
                    }
                }
            }
            std::process::exit(1);
        }
    }
}
