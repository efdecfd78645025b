use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;
use vaultwatch::cli::{parse_cmd, scan_cmd};

#[derive(Parser)]
#[command(name = "vaultwatch", version, about = "Watch a vault's perp positions for target coins")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "VAULTWATCH_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the vault page and send an alert or update
    Scan(scan_cmd::ScanArgs),

    /// Extract positions from a saved HTML page
    Parse {
        file: PathBuf,

        /// Print positions as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vaultwatch=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let result = match &cli.command {
        Command::Scan(args) => scan_cmd::run(args).await,
        Command::Parse { file, json } => parse_cmd::run(file, *json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            let code = e
                .downcast_ref::<vaultwatch::Error>()
                .map(vaultwatch::Error::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}
