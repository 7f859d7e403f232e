//! Crucible CLI: run conformance sequences against a healthcare
//! data-exchange server, or serve the HTTP API that hosts instances and
//! the authorization-callback endpoint.

mod list;
mod run;
mod serve;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Crucible conformance harness.
#[derive(Parser)]
#[command(
    name = "crucible",
    version,
    about = "Conformance test harness for healthcare data-exchange servers"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered sequences and their tests
    List,

    /// Run one sequence against a server
    Run {
        /// Name of the sequence to run
        sequence: String,
        /// Base URL of the server under test
        #[arg(long)]
        server: String,
        /// Additional context parameters as key=value (repeatable)
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Serve the HTTP JSON API (instances, sequence runs, resume callback)
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 4040)]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::List => list::cmd_list(cli.output),
        Commands::Run {
            sequence,
            server,
            params,
        } => run::cmd_run(&sequence, &server, &params, cli.output).await,
        Commands::Serve { port } => serve::start_server(port).await,
    }
}
