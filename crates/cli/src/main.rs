mod commands;
mod config;
mod logging;
mod serve;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Product traceability ledger.
#[derive(Parser)]
#[command(name = "trace", version, about = "Product traceability ledger")]
struct Cli {
    /// Path to a TOML config file (default: ./trace.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the ledger file (overrides [ledger] path)
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the empty product index on a new ledger
    Init,

    /// Invoke a contract operation as a given caller
    Invoke {
        /// Operation name: createProduct, updateProductState or query
        function: String,
        /// Positional arguments passed to the operation
        args: Vec<String>,
        /// Caller affiliation (e.g. Supplier, Retailer)
        #[arg(long, default_value = "")]
        affiliation: String,
        /// Caller permission tokens, separated by '_' or '|'
        #[arg(long)]
        permissions: Option<String>,
    },

    /// Print the committed value at a ledger key
    Query {
        /// Ledger key, e.g. product_ABC123 or productIDs
        key: String,
    },

    /// Print the lifecycle graph
    Lifecycle,

    /// Check that the product index and product records agree
    Verify,

    /// Start the HTTP API server
    Serve {
        /// Port to listen on (overrides [serve] port)
        #[arg(long)]
        port: Option<u16>,
        /// Path to TLS certificate PEM file (requires --tls-key)
        #[arg(long)]
        tls_cert: Option<PathBuf>,
        /// Path to TLS private key PEM file (requires --tls-cert)
        #[arg(long)]
        tls_key: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            report_error(&e, cli.output, cli.quiet);
            process::exit(1);
        }
    };

    let fallback_filter = match (&cli.command, cli.quiet) {
        (_, true) => "error",
        (Commands::Serve { .. }, false) => "info",
        _ => "warn",
    };
    if let Err(e) = logging::init(&config.log, fallback_filter) {
        report_error(&e, cli.output, cli.quiet);
        process::exit(1);
    }

    let ledger_path = cli.ledger.unwrap_or(config.ledger.path);

    match cli.command {
        Commands::Init => {
            commands::init::cmd_init(&ledger_path, cli.output, cli.quiet);
        }
        Commands::Invoke {
            function,
            args,
            affiliation,
            permissions,
        } => {
            commands::invoke::cmd_invoke(
                &ledger_path,
                commands::invoke::Invocation {
                    function: &function,
                    args: &args,
                    affiliation: &affiliation,
                    permissions: permissions.as_deref(),
                },
                cli.output,
                cli.quiet,
            );
        }
        Commands::Query { key } => {
            commands::query::cmd_query(&ledger_path, &key, cli.output, cli.quiet);
        }
        Commands::Lifecycle => {
            commands::lifecycle::cmd_lifecycle(cli.output);
        }
        Commands::Verify => {
            commands::verify::cmd_verify(&ledger_path, cli.output, cli.quiet);
        }
        Commands::Serve {
            port,
            tls_cert,
            tls_key,
        } => {
            // Validate TLS flags: both must be provided or neither
            if tls_cert.is_some() != tls_key.is_some() {
                report_error(
                    "error: --tls-cert and --tls-key must both be provided",
                    cli.output,
                    cli.quiet,
                );
                process::exit(1);
            }
            let options = serve::ServeOptions {
                ledger_path,
                port: port.unwrap_or(config.serve.port),
                api_key: config.serve.api_key,
                tls_cert,
                tls_key,
            };
            let result = commands::block_on(serve::start_server(options), cli.output, cli.quiet);
            if let Err(e) = result {
                report_error(&format!("server error: {}", e), cli.output, cli.quiet);
                process::exit(1);
            }
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => eprintln!("{}", serde_json::json!({ "error": msg })),
    }
}
