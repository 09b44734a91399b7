use clap::{Parser, ValueEnum};
use gcpcheck::config::{Config, Endpoints};
use gcpcheck::gcp::resourcemanager::SearchOrganizationsRequest;
use gcpcheck::probe::{self, BILLING_PROBE, ORGANIZATIONS_PROBE, PROBE_ATTEMPTS};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Check that Google Cloud credentials from the environment work
#[derive(Parser, Debug)]
#[command(name = "gcpcheck", version, about, long_about = None)]
struct Args {
    /// Log level for diagnostics on stderr (RUST_LOG overrides)
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> Option<&'static str> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some("error"),
            LogLevel::Warn => Some("warn"),
            LogLevel::Info => Some("info"),
            LogLevel::Debug => Some("debug"),
            LogLevel::Trace => Some("trace"),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(level.as_filter()?),
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(io::stderr());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    tracing::debug!("gcpcheck {} started with log level: {:?}", gcpcheck::VERSION, level);

    Some(guard)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let mut config = Config::from_env();
    let clients = match config.load_and_validate_with(&Endpoints::from_env()).await {
        Ok(clients) => clients,
        Err(err) => {
            eprintln!("Error loading and validating config: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    println!("Config successfully loaded ✅");

    let mut stdout = io::stdout();

    // Probe failures are reported inline and never change the exit status
    if let Err(err) = probe::probe_and_print(&mut stdout, &BILLING_PROBE, PROBE_ATTEMPTS, || {
        clients.billing.list_billing_accounts()
    })
    .await
    {
        tracing::warn!("Failed to write probe output: {}", err);
    }

    let request = SearchOrganizationsRequest::default();
    if let Err(err) =
        probe::probe_and_print(&mut stdout, &ORGANIZATIONS_PROBE, PROBE_ATTEMPTS, || {
            clients.resource_manager.search_organizations(&request)
        })
        .await
    {
        tracing::warn!("Failed to write probe output: {}", err);
    }

    ExitCode::SUCCESS
}
