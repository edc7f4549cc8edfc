use clap::Parser;
use jsm_ops_adapter::{
    config::LoggingConfig,
    models::parse_params,
    AdapterConfig, AlertLifecycle, AppError, EventContext,
};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "jsm-ops-adapter")]
#[command(about = "Forward a Zabbix event to JSM Ops", long_about = None)]
struct Cli {
    /// File holding the event parameters as a JSON object (stdin when omitted)
    #[arg(short, long, value_name = "FILE", conflicts_with = "params_json")]
    params: Option<PathBuf>,

    /// Event parameters as an inline JSON object
    #[arg(long, value_name = "JSON")]
    params_json: Option<String>,

    /// Adapter settings file
    #[arg(short, long, value_name = "FILE", env = "JSM_OPS_CONFIG")]
    config: Option<PathBuf>,

    /// Print the planned operation and payload without calling the API
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AdapterConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Sending failed: {}", AppError::from(e));
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.logging);

    match run(&cli, config).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(
                error_code = e.error_code(),
                stage = e.stage(),
                error = %e,
                "Event processing failed"
            );
            eprintln!("Sending failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, config: AdapterConfig) -> Result<String, AppError> {
    let raw = match (&cli.params_json, &cli.params) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let params = parse_params(&raw)?;
    let ctx = EventContext::from_params(&params)?;

    if cli.dry_run {
        let plan = AlertLifecycle::plan(&ctx, &config)?;
        return Ok(serde_json::to_string_pretty(&plan)?);
    }

    let result = AlertLifecycle::new(&ctx, config)?.dispatch(&ctx).await?;
    Ok(serde_json::to_string(&result)?)
}

/// Install the stderr subscriber; stdout only carries the result object
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("jsm_ops_adapter={}", logging.level).into());

    let json_layer = logging
        .json
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!logging.json)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
