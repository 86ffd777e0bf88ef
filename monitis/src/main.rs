//! Monitis CLI — edit external monitors from the terminal.

mod logger;

use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use monitis_lib::{Auth, Client, EditExternalMonitorOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
#[command(name = "monitis")]
#[command(about = "Monitis CLI — edit external monitors", long_about = None)]
struct Cli {
    /// Monitis API key.
    #[arg(long, env = "MONITIS_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Secret key, used to request an auth token when none is given.
    #[arg(long, env = "MONITIS_SECRET_KEY", hide_env_values = true, global = true)]
    secret_key: Option<String>,

    /// Auth token from a previous `auth-token` call.
    #[arg(long, env = "MONITIS_AUTH_TOKEN", hide_env_values = true, global = true)]
    auth_token: Option<String>,

    /// Override the API endpoint.
    #[arg(long, env = "MONITIS_API_URL", global = true)]
    api_url: Option<String>,

    /// Log filter directives (e.g. `info`, `monitis_lib=debug`).
    #[arg(long, env = "MONITIS_LOG", default_value = "info", global = true)]
    log_level: String,

    /// Output format for printed results: plain or json.
    #[arg(short, long, default_value = "plain", value_enum, global = true)]
    output: OutputFormatArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Change settings of an existing external monitor
    Edit {
        /// Id of the monitor (test) to edit
        test_id: String,

        /// JSON file with monitor settings; flags override its values
        #[arg(long)]
        options: Option<PathBuf>,

        #[command(flatten)]
        fields: MonitorFields,
    },
    /// Exchange the API key and secret key for an auth token
    AuthToken,
    /// Show version
    Version,
}

#[derive(Args, Default)]
struct MonitorFields {
    /// Name of the test
    #[arg(long)]
    name: Option<String>,
    /// Url to test, without protocol
    #[arg(long)]
    url: Option<String>,
    /// Location id and interval pairs, e.g. 1-5,2-10
    #[arg(long = "location-ids")]
    location_id_interval_pairs: Option<String>,
    /// Check timeout (ms for ping monitors, seconds otherwise)
    #[arg(long, allow_negative_numbers = true)]
    timeout: Option<i64>,
    #[arg(long)]
    tag: Option<String>,
    /// Data sent with a POST check
    #[arg(long)]
    post_data: Option<String>,
    #[arg(long)]
    content_match_string: Option<String>,
    /// 0, 1, or 3-6; see the Monitis API docs
    #[arg(long)]
    content_match_flag: Option<i64>,
    /// Extra parameters as key1:value1;key2:value2;
    #[arg(long)]
    params: Option<String>,
    /// Minimal allowed uptime (%)
    #[arg(long)]
    uptime_sla: Option<i64>,
    /// Maximal allowed response time (seconds)
    #[arg(long)]
    response_sla: Option<i64>,
    #[arg(long)]
    basic_user_auth: Option<String>,
    #[arg(long)]
    basic_auth_pass: Option<String>,
    /// Request headers as name1:value1;name2:value2;
    #[arg(long)]
    header: Option<String>,
    #[arg(long, value_parser = BoolishValueParser::new())]
    sni: Option<bool>,
    #[arg(long = "http-1-1", value_parser = BoolishValueParser::new())]
    is_version_1_1: Option<bool>,
    #[arg(long)]
    user_agent: Option<String>,
    #[arg(long)]
    order_id: Option<i64>,
    #[arg(long = "ipv6", value_parser = BoolishValueParser::new())]
    is_ipv6: Option<bool>,
}

impl From<MonitorFields> for EditExternalMonitorOptions {
    fn from(f: MonitorFields) -> Self {
        Self {
            name: f.name,
            url: f.url,
            location_id_interval_pairs: f.location_id_interval_pairs,
            timeout: f.timeout,
            tag: f.tag,
            post_data: f.post_data,
            content_match_string: f.content_match_string,
            content_match_flag: f.content_match_flag,
            params: f.params,
            uptime_sla: f.uptime_sla,
            response_sla: f.response_sla,
            basic_user_auth: f.basic_user_auth,
            basic_auth_pass: f.basic_auth_pass,
            header: f.header,
            sni: f.sni,
            is_version_1_1: f.is_version_1_1,
            user_agent: f.user_agent,
            order_id: f.order_id,
            is_ipv6: f.is_ipv6,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Version) {
        println!("monitis {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    if let Err(e) = logger::init(&cli.log_level) {
        eprintln!("{}", error_line(&e.to_string()));
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", error_line(&e));
            ExitCode::FAILURE
        }
    }
}

/// Final failure message, printed to stderr regardless of the log filter.
fn error_line(message: &str) -> String {
    format!("Error: {}", message)
}

async fn run(cli: Cli) -> Result<(), String> {
    let mut client = Client::new().map_err(|e| e.to_string())?;
    if let Some(api_url) = non_empty(cli.api_url.clone()) {
        client = client.with_api_base(api_url);
    }

    match cli.command {
        Commands::AuthToken => {
            let api_key = non_empty(cli.api_key).ok_or(MISSING_API_KEY)?;
            let secret_key = non_empty(cli.secret_key).ok_or(MISSING_SECRET_KEY)?;
            info!("Requesting auth token");
            let auth = client
                .get_auth_token(&api_key, &secret_key)
                .await
                .map_err(|e| e.to_string())?;
            match cli.output {
                OutputFormatArg::Plain => println!("{}", auth.auth_token),
                OutputFormatArg::Json => println!(
                    "{}",
                    serde_json::json!({ "authToken": auth.auth_token })
                ),
            }
        }
        Commands::Edit {
            test_id,
            options,
            fields,
        } => {
            if test_id.trim().is_empty() {
                return Err("test id must not be empty".to_string());
            }
            let base = match options {
                Some(path) => load_options(&path)?,
                None => EditExternalMonitorOptions::default(),
            };
            let opts = base.merge(fields.into());
            if opts.is_empty() {
                return Err(
                    "Nothing to change. Pass at least one field flag or --options <file>."
                        .to_string(),
                );
            }
            let auth = resolve_auth(&client, cli.api_key, cli.secret_key, cli.auth_token).await?;
            let params: Vec<&str> = opts.to_form().into_iter().map(|(name, _)| name).collect();
            info!(test_id = %test_id, params = params.len(), "Editing monitor");
            client
                .edit_external_monitor(&auth, &test_id, &opts)
                .await
                .map_err(|e| e.to_string())?;
            info!(test_id = %test_id, "Monitor updated");
            let printed = match cli.output {
                OutputFormatArg::Plain => format!("updated {}", test_id),
                OutputFormatArg::Json => serde_json::json!({
                    "testId": test_id,
                    "status": "ok",
                    "params": params,
                })
                .to_string(),
            };
            println!("{}", printed);
        }
        Commands::Version => {}
    }
    Ok(())
}

const MISSING_API_KEY: &str = "API key not found. Set MONITIS_API_KEY or pass --api-key.";
const MISSING_SECRET_KEY: &str =
    "Secret key not found. Set MONITIS_SECRET_KEY or pass --secret-key.";

/// Use the given auth token, or request one with the secret key.
async fn resolve_auth(
    client: &Client,
    api_key: Option<String>,
    secret_key: Option<String>,
    auth_token: Option<String>,
) -> Result<Auth, String> {
    let api_key = non_empty(api_key).ok_or(MISSING_API_KEY)?;
    if let Some(token) = non_empty(auth_token) {
        return Ok(Auth::new(api_key, token));
    }
    let secret_key = non_empty(secret_key).ok_or(
        "Auth token not found. Set MONITIS_AUTH_TOKEN, or MONITIS_SECRET_KEY to request one.",
    )?;
    info!("Requesting auth token");
    client
        .get_auth_token(&api_key, &secret_key)
        .await
        .map_err(|e| e.to_string())
}

fn load_options(path: &Path) -> Result<EditExternalMonitorOptions, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&raw).map_err(|e| format!("invalid options in {}: {}", path.display(), e))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
