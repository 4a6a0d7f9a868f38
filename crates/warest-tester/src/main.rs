mod values;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process,
    sync::Arc,
};

use anyhow::{Context, anyhow};
use clap::{ArgGroup, Parser, Subcommand};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::runtime::Builder;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use warest_action::catalog::{self, OPERATIONS};
use warest_action::{ActionInvocation, compile_with_binary};
use warest_common::{Credentials, HeaderList, WarestError};
use warest_trigger::{HmacAlgorithm, TriggerConfig, WarestTrigger, WebhookRequest};

use crate::values::Values;

#[derive(Parser)]
#[command(name = "warest-tester")]
#[command(about = "Drive the WARest action and trigger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every resource:operation pair.
    Operations {
        #[arg(long)]
        resource: Option<String>,
    },
    /// Print the request an operation compiles to without sending it.
    Compile {
        #[arg(long)]
        resource: String,
        #[arg(long)]
        operation: String,
        #[arg(long, value_name = "VALUES_JSON")]
        values: PathBuf,
    },
    Send {
        #[arg(long)]
        resource: String,
        #[arg(long)]
        operation: String,
        #[arg(long, value_name = "VALUES_JSON")]
        values: PathBuf,
        #[arg(long)]
        continue_on_fail: bool,
    },
    TestCredentials {
        #[arg(long, value_name = "VALUES_JSON")]
        values: PathBuf,
    },
    /// Print the X-WAREST-Signature header for a body.
    #[command(group(ArgGroup::new("payload").required(true).args(["body", "body_file"])))]
    Sign {
        #[arg(long)]
        secret: String,
        #[arg(long, default_value = "HMAC-SHA256")]
        algorithm: String,
        #[arg(long, default_value = "")]
        username: String,
        #[arg(long, group = "payload")]
        body: Option<String>,
        #[arg(long = "body-file", value_name = "BODY_FILE", group = "payload")]
        body_file: Option<PathBuf>,
    },
    /// Run one webhook request through the trigger.
    #[command(group(ArgGroup::new("payload").required(true).args(["body", "body_file"])))]
    Verify {
        #[arg(long, value_name = "TRIGGER_JSON")]
        config: PathBuf,
        #[arg(long, group = "payload")]
        body: Option<String>,
        #[arg(long = "body-file", value_name = "BODY_FILE", group = "payload")]
        body_file: Option<PathBuf>,
        #[arg(long = "header", value_name = "HEADER")]
        header: Vec<String>,
        #[arg(long, default_value = "POST")]
        method: String,
        #[arg(long)]
        now_ms: Option<i64>,
    },
    /// Serve the trigger and print every emitted item.
    Listen {
        #[arg(long, value_name = "TRIGGER_JSON")]
        config: PathBuf,
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(_) => 0,
        Err(err) => {
            if !matches!(err, CliError::Rejected(_)) {
                eprintln!("error: {err}");
            }
            err.exit_code()
        }
    };
    process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Operations { resource } => handle_operations(resource),
        Command::Compile {
            resource,
            operation,
            values,
        } => handle_compile(resource, operation, values),
        Command::Send {
            resource,
            operation,
            values,
            continue_on_fail,
        } => handle_send(resource, operation, values, continue_on_fail),
        Command::TestCredentials { values } => handle_test_credentials(values),
        Command::Sign {
            secret,
            algorithm,
            username,
            body,
            body_file,
        } => handle_sign(secret, algorithm, username, body, body_file),
        Command::Verify {
            config,
            body,
            body_file,
            header,
            method,
            now_ms,
        } => handle_verify(config, body, body_file, header, method, now_ms),
        Command::Listen { config, host, port } => handle_listen(config, host, port),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|err| CliError::Output(err.into()))?;
    println!("{text}");
    Ok(())
}

fn handle_operations(resource: Option<String>) -> Result<(), CliError> {
    if let Some(resource) = &resource
        && !catalog::resources().contains(&resource.as_str())
    {
        return Err(CliError::Usage(format!("unknown resource {resource}")));
    }
    let listed: Vec<Value> = OPERATIONS
        .iter()
        .filter(|op| resource.as_deref().is_none_or(|r| r == op.resource))
        .map(|op| json!({"key": op.key(), "method": op.method, "path": op.path}))
        .collect();
    print_json(&Value::Array(listed))
}

fn load_values(path: &Path) -> Result<Values, CliError> {
    Values::load(path).map_err(|err| CliError::ValuesLoad(path.to_path_buf(), err))
}

fn handle_compile(
    resource: String,
    operation: String,
    values_path: PathBuf,
) -> Result<(), CliError> {
    let values = load_values(&values_path)?;
    let binary = values
        .binary_data()
        .map_err(|err| CliError::ValuesLoad(values_path.clone(), err))?;
    let request = compile_with_binary(
        &resource,
        &operation,
        &values.params,
        &values.credentials_or_placeholder(),
        &binary,
    )
    .map_err(CliError::Action)?;
    let value = serde_json::to_value(&request).map_err(|err| CliError::Output(err.into()))?;
    print_json(&value)
}

fn require_credentials(values: &Values, path: &Path) -> Result<Credentials, CliError> {
    let creds = values.credentials.clone().ok_or_else(|| {
        CliError::ValuesLoad(path.to_path_buf(), anyhow!("credentials are required"))
    })?;
    creds.validate().map_err(CliError::Action)?;
    Ok(creds)
}

fn handle_send(
    resource: String,
    operation: String,
    values_path: PathBuf,
    continue_on_fail: bool,
) -> Result<(), CliError> {
    let values = load_values(&values_path)?;
    let creds = require_credentials(&values, &values_path)?;
    let mut runtime = values.runtime();
    runtime.execution.continue_on_fail |= continue_on_fail;
    let mut item = ActionInvocation::new(resource, operation, values.params.clone());
    item.binary = values
        .binary_data()
        .map_err(|err| CliError::ValuesLoad(values_path.clone(), err))?;

    let output = warest_action::execute(&[item], creds, &runtime).map_err(CliError::Action)?;
    print_json(&Value::Array(output))
}

fn handle_test_credentials(values_path: PathBuf) -> Result<(), CliError> {
    let values = load_values(&values_path)?;
    let creds = require_credentials(&values, &values_path)?;
    let runtime = values.runtime();
    let output = warest_action::test_credentials(creds, &runtime).map_err(CliError::Action)?;
    print_json(&output)
}

fn resolve_body(body: Option<String>, body_file: Option<PathBuf>) -> Result<Vec<u8>, CliError> {
    match (body, body_file) {
        (Some(text), _) => Ok(text.into_bytes()),
        (None, Some(path)) => fs::read(&path)
            .with_context(|| format!("failed to read body file {}", path.display()))
            .map_err(CliError::Body),
        (None, None) => Err(CliError::Usage("--body or --body-file is required".into())),
    }
}

fn handle_sign(
    secret: String,
    algorithm: String,
    username: String,
    body: Option<String>,
    body_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let algorithm = HmacAlgorithm::parse(&algorithm)
        .ok_or_else(|| CliError::Usage(format!("unsupported algorithm {algorithm}")))?;
    let raw = resolve_body(body, body_file)?;
    let header = warest_trigger::sign(algorithm, &secret, &username, &raw);
    println!("{header}");
    Ok(())
}

fn load_trigger(path: &Path) -> Result<WarestTrigger, CliError> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read trigger config {}", path.display()))
        .map_err(|err| CliError::ConfigLoad(path.to_path_buf(), err))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))
        .map_err(|err| CliError::ConfigLoad(path.to_path_buf(), err))?;
    let config = TriggerConfig::from_value(&value).map_err(CliError::Trigger)?;
    WarestTrigger::new(config).map_err(CliError::Trigger)
}

fn parse_header(raw: &str) -> Result<(String, String), CliError> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(CliError::Usage(format!("invalid header '{raw}', expected 'name:value'"))),
    }
}

fn handle_verify(
    config: PathBuf,
    body: Option<String>,
    body_file: Option<PathBuf>,
    header: Vec<String>,
    method: String,
    now_ms: Option<i64>,
) -> Result<(), CliError> {
    let trigger = load_trigger(&config)?;
    let raw = resolve_body(body, body_file)?;
    let headers = header
        .iter()
        .map(|h| parse_header(h))
        .collect::<Result<HeaderList, _>>()?;
    let request = WebhookRequest {
        method: method.to_ascii_uppercase(),
        headers,
        body: raw,
    };
    let outcome = match now_ms {
        Some(now) => trigger.handle(&request, now),
        None => trigger.handle_now(&request),
    };
    print_json(&json!({
        "status": outcome.status,
        "body": outcome.body,
        "emitted": outcome.emitted,
    }))?;
    if outcome.status == 200 {
        Ok(())
    } else {
        Err(CliError::Rejected(outcome.status))
    }
}

fn handle_listen(config: PathBuf, host: String, port: u16) -> Result<(), CliError> {
    let trigger = Arc::new(load_trigger(&config)?);
    let bind_addr = format!("{host}:{port}");
    let route = trigger.config().route();
    println!("listening on http://{bind_addr}{route}");

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err: io::Error| CliError::Listen(err.to_string()))?;
    runtime.block_on(async move {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(item) = rx.recv().await {
                match serde_json::to_string(&item) {
                    Ok(line) => {
                        println!("{line}");
                        io::stdout().flush().ok();
                    }
                    Err(err) => eprintln!("error: failed to encode item: {err}"),
                }
            }
        });
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|err| CliError::Listen(err.to_string()))?;
        info!(addr = %bind_addr, "warest trigger listening");
        let app = warest_trigger::server::router(trigger, tx);
        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown())
            .await
            .map_err(|err| CliError::Listen(err.to_string()))
    })
}

async fn wait_for_shutdown() {
    signal::ctrl_c().await.ok();
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("values load failed ({0}): {1}")]
    ValuesLoad(PathBuf, #[source] anyhow::Error),
    #[error("trigger config load failed ({0}): {1}")]
    ConfigLoad(PathBuf, #[source] anyhow::Error),
    #[error("body load failed: {0}")]
    Body(#[source] anyhow::Error),
    #[error("{0}")]
    Usage(String),
    #[error("action failed: {0}")]
    Action(#[source] WarestError),
    #[error("trigger setup failed: {0}")]
    Trigger(#[source] WarestError),
    #[error("webhook rejected with status {0}")]
    Rejected(u16),
    #[error("failed to write output: {0}")]
    Output(#[source] anyhow::Error),
    #[error("listen helper failure: {0}")]
    Listen(String),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::ValuesLoad(_, _) => 1,
            CliError::ConfigLoad(_, _) => 1,
            CliError::Body(_) => 1,
            CliError::Usage(_) => 2,
            CliError::Action(err) if err.is_retryable() => 4,
            CliError::Action(_) => 2,
            CliError::Trigger(_) => 2,
            CliError::Rejected(_) => 3,
            CliError::Output(_) => 6,
            CliError::Listen(_) => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_parsing() {
        assert_eq!(
            parse_header("X-WAREST-Event: call").unwrap(),
            ("X-WAREST-Event".to_string(), "call".to_string())
        );
        assert!(parse_header("novalue").is_err());
        assert!(parse_header(":x").is_err());
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(
            CliError::Action(WarestError::transport("down")).exit_code(),
            4
        );
        assert_eq!(
            CliError::Action(WarestError::validation("bad")).exit_code(),
            2
        );
        assert_eq!(CliError::Rejected(401).exit_code(), 3);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
