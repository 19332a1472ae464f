//! xeth CLI
//!
//! Entry point for the `xeth` command-line tool.

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::io::BufReader;
use std::path::PathBuf;
use std::process::{self, Command, Stdio};
use std::sync::Arc;
use xeth::config::LogConfig;
use xeth::{Config, RpcClient, StreamChannel};

#[derive(Parser)]
#[command(name = "xeth")]
#[command(about = "Call JSON-RPC 2.0 methods on a remote node", version)]
struct Cli {
    /// Path to config file (merged over ~/.config/xeth/config.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Invoke a method and print its result object
    #[command(allow_negative_numbers = true)]
    Call {
        /// Method name, e.g. eth_getBalance
        method: String,

        /// Positional params; each is parsed as JSON, otherwise sent as a string
        params: Vec<String>,

        /// Print the result on a single line
        #[arg(long)]
        compact: bool,

        /// Peer command speaking line-delimited JSON-RPC on stdin/stdout (after --)
        #[arg(last = true)]
        peer: Vec<String>,
    },

    /// Print the effective configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    let overrides = match &cli.command {
        Commands::Call { compact, peer, .. } => {
            let command = (!peer.is_empty()).then(|| peer.clone());
            let pretty = compact.then_some(false);
            json!({
                "endpoint": { "command": command },
                "output": { "pretty": pretty },
            })
        }
        Commands::Config => json!({}),
    };

    let user_path = Config::user_path();
    let config = match Config::load(user_path.as_deref(), cli.config.as_deref(), overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    };

    init_logging(&config.log);

    match cli.command {
        Commands::Call { method, params, .. } => {
            run_call(&config, &method, &params);
        }
        Commands::Config => {
            print_json(&config.to_value(), true);
        }
    }
}

fn init_logging(log: &LogConfig) {
    let env = env_logger::Env::default().default_filter_or(log.level.as_str());
    env_logger::Builder::from_env(env).init();
}

fn run_call(config: &Config, method: &str, raw_params: &[String]) {
    let params: Vec<Value> = raw_params.iter().map(|raw| parse_param(raw)).collect();

    let Some((program, args)) = config.endpoint.command.split_first() else {
        eprintln!("No peer command configured.");
        eprintln!("Pass one after `--` or set endpoint.command in the config file.");
        process::exit(1);
    };

    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            eprintln!("Failed to spawn peer '{}': {}", program, e);
            process::exit(1);
        }
    };

    let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
        eprintln!("Peer '{}' has no stdio pipes", program);
        let _ = child.kill();
        process::exit(1);
    };

    let channel = StreamChannel::with_max_line_bytes(
        BufReader::new(stdout),
        stdin,
        config.endpoint.max_line_bytes,
    );
    let client = RpcClient::new(Arc::new(channel));
    let outcome = client.call(method, &params);

    // Dropping the client closes the peer's stdin.
    drop(client);
    let _ = child.kill();
    let _ = child.wait();

    match outcome {
        Ok(result) => print_json(&Value::Object(result), config.output.pretty),
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(payload) = e.remote() {
                match serde_json::to_value(payload) {
                    Ok(value) => print_json(&value, config.output.pretty),
                    Err(err) => eprintln!("Error serializing error payload: {}", err),
                }
            }
            process::exit(e.exit_code());
        }
    }
}

/// Params that are not valid JSON are sent as strings, so `latest` works unquoted.
fn parse_param(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn print_json(value: &Value, pretty: bool) {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };

    match rendered {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}
