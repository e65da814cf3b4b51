//! Relay server binary
//!
//! Parses flags (with `DRUMHUD_*` environment fallbacks), optionally loads a
//! project document, and runs the relay until Ctrl-C.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process::exit;

use tracing_subscriber::EnvFilter;

use drumhud_relay::{RelayServer, ServerConfig};

const USAGE: &str = "\
drumhud-relay - DAW transport-state relay server

USAGE:
    drumhud-relay [OPTIONS]

OPTIONS:
    --project <PATH>    Project JSON to serve (env: DRUMHUD_PROJECT)
    --host <HOST>       Bind host, default 0.0.0.0 (env: DRUMHUD_HOST)
    --port <PORT>       Bind port, default 8765 (env: DRUMHUD_PORT)
    --help              Print this help
";

struct Args {
    project: Option<PathBuf>,
    host: String,
    port: u16,
}

fn parse_args() -> Args {
    let mut project = std::env::var("DRUMHUD_PROJECT").ok().map(PathBuf::from);
    let mut host = std::env::var("DRUMHUD_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let mut port = match std::env::var("DRUMHUD_PORT") {
        Ok(v) => match v.parse() {
            Ok(p) => p,
            Err(_) => {
                eprintln!("DRUMHUD_PORT is not a valid port: {v}");
                exit(2);
            }
        },
        Err(_) => 8765,
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--project" => project = Some(PathBuf::from(expect_value(&mut args, "--project"))),
            "--host" => host = expect_value(&mut args, "--host"),
            "--port" => {
                let value = expect_value(&mut args, "--port");
                port = match value.parse() {
                    Ok(p) => p,
                    Err(_) => {
                        eprintln!("--port is not a valid port: {value}");
                        exit(2);
                    }
                };
            }
            "--help" | "-h" => {
                print!("{USAGE}");
                exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}\n\n{USAGE}");
                exit(2);
            }
        }
    }

    Args {
        project,
        host,
        port,
    }
}

fn expect_value(args: &mut impl Iterator<Item = String>, flag: &str) -> String {
    match args.next() {
        Some(value) => value,
        None => {
            eprintln!("{flag} requires a value\n\n{USAGE}");
            exit(2);
        }
    }
}

/// Resolve a bind host to an address; accepts IPv4 and IPv6 literals plus
/// the `localhost` shorthand.
fn resolve_bind_addr(host: &str, port: u16) -> Option<SocketAddr> {
    let host = if host == "localhost" {
        "127.0.0.1"
    } else {
        host
    };
    host.parse::<IpAddr>()
        .ok()
        .map(|ip| SocketAddr::new(ip, port))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("drumhud_relay=info")),
        )
        .init();

    let args = parse_args();

    let bind_addr = match resolve_bind_addr(&args.host, args.port) {
        Some(addr) => addr,
        None => {
            eprintln!("Invalid bind host: {}", args.host);
            exit(2);
        }
    };

    let mut config = ServerConfig::with_addr(bind_addr);
    if let Some(path) = args.project {
        config = config.project(path);
    } else {
        tracing::warn!("No project configured; GET /api/project will report not loaded");
    }

    let server = match RelayServer::from_config(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load project");
            exit(1);
        }
    };

    if let Err(e) = server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    {
        tracing::error!(error = %e, "Server error");
        exit(1);
    }
}
