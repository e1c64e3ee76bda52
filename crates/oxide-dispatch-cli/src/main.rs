//! oxide-dispatch CLI
//!
//! A small transport in front of the bookstore route table: dispatches
//! requests given on the command line or read from stdin.

mod bookstore;
mod response;

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{Level, debug, info, warn};
use tracing_subscriber::FmtSubscriber;

use oxide_dispatch::{DispatchPolicy, Dispatcher, DispatcherConfig, RequestDescriptor};

use crate::bookstore::Store;
use crate::response::{Response, ResponseWriter};

/// Dispatch requests against a demo bookstore route table.
#[derive(Parser)]
#[command(name = "oxide-dispatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Dispatcher configuration file (JSON).
    #[arg(short, long, env = "OXIDE_DISPATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Match policy; overrides the configuration file.
    #[arg(short, long, value_enum)]
    policy: Option<PolicyArg>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the route table in registration order.
    Routes,

    /// Dispatch a single request.
    Dispatch {
        /// Request method, e.g. GET.
        method: String,

        /// Request target: a path with an optional query string.
        target: String,
    },

    /// Dispatch `METHOD TARGET` lines read from stdin.
    Serve,

    /// Print the path of a named route.
    Url {
        /// Route name.
        name: String,

        /// Variable values as `name=value`.
        values: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Every matching route fires.
    FireAll,
    /// Only the first matching route fires.
    FirstMatch,
}

impl From<PolicyArg> for DispatchPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::FireAll => Self::FireAll,
            PolicyArg::FirstMatch => Self::FirstMatch,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(cli.config.as_deref(), cli.policy)?;
    let dispatcher = Dispatcher::new(bookstore::routes()?, config);
    let store = Store::seeded();

    match cli.command {
        Commands::Routes => {
            println!("{:<8} {:<24} {:<16} {:<28} NAME", "VERB", "TEMPLATE", "VARIABLES", "PARAMS");
            println!("{:-<84}", "");
            for route in dispatcher.registry().routes() {
                let params = route
                    .plan()
                    .entries()
                    .map(|(name, source)| format!("{name}:{source:?}"))
                    .collect::<Vec<_>>()
                    .join(",");
                println!(
                    "{:<8} {:<24} {:<16} {:<28} {}",
                    route.verb(),
                    route.pattern().template(),
                    route.pattern().variables().join(","),
                    params,
                    route.name().unwrap_or("-"),
                );
            }
        }

        Commands::Dispatch { method, target } => {
            let stdout = io::stdout();
            let mut writer = ResponseWriter::new(stdout.lock());
            handle(&dispatcher, &store, &method, &target, &mut writer)?;
        }

        Commands::Serve => {
            info!("Reading requests from stdin, one `METHOD TARGET` per line.");
            let stdout = io::stdout();
            let mut writer = ResponseWriter::new(stdout.lock());
            for line in io::stdin().lock().lines() {
                let line = line?;
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let mut parts = line.split_whitespace();
                let (Some(method), Some(target), None) = (parts.next(), parts.next(), parts.next())
                else {
                    warn!(line, "expected `METHOD TARGET`");
                    continue;
                };
                handle(&dispatcher, &store, method, target, &mut writer)?;
            }
            info!(responses = writer.written(), "stdin closed");
        }

        Commands::Url { name, values } => {
            let values = parse_values(&values)?;
            match dispatcher.registry().url_for(&name, &values) {
                Some(path) => println!("{path}"),
                None => bail!("no route named {name:?}, or a variable has no value"),
            }
        }
    }

    Ok(())
}

/// Reads the configuration file, if any, then applies the command-line policy.
fn load_config(path: Option<&Path>, policy: Option<PolicyArg>) -> anyhow::Result<DispatcherConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            DispatcherConfig::from_json(&raw)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => DispatcherConfig::default(),
    };
    if let Some(policy) = policy {
        config.policy = policy.into();
    }
    debug!(?config, "dispatcher configuration");
    Ok(config)
}

/// Dispatches one request and writes its responses. Answers 405 or 404 when
/// nothing fired. Fails on the first write error.
fn handle<W: Write>(
    dispatcher: &Dispatcher<Store, Response>,
    store: &Store,
    method: &str,
    target: &str,
    writer: &mut ResponseWriter<W>,
) -> anyhow::Result<()> {
    let req = RequestDescriptor::from_target(method, target);
    let fired = dispatcher.dispatch(&req, store, writer);
    if let Some(e) = writer.take_error() {
        return Err(e).context("writing response");
    }
    if !fired {
        let allowed = dispatcher.allowed_verbs(&req.path);
        let res = if allowed.is_empty() {
            Response::not_found()
        } else {
            Response::method_not_allowed(&allowed)
        };
        writer.write(&res)?;
    }
    Ok(())
}

fn parse_values(values: &[String]) -> anyhow::Result<HashMap<String, String>> {
    values
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => Ok((key.to_string(), value.to_string())),
            None => bail!("expected name=value, got {pair:?}"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_policy_override() {
        let config = load_config(None, Some(PolicyArg::FirstMatch)).unwrap();
        assert_eq!(config.policy, DispatchPolicy::FirstMatch);

        let config = load_config(None, None).unwrap();
        assert_eq!(config.policy, DispatchPolicy::FireAll);
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config(Some(Path::new("/nonexistent/dispatch.json")), None).is_err());
    }

    #[test]
    fn test_parse_values() {
        let values = parse_values(&["id=7".to_string()]).unwrap();
        assert_eq!(values.get("id").map(String::as_str), Some("7"));
        assert!(parse_values(&["id".to_string()]).is_err());
    }

    #[test]
    fn test_handle_not_found_and_not_allowed() {
        let dispatcher = Dispatcher::new(bookstore::routes().unwrap(), DispatcherConfig::default());
        let store = Store::seeded();

        let mut writer = ResponseWriter::new(Vec::new());
        handle(&dispatcher, &store, "PUT", "/books/1", &mut writer).unwrap();
        handle(&dispatcher, &store, "GET", "/nowhere", &mut writer).unwrap();

        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert!(out.starts_with("405 Method Not Allowed\nAllow: GET, DELETE\n"));
        assert!(out.contains("404 Not Found"));
    }

    struct ClosedStdout;

    impl Write for ClosedStdout {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_handle_fails_on_broken_output() {
        let dispatcher = Dispatcher::new(bookstore::routes().unwrap(), DispatcherConfig::default());
        let store = Store::seeded();

        let mut writer = ResponseWriter::new(ClosedStdout);
        let err = handle(&dispatcher, &store, "GET", "/books/1", &mut writer).unwrap_err();
        let io_err = err.downcast_ref::<io::Error>().unwrap();
        assert_eq!(io_err.kind(), io::ErrorKind::BrokenPipe);
        assert!(writer.take_error().is_none());

        assert!(handle(&dispatcher, &store, "GET", "/nowhere", &mut writer).is_err());
        assert_eq!(writer.written(), 0);
    }
}
