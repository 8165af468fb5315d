//! partybox - terminal host for the lucky draw and category mixer
//!
//! ```text
//! partybox draw --participants FILE [--count N] [--duration SECS] [--config FILE]
//! partybox mix --library FILE [--config FILE]
//! ```
//!
//! Set RUST_LOG=debug for verbose engine output.

mod draw_cmd;
mod mix_cmd;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use partybox_core::config::{default_config_path, load_config, PartyConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Interval at which the engines are ticked
pub(crate) const FRAME_INTERVAL: Duration = Duration::from_millis(16);

const USAGE: &str = "\
Usage:
  partybox draw --participants FILE [--count N] [--duration SECS] [--config FILE]
  partybox mix --library FILE [--config FILE]";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DrawArgs {
    pub participants: PathBuf,
    pub count: Option<usize>,
    pub duration: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MixArgs {
    pub library: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Draw(DrawArgs),
    Mix(MixArgs),
    Help,
}

#[derive(Debug, Clone, PartialEq)]
struct Cli {
    command: Command,
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_args(&args)?;
    if cli.command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config_path = cli
        .config
        .unwrap_or_else(|| default_config_path("config.yaml"));
    let config: PartyConfig = load_config(&config_path);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    runtime.block_on(async move {
        match cli.command {
            Command::Draw(args) => draw_cmd::run(args, &config).await,
            Command::Mix(args) => mix_cmd::run(args, &config).await,
            Command::Help => Ok(()),
        }
    })
}

fn parse_args(args: &[String]) -> Result<Cli> {
    let Some(sub) = args.first() else {
        return Ok(Cli {
            command: Command::Help,
            config: None,
        });
    };

    let mut config = None;
    let mut participants = None;
    let mut count = None;
    let mut duration = None;
    let mut library = None;

    let mut rest = args[1..].iter();
    while let Some(flag) = rest.next() {
        let mut value = || {
            rest.next()
                .cloned()
                .with_context(|| format!("{} needs a value", flag))
        };
        match flag.as_str() {
            "--config" => config = Some(PathBuf::from(value()?)),
            "--participants" => participants = Some(PathBuf::from(value()?)),
            "--library" => library = Some(PathBuf::from(value()?)),
            "--count" => {
                let raw = value()?;
                count = Some(raw.parse::<usize>().with_context(|| format!("Invalid --count '{}'", raw))?);
            }
            "--duration" => {
                let raw = value()?;
                let secs = raw
                    .parse::<f64>()
                    .with_context(|| format!("Invalid --duration '{}'", raw))?;
                if !secs.is_finite() || secs <= 0.0 {
                    bail!("--duration must be a positive number of seconds");
                }
                duration = Some(Duration::from_secs_f64(secs));
            }
            "-h" | "--help" => {
                return Ok(Cli {
                    command: Command::Help,
                    config,
                })
            }
            other => bail!("Unknown argument '{}'\n{}", other, USAGE),
        }
    }

    let command = match sub.as_str() {
        "draw" => Command::Draw(DrawArgs {
            participants: participants.context("draw needs --participants FILE")?,
            count,
            duration,
        }),
        "mix" => Command::Mix(MixArgs {
            library: library.context("mix needs --library FILE")?,
        }),
        "help" | "-h" | "--help" => Command::Help,
        other => bail!("Unknown command '{}'\n{}", other, USAGE),
    };
    Ok(Cli { command, config })
}

/// Forward stdin lines into a channel; the channel closes at end of input
pub(crate) fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    log::warn!("spawn_stdin_reader: Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}
