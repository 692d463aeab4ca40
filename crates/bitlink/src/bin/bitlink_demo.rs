//! # BITLINK Demo Host
//!
//! Runs one demo host against a remote peer.
//!
//! ## Usage
//!
//! ```bash
//! # Terminal 1: echo server on the well-known port
//! bitlink_demo --mode echo --port 55056 --remote 127.0.0.1:55057
//!
//! # Terminal 2: send the sample stream and verify the echo
//! bitlink_demo --mode stream --port 55057 --remote 127.0.0.1:55056
//! ```

use bitlink::demo::{EchoResponder, StreamVerifier, TikTakCaller, TikTakResponder, DEMO_PORT};
use bitlink::{
    DatagramTransport, ExclusiveSession, FrameHandler, HostResult, HostRunner, RunOutcome,
    TransportConfig,
};
use std::process::ExitCode;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Demo to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    TikTak,
    Tik,
    Stream,
    Echo,
}

impl Mode {
    fn parse(text: &str) -> Option<Self> {
        match text {
            "tiktak" => Some(Self::TikTak),
            "tik" => Some(Self::Tik),
            "stream" => Some(Self::Stream),
            "echo" => Some(Self::Echo),
            _ => None,
        }
    }
}

/// Parsed command line.
struct Options {
    mode: Mode,
    remote_host: String,
    remote_port: u16,
    local_port: u16,
    config_path: Option<String>,
    frame_rate: u32,
    duration_secs: Option<u64>,
    count: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            mode: Mode::TikTak,
            remote_host: "127.0.0.1".to_string(),
            remote_port: DEMO_PORT,
            local_port: 0,
            config_path: None,
            frame_rate: 60,
            duration_secs: None,
            count: None,
        }
    }
}

fn print_help() {
    println!("Usage: bitlink_demo [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -m, --mode <MODE>          tiktak | tik | stream | echo (default: tiktak)");
    println!("  -r, --remote <HOST:PORT>   Remote endpoint (default: 127.0.0.1:{DEMO_PORT})");
    println!("  -p, --port <PORT>          Local UDP port, 0 = ephemeral (default: 0)");
    println!("  -c, --config <FILE>        Load transport settings from TOML");
    println!("  -f, --frame-rate <HZ>      Host frame rate (default: 60)");
    println!("  -d, --duration <SECS>      Stop after N seconds");
    println!("  -n, --count <NUM>          Stop after N replies/echoes");
    println!("  -h, --help                 Show this help");
}

/// Parses arguments. Returns `None` if help was requested.
fn parse_args(args: &[String]) -> Option<Options> {
    let mut options = Options::default();

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--mode" | "-m" => {
                if let Some(mode) = value.and_then(|v| Mode::parse(v)) {
                    options.mode = mode;
                }
                i += 1;
            }
            "--remote" | "-r" => {
                if let Some((host, port)) = value.and_then(|v| v.rsplit_once(':')) {
                    options.remote_host = host.trim_matches(|c| c == '[' || c == ']').to_string();
                    options.remote_port = port.parse().unwrap_or(DEMO_PORT);
                }
                i += 1;
            }
            "--port" | "-p" => {
                options.local_port = value.and_then(|v| v.parse().ok()).unwrap_or(0);
                i += 1;
            }
            "--config" | "-c" => {
                options.config_path = value.cloned();
                i += 1;
            }
            "--frame-rate" | "-f" => {
                options.frame_rate = value.and_then(|v| v.parse().ok()).unwrap_or(60);
                i += 1;
            }
            "--duration" | "-d" => {
                options.duration_secs = value.and_then(|v| v.parse().ok());
                i += 1;
            }
            "--count" | "-n" => {
                options.count = value.and_then(|v| v.parse().ok());
                i += 1;
            }
            "--help" | "-h" => return None,
            _ => {}
        }
        i += 1;
    }

    Some(options)
}

fn transport_config(options: &Options) -> HostResult<TransportConfig> {
    if let Some(path) = &options.config_path {
        let config = TransportConfig::load(path)?;
        return Ok(match options.local_port {
            0 => config,
            port => config.with_local_port(port),
        });
    }
    Ok(TransportConfig::resolve(&options.remote_host, options.remote_port)?
        .with_local_port(options.local_port))
}

fn run_handler<H: FrameHandler>(runner: &mut HostRunner<'_>, mut handler: H) -> HostResult<RunOutcome> {
    runner.run(&mut handler)
}

fn run(options: &Options) -> HostResult<RunOutcome> {
    let config = transport_config(options)?;

    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Mode:               {:?}", options.mode);
    println!("│ Remote:             {}", config.remote_addr);
    println!("│ Local Port:         {}", config.local_port);
    println!("│ Frame Rate:         {} Hz", options.frame_rate);
    match options.duration_secs {
        Some(d) => println!("│ Duration:           {d} seconds"),
        None => println!("│ Duration:           until done"),
    }
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let transport = DatagramTransport::new(config.clone());
    transport.initialize(0)?;

    let mut runner =
        HostRunner::new(&transport, ExclusiveSession::new()).with_frame_rate(options.frame_rate);
    if let Some(secs) = options.duration_secs {
        runner = runner.with_time_limit(Duration::from_secs(secs));
    }

    let outcome = match (options.mode, options.count) {
        (Mode::TikTak, Some(n)) => run_handler(&mut runner, TikTakResponder::with_limit(n)),
        (Mode::TikTak, None) => run_handler(&mut runner, TikTakResponder::new()),
        (Mode::Tik, n) => run_handler(&mut runner, TikTakCaller::new(30, n.unwrap_or(1))),
        (Mode::Stream, _) => run_handler(&mut runner, StreamVerifier::new()),
        (Mode::Echo, Some(n)) => run_handler(&mut runner, EchoResponder::with_limit(n)),
        (Mode::Echo, None) => run_handler(&mut runner, EchoResponder::new()),
    };

    let stats = transport.stats();
    transport.shutdown();

    println!("┌─ TRANSPORT ─────────────────────────────────────────────────────┐");
    println!("│ Datagrams Sent:     {:>10}", stats.datagrams_sent);
    println!("│ Datagrams Received: {:>10}", stats.datagrams_received);
    println!("│ Bytes Sent:         {:>10}", stats.bytes_sent);
    println!("│ Bytes Received:     {:>10}", stats.bytes_received);
    println!("│ Send Errors:        {:>10}", stats.send_errors);
    println!("└──────────────────────────────────────────────────────────────────┘");

    outcome
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         BITLINK DEMO HOST                                        ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let args: Vec<String> = std::env::args().collect();
    let Some(options) = parse_args(&args) else {
        print_help();
        return ExitCode::SUCCESS;
    };

    match run(&options) {
        Ok(outcome) => {
            println!();
            println!("Frames:             {}", outcome.frames);
            println!("Avg Frame Time:     {} μs", outcome.stats.avg_frame_us());
            println!("Late Frames:        {}", outcome.stats.late_frames);
            println!("Skipped Frames:     {}", outcome.stats.skipped_frames);
            if outcome.completed {
                println!("Result:             done");
                ExitCode::SUCCESS
            } else {
                println!("Result:             stopped before completion");
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!(error = %e, "demo host failed");
            ExitCode::FAILURE
        }
    }
}
