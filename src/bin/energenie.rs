//! energenie CLI
//!
//! Query and switch the sockets of an EnerGenie power strip.

use std::collections::BTreeMap;
use std::process;

use clap::{Parser, Subcommand};
use energenie::config::{DEFAULT_ADDRESS, DEFAULT_PASSWORD, DEFAULT_PORT};
use energenie::{Config, PowerStrip, Socket, SocketSpec, StripStatus, Transport};
use tracing_subscriber::{fmt, EnvFilter};

/// energenie CLI
#[derive(Parser, Debug)]
#[command(name = "energenie")]
#[command(about = "Control an EnerGenie networked power strip")]
#[command(version)]
#[command(after_help = "<socket-spec> is a comma-separated list of socket numbers (1 - 4),\n\
ranges, or 'all' as a short cut for 1-4.\n\n\
Example: 1,2-3 specifies sockets 1, 2, and 3.")]
struct Args {
    /// The power strip's network address
    #[arg(long, default_value = DEFAULT_ADDRESS)]
    address: String,

    /// The port used by the native protocol
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// The password used to log in
    #[arg(long, default_value = DEFAULT_PASSWORD)]
    password: String,

    /// Protocol to use: "native" or "http"
    #[arg(long, default_value = "native")]
    protocol: Transport,

    /// Connect timeout in milliseconds
    #[arg(long, default_value = "4000")]
    connect_timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the sockets' status
    Status {
        /// Sockets to show
        #[arg(default_value = "all")]
        sockets: String,
    },

    /// Turn sockets on
    On {
        /// Sockets to switch
        sockets: String,
    },

    /// Turn sockets off
    Off {
        /// Sockets to switch
        sockets: String,
    },
}

fn main() {
    // Logs go to stderr so they never mix with status output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            process::exit(usage_exit_code(&e));
        }
    };

    tracing::debug!("energenie v{}", energenie::VERSION);

    let config = Config::builder()
        .address(&args.address)
        .port(args.port)
        .password(&args.password)
        .transport(args.protocol)
        .connect_timeout_ms(args.connect_timeout_ms)
        .build();

    let client = match energenie::client::open(&config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Can't instantiate a client: {}", e);
            process::exit(1);
        }
    };

    match args.command {
        Commands::Status { sockets } => show_status(client.as_ref(), &sockets),
        Commands::On { sockets } => switch_sockets(client.as_ref(), true, &sockets),
        Commands::Off { sockets } => switch_sockets(client.as_ref(), false, &sockets),
    }
}

/// `--help` and `--version` exit 0; usage errors exit 1 like every other failure
fn usage_exit_code(error: &clap::Error) -> i32 {
    if error.use_stderr() {
        1
    } else {
        0
    }
}

fn parse_spec_or_exit(spec: &str) -> Vec<Socket> {
    match SocketSpec::parse(spec) {
        Ok(sockets) => sockets,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

fn show_status(client: &dyn PowerStrip, spec: &str) {
    let sockets = parse_spec_or_exit(spec);

    let status = match client.status() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Can't get status: {}", e);
            process::exit(1);
        }
    };

    for line in format_status(&sockets, &status) {
        println!("{}", line);
    }
}

fn switch_sockets(client: &dyn PowerStrip, on: bool, spec: &str) {
    let desired: BTreeMap<Socket, bool> = parse_spec_or_exit(spec)
        .into_iter()
        .map(|socket| (socket, on))
        .collect();

    if let Err(e) = client.switch(&desired) {
        eprintln!("Can't switch sockets: {}", e);
        process::exit(1);
    }
}

/// One line per selected socket; names are padded to a common width
fn format_status(sockets: &[Socket], status: &StripStatus) -> Vec<String> {
    let width = sockets
        .iter()
        .filter_map(|s| status.name(*s))
        .map(str::len)
        .max()
        .unwrap_or(0);

    sockets
        .iter()
        .map(|socket| {
            let state = if status.is_on(*socket) { "on" } else { "off" };
            match &status.names {
                Some(_) => {
                    let name = status.name(*socket).unwrap_or("");
                    format!("Socket {} ({:<width$}): {}", socket, name, state, width = width)
                }
                None => format!("Socket {}: {}", socket, state),
            }
        })
        .collect()
}
