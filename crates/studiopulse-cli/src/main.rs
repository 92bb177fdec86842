//! CLI for studiopulse: the launch analytics wall in your terminal.

mod commands;
mod tui;

use std::time::Duration;

use clap::{Parser, Subcommand};

use commands::{parse_duration, parse_speed};

#[derive(Parser)]
#[command(name = "studiopulse")]
#[command(about = "studiopulse: simulated launch analytics dashboard")]
#[command(version = studiopulse_core::VERSION)]
struct Cli {
    /// JSON config file; any field left out keeps its built-in value
    #[arg(long, global = true)]
    config: Option<String>,

    /// RNG seed for a reproducible run (default: seeded from the OS)
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal dashboard
    Monitor {
        /// Redraw interval in milliseconds
        #[arg(long, default_value = "50")]
        refresh_ms: u64,

        /// Dashboard seconds per wall-clock second
        #[arg(long, default_value = "1.0", value_parser = parse_speed)]
        speed: f64,

        /// Directory reports are exported into (key: e)
        #[arg(long, default_value = ".")]
        export_dir: String,
    },

    /// Run the dashboard headless on a virtual clock and print a summary
    Simulate {
        /// How much dashboard time to simulate, e.g. "90s", "30m", "6h"
        #[arg(long, default_value = "1h", value_parser = parse_duration)]
        duration: Duration,

        /// Virtual clock step between pumps
        #[arg(long, default_value = "1s", value_parser = parse_duration)]
        step: Duration,

        /// Export a report into this directory when the run ends
        #[arg(long)]
        output: Option<String>,

        /// Print the final snapshot as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Write an analytics report, optionally after fast-forwarding
    Export {
        /// Directory to write the report into
        #[arg(long, default_value = ".")]
        output: String,

        /// Dashboard time to simulate before exporting
        #[arg(long, default_value = "0s", value_parser = parse_duration)]
        after: Duration,
    },

    /// Serve the live dashboard over HTTP
    Server {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value = "8042")]
        port: u16,

        /// Dashboard seconds per wall-clock second
        #[arg(long, default_value = "1.0", value_parser = parse_speed)]
        speed: f64,
    },
}

fn main() {
    let cli = Cli::parse();
    let opts = commands::GlobalOpts {
        config: cli.config.as_deref(),
        seed: cli.seed,
    };

    match cli.command {
        Commands::Monitor {
            refresh_ms,
            speed,
            export_dir,
        } => commands::monitor::run(&opts, refresh_ms, speed, &export_dir),
        Commands::Simulate {
            duration,
            step,
            output,
            json,
        } => commands::simulate::run(&opts, duration, step, output.as_deref(), json),
        Commands::Export { output, after } => commands::export::run(&opts, &output, after),
        Commands::Server { host, port, speed } => commands::server::run(&opts, &host, port, speed),
    }
}
