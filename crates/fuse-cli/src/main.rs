//! fuse CLI — render Handlebars layouts whose zones are filled by units.
//!
//! Provides three commands: `render`, `zones`, and `check`. Each one loads
//! `fuse.config.json` (or defaults) and delegates to
//! [`fuse_core::ZoneCompositor`].

mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fuse",
    about = "Compose Handlebars layouts from zoned unit templates",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to fuse.config.json (defaults are used if the file is absent)
    #[arg(long, global = true, default_value = fuse_core::config::CONFIG_FILE)]
    config: PathBuf,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a layout, expanding its zones
    Render {
        /// Layout template to render
        layout: PathBuf,

        /// Zone registry JSON (overrides `zones_file` from the config)
        #[arg(long)]
        zones: Option<PathBuf>,

        /// JSON data the layout is rendered with
        #[arg(long, short)]
        data: Option<PathBuf>,

        /// Write the page here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Request id used in log output (random if omitted)
        #[arg(long, env = "FUSE_REQUEST_ID")]
        request_id: Option<String>,
    },

    /// List zones and the units registered for them
    Zones {
        /// Zone registry JSON (overrides `zones_file` from the config)
        #[arg(long)]
        zones: Option<PathBuf>,
    },

    /// Compile every unit template (and optional layouts) to catch errors early
    Check {
        /// Zone registry JSON (overrides `zones_file` from the config)
        #[arg(long)]
        zones: Option<PathBuf>,

        /// Layout templates to compile as well
        layouts: Vec<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Render {
            layout,
            zones,
            data,
            output,
            request_id,
        } => {
            commands::render::run(
                &cli.config,
                &layout,
                zones.as_deref(),
                data.as_deref(),
                output.as_deref(),
                request_id.as_deref(),
            )?;
        }
        Commands::Zones { zones } => {
            commands::zones::run(&cli.config, zones.as_deref())?;
        }
        Commands::Check { zones, layouts } => {
            commands::check::run(&cli.config, zones.as_deref(), &layouts)?;
        }
    }

    Ok(())
}
