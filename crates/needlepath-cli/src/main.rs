//! needlepath - satin column synthesis and auto-routing for embroidery
//!
//! Usage:
//!   needlepath params                          List embroidery parameters
//!   needlepath satin <svg> [-f json|svg]       Generate satin stitches
//!   needlepath split <svg> --at <f|x,y>        Split a satin column in two
//!   needlepath route <svg> [--preserve-order]  Plan one path through every region
//!
//! Logging goes to stderr; set `RUST_LOG` or pass `-v` for more.

mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cli::OutputFormat;

#[derive(Parser)]
#[command(name = "needlepath", version, about, long_about = None)]
struct Cli {
    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML file with a `defaults:` map of parameter values
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every parameter with its type, default and unit
    Params,

    /// Generate stitches for every satin column in an SVG
    Satin {
        /// Input SVG (`-` for stdin)
        svg: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Split a satin column at a fraction of its length or near a point
    Split {
        /// Input SVG (`-` for stdin)
        svg: String,

        /// Fraction in 0..1, or a point as `x,y`
        #[arg(long)]
        at: String,

        /// Which satin to split (default: the first)
        #[arg(long)]
        id: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Svg)]
        format: OutputFormat,
    },

    /// Order every path in an SVG into one route with minimal jumps
    Route {
        /// Input SVG (`-` for stdin)
        svg: String,

        /// Sew regions in document order
        #[arg(long)]
        preserve_order: bool,

        /// Start near this point (`x,y`)
        #[arg(long)]
        start: Option<String>,

        /// End near this point (`x,y`)
        #[arg(long)]
        end: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli::Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Params => cli::cmd_params(),
        Command::Satin { svg, output, format } => cli::cmd_satin(&svg, output.as_deref(), format, &config),
        Command::Split { svg, at, id, output, format } => {
            cli::cmd_split(&svg, &at, id.as_deref(), output.as_deref(), format, &config)
        }
        Command::Route { svg, preserve_order, start, end, output, format } => {
            let options = cli::RouteOptions {
                preserve_order,
                start: start.as_deref().map(cli::parse_point_arg).transpose()?,
                end: end.as_deref().map(cli::parse_point_arg).transpose()?,
            };
            cli::cmd_route(&svg, &options, output.as_deref(), format, &config)
        }
    }
}
