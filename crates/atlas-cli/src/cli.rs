use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "atlas",
    about = "Atlas viewer core: acquire, inspect, and serve 3D model bundles",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Host configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve the command endpoint over HTTP
    Serve(ServeArgs),
    /// Read commands from stdin, write responses and progress to stdout
    Stdio,
    /// Acquire one asset and print its summary
    Load(LoadArgs),
    /// Acquire every asset in a model bundle
    Batch(BatchArgs),
    /// Parse a color table file
    Colors(ColorsArgs),
    /// Show a bundle's manifest scope without decoding assets
    Inspect(InspectArgs),
    /// Build a bundle from a directory tree
    Pack(PackArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Overrides the configured bind address
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args)]
pub struct PositionArgs {
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub x: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub y: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub z: f64,
    /// Uniform scale
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,
}

#[derive(Args)]
pub struct LoadArgs {
    /// `http://` URL, `file://` URL, or local path
    pub url: String,
    #[arg(long)]
    pub id: String,
    #[command(flatten)]
    pub position: PositionArgs,
}

#[derive(Args)]
pub struct BatchArgs {
    pub url: String,
    #[command(flatten)]
    pub position: PositionArgs,
}

#[derive(Args)]
pub struct ColorsArgs {
    pub path: PathBuf,
}

#[derive(Args)]
pub struct InspectArgs {
    pub path: PathBuf,
}

#[derive(Args)]
pub struct PackArgs {
    /// Directory whose files become bundle entries
    pub dir: PathBuf,
    #[arg(short, long)]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_load_with_position() {
        let cli = Cli::try_parse_from([
            "atlas", "load", "http://cdn/a.glb", "--id", "a", "--x", "-2.5", "--scale", "2",
        ])
        .unwrap();
        let Command::Load(args) = cli.command else {
            panic!("expected load");
        };
        assert_eq!(args.id, "a");
        assert_eq!(args.position.x, -2.5);
        assert_eq!(args.position.scale, 2.0);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["atlas", "stdio", "--verbose", "--config", "a.toml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("a.toml")));
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn load_requires_id() {
        assert!(Cli::try_parse_from(["atlas", "load", "x.glb"]).is_err());
    }
}
