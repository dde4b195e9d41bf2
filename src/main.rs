use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use pixelboard::store::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use pixelboard::update::{DirectRequest, DirectorySource, PixelUpdateRequest};
use pixelboard::{BoardConfig, Error, GridStore, Origin, Pipeline};

#[derive(Parser, Debug)]
#[command(name = "pixelboard", version, about = "Merge pixel updates into a shared grid and render it")]
struct Cli {
    /// Grid artifact to load and save
    #[arg(long, global = true, default_value = "grid.json")]
    grid: PathBuf,

    /// Rendered pixels per cell edge
    #[arg(long, global = true, default_value_t = 20)]
    cell_size: u32,

    /// Smallest valid coordinate (0 or 1)
    #[arg(long, global = true, default_value_t = 0)]
    origin: i64,

    /// Font for coordinate labels (system fonts are searched otherwise)
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    /// Render without coordinate labels
    #[arg(long, global = true)]
    no_labels: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty grid artifact
    Init {
        #[arg(long, default_value_t = DEFAULT_WIDTH)]
        width: u32,
        #[arg(long, default_value_t = DEFAULT_HEIGHT)]
        height: u32,
        /// Replace an existing artifact
        #[arg(long)]
        force: bool,
    },
    /// Merge every *.json update in a directory, skipping bad ones
    Merge {
        #[arg(long, default_value = "pixel-updates")]
        updates: PathBuf,
        #[arg(long, default_value = "grid.png")]
        output: PathBuf,
        #[arg(long)]
        no_render: bool,
    },
    /// Apply a single update; any problem aborts without saving
    Set {
        #[arg(allow_hyphen_values = true)]
        x: String,
        #[arg(allow_hyphen_values = true)]
        y: String,
        color: String,
        #[arg(long, default_value = "grid.png")]
        output: PathBuf,
        #[arg(long)]
        no_render: bool,
    },
    /// Render the grid as it is
    Render {
        #[arg(long, default_value = "grid.png")]
        output: PathBuf,
    },
}

impl Cli {
    fn config(&self) -> anyhow::Result<BoardConfig> {
        let config = BoardConfig {
            cell_size: self.cell_size,
            origin: Origin::from_lower_bound(self.origin)?,
            labels: !self.no_labels,
            font_path: self.font.clone(),
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    fn pipeline(&self, output: &Path, no_render: bool) -> anyhow::Result<Pipeline> {
        let pipeline = Pipeline::new(self.config()?, &self.grid, output)?;
        Ok(if no_render { pipeline.without_render() } else { pipeline })
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::Init { width, height, force } => {
            GridStore::new(&cli.grid)
                .init(*width, *height, *force)
                .with_context(|| format!("initialising {}", cli.grid.display()))?;
        }
        Command::Merge { updates, output, no_render } => {
            let mut source = DirectorySource::new(updates);
            let report = cli
                .pipeline(output, *no_render)?
                .run(&mut source)
                .with_context(|| format!("merging updates from {}", updates.display()))?;
            println!(
                "Applied {} update(s), rejected {}",
                report.summary.applied,
                report.summary.rejected.len()
            );
        }
        Command::Set { x, y, color, output, no_render } => {
            let request = PixelUpdateRequest::from_args(x, y, color)?;
            cli.pipeline(output, *no_render)?
                .run(&mut DirectRequest::new(request))
                .with_context(|| format!("setting pixel ({x},{y}) to {color}"))?;
        }
        Command::Render { output } => {
            cli.pipeline(output, false)?
                .render_only()
                .with_context(|| format!("rendering {}", cli.grid.display()))?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{:#}", err);
            let code = err.downcast_ref::<Error>().map_or(1, Error::exit_code);
            ExitCode::from(code as u8)
        }
    }
}
