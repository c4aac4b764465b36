//! # CRSF Reader
//!
//! Decode CRSF (Crossfire) frames from a capture file or a live serial port.
//!
//! Frames are printed as they are decoded, optionally captured to JSONL, and
//! a summary of the scan counters is printed on exit.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use crsf_reader::config::{Config, SourceConfig, SourceKind};
use crsf_reader::crsf::reader::FrameReader;
use crsf_reader::runner::{run, FrameFilter};
use crsf_reader::source::serial::open_serial;
use crsf_reader::source::{open_file, ByteSource, TeeSource};
use crsf_reader::telemetry::{ConsoleSink, FrameSink, JsonlLogger};

/// Byte source selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceArg {
    File,
    Serial,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::File => SourceKind::File,
            SourceArg::Serial => SourceKind::Serial,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "crsf-reader", version, about = "Decode CRSF (Crossfire) frames")]
struct Cli {
    /// TOML configuration file; flags below override its values
    #[arg(long, value_name = "FILE")]
    config: Option<String>,

    /// Byte source kind
    #[arg(long = "type", value_enum, value_name = "KIND")]
    kind: Option<SourceArg>,

    /// Capture file, or serial device (omit for serial auto-detect)
    #[arg(long)]
    path: Option<String>,

    /// Serial line speed
    #[arg(long)]
    baudrate: Option<u32>,

    /// Only show these frame types (comma separated names or hex codes)
    #[arg(long, alias = "show_types", value_delimiter = ',')]
    show_types: Vec<String>,

    /// Hide these frame types (comma separated names or hex codes)
    #[arg(long, alias = "skip_types", value_delimiter = ',')]
    skip_types: Vec<String>,

    /// Print every field of each frame on its own line
    #[arg(long, alias = "extended_view")]
    extended_view: bool,

    /// Debug level logging
    #[arg(long)]
    debug: bool,

    /// Copy every raw byte read into this file
    #[arg(long, value_name = "FILE")]
    raw_log: Option<String>,

    /// Capture decoded frames as JSONL into this directory
    #[arg(long, value_name = "DIR")]
    jsonl_dir: Option<String>,
}

impl Cli {
    /// Configuration file (or defaults) with flag overrides applied, validated
    fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::read(path)
                .with_context(|| format!("Failed to load configuration from {}", path))?,
            None => Config::default(),
        };

        if let Some(kind) = self.kind {
            config.source.kind = kind.into();
        }
        if let Some(path) = &self.path {
            config.source.path = path.clone();
        }
        if let Some(baud_rate) = self.baudrate {
            config.source.baud_rate = baud_rate;
        }
        if self.raw_log.is_some() {
            config.source.raw_log = self.raw_log.clone();
        }
        if !self.show_types.is_empty() {
            config.output.show_types = self.show_types.clone();
        }
        if !self.skip_types.is_empty() {
            config.output.skip_types = self.skip_types.clone();
        }
        if self.extended_view {
            config.output.extended_view = true;
        }
        if let Some(dir) = &self.jsonl_dir {
            config.telemetry.enabled = true;
            config.telemetry.log_dir = dir.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

/// Install the stdout subscriber; the guard must live until exit
fn init_logging(debug: bool) -> WorkerGuard {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(writer)
        .init();

    guard
}

/// Open the configured byte source, teeing raw bytes when requested
async fn open_source(config: &SourceConfig) -> Result<Box<dyn ByteSource>> {
    let source: Box<dyn ByteSource> = match config.kind {
        SourceKind::File => Box::new(open_file(&config.path).await?),
        SourceKind::Serial => {
            let (port, path) = open_serial(&config.path, config.baud_rate)?;
            info!("Reading CRSF from {}", path);
            Box::new(port)
        }
    };

    match &config.raw_log {
        Some(path) => Ok(Box::new(TeeSource::create(source, path)?)),
        None => Ok(source),
    }
}

/// Resolves on Ctrl+C; never resolves if the handler cannot be installed
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let guard = init_logging(cli.debug);

    info!("CRSF Reader v{} starting...", env!("CARGO_PKG_VERSION"));
    debug!("Cli args: {:?}", cli);

    let config = cli.resolve_config()?;
    let filter = FrameFilter::from_names(&config.output.show_types, &config.output.skip_types)?;

    let source = open_source(&config.source).await?;
    let mut reader = FrameReader::new(source).with_max_frame_length(config.max_frame_length());

    let mut sinks: Vec<Box<dyn FrameSink>> =
        vec![Box::new(ConsoleSink::new(config.output.extended_view))];
    if config.telemetry.enabled {
        sinks.push(Box::new(JsonlLogger::new(
            &config.telemetry.log_dir,
            config.telemetry.max_records_per_file,
            config.telemetry.max_files_to_keep,
        )?));
    }

    info!("Press Ctrl+C to exit");
    let result = run(&mut reader, &filter, &mut sinks, ctrl_c()).await;

    // Flush pending log lines before the summary
    drop(guard);
    println!("{}", reader.stats());

    result?;
    Ok(())
}
