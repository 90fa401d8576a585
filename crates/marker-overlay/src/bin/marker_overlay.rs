//! marker-overlay CLI: replay recorded detections and inspect calibration.

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use marker_overlay::{
    FrameDriver, NullDisplay, OverlayConfig, RecordedFrame, Recording, RgbaFrame,
};
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "marker-overlay")]
#[command(about = "Place overlay objects on fiducial markers from recorded detector output")]
#[command(version)]
struct Cli {
    /// Log verbosity on stderr.
    #[arg(long, value_enum, default_value_t = LogLevelArg::Warn, global = true)]
    log_level: LogLevelArg,

    /// Emit logs through `tracing` as JSON lines instead of plain text.
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    trace_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recorded detection session through the tracker.
    Replay(ReplayArgs),

    /// Evaluate the calibration model for one marker observation.
    Calibrate(CalibrateArgs),

    /// Write the default session configuration as JSON.
    Config {
        /// Output path; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Convert a binary buffer of native detector records into a
    /// single-frame recording.
    DecodeRecords(DecodeArgs),
}

#[derive(Debug, Clone, Args)]
struct ReplayArgs {
    /// Path to the recording (JSON).
    #[arg(long)]
    recording: PathBuf,

    /// Optional session configuration (JSON). Defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print one JSON report per frame instead of the status text.
    #[arg(long)]
    json: bool,

    /// Draw a cross at each replayed marker centre.
    #[arg(long)]
    annotate: bool,

    /// Directory to write every presented frame into as PNG.
    #[cfg(feature = "image")]
    #[arg(long)]
    frames_out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct DecodeArgs {
    /// Path to the raw record buffer.
    #[arg(long)]
    input: PathBuf,

    /// Number of valid records in the buffer.
    #[arg(long)]
    count: usize,

    /// Width of the frame the records were detected in.
    #[arg(long, default_value_t = 640)]
    width: usize,

    /// Height of the frame the records were detected in.
    #[arg(long, default_value_t = 400)]
    height: usize,
}

#[derive(Debug, Clone, Args)]
struct CalibrateArgs {
    /// Optional session configuration (JSON). Defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Marker centre x in pixels.
    #[arg(long, allow_negative_numbers = true)]
    x: f64,

    /// Marker centre y in pixels.
    #[arg(long, allow_negative_numbers = true)]
    y: f64,

    /// Camera-space depth of the marker.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    depth: f64,

    /// Raw range reported by the detector.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    raw_distance: f64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevelArg {
    fn to_filter(self) -> LevelFilter {
        match self {
            Self::Off => LevelFilter::Off,
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    match cli.command {
        Commands::Replay(args) => run_replay(&args),
        Commands::Calibrate(args) => run_calibrate(&args),
        Commands::Config { out } => run_config(out.as_deref()),
        Commands::DecodeRecords(args) => run_decode_records(&args),
    }
}

#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) -> CliResult<()> {
    if cli.trace_json {
        marker_overlay::init_tracing(true)?;
        return Ok(());
    }
    marker_overlay::init_with_level(cli.log_level.to_filter())?;
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) -> CliResult<()> {
    marker_overlay::init_with_level(cli.log_level.to_filter())?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> CliResult<OverlayConfig> {
    match path {
        Some(path) => Ok(OverlayConfig::load_json(path)?),
        None => Ok(OverlayConfig::default()),
    }
}

fn run_replay(args: &ReplayArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    let recording = Recording::load_json(&args.recording)?;
    log::info!(
        "replaying {} frames from {}",
        recording.frames.len(),
        args.recording.display()
    );

    let tracker = config.headless_tracker()?;
    let (mut source, detector) = recording.split()?;
    let detector = detector.with_annotation(args.annotate);
    let mut frame = RgbaFrame::new(0, 0);

    #[cfg(feature = "image")]
    if let Some(dir) = &args.frames_out {
        let sink = marker_overlay::frames::PngSequenceSink::create(dir)?;
        let mut driver = FrameDriver::new(detector, tracker, String::new(), sink);
        let mut printer = ReportPrinter::new(args.json);
        driver.run(&mut source, &mut frame, |r| printer.print(r));
        let (_, _, _, sink) = driver.into_parts();
        if sink.failed() > 0 {
            return Err(format!("{} frames could not be written", sink.failed()).into());
        }
        return printer.finish();
    }

    let mut driver = FrameDriver::new(detector, tracker, String::new(), NullDisplay);
    let mut printer = ReportPrinter::new(args.json);
    driver.run(&mut source, &mut frame, |r| printer.print(r));
    printer.finish()
}

/// Prints reports as they arrive and remembers the first serialization error.
struct ReportPrinter {
    json: bool,
    error: Option<serde_json::Error>,
}

impl ReportPrinter {
    fn new(json: bool) -> Self {
        Self { json, error: None }
    }

    fn print(&mut self, report: &marker_overlay::FrameReport) {
        if self.json {
            match serde_json::to_string(report) {
                Ok(line) => println!("{line}"),
                Err(err) => {
                    self.error.get_or_insert(err);
                }
            }
            return;
        }
        println!(
            "--- frame {} ({}/{} visible) ---",
            report.tick,
            report.update.visible_count(),
            report.update.slots.len()
        );
        println!("{}", report.update.status.trim_end());
    }

    fn finish(self) -> CliResult<()> {
        match self.error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

fn run_calibrate(args: &CalibrateArgs) -> CliResult<()> {
    let model = load_config(args.config.as_deref())?.calibration_model()?;
    let offset = model.screen_offset(args.x, args.y);
    let report = serde_json::json!({
        "screen_offset": [offset.x, offset.y],
        "visual_scale": model.visual_scale(args.depth),
        "calibrated_distance": model.calibrated_distance(args.raw_distance),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_config(out: Option<&Path>) -> CliResult<()> {
    let config = OverlayConfig::default();
    match out {
        Some(path) => {
            config.write_json(path)?;
            log::info!("wrote {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(())
}

fn run_decode_records(args: &DecodeArgs) -> CliResult<()> {
    let bytes = std::fs::read(&args.input)?;
    let frame = RecordedFrame::from_raw(args.width, args.height, &bytes, args.count)?;
    if frame.detections.len() < args.count {
        log::warn!(
            "buffer holds {} records, fewer than the requested {}",
            frame.detections.len(),
            args.count
        );
    }
    let recording = Recording {
        frames: vec![frame],
    };
    println!("{}", serde_json::to_string_pretty(&recording)?);
    Ok(())
}
