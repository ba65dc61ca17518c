//! canlog 命令行入口
//!
//! 网关CAN日志的解码、校验与ASC转换

use canlog_decode::FrameDecoder;
use canlog_ingest::{read_records, AscExporter, LogFormat, ProfileLoader, SchemaLoader};
use canlog_verify::{ProfileTable, RecordValidator, ReportGenerator};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "canlog", author, version, about, long_about = None)]
struct Args {
    /// Logging level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Enable verbose output (same as --log-level debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode frames into named fields (JSON)
    Decode {
        /// Lookup table (YAML or JSON)
        #[arg(short, long)]
        schema: PathBuf,
        /// Log file to decode
        #[arg(short, long)]
        input: PathBuf,
        /// Log line format: record | trace
        #[arg(short, long, default_value = "record")]
        format: LogFormat,
        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check period, heartbeat and XOR checksum per identifier
    Check {
        /// Log file to check
        #[arg(short, long)]
        input: PathBuf,
        /// Validator profiles (YAML or JSON); gateway defaults when omitted
        #[arg(short, long)]
        profiles: Option<PathBuf>,
        /// Log line format: trace | record
        #[arg(short, long, default_value = "trace")]
        format: LogFormat,
        /// Exit with a non-zero code when any issue is found
        #[arg(long)]
        strict: bool,
    },
    /// Convert a log to ASC text
    Asc {
        /// Log file to convert
        #[arg(short, long)]
        input: PathBuf,
        /// Log line format: record | trace
        #[arg(short, long, default_value = "record")]
        format: LogFormat,
        /// Write ASC here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Channel number written on every line
        #[arg(long, default_value = "1")]
        channel: u8,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level.level()
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Decode {
            schema,
            input,
            format,
            output,
        } => run_decode(&schema, &input, format, output.as_deref()),
        Command::Check {
            input,
            profiles,
            format,
            strict,
        } => {
            let clean = run_check(&input, profiles.as_deref(), format)?;
            if strict && !clean {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Asc {
            input,
            format,
            output,
            channel,
        } => run_asc(&input, format, output.as_deref(), channel),
    }
}

fn load_records(
    input: &Path,
    format: LogFormat,
) -> Result<Vec<canlog_core::RawFrameRecord>, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(input)?;
    let parser = format.parser();
    let result = read_records(parser.as_ref(), &text);
    if !result.issues.is_empty() {
        warn!(
            "skipped {} malformed line(s) in {}",
            result.issues.len(),
            input.display()
        );
    }
    info!(
        "read {} {} record(s) from {}",
        result.records.len(),
        format,
        input.display()
    );
    Ok(result.into_records())
}

fn write_output(output: Option<&Path>, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            info!("wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn run_decode(
    schema: &Path,
    input: &Path,
    format: LogFormat,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let schema = SchemaLoader::load(schema)?;
    let records = load_records(input, format)?;

    let outcome = FrameDecoder::new(&schema).decode_all(&records);
    for (timestamp, identifier) in &outcome.unknown {
        info!("unknown identifier 0x{identifier:X} at {timestamp}ms");
    }
    info!(
        "decoded {} of {} frame(s), {} unknown, {} failed",
        outcome.frames.len(),
        outcome.total(),
        outcome.unknown.len(),
        outcome.failures.len()
    );

    let mut json = serde_json::to_string_pretty(&outcome.frames)?;
    json.push('\n');
    write_output(output, &json)
}

/// 返回是否没有发现任何问题
fn run_check(
    input: &Path,
    profiles: Option<&Path>,
    format: LogFormat,
) -> Result<bool, Box<dyn std::error::Error>> {
    let profiles = match profiles {
        Some(path) => ProfileLoader::load(path)?,
        None => ProfileTable::gateway_defaults(),
    };
    let records = load_records(input, format)?;

    let report = RecordValidator::new(profiles).run(&records);
    print!("{}", ReportGenerator::default().generate_report(&report));
    Ok(report.is_clean())
}

fn run_asc(
    input: &Path,
    format: LogFormat,
    output: Option<&Path>,
    channel: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let records = load_records(input, format)?;
    let text = AscExporter::new(channel).export(&records);
    write_output(output, &text)
}
