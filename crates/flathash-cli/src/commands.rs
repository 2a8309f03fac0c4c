use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use flathash_hint::Value;
use flathash_mapper::{FlatHashMapper, FlatRecord, MapperConfig};
use flathash_path::{PathKey, Segment};
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mapper = build_mapper(&cli)?;
    match cli.command {
        Command::Flatten(args) => cmd_flatten(&mapper, args, cli.format),
        Command::Unflatten(args) => cmd_unflatten(&mapper, args, cli.format),
        Command::ParseKey(args) => cmd_parse_key(args),
    }
}

fn build_mapper(cli: &Cli) -> anyhow::Result<FlatHashMapper> {
    let mut config = match &cli.config {
        Some(path) => MapperConfig::load(path)?,
        None => MapperConfig::default(),
    };
    if let Some(mode) = cli.mode {
        config.type_hinting = mode.into();
    }
    debug!(mode = %config.type_hinting, max_depth = config.max_depth, "mapper configured");
    Ok(FlatHashMapper::new(config))
}

fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading stdin")?;
            Ok(text)
        }
    }
}

fn cmd_flatten(
    mapper: &FlatHashMapper,
    args: FlattenArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let text = read_input(args.file.as_deref())?;
    let json: serde_json::Value = serde_json::from_str(&text).context("parsing JSON input")?;
    let record = mapper.to_hash(&Value::from_json(json))?;
    print!("{}", render_record(&record, format)?);
    Ok(())
}

fn cmd_unflatten(
    mapper: &FlatHashMapper,
    args: UnflattenArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let text = read_input(args.file.as_deref())?;
    let record = parse_record(&text, format)?;
    let value: Value = mapper.from_hash(&record)?;
    println!("{}", serde_json::to_string_pretty(&value.to_json()?)?);
    Ok(())
}

fn cmd_parse_key(args: ParseKeyArgs) -> anyhow::Result<()> {
    let key = PathKey::parse(&args.key)?;
    if key.is_root() {
        println!("{}", "(root)".dimmed());
    }
    for (depth, segment) in key.segments().iter().enumerate() {
        match segment {
            Segment::Field(name) => println!("{depth:>3}  {}  {name}", "field".cyan()),
            Segment::Index(index) => println!("{depth:>3}  {}  {index}", "index".yellow()),
            Segment::Hint => println!("{depth:>3}  {}", "hint".green().bold()),
        }
    }
    Ok(())
}

/// Writes a record in the requested format. Values that are not UTF-8 are
/// replaced lossily in text output.
fn render_record(record: &FlatRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(record
            .iter()
            .map(|(key, value)| format!("{key}={}\n", String::from_utf8_lossy(value)))
            .collect()),
        OutputFormat::Json => {
            let object: serde_json::Map<String, serde_json::Value> = record
                .iter()
                .map(|(key, value)| {
                    let text = String::from_utf8_lossy(value).into_owned();
                    (key.clone(), serde_json::Value::String(text))
                })
                .collect();
            Ok(format!("{}\n", serde_json::to_string_pretty(&object)?))
        }
    }
}

/// Reads a record. In text form each non-blank line is split at its first
/// `=`, so keys must not contain one.
fn parse_record(text: &str, format: OutputFormat) -> anyhow::Result<FlatRecord> {
    match format {
        OutputFormat::Text => {
            let mut record = FlatRecord::new();
            for (number, line) in text.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let Some((key, value)) = line.split_once('=') else {
                    bail!("line {}: expected key=value", number + 1);
                };
                record.insert(key, value.to_string());
            }
            Ok(record)
        }
        OutputFormat::Json => {
            let object: serde_json::Map<String, serde_json::Value> =
                serde_json::from_str(text).context("parsing JSON record")?;
            let mut record = FlatRecord::new();
            for (key, value) in object {
                match value {
                    serde_json::Value::String(text) => record.insert(key, text),
                    other => bail!("{key}: expected a string value, found {other}"),
                };
            }
            Ok(record)
        }
    }
}
