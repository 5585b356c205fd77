use anyhow::{Context, Result};
use clap::Parser;
use frag_actor::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Processes a decoded demo event stream and prints the match statistics.
#[derive(Parser, Debug)]
#[command(version)]
struct ProcessFlags {
    /// Event stream: a `{"header": ..., "events": [...]}` object, a JSON
    /// array of timed events, or one timed event per line.
    events: PathBuf,

    /// Demo header JSON, for streams that do not embed one.
    #[arg(long)]
    header: Option<PathBuf>,

    /// JSON processor configuration. Missing fields use the defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print flattened record batches instead of the nested result.
    #[arg(long)]
    batches: bool,

    /// Pretty-print the output.
    #[arg(long)]
    pretty: bool,
}

#[derive(Deserialize)]
struct DemoDump {
    header: DemoHeader,
    events: Vec<TimedEvent>,
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_events(text: &str) -> Result<(Option<DemoHeader>, Vec<TimedEvent>)> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        return Ok((None, serde_json::from_str(trimmed)?));
    }
    if let Ok(dump) = serde_json::from_str::<DemoDump>(trimmed) {
        return Ok((Some(dump.header), dump.events));
    }
    let events = trimmed
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).with_context(|| format!("event on line {}", index + 1))
        })
        .collect::<Result<Vec<TimedEvent>>>()?;
    Ok((None, events))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = ProcessFlags::parse();

    let config = match &args.config {
        Some(path) => ProcessorConfig::from_json(&read(path)?)?,
        None => ProcessorConfig::default(),
    };
    let (embedded_header, events) = load_events(&read(&args.events)?)?;
    let header = match (&args.header, embedded_header) {
        (Some(path), _) => serde_json::from_str(&read(path)?)?,
        (None, Some(header)) => header,
        (None, None) => anyhow::bail!("{} has no header, pass --header", args.events.display()),
    };
    log::info!("Loaded {} events for {}", events.len(), header.map_name);

    let processor = MatchProcessor::new(header, config.clone())?.with_progress(
        |update: &ProgressUpdate| {
            log::debug!("{:?} {}% {:?}", update.status, update.progress, update.context)
        },
    );
    let result = processor.process(events)?;

    if args.batches {
        let pretty = args.pretty;
        let mut print_batch = |batch: &RecordBatch| -> Result<(), String> {
            let json = if pretty {
                serde_json::to_string_pretty(batch)
            } else {
                serde_json::to_string(batch)
            };
            println!("{}", json.map_err(|e| e.to_string())?);
            Ok(())
        };
        deliver_match_result(&result, &mut print_batch, config.batch_size, &config.retry)?;
    } else if args.pretty {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", serde_json::to_string(&result)?);
    }
    Ok(())
}
