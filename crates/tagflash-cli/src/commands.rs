use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use colored::Colorize;
use serde_json::json;
use tagflash_protocol::RecordCodec;
use tagflash_resolver::{ConfigEntry, ValueResolver};
use tagflash_session::{
    read_token, ReadOutcome, SessionConfig, SessionReport, TokenOutcome, WriteController, WriteMode,
};
use tagflash_store::{FileValueStore, ValueStore};
use tagflash_transport::{token_channel, MemoryTag, TokenEvent, TokenId};
use tagflash_types::{format_value, parse_value, BuildingType};
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, warn};

use crate::cli::*;
use crate::config::CliConfig;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref(), cli.store)?;
    debug!(store = %config.store_path.display(), "opening value store");
    let store = FileValueStore::open(&config.store_path)
        .with_context(|| format!("opening {}", config.store_path.display()))?;
    let resolver = Arc::new(ValueResolver::new(store));
    let r: &ValueResolver<FileValueStore> = &resolver;
    let format = cli.format;

    match cli.command {
        Command::List => cmd_list(r, format),
        Command::Show(args) => cmd_show(r, &args.building, format),
        Command::Set(args) => cmd_set(r, &args.building, &args.value, format),
        Command::Reset(args) => cmd_reset(r, &args.building, format),
        Command::ResetAll => cmd_reset_all(r, format),
        Command::Encode(args) => cmd_encode(r, &args.building, format),
        Command::Decode(args) => cmd_decode(r, &args.hex, &config.session, format).await,
        Command::Simulate(args) => {
            cmd_simulate(Arc::clone(&resolver), args, &config.session, format).await
        }
    }
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn entry_line(entry: &ConfigEntry) -> String {
    let value = format_value(entry.effective);
    let value = if entry.overridden { value.yellow().bold() } else { value.normal() };
    let mut line = format!(
        "{:<18} {}  {}",
        entry.building.name().bold(),
        value,
        format_value(entry.default).dimmed()
    );
    if entry.overridden {
        line.push_str(&format!("  {}", "(overridden)".yellow()));
    }
    line
}

fn find_entry<S: ValueStore>(
    resolver: &ValueResolver<S>,
    building: BuildingType,
) -> anyhow::Result<ConfigEntry> {
    resolver
        .entries()?
        .into_iter()
        .find(|e| e.building == building)
        .ok_or_else(|| anyhow!("no entry for {building}"))
}

fn cmd_list<S: ValueStore>(resolver: &ValueResolver<S>, format: OutputFormat) -> anyhow::Result<()> {
    let entries = resolver.entries()?;
    if format == OutputFormat::Json {
        return print_json(&entries);
    }
    println!("{:<18} {:<5} {}", "BUILDING".bold(), "VALUE".bold(), "DEFAULT".bold());
    for entry in &entries {
        println!("{}", entry_line(entry));
    }
    Ok(())
}

fn cmd_show<S: ValueStore>(
    resolver: &ValueResolver<S>,
    name: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let entry = find_entry(resolver, name.parse()?)?;
    match format {
        OutputFormat::Json => print_json(&entry),
        OutputFormat::Text => {
            println!("{}", entry_line(&entry));
            Ok(())
        }
    }
}

fn cmd_set<S: ValueStore>(
    resolver: &ValueResolver<S>,
    name: &str,
    value: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let building: BuildingType = name.parse()?;
    let value = parse_value(value)?;
    resolver.set_override(building, value)?;
    let entry = find_entry(resolver, building)?;
    match format {
        OutputFormat::Json => print_json(&entry),
        OutputFormat::Text => {
            println!("{} {} = {}", "✓".green().bold(), building.name().bold(), format_value(value).yellow());
            Ok(())
        }
    }
}

fn cmd_reset<S: ValueStore>(
    resolver: &ValueResolver<S>,
    name: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let building: BuildingType = name.parse()?;
    resolver.reset_override(building)?;
    let entry = find_entry(resolver, building)?;
    match format {
        OutputFormat::Json => print_json(&entry),
        OutputFormat::Text => {
            println!(
                "{} {} reset to {}",
                "✓".green().bold(),
                building.name().bold(),
                format_value(entry.effective)
            );
            Ok(())
        }
    }
}

fn cmd_reset_all<S: ValueStore>(
    resolver: &ValueResolver<S>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let cleared = resolver.overrides()?.len();
    resolver.reset_all()?;
    match format {
        OutputFormat::Json => print_json(&json!({ "cleared": cleared })),
        OutputFormat::Text => {
            println!("{} Cleared {} override(s).", "✓".green().bold(), cleared);
            Ok(())
        }
    }
}

fn cmd_encode<S: ValueStore>(
    resolver: &ValueResolver<S>,
    name: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let building: BuildingType = name.parse()?;
    let value = resolver.effective_value(building)?;
    let message = RecordCodec::encode_message(&RecordCodec::encode(value));
    match format {
        OutputFormat::Json => print_json(&json!({
            "building": building,
            "value": value,
            "message": hex::encode_upper(&message),
        })),
        OutputFormat::Text => {
            println!("{} ({}): {}", building.name().bold(), format_value(value), hex::encode_upper(&message).cyan());
            Ok(())
        }
    }
}

/// Accepts `D1 01 01 42 0E`, `d1:01:01:42:0e` or `D10101420E`.
fn parse_hex_input(text: &str) -> anyhow::Result<Vec<u8>> {
    let compact: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    let compact = compact.strip_prefix("0x").unwrap_or(&compact);
    hex::decode(compact).with_context(|| format!("invalid hex input {text:?}"))
}

fn read_outcome_json(outcome: &ReadOutcome) -> serde_json::Value {
    match outcome {
        ReadOutcome::Building { building, value } => {
            json!({ "result": "building", "building": building, "value": value })
        }
        ReadOutcome::Unknown { value } => json!({ "result": "unknown", "value": value }),
        ReadOutcome::Blank => json!({ "result": "blank" }),
        ReadOutcome::Unrecognized(e) => {
            json!({ "result": "unrecognized", "error": e.to_string(), "raw": e.raw_hex() })
        }
        ReadOutcome::Failed(e) => json!({ "result": "failed", "error": e.to_string() }),
    }
}

fn read_outcome_text(outcome: &ReadOutcome) -> String {
    match outcome {
        ReadOutcome::Building { building, value } => {
            format!("{} ({})", building.name().green().bold(), format_value(*value))
        }
        ReadOutcome::Unknown { value } => {
            format!("{} ({})", "unknown building".yellow(), format_value(*value))
        }
        ReadOutcome::Blank => "blank tag".dimmed().to_string(),
        ReadOutcome::Unrecognized(e) => {
            format!("{} {} [{}]", "not a building tag:".red(), e, e.raw_hex())
        }
        ReadOutcome::Failed(e) => format!("{} {}", "read failed:".red(), e),
    }
}

async fn cmd_decode<S: ValueStore>(
    resolver: &ValueResolver<S>,
    input: &str,
    session: &SessionConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let outcome = decode_bytes(resolver, parse_hex_input(input)?, session).await?;
    match format {
        OutputFormat::Json => print_json(&read_outcome_json(&outcome)),
        OutputFormat::Text => {
            println!("{}", read_outcome_text(&outcome));
            Ok(())
        }
    }
}

/// Run raw message bytes through the same read path a presented tag takes.
async fn decode_bytes<S: ValueStore>(
    resolver: &ValueResolver<S>,
    message: Vec<u8>,
    session: &SessionConfig,
) -> anyhow::Result<ReadOutcome> {
    let mut tag = MemoryTag::ndef(Vec::new()).with_message(message);
    Ok(read_token(&mut tag, resolver, session.transport_timeout()).await?)
}

/// One simulated tag after the run.
#[derive(Debug)]
struct SimulatedTag {
    token: TokenId,
    write: Option<TokenOutcome>,
    read: ReadOutcome,
}

/// Ten-byte UID carrying the whole index, so every simulated tag is distinct.
fn simulated_uid(index: usize) -> Vec<u8> {
    let mut uid = vec![0x04, 0xA2];
    uid.extend_from_slice(&(index as u64).to_be_bytes());
    uid
}

async fn simulate<S: ValueStore + 'static>(
    resolver: Arc<ValueResolver<S>>,
    building: BuildingType,
    count: usize,
    mode: WriteMode,
    session: &SessionConfig,
) -> anyhow::Result<Vec<SimulatedTag>> {
    // Reports are drained after the run, so the channel must hold all of
    // them: one arm, one per tag and at most one disarm.
    let config = SessionConfig {
        report_capacity: session.report_capacity.max(count.saturating_add(2)),
        ..session.clone()
    };
    let (tx, rx) = token_channel(config.event_capacity);
    let (task, handle) = WriteController::spawn(Arc::clone(&resolver), rx, config);
    let mut reports = handle.subscribe();
    handle.arm(Some(building), mode).await?;

    let tags: Vec<MemoryTag> = (0..count).map(|i| MemoryTag::ndef(simulated_uid(i))).collect();
    for tag in &tags {
        tx.send(TokenEvent::new(tag.id(), tag.clone()))
            .await
            .map_err(|_| anyhow!("write controller stopped"))?;
    }
    drop(tx);
    task.await.context("write controller panicked")?;

    let mut writes = HashMap::new();
    loop {
        match reports.try_recv() {
            Ok(SessionReport::Token { token, outcome }) => {
                writes.insert(token, outcome);
            }
            Ok(_) => {}
            Err(TryRecvError::Lagged(missed)) => warn!(missed, "session reports dropped"),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }

    let mut results = Vec::with_capacity(tags.len());
    for tag in tags {
        let token = tag.id();
        let write = writes.remove(&token);
        let mut handle = tag.clone();
        let read = read_token(&mut handle, resolver.as_ref(), session.transport_timeout()).await?;
        results.push(SimulatedTag { token, write, read });
    }
    Ok(results)
}

fn write_outcome_text(outcome: Option<&TokenOutcome>) -> String {
    match outcome {
        None => "no report".dimmed().to_string(),
        Some(TokenOutcome::Ignored) => "ignored (idle)".dimmed().to_string(),
        Some(TokenOutcome::Written { value, method, .. }) => {
            format!("{} {} via {:?}", "wrote".green(), format_value(*value), method)
        }
        Some(TokenOutcome::Failed { error, .. }) => format!("{} {}", "failed:".red(), error),
    }
}

fn write_outcome_json(outcome: Option<&TokenOutcome>) -> serde_json::Value {
    match outcome {
        None => serde_json::Value::Null,
        Some(TokenOutcome::Ignored) => json!({ "result": "ignored" }),
        Some(TokenOutcome::Written { building, value, method }) => {
            json!({ "result": "written", "building": building, "value": value, "method": method })
        }
        Some(TokenOutcome::Failed { building, value, error }) => json!({
            "result": "failed",
            "building": building,
            "value": value,
            "error": error.to_string(),
        }),
    }
}

async fn cmd_simulate<S: ValueStore + 'static>(
    resolver: Arc<ValueResolver<S>>,
    args: SimulateArgs,
    session: &SessionConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let building: BuildingType = args.building.parse()?;
    let mode = if args.single { WriteMode::SingleShot } else { WriteMode::Continuous };
    let value = resolver.effective_value(building)?;
    let results = simulate(resolver, building, args.tags, mode, session).await?;

    if format == OutputFormat::Json {
        let tags: Vec<_> = results
            .iter()
            .map(|r| {
                json!({
                    "token": r.token.to_hex(),
                    "write": write_outcome_json(r.write.as_ref()),
                    "read": read_outcome_json(&r.read),
                })
            })
            .collect();
        return print_json(&json!({
            "building": building,
            "value": value,
            "mode": mode,
            "tags": tags,
        }));
    }

    println!(
        "{} Armed {} ({}, {:?})",
        "✓".green().bold(),
        building.name().bold(),
        format_value(value),
        mode
    );
    for r in &results {
        println!(
            "  {}  {}  -> {}",
            r.token.to_string().cyan(),
            write_outcome_text(r.write.as_ref()),
            read_outcome_text(&r.read)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tagflash_protocol::DecodeError;
    use tagflash_session::WriteMethod;
    use tagflash_store::InMemoryValueStore;
    use tagflash_transport::TransportError;

    fn resolver() -> Arc<ValueResolver<InMemoryValueStore>> {
        Arc::new(ValueResolver::new(InMemoryValueStore::new()))
    }

    #[test]
    fn hex_input_accepts_separators() {
        let expected = vec![0xD1, 0x01, 0x01, 0x42, 0x0E];
        assert_eq!(parse_hex_input("D10101420E").unwrap(), expected);
        assert_eq!(parse_hex_input("d1 01 01 42 0e").unwrap(), expected);
        assert_eq!(parse_hex_input("D1:01:01:42:0E").unwrap(), expected);
        assert_eq!(parse_hex_input("0xD10101420E").unwrap(), expected);
        assert!(parse_hex_input("D1 0").is_err());
        assert!(parse_hex_input("zz").is_err());
    }

    #[tokio::test]
    async fn decode_resolves_building() {
        let r = ValueResolver::new(InMemoryValueStore::new());
        let outcome = decode_bytes(&r, vec![0xD1, 0x01, 0x01, 0x42, 0x0E], &SessionConfig::default())
            .await
            .unwrap();
        assert_eq!(outcome, ReadOutcome::Building { building: BuildingType::Farm, value: 14 });
    }

    #[tokio::test]
    async fn decode_foreign_record() {
        let r = ValueResolver::new(InMemoryValueStore::new());
        let outcome = decode_bytes(&r, vec![0xD1, 0x01, 0x01, 0x55, 0x0E], &SessionConfig::default())
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            ReadOutcome::Unrecognized(DecodeError::NotRecognizedDiscriminator { .. })
        ));
    }

    #[tokio::test]
    async fn decode_empty_input_reports_malformed_message() {
        let r = ValueResolver::new(InMemoryValueStore::new());
        let outcome = decode_bytes(&r, Vec::new(), &SessionConfig::default()).await.unwrap();
        assert!(matches!(
            outcome,
            ReadOutcome::Failed(TransportError::MalformedMessage(_))
        ));
    }

    #[tokio::test]
    async fn simulate_continuous_writes_every_tag() {
        let r = resolver();
        r.set_override(BuildingType::Farm, 0x63).unwrap();
        let results = simulate(r, BuildingType::Farm, 3, WriteMode::Continuous, &SessionConfig::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
        for result in &results {
            assert_eq!(
                result.write,
                Some(TokenOutcome::Written {
                    building: BuildingType::Farm,
                    value: 0x63,
                    method: WriteMethod::Ndef
                })
            );
            assert_eq!(
                result.read,
                ReadOutcome::Building { building: BuildingType::Farm, value: 0x63 }
            );
        }
    }

    #[tokio::test]
    async fn simulate_single_shot_writes_first_tag_only() {
        let r = resolver();
        let results = simulate(r, BuildingType::School, 2, WriteMode::SingleShot, &SessionConfig::default())
            .await
            .unwrap();
        assert!(matches!(results[0].write, Some(TokenOutcome::Written { value: 17, .. })));
        assert_eq!(
            results[0].read,
            ReadOutcome::Building { building: BuildingType::School, value: 17 }
        );
        assert_eq!(results[1].write, Some(TokenOutcome::Ignored));
        assert_eq!(results[1].read, ReadOutcome::Blank);
    }

    #[test]
    fn simulated_uids_are_distinct() {
        assert_ne!(simulated_uid(0), simulated_uid(1));
        assert_ne!(simulated_uid(1), simulated_uid(257));
        assert_ne!(simulated_uid(0), simulated_uid(65_536));
        assert_eq!(simulated_uid(3).len(), 10);
    }

    #[tokio::test]
    async fn simulate_keeps_every_report_beyond_channel_capacity() {
        let config = SessionConfig::default();
        let count = config.report_capacity + 36;
        let results = simulate(resolver(), BuildingType::Farm, count, WriteMode::Continuous, &config)
            .await
            .unwrap();
        assert_eq!(results.len(), count);
        for result in &results {
            assert!(
                matches!(result.write, Some(TokenOutcome::Written { value: 14, .. })),
                "{} has no write report",
                result.token
            );
        }
        let distinct: HashSet<_> = results.iter().map(|r| r.token.clone()).collect();
        assert_eq!(distinct.len(), count);
    }
}
