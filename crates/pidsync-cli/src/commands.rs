use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use pidsync_diff::{diff_records, RecordChange, RecordDiff};
use pidsync_installer::{transform, InstallerConfig, RegisteredResource};
use pidsync_merge::{effective_install_dictionary, MergeSchemes};
use pidsync_types::{codec, ConfigurationIdentity, ConfigurationRecord, ExtensionMode, InstalledResource};
use serde_json::json;
use tracing::debug;

use crate::cli::*;

const DEFAULT_SCHEME: &str = "default";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Identify(args) => cmd_identify(args, format),
        Command::DecodeAlias(args) => cmd_decode_alias(args, format),
        Command::Merge(args) => cmd_merge(args, format),
        Command::Diff(args) => cmd_diff(args, format),
    }
}

fn cmd_identify(args: IdentifyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mode = if args.legacy_extensions {
        ExtensionMode::Legacy
    } else {
        ExtensionMode::Standard
    };
    let resource = RegisteredResource::properties(args.path.as_str(), None);
    let Some(result) = transform(&resource, mode) else {
        bail!("{} is not a configuration resource", args.path);
    };
    print_identity(&result.identity(), format)
}

fn cmd_decode_alias(args: DecodeAliasArgs, format: OutputFormat) -> anyhow::Result<()> {
    let identity = codec::decode_legacy_alias(args.alias.as_deref(), &args.old_id)?;
    print_identity(&identity, format)
}

fn print_identity(identity: &ConfigurationIdentity, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let value = json!({
                "pid": identity.canonical(),
                "factory_pid": identity.factory_pid,
                "name": identity.name,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            println!("{} {}", "pid:".bold(), identity.canonical().yellow());
            match &identity.factory_pid {
                Some(factory_pid) => println!("  factory: {}", factory_pid.cyan()),
                None => println!("  factory: {}", "(none)".dimmed()),
            }
            println!("  name:    {}", identity.name);
        }
    }
    Ok(())
}

fn cmd_merge(args: MergeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let schemes = match (&args.schemes, &args.config) {
        (Some(list), _) => Some(MergeSchemes::parse(list)?),
        (None, Some(path)) => InstallerConfig::from_file(path)
            .with_context(|| format!("reading {}", path.display()))?
            .merge_schemes,
        (None, None) => None,
    };

    let mut resources = Vec::with_capacity(args.inputs.len());
    for (priority, input) in args.inputs.iter().enumerate() {
        let (scheme, path) = parse_input(input);
        let record = read_record(Path::new(path))?;
        resources.push(InstalledResource {
            entity_id: input.clone(),
            scheme: scheme.to_string(),
            dictionary: Some(record),
            priority: priority as i32,
        });
    }
    debug!(inputs = resources.len(), schemes = ?schemes, "merging records");

    let Some((primary, siblings)) = resources.split_first() else {
        bail!("no input records");
    };
    let primary = primary.dictionary.clone().unwrap_or_default();
    let effective = effective_install_dictionary(schemes.as_ref(), &primary, siblings);
    print_record(&effective, format)
}

/// Split `[SCHEME=]FILE`; a bare file gets the default scheme.
fn parse_input(input: &str) -> (&str, &str) {
    match input.split_once('=') {
        Some((scheme, path)) if !scheme.is_empty() && !path.is_empty() => (scheme, path),
        _ => (DEFAULT_SCHEME, input),
    }
}

fn read_record(path: &Path) -> anyhow::Result<ConfigurationRecord> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn print_record(record: &ConfigurationRecord, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(record)?),
        OutputFormat::Text => {
            if record.is_empty() {
                println!("{}", "(empty)".dimmed());
            }
            for (key, value) in record.iter() {
                println!("{} = {}", key.bold(), value);
            }
        }
    }
    Ok(())
}

fn cmd_diff(args: DiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let old = read_record(&args.old)?;
    let new = read_record(&args.new)?;
    let diff = diff_records(&old, &new);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diff)?),
        OutputFormat::Text => print_diff(&diff),
    }
    Ok(())
}

fn print_diff(diff: &RecordDiff) {
    if diff.is_empty() {
        println!("{}", "Same data.".green());
        return;
    }
    for change in &diff.changes {
        match change {
            RecordChange::Added { key, value } => println!("{} {} = {}", "+".green(), key.bold(), value),
            RecordChange::Removed { key, value } => println!("{} {} = {}", "-".red(), key.bold(), value),
            RecordChange::Modified { key, old, new } => {
                println!("{} {}: {} -> {}", "~".yellow(), key.bold(), old, new)
            }
        }
    }
    println!(
        "{} added, {} removed, {} modified",
        diff.additions(),
        diff.removals(),
        diff.modifications()
    );
}
