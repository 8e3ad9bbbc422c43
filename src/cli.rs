use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{
    self, CommandReport, SafetyOverrides, expand_geo::ExpandGeoOptions,
    inventory::InventoryOptions, rebuild::RebuildOptions, recover::RecoverOptions,
    snapshot::SnapshotOptions,
};
use crate::engine::geo::GeoOptions;
use crate::engine::model::MatchType;
use crate::engine::safety::{PadMode, PinMode};

#[derive(Parser)]
#[command(
    name = "adsmend",
    version,
    about = "Recover, rebuild and audit ad-group assets without creating duplicates"
)]
struct Cli {
    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Ads customer id (dashes allowed); overrides config and environment
    #[arg(long, global = true)]
    customer_id: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Default)]
struct SafetyArgs {
    /// Preview the plan without creating anything
    #[arg(long)]
    dry_run: bool,
    /// Create keywords and ads paused
    #[arg(long)]
    pause_on_create: bool,
    /// Force positive keywords to EXACT match before comparing
    #[arg(long)]
    only_exact: bool,
    /// Also copy negative keywords
    #[arg(long)]
    copy_negatives: bool,
    /// How to reach slot minimums for short ads (skip or generic)
    #[arg(long)]
    pad_mode: Option<PadMode>,
    /// legacy-pin keeps slot order, flexible leaves ads unpinned
    #[arg(long, conflicts_with = "no_pin")]
    pin_mode: Option<PinMode>,
    /// Shorthand for --pin-mode flexible
    #[arg(long)]
    no_pin: bool,
}

impl SafetyArgs {
    fn overrides(&self) -> SafetyOverrides {
        SafetyOverrides {
            only_exact: self.only_exact,
            pause_on_create: self.pause_on_create,
            copy_negatives: self.copy_negatives,
            dry_run: self.dry_run,
            pad_mode: self.pad_mode,
            pin_mode: if self.no_pin {
                Some(PinMode::Flexible)
            } else {
                self.pin_mode
            },
        }
    }
}

#[derive(Args, Debug, Clone)]
struct GroupPair {
    /// Source ad group (may be removed remotely)
    #[arg(long = "source", visible_alias = "source-ad-group-id")]
    source: String,
    /// Existing destination ad group
    #[arg(long = "dest", visible_alias = "dest-ad-group-id")]
    dest: String,
    /// Snapshot file used when the source cannot be loaded
    #[arg(long)]
    source_snapshot: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Copy keywords and multi-slot ads into the destination group
    Recover {
        #[command(flatten)]
        groups: GroupPair,
        #[command(flatten)]
        safety: SafetyArgs,
    },
    /// Rebuild fixed-slot ads as multi-slot ads in the destination group
    Rebuild {
        #[command(flatten)]
        groups: GroupPair,
        #[command(flatten)]
        safety: SafetyArgs,
    },
    /// Export a group's assets to a snapshot file
    Snapshot {
        #[arg(long, visible_alias = "ad-group-id")]
        group: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Summarize a group's keywords and multi-slot ads
    Inventory {
        #[arg(long, visible_alias = "ad-group-id")]
        group: String,
        /// Maximum keywords and ads listed individually
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Expand seed keywords with US states, abbreviations and metros
    ExpandGeo {
        /// Text file with one seed keyword per line
        #[arg(long)]
        input: PathBuf,
        /// Snapshot file to write
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        no_states: bool,
        #[arg(long)]
        no_abbrev: bool,
        #[arg(long)]
        metros: bool,
        /// Extra geo name; repeatable
        #[arg(long = "geo")]
        geo: Vec<String>,
        #[arg(long = "match", default_value = "EXACT", value_parser = parse_match_type)]
        match_type: MatchType,
        /// Write the keywords as negatives
        #[arg(long)]
        negative: bool,
        /// Group name recorded in the snapshot
        #[arg(long)]
        name: Option<String>,
    },
    /// Show resolved paths, effective config and unknown environment variables
    Status,
}

fn parse_match_type(raw: &str) -> Result<MatchType, String> {
    let lowered = raw.trim().to_ascii_lowercase();
    let cleaned = lowered.strip_suffix(" match").unwrap_or(&lowered);
    MatchType::parse(cleaned)
        .ok_or_else(|| format!("invalid match type `{raw}`; use BROAD, PHRASE or EXACT"))
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let state = if report.ok { "ok" } else { "issues" };
    println!("{}: {state}", report.command);
    for detail in &report.details {
        println!("  {detail}");
    }
    for issue in &report.issues {
        println!("  ! {issue}");
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let customer_id = cli.customer_id.clone();

    let report = match cli.command {
        Command::Recover { groups, safety } => commands::recover::run(&RecoverOptions {
            source_group: groups.source,
            dest_group: groups.dest,
            source_snapshot: groups.source_snapshot,
            customer_id,
            safety: safety.overrides(),
        })?,
        Command::Rebuild { groups, safety } => commands::rebuild::run(&RebuildOptions {
            source_group: groups.source,
            dest_group: groups.dest,
            source_snapshot: groups.source_snapshot,
            customer_id,
            safety: safety.overrides(),
        })?,
        Command::Snapshot { group, out } => commands::snapshot::run(&SnapshotOptions {
            group,
            out,
            customer_id,
        })?,
        Command::Inventory { group, limit } => commands::inventory::run(&InventoryOptions {
            group,
            limit,
            customer_id,
        })?,
        Command::ExpandGeo {
            input,
            out,
            no_states,
            no_abbrev,
            metros,
            geo,
            match_type,
            negative,
            name,
        } => commands::expand_geo::run(&ExpandGeoOptions {
            input,
            out,
            geo: GeoOptions {
                states: !no_states,
                abbrev: !no_abbrev,
                metros,
                extra: geo,
            },
            match_type,
            negative,
            name,
        })?,
        Command::Status => commands::status::run()?,
    };

    print_report(&report, cli.json)?;
    if !report.ok {
        anyhow::bail!(
            "{} finished with {} issue(s)",
            report.command,
            report.issues.len()
        );
    }
    Ok(())
}
