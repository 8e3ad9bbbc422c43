use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::engine::geo::{GeoOptions, expand_keywords};
use crate::engine::model::{Keyword, MatchType};
use crate::store::AssetSet;
use crate::store::snapshot::{SnapshotFile, write_snapshot};

#[derive(Debug, Clone)]
pub struct ExpandGeoOptions {
    pub input: PathBuf,
    pub out: PathBuf,
    pub geo: GeoOptions,
    pub match_type: MatchType,
    pub negative: bool,
    pub name: Option<String>,
}

/// Expands seed keywords (one per line) into geo variants and writes them as
/// a keyword snapshot that `recover --source-snapshot` can consume.
pub fn run(opts: &ExpandGeoOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("expand-geo");
    let raw = fs::read_to_string(&opts.input)
        .with_context(|| format!("failed to read {}", opts.input.display()))?;
    let seeds = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();
    if seeds.is_empty() {
        report.issue(format!("no seed keywords in {}", opts.input.display()));
        return Ok(report);
    }

    let expanded = expand_keywords(&seeds, &opts.geo);
    let keywords = expanded
        .into_iter()
        .map(|text| {
            if opts.negative {
                Keyword::negative(text, opts.match_type)
            } else {
                Keyword::positive(text, opts.match_type)
            }
        })
        .collect::<Vec<_>>();

    report.detail(format!("seeds={}", seeds.len()));
    report.detail(format!(
        "geo.states={} geo.abbrev={} geo.metros={} geo.extra={}",
        opts.geo.states,
        opts.geo.states && opts.geo.abbrev,
        opts.geo.metros,
        opts.geo.extra.len()
    ));
    report.detail(format!("keywords={}", keywords.len()));

    let snapshot = SnapshotFile {
        name: opts.name.clone(),
        assets: AssetSet {
            keywords,
            ..AssetSet::default()
        },
        created: Vec::new(),
    };
    write_snapshot(&opts.out, &snapshot)
        .with_context(|| format!("failed to write {}", opts.out.display()))?;
    report.detail(format!("snapshot_file={}", opts.out.display()));

    Ok(report)
}
