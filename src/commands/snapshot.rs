use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::commands::{CommandReport, SafetyOverrides, Session, record_asset_counts};
use crate::store::snapshot::{SnapshotFile, write_snapshot};

#[derive(Debug, Clone)]
pub struct SnapshotOptions {
    pub group: String,
    pub out: PathBuf,
    pub customer_id: Option<String>,
}

/// Exports one group's current assets to a snapshot file that later runs
/// can use as a cached source.
pub fn run(opts: &SnapshotOptions) -> Result<CommandReport> {
    let session = Session::open(
        "snapshot",
        opts.customer_id.as_deref(),
        &SafetyOverrides::default(),
    )?;
    let mut report = CommandReport::new("snapshot");
    report.detail(format!("store={}", session.store.backend()));

    let name = session.store.describe(&opts.group).ok().and_then(|info| info.name);
    let assets = session
        .store
        .load(&opts.group)
        .with_context(|| format!("failed to load ad group {}", opts.group))?;
    record_asset_counts(&mut report, "group", &assets);

    let snapshot = SnapshotFile {
        name,
        assets,
        created: Vec::new(),
    };
    write_snapshot(&opts.out, &snapshot)
        .with_context(|| format!("failed to write {}", opts.out.display()))?;
    report.detail(format!("snapshot_file={}", opts.out.display()));
    session.audit(
        "export",
        "ok",
        &format!("group={} file={}", opts.group, opts.out.display()),
    )?;

    Ok(report)
}
