use anyhow::Result;
use std::path::PathBuf;

use crate::commands::{CommandReport, SafetyOverrides, Session, record_asset_counts, record_reconcile};
use crate::engine::reconcile::reconcile;

#[derive(Debug, Clone)]
pub struct RecoverOptions {
    pub source_group: String,
    pub dest_group: String,
    pub source_snapshot: Option<PathBuf>,
    pub customer_id: Option<String>,
    pub safety: SafetyOverrides,
}

/// Copies keywords and multi-slot ads from the source group into the
/// destination group. Re-running against the same destination creates
/// nothing new.
pub fn run(opts: &RecoverOptions) -> Result<CommandReport> {
    let session = Session::open("recover", opts.customer_id.as_deref(), &opts.safety)?;
    let safety = session.safety();
    let mut report = CommandReport::new("recover");

    report.detail(format!("store={}", session.store.backend()));
    report.detail(format!("safety={}", safety.describe()));
    session.describe_group(&mut report, "source", &opts.source_group);
    session.describe_group(&mut report, "destination", &opts.dest_group);

    let source = session.load_source(&opts.source_group, opts.source_snapshot.as_deref())?;
    let destination = session.load_destination(&opts.dest_group)?;
    record_asset_counts(&mut report, "source", &source);
    record_asset_counts(&mut report, "destination", &destination);
    session.audit(
        "load",
        "ok",
        &format!(
            "source={} entities, destination={} entities",
            source.keywords.len() + source.multi_slot_ads.len(),
            destination.keywords.len() + destination.multi_slot_ads.len()
        ),
    )?;

    let outcome = reconcile(
        &opts.dest_group,
        &source.entities(),
        &destination.existing_entities(),
        Vec::new(),
        &safety,
        session.creator(&opts.dest_group),
    );
    session.audit(
        "plan",
        "ok",
        &format!(
            "to_create={} to_skip={}",
            outcome.plan.to_create.len(),
            outcome.plan.to_skip.len()
        ),
    )?;

    let counts = outcome.outcomes();
    session.audit(
        "execute",
        if counts.failed == 0 { "ok" } else { "partial" },
        &format!(
            "dry_run={} created={} skipped={} failed={}",
            safety.dry_run, counts.created, counts.skipped, counts.failed
        ),
    )?;

    record_reconcile(&mut report, &outcome);
    Ok(report)
}
