use anyhow::Result;
use std::path::PathBuf;

use crate::commands::{CommandReport, SafetyOverrides, Session, record_asset_counts, record_reconcile};
use crate::engine::reconcile::{lift_fixed_ads, reconcile};

#[derive(Debug, Clone)]
pub struct RebuildOptions {
    pub source_group: String,
    pub dest_group: String,
    pub source_snapshot: Option<PathBuf>,
    pub customer_id: Option<String>,
    pub safety: SafetyOverrides,
}

/// Lifts the source group's fixed-slot ads into multi-slot ads and creates
/// the ones the destination does not already carry.
pub fn run(opts: &RebuildOptions) -> Result<CommandReport> {
    let session = Session::open("rebuild", opts.customer_id.as_deref(), &opts.safety)?;
    let safety = session.safety();
    let mut report = CommandReport::new("rebuild");

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
            "source fixed_slot_ads={}, destination multi_slot_ads={}",
            source.fixed_slot_ads.len(),
            destination.multi_slot_ads.len()
        ),
    )?;

    if source.fixed_slot_ads.is_empty() {
        report.detail("no fixed-slot ads in source; nothing to rebuild".to_string());
    }

    let lifted = lift_fixed_ads(&source.fixed_slot_ads, &safety, &session.config.padding);
    let padded: usize = lifted.records.iter().map(|r| r.padded_slots).sum();
    report.detail(format!(
        "transform.lifted={} transform.padded_slots={} transform.pin_mode={}",
        lifted.candidates.len(),
        padded,
        safety.pin_mode
    ));
    for record in lifted.records.iter().filter(|r| r.padded_slots > 0) {
        report.detail(format!(
            "padded ad #{} \"{}\": {} generic slot(s)",
            record.source_index + 1,
            record.label,
            record.padded_slots
        ));
    }

    let outcome = reconcile(
        &opts.dest_group,
        &lifted.candidates,
        &destination.existing_entities(),
        lifted.excluded,
        &safety,
        session.creator(&opts.dest_group),
    );
    session.audit(
        "plan",
        "ok",
        &format!(
            "to_create={} to_skip={} excluded={}",
            outcome.plan.to_create.len(),
            outcome.plan.to_skip.len(),
            outcome.excluded.len()
        ),
    )?;

    let counts = outcome.outcomes();
    session.audit(
        "execute",
        if counts.failed == 0 { "ok" } else { "partial" },
        &format!(
            "dry_run={} created={} skipped={} excluded={} failed={}",
            safety.dry_run, counts.created, counts.skipped, counts.excluded, counts.failed
        ),
    )?;

    record_reconcile(&mut report, &outcome);
    Ok(report)
}
