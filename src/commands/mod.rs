pub mod expand_geo;
pub mod inventory;
pub mod rebuild;
pub mod recover;
pub mod snapshot;
pub mod status;

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::engine::audit;
use crate::engine::config::{self, AdsmendConfig};
use crate::engine::model::{AdStatus, Entity, EntityKind};
use crate::engine::paths::{AdsmendPaths, resolve_paths};
use crate::engine::plan::SkipReason;
use crate::engine::reconcile::ReconcileReport;
use crate::engine::safety::{PadMode, PinMode, SafetyConfig};
use crate::engine::warn::{self, WarnEvent};
use crate::error::AdsmendError;
use crate::store::snapshot::read_snapshot;
use crate::store::{AssetSet, AssetStore, open_store};

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }
}

/// Switches given on the command line. Flags only ever turn a policy on;
/// modes replace the configured value when present.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyOverrides {
    pub only_exact: bool,
    pub pause_on_create: bool,
    pub copy_negatives: bool,
    pub dry_run: bool,
    pub pad_mode: Option<PadMode>,
    pub pin_mode: Option<PinMode>,
}

impl SafetyOverrides {
    pub fn apply(&self, base: SafetyConfig) -> SafetyConfig {
        SafetyConfig {
            only_exact: base.only_exact || self.only_exact,
            pause_on_create: base.pause_on_create || self.pause_on_create,
            copy_negatives: base.copy_negatives || self.copy_negatives,
            dry_run: base.dry_run || self.dry_run,
            pad_mode: self.pad_mode.unwrap_or(base.pad_mode),
            pin_mode: self.pin_mode.unwrap_or(base.pin_mode),
        }
    }
}

/// Resolved paths, effective config and the opened store for one command.
pub struct Session {
    pub paths: AdsmendPaths,
    pub config: AdsmendConfig,
    pub store: Box<dyn AssetStore>,
    command: &'static str,
}

impl Session {
    pub fn open(
        command: &'static str,
        customer_id: Option<&str>,
        overrides: &SafetyOverrides,
    ) -> Result<Self> {
        let paths = resolve_paths()?;
        let mut config = config::load_config(&paths)?;
        if let Some(id) = customer_id {
            config.google_ads.customer_id = config::normalize_customer_id(id);
        }
        config.safety = overrides.apply(config.safety);
        config::validate(&config)?;
        let store = open_store(&config, &paths)?;
        Ok(Self {
            paths,
            config,
            store,
            command,
        })
    }

    pub fn safety(&self) -> SafetyConfig {
        self.config.safety
    }

    pub fn audit(&self, phase: &str, status: &str, message: &str) -> Result<()> {
        audit::append_event(&self.paths, self.command, phase, status, message)
    }

    /// Loads the source group, falling back to a cached snapshot file when
    /// the store cannot serve it.
    pub fn load_source(&self, group: &str, fallback: Option<&Path>) -> Result<AssetSet> {
        match self.store.load(group) {
            Ok(assets) => Ok(assets),
            Err(err) => {
                let Some(path) = fallback else {
                    self.audit("load", "failed", &format!("source {group}: {err}"))?;
                    return Err(AdsmendError::SourceUnavailable {
                        group: group.to_string(),
                        reason: err.to_string(),
                    }
                    .into());
                };
                let reason = err.to_string();
                warn::emit(&WarnEvent {
                    code: "SOURCE_FALLBACK",
                    stage: "load",
                    action: "use-snapshot",
                    group,
                    entity: "source",
                    reason: &path.display().to_string(),
                    err: &reason,
                });
                let snapshot = read_snapshot(path).map_err(|snap_err| {
                    AdsmendError::SourceUnavailable {
                        group: group.to_string(),
                        reason: format!("{reason}; snapshot fallback failed: {snap_err}"),
                    }
                })?;
                Ok(snapshot.assets)
            }
        }
    }

    pub fn load_destination(&self, group: &str) -> Result<AssetSet> {
        self.store.load(group).map_err(|err| {
            AdsmendError::DestinationUnavailable {
                group: group.to_string(),
                reason: err.to_string(),
            }
            .into()
        })
    }

    pub fn describe_group(&self, report: &mut CommandReport, role: &str, group: &str) {
        match self.store.describe(group) {
            Ok(info) => report.detail(format!("{role}={}", info.label())),
            Err(err) => report.detail(format!("{role}=ad_group:{group} (describe failed: {err})")),
        }
    }

    /// Creation callback for the executor, bound to one destination group.
    pub fn creator<'a>(
        &'a self,
        group: &'a str,
    ) -> impl FnMut(&Entity, Option<AdStatus>) -> Result<String> + 'a {
        move |entity, status| {
            self.store.create(group, entity, status).map_err(|err| {
                AdsmendError::CreationFailed {
                    entity: entity.to_string(),
                    reason: err.to_string(),
                }
                .into()
            })
        }
    }
}

pub fn record_asset_counts(report: &mut CommandReport, role: &str, assets: &AssetSet) {
    report.detail(format!(
        "{role}.keywords={} ({} negative)",
        assets.keywords.len(),
        assets.negative_count()
    ));
    report.detail(format!("{role}.multi_slot_ads={}", assets.multi_slot_ads.len()));
    report.detail(format!("{role}.fixed_slot_ads={}", assets.fixed_slot_ads.len()));
    if !assets.pin_conflict_ads.is_empty() {
        report.detail(format!(
            "{role}.pin_conflict_ads={}",
            assets.pin_conflict_ads.len()
        ));
    }
}

/// Writes the plan breakdown, outcome counts, exclusions and failures.
/// Failures become issues so the command exits non-zero.
pub fn record_reconcile(report: &mut CommandReport, outcome: &ReconcileReport) {
    let plan = &outcome.plan;
    let considered = plan.to_create.len() + plan.to_skip.len() + outcome.excluded.len();
    report.detail(format!("considered={considered}"));

    let counts = plan.create_counts();
    for kind in [EntityKind::Keyword, EntityKind::Negative, EntityKind::Ad] {
        let verb = if outcome.result.dry_run {
            "would_create"
        } else {
            "planned"
        };
        report.detail(format!(
            "plan.{verb}.{}={}",
            kind.as_str(),
            counts.get(&kind).copied().unwrap_or(0)
        ));
    }
    for reason in [
        SkipReason::AlreadyExists,
        SkipReason::DuplicateWithinSource,
        SkipReason::NegativeNotRequested,
    ] {
        report.detail(format!(
            "plan.skip.{}={}",
            reason.as_str().replace(' ', "_"),
            plan.skip_count(reason)
        ));
    }

    let counts = outcome.outcomes();
    report.detail(format!("outcome.created={}", counts.created));
    report.detail(format!("outcome.skipped={}", counts.skipped));
    report.detail(format!("outcome.excluded={}", counts.excluded));
    report.detail(format!("outcome.failed={}", counts.failed));
    if outcome.result.dry_run {
        report.detail("dry-run: no changes were made".to_string());
        for entity in &plan.to_create {
            report.detail(format!("would create {entity}"));
        }
    }
    for id in &outcome.result.created_ids {
        report.detail(format!("created {id}"));
    }

    for excluded in &outcome.excluded {
        report.detail(format!(
            "excluded ad #{} \"{}\": {} ({})",
            excluded.source_index + 1,
            excluded.label,
            excluded.code,
            excluded.error
        ));
    }
    for failure in &outcome.result.failed {
        report.issue(failure.error.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_turn_policies_on_and_replace_modes() {
        let base = SafetyConfig {
            copy_negatives: true,
            ..SafetyConfig::default()
        };
        let overrides = SafetyOverrides {
            only_exact: true,
            pin_mode: Some(PinMode::Flexible),
            ..SafetyOverrides::default()
        };
        let got = overrides.apply(base);
        assert!(got.only_exact);
        assert!(got.copy_negatives);
        assert!(!got.dry_run);
        assert_eq!(got.pin_mode, PinMode::Flexible);
        assert_eq!(got.pad_mode, PadMode::Skip);
    }
}
