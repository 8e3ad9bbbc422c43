use crate::engine::execute::{ExecuteOptions, ResultReport, execute};
use crate::engine::identity::key;
use crate::engine::model::{AdStatus, Entity, FixedSlotAd};
use crate::engine::plan::{Plan, plan};
use crate::engine::safety::{PinMode, SafetyConfig};
use crate::engine::transform::{FillerPool, transform};
use crate::engine::warn::{self, WarnEvent};
use crate::error::TransformError;
use serde::Serialize;

/// A source ad that never reached the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedAd {
    pub source_index: usize,
    pub label: String,
    pub code: &'static str,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformRecord {
    pub source_index: usize,
    pub label: String,
    pub pin_mode: PinMode,
    pub padded_slots: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Lifted {
    pub candidates: Vec<Entity>,
    pub excluded: Vec<ExcludedAd>,
    pub records: Vec<TransformRecord>,
}

fn fixed_label(ad: &FixedSlotAd) -> String {
    let heads = ad
        .headline_slots()
        .into_iter()
        .map(|(_, text)| text)
        .collect::<Vec<_>>();
    if heads.is_empty() {
        "(no headlines)".to_string()
    } else {
        heads.join(" | ")
    }
}

fn exclude(index: usize, ad: &FixedSlotAd, err: &TransformError) -> ExcludedAd {
    ExcludedAd {
        source_index: index,
        label: fixed_label(ad),
        code: err.code(),
        error: err.to_string(),
    }
}

/// Lifts every fixed-slot ad in source order. Failures are collected, never
/// propagated.
pub fn lift_fixed_ads(ads: &[FixedSlotAd], config: &SafetyConfig, pool: &FillerPool) -> Lifted {
    let mut out = Lifted::default();
    for (index, ad) in ads.iter().enumerate() {
        match transform(ad, config.pad_mode, config.pin_mode, pool) {
            Ok(lifted) => {
                out.records.push(TransformRecord {
                    source_index: index,
                    label: fixed_label(lifted.source),
                    pin_mode: lifted.pin_mode,
                    padded_slots: lifted.padded_slots,
                });
                out.candidates.push(Entity::Ad(lifted.ad));
            }
            Err(err) => out.excluded.push(exclude(index, ad, &err)),
        }
    }
    out
}

/// Counts for the four non-overlapping outcome categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub created: usize,
    pub skipped: usize,
    pub excluded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub plan: Plan,
    pub excluded: Vec<ExcludedAd>,
    pub result: ResultReport,
}

impl ReconcileReport {
    pub fn outcomes(&self) -> OutcomeCounts {
        OutcomeCounts {
            created: self.result.created,
            skipped: self.plan.to_skip.len(),
            excluded: self.excluded.len(),
            failed: self.result.failed.len(),
        }
    }
}

/// Plans `source` against `destination` and executes the plan through
/// `apply`. `excluded` carries transformation failures so the report covers
/// every entity considered.
pub fn reconcile<F>(
    group: &str,
    source: &[Entity],
    destination: &[Entity],
    excluded: Vec<ExcludedAd>,
    config: &SafetyConfig,
    apply: F,
) -> ReconcileReport
where
    F: FnMut(&Entity, Option<AdStatus>) -> anyhow::Result<String>,
{
    for ad in &excluded {
        warn::emit(&WarnEvent {
            code: ad.code,
            stage: "transform",
            action: "exclude",
            group,
            entity: &ad.label,
            reason: "fixed-slot ad cannot be lifted",
            err: &ad.error,
        });
    }

    let plan = plan(source, destination, config);
    let result = execute(
        &plan,
        apply,
        ExecuteOptions {
            dry_run: config.dry_run,
            pause_on_create: config.pause_on_create,
        },
    );

    for failure in &result.failed {
        let digest = key(&failure.entity).short_digest();
        warn::emit(&WarnEvent {
            code: "CREATION_FAILED",
            stage: "execute",
            action: "continue",
            group,
            entity: &digest,
            reason: failure.entity.kind().as_str(),
            err: &failure.error,
        });
    }

    ReconcileReport {
        plan,
        excluded,
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::model::{Keyword, MatchType};
    use crate::engine::plan::SkipReason;
    use crate::engine::safety::PadMode;

    fn fixed(heads: &[&str], descs: &[&str]) -> FixedSlotAd {
        FixedSlotAd {
            headline_1: heads.first().copied().unwrap_or_default().to_string(),
            headline_2: heads.get(1).map(|s| s.to_string()),
            headline_3: heads.get(2).map(|s| s.to_string()),
            description_1: descs.first().copied().unwrap_or_default().to_string(),
            description_2: descs.get(1).map(|s| s.to_string()),
            final_urls: vec!["https://example.com".to_string()],
            path_segments: vec![],
        }
    }

    #[test]
    fn short_ads_are_excluded_not_planned() {
        let ads = vec![
            fixed(&["A", "B", "C"], &["x", "y"]),
            fixed(&["A", "B"], &["x", "y"]),
        ];
        let lifted = lift_fixed_ads(&ads, &SafetyConfig::default(), &FillerPool::default());
        assert_eq!(lifted.candidates.len(), 1);
        assert_eq!(lifted.excluded.len(), 1);
        assert_eq!(lifted.excluded[0].source_index, 1);
        assert_eq!(lifted.excluded[0].code, "INSUFFICIENT_CONTENT");
        assert_eq!(lifted.records[0].padded_slots, 0);
    }

    #[test]
    fn generic_padding_records_padded_slots() {
        let config = SafetyConfig {
            pad_mode: PadMode::Generic,
            ..SafetyConfig::default()
        };
        let lifted = lift_fixed_ads(
            &[fixed(&["A", "B"], &["x"])],
            &config,
            &FillerPool::default(),
        );
        assert!(lifted.excluded.is_empty());
        assert_eq!(lifted.records[0].padded_slots, 2);
        assert_eq!(lifted.records[0].label, "A | B");
    }

    #[test]
    fn four_outcome_categories_do_not_overlap() {
        let config = SafetyConfig::default();
        let lifted = lift_fixed_ads(
            &[
                fixed(&["A", "B", "C"], &["x", "y"]),
                fixed(&["D", "E", "F"], &["x", "y"]),
                fixed(&["G"], &["x", "y"]),
            ],
            &config,
            &FillerPool::default(),
        );
        let mut source = lifted.candidates.clone();
        source.push(Entity::Keyword(Keyword::positive("kw", MatchType::Exact)));
        let destination = vec![lifted.candidates[0].clone()];

        let report = reconcile("200", &source, &destination, lifted.excluded, &config, |e, _| {
            if matches!(e, Entity::Keyword(_)) {
                anyhow::bail!("rejected");
            }
            Ok("id".to_string())
        });
        let counts = report.outcomes();
        assert_eq!(
            counts,
            OutcomeCounts {
                created: 1,
                skipped: 1,
                excluded: 1,
                failed: 1,
            }
        );
        assert_eq!(report.plan.skip_count(SkipReason::AlreadyExists), 1);
    }

    #[test]
    fn second_run_against_absorbed_destination_creates_nothing() {
        let config = SafetyConfig::default();
        let source = vec![
            Entity::Keyword(Keyword::positive("a", MatchType::Exact)),
            Entity::Keyword(Keyword::positive("b", MatchType::Phrase)),
        ];
        let mut destination = Vec::new();
        let first = reconcile("200", &source, &destination, vec![], &config, |_, _| {
            Ok("id".to_string())
        });
        destination.extend(first.plan.to_create.iter().cloned());

        let second = reconcile("200", &source, &destination, vec![], &config, |_, _| {
            anyhow::bail!("must not be called")
        });
        assert!(second.plan.to_create.is_empty());
        assert_eq!(second.outcomes().skipped, 2);
    }
}
