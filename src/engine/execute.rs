use crate::engine::model::{AdStatus, Entity};
use crate::engine::plan::Plan;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
    pub dry_run: bool,
    pub pause_on_create: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedCreation {
    pub entity: Entity,
    pub error: String,
}

/// Outcome of one apply call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Created { remote_id: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultReport {
    pub dry_run: bool,
    pub created: usize,
    pub skipped: usize,
    pub failed: Vec<FailedCreation>,
    pub created_ids: Vec<String>,
}

impl ResultReport {
    fn absorb(mut self, entity: &Entity, outcome: ItemOutcome) -> Self {
        match outcome {
            ItemOutcome::Created { remote_id } => {
                self.created += 1;
                self.created_ids.push(remote_id);
            }
            ItemOutcome::Failed { error } => self.failed.push(FailedCreation {
                entity: entity.clone(),
                error,
            }),
        }
        self
    }
}

/// Applies `plan.to_create` in order. A failing item is recorded and the
/// remaining items are still attempted. Dry runs never call `apply`.
pub fn execute<F>(plan: &Plan, mut apply: F, opts: ExecuteOptions) -> ResultReport
where
    F: FnMut(&Entity, Option<AdStatus>) -> anyhow::Result<String>,
{
    let base = ResultReport {
        dry_run: opts.dry_run,
        skipped: plan.to_skip.len(),
        ..ResultReport::default()
    };

    if opts.dry_run {
        return ResultReport {
            created: plan.to_create.len(),
            ..base
        };
    }

    plan.to_create.iter().fold(base, |report, entity| {
        let status = entity.initial_status(opts.pause_on_create);
        let outcome = match apply(entity, status) {
            Ok(remote_id) => ItemOutcome::Created { remote_id },
            Err(err) => ItemOutcome::Failed {
                error: format!("{err:#}"),
            },
        };
        report.absorb(entity, outcome)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::model::{Keyword, MatchType};
    use crate::engine::plan::{SkipReason, SkippedEntity};

    fn plan_of(n: usize) -> Plan {
        Plan {
            to_create: (1..=n)
                .map(|i| Entity::Keyword(Keyword::positive(format!("kw {i}"), MatchType::Exact)))
                .collect(),
            to_skip: vec![SkippedEntity {
                entity: Entity::Keyword(Keyword::positive("old", MatchType::Exact)),
                reason: SkipReason::AlreadyExists,
            }],
        }
    }

    #[test]
    fn dry_run_reads_back_the_plan_without_applying() {
        let mut calls = 0usize;
        let report = execute(
            &plan_of(4),
            |_, _| {
                calls += 1;
                anyhow::bail!("must not be called")
            },
            ExecuteOptions {
                dry_run: true,
                pause_on_create: false,
            },
        );
        assert_eq!(calls, 0);
        assert_eq!(report.created, 4);
        assert_eq!(report.skipped, 1);
        assert!(report.failed.is_empty());
        assert!(report.dry_run);
    }

    #[test]
    fn one_failure_does_not_abort_the_rest() {
        let mut attempted = Vec::new();
        let report = execute(
            &plan_of(5),
            |entity, _| {
                let Entity::Keyword(k) = entity else {
                    anyhow::bail!("unexpected entity");
                };
                attempted.push(k.text.clone());
                if k.text == "kw 3" {
                    anyhow::bail!("remote rejected");
                }
                Ok(format!("id-{}", k.text))
            },
            ExecuteOptions::default(),
        );
        assert_eq!(attempted, vec!["kw 1", "kw 2", "kw 3", "kw 4", "kw 5"]);
        assert_eq!(report.created, 4);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].error, "remote rejected");
        assert_eq!(report.created_ids.len(), 4);
    }

    #[test]
    fn pause_on_create_sets_status_except_for_negatives() {
        let plan = Plan {
            to_create: vec![
                Entity::Keyword(Keyword::positive("a", MatchType::Exact)),
                Entity::Keyword(Keyword::negative("b", MatchType::Exact)),
            ],
            to_skip: vec![],
        };
        let mut seen = Vec::new();
        execute(
            &plan,
            |_, status| {
                seen.push(status);
                Ok("id".to_string())
            },
            ExecuteOptions {
                dry_run: false,
                pause_on_create: true,
            },
        );
        assert_eq!(seen, vec![Some(AdStatus::Paused), None]);
    }
}
