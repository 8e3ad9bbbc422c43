use crate::engine::identity::{IdentityKey, key};
use crate::engine::model::{Entity, EntityKind, MatchType};
use crate::engine::safety::SafetyConfig;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyExists,
    DuplicateWithinSource,
    NegativeNotRequested,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AlreadyExists => "already exists",
            Self::DuplicateWithinSource => "duplicate within source",
            Self::NegativeNotRequested => "negatives not requested",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntity {
    pub entity: Entity,
    pub reason: SkipReason,
}

/// Minimal creation plan. Keys in `to_create` are pairwise distinct and
/// absent from the destination as it was when the plan was computed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub to_create: Vec<Entity>,
    pub to_skip: Vec<SkippedEntity>,
}

impl Plan {
    pub fn create_counts(&self) -> BTreeMap<EntityKind, usize> {
        let mut out = BTreeMap::new();
        for entity in &self.to_create {
            *out.entry(entity.kind()).or_insert(0) += 1;
        }
        out
    }

    pub fn skip_count(&self, reason: SkipReason) -> usize {
        self.to_skip.iter().filter(|s| s.reason == reason).count()
    }
}

/// Policy rewrites applied before keying. Only positive keywords are forced
/// to EXACT, so a forced keyword keys like an existing EXACT one.
pub fn normalize(entity: &Entity, config: &SafetyConfig) -> Entity {
    match entity {
        Entity::Keyword(k) if config.only_exact && !k.is_negative => {
            let mut forced = k.clone();
            forced.match_type = MatchType::Exact;
            Entity::Keyword(forced)
        }
        other => other.clone(),
    }
}

pub fn plan(source: &[Entity], destination: &[Entity], config: &SafetyConfig) -> Plan {
    let destination_keys = destination.iter().map(key).collect::<HashSet<IdentityKey>>();
    let mut claimed = HashSet::new();
    let mut out = Plan::default();

    for raw in source {
        let entity = normalize(raw, config);
        if entity.kind() == EntityKind::Negative && !config.copy_negatives {
            out.to_skip.push(SkippedEntity {
                entity,
                reason: SkipReason::NegativeNotRequested,
            });
            continue;
        }

        let k = key(&entity);
        let reason = if destination_keys.contains(&k) {
            Some(SkipReason::AlreadyExists)
        } else if claimed.contains(&k) {
            Some(SkipReason::DuplicateWithinSource)
        } else {
            None
        };

        match reason {
            Some(reason) => out.to_skip.push(SkippedEntity { entity, reason }),
            None => {
                claimed.insert(k);
                out.to_create.push(entity);
            }
        }
    }

    out
}
