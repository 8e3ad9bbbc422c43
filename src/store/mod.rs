pub mod google_ads;
pub mod snapshot;

use crate::engine::config::{AdsmendConfig, StoreBackend};
use crate::engine::model::{AdStatus, Entity, FixedSlotAd, Keyword, MultiSlotAd};
use crate::engine::paths::AdsmendPaths;
use crate::error::StoreError;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Everything the engine reads from one ad group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSet {
    pub keywords: Vec<Keyword>,
    pub multi_slot_ads: Vec<MultiSlotAd>,
    pub fixed_slot_ads: Vec<FixedSlotAd>,
    /// Stored ads whose pins collide, loaded with pins cleared. They hold
    /// an identity at this group but are never copied elsewhere.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pin_conflict_ads: Vec<MultiSlotAd>,
}

impl AssetSet {
    /// Keywords first, then multi-slot ads, each in stored order.
    pub fn entities(&self) -> Vec<Entity> {
        self.keywords
            .iter()
            .cloned()
            .map(Entity::Keyword)
            .chain(self.multi_slot_ads.iter().cloned().map(Entity::Ad))
            .collect()
    }

    /// Everything already occupying an identity here, for use as the
    /// destination side of a plan.
    pub fn existing_entities(&self) -> Vec<Entity> {
        let mut out = self.entities();
        out.extend(self.pin_conflict_ads.iter().cloned().map(Entity::Ad));
        out
    }

    pub fn push(&mut self, entity: Entity) {
        match entity {
            Entity::Keyword(k) => self.keywords.push(k),
            Entity::Ad(ad) => self.multi_slot_ads.push(ad),
        }
    }

    pub fn negative_count(&self) -> usize {
        self.keywords.iter().filter(|k| k.is_negative).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupInfo {
    pub id: String,
    pub name: Option<String>,
    pub status: Option<String>,
    pub campaign: Option<String>,
}

impl GroupInfo {
    pub fn label(&self) -> String {
        let mut out = self.name.clone().unwrap_or_else(|| format!("ad_group:{}", self.id));
        if let Some(status) = &self.status {
            out.push_str(&format!(" (status={status})"));
        }
        if let Some(campaign) = &self.campaign {
            out.push_str(&format!(" in campaign '{campaign}'"));
        }
        out
    }
}

/// Remote collection of ad groups. Reads reflect current state; creation is
/// one entity per call.
pub trait AssetStore {
    fn backend(&self) -> &'static str;
    fn describe(&self, group: &str) -> Result<GroupInfo, StoreError>;
    fn load(&self, group: &str) -> Result<AssetSet, StoreError>;
    fn create(
        &self,
        group: &str,
        entity: &Entity,
        status: Option<AdStatus>,
    ) -> Result<String, StoreError>;
}

pub fn open_store(cfg: &AdsmendConfig, paths: &AdsmendPaths) -> Result<Box<dyn AssetStore>> {
    match cfg.store.backend {
        StoreBackend::Snapshot => Ok(Box::new(snapshot::SnapshotStore::new(
            cfg.snapshot_dir(paths),
        ))),
        StoreBackend::GoogleAds => Ok(Box::new(google_ads::GoogleAdsStore::from_config(
            &cfg.google_ads,
        )?)),
    }
}
