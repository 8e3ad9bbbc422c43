use crate::engine::model::{Entity, Keyword, MatchType, MultiSlotAd};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Content-derived identity of an asset. Platform ids do not survive
/// deletion and recreation, so they never participate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentityKey {
    Keyword {
        text: String,
        match_type: MatchType,
        is_negative: bool,
    },
    /// Every component is sorted, and pins are stripped: pinning is a
    /// rendering preference, not content.
    Ad {
        headlines: Vec<String>,
        descriptions: Vec<String>,
        final_urls: Vec<String>,
        path_segments: Vec<String>,
    },
}

/// Trim, collapse internal whitespace, lowercase.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn sorted_trimmed<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out = items
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect::<Vec<_>>();
    out.sort();
    out
}

/// Final URLs are a set: repeats collapse.
fn url_set<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out = sorted_trimmed(items);
    out.dedup();
    out
}

pub fn keyword_key(keyword: &Keyword) -> IdentityKey {
    IdentityKey::Keyword {
        text: normalize_text(&keyword.text),
        match_type: keyword.match_type,
        is_negative: keyword.is_negative,
    }
}

pub fn ad_key(ad: &MultiSlotAd) -> IdentityKey {
    IdentityKey::Ad {
        headlines: sorted_trimmed(ad.headlines().iter().map(|h| h.text.as_str())),
        descriptions: sorted_trimmed(ad.descriptions().iter().map(|d| d.text.as_str())),
        final_urls: url_set(ad.final_urls().iter().map(String::as_str)),
        path_segments: sorted_trimmed(ad.path_segments().iter().map(String::as_str)),
    }
}

pub fn key(entity: &Entity) -> IdentityKey {
    match entity {
        Entity::Keyword(k) => keyword_key(k),
        Entity::Ad(ad) => ad_key(ad),
    }
}

impl IdentityKey {
    /// Stable SHA-256 hex of the canonical JSON form.
    pub fn digest(&self) -> String {
        let canonical = serde_json::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn short_digest(&self) -> String {
        self.digest().chars().take(12).collect()
    }
}
