use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_HEADLINES: usize = 3;
pub const MAX_HEADLINES: usize = 15;
pub const MIN_DESCRIPTIONS: usize = 2;
pub const MAX_DESCRIPTIONS: usize = 4;
pub const MAX_PATH_SEGMENTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    Broad,
    Phrase,
    Exact,
}

impl MatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Broad => "BROAD",
            Self::Phrase => "PHRASE",
            Self::Exact => "EXACT",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "BROAD" => Some(Self::Broad),
            "PHRASE" => Some(Self::Phrase),
            "EXACT" => Some(Self::Exact),
            _ => None,
        }
    }
}

/// Initial serving state requested for a newly created asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdStatus {
    Enabled,
    Paused,
}

impl AdStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "ENABLED",
            Self::Paused => "PAUSED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub text: String,
    pub match_type: MatchType,
    #[serde(default)]
    pub is_negative: bool,
}

impl Keyword {
    pub fn positive(text: impl Into<String>, match_type: MatchType) -> Self {
        Self {
            text: text.into(),
            match_type,
            is_negative: false,
        }
    }

    pub fn negative(text: impl Into<String>, match_type: MatchType) -> Self {
        Self {
            text: text.into(),
            match_type,
            is_negative: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HeadlinePin {
    #[default]
    None,
    Pos1,
    Pos2,
    Pos3,
}

impl HeadlinePin {
    /// Pin for legacy headline slot `n` (1-based).
    pub fn for_slot(n: usize) -> Self {
        match n {
            1 => Self::Pos1,
            2 => Self::Pos2,
            3 => Self::Pos3,
            _ => Self::None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DescriptionPin {
    #[default]
    None,
    Pos1,
    Pos2,
}

impl DescriptionPin {
    pub fn for_slot(n: usize) -> Self {
        match n {
            1 => Self::Pos1,
            2 => Self::Pos2,
            _ => Self::None,
        }
    }
}

/// Common view over the two pin enums so slot validation is written once.
pub trait SlotPin: Copy + Eq + std::hash::Hash {
    fn is_pinned(self) -> bool;
}

impl SlotPin for HeadlinePin {
    fn is_pinned(self) -> bool {
        self != Self::None
    }
}

impl SlotPin for DescriptionPin {
    fn is_pinned(self) -> bool {
        self != Self::None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotText<P> {
    pub text: String,
    #[serde(default)]
    pub pin: P,
}

impl<P: SlotPin> SlotText<P> {
    pub fn new(text: impl Into<String>, pin: P) -> Self {
        Self {
            text: text.into(),
            pin,
        }
    }
}

pub type Headline = SlotText<HeadlinePin>;
pub type Description = SlotText<DescriptionPin>;

#[derive(Debug, Clone, Deserialize)]
struct RawMultiSlotAd {
    headlines: Vec<Headline>,
    descriptions: Vec<Description>,
    #[serde(default)]
    final_urls: Vec<String>,
    #[serde(default)]
    path_segments: Vec<String>,
}

/// Responsive ad content: a pool of optionally pinned headlines and
/// descriptions. Only constructible through [`MultiSlotAd::new`], which
/// enforces slot counts and pin uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMultiSlotAd")]
pub struct MultiSlotAd {
    headlines: Vec<Headline>,
    descriptions: Vec<Description>,
    final_urls: Vec<String>,
    path_segments: Vec<String>,
}

impl TryFrom<RawMultiSlotAd> for MultiSlotAd {
    type Error = ModelError;

    fn try_from(raw: RawMultiSlotAd) -> Result<Self, Self::Error> {
        MultiSlotAd::new(
            raw.headlines,
            raw.descriptions,
            raw.final_urls,
            raw.path_segments,
        )
    }
}

fn check_unique_pins<P: SlotPin>(
    slots: &[SlotText<P>],
    class: &'static str,
) -> Result<(), ModelError> {
    let mut seen = std::collections::HashSet::new();
    for slot in slots {
        if slot.pin.is_pinned() && !seen.insert(slot.pin) {
            return Err(ModelError::DuplicatePin { class });
        }
    }
    Ok(())
}

impl MultiSlotAd {
    pub fn new(
        headlines: Vec<Headline>,
        descriptions: Vec<Description>,
        final_urls: Vec<String>,
        path_segments: Vec<String>,
    ) -> Result<Self, ModelError> {
        if !(MIN_HEADLINES..=MAX_HEADLINES).contains(&headlines.len()) {
            return Err(ModelError::SlotCount {
                class: "headline",
                count: headlines.len(),
                min: MIN_HEADLINES,
                max: MAX_HEADLINES,
            });
        }
        if !(MIN_DESCRIPTIONS..=MAX_DESCRIPTIONS).contains(&descriptions.len()) {
            return Err(ModelError::SlotCount {
                class: "description",
                count: descriptions.len(),
                min: MIN_DESCRIPTIONS,
                max: MAX_DESCRIPTIONS,
            });
        }
        if path_segments.len() > MAX_PATH_SEGMENTS {
            return Err(ModelError::TooManyPathSegments(path_segments.len()));
        }
        check_unique_pins(&headlines, "headline")?;
        check_unique_pins(&descriptions, "description")?;

        Ok(Self {
            headlines,
            descriptions,
            final_urls,
            path_segments,
        })
    }

    /// Builds the ad with every pin dropped. For stored ads whose pinning
    /// is inconsistent but whose content still has to be recognized.
    pub fn unpinned(
        headlines: Vec<Headline>,
        descriptions: Vec<Description>,
        final_urls: Vec<String>,
        path_segments: Vec<String>,
    ) -> Result<Self, ModelError> {
        let headlines = headlines
            .into_iter()
            .map(|h| Headline::new(h.text, HeadlinePin::None))
            .collect();
        let descriptions = descriptions
            .into_iter()
            .map(|d| Description::new(d.text, DescriptionPin::None))
            .collect();
        Self::new(headlines, descriptions, final_urls, path_segments)
    }

    pub fn headlines(&self) -> &[Headline] {
        &self.headlines
    }

    pub fn descriptions(&self) -> &[Description] {
        &self.descriptions
    }

    pub fn final_urls(&self) -> &[String] {
        &self.final_urls
    }

    pub fn path_segments(&self) -> &[String] {
        &self.path_segments
    }

    pub fn is_fully_flexible(&self) -> bool {
        self.headlines.iter().all(|h| !h.pin.is_pinned())
            && self.descriptions.iter().all(|d| !d.pin.is_pinned())
    }

    pub fn pinned_count(&self) -> usize {
        self.headlines.iter().filter(|h| h.pin.is_pinned()).count()
            + self
                .descriptions
                .iter()
                .filter(|d| d.pin.is_pinned())
                .count()
    }
}

/// Legacy fixed-position ad. Slot N always renders in position N.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FixedSlotAd {
    pub headline_1: String,
    #[serde(default)]
    pub headline_2: Option<String>,
    #[serde(default)]
    pub headline_3: Option<String>,
    pub description_1: String,
    #[serde(default)]
    pub description_2: Option<String>,
    #[serde(default)]
    pub final_urls: Vec<String>,
    #[serde(default)]
    pub path_segments: Vec<String>,
}

fn present(slot: Option<&str>) -> Option<&str> {
    slot.map(str::trim).filter(|s| !s.is_empty())
}

impl FixedSlotAd {
    /// Present headline slots as `(slot_number, text)`, blanks dropped.
    pub fn headline_slots(&self) -> Vec<(usize, &str)> {
        [
            Some(self.headline_1.as_str()),
            self.headline_2.as_deref(),
            self.headline_3.as_deref(),
        ]
        .into_iter()
        .enumerate()
        .filter_map(|(i, slot)| present(slot).map(|t| (i + 1, t)))
        .collect()
    }

    pub fn description_slots(&self) -> Vec<(usize, &str)> {
        [Some(self.description_1.as_str()), self.description_2.as_deref()]
            .into_iter()
            .enumerate()
            .filter_map(|(i, slot)| present(slot).map(|t| (i + 1, t)))
            .collect()
    }
}

/// Anything the engine can plan and create at a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Keyword(Keyword),
    Ad(MultiSlotAd),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Keyword,
    Negative,
    Ad,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Negative => "negative",
            Self::Ad => "ad",
        }
    }
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Keyword(k) if k.is_negative => EntityKind::Negative,
            Self::Keyword(_) => EntityKind::Keyword,
            Self::Ad(_) => EntityKind::Ad,
        }
    }

    /// Status to request on creation. Negatives have no serving state.
    pub fn initial_status(&self, pause_on_create: bool) -> Option<AdStatus> {
        if self.kind() == EntityKind::Negative {
            return None;
        }
        Some(if pause_on_create {
            AdStatus::Paused
        } else {
            AdStatus::Enabled
        })
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(k) => write!(
                f,
                "{} \"{}\" [{}]",
                self.kind().as_str(),
                k.text,
                k.match_type.as_str()
            ),
            Self::Ad(ad) => {
                let heads = ad
                    .headlines()
                    .iter()
                    .take(3)
                    .map(|h| h.text.as_str())
                    .collect::<Vec<_>>();
                write!(f, "ad \"{}\"", heads.join(" | "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heads(texts: &[&str]) -> Vec<Headline> {
        texts
            .iter()
            .map(|t| Headline::new(*t, HeadlinePin::None))
            .collect()
    }

    fn descs(texts: &[&str]) -> Vec<Description> {
        texts
            .iter()
            .map(|t| Description::new(*t, DescriptionPin::None))
            .collect()
    }

    #[test]
    fn multi_slot_ad_rejects_too_few_headlines() {
        let err = MultiSlotAd::new(heads(&["A", "B"]), descs(&["x", "y"]), vec![], vec![])
            .expect_err("two headlines are below the minimum");
        assert!(matches!(err, ModelError::SlotCount { class: "headline", count: 2, .. }));
    }

    #[test]
    fn multi_slot_ad_rejects_shared_pin_position() {
        let mut h = heads(&["A", "B", "C"]);
        h[0].pin = HeadlinePin::Pos1;
        h[2].pin = HeadlinePin::Pos1;
        let err = MultiSlotAd::new(h, descs(&["x", "y"]), vec![], vec![])
            .expect_err("duplicate pin must be rejected");
        assert!(matches!(err, ModelError::DuplicatePin { class: "headline" }));
    }

    #[test]
    fn unpinned_clears_colliding_pins() {
        let mut h = heads(&["A", "B", "C"]);
        h[0].pin = HeadlinePin::Pos1;
        h[1].pin = HeadlinePin::Pos1;
        let mut d = descs(&["x", "y"]);
        d[1].pin = DescriptionPin::Pos2;
        let ad = MultiSlotAd::unpinned(h, d, vec![], vec![]).expect("pins cleared");
        assert!(ad.is_fully_flexible());
        assert_eq!(ad.headlines()[1].text, "B");
    }

    #[test]
    fn deserialization_goes_through_invariants() {
        let raw = r#"{"headlines":[{"text":"A"},{"text":"B"}],"descriptions":[{"text":"x"},{"text":"y"}]}"#;
        assert!(serde_json::from_str::<MultiSlotAd>(raw).is_err());

        let raw = r#"{"headlines":[{"text":"A","pin":"POS1"},{"text":"B"},{"text":"C"}],"descriptions":[{"text":"x"},{"text":"y"}],"final_urls":["https://example.com"]}"#;
        let ad: MultiSlotAd = serde_json::from_str(raw).expect("valid ad");
        assert_eq!(ad.pinned_count(), 1);
        assert!(!ad.is_fully_flexible());
    }

    #[test]
    fn fixed_slot_ad_drops_blank_slots_but_keeps_slot_numbers() {
        let ad = FixedSlotAd {
            headline_1: "One".into(),
            headline_2: Some("   ".into()),
            headline_3: Some("Three".into()),
            description_1: "Desc".into(),
            ..FixedSlotAd::default()
        };
        assert_eq!(ad.headline_slots(), vec![(1, "One"), (3, "Three")]);
        assert_eq!(ad.description_slots(), vec![(1, "Desc")]);
    }

    #[test]
    fn negatives_never_get_an_initial_status() {
        let neg = Entity::Keyword(Keyword::negative("free", MatchType::Broad));
        let pos = Entity::Keyword(Keyword::positive("school", MatchType::Exact));
        assert_eq!(neg.initial_status(true), None);
        assert_eq!(pos.initial_status(true), Some(AdStatus::Paused));
        assert_eq!(pos.initial_status(false), Some(AdStatus::Enabled));
    }
}
