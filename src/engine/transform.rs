use crate::engine::identity::normalize_text;
use crate::engine::model::{
    Description, DescriptionPin, FixedSlotAd, Headline, HeadlinePin, MIN_DESCRIPTIONS,
    MIN_HEADLINES, MultiSlotAd, SlotPin, SlotText,
};
use crate::engine::safety::{PadMode, PinMode};
use crate::error::TransformError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const DEFAULT_FILLER_HEADLINES: [&str; 6] = [
    "Official Site",
    "Get Started Today",
    "Learn More Online",
    "Flexible Options Available",
    "Trusted by Thousands",
    "Start Any Time",
];

const DEFAULT_FILLER_DESCRIPTIONS: [&str; 4] = [
    "Explore our options and find the right fit for you.",
    "Friendly support from start to finish. Get in touch today.",
    "Simple online sign-up. Talk to our team in minutes.",
    "Quality you can count on, with flexible scheduling.",
];

/// Ordered filler strings used by generic padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillerPool {
    pub headlines: Vec<String>,
    pub descriptions: Vec<String>,
}

impl Default for FillerPool {
    fn default() -> Self {
        Self {
            headlines: DEFAULT_FILLER_HEADLINES.iter().map(|s| s.to_string()).collect(),
            descriptions: DEFAULT_FILLER_DESCRIPTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl FillerPool {
    /// Blank or repeated entries make a pool unusable for padding.
    pub fn problems(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (class, pool) in [("headline", &self.headlines), ("description", &self.descriptions)] {
            if pool.is_empty() {
                out.push(format!("{class} filler pool is empty"));
                continue;
            }
            let mut seen = HashSet::new();
            for entry in pool {
                let norm = normalize_text(entry);
                if norm.is_empty() {
                    out.push(format!("{class} filler pool has a blank entry"));
                } else if !seen.insert(norm) {
                    out.push(format!("{class} filler pool repeats `{}`", entry.trim()));
                }
            }
        }
        out
    }
}

/// Audit record of one fixed-slot to multi-slot lift.
#[derive(Debug, Clone)]
pub struct Transformation<'a> {
    pub source: &'a FixedSlotAd,
    pub ad: MultiSlotAd,
    pub pin_mode: PinMode,
    pub padded_slots: usize,
}

fn lift_slots<P: SlotPin + Default>(
    slots: Vec<(usize, &str)>,
    pin_mode: PinMode,
    pin_for_slot: fn(usize) -> P,
) -> Vec<SlotText<P>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (slot, text) in slots {
        if !seen.insert(normalize_text(text)) {
            continue;
        }
        let pin = match pin_mode {
            PinMode::Legacy => pin_for_slot(slot),
            PinMode::Flexible => P::default(),
        };
        out.push(SlotText::new(text, pin));
    }
    out
}

/// Appends unpinned fillers until `min` is reached. A filler matching any
/// text already in the ad is passed over; walking the pool a second time
/// could only meet text already used, so one pass decides exhaustion.
fn pad_slots<P: SlotPin + Default>(
    slots: &mut Vec<SlotText<P>>,
    min: usize,
    pool: &[String],
    class: &'static str,
) -> Result<usize, TransformError> {
    let mut used = slots
        .iter()
        .map(|s| normalize_text(&s.text))
        .collect::<HashSet<_>>();
    let mut added = 0usize;
    for filler in pool {
        if slots.len() >= min {
            break;
        }
        let norm = normalize_text(filler);
        if norm.is_empty() || !used.insert(norm) {
            continue;
        }
        slots.push(SlotText::new(filler.trim(), P::default()));
        added += 1;
    }
    if slots.len() < min {
        return Err(TransformError::PaddingExhausted {
            class,
            have: slots.len(),
            need: min,
        });
    }
    Ok(added)
}

pub fn transform<'a>(
    source: &'a FixedSlotAd,
    pad_mode: PadMode,
    pin_mode: PinMode,
    pool: &FillerPool,
) -> Result<Transformation<'a>, TransformError> {
    let final_urls = source
        .final_urls
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .map(ToOwned::to_owned)
        .collect::<Vec<_>>();
    if final_urls.is_empty() {
        return Err(TransformError::InsufficientContent(
            "no final url".to_string(),
        ));
    }

    let mut headlines: Vec<Headline> =
        lift_slots(source.headline_slots(), pin_mode, HeadlinePin::for_slot);
    let mut descriptions: Vec<Description> =
        lift_slots(source.description_slots(), pin_mode, DescriptionPin::for_slot);
    if headlines.is_empty() || descriptions.is_empty() {
        return Err(TransformError::InsufficientContent(format!(
            "{} headlines, {} descriptions present",
            headlines.len(),
            descriptions.len()
        )));
    }

    let short = headlines.len() < MIN_HEADLINES || descriptions.len() < MIN_DESCRIPTIONS;
    let mut padded_slots = 0usize;
    if short {
        match pad_mode {
            PadMode::Skip => {
                return Err(TransformError::InsufficientContent(format!(
                    "{} distinct headlines (need {MIN_HEADLINES}), {} distinct descriptions (need {MIN_DESCRIPTIONS})",
                    headlines.len(),
                    descriptions.len()
                )));
            }
            PadMode::Generic => {
                padded_slots += pad_slots(&mut headlines, MIN_HEADLINES, &pool.headlines, "headline")?;
                padded_slots += pad_slots(
                    &mut descriptions,
                    MIN_DESCRIPTIONS,
                    &pool.descriptions,
                    "description",
                )?;
            }
        }
    }

    let path_segments = source
        .path_segments
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(ToOwned::to_owned)
        .collect::<Vec<_>>();

    let ad = MultiSlotAd::new(headlines, descriptions, final_urls, path_segments)?;
    Ok(Transformation {
        source,
        ad,
        pin_mode,
        padded_slots,
    })
}
