use anyhow::{Context, Result};
use std::collections::BTreeMap;

use crate::commands::{CommandReport, SafetyOverrides, Session, record_asset_counts};
use crate::engine::identity::ad_key;
use crate::engine::model::MultiSlotAd;
use crate::store::AssetSet;

#[derive(Debug, Clone)]
pub struct InventoryOptions {
    pub group: String,
    pub limit: usize,
    pub customer_id: Option<String>,
}

fn match_type_counts(assets: &AssetSet, negative: bool) -> BTreeMap<&'static str, usize> {
    let mut out = BTreeMap::new();
    for kw in assets.keywords.iter().filter(|k| k.is_negative == negative) {
        *out.entry(kw.match_type.as_str()).or_insert(0) += 1;
    }
    out
}

fn ad_summary(index: usize, ad: &MultiSlotAd) -> String {
    let url = ad.final_urls().first().map(String::as_str).unwrap_or("-");
    let heads = ad
        .headlines()
        .iter()
        .take(3)
        .map(|h| h.text.as_str())
        .collect::<Vec<_>>();
    let descs = ad
        .descriptions()
        .iter()
        .take(2)
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>();
    format!(
        "ad {index} [{}] url={url} layout={} pinned={} headlines=\"{}\" descriptions=\"{}\"",
        ad_key(ad).short_digest(),
        if ad.is_fully_flexible() { "flexible" } else { "pinned" },
        ad.pinned_count(),
        heads.join(" | "),
        descs.join(" | ")
    )
}

pub fn run(opts: &InventoryOptions) -> Result<CommandReport> {
    let session = Session::open(
        "inventory",
        opts.customer_id.as_deref(),
        &SafetyOverrides::default(),
    )?;
    let mut report = CommandReport::new("inventory");
    session.describe_group(&mut report, "group", &opts.group);

    let assets = session
        .store
        .load(&opts.group)
        .with_context(|| format!("failed to load ad group {}", opts.group))?;
    record_asset_counts(&mut report, "group", &assets);

    for (label, negative) in [("positive", false), ("negative", true)] {
        for (match_type, count) in match_type_counts(&assets, negative) {
            report.detail(format!("{label}.{match_type}={count}"));
        }
    }

    let positives = assets.keywords.iter().filter(|k| !k.is_negative);
    for kw in positives.clone().take(opts.limit) {
        report.detail(format!("keyword {}: {}", kw.match_type.as_str(), kw.text));
    }
    let total = positives.count();
    if total > opts.limit {
        report.detail(format!("... (+{} more)", total - opts.limit));
    }

    for (i, ad) in assets.multi_slot_ads.iter().enumerate().take(opts.limit) {
        report.detail(ad_summary(i + 1, ad));
    }
    if assets.multi_slot_ads.len() > opts.limit {
        report.detail(format!(
            "... (+{} more ads)",
            assets.multi_slot_ads.len() - opts.limit
        ));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::model::{Description, DescriptionPin, Headline, HeadlinePin, Keyword, MatchType};

    #[test]
    fn match_types_are_counted_per_polarity() {
        let assets = AssetSet {
            keywords: vec![
                Keyword::positive("a", MatchType::Exact),
                Keyword::positive("b", MatchType::Exact),
                Keyword::positive("c", MatchType::Broad),
                Keyword::negative("d", MatchType::Exact),
            ],
            ..AssetSet::default()
        };
        let pos = match_type_counts(&assets, false);
        assert_eq!(pos.get("EXACT"), Some(&2));
        assert_eq!(pos.get("BROAD"), Some(&1));
        assert_eq!(match_type_counts(&assets, true).get("EXACT"), Some(&1));
    }

    #[test]
    fn ad_summary_shows_three_headlines_and_two_descriptions() {
        let ad = MultiSlotAd::new(
            ["A", "B", "C", "D"]
                .iter()
                .map(|t| Headline::new(*t, HeadlinePin::None))
                .collect(),
            ["x", "y", "z"]
                .iter()
                .map(|t| Description::new(*t, DescriptionPin::None))
                .collect(),
            vec!["https://example.com".into()],
            vec![],
        )
        .expect("valid");
        let line = ad_summary(1, &ad);
        assert!(line.contains("headlines=\"A | B | C\""));
        assert!(line.contains("descriptions=\"x | y\""));
        assert!(line.contains("url=https://example.com"));
        assert!(line.contains("layout=flexible pinned=0"));
    }
}
