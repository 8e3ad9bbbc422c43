use std::collections::BTreeSet;

/// US states with their postal abbreviations.
pub const STATES: [(&str, &str); 50] = [
    ("Alabama", "AL"),
    ("Alaska", "AK"),
    ("Arizona", "AZ"),
    ("Arkansas", "AR"),
    ("California", "CA"),
    ("Colorado", "CO"),
    ("Connecticut", "CT"),
    ("Delaware", "DE"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
    ("Hawaii", "HI"),
    ("Idaho", "ID"),
    ("Illinois", "IL"),
    ("Indiana", "IN"),
    ("Iowa", "IA"),
    ("Kansas", "KS"),
    ("Kentucky", "KY"),
    ("Louisiana", "LA"),
    ("Maine", "ME"),
    ("Maryland", "MD"),
    ("Massachusetts", "MA"),
    ("Michigan", "MI"),
    ("Minnesota", "MN"),
    ("Mississippi", "MS"),
    ("Missouri", "MO"),
    ("Montana", "MT"),
    ("Nebraska", "NE"),
    ("Nevada", "NV"),
    ("New Hampshire", "NH"),
    ("New Jersey", "NJ"),
    ("New Mexico", "NM"),
    ("New York", "NY"),
    ("North Carolina", "NC"),
    ("North Dakota", "ND"),
    ("Ohio", "OH"),
    ("Oklahoma", "OK"),
    ("Oregon", "OR"),
    ("Pennsylvania", "PA"),
    ("Rhode Island", "RI"),
    ("South Carolina", "SC"),
    ("South Dakota", "SD"),
    ("Tennessee", "TN"),
    ("Texas", "TX"),
    ("Utah", "UT"),
    ("Vermont", "VT"),
    ("Virginia", "VA"),
    ("Washington", "WA"),
    ("West Virginia", "WV"),
    ("Wisconsin", "WI"),
    ("Wyoming", "WY"),
];

pub const METROS: [&str; 39] = [
    "Atlanta",
    "Austin",
    "Baltimore",
    "Boston",
    "Charlotte",
    "Chicago",
    "Cincinnati",
    "Cleveland",
    "Columbus",
    "Dallas",
    "Denver",
    "Detroit",
    "Houston",
    "Indianapolis",
    "Jacksonville",
    "Kansas City",
    "Las Vegas",
    "Los Angeles",
    "Miami",
    "Minneapolis",
    "Nashville",
    "New Orleans",
    "New York",
    "Orlando",
    "Philadelphia",
    "Phoenix",
    "Pittsburgh",
    "Portland",
    "Raleigh",
    "Sacramento",
    "Salt Lake City",
    "San Antonio",
    "San Diego",
    "San Francisco",
    "San Jose",
    "Seattle",
    "St Louis",
    "Tampa",
    "Washington",
];

#[derive(Debug, Clone)]
pub struct GeoOptions {
    pub states: bool,
    /// Only honored together with `states`.
    pub abbrev: bool,
    pub metros: bool,
    pub extra: Vec<String>,
}

impl Default for GeoOptions {
    fn default() -> Self {
        Self {
            states: true,
            abbrev: true,
            metros: false,
            extra: Vec::new(),
        }
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_variants(out: &mut BTreeSet<String>, kw: &str, geo: &str) {
    let geo = collapse(geo);
    if geo.is_empty() {
        return;
    }
    out.insert(collapse(&format!("{kw} in {geo}")));
    out.insert(collapse(&format!("{kw} {geo}")));
    out.insert(collapse(&format!("{geo} {kw}")));
}

/// Each seed plus its "kw in G", "kw G" and "G kw" forms, sorted and
/// deduplicated. Blank seeds are dropped.
pub fn expand_keywords<S: AsRef<str>>(seeds: &[S], opts: &GeoOptions) -> Vec<String> {
    let mut out = BTreeSet::new();
    for seed in seeds {
        let kw = collapse(seed.as_ref());
        if kw.is_empty() {
            continue;
        }
        if opts.states {
            for (state, abbrev) in STATES {
                push_variants(&mut out, &kw, state);
                if opts.abbrev {
                    push_variants(&mut out, &kw, abbrev);
                }
            }
        }
        if opts.metros {
            for metro in METROS {
                push_variants(&mut out, &kw, metro);
            }
        }
        for geo in &opts.extra {
            push_variants(&mut out, &kw, geo);
        }
        out.insert(kw);
    }
    out.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_with_abbrev_yield_six_forms_per_state() {
        let got = expand_keywords(&["online school"], &GeoOptions::default());
        assert_eq!(got.len(), 1 + STATES.len() * 6);
        assert!(got.contains(&"online school in Texas".to_string()));
        assert!(got.contains(&"TX online school".to_string()));
        assert!(got.contains(&"online school".to_string()));
    }

    #[test]
    fn abbrev_requires_states() {
        let opts = GeoOptions {
            states: false,
            abbrev: true,
            metros: false,
            extra: vec![],
        };
        assert_eq!(expand_keywords(&["a"], &opts), vec!["a".to_string()]);
    }

    #[test]
    fn overlapping_geos_collapse_and_dedupe() {
        let opts = GeoOptions {
            states: false,
            abbrev: false,
            metros: false,
            extra: vec!["New  York".to_string(), "New York".to_string(), "  ".to_string()],
        };
        let got = expand_keywords(&["  home   school ", "home school"], &opts);
        assert_eq!(
            got,
            vec![
                "New York home school".to_string(),
                "home school".to_string(),
                "home school New York".to_string(),
                "home school in New York".to_string(),
            ]
        );
    }

    #[test]
    fn metros_share_names_with_states_without_duplicates() {
        let opts = GeoOptions {
            metros: true,
            ..GeoOptions::default()
        };
        let got = expand_keywords(&["tutor"], &opts);
        let washington = got
            .iter()
            .filter(|k| k.as_str() == "tutor in Washington")
            .count();
        assert_eq!(washington, 1);
    }
}
