use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the transformer reaches slot minimums when a legacy ad is short.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PadMode {
    #[default]
    Skip,
    Generic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PinMode {
    #[default]
    #[serde(rename = "legacy-pin", alias = "legacy")]
    Legacy,
    Flexible,
}

impl PadMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Generic => "generic",
        }
    }
}

impl PinMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "legacy-pin",
            Self::Flexible => "flexible",
        }
    }
}

impl FromStr for PadMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "generic" => Ok(Self::Generic),
            other => Err(format!("invalid pad mode `{other}`; use `skip` or `generic`")),
        }
    }
}

impl FromStr for PinMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "legacy" | "legacy-pin" | "pin" => Ok(Self::Legacy),
            "flexible" | "no-pin" | "none" => Ok(Self::Flexible),
            other => Err(format!(
                "invalid pin mode `{other}`; use `legacy-pin` or `flexible`"
            )),
        }
    }
}

impl fmt::Display for PadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The policy switches consumed by the transformer, planner and executor.
/// Each switch is read by exactly one stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    pub only_exact: bool,
    pub pause_on_create: bool,
    pub copy_negatives: bool,
    pub pad_mode: PadMode,
    pub pin_mode: PinMode,
    pub dry_run: bool,
}

impl SafetyConfig {
    pub fn describe(&self) -> String {
        format!(
            "only_exact={} pause_on_create={} copy_negatives={} pad_mode={} pin_mode={} dry_run={}",
            self.only_exact,
            self.pause_on_create,
            self.copy_negatives,
            self.pad_mode,
            self.pin_mode,
            self.dry_run
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_mode_accepts_legacy_aliases() {
        assert_eq!("legacy".parse::<PinMode>(), Ok(PinMode::Legacy));
        assert_eq!("Legacy-Pin".parse::<PinMode>(), Ok(PinMode::Legacy));
        assert_eq!("no-pin".parse::<PinMode>(), Ok(PinMode::Flexible));
        assert!("sideways".parse::<PinMode>().is_err());
    }

    #[test]
    fn pad_mode_rejects_unknown_values() {
        assert_eq!(" generic ".parse::<PadMode>(), Ok(PadMode::Generic));
        assert!("truncate".parse::<PadMode>().is_err());
    }

    #[test]
    fn safety_section_deserializes_from_toml() {
        let cfg: SafetyConfig = toml::from_str(
            "only_exact = true\npad_mode = \"generic\"\npin_mode = \"flexible\"\n",
        )
        .expect("parse");
        assert!(cfg.only_exact);
        assert!(!cfg.pause_on_create);
        assert_eq!(cfg.pad_mode, PadMode::Generic);
        assert_eq!(cfg.pin_mode, PinMode::Flexible);

        let legacy: SafetyConfig = toml::from_str("pin_mode = \"legacy\"\n").expect("alias");
        assert_eq!(legacy.pin_mode, PinMode::Legacy);
    }
}
