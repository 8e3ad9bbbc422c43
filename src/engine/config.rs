use crate::engine::paths::AdsmendPaths;
use crate::engine::safety::{PadMode, PinMode, SafetyConfig};
use crate::engine::transform::FillerPool;
use crate::error::AdsmendError;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackend {
    #[default]
    Snapshot,
    GoogleAds,
}

impl StoreBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Snapshot => "snapshot",
            Self::GoogleAds => "google-ads",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "snapshot" | "file" => Ok(Self::Snapshot),
            "google-ads" | "googleads" | "google" => Ok(Self::GoogleAds),
            other => Err(format!(
                "invalid store backend `{other}`; use `snapshot` or `google-ads`"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub snapshot_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleAdsConfig {
    pub api_version: String,
    pub base_url: String,
    pub customer_id: String,
    pub login_customer_id: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GoogleAdsConfig {
    fn default() -> Self {
        Self {
            api_version: "v17".to_string(),
            base_url: "https://googleads.googleapis.com".to_string(),
            customer_id: String::new(),
            login_customer_id: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdsmendConfig {
    pub safety: SafetyConfig,
    pub padding: FillerPool,
    pub store: StoreConfig,
    pub google_ads: GoogleAdsConfig,
}

impl AdsmendConfig {
    pub fn snapshot_dir(&self, paths: &AdsmendPaths) -> PathBuf {
        match self.store.snapshot_dir.as_deref() {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir.trim()),
            _ => paths.snapshot_dir.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PartialAdsmendConfig {
    safety: Option<SafetyConfig>,
    padding: Option<FillerPool>,
    store: Option<StoreConfig>,
    google_ads: Option<GoogleAdsConfig>,
}

fn env_non_empty(var: &str) -> Option<String> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => match v.trim() {
            "1" | "true" | "TRUE" | "yes" | "on" => true,
            "0" | "false" | "FALSE" | "no" | "off" => false,
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_parsed<T: FromStr<Err = String>>(var: &str, fallback: T) -> Result<T> {
    match env_non_empty(var) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|err| AdsmendError::InvalidConfig(format!("{var}: {err}")).into()),
        None => Ok(fallback),
    }
}

/// Strips the dashes the Ads UI shows in customer ids.
pub fn normalize_customer_id(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace() && *c != '-').collect()
}

pub fn validate(cfg: &AdsmendConfig) -> Result<()> {
    if cfg.safety.pad_mode == PadMode::Generic {
        let problems = cfg.padding.problems();
        if !problems.is_empty() {
            return Err(AdsmendError::InvalidConfig(format!(
                "generic padding needs a usable filler pool: {}",
                problems.join("; ")
            ))
            .into());
        }
    }
    if cfg.google_ads.timeout_secs == 0 {
        return Err(anyhow!("invalid google ads timeout: must be >= 1 second"));
    }
    if cfg.google_ads.api_version.trim().is_empty() {
        return Err(anyhow!("invalid google ads api version: cannot be empty"));
    }
    if let Some(dir) = cfg.store.snapshot_dir.as_deref()
        && dir.trim().is_empty()
    {
        return Err(anyhow!("invalid snapshot dir: cannot be blank"));
    }
    if !cfg.google_ads.customer_id.is_empty()
        && !cfg.google_ads.customer_id.chars().all(|c| c.is_ascii_digit())
    {
        return Err(anyhow!(
            "invalid customer id `{}`: digits only",
            cfg.google_ads.customer_id
        ));
    }
    Ok(())
}

fn merge_file_config(base: &mut AdsmendConfig, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(path)?;
    let parsed: PartialAdsmendConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse adsmend config {}: {err}", path.display()))?;
    if let Some(safety) = parsed.safety {
        base.safety = safety;
    }
    if let Some(padding) = parsed.padding {
        base.padding = padding;
    }
    if let Some(store) = parsed.store {
        base.store = store;
    }
    if let Some(google_ads) = parsed.google_ads {
        base.google_ads = google_ads;
    }
    Ok(())
}

fn merge_env(cfg: &mut AdsmendConfig) -> Result<()> {
    let safety = &mut cfg.safety;
    safety.only_exact = env_or_bool("ADSMEND_ONLY_EXACT", safety.only_exact);
    safety.pause_on_create = env_or_bool("ADSMEND_PAUSE_ON_CREATE", safety.pause_on_create);
    safety.copy_negatives = env_or_bool("ADSMEND_COPY_NEGATIVES", safety.copy_negatives);
    safety.dry_run = env_or_bool("ADSMEND_DRY_RUN", safety.dry_run);
    safety.pad_mode = env_or_parsed::<PadMode>("ADSMEND_PAD_MODE", safety.pad_mode)?;
    safety.pin_mode = env_or_parsed::<PinMode>("ADSMEND_PIN_MODE", safety.pin_mode)?;

    cfg.store.backend = env_or_parsed::<StoreBackend>("ADSMEND_STORE", cfg.store.backend)?;
    if let Some(dir) = env_non_empty("ADSMEND_SNAPSHOT_DIR") {
        cfg.store.snapshot_dir = Some(dir);
    }

    let ads = &mut cfg.google_ads;
    if let Some(id) = env_non_empty("ADSMEND_CUSTOMER_ID") {
        ads.customer_id = id;
    }
    if let Some(id) = env_non_empty("ADSMEND_LOGIN_CUSTOMER_ID") {
        ads.login_customer_id = Some(id);
    }
    if let Some(version) = env_non_empty("ADSMEND_API_VERSION") {
        ads.api_version = version;
    }
    if let Some(url) = env_non_empty("ADSMEND_ADS_BASE_URL") {
        ads.base_url = url;
    }
    ads.timeout_secs = env_or_u64("ADSMEND_TIMEOUT_SECS", ads.timeout_secs);
    Ok(())
}

pub fn load_config(paths: &AdsmendPaths) -> Result<AdsmendConfig> {
    let mut cfg = AdsmendConfig::default();
    merge_file_config(&mut cfg, &paths.config_file)?;
    merge_env(&mut cfg)?;

    cfg.google_ads.customer_id = normalize_customer_id(&cfg.google_ads.customer_id);
    cfg.google_ads.login_customer_id = cfg
        .google_ads
        .login_customer_id
        .as_deref()
        .map(normalize_customer_id)
        .filter(|id| !id.is_empty());

    validate(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn customer_id_dashes_are_stripped() {
        assert_eq!(normalize_customer_id("609-133-2809"), "6091332809");
        assert_eq!(normalize_customer_id(" 123 "), "123");
    }

    #[test]
    fn generic_padding_with_empty_pool_is_rejected() {
        let mut cfg = AdsmendConfig::default();
        cfg.safety.pad_mode = PadMode::Generic;
        cfg.padding.headlines.clear();
        let err = validate(&cfg).expect_err("empty pool");
        assert!(format!("{err}").contains("headline filler pool is empty"));

        cfg.safety.pad_mode = PadMode::Skip;
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn non_numeric_customer_id_is_rejected() {
        let mut cfg = AdsmendConfig::default();
        cfg.google_ads.customer_id = "abc".to_string();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn file_sections_replace_defaults() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("adsmend.toml");
        fs::write(
            &path,
            r#"
[safety]
only_exact = true
pin_mode = "flexible"

[padding]
headlines = ["One", "Two", "Three"]
descriptions = ["First line.", "Second line."]

[store]
backend = "google-ads"

[google_ads]
customer_id = "1234567890"
"#,
        )
        .expect("write config");

        let mut cfg = AdsmendConfig::default();
        merge_file_config(&mut cfg, &path).expect("merge");
        assert!(cfg.safety.only_exact);
        assert_eq!(cfg.safety.pin_mode, PinMode::Flexible);
        assert_eq!(cfg.padding.headlines.len(), 3);
        assert_eq!(cfg.store.backend, StoreBackend::GoogleAds);
        assert_eq!(cfg.google_ads.customer_id, "1234567890");
        assert_eq!(cfg.google_ads.timeout_secs, 30);
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn missing_file_keeps_defaults() {
        let tmp = tempdir().expect("tempdir");
        let mut cfg = AdsmendConfig::default();
        merge_file_config(&mut cfg, &tmp.path().join("absent.toml")).expect("merge");
        assert_eq!(cfg.store.backend, StoreBackend::Snapshot);
        assert_eq!(cfg.safety, SafetyConfig::default());
    }
}
