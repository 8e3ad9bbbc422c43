use anyhow::Result;
use std::env;

use crate::commands::CommandReport;
use crate::engine::config::load_config;
use crate::engine::paths::resolve_paths;

include!(concat!(env!("OUT_DIR"), "/known_env_vars.rs"));

fn unknown_env_keys<I: IntoIterator<Item = String>>(keys: I) -> Vec<String> {
    let mut out = keys
        .into_iter()
        .filter(|k| k.starts_with("ADSMEND_"))
        .filter(|k| !KNOWN_ENV_VARS.contains(&k.as_str()))
        .collect::<Vec<_>>();
    out.sort();
    out
}

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("adsmend_home={}", paths.home.display()));
    report.detail(format!("config_file={}", paths.config_file.display()));
    report.detail(format!("logs_dir={}", paths.logs_dir.display()));

    if !paths.config_file.exists() {
        report.detail("config file absent; using defaults and environment".to_string());
    }

    match load_config(&paths) {
        Ok(cfg) => {
            report.detail(format!("safety={}", cfg.safety.describe()));
            report.detail(format!("store={}", cfg.store.backend.as_str()));
            report.detail(format!("snapshot_dir={}", cfg.snapshot_dir(&paths).display()));
            report.detail(format!(
                "filler_pool={} headlines, {} descriptions",
                cfg.padding.headlines.len(),
                cfg.padding.descriptions.len()
            ));
            if !cfg.google_ads.customer_id.is_empty() {
                report.detail(format!("customer_id={}", cfg.google_ads.customer_id));
            }
            report.detail(format!("google_ads.api_version={}", cfg.google_ads.api_version));
        }
        Err(err) => report.issue(format!("{err:#}")),
    }

    for key in ["ADSMEND_DEVELOPER_TOKEN", "ADSMEND_ACCESS_TOKEN"] {
        let present = env::var(key).map(|v| !v.trim().is_empty()).unwrap_or(false);
        report.detail(format!("{key}={}", if present { "set" } else { "unset" }));
    }

    for key in unknown_env_keys(env::vars().map(|(k, _)| k)) {
        report.issue(format!("unknown environment variable {key}"));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::{KNOWN_ENV_VARS, unknown_env_keys};

    #[test]
    fn only_unlisted_adsmend_keys_are_reported() {
        // Built at runtime so the build script never lists it.
        let typo = format!("ADSMEND_{}", "PIN_MOOD");
        let got = unknown_env_keys(vec![
            "ADSMEND_HOME".to_string(),
            typo.clone(),
            "PATH".to_string(),
        ]);
        assert_eq!(got, vec![typo]);
    }

    #[test]
    fn known_vars_come_from_whole_literals_only() {
        assert!(KNOWN_ENV_VARS.contains(&"ADSMEND_HOME"));
        assert!(KNOWN_ENV_VARS.contains(&"ADSMEND_ACCESS_TOKEN"));
        let log_prefix = format!("ADSMEND_{}", "WARN");
        assert!(!KNOWN_ENV_VARS.contains(&log_prefix.as_str()));
        assert!(KNOWN_ENV_VARS.iter().all(|name| name.len() > "ADSMEND_".len()));
    }
}
