use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AdsmendPaths {
    pub home: PathBuf,
    pub config_file: PathBuf,
    pub logs_dir: PathBuf,
    pub snapshot_dir: PathBuf,
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<AdsmendPaths> {
    let home = match env::var("ADSMEND_HOME") {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => required_home_dir()?.join(".adsmend"),
    };

    let config_file = env_or_default_path("ADSMEND_CONFIG_PATH", home.join("adsmend.toml"));
    let logs_dir = env_or_default_path("ADSMEND_LOGS_DIR", home.join("logs"));
    let snapshot_dir = home.join("snapshots");

    Ok(AdsmendPaths {
        home,
        config_file,
        logs_dir,
        snapshot_dir,
    })
}
