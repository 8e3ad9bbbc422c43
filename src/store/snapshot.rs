use crate::engine::identity::key;
use crate::engine::model::{AdStatus, Entity};
use crate::error::StoreError;
use crate::store::{AssetSet, AssetStore, GroupInfo};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationRecord {
    pub remote_id: String,
    pub kind: String,
    pub status: Option<AdStatus>,
}

/// On-disk form of one ad group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub assets: AssetSet,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub created: Vec<CreationRecord>,
}

pub fn read_snapshot(path: &Path) -> Result<SnapshotFile, StoreError> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map_err(|err| StoreError::Parse(format!("{}: {err}", path.display())))
}

/// Writes through a temp file in the same directory so readers never see a
/// half-written snapshot.
pub fn write_snapshot(path: &Path, snapshot: &SnapshotFile) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;
    let data = serde_json::to_string_pretty(snapshot)?;
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(format!("{data}\n").as_bytes())?;
    tmp.persist(path).map_err(|err| StoreError::Io(err.error))?;
    Ok(())
}

/// Directory of `<group>.json` snapshot files.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn group_path(&self, group: &str) -> Result<PathBuf, StoreError> {
        let trimmed = group.trim();
        if trimmed.is_empty()
            || trimmed.contains(['/', '\\'])
            || trimmed.starts_with('.')
        {
            return Err(StoreError::GroupNotFound(group.to_string()));
        }
        Ok(self.dir.join(format!("{trimmed}.json")))
    }

    fn read_group(&self, group: &str) -> Result<SnapshotFile, StoreError> {
        let path = self.group_path(group)?;
        if !path.is_file() {
            return Err(StoreError::GroupNotFound(group.to_string()));
        }
        read_snapshot(&path)
    }

    fn append_created(
        &self,
        group: &str,
        path: &Path,
        entity: &Entity,
        status: Option<AdStatus>,
    ) -> Result<String, StoreError> {
        let mut snapshot = self.read_group(group)?;
        let remote_id = format!("{group}~{}", key(entity).short_digest());
        snapshot.created.push(CreationRecord {
            remote_id: remote_id.clone(),
            kind: entity.kind().as_str().to_string(),
            status,
        });
        snapshot.assets.push(entity.clone());
        write_snapshot(path, &snapshot)?;
        Ok(remote_id)
    }
}

impl AssetStore for SnapshotStore {
    fn backend(&self) -> &'static str {
        "snapshot"
    }

    fn describe(&self, group: &str) -> Result<GroupInfo, StoreError> {
        let snapshot = self.read_group(group)?;
        Ok(GroupInfo {
            id: group.to_string(),
            name: snapshot.name,
            status: None,
            campaign: None,
        })
    }

    fn load(&self, group: &str) -> Result<AssetSet, StoreError> {
        Ok(self.read_group(group)?.assets)
    }

    fn create(
        &self,
        group: &str,
        entity: &Entity,
        status: Option<AdStatus>,
    ) -> Result<String, StoreError> {
        let path = self.group_path(group)?;
        fs::create_dir_all(&self.dir)?;
        let lock = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(".adsmend.lock"))?;
        lock.lock_exclusive()?;

        let result = self.append_created(group, &path, entity, status);

        let _ = FileExt::unlock(&lock);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::model::{Keyword, MatchType};
    use tempfile::tempdir;

    #[test]
    fn created_entities_are_visible_on_next_load() {
        let tmp = tempdir().expect("tempdir");
        let store = SnapshotStore::new(tmp.path().to_path_buf());
        write_snapshot(&tmp.path().join("200.json"), &SnapshotFile::default())
            .expect("seed");

        let entity = Entity::Keyword(Keyword::positive("online school", MatchType::Exact));
        let id = store
            .create("200", &entity, Some(AdStatus::Paused))
            .expect("create");
        assert!(id.starts_with("200~"));

        let loaded = store.load("200").expect("load");
        assert_eq!(loaded.entities(), vec![entity]);

        let raw = read_snapshot(&tmp.path().join("200.json")).expect("read");
        assert_eq!(raw.created.len(), 1);
        assert_eq!(raw.created[0].status, Some(AdStatus::Paused));
    }

    #[test]
    fn missing_group_is_not_found() {
        let tmp = tempdir().expect("tempdir");
        let store = SnapshotStore::new(tmp.path().to_path_buf());
        assert!(matches!(store.load("404"), Err(StoreError::GroupNotFound(_))));
        assert!(matches!(
            store.load("../escape"),
            Err(StoreError::GroupNotFound(_))
        ));
    }

    #[test]
    fn snapshot_json_uses_flat_asset_sections() {
        let raw = r#"{
            "name": "Brand",
            "keywords": [{"text": "Online School", "match_type": "BROAD"}],
            "fixed_slot_ads": [{"headline_1": "A", "description_1": "x", "final_urls": ["https://e.x"]}]
        }"#;
        let parsed: SnapshotFile = serde_json::from_str(raw).expect("parse");
        assert_eq!(parsed.name.as_deref(), Some("Brand"));
        assert_eq!(parsed.assets.keywords.len(), 1);
        assert!(!parsed.assets.keywords[0].is_negative);
        assert_eq!(parsed.assets.fixed_slot_ads.len(), 1);
        assert!(parsed.assets.multi_slot_ads.is_empty());
    }
}
