use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn adsmend(home: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("adsmend");
    cmd.current_dir(home)
        .env("ADSMEND_HOME", home)
        .env_remove("ADSMEND_CONFIG_PATH")
        .env_remove("ADSMEND_SNAPSHOT_DIR");
    cmd
}

#[test]
fn snapshot_exports_group_for_later_fallback() {
    let tmp = tempdir().expect("tempdir");
    let snapshots = tmp.path().join("snapshots");
    fs::create_dir_all(&snapshots).expect("mkdir");
    fs::write(
        snapshots.join("100.json"),
        json!({
            "name": "Brand",
            "keywords": [{"text": "online school", "match_type": "EXACT"}]
        })
        .to_string(),
    )
    .expect("write");

    let out = tmp.path().join("exports/100.json");
    adsmend(tmp.path())
        .args(["snapshot", "--group", "100", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("group.keywords=1 (0 negative)"));

    let exported: Value =
        serde_json::from_str(&fs::read_to_string(&out).expect("read export")).expect("parse");
    assert_eq!(exported["name"], json!("Brand"));
    assert_eq!(exported["keywords"][0]["text"], json!("online school"));
}

#[test]
fn inventory_counts_match_types() {
    let tmp = tempdir().expect("tempdir");
    let snapshots = tmp.path().join("snapshots");
    fs::create_dir_all(&snapshots).expect("mkdir");
    fs::write(
        snapshots.join("300.json"),
        json!({
            "keywords": [
                {"text": "a", "match_type": "EXACT"},
                {"text": "b", "match_type": "EXACT"},
                {"text": "c", "match_type": "PHRASE"},
                {"text": "d", "match_type": "BROAD", "is_negative": true}
            ]
        })
        .to_string(),
    )
    .expect("write");

    adsmend(tmp.path())
        .args(["inventory", "--ad-group-id", "300", "--limit", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("positive.EXACT=2"))
        .stdout(predicate::str::contains("negative.BROAD=1"))
        .stdout(predicate::str::contains("... (+2 more)"));
}

#[test]
fn expand_geo_writes_keyword_snapshot() {
    let tmp = tempdir().expect("tempdir");
    let input = tmp.path().join("seeds.txt");
    fs::write(&input, "home school\n\n  online   school \n").expect("write seeds");
    let out = tmp.path().join("geo.json");

    adsmend(tmp.path())
        .args(["expand-geo", "--no-states", "--geo", "Gwinnett County", "--match", "Phrase match"])
        .arg("--input")
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("keywords=8"));

    let parsed: Value =
        serde_json::from_str(&fs::read_to_string(&out).expect("read out")).expect("parse");
    let keywords = parsed["keywords"].as_array().expect("keywords");
    assert_eq!(keywords.len(), 8);
    assert!(keywords.iter().all(|k| k["match_type"] == json!("PHRASE")));
    assert!(
        keywords
            .iter()
            .any(|k| k["text"] == json!("online school in Gwinnett County"))
    );
}

#[test]
fn expand_geo_negative_flag_writes_negatives() {
    let tmp = tempdir().expect("tempdir");
    let input = tmp.path().join("seeds.txt");
    fs::write(&input, "free school\n").expect("write seeds");
    let out = tmp.path().join("neg.json");

    adsmend(tmp.path())
        .args(["expand-geo", "--no-states", "--negative", "--match", "Exact Match"])
        .arg("--input")
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("keywords=1"));

    let parsed: Value =
        serde_json::from_str(&fs::read_to_string(&out).expect("read out")).expect("parse");
    assert_eq!(
        parsed["keywords"],
        json!([{"text": "free school", "match_type": "EXACT", "is_negative": true}])
    );
}

#[test]
fn status_reports_paths_and_unknown_env() {
    let tmp = tempdir().expect("tempdir");
    let typo = format!("ADSMEND_{}", "DRYRUN");

    adsmend(tmp.path())
        .env(&typo, "1")
        .arg("status")
        .assert()
        .failure()
        .stdout(predicate::str::contains("adsmend_home="))
        .stdout(predicate::str::contains(format!("unknown environment variable {typo}")));
}

#[test]
fn invalid_config_file_is_reported() {
    let tmp = tempdir().expect("tempdir");
    fs::write(
        tmp.path().join("adsmend.toml"),
        "[safety]\npad_mode = \"generic\"\n\n[padding]\nheadlines = []\n",
    )
    .expect("write config");

    adsmend(tmp.path())
        .arg("status")
        .assert()
        .failure()
        .stdout(predicate::str::contains("headline filler pool is empty"));
}
