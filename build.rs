//! Generates the list of environment variables adsmend reads.
//!
//! A variable counts as known when its full name appears as a complete
//! string literal somewhere under `src/`, e.g. `env::var("ADSMEND_HOME")`.
//! Log prefixes and identifiers that merely start with the prefix do not.

use std::collections::BTreeSet;
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::PathBuf;

const LITERAL_OPEN: &str = "\"ADSMEND_";

fn rust_sources(root: PathBuf) -> io::Result<Vec<PathBuf>> {
    let mut pending = vec![root];
    let mut files = Vec::new();
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Names written as `"ADSMEND_NAME"` with nothing else inside the quotes.
fn env_literals(source: &str) -> impl Iterator<Item = &str> {
    source.match_indices(LITERAL_OPEN).filter_map(|(at, _)| {
        let body = &source[at + 1..];
        let end = body.find('"')?;
        let name = &body[..end];
        let tail = &name[LITERAL_OPEN.len() - 1..];
        let valid = !tail.is_empty()
            && tail
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_');
        valid.then_some(name)
    })
}

fn main() -> io::Result<()> {
    let out_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::other("OUT_DIR not set"))?;

    let mut names = BTreeSet::new();
    for file in rust_sources(PathBuf::from("src"))? {
        let text = fs::read_to_string(&file)?;
        names.extend(env_literals(&text).map(str::to_owned));
        println!("cargo:rerun-if-changed={}", file.display());
    }
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed=build.rs");

    let mut generated = String::from("pub const KNOWN_ENV_VARS: &[&str] = &[\n");
    for name in &names {
        let _ = writeln!(generated, "    {name:?},");
    }
    generated.push_str("];\n");
    fs::write(out_dir.join("known_env_vars.rs"), generated)
}
