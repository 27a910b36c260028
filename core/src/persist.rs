use crate::record::Record;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub generation: u64,
    pub created_at: String,
    pub version: u32,
}

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn records(&self) -> PathBuf { self.root.join("records.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Write `bytes` next to `path` and rename over it, so a reader never sees half a file.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut f = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}

/// Persist the record set of an installed generation. Records go first so a
/// present `meta.json` always describes a complete records file.
pub fn save_snapshot(paths: &IndexPaths, records: &[Record], meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let bytes = bincode::serialize(records)?;
    write_atomic(&paths.records(), &bytes)?;
    let json = serde_json::to_string_pretty(meta)?;
    write_atomic(&paths.meta(), json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// `Ok(None)` when no snapshot has been written yet.
pub fn load_snapshot(paths: &IndexPaths) -> Result<Option<(Vec<Record>, MetaFile)>> {
    if !paths.meta().exists() {
        return Ok(None);
    }
    let meta = load_meta(paths)?;
    if meta.version != SNAPSHOT_VERSION {
        anyhow::bail!("unsupported snapshot version {}", meta.version);
    }
    let mut f = File::open(paths.records())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let records: Vec<Record> = bincode::deserialize(&buf)?;
    Ok(Some((records, meta)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use time::macros::date;

    #[test]
    fn snapshot_survives_a_round_trip() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path().join("idx"));
        assert!(load_snapshot(&paths).unwrap().is_none());

        let records = vec![
            Record::new("1", "The Matrix").with_runtime(136).with_release_date(date!(1999 - 03 - 30)),
            Record::new("2", "Inception"),
        ];
        let meta = MetaFile { num_docs: 2, generation: 3, created_at: "2024-01-01T00:00:00Z".into(), version: SNAPSHOT_VERSION };
        save_snapshot(&paths, &records, &meta).unwrap();

        let (loaded, meta) = load_snapshot(&paths).unwrap().unwrap();
        assert_eq!(loaded, records);
        assert_eq!(meta.generation, 3);
        assert!(!paths.root.join("records.tmp").exists());
    }

    #[test]
    fn rejects_unknown_version() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let meta = MetaFile { num_docs: 0, generation: 1, created_at: String::new(), version: 99 };
        save_snapshot(&paths, &[], &meta).unwrap();
        assert!(load_snapshot(&paths).is_err());
    }
}
