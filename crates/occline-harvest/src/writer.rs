//! Genus-partitioned persistence: Parquet + JSONL per partition
//!
//! Layout under the output root:
//! ```text
//! {root}/
//! ├── {dataset-name}/
//! │   ├── parquet/genus={Genus}/part-0001.parquet
//! │   └── jsonl/genus={Genus}/part-0001.jsonl
//! ├── catalog/{datasets,taxa}.json
//! └── reports/quality_summary.md
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use occline_core::{JsonlSink, ParquetSink};

use crate::arrow_convert::to_record_batch;
use crate::record::OccurrenceRecord;
use crate::schema;

/// Exclusive ownership of an output root for the duration of a run.
///
/// Two concurrent runs on the same root would race on the clean-replace
/// step, so the second acquisition fails instead.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)
            .with_context(|| format!("failed to create output root: {}", root.display()))?;
        let path = root.join(".occline.lock");
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    anyhow::anyhow!(
                        "output root is locked by another run ({}); remove the lock file if that run is dead",
                        path.display()
                    )
                } else {
                    anyhow::Error::new(e)
                        .context(format!("failed to create lock file: {}", path.display()))
                }
            })?;
        Ok(Self { path })
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Rows written for one genus partition
#[derive(Debug)]
pub struct PartitionStat {
    pub genus: String,
    pub rows: usize,
}

/// Writes the final deduplicated set, partitioned by genus, in both
/// serializations. Each run is a clean replace of the dataset directory.
pub struct PartitionedWriter {
    root: PathBuf,
    dataset_name: String,
    zstd_level: i32,
}

impl PartitionedWriter {
    pub fn new(root: &Path, dataset_name: &str, zstd_level: i32) -> Self {
        Self {
            root: root.to_path_buf(),
            dataset_name: dataset_name.to_string(),
            zstd_level,
        }
    }

    /// Remove `.tmp` files a crashed run may have left in partition
    /// directories. Runs once at run start, before any paging I/O.
    pub fn sweep_stale_tmp(&self) -> Result<()> {
        let dataset_dir = self.root.join(&self.dataset_name);
        for format in ["parquet", "jsonl"] {
            let dir = dataset_dir.join(format);
            if !dir.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&dir)
                .with_context(|| format!("failed to scan output dir: {}", dir.display()))?
            {
                let partition = entry?.path();
                if partition.is_dir() {
                    occline_core::cleanup_tmp_files(&partition)?;
                }
            }
        }
        Ok(())
    }

    /// Persist all partitions. Any partition failure aborts with the
    /// failing partition named; nothing is appended to prior runs.
    pub fn write_all(&self, records: &[OccurrenceRecord]) -> Result<Vec<PartitionStat>> {
        // Deterministic partition order
        let mut groups: BTreeMap<&str, Vec<&OccurrenceRecord>> = BTreeMap::new();
        for record in records {
            groups.entry(record.genus_partition()).or_default().push(record);
        }

        let dataset_dir = self.root.join(&self.dataset_name);
        for format in ["parquet", "jsonl"] {
            let dir = dataset_dir.join(format);
            if dir.exists() {
                fs::remove_dir_all(&dir)
                    .with_context(|| format!("failed to clear prior output: {}", dir.display()))?;
            }
        }

        let mut stats = Vec::with_capacity(groups.len());
        for (genus, group) in groups {
            let rows = self
                .write_partition(&dataset_dir, genus, &group)
                .with_context(|| format!("failed to write partition genus={genus}"))?;
            log::debug!("partition genus={genus}: {rows} rows");
            stats.push(PartitionStat {
                genus: genus.to_string(),
                rows,
            });
        }
        Ok(stats)
    }

    fn write_partition(
        &self,
        dataset_dir: &Path,
        genus: &str,
        group: &[&OccurrenceRecord],
    ) -> Result<usize> {
        let owned: Vec<OccurrenceRecord> = group.iter().map(|r| (*r).clone()).collect();

        let parquet_dir = dataset_dir.join("parquet").join(format!("genus={genus}"));
        fs::create_dir_all(&parquet_dir)?;
        let mut parquet = ParquetSink::new(
            &parquet_dir.join("part-0001.parquet"),
            schema::occurrences(),
            self.zstd_level,
        )?;
        let batch = to_record_batch(&owned)?;
        parquet.write_batch(&batch)?;
        let rows = parquet.finalize()?;

        let jsonl_dir = dataset_dir.join("jsonl").join(format!("genus={genus}"));
        fs::create_dir_all(&jsonl_dir)?;
        let mut jsonl = JsonlSink::new(&jsonl_dir.join("part-0001.jsonl"))?;
        for record in &owned {
            jsonl.write_row(record)?;
        }
        jsonl.finalize()?;

        Ok(rows)
    }
}
