use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::app::ports::{RecordBatch, SearchRecordSourcePort};
use crate::observability::metrics;
use crate::pipeline::ingestion::{lenient, ParsedSearchRecord};

/// Reads raw search-event logs from a directory tree: every file is a log,
/// every line one lenient-JSON record. Malformed lines are skipped and
/// counted, never fatal for the file.
pub struct LogDirectorySource {
    root: PathBuf,
}

impl LogDirectorySource {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn read_all(&self) -> anyhow::Result<RecordBatch> {
        let mut files = Vec::new();
        collect_files(&self.root, &mut files)?;
        // Directory iteration order is platform-dependent; sort so search ids
        // assigned downstream are reproducible across runs.
        files.sort();

        let mut batch = RecordBatch::default();
        for path in files {
            self.read_file(&path, &mut batch)?;
            batch.files_read += 1;
            metrics::loader::file_read();
        }
        metrics::loader::lines_parsed(batch.records.len());
        debug!(
            "read {} records from {} files ({} malformed lines)",
            batch.records.len(),
            batch.files_read,
            batch.malformed_lines
        );
        Ok(batch)
    }

    fn read_file(&self, path: &Path, batch: &mut RecordBatch) -> anyhow::Result<()> {
        let display = path.display().to_string();
        let reader = BufReader::new(File::open(path)?);
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match lenient::parse_line(&line) {
                Ok(record) => batch.records.push(ParsedSearchRecord {
                    source_file: display.clone(),
                    line: index + 1,
                    record,
                }),
                Err(reason) => {
                    warn!("{}:{}: skipping malformed line: {}", display, index + 1, reason);
                    metrics::loader::line_malformed();
                    batch.malformed_lines += 1;
                }
            }
        }
        Ok(())
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

#[async_trait]
impl SearchRecordSourcePort for LogDirectorySource {
    async fn load_records(&self) -> anyhow::Result<RecordBatch> {
        self.read_all()
    }
}
