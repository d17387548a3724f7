use std::path::{Path, PathBuf};

use anyhow::Context;

/// Raw text of the three source tables for one run.
#[derive(Debug, Clone)]
pub struct TableSet {
    pub confirmed: String,
    pub deaths: String,
    pub recovered: String,
}

/// Retrieves the three table blobs from local CSV snapshots.
///
/// The reads are issued concurrently and joined before parsing begins; if
/// any of them fails the whole run fails with no snapshot produced.
#[derive(Debug, Clone)]
pub struct FileSource {
    confirmed: PathBuf,
    deaths: PathBuf,
    recovered: PathBuf,
}

impl FileSource {
    pub fn new(confirmed: PathBuf, deaths: PathBuf, recovered: PathBuf) -> Self {
        FileSource {
            confirmed,
            deaths,
            recovered,
        }
    }

    pub async fn fetch(&self) -> anyhow::Result<TableSet> {
        log::debug!("fetching source tables");
        let (confirmed, deaths, recovered) = tokio::try_join!(
            read_table(&self.confirmed, "confirmed"),
            read_table(&self.deaths, "deaths"),
            read_table(&self.recovered, "recovered"),
        )?;

        Ok(TableSet {
            confirmed,
            deaths,
            recovered,
        })
    }
}

async fn read_table(path: &Path, label: &str) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("{label} table unavailable at {}", path.display()))
}
