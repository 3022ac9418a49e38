//! Batch mapping of a bestiary file.
//!
//! Reads every record with the 5etools importer, maps the valid ones to
//! creatures (in parallel with rayon unless disabled) and writes the result
//! as pretty-printed JSON. Output order always equals input order.

use std::path::{Path, PathBuf};

use bestiary_domain::Creature;
use rayon::prelude::*;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::infrastructure::importers::{
    map_creature, FiveToolsImporter, FiveToolsMonster, ImportError,
};

const DEFAULT_OUTPUT: &str = "MappedCreatures.json";

/// Errors that can occur in the bestiary service.
#[derive(Debug, Error)]
pub enum BestiaryError {
    #[error("Import error: {0}")]
    Import(#[from] ImportError),
    #[error("No input file configured (pass a path or set BESTIARY_INPUT)")]
    MissingInput,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Mapping task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Configuration for the bestiary service.
#[derive(Debug, Clone)]
pub struct BestiaryServiceConfig {
    /// Bestiary file to read.
    pub input: Option<PathBuf>,
    /// Where the mapped creatures are written.
    pub output: PathBuf,
    /// Map records with rayon.
    pub parallel: bool,
    /// Abort on the first structurally invalid record instead of skipping it.
    pub fail_fast: bool,
    /// Identifier of the first record in the file.
    pub first_id: u64,
    /// Rayon worker threads; 0 uses rayon's default.
    pub workers: usize,
}

impl Default for BestiaryServiceConfig {
    fn default() -> Self {
        Self {
            input: None,
            output: PathBuf::from(DEFAULT_OUTPUT),
            parallel: true,
            fail_fast: false,
            first_id: 1,
            workers: 0,
        }
    }
}

impl BestiaryServiceConfig {
    /// Read the `BESTIARY_*` environment variables over the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            input: std::env::var("BESTIARY_INPUT")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
            output: std::env::var("BESTIARY_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or(defaults.output),
            parallel: env_or("BESTIARY_PARALLEL", defaults.parallel),
            fail_fast: env_or("BESTIARY_FAIL_FAST", defaults.fail_fast),
            first_id: env_or("BESTIARY_FIRST_ID", defaults.first_id),
            workers: env_or("BESTIARY_WORKERS", defaults.workers),
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!(name, value = %value, "Ignoring unparseable setting");
            default
        }),
        Err(_) => default,
    }
}

/// A record that could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub index: usize,
    pub name: Option<String>,
    pub reason: String,
}

impl RecordFailure {
    fn from_error(index: usize, error: ImportError) -> Self {
        match error {
            ImportError::InvalidRecord {
                index,
                name,
                reason,
            } => Self {
                index,
                name,
                reason,
            },
            other => Self {
                index,
                name: None,
                reason: other.to_string(),
            },
        }
    }
}

/// Outcome of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Records in the input file.
    pub total: usize,
    pub mapped: usize,
    pub failures: Vec<RecordFailure>,
    /// Diagnostics attached across all mapped creatures.
    pub diagnostics: usize,
}

impl BatchReport {
    pub fn skipped(&self) -> usize {
        self.failures.len()
    }
}

/// Maps bestiary files to normalized creatures.
pub struct BestiaryService {
    config: BestiaryServiceConfig,
}

impl BestiaryService {
    pub fn new(config: BestiaryServiceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BestiaryServiceConfig {
        &self.config
    }

    /// Map the configured input and write the configured output.
    pub async fn run(&self) -> Result<BatchReport, BestiaryError> {
        let input = self
            .config
            .input
            .clone()
            .ok_or(BestiaryError::MissingInput)?;
        info!(
            input = %input.display(),
            output = %self.config.output.display(),
            parallel = self.config.parallel,
            "Mapping bestiary"
        );

        let (creatures, report) = self.map_file(&input).await?;
        let json = serde_json::to_string_pretty(&creatures)?;
        fs::write(&self.config.output, json).await?;

        info!(
            mapped = report.mapped,
            skipped = report.skipped(),
            diagnostics = report.diagnostics,
            "Wrote {}",
            self.config.output.display()
        );
        Ok(report)
    }

    /// Read and map one file without writing anything.
    ///
    /// Each creature's id is `first_id` plus its position in the file, so a
    /// skipped record leaves a gap rather than shifting later ids.
    pub async fn map_file(
        &self,
        input: &Path,
    ) -> Result<(Vec<Creature>, BatchReport), BestiaryError> {
        let records = FiveToolsImporter::new(input).import_monsters().await?;
        let total = records.len();

        let mut valid = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for (index, record) in records.into_iter().enumerate() {
            match record {
                Ok(monster) => valid.push((index, monster)),
                Err(error) if self.config.fail_fast => return Err(error.into()),
                Err(error) => {
                    warn!(index, error = %error, "Skipping invalid record");
                    failures.push(RecordFailure::from_error(index, error));
                }
            }
        }
        debug!(total, valid = valid.len(), "Records read");

        let first_id = self.config.first_id;
        let parallel = self.config.parallel;
        let workers = self.config.workers;
        let creatures =
            tokio::task::spawn_blocking(move || map_all(&valid, first_id, parallel, workers))
                .await??;

        let report = BatchReport {
            total,
            mapped: creatures.len(),
            failures,
            diagnostics: creatures.iter().map(|c| c.diagnostics.len()).sum(),
        };
        Ok((creatures, report))
    }
}

fn map_all(
    records: &[(usize, FiveToolsMonster)],
    first_id: u64,
    parallel: bool,
    workers: usize,
) -> Result<Vec<Creature>, rayon::ThreadPoolBuildError> {
    let map_one = |(index, monster): &(usize, FiveToolsMonster)| {
        map_creature(monster, Some(first_id.saturating_add(*index as u64)))
    };

    if !parallel {
        return Ok(records.iter().map(map_one).collect());
    }
    if workers == 0 {
        return Ok(records.par_iter().map(map_one).collect());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()?;
    Ok(pool.install(|| records.par_iter().map(map_one).collect()))
}
