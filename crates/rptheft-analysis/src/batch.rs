//! Directory-level batch processing.
//!
//! Each dataset is read, enriched and written on a blocking worker. Datasets
//! run concurrently up to `jobs` at a time, and a failing dataset is reported
//! without stopping the others.

use eyre::{Context, Result};
use indicatif::ProgressBar;
use rptheft_data::dataset::{discover_datasets, processed_path, read_dataset, write_dataset};
use rptheft_data::types::OutputOptions;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::pipeline::{enrich_dataset, DatasetSummary, EnrichOptions};

/// Settings shared by every dataset of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Maximum datasets processed at once.
    pub jobs: usize,
    pub enrich: EnrichOptions,
    pub output: OutputOptions,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            jobs: 4,
            enrich: EnrichOptions::default(),
            output: OutputOptions::default(),
        }
    }
}

impl ProcessOptions {
    /// Output options with the `surrounding_max_bid` column tied to the enrichment step.
    fn output_options(&self) -> OutputOptions {
        OutputOptions {
            surrounding_max_bid: self.enrich.surrounding_mev,
            ..self.output
        }
    }
}

/// Result of processing one dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DatasetOutcome {
    Processed(DatasetSummary),
    Failed { error: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DatasetReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub outcome: DatasetOutcome,
}

impl DatasetReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, DatasetOutcome::Failed { .. })
    }
}

/// Reads, enriches and writes a single dataset.
///
/// # Errors
/// Returns error if the source cannot be read or the destination cannot be written.
#[tracing::instrument(skip_all, fields(source = %source.display()))]
pub fn process_file(
    source: &Path,
    destination: &Path,
    options: &ProcessOptions,
) -> Result<DatasetSummary> {
    let dataset = read_dataset(source)?;
    let enriched = enrich_dataset(dataset, options.enrich);
    write_dataset(destination, &enriched, options.output_options())?;

    let summary = DatasetSummary::from_dataset(&enriched);
    info!(
        dataset = %summary.dataset,
        rows = summary.rows,
        vanilla_blocks = summary.vanilla_blocks,
        sp_thefts = summary.sp_thefts,
        reg_thefts = summary.reg_thefts,
        destination = %destination.display(),
        "dataset processed"
    );
    Ok(summary)
}

/// Processes every `.csv` dataset of `source_dir` into `destination_dir`.
///
/// Outputs are named `processed_<file name>`. Reports come back in source
/// file order, one per dataset, whether it succeeded or not. `progress` is
/// advanced once per finished dataset.
///
/// # Errors
/// Returns error only if the destination cannot be created or the source
/// directory cannot be listed.
#[tracing::instrument(skip_all, fields(
    source_dir = %source_dir.display(),
    destination_dir = %destination_dir.display(),
))]
pub async fn process_directory(
    source_dir: &Path,
    destination_dir: &Path,
    options: ProcessOptions,
    progress: &ProgressBar,
) -> Result<Vec<DatasetReport>> {
    tokio::fs::create_dir_all(destination_dir)
        .await
        .wrap_err_with(|| {
            format!(
                "failed to create destination directory {}",
                destination_dir.display()
            )
        })?;

    let sources = discover_datasets(source_dir)?;
    if sources.is_empty() {
        warn!("no csv datasets found");
    }
    progress.set_length(sources.len() as u64);

    let semaphore = Arc::new(Semaphore::new(options.jobs.max(1)));
    let mut tasks = JoinSet::new();

    for (index, source) in sources.into_iter().enumerate() {
        let destination = processed_path(destination_dir, &source);
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;

            let job_source = source.clone();
            let job_destination = destination.clone();
            let joined = tokio::task::spawn_blocking(move || {
                process_file(&job_source, &job_destination, &options)
            })
            .await;

            let outcome = match joined {
                Ok(Ok(summary)) => DatasetOutcome::Processed(summary),
                Ok(Err(err)) => {
                    warn!(source = %source.display(), error = %format!("{err:#}"), "dataset failed");
                    DatasetOutcome::Failed {
                        error: format!("{err:#}"),
                    }
                }
                Err(err) => {
                    warn!(source = %source.display(), error = %err, "dataset worker aborted");
                    DatasetOutcome::Failed {
                        error: format!("worker aborted: {err}"),
                    }
                }
            };

            (
                index,
                DatasetReport {
                    source,
                    destination,
                    outcome,
                },
            )
        });
    }

    let mut reports = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (index, report) = joined.wrap_err("dataset task failed to join")?;
        progress.inc(1);
        reports.push((index, report));
    }
    progress.finish();

    reports.sort_by_key(|(index, _)| *index);
    Ok(reports.into_iter().map(|(_, report)| report).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "slot,in_smoothing_pool,relay_fee_recipient,max_bid\n\
                        200,true,0xAAA,1000000000000000000\n";

    #[test]
    fn process_file_writes_output() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let source = dir.path().join("slots.csv");
        let destination = dir.path().join("processed_slots.csv");
        std::fs::write(&source, GOOD).expect("fixture should write");

        let summary = process_file(&source, &destination, &ProcessOptions::default())
            .expect("processing should succeed");

        assert_eq!(summary.rows, 1);
        assert_eq!(summary.sp_thefts, 1);
        let written = std::fs::read_to_string(&destination).expect("output should read");
        assert!(written.starts_with("slot,in_smoothing_pool,relay_fee_recipient,max_bid,vanilla_block"));
        assert!(written.contains("200,true,0xaaa,1.0,false,true,false"));
    }

    #[tokio::test]
    async fn failing_dataset_does_not_stop_batch() {
        let source_dir = tempfile::tempdir().expect("tempdir should create");
        let destination_dir = tempfile::tempdir().expect("tempdir should create");
        std::fs::write(source_dir.path().join("a.csv"), GOOD).expect("fixture should write");
        std::fs::write(source_dir.path().join("b.csv"), "max_bid\n1\n").expect("fixture should write");
        std::fs::write(source_dir.path().join("c.csv"), GOOD).expect("fixture should write");

        let options = ProcessOptions {
            jobs: 2,
            ..Default::default()
        };
        let reports = process_directory(
            source_dir.path(),
            destination_dir.path(),
            options,
            &ProgressBar::hidden(),
        )
        .await
        .expect("batch should run");

        assert_eq!(reports.len(), 3);
        assert!(!reports[0].is_failed());
        assert!(reports[1].is_failed());
        assert!(!reports[2].is_failed());
        assert!(destination_dir.path().join("processed_a.csv").exists());
        assert!(destination_dir.path().join("processed_c.csv").exists());
        assert!(!destination_dir.path().join("processed_b.csv").exists());
    }
}
