use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};
use tokio::process::Command;
use tokio::sync::Semaphore;

use crate::config::{EncodeConfig, FailurePolicy};
use crate::error::{PipelineError, Result};
use crate::probe::TARGET_CODEC;
use crate::task::{self, EncodeTask};

/// What happened to one task.
enum TaskOutcome {
    Encoded,
    UpToDate,
}

/// Aggregate outcome of the encode phase.
#[derive(Debug, Default)]
pub struct EncodeSummary {
    pub encoded: usize,
    pub skipped: usize,
    pub failed: Vec<(PathBuf, String)>,
}

pub(crate) fn progress_style(msg: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{percent}}%) {msg}"
        ))
        .unwrap()
        .progress_chars("#>-")
}

/// Run the encoder for every stale task, up to `cfg.jobs` at once.
///
/// Up-to-date tasks are skipped but still advance the progress counter.
/// Under the default abort policy the first failure stops scheduling new
/// tasks; work already in flight drains before the run fails. The
/// progress bar is torn down on both paths.
pub async fn encode_all(cfg: &EncodeConfig, tasks: Vec<EncodeTask>) -> Result<EncodeSummary> {
    let total = tasks.len();
    if total == 0 {
        info!("no audio files to encode");
        return Ok(EncodeSummary::default());
    }

    info!(
        "encoding {} file(s) with {} worker(s) at {} bps",
        total, cfg.jobs, cfg.bitrate
    );

    let bar = ProgressBar::new(total as u64);
    bar.set_style(progress_style("encoding"));

    let semaphore = Arc::new(Semaphore::new(cfg.jobs));
    let abort = Arc::new(AtomicBool::new(false));
    let mut in_flight = FuturesUnordered::new();

    for task in tasks {
        // Under the abort policy a recorded failure stops the scheduling
        // loop; workers already running are left to finish.
        if abort.load(Ordering::SeqCst) {
            debug!("not scheduling remaining tasks after failure");
            break;
        }

        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore closed");
        let encoder_bin = cfg.encoder_bin.clone();
        let bitrate = cfg.bitrate;
        let policy = cfg.on_encode_failure;
        let abort = abort.clone();
        let bar = bar.clone();

        in_flight.push(tokio::spawn(async move {
            let outcome = run_task(&encoder_bin, bitrate, &task).await;
            if outcome.is_err() && policy == FailurePolicy::Abort {
                abort.store(true, Ordering::SeqCst);
            }
            bar.inc(1);
            drop(permit);
            (task, outcome)
        }));
    }

    let mut summary = EncodeSummary::default();
    let mut first_error = None;

    while let Some(joined) = in_flight.next().await {
        let Ok((task, outcome)) = joined else {
            continue;
        };
        match outcome {
            Ok(TaskOutcome::Encoded) => summary.encoded += 1,
            Ok(TaskOutcome::UpToDate) => {
                debug!("up to date: {}", task.source.display());
                summary.skipped += 1;
            }
            Err(e) => {
                error!("{e}");
                summary.failed.push((task.source.clone(), e.to_string()));
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    if summary.failed.is_empty() {
        bar.finish();
    } else {
        bar.abandon();
    }

    info!(
        "encode phase done: {} encoded, {} up to date, {} failed",
        summary.encoded,
        summary.skipped,
        summary.failed.len()
    );

    if let Some(e) = first_error {
        if cfg.on_encode_failure == FailurePolicy::Abort {
            return Err(e);
        }
    }
    Ok(summary)
}

/// Encode one file if its staleness verdict says so. The destination
/// directory is created just before the encoder runs.
async fn run_task(encoder_bin: &Path, bitrate: u32, task: &EncodeTask) -> Result<TaskOutcome> {
    if !task::needs_encode(task)? {
        return Ok(TaskOutcome::UpToDate);
    }

    if let Some(parent) = task.dest.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            PipelineError::io(
                format!("failed to create output directory {}", parent.display()),
                e,
            )
        })?;
    }

    debug!(
        "encoding {} -> {}",
        task.source.display(),
        task.dest.display()
    );

    let output = Command::new(encoder_bin)
        .arg("-loglevel")
        .arg("error")
        .arg("-y")
        .arg("-i")
        .arg(&task.source)
        .arg("-c:a")
        .arg(TARGET_CODEC)
        .arg("-b:a")
        .arg(bitrate.to_string())
        .arg(&task.dest)
        .output()
        .await
        .map_err(|e| PipelineError::Encode {
            path: task.source.clone(),
            detail: format!("failed to spawn {}: {e}", encoder_bin.display()),
        })?;

    if !output.status.success() {
        return Err(PipelineError::Encode {
            path: task.source.clone(),
            detail: format!(
                "encoder exited with code {}\nstdout:\n{}\nstderr:\n{}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr),
            ),
        });
    }

    Ok(TaskOutcome::Encoded)
}
