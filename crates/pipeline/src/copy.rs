use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::ProgressBar;
use log::{debug, error, info};
use tokio::sync::Semaphore;

use crate::encode::progress_style;
use crate::error::{PipelineError, Result};

/// Mirror the compressed tree into the host build's output directory.
///
/// Every file is copied unconditionally; there is no staleness check here.
/// A full copy per run keeps this phase trivial at the cost of redundant
/// I/O on unchanged trees. Copies run over the same bounded pool as the
/// encode phase, and the first failure stops scheduling and fails the
/// phase. Returns the number of files copied.
pub async fn copy_tree(
    compressed_root: &Path,
    files: Vec<PathBuf>,
    build_root: &Path,
    jobs: usize,
) -> Result<usize> {
    let total = files.len();
    if total == 0 {
        info!("no compressed audio to copy");
        return Ok(0);
    }

    info!(
        "copying {} compressed file(s) into {}",
        total,
        build_root.display()
    );

    // Resolve every target path up front so path errors surface before
    // any copy is scheduled.
    let mut pairs = Vec::with_capacity(total);
    for file in files {
        let rel = file
            .strip_prefix(compressed_root)
            .map_err(|_| {
                PipelineError::Config(format!(
                    "{} is not under {}",
                    file.display(),
                    compressed_root.display()
                ))
            })?
            .to_path_buf();
        let target = build_root.join(rel);
        pairs.push((file, target));
    }

    let bar = ProgressBar::new(total as u64);
    bar.set_style(progress_style("copying"));

    let semaphore = Arc::new(Semaphore::new(jobs));
    let abort = Arc::new(AtomicBool::new(false));
    let mut in_flight = FuturesUnordered::new();

    for (file, target) in pairs {
        if abort.load(Ordering::SeqCst) {
            debug!("not scheduling remaining copies after failure");
            break;
        }

        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore closed");
        let abort = abort.clone();
        let bar = bar.clone();

        in_flight.push(tokio::spawn(async move {
            let outcome = copy_one(&file, &target).await;
            if outcome.is_err() {
                abort.store(true, Ordering::SeqCst);
            }
            bar.inc(1);
            drop(permit);
            outcome
        }));
    }

    let mut copied = 0usize;
    let mut first_error = None;

    while let Some(joined) = in_flight.next().await {
        let Ok(outcome) = joined else {
            continue;
        };
        match outcome {
            Ok(()) => copied += 1,
            Err(e) => {
                error!("{e}");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    if first_error.is_none() {
        bar.finish();
    } else {
        bar.abandon();
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    info!("copied {copied} file(s) into {}", build_root.display());
    Ok(copied)
}

async fn copy_one(source: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            PipelineError::io(
                format!("failed to create output directory {}", parent.display()),
                e,
            )
        })?;
    }
    tokio::fs::copy(source, target).await.map_err(|e| {
        PipelineError::io(
            format!(
                "failed to copy {} to {}",
                source.display(),
                target.display()
            ),
            e,
        )
    })?;
    Ok(())
}
