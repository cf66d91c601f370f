use std::path::Path;

use log::info;

use crate::config::EncodeConfig;
use crate::conflict;
use crate::copy;
use crate::encode::{self, EncodeSummary};
use crate::error::Result;
use crate::probe;
use crate::scan;
use crate::task;

/// Full pre-build run: validate, scan, classify, collision gate, encoder
/// probe, then the incremental parallel encode. Each gate must pass before
/// the next phase starts; the collision gate runs before the probe so a
/// broken source tree is reported even on a machine without the encoder.
pub async fn run_build(cfg: &EncodeConfig) -> Result<EncodeSummary> {
    cfg.validate()?;

    info!("scanning {} for audio files", cfg.source_dir.display());
    let files = scan::walk_tree(&cfg.source_dir)?;
    let candidates = scan::classify_audio(files);

    conflict::ensure_unique_stems(&cfg.source_dir, &candidates)?;
    probe::check_encoder(&cfg.encoder_bin).await?;

    let tasks = task::plan_tasks(cfg, candidates)?;
    encode::encode_all(cfg, tasks).await
}

/// Post-build materialization: mirror the compressed tree into the host
/// build's output directory. Only meaningful after a production build;
/// the host decides when to call it.
pub async fn run_post_build(cfg: &EncodeConfig, build_dir: &Path) -> Result<usize> {
    let files = scan::walk_tree(&cfg.dest_dir)?;
    copy::copy_tree(&cfg.dest_dir, files, build_dir, cfg.jobs).await
}
