use std::path::Path;

use log::info;
use tokio::process::Command;

use crate::error::{PipelineError, Result};

/// Codec the external encoder must provide.
pub const TARGET_CODEC: &str = "libopus";

/// Verify the encoder binary is present and can produce the target codec
/// by encoding a one-second synthetic tone to a throwaway file. The
/// artifact lives in a temporary directory that is removed when the guard
/// drops, so no run can leave it behind. Runs once, before any per-file
/// work; failure here fails the whole run with the probe's own output so
/// the user gets one diagnostic instead of one per file.
pub async fn check_encoder(encoder_bin: &Path) -> Result<()> {
    info!(
        "checking {} for {} support...",
        encoder_bin.display(),
        TARGET_CODEC
    );

    let probe_dir = tempfile::tempdir()
        .map_err(|e| PipelineError::io("failed to create probe directory", e))?;
    let probe_out = probe_dir.path().join("probe.opus");

    let output = Command::new(encoder_bin)
        .args([
            "-loglevel",
            "error",
            "-y",
            "-f",
            "lavfi",
            "-i",
            "sine=frequency=1000:duration=1",
            "-c:a",
            TARGET_CODEC,
        ])
        .arg(&probe_out)
        .output()
        .await
        .map_err(|e| PipelineError::Capability {
            detail: format!("failed to run {}", encoder_bin.display()),
            output: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(PipelineError::Capability {
            detail: format!(
                "{} has no usable {} encoder (exit code {})",
                encoder_bin.display(),
                TARGET_CODEC,
                output.status.code().unwrap_or(-1)
            ),
            output: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    info!("encoder ok: {}", encoder_bin.display());
    Ok(())
}
