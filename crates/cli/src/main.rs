use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use pipeline::{run_build, run_post_build, EncodeConfig, FailurePolicy};
use std::path::PathBuf;

/// Incremental parallel audio compressor for the asset build
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (JSON or TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing the raw audio tree
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Directory receiving the compressed audio tree
    #[arg(short, long)]
    dest: Option<PathBuf>,

    /// Target bitrate in bits per second
    #[arg(short, long)]
    bitrate: Option<u32>,

    /// Number of parallel encoder processes
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Encoder binary to invoke
    #[arg(long)]
    encoder: Option<PathBuf>,

    /// What to do when a single file fails to encode
    /// (abort | continue-and-report)
    #[arg(long)]
    on_encode_failure: Option<FailurePolicy>,

    /// Production build output directory; when set, also copy the
    /// compressed tree there after encoding
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Use RUST_LOG env var or default to info level
    env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .init();

    let args = Args::parse();

    let mut cfg = EncodeConfig::load_config(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(source) = args.source {
        cfg.source_dir = source;
    }
    if let Some(dest) = args.dest {
        cfg.dest_dir = dest;
    }
    if let Some(bitrate) = args.bitrate {
        cfg.bitrate = bitrate;
    }
    if let Some(jobs) = args.jobs {
        cfg.jobs = jobs;
    }
    if let Some(encoder) = args.encoder {
        cfg.encoder_bin = encoder;
    }
    if let Some(policy) = args.on_encode_failure {
        cfg.on_encode_failure = policy;
    }

    info!("audio pipeline starting");
    info!("  source:  {}", cfg.source_dir.display());
    info!("  dest:    {}", cfg.dest_dir.display());
    info!("  bitrate: {} bps", cfg.bitrate);
    info!("  workers: {}", cfg.jobs);
    info!("  policy:  {}", cfg.on_encode_failure);

    let summary = run_build(&cfg).await.context("Audio encode failed")?;
    info!(
        "encode complete: {} encoded, {} up to date, {} failed",
        summary.encoded,
        summary.skipped,
        summary.failed.len()
    );

    if let Some(out_dir) = args.out_dir {
        let copied = run_post_build(&cfg, &out_dir)
            .await
            .context("Failed to copy compressed audio into the build output")?;
        info!("materialized {} file(s) into {}", copied, out_dir.display());
    }

    Ok(())
}
