mod cli;

use stickerforge::{
    catalog::{self, ConvertPlan, RawLayout},
    config,
    download::{DownloadOutcome, Downloader, FetchStatus},
    pipeline::{self, PipelineExecutor},
    queue::Counter,
};
use stickerforge_av::decrypt::decrypt_file;
use stickerforge_av::{ToolRegistry, Workspace};
use stickerforge_common::{PackId, StickerId, StickerType};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "stickerforge=trace,stickerforge_av=debug".to_string()
        } else {
            "stickerforge=info,stickerforge_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Fetch {
            pack_id,
            sticker_type,
            ids,
            out,
        } => fetch(cli.config.as_deref(), &pack_id, sticker_type, &ids, &out),
        Commands::Convert {
            raw_dir,
            sticker_type,
            format,
            scale,
            no_overlay,
            out,
            dry_run,
        } => {
            let plan = ConvertPlan {
                kind: sticker_type,
                format,
                scale_requested: scale,
                overlay: !no_overlay,
                output_dir: out,
            };
            convert(cli.config.as_deref(), &raw_dir, &plan, dry_run)
        }
        Commands::Decrypt { files, out } => decrypt(&files, &out),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("stickerforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn fetch(
    config_path: Option<&Path>,
    pack_id: &str,
    sticker_type: StickerType,
    ids: &[String],
    out: &Path,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let pack = PackId::from(pack_id);
    let ids: Vec<StickerId> = ids
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(StickerId::from)
        .collect();
    if ids.is_empty() {
        anyhow::bail!("No sticker ids given");
    }

    let layout = RawLayout::new(out);
    let jobs = catalog::fetch_jobs(sticker_type, &pack, &ids, &layout);
    let total = jobs.len();
    tracing::info!("Fetching {} files for pack {} ({})", total, pack, sticker_type);

    let counter = Arc::new(Counter::new());
    let downloader = Downloader::new(&config.download, counter.clone())?;
    let outcomes = downloader.download_all(jobs, config.workers.download)?;

    let mut downloaded = 0;
    let mut skipped = 0;
    let mut failed = Vec::new();
    for outcome in &outcomes {
        match outcome {
            DownloadOutcome::Done {
                status: FetchStatus::Downloaded(_),
                ..
            } => downloaded += 1,
            DownloadOutcome::Done {
                status: FetchStatus::Skipped,
                ..
            } => skipped += 1,
            DownloadOutcome::Failed { label, error, .. } => failed.push((label, error)),
        }
    }

    println!(
        "Downloaded: {}, already present: {}, failed: {} (of {})",
        downloaded,
        skipped,
        failed.len(),
        total
    );
    for (label, error) in &failed {
        println!("  ✗ {}: {}", label, error);
    }

    if !failed.is_empty() {
        anyhow::bail!("{} downloads failed", failed.len());
    }
    Ok(())
}

fn convert(config_path: Option<&Path>, raw_dir: &Path, plan: &ConvertPlan, dry_run: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !raw_dir.is_dir() {
        anyhow::bail!("Raw pack directory does not exist: {:?}", raw_dir);
    }

    let layout = RawLayout::new(raw_dir);
    let tasks = catalog::plan_tasks(&layout, plan)?;

    let has_icon = tasks.iter().any(|t| t.id().as_str() == catalog::ICON_ID);
    println!("Stickers: {}", tasks.len() - usize::from(has_icon));
    println!("Output format: {}", plan.format);
    if has_icon {
        println!("Pack icon: {}", plan.output_dir.join("icon.webm").display());
    }
    if let Some(first) = tasks.first() {
        if first.scale() > 0 {
            println!("Scale: {}px", first.scale());
        }
        let ops: Vec<&str> = first.operations().iter().map(|op| op.as_str()).collect();
        println!("Operations: {}", if ops.is_empty() { "copy".to_string() } else { ops.join(" -> ") });
    }

    if dry_run {
        for task in &tasks {
            println!("  {} -> {}", task.input().display(), task.output().display());
        }
        println!("\n[DRY RUN] Would transcode {} files", tasks.len());
        return Ok(());
    }

    let tools = ToolRegistry::discover(&config.tools);
    if tasks.iter().any(|t| !t.operations().is_empty()) {
        tools
            .require_all()
            .context("External tools are missing; run `stickerforge check-tools`")?;
    }

    std::fs::create_dir_all(&plan.output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", plan.output_dir))?;

    let workspace = Workspace::new()?;
    tracing::debug!("Scratch workspace at {:?}", workspace.path());
    let executor = PipelineExecutor::new(&tools, &workspace, config.limits.to_encode_settings());

    let counter = Counter::new();
    let outcomes = pipeline::transcode_all(&executor, tasks, config.workers.transcode, &counter)?;

    let failed: Vec<_> = outcomes.iter().filter(|o| !o.is_ok()).collect();
    println!("\nConverted {} of {} stickers", counter.get(), outcomes.len());
    for outcome in &failed {
        if let Err(ref e) = outcome.result {
            println!("  ✗ {}: {}", outcome.id, e.lines().next().unwrap_or(""));
        }
    }
    println!("Output: {}", plan.output_dir.display());

    if !failed.is_empty() {
        anyhow::bail!("{} stickers failed to convert", failed.len());
    }
    Ok(())
}

fn decrypt(files: &[PathBuf], out: &Path) -> Result<()> {
    std::fs::create_dir_all(out)
        .with_context(|| format!("Failed to create output directory: {:?}", out))?;

    for file in files {
        let name = file
            .file_name()
            .with_context(|| format!("Not a file: {:?}", file))?;
        let target = out.join(name);
        decrypt_file(file, &target).with_context(|| format!("Failed to decrypt {:?}", file))?;
        println!("{} -> {}", file.display(), target.display());
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg and ImageMagick 7 to convert stickers.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!(
        "  Workers: download {}, transcode {}",
        config.workers.download, config.workers.transcode
    );
    println!(
        "  Limits: {:.1}s, {} bytes, {} cap iterations",
        config.limits.max_duration_secs, config.limits.max_size_bytes, config.limits.max_cap_iterations
    );
    println!("  Tools: timeout {}s", config.tools.timeout_secs);
    println!(
        "  Download: {} attempts, timeout {}s, proxy {}",
        config.download.max_attempts,
        config.download.timeout_secs,
        config.download.proxy.as_deref().unwrap_or("none")
    );

    Ok(())
}
