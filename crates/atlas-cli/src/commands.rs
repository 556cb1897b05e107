use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;
use tokio::io::BufReader;
use tokio::runtime::Runtime;
use walkdir::WalkDir;

use atlas_archive::{ArchiveWriter, AssetArchive, ColorTable, Manifest};
use atlas_host::{run_stdio, HostConfig, ViewerServer, ViewerSession};
use atlas_pipeline::{BatchOutcome, PipelineConfig};
use atlas_types::{ModelId, PackedColor, Placement, Vec3};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => HostConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HostConfig::default(),
    };
    let format = cli.format;
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args),
        Command::Stdio => cmd_stdio(config),
        Command::Load(args) => cmd_load(config, args, format),
        Command::Batch(args) => cmd_batch(config, args, format),
        Command::Colors(args) => cmd_colors(args, format),
        Command::Inspect(args) => cmd_inspect(&config.pipeline, args, format),
        Command::Pack(args) => cmd_pack(args),
    }
}

fn runtime() -> anyhow::Result<Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

fn placement(args: &PositionArgs) -> Placement {
    Placement::at(Vec3::new(args.x, args.y, args.z)).with_scale(Vec3::splat(args.scale))
}

fn cmd_serve(mut config: HostConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    println!(
        "Atlas viewer host on {} (namespace: {})",
        config.bind_addr.to_string().bold(),
        config.namespace.cyan()
    );
    let server = ViewerServer::new(ViewerSession::new(config));
    runtime()?.block_on(server.serve())?;
    Ok(())
}

fn cmd_stdio(config: HostConfig) -> anyhow::Result<()> {
    let session = ViewerSession::new(config);
    runtime()?.block_on(async move {
        run_stdio(session, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
    })?;
    Ok(())
}

fn cmd_load(config: HostConfig, args: LoadArgs, format: OutputFormat) -> anyhow::Result<()> {
    let id = ModelId::parse(args.id)?;
    let session = ViewerSession::new(config);
    let summary = runtime()?.block_on(session.pipeline().acquire(
        &args.url,
        id,
        placement(&args.position),
    ))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => {
            let p = summary.position;
            println!("{} Loaded {}", "✓".green().bold(), summary.id.as_str().yellow().bold());
            println!("  Source: {}", args.url.blue());
            println!("  Position: ({}, {}, {})", p.x, p.y, p.z);
        }
    }
    Ok(())
}

fn cmd_batch(config: HostConfig, args: BatchArgs, format: OutputFormat) -> anyhow::Result<()> {
    let session = ViewerSession::new(config);
    let report = runtime()?.block_on(
        session
            .pipeline()
            .acquire_batch(&args.url, placement(&args.position)),
    )?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    for entry in &report.entries {
        match &entry.outcome {
            BatchOutcome::Loaded { .. } => {
                println!("  {} {} ({})", "loaded:".green(), entry.id.yellow(), entry.path)
            }
            BatchOutcome::Failed { error } => {
                println!("  {} {} ({}): {}", "failed:".red(), entry.id.yellow(), entry.path, error)
            }
        }
    }
    let mark = if report.failed() == 0 {
        "✓".green().bold()
    } else {
        "!".yellow().bold()
    };
    println!(
        "{} {} loaded, {} failed from {}",
        mark,
        report.loaded(),
        report.failed(),
        args.url.blue()
    );
    Ok(())
}

fn cmd_colors(args: ColorsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.path)
        .with_context(|| format!("reading {}", args.path.display()))?;
    let table = ColorTable::parse(&text);

    if format == OutputFormat::Json {
        let map: serde_json::Map<_, _> = table
            .sorted()
            .into_iter()
            .map(|(name, color)| (name.to_string(), json!(color.to_string())))
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }
    for (name, color) in table.sorted() {
        println!("  {:<24} {}", name, color.to_string().cyan());
    }
    println!("{} colors", table.len().to_string().bold());
    Ok(())
}

/// One in-scope bundle asset as it would be registered.
#[derive(Debug, PartialEq)]
pub struct ScopedAsset {
    pub path: String,
    pub id: String,
    pub color: PackedColor,
    pub colored: bool,
}

#[derive(Debug)]
pub struct BundleListing {
    pub entries: usize,
    pub folders: Vec<String>,
    pub color_table: Option<String>,
    pub assets: Vec<ScopedAsset>,
}

/// Scope a bundle the way the pipeline would, without decoding any asset.
pub fn inspect_bundle(data: Vec<u8>, config: &PipelineConfig) -> anyhow::Result<BundleListing> {
    let mut archive = AssetArchive::from_bytes(data)?;
    let Some(manifest_entry) = archive.find_by_suffix(&config.manifest_suffix) else {
        bail!("manifest not found (no entry ending in {:?})", config.manifest_suffix);
    };
    let manifest = Manifest::parse(&archive.read(&manifest_entry)?)?;

    let (color_table, colors) = match archive.find_by_suffix(&config.color_table_suffix) {
        Some(entry) => {
            let table = ColorTable::parse(&archive.read_to_string(&entry)?);
            (Some(entry.path), table)
        }
        None => (None, ColorTable::default()),
    };

    let rules = config.naming_rules();
    let assets = manifest
        .resolve(archive.entries(), &config.asset_extension)
        .into_iter()
        .map(|entry| {
            let name = rules.derive(&entry.path);
            let found = colors.get(&name.color_key);
            ScopedAsset {
                path: entry.path,
                id: name.id,
                color: found.unwrap_or(config.default_color),
                colored: found.is_some(),
            }
        })
        .collect();

    Ok(BundleListing {
        entries: archive.len(),
        folders: manifest.folders().to_vec(),
        color_table,
        assets,
    })
}

fn cmd_inspect(config: &PipelineConfig, args: InspectArgs, format: OutputFormat) -> anyhow::Result<()> {
    let data = std::fs::read(&args.path).with_context(|| format!("reading {}", args.path.display()))?;
    let listing = inspect_bundle(data, config)?;

    if format == OutputFormat::Json {
        let assets: Vec<_> = listing
            .assets
            .iter()
            .map(|a| json!({"path": a.path, "id": a.id, "color": a.color.to_string(), "colored": a.colored}))
            .collect();
        let out = json!({
            "entries": listing.entries,
            "folders": listing.folders,
            "colorTable": listing.color_table,
            "assets": assets,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Bundle {} ({} entries)", args.path.display().to_string().bold(), listing.entries);
    println!("  Folders: {}", listing.folders.join(", ").cyan());
    match &listing.color_table {
        Some(path) => println!("  Color table: {}", path),
        None => println!("  Color table: {}", "missing (bundle would be rejected)".red()),
    }
    for asset in &listing.assets {
        let color = if asset.colored {
            asset.color.to_string().cyan()
        } else {
            asset.color.to_string().dimmed()
        };
        println!("  {:<20} {}  {}", asset.id.yellow(), color, asset.path);
    }
    println!("{} assets in scope", listing.assets.len().to_string().bold());
    Ok(())
}

/// Zip every file under `dir`, keyed by its `/`-separated relative path.
pub fn pack_dir(dir: &Path) -> anyhow::Result<(Vec<u8>, usize)> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let mut writer = ArchiveWriter::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(dir)?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let data = std::fs::read(entry.path())
            .with_context(|| format!("reading {}", entry.path().display()))?;
        writer.add_file(&name, &data)?;
    }
    let count = writer.file_count();
    Ok((writer.finish()?, count))
}

fn cmd_pack(args: PackArgs) -> anyhow::Result<()> {
    let (bytes, count) = pack_dir(&args.dir)?;
    let mut file = std::fs::File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    file.write_all(&bytes)?;
    println!(
        "{} Packed {} files into {} ({} bytes)",
        "✓".green().bold(),
        count,
        args.output.display().to_string().bold(),
        bytes.len()
    );
    Ok(())
}
