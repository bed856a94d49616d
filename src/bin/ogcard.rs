use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use sha2::Digest as _;

#[derive(Parser, Debug)]
#[command(name = "ogcard", version)]
struct Cli {
    /// JSON config file; environment variables override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the preview for a news article looked up by slug.
    News(NewsArgs),
    /// Generate a preview from a record JSON file.
    Render(RenderArgs),
    /// Delete cached artifacts from the configured output cache.
    ClearCache,
    /// Print family name and SHA-256 of the configured font files.
    Fonts,
}

#[derive(Parser, Debug)]
struct NewsArgs {
    /// Article slug.
    #[arg(long)]
    slug: String,

    /// Directory holding `news/{slug}.json` records.
    #[arg(long, default_value = "content")]
    store: PathBuf,

    /// Render even when a cached artifact exists.
    #[arg(long)]
    force: bool,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input record JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Content type tag.
    #[arg(long = "type", default_value = "news")]
    content_type: String,

    /// Render even when a cached artifact exists.
    #[arg(long)]
    force: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    match cli.cmd {
        Command::News(args) => cmd_news(config, args),
        Command::Render(args) => cmd_render(config, args),
        Command::ClearCache => cmd_clear_cache(&config),
        Command::Fonts => cmd_fonts(&config),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ogcard::ServiceConfig> {
    let base = match path {
        Some(p) => ogcard::ServiceConfig::from_json_file(p)?,
        None => ogcard::ServiceConfig::default(),
    };
    Ok(base.overlay_env(|key| std::env::var(key).ok())?)
}

fn finish(app: &ogcard::App, result: ogcard::OgResult<ogcard::ArtifactLocation>) -> anyhow::Result<ExitCode> {
    let code = match result {
        Ok(location) => {
            println!("{location}");
            ExitCode::SUCCESS
        }
        Err(err) if err.is_not_found() => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
        Err(err) => {
            app.close()?;
            return Err(err.into());
        }
    };
    let stats = app.orchestrator().stats();
    tracing::debug!(?stats, "generation stats");
    app.close()?;
    Ok(code)
}

fn cmd_news(config: ogcard::ServiceConfig, args: NewsArgs) -> anyhow::Result<ExitCode> {
    let store = Arc::new(ogcard::JsonDirContentStore::new(&args.store));
    let app = ogcard::App::from_config(config, store)?;
    let result = app.news_preview(&args.slug, args.force);
    finish(&app, result)
}

fn cmd_render(config: ogcard::ServiceConfig, args: RenderArgs) -> anyhow::Result<ExitCode> {
    let raw = std::fs::read_to_string(&args.in_path)
        .with_context(|| format!("read record '{}'", args.in_path.display()))?;
    let data = ogcard::ContentData::from_json_str(&raw)?;
    let content_type: ogcard::ContentType = args.content_type.parse()?;

    let app = ogcard::App::from_config(config, Arc::new(ogcard::InMemoryContentStore::new()))?;
    let result = app.generate(content_type, &data, args.force);
    finish(&app, result)
}

fn cmd_clear_cache(config: &ogcard::ServiceConfig) -> anyhow::Result<ExitCode> {
    let cache = ogcard::output::from_config(config)?;
    let removed = cache.clear()?;
    eprintln!("removed {removed} artifacts from the {} cache", cache.name());
    Ok(ExitCode::SUCCESS)
}

fn cmd_fonts(config: &ogcard::ServiceConfig) -> anyhow::Result<ExitCode> {
    eprintln!("font diagnostics:");
    for (role, rel) in [("bold", &config.fonts.bold), ("medium", &config.fonts.medium)] {
        let path = config.assets_dir.join(rel);
        let bytes = std::fs::read(&path)
            .with_context(|| format!("read {role} font '{}'", path.display()))?;
        let sha = sha256_hex(&bytes);
        let font = ogcard::FontHandle::from_bytes(rel.clone(), bytes, 12.0)
            .with_context(|| format!("parse {role} font '{}'", path.display()))?;
        eprintln!("  {role}:");
        eprintln!("    font_source: {rel}");
        eprintln!("    family:      {}", font.family());
        eprintln!("    sha256:      {sha}");
    }
    Ok(ExitCode::SUCCESS)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
