//! runner-tools CLI
//!
//! Command-line interface for packing textures, exporting worlds and
//! inspecting the containers the runner engine loads.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

use runner_export::{ExportConfig, TextureConverter, WorldExporter};
use runner_format::logging::{self, TracingConfig};
use runner_format::{Parser as _, TextureFile, TextureParser, World, WorldParser, TEXTURE_MAGIC, WORLD_MAGIC};

/// Asset export tools for the runner engine
#[derive(Parser)]
#[command(name = "runner-tools")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Export settings (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack images into ETC1 `.texture` containers
    Texture(TextureArgs),

    /// Export a JSON scene document to a `.runner` world
    World(WorldArgs),

    /// Show the contents of a `.texture` or `.runner` file
    Info(InfoArgs),
}

#[derive(Args)]
struct TextureArgs {
    /// Source images; each produces a sibling `.texture`
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// ETC1 encoder program (overrides the config file)
    #[arg(long)]
    encoder: Option<PathBuf>,
}

#[derive(Args)]
struct WorldArgs {
    /// Scene document
    input: PathBuf,

    /// Output path (default: <input>.runner)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output path given after `--`
    #[arg(last = true, conflicts_with = "output")]
    trailing_output: Option<PathBuf>,
}

#[derive(Args)]
struct InfoArgs {
    /// Container file
    path: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_with_config(TracingConfig::from_verbosity(cli.verbose));

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Texture(args) => cmd_texture(args, config),
        Commands::World(args) => cmd_world(args, config),
        Commands::Info(args) => cmd_info(&args),
    }
}

fn load_config(path: Option<&Path>) -> Result<ExportConfig> {
    let Some(path) = path else {
        return Ok(ExportConfig::default());
    };
    info!("Loading config: {:?}", path);
    ExportConfig::from_yaml_file(path).with_context(|| format!("Failed to load config {}", path.display()))
}

fn cmd_texture(args: TextureArgs, mut config: ExportConfig) -> Result<()> {
    if let Some(encoder) = args.encoder {
        config.encoder = encoder.to_string_lossy().into_owned();
    }
    config.validate().context("Invalid export settings")?;

    let converter = TextureConverter::from_config(&config);
    debug!(encoder = %config.encoder, "Using encoder");

    for file in &args.files {
        let output = logging::instrument("convert texture", || converter.convert_file(file))
            .with_context(|| format!("Failed to convert {}", file.display()))?;
        println!("{} -> {}", file.display(), output.display());
    }
    Ok(())
}

fn cmd_world(args: WorldArgs, config: ExportConfig) -> Result<()> {
    config.validate().context("Invalid export settings")?;

    let output = args.output.or(args.trailing_output);
    let exporter = WorldExporter::new(config);
    let written = logging::instrument("export world", || exporter.export_file(&args.input, output.as_deref()))
        .with_context(|| format!("Failed to export {}", args.input.display()))?;

    println!("{} -> {}", args.input.display(), written.display());
    Ok(())
}

fn cmd_info(args: &InfoArgs) -> Result<()> {
    let path = &args.path;
    if !path.exists() {
        bail!("File not found: {:?}", path);
    }

    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if bytes.starts_with(&TEXTURE_MAGIC) {
        let texture = TextureParser::new()
            .parse_bytes(&bytes)
            .context("Failed to parse texture")?;
        match args.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&texture)?),
            OutputFormat::Text => print_texture(path, bytes.len(), &texture),
        }
    } else if bytes.starts_with(&WORLD_MAGIC) {
        let world = WorldParser::strict()
            .parse_bytes(&bytes)
            .context("Failed to parse world")?;
        match args.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&world)?),
            OutputFormat::Text => print_world(path, bytes.len(), &world),
        }
    } else {
        bail!("Not a runner container: {}", path.display());
    }
    Ok(())
}

fn print_texture(path: &Path, size: usize, texture: &TextureFile) {
    println!("Texture: {}", path.display());
    println!("  File size:       {}", format_size(size as u64));
    println!("  Flags:           {:#x}", texture.flags);
    println!("  Bytes per pixel: {}", texture.bytes_per_pixel);
    println!("  Mipmaps:         {}", texture.mipmaps.len());
    for (level, mip) in texture.mipmaps.iter().enumerate() {
        println!(
            "    {:>2}. {:>5}x{:<5} {}",
            level,
            mip.width,
            mip.height,
            format_size(mip.data.len() as u64)
        );
    }
}

fn print_world(path: &Path, size: usize, world: &World) {
    println!("World: {} ({})", world.name, path.display());
    println!("  File size: {}", format_size(size as u64));
    println!("  Cameras:   {}", world.cameras.len());
    println!("  Materials: {}", world.materials.len());
    println!("  Textures:  {}", world.textures.len());
    println!("  Meshes:    {}", world.meshes.len());
    for mesh in &world.meshes {
        println!(
            "    {} ({} vertices, {} UV maps, {} submeshes)",
            mesh.name,
            mesh.vertices.len(),
            mesh.uv_maps.len(),
            mesh.submeshes.len()
        );
    }
    println!("  Lamps:     {}", world.lamps.len());
    println!("  Scenes:    {}", world.scenes.len());
    for scene in &world.scenes {
        println!("    {} (camera '{}', {} nodes)", scene.name, scene.camera, scene.nodes.len());
        for (index, node) in scene.nodes.iter().enumerate() {
            println!("      {:>3}. {:<24} {:?} parent {}", index, node.name, node.kind, node.parent_index);
        }
    }
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
