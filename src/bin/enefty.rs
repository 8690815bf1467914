use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use enefty::{
    BulkGenerator, BulkOpts, BulkRequest, Canvas, CombinationSpace, CpuCompositor, DEFAULT_PREFIX,
    FixedFolder, FolderSink, LayerStack, StackHandle, Variant,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "enefty", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write one PNG per variant combination into a folder.
    Generate(GenerateArgs),
    /// Render the project's current selection as a single PNG.
    Export(ExportArgs),
    /// Print how many combinations a project yields.
    Count(CountArgs),
    /// Build a project from directories of images, one layer per directory.
    NewProject(NewProjectArgs),
}

#[derive(clap::Args, Debug, Clone, Copy)]
struct CanvasArgs {
    /// Output width in pixels.
    #[arg(long, default_value_t = 512)]
    width: u32,

    /// Output height in pixels.
    #[arg(long, default_value_t = 512)]
    height: u32,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Project file (.enefty).
    #[arg(long)]
    project: PathBuf,

    /// Destination folder.
    #[arg(long)]
    out: PathBuf,

    /// File name prefix.
    #[arg(long, default_value = DEFAULT_PREFIX)]
    prefix: String,

    #[command(flatten)]
    canvas: CanvasArgs,

    /// Pause between images, in milliseconds (at least 1).
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    delay_ms: u64,

    /// Give up on an image after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Project file (.enefty).
    #[arg(long)]
    project: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    canvas: CanvasArgs,
}

#[derive(Parser, Debug)]
struct CountArgs {
    /// Project file (.enefty).
    #[arg(long)]
    project: PathBuf,
}

#[derive(Parser, Debug)]
struct NewProjectArgs {
    /// Project file to write.
    #[arg(long)]
    out: PathBuf,

    /// Directory of images for one layer, bottom-most first. Repeatable.
    #[arg(long = "layer", required = true)]
    layers: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Generate(args) => cmd_generate(args).await,
        Command::Export(args) => cmd_export(args).await,
        Command::Count(args) => cmd_count(args),
        Command::NewProject(args) => cmd_new_project(args),
    }
}

fn canvas(args: CanvasArgs) -> anyhow::Result<Canvas> {
    Ok(Canvas::new(args.width, args.height)?)
}

fn open_project(path: &Path) -> anyhow::Result<StackHandle> {
    let stack = StackHandle::default();
    enefty::load_project(&stack, path)
        .with_context(|| format!("load project '{}'", path.display()))?;
    Ok(stack)
}

async fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let stack = open_project(&args.project)?;
    let opts = BulkOpts {
        canvas: canvas(args.canvas)?,
        step_delay: Duration::from_millis(args.delay_ms),
        step_timeout: args.timeout_ms.map(Duration::from_millis),
    };
    let mut generator =
        BulkGenerator::new(stack, CpuCompositor::default(), FolderSink::default(), opts);
    generator
        .choose_destination(&mut FixedFolder::new(args.out))
        .await;
    let request = BulkRequest {
        prefix: args.prefix,
        ..generator.inputs().clone()
    };
    let control = generator.start(request)?;

    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\ncancelling after the current image");
            control.cancel();
        }
    });

    let mut status = generator.subscribe();
    let progress = tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let s = *status.borrow_and_update();
            eprint!("\r{} ({:?})", s.progress, s.state);
            if s.state.is_terminal() {
                eprintln!();
                break;
            }
        }
    });

    let result = generator.run().await;
    interrupt.abort();
    drop(generator);
    let _ = progress.await;

    let outcome = result?;
    println!("{outcome}");
    Ok(())
}

async fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let stack = open_project(&args.project)?;
    let mut renderer = CpuCompositor::default();
    enefty::export_current(&stack, &mut renderer, canvas(args.canvas)?, &args.out).await?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_count(args: CountArgs) -> anyhow::Result<()> {
    let stack = enefty::load_project_file(&args.project)
        .with_context(|| format!("load project '{}'", args.project.display()))?;
    let counts: Vec<usize> = stack
        .participating()
        .into_iter()
        .map(|(_, n)| n)
        .collect();
    let total = if counts.is_empty() {
        0
    } else {
        CombinationSpace::new(counts)?.total()
    };
    println!("{total}");
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg" | "webp"))
}

fn cmd_new_project(args: NewProjectArgs) -> anyhow::Result<()> {
    let mut stack = LayerStack::new();
    for dir in &args.layers {
        let mut files = std::fs::read_dir(dir)
            .with_context(|| format!("read layer dir '{}'", dir.display()))?
            .map(|e| e.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("list layer dir '{}'", dir.display()))?;
        files.retain(|p| p.is_file() && is_image(p));
        files.sort();

        stack.add_layer();
        let index = stack.len() - 1;
        if let Some(name) = dir.file_name() {
            stack.rename_layer(index, &name.to_string_lossy())?;
        }
        for file in &files {
            let variant = Variant::from_path(file)
                .with_context(|| format!("load variant '{}'", file.display()))?;
            stack.add_variant(index, variant)?;
        }
    }

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create project dir '{}'", parent.display()))?;
    }
    let layers = stack.len();
    enefty::save_project(&StackHandle::new(stack), &args.out)?;
    eprintln!("wrote {} ({layers} layers)", args.out.display());
    Ok(())
}
