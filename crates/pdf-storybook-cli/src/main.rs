use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use pdf_storybook::{
    BookletContent, CancelFlag, DetectorKind, DuplexFlip, PipelineConfig, RasterBackend,
    RasterOptions, SheetLayout,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sbk", about = "Storybook PDF tools", version)]
struct Cli {
    /// Pipeline configuration (JSON); flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print statistics as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-render every page as a recompressed image
    Compress {
        /// Input PDF file
        #[arg(short, long)]
        input: PathBuf,

        /// Output PDF file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        raster: RasterArgs,
    },

    /// Split spreads into one page per image or text block
    Split {
        /// Input PDF file
        #[arg(short, long)]
        input: PathBuf,

        /// Output PDF file
        #[arg(short, long)]
        output: PathBuf,

        /// Region detection strategy
        #[arg(long, value_enum)]
        detector: Option<DetectorArg>,

        /// Keep both halves of the cover (half-spread detection)
        #[arg(long)]
        full_cover: bool,

        /// Output paper size
        #[arg(long, value_enum)]
        paper: Option<PaperArg>,

        /// Output orientation
        #[arg(long, value_enum)]
        orientation: Option<OrientationArg>,

        /// Scaling mode
        #[arg(long, value_enum)]
        scaling: Option<ScalingArg>,

        #[command(flatten)]
        raster: RasterArgs,
    },

    /// Impose pages as a saddle-stitch booklet
    Booklet {
        /// Input PDF file
        #[arg(short, long)]
        input: PathBuf,

        /// Output PDF file
        #[arg(short, long)]
        output: PathBuf,

        /// Output paper size
        #[arg(long, value_enum)]
        paper: Option<PaperArg>,

        /// Output orientation
        #[arg(long, value_enum)]
        orientation: Option<OrientationArg>,

        /// Edge the printer flips the sheet on [default: long-edge]
        ///
        /// Set the printer to "flip on long edge" for the default output.
        #[arg(long, value_enum)]
        duplex: Option<DuplexArg>,

        /// How slots are filled
        #[arg(long, value_enum)]
        content: Option<ContentArg>,

        /// Scaling mode
        #[arg(long, value_enum)]
        scaling: Option<ScalingArg>,

        /// Split spreads before imposing
        #[arg(long)]
        split_spreads: bool,

        #[command(flatten)]
        raster: RasterArgs,
    },

    /// Show the booklet page order for a page count without touching a PDF
    Plan {
        /// Number of source pages
        #[arg(short, long)]
        pages: usize,

        /// Edge the printer flips the sheet on
        #[arg(long, default_value = "long-edge", value_enum)]
        duplex: DuplexArg,
    },
}

#[derive(Args)]
struct RasterArgs {
    /// JPEG quality (1-100)
    #[arg(long)]
    quality: Option<u8>,

    /// Longest image side in pixels
    #[arg(long)]
    max_dimension: Option<u32>,

    /// Render scale in pixels per point
    #[arg(long)]
    scale: Option<f32>,

    /// Rendering backend
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,
}

impl RasterArgs {
    fn apply(&self, options: &mut RasterOptions) {
        if let Some(quality) = self.quality {
            options.quality = quality;
        }
        if let Some(max_dimension) = self.max_dimension {
            options.max_dimension = max_dimension;
        }
        if let Some(scale) = self.scale {
            options.render_scale = scale;
        }
        if let Some(backend) = self.backend {
            options.backend = backend.into();
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DetectorArg {
    LargestImage,
    HalfSpread,
}

#[derive(Clone, Copy, ValueEnum)]
enum PaperArg {
    A3,
    A4,
    A5,
    Letter,
    Legal,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrientationArg {
    Portrait,
    Landscape,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScalingArg {
    Fit,
    Fill,
    Stretch,
}

#[derive(Clone, Copy, ValueEnum)]
enum DuplexArg {
    ShortEdge,
    LongEdge,
}

#[derive(Clone, Copy, ValueEnum)]
enum ContentArg {
    Raster,
    Passthrough,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Builtin,
    Pdfium,
}

impl From<DetectorArg> for DetectorKind {
    fn from(arg: DetectorArg) -> Self {
        match arg {
            DetectorArg::LargestImage => Self::LargestImage,
            DetectorArg::HalfSpread => Self::HalfSpread,
        }
    }
}

impl From<PaperArg> for pdf_storybook::PaperSize {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::A3 => Self::A3,
            PaperArg::A4 => Self::A4,
            PaperArg::A5 => Self::A5,
            PaperArg::Letter => Self::Letter,
            PaperArg::Legal => Self::Legal,
        }
    }
}

impl From<OrientationArg> for pdf_storybook::Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Portrait => Self::Portrait,
            OrientationArg::Landscape => Self::Landscape,
        }
    }
}

impl From<ScalingArg> for pdf_storybook::ScalingMode {
    fn from(arg: ScalingArg) -> Self {
        match arg {
            ScalingArg::Fit => Self::Fit,
            ScalingArg::Fill => Self::Fill,
            ScalingArg::Stretch => Self::Stretch,
        }
    }
}

impl From<DuplexArg> for DuplexFlip {
    fn from(arg: DuplexArg) -> Self {
        match arg {
            DuplexArg::ShortEdge => Self::ShortEdge,
            DuplexArg::LongEdge => Self::LongEdge,
        }
    }
}

impl From<ContentArg> for BookletContent {
    fn from(arg: ContentArg) -> Self {
        match arg {
            ContentArg::Raster => Self::Raster,
            ContentArg::Passthrough => Self::Passthrough,
        }
    }
}

impl From<BackendArg> for RasterBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Builtin => Self::Builtin,
            BackendArg::Pdfium => Self::Pdfium,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path).await?,
        None => PipelineConfig::default(),
    };

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupted, cancelling");
                cancel.cancel();
            }
        });
    }

    match cli.command {
        Commands::Compress {
            input,
            output,
            raster,
        } => {
            let mut options = config.compress;
            raster.apply(&mut options.raster);

            let bytes = pdf_storybook::read_pdf(&input).await?;
            let result = pdf_storybook::compress(bytes, options, cancel).await?;
            pdf_storybook::write_pdf(&output, &result.pdf).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result.stats)?);
            } else {
                println!("Compression Statistics:");
                println!("  Pages: {}", result.stats.pages);
                println!("  Original size: {} bytes", result.stats.original_size);
                println!("  Compressed size: {} bytes", result.stats.compressed_size);
                println!("  Reduction: {}%", result.stats.reduction_percent);
                println!("Compressed → {}", output.display());
            }
        }

        Commands::Split {
            input,
            output,
            detector,
            full_cover,
            paper,
            orientation,
            scaling,
            raster,
        } => {
            let options = &mut config.split;
            raster.apply(&mut options.raster);
            if let Some(detector) = detector {
                options.detector = detector.into();
            }
            if full_cover {
                options.cover_right_half_only = false;
            }
            if let Some(paper) = paper {
                options.paper = paper.into();
            }
            if let Some(orientation) = orientation {
                options.orientation = orientation.into();
            }
            if let Some(scaling) = scaling {
                options.scaling = scaling.into();
            }

            let bytes = pdf_storybook::read_pdf(&input).await?;
            let result = pdf_storybook::split(bytes, config.split, cancel).await?;
            pdf_storybook::write_pdf(&output, &result.pdf).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result.stats)?);
            } else {
                println!("Split Statistics:");
                println!("  Original pages: {}", result.stats.original_pages);
                println!("  Output pages: {}", result.stats.output_pages);
                if !result.stats.skipped_pages.is_empty() {
                    let skipped: Vec<String> = result
                        .stats
                        .skipped_pages
                        .iter()
                        .map(|i| (i + 1).to_string())
                        .collect();
                    println!("  Skipped pages: {}", skipped.join(", "));
                }
                println!("  Reduction: {}%", result.stats.reduction_percent);
                println!("Split → {}", output.display());
            }
        }

        Commands::Booklet {
            input,
            output,
            paper,
            orientation,
            duplex,
            content,
            scaling,
            split_spreads,
            raster,
        } => {
            let options = &mut config.booklet;
            raster.apply(&mut options.raster);
            raster.apply(&mut options.split.raster);
            if let Some(paper) = paper {
                options.paper = paper.into();
            }
            if let Some(orientation) = orientation {
                options.orientation = orientation.into();
            }
            if let Some(duplex) = duplex {
                options.duplex = duplex.into();
            }
            if let Some(content) = content {
                options.content = content.into();
            }
            if let Some(scaling) = scaling {
                options.scaling = scaling.into();
            }
            if split_spreads {
                options.split_spreads = true;
            }

            let bytes = pdf_storybook::read_pdf(&input).await?;
            let result = pdf_storybook::booklet(bytes, config.booklet, cancel).await?;
            pdf_storybook::write_pdf(&output, &result.pdf).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result.stats)?);
            } else {
                println!("Booklet Statistics:");
                println!("  Source pages: {}", result.stats.original_pages);
                println!("  Sheets: {}", result.stats.sheets);
                println!("  Output pages: {}", result.stats.booklet_pages);
                println!("  Blank pages added: {}", result.stats.blank_pages_added);
                println!("  Reduction: {}%", result.stats.reduction_percent);
                println!("Booklet → {}", output.display());
            }
        }

        Commands::Plan { pages, duplex } => {
            let layout = SheetLayout::SaddleStitch4Up;
            let stats = pdf_storybook::booklet_statistics(pages, layout)?;
            let placements = pdf_storybook::plan(pages, layout, duplex.into())?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "stats": stats,
                        "placements": placements,
                    }))?
                );
                return Ok(());
            }

            println!("Booklet Plan:");
            println!("  Source pages: {}", stats.source_pages);
            println!("  Padded pages: {}", stats.padded_pages);
            println!("  Sheets: {}", stats.sheets);
            println!("  Output pages: {}", stats.output_faces);
            println!("  Blank pages added: {}", stats.blank_pages_added);
            println!();
            for placement in &placements {
                let page = placement
                    .source_page
                    .map(|i| (i + 1).to_string())
                    .unwrap_or_else(|| "blank".to_string());
                println!(
                    "  sheet {:>3} {:<5} {:<5} {:>5} {:>3}°",
                    placement.sheet_index + 1,
                    format!("{:?}", placement.side),
                    format!("{:?}", placement.slot),
                    page,
                    placement.rotation.degrees()
                );
            }
        }
    }

    Ok(())
}
