mod logger;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use pdf_convert::constants::{DEFAULT_ASSEMBLY_NAME, DEFAULT_MERGE_NAME};
use pdf_convert::{
    AssemblyOptions, ConvertError, IncomingFile, MimeFamily, RecompressOptions, SniffPolicy,
    SourceImage, WorkerPool, naming,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::logger::CliLogger;

#[derive(Parser)]
#[command(name = "pdft", about = "Convert between images and PDF documents", version)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Place images on pages, one image per page
    ImagesToPdf {
        /// Input images, in page order
        #[arg(required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Document name (written as {name}.pdf)
        #[arg(short, long, default_value = "")]
        name: String,

        /// JSON file with assembly options; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Page size
        #[arg(long, value_enum)]
        paper: Option<PaperArg>,

        /// Page orientation
        #[arg(long, value_enum)]
        orientation: Option<OrientationArg>,

        /// Margin in mm (5-30)
        #[arg(long)]
        margin: Option<f32>,

        /// Spacing in mm (0-20)
        #[arg(long)]
        spacing: Option<f32>,

        /// How images fill the page
        #[arg(long, value_enum)]
        fit: Option<FitArg>,
    },

    /// Render every page of a PDF to PNG
    #[cfg(feature = "pdfium")]
    PdfToImages {
        /// Input PDF file
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Pixels per PDF point
        #[arg(long)]
        scale: Option<f32>,

        /// JSON file with raster options
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Concatenate PDF files
    Merge {
        /// Input PDF files, in order
        #[arg(required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Document name (written as {name}.pdf)
        #[arg(short, long, default_value = "")]
        name: String,

        /// Also require the %PDF- header, not just the .pdf extension
        #[arg(long)]
        check_header: bool,
    },

    /// Recompress images as JPEG, downscaling large ones
    Compress {
        /// Input images
        #[arg(required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// JSON file with compression options; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// JPEG quality (0.1-1.0)
        #[arg(short, long)]
        quality: Option<f32>,

        /// Longest side in pixels (100-4096)
        #[arg(long)]
        max_dimension: Option<u32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PaperArg {
    A4,
    Letter,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrientationArg {
    Portrait,
    Landscape,
}

#[derive(Clone, Copy, ValueEnum)]
enum FitArg {
    Contain,
    Cover,
}

impl From<PaperArg> for pdf_convert::PaperSize {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::A4 => Self::A4,
            PaperArg::Letter => Self::Letter,
        }
    }
}

impl From<OrientationArg> for pdf_convert::Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Portrait => Self::Portrait,
            OrientationArg::Landscape => Self::Landscape,
        }
    }
}

impl From<FitArg> for pdf_convert::FitMode {
    fn from(arg: FitArg) -> Self {
        match arg {
            FitArg::Contain => Self::Contain,
            FitArg::Cover => Self::Cover,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = CliLogger::from_verbosity(cli.verbose).init() {
        eprintln!("Failed to install logger: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("{}", user_message(&e));
            ExitCode::FAILURE
        }
    }
}

/// What the user sees for a failed command; the full chain goes to the log
fn user_message(error: &anyhow::Error) -> String {
    match error.downcast_ref::<ConvertError>() {
        Some(convert_error) => convert_error.category().to_string(),
        None => error.to_string(),
    }
}

async fn run(command: Commands) -> Result<()> {
    let pool = WorkerPool::default();

    match command {
        Commands::ImagesToPdf {
            input,
            output_dir,
            name,
            config,
            paper,
            orientation,
            margin,
            spacing,
            fit,
        } => {
            let mut options = match config {
                Some(path) => AssemblyOptions::load(&path)
                    .await
                    .with_context(|| format!("Failed to load {}", path.display()))?,
                None => AssemblyOptions::default(),
            };
            if let Some(paper) = paper {
                options.page_size = paper.into();
            }
            if let Some(orientation) = orientation {
                options.orientation = orientation.into();
            }
            if let Some(margin) = margin {
                options.margin_mm = margin;
            }
            if let Some(spacing) = spacing {
                options.spacing_mm = spacing;
            }
            if let Some(fit) = fit {
                options.fit_mode = fit.into();
            }
            let geometry = options.geometry()?;

            let images = read_images(&input).await?;
            let document =
                pdf_convert::assemble(&pool, &images, geometry, options.fit_mode).await?;

            let title = naming::document_identifier(&name, DEFAULT_ASSEMBLY_NAME);
            let bytes = document.write_pdf(&pool, Some(&title)).await?;
            let output = output_dir.join(naming::assembly_file_name(&name));
            tokio::fs::write(&output, bytes).await?;
            println!(
                "Assembled {} page(s) → {}",
                document.page_count(),
                output.display()
            );
        }

        #[cfg(feature = "pdfium")]
        Commands::PdfToImages {
            input,
            output_dir,
            scale,
            config,
        } => {
            let mut options = match config {
                Some(path) => pdf_convert::RasterOptions::load(&path)
                    .await
                    .with_context(|| format!("Failed to load {}", path.display()))?,
                None => pdf_convert::RasterOptions::default(),
            };
            if let Some(scale) = scale {
                options.render_scale = scale;
            }
            options.validate()?;

            let files = read_files(
                std::slice::from_ref(&input),
                MimeFamily::Pdf,
                SniffPolicy::MagicBytes,
            )
            .await?;
            let Some(file) = files.into_iter().next() else {
                bail!("{} is not a PDF file", input.display());
            };

            let bytes = file.bytes;
            let pages =
                tokio::task::spawn_blocking(move || pdf_convert::raster::load_pdf_pages(bytes))
                    .await??;
            let total = pages.len();

            let mut rx = pdf_convert::rasterize_pages(&pool, pages, options.render_scale)?;
            let mut written = 0;
            let mut failed = 0;
            while let Some(item) = rx.recv().await {
                match item.result {
                    Ok(image) => {
                        let path = output_dir.join(naming::page_file_name(item.page_index));
                        tokio::task::spawn_blocking(move || {
                            image.save_with_format(&path, image::ImageFormat::Png)
                        })
                        .await??;
                        written += 1;
                    }
                    Err(e) => {
                        eprintln!("Page {}: {}", item.page_index + 1, e);
                        failed += 1;
                    }
                }
            }
            println!(
                "Rendered {} of {} page(s) → {}",
                written,
                total,
                output_dir.display()
            );
            if failed > 0 {
                bail!("{} page(s) failed to render", failed);
            }
        }

        Commands::Merge {
            input,
            output_dir,
            name,
            check_header,
        } => {
            let policy = if check_header {
                SniffPolicy::MagicBytes
            } else {
                SniffPolicy::DeclaredType
            };
            let files = read_files(&input, MimeFamily::Pdf, policy).await?;
            let sources = files.into_iter().map(|f| f.bytes).collect();

            let mut merged = pdf_convert::merge(&pool, sources).await?;
            let title = naming::document_identifier(&name, DEFAULT_MERGE_NAME);
            merged.set_title(&title);
            let page_count = merged.page_count();

            let output = output_dir.join(naming::merge_file_name(&name));
            pdf_convert::save_pdf(merged.into_document(), &output).await?;
            println!("Merged {} page(s) → {}", page_count, output.display());
        }

        Commands::Compress {
            input,
            output_dir,
            config,
            quality,
            max_dimension,
        } => {
            let mut options = match config {
                Some(path) => RecompressOptions::load(&path)
                    .await
                    .with_context(|| format!("Failed to load {}", path.display()))?,
                None => RecompressOptions::default(),
            };
            if let Some(quality) = quality {
                options.quality = quality;
            }
            if let Some(max_dimension) = max_dimension {
                options.max_dimension_px = max_dimension;
            }

            let images = read_images(&input).await?;
            let outcome = pdf_convert::recompress_batch(&pool, &images, &options).await?;

            for result in &outcome.succeeded {
                let path = output_dir.join(result.image.name());
                tokio::fs::write(&path, result.image.bytes()).await?;
                println!(
                    "{}: {} → {} bytes ({:.1}%)",
                    path.display(),
                    result.original_bytes,
                    result.compressed_bytes,
                    result.reduction_percent()
                );
            }
            for failed in &outcome.failed {
                eprintln!("{}: {}", failed.name, failed.error.category());
            }
            println!(
                "Compressed {} image(s), {:.1}% smaller overall",
                outcome.succeeded.len(),
                outcome.total_reduction_percent()
            );
        }
    }

    Ok(())
}

/// Read `paths` and keep those of `family`
async fn read_files(
    paths: &[PathBuf],
    family: MimeFamily,
    policy: SniffPolicy,
) -> Result<Vec<IncomingFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(read_file(path).await?);
    }

    let ingested = pdf_convert::ingest(files, family, policy);
    if ingested.skipped > 0 {
        println!("Skipped {} file(s) of the wrong type", ingested.skipped);
    }
    Ok(ingested.accepted)
}

async fn read_file(path: &Path) -> Result<IncomingFile> {
    pdf_convert::read_incoming(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn read_images(paths: &[PathBuf]) -> Result<Vec<Arc<SourceImage>>> {
    let files = read_files(paths, MimeFamily::Image, SniffPolicy::default()).await?;
    Ok(files
        .into_iter()
        .map(|f| Arc::new(f.into_source_image()))
        .collect())
}
