use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vitae_core::{render_preview, Palette};

use vitae_studio::config::Config;
use vitae_studio::export::{
    generate_pdf_filename_today, write_local_print_page, DirectorySink, ExportConfig,
    ExportOptions, ExportOrchestrator, ExportRequest, PdfAssembler, PrintView, SkiaRasterizer,
    TrailingPage,
};
use vitae_studio::shell::{ConsoleNotifier, SystemNavigator};
use vitae_studio::source::{ApiSource, ChainSource, LocalCache, ResumeSource};
use vitae_studio::{Document, Placement, Theme};

/// CSS width of an A4 page at 96 dpi; the preview is laid out at this width.
const PREVIEW_WIDTH_PX: f32 = 794.0;

#[derive(Parser)]
#[command(name = "studio")]
#[command(version)]
#[command(about = "Export Vitae resumes to PDF", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a resume to a paginated A4 PDF
    Export {
        /// Resume id
        id: String,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Output filename (derived from the resume name if not specified)
        #[arg(short, long)]
        filename: Option<String>,

        /// Device pixels per CSS pixel
        #[arg(long)]
        scale: Option<f32>,

        /// Nominal image quality in (0, 1]
        #[arg(long)]
        quality: Option<f32>,

        /// Drop the blank page emitted when content ends exactly on a page boundary
        #[arg(long)]
        trim_trailing_page: bool,

        /// UI theme the preview is mounted under
        #[arg(long, value_enum, default_value = "light")]
        theme: ThemeArg,
    },

    /// Print a resume's preview as HTML
    Preview {
        /// Resume id
        id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{lib}={level},{bin}={level}",
                lib = env!("CARGO_PKG_NAME").replace('-', "_"),
                bin = env!("CARGO_CRATE_NAME"),
                level = &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let source = ChainSource::new(vec![
        Box::new(ApiSource::new(config.api_url.clone(), config.api_token.clone())?),
        Box::new(LocalCache::new(config.cache_path.clone())),
    ]);

    match cli.command {
        Commands::Export {
            id,
            out,
            filename,
            scale,
            quality,
            trim_trailing_page,
            theme,
        } => {
            let resolved = source
                .resolve(&id)
                .await?
                .with_context(|| format!("Resume {id} not found in the API or the local cache"))?;
            let resume = resolved.resume;

            // The server cannot print what it has never seen.
            let print_view = if resolved.serves_print_view {
                PrintView::Server
            } else {
                let page = write_local_print_page(&config.print_dir, &resume, config.print_settle)
                    .await
                    .with_context(|| {
                        format!("Failed to write print view to {}", config.print_dir.display())
                    })?;
                info!(
                    "Resume {id} is only in the {}, print view at {}",
                    resolved.origin,
                    page.display()
                );
                PrintView::Local(page)
            };

            let document = Document::new(theme.into(), PREVIEW_WIDTH_PX).into_shared();
            let preview = render_preview(&resume, &Palette::light());
            let source_node = vitae_studio::document::lock(&document).mount(preview, Placement::InFlow);

            let trailing_page = if trim_trailing_page || config.trim_trailing_page {
                TrailingPage::Trim
            } else {
                TrailingPage::Preserve
            };
            let mut assembler = PdfAssembler::new();
            if let Some(name) = resume.display_name() {
                assembler = assembler.with_title(name);
            }
            let orchestrator = ExportOrchestrator::new(
                document,
                Arc::new(SkiaRasterizer),
                Arc::new(DirectorySink::new(out.unwrap_or(config.output_dir.clone()))),
                Arc::new(ConsoleNotifier),
                Arc::new(SystemNavigator::new()),
                ExportConfig {
                    settle: config.export_settle,
                    trailing_page,
                    print_base_url: config.api_url.clone(),
                    ..ExportConfig::default()
                },
            )
            .with_assembler(assembler);

            let request = ExportRequest {
                source: source_node,
                resume_id: resume.id().to_string(),
                print_view,
                options: ExportOptions {
                    filename: filename
                        .unwrap_or_else(|| generate_pdf_filename_today(resume.display_name(), None)),
                    scale: scale.unwrap_or(config.export_scale),
                    quality: quality.unwrap_or(config.export_quality),
                },
            };
            let outcome = orchestrator.export(request).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if !outcome.success {
                bail!(
                    "Export failed: {}",
                    outcome.error.unwrap_or_else(|| "unknown error".to_string())
                );
            }
            info!("Done");
        }

        Commands::Preview { id } => {
            let resume = source
                .load(&id)
                .await?
                .with_context(|| format!("Resume {id} not found in the API or the local cache"))?;
            println!("{}", render_preview(&resume, &Palette::light()).to_html());
        }
    }

    Ok(())
}
