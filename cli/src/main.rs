//! pdftrans CLI - layout-preserving PDF to Chinese DOCX translation

mod device;
mod engine;
mod interrupt;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdftrans::{
    detect_format_from_bytes, extract_document_bytes, BatchReport, Block, CancellationToken, Device, DocumentReport, FontAsset,
    Pipeline, PipelineOptions, ProgressObserver,
};

use engine::HttpTranslator;

#[derive(Parser)]
#[command(name = "pdftrans")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Translate English PDF documents into layout-preserving Chinese DOCX files", long_about = None)]
struct Cli {
    /// Verbose logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate one PDF file
    Translate {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output DOCX file (default: <stem>_translated.docx next to the input)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Translate every PDF in a directory
    Batch {
        /// Directory containing PDF files
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Directory for the outputs (default: next to each input)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Show the classified block structure without translating
    Inspect {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print blocks as JSON
        #[arg(long)]
        json: bool,

        /// Pipeline options file (classifier and extraction settings are used)
        #[arg(long, value_name = "FILE", env = "PDFTRANS_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

/// Options shared by the translating commands.
#[derive(Args)]
struct RunArgs {
    /// Translation engine endpoint
    #[arg(long, env = "PDFTRANS_ENGINE_URL", default_value = "http://127.0.0.1:8080/translate")]
    engine_url: String,

    /// CJK font file used for every output run
    #[arg(long, value_name = "FILE", env = "PDFTRANS_FONT")]
    font: PathBuf,

    /// Font family name written into the document (default: derived from the file)
    #[arg(long, env = "PDFTRANS_FONT_FAMILY")]
    font_family: Option<String>,

    /// Pipeline options file (JSON); flags below override it
    #[arg(long, value_name = "FILE", env = "PDFTRANS_CONFIG")]
    config: Option<PathBuf>,

    /// Engine device: auto, cpu or gpu
    #[arg(long, env = "PDFTRANS_DEVICE")]
    device: Option<Device>,

    /// Target-script ratio at or above which text is left untranslated
    #[arg(long, env = "PDFTRANS_THRESHOLD")]
    threshold: Option<f32>,

    /// Per-call engine timeout in milliseconds (0 disables it)
    #[arg(long, env = "PDFTRANS_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Worker threads (bounds concurrent engine calls)
    #[arg(long, env = "PDFTRANS_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Maximum translation output length
    #[arg(long, env = "PDFTRANS_MAX_LENGTH")]
    max_length: Option<u32>,

    /// Beam width
    #[arg(long, env = "PDFTRANS_NUM_BEAMS")]
    num_beams: Option<u32>,

    /// Sampling temperature
    #[arg(long, env = "PDFTRANS_TEMPERATURE")]
    temperature: Option<f32>,

    /// Emit a "Page N" heading at the start of every source page
    #[arg(long)]
    page_labels: bool,

    /// Embed repeated images every time they occur
    #[arg(long)]
    keep_duplicate_images: bool,

    /// Write the run report as JSON
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

impl RunArgs {
    fn options(&self) -> Result<PipelineOptions, Box<dyn std::error::Error>> {
        let mut options = match &self.config {
            Some(path) => PipelineOptions::from_json_file(path)?,
            None => PipelineOptions::default(),
        };

        if let Some(device) = self.device {
            options.generation.device = device;
        }
        options.generation.device = device::resolve(options.generation.device);
        if let Some(max_length) = self.max_length {
            options.generation = options.generation.with_max_length(max_length);
        }
        if let Some(num_beams) = self.num_beams {
            options.generation = options.generation.with_num_beams(num_beams);
        }
        if let Some(temperature) = self.temperature {
            options.generation = options.generation.with_temperature(temperature);
        }
        if let Some(threshold) = self.threshold {
            options.gate = options.gate.with_threshold(threshold);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            options.gate.call_timeout_ms = timeout_ms;
        }
        if let Some(concurrency) = self.concurrency {
            options = options.with_concurrency(concurrency);
        }
        if self.page_labels {
            options.compose = options.compose.with_page_labels(true);
        }
        if self.keep_duplicate_images {
            options.compose = options.compose.with_dedupe_images(false);
        }

        options.validate()?;
        Ok(options)
    }

    fn pipeline(&self, progress: Arc<dyn ProgressObserver>) -> Result<Pipeline, Box<dyn std::error::Error>> {
        let options = self.options()?;
        let font = FontAsset::load(&self.font, self.font_family.as_deref())?;
        let engine = HttpTranslator::new(&self.engine_url, options.gate.call_timeout())?;
        let cancel = CancellationToken::new();
        interrupt::cancel_on_interrupt(cancel.clone())?;
        Ok(Pipeline::new(Arc::new(engine), font, options)?
            .with_observer(progress)
            .with_cancellation(cancel))
    }
}

/// Page progress bar for the document being translated.
struct PageProgress {
    bar: ProgressBar,
}

impl PageProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} pages {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }
}

impl ProgressObserver for PageProgress {
    fn document_started(&self, input: Option<&Path>, pages: u32) {
        self.bar.reset();
        self.bar.set_length(u64::from(pages));
        if let Some(input) = input {
            self.bar.set_message(input.display().to_string());
        }
    }

    fn page_finished(&self, _page: u32) {
        self.bar.inc(1);
    }

    fn document_finished(&self, _report: &DocumentReport) {
        self.bar.finish_and_clear();
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Translate { input, output, run } => cmd_translate(&input, output.as_deref(), &run),
        Commands::Batch {
            dir,
            output_dir,
            run,
        } => cmd_batch(&dir, output_dir.as_deref(), &run),
        Commands::Inspect {
            input,
            json,
            config,
        } => cmd_inspect(&input, json, config.as_deref()),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn cmd_translate(input: &Path, output: Option<&Path>, run: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = run.pipeline(Arc::new(PageProgress::new()))?;
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| {
        pdftrans::pipeline::output_path_for(input, None, &pipeline.options().output_suffix)
    });

    let report = pipeline.translate_file(input, &output)?;
    print_document_summary(&report);

    if let Some(path) = &run.report {
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
        println!("{} {}", "Report saved to".green(), path.display());
    }
    Ok(())
}

fn cmd_batch(dir: &Path, output_dir: Option<&Path>, run: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(out) = output_dir {
        fs::create_dir_all(out)?;
    }
    let pipeline = run.pipeline(Arc::new(PageProgress::new()))?;
    let batch = pipeline.translate_dir(dir, output_dir)?;
    print_batch_summary(&batch);

    if let Some(path) = &run.report {
        fs::write(path, serde_json::to_string_pretty(&batch)?)?;
        println!("{} {}", "Report saved to".green(), path.display());
    }

    if batch.failed() > 0 {
        return Err(format!("{} of {} files failed", batch.failed(), batch.failed() + batch.succeeded()).into());
    }
    Ok(())
}

fn cmd_inspect(input: &Path, json: bool, config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let options = match config {
        Some(path) => PipelineOptions::from_json_file(path)?,
        None => PipelineOptions::default(),
    };
    let data = fs::read(input)?;
    let format = detect_format_from_bytes(&data)?;
    let doc = extract_document_bytes(&data, &options.extract, &options.classifier)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&doc.pages)?);
        return Ok(());
    }

    println!("{}", "Document Structure".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), format);
    println!("{}: {}", "Pages".bold(), doc.page_count());

    for page in &doc.pages {
        println!();
        println!(
            "{} {} ({:.0}x{:.0} pt, body {:.1} pt)",
            "Page".cyan().bold(),
            page.number,
            page.width,
            page.height,
            page.body_font_size
        );
        for (index, block) in page.blocks.iter().enumerate() {
            println!("  {} {:<9} {}", format!("{:>3}", index).dimmed(), block.kind(), describe(block));
        }
    }
    Ok(())
}

/// One-line description of a block for `inspect`.
fn describe(block: &Block) -> String {
    match block {
        Block::Paragraph(p) => preview(&p.text),
        Block::ListItem(item) => format!("[depth {}] {}", item.depth, preview(&item.body.text)),
        Block::Table(table) => format!("{} rows x {} columns", table.row_count(), table.column_count()),
        Block::Image(image) => format!(
            "{} {}x{} at ({:.0}, {:.0})",
            image.image.data.mime_type,
            image.image.data.width,
            image.image.data.height,
            image.image.bbox.x0,
            image.image.bbox.y0
        ),
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 60;
    if text.chars().count() > MAX {
        let head: String = text.chars().take(MAX).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn print_document_summary(report: &DocumentReport) {
    let stats = &report.stats;
    if let Some(output) = &report.output {
        println!("{} {}", "Saved to".green(), output.display());
    }
    println!(
        "  {} pages, {} paragraphs, {} list items, {} tables, {} images",
        stats.page_count, stats.paragraph_count, stats.list_item_count, stats.table_count, stats.image_count
    );
    println!(
        "  {} translated, {} passthrough, {} fallback, {} skipped",
        stats.translated_count, stats.passthrough_count, stats.fallback_count, stats.skipped_count
    );

    let warnings = report.warning_count();
    if warnings > 0 {
        println!("  {} {}", warnings.to_string().yellow().bold(), "warnings".yellow());
        for warning in report.warnings.iter().filter(|w| w.kind.is_failure()) {
            let block = warning.block.map(|b| format!(" block {}", b)).unwrap_or_default();
            println!("    {} page {}{}: {}", "-".dimmed(), warning.page, block, warning.message);
        }
    }
}

fn print_batch_summary(batch: &BatchReport) {
    for report in &batch.documents {
        print_document_summary(report);
    }
    for failure in &batch.failures {
        println!("{} {}: {}", "Failed".red().bold(), failure.input.display(), failure.error);
    }

    let totals = batch.totals();
    println!();
    println!(
        "{} {} succeeded, {} failed, {} pages, {} fallback blocks",
        "Done!".green().bold(),
        batch.succeeded(),
        batch.failed(),
        totals.page_count,
        totals.fallback_count
    );
    if batch.cancelled {
        println!("{}", "Batch was cancelled before all files were processed".yellow());
    }
}

fn cmd_version() {
    println!("{} {}", "pdftrans".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Layout-preserving PDF to Chinese DOCX translation");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/pdftrans".dimmed());
    println!("License: MIT");
}
