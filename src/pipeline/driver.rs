//! The pipeline driver: pages within a document, documents within a batch.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::classify::classify_page;
use crate::compose::{write_docx, ComposedDocument, Composer, FontAsset};
use crate::error::{Error, Result};
use crate::model::{Page, Span, TranslatedPage, TranslationOutcome};
use crate::parser::{Extractor, LopdfBackend, PageGeometry};
use crate::report::{BatchReport, DocumentReport, FileFailure, Warning, WarningKind};
use crate::translate::{translate_page, TranslationGate, Translator};

use super::{CancellationToken, NoProgress, PipelineOptions, ProgressObserver};

/// Geometry assumed for a page whose size cannot be read (US Letter).
const FALLBACK_WIDTH: f32 = 612.0;
const FALLBACK_HEIGHT: f32 = 792.0;

/// Extension of the temporary file an output is written to before it is
/// moved into place.
const PARTIAL_EXTENSION: &str = "part";

/// Spans of one page, or the reason the page could not be read.
struct RawPage {
    number: u32,
    geometry: Option<PageGeometry>,
    spans: std::result::Result<Vec<Span>, String>,
}

/// Translates PDF documents into DOCX files.
///
/// The engine, font and options are fixed at construction. One pipeline
/// can process any number of documents; it holds a worker pool sized by
/// [`PipelineOptions::concurrency`] that bounds concurrent engine calls.
pub struct Pipeline {
    gate: TranslationGate,
    font: FontAsset,
    options: PipelineOptions,
    pool: ThreadPool,
    cancel: CancellationToken,
    observer: Arc<dyn ProgressObserver>,
}

impl Pipeline {
    /// Create a pipeline.
    ///
    /// Fails with [`Error::Config`] if the options are invalid. The font
    /// must already be loaded, so a missing font is reported before any
    /// document is touched.
    pub fn new(engine: Arc<dyn Translator>, font: FontAsset, options: PipelineOptions) -> Result<Self> {
        options.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(options.concurrency)
            .thread_name(|i| format!("pdftrans-worker-{}", i))
            .build()
            .map_err(|e| Error::Config(format!("cannot start worker pool: {}", e)))?;
        let gate = TranslationGate::new(engine, options.generation.clone(), options.gate.clone())
            .with_engine_limit(options.concurrency);

        log::info!(
            "Pipeline ready: {} workers, engine {}, font {}",
            options.concurrency,
            gate.engine_name(),
            font.family
        );

        Ok(Self {
            gate,
            font,
            options,
            pool,
            cancel: CancellationToken::new(),
            observer: Arc::new(NoProgress),
        })
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn font(&self) -> &FontAsset {
        &self.font
    }

    /// Run extraction, classification, translation and composition on an
    /// in-memory PDF. Nothing is written.
    ///
    /// Unreadable pages come out empty with an `ExtractionFailed` warning.
    /// Errors are returned only for input that is not a readable PDF at
    /// all, or when the run is cancelled.
    pub fn process_bytes(&self, data: &[u8]) -> Result<(ComposedDocument, DocumentReport)> {
        self.process(data, None)
    }

    fn process(&self, data: &[u8], input: Option<&Path>) -> Result<(ComposedDocument, DocumentReport)> {
        let backend = LopdfBackend::load_bytes(data)?;
        let extractor = Extractor::new(&backend, self.options.extract.clone());
        let numbers = extractor.page_numbers();
        log::info!("{}: {} pages", backend.format(), numbers.len());
        self.observer.document_started(input, numbers.len() as u32);

        let mut raw_pages = Vec::with_capacity(numbers.len());
        for number in numbers {
            self.check_cancelled()?;
            raw_pages.push(read_page(&extractor, number));
        }

        let pages: Vec<Result<(TranslatedPage, Option<Warning>)>> = self.pool.install(|| {
            if self.options.parallel_pages {
                raw_pages
                    .into_par_iter()
                    .map(|raw| self.process_page(raw))
                    .collect()
            } else {
                raw_pages
                    .into_iter()
                    .map(|raw| self.process_page(raw))
                    .collect()
            }
        });

        let mut report = DocumentReport::new();
        let mut composer = Composer::new(&self.options.compose);
        for result in pages {
            let (page, failure) = result?;
            report.warnings.extend(failure);
            for (index, block) in page.blocks.iter().enumerate() {
                for text in block.translations() {
                    if let TranslationOutcome::Fallback { reason } = &text.outcome {
                        report.warn(Warning::new(
                            page.number,
                            Some(index),
                            WarningKind::TranslationFallback,
                            reason.clone(),
                        ));
                    }
                }
            }
            report.stats.add_page(&page);

            for warning in composer.compose_page(&page) {
                match warning.kind {
                    WarningKind::DuplicateImage => report.stats.add_duplicate_image(),
                    _ => report.stats.add_skipped(),
                }
                report.warn(warning);
            }
        }

        log::info!(
            "Composed {} pages: {} translated, {} passthrough, {} fallback, {} warnings",
            report.stats.page_count,
            report.stats.translated_count,
            report.stats.passthrough_count,
            report.stats.fallback_count,
            report.warning_count()
        );
        Ok((composer.finish(), report))
    }

    /// Translate an in-memory PDF and write the DOCX to `writer`.
    pub fn translate_bytes<W: Write + Seek>(&self, data: &[u8], writer: W) -> Result<DocumentReport> {
        let (doc, report) = self.process_bytes(data)?;
        write_docx(&doc, &self.font, writer)?;
        Ok(report)
    }

    /// Translate one file.
    ///
    /// The document is written to a temporary file next to `output` and
    /// renamed once complete, so a failed or cancelled run never leaves a
    /// truncated output behind.
    pub fn translate_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<DocumentReport> {
        let input = input.as_ref();
        let output = output.as_ref();
        log::info!("Translating {} -> {}", input.display(), output.display());

        let data = std::fs::read(input)?;
        let (doc, mut report) = self.process(&data, Some(input))?;
        self.check_cancelled()?;

        let partial = partial_path(output);
        let written = File::create(&partial)
            .map_err(Error::from)
            .and_then(|file| {
                let mut writer = BufWriter::new(file);
                write_docx(&doc, &self.font, &mut writer)?;
                writer.flush()?;
                Ok(())
            })
            .and_then(|()| std::fs::rename(&partial, output).map_err(Error::from));
        if let Err(e) = written {
            // Leftover partial output is useless; a failure to remove it changes nothing.
            let _ = std::fs::remove_file(&partial);
            return Err(Error::Write(format!("{}: {}", output.display(), e)));
        }

        report.input = Some(input.to_path_buf());
        report.output = Some(output.to_path_buf());
        self.observer.document_finished(&report);
        Ok(report)
    }

    /// Translate every PDF in `dir`, sorted by name.
    ///
    /// Outputs go next to their inputs, or into `output_dir` when given.
    /// A document that fails is recorded and the batch moves on; only
    /// cancellation stops it early.
    pub fn translate_dir<P: AsRef<Path>>(&self, dir: P, output_dir: Option<&Path>) -> Result<BatchReport> {
        let inputs = discover_pdfs(dir.as_ref())?;
        log::info!("Found {} PDF files in {}", inputs.len(), dir.as_ref().display());
        Ok(self.translate_files(&inputs, output_dir))
    }

    /// Translate a list of files, continuing past failures.
    pub fn translate_files(&self, inputs: &[PathBuf], output_dir: Option<&Path>) -> BatchReport {
        let mut batch = BatchReport::new();
        for input in inputs {
            if self.cancel.is_cancelled() {
                log::warn!("Batch cancelled before {}", input.display());
                batch.cancelled = true;
                break;
            }
            let output = output_path_for(input, output_dir, &self.options.output_suffix);
            match self.translate_file(input, &output) {
                Ok(report) => batch.documents.push(report),
                Err(Error::Cancelled) => {
                    batch.cancelled = true;
                    break;
                }
                Err(e) => {
                    log::warn!("Failed to translate {}: {}", input.display(), e);
                    batch.failures.push(FileFailure {
                        input: input.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        batch
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    /// Classify and translate one page.
    fn process_page(&self, raw: RawPage) -> Result<(TranslatedPage, Option<Warning>)> {
        self.check_cancelled()?;

        let (page, failure) = match (raw.geometry, raw.spans) {
            (Some(geometry), Ok(spans)) => {
                (classify_page(&geometry, spans, &self.options.classifier), None)
            }
            (geometry, spans) => {
                let message = spans.err().unwrap_or_else(|| "page size unreadable".to_string());
                log::warn!("Failed to extract page {}: {}", raw.number, message);
                let page = match geometry {
                    Some(g) => Page::new(raw.number, g.width, g.height),
                    None => Page::new(raw.number, FALLBACK_WIDTH, FALLBACK_HEIGHT),
                };
                let warning = Warning::new(raw.number, None, WarningKind::ExtractionFailed, message);
                (page, Some(warning))
            }
        };

        log::info!("Page {}: {} blocks", page.number, page.block_count());
        let translated = translate_page(page, &self.gate);
        self.observer.page_finished(raw.number);
        Ok((translated, failure))
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("gate", &self.gate)
            .field("font", &self.font)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn read_page(extractor: &Extractor<'_>, number: u32) -> RawPage {
    match extractor.spans(number) {
        Ok(iter) => {
            let geometry = *iter.geometry();
            RawPage {
                number,
                geometry: Some(geometry),
                spans: Ok(iter.collect()),
            }
        }
        Err(e) => RawPage {
            number,
            geometry: extractor.geometry(number).ok(),
            spans: Err(e.to_string()),
        },
    }
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(PARTIAL_EXTENSION);
    output.with_file_name(name)
}

/// Output path for `input`: `<stem><suffix>.docx` next to the input, or in
/// `output_dir`.
pub fn output_path_for(input: &Path, output_dir: Option<&Path>, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    let name = format!("{}{}.docx", stem, suffix);
    match output_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

/// Every `*.pdf` file (case-insensitive) directly inside `dir`, sorted by name.
pub fn discover_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    files.sort();
    Ok(files)
}
