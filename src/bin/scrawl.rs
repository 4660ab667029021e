//! CLI binary for scrawl.
//!
//! A thin shim over the library crate that maps CLI flags to a `Preset`
//! and an `ExportConfig`, runs the export and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use scrawl::store::DEFAULT_PRESET_NAME;
use scrawl::{
    export_async, AppPaths, AssetCatalog, ChunkPolicy, ExportConfig, ExportFormat,
    ExportProgressCallback, ImportMode, PdfiumRenderer, Preset, PresetStore, ProgressCallback,
    Session, SettingsStore,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar over (chunk, format) tasks plus
/// one log line per written output.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-task wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<(usize, ExportFormat), Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner only until `on_export_start` reports the task count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Loading fonts…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} outputs  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Exporting");
        self.bar.reset_eta();
    }

    /// Tasks reported through `on_task_error` so far.
    fn failed(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }

    fn elapsed_secs(&self, chunk: usize, format: ExportFormat) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut times| times.remove(&(chunk, format)))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ExportProgressCallback for CliProgressCallback {
    fn on_export_start(&self, total_tasks: usize) {
        self.activate_bar(total_tasks);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Writing {total_tasks} output(s)…"))
        ));
    }

    fn on_chunk_render(&self, chunk: usize, total_chunks: usize) {
        self.bar
            .set_message(format!("rendering part {chunk}/{total_chunks}"));
    }

    fn on_task_start(&self, chunk: usize, format: ExportFormat) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert((chunk, format), Instant::now());
        }
        self.bar.set_message(format!("part {chunk} {format}"));
    }

    fn on_task_complete(&self, chunk: usize, format: ExportFormat, files: &[PathBuf]) {
        let secs = self.elapsed_secs(chunk, format);
        let target = match files {
            [one] => one.display().to_string(),
            many => format!("{} files", many.len()),
        };
        self.bar.println(format!(
            "  {} Part {:>2}  {:<5}  {}  {}",
            green("✓"),
            chunk,
            format,
            target,
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_task_error(&self, chunk: usize, format: ExportFormat, error: String) {
        let secs = self.elapsed_secs(chunk, format);
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error
        };

        self.bar.println(format!(
            "  {} Part {:>2}  {:<5}  {}  {}",
            red("✗"),
            chunk,
            format,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_export_complete(&self, total_tasks: usize, success_count: usize) {
        let failed = self.failed();
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} output(s) written",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} outputs written  ({} failed)",
                if failed == total_tasks {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_tasks,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render a text file to PDF in the current directory
  scrawl render letter.txt

  # Several inputs, several formats, custom output name
  scrawl render intro.docx body.pdf --format pdf --format png -o out --stem essay

  # Split a long document every 1000 characters
  scrawl render novel.txt --chunk-chars 1000 --format jpeg

  # Reproducible output with a stored preset and a bigger font
  scrawl render notes.txt --preset neat --font-size 48 --seed 7

  # Manage presets
  scrawl preset save neat --font-size 36 --perturb-theta-sigma 0.02
  scrawl preset list

  # Print the imported text without rendering
  scrawl extract report.pdf

DIRECTORIES (relative to --home):
  fonts/           TrueType fonts (*.ttf), selected by file stem
  backgrounds/     Paper images (*.png, *.jpg), selected by file stem
  presets.json     Named presets
  settings.json    Last used preset (written with --remember)

ENVIRONMENT VARIABLES:
  SCRAWL_HOME             Directory holding fonts/, backgrounds/ and JSON files
  SCRAWL_OUTPUT_DIR       Default output directory
  SCRAWL_FORMAT           Default export formats (comma separated)
  SCRAWL_DPI              PDF resolution (72–600)
  PDFIUM_LIB_PATH         Path to the pdfium shared library
  RUST_LOG                Override log filtering
"#;

/// Turn text into simulated handwriting.
#[derive(Parser, Debug)]
#[command(
    name = "scrawl",
    version,
    about = "Turn plain text into simulated handwritten pages",
    long_about = "Render TXT, DOCX and PDF text as handwriting using a TrueType font, \
Gaussian jitter on every glyph and a paper background, then export as PNG, JPEG, PDF or DOCX.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding fonts/, backgrounds/, presets.json and settings.json.
    #[arg(long, global = true, env = "SCRAWL_HOME", default_value = ".")]
    home: PathBuf,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "SCRAWL_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "SCRAWL_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render documents as handwriting and export them.
    Render(RenderArgs),
    /// Print the text that would be rendered.
    Extract(ExtractArgs),
    /// Manage stored presets.
    Preset {
        #[command(subcommand)]
        action: PresetAction,
    },
    /// List discovered fonts and backgrounds.
    Assets,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Input files (.txt, .docx, .pdf), joined in order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Export format; repeat or comma-separate for several.
    #[arg(short, long, env = "SCRAWL_FORMAT", value_enum, value_delimiter = ',',
          default_value = "pdf")]
    format: Vec<FormatArg>,

    /// Directory receiving the output files.
    #[arg(short, long, env = "SCRAWL_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Output file name without extension (default: handwriting_<timestamp>).
    #[arg(long)]
    stem: Option<String>,

    /// Split the text every N characters.
    #[arg(long, conflicts_with = "chunk_pages")]
    chunk_chars: Option<usize>,

    /// Split the rendered pages every N pages.
    #[arg(long)]
    chunk_pages: Option<usize>,

    /// PDF resolution (72–600).
    #[arg(long, env = "SCRAWL_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// JPEG quality (1–100).
    #[arg(long, env = "SCRAWL_JPEG_QUALITY", default_value_t = 90,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Write one PNG/JPEG per page instead of one tall image.
    #[arg(long)]
    split_pages: bool,

    /// Start from this stored preset instead of the last used settings.
    #[arg(long, env = "SCRAWL_PRESET")]
    preset: Option<String>,

    #[command(flatten)]
    overrides: PresetOverrides,

    /// Skip inputs that fail to load instead of aborting.
    #[arg(long)]
    lenient: bool,

    /// Save the effective preset to settings.json for the next run.
    #[arg(long)]
    remember: bool,

    /// Print the export report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "SCRAWL_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Input files (.txt, .docx, .pdf), joined in order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Skip inputs that fail to load instead of aborting.
    #[arg(long)]
    lenient: bool,
}

#[derive(Subcommand, Debug)]
enum PresetAction {
    /// List stored preset names.
    List,
    /// Print a preset as JSON.
    Show { name: String },
    /// Store a preset, starting from an existing one and applying overrides.
    Save {
        name: String,
        /// Preset to start from (default: the preset being saved, if stored).
        #[arg(long)]
        from: Option<String>,
        #[command(flatten)]
        overrides: PresetOverrides,
    },
    /// Remove a stored preset.
    Delete { name: String },
}

/// Per-parameter overrides applied on top of a preset.
#[derive(Args, Debug, Default)]
struct PresetOverrides {
    /// Font name (file stem in fonts/).
    #[arg(long)]
    font: Option<String>,
    #[arg(long)]
    font_size: Option<u32>,
    /// Background name (file stem in backgrounds/).
    #[arg(long)]
    background: Option<String>,
    #[arg(long)]
    margin_top: Option<u32>,
    #[arg(long)]
    margin_bottom: Option<u32>,
    #[arg(long)]
    margin_left: Option<u32>,
    #[arg(long)]
    margin_right: Option<u32>,
    #[arg(long)]
    word_spacing: Option<u32>,
    #[arg(long)]
    line_spacing: Option<u32>,
    #[arg(long)]
    word_spacing_sigma: Option<f64>,
    #[arg(long)]
    line_spacing_sigma: Option<f64>,
    #[arg(long)]
    font_size_sigma: Option<f64>,
    #[arg(long)]
    perturb_x_sigma: Option<f64>,
    #[arg(long)]
    perturb_y_sigma: Option<f64>,
    #[arg(long)]
    perturb_theta_sigma: Option<f64>,
    /// RNG seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
}

impl PresetOverrides {
    fn apply(&self, preset: &mut Preset) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
        set(&mut preset.font, &self.font);
        set(&mut preset.font_size, &self.font_size);
        if self.background.is_some() {
            preset.background = self.background.clone();
        }
        if self.seed.is_some() {
            preset.seed = self.seed;
        }

        let m = &mut preset.margins;
        set(&mut m.top, &self.margin_top);
        set(&mut m.bottom, &self.margin_bottom);
        set(&mut m.left, &self.margin_left);
        set(&mut m.right, &self.margin_right);
        set(&mut m.word_spacing, &self.word_spacing);
        set(&mut m.line_spacing, &self.line_spacing);

        let d = &mut preset.distortions;
        set(&mut d.word_spacing_sigma, &self.word_spacing_sigma);
        set(&mut d.line_spacing_sigma, &self.line_spacing_sigma);
        set(&mut d.font_size_sigma, &self.font_size_sigma);
        set(&mut d.perturb_x_sigma, &self.perturb_x_sigma);
        set(&mut d.perturb_y_sigma, &self.perturb_y_sigma);
        set(&mut d.perturb_theta_sigma, &self.perturb_theta_sigma);
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Pdf,
    Png,
    #[value(alias = "jpg")]
    Jpeg,
    Docx,
}

impl From<FormatArg> for ExportFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Pdf => ExportFormat::Pdf,
            FormatArg::Png => ExportFormat::Png,
            FormatArg::Jpeg => ExportFormat::Jpeg,
            FormatArg::Docx => ExportFormat::Docx,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = match &cli.command {
        Command::Render(args) => !cli.quiet && !args.no_progress && !args.json,
        _ => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let paths = AppPaths::rooted(&cli.home);

    match &cli.command {
        Command::Render(args) => run_render(&cli, args, &paths, show_progress).await,
        Command::Extract(args) => run_extract(args, &paths),
        Command::Preset { action } => run_preset(&cli, action, &paths),
        Command::Assets => run_assets(&paths),
    }
}

// ── render ───────────────────────────────────────────────────────────────────

async fn run_render(cli: &Cli, args: &RenderArgs, paths: &AppPaths, show_progress: bool) -> Result<()> {
    let mut session = Session::restore(paths);

    // Preset: stored by name, else last settings; then CLI overrides.
    let mut preset = match &args.preset {
        Some(name) => PresetStore::new(&paths.presets_file)
            .load(name)
            .with_context(|| format!("Failed to load preset '{name}'"))?,
        None => session.preset().clone(),
    };
    args.overrides.apply(&mut preset);
    if let Some(correction) = session.set_preset(preset).context("Invalid render parameters")? {
        notice(cli, &correction.to_string());
    }

    import_into(&mut session, &args.inputs, args.lenient, cli.quiet)?;

    let chunking = match (args.chunk_chars, args.chunk_pages) {
        (Some(n), _) => ChunkPolicy::MaxChars(n),
        (None, Some(n)) => ChunkPolicy::MaxPages(n),
        (None, None) => ChunkPolicy::None,
    };

    let mut builder = ExportConfig::builder()
        .formats(args.format.iter().copied().map(ExportFormat::from))
        .chunking(chunking)
        .dpi(args.dpi)
        .jpeg_quality(args.jpeg_quality)
        .output_dir(&args.output_dir)
        .split_raster_pages(args.split_pages);
    if let Some(ref stem) = args.stem {
        builder = builder.file_stem(stem);
    }
    if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        builder = builder.progress_callback(cb as ProgressCallback);
    }
    let config = builder.build().context("Invalid configuration")?;

    let job = session.export_job(config).context("Cannot start export")?;
    let report = export_async(job, Arc::new(PdfiumRenderer::new()))
        .await
        .context("Export failed")?;

    if args.remember {
        session
            .save_settings(&SettingsStore::new(&paths.settings_file))
            .context("Failed to save settings")?;
    }

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        for outcome in &report.outcomes {
            match &outcome.error {
                None => {
                    for file in &outcome.files {
                        println!("{}", file.display());
                    }
                }
                Some(e) if !show_progress => eprintln!("  {} {}", red("✗"), e),
                Some(_) => {}
            }
        }
        eprintln!(
            "   {} page(s) rendered in {}ms",
            dim(&report.stats.pages_rendered.to_string()),
            report.stats.total_duration_ms,
        );
    }

    if report.all_failed() {
        let first = report
            .errors()
            .next()
            .map(|e| e.to_string())
            .unwrap_or_default();
        anyhow::bail!("Every output failed. First error: {first}");
    }
    Ok(())
}

// ── extract ──────────────────────────────────────────────────────────────────

fn run_extract(args: &ExtractArgs, paths: &AppPaths) -> Result<()> {
    let mut session = Session::new(AssetCatalog::from_paths(paths));
    import_into(&mut session, &args.inputs, args.lenient, false)?;

    let text = session.document().text();
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

fn import_into(session: &mut Session, inputs: &[PathBuf], lenient: bool, quiet: bool) -> Result<()> {
    if lenient {
        let report = session.import_lenient(inputs, ImportMode::Replace);
        if !quiet {
            for skipped in &report.skipped {
                eprintln!("{} skipped {}: {}", yellow("⚠"), skipped.path.display(), skipped.reason);
            }
        }
        if !report.changed() {
            anyhow::bail!("None of the {} input file(s) could be loaded", inputs.len());
        }
    } else {
        session
            .import(inputs, ImportMode::Replace)
            .context("Failed to import input files")?;
    }
    Ok(())
}

// ── preset ───────────────────────────────────────────────────────────────────

fn run_preset(cli: &Cli, action: &PresetAction, paths: &AppPaths) -> Result<()> {
    let store = PresetStore::new(&paths.presets_file);
    match action {
        PresetAction::List => {
            let names = store.list().context("Failed to read presets")?;
            if !names.iter().any(|n| n == DEFAULT_PRESET_NAME) {
                println!("{}", dim(&format!("{DEFAULT_PRESET_NAME} (built-in)")));
            }
            for name in names {
                println!("{name}");
            }
        }
        PresetAction::Show { name } => {
            let preset = store
                .load(name)
                .with_context(|| format!("Failed to load preset '{name}'"))?;
            println!(
                "{}",
                serde_json::to_string_pretty(&preset).context("Failed to serialise preset")?
            );
        }
        PresetAction::Save {
            name,
            from,
            overrides,
        } => {
            let base_name = match from {
                Some(from) => from.as_str(),
                None if store.contains(name)? => name.as_str(),
                None => DEFAULT_PRESET_NAME,
            };
            let mut preset = store
                .load(base_name)
                .with_context(|| format!("Failed to load preset '{base_name}'"))?;
            overrides.apply(&mut preset);
            if let Some(correction) = store.save(name, &preset).context("Failed to save preset")? {
                notice(cli, &correction.to_string());
            }
            if !cli.quiet {
                eprintln!("{} saved preset '{}'", green("✔"), bold(name));
            }
        }
        PresetAction::Delete { name } => {
            if store.delete(name).context("Failed to delete preset")? {
                if !cli.quiet {
                    eprintln!("{} deleted preset '{}'", green("✔"), bold(name));
                }
            } else {
                anyhow::bail!("No preset named '{name}'");
            }
        }
    }
    Ok(())
}

// ── assets ───────────────────────────────────────────────────────────────────

fn run_assets(paths: &AppPaths) -> Result<()> {
    let catalog = AssetCatalog::from_paths(paths);

    println!("{} ({})", bold("Fonts"), catalog.fonts_dir().display());
    if catalog.fonts().is_empty() {
        println!("  {}", dim("none, add .ttf files"));
    }
    for font in catalog.fonts() {
        println!("  {:<24} {}", font.name, dim(&font.path.display().to_string()));
    }

    println!("{} ({})", bold("Backgrounds"), catalog.backgrounds_dir().display());
    if catalog.backgrounds().is_empty() {
        println!("  {}", dim("none, plain white pages are used"));
    }
    for bg in catalog.backgrounds() {
        println!("  {:<24} {}", bg.name, dim(&bg.path.display().to_string()));
    }
    Ok(())
}

fn notice(cli: &Cli, message: &str) {
    if !cli.quiet {
        eprintln!("{} {}", yellow("⚠"), message);
    }
}
