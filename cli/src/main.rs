//! pdfratio CLI - text-to-image area analysis for PDF files

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};

use pdfratio::render::{self, JsonFormat};
use pdfratio::{Document, JobId, JobQueue, JobStatus, QueueOptions, ReportColor, TreeBackend};

#[derive(Parser)]
#[command(name = "pdfratio")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Measure how much of a PDF is text and how much is images", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the HTML area report
    Analyze {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Wrap the report in a complete HTML page
        #[arg(long)]
        standalone: bool,

        /// Input is a JSON extraction dump instead of a PDF
        #[arg(long)]
        dump: bool,
    },

    /// Write the area summary as JSON
    Json {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Input is a JSON extraction dump instead of a PDF
        #[arg(long)]
        dump: bool,
    },

    /// Print a per-page ratio table
    Summary {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Input is a JSON extraction dump instead of a PDF
        #[arg(long)]
        dump: bool,
    },

    /// Analyze many files in the background
    Batch {
        /// Input PDF files
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for the HTML reports
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Worker threads
        #[arg(short, long, env = "PDFRATIO_WORKERS")]
        workers: Option<usize>,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            input,
            output,
            standalone,
            dump,
        } => cmd_analyze(&input, output.as_deref(), standalone, dump),
        Commands::Json {
            input,
            output,
            compact,
            dump,
        } => cmd_json(&input, output.as_deref(), compact, dump),
        Commands::Summary { input, dump } => cmd_summary(&input, dump),
        Commands::Batch {
            inputs,
            output,
            workers,
        } => cmd_batch(&inputs, output.as_deref(), workers),
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

fn open_document(input: &Path, dump: bool) -> pdfratio::Result<Document> {
    if dump {
        Document::from_backend(Box::new(TreeBackend::from_path(input)?))
    } else {
        Document::open(input)
    }
}

fn write_or_print(output: Option<&Path>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_analyze(
    input: &Path,
    output: Option<&Path>,
    standalone: bool,
    dump: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = open_document(input, dump)?;
    let mut report = doc.render_full_report();
    doc.close();

    if standalone {
        report = render::standalone(&report, doc.name());
    }
    write_or_print(output, &report)
}

fn cmd_json(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    dump: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = open_document(input, dump)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = render::to_json(&doc, format);
    doc.close();
    write_or_print(output, &json?)
}

fn paint(text: String, color: ReportColor) -> ColoredString {
    match color {
        ReportColor::Green => text.green(),
        ReportColor::Orange => text.yellow(),
        ReportColor::Red => text.red(),
    }
}

fn cmd_summary(input: &Path, dump: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = open_document(input, dump)?;

    println!("{}", doc.name().cyan().bold());
    println!("{}", "─".repeat(64).dimmed());
    println!(
        "{:>6}  {:>14}  {:>14}  {}",
        "Page".bold(),
        "Text area".bold(),
        "Image area".bold(),
        "Ratio".bold()
    );

    for page in doc.pages() {
        let classification = page.classification();
        println!(
            "{:>6}  {:>14.2}  {:>14.2}  {}",
            page.number(),
            page.text_area(),
            page.image_area(),
            paint(classification.label, classification.color)
        );
    }

    let classification = doc.classification();
    println!("{}", "─".repeat(64).dimmed());
    println!(
        "{:>6}  {:>14.2}  {:>14.2}  {}",
        "Total".bold(),
        doc.text_area(),
        doc.image_area(),
        paint(classification.label, classification.color).bold()
    );

    doc.close();
    Ok(())
}

/// `<dir>/<stem>-<job id>.html`, unique even when inputs share a file name.
fn report_path(dir: &Path, input: &Path, id: JobId) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    dir.join(format!("{}-{}.html", stem, id))
}

fn cmd_batch(
    inputs: &[PathBuf],
    output: Option<&Path>,
    workers: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&output_dir)?;

    let mut options = QueueOptions::new().with_keep_finished(inputs.len());
    if let Some(n) = workers {
        options = options.with_workers(n);
    }
    let queue = JobQueue::new(options);
    log::info!("Batch of {} files, reports in {}", inputs.len(), output_dir.display());

    let mut pending = Vec::with_capacity(inputs.len());
    for input in inputs {
        let id = queue.submit(input)?;
        log::debug!("Submitted job {} for {}", id, input.display());
        pending.push((id, input.as_path()));
    }

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut failed = 0;
    while !pending.is_empty() {
        let mut still_running = Vec::with_capacity(pending.len());
        for (id, input) in pending {
            match queue.status(id)? {
                JobStatus::Success => {
                    let path = report_path(&output_dir, input, id);
                    fs::write(&path, queue.wait(id)?)?;
                    log::info!("Job {} finished, wrote {}", id, path.display());
                    pb.println(format!("{} {}", "Saved".green(), path.display()));
                    pb.inc(1);
                }
                JobStatus::Failure { error } => {
                    log::warn!("Job {} for {} failed: {}", id, input.display(), error);
                    pb.println(format!("{} {}: {}", "Failed".red(), input.display(), error));
                    failed += 1;
                    pb.inc(1);
                }
                JobStatus::Progress { current } => {
                    pb.set_message(format!("{} {:.0}%", input.display(), current * 100.0));
                    still_running.push((id, input));
                }
                JobStatus::Pending => still_running.push((id, input)),
            }
        }
        pending = still_running;
        pb.tick();
        if !pending.is_empty() {
            thread::sleep(Duration::from_millis(100));
        }
    }

    pb.finish_with_message("Done!");
    log::info!("Batch done: {} succeeded, {} failed", inputs.len() - failed, failed);

    if failed > 0 {
        return Err(format!("{} of {} files failed", failed, inputs.len()).into());
    }
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfratio".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Text-to-image area analysis for PDF documents");
    println!();
    println!("License: MIT");
}
