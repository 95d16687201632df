//! pdf-appendix CLI tool
//!
//! A command-line tool for converting images to PDFs and extending PDF/DOCX
//! documents with image and PDF attachments.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::glob;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

use pdf_appendix::convert::{convert_images, ConvertOptions, OutputMode};
use pdf_appendix::docx::SofficeConverter;
use pdf_appendix::extend::{extend_document, Attachment, BaseType, ExtendOptions};
use pdf_appendix::protocol::{
    AlwaysOverwrite, AlwaysSkip, AutoRename, BatchObserver, CollisionResolver, Decision,
    ItemStatus,
};

/// pdf-appendix - Convert images to PDFs and extend documents with attachments
#[derive(Parser)]
#[command(name = "pdf-appendix")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # One PDF per image, asking before overwriting anything
    pdf-appendix convert -o out/ scans/*.png

    # One combined PDF, renamed automatically if the name is taken
    pdf-appendix convert -o out/ --single --name scans.pdf --on-collision rename scans/*.png

    # Append attachments to a report, moving the original aside as report_original.pdf
    pdf-appendix extend --base report.pdf --rename-base photo1.png annex.pdf photo2.png

    # Extend a DOCX base (requires LibreOffice)
    pdf-appendix extend --base notes.docx appendix/*.png")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log library diagnostics at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert images to PDF files
    Convert {
        /// Input image files (in order). Supports glob patterns like "*.png"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Directory the output PDFs are written to (created if absent)
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Produce one combined PDF instead of one PDF per image
        #[arg(long)]
        single: bool,

        /// File name for the combined PDF (with --single)
        #[arg(long, default_value = pdf_appendix::convert::DEFAULT_SINGLE_NAME)]
        name: String,

        /// Output resolution in pixels per inch
        #[arg(long, default_value_t = 100.0)]
        resolution: f32,

        /// What to do when an output file already exists
        #[arg(long, value_enum, default_value_t = CollisionMode::Ask)]
        on_collision: CollisionMode,
    },

    /// Extend a PDF or DOCX document with image and PDF attachments
    Extend {
        /// Base document to extend
        #[arg(short, long)]
        base: PathBuf,

        /// Attachments in order (images and PDFs, told apart by extension).
        /// Supports glob patterns
        #[arg(required = true)]
        attachments: Vec<String>,

        /// Base document type. Inferred from the file extension when omitted
        #[arg(long, value_enum, ignore_case = true)]
        base_type: Option<BaseTypeArg>,

        /// Output directory (default: the base file's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Output file name (default: the base file name with a .pdf suffix)
        #[arg(long)]
        name: Option<String>,

        /// Move the base file aside to "<stem>_original" before the output
        /// is written
        #[arg(long)]
        rename_base: bool,

        /// Resolution for image attachments in pixels per inch
        #[arg(long, default_value_t = 300.0)]
        resolution: f32,

        /// LibreOffice executable used for DOCX bases
        #[arg(long, default_value = "soffice")]
        soffice: PathBuf,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CollisionMode {
    /// Prompt on stderr/stdin for each collision
    Ask,
    /// Replace existing files
    Overwrite,
    /// Divert to a fresh "_N" name
    Rename,
    /// Leave existing files alone and skip the item
    Skip,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BaseTypeArg {
    Pdf,
    Docx,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Convert {
            inputs,
            output_dir,
            single,
            name,
            resolution,
            on_collision,
        } => cmd_convert(inputs, output_dir, single, name, resolution, on_collision),
        Commands::Extend {
            base,
            attachments,
            base_type,
            output_dir,
            name,
            rename_base,
            resolution,
            soffice,
        } => cmd_extend(
            base,
            attachments,
            base_type,
            output_dir,
            name,
            rename_base,
            resolution,
            soffice,
        ),
        Commands::Info { input } => cmd_info(input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Expand glob patterns in input paths.
///
/// Matches within one pattern are sorted; the order of the arguments
/// themselves is preserved, since attachment and page order is significant.
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        // Check if pattern contains glob characters
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = Vec::new();
            let entries =
                glob(&pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;
            for entry in entries {
                match entry {
                    Ok(path) => matched.push(path),
                    Err(e) => eprintln!("Warning: glob error for {}: {}", pattern, e),
                }
            }
            if matched.is_empty() {
                bail!("No files matched pattern: {pattern}");
            }
            matched.sort();
            paths.extend(matched);
        } else {
            // No glob characters, treat as literal path
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

/// Interactive collision handling: one stdin prompt per colliding path.
struct PromptResolver;

impl PromptResolver {
    fn resolve_from(input: &mut dyn BufRead, candidate: &Path) -> Decision {
        loop {
            eprint!(
                "{} exists. [o]verwrite / [r]ename / [s]kip? ",
                candidate.display()
            );
            let _ = std::io::stderr().flush();

            let Some(answer) = read_line(input) else {
                return Decision::Skip;
            };
            match answer.trim().to_lowercase().as_str() {
                "o" | "overwrite" => return Decision::Overwrite,
                "r" | "rename" => {
                    eprint!("New file name: ");
                    let _ = std::io::stderr().flush();
                    match read_line(input) {
                        Some(name) if !name.trim().is_empty() => {
                            let parent = candidate.parent().unwrap_or_else(|| Path::new("."));
                            let mut renamed = parent.join(name.trim());
                            if renamed.extension().is_none() {
                                renamed.set_extension("pdf");
                            }
                            // A rename target must itself be free.
                            if renamed.exists() {
                                eprintln!("{} also exists.", renamed.display());
                                continue;
                            }
                            return Decision::RenameTo(renamed);
                        }
                        // Declining the name prompt skips the item.
                        _ => return Decision::Skip,
                    }
                }
                "s" | "skip" => return Decision::Skip,
                _ => eprintln!("Please answer o, r, or s."),
            }
        }
    }
}

impl CollisionResolver for PromptResolver {
    fn resolve(&mut self, _source: &Path, candidate: &Path) -> Decision {
        let stdin = std::io::stdin();
        Self::resolve_from(&mut stdin.lock(), candidate)
    }
}

fn read_line(input: &mut dyn BufRead) -> Option<String> {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}

/// Progress reporting on stderr.
struct ConsoleObserver;

impl BatchObserver for ConsoleObserver {
    fn progress(&self, message: &str, current: usize, total: usize) {
        eprintln!("[{}/{}] {}", current, total, message);
    }

    fn item_status(&self, source: &Path, status: ItemStatus) {
        match status {
            ItemStatus::Failed => eprintln!("  failed: {}", source.display()),
            ItemStatus::Skipped => eprintln!("  skipped: {}", source.display()),
            ItemStatus::Processing | ItemStatus::Succeeded => {}
        }
    }
}

fn make_resolver(mode: CollisionMode) -> Box<dyn CollisionResolver> {
    match mode {
        CollisionMode::Ask => Box::new(PromptResolver),
        CollisionMode::Overwrite => Box::new(AlwaysOverwrite),
        CollisionMode::Rename => Box::new(AutoRename),
        CollisionMode::Skip => Box::new(AlwaysSkip),
    }
}

/// Convert images to PDFs
fn cmd_convert(
    inputs: Vec<String>,
    output_dir: PathBuf,
    single: bool,
    name: String,
    resolution: f32,
    on_collision: CollisionMode,
) -> Result<()> {
    // Expand glob patterns
    let inputs = expand_globs(inputs)?;

    // Validate inputs exist
    for path in &inputs {
        if !path.exists() {
            bail!("Input file not found: {}", path.display());
        }
    }

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("cannot create output directory {}", output_dir.display()))?;

    let mut options = ConvertOptions::new(output_dir);
    options.resolution = resolution;
    if single {
        options.mode = OutputMode::Single;
        options.single_output_name = name;
        // The rename mode doubles as silent auto-renaming of the combined
        // output, the behavior interactive callers usually want there.
        options.auto_rename = matches!(on_collision, CollisionMode::Rename);
    }

    eprintln!("Converting {} image(s)...", inputs.len());

    let mut resolver = make_resolver(on_collision);
    let tally = convert_images(&inputs, &options, resolver.as_mut(), &ConsoleObserver);

    println!("Converted: {}  Skipped: {}", tally.converted, tally.skipped);

    Ok(())
}

/// Extend a base document with attachments
#[allow(clippy::too_many_arguments)]
fn cmd_extend(
    base: PathBuf,
    attachments: Vec<String>,
    base_type: Option<BaseTypeArg>,
    output_dir: Option<PathBuf>,
    name: Option<String>,
    rename_base: bool,
    resolution: f32,
    soffice: PathBuf,
) -> Result<()> {
    if !base.exists() {
        bail!("Base file not found: {}", base.display());
    }

    let base_type = match base_type {
        Some(BaseTypeArg::Pdf) => BaseType::Pdf,
        Some(BaseTypeArg::Docx) => BaseType::Docx,
        None => infer_base_type(&base)?,
    };

    let attachment_paths = expand_globs(attachments)?;
    for path in &attachment_paths {
        if !path.exists() {
            bail!("Attachment not found: {}", path.display());
        }
    }
    let attachments: Vec<Attachment> = attachment_paths
        .into_iter()
        .map(Attachment::from_path)
        .collect();

    let output_dir = output_dir.unwrap_or_else(|| {
        base.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf()
    });
    let output_filename = match name {
        Some(name) => ensure_pdf_name(name),
        None => default_output_name(&base),
    };

    // Dropped at the end of this function, removing the intermediates.
    let temp = tempfile::TempDir::new().context("cannot create temp directory")?;

    let mut options = ExtendOptions::new(output_dir, output_filename, temp.path());
    options.rename_base_to_original = rename_base;
    options.resolution = resolution;

    eprintln!(
        "Extending {} with {} attachment(s)...",
        base.display(),
        attachments.len()
    );

    let converter = SofficeConverter::new(soffice);
    let result = extend_document(&base, base_type, &attachments, &options, &converter)
        .with_context(|| format!("extending {}", base.display()))?;

    if let Some(renamed) = &result.renamed_base {
        eprintln!("Base preserved as: {}", renamed.display());
    }
    println!(
        "Created: {}  Added pages: {}",
        result.output_path.display(),
        result.pages_appended
    );

    Ok(())
}

fn infer_base_type(path: &Path) -> Result<BaseType> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().trim().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => Ok(BaseType::Pdf),
        "docx" => Ok(BaseType::Docx),
        other => bail!("Unsupported base type {other:?} (expected pdf or docx)"),
    }
}

/// Default output name: the base's own file name, with `.pdf` enforced (a
/// DOCX base keeps its stem).
fn default_output_name(base: &Path) -> String {
    let is_pdf = base
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        base.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("output.pdf"))
    } else {
        let stem = base
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("output"));
        format!("{stem}.pdf")
    }
}

fn ensure_pdf_name(name: String) -> String {
    if name.to_lowercase().ends_with(".pdf") {
        name
    } else {
        format!("{name}.pdf")
    }
}

/// Show information about a PDF
fn cmd_info(input: PathBuf) -> Result<()> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }

    let metadata = pdf_appendix::pdf::extract_metadata(&input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_base_type_flag_accepts_any_case() {
        let cli = Cli::try_parse_from([
            "pdf-appendix",
            "extend",
            "--base",
            "notes.docx",
            "--base-type",
            "DOCX",
            "a.png",
        ])
        .expect("parse");

        match cli.command {
            Commands::Extend { base_type, .. } => {
                assert!(matches!(base_type, Some(BaseTypeArg::Docx)));
            }
            _ => panic!("expected the extend subcommand"),
        }
    }

    #[test]
    fn test_prompt_basic_answers() {
        let dir = TempDir::new().unwrap();
        let candidate = dir.path().join("out.pdf");
        fs::write(&candidate, b"x").unwrap();

        let mut input = Cursor::new("o\n");
        assert_eq!(
            PromptResolver::resolve_from(&mut input, &candidate),
            Decision::Overwrite
        );

        let mut input = Cursor::new("s\n");
        assert_eq!(
            PromptResolver::resolve_from(&mut input, &candidate),
            Decision::Skip
        );

        // Closed stdin counts as declining.
        let mut input = Cursor::new("");
        assert_eq!(
            PromptResolver::resolve_from(&mut input, &candidate),
            Decision::Skip
        );
    }

    #[test]
    fn test_prompt_rename_appends_pdf_extension() {
        let dir = TempDir::new().unwrap();
        let candidate = dir.path().join("out.pdf");
        fs::write(&candidate, b"x").unwrap();

        let mut input = Cursor::new("r\nappendix\n");
        assert_eq!(
            PromptResolver::resolve_from(&mut input, &candidate),
            Decision::RenameTo(dir.path().join("appendix.pdf"))
        );
    }

    #[test]
    fn test_prompt_rename_rejects_taken_names() {
        let dir = TempDir::new().unwrap();
        let candidate = dir.path().join("out.pdf");
        fs::write(&candidate, b"x").unwrap();
        fs::write(dir.path().join("taken.pdf"), b"y").unwrap();

        // The first answer names an existing file; the loop starts over and
        // the second answer names a free one.
        let mut input = Cursor::new("r\ntaken.pdf\nr\nfresh.pdf\n");
        let decision = PromptResolver::resolve_from(&mut input, &candidate);

        assert_eq!(decision, Decision::RenameTo(dir.path().join("fresh.pdf")));
        assert_eq!(fs::read(dir.path().join("taken.pdf")).unwrap(), b"y");
    }
}
