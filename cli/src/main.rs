//! docpdf CLI - document to PDF conversion tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use docpdf::{
    CleanupPreset, Content, JsonFormat, LayoutOptions, Orchestrator, OrchestratorOptions,
    OutputKind, PageSize, ReadOptions, ReaderFactory, SheetSelection, SourceFormat, Template,
    TemplateData,
};

#[derive(Parser)]
#[command(name = "docpdf")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Convert spreadsheets, Word documents and XML to PDF", long_about = None)]
struct Cli {
    /// Input file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a document to PDF or Markdown
    Convert(ConvertArgs),

    /// Export a template merged with data
    Template(TemplateArgs),

    /// Print the extracted content of a document
    Inspect {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Source format tag (detected from the file if omitted)
        #[arg(short, long, value_name = "TAG")]
        format: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// List supported source formats
    Formats,

    /// Show version information
    Version,
}

#[derive(Args)]
struct ConvertArgs {
    /// Input file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output file (defaults to the input name with the output extension)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Source format tag (detected from the file if omitted)
    #[arg(short, long, value_name = "TAG")]
    format: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "pdf")]
    to: OutputArg,

    #[command(flatten)]
    layout: LayoutArgs,

    /// Template skeleton (JSON) to export alongside the document
    #[arg(long, value_name = "FILE")]
    template: Option<PathBuf>,

    /// Template value
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    values: Vec<(String, String)>,

    /// Sheets to read (e.g., "1-3", "1,3,5", "all")
    #[arg(long)]
    sheets: Option<String>,

    /// Text cleanup preset
    #[arg(long, value_enum)]
    cleanup: Option<CleanupLevel>,

    /// Skip malformed parts instead of failing
    #[arg(long)]
    lenient: bool,

    /// Omit the title and intro line
    #[arg(long)]
    no_preamble: bool,
}

#[derive(Args)]
struct TemplateArgs {
    /// Template skeleton (JSON)
    #[arg(value_name = "TEMPLATE")]
    template: PathBuf,

    /// JSON object with template values
    #[arg(short, long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Source document providing content.* values and tables
    #[arg(short, long, value_name = "FILE")]
    source: Option<PathBuf>,

    /// Template value (overrides --data)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    values: Vec<(String, String)>,

    /// Output file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "pdf")]
    to: OutputArg,

    #[command(flatten)]
    layout: LayoutArgs,

    /// Leave missing values empty instead of failing
    #[arg(long)]
    lenient: bool,
}

#[derive(Args)]
struct LayoutArgs {
    /// Page size (a4, letter, legal or WIDTHxHEIGHT in points)
    #[arg(long, env = "DOCPDF_PAGE_SIZE", default_value = "a4")]
    page_size: String,

    /// Body font size in points
    #[arg(long, env = "DOCPDF_FONT_SIZE")]
    font_size: Option<f32>,
}

impl LayoutArgs {
    fn to_layout(&self) -> Result<LayoutOptions, Box<dyn std::error::Error>> {
        let page_size: PageSize = self.page_size.parse()?;
        let mut layout = LayoutOptions::new().with_page_size(page_size);
        if let Some(size) = self.font_size {
            layout = layout.with_font_size(size);
        }
        Ok(layout)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputArg {
    /// PDF document
    Pdf,
    /// Markdown text
    #[value(alias = "md")]
    Markdown,
}

impl From<OutputArg> for OutputKind {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Pdf => OutputKind::Pdf,
            OutputArg::Markdown => OutputKind::Markdown,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum CleanupLevel {
    /// Keep text as extracted
    None,
    /// Minimal cleanup (Unicode normalization only)
    Minimal,
    /// Standard cleanup (default)
    Standard,
    /// Aggressive cleanup
    Aggressive,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Convert(args)) => cmd_convert_args(args),
        Some(Commands::Template(args)) => cmd_template(args),
        Some(Commands::Inspect {
            input,
            format,
            json,
            compact,
        }) => cmd_inspect(&input, format.as_deref(), json, compact),
        Some(Commands::Formats) => {
            cmd_formats();
            Ok(())
        }
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert if input is provided
            if let Some(input) = cli.input {
                cmd_convert(
                    &input,
                    cli.output.as_deref(),
                    OrchestratorOptions::new().with_detected_format(),
                )
            } else {
                println!("{}", "Usage: docpdf <FILE> [OUTPUT]".yellow());
                println!("       docpdf --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_convert_args(args: ConvertArgs) -> Result<(), Box<dyn std::error::Error>> {
    let read = read_options(args.sheets.as_deref(), args.cleanup, args.lenient)?;
    let mut options = OrchestratorOptions::new()
        .with_read_options(read)
        .with_layout(args.layout.to_layout()?)
        .with_output(args.to.into())
        .with_preamble(!args.no_preamble);
    options = match args.format {
        Some(tag) => options.with_format(tag),
        None => options.with_detected_format(),
    };
    if let Some(path) = args.template {
        options = options.with_template(path);
    }
    for (key, value) in args.values {
        options = options.with_value(key, value);
    }
    cmd_convert(&args.input, args.output.as_deref(), options)
}

fn read_options(
    sheets: Option<&str>,
    cleanup: Option<CleanupLevel>,
    lenient: bool,
) -> Result<ReadOptions, Box<dyn std::error::Error>> {
    let mut options = ReadOptions::new();
    if let Some(sheets) = sheets {
        options = options.with_sheets(SheetSelection::parse(sheets)?);
    }
    options = match cleanup {
        Some(CleanupLevel::None) => options.without_cleanup(),
        Some(CleanupLevel::Minimal) => options.with_cleanup_preset(CleanupPreset::Minimal),
        Some(CleanupLevel::Standard) | None => options,
        Some(CleanupLevel::Aggressive) => options.with_cleanup_preset(CleanupPreset::Aggressive),
    };
    if lenient {
        options = options.lenient();
    }
    Ok(options)
}

fn spinner(message: &'static str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message(message);
    Ok(pb)
}

fn default_output(input: &Path, kind: OutputKind, suffix: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    input.with_file_name(format!("{}{}.{}", stem, suffix, kind.extension()))
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    options: OrchestratorOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let kind = options.output;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(input, kind, ""));

    let pb = spinner("Converting...")?;
    let report = Orchestrator::new(options).run(input)?;
    report.document.save(&output)?;

    let templated_path = match &report.templated {
        Some(templated) => {
            let path = default_output(&output, kind, "-templated");
            templated.save(&path)?;
            Some(path)
        }
        None => None,
    };
    pb.finish_and_clear();

    println!(
        "{} {} → {} ({}, {} pages)",
        "Converted".green().bold(),
        input.display(),
        output.display(),
        report.source_format,
        report.document.page_count
    );
    println!(
        "  {} {} headings, {} paragraphs, {} tables, {} images",
        "├─".dimmed(),
        report.content_stats.heading_count,
        report.content_stats.paragraph_count,
        report.content_stats.table_count,
        report.content_stats.image_count
    );
    match templated_path {
        Some(path) => println!("  {} template → {}", "└─".dimmed(), path.display()),
        None => println!(
            "  {} {} blocks processed",
            "└─".dimmed(),
            report.processed.blocks
        ),
    }

    Ok(())
}

fn cmd_template(args: TemplateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let kind: OutputKind = args.to.into();
    let layout = args.layout.to_layout()?;

    let pb = ProgressBar::new(3);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Loading template...");
    let mode = if args.lenient {
        docpdf::ErrorMode::Lenient
    } else {
        docpdf::ErrorMode::Strict
    };
    let mut template = Template::new()
        .with_error_mode(mode)
        .with_output(kind)
        .with_layout(layout);
    template.load(&args.template)?;
    pb.inc(1);

    pb.set_message("Reading data...");
    let mut merge = match &args.data {
        Some(path) => TemplateData::from_json(&fs::read_to_string(path)?)?,
        None => TemplateData::new(),
    };
    for (key, value) in args.values {
        merge.set(key, value);
    }
    if let Some(source) = &args.source {
        let options = ReadOptions::new().with_error_mode(mode);
        merge = merge.with_content(docpdf::read_file_with_options(source, options)?);
    }
    template.fill(merge);
    pb.inc(1);

    pb.set_message("Exporting...");
    let result = template.export()?;
    result.save(&args.output)?;
    pb.inc(1);
    pb.finish_with_message("Done!");

    println!(
        "{} {} ({} pages, {} bytes)",
        "Saved to".green(),
        args.output.display(),
        result.page_count,
        result.len()
    );
    Ok(())
}

fn cmd_inspect(
    input: &Path,
    format: Option<&str>,
    json: bool,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let factory = ReaderFactory::new();
    let mut reader = match format {
        Some(tag) => factory.create_reader(tag)?,
        None => factory.create_for_path(input)?,
    };
    reader.read(input)?;
    let content = reader.take_content();

    if json {
        let format = if compact {
            JsonFormat::Compact
        } else {
            JsonFormat::Pretty
        };
        println!("{}", docpdf::render::to_json(&content, format)?);
        return Ok(());
    }

    print_summary(input, reader.format(), &content);
    println!();
    println!("{}", docpdf::render::to_text(&content));
    Ok(())
}

fn print_summary(input: &Path, format: SourceFormat, content: &Content) {
    let stats = content.stats();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), format);

    let metadata = &content.metadata;
    if let Some(ref title) = metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(count) = metadata.sheet_count {
        println!("{}: {}", "Sheets".bold(), count);
    }
    if let Some(ref created) = metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = metadata.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!(
        "{}: {} headings, {} paragraphs, {} list items, {} tables, {} images",
        "Blocks".bold(),
        stats.heading_count,
        stats.paragraph_count,
        stats.list_item_count,
        stats.table_count,
        stats.image_count
    );
    println!("{}: {}", "Words".bold(), stats.word_count);
    println!("{}", "─".repeat(40).dimmed());
}

fn cmd_formats() {
    println!("{}", "Supported source formats".cyan().bold());
    for format in SourceFormat::ALL {
        println!(
            "  {} {} {}",
            format!("{:<16}", format.as_str()).bold(),
            "tags:".dimmed(),
            format.tags().join(", ")
        );
    }
    println!();
    println!("{}", "Output formats".cyan().bold());
    for kind in [OutputKind::Pdf, OutputKind::Markdown] {
        println!("  {} .{}", format!("{:<16}", kind).bold(), kind.extension());
    }
}

fn cmd_version() {
    println!("{} {}", "docpdf".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("library {}", docpdf::version());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("name=Kim Lee").unwrap(),
            ("name".to_string(), "Kim Lee".to_string())
        );
        assert_eq!(
            parse_key_value(" url =a=b").unwrap(),
            ("url".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_default_output() {
        let input = Path::new("/data/book.xlsx");
        assert_eq!(
            default_output(input, OutputKind::Pdf, ""),
            PathBuf::from("/data/book.pdf")
        );
        assert_eq!(
            default_output(input, OutputKind::Markdown, "-templated"),
            PathBuf::from("/data/book-templated.md")
        );
    }

    #[test]
    fn test_convert_args() {
        let cli = Cli::try_parse_from([
            "docpdf", "convert", "in.xlsx", "--to", "md", "--set", "a=1", "--set", "b=2",
            "--page-size", "letter",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Convert(args)) => {
                assert!(args.to == OutputArg::Markdown);
                assert_eq!(args.values.len(), 2);
                let layout = args.layout.to_layout().unwrap();
                assert_eq!(layout.page_size, PageSize::Letter);
            }
            _ => panic!("expected convert command"),
        }
    }

    #[test]
    fn test_read_options_from_flags() {
        let options = read_options(Some("2"), Some(CleanupLevel::None), true).unwrap();
        assert!(options.is_lenient());
        assert!(options.cleanup_pipeline().is_none());
        assert!(read_options(Some("x-y"), None, false).is_err());
    }

    #[test]
    fn test_convert_and_template_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.xml");
        fs::write(&input, "<notes><h1>Plan</h1><p>Ship it.</p></notes>").unwrap();
        let skeleton = dir.path().join("cover.json");
        fs::write(
            &skeleton,
            r#"{"blocks": [{"type": "header", "text": "{{content.title}} for {{team}}"}]}"#,
        )
        .unwrap();

        let options = OrchestratorOptions::new()
            .with_detected_format()
            .with_output(OutputKind::Markdown)
            .with_template(&skeleton)
            .with_value("team", "Ops");
        cmd_convert(&input, None, options).unwrap();

        let markdown = fs::read_to_string(dir.path().join("notes.md")).unwrap();
        assert!(markdown.contains("Ship it."));
        let templated = fs::read_to_string(dir.path().join("notes-templated.md")).unwrap();
        assert_eq!(templated, "# Plan for Ops\n");

        let output = dir.path().join("cover.pdf");
        let args = TemplateArgs {
            template: skeleton,
            data: None,
            source: Some(input),
            values: vec![("team".to_string(), "QA".to_string())],
            output: output.clone(),
            to: OutputArg::Pdf,
            layout: LayoutArgs {
                page_size: "a4".to_string(),
                font_size: None,
            },
            lenient: false,
        };
        cmd_template(args).unwrap();
        assert!(fs::read(&output).unwrap().starts_with(b"%PDF-"));
    }
}
