use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::warn;

use docalign::core::init_tracing;
use docalign::core::model::{PageId, Side};
use docalign::diff::{codepoint_to_cursor, cursor_to_codepoint, map_position, Direction, TextDiffer};
use docalign::editing::{changed_ranges, read_pages, HeadwordPattern, Pages};
use docalign::layout::{BoxMerger, DirectoryImageProvider};
use docalign::ocr::{BlockIndexCache, EntryBoxResolver, OcrDirectory};
use docalign::pipeline::{entries_from_pages, CancellationToken, ExportPipeline};
use docalign::AlignConfig;

#[derive(Parser, Debug)]
#[command(name = "docalign")]
#[command(version, about = "Align transcripts of scanned pages with each other and with OCR output", long_about = None)]
struct Cli {
    /// JSON config file (missing file means defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the edit script between the two transcripts of a page
    Diff {
        page: PageId,

        /// Left transcript (default: project.text_path_left)
        #[arg(long)]
        left: Option<PathBuf>,

        /// Right transcript (default: project.text_path_right)
        #[arg(long)]
        right: Option<PathBuf>,
    },

    /// Translate a position from one transcript of a page to the other
    Map {
        page: PageId,

        position: usize,

        /// Side the position is taken from
        #[arg(long, value_enum, default_value_t = SideArg::Left)]
        from: SideArg,

        /// Treat positions as UTF-16 cursor offsets instead of codepoints
        #[arg(long)]
        utf16: bool,

        #[arg(long)]
        left: Option<PathBuf>,

        #[arg(long)]
        right: Option<PathBuf>,
    },

    /// Print the merged image regions a text was recognised in
    Locate {
        text: String,

        /// Pages to search, in order
        #[arg(short, long = "page", required = true)]
        pages: Vec<PageId>,
    },

    /// Stitch one image per headword entry of the left transcript
    Export {
        /// Output directory for images and manifest.json
        #[arg(short, long, default_value = "export")]
        output: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum SideArg {
    Left,
    Right,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Left => Side::Left,
            SideArg::Right => Side::Right,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = AlignConfig::load_or_default(cli.config.as_ref())
        .with_context(|| "failed to load config")?;

    match cli.command {
        Commands::Diff { page, left, right } => run_diff(&config, page, left, right),
        Commands::Map {
            page,
            position,
            from,
            utf16,
            left,
            right,
        } => run_map(&config, page, position, from.into(), utf16, left, right),
        Commands::Locate { text, pages } => run_locate(&config, &text, &pages),
        Commands::Export { output } => run_export(&config, output),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn transcript_path(arg: Option<PathBuf>, configured: &Option<PathBuf>, side: &str) -> Result<PathBuf> {
    match arg.or_else(|| configured.clone()) {
        Some(path) => Ok(path),
        None => bail!("no {side} transcript given and project.text_path_{side} is not set"),
    }
}

fn page_text(pages: &Pages, page: PageId, path: &Path) -> String {
    pages.get(&page).cloned().unwrap_or_else(|| {
        warn!(page, transcript = %path.display(), "page missing from transcript; using empty text");
        String::new()
    })
}

fn load_page_pair(
    config: &AlignConfig,
    page: PageId,
    left: Option<PathBuf>,
    right: Option<PathBuf>,
) -> Result<(String, String)> {
    let left = transcript_path(left, &config.project.text_path_left, "left")?;
    let right = transcript_path(right, &config.project.text_path_right, "right")?;
    let left_text = page_text(&read_pages(&left)?, page, &left);
    let right_text = page_text(&read_pages(&right)?, page, &right);
    Ok((left_text, right_text))
}

#[derive(Serialize)]
struct DiffOutput {
    page: PageId,
    opcodes: Vec<docalign::Opcode>,
    left_changes: Vec<std::ops::Range<usize>>,
    right_changes: Vec<std::ops::Range<usize>>,
    left_headwords: Vec<std::ops::Range<usize>>,
}

fn run_diff(config: &AlignConfig, page: PageId, left: Option<PathBuf>, right: Option<PathBuf>) -> Result<()> {
    let (left_text, right_text) = load_page_pair(config, page, left, right)?;
    let opcodes = TextDiffer::from_config(&config.diff).diff_str(&left_text, &right_text);
    let left_headwords = match HeadwordPattern::compile(&config.project.regex_left) {
        Ok(pattern) => pattern.spans(&left_text),
        Err(err) => {
            warn!(error = %err, "invalid left headword pattern; highlighting disabled");
            Vec::new()
        }
    };
    print_json(&DiffOutput {
        page,
        left_changes: changed_ranges(&opcodes, Side::Left),
        right_changes: changed_ranges(&opcodes, Side::Right),
        opcodes,
        left_headwords,
    })
}

#[derive(Serialize)]
struct MapOutput {
    from: Side,
    position: usize,
    mapped: Option<usize>,
}

fn run_map(
    config: &AlignConfig,
    page: PageId,
    position: usize,
    from: Side,
    utf16: bool,
    left: Option<PathBuf>,
    right: Option<PathBuf>,
) -> Result<()> {
    let (left_text, right_text) = load_page_pair(config, page, left, right)?;
    let opcodes = TextDiffer::from_config(&config.diff).diff_str(&left_text, &right_text);
    let (source, target, direction) = match from {
        Side::Left => (&left_text, &right_text, Direction::Forward),
        Side::Right => (&right_text, &left_text, Direction::Backward),
    };
    let codepoint = if utf16 {
        cursor_to_codepoint(source, position)
    } else {
        position
    };
    let mapped = map_position(&opcodes, codepoint, direction).map(|pos| {
        if utf16 {
            codepoint_to_cursor(target, pos)
        } else {
            pos
        }
    });
    print_json(&MapOutput { from, position, mapped })
}

fn ocr_directory(config: &AlignConfig) -> Result<OcrDirectory> {
    match &config.project.ocr_dir {
        Some(dir) => Ok(OcrDirectory::new(dir.clone())),
        None => bail!("project.ocr_dir is not set"),
    }
}

fn run_locate(config: &AlignConfig, text: &str, pages: &[PageId]) -> Result<()> {
    let source = ocr_directory(config)?;
    let cache = BlockIndexCache::new();
    let resolver = EntryBoxResolver::new(&source, &cache)
        .with_differ(TextDiffer::from_config(&config.diff))
        .with_config(&config.resolver);
    let hits = resolver.find_regions(text, pages);
    let regions = BoxMerger::new(config.merge.clone()).merge(&hits);
    print_json(&regions)
}

fn run_export(config: &AlignConfig, output: PathBuf) -> Result<()> {
    let source = ocr_directory(config)?;
    let Some(image_dir) = &config.project.image_dir else {
        bail!("project.image_dir is not set");
    };
    let images = DirectoryImageProvider::new(image_dir.clone(), config.project.page_offset);
    let left = transcript_path(None, &config.project.text_path_left, "left")?;
    let pattern = HeadwordPattern::compile(&config.project.regex_left)
        .with_context(|| format!("invalid headword pattern {:?}", config.project.regex_left))?;

    let entries = entries_from_pages(&read_pages(&left)?, &pattern, config.project.entry_page_span);
    let cache = BlockIndexCache::new();
    let pipeline = ExportPipeline::new(&source, &images, &cache, config, output.clone());
    let report = pipeline
        .run_and_write(&entries, &CancellationToken::new())
        .with_context(|| format!("failed to export to {}", output.display()))?;

    println!(
        "[+] Exported {}/{} entries to {}",
        report.exported(),
        report.entries.len(),
        output.display()
    );
    Ok(())
}
