use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use outcrop::core::{BlockRegion, Document, HeadingLine, OutlineConfig, Point};
use outcrop::edit::{self, CycleDirection, EditOutcome, InsertOutcome};
use outcrop::regions;
use outcrop::scanner;
use outcrop::syntax::{self, LanguageHint};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "outcrop",
    about = "Comment-prefix outline tooling built on the outcrop crate",
    version
)]
struct Cli {
    /// Comment character override; otherwise inferred from each file's
    /// extension.
    #[arg(long, global = true)]
    comment: Option<char>,
    /// Minimum comment-run length that makes a heading.
    #[arg(long, global = true)]
    base_level: Option<usize>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan files and print their outlines.
    Outline(OutlineArgs),
    /// Print the block region owned by each heading.
    Regions(RegionsArgs),
    /// Remove comment characters from a heading (toward level 1).
    Promote(ShiftArgs),
    /// Add comment characters to a heading (one level deeper each).
    Demote(ShiftArgs),
    /// Cycle a heading's TODO keyword, recording CLOSED timestamps.
    Todo(TodoArgs),
    /// Insert a new heading.
    Heading(HeadingArgs),
    /// Insert a subheading below the heading at --line.
    Subheading(SubheadingArgs),
}

#[derive(Debug, Args)]
struct OutlineArgs {
    /// Source files to scan.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Emit JSON instead of an indented listing.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct RegionsArgs {
    /// Source files to scan.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Emit JSON instead of a line listing.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct ShiftArgs {
    input: PathBuf,
    /// 1-based line of the heading to shift.
    #[arg(long)]
    line: usize,
    /// How many levels to shift.
    #[arg(long, default_value_t = 1)]
    count: usize,
    /// Overwrite the file instead of printing to stdout.
    #[arg(long)]
    in_place: bool,
}

#[derive(Debug, Args)]
struct TodoArgs {
    input: PathBuf,
    /// 1-based line of the heading.
    #[arg(long)]
    line: usize,
    /// Cycle backward through the keyword ring.
    #[arg(long)]
    back: bool,
    /// Overwrite the file instead of printing to stdout.
    #[arg(long)]
    in_place: bool,
}

#[derive(Debug, Args)]
struct HeadingArgs {
    input: PathBuf,
    /// 1-based line of the caret.
    #[arg(long)]
    line: usize,
    /// Caret column; defaults to the end of the line.
    #[arg(long)]
    column: Option<usize>,
    /// Logical level for the new heading.
    #[arg(long, default_value_t = 1)]
    level: usize,
    /// Insert after the current subtree instead of splitting at the caret.
    #[arg(long)]
    respect_content: bool,
    /// Overwrite the file instead of printing to stdout.
    #[arg(long)]
    in_place: bool,
}

#[derive(Debug, Args)]
struct SubheadingArgs {
    input: PathBuf,
    /// 1-based line of the parent heading.
    #[arg(long)]
    line: usize,
    /// Overwrite the file instead of printing to stdout.
    #[arg(long)]
    in_place: bool,
}

#[derive(Debug, Clone, Copy)]
enum Shift {
    Promote,
    Demote,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let cli = Cli::parse();
    let cfg = build_config(cli.base_level);
    let comment = cli.comment;
    match cli.command {
        Commands::Outline(args) => handle_outline(args, &cfg, comment),
        Commands::Regions(args) => handle_regions(args, &cfg, comment),
        Commands::Promote(args) => handle_shift(args, &cfg, comment, Shift::Promote),
        Commands::Demote(args) => handle_shift(args, &cfg, comment, Shift::Demote),
        Commands::Todo(args) => handle_todo(args, &cfg, comment),
        Commands::Heading(args) => handle_heading(args, &cfg, comment),
        Commands::Subheading(args) => handle_subheading(args, &cfg, comment),
    }
}

fn build_config(base_level: Option<usize>) -> OutlineConfig {
    let mut cfg = OutlineConfig::default();
    if let Some(base) = base_level {
        cfg.base_level = base;
    }
    cfg
}

fn load_document(path: &PathBuf, comment: Option<char>) -> Result<Document> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let mut doc = Document::from_text(Some(path.clone()), &text);
    let hint = match comment {
        Some(c) => LanguageHint::from_comment_start(&c.to_string()),
        None => LanguageHint::for_path(path),
    };
    if syntax::resolve(&mut doc, &hint).is_none() {
        bail!("no comment syntax known for {:?}; pass --comment", path);
    }
    Ok(doc)
}

fn zero_based(line: usize) -> Result<usize> {
    line.checked_sub(1).context("--line is 1-based")
}

fn emit(doc: &Document, path: &PathBuf, in_place: bool) -> Result<()> {
    let text = doc.to_text();
    if in_place {
        fs::write(path, text.as_bytes()).with_context(|| format!("writing {:?}", path))?;
    } else {
        print!("{text}");
        if !text.is_empty() && !text.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}

fn handle_outline(args: OutlineArgs, cfg: &OutlineConfig, comment: Option<char>) -> Result<()> {
    let OutlineArgs { inputs, json } = args;
    let mut scanned = Vec::new();
    for path in &inputs {
        let doc = load_document(path, comment)?;
        let outline =
            scanner::outline(&doc, cfg).with_context(|| format!("scanning {:?}", path))?;
        scanned.push((path.clone(), outline));
    }

    if json {
        #[derive(serde::Serialize)]
        struct JsonOutput<'a> {
            path: String,
            headings: &'a [HeadingLine],
        }

        let payload: Vec<JsonOutput<'_>> = scanned
            .iter()
            .map(|(path, headings)| JsonOutput {
                path: path.display().to_string(),
                headings,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    for (idx, (path, headings)) in scanned.iter().enumerate() {
        if scanned.len() > 1 {
            if idx > 0 {
                println!();
            }
            println!("== {} ==", path.display());
        }
        if headings.is_empty() {
            eprintln!("no headings in {:?}", path);
            continue;
        }
        for h in headings {
            let keyword = h
                .keyword
                .as_deref()
                .map(|k| format!("{k} "))
                .unwrap_or_default();
            println!(
                "{:>4}  {}{} {}{}",
                h.line + 1,
                "  ".repeat(h.level - 1),
                cfg.bullet_glyph(h.level),
                keyword,
                h.title
            );
        }
    }
    Ok(())
}

fn handle_regions(args: RegionsArgs, cfg: &OutlineConfig, comment: Option<char>) -> Result<()> {
    let RegionsArgs { inputs, json } = args;
    let mut computed = Vec::new();
    for path in &inputs {
        let doc = load_document(path, comment)?;
        let regions = regions::compute_regions(&doc, cfg)
            .with_context(|| format!("computing regions for {:?}", path))?;
        computed.push((path.clone(), regions));
    }

    if json {
        #[derive(serde::Serialize)]
        struct JsonOutput<'a> {
            path: String,
            regions: &'a [BlockRegion],
        }

        let payload: Vec<JsonOutput<'_>> = computed
            .iter()
            .map(|(path, regions)| JsonOutput {
                path: path.display().to_string(),
                regions,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    for (idx, (path, regions)) in computed.iter().enumerate() {
        if computed.len() > 1 {
            if idx > 0 {
                println!();
            }
            println!("== {} ==", path.display());
        }
        if regions.is_empty() {
            eprintln!("no block regions in {:?}", path);
            continue;
        }
        for r in regions {
            println!("lines {}..{}", r.start + 1, r.end + 1);
        }
    }
    Ok(())
}

fn handle_shift(
    args: ShiftArgs,
    cfg: &OutlineConfig,
    comment: Option<char>,
    shift: Shift,
) -> Result<()> {
    let ShiftArgs {
        input,
        line,
        count,
        in_place,
    } = args;
    let line = zero_based(line)?;
    let mut doc = load_document(&input, comment)?;
    let outcome = match shift {
        Shift::Promote => edit::promote(&mut doc, cfg, line, count)?,
        Shift::Demote => edit::demote(&mut doc, cfg, line, count)?,
    };
    match outcome {
        EditOutcome::Edited => emit(&doc, &input, in_place),
        EditOutcome::Skipped(message) => {
            eprintln!("{message}");
            Ok(())
        }
    }
}

fn handle_todo(args: TodoArgs, cfg: &OutlineConfig, comment: Option<char>) -> Result<()> {
    let TodoArgs {
        input,
        line,
        back,
        in_place,
    } = args;
    let line = zero_based(line)?;
    let mut doc = load_document(&input, comment)?;
    let direction = if back {
        CycleDirection::Backward
    } else {
        CycleDirection::Forward
    };
    let outcome = edit::cycle_todo(&mut doc, cfg, line, direction, Local::now().naive_local())?;
    match outcome {
        EditOutcome::Edited => emit(&doc, &input, in_place),
        EditOutcome::Skipped(message) => {
            eprintln!("{message}");
            Ok(())
        }
    }
}

fn handle_heading(args: HeadingArgs, cfg: &OutlineConfig, comment: Option<char>) -> Result<()> {
    let HeadingArgs {
        input,
        line,
        column,
        level,
        respect_content,
        in_place,
    } = args;
    let line = zero_based(line)?;
    if level == 0 {
        bail!("--level is 1-based");
    }
    let mut doc = load_document(&input, comment)?;
    let column =
        column.unwrap_or_else(|| doc.line(line).map(|t| t.chars().count()).unwrap_or(0));
    edit::insert_heading(&mut doc, cfg, Point { line, column }, level, respect_content)?;
    emit(&doc, &input, in_place)
}

fn handle_subheading(args: SubheadingArgs, cfg: &OutlineConfig, comment: Option<char>) -> Result<()> {
    let SubheadingArgs {
        input,
        line,
        in_place,
    } = args;
    let line = zero_based(line)?;
    let mut doc = load_document(&input, comment)?;
    match edit::insert_subheading(&mut doc, cfg, Point { line, column: 0 })? {
        InsertOutcome::Inserted(_) => emit(&doc, &input, in_place),
        InsertOutcome::Skipped(message) => {
            eprintln!("{message}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_source(dir: &tempfile::TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, text).expect("write fixture");
        path
    }

    #[test]
    fn load_document_resolves_syntax_from_the_extension() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = write_source(&tmp, "lib.rs", "/// Title\nbody\n");
        let doc = load_document(&path, None).expect("load");
        assert_eq!(doc.comment_syntax().map(|s| s.0), Some('/'));
    }

    #[test]
    fn load_document_fails_without_comment_syntax() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = write_source(&tmp, "notes.txt", "just text\n");
        assert!(load_document(&path, None).is_err());
        assert!(load_document(&path, Some('#')).is_ok());
    }

    #[test]
    fn shift_round_trips_through_the_filesystem() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = write_source(&tmp, "main.rs", "//// Deep\nbody\n");
        let cfg = OutlineConfig::default();
        let args = ShiftArgs {
            input: path.clone(),
            line: 1,
            count: 1,
            in_place: true,
        };
        handle_shift(args, &cfg, None, Shift::Promote).expect("promote");
        assert_eq!(fs::read_to_string(&path).expect("read"), "/// Deep\nbody\n");
    }

    #[test]
    fn todo_records_a_closed_line_in_place() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = write_source(&tmp, "tool.py", "### TODO Ship\nbody\n");
        let cfg = OutlineConfig::default();
        let args = TodoArgs {
            input: path.clone(),
            line: 1,
            back: false,
            in_place: true,
        };
        handle_todo(args, &cfg, None).expect("todo");
        let text = fs::read_to_string(&path).expect("read");
        assert!(text.starts_with("### DONE Ship\n"));
        assert!(
            text.lines()
                .nth(1)
                .is_some_and(|l| l.starts_with("  ## CLOSED: ["))
        );
    }

    #[test]
    fn heading_insertion_respects_content_in_place() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = write_source(&tmp, "mod.rs", "/// A\nbody\n//// Sub\ndeep\n");
        let cfg = OutlineConfig::default();
        let args = HeadingArgs {
            input: path.clone(),
            line: 1,
            column: None,
            level: 1,
            respect_content: true,
            in_place: true,
        };
        handle_heading(args, &cfg, None).expect("insert");
        let text = fs::read_to_string(&path).expect("read");
        assert_eq!(text, "/// A\nbody\n//// Sub\ndeep\n/// \n");
    }
}
