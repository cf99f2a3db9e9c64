//! Output formatting for non-interactive queries and checks

use crate::index::check::CheckReport;
use crate::query::aggregate::ResultSet;
use crate::utils::fold_case;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

const UNCATEGORIZED: &str = "(uncategorized)";

/// Byte range of the first query token inside `label`, compared
/// case-insensitively
pub fn highlight_span(label: &str, tokens: &[String]) -> Option<(usize, usize)> {
    let first = tokens.first()?;
    let folded = fold_case(label);
    folded.find(first.as_str()).map(|start| (start, start + first.len()))
}

/// Print results grouped by category
pub fn print_results(results: &ResultSet, tokens: &[String], color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    write_results(&mut stdout, results, tokens)
}

pub fn write_results<W: WriteColor>(
    out: &mut W,
    results: &ResultSet,
    tokens: &[String],
) -> io::Result<()> {
    for (i, group) in results.groups.iter().enumerate() {
        if i > 0 {
            // Blank line between categories
            writeln!(out)?;
        }

        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
        writeln!(out, "{}", group.category.as_deref().unwrap_or(UNCATEGORIZED))?;
        out.reset()?;

        for hit in &group.hits {
            write!(out, "  ")?;
            write_label(out, &hit.occurrence.label, tokens)?;
            write!(out, "  ")?;
            out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            writeln!(out, "{}", hit.occurrence.url)?;
            out.reset()?;
        }
    }

    Ok(())
}

/// Label with the matched token highlighted
fn write_label<W: WriteColor>(out: &mut W, label: &str, tokens: &[String]) -> io::Result<()> {
    let Some((start, end)) = highlight_span(label, tokens) else {
        return write!(out, "{}", label);
    };

    write!(out, "{}", &label[..start])?;
    out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
    write!(out, "{}", &label[start..end])?;
    out.reset()?;
    write!(out, "{}", &label[end..])
}

/// Print results as pretty JSON
pub fn print_json(results: &ResultSet) -> io::Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    serde_json::to_writer_pretty(&mut lock, results)?;
    writeln!(lock)
}

/// Print checker findings; clean shards are skipped
pub fn print_check_report(report: &CheckReport, color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    write_check_report(&mut stdout, report)
}

pub fn write_check_report<W: WriteColor>(out: &mut W, report: &CheckReport) -> io::Result<()> {
    for shard in report.shards.iter().filter(|s| !s.issues.is_empty()) {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
        writeln!(out, "{}", shard.bucket)?;
        out.reset()?;

        for issue in &shard.issues {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
            write!(out, "  error")?;
            out.reset()?;
            writeln!(out, ": {}", issue)?;
        }
    }

    writeln!(
        out,
        "{} shards, {} entries, {} issues",
        report.shards.len(),
        report.entry_count(),
        report.issue_count()
    )
}
