//! Cargo-style output for the CLI commands.

use std::io::{self, Write};

use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use crate::core::coordinator::{FlushReport, TranslationConflict};
use crate::core::reconcile::ReconcileReport;
use crate::core::rewrite::UnresolvedPhrase;
use crate::core::scan::ScanFailure;

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

fn plural(count: usize, singular: &'static str, plural: &'static str) -> &'static str {
    if count == 1 { singular } else { plural }
}

/// Print unresolved phrases to stdout.
pub fn print_unresolved(unresolved: &[UnresolvedPhrase], severity: Severity) {
    print_unresolved_to(unresolved, severity, &mut io::stdout().lock());
}

pub fn print_unresolved_to<W: Write>(
    unresolved: &[UnresolvedPhrase],
    severity: Severity,
    writer: &mut W,
) {
    let mut sorted = unresolved.to_vec();
    sorted.sort_by(|a, b| a.location.cmp(&b.location));

    let max_line_width = sorted
        .iter()
        .map(|u| u.location.line.to_string().len())
        .max()
        .unwrap_or(1);

    for phrase in &sorted {
        print_phrase(phrase, severity, writer, max_line_width);
    }
}

fn print_phrase<W: Write>(
    phrase: &UnresolvedPhrase,
    severity: Severity,
    writer: &mut W,
    max_line_width: usize,
) {
    let loc = &phrase.location;
    let (severity_str, caret_char) = match severity {
        Severity::Error => ("error".bold().red(), "^".red()),
        Severity::Warning => ("warning".bold().yellow(), "^".yellow()),
    };

    let _ = writeln!(
        writer,
        "{}: \"{}\"  {}",
        severity_str,
        phrase.phrase,
        "missing-translation".dimmed().cyan()
    );
    let _ = writeln!(
        writer,
        "  {} {}:{}:{}",
        "-->".blue(),
        loc.file_path,
        loc.line,
        loc.col
    );

    if !phrase.source_line.is_empty() {
        let _ = writeln!(
            writer,
            "{:>width$} {}",
            "",
            "|".blue(),
            width = max_line_width
        );
        let _ = writeln!(
            writer,
            "{:>width$} {} {}",
            loc.line.to_string().blue(),
            "|".blue(),
            phrase.source_line,
            width = max_line_width
        );

        // Caret pointing to the column (col is 1-based)
        let prefix: String = phrase
            .source_line
            .chars()
            .take(loc.col.saturating_sub(1))
            .collect();
        let caret_padding = UnicodeWidthStr::width(prefix.as_str());
        let _ = writeln!(
            writer,
            "{:>width$} {} {:>padding$}{}",
            "",
            "|".blue(),
            "",
            caret_char,
            width = max_line_width,
            padding = caret_padding
        );
    }

    let _ = writeln!(
        writer,
        "{:>width$} {} {} {}",
        "",
        "=".blue(),
        "note:".bold(),
        format!("namespace \"{}\"", phrase.namespace),
        width = max_line_width
    );
    let _ = writeln!(writer);
}

pub fn print_conflicts(conflicts: &[TranslationConflict]) {
    print_conflicts_to(conflicts, &mut io::stdout().lock());
}

pub fn print_conflicts_to<W: Write>(conflicts: &[TranslationConflict], writer: &mut W) {
    for conflict in conflicts {
        let _ = writeln!(
            writer,
            "{}: key \"{}\" in namespace \"{}\" is used by \"{}\" and \"{}\"  {}",
            "warning".bold().yellow(),
            conflict.key,
            conflict.namespace,
            conflict.existing_phrase,
            conflict.phrase,
            "translation-conflict".dimmed().cyan()
        );
        let _ = writeln!(
            writer,
            "  {} {} {}",
            "=".blue(),
            "hint:".bold().cyan(),
            "the second phrase was stored with a __CONFLICT__ suffix; fix the key by hand"
        );
    }
}

/// Print a warning about files that could not be parsed.
pub fn print_scan_failures(failures: &[ScanFailure], verbose: bool) {
    print_scan_failures_to(failures, verbose, &mut io::stderr().lock());
}

pub fn print_scan_failures_to<W: Write>(failures: &[ScanFailure], verbose: bool, writer: &mut W) {
    if failures.is_empty() {
        return;
    }
    if verbose {
        for failure in failures {
            let _ = writeln!(writer, "{} {}", "warning:".bold().yellow(), failure.message);
        }
    } else {
        let _ = writeln!(
            writer,
            "{} {} file(s) could not be parsed (use {} for details)",
            "warning:".bold().yellow(),
            failures.len(),
            "-v".cyan()
        );
    }
}

/// Print a one-line summary of a flush.
pub fn print_flush(report: &FlushReport) {
    print_flush_to(report, &mut io::stdout().lock());
}

pub fn print_flush_to<W: Write>(report: &FlushReport, writer: &mut W) {
    if report.is_empty() {
        return;
    }
    if report.timed_out {
        let _ = writeln!(
            writer,
            "{} {}",
            "warning:".bold().yellow(),
            format!(
                "translation of {} {} timed out",
                report.requested,
                plural(report.requested, "phrase", "phrases")
            )
        );
        return;
    }

    let translated = report.outcomes.len();
    let _ = writeln!(
        writer,
        "{} {}",
        SUCCESS_MARK.green(),
        format!(
            "Translated {} {}",
            translated,
            plural(translated, "phrase", "phrases")
        )
        .green()
    );
    if !report.failures.is_empty() {
        let _ = writeln!(
            writer,
            "{} {}",
            FAILURE_MARK.red(),
            format!(
                "{} {} could not be translated",
                report.failures.len(),
                plural(report.failures.len(), "phrase", "phrases")
            )
            .red()
        );
    }
    print_conflicts_to(&report.conflicts, writer);
}

/// Print the outcome of a reconcile pass.
pub fn print_reconcile(report: &ReconcileReport) {
    print_reconcile_to(report, &mut io::stdout().lock());
}

pub fn print_reconcile_to<W: Write>(report: &ReconcileReport, writer: &mut W) {
    if report.prune_skipped {
        let _ = writeln!(
            writer,
            "{} some source files could not be parsed, unused keys were kept",
            "warning:".bold().yellow()
        );
    }
    if !report.written() {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            "Locale files are up to date".green()
        );
        return;
    }
    let body = if report.pruned == 0 {
        "Updated locale files".to_string()
    } else {
        format!(
            "Updated locale files, pruned {} unused {}",
            report.pruned,
            plural(report.pruned, "key", "keys")
        )
    };
    let _ = writeln!(writer, "{} {}", SUCCESS_MARK.green(), body.green());
}

/// Summary of a rewrite pass over the source set.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RewriteSummary {
    pub files: usize,
    pub changed_files: usize,
    pub replaced: usize,
    pub unresolved: usize,
}

pub fn print_rewrite_summary(summary: &RewriteSummary, dry_run: bool) {
    print_rewrite_summary_to(summary, dry_run, &mut io::stdout().lock());
}

pub fn print_rewrite_summary_to<W: Write>(summary: &RewriteSummary, dry_run: bool, writer: &mut W) {
    let files = format!(
        "{} source {}",
        summary.files,
        plural(summary.files, "file", "files")
    );
    let verb = if dry_run { "Would rewrite" } else { "Rewrote" };
    let body = format!(
        "{} {} {} in {} ({} checked)",
        verb,
        summary.replaced,
        plural(summary.replaced, "marker", "markers"),
        format_args!(
            "{} {}",
            summary.changed_files,
            plural(summary.changed_files, "file", "files")
        ),
        files
    );

    if summary.unresolved == 0 {
        let _ = writeln!(writer, "{} {}", SUCCESS_MARK.green(), body.green());
    } else {
        let _ = writeln!(writer, "{} {}", FAILURE_MARK.red(), body);
        let _ = writeln!(
            writer,
            "{} {} {} without a translation",
            FAILURE_MARK.red(),
            summary.unresolved,
            plural(summary.unresolved, "phrase", "phrases")
        );
    }
}
