//! Markdown rendering.
//!
//! Serializes assembled reports exactly as assembled: no reordering, no
//! recomputation. All ordering and aggregation decisions happen in
//! `worklog_core::report`.

use std::fmt::Write;

use chrono::{DateTime, FixedOffset};

use worklog_core::{CommitLine, DailyReport, LogReport, ReportMeta};

/// The flat work log as a Markdown table.
pub fn format_log_markdown(report: &LogReport) -> String {
    let mut output = String::new();
    writeln!(output, "# Work Log").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "- **Author**: {}", report.meta.author).unwrap();
    writeln!(output, "- **Range**: {}", range_text(&report.meta)).unwrap();
    writeln!(output, "- **Daily budget**: {:.2}h", report.daily_hours).unwrap();
    writeln!(
        output,
        "- **Generated**: {}",
        report.meta.generated_at.format("%Y-%m-%d %H:%M UTC")
    )
    .unwrap();
    writeln!(output).unwrap();

    if report.records.is_empty() {
        writeln!(output, "No commits in this range.").unwrap();
        return output;
    }

    writeln!(
        output,
        "| Date | Project | Task | Type | Hours | Commit | Branch | URL |"
    )
    .unwrap();
    writeln!(
        output,
        "|------|---------|------|------|-------|--------|--------|-----|"
    )
    .unwrap();
    for record in &report.records {
        // The URL stays literal text so it can be copied verbatim.
        writeln!(
            output,
            "| {} | {} | {} | {} | {:.2} | `{}` | {} | {} |",
            record.date,
            escape_cell(&record.project),
            escape_cell(&record.task),
            record.kind,
            record.hours,
            record.commit_id,
            escape_cell(&record.branch),
            record.url.as_deref().unwrap_or(""),
        )
        .unwrap();
    }
    writeln!(output).unwrap();
    writeln!(
        output,
        "**Total**: {:.2}h over {} entr{}",
        report.total_hours,
        report.records.len(),
        if report.records.len() == 1 { "y" } else { "ies" }
    )
    .unwrap();
    output
}

/// The sectioned daily report.
pub fn format_daily_markdown(report: &DailyReport) -> String {
    let mut output = String::new();
    writeln!(output, "# Daily Work Report").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "- **Author**: {}", report.meta.author).unwrap();
    writeln!(output, "- **Range**: {}", range_text(&report.meta)).unwrap();
    writeln!(
        output,
        "- **Generated**: {}",
        report.meta.generated_at.format("%Y-%m-%d %H:%M UTC")
    )
    .unwrap();

    writeln!(output).unwrap();
    writeln!(output, "## 📊 Overview").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "- **Projects**: {}", report.overview.projects_touched).unwrap();
    writeln!(output, "- **Commits**: {}", report.overview.total_commits).unwrap();
    writeln!(
        output,
        "- **Hours attributed**: {:.2}",
        report.overview.total_hours
    )
    .unwrap();
    writeln!(output, "- **Active days**: {}", report.overview.active_days).unwrap();
    if let Some(first) = report.overview.first_commit {
        writeln!(output, "- **First commit**: {}", format_time(first)).unwrap();
    }
    if let Some(last) = report.overview.last_commit {
        writeln!(output, "- **Last commit**: {}", format_time(last)).unwrap();
    }
    if !report.overview.kind_distribution.is_empty() {
        writeln!(output, "- **Types**:").unwrap();
        for &(kind, count) in &report.overview.kind_distribution {
            writeln!(
                output,
                "  - {} {}: {} commit{}",
                kind.emoji(),
                kind,
                count,
                plural(count)
            )
            .unwrap();
        }
    }

    writeln!(output).unwrap();
    writeln!(output, "## 📦 Projects").unwrap();
    for section in &report.projects {
        writeln!(output).unwrap();
        writeln!(
            output,
            "### {} ({:.2}h, {} commit{})",
            section.project.path,
            section.hours,
            section.commits.len(),
            plural(section.commits.len())
        )
        .unwrap();
        writeln!(output).unwrap();
        for line in &section.commits {
            writeln!(output, "{}", project_bullet(line)).unwrap();
        }
    }

    writeln!(output).unwrap();
    writeln!(output, "## 📋 By type").unwrap();
    for section in &report.kinds {
        writeln!(output).unwrap();
        writeln!(
            output,
            "### {} {} ({} commit{}, {:.2}h)",
            section.kind.emoji(),
            section.kind,
            section.count,
            plural(section.count),
            section.hours
        )
        .unwrap();
        writeln!(output).unwrap();
        for line in &section.commits {
            writeln!(output, "{}", kind_bullet(line)).unwrap();
        }
    }

    writeln!(output).unwrap();
    writeln!(output, "## ⏰ Timeline").unwrap();
    let mut current_day = None;
    for line in &report.timeline {
        let day = line.time.date_naive();
        if current_day != Some(day) {
            writeln!(output).unwrap();
            writeln!(output, "### {day}").unwrap();
            writeln!(output).unwrap();
            current_day = Some(day);
        }
        writeln!(
            output,
            "- **{}** {} {} ({}, {:.2}h)",
            line.time.format("%H:%M"),
            line.kind.emoji(),
            line.task,
            line.project,
            line.hours
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "## 📝 Summary").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "{}", report.summary).unwrap();
    output
}

/// "X to Y" when the start is bounded, "through Y" otherwise.
fn range_text(meta: &ReportMeta) -> String {
    match meta.since {
        Some(since) => format!("{since} to {}", meta.until),
        None => format!("through {}", meta.until),
    }
}

fn format_time(time: DateTime<FixedOffset>) -> String {
    time.format("%Y-%m-%d %H:%M").to_string()
}

fn project_bullet(line: &CommitLine) -> String {
    format!(
        "- {} {} {} ({}, {:.2}h)",
        line.time.format("%Y-%m-%d %H:%M"),
        line.kind.emoji(),
        line.task,
        commit_cell(line.id.as_str(), line.url.as_deref()),
        line.hours
    )
}

fn kind_bullet(line: &CommitLine) -> String {
    format!(
        "- {} {} ({}, {}, {:.2}h)",
        line.time.format("%Y-%m-%d %H:%M"),
        line.task,
        line.project,
        commit_cell(line.id.as_str(), line.url.as_deref()),
        line.hours
    )
}

/// The commit id as inline code, linked when the platform gave a URL.
fn commit_cell(id: &str, url: Option<&str>) -> String {
    match url {
        Some(url) => format!("[`{id}`]({url})"),
        None => format!("`{id}`"),
    }
}

/// Table cells must not break on a `|` inside a task name.
fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

const fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}
