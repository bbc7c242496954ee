//! Markdown and JSON run summaries.

use crate::models::{ParameterTrend, RunSummary};
use anyhow::{Context, Result};
use std::path::Path;

/// Generate a complete Markdown summary.
pub fn generate_markdown_summary(summary: &RunSummary) -> String {
    let mut output = String::new();

    output.push_str("# Water Quality Summary\n\n");
    output.push_str(&generate_metadata_section(summary));
    output.push_str(&generate_trends_section(&summary.trends));
    output.push_str(&generate_states_section(summary));
    output.push_str(&generate_distribution_section(summary));
    output.push_str(&generate_charts_section(&summary.charts));

    output
}

/// Generate a JSON summary.
pub fn generate_json_summary(summary: &RunSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("Failed to serialize run summary")
}

/// Write a summary to `path`, creating parent directories.
pub fn write_summary(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write summary to {}", path.display()))
}

fn generate_metadata_section(summary: &RunSummary) -> String {
    let mut section = String::new();

    section.push_str("## Run\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Input:** `{}`\n", summary.input_dir));
    section.push_str(&format!("- **Output:** `{}`\n", summary.output_dir));
    section.push_str(&format!("- **Files:** {}\n", summary.files_collected));
    section.push_str(&format!(
        "- **Rows:** {} merged, {} after cleaning ({:.1}%)\n",
        summary.rows_merged,
        summary.rows_cleaned,
        summary.retention_percent()
    ));
    section.push_str(&format!("- **Duration:** {:.1}s\n", summary.duration_seconds));
    if !summary.columns.is_empty() {
        section.push_str(&format!("- **Columns:** `{}`\n", summary.columns.join("`, `")));
    }
    section.push('\n');

    section
}

fn generate_trends_section(trends: &[ParameterTrend]) -> String {
    let years: Vec<i64> = {
        let mut years: Vec<i64> = trends
            .iter()
            .flat_map(|t| t.points.iter().map(|p| p.year))
            .collect();
        years.sort_unstable();
        years.dedup();
        years
    };

    if years.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Yearly Averages\n\n");

    section.push_str("| Year |");
    for trend in trends {
        section.push_str(&format!(" {} |", trend.label));
    }
    section.push_str("\n|:---|");
    section.push_str(&":---:|".repeat(trends.len()));
    section.push('\n');

    for year in &years {
        section.push_str(&format!("| {} |", year));
        for trend in trends {
            match trend.points.iter().find(|p| p.year == *year) {
                Some(point) => section.push_str(&format!(" {:.2} |", point.mean)),
                None => section.push_str(" - |"),
            }
        }
        section.push('\n');
    }
    section.push('\n');

    for trend in trends {
        if let Some(change) = trend.overall_change() {
            section.push_str(&format!(
                "- {} changed by {:+.2} over the period\n",
                trend.label, change
            ));
        }
    }
    section.push('\n');

    section
}

fn generate_states_section(summary: &RunSummary) -> String {
    if summary.state_means.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Most Sampled States\n\n");
    section.push_str("| State | Average pH | Rows |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for state in &summary.state_means {
        section.push_str(&format!(
            "| {} | {:.2} | {} |\n",
            state.state, state.mean, state.count
        ));
    }
    section.push('\n');

    section
}

fn generate_distribution_section(summary: &RunSummary) -> String {
    let Some(bins) = &summary.bod_histogram else {
        return String::new();
    };

    let total: usize = bins.counts.iter().sum();
    let mut section = String::new();
    section.push_str("## BOD Distribution\n\n");
    if total == 0 {
        section.push_str("No BOD values were available.\n\n");
        return section;
    }

    section.push_str(&format!(
        "{} values in {} bins of width {:.3}.\n\n",
        total, bins.n_bins, bins.bin_width
    ));
    section.push_str("| Range | Count |\n");
    section.push_str("|:---|:---:|\n");
    for (edge, count) in bins.edges.windows(2).zip(&bins.counts) {
        if *count > 0 {
            section.push_str(&format!("| {:.2} – {:.2} | {} |\n", edge[0], edge[1], count));
        }
    }
    section.push('\n');

    section
}

fn generate_charts_section(charts: &[String]) -> String {
    let mut section = String::new();
    section.push_str("## Charts\n\n");
    if charts.is_empty() {
        section.push_str("No charts were written.\n");
    }
    for chart in charts {
        section.push_str(&format!("- `{}`\n", chart));
    }
    section.push('\n');
    section
}
