use std::fmt::Write;

use crate::models::{DailyXpBucket, ProfileSummary, SkillBreakdown};
use crate::skills;

pub const NO_SKILL_DATA: &str = "No data available";

pub fn audit_ratio_label(ratio: Option<f64>) -> String {
    ratio
        .map(|ratio| format!("{ratio:.1}"))
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn xp_label(summary: &ProfileSummary) -> String {
    format!("XP: {} KB", summary.total_xp_kb)
}

/// Plain-text view for the terminal.
pub fn render_summary(display_name: &str, summary: &ProfileSummary) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Welcome, {display_name}!");
    let _ = writeln!(output);
    let _ = writeln!(output, "ID: {}", summary.id);
    let _ = writeln!(output, "Login: {}", summary.login);
    let _ = writeln!(output, "Audits: {}", summary.audit_count);
    let _ = writeln!(output, "Groups: {}", summary.group_count);
    let _ = writeln!(output, "Audit Ratio: {}", audit_ratio_label(summary.audit_ratio));
    let _ = writeln!(output, "{}", xp_label(summary));

    let _ = writeln!(output);
    let _ = writeln!(output, "XP over time:");
    let buckets = &summary.xp_over_time.buckets;
    if buckets.is_empty() {
        let _ = writeln!(output, "  no transactions");
    } else {
        for bucket in buckets {
            let _ = writeln!(output, "  {}  {}", bucket.date.format("%b %d, %Y"), bucket.total_xp);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Skills:");
    match skills::pie_series(&summary.skills) {
        None => {
            let _ = writeln!(output, "  {NO_SKILL_DATA}");
        }
        Some(series) => {
            for (label, value) in series.labels.iter().zip(series.values.iter()) {
                let _ = writeln!(output, "  {label}: {value:.2}%");
            }
        }
    }

    output
}

pub fn build_report(summary: &ProfileSummary) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Profile Report: {}", summary.login);
    let full_name = format!("{} {}", summary.first_name, summary.last_name);
    if !full_name.trim().is_empty() {
        let _ = writeln!(output, "Generated for {} (user {})", full_name.trim(), summary.id);
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Login: {}", summary.login);
    let _ = writeln!(output, "- Audits: {}", summary.audit_count);
    let _ = writeln!(output, "- Groups: {}", summary.group_count);
    let _ = writeln!(output, "- Audit Ratio: {}", audit_ratio_label(summary.audit_ratio));
    let _ = writeln!(output, "- {}", xp_label(summary));

    let _ = writeln!(output);
    let _ = writeln!(output, "## XP Over Time");

    let chart = &summary.xp_over_time;
    match chart.x_domain {
        None => {
            let _ = writeln!(output, "No transactions recorded.");
        }
        Some((first, last)) => {
            let _ = writeln!(
                output,
                "{} days from {} to {} (scale 0 to {})",
                chart.buckets.len(),
                first,
                last,
                chart.y_domain.1
            );
            let _ = writeln!(output);
            let _ = writeln!(output, "| Date | Total XP |");
            let _ = writeln!(output, "| --- | ---: |");
            for bucket in chart.buckets.iter() {
                let _ = writeln!(output, "| {} | {} |", bucket.date, bucket.total_xp);
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Skills");

    match &summary.skills {
        SkillBreakdown::NoData => {
            let _ = writeln!(output, "{NO_SKILL_DATA}");
        }
        SkillBreakdown::Shares(shares) => {
            for share in shares.iter() {
                let _ = writeln!(output, "- {}: {:.2}%", share.skill, share.percentage);
            }
        }
    }

    output
}

pub fn write_buckets_csv<W: std::io::Write>(
    buckets: &[DailyXpBucket],
    writer: W,
) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for bucket in buckets {
        csv.serialize(bucket)?;
    }
    csv.flush()?;
    Ok(())
}
