use crate::models::{PieSeries, RawTransaction, SkillBreakdown, SkillShare};

pub const SKILL_PREFIX: &str = "skill_";
pub const RECOGNIZED_SKILLS: [&str; 5] = ["go", "html", "js", "sql", "css"];

/// Highest level reached per recognized skill, in first-seen order.
pub fn skill_levels(transactions: &[RawTransaction]) -> Vec<(String, f64)> {
    let mut levels: Vec<(String, f64)> = Vec::new();

    for transaction in transactions {
        let Some(skill) = transaction.kind.strip_prefix(SKILL_PREFIX) else {
            continue;
        };
        if !RECOGNIZED_SKILLS.contains(&skill) {
            continue;
        }

        match levels.iter_mut().find(|(name, _)| name == skill) {
            Some((_, level)) => *level = level.max(transaction.amount),
            None => levels.push((skill.to_string(), transaction.amount.max(0.0))),
        }
    }

    levels
}

pub fn skill_shares(transactions: &[RawTransaction]) -> SkillBreakdown {
    let levels = skill_levels(transactions);
    if levels.is_empty() {
        return SkillBreakdown::NoData;
    }

    let total: f64 = levels.iter().map(|(_, level)| level).sum();
    let shares = levels
        .into_iter()
        .map(|(skill, level)| SkillShare {
            skill,
            percentage: if total > 0.0 {
                round_to_hundredths(level / total * 100.0)
            } else {
                0.0
            },
        })
        .collect();

    SkillBreakdown::Shares(shares)
}

pub fn pie_series(breakdown: &SkillBreakdown) -> Option<PieSeries> {
    match breakdown {
        SkillBreakdown::NoData => None,
        SkillBreakdown::Shares(shares) => Some(PieSeries {
            labels: shares.iter().map(|share| share.skill.clone()).collect(),
            values: shares.iter().map(|share| share.percentage).collect(),
        }),
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
