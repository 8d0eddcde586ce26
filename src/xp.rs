use crate::models::RawXpRecord;

/// XP earned before the platform started tracking module paths.
pub const BASELINE_XP: i64 = 70_000;
pub const XP_PER_KB: f64 = 1000.0;

pub fn is_module_path(path: &str) -> bool {
    let path = path.to_lowercase();
    path.contains("module") && !path.contains("module/piscine")
}

/// Module XP plus the legacy baseline, in whole KB.
pub fn total_xp_kb(records: &[RawXpRecord]) -> i64 {
    let module_xp: i64 = records
        .iter()
        .filter(|record| is_module_path(&record.path))
        .map(|record| record.amount)
        .fold(0, i64::saturating_add);

    (module_xp.saturating_add(BASELINE_XP) as f64 / XP_PER_KB).round() as i64
}
