use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One XP award from the profile's `xps` ledger.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawXpRecord {
    #[serde(default, deserialize_with = "lenient::string")]
    pub path: String,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub amount: i64,
}

/// One ledger entry of any kind. `kind` carries the platform's `type` tag.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawTransaction {
    #[serde(rename = "createdAt", default, deserialize_with = "lenient::string")]
    pub created_at: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub amount: f64,
    #[serde(rename = "type", default, deserialize_with = "lenient::string")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IdRef {
    #[serde(default, deserialize_with = "lenient::integer")]
    pub id: i64,
}

/// The user record returned by the profile query.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProfile {
    #[serde(default, deserialize_with = "lenient::integer")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub login: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub first_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub last_name: String,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub audit_ratio: Option<f64>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub xps: Vec<RawXpRecord>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub audits: Vec<IdRef>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub groups: Vec<IdRef>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub transactions: Vec<RawTransaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyXpBucket {
    pub date: NaiveDate,
    pub total_xp: f64,
}

/// Daily buckets plus the axis domains a time-axis bar chart needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChartSeries {
    pub buckets: Vec<DailyXpBucket>,
    pub x_domain: Option<(NaiveDate, NaiveDate)>,
    pub y_domain: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillShare {
    pub skill: String,
    pub percentage: f64,
}

/// Normalized skill levels, or the explicit "nothing to chart" state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "shares", rename_all = "snake_case")]
pub enum SkillBreakdown {
    NoData,
    Shares(Vec<SkillShare>),
}

/// Parallel label/value arrays for pie renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub id: i64,
    pub login: String,
    pub first_name: String,
    pub last_name: String,
    pub audit_count: usize,
    pub group_count: usize,
    pub audit_ratio: Option<f64>,
    pub total_xp_kb: i64,
    pub xp_over_time: BarChartSeries,
    pub skills: SkillBreakdown,
}

/// Field deserializers that turn `null` and wrongly-typed values into defaults,
/// so one bad record never fails the whole profile.
mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => text,
            _ => String::new(),
        })
    }

    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(number) => number.as_f64().unwrap_or(0.0),
            Value::String(text) => text.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        })
    }

    pub fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().map(|value| value.round() as i64))
                .unwrap_or(0),
            Value::String(text) => text.trim().parse().unwrap_or(0),
            _ => 0,
        })
    }

    /// Each element degrades to `T::default()` on its own; a non-array reads as empty.
    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| T::deserialize(item).unwrap_or_default())
                .collect(),
            _ => Vec::new(),
        })
    }
}
