use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::status::StatusColor;

const DAY_SECS: i64 = 86_400;

/// Calendar zoom level of the health history view.
///
/// The view only decides the bucket length; the window itself is chosen by the
/// caller.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HealthView {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl HealthView {
    /// Length of a full window for this view, in seconds.
    pub fn nominal_seconds(&self) -> i64 {
        match self {
            HealthView::Day => DAY_SECS,
            HealthView::Week => 7 * DAY_SECS,
            HealthView::Month => 31 * DAY_SECS,
            HealthView::Year => 365 * DAY_SECS,
        }
    }

    /// Bucket length that renders a full window as `tiles` tiles.
    pub fn period_seconds(&self, tiles: u32) -> i64 {
        (self.nominal_seconds() / i64::from(tiles.max(1))).max(1)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthView::Day => "day",
            HealthView::Week => "week",
            HealthView::Month => "month",
            HealthView::Year => "year",
        }
    }
}

impl Display for HealthView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(HealthView::Day),
            "week" => Ok(HealthView::Week),
            "month" => Ok(HealthView::Month),
            "year" => Ok(HealthView::Year),
            other => Err(format!(
                "Invalid view \"{other}\". Only \"day\", \"week\", \"month\" or \"year\" are supported."
            )),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthTile {
    /// Bucket start, RFC 3339.
    pub date: String,
    pub color: StatusColor,
    /// The last tile of a window may be shorter than `periodSeconds`.
    pub length_seconds: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HealthTiles {
    pub tiles: Vec<HealthTile>,
    pub period_seconds: i64,
}
