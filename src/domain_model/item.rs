use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct ItemId(pub i64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(ItemId)
    }
}

/// Durable post row as far as ranking is concerned.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    pub id: ItemId,
    pub title: String,
    pub price: i32,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
}

/// A post as shown to clients, with the live view count merged in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub id: ItemId,
    pub title: String,
    pub price: i32,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
}

impl ItemView {
    /// The live score when present, else the last flushed count.
    pub fn merge(record: ItemRecord, live_score: Option<u64>) -> Self {
        let view_count = live_score.unwrap_or(record.view_count);
        ItemView {
            id: record.id,
            title: record.title,
            price: record.price,
            view_count,
            created_at: record.created_at,
        }
    }
}

/// Sorted-set scores are floats on the wire; views are whole and never negative.
pub fn score_to_count(score: f64) -> u64 {
    if score.is_finite() && score > 0.0 {
        score as u64
    } else {
        0
    }
}
