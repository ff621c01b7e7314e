use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Repeat cadence of a contest, as reported by the backend `frequency` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Some(Recurrence::Daily),
            "WEEKLY" => Some(Recurrence::Weekly),
            "MONTHLY" => Some(Recurrence::Monthly),
            _ => None,
        }
    }

    pub fn tab(self) -> Tab {
        match self {
            Recurrence::Daily => Tab::Day,
            Recurrence::Weekly => Tab::Week,
            Recurrence::Monthly => Tab::Month,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Recurrence::Daily => "DAILY",
            Recurrence::Weekly => "WEEKLY",
            Recurrence::Monthly => "MONTHLY",
        }
    }
}

/// Sub-partition of the ongoing segment. Doubles as the `scope` query value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Day,
    Week,
    Month,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Day, Tab::Week, Tab::Month];

    pub fn as_str(self) -> &'static str {
        match self {
            Tab::Day => "day",
            Tab::Week => "week",
            Tab::Month => "month",
        }
    }

    pub fn recurrence(self) -> Recurrence {
        match self {
            Tab::Day => Recurrence::Daily,
            Tab::Week => Recurrence::Weekly,
            Tab::Month => Recurrence::Monthly,
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    #[default]
    Ongoing,
    Ended,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Ongoing => f.write_str("ongoing"),
            Segment::Ended => f.write_str("ended"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContestStatus {
    Upcoming,
    Ongoing,
    Ended,
}

/// Contest as the backend lists it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestRecord {
    #[serde(deserialize_with = "id_from_any")]
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub frequency: Option<String>,
    pub start_at: String,
    pub end_at: String,
    #[serde(default)]
    pub joined: Option<bool>,
}

/// Contest classified against the wall clock at fetch time.
#[derive(Clone, Debug, PartialEq)]
pub struct ContestSummary {
    pub id: u64,
    pub title: String,
    pub recurrence: Option<Recurrence>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: ContestStatus,
    pub joined: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RankRow")]
pub struct RankEntry {
    pub rank: u32,
    pub user_id: String,
    pub display_name: String,
    pub metric: u64,
}

/// Leaderboard row as sent. Step boards report `steps`, score boards
/// `score`; some rows carry both.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankRow {
    rank: u32,
    #[serde(default, alias = "uid", deserialize_with = "string_from_any")]
    user_id: String,
    #[serde(default, alias = "nickname")]
    display_name: String,
    #[serde(default)]
    metric: Option<u64>,
    #[serde(default)]
    steps: Option<u64>,
    #[serde(default)]
    score: Option<u64>,
}

impl From<RankRow> for RankEntry {
    fn from(row: RankRow) -> Self {
        Self {
            rank: row.rank,
            user_id: row.user_id,
            display_name: row.display_name,
            metric: row.steps.or(row.metric).or(row.score).unwrap_or(0),
        }
    }
}

/// The viewer's own standing; fetched apart from the paged list.
pub type MyRank = RankEntry;

impl RankEntry {
    /// Accepts a my-rank body only when it carries a numeric rank.
    pub fn from_my_rank(value: serde_json::Value) -> Option<MyRank> {
        value.get("rank")?.as_u64()?;
        serde_json::from_value(value).ok()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new", alias = "list")]
    pub items: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
        }
    }
}

/// Card in the ended segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndedContest {
    #[serde(alias = "id", deserialize_with = "id_from_any")]
    pub contest_id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub end_at: Option<String>,
    #[serde(default)]
    pub my_rank: Option<u32>,
    #[serde(default)]
    pub claim_id: Option<u64>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimTicket {
    #[serde(deserialize_with = "id_from_any")]
    pub claim_id: u64,
    #[serde(default)]
    pub rank: Option<u32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardDetail {
    #[serde(default)]
    pub contest_id: Option<u64>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub prize_title: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, rename = "taobaoLink")]
    pub shop_link: Option<String>,
    #[serde(default, rename = "csWeChatId")]
    pub support_contact: Option<String>,
    #[serde(default)]
    pub order_no: Option<String>,
    #[serde(default)]
    pub waybill_no: Option<String>,
    #[serde(default)]
    pub state_hint: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, alias = "userId", deserialize_with = "string_from_any")]
    pub uid: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub week_steps: u64,
    #[serde(default)]
    pub join_count: Option<u32>,
    #[serde(default)]
    pub prize_multiplier: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub start_at: Option<String>,
    #[serde(default)]
    pub end_at: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counts {
    #[serde(default)]
    pub join_count: Option<f64>,
    #[serde(default)]
    pub prize_multiplier: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub(crate) token: Option<String>,
    #[serde(default, deserialize_with = "string_from_any")]
    pub(crate) user_id: String,
    #[serde(default)]
    pub(crate) join_count: Option<u32>,
    #[serde(default)]
    pub(crate) prize_multiplier: Option<f64>,
}

fn id_from_any<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match &value {
        serde_json::Value::Number(number) => number.as_u64(),
        serde_json::Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }
    .ok_or_else(|| serde::de::Error::custom(format!("invalid id: {}", value)))
}

fn string_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) => text,
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_with_steps_and_score_decode() {
        let page: Page<RankEntry> = serde_json::from_str(
            r#"{"list":[
                {"rank":1,"uid":42,"nickname":"ann","steps":1200,"score":3},
                {"rank":2,"userId":"b","displayName":"bo","score":7},
                {"rank":3,"uid":"c"}
            ],"hasMore":true}"#,
        )
        .expect("page");
        assert!(page.has_more);
        assert_eq!(page.items[0].user_id, "42");
        assert_eq!(page.items[0].metric, 1200);
        assert_eq!(page.items[1].metric, 7);
        assert_eq!(page.items[1].display_name, "bo");
        assert_eq!(page.items[2].metric, 0);
    }

    #[test]
    fn ended_page_without_items_is_empty() {
        let page: Page<EndedContest> = serde_json::from_str(r#"{"hasMore":false}"#).expect("page");
        assert!(page.items.is_empty());
    }

    #[test]
    fn my_rank_needs_a_numeric_rank() {
        assert!(RankEntry::from_my_rank(serde_json::json!({ "rank": null })).is_none());
        let my = RankEntry::from_my_rank(serde_json::json!({ "rank": 9, "steps": 50 }))
            .expect("my rank");
        assert_eq!((my.rank, my.metric), (9, 50));
    }
}
