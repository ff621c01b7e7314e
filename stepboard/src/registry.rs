use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::warn;

use crate::backend::Backend;
use crate::models::{ContestRecord, ContestStatus, ContestSummary, Recurrence, Tab};
use crate::util::{now, parse_timestamp};

/// Contest id currently running for each tab.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OngoingByTab {
    pub day: Option<u64>,
    pub week: Option<u64>,
    pub month: Option<u64>,
}

impl OngoingByTab {
    pub fn get(&self, tab: Tab) -> Option<u64> {
        match tab {
            Tab::Day => self.day,
            Tab::Week => self.week,
            Tab::Month => self.month,
        }
    }

    fn slot_mut(&mut self, tab: Tab) -> &mut Option<u64> {
        match tab {
            Tab::Day => &mut self.day,
            Tab::Week => &mut self.week,
            Tab::Month => &mut self.month,
        }
    }

    /// First backed tab in day, week, month order.
    pub fn default_selection(&self) -> Option<(Tab, u64)> {
        Tab::ALL
            .into_iter()
            .find_map(|tab| self.get(tab).map(|id| (tab, id)))
    }
}

/// Result of [`ContestRegistry::list_contests`]. `warning` is set when the
/// list came from cache because the fetch failed.
#[derive(Clone, Debug, Default)]
pub struct ContestListing {
    pub contests: Vec<ContestSummary>,
    pub warning: Option<String>,
}

pub fn classify(start_at: DateTime<Utc>, end_at: DateTime<Utc>, now: DateTime<Utc>) -> ContestStatus {
    if now < start_at {
        ContestStatus::Upcoming
    } else if now > end_at {
        ContestStatus::Ended
    } else {
        ContestStatus::Ongoing
    }
}

/// Records with unparseable time windows are dropped.
pub fn summarize(records: &[ContestRecord], now: DateTime<Utc>) -> Vec<ContestSummary> {
    records
        .iter()
        .filter_map(|record| {
            let start_at = parse_timestamp(&record.start_at);
            let end_at = parse_timestamp(&record.end_at);
            let (start_at, end_at) = match (start_at, end_at) {
                (Some(start), Some(end)) => (start, end),
                _ => {
                    warn!(contest_id = record.id, "skipping contest with invalid time window");
                    return None;
                }
            };
            Some(ContestSummary {
                id: record.id,
                title: record.title.clone(),
                recurrence: record.frequency.as_deref().and_then(Recurrence::parse),
                start_at,
                end_at,
                status: classify(start_at, end_at, now),
                joined: record.joined.unwrap_or(false),
            })
        })
        .collect()
}

pub fn index_ongoing_by_recurrence(contests: &[ContestSummary]) -> OngoingByTab {
    let mut ongoing: Vec<&ContestSummary> = contests
        .iter()
        .filter(|contest| contest.status == ContestStatus::Ongoing)
        .collect();
    ongoing.sort_by(|a, b| {
        b.end_at
            .cmp(&a.end_at)
            .then_with(|| b.start_at.cmp(&a.start_at))
            .then_with(|| b.id.cmp(&a.id))
    });

    let mut by_tab = OngoingByTab::default();
    for contest in ongoing {
        let tab = match contest.recurrence {
            Some(recurrence) => recurrence.tab(),
            None => continue,
        };
        let slot = by_tab.slot_mut(tab);
        if slot.is_none() {
            *slot = Some(contest.id);
        }
    }
    by_tab
}

pub fn locked_tabs(by_tab: &OngoingByTab) -> BTreeSet<Tab> {
    Tab::ALL
        .into_iter()
        .filter(|tab| by_tab.get(*tab).is_none())
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabLocks {
    pub locked: BTreeSet<Tab>,
    pub default_tab: Tab,
}

impl TabLocks {
    pub fn from_index(by_tab: &OngoingByTab) -> Self {
        let locked = locked_tabs(by_tab);
        let default_tab = Tab::ALL
            .into_iter()
            .find(|tab| !locked.contains(tab))
            .unwrap_or(Tab::Day);
        Self {
            locked,
            default_tab,
        }
    }

    /// Locks for a board opened on one specific contest: only that
    /// contest's tab stays selectable.
    pub fn for_handed(contest_type: Option<Recurrence>, by_tab: &OngoingByTab) -> Self {
        match contest_type {
            Some(recurrence) => {
                let default_tab = recurrence.tab();
                Self {
                    locked: Tab::ALL
                        .into_iter()
                        .filter(|tab| *tab != default_tab)
                        .collect(),
                    default_tab,
                }
            }
            None => Self::from_index(by_tab),
        }
    }
}

/// Fetches and classifies contests, keeping the last good list for when
/// the backend is unreachable.
pub struct ContestRegistry {
    backend: Arc<dyn Backend>,
    cache: Mutex<Vec<ContestSummary>>,
}

impl ContestRegistry {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            cache: Mutex::new(Vec::new()),
        }
    }

    pub async fn list_contests(&self) -> ContestListing {
        self.list_contests_at(now()).await
    }

    pub async fn list_contests_at(&self, now: DateTime<Utc>) -> ContestListing {
        match self.backend.list_contests().await {
            Ok(records) => {
                let contests = summarize(&records, now);
                *self.cache.lock().await = contests.clone();
                ContestListing {
                    contests,
                    warning: None,
                }
            }
            Err(err) => {
                warn!(?err, "contest list unavailable; serving cached list");
                ContestListing {
                    contests: self.cache.lock().await.clone(),
                    warning: Some(err.to_string()),
                }
            }
        }
    }
}
