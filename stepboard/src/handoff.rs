use std::sync::Mutex;

use crate::models::{ContestStatus, ContestSummary, Recurrence};
use crate::util::parse_contest_id;

/// Navigation context an upstream screen leaves for the leaderboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Handoff {
    pub contest_id: u64,
    pub contest_type: Option<Recurrence>,
    pub contest_status: Option<String>,
    pub goto_ended: bool,
}

impl Handoff {
    /// Builds a hand-off from loosely typed values. A missing or malformed
    /// contest id means there is nothing to hand off.
    pub fn parse(
        contest_id: &str,
        contest_type: Option<&str>,
        contest_status: Option<&str>,
        goto_ended: Option<&str>,
    ) -> Option<Self> {
        let contest_id = parse_contest_id(contest_id)?;
        let contest_status = contest_status
            .map(str::trim)
            .filter(|status| !status.is_empty())
            .map(str::to_string);
        Some(Self {
            contest_id,
            contest_type: contest_type.and_then(Recurrence::parse),
            contest_status,
            goto_ended: goto_ended.map(is_truthy).unwrap_or(false),
        })
    }

    pub fn from_contest(contest: &ContestSummary) -> Self {
        let ended = contest.status == ContestStatus::Ended;
        Self {
            contest_id: contest.id,
            contest_type: contest.recurrence,
            contest_status: Some(
                match contest.status {
                    ContestStatus::Upcoming => "upcoming",
                    ContestStatus::Ongoing => "ongoing",
                    ContestStatus::Ended => "ended",
                }
                .to_string(),
            ),
            goto_ended: ended,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no"
    )
}

/// One-shot mailbox between screens. Posting replaces any unread message.
#[derive(Debug, Default)]
pub struct HandoffSlot {
    pending: Mutex<Option<Handoff>>,
}

impl HandoffSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, handoff: Handoff) {
        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *pending = Some(handoff);
    }

    pub fn take(&self) -> Option<Handoff> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}
