use std::sync::Arc;

use tracing::{info, warn};

use crate::backend::Backend;
use crate::constants::{DEFAULT_PRIZE_IMAGE, DEFAULT_PRIZE_TITLE};
use crate::error::{Error, Result};
use crate::models::RewardDetail;

/// Prize card shown after a claim or a "view my prize" action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimView {
    pub claim_id: u64,
    pub contest_id: Option<u64>,
    pub rank: Option<u32>,
    pub prize_title: String,
    pub image_url: String,
    pub shop_link: Option<String>,
    pub support_contact: Option<String>,
    pub order_no: Option<String>,
    pub waybill_no: Option<String>,
    pub state_hint: String,
}

impl ClaimView {
    fn from_detail(claim_id: u64, detail: RewardDetail) -> Self {
        Self {
            claim_id,
            contest_id: detail.contest_id,
            rank: detail.rank,
            prize_title: non_empty(detail.prize_title)
                .unwrap_or_else(|| DEFAULT_PRIZE_TITLE.to_string()),
            image_url: non_empty(detail.image_url)
                .unwrap_or_else(|| DEFAULT_PRIZE_IMAGE.to_string()),
            shop_link: non_empty(detail.shop_link),
            support_contact: non_empty(detail.support_contact),
            order_no: non_empty(detail.order_no),
            waybill_no: non_empty(detail.waybill_no),
            state_hint: non_empty(detail.state_hint).unwrap_or_default(),
        }
    }

    pub fn rank_label(&self) -> Option<String> {
        self.rank.map(rank_label)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

pub fn rank_label(rank: u32) -> String {
    match rank {
        1 => "First place".to_string(),
        2 => "Second place".to_string(),
        3 => "Third place".to_string(),
        other => format!("Rank {}", other),
    }
}

pub struct RewardDesk {
    backend: Arc<dyn Backend>,
}

impl RewardDesk {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Starts a claim for a finished contest and returns its prize card.
    pub async fn claim(&self, contest_id: u64) -> Result<ClaimView> {
        let ticket = self.backend.start_reward_claim(contest_id).await.map_err(|err| {
            warn!(?err, contest_id, "reward claim rejected");
            err
        })?;
        let detail = self.backend.reward_detail(ticket.claim_id).await?;
        info!(contest_id, claim_id = ticket.claim_id, "reward claimed");

        let mut view = ClaimView::from_detail(ticket.claim_id, detail);
        view.contest_id = Some(contest_id);
        if ticket.rank.is_some() {
            view.rank = ticket.rank;
        }
        Ok(view)
    }

    /// Shows a previously issued claim.
    pub async fn view_prize(&self, claim_id: Option<u64>) -> Result<ClaimView> {
        let claim_id = claim_id.ok_or_else(|| Error::Rejected {
            status: 400,
            message: "Missing claim id".to_string(),
        })?;
        let detail = self.backend.reward_detail(claim_id).await?;
        Ok(ClaimView::from_detail(claim_id, detail))
    }
}
