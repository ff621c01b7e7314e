use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    ClaimTicket, ContestRecord, Counts, EndedContest, Membership, MyRank, Page, Profile,
    RankEntry, RewardDetail, Tab,
};

/// One page of a contest leaderboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankQuery {
    pub contest_id: u64,
    pub page: u32,
    pub size: u32,
    pub scope: Tab,
}

/// The remote side as the leaderboard sees it. [`crate::api::ApiClient`]
/// is the production implementation.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Resolves once a token is available; idempotent.
    async fn ensure_authenticated(&self) -> Result<()>;

    async fn list_contests(&self) -> Result<Vec<ContestRecord>>;

    async fn leaderboard_page(&self, query: RankQuery) -> Result<Page<RankEntry>>;

    /// `None` when the viewer has no numeric rank in that contest.
    async fn my_rank(&self, contest_id: u64, scope: Tab) -> Result<Option<MyRank>>;

    async fn ended_contests(&self, page: u32, size: u32) -> Result<Page<EndedContest>>;

    async fn start_reward_claim(&self, contest_id: u64) -> Result<ClaimTicket>;

    async fn reward_detail(&self, claim_id: u64) -> Result<RewardDetail>;

    async fn profile(&self) -> Result<Profile>;

    async fn membership(&self) -> Result<Membership>;

    async fn counts(&self) -> Result<Counts>;
}
