use std::fmt;

use tracing::warn;

use crate::backend::Backend;
use crate::error::Result;
use crate::models::{Membership, Profile};
use crate::session::Session;
use crate::util::format_badge_date;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MembershipTier {
    #[default]
    None,
    Bronze,
    Silver,
    Gold,
}

impl MembershipTier {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|tier| tier.trim().to_ascii_uppercase()).as_deref() {
            Some("BRONZE") => MembershipTier::Bronze,
            Some("SILVER") => MembershipTier::Silver,
            Some("GOLD") => MembershipTier::Gold,
            _ => MembershipTier::None,
        }
    }
}

impl fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MembershipTier::None => "",
            MembershipTier::Bronze => "Bronze member",
            MembershipTier::Silver => "Silver member",
            MembershipTier::Gold => "Gold member",
        };
        f.write_str(name)
    }
}

/// The signed-in user as shown in the leaderboard header.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Viewer {
    pub profile: Profile,
    pub tier: MembershipTier,
    pub member_since: Option<String>,
    pub member_until: Option<String>,
}

impl Viewer {
    pub fn new(profile: Profile, membership: Membership) -> Self {
        Self {
            profile,
            tier: MembershipTier::parse(membership.tier.as_deref()),
            member_since: membership.start_at.as_deref().and_then(format_badge_date),
            member_until: membership.end_at.as_deref().and_then(format_badge_date),
        }
    }
}

/// Loads profile and membership, writing the join count back into the
/// session. A membership failure degrades to no tier.
pub async fn load_viewer(backend: &dyn Backend, session: &Session) -> Result<Viewer> {
    let profile = backend.profile().await?;
    let membership = match backend.membership().await {
        Ok(membership) => membership,
        Err(err) => {
            warn!(?err, "membership unavailable");
            Membership::default()
        }
    };
    session
        .update_counts(profile.join_count, profile.prize_multiplier)
        .await;
    Ok(Viewer::new(profile, membership))
}

/// Refreshes the join count and prize multiplier from the backend.
pub async fn sync_counts(backend: &dyn Backend, session: &Session) -> Result<()> {
    let counts = backend.counts().await?;
    let join_count = counts
        .join_count
        .filter(|count| count.is_finite() && *count >= 0.0)
        .map(|count| count as u32);
    session
        .update_counts(join_count, counts.prize_multiplier)
        .await;
    Ok(())
}
