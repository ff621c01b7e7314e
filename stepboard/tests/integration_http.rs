mod support;

use std::sync::Arc;
use std::time::Duration;

use stepboard::backend::Backend;
use stepboard::geometry::{FixedProbe, Geometry};
use stepboard::models::{Segment, Tab};
use stepboard::paging::ListStatus;
use stepboard::reward::RewardDesk;
use stepboard::session::Identity;
use stepboard::viewer::MembershipTier;
use stepboard::{ApiClient, Error, Leaderboard, Session, StaticCode};

use support::{FakeBackend, SEEDED_TOKEN, TOTAL_ROWS, VIEWER_RANK};

fn seeded_session() -> Arc<Session> {
    Arc::new(Session::with_identity(
        Identity {
            token: SEEDED_TOKEN.to_string(),
            user_id: "1001".to_string(),
            ..Identity::default()
        },
        None,
    ))
}

fn client(base: &str, session: Arc<Session>) -> ApiClient {
    ApiClient::new(
        base,
        Duration::from_secs(5),
        session,
        Arc::new(StaticCode(Some("wx-code".to_string()))),
    )
    .expect("api client")
}

#[tokio::test]
async fn expired_token_is_refreshed_once_and_replayed() {
    let server = FakeBackend::spawn().await;
    let session = seeded_session();
    let api = client(&server.api_base(), Arc::clone(&session));

    server.expire_tokens();
    let profile = api.profile().await.expect("profile after re-login");

    assert_eq!(profile.uid, "1001");
    assert_eq!(server.logins(), 1);
    let identity = session.identity().await;
    assert_eq!(identity.token, "token-1");
    assert_eq!(identity.join_count, 3, "zero join count falls back to 3");
}

#[tokio::test]
async fn concurrent_unauthorized_calls_share_one_login() {
    let server = FakeBackend::spawn().await;
    let api = client(&server.api_base(), seeded_session());

    server.expire_tokens();
    let (profile, counts, membership) =
        tokio::join!(api.profile(), api.counts(), api.membership());

    assert!(profile.is_ok());
    assert!(counts.is_ok());
    assert!(membership.is_ok());
    assert_eq!(server.logins(), 1);
}

#[tokio::test]
async fn rejected_refreshed_token_surfaces_unauthorized() {
    let server = FakeBackend::spawn().await;
    let api = client(&server.api_base(), seeded_session());

    server.reject_all_tokens();
    let err = api.profile().await.expect_err("second 401 must fail");

    assert!(matches!(err, Error::Unauthorized(_)), "got {:?}", err);
    assert_eq!(err.status(), Some(401));
    assert_eq!(server.logins(), 1);
}

#[tokio::test]
async fn business_errors_carry_the_server_message() {
    let server = FakeBackend::spawn().await;
    let api = client(&server.api_base(), seeded_session());

    let err = api.start_reward_claim(1).await.expect_err("already claimed");
    assert_eq!(err.status(), Some(409));
    assert_eq!(err.user_message("Claim failed"), "Already claimed");
}

#[tokio::test]
async fn reward_desk_reads_prize_details() {
    let server = FakeBackend::spawn().await;
    let api: Arc<dyn Backend> = Arc::new(client(&server.api_base(), seeded_session()));
    let desk = RewardDesk::new(api);

    let view = desk.claim(5).await.expect("claim");
    assert_eq!(view.claim_id, 77);
    assert_eq!(view.prize_title, "Trail shoes");
    assert_eq!(view.shop_link.as_deref(), Some("https://shop.example/item/1"));
    assert_eq!(view.support_contact.as_deref(), Some("desk-01"));
    assert_eq!(view.image_url, "/assets/prize_sample.jpg");
}

#[tokio::test]
async fn leaderboard_runs_against_http_backend() {
    let server = FakeBackend::spawn().await;
    let session = Arc::new(Session::new(None));
    let api = Arc::new(client(&server.api_base(), Arc::clone(&session)));
    let board = Leaderboard::new(
        api,
        Arc::clone(&session),
        Arc::new(FixedProbe(Some(Geometry {
            list_height: 150.0,
            row_height: 50.0,
        }))),
    );

    board.activate().await;
    assert_eq!(server.logins(), 1);

    let state = board.snapshot().await;
    assert_eq!(state.selection.tab, Tab::Day);
    assert_eq!(state.selection.contest_id, Some(7));
    assert_eq!(state.selection.locked_tabs.len(), 1);
    assert_eq!(state.ongoing.list.items().len(), TOTAL_ROWS as usize);
    assert_eq!(state.ongoing.list.status(), ListStatus::Exhausted);
    assert_eq!(state.ongoing.my.as_ref().map(|my| my.rank), Some(VIEWER_RANK));
    assert_eq!(state.ongoing.first_screen_count, 3);
    assert!(state.ongoing.show_my_row);

    let viewer = state.viewer.expect("viewer");
    assert_eq!(viewer.tier, MembershipTier::Gold);
    assert_eq!(viewer.member_until.as_deref(), Some("2026.1.2"));
    assert_eq!(session.identity().await.join_count, 6);

    board.select_tab(Tab::Week).await;
    let week = board.snapshot().await;
    assert_eq!(week.selection.contest_id, Some(9));
    assert_eq!(week.ongoing.list.items().len(), TOTAL_ROWS as usize);

    board.select_segment(Segment::Ended).await;
    let ended = board.snapshot().await;
    assert_eq!(ended.ended.contests.items().len(), 1);
    assert_eq!(ended.ended.contests.items()[0].claim_id, Some(77));
}

#[tokio::test]
async fn unreachable_backend_fails_open() {
    let session = seeded_session();
    let api = Arc::new(ApiClient::new(
        "http://127.0.0.1:1/api/user",
        Duration::from_millis(500),
        Arc::clone(&session),
        Arc::new(StaticCode(None)),
    )
    .expect("api client"));
    let board = Leaderboard::new(api, session, Arc::new(FixedProbe(None)));

    let listing = board.registry().list_contests().await;
    assert!(listing.contests.is_empty());
    assert!(listing.warning.is_some());

    board.activate().await;
    let state = board.snapshot().await;
    assert_eq!(state.selection.contest_id, None);
    assert_eq!(state.ongoing.list.status(), ListStatus::MissingContest);
    assert!(state.viewer.is_none());
}

#[tokio::test]
async fn fetch_count_updates_the_session() {
    let server = FakeBackend::spawn().await;
    let session = seeded_session();
    let api = client(&server.api_base(), Arc::clone(&session));

    stepboard::viewer::sync_counts(&api, &session)
        .await
        .expect("sync counts");

    let identity = session.identity().await;
    assert_eq!(identity.join_count, 6);
    assert_eq!(identity.prize_multiplier, 2.0);
}
