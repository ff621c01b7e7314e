use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const SEEDED_TOKEN: &str = "seeded-token";
pub const TOTAL_ROWS: u32 = 12;
pub const VIEWER_RANK: u32 = 4;

type Rejection = (StatusCode, Json<Value>);
type Reply = Result<Json<Value>, Rejection>;

struct FakeApi {
    valid_token: Mutex<String>,
    reject_tokens: AtomicBool,
    logins: AtomicUsize,
}

impl FakeApi {
    fn valid_token(&self) -> String {
        self.valid_token
            .lock()
            .map(|token| token.clone())
            .unwrap_or_default()
    }

    fn set_valid_token(&self, token: &str) {
        if let Ok(mut current) = self.valid_token.lock() {
            *current = token.to_string();
        }
    }
}

/// In-process contest backend on an ephemeral port.
pub struct FakeBackend {
    state: Arc<FakeApi>,
    base_url: String,
    handle: JoinHandle<()>,
}

impl FakeBackend {
    pub async fn spawn() -> Self {
        let state = Arc::new(FakeApi {
            valid_token: Mutex::new(SEEDED_TOKEN.to_string()),
            reject_tokens: AtomicBool::new(false),
            logins: AtomicUsize::new(0),
        });
        let app = Router::new()
            .route("/api/user/auth/login", post(login))
            .route("/api/user/contest/list", get(contest_list))
            .route("/api/user/contest/ended", get(ended_contests))
            .route("/api/user/leaderboard/list", get(leaderboard))
            .route("/api/user/leaderboard/my-rank", get(my_rank))
            .route("/api/user/reward/start", post(reward_start))
            .route("/api/user/reward/detail", get(reward_detail))
            .route("/api/user/me/getInfo", get(profile))
            .route("/api/user/membership/me", get(membership))
            .route("/api/user/me/fetchCount", get(fetch_count))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake backend");
        });

        Self {
            state,
            base_url: format!("http://{}", addr),
            handle,
        }
    }

    pub fn api_base(&self) -> String {
        format!("{}/api/user", self.base_url)
    }

    pub fn logins(&self) -> usize {
        self.state.logins.load(Ordering::SeqCst)
    }

    /// Invalidates every token handed out so far.
    pub fn expire_tokens(&self) {
        self.state.set_valid_token("revoked");
    }

    /// Makes every privileged call answer 401, even right after a login.
    pub fn reject_all_tokens(&self) {
        self.state.reject_tokens.store(true, Ordering::SeqCst);
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn authorize(api: &FakeApi, headers: &HeaderMap) -> Result<(), Rejection> {
    let expected = format!("Bearer {}", api.valid_token());
    let presented = headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok());
    if api.reject_tokens.load(Ordering::SeqCst) || presented != Some(expected.as_str()) {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "token expired" })),
        ));
    }
    Ok(())
}

fn number(params: &HashMap<String, String>, key: &str, default: u32) -> u32 {
    params
        .get(key)
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
        .max(1)
}

async fn login(State(api): State<Arc<FakeApi>>, Json(body): Json<Value>) -> Reply {
    if body.get("code").and_then(Value::as_str).unwrap_or("").is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "code required" })),
        ));
    }
    let count = api.logins.fetch_add(1, Ordering::SeqCst) + 1;
    let token = format!("token-{}", count);
    api.set_valid_token(&token);
    Ok(Json(json!({
        "token": token,
        "userId": 1001,
        "joinCount": 0,
    })))
}

async fn contest_list(State(api): State<Arc<FakeApi>>, headers: HeaderMap) -> Reply {
    authorize(&api, &headers)?;
    let now = Utc::now();
    Ok(Json(json!({
        "items": [
            {
                "id": "7",
                "title": "Daily dash",
                "frequency": "DAILY",
                "startAt": (now - Duration::hours(2)).to_rfc3339(),
                "endAt": (now + Duration::hours(6)).to_rfc3339(),
            },
            {
                "id": 9,
                "title": "Weekly walk",
                "frequency": "weekly",
                "startAt": (now - Duration::days(2)).to_rfc3339(),
                "endAt": (now + Duration::days(4)).to_rfc3339(),
            },
            {
                "id": 5,
                "title": "Spring sprint",
                "frequency": "MONTHLY",
                "startAt": (now - Duration::days(40)).to_rfc3339(),
                "endAt": (now - Duration::days(10)).to_rfc3339(),
            },
            {
                "id": 11,
                "title": "Broken window",
                "frequency": "DAILY",
                "startAt": "not a date",
                "endAt": "",
            }
        ]
    })))
}

async fn ended_contests(State(api): State<Arc<FakeApi>>, headers: HeaderMap) -> Reply {
    authorize(&api, &headers)?;
    Ok(Json(json!({
        "items": [
            { "contestId": 5, "title": "Spring sprint", "frequency": "MONTHLY", "myRank": 2, "claimId": 77 }
        ],
        "hasMore": false,
    })))
}

async fn leaderboard(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    authorize(&api, &headers)?;
    if !params.contains_key("contestId") {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "contestId required" })),
        ));
    }
    let page = number(&params, "page", 1);
    let size = number(&params, "size", 30);
    let start = (page - 1) * size + 1;
    let end = (page * size).min(TOTAL_ROWS);
    let list: Vec<Value> = (start..=end)
        .map(|rank| {
            json!({
                "rank": rank,
                "uid": format!("u-{}", rank),
                "nickname": format!("runner {}", rank),
                "steps": 20_000 - rank * 100,
            })
        })
        .collect();
    Ok(Json(json!({ "list": list, "hasMore": end < TOTAL_ROWS })))
}

async fn my_rank(State(api): State<Arc<FakeApi>>, headers: HeaderMap) -> Reply {
    authorize(&api, &headers)?;
    Ok(Json(json!({
        "rank": VIEWER_RANK,
        "uid": 1001,
        "nickname": "walker",
        "steps": 19_600,
    })))
}

async fn reward_start(
    State(api): State<Arc<FakeApi>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    authorize(&api, &headers)?;
    if body.get("contestId").and_then(Value::as_u64) == Some(1) {
        return Err((
            StatusCode::CONFLICT,
            Json(json!({ "error": "Already claimed" })),
        ));
    }
    Ok(Json(json!({ "claimId": "77", "rank": 2 })))
}

async fn reward_detail(State(api): State<Arc<FakeApi>>, headers: HeaderMap) -> Reply {
    authorize(&api, &headers)?;
    Ok(Json(json!({
        "contestId": 5,
        "rank": 2,
        "prizeTitle": "Trail shoes",
        "taobaoLink": "https://shop.example/item/1",
        "csWeChatId": "desk-01",
    })))
}

async fn profile(State(api): State<Arc<FakeApi>>, headers: HeaderMap) -> Reply {
    authorize(&api, &headers)?;
    Ok(Json(json!({
        "uid": 1001,
        "nickname": "walker",
        "weekSteps": 58_000,
        "joinCount": 6,
    })))
}

async fn membership(State(api): State<Arc<FakeApi>>, headers: HeaderMap) -> Reply {
    authorize(&api, &headers)?;
    Ok(Json(json!({
        "tier": "GOLD",
        "startAt": "2025-01-02T00:00:00Z",
        "endAt": "2026-01-02T00:00:00Z",
    })))
}

async fn fetch_count(State(api): State<Arc<FakeApi>>, headers: HeaderMap) -> Reply {
    authorize(&api, &headers)?;
    Ok(Json(json!({ "joinCount": 6, "prizeMultiplier": 2.0 })))
}
