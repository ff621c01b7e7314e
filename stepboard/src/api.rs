use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use crate::backend::{Backend, RankQuery};
use crate::constants::{DEFAULT_JOIN_COUNT, DEFAULT_PRIZE_MULTIPLIER};
use crate::error::{Error, Result};
use crate::models::{
    ClaimTicket, ContestRecord, Counts, EndedContest, LoginResponse, Membership, MyRank, Page,
    Profile, RankEntry, RewardDetail, Tab,
};
use crate::session::{Authenticator, Identity, Session};

/// HTTP client for the contest backend.
///
/// Every call carries the session's bearer token. A 401 triggers exactly
/// one forced re-login followed by a replay of the original request.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base: Url,
    session: Arc<Session>,
    authenticator: Arc<dyn Authenticator>,
}

impl ApiClient {
    pub fn new(
        base: &str,
        timeout: Duration,
        session: Arc<Session>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Transport)?;
        Ok(Self {
            client,
            base: normalize_base(base)?,
            session,
            authenticator,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: Value,
    ) -> Result<T> {
        let token = self.session.token().await;
        let response = self
            .send(&method, path, &params, token.as_deref())
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return decode(path, response).await;
        }

        warn!(path, "request unauthorized; re-authenticating once");
        let fresh = self
            .reauthenticate(token.as_deref())
            .await
            .map_err(|err| Error::Unauthorized(err.to_string()))?;
        let response = self.send(&method, path, &params, Some(&fresh)).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized(format!(
                "{} rejected the refreshed token",
                path
            )));
        }
        decode(path, response).await
    }

    /// Returns the current token, logging in first when there is none.
    pub async fn ensure_token(&self) -> Result<String> {
        if let Some(token) = self.session.token().await {
            return Ok(token);
        }
        self.reauthenticate(None).await
    }

    /// Logs in unless a concurrent caller already replaced `stale`.
    async fn reauthenticate(&self, stale: Option<&str>) -> Result<String> {
        let _gate = self.session.login_gate().await;
        if let Some(current) = self.session.token().await {
            if Some(current.as_str()) != stale {
                return Ok(current);
            }
        }
        self.login().await
    }

    async fn login(&self) -> Result<String> {
        let code = self.authenticator.login_code().await?;
        let response = self
            .send(&Method::POST, "/auth/login", &json!({ "code": code }), None)
            .await?;
        let body: LoginResponse = decode("/auth/login", response).await?;
        let token = body
            .token
            .filter(|token| !token.is_empty())
            .ok_or(Error::MissingToken)?;

        let identity = Identity {
            token: token.clone(),
            user_id: body.user_id,
            join_count: body
                .join_count
                .filter(|count| *count > 0)
                .unwrap_or(DEFAULT_JOIN_COUNT),
            prize_multiplier: body
                .prize_multiplier
                .filter(|value| value.is_finite() && *value > 0.0)
                .unwrap_or(DEFAULT_PRIZE_MULTIPLIER),
        };
        info!(user_id = %identity.user_id, "login succeeded");
        self.session.store_identity(identity).await;
        Ok(token)
    }

    async fn send(
        &self,
        method: &Method,
        path: &str,
        params: &Value,
        token: Option<&str>,
    ) -> Result<reqwest::Response> {
        let url = self.base.join(path.trim_start_matches('/'))?;
        let mut request = self
            .client
            .request(method.clone(), url)
            .header("Content-Type", "application/json");
        request = if *method == Method::GET {
            request.query(&query_pairs(params))
        } else {
            request.json(params)
        };
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(Error::Transport)?;
        debug!(method = %method, path, status = response.status().as_u16(), "api response");
        Ok(response)
    }
}

#[derive(Deserialize)]
struct ContestList {
    #[serde(default)]
    items: Vec<ContestRecord>,
}

#[async_trait]
impl Backend for ApiClient {
    async fn ensure_authenticated(&self) -> Result<()> {
        self.ensure_token().await.map(|_| ())
    }

    async fn list_contests(&self) -> Result<Vec<ContestRecord>> {
        let list: Option<ContestList> = self
            .request(Method::GET, "/contest/list", json!({}))
            .await?;
        Ok(list.map(|list| list.items).unwrap_or_default())
    }

    async fn leaderboard_page(&self, query: RankQuery) -> Result<Page<RankEntry>> {
        let page: Option<Page<RankEntry>> = self
            .request(
                Method::GET,
                "/leaderboard/list",
                json!({
                    "contestId": query.contest_id,
                    "page": query.page,
                    "size": query.size,
                    "scope": query.scope.as_str(),
                }),
            )
            .await?;
        Ok(page.unwrap_or_default())
    }

    async fn my_rank(&self, contest_id: u64, scope: Tab) -> Result<Option<MyRank>> {
        let body: Option<Value> = self
            .request(
                Method::GET,
                "/leaderboard/my-rank",
                json!({ "contestId": contest_id, "scope": scope.as_str() }),
            )
            .await?;
        Ok(body.and_then(RankEntry::from_my_rank))
    }

    async fn ended_contests(&self, page: u32, size: u32) -> Result<Page<EndedContest>> {
        let page: Option<Page<EndedContest>> = self
            .request(
                Method::GET,
                "/contest/ended",
                json!({ "page": page, "size": size }),
            )
            .await?;
        Ok(page.unwrap_or_default())
    }

    async fn start_reward_claim(&self, contest_id: u64) -> Result<ClaimTicket> {
        self.request(
            Method::POST,
            "/reward/start",
            json!({ "contestId": contest_id }),
        )
        .await
    }

    async fn reward_detail(&self, claim_id: u64) -> Result<RewardDetail> {
        let detail: Option<RewardDetail> = self
            .request(
                Method::GET,
                "/reward/detail",
                json!({ "claimId": claim_id }),
            )
            .await?;
        Ok(detail.unwrap_or_default())
    }

    async fn profile(&self) -> Result<Profile> {
        let profile: Option<Profile> = self
            .request(Method::GET, "/me/getInfo", json!({}))
            .await?;
        Ok(profile.unwrap_or_default())
    }

    async fn membership(&self) -> Result<Membership> {
        let membership: Option<Membership> = self
            .request(Method::GET, "/membership/me", json!({}))
            .await?;
        Ok(membership.unwrap_or_default())
    }

    async fn counts(&self) -> Result<Counts> {
        let counts: Option<Counts> = self
            .request(Method::GET, "/me/fetchCount", json!({}))
            .await?;
        Ok(counts.unwrap_or_default())
    }
}

async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response.json::<T>().await.map_err(|source| Error::Decode {
            path: path.to_string(),
            source,
        });
    }

    let body: Option<Value> = response.json().await.ok();
    let message = body
        .as_ref()
        .and_then(|body| body.get("error").or_else(|| body.get("message")))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| "API Error".to_string());
    Err(Error::Rejected {
        status: status.as_u16(),
        message,
    })
}

fn query_pairs(params: &Value) -> Vec<(String, String)> {
    let object = match params.as_object() {
        Some(object) => object,
        None => return Vec::new(),
    };
    object
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Null => return None,
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), value))
        })
        .collect()
}

/// Parses the API base and makes sure relative joins keep its path.
pub fn normalize_base(base: &str) -> Result<Url> {
    let mut url = Url::parse(base.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
