use crate::models::PricePoint;
use crate::settings::BmrsSettings;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashSet;
use std::num::NonZeroU32;
use std::sync::Arc;

/// BMRS rejects market-index windows longer than this
pub const MAX_CHUNK_DAYS: i64 = 7;

const MARKET_INDEX_PATH: &str = "/balancing/pricing/market-index";

type BmrsRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Client for the Elexon BMRS market index API
///
/// Free, no API key. Cloneable; all clones share one rate limiter.
#[derive(Clone)]
pub struct BmrsClient {
    client: Client,
    base_url: String,
    data_provider: String,
    max_retries: u32,
    backoff_base_ms: u64,
    rate_limiter: Arc<BmrsRateLimiter>,
}

#[derive(Debug, Deserialize)]
struct MarketIndexResponse {
    #[serde(default)]
    data: Vec<MarketIndexItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarketIndexItem {
    start_time: DateTime<Utc>,
    price: Option<f64>,
    #[serde(default)]
    settlement_period: Option<u32>,
    #[serde(default)]
    data_provider: Option<String>,
}

impl BmrsClient {
    pub fn new(settings: &BmrsSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;

        let rpm = NonZeroU32::new(settings.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(rpm)));

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            data_provider: settings.data_provider.clone(),
            max_retries: settings.max_retries.max(1),
            backoff_base_ms: settings.backoff_base_ms,
            rate_limiter,
        })
    }

    /// Exponential backoff before retrying `attempt` (1-based), saturating
    fn backoff_delay(&self, attempt: u32) -> std::time::Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        std::time::Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }

    /// Rate-limited GET with retry on 429, 5xx and network errors
    ///
    /// Returns `Ok(None)` when the upstream answers with a non-success status
    /// that is not worth retrying further; callers treat that chunk as empty.
    async fn make_request(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Option<reqwest::Response>> {
        for attempt in 1..=self.max_retries {
            self.rate_limiter.until_ready().await;

            let backoff = self.backoff_delay(attempt);

            match self
                .client
                .get(url)
                .query(query)
                .header("Accept", "application/json")
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(Some(response));
                    }

                    let retryable =
                        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();

                    if retryable && attempt < self.max_retries {
                        tracing::warn!(
                            "BMRS returned {}, retrying in {:?} (attempt {}/{})",
                            status,
                            backoff,
                            attempt,
                            self.max_retries
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    tracing::warn!("BMRS request failed with status {}", status);
                    return Ok(None);
                }
                Err(e) if attempt < self.max_retries => {
                    tracing::warn!(
                        "Network error: {}, retrying in {:?} (attempt {}/{})",
                        e,
                        backoff,
                        attempt,
                        self.max_retries
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    anyhow::bail!(
                        "BMRS network error after {} attempts: {}",
                        self.max_retries,
                        e
                    )
                }
            }
        }

        anyhow::bail!("BMRS request failed after {} attempts", self.max_retries)
    }

    /// Fetch market index prices for one window (at most 7 days)
    pub async fn fetch_market_index(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>> {
        let url = format!("{}{}", self.base_url, MARKET_INDEX_PATH);
        let query = [
            ("from", from.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ("to", to.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ("dataProviders", self.data_provider.clone()),
        ];

        let Some(response) = self.make_request(&url, &query).await? else {
            tracing::warn!("Empty BMRS chunk {} to {}", from, to);
            return Ok(Vec::new());
        };

        let body: MarketIndexResponse = response
            .json()
            .await
            .context("Failed to parse BMRS market index response")?;

        let points: Vec<PricePoint> = body
            .data
            .into_iter()
            .filter(|item| {
                item.data_provider
                    .as_deref()
                    .map_or(true, |provider| provider == self.data_provider)
            })
            .filter_map(|item| {
                Some(PricePoint {
                    start_time: item.start_time,
                    price: item.price?,
                    settlement_period: item.settlement_period,
                    data_provider: item.data_provider,
                })
            })
            .collect();

        tracing::debug!("Fetched {} BMRS points {} to {}", points.len(), from, to);

        Ok(points)
    }

    /// Fetch `weeks` consecutive 7-day windows ending at `now`
    ///
    /// Chunk boundaries overlap, so points are de-duplicated on start time.
    /// Returned newest first.
    pub async fn fetch_weeks(&self, weeks: u32, now: DateTime<Utc>) -> Result<Vec<PricePoint>> {
        let mut all_points = Vec::new();

        for i in 0..weeks as i64 {
            let to = now - Duration::days(i * MAX_CHUNK_DAYS);
            let from = to - Duration::days(MAX_CHUNK_DAYS);
            let chunk = self.fetch_market_index(from, to).await?;
            all_points.extend(chunk);
        }

        let mut seen = HashSet::new();
        all_points.retain(|p| seen.insert(p.start_time));
        all_points.sort_by(|a, b| b.start_time.cmp(&a.start_time));

        tracing::info!(
            "Fetched {} BMRS price points over {} weeks",
            all_points.len(),
            weeks
        );

        Ok(all_points)
    }
}
