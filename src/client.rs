//! Fetching and extracting a detail page

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, FetchError, Result};
use crate::extract::{extract_all, Context};
use crate::mapping::APP_FIELDS;
use crate::page::ParsedPage;
use crate::record::AppRecord;

pub const BASE_URL: &str = "https://play.google.com";
const DETAILS_PATH: &str = "/store/apps/details";

/// Per-request HTTP options
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Which app to look up, and in which locale.
///
/// `null` and empty strings count as unset: `lang` and `country` fall back to
/// their defaults and a null `appId` is caught by [`AppRequest::validate`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRequest {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub app_id: String,
    #[serde(default = "default_lang", deserialize_with = "lang_or_default")]
    pub lang: String,
    #[serde(default = "default_country", deserialize_with = "country_or_default")]
    pub country: String,
    #[serde(default)]
    pub request_options: RequestOptions,
    /// Fixed pause before the page request. Not a rate limit: concurrent
    /// calls each wait once and then proceed.
    #[serde(default)]
    pub delay_ms: Option<u64>,
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_country() -> String {
    "us".to_string()
}

fn string_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_empty_or<'de, D: Deserializer<'de>>(
    deserializer: D,
    default: fn() -> String,
) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|value| !value.is_empty())
        .unwrap_or_else(default))
}

fn lang_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    non_empty_or(deserializer, default_lang)
}

fn country_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    non_empty_or(deserializer, default_country)
}

impl AppRequest {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            lang: default_lang(),
            country: default_country(),
            request_options: RequestOptions::default(),
            delay_ms: None,
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    /// Fails with [`Error::MissingAppId`] when no app id was given
    pub fn validate(&self) -> Result<()> {
        if self.app_id.trim().is_empty() {
            return Err(Error::MissingAppId);
        }
        Ok(())
    }

    /// `{base}/store/apps/details?id=..&hl=..&gl=..`
    pub fn details_url(&self, base_url: &str) -> Result<Url> {
        self.validate()?;
        let endpoint = format!("{}{}", base_url.trim_end_matches('/'), DETAILS_PATH);
        let url = Url::parse_with_params(
            &endpoint,
            &[
                ("id", self.app_id.as_str()),
                ("hl", self.lang.as_str()),
                ("gl", self.country.as_str()),
            ],
        )?;
        Ok(url)
    }
}

/// Source of raw page text
pub trait Fetch {
    fn fetch(
        &self,
        url: &Url,
        options: &RequestOptions,
    ) -> impl Future<Output = std::result::Result<String, FetchError>> + Send;
}

/// reqwest-backed fetcher; redirects are followed
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            user_agent: concat!("playstore_parser/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

impl Fetch for HttpFetcher {
    fn fetch(
        &self,
        url: &Url,
        options: &RequestOptions,
    ) -> impl Future<Output = std::result::Result<String, FetchError>> + Send {
        let mut request = self
            .client
            .get(url.clone())
            .header(reqwest::header::USER_AGENT, &self.user_agent);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(ms) = options.timeout_ms {
            request = request.timeout(Duration::from_millis(ms));
        }
        let url = url.to_string();

        async move {
            debug!(url = %url, "fetching page");
            let response = request.send().await.map_err(|e| {
                warn!(url = %url, error = %e, "request failed");
                FetchError::Http(e)
            })?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url,
                });
            }

            Ok(response.text().await?)
        }
    }
}

/// Looks up app detail pages through a [`Fetch`] implementation
#[derive(Debug, Clone)]
pub struct AppClient<F = HttpFetcher> {
    fetcher: F,
    base_url: String,
}

impl Default for AppClient<HttpFetcher> {
    fn default() -> Self {
        Self::new(HttpFetcher::new())
    }
}

impl<F: Fetch> AppClient<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch and extract one app's details.
    ///
    /// The app id is checked before anything is fetched. Fetch errors are
    /// returned as is; there is no retry.
    pub async fn app(&self, request: &AppRequest) -> Result<AppRecord> {
        let url = request.details_url(&self.base_url)?;

        if let Some(ms) = request.delay_ms {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        info!(app_id = %request.app_id, "fetching app details");
        let html = self.fetcher.fetch(&url, &request.request_options).await?;
        extract_app_page(&html, request, url.as_str())
    }
}

/// Extract an app record from already fetched page HTML
pub fn extract_app_page(html: &str, request: &AppRequest, url: &str) -> Result<AppRecord> {
    request.validate()?;

    let page = ParsedPage::parse(html);
    if page.datasets.is_empty() {
        return Err(Error::EmptyPage);
    }

    let auxiliary = page.auxiliary_datasets(APP_FIELDS);
    let context = Context {
        app_id: &request.app_id,
        url,
    };
    Ok(extract_all(APP_FIELDS, &page.datasets, &auxiliary, context))
}
