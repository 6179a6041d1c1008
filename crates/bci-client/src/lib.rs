// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use bci_app::{GroupMode, LeadBackend, LeadRow, PageQuery, PicklistEntry, PicklistKind};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

const COUNT_ENDPOINT: &str = "getProjectCount";
const PAGE_ENDPOINT: &str = "getBciProject";

const fn picklist_endpoint(kind: PicklistKind) -> &'static str {
    match kind {
        PicklistKind::Category => "getCategoryPicklistValues",
        PicklistKind::ProjectStage => "getProjectStagePicklistValues",
        PicklistKind::Council => "getCouncilPicklistValues",
    }
}

/// Blocking client for the lead query service.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    access_token: Option<String>,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration, access_token: Option<&str>) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("backend.base_url must not be empty");
        }
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("backend.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "backend.base_url must use http or https, got {:?}",
                parsed.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            access_token: access_token
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_owned),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn fetch_count(&self, filters_json: &str, group: GroupMode) -> Result<u64> {
        self.post(
            COUNT_ENDPOINT,
            &CountRequest {
                filters_json,
                group_value: group.as_str(),
            },
        )
        .context("fetch project count")
    }

    pub fn fetch_page(&self, query: &PageQuery) -> Result<Vec<LeadRow>> {
        self.post(
            PAGE_ENDPOINT,
            &PageRequest {
                filters_json: &query.filters_json,
                group_value: query.group.as_str(),
                offset_size: query.offset,
                limit_size: query.limit,
                sort_by: query.sort_by.as_deref(),
                sort_direction: query.sort_direction.as_deref(),
            },
        )
        .with_context(|| format!("fetch projects at offset {}", query.offset))
    }

    pub fn fetch_picklist(&self, kind: PicklistKind) -> Result<Vec<PicklistEntry>> {
        self.post(picklist_endpoint(kind), &serde_json::json!({}))
            .with_context(|| format!("fetch {} picklist", kind.as_str()))
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, endpoint: &str, body: &B) -> Result<T> {
        let url = format!("{}/{endpoint}", self.base_url);
        tracing::debug!(%url, "posting to query service");
        let response = self
            .authorize(self.http.post(&url))
            .json(body)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::warn!(%url, status = status.as_u16(), "query service rejected request");
            return Err(clean_error_response(status, &body));
        }

        response
            .json()
            .with_context(|| format!("decode {endpoint} response"))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl LeadBackend for Client {
    fn project_count(&mut self, filters_json: &str, group: GroupMode) -> Result<u64> {
        self.fetch_count(filters_json, group)
    }

    fn projects(&mut self, query: &PageQuery) -> Result<Vec<LeadRow>> {
        self.fetch_page(query)
    }

    fn picklist_values(&mut self, kind: PicklistKind) -> Result<Vec<PicklistEntry>> {
        self.fetch_picklist(kind)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CountRequest<'a> {
    filters_json: &'a str,
    group_value: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageRequest<'a> {
    filters_json: &'a str,
    group_value: &'a str,
    offset_size: usize,
    limit_size: usize,
    sort_by: Option<&'a str>,
    sort_direction: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    message: Option<String>,
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("query service at {base_url} timed out -- raise backend.timeout");
    }
    anyhow!("cannot reach query service at {base_url} -- check backend.base_url ({error})")
}

fn error_message(item: ErrorItem) -> Option<String> {
    let message = item.message.filter(|message| !message.is_empty())?;
    Some(match item.error_code {
        Some(code) if !code.is_empty() => format!("{code}: {message}"),
        _ => message,
    })
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(items) = serde_json::from_str::<Vec<ErrorItem>>(body)
        && let Some(message) = items.into_iter().find_map(error_message)
    {
        return anyhow!("server error ({}): {message}", status.as_u16());
    }

    if let Ok(item) = serde_json::from_str::<ErrorItem>(body)
        && let Some(message) = error_message(item)
    {
        return anyhow!("server error ({}): {message}", status.as_u16());
    }

    let body = body.trim();
    if !body.is_empty() && body.len() < 100 && !body.contains('{') && !body.contains('[') {
        return anyhow!("server error ({}): {body}", status.as_u16());
    }

    anyhow!("server returned {}", status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::{Client, clean_error_response, picklist_endpoint};
    use bci_app::PicklistKind;
    use reqwest::StatusCode;
    use std::time::Duration;

    #[test]
    fn rejects_blank_and_non_http_base_urls() {
        assert!(Client::new("  ", Duration::from_secs(1), None).is_err());
        assert!(Client::new("ftp://example.com", Duration::from_secs(1), None).is_err());
        assert!(Client::new("not a url", Duration::from_secs(1), None).is_err());
    }

    #[test]
    fn trims_trailing_slash_and_blank_token() -> anyhow::Result<()> {
        let client = Client::new(
            "https://crm.example.com/services/apexrest/bci/",
            Duration::from_secs(5),
            Some("   "),
        )?;
        assert_eq!(
            client.base_url(),
            "https://crm.example.com/services/apexrest/bci"
        );
        assert!(!client.has_access_token());
        assert_eq!(client.timeout(), Duration::from_secs(5));
        Ok(())
    }

    #[test]
    fn picklist_endpoints_are_distinct() {
        assert_eq!(
            picklist_endpoint(PicklistKind::ProjectStage),
            "getProjectStagePicklistValues"
        );
        assert_ne!(
            picklist_endpoint(PicklistKind::Category),
            picklist_endpoint(PicklistKind::Council)
        );
    }

    #[test]
    fn error_bodies_are_cleaned() {
        let list = clean_error_response(
            StatusCode::BAD_REQUEST,
            r#"[{"message":"Invalid filter","errorCode":"APEX_ERROR"}]"#,
        );
        assert_eq!(
            list.to_string(),
            "server error (400): APEX_ERROR: Invalid filter"
        );

        let single = clean_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"message":"boom"}"#,
        );
        assert_eq!(single.to_string(), "server error (500): boom");

        let plain = clean_error_response(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(plain.to_string(), "server error (502): upstream down");

        let noisy = clean_error_response(StatusCode::BAD_GATEWAY, r#"{"unexpected":true}"#);
        assert_eq!(noisy.to_string(), "server returned 502");
    }
}
