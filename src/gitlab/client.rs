//! HTTP implementation of [`GitLabApi`].
//!
//! Requests go to `<server>/api/v<version>`. List endpoints are paginated
//! through the `X-Next-Page` header. Transport failures, `429` and `5xx`
//! answers are retried with exponential backoff; everything else fails on
//! the first attempt.

use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;

use super::{GitLabApi, Job, Pipeline, PipelineScope, RemoteGroup, RemoteProject};
use crate::config::ServerConfig;
use crate::constants::{
    API_PAGE_SIZE, API_RETRY_ATTEMPTS, MAX_BACKOFF_DELAY_MS, STARTING_BACKOFF_DELAY_MS,
};
use crate::core::BulkError;
use crate::workdir::WorkdirContext;

type Query = Vec<(&'static str, String)>;

/// REST client bound to one server.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    http: reqwest::Client,
    api_base: String,
    basic_auth: Option<(String, Option<String>)>,
}

impl GitLabClient {
    /// Build a client for `server`.
    pub fn new(server: &ServerConfig, api_version: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &server.private_token {
            let value = HeaderValue::from_str(token)
                .map_err(|_| BulkError::configuration("private_token contains invalid characters"))?;
            headers.insert("PRIVATE-TOKEN", value);
        }
        if let Some(token) = &server.oauth_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| BulkError::configuration("oauth_token contains invalid characters"))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .danger_accept_invalid_certs(!server.ssl_verify)
            .user_agent(concat!("glbulk/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build the HTTP client")?;

        let basic_auth = server
            .http_username
            .as_ref()
            .map(|user| (user.clone(), server.http_password.clone()));

        Ok(Self {
            http,
            api_base: format!("{}/api/v{}", server.normalized_url(), api_version),
            basic_auth,
        })
    }

    /// Build a client from the work-dir's server section.
    pub fn from_workdir(ctx: &WorkdirContext) -> Result<Self> {
        let config = ctx.config();
        Self::new(ctx.server()?, &config.global.api_version, config.timeout())
    }

    /// The API root, e.g. `https://gitlab.example.com/api/v4`.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    async fn send_once(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<(String, Option<u32>), BulkError> {
        let url = format!("{}{}", self.api_base, path);
        let mut request = self.http.get(&url).query(query);
        if let Some((user, password)) = &self.basic_auth {
            request = request.basic_auth(user, password.as_ref());
        }

        tracing::debug!(target: "gitlab", "GET {} {:?}", path, query);
        let response = request.send().await.map_err(|e| BulkError::NetworkError {
            operation: format!("GET {path}"),
            reason: e.to_string(),
        })?;

        let status = response.status();
        let next_page = response
            .headers()
            .get("x-next-page")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u32>().ok());
        let body = response.text().await.map_err(|e| BulkError::NetworkError {
            operation: format!("GET {path}"),
            reason: e.to_string(),
        })?;

        if status == StatusCode::NOT_FOUND {
            return Err(BulkError::not_found(format!("GitLab resource '{path}' was not found.")));
        }
        if !status.is_success() {
            return Err(BulkError::GitLabApiError {
                status: status.as_u16(),
                message: body.lines().next().unwrap_or_default().to_string(),
            });
        }
        Ok((body, next_page))
    }

    async fn send(&self, path: &str, query: &Query) -> Result<(String, Option<u32>)> {
        let strategy = ExponentialBackoff::from_millis(STARTING_BACKOFF_DELAY_MS)
            .max_delay(Duration::from_millis(MAX_BACKOFF_DELAY_MS))
            .take(API_RETRY_ATTEMPTS);

        let result = RetryIf::start(
            strategy,
            || self.send_once(path, query),
            |e: &BulkError| {
                let retry = e.is_transient();
                if retry {
                    tracing::debug!(target: "gitlab", "Retrying GET {}: {}", path, e);
                }
                retry
            },
        )
        .await?;
        Ok(result)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: Query) -> Result<T> {
        let (body, _) = self.send(path, &query).await?;
        serde_json::from_str(&body)
            .with_context(|| format!("Failed to decode GitLab response for {path}"))
    }

    async fn get_all<T: DeserializeOwned>(&self, path: &str, query: Query) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1u32;
        loop {
            let mut paged = query.clone();
            paged.push(("per_page", API_PAGE_SIZE.to_string()));
            paged.push(("page", page.to_string()));

            let (body, next_page) = self.send(path, &paged).await?;
            let batch: Vec<T> = serde_json::from_str(&body)
                .with_context(|| format!("Failed to decode GitLab response for {path}"))?;
            items.extend(batch);

            match next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }
        Ok(items)
    }
}

impl GitLabApi for GitLabClient {
    fn list_groups<'a>(&'a self, search: &'a str) -> BoxFuture<'a, Result<Vec<RemoteGroup>>> {
        async move {
            self.get_all(
                "/groups",
                vec![("search", search.to_string()), ("all_available", "true".to_string())],
            )
            .await
        }
        .boxed()
    }

    fn list_projects(&self) -> BoxFuture<'_, Result<Vec<RemoteProject>>> {
        async move { self.get_all("/projects", vec![("simple", "true".to_string())]).await }
            .boxed()
    }

    fn list_subgroups(&self, group_id: u64) -> BoxFuture<'_, Result<Vec<RemoteGroup>>> {
        async move { self.get_all(&format!("/groups/{group_id}/subgroups"), Vec::new()).await }
            .boxed()
    }

    fn list_group_projects<'a>(
        &'a self,
        group_id: u64,
        search: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<RemoteProject>>> {
        async move {
            let mut query = vec![("simple", "true".to_string())];
            if let Some(search) = search {
                query.push(("search", search.to_string()));
            }
            self.get_all(&format!("/groups/{group_id}/projects"), query).await
        }
        .boxed()
    }

    fn latest_pipeline<'a>(
        &'a self,
        project_id: u64,
        scope: PipelineScope,
        ref_name: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Option<Pipeline>>> {
        async move {
            let mut query = vec![
                ("scope", scope.as_str().to_string()),
                ("order_by", "id".to_string()),
                ("sort", "desc".to_string()),
                ("per_page", "1".to_string()),
                ("page", "1".to_string()),
            ];
            if let Some(ref_name) = ref_name {
                query.push(("ref", ref_name.to_string()));
            }
            let pipelines: Vec<Pipeline> =
                self.get_json(&format!("/projects/{project_id}/pipelines"), query).await?;
            Ok(pipelines.into_iter().next())
        }
        .boxed()
    }

    fn get_pipeline(&self, project_id: u64, pipeline_id: u64) -> BoxFuture<'_, Result<Pipeline>> {
        async move {
            self.get_json(&format!("/projects/{project_id}/pipelines/{pipeline_id}"), Vec::new())
                .await
        }
        .boxed()
    }

    fn latest_failed_job(
        &self,
        project_id: u64,
        pipeline_id: u64,
    ) -> BoxFuture<'_, Result<Option<Job>>> {
        async move {
            let jobs: Vec<Job> = self
                .get_json(
                    &format!("/projects/{project_id}/pipelines/{pipeline_id}/jobs"),
                    vec![("scope[]", "failed".to_string()), ("per_page", "1".to_string())],
                )
                .await?;
            Ok(jobs.into_iter().next())
        }
        .boxed()
    }
}
