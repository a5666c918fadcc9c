// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of fwpush.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Resource client: named endpoint resolution, envelope parsing and throttling

use crate::catalog::{DiscoveryLink, EndpointCatalog};
use crate::error::{ClientError, Result};
use crate::query::Query;
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

const USER_AGENT: &str = concat!("fwpush/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`ResourceClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API entry point serving the discovery document
    pub base_url: String,
    /// Value of the `Api-Application` header
    pub application_id: String,
    /// Bearer token of the calling user
    pub token: String,
    /// Value of the `Api-Company` header, if requests are company scoped
    pub company_id: Option<String>,
    /// Value of the `Api-Version` header
    pub api_version: String,
    /// Pause after every network call to stay under the rate limit
    pub throttle: Duration,
    /// Upper bound on pages fetched by a single listing
    pub max_pages: Option<u32>,
    /// Per-request timeout of the HTTP client
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            application_id: String::new(),
            token: String::new(),
            company_id: None,
            api_version: "2".to_string(),
            throttle: Duration::from_millis(200),
            max_pages: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// One response envelope: the payload plus the cursor of the next page
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub data: T,
    pub more_after: Option<String>,
}

/// Client for the device-management API
///
/// The endpoint catalog is fetched on first use and kept for the lifetime of
/// the client. A failed discovery is kept as well: every later call fails
/// with the same [`ClientError::Discovery`] without touching the network.
#[derive(Debug)]
pub struct ResourceClient {
    config: ClientConfig,
    http: Client,
    catalog: OnceCell<std::result::Result<EndpointCatalog, String>>,
}

impl ResourceClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(ClientError::Config("base URL must be set".to_string()));
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http,
            catalog: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn max_pages(&self) -> Option<u32> {
        self.config.max_pages
    }

    /// Fetch the discovery document unless it was fetched before.
    pub async fn resolve_catalog(&self) -> Result<&EndpointCatalog> {
        self.catalog
            .get_or_init(|| self.fetch_catalog())
            .await
            .as_ref()
            .map_err(|message| ClientError::Discovery(message.clone()))
    }

    /// The catalog, if discovery already succeeded
    pub fn catalog(&self) -> Option<&EndpointCatalog> {
        self.catalog.get().and_then(|outcome| outcome.as_ref().ok())
    }

    async fn fetch_catalog(&self) -> std::result::Result<EndpointCatalog, String> {
        debug!("Fetching discovery document from {}", self.config.base_url);

        let response = self
            .request(Method::GET, &self.config.base_url)
            .send()
            .await;
        self.throttle().await;
        let response = response.map_err(|e| format!("Request failed: {e}"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response: {e}"))?;
        if !status.is_success() {
            error!("Discovery failed with status {status}");
            return Err(format!("status {status}: {body}"));
        }

        let document: DiscoveryDocument = serde_json::from_str(&body)
            .map_err(|e| format!("Malformed discovery document: {e}"))?;
        let catalog = EndpointCatalog::from_links(document.data);
        info!("Discovered {} endpoints", catalog.len());
        Ok(catalog)
    }

    /// Read a resource, returning its payload and the paging cursor.
    pub async fn get<T: DeserializeOwned>(
        &self,
        name: &str,
        path: &[(&str, &str)],
        query: &Query,
    ) -> Result<Page<T>> {
        let page = self.send(Method::GET, name, path, query, None).await?;
        Ok(Page {
            data: serde_json::from_value(page.data)?,
            more_after: page.more_after,
        })
    }

    /// Read a resource and discard the paging cursor.
    pub async fn get_data<T: DeserializeOwned>(
        &self,
        name: &str,
        path: &[(&str, &str)],
        query: &Query,
    ) -> Result<T> {
        Ok(self.get(name, path, query).await?.data)
    }

    pub async fn post<T, B>(
        &self,
        name: &str,
        path: &[(&str, &str)],
        query: &Query,
        body: &B,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.write(Method::POST, name, path, query, body).await
    }

    pub async fn patch<T, B>(
        &self,
        name: &str,
        path: &[(&str, &str)],
        query: &Query,
        body: &B,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.write(Method::PATCH, name, path, query, body).await
    }

    pub async fn delete<T, B>(
        &self,
        name: &str,
        path: &[(&str, &str)],
        query: &Query,
        body: &B,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.write(Method::DELETE, name, path, query, body).await
    }

    async fn write<T, B>(
        &self,
        method: Method,
        name: &str,
        path: &[(&str, &str)],
        query: &Query,
        body: &B,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        let page = self.send(method, name, path, query, Some(&body)).await?;
        Ok(serde_json::from_value(page.data)?)
    }

    async fn send(
        &self,
        method: Method,
        name: &str,
        path: &[(&str, &str)],
        query: &Query,
        body: Option<&Value>,
    ) -> Result<Page<Value>> {
        let catalog = self.resolve_catalog().await?;
        let url = catalog.resolve(name, path).inspect_err(|e| {
            if matches!(e, ClientError::UnknownEndpoint(_)) {
                warn!("{name} is not in the catalog; known: {}", catalog.names().join(", "));
            }
        })?;
        debug!("{method} {name} -> {url}");

        let mut request = self.request(method, &url);
        if !query.is_empty() {
            request = request.query(query.pairs());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await;
        self.throttle().await;
        let response = response?;

        let status = response.status();
        let text = response.text().await?;
        let envelope: Option<Envelope> = if text.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&text).ok()
        };

        if !status.is_success() {
            let message = envelope
                .as_ref()
                .and_then(|e| error_message(&e.data))
                .unwrap_or(text);
            error!("{name} failed with status {status}: {message}");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope = match envelope {
            Some(envelope) => envelope,
            None if text.trim().is_empty() => Envelope::default(),
            None => serde_json::from_str(&text)?,
        };

        if envelope.status.as_deref() == Some("error") {
            let message = error_message(&envelope.data)
                .unwrap_or_else(|| "unspecified error".to_string());
            error!("{name} returned an error envelope: {message}");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(Page {
            data: envelope.data,
            more_after: envelope.more_after,
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut request = self
            .http
            .request(method, url)
            .header("Api-Version", &self.config.api_version)
            .header("Api-Application", &self.config.application_id)
            .bearer_auth(&self.config.token);
        if let Some(company) = &self.config.company_id {
            request = request.header("Api-Company", company);
        }
        request
    }

    async fn throttle(&self) {
        if !self.config.throttle.is_zero() {
            tokio::time::sleep(self.config.throttle).await;
        }
    }
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    more_after: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct DiscoveryDocument {
    data: Vec<DiscoveryLink>,
}

/// Join the `message` fields of an error payload.
fn error_message(data: &Value) -> Option<String> {
    let messages: Vec<&str> = match data {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.get("message").and_then(Value::as_str))
            .collect(),
        Value::Object(_) => data.get("message").and_then(Value::as_str).into_iter().collect(),
        _ => Vec::new(),
    };

    if messages.is_empty() {
        None
    } else {
        Some(messages.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    fn test_client(server: &ServerGuard) -> ResourceClient {
        ResourceClient::new(ClientConfig {
            base_url: format!("{}/api/", server.url()),
            application_id: "app-1".to_string(),
            token: "test-token".to_string(),
            company_id: Some("company-1".to_string()),
            throttle: Duration::ZERO,
            ..Default::default()
        })
        .unwrap()
    }

    async fn mock_discovery(server: &mut ServerGuard) -> mockito::Mock {
        let base = server.url();
        server
            .mock("GET", "/api/")
            .match_header("authorization", "Bearer test-token")
            .match_header("api-application", "app-1")
            .match_header("api-version", "2")
            .match_header("api-company", "company-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "data": [
                        {"rel": "AgentList", "href": format!("{base}/agents")},
                        {"rel": "Agent", "href": format!("{base}/agents/{{publicId}}")},
                        {"rel": "AgentFirmwareUpgrade", "href": format!("{base}/agents/{{agentId}}/firmware-upgrade")}
                    ]
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_discovery_runs_once() {
        let mut server = Server::new_async().await;
        let discovery = mock_discovery(&mut server).await;
        let agents = server
            .mock("GET", "/agents")
            .with_status(200)
            .with_body(json!({"status": "success", "data": [], "moreAfter": null}).to_string())
            .expect(2)
            .create_async()
            .await;

        let client = test_client(&server);
        assert!(client.catalog().is_none());

        let _: Vec<Value> = client.get_data("AgentList", &[], &Query::new()).await.unwrap();
        let _: Vec<Value> = client.get_data("AgentList", &[], &Query::new()).await.unwrap();
        client.resolve_catalog().await.unwrap();

        assert_eq!(client.catalog().unwrap().len(), 3);
        discovery.assert_async().await;
        agents.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_returns_data_and_cursor() {
        let mut server = Server::new_async().await;
        let _discovery = mock_discovery(&mut server).await;
        let mock = server
            .mock("GET", "/agents")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("fields".into(), "publicId,name".into()),
                Matcher::UrlEncoded("page-size".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "status": "success",
                    "data": [{"publicId": "a1", "name": "Alpha"}],
                    "moreAfter": "cursor-1"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = test_client(&server);
        let query = Query::new().fields("publicId,name").page_size(2);
        let page: Page<Vec<Value>> = client.get("AgentList", &[], &query).await.unwrap();

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0]["name"], "Alpha");
        assert_eq!(page.more_after.as_deref(), Some("cursor-1"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_serializes_body() {
        let mut server = Server::new_async().await;
        let _discovery = mock_discovery(&mut server).await;
        let mock = server
            .mock("POST", "/agents/a1/firmware-upgrade")
            .match_body(Matcher::Json(json!({"file": {"publicId": "fw-9"}})))
            .with_status(200)
            .with_body(json!({"status": "success", "data": {"publicId": "job-1"}}).to_string())
            .create_async()
            .await;

        let client = test_client(&server);
        let result: Value = client
            .post(
                "AgentFirmwareUpgrade",
                &[("agentId", "a1")],
                &Query::new(),
                &json!({"file": {"publicId": "fw-9"}}),
            )
            .await
            .unwrap();

        assert_eq!(result["publicId"], "job-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_error_uses_envelope_messages() {
        let mut server = Server::new_async().await;
        let _discovery = mock_discovery(&mut server).await;
        let mock = server
            .mock("POST", "/agents/a1/firmware-upgrade")
            .with_status(400)
            .with_body(
                json!({
                    "status": "error",
                    "data": [{"message": "Device offline"}, {"message": "try later"}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = test_client(&server);
        let result: Result<Value> = client
            .post("AgentFirmwareUpgrade", &[("agentId", "a1")], &Query::new(), &json!({}))
            .await;

        match result {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Device offline; try later");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_envelope_with_success_status() {
        let mut server = Server::new_async().await;
        let _discovery = mock_discovery(&mut server).await;
        let _mock = server
            .mock("GET", "/agents")
            .with_status(200)
            .with_body(json!({"status": "error", "data": {"message": "bad filter"}}).to_string())
            .create_async()
            .await;

        let client = test_client(&server);
        let result: Result<Vec<Value>> = client.get_data("AgentList", &[], &Query::new()).await;
        assert!(matches!(result, Err(ClientError::Api { message, .. }) if message == "bad filter"));
    }

    #[tokio::test]
    async fn test_unknown_endpoint_and_missing_param() {
        let mut server = Server::new_async().await;
        let _discovery = mock_discovery(&mut server).await;
        let client = test_client(&server);

        let unknown: Result<Value> = client.get_data("RoleList", &[], &Query::new()).await;
        assert!(matches!(unknown, Err(ClientError::UnknownEndpoint(_))));

        let missing: Result<Value> = client.get_data("Agent", &[], &Query::new()).await;
        assert!(matches!(missing, Err(ClientError::MissingPathParam { .. })));
    }

    #[tokio::test]
    async fn test_malformed_discovery_document() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/")
            .with_status(200)
            .with_body(json!({"links": []}).to_string())
            .create_async()
            .await;

        let client = test_client(&server);
        let result = client.resolve_catalog().await;
        assert!(matches!(result, Err(ClientError::Discovery(_))));
        assert!(client.catalog().is_none());
    }

    #[tokio::test]
    async fn test_discovery_http_failure() {
        let mut server = Server::new_async().await;
        let discovery = server
            .mock("GET", "/api/")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server);
        let first: Result<Value> = client.get_data("AgentList", &[], &Query::new()).await;
        assert!(matches!(first, Err(ClientError::Discovery(_))));

        let second: Result<Value> = client
            .post("AgentList", &[], &Query::new(), &json!({}))
            .await;
        assert!(matches!(second, Err(ClientError::Discovery(message)) if message.contains("503")));
        assert!(matches!(
            client.resolve_catalog().await,
            Err(ClientError::Discovery(_))
        ));
        assert!(client.catalog().is_none());
        discovery.assert_async().await;
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let result = ResourceClient::new(ClientConfig::default());
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(&json!([{"message": "a"}, {"other": 1}, {"message": "b"}])),
            Some("a; b".to_string())
        );
        assert_eq!(error_message(&json!({"message": "x"})), Some("x".to_string()));
        assert_eq!(error_message(&json!(null)), None);
    }
}
