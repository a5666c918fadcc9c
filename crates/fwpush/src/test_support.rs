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

//! Shared fixtures for tests against a mocked API

use crate::model::endpoints::*;
use fwpush_client::{ClientConfig, ResourceClient};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{Value, json};
use std::time::Duration;

/// Serve a discovery document listing every endpoint under `/v2`
pub async fn mock_discovery(server: &mut ServerGuard) -> Mock {
    let base = format!("{}/v2", server.url());
    let links = [
        (AGENT_TYPE_LIST, format!("{base}/agent-types")),
        (AGENT_TYPE_FILE_LIST, format!("{base}/agent-types/{{publicId}}/files")),
        (AGENT_LIST, format!("{base}/agents")),
        (ROLE_LIST, format!("{base}/roles")),
        (GROUP_LIST, format!("{base}/groups")),
        (MY_USER, format!("{base}/users/me")),
        (USER, format!("{base}/users/{{publicId}}")),
        (AGENT_FIRMWARE_UPGRADE, format!("{base}/agents/{{agentId}}/firmware-upgrade")),
    ];
    let data: Vec<Value> = links
        .iter()
        .map(|(rel, href)| json!({"rel": rel, "href": href}))
        .collect();

    server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"status": "success", "data": data}).to_string())
        .create_async()
        .await
}

/// Single-page listing or plain payload in a success envelope
pub fn envelope(data: Value) -> String {
    json!({"status": "success", "data": data, "moreAfter": null}).to_string()
}

/// GET mock on `path` answering with `data`, regardless of query
pub async fn mock_get(server: &mut ServerGuard, path: &str, data: Value) -> Mock {
    server
        .mock("GET", path)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(data))
        .create_async()
        .await
}

/// GET mock on `path` that must never be hit
pub async fn mock_untouched(server: &mut ServerGuard, path: &str) -> Mock {
    server
        .mock("GET", path)
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await
}

pub fn test_client(server: &ServerGuard) -> ResourceClient {
    ResourceClient::new(ClientConfig {
        base_url: format!("{}/", server.url()),
        application_id: "test-app".to_string(),
        token: "test-token".to_string(),
        throttle: Duration::ZERO,
        ..Default::default()
    })
    .unwrap()
}

pub fn device(id: &str, name: &str, type_id: &str, firmware: &str, groups: &[&str]) -> Value {
    let memberships: Vec<Value> = groups
        .iter()
        .map(|g| json!({"group": {"publicId": g}}))
        .collect();
    json!({
        "publicId": id,
        "name": name,
        "serialNumber": format!("SN-{id}"),
        "type": {"publicId": type_id},
        "lastSeenAgentUserAgent": {"firmwareVersion": firmware},
        "mdrServer": {"publicId": "mdr-1"},
        "memberships": memberships
    })
}
