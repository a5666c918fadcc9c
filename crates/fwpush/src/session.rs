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

//! Per-operator rollout session
//!
//! Holds what an operator has seen and chosen between steps: the evaluated
//! firmware list, the selected build and the devices it would be installed
//! on.

use crate::authorization::{AuthorizationResolver, PermissionIds};
use crate::error::{FwpushError, Result};
use crate::model::Device;
use crate::orchestrator::{UpgradeReport, issue_upgrades};
use crate::release_date::{EnglishDateExtractor, ReleaseDateExtractor};
use crate::rollout::{EligibleFirmware, RolloutEvaluator};
use crate::selection::select_devices;
use chrono::{NaiveDate, Utc};
use fwpush_client::ResourceClient;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Rollout knobs shared by every step of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloutSettings {
    /// Agent type names whose firmware is offered
    #[serde(default = "default_agent_types")]
    pub agent_types: Vec<String>,
    /// Page size used for every listing
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_agent_types() -> Vec<String> {
    vec!["IXrouter2".to_owned(), "IXrouter3".to_owned()]
}

fn default_page_size() -> u32 {
    1000
}

impl Default for RolloutSettings {
    fn default() -> Self {
        Self {
            agent_types: default_agent_types(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug)]
pub struct Session {
    client: ResourceClient,
    settings: RolloutSettings,
    permissions: PermissionIds,
    extractor: Box<dyn ReleaseDateExtractor>,
    today: Option<NaiveDate>,
    firmware: Vec<EligibleFirmware>,
    target: Option<EligibleFirmware>,
    selected: Vec<Device>,
}

impl Session {
    pub fn new(client: ResourceClient, settings: RolloutSettings, permissions: PermissionIds) -> Self {
        Self {
            client,
            settings,
            permissions,
            extractor: Box::new(EnglishDateExtractor),
            today: None,
            firmware: Vec::new(),
            target: None,
            selected: Vec::new(),
        }
    }

    pub fn with_extractor(mut self, extractor: impl ReleaseDateExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    /// Evaluate hold windows against a fixed date instead of the UTC date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn client(&self) -> &ResourceClient {
        &self.client
    }

    pub fn firmware(&self) -> &[EligibleFirmware] {
        &self.firmware
    }

    pub fn target(&self) -> Option<&EligibleFirmware> {
        self.target.as_ref()
    }

    pub fn selected_devices(&self) -> &[Device] {
        &self.selected
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Re-evaluate the firmware builds that may be offered, newest first.
    pub async fn list_firmware(&mut self) -> Result<&[EligibleFirmware]> {
        let evaluator = RolloutEvaluator::new(
            self.extractor.as_ref(),
            &self.settings.agent_types,
            self.settings.page_size,
        );
        self.firmware = evaluator.eligible_firmware(&self.client, self.today()).await?;
        Ok(&self.firmware)
    }

    pub async fn authorized_devices(&self) -> Result<Vec<Device>> {
        AuthorizationResolver::new(&self.permissions, self.settings.page_size)
            .authorized_devices(&self.client)
            .await
    }

    /// Choose the build to install and collect the devices it applies to.
    ///
    /// `agent_type` names the agent type when several types publish the same
    /// version. Evaluates the firmware list first if this session has not
    /// done so.
    pub async fn select_firmware(
        &mut self,
        version: &str,
        agent_type: Option<&str>,
    ) -> Result<&[Device]> {
        if self.firmware.is_empty() {
            self.list_firmware().await?;
        }

        let candidates: Vec<&EligibleFirmware> = self
            .firmware
            .iter()
            .filter(|f| f.artifact.version == version)
            .filter(|f| agent_type.is_none_or(|name| f.artifact.agent_type_name == name))
            .collect();
        let target = match candidates.as_slice() {
            [] => return Err(FwpushError::UnknownVersion(version.to_string())),
            [target] => (*target).clone(),
            several => {
                return Err(FwpushError::AmbiguousVersion {
                    version: version.to_string(),
                    agent_types: several
                        .iter()
                        .map(|f| f.artifact.agent_type_name.clone())
                        .collect(),
                });
            }
        };

        if !target.status.allowed {
            return Err(FwpushError::RolloutHeld {
                version: version.to_string(),
                days_remaining: target.status.days_remaining.unwrap_or_default(),
            });
        }

        let authorized = self.authorized_devices().await?;
        self.selected = select_devices(&target.artifact, &authorized);
        info!(
            "{} devices can be upgraded to {} {}",
            self.selected.len(),
            target.artifact.agent_type_name,
            target.artifact.version
        );
        self.target = Some(target);
        Ok(&self.selected)
    }

    /// Upgrade the selected devices.
    ///
    /// `only` restricts the batch to the given device ids; an empty slice
    /// means every selected device.
    pub async fn install_selected(&self, only: &[String]) -> Result<UpgradeReport> {
        let target = self.target.as_ref().ok_or(FwpushError::NothingSelected)?;

        let confirmed: Vec<Device> = self
            .selected
            .iter()
            .filter(|d| only.is_empty() || only.contains(&d.public_id))
            .cloned()
            .collect();
        for id in only {
            if !confirmed.iter().any(|d| &d.public_id == id) {
                warn!("Device {id} is not part of the selection, ignoring");
            }
        }

        Ok(issue_upgrades(&self.client, &target.artifact, &confirmed).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{device, mock_discovery, mock_get, test_client};
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn session(server: &ServerGuard) -> Session {
        let settings = RolloutSettings {
            agent_types: vec!["IXrouter3".to_string()],
            page_size: 50,
        };
        Session::new(test_client(server), settings, PermissionIds::default()).with_today(today())
    }

    async fn mock_catalog(server: &mut ServerGuard) -> Vec<mockito::Mock> {
        vec![
            mock_discovery(server).await,
            mock_get(server, "/v2/agent-types", json!([{"publicId": "t3", "name": "IXrouter3"}]))
                .await,
            mock_get(
                server,
                "/v2/agent-types/t3/files",
                json!([
                    {"publicId": "fw-32", "code": "3.2.0", "latest": true, "notes": "Released 2025-06-25"},
                    {"publicId": "fw-31", "code": "3.1.0", "latest": false, "notes": "Released 2025-05-01"},
                    {"publicId": "fw-30", "code": "3.0.0", "latest": false, "notes": "legacy build"}
                ]),
            )
            .await,
            mock_get(
                server,
                "/v2/roles",
                json!([{"publicId": "admin", "permissions": [{"publicId": "COMPANY_ADMIN"}]}]),
            )
            .await,
            mock_get(
                server,
                "/v2/agents",
                json!([
                    device("d2", "Bravo", "t3", "3.1.0", &[]),
                    device("d1", "Alpha", "t3", "3.0.0", &[]),
                    device("d3", "Charlie", "t3", "2.9.0", &[]),
                ]),
            )
            .await,
        ]
    }

    #[tokio::test]
    async fn test_list_firmware() {
        let mut server = Server::new_async().await;
        let _mocks = mock_catalog(&mut server).await;
        let mut session = session(&server);

        let firmware = session.list_firmware().await.unwrap();

        let versions: Vec<&str> = firmware.iter().map(|f| f.artifact.version.as_str()).collect();
        assert_eq!(versions, vec!["3.2.0", "3.1.0", "3.0.0"]);
        assert_eq!(firmware[0].status.days_remaining, Some(9));
        assert!(firmware[1].status.allowed);
        assert!(firmware[2].status.allowed);
    }

    #[tokio::test]
    async fn test_select_and_install() {
        let mut server = Server::new_async().await;
        let _mocks = mock_catalog(&mut server).await;
        let upgrade_d1 = server
            .mock("POST", "/v2/agents/d1/firmware-upgrade")
            .match_body(Matcher::Json(json!({"file": {"publicId": "fw-31"}})))
            .with_status(200)
            .with_body(json!({"status": "success", "data": null}).to_string())
            .create_async()
            .await;
        let upgrade_d3 = server
            .mock("POST", "/v2/agents/d3/firmware-upgrade")
            .with_status(200)
            .with_body(json!({"status": "success", "data": null}).to_string())
            .create_async()
            .await;
        let mut session = session(&server);

        let selected = session.select_firmware("3.1.0", None).await.unwrap();
        let names: Vec<&str> = selected.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Charlie"]);

        let report = session.install_selected(&[]).await.unwrap();
        assert_eq!(report.dispatched, vec!["d1", "d3"]);
        assert!(report.all_dispatched());
        upgrade_d1.assert_async().await;
        upgrade_d3.assert_async().await;
    }

    #[tokio::test]
    async fn test_install_subset() {
        let mut server = Server::new_async().await;
        let _mocks = mock_catalog(&mut server).await;
        let upgrade_d3 = server
            .mock("POST", "/v2/agents/d3/firmware-upgrade")
            .with_status(200)
            .with_body(json!({"status": "success", "data": null}).to_string())
            .create_async()
            .await;
        let upgrade_d1 = server
            .mock("POST", "/v2/agents/d1/firmware-upgrade")
            .expect(0)
            .create_async()
            .await;
        let mut session = session(&server);

        session.select_firmware("3.1.0", None).await.unwrap();
        let report = session
            .install_selected(&["d3".to_string(), "d2".to_string()])
            .await
            .unwrap();

        assert_eq!(report.dispatched, vec!["d3"]);
        upgrade_d3.assert_async().await;
        upgrade_d1.assert_async().await;
    }

    #[tokio::test]
    async fn test_held_version_cannot_be_selected() {
        let mut server = Server::new_async().await;
        let _mocks = mock_catalog(&mut server).await;
        let mut session = session(&server);

        let result = session.select_firmware("3.2.0", None).await;
        assert!(matches!(
            result,
            Err(FwpushError::RolloutHeld { days_remaining: 9, .. })
        ));
        assert!(session.target().is_none());
    }

    #[tokio::test]
    async fn test_version_shared_by_two_agent_types() {
        let mut server = Server::new_async().await;
        let _discovery = mock_discovery(&mut server).await;
        let _types = mock_get(
            &mut server,
            "/v2/agent-types",
            json!([
                {"publicId": "t2", "name": "IXrouter2"},
                {"publicId": "t3", "name": "IXrouter3"}
            ]),
        )
        .await;
        let _files_t2 = mock_get(
            &mut server,
            "/v2/agent-types/t2/files",
            json!([{"publicId": "fw2-31", "code": "3.1.0", "latest": true, "notes": "Released 2025-05-01"}]),
        )
        .await;
        let _files_t3 = mock_get(
            &mut server,
            "/v2/agent-types/t3/files",
            json!([{"publicId": "fw3-31", "code": "3.1.0", "latest": true, "notes": "Released 2025-05-01"}]),
        )
        .await;
        let _roles = mock_get(
            &mut server,
            "/v2/roles",
            json!([{"publicId": "admin", "permissions": [{"publicId": "COMPANY_ADMIN"}]}]),
        )
        .await;
        let _agents = mock_get(
            &mut server,
            "/v2/agents",
            json!([
                device("d2", "Two", "t2", "3.0.0", &[]),
                device("d3", "Three", "t3", "3.0.0", &[]),
            ]),
        )
        .await;
        let settings = RolloutSettings {
            agent_types: vec!["IXrouter2".to_string(), "IXrouter3".to_string()],
            page_size: 50,
        };
        let mut session =
            Session::new(test_client(&server), settings, PermissionIds::default()).with_today(today());

        let result = session.select_firmware("3.1.0", None).await;
        assert!(matches!(
            result,
            Err(FwpushError::AmbiguousVersion { ref agent_types, .. })
                if agent_types == &["IXrouter2", "IXrouter3"]
        ));
        assert!(session.target().is_none());

        let selected = session.select_firmware("3.1.0", Some("IXrouter3")).await.unwrap();
        let ids: Vec<&str> = selected.iter().map(|d| d.public_id.as_str()).collect();
        assert_eq!(ids, vec!["d3"]);
        assert_eq!(session.target().unwrap().artifact.public_id, "fw3-31");
    }

    #[tokio::test]
    async fn test_unknown_version() {
        let mut server = Server::new_async().await;
        let _mocks = mock_catalog(&mut server).await;
        let mut session = session(&server);

        let result = session.select_firmware("9.9.9", None).await;
        assert!(matches!(result, Err(FwpushError::UnknownVersion(v)) if v == "9.9.9"));
    }

    #[tokio::test]
    async fn test_install_without_selection() {
        let server = Server::new_async().await;
        let session = session(&server);

        let result = session.install_selected(&[]).await;
        assert!(matches!(result, Err(FwpushError::NothingSelected)));
    }
}
