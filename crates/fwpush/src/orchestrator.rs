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

//! Dispatch of firmware upgrade commands

use crate::model::endpoints::AGENT_FIRMWARE_UPGRADE;
use crate::model::{Device, FirmwareArtifact};
use fwpush_client::{Query, ResourceClient};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct UpgradeRequest<'a> {
    file: FileRef<'a>,
}

#[derive(Debug, Serialize)]
struct FileRef<'a> {
    #[serde(rename = "publicId")]
    public_id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUpgrade {
    pub device_id: String,
    pub device_name: String,
    pub error: String,
}

/// Outcome of one dispatch run
///
/// A dispatched command only means the service accepted it; installation
/// progress is tracked by the service itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpgradeReport {
    pub firmware_id: String,
    pub version: String,
    pub dispatched: Vec<String>,
    pub failed: Vec<FailedUpgrade>,
}

impl UpgradeReport {
    pub fn all_dispatched(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.dispatched.len() + self.failed.len()
    }
}

/// Send one upgrade command per device, in order.
///
/// A failing device is recorded and the remaining devices are still
/// processed.
pub async fn issue_upgrades(
    client: &ResourceClient,
    firmware: &FirmwareArtifact,
    devices: &[Device],
) -> UpgradeReport {
    let mut report = UpgradeReport {
        firmware_id: firmware.public_id.clone(),
        version: firmware.version.clone(),
        ..Default::default()
    };
    let request = UpgradeRequest {
        file: FileRef {
            public_id: &firmware.public_id,
        },
    };

    for device in devices {
        info!(
            "Upgrading {} ({}) from {} to {}",
            device.name,
            device.public_id,
            device.firmware_version().unwrap_or("unknown"),
            firmware.version
        );

        let result: Result<Value, _> = client
            .post(
                AGENT_FIRMWARE_UPGRADE,
                &[("agentId", device.public_id.as_str())],
                &Query::new(),
                &request,
            )
            .await;

        match result {
            Ok(_) => report.dispatched.push(device.public_id.clone()),
            Err(e) => {
                warn!("Failed to start upgrade of {}: {e}", device.public_id);
                report.failed.push(FailedUpgrade {
                    device_id: device.public_id.clone(),
                    device_name: device.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        "Upgrade commands sent: {} dispatched, {} failed",
        report.dispatched.len(),
        report.failed.len()
    );
    report
}
