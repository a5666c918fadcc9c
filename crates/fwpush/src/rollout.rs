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

//! Rollout eligibility of firmware builds
//!
//! A new build is held back for [`HOLD_DAYS`] days after its release date so
//! field reports can come in before it is offered for mass deployment. Once
//! one build of an agent type has cleared the hold, every older build of that
//! type is considered vetted.

use crate::error::{FwpushError, Result};
use crate::model::endpoints::{AGENT_TYPE_FILE_LIST, AGENT_TYPE_LIST};
use crate::model::{AgentType, AgentTypeFile, FirmwareArtifact};
use crate::release_date::ReleaseDateExtractor;
use crate::version::FirmwareVersion;
use chrono::NaiveDate;
use fwpush_client::{Query, ResourceClient};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::{debug, info, warn};

pub const HOLD_DAYS: i64 = 14;

/// Hold period that starts at a build's release date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolloutWindow {
    pub release_date: NaiveDate,
}

impl RolloutWindow {
    pub fn new(release_date: NaiveDate) -> Self {
        Self { release_date }
    }

    pub fn elapsed_days(&self, today: NaiveDate) -> i64 {
        (today - self.release_date).num_days()
    }

    pub fn status(&self, today: NaiveDate) -> RolloutStatus {
        let elapsed = self.elapsed_days(today);
        if elapsed < HOLD_DAYS {
            RolloutStatus {
                allowed: false,
                days_remaining: Some(HOLD_DAYS - elapsed),
            }
        } else {
            RolloutStatus::CLEARED
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RolloutStatus {
    pub allowed: bool,
    pub days_remaining: Option<i64>,
}

impl RolloutStatus {
    pub const CLEARED: Self = Self {
        allowed: true,
        days_remaining: None,
    };
}

/// A firmware build together with its rollout status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibleFirmware {
    #[serde(flatten)]
    pub artifact: FirmwareArtifact,
    #[serde(flatten)]
    pub status: RolloutStatus,
}

#[derive(Debug, Default, Clone, Copy)]
struct TypeProgress {
    latest_emitted: bool,
    hold_cleared: bool,
}

/// Decide which builds may be offered, newest first.
///
/// Non-latest builds of a type are skipped until that type's latest build
/// has been seen. Builds of a type whose hold already cleared skip the
/// release date lookup entirely.
pub fn evaluate(
    mut artifacts: Vec<FirmwareArtifact>,
    extractor: &dyn ReleaseDateExtractor,
    today: NaiveDate,
) -> Result<Vec<EligibleFirmware>> {
    artifacts.sort_by_cached_key(|a| Reverse(FirmwareVersion::parse(&a.version)));

    let mut progress: HashMap<String, TypeProgress> = HashMap::new();
    let mut eligible = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        let type_progress = progress.entry(artifact.agent_type_id.clone()).or_default();

        if !artifact.latest && !type_progress.latest_emitted {
            debug!(
                "Skipping {} {}: latest build of the type not seen yet",
                artifact.agent_type_name, artifact.version
            );
            continue;
        }
        if artifact.latest {
            type_progress.latest_emitted = true;
        }

        let status = if type_progress.hold_cleared {
            RolloutStatus::CLEARED
        } else {
            let release_date = artifact
                .notes
                .as_deref()
                .and_then(|notes| extractor.extract(notes))
                .ok_or_else(|| FwpushError::ReleaseDateUnparsable {
                    artifact: artifact.public_id.clone(),
                    version: artifact.version.clone(),
                })?;
            let status = RolloutWindow::new(release_date).status(today);
            if status.allowed {
                type_progress.hold_cleared = true;
            }
            status
        };

        eligible.push(EligibleFirmware { artifact, status });
    }

    Ok(eligible)
}

/// Fetches firmware builds for the configured agent types and evaluates them
#[derive(Debug)]
pub struct RolloutEvaluator<'a> {
    extractor: &'a dyn ReleaseDateExtractor,
    agent_types: &'a [String],
    page_size: u32,
}

impl<'a> RolloutEvaluator<'a> {
    pub fn new(
        extractor: &'a dyn ReleaseDateExtractor,
        agent_types: &'a [String],
        page_size: u32,
    ) -> Self {
        Self {
            extractor,
            agent_types,
            page_size,
        }
    }

    pub async fn eligible_firmware(
        &self,
        client: &ResourceClient,
        today: NaiveDate,
    ) -> Result<Vec<EligibleFirmware>> {
        let artifacts = self.fetch_artifacts(client).await?;
        let eligible = evaluate(artifacts, self.extractor, today)?;
        info!("{} firmware builds eligible for offering", eligible.len());
        Ok(eligible)
    }

    /// All firmware builds of the configured agent types, in listing order
    pub async fn fetch_artifacts(&self, client: &ResourceClient) -> Result<Vec<FirmwareArtifact>> {
        let types: Vec<AgentType> = client
            .drain(
                AGENT_TYPE_LIST,
                &[],
                &Query::new().fields("publicId,name"),
                self.page_size,
            )
            .await?;

        let mut artifacts = Vec::new();
        for wanted in self.agent_types {
            let Some(agent_type) = types.iter().find(|t| &t.name == wanted) else {
                warn!("Agent type {wanted} not found, skipping");
                continue;
            };

            let files: Vec<AgentTypeFile> = client
                .drain(
                    AGENT_TYPE_FILE_LIST,
                    &[("publicId", agent_type.public_id.as_str())],
                    &Query::new().fields("publicId,name,code,latest,notes"),
                    self.page_size,
                )
                .await?;
            debug!("{} firmware builds for {}", files.len(), agent_type.name);

            artifacts.extend(
                files
                    .into_iter()
                    .map(|file| FirmwareArtifact::from_file(agent_type, file)),
            );
        }

        Ok(artifacts)
    }
}
