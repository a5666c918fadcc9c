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

//! Candidate devices for a firmware build

use crate::model::{Device, FirmwareArtifact};

/// Devices of the build's agent type that are reachable and not already
/// running the build, sorted by name.
pub fn select_devices(target: &FirmwareArtifact, devices: &[Device]) -> Vec<Device> {
    let mut selected: Vec<Device> = devices
        .iter()
        .filter(|d| d.agent_type_id() == Some(target.agent_type_id.as_str()))
        .filter(|d| d.firmware_version() != Some(target.version.as_str()))
        .filter(|d| d.is_reachable())
        .cloned()
        .collect();
    selected.sort_by(|a, b| a.name.cmp(&b.name));
    selected
}
