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

//! Typed records of the device-management API

use serde::{Deserialize, Serialize};

/// Logical endpoint names as published by the discovery document
pub mod endpoints {
    pub const AGENT_TYPE_LIST: &str = "AgentTypeList";
    pub const AGENT_TYPE_FILE_LIST: &str = "AgentTypeFileList";
    pub const AGENT_LIST: &str = "AgentList";
    pub const ROLE_LIST: &str = "RoleList";
    pub const GROUP_LIST: &str = "GroupList";
    pub const MY_USER: &str = "MyUser";
    pub const USER: &str = "User";
    pub const AGENT_FIRMWARE_UPGRADE: &str = "AgentFirmwareUpgrade";
}

/// `{ "publicId": ... }` link to another resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub public_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentType {
    pub public_id: String,
    pub name: String,
}

/// Raw firmware file as listed under an agent type
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTypeFile {
    pub public_id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Firmware version string
    pub code: String,
    #[serde(default)]
    pub latest: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// An installable firmware build of one agent type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirmwareArtifact {
    pub public_id: String,
    pub agent_type_id: String,
    pub agent_type_name: String,
    pub version: String,
    pub notes: Option<String>,
    pub latest: bool,
}

impl FirmwareArtifact {
    pub fn from_file(agent_type: &AgentType, file: AgentTypeFile) -> Self {
        Self {
            public_id: file.public_id,
            agent_type_id: agent_type.public_id.clone(),
            agent_type_name: agent_type.name.clone(),
            version: file.code,
            notes: file.notes,
            latest: file.latest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub public_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub permissions: Option<Vec<Reference>>,
}

impl Role {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .as_ref()
            .is_some_and(|perms| perms.iter().any(|p| p.public_id == permission))
    }
}

/// A group; bound to a single agent when it is device scoped
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub public_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub agent: Option<Reference>,
}

/// A (role, group) pair held by a user
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Membership {
    #[serde(default)]
    pub group: Option<Reference>,
    #[serde(default)]
    pub role: Option<Reference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub public_id: String,
    #[serde(default)]
    pub memberships: Option<Vec<Membership>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAgentInfo {
    #[serde(default)]
    pub firmware_version: Option<String>,
}

/// Group membership of an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMembership {
    #[serde(default)]
    pub group: Option<Reference>,
}

/// A managed gateway (agent)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub public_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(rename = "type", default)]
    pub agent_type: Option<Reference>,
    #[serde(default)]
    pub last_seen_agent_user_agent: Option<UserAgentInfo>,
    /// Management channel server; absent while the device is offline
    #[serde(default)]
    pub mdr_server: Option<Reference>,
    #[serde(default)]
    pub memberships: Option<Vec<AgentMembership>>,
}

impl Device {
    pub fn agent_type_id(&self) -> Option<&str> {
        self.agent_type.as_ref().map(|t| t.public_id.as_str())
    }

    pub fn firmware_version(&self) -> Option<&str> {
        self.last_seen_agent_user_agent
            .as_ref()
            .and_then(|ua| ua.firmware_version.as_deref())
    }

    /// Whether the device has an active management channel
    pub fn is_reachable(&self) -> bool {
        self.mdr_server.is_some()
    }

    pub fn is_member_of(&self, group_id: &str) -> bool {
        self.memberships.as_ref().is_some_and(|memberships| {
            memberships
                .iter()
                .filter_map(|m| m.group.as_ref())
                .any(|g| g.public_id == group_id)
        })
    }
}
