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

//! Which devices the calling user may upgrade
//!
//! Authority comes from roles. A role that is company wide and grants device
//! management covers every device; otherwise each membership of a granting
//! role covers either the one device bound to a device-scoped group or every
//! device in a general group.

use crate::error::Result;
use crate::model::endpoints::{AGENT_LIST, GROUP_LIST, MY_USER, ROLE_LIST, USER};
use crate::model::{Device, Group, Membership, Reference, Role, User};
use fwpush_client::{Filter, Query, ResourceClient};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

const DEVICE_FIELDS: &str = "publicId,name,serialNumber,type.publicId,type.name,\
lastSeenAgentUserAgent.firmwareVersion,mdrServer.publicId,memberships.group.publicId";

/// Permission identifiers that carry authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionIds {
    /// Full authority over the company
    #[serde(default = "default_company_admin")]
    pub company_admin: String,
    /// Broadens every permission of the same role to the whole company
    #[serde(default = "default_company_wide")]
    pub company_wide: String,
    /// Allows firmware upgrades
    #[serde(default = "default_manage_devices")]
    pub manage_devices: String,
}

fn default_company_admin() -> String {
    "COMPANY_ADMIN".to_owned()
}

fn default_company_wide() -> String {
    "COMPANY_WIDE_ROLE".to_owned()
}

fn default_manage_devices() -> String {
    "MANAGE_AGENT".to_owned()
}

impl Default for PermissionIds {
    fn default() -> Self {
        Self {
            company_admin: default_company_admin(),
            company_wide: default_company_wide(),
            manage_devices: default_manage_devices(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleClass {
    pub company_admin: bool,
    pub company_wide_scope: bool,
    pub manages_devices: bool,
}

impl RoleClass {
    /// `None` for roles without a permission list.
    pub fn classify(role: &Role, permissions: &PermissionIds) -> Option<Self> {
        role.permissions.as_ref()?;
        let company_admin = role.has_permission(&permissions.company_admin);
        Some(Self {
            company_admin,
            company_wide_scope: company_admin || role.has_permission(&permissions.company_wide),
            manages_devices: company_admin || role.has_permission(&permissions.manage_devices),
        })
    }

    pub fn manages_all_devices(&self) -> bool {
        self.company_wide_scope && self.manages_devices
    }
}

#[derive(Debug)]
pub struct AuthorizationResolver<'a> {
    permissions: &'a PermissionIds,
    page_size: u32,
}

impl<'a> AuthorizationResolver<'a> {
    pub fn new(permissions: &'a PermissionIds, page_size: u32) -> Self {
        Self {
            permissions,
            page_size,
        }
    }

    /// Devices with an active management channel that the user may upgrade.
    ///
    /// Sorted by name when the user has company-wide authority, in match
    /// order otherwise.
    pub async fn authorized_devices(&self, client: &ResourceClient) -> Result<Vec<Device>> {
        let roles: Vec<Role> = client
            .drain(
                ROLE_LIST,
                &[],
                &Query::new().fields("publicId,name,permissions.publicId"),
                self.page_size,
            )
            .await?;

        let mut granting_roles = HashSet::new();
        let mut company_wide = false;
        for role in &roles {
            let Some(class) = RoleClass::classify(role, self.permissions) else {
                debug!("Role {} has no permissions, skipping", role.public_id);
                continue;
            };
            if class.manages_devices {
                granting_roles.insert(role.public_id.clone());
            }
            company_wide |= class.manages_all_devices();
        }

        if granting_roles.is_empty() {
            info!("No role grants device management");
            return Ok(Vec::new());
        }

        let mut devices = fetch_reachable_devices(client, self.page_size).await?;

        if company_wide {
            devices.sort_by(|a, b| a.name.cmp(&b.name));
            info!("Company-wide authority over {} devices", devices.len());
            return Ok(devices);
        }

        let groups: Vec<Group> = client
            .drain(
                GROUP_LIST,
                &[],
                &Query::new().fields("publicId,name,agent.publicId"),
                self.page_size,
            )
            .await?;
        let device_groups: HashMap<String, String> = groups
            .into_iter()
            .filter_map(|group| Some((group.public_id, group.agent?.public_id)))
            .collect();

        let me: Reference = client
            .get_data(MY_USER, &[], &Query::new().fields("publicId"))
            .await?;
        let user: User = client
            .get_data(
                USER,
                &[("publicId", me.public_id.as_str())],
                &Query::new().fields("publicId,memberships.group.publicId,memberships.role.publicId"),
            )
            .await?;

        let authorized = resolve_memberships(
            user.memberships.as_deref().unwrap_or_default(),
            &granting_roles,
            &device_groups,
            devices,
        );
        info!("Authorized for {} devices", authorized.len());
        Ok(authorized)
    }
}

/// Every device that currently has a management channel
pub async fn fetch_reachable_devices(
    client: &ResourceClient,
    page_size: u32,
) -> Result<Vec<Device>> {
    let query = Query::new()
        .fields(DEVICE_FIELDS)
        .filter(&Filter::is_not_null("mdrServer.publicId"));
    let devices: Vec<Device> = client.drain(AGENT_LIST, &[], &query, page_size).await?;
    Ok(devices.into_iter().filter(Device::is_reachable).collect())
}

/// Move devices covered by granting memberships out of `pool`.
///
/// A device claimed by one membership is no longer available to later
/// memberships.
pub fn resolve_memberships(
    memberships: &[Membership],
    granting_roles: &HashSet<String>,
    device_groups: &HashMap<String, String>,
    mut pool: Vec<Device>,
) -> Vec<Device> {
    let mut authorized = Vec::new();

    for membership in memberships {
        let (Some(role), Some(group)) = (&membership.role, &membership.group) else {
            continue;
        };
        if !granting_roles.contains(&role.public_id) {
            continue;
        }

        if let Some(device_id) = device_groups.get(&group.public_id) {
            if let Some(index) = pool.iter().position(|d| &d.public_id == device_id) {
                authorized.push(pool.remove(index));
            }
        } else {
            let (matched, rest): (Vec<Device>, Vec<Device>) = std::mem::take(&mut pool)
                .into_iter()
                .partition(|d| d.is_member_of(&group.public_id));
            pool = rest;
            authorized.extend(matched);
        }
    }

    authorized
}
