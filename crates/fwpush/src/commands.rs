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

//! Named commands that a host can invoke on a session
//!
//! Each handler takes the session and a JSON argument object and returns a
//! JSON result.

use crate::error::{FwpushError, Result};
use crate::session::Session;
use async_trait::async_trait;
use fwpush_client::ClientError;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;

pub const LIST_FIRMWARE: &str = "list-firmware";
pub const AUTHORIZED_DEVICES: &str = "authorized-devices";
pub const SELECT_FIRMWARE: &str = "select-firmware";
pub const INSTALL_FIRMWARE: &str = "install-firmware";

#[async_trait]
pub trait CommandHandler: Send + Sync + fmt::Debug {
    async fn call(&self, session: &mut Session, args: Value) -> Result<Value>;
}

#[derive(Debug, Default)]
pub struct CommandRegistry {
    handlers: BTreeMap<String, Box<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the rollout commands registered
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(LIST_FIRMWARE, ListFirmware);
        registry.register(AUTHORIZED_DEVICES, AuthorizedDevices);
        registry.register(SELECT_FIRMWARE, SelectFirmware);
        registry.register(INSTALL_FIRMWARE, InstallFirmware);
        registry
    }

    /// Register `handler` under `name`, replacing any previous handler.
    pub fn register(&mut self, name: impl Into<String>, handler: impl CommandHandler + 'static) {
        self.handlers.insert(name.into(), Box::new(handler));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub async fn dispatch(&self, name: &str, session: &mut Session, args: Value) -> Result<Value> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| FwpushError::UnknownCommand(name.to_string()))?;
        handler.call(session, args).await
    }
}

/// Deserialize command arguments; `null` counts as an empty object.
fn parse_args<T: DeserializeOwned>(command: &str, args: Value) -> Result<T> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| FwpushError::InvalidArguments {
        command: command.to_string(),
        reason: e.to_string(),
    })
}

fn to_value(result: impl Serialize) -> Result<Value> {
    Ok(serde_json::to_value(result).map_err(ClientError::from)?)
}

#[derive(Debug)]
struct ListFirmware;

#[async_trait]
impl CommandHandler for ListFirmware {
    async fn call(&self, session: &mut Session, _args: Value) -> Result<Value> {
        let firmware = session.list_firmware().await?;
        to_value(firmware)
    }
}

#[derive(Debug)]
struct AuthorizedDevices;

#[async_trait]
impl CommandHandler for AuthorizedDevices {
    async fn call(&self, session: &mut Session, _args: Value) -> Result<Value> {
        let devices = session.authorized_devices().await?;
        to_value(devices)
    }
}

#[derive(Debug, Deserialize)]
struct SelectArgs {
    version: String,
    #[serde(default)]
    agent_type: Option<String>,
}

#[derive(Debug)]
struct SelectFirmware;

#[async_trait]
impl CommandHandler for SelectFirmware {
    async fn call(&self, session: &mut Session, args: Value) -> Result<Value> {
        let args: SelectArgs = parse_args(SELECT_FIRMWARE, args)?;
        let devices = session
            .select_firmware(&args.version, args.agent_type.as_deref())
            .await?;
        to_value(devices)
    }
}

#[derive(Debug, Default, Deserialize)]
struct InstallArgs {
    #[serde(default)]
    devices: Vec<String>,
}

#[derive(Debug)]
struct InstallFirmware;

#[async_trait]
impl CommandHandler for InstallFirmware {
    async fn call(&self, session: &mut Session, args: Value) -> Result<Value> {
        let args: InstallArgs = parse_args(INSTALL_FIRMWARE, args)?;
        let report = session.install_selected(&args.devices).await?;
        Ok(json!({
            "started": true,
            "report": report,
        }))
    }
}
