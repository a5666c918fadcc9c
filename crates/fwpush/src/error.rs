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

//! Error types for the rollout crate

use fwpush_client::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FwpushError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("no release date found in notes of firmware {version} ({artifact})")]
    ReleaseDateUnparsable { artifact: String, version: String },

    #[error("firmware version {0} is not offered")]
    UnknownVersion(String),

    #[error("firmware version {version} exists for several agent types ({}), pick one", agent_types.join(", "))]
    AmbiguousVersion {
        version: String,
        agent_types: Vec<String>,
    },

    #[error("firmware version {version} is on hold for {days_remaining} more days")]
    RolloutHeld { version: String, days_remaining: i64 },

    #[error("no firmware selected")]
    NothingSelected,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("invalid arguments for {command}: {reason}")]
    InvalidArguments { command: String, reason: String },

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FwpushError>;
