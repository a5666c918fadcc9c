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


//! fwpush - staged firmware rollout for gateway fleets
//!
//! Lists the firmware builds that may be offered (new builds are held for
//! fourteen days), works out which devices the calling user may upgrade and
//! dispatches upgrade commands to them.

pub mod authorization;
pub mod commands;
pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod output;
pub mod release_date;
pub mod rollout;
pub mod selection;
pub mod session;
pub mod version;

#[cfg(test)]
mod test_support;

pub use authorization::{AuthorizationResolver, PermissionIds};
pub use commands::{CommandHandler, CommandRegistry};
pub use config::AppConfig;
pub use error::{FwpushError, Result};
pub use model::{Device, FirmwareArtifact};
pub use orchestrator::UpgradeReport;
pub use release_date::{EnglishDateExtractor, ReleaseDateExtractor};
pub use rollout::{EligibleFirmware, HOLD_DAYS, RolloutStatus};
pub use session::{RolloutSettings, Session};
pub use version::{FirmwareVersion, is_newer};
