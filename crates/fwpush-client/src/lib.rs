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

//! Discovery-driven client for the device-management REST API
//!
//! Every resource is addressed by a logical name that is looked up in an
//! endpoint catalog fetched once from the API entry point. Responses are
//! wrapped in a `{ "data": ..., "moreAfter": ... }` envelope; listings are
//! paged with an opaque cursor.

pub mod catalog;
pub mod client;
pub mod error;
pub mod pagination;
pub mod query;

pub use catalog::{DiscoveryLink, EndpointCatalog};
pub use client::{ClientConfig, Page, ResourceClient};
pub use error::{ClientError, Result};
pub use query::{Filter, Query};
