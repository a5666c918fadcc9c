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

//! Error types for the resource client

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("discovery failed: {0}")]
    Discovery(String),

    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),

    #[error("missing path parameter '{param}' for endpoint {endpoint}")]
    MissingPathParam { endpoint: String, param: String },

    #[error("malformed URL template for endpoint {endpoint}: {template}")]
    MalformedTemplate { endpoint: String, template: String },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("listing {endpoint} exceeded {max_pages} pages")]
    PageLimitExceeded { endpoint: String, max_pages: u32 },

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
