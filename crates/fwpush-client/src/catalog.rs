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

//! Endpoint catalog built from the discovery document

use crate::error::{ClientError, Result};
use serde::Deserialize;
use std::collections::HashMap;

/// One `{rel, href}` entry of the discovery document
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DiscoveryLink {
    pub rel: String,
    pub href: String,
}

/// Logical endpoint name -> URL template
///
/// Templates carry named placeholders such as `{publicId}` which are filled
/// from the path parameters of a request.
#[derive(Debug, Clone, Default)]
pub struct EndpointCatalog {
    endpoints: HashMap<String, String>,
}

impl EndpointCatalog {
    pub fn from_links(links: impl IntoIterator<Item = DiscoveryLink>) -> Self {
        let endpoints = links
            .into_iter()
            .map(|link| (link.rel, link.href))
            .collect();
        Self { endpoints }
    }

    pub fn template(&self, name: &str) -> Option<&str> {
        self.endpoints.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Endpoint names in alphabetical order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.endpoints.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve `name` and substitute `params` into its template.
    ///
    /// Parameters that the template does not reference are ignored.
    pub fn resolve(&self, name: &str, params: &[(&str, &str)]) -> Result<String> {
        let template = self
            .template(name)
            .ok_or_else(|| ClientError::UnknownEndpoint(name.to_string()))?;
        expand(name, template, params)
    }
}

fn expand(endpoint: &str, template: &str, params: &[(&str, &str)]) -> Result<String> {
    let mut url = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        url.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            return Err(ClientError::MalformedTemplate {
                endpoint: endpoint.to_string(),
                template: template.to_string(),
            });
        };

        let placeholder = &after[..end];
        let value = params
            .iter()
            .find(|(key, _)| *key == placeholder)
            .map(|(_, value)| *value)
            .ok_or_else(|| ClientError::MissingPathParam {
                endpoint: endpoint.to_string(),
                param: placeholder.to_string(),
            })?;
        url.push_str(&urlencoding::encode(value));
        rest = &after[end + 1..];
    }

    url.push_str(rest);
    Ok(url)
}
