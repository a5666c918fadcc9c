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

//! Query string conventions of the API: projection, filters and paging

use std::fmt;

pub const FIELDS: &str = "fields";
pub const FILTERS: &str = "filters";
pub const PAGE_SIZE: &str = "page-size";
pub const PAGE_AFTER: &str = "page-after";

/// Ordered set of query parameters
///
/// Setting a key that is already present replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.params.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.params.retain(|(k, _)| k != key);
    }

    /// Comma separated field projection, e.g. `publicId,name,type.publicId`
    pub fn fields(self, fields: &str) -> Self {
        self.set(FIELDS, fields)
    }

    pub fn filter(self, filter: &Filter) -> Self {
        self.set(FILTERS, filter.to_string())
    }

    pub fn page_size(self, size: u32) -> Self {
        self.set(PAGE_SIZE, size.to_string())
    }

    pub fn page_after(self, cursor: &str) -> Self {
        self.set(PAGE_AFTER, cursor)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.params
    }
}

/// Server-side predicate expression for the `filters` parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter(String);

impl Filter {
    pub fn eq(field: &str, value: &str) -> Self {
        Self(format!("eq({field},{})", quote(value)))
    }

    pub fn ne(field: &str, value: &str) -> Self {
        Self(format!("ne({field},{})", quote(value)))
    }

    pub fn is_null(field: &str) -> Self {
        Self(format!("isnull({field})"))
    }

    pub fn is_not_null(field: &str) -> Self {
        Self(format!("isnotnull({field})"))
    }

    pub fn in_set<'a>(field: &str, values: impl IntoIterator<Item = &'a str>) -> Self {
        let values: Vec<String> = values.into_iter().map(quote).collect();
        Self(format!("in({field},{})", values.join(",")))
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        let parts: Vec<String> = filters.into_iter().map(|f| f.0).collect();
        Self(format!("and({})", parts.join(",")))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\\\""))
}
