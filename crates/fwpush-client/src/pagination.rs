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

//! Drains cursor-paged listings into a single collection

use crate::client::{Page, ResourceClient};
use crate::error::{ClientError, Result};
use crate::query::{PAGE_AFTER, Query};
use serde::de::DeserializeOwned;
use tracing::debug;

impl ResourceClient {
    /// Fetch every page of the listing `name` and concatenate the items in
    /// the order they were received.
    ///
    /// The first request omits `page-after`; each following request carries
    /// the `moreAfter` cursor of the previous response. The listing ends when
    /// a response has no cursor.
    pub async fn drain<T: DeserializeOwned>(
        &self,
        name: &str,
        path: &[(&str, &str)],
        base_query: &Query,
        page_size: u32,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages: u32 = 0;

        loop {
            if let Some(max_pages) = self.max_pages()
                && pages >= max_pages
            {
                return Err(ClientError::PageLimitExceeded {
                    endpoint: name.to_string(),
                    max_pages,
                });
            }

            let mut query = base_query.clone().page_size(page_size);
            match &cursor {
                Some(cursor) => query.insert(PAGE_AFTER, cursor.as_str()),
                None => query.remove(PAGE_AFTER),
            }

            let page: Page<Vec<T>> = self.get(name, path, &query).await?;
            pages += 1;
            items.extend(page.data);

            match page.more_after {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!("Drained {name}: {} items in {pages} pages", items.len());
        Ok(items)
    }
}
