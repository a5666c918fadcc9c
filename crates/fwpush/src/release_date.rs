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

//! Release date extraction from free-text firmware notes

use chrono::NaiveDate;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Finds the release date of a firmware build in its release notes
pub trait ReleaseDateExtractor: Send + Sync + std::fmt::Debug {
    fn extract(&self, text: &str) -> Option<NaiveDate>;
}

/// Extracts the first recognizable English calendar date
///
/// Understands ISO dates (`2024-03-05`, `2024/03/05`), spelled-out months
/// (`5 March 2024`, `5th of March, 2024`, `March 5, 2024`, `Mar 5th 2024`)
/// and day-first numeric dates (`05-03-2024`, `05.03.2024`, `05/03/2024`).
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishDateExtractor;

const MONTH: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\b\.?";
const ORDINAL: &str = r"(?:st|nd|rd|th)?";

static ISO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})\b").expect("valid ISO date regex")
});

static DAY_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}}){ORDINAL}(?:\s+of)?\s+{MONTH},?\s+(\d{{4}})\b"
    ))
    .expect("valid day-month-year regex")
});

static MONTH_DAY_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b{MONTH}\s+(\d{{1,2}}){ORDINAL},?\s+(\d{{4}})\b"
    ))
    .expect("valid month-day-year regex")
});

static NUMERIC_DAY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})[-/.](\d{1,2})[-/.](\d{4})\b").expect("valid numeric date regex")
});

impl ReleaseDateExtractor for EnglishDateExtractor {
    fn extract(&self, text: &str) -> Option<NaiveDate> {
        let candidates = [
            first_match(&ISO, text, |c| ymd(&c[1], &c[2], &c[3])),
            first_match(&DAY_MONTH_YEAR, text, |c| {
                ymd(&c[3], &month_number(&c[2])?.to_string(), &c[1])
            }),
            first_match(&MONTH_DAY_YEAR, text, |c| {
                ymd(&c[3], &month_number(&c[1])?.to_string(), &c[2])
            }),
            first_match(&NUMERIC_DAY_FIRST, text, |c| ymd(&c[3], &c[2], &c[1])),
        ];

        candidates
            .into_iter()
            .flatten()
            .min_by_key(|(position, _)| *position)
            .map(|(_, date)| date)
    }
}

/// Earliest match of `regex` that forms a valid calendar date, with its offset
fn first_match(
    regex: &Regex,
    text: &str,
    to_date: impl Fn(&Captures<'_>) -> Option<NaiveDate>,
) -> Option<(usize, NaiveDate)> {
    regex
        .captures_iter(text)
        .find_map(|c| Some((c.get(0)?.start(), to_date(&c)?)))
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
