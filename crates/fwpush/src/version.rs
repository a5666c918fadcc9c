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

//! Firmware version parsing and natural ordering
//!
//! Firmware codes are dotted numbers that are not always strict semver
//! ("2.1", "v3.0.4", "1.9.0-rc.2", "3.2.1b"). Numeric segments compare as
//! numbers, pre-releases follow semver precedence and build metadata is
//! ignored. A suffix semver cannot parse still counts as a pre-release of its
//! numeric release. Codes without a numeric release part sort below
//! everything else.

use semver::Prerelease;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone)]
pub struct FirmwareVersion {
    raw: String,
    kind: Kind,
}

#[derive(Debug, Clone)]
enum Kind {
    Release { segments: Vec<u64>, pre: PreTag },
    Opaque,
}

/// Pre-release part of a structured version
///
/// Suffixes semver rejects ("01", "rc_1") keep their text and rank below
/// every semver pre-release of the same release.
#[derive(Debug, Clone)]
enum PreTag {
    Text(String),
    Semver(Prerelease),
}

impl PreTag {
    fn parse(pre: &str) -> Self {
        match Prerelease::new(pre) {
            Ok(pre) => Self::Semver(pre),
            Err(_) => Self::Text(pre.to_string()),
        }
    }
}

impl Ord for PreTag {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Semver(a), Self::Semver(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Text(_), Self::Semver(_)) => Ordering::Less,
            (Self::Semver(_), Self::Text(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for PreTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PreTag {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for PreTag {}

impl FirmwareVersion {
    pub fn parse(s: &str) -> Self {
        let raw = s.trim().to_string();
        let kind = parse_kind(&raw).unwrap_or(Kind::Opaque);
        Self { raw, kind }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the code could be split into numeric release segments
    pub fn is_structured(&self) -> bool {
        matches!(self.kind, Kind::Release { .. })
    }
}

fn parse_kind(raw: &str) -> Option<Kind> {
    let s = raw.trim_start_matches(['v', 'V']);
    let s = s.split_once('+').map_or(s, |(version, _build)| version);
    let (release, explicit_pre) = match s.split_once('-') {
        Some((release, pre)) => (release, Some(pre)),
        None => (s, None),
    };

    let parts: Vec<&str> = release.split('.').collect();
    let mut segments = Vec::with_capacity(parts.len());
    let mut trailing = None;

    for (i, part) in parts.iter().enumerate() {
        let digits = part.len() - part.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            return None;
        }
        let (number, rest) = part.split_at(digits);
        segments.push(number.parse::<u64>().ok()?);

        if !rest.is_empty() {
            // "3.2.1b" style suffix, only accepted on the last segment
            if i + 1 != parts.len() || explicit_pre.is_some() {
                return None;
            }
            trailing = Some(rest.trim_start_matches(['_', '.', '-']));
        }
    }

    let pre = match explicit_pre.or(trailing) {
        Some("") | None => PreTag::Semver(Prerelease::EMPTY),
        Some(pre) => PreTag::parse(pre),
    };

    Some(Kind::Release { segments, pre })
}

fn compare_segments(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let left = a.get(i).copied().unwrap_or(0);
            let right = b.get(i).copied().unwrap_or(0);
            left.cmp(&right)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

impl Ord for FirmwareVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.kind, &other.kind) {
            (
                Kind::Release { segments, pre },
                Kind::Release {
                    segments: other_segments,
                    pre: other_pre,
                },
            ) => compare_segments(segments, other_segments).then_with(|| pre.cmp(other_pre)),
            (Kind::Release { .. }, Kind::Opaque) => Ordering::Greater,
            (Kind::Opaque, Kind::Release { .. }) => Ordering::Less,
            (Kind::Opaque, Kind::Opaque) => self.raw.cmp(&other.raw),
        }
    }
}

impl PartialOrd for FirmwareVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FirmwareVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for FirmwareVersion {}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Returns true if `remote` is newer than `local`
pub fn is_newer(local: &str, remote: &str) -> bool {
    FirmwareVersion::parse(remote) > FirmwareVersion::parse(local)
}

/// Sort version strings newest first.
pub fn sort_descending(versions: &mut [String]) {
    versions.sort_by_cached_key(|v| std::cmp::Reverse(FirmwareVersion::parse(v)));
}
