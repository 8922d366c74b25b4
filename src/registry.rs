//! Destination Registry - the ordered list of allowed kiosk URLs
//!
//! A destination's identity is its position in the registry. The panel's
//! group selector exposes that position 1-based; everything in Rust is 0-based.
//!
//! URL comparison works on normalized text (percent-decoded, trimmed) and uses
//! containment, so a stored URL with extra query parameters appended by the
//! device still selects its destination.

use std::borrow::Cow;
use std::sync::Arc;

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use crate::error::{KioskError, Result};

/// One selectable kiosk destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    /// Text shown on the panel button
    #[serde(alias = "text")]
    pub label: String,
    /// URL written to the kiosk URL setting when selected
    pub url: String,
}

impl Destination {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }

    /// Normalized form of this destination's URL
    pub fn normalized_url(&self) -> Cow<'_, str> {
        normalize_url(&self.url)
    }
}

/// Percent-decode and trim a URL for comparison.
///
/// Invalid UTF-8 after decoding is replaced lossily; malformed escapes are
/// kept literally.
pub fn normalize_url(url: &str) -> Cow<'_, str> {
    match percent_decode_str(url).decode_utf8_lossy() {
        Cow::Borrowed(s) => Cow::Borrowed(s.trim()),
        Cow::Owned(s) => Cow::Owned(s.trim().to_string()),
    }
}

/// Immutable, ordered set of destinations
///
/// Cheap to clone (Arc-backed) so the reconciler, guard and router can each
/// hold one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationRegistry {
    destinations: Arc<[Destination]>,
}

impl DestinationRegistry {
    /// Build a registry, rejecting entries that normalize to the same URL
    pub fn new(destinations: Vec<Destination>) -> Result<Self> {
        for (i, a) in destinations.iter().enumerate() {
            let na = a.normalized_url();
            if let Some(b) = destinations[i + 1..]
                .iter()
                .find(|b| b.normalized_url() == na)
            {
                return Err(KioskError::DuplicateDestination {
                    first: a.label.clone(),
                    second: b.label.clone(),
                });
            }
        }

        Ok(Self {
            destinations: destinations.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Destination> {
        self.destinations.get(index)
    }

    /// Like [`get`](Self::get) but fails with `InvalidSelection`
    pub fn select(&self, index: usize) -> Result<&Destination> {
        self.get(index).ok_or(KioskError::InvalidSelection {
            index,
            len: self.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Destination> {
        self.destinations.iter()
    }

    /// Index of the first destination whose normalized URL is contained in
    /// the normalized `current` URL.
    pub fn match_url(&self, current: &str) -> Option<usize> {
        let current = normalize_url(current);
        if current.is_empty() {
            return None;
        }

        self.destinations.iter().position(|dest| {
            let candidate = dest.normalized_url();
            !candidate.is_empty() && current.contains(&*candidate)
        })
    }
}
