//! Locale tags and the negotiation engine for localized widget content.
//!
//! A [`LocaleTag`] is a normalized language/region identifier (`en-gb`).
//! [`LocaleMatcher`] ranks locale-aware manifest entries against a target
//! tag: exact match first, then a bare-language partial match, then the
//! unlocalized fallback. [`find_localized_file`] applies the same preference
//! order to on-disk content variants under a widget's `locales/` directory.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ManifestError, ManifestResult};

/// Name of the reserved folder holding localized content variants.
pub const LOCALES_DIR: &str = "locales";

/// A normalized locale identifier.
///
/// Construction normalizes underscores to hyphens and lower-cases, so
/// `en_GB`, `en-GB` and `en-gb` are all the same tag. Equality is exact
/// string comparison on the normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocaleTag(String);

impl LocaleTag {
    /// Create a locale tag from a raw identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::InvalidArgument`] when `raw` is empty.
    pub fn new(raw: &str) -> ManifestResult<Self> {
        if raw.is_empty() {
            return Err(ManifestError::InvalidArgument(
                "locale tag cannot be empty".to_owned(),
            ));
        }
        Ok(Self(raw.replace('_', "-").to_lowercase()))
    }

    /// The normalized tag string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `candidate` is a bare language subtag prefix of this tag.
    ///
    /// True iff `candidate` is strictly shorter than this tag, contains no
    /// hyphen, and this tag starts with it. `en-gb` partially matches `en`
    /// but not `en-gb` (that is an exact match) and not `en-` (not a bare
    /// language subtag).
    #[must_use]
    pub fn partially_matches(&self, candidate: &LocaleTag) -> bool {
        candidate.0.len() < self.0.len()
            && !candidate.0.contains('-')
            && self.0.starts_with(candidate.0.as_str())
    }
}

impl fmt::Display for LocaleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for LocaleTag {
    type Error = ManifestError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Parse an `Accept-Language`-style header into locale tags in preference
/// order.
///
/// The header is truncated at the first `;` and split on commas, so quality
/// weights are discarded and the textual order is taken as the preference
/// order. This is a deliberate simplification.
#[must_use]
pub fn parse_accept_language(header: &str) -> Vec<LocaleTag> {
    let languages = header.split(';').next().unwrap_or_default();

    languages
        .trim()
        .split(',')
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| LocaleTag::new(segment.trim()).ok())
        .collect()
}

/// Anything carrying an optional locale tag, where the empty string means
/// "no locale / default fallback".
pub trait LocaleAware {
    /// The element's locale tag, or `""` when unlocalized.
    fn locale(&self) -> &str;
}

/// Ranks locale-aware items against one target locale.
#[derive(Debug, Clone)]
pub struct LocaleMatcher {
    target: LocaleTag,
}

impl LocaleMatcher {
    /// Create a matcher for the given target locale.
    #[must_use]
    pub fn new(target: LocaleTag) -> Self {
        Self { target }
    }

    /// Return the best-matching items ordered by specificity.
    ///
    /// Items are classified into three ranks: exact match on the target,
    /// partial (bare-language) match, and unlocalized fallback. Only the
    /// first item encountered per rank is kept, and ranks with no match are
    /// omitted, so the result holds at most three items, most specific
    /// first.
    pub fn best_matches<'a, T: LocaleAware>(
        &self,
        items: impl IntoIterator<Item = &'a T>,
    ) -> Vec<&'a T> {
        let mut exact: Option<&T> = None;
        let mut partial: Option<&T> = None;
        let mut fallback: Option<&T> = None;

        for item in items {
            let lang = item.locale();
            if lang.is_empty() {
                if fallback.is_none() {
                    fallback = Some(item);
                }
            } else if let Ok(tag) = LocaleTag::new(lang) {
                if tag == self.target {
                    if exact.is_none() {
                        exact = Some(item);
                    }
                } else if self.target.partially_matches(&tag) && partial.is_none() {
                    partial = Some(item);
                }
            }
        }

        [exact, partial, fallback].into_iter().flatten().collect()
    }

    /// The single best-matching item, if any rank matched.
    pub fn best_match<'a, T: LocaleAware>(
        &self,
        items: impl IntoIterator<Item = &'a T>,
    ) -> Option<&'a T> {
        self.best_matches(items).into_iter().next()
    }
}

/// Find the preferred localized variant of a widget content file.
///
/// Tries `<root>/locales/<tag>/<relative>` for each tag in preference order
/// and returns the first variant that exists on disk. Falls back to
/// `original` when there is no `locales/` folder, no variant, or no locale
/// preference at all. A path already inside `locales/` is returned as-is.
/// The original path is not guaranteed to exist; a returned variant is.
#[must_use]
pub fn find_localized_file(root: &Path, locales: &[LocaleTag], original: &Path) -> PathBuf {
    if locales.is_empty() {
        return original.to_path_buf();
    }

    let locales_dir = root.join(LOCALES_DIR);
    if original.starts_with(&locales_dir) {
        return original.to_path_buf();
    }

    let Ok(relative) = original.strip_prefix(root) else {
        return original.to_path_buf();
    };

    if !locales_dir.is_dir() {
        return original.to_path_buf();
    }

    for tag in locales {
        let candidate = locales_dir.join(tag.as_str()).join(relative);
        if candidate.is_file() {
            return candidate;
        }
    }

    original.to_path_buf()
}
