//! Store subdomains.
//!
//! Stores are served under `/store/<subdomain>`. Subdomains are generated
//! from the store name at approval time; names are frequently Arabic, so a
//! handful of common business words are transliterated before everything
//! outside `[a-z0-9-]` is dropped.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

/// Minimum length of a generated subdomain before the fallback kicks in.
const MIN_GENERATED_LEN: usize = 3;

const WORD_MAP: &[(&str, &str)] = &[
    ("متجر", "store"),
    ("محل", "shop"),
    ("مؤسسة", "company"),
    ("شركة", "company"),
    ("مكتب", "office"),
    ("مركز", "center"),
];

static LONG_FORM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]{1,61}[a-z0-9]$").expect("Invalid regex"));

static SHORT_FORM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]{1,63}$").expect("Invalid regex"));

/// Errors returned when a string is not a valid subdomain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid subdomain: {0:?}")]
pub struct SubdomainError(pub String);

/// A validated store subdomain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Subdomain(String);

impl Subdomain {
    /// Parse an existing subdomain.
    ///
    /// # Errors
    ///
    /// Returns `SubdomainError` if `s` fails [`is_valid`].
    pub fn parse(s: &str) -> Result<Self, SubdomainError> {
        if is_valid(s) {
            Ok(Self(s.to_owned()))
        } else {
            Err(SubdomainError(s.to_owned()))
        }
    }

    /// Derive a subdomain from a store name.
    ///
    /// When the cleaned-up name is shorter than three characters, `fallback`
    /// is used instead (or `store-<unix millis>` if none is given). A result
    /// starting with a digit is prefixed with `store-`.
    #[must_use]
    pub fn generate(store_name: &str, fallback: Option<&str>) -> Self {
        let mut processed = store_name.to_owned();
        for (arabic, english) in WORD_MAP {
            processed = processed.replace(arabic, &format!(" {english} "));
        }

        let mut subdomain = slugify(&processed);
        if subdomain.chars().count() < MIN_GENERATED_LEN {
            subdomain = fallback.map_or_else(
                || format!("store-{}", chrono::Utc::now().timestamp_millis()),
                slugify,
            );
        }
        if subdomain.starts_with(|c: char| c.is_ascii_digit()) {
            subdomain = format!("store-{subdomain}");
        }

        Self(subdomain)
    }

    /// Return a variant with a numeric suffix, e.g. `shop-2`.
    #[must_use]
    pub fn with_suffix(&self, n: u32) -> Self {
        Self(format!("{}-{n}", self.0))
    }

    /// The subdomain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for Subdomain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Subdomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Subdomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Check whether `s` is usable as a subdomain.
#[must_use]
pub fn is_valid(s: &str) -> bool {
    LONG_FORM.is_match(s) || SHORT_FORM.is_match(s)
}

/// Lowercase, turn whitespace runs into `-`, drop anything outside
/// `[a-z0-9-]`, collapse dashes and trim them from both ends.
fn slugify(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut last_dash = true;
    for c in lowered.chars() {
        let mapped = if c.is_whitespace() || c == '-' {
            Some('-')
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            Some(c)
        } else {
            None
        };
        match mapped {
            Some('-') if last_dash => {}
            Some('-') => {
                out.push('-');
                last_dash = true;
            }
            Some(ch) => {
                out.push(ch);
                last_dash = false;
            }
            None => {}
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
