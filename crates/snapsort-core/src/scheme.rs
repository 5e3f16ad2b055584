//! Naming schemes for batch renames.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Hidden prefix reserved for phase-1 staging names.
///
/// Final names never start with a dot, so a staging name can never
/// collide with a target of the same plan.
pub const STAGING_PREFIX: &str = ".staged-";

/// How renamed files are numbered and named.
///
/// The i-th entry of a batch of `count` files receives the basename
/// `prefix + zero_pad(start_number + i) + extension`, where the pad
/// width is fixed for the whole batch by the largest target number.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct NamingScheme {
    /// Base name applied to every output file.
    pub prefix: String,

    /// Number given to the first entry.
    #[builder(default = "1")]
    #[serde(default = "default_start_number")]
    pub start_number: u64,
}

fn default_start_number() -> u64 {
    1
}

impl NamingSchemeBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.prefix {
            Some(ref prefix) => validate_prefix(prefix),
            None => Err("Prefix is required".to_string()),
        }
    }
}

impl NamingScheme {
    /// Create a new naming scheme builder.
    pub fn builder() -> NamingSchemeBuilder {
        NamingSchemeBuilder::default()
    }

    /// Scheme with the given prefix, numbering from 1.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            start_number: 1,
        }
    }

    /// Zero-pad width for a batch of `count` entries: the decimal digit
    /// count of the largest target number.
    pub fn pad_width(&self, count: usize) -> usize {
        decimal_digits(self.start_number + count.saturating_sub(1) as u64)
    }

    /// Final basename for the entry at `index` in a batch of `count`.
    ///
    /// `extension` includes its leading dot, or is empty.
    pub fn target_name(&self, index: usize, count: usize, extension: &str) -> String {
        format!(
            "{}{:0width$}{}",
            self.prefix,
            self.start_number + index as u64,
            extension,
            width = self.pad_width(count)
        )
    }

    /// Hidden staging basename for the entry at `index`.
    ///
    /// Distinct from every other entry's staging name (the index
    /// differs) and from every target name (targets never start with a
    /// dot).
    pub fn staging_name(&self, index: usize, extension: &str) -> String {
        format!("{STAGING_PREFIX}{}-{index}{extension}", self.prefix)
    }
}

fn decimal_digits(mut n: u64) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

/// Validate a rename prefix for cross-platform compatibility.
pub fn validate_prefix(prefix: &str) -> Result<(), String> {
    if prefix.is_empty() {
        return Err("Prefix cannot be empty".into());
    }

    // Leave room for the number and extension within common limits.
    if prefix.len() > 200 {
        return Err("Prefix is too long (max 200 characters)".into());
    }

    let invalid_chars = ['/', '\0'];
    for c in invalid_chars {
        if prefix.contains(c) {
            return Err(format!("Prefix cannot contain '{}'", c.escape_default()));
        }
    }

    #[cfg(target_os = "windows")]
    {
        let windows_invalid = ['\\', ':', '*', '?', '"', '<', '>', '|'];
        for c in windows_invalid {
            if prefix.contains(c) {
                return Err(format!("Prefix cannot contain '{c}'"));
            }
        }
    }

    // Leading/trailing spaces are problematic on Windows.
    if prefix.starts_with(' ') || prefix.ends_with(' ') {
        return Err("Prefix cannot start or end with spaces".into());
    }

    if prefix.starts_with('.') {
        return Err("Prefix cannot start with a dot".into());
    }

    Ok(())
}
