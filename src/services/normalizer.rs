//! Creative name normalization service
//!
//! Normalizes creative/asset names to a canonical form so the same underlying
//! creative is recognized across format variants ("Hero 9x16" vs "Hero") and
//! vendor-prepended hash prefixes.

use regex::Regex;

/// Normalizer for creative/asset names.
///
/// Holds its patterns pre-compiled; construct once per request or file scan
/// and reuse across rows.
pub struct NameNormalizer {
    format_suffix: Regex,
    format_mid: Regex,
    hash_prefix: Regex,
}

impl NameNormalizer {
    pub fn new() -> Self {
        Self {
            // Aspect-ratio token at the end of the name, e.g. " 9x16", "-16:9"
            format_suffix: Regex::new(r"(?i)\s*[-_]?\s*\d+[x:]\d+\s*$").expect("valid regex"),
            // Aspect-ratio token surrounded by whitespace mid-name
            format_mid: Regex::new(r"(?i)\s+\d+[x:]\d+\s+").expect("valid regex"),
            // 32-hex-char MD5 prefix followed by an underscore
            hash_prefix: Regex::new(r"(?i)^[a-f0-9]{32}_").expect("valid regex"),
        }
    }

    /// Strip aspect-ratio format tokens from a creative name.
    ///
    /// Removes a trailing token ("Hero 9x16", "Hero-16:9"), collapses an
    /// embedded token surrounded by whitespace to a single space, then trims
    /// residual separators from both edges. Names without such a token pass
    /// through unchanged, and the operation is idempotent.
    ///
    /// # Examples
    /// ```
    /// use spendstack::services::normalizer::NameNormalizer;
    ///
    /// let normalizer = NameNormalizer::new();
    /// assert_eq!(normalizer.strip_format_suffix("Hero Video 9x16"), "Hero Video");
    /// assert_eq!(normalizer.strip_format_suffix("Hero Video"), "Hero Video");
    /// ```
    pub fn strip_format_suffix(&self, name: &str) -> String {
        let trimmed = self.format_suffix.replace(name, "");
        let collapsed = self.format_mid.replace_all(&trimmed, " ");
        collapsed
            .trim_matches(|c: char| c == ' ' || c == '-' || c == '_')
            .to_string()
    }

    /// Strip a leading 32-hex-character hash prefix (plus its underscore)
    /// from a creative name. Names without the prefix pass through unchanged.
    pub fn strip_hash_prefix(&self, name: &str) -> String {
        self.hash_prefix.replace(name, "").into_owned()
    }
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
