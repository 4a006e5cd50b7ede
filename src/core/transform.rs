//! Content transforms applied while staging assets

use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

/// A pure transform from raw bytes (and the source path) to output bytes
pub type TransformFn = fn(&[u8], &Path) -> Vec<u8>;

/// Transform attached to an asset rule
#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transform {
    /// Drop the HTTPS redirect directives from an Apache rewrite config
    StripHttpsRedirect,

    /// Caller-supplied function (library use only)
    #[serde(skip)]
    Custom(TransformFn),
}

impl Transform {
    /// Apply the transform to the bytes read from `source`
    pub fn apply(&self, content: &[u8], source: &Path) -> Vec<u8> {
        match self {
            Transform::StripHttpsRedirect => strip_https_redirect(content, source),
            Transform::Custom(f) => f(content, source),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transform::StripHttpsRedirect => "strip-https-redirect",
            Transform::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn https_redirect_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Whole lines only, so neighbouring directives are never touched.
        Regex::new(concat!(
            r"(?im-u)^[ \t]*(?:",
            r"RewriteCond\b[^\n]*\boff\b[^\n]*",
            r"|",
            r"RewriteRule\b[^\n]*https://[^\n]*\{REQUEST_URI\}[ \t]+\[L,R=301\][^\n]*",
            r")(?:\n|\z)",
        ))
        .expect("static regex is valid")
    })
}

/// Remove the `RewriteCond ... off` / `RewriteRule ... https://...{REQUEST_URI} [L,R=301]`
/// pair from a rewrite configuration file
pub fn strip_https_redirect(content: &[u8], _source: &Path) -> Vec<u8> {
    https_redirect_pattern().replace_all(content, &b""[..]).into_owned()
}
