//! API key handling.
//!
//! The key is only ever read from the process environment; loading a `.env`
//! file into that environment is left to the binary.

use crate::error::{Error, Result};
use std::fmt;

/// Default environment variable holding the API key.
pub const API_KEY_ENV: &str = "ODDS_API_KEY";

/// Value shipped in the `.env` template; never a real key.
pub const PLACEHOLDER_KEY: &str = "YOUR_API_KEY_HERE";

/// A non-empty Odds API key.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key, rejecting empty or whitespace-only values.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(Error::configuration("API key must not be empty"));
        }
        Ok(Self(key))
    }

    /// Read the key from `ODDS_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::from_var(API_KEY_ENV)
    }

    /// Read the key from the named environment variable.
    pub fn from_var(name: &str) -> Result<Self> {
        match std::env::var(name) {
            Ok(value) => {
                Self::new(value).map_err(|_| Error::configuration(format!("{name} is empty")))
            }
            Err(_) => Err(Error::configuration(format!("{name} not set"))),
        }
    }

    /// The raw key, for injecting into requests.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Length of the key in characters.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Whether the key is empty. Never true for a constructed key.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this is still the template value.
    pub fn is_placeholder(&self) -> bool {
        self.0 == PLACEHOLDER_KEY
    }

    /// First and last four characters, or `***` for short keys.
    pub fn preview(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() > 8 {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{head}...{tail}")
        } else {
            "***".to_string()
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKey").field(&self.preview()).finish()
    }
}

/// Outcome of checking the environment for a usable key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvCheck {
    /// Variable unset or empty.
    Missing {
        /// Variable that was checked.
        var: String,
    },
    /// Variable still holds the template value.
    Placeholder {
        /// Variable that was checked.
        var: String,
    },
    /// Key present and not the placeholder.
    Ready {
        /// Variable that was checked.
        var: String,
        /// Key length in characters.
        length: usize,
        /// Redacted preview of the key.
        preview: String,
    },
}

impl EnvCheck {
    /// Whether a client can be built from this environment.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

impl fmt::Display for EnvCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { var } => write!(f, "{var} is not set"),
            Self::Placeholder { var } => {
                write!(f, "{var} is still the placeholder value {PLACEHOLDER_KEY}")
            }
            Self::Ready {
                var,
                length,
                preview,
            } => write!(f, "{var} is set ({length} chars): {preview}"),
        }
    }
}

/// Check the named variable without ever revealing the key.
pub fn check_environment(var: &str) -> EnvCheck {
    classify(var, std::env::var(var).ok())
}

fn classify(var: &str, value: Option<String>) -> EnvCheck {
    let Some(key) = value.and_then(|v| ApiKey::new(v).ok()) else {
        return EnvCheck::Missing {
            var: var.to_string(),
        };
    };

    if key.is_placeholder() {
        EnvCheck::Placeholder {
            var: var.to_string(),
        }
    } else {
        EnvCheck::Ready {
            var: var.to_string(),
            length: key.len(),
            preview: key.preview(),
        }
    }
}
