//! # Runtime Configuration Module
//!
//! Environment-variable configuration for the decoder's resource limits.
//!
//! ## Environment Variables
//!
//! ### `BRRTR_PARAM_MAX_DEPTH`
//!
//! Maximum number of array/object levels below a parameter, both in the
//! schema and in a decoded value. Default: `32`.
//!
//! ### `BRRTR_PARAM_MAX_ITEMS`
//!
//! Maximum number of elements in any one decoded array or object.
//! Default: `1024` (`0x400`).
//!
//! Both accept decimal (`64`) or hexadecimal (`0x40`). Unparseable values
//! fall back to the default.
//!
//! ## Usage
//!
//! ```rust
//! use brrtparam::runtime_config::DecodeLimits;
//!
//! let limits = DecodeLimits::from_env();
//! println!("max depth: {}", limits.max_depth);
//! ```
//!
//! ```bash
//! export BRRTR_PARAM_MAX_DEPTH=8
//! export BRRTR_PARAM_MAX_ITEMS=0x100
//! ```

use std::env;

const DEFAULT_MAX_DEPTH: usize = 32;
const DEFAULT_MAX_ITEMS: usize = 0x400;

/// Bounds applied while building schemas and walking decoded values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Deepest array/object nesting accepted (default: 32)
    pub max_depth: usize,
    /// Largest array/object accepted (default: 1024)
    pub max_items: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        DecodeLimits {
            max_depth: DEFAULT_MAX_DEPTH,
            max_items: DEFAULT_MAX_ITEMS,
        }
    }
}

impl DecodeLimits {
    /// Load limits from environment variables.
    pub fn from_env() -> Self {
        DecodeLimits {
            max_depth: env_size("BRRTR_PARAM_MAX_DEPTH", DEFAULT_MAX_DEPTH),
            max_items: env_size("BRRTR_PARAM_MAX_ITEMS", DEFAULT_MAX_ITEMS),
        }
    }
}

fn env_size(key: &str, default: usize) -> usize {
    match env::var(key) {
        Ok(val) => parse_size(&val).unwrap_or(default),
        Err(_) => default,
    }
}

/// Decimal or `0x`-prefixed hexadecimal.
fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    if let Some(hex) = val.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let limits = DecodeLimits::default();
        assert_eq!(limits.max_depth, 32);
        assert_eq!(limits.max_items, 1024);
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("64"), Some(64));
        assert_eq!(parse_size("0x40"), Some(64));
        assert_eq!(parse_size(" 8 "), Some(8));
        assert_eq!(parse_size("lots"), None);
        assert_eq!(parse_size("0xZZ"), None);
    }

    #[test]
    fn test_unset_variable_uses_default() {
        assert_eq!(env_size("BRRTR_PARAM_TEST_UNSET_VARIABLE", 7), 7);
    }
}
