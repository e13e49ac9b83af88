#[cfg(feature = "ast-json")]
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::constants::{DEFAULT_CALL_PREFIX, DEFAULT_MAX_DEPTH};

/// Settings shared by the translators and the packer.
#[cfg_attr(feature = "ast-json", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Prefix given to operator call sites and their private bindings.
    pub call_prefix: SmolStr,
    /// Fail packing when a called operator has no body.
    pub strict: bool,
    /// Deepest expression nesting accepted by the recursive passes.
    pub max_depth: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            call_prefix: SmolStr::new_static(DEFAULT_CALL_PREFIX),
            strict: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Options {
    /// The private binding name for operator `name`.
    pub fn binding_name(&self, name: &str) -> SmolStr {
        smol_str::format_smolstr!("{}{}", self.call_prefix, name)
    }

    /// Rejects settings no packer can work with.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.call_prefix.is_empty() {
            return Err(crate::Error::EmptyCallPrefix);
        }
        Ok(())
    }

    pub(crate) fn check_depth(&self, depth: u32) -> Result<(), crate::Error> {
        if depth > self.max_depth {
            Err(crate::Error::DepthLimitExceeded(self.max_depth))
        } else {
            Ok(())
        }
    }
}
