#![forbid(unsafe_code)]

//! Loop configuration.
//!
//! Defaults match the device nodes a window server normally owns.
//! Environment variables override them:
//!
//! | Variable               | Field             |
//! |------------------------|-------------------|
//! | `WSRV_KEYBOARD_DEVICE` | `keyboard_device` |
//! | `WSRV_POINTER_DEVICE`  | `pointer_device`  |
//!
//! Empty values are ignored.

use std::ffi::OsString;
use std::path::PathBuf;

/// Environment override for [`LoopConfig::keyboard_device`].
pub const ENV_KEYBOARD_DEVICE: &str = "WSRV_KEYBOARD_DEVICE";

/// Environment override for [`LoopConfig::pointer_device`].
pub const ENV_POINTER_DEVICE: &str = "WSRV_POINTER_DEVICE";

/// Default keyboard device node.
pub const DEFAULT_KEYBOARD_DEVICE: &str = "/dev/keyboard";

/// Default pointer device node.
pub const DEFAULT_POINTER_DEVICE: &str = "/dev/psaux";

/// Where the loop reads input from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopConfig {
    /// Keyboard device node, opened read-only.
    pub keyboard_device: PathBuf,
    /// Pointer device node, opened read-only.
    pub pointer_device: PathBuf,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            keyboard_device: PathBuf::from(DEFAULT_KEYBOARD_DEVICE),
            pointer_device: PathBuf::from(DEFAULT_POINTER_DEVICE),
        }
    }
}

impl LoopConfig {
    /// Defaults with process environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var_os(key))
    }

    /// Apply overrides from an arbitrary variable lookup.
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(path) = non_empty(ENV_KEYBOARD_DEVICE) {
            self.keyboard_device = PathBuf::from(path);
        }
        if let Some(path) = non_empty(ENV_POINTER_DEVICE) {
            self.pointer_device = PathBuf::from(path);
        }
        self
    }

    /// Set the keyboard device node.
    #[must_use]
    pub fn with_keyboard_device(mut self, path: impl Into<PathBuf>) -> Self {
        self.keyboard_device = path.into();
        self
    }

    /// Set the pointer device node.
    #[must_use]
    pub fn with_pointer_device(mut self, path: impl Into<PathBuf>) -> Self {
        self.pointer_device = path.into();
        self
    }
}
