//! Xcode build settings (layer 1)
//!
//! Xcode exports build settings as environment variables to run-script
//! phases. Only the five below are consumed.

use std::path::PathBuf;

pub const BUILT_PRODUCTS_DIR: &str = "BUILT_PRODUCTS_DIR";
pub const TARGET_NAME: &str = "TARGET_NAME";
pub const SRCROOT: &str = "SRCROOT";
pub const PRODUCT_BUNDLE_IDENTIFIER: &str = "PRODUCT_BUNDLE_IDENTIFIER";
pub const EXPANDED_CODE_SIGN_IDENTITY: &str = "EXPANDED_CODE_SIGN_IDENTITY";

/// Build settings as read; empty values count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnvironment {
    pub built_products_dir: Option<PathBuf>,
    pub target_name: Option<String>,
    pub source_root: Option<PathBuf>,
    pub bundle_identifier: Option<String>,
    pub signing_identity: Option<String>,
}

impl BuildEnvironment {
    /// Read from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            built_products_dir: get(BUILT_PRODUCTS_DIR).map(PathBuf::from),
            target_name: get(TARGET_NAME),
            source_root: get(SRCROOT).map(PathBuf::from),
            bundle_identifier: get(PRODUCT_BUNDLE_IDENTIFIER),
            signing_identity: get(EXPANDED_CODE_SIGN_IDENTITY),
        }
    }
}
