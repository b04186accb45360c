//! Locations of the primary and secondary store files.

use crate::server_config::ports::{ConfigStoreError, ConfigStoreResult};
use camino::{Utf8Path, Utf8PathBuf};

/// File name of the primary store, relative to the home directory.
pub const PRIMARY_FILE_NAME: &str = ".claude.json";
/// Path of the secondary store, relative to the home directory.
pub const SECONDARY_RELATIVE_PATH: &str = ".codemoss/config.json";

/// Paths of the two persisted configuration files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    primary: Utf8PathBuf,
    secondary: Utf8PathBuf,
}

impl StorePaths {
    /// Creates paths from explicit file locations.
    #[must_use]
    pub fn new(primary: impl Into<Utf8PathBuf>, secondary: impl Into<Utf8PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    /// Places both files at their default locations under `home`.
    #[must_use]
    pub fn from_home(home: &Utf8Path) -> Self {
        Self::new(
            home.join(PRIMARY_FILE_NAME),
            home.join(SECONDARY_RELATIVE_PATH),
        )
    }

    /// Places both files under the current user's home directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError::HomeDirectory`] when no home directory is
    /// known or its path is not valid UTF-8.
    pub fn discover() -> ConfigStoreResult<Self> {
        let home = dirs::home_dir().ok_or(ConfigStoreError::HomeDirectory)?;
        let utf8_home =
            Utf8PathBuf::try_from(home).map_err(|_| ConfigStoreError::HomeDirectory)?;
        Ok(Self::from_home(&utf8_home))
    }

    /// Returns the primary file path.
    #[must_use]
    pub fn primary(&self) -> &Utf8Path {
        &self.primary
    }

    /// Returns the secondary file path.
    #[must_use]
    pub fn secondary(&self) -> &Utf8Path {
        &self.secondary
    }
}
