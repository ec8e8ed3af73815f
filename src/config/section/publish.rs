//! `[publish]` section configuration.
//!
//! ```toml
//! [publish]
//! fsync = true   # flush the new artifact to disk before renaming it into place
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub fsync: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self { fsync: true }
    }
}
