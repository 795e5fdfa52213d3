//! Font-ready notification shared by font backends and shells.

use serde::{Deserialize, Serialize};

/// Emitted when one or more font families finish loading.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontsReady {
    pub families: Vec<String>,
}

impl FontsReady {
    pub fn new(families: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            families: families.into_iter().map(Into::into).collect(),
        }
    }
}
