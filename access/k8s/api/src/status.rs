use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The most recently observed status of an access resource.
///
/// The value is written by whichever controller reconciles the resource and
/// is passed through untouched; clients constructing resources leave it
/// empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct Status(pub String);

impl Status {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
