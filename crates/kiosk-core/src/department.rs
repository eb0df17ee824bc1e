//! Service departments a citizen can interact with at a kiosk.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Utility or civic department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    /// Electricity board
    Electricity,
    /// Gas distribution
    Gas,
    /// Municipal corporation
    Municipal,
}

impl Department {
    /// All departments in display order.
    pub const ALL: [Department; 3] = [Self::Electricity, Self::Gas, Self::Municipal];

    /// Wire/tag name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Electricity => "electricity",
            Self::Gas => "gas",
            Self::Municipal => "municipal",
        }
    }

    /// Canonical form of a free-text department tag.
    ///
    /// Known departments collapse to their lowercase tag; anything else is
    /// kept as given, since activity rows accept arbitrary tags.
    pub fn normalize_tag(tag: &str) -> String {
        match tag.parse::<Self>() {
            Ok(dept) => dept.as_str().to_string(),
            Err(_) => tag.to_string(),
        }
    }
}

impl FromStr for Department {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "electricity" => Ok(Self::Electricity),
            "gas" => Ok(Self::Gas),
            "municipal" => Ok(Self::Municipal),
            _ => Err(Error::UnknownDepartment(s.to_string())),
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
