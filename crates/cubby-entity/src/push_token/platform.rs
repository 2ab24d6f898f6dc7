//! Device platforms accepted for push registration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use cubby_core::AppError;

/// Platform a push token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Browser push.
    Web,
    /// Apple devices.
    Ios,
    /// Android devices.
    Android,
}

impl Platform {
    /// Return the platform as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Ios => "ios",
            Self::Android => "android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "web" => Ok(Self::Web),
            "ios" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            _ => Err(AppError::validation(format!(
                "Invalid platform: '{s}'. Expected one of: web, ios, android"
            ))),
        }
    }
}
