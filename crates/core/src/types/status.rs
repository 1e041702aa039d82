//! Status enums shared by the storefront and admin.

use serde::{Deserialize, Serialize};

/// Whether the visitor has let us read their device location.
///
/// Starts at `Pending`. An acquisition attempt moves it to `Granted` or
/// `Denied`; only an explicit reset moves it back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LocationStatus {
    #[default]
    Pending,
    Granted,
    Denied,
}

impl LocationStatus {
    /// Returns `true` once an acquisition attempt has settled the status.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Granted | Self::Denied)
    }
}

/// Outcome reported for a delete request, mirrored in the JSON envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    Error,
}
