//! Signed-in user identity.

use serde::{Deserialize, Serialize};

use ezcentials_core::{ANONYMOUS_USER_NAME, UserId};

/// The user authenticated by the identity provider in front of the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Identity provider user id.
    pub id: UserId,
    /// Display name, if the user set one.
    pub display_name: Option<String>,
}

impl CurrentUser {
    /// Name shown next to the user's reviews.
    #[must_use]
    pub fn review_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(ANONYMOUS_USER_NAME)
    }
}
