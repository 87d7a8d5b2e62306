//! Normalized user profile.

use serde::{Deserialize, Serialize};

/// Provider-neutral view of the connected user's profile.
///
/// Every field is optional; [`UserProfile::EMPTY`] stands for "no data".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    username: Option<String>,
}

impl UserProfile {
    /// Profile with no data.
    pub const EMPTY: Self = Self {
        name: None,
        first_name: None,
        last_name: None,
        email: None,
        username: None,
    };

    /// Start building a profile.
    pub fn builder() -> UserProfileBuilder {
        UserProfileBuilder::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

/// Builder for [`UserProfile`].
///
/// A full name alone is split into first and last name; first and last
/// names alone are joined into a full name.
#[derive(Debug, Clone, Default)]
pub struct UserProfileBuilder {
    name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    username: Option<String>,
}

impl UserProfileBuilder {
    #[must_use]
    pub fn name(mut self, name: Option<&str>) -> Self {
        self.name = name.map(str::to_owned);
        self
    }

    #[must_use]
    pub fn first_name(mut self, first_name: Option<&str>) -> Self {
        self.first_name = first_name.map(str::to_owned);
        self
    }

    #[must_use]
    pub fn last_name(mut self, last_name: Option<&str>) -> Self {
        self.last_name = last_name.map(str::to_owned);
        self
    }

    #[must_use]
    pub fn email(mut self, email: Option<&str>) -> Self {
        self.email = email.map(str::to_owned);
        self
    }

    #[must_use]
    pub fn username(mut self, username: Option<&str>) -> Self {
        self.username = username.map(str::to_owned);
        self
    }

    pub fn build(self) -> UserProfile {
        let Self {
            mut name,
            mut first_name,
            mut last_name,
            email,
            username,
        } = self;

        if first_name.is_none()
            && last_name.is_none()
            && let Some(full) = &name
        {
            (first_name, last_name) = split_name(full);
        } else if name.is_none() {
            name = compose_name(first_name.as_deref(), last_name.as_deref());
        }

        UserProfile {
            name,
            first_name,
            last_name,
            email,
            username,
        }
    }
}

/// First and last whitespace-separated tokens; a single token has no last name.
fn split_name(name: &str) -> (Option<String>, Option<String>) {
    let mut tokens = name.split_whitespace();
    let first = tokens.next().map(str::to_owned);
    let last = tokens.next_back().map(str::to_owned);
    (first, last)
}

fn compose_name(first_name: Option<&str>, last_name: Option<&str>) -> Option<String> {
    match (first_name, last_name) {
        (Some(first), Some(last)) => Some(format!("{first} {last}")),
        (Some(only), None) | (None, Some(only)) => Some(only.to_owned()),
        (None, None) => None,
    }
}
