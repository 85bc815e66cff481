//! Registered users and their profile fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const MAX_USERNAME_LEN: usize = 150;

/// A registered member of the library. Credentials live with the external
/// auth provider; only profile data is kept here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub user_id:   Uuid,
  pub username:  String,
  pub email:     String,
  pub bio:       String,
  /// Path of the avatar image relative to the media root.
  pub avatar:    Option<String>,
  pub joined_at: DateTime<Utc>,
}

/// Input to [`crate::store::LibraryStore::add_user`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
  pub username: String,
  pub email:    String,
}

impl NewUser {
  pub fn validate(&self) -> Result<()> {
    let username = self.username.trim();
    if username.is_empty() {
      return Err(Error::InvalidUser("username must not be empty".into()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
      return Err(Error::InvalidUser(format!(
        "username is longer than {MAX_USERNAME_LEN} characters"
      )));
    }
    if !self.email.contains('@') {
      return Err(Error::InvalidUser(format!(
        "{:?} is not an email address",
        self.email
      )));
    }
    Ok(())
  }
}

/// Partial profile edit; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
  pub bio:    Option<String>,
  pub avatar: Option<String>,
}
