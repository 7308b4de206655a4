//! Session identifiers.
//!
//! A session has no persisted row of its own. It exists only as the owner key
//! shared by cart items, and its lifetime is controlled entirely by the client.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Maximum accepted length of a session identifier, in bytes.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// An opaque identifier partitioning cart state per client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
  /// Validate and wrap a raw identifier.
  ///
  /// Accepts 1 to [`MAX_SESSION_ID_LEN`] visible ASCII characters.
  pub fn new(raw: impl Into<String>) -> Result<Self> {
    let raw = raw.into();
    if raw.is_empty() {
      return Err(Error::InvalidSession("empty identifier".into()));
    }
    if raw.len() > MAX_SESSION_ID_LEN {
      return Err(Error::InvalidSession(format!(
        "identifier longer than {MAX_SESSION_ID_LEN} bytes"
      )));
    }
    if !raw.bytes().all(|b| b.is_ascii_graphic()) {
      return Err(Error::InvalidSession(
        "identifier must be visible ASCII".into(),
      ));
    }
    Ok(Self(raw))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SessionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl TryFrom<String> for SessionId {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { Self::new(value) }
}

impl From<SessionId> for String {
  fn from(id: SessionId) -> Self { id.0 }
}
