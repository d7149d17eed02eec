//! SASL mechanisms for AUTHENTICATE.
//!
//! Implements:
//! - PLAIN (RFC 4616) - username/password in one message
//! - LOGIN - username and password sent in answer to two prompts
//! - XOAUTH2 (Google/Microsoft) - `OAuth2` bearer token
//! - OAUTHBEARER (RFC 7628) - standard `OAuth2` bearer token
//!
//! Mechanisms work on raw bytes; the AUTHENTICATE command does the base64
//! framing.

use crate::{Error, Result};

/// A client-side SASL mechanism.
pub trait SaslMechanism: Send {
    /// Returns the mechanism name as advertised in `AUTH=`.
    fn name(&self) -> &str;

    /// Returns true if the client speaks first.
    fn client_first(&self) -> bool;

    /// Resets the mechanism before a new exchange.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sasl`] if the mechanism cannot start.
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Returns the initial client response for client-first mechanisms.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sasl`] if the response cannot be built.
    fn initial_response(&mut self) -> Result<Option<Vec<u8>>>;

    /// Answers a decoded server challenge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sasl`] if the challenge is unexpected; the exchange
    /// is then cancelled.
    fn exchange(&mut self, challenge: &[u8]) -> Result<Vec<u8>>;
}

/// PLAIN mechanism (RFC 4616).
///
/// Format: `<authzid>\0<username>\0<password>`.
pub struct Plain {
    authzid: String,
    username: String,
    password: String,
}

impl Plain {
    /// Creates a PLAIN mechanism with an empty authorization identity.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            authzid: String::new(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Sets the authorization identity.
    #[must_use]
    pub fn with_authzid(mut self, authzid: impl Into<String>) -> Self {
        self.authzid = authzid.into();
        self
    }

    fn message(&self) -> Vec<u8> {
        format!("{}\0{}\0{}", self.authzid, self.username, self.password).into_bytes()
    }
}

impl std::fmt::Debug for Plain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plain")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl SaslMechanism for Plain {
    fn name(&self) -> &'static str {
        "PLAIN"
    }

    fn client_first(&self) -> bool {
        true
    }

    fn initial_response(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(Some(self.message()))
    }

    fn exchange(&mut self, challenge: &[u8]) -> Result<Vec<u8>> {
        if challenge.is_empty() {
            Ok(self.message())
        } else {
            Err(Error::Sasl("PLAIN expects no challenge".to_string()))
        }
    }
}

/// LOGIN mechanism: answers a username prompt then a password prompt.
pub struct Login {
    username: String,
    password: String,
    step: u8,
}

impl Login {
    /// Creates a LOGIN mechanism.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            step: 0,
        }
    }
}

impl std::fmt::Debug for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Login")
            .field("username", &self.username)
            .field("step", &self.step)
            .finish_non_exhaustive()
    }
}

impl SaslMechanism for Login {
    fn name(&self) -> &'static str {
        "LOGIN"
    }

    fn client_first(&self) -> bool {
        false
    }

    fn initialize(&mut self) -> Result<()> {
        self.step = 0;
        Ok(())
    }

    fn initial_response(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn exchange(&mut self, _challenge: &[u8]) -> Result<Vec<u8>> {
        let response = match self.step {
            0 => self.username.as_bytes().to_vec(),
            1 => self.password.as_bytes().to_vec(),
            _ => return Err(Error::Sasl("LOGIN received a third challenge".to_string())),
        };
        self.step += 1;
        Ok(response)
    }
}

/// XOAUTH2 mechanism.
///
/// Format: `user=<user>\x01auth=Bearer <token>\x01\x01`. On failure the
/// server sends a JSON error as a challenge; the empty reply lets it finish
/// with a tagged NO.
pub struct XOAuth2 {
    user: String,
    token: String,
}

impl XOAuth2 {
    /// Creates an XOAUTH2 mechanism.
    pub fn new(user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for XOAuth2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XOAuth2")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl SaslMechanism for XOAuth2 {
    fn name(&self) -> &'static str {
        "XOAUTH2"
    }

    fn client_first(&self) -> bool {
        true
    }

    fn initial_response(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(Some(
            format!("user={}\x01auth=Bearer {}\x01\x01", self.user, self.token).into_bytes(),
        ))
    }

    fn exchange(&mut self, challenge: &[u8]) -> Result<Vec<u8>> {
        if challenge.is_empty() {
            return self.initial_response().map(Option::unwrap_or_default);
        }
        tracing::debug!(
            error = %String::from_utf8_lossy(challenge),
            "XOAUTH2 rejected"
        );
        Ok(Vec::new())
    }
}

/// OAUTHBEARER mechanism (RFC 7628).
///
/// Format: `n,a=<user>,\x01auth=Bearer <token>\x01\x01`.
pub struct OAuthBearer {
    user: String,
    token: String,
}

impl OAuthBearer {
    /// Creates an OAUTHBEARER mechanism.
    pub fn new(user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for OAuthBearer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthBearer")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl SaslMechanism for OAuthBearer {
    fn name(&self) -> &'static str {
        "OAUTHBEARER"
    }

    fn client_first(&self) -> bool {
        true
    }

    fn initial_response(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(Some(
            format!("n,a={},\x01auth=Bearer {}\x01\x01", self.user, self.token).into_bytes(),
        ))
    }

    fn exchange(&mut self, challenge: &[u8]) -> Result<Vec<u8>> {
        if challenge.is_empty() {
            return self.initial_response().map(Option::unwrap_or_default);
        }
        // RFC 7628 3.2.3: a failed exchange is acknowledged with ^A.
        Ok(vec![0x01])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_plain() {
        let mut plain = Plain::new("user@example.com", "password123");
        assert!(plain.client_first());
        assert_eq!(
            plain.initial_response().unwrap().unwrap(),
            b"\0user@example.com\0password123"
        );
        assert!(plain.exchange(b"unexpected").is_err());

        let mut proxied = Plain::new("admin", "secret").with_authzid("user");
        assert_eq!(
            proxied.initial_response().unwrap().unwrap(),
            b"user\0admin\0secret"
        );
    }

    #[test]
    fn test_plain_debug_hides_password() {
        let debug = format!("{:?}", Plain::new("user", "hunter2"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_login_steps() {
        let mut login = Login::new("user", "pass");
        assert!(!login.client_first());
        assert_eq!(login.initial_response().unwrap(), None);
        assert_eq!(login.exchange(b"Username:").unwrap(), b"user");
        assert_eq!(login.exchange(b"Password:").unwrap(), b"pass");
        assert!(matches!(login.exchange(b"?"), Err(Error::Sasl(_))));

        login.initialize().unwrap();
        assert_eq!(login.exchange(b"Username:").unwrap(), b"user");
    }

    #[test]
    fn test_xoauth2() {
        let mut xoauth2 = XOAuth2::new("user@example.com", "ya29.token");
        assert_eq!(
            xoauth2.initial_response().unwrap().unwrap(),
            b"user=user@example.com\x01auth=Bearer ya29.token\x01\x01"
        );
        let reply = xoauth2
            .exchange(br#"{"status":"401","schemes":"bearer"}"#)
            .unwrap();
        assert!(reply.is_empty());
    }

    #[test]
    fn test_oauthbearer() {
        let mut bearer = OAuthBearer::new("user@example.com", "token");
        assert_eq!(
            bearer.initial_response().unwrap().unwrap(),
            b"n,a=user@example.com,\x01auth=Bearer token\x01\x01"
        );
        assert_eq!(bearer.exchange(b"{}").unwrap(), vec![0x01]);
    }
}
