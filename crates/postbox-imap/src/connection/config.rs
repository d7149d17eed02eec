//! Where to connect and how long to wait.
//!
//! A [`Config`] is plain data: the host and port to dial, the
//! [`Security`] mode, the TLS trust roots and the [`Timeouts`] the
//! connection applies to every read and write. Nothing here is global, so
//! two connections with different trust settings can coexist.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// How the transport is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// Cleartext for the whole session.
    None,
    /// Cleartext until a STARTTLS transaction upgrades the stream.
    StartTls,
    /// TLS handshake before the greeting.
    #[default]
    Implicit,
}

impl Security {
    /// IANA port for the mode: `imaps` for implicit TLS, `imap` otherwise.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        if matches!(self, Self::Implicit) { 993 } else { 143 }
    }
}

/// Certificate trust used for TLS handshakes.
#[derive(Clone, Default)]
pub enum TlsConfig {
    /// Mozilla's root program via `webpki-roots`.
    #[default]
    WebPki,
    /// A prepared rustls configuration (private CA, client certificate).
    Custom(Arc<rustls::ClientConfig>),
}

impl TlsConfig {
    /// Rustls configuration for the handshake.
    #[must_use]
    pub fn client_config(&self) -> Arc<rustls::ClientConfig> {
        if let Self::Custom(prepared) = self {
            return Arc::clone(prepared);
        }
        let roots: rustls::RootCertStore = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
        Arc::new(
            rustls::ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth(),
        )
    }
}

impl fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WebPki => "WebPki",
            Self::Custom(_) => "Custom(..)",
        })
    }
}

/// Deadlines applied by the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// TCP connect.
    pub connect: Duration,
    /// Waiting for one complete response.
    pub receive: Duration,
    /// Flushing one command or continuation.
    pub send: Duration,
    /// Read slice while idling. Expiry only means the server had nothing to
    /// say, so the IDLE loop can check for a DONE request.
    pub idle_poll: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            receive: Duration::from_secs(60),
            send: Duration::from_secs(60),
            idle_poll: Duration::from_secs(1),
        }
    }
}

/// Connection settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to dial; also the TLS server name.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Transport security.
    pub security: Security,
    /// Read and write deadlines.
    pub timeouts: Timeouts,
    /// Trust roots for TLS.
    pub tls: TlsConfig,
}

impl Config {
    /// Implicit TLS on port 993 with default timeouts.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self::builder(host).build()
    }

    /// Starts a [`ConfigBuilder`] for `host`.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder {
            config: Self {
                host: host.into(),
                port: 0,
                security: Security::default(),
                timeouts: Timeouts::default(),
                tls: TlsConfig::default(),
            },
            port: None,
        }
    }

    /// `host:port` for dialing.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Incremental [`Config`] construction. The port follows the security mode
/// unless set explicitly.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
    port: Option<u16>,
}

impl ConfigBuilder {
    /// Fixes the port regardless of security mode.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Chooses the transport security.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.config.security = security;
        self
    }

    /// Replaces every deadline at once.
    #[must_use]
    pub const fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.config.timeouts = timeouts;
        self
    }

    /// TCP connect deadline.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeouts.connect = timeout;
        self
    }

    /// Deadline for each response.
    #[must_use]
    pub const fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeouts.receive = timeout;
        self
    }

    /// Deadline for each write.
    #[must_use]
    pub const fn send_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeouts.send = timeout;
        self
    }

    /// Read slice while idling.
    #[must_use]
    pub const fn idle_poll_interval(mut self, interval: Duration) -> Self {
        self.config.timeouts.idle_poll = interval;
        self
    }

    /// TLS trust roots.
    #[must_use]
    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.config.tls = tls;
        self
    }

    /// Finishes the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        let mut config = self.config;
        config.port = self.port.unwrap_or_else(|| config.security.default_port());
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_follows_security() {
        assert_eq!(Config::new("mail.example.org").port, 993);
        let starttls = Config::builder("mail.example.org")
            .security(Security::StartTls)
            .build();
        assert_eq!(starttls.port, 143);
        assert_eq!(starttls.address(), "mail.example.org:143");
    }

    #[test]
    fn explicit_port_survives_security_change() {
        let config = Config::builder("localhost")
            .port(1143)
            .security(Security::None)
            .build();
        assert_eq!(config.address(), "localhost:1143");
    }

    #[test]
    fn individual_timeouts_override_defaults() {
        let config = Config::builder("localhost")
            .receive_timeout(Duration::from_secs(5))
            .idle_poll_interval(Duration::from_millis(250))
            .build();
        assert_eq!(config.timeouts.receive, Duration::from_secs(5));
        assert_eq!(config.timeouts.idle_poll, Duration::from_millis(250));
        assert_eq!(config.timeouts.connect, Timeouts::default().connect);
    }

    #[test]
    fn webpki_roots_are_loaded() {
        let config = TlsConfig::default().client_config();
        assert!(config.alpn_protocols.is_empty());
        assert_eq!(format!("{:?}", TlsConfig::Custom(config)), "Custom(..)");
    }
}
