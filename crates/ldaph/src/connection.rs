//! Directory connection lifecycle.
//!
//! A [`DirectoryLink`] is one open, possibly TLS-upgraded, possibly-bound
//! session. It is owned exclusively by the operation that created it and is
//! always released before the operation returns, on success and failure
//! paths alike: bind failures are torn down inside [`DirectoryLink::establish`],
//! and callers hold a single [`DirectoryLink::release`] point after that.

use ldap3::{Ldap, LdapConnAsync, LdapConnSettings};
use tracing::{debug, warn};

use crate::config::{ClientConfig, ProtocolVersion};
use crate::error::{DirectoryError, DirectoryResult};

/// Explicit single-sign-on context for the SASL/GSSAPI bind path.
///
/// The remote-user identity and Kerberos credential cache are parameters,
/// not ambient state; [`SsoSession::from_env`] is the one place that reads
/// the process environment, for callers sitting at that boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsoSession {
    /// Externally-authenticated remote user identity.
    pub remote_user: String,

    /// Kerberos credential-cache reference, exported as `KRB5CCNAME`
    /// before the GSSAPI bind.
    pub credential_cache: String,
}

impl SsoSession {
    /// Creates an SSO context from explicit values.
    #[must_use]
    pub fn new(remote_user: impl Into<String>, credential_cache: impl Into<String>) -> Self {
        Self {
            remote_user: remote_user.into(),
            credential_cache: credential_cache.into(),
        }
    }

    /// Reads `REMOTE_USER` and `KRB5CCNAME` from the process environment.
    ///
    /// Returns `None` unless both are present and non-empty.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let remote_user = std::env::var("REMOTE_USER").ok()?;
        let credential_cache = std::env::var("KRB5CCNAME").ok()?;
        if remote_user.is_empty() || credential_cache.is_empty() {
            return None;
        }
        Some(Self {
            remote_user,
            credential_cache,
        })
    }
}

/// The bind mode chosen for one connection. Exactly one applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BindMode {
    /// SASL/GSSAPI bind with no explicit principal or credentials.
    Sso {
        /// Credential cache exported as `KRB5CCNAME` before binding.
        credential_cache: String,
    },
    /// Bind with no credentials.
    Anonymous,
    /// Bind with a templated DN and password.
    Simple {
        /// Fully-substituted bind DN.
        dn: String,
        /// Bind password.
        password: String,
    },
}

impl BindMode {
    /// Selects the bind mode for this call, in priority order: SSO when the
    /// configuration enables it and the supplied context matches the caller,
    /// anonymous when no credentials were supplied, simple otherwise.
    pub(crate) fn select(
        config: &ClientConfig,
        bind: Option<(&str, &str)>,
        sso: Option<&SsoSession>,
    ) -> DirectoryResult<Self> {
        if config.sso {
            if let (Some((username, _)), Some(session)) = (bind, sso) {
                if session.remote_user == username && !session.credential_cache.is_empty() {
                    return Ok(Self::Sso {
                        credential_cache: session.credential_cache.clone(),
                    });
                }
            }
        }

        match bind {
            None => Ok(Self::Anonymous),
            Some((username, password)) => {
                let template = config.bind_dn.as_ref().ok_or_else(|| {
                    DirectoryError::config("a bind DN template is required for a simple bind")
                })?;
                Ok(Self::Simple {
                    dn: template.substitute(username),
                    password: password.to_string(),
                })
            }
        }
    }
}

/// An open directory session.
pub struct DirectoryLink {
    ldap: Ldap,
}

impl DirectoryLink {
    /// Opens a transport to the configured server and binds it.
    ///
    /// `bind` carries the caller's username and password; `None` selects an
    /// anonymous bind. A partially-established session is unbound before any
    /// error is returned.
    pub async fn establish(
        config: &ClientConfig,
        bind: Option<(&str, &str)>,
        sso: Option<&SsoSession>,
    ) -> DirectoryResult<Self> {
        if config.version == ProtocolVersion::V2 {
            return Err(DirectoryError::unsupported(
                "the transport speaks LDAPv3 only; protocol version 2 is unavailable",
            ));
        }

        let mode = BindMode::select(config, bind, sso)?;

        let url = config.url();
        let mut settings = LdapConnSettings::new().set_starttls(config.tls);
        if let Some(timeout) = config.connect_timeout {
            settings = settings.set_conn_timeout(timeout);
        }

        debug!(url = %url, starttls = config.tls, "connecting to directory");

        let (conn, ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| {
                // The transport negotiates StartTLS inside the connect call,
                // so the upgrade request decides the failure class.
                if config.tls {
                    DirectoryError::tls(e.to_string())
                } else {
                    DirectoryError::connect(e.to_string())
                }
            })?;
        ldap3::drive!(conn);

        let mut link = Self { ldap };
        if let Err(err) = link.bind(mode, &config.server).await {
            link.release().await;
            return Err(err);
        }

        Ok(link)
    }

    /// Performs the selected bind on this session.
    async fn bind(&mut self, mode: BindMode, server: &str) -> DirectoryResult<()> {
        match mode {
            BindMode::Sso { credential_cache } => {
                debug!("binding via SASL/GSSAPI");
                self.sasl_bind(&credential_cache, server).await
            }
            BindMode::Anonymous => {
                debug!("binding anonymously");
                self.simple_bind("", "").await
            }
            BindMode::Simple { dn, password } => {
                debug!(dn = %dn, "binding with simple credentials");
                self.simple_bind(&dn, &password).await
            }
        }
    }

    async fn simple_bind(&mut self, dn: &str, password: &str) -> DirectoryResult<()> {
        self.ldap
            .simple_bind(dn, password)
            .await
            .map_err(|e| DirectoryError::bind(e.to_string()))?
            .success()
            .map_err(|e| DirectoryError::bind(e.to_string()))?;
        Ok(())
    }

    #[cfg(feature = "sso")]
    async fn sasl_bind(&mut self, credential_cache: &str, server: &str) -> DirectoryResult<()> {
        // The GSSAPI library resolves the ticket through KRB5CCNAME.
        std::env::set_var("KRB5CCNAME", credential_cache);
        self.ldap
            .sasl_gssapi_bind(server)
            .await
            .map_err(|e| DirectoryError::bind(e.to_string()))?
            .success()
            .map_err(|e| DirectoryError::bind(e.to_string()))?;
        Ok(())
    }

    #[cfg(not(feature = "sso"))]
    async fn sasl_bind(&mut self, _credential_cache: &str, _server: &str) -> DirectoryResult<()> {
        Err(DirectoryError::unsupported(
            "SASL/GSSAPI binds require the `sso` crate feature",
        ))
    }

    /// Returns a mutable handle to the underlying session.
    pub(crate) fn ldap_mut(&mut self) -> &mut Ldap {
        &mut self.ldap
    }

    /// Unbinds the session, consuming the link.
    pub async fn release(mut self) {
        if let Err(error) = self.ldap.unbind().await {
            warn!(%error, "failed to unbind directory session");
        }
    }
}
