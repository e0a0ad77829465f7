//! Directory client operations.
//!
//! Each operation opens exactly one connection, performs exactly one bind
//! and (for search) one query, then releases the connection before
//! returning, on success and failure paths alike.

use ldap3::SearchEntry;
use tracing::debug;

use crate::config::ClientConfig;
use crate::connection::{DirectoryLink, SsoSession};
use crate::error::{DirectoryError, DirectoryResult};
use crate::mapper::{normalize, CleanEntry};
use crate::search::SearchRequest;

/// A configured directory client.
///
/// The configuration is immutable; concurrent operations on a shared client
/// are independent, each owning its own connection.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    config: ClientConfig,
    sso: Option<SsoSession>,
}

impl DirectoryClient {
    /// Creates a client from a finished configuration.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self { config, sso: None }
    }

    /// Creates a client carrying an explicit single-sign-on context.
    ///
    /// The context only takes effect when the configuration enables `sso`
    /// and its remote user matches the authenticating username.
    #[must_use]
    pub fn with_sso(config: ClientConfig, session: SsoSession) -> Self {
        Self {
            config,
            sso: Some(session),
        }
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Authenticates a user with a bind-only check.
    ///
    /// Returns `Ok(true)` when the bind succeeds; a refused bind surfaces as
    /// a `Bind` error, never as `Ok(false)`. Empty credentials fail with
    /// `InvalidCredentials` before any connection is attempted.
    pub async fn auth(&self, username: &str, password: &str) -> DirectoryResult<bool> {
        if username.is_empty() || password.is_empty() {
            return Err(DirectoryError::InvalidCredentials);
        }

        debug!(username = %username, "authenticating directory user");

        let link =
            DirectoryLink::establish(&self.config, Some((username, password)), self.sso.as_ref())
                .await?;
        link.release().await;

        Ok(true)
    }

    /// Searches the directory and normalizes the result.
    ///
    /// `pattern` replaces the filter template's `PATTERN` placeholder; `"*"`
    /// matches everything. Entries missing any configured field are dropped;
    /// zero matching entries is a valid empty result.
    pub async fn search(&self, pattern: &str) -> DirectoryResult<Vec<CleanEntry>> {
        let raw = self.run_search(pattern).await?;
        Ok(normalize(raw, &self.config.fields))
    }

    /// Searches the directory and returns the transport's raw entries.
    pub async fn search_raw(&self, pattern: &str) -> DirectoryResult<Vec<SearchEntry>> {
        self.run_search(pattern).await
    }

    /// One search lifecycle: prepare, establish, query, release.
    async fn run_search(&self, pattern: &str) -> DirectoryResult<Vec<SearchEntry>> {
        let request = SearchRequest::prepare(&self.config, pattern)?;

        let bind = self
            .config
            .account
            .as_ref()
            .map(|account| (account.username.as_str(), account.password.as_str()));

        let mut link = DirectoryLink::establish(&self.config, bind, self.sso.as_ref()).await?;
        let outcome = request.execute(&mut link).await;
        link.release().await;

        outcome
    }
}
