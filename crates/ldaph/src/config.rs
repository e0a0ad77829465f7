//! Directory client configuration.
//!
//! [`ClientConfig`] is an immutable value object produced by
//! [`ClientConfigBuilder`]; operations take it by read-only reference, so a
//! partially-configured client can never be observed mid-operation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DirectoryError, DirectoryResult};

// ============================================================================
// Protocol version and search scope
// ============================================================================

/// LDAP protocol version requested for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProtocolVersion {
    /// LDAPv2 (accepted in configuration; the transport cannot speak it).
    V2,
    /// LDAPv3.
    #[default]
    V3,
}

impl ProtocolVersion {
    /// Returns the numeric protocol version.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::V2 => 2,
            Self::V3 => 3,
        }
    }
}

/// LDAP search scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchScope {
    /// Search only the base DN.
    Base,
    /// Search one level below the base DN.
    OneLevel,
    /// Search the entire subtree.
    #[default]
    Subtree,
}

impl SearchScope {
    /// Converts to the ldap3 scope.
    #[must_use]
    pub const fn to_ldap3(self) -> ldap3::Scope {
        match self {
            Self::Base => ldap3::Scope::Base,
            Self::OneLevel => ldap3::Scope::OneLevel,
            Self::Subtree => ldap3::Scope::Subtree,
        }
    }
}

// ============================================================================
// Templates
// ============================================================================

/// Bind-DN template containing the literal `USERNAME` placeholder.
///
/// Substitution is exact string replacement, never escaped; callers are
/// responsible for not injecting filter or DN syntax through the username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BindDnTemplate(String);

impl BindDnTemplate {
    /// Placeholder replaced by the bind username.
    pub const PLACEHOLDER: &'static str = "USERNAME";

    /// Creates a template, stripping spaces and requiring the placeholder.
    pub fn new(template: impl Into<String>) -> DirectoryResult<Self> {
        let template: String = template.into().replace(' ', "");
        if template.is_empty() {
            return Err(DirectoryError::config("bind DN template cannot be empty"));
        }
        if !template.contains(Self::PLACEHOLDER) {
            return Err(DirectoryError::config(format!(
                "bind DN template must contain the {} placeholder",
                Self::PLACEHOLDER
            )));
        }
        Ok(Self(template))
    }

    /// Substitutes the placeholder with the supplied username.
    #[must_use]
    pub fn substitute(&self, username: &str) -> String {
        self.0.replace(Self::PLACEHOLDER, username)
    }

    /// Returns the raw template string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BindDnTemplate {
    type Error = DirectoryError;

    fn try_from(value: String) -> DirectoryResult<Self> {
        Self::new(value)
    }
}

impl From<BindDnTemplate> for String {
    fn from(template: BindDnTemplate) -> Self {
        template.0
    }
}

/// Search filter template containing the literal `PATTERN` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SearchFilterTemplate(String);

impl SearchFilterTemplate {
    /// Placeholder replaced by the search pattern.
    pub const PLACEHOLDER: &'static str = "PATTERN";

    /// Creates a template, stripping spaces and requiring the placeholder.
    pub fn new(template: impl Into<String>) -> DirectoryResult<Self> {
        let template: String = template.into().replace(' ', "");
        if template.is_empty() {
            return Err(DirectoryError::config("search filter template cannot be empty"));
        }
        if !template.contains(Self::PLACEHOLDER) {
            return Err(DirectoryError::config(format!(
                "search filter template must contain the {} placeholder",
                Self::PLACEHOLDER
            )));
        }
        Ok(Self(template))
    }

    /// Substitutes the placeholder with the supplied pattern.
    #[must_use]
    pub fn substitute(&self, pattern: &str) -> String {
        self.0.replace(Self::PLACEHOLDER, pattern)
    }

    /// Returns the raw template string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SearchFilterTemplate {
    type Error = DirectoryError;

    fn try_from(value: String) -> DirectoryResult<Self> {
        Self::new(value)
    }
}

impl From<SearchFilterTemplate> for String {
    fn from(template: SearchFilterTemplate) -> Self {
        template.0
    }
}

// ============================================================================
// Stored account
// ============================================================================

/// Service account used by `search` to bind before querying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Bind username, substituted into the bind-DN template.
    pub username: String,

    /// Bind password.
    #[serde(skip_serializing)]
    pub password: String,
}

// ============================================================================
// Client configuration
// ============================================================================

/// Immutable directory client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Directory server host name or IP address.
    pub server: String,

    /// Directory server port (default 389).
    pub port: u16,

    /// Protocol version requested for the session.
    pub version: ProtocolVersion,

    /// Connect with an `ldaps://` scheme (TLS from connection start).
    pub ssl: bool,

    /// Upgrade a plain session with StartTLS.
    pub tls: bool,

    /// Enable the SASL/GSSAPI single-sign-on bind path.
    pub sso: bool,

    /// Template for the bind DN, required for simple binds.
    pub bind_dn: Option<BindDnTemplate>,

    /// Base DN under which searches are performed.
    pub base_dn: Option<String>,

    /// Template for the search filter.
    pub filter: Option<SearchFilterTemplate>,

    /// Stored account used by `search`; `None` means anonymous bind.
    pub account: Option<Account>,

    /// Attributes requested from the directory; empty means all.
    pub fields: Vec<String>,

    /// Search scope (default subtree).
    pub scope: SearchScope,

    /// Connect timeout; `None` leaves the transport default in place.
    pub connect_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Creates a configuration builder for the given server and port.
    #[must_use]
    pub fn builder(server: impl Into<String>, port: u16) -> ClientConfigBuilder {
        ClientConfigBuilder::new(server, port)
    }

    /// Returns the transport URL for this configuration.
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if self.ssl { "ldaps" } else { "ldap" };
        format!("{scheme}://{}:{}", self.server, self.port)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> DirectoryResult<()> {
        if self.server.is_empty() {
            return Err(DirectoryError::config("server cannot be empty"));
        }
        if self.port == 0 {
            return Err(DirectoryError::config("port must be between 1 and 65535"));
        }
        if self.ssl && self.tls {
            return Err(DirectoryError::config(
                "ssl and tls are mutually exclusive: an ldaps:// session cannot be upgraded with StartTLS",
            ));
        }
        if self.sso && !cfg!(feature = "sso") {
            return Err(DirectoryError::unsupported(
                "SASL/GSSAPI binds require the `sso` crate feature",
            ));
        }
        if let Some(account) = &self.account {
            if account.username.is_empty() || account.password.is_empty() {
                return Err(DirectoryError::InvalidCredentials);
            }
        }
        Ok(())
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    server: String,
    port: u16,
    version: ProtocolVersion,
    ssl: bool,
    tls: bool,
    sso: bool,
    bind_dn: Option<String>,
    base_dn: Option<String>,
    filter: Option<String>,
    account: Option<(String, String)>,
    fields: Vec<String>,
    scope: SearchScope,
    connect_timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Creates a builder with defaults: LDAPv3, plain transport, port as given.
    #[must_use]
    pub fn new(server: impl Into<String>, port: u16) -> Self {
        Self {
            server: server.into(),
            port,
            version: ProtocolVersion::default(),
            ssl: false,
            tls: false,
            sso: false,
            bind_dn: None,
            base_dn: None,
            filter: None,
            account: None,
            fields: Vec::new(),
            scope: SearchScope::default(),
            connect_timeout: None,
        }
    }

    /// Sets the search base DN. Spaces are stripped.
    #[must_use]
    pub fn base(mut self, dc: impl Into<String>) -> Self {
        self.base_dn = Some(dc.into().replace(' ', ""));
        self
    }

    /// Sets the bind-DN template (must contain `USERNAME`).
    #[must_use]
    pub fn dn(mut self, template: impl Into<String>) -> Self {
        self.bind_dn = Some(template.into());
        self
    }

    /// Sets the protocol version.
    #[must_use]
    pub const fn version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }

    /// Enables or disables the `ldaps://` scheme.
    #[must_use]
    pub const fn ssl(mut self, ssl: bool) -> Self {
        self.ssl = ssl;
        self
    }

    /// Enables or disables StartTLS on a plain session.
    #[must_use]
    pub const fn tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Enables or disables the SASL/GSSAPI single-sign-on bind path.
    #[must_use]
    pub const fn sso(mut self, sso: bool) -> Self {
        self.sso = sso;
        self
    }

    /// Sets the stored account used by `search`.
    #[must_use]
    pub fn account(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.account = Some((username.into(), password.into()));
        self
    }

    /// Sets the search filter template (must contain `PATTERN`).
    ///
    /// An empty template clears a previously-set one.
    #[must_use]
    pub fn filter(mut self, template: impl Into<String>) -> Self {
        let template: String = template.into();
        self.filter = if template.is_empty() { None } else { Some(template) };
        self
    }

    /// Replaces the requested result fields. An empty list requests all.
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Requests a single result field, replacing any previous list.
    #[must_use]
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.fields = vec![field.into()];
        self
    }

    /// Sets the search scope.
    #[must_use]
    pub const fn scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidConfig` for an empty server, port 0, a template
    /// missing its placeholder, or `ssl` combined with `tls`;
    /// `InvalidCredentials` for an account with an empty part; and
    /// `UnsupportedFeature` when `sso` is requested without SASL/GSSAPI
    /// support compiled in.
    pub fn build(self) -> DirectoryResult<ClientConfig> {
        let bind_dn = self.bind_dn.map(BindDnTemplate::new).transpose()?;
        let filter = self.filter.map(SearchFilterTemplate::new).transpose()?;

        let base_dn = match self.base_dn {
            Some(dc) if dc.is_empty() => {
                return Err(DirectoryError::config("search base DN cannot be empty"));
            }
            other => other,
        };

        let config = ClientConfig {
            server: self.server,
            port: self.port,
            version: self.version,
            ssl: self.ssl,
            tls: self.tls,
            sso: self.sso,
            bind_dn,
            base_dn,
            filter,
            account: self
                .account
                .map(|(username, password)| Account { username, password }),
            fields: self.fields,
            scope: self.scope,
            connect_timeout: self.connect_timeout,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> ClientConfigBuilder {
        ClientConfig::builder("ldap.example.org", 389)
    }

    #[test]
    fn defaults() {
        let config = builder().build().unwrap();
        assert_eq!(config.port, 389);
        assert_eq!(config.version, ProtocolVersion::V3);
        assert_eq!(config.scope, SearchScope::Subtree);
        assert!(!config.ssl);
        assert!(!config.tls);
        assert!(!config.sso);
        assert!(config.fields.is_empty());
        assert!(config.connect_timeout.is_none());
    }

    #[test]
    fn url_scheme_follows_ssl_flag() {
        let plain = builder().build().unwrap();
        assert_eq!(plain.url(), "ldap://ldap.example.org:389");

        let ssl = ClientConfig::builder("ldap.example.org", 636)
            .ssl(true)
            .build()
            .unwrap();
        assert_eq!(ssl.url(), "ldaps://ldap.example.org:636");
    }

    #[test]
    fn rejects_empty_server() {
        let result = ClientConfig::builder("", 389).build();
        assert!(matches!(result, Err(DirectoryError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_port_zero() {
        let result = ClientConfig::builder("ldap.example.org", 0).build();
        assert!(matches!(result, Err(DirectoryError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_ssl_with_tls() {
        let result = builder().ssl(true).tls(true).build();
        assert!(matches!(result, Err(DirectoryError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_template_without_placeholder() {
        let result = builder().dn("uid=admin,dc=example,dc=com").build();
        assert!(matches!(result, Err(DirectoryError::InvalidConfig(_))));

        let result = builder().filter("(uid=*)").build();
        assert!(matches!(result, Err(DirectoryError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_account_with_empty_part() {
        let result = builder().account("svc", "").build();
        assert!(matches!(result, Err(DirectoryError::InvalidCredentials)));

        let result = builder().account("", "secret").build();
        assert!(matches!(result, Err(DirectoryError::InvalidCredentials)));
    }

    #[cfg(not(feature = "sso"))]
    #[test]
    fn rejects_sso_without_feature() {
        let result = builder().sso(true).build();
        assert!(matches!(result, Err(DirectoryError::UnsupportedFeature(_))));
        assert_eq!(result.unwrap_err().code(), 1408);
    }

    #[test]
    fn substitution_is_exact_string_replacement() {
        let dn = BindDnTemplate::new("uid=USERNAME,dc=example,dc=com").unwrap();
        assert_eq!(dn.substitute("alice"), "uid=alice,dc=example,dc=com");

        let filter = SearchFilterTemplate::new("(uid=PATTERN)").unwrap();
        assert_eq!(filter.substitute("*"), "(uid=*)");
        assert_eq!(filter.substitute("a*b"), "(uid=a*b)");
    }

    #[test]
    fn templates_and_base_strip_spaces() {
        let config = builder()
            .base("dc=example, dc=com")
            .dn("uid=USERNAME, dc=example, dc=com")
            .filter("(uid=PATTERN) ")
            .build()
            .unwrap();

        assert_eq!(config.base_dn.as_deref(), Some("dc=example,dc=com"));
        assert_eq!(
            config.bind_dn.unwrap().as_str(),
            "uid=USERNAME,dc=example,dc=com"
        );
        assert_eq!(config.filter.unwrap().as_str(), "(uid=PATTERN)");
    }

    #[test]
    fn single_field_replaces_list() {
        let config = builder()
            .fields(["mail", "sn", "cn"])
            .field("uid")
            .build()
            .unwrap();
        assert_eq!(config.fields, vec!["uid".to_string()]);
    }

    #[test]
    fn empty_filter_clears_template() {
        let config = builder().filter("(uid=PATTERN)").filter("").build().unwrap();
        assert!(config.filter.is_none());
    }

    #[test]
    fn template_deserialization_enforces_placeholder() {
        let ok: Result<BindDnTemplate, _> =
            serde_json::from_str("\"uid=USERNAME,dc=example,dc=com\"");
        assert!(ok.is_ok());

        let bad: Result<BindDnTemplate, _> = serde_json::from_str("\"uid=admin\"");
        assert!(bad.is_err());
    }
}
