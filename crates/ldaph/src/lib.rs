//! # ldaph
//!
//! A small configurable LDAP directory client built on `ldap3`.
//!
//! An immutable [`ClientConfig`] (produced by a builder) carries the
//! connection parameters: server, port, protocol version, SSL/StartTLS/SSO
//! flags, bind-DN template, search base, filter template, stored account and
//! result field filter. A [`DirectoryClient`] exposes two operations:
//!
//! - [`DirectoryClient::auth`]: bind-only authentication check;
//! - [`DirectoryClient::search`]: bind with the stored account, run a
//!   substituted filter, and normalize the result into flat records.
//!
//! Every operation opens one connection and releases it before returning,
//! on success and failure paths alike. SASL/GSSAPI single sign-on is
//! available behind the `sso` feature.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod mapper;
pub mod search;

pub use client::DirectoryClient;
pub use config::{
    Account, BindDnTemplate, ClientConfig, ClientConfigBuilder, ProtocolVersion,
    SearchFilterTemplate, SearchScope,
};
pub use connection::{DirectoryLink, SsoSession};
pub use error::{DirectoryError, DirectoryResult};
pub use mapper::{normalize, AttrValue, CleanEntry};
pub use search::escape_filter_value;
