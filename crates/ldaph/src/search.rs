//! Directory search execution.

use ldap3::{Scope, SearchEntry, SearchOptions};
use tracing::debug;

use crate::config::ClientConfig;
use crate::connection::DirectoryLink;
use crate::error::{DirectoryError, DirectoryResult};

/// A fully-prepared search: substituted filter, base DN, scope and the
/// requested attribute list. Preparation is pure and fails before any
/// connection is attempted when the configuration is incomplete.
pub(crate) struct SearchRequest<'a> {
    base: &'a str,
    filter: String,
    scope: Scope,
    attrs: &'a [String],
}

impl<'a> SearchRequest<'a> {
    /// Builds the effective search from the configuration and pattern.
    pub(crate) fn prepare(config: &'a ClientConfig, pattern: &str) -> DirectoryResult<Self> {
        let base = config
            .base_dn
            .as_deref()
            .ok_or_else(|| DirectoryError::config("a search base DN is required for search"))?;
        let template = config
            .filter
            .as_ref()
            .ok_or_else(|| DirectoryError::config("a search filter template is required for search"))?;

        Ok(Self {
            base,
            filter: template.substitute(pattern),
            scope: config.scope.to_ldap3(),
            attrs: &config.fields,
        })
    }

    /// Returns the substituted filter string.
    #[cfg(test)]
    pub(crate) fn filter(&self) -> &str {
        &self.filter
    }

    /// Runs the search on an established link.
    ///
    /// The session size limit is lifted first. A transport-level failure of
    /// the search call is a `Search` error; a server-reported non-success
    /// result at retrieval is an `Entries` error. Zero matching entries is a
    /// valid empty result.
    pub(crate) async fn execute(
        &self,
        link: &mut DirectoryLink,
    ) -> DirectoryResult<Vec<SearchEntry>> {
        debug!(base = %self.base, filter = %self.filter, "searching directory");

        let attrs: Vec<&str> = self.attrs.iter().map(String::as_str).collect();

        let response = link
            .ldap_mut()
            .with_search_options(SearchOptions::new().sizelimit(0))
            .search(self.base, self.scope, &self.filter, attrs)
            .await
            .map_err(|e| DirectoryError::search(e.to_string()))?;

        let (entries, _result) = response
            .success()
            .map_err(|e| DirectoryError::entries(e.to_string()))?;

        debug!(count = entries.len(), "directory search returned");

        Ok(entries.into_iter().map(SearchEntry::construct).collect())
    }
}

/// Escapes a value for interpolation into an LDAP search filter (RFC 4515).
///
/// Template substitution itself is literal; this helper is for callers that
/// interpolate untrusted text into a pattern.
#[must_use]
pub fn escape_filter_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\5c"),
            '*' => result.push_str("\\2a"),
            '(' => result.push_str("\\28"),
            ')' => result.push_str("\\29"),
            '\0' => result.push_str("\\00"),
            _ => result.push(c),
        }
    }
    result
}
