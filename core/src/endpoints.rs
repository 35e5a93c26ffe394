//! Endpoint table: domain → operation → path suffix.
//!
//! Every URL the client produces goes through this table. Paths are checked
//! once when the table is built, so a lookup either yields a clean suffix or
//! fails with `ConfigError::UnknownEndpoint`.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::ConfigError;

/// Names one entry of an [`EndpointTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointKey<'a> {
    pub domain: &'a str,
    pub operation: &'a str,
}

impl<'a> EndpointKey<'a> {
    pub const fn new(domain: &'a str, operation: &'a str) -> Self {
        Self { domain, operation }
    }
}

impl EndpointKey<'static> {
    pub const LOCATIONS_GET_ALL: Self = Self::new("LOCATIONS", "GET_ALL");
    pub const USER_PROFILE: Self = Self::new("USER", "PROFILE");
    pub const USER_UPDATE: Self = Self::new("USER", "UPDATE");
    pub const AUTH_SEND_OTP: Self = Self::new("AUTH", "SEND_OTP");
    pub const AUTH_VERIFY_OTP_MOBILE: Self = Self::new("AUTH", "VERIFY_OTP_MOBILE");
    pub const CART_ADD_OR_UPDATE: Self = Self::new("CART", "ADD_OR_UPDATE");
}

impl fmt::Display for EndpointKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.operation)
    }
}

const STANDARD: &[(&str, &str, &str)] = &[
    ("LOCATIONS", "GET_ALL", "/locations/getAll"),
    ("USER", "PROFILE", "/users/get"),
    ("USER", "UPDATE", "/users/update"),
    ("AUTH", "SEND_OTP", "/auth/send-otp"),
    ("AUTH", "VERIFY_OTP_MOBILE", "/auth/verify-otp-mobile"),
    ("CART", "ADD_OR_UPDATE", "/carts/add-or-update"),
];

/// Immutable mapping from endpoint keys to path suffixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTable {
    domains: BTreeMap<String, BTreeMap<String, String>>,
}

impl EndpointTable {
    /// The storefront backend's endpoints.
    pub fn standard() -> Self {
        let mut domains: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for (domain, operation, path) in STANDARD {
            domains
                .entry((*domain).to_string())
                .or_default()
                .insert((*operation).to_string(), (*path).to_string());
        }
        Self { domains }
    }

    pub fn builder() -> EndpointTableBuilder {
        EndpointTableBuilder::default()
    }

    /// Path suffix for `key`.
    pub fn path(&self, key: EndpointKey<'_>) -> Result<&str, ConfigError> {
        self.domains
            .get(key.domain)
            .and_then(|ops| ops.get(key.operation))
            .map(String::as_str)
            .ok_or_else(|| ConfigError::UnknownEndpoint {
                domain: key.domain.to_string(),
                operation: key.operation.to_string(),
            })
    }

    pub fn contains(&self, key: EndpointKey<'_>) -> bool {
        self.path(key).is_ok()
    }

    /// All entries in domain, then operation order.
    pub fn entries(&self) -> impl Iterator<Item = (EndpointKey<'_>, &str)> {
        self.domains.iter().flat_map(|(domain, ops)| {
            ops.iter()
                .map(move |(op, path)| (EndpointKey::new(domain, op), path.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.domains.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EndpointTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Collects entries and validates them in [`build`](Self::build).
#[derive(Debug, Default)]
pub struct EndpointTableBuilder {
    entries: Vec<(String, String, String)>,
}

impl EndpointTableBuilder {
    /// Start from the standard table.
    pub fn with_standard(mut self) -> Self {
        for (domain, operation, path) in STANDARD {
            self = self.endpoint(*domain, *operation, *path);
        }
        self
    }

    /// Add or replace one entry.
    pub fn endpoint(
        mut self,
        domain: impl Into<String>,
        operation: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        self.entries.push((domain.into(), operation.into(), path.into()));
        self
    }

    pub fn build(self) -> Result<EndpointTable, ConfigError> {
        let mut domains: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for (domain, operation, path) in self.entries {
            if let Err(reason) = check_path(&path) {
                return Err(ConfigError::InvalidEndpointPath {
                    domain,
                    operation,
                    path,
                    reason,
                });
            }
            domains.entry(domain).or_default().insert(operation, path);
        }
        Ok(EndpointTable { domains })
    }
}

fn check_path(path: &str) -> Result<(), &'static str> {
    if path.is_empty() {
        return Err("path is empty");
    }
    if !path.starts_with('/') {
        return Err("path must start with '/'");
    }
    if path.len() > 1 && path.ends_with('/') {
        return Err("path must not end with '/'");
    }
    if path.contains("//") {
        return Err("path contains a duplicated separator");
    }
    if path.chars().any(char::is_whitespace) {
        return Err("path contains whitespace");
    }
    if path.contains(['?', '#']) {
        return Err("path must not carry a query or fragment");
    }
    if path.split('/').any(|segment| segment == "undefined" || segment == "null") {
        return Err("path contains a placeholder segment");
    }
    Ok(())
}
