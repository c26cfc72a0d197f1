// dkim-keylen – DKIM public key length checker
// Copyright © 2022–2023 David Bürgin <dbuergin@gluet.ch>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.

//! DKIM key record queries.

use crate::lookup::DnsError;
use std::{net::SocketAddr, time::Duration};

/// A request to look up the DKIM public key record of a selector and domain.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DkimQuery {
    pub selector: String,
    pub domain: String,
    /// The nameserver to query. If absent the system resolver configuration
    /// is used.
    pub nameserver: Option<SocketAddr>,
    /// The maximum duration of the lookup.
    pub timeout: Duration,
}

impl DkimQuery {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(selector: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            domain: domain.into(),
            nameserver: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_nameserver(mut self, nameserver: SocketAddr) -> Self {
        self.nameserver = Some(nameserver);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the absolute name of the key record in A-label form, eg
    /// `sel._domainkey.example.com.`.
    pub fn record_name(&self) -> Result<String, DnsError> {
        let selector = self.selector.as_str();
        let domain = self.domain.strip_suffix('.').unwrap_or(&self.domain);

        // lenient: selectors like "dkim_123" are common
        if !selector.split('.').all(is_label) || !is_valid_domain(domain) {
            return Err(DnsError::InvalidName);
        }

        let name = format!("{selector}._domainkey.{domain}");

        let name = idna::domain_to_ascii(&name).map_err(|_| DnsError::InvalidName)?;

        if name.len() > MAX_DOMAIN_LENGTH {
            return Err(DnsError::InvalidName);
        }

        Ok(format!("{name}."))
    }
}

const MAX_DOMAIN_LENGTH: usize = 253;

fn is_valid_domain(s: &str) -> bool {
    matches!(s.len(), 1..=MAX_DOMAIN_LENGTH) && s.split('.').all(is_label)
}

fn is_label(s: &str) -> bool {
    matches!(s.len(), 1..=63)
        && !s.starts_with('-')
        && !s.ends_with('-')
        && s.chars().all(|c| matches!(c, '!'..=':' | '<'..='~') || !c.is_ascii())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_name_ok() {
        let name = |selector, domain| DkimQuery::new(selector, domain).record_name();

        assert_eq!(name("google", "example.com").unwrap(), "google._domainkey.example.com.");
        assert_eq!(name("Sel", "Example.COM.").unwrap(), "sel._domainkey.example.com.");
        assert_eq!(
            name("s1.dkim_2", "mail.example.org").unwrap(),
            "s1.dkim_2._domainkey.mail.example.org."
        );
        assert_eq!(name("sel", "example.中国").unwrap(), "sel._domainkey.example.xn--fiqs8s.");
    }

    #[test]
    fn record_name_single_label_domain() {
        let name = |selector, domain| DkimQuery::new(selector, domain).record_name();

        assert_eq!(name("sel", "localhost").unwrap(), "sel._domainkey.localhost.");
        assert_eq!(name("sel", "test").unwrap(), "sel._domainkey.test.");
        assert_eq!(name("sel", "Test.").unwrap(), "sel._domainkey.test.");
    }

    #[test]
    fn record_name_invalid() {
        let name = |selector, domain| DkimQuery::new(selector, domain).record_name();

        assert_eq!(name("", "example.com"), Err(DnsError::InvalidName));
        assert_eq!(name("sel.", "example.com"), Err(DnsError::InvalidName));
        assert_eq!(name("sel", "example..com"), Err(DnsError::InvalidName));
        assert_eq!(name("sel", "exa mple.com"), Err(DnsError::InvalidName));
        assert_eq!(name("sel", "-example.com"), Err(DnsError::InvalidName));
    }

    #[test]
    fn builder_ok() {
        let ns: SocketAddr = "192.0.2.53:53".parse().unwrap();

        let query = DkimQuery::new("sel", "example.com")
            .with_nameserver(ns)
            .with_timeout(Duration::from_secs(2));

        assert_eq!(query.nameserver, Some(ns));
        assert_eq!(query.timeout, Duration::from_secs(2));
        assert_eq!(DkimQuery::new("a", "b.c").timeout, DkimQuery::DEFAULT_TIMEOUT);
    }
}
