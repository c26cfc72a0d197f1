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

//! Lookup of DKIM public key records in DNS.

#[cfg(feature = "hickory-resolver")]
mod hickory_resolver;

#[cfg(feature = "hickory-resolver")]
pub use self::hickory_resolver::new_resolver;

use crate::query::DkimQuery;
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    future::Future,
    io::{self, ErrorKind},
};
use tokio::time;
use tracing::{trace, warn};

/// A trait for looking up DNS TXT records containing DKIM public key records.
///
/// The error type used here is `std::io::Error`. The following error kinds on
/// the query result are recognised and receive special treatment.
///
/// * `ErrorKind::InvalidInput` on the query: the domain argument could not be used
/// * `ErrorKind::NotFound` on the query: NXDOMAIN
/// * `ErrorKind::TimedOut` on the query: timeout
///
/// A name that exists but has no TXT records should give an empty answer.
///
/// The inner, per-record `std::io::Error` can be used to signal errors
/// (parsing, encoding) with individual TXT records.
pub trait LookupTxt: Send + Sync {
    /// The answer consisting of TXT records found.
    type Answer: IntoIterator<Item = io::Result<Vec<u8>>>;
    /// The future resolving to the query’s answer.
    type Query<'a>: Future<Output = io::Result<Self::Answer>> + Send + 'a
    where
        Self: 'a;

    /// Looks up the domain’s TXT records in DNS.
    ///
    /// The domain will be passed to this trait as a string in A-label (ASCII)
    /// format, and is absolute (eg `selector._domainkey.example.com.`).
    ///
    /// The character-strings of each TXT record must be concatenated, without
    /// separator, into one item of the answer.
    fn lookup_txt(&self, domain: &str) -> Self::Query<'_>;
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum DnsError {
    Timeout,
    NxDomain,
    NoRecords,
    NetworkError(Box<str>),
    InvalidName,
}

impl From<io::Error> for DnsError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            ErrorKind::TimedOut => Self::Timeout,
            ErrorKind::NotFound => Self::NxDomain,
            ErrorKind::InvalidInput => Self::InvalidName,
            _ => Self::NetworkError(error.to_string().into()),
        }
    }
}

impl Display for DnsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "DNS lookup timed out"),
            Self::NxDomain => write!(f, "no such domain"),
            Self::NoRecords => write!(f, "no TXT records found"),
            Self::NetworkError(e) => write!(f, "DNS lookup failed: {e}"),
            Self::InvalidName => write!(f, "invalid selector or domain name"),
        }
    }
}

impl Error for DnsError {}

/// Looks up the TXT records at the query’s key record name.
///
/// Exactly one lookup is made, bounded by the query’s timeout. TXT records
/// that are not valid UTF-8 are skipped.
pub async fn look_up_records<T: LookupTxt + ?Sized>(
    resolver: &T,
    query: &DkimQuery,
) -> Result<Vec<String>, DnsError> {
    let dname = query.record_name()?;

    trace!(%dname, timeout = ?query.timeout, "looking up key record");

    let txts = match time::timeout(query.timeout, resolver.lookup_txt(&dname)).await {
        Ok(r) => r?,
        Err(_) => return Err(DnsError::Timeout),
    };

    let mut result = vec![];

    for txt in txts {
        match txt.and_then(|s| String::from_utf8(s).map_err(|_| ErrorKind::InvalidData.into())) {
            Ok(s) => result.push(s),
            Err(e) => warn!(%dname, "skipping unusable TXT record: {e}"),
        }
    }

    if result.is_empty() {
        return Err(DnsError::NoRecords);
    }

    trace!(%dname, records = result.len(), "key record lookup complete");

    Ok(result)
}
