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

use super::{DnsError, LookupTxt};
use hickory_resolver::{
    config::{NameServerConfigGroup, ResolverConfig, ResolverOpts},
    error::ResolveErrorKind,
    proto::op::ResponseCode,
    system_conf, Name, TokioAsyncResolver,
};
use std::{
    future::Future,
    io::{self, ErrorKind},
    net::SocketAddr,
    pin::Pin,
    time::Duration,
};
use tracing::debug;

impl LookupTxt for TokioAsyncResolver {
    type Answer = Box<dyn Iterator<Item = io::Result<Vec<u8>>>>;
    type Query<'a> = Pin<Box<dyn Future<Output = io::Result<Self::Answer>> + Send + 'a>>;

    fn lookup_txt(&self, domain: &str) -> Self::Query<'_> {
        let name = Name::from_ascii(domain);

        Box::pin(async move {
            let name = name.map_err(|_| ErrorKind::InvalidInput)?;

            let lookup = match self.txt_lookup(name).await {
                Ok(lookup) => lookup,
                Err(e) => {
                    return match e.kind() {
                        ResolveErrorKind::NoRecordsFound { response_code, .. } => {
                            if *response_code == ResponseCode::NXDomain {
                                Err(ErrorKind::NotFound.into())
                            } else {
                                let txts: Self::Answer = Box::new(std::iter::empty());
                                Ok(txts)
                            }
                        }
                        ResolveErrorKind::Timeout => Err(ErrorKind::TimedOut.into()),
                        _ => Err(e.into()),
                    };
                }
            };

            let txts = lookup
                .into_iter()
                .map(|txt| Ok(join_character_strings(txt.txt_data())));

            let txts: Self::Answer = Box::new(txts);

            Ok(txts)
        })
    }
}

/// Joins the character-strings of one TXT record without any separator.
fn join_character_strings(strings: &[Box<[u8]>]) -> Vec<u8> {
    strings.concat()
}

/// Creates a resolver that makes a single attempt per lookup, either against
/// the given nameserver only or against the system’s configured nameservers.
pub fn new_resolver(
    nameserver: Option<SocketAddr>,
    timeout: Duration,
) -> Result<TokioAsyncResolver, DnsError> {
    let (config, mut opts) = match nameserver {
        Some(addr) => {
            debug!(%addr, "using nameserver");
            let group = NameServerConfigGroup::from_ips_clear(&[addr.ip()], addr.port(), true);
            (ResolverConfig::from_parts(None, vec![], group), ResolverOpts::default())
        }
        None => system_conf::read_system_conf().map_err(|e| {
            DnsError::NetworkError(format!("no system resolver configuration: {e}").into())
        })?,
    };

    opts.timeout = timeout;
    opts.attempts = 1;
    opts.cache_size = 0;

    Ok(TokioAsyncResolver::tokio(config, opts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{crypto::DecodedKey, inspect::inspect_records};
    use hickory_resolver::proto::rr::rdata::TXT;

    #[test]
    fn join_character_strings_split_key() {
        let txt = TXT::new(vec![
            "v=DKIM1; k=rsa; p=MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAvXEn6j24wx68Zs5djoKQLFXcGUUPzvAAfrc9RKzBQG+dglfdCqZy2ZFai4SlLivvkkCU+0wXl+ExSSY5xEiQk7m3YQZbeIAeSWUTLe7asTri73c7nX5D7+1KKWUarMHKLeWN5F9Re8uOfWrgZdYC20bfoptbMQLLPcbfchP9Z7epZRwd".into(),
            "i6xeZySFO2JnwyK2kEay7VpF7YivwQzMohF2hlQ9OshDIa2w7uudKp5jAcOVymPTi3iu6tEI/3NNkcezukVawN6bLkZf6IEE3Gap2oD3pidf51iAfb7BBbeE36Hl3dPxAgfsSrc/v2HTRMYeeBb7fjFC50ImvxjtmFUIxQIDAQAB".into(),
        ]);

        let joined = join_character_strings(txt.txt_data());
        let record = String::from_utf8(joined).unwrap();

        assert!(record.contains("ZRwdi6xe"));

        let inspection = inspect_records(&[record]).unwrap();

        match inspection.key {
            DecodedKey::Key(key) => assert_eq!(key.bit_length, 2048),
            DecodedKey::Revoked => panic!(),
        }
    }

    #[test]
    fn join_character_strings_empty() {
        assert!(join_character_strings(&[]).is_empty());

        let txt = TXT::new(vec!["p=".into(), String::new()]);
        assert_eq!(join_character_strings(txt.txt_data()), b"p=");
    }
}
