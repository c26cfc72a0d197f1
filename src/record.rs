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

//! DKIM public key record.

use crate::tag_list::{parse_tags, TagList, TagListParseError, TagSpec};
use std::{
    collections::BTreeMap,
    error::Error,
    fmt::{self, Display, Formatter},
    str::FromStr,
};
use tracing::debug;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SelectionError {
    NoDkimRecord,
}

impl Display for SelectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDkimRecord => write!(f, "no DKIM key record among TXT records"),
        }
    }
}

impl Error for SelectionError {}

/// Selects the DKIM key record among the TXT records found at a selector.
///
/// The first record that contains either `p=` or `v=DKIM1` is taken. The
/// character-strings of each TXT record must already be concatenated. One pair
/// of enclosing double quotes, as left behind by some zone tooling, is removed.
pub fn select_dkim_record<S: AsRef<str>>(records: &[S]) -> Result<&str, SelectionError> {
    let mut candidates = records
        .iter()
        .map(|r| strip_enclosing_quotes(r.as_ref()))
        .filter(|r| looks_like_key_record(r));

    let record = candidates.next().ok_or(SelectionError::NoDkimRecord)?;

    let ignored = candidates.count();
    if ignored > 0 {
        debug!(ignored, "multiple DKIM key records, using first");
    }

    Ok(record)
}

fn strip_enclosing_quotes(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
}

fn looks_like_key_record(s: &str) -> bool {
    s.contains("p=") || s.contains("v=DKIM1")
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyType {
    Rsa,
    Ed25519,
    Other(Box<str>),
}

impl KeyType {
    fn from_tag_value(s: &str) -> Self {
        if s.eq_ignore_ascii_case("rsa") {
            Self::Rsa
        } else if s.eq_ignore_ascii_case("ed25519") {
            Self::Ed25519
        } else {
            Self::Other(s.into())
        }
    }
}

impl Display for KeyType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rsa => write!(f, "rsa"),
            Self::Ed25519 => write!(f, "ed25519"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// A DKIM public key record.
///
/// Only `k=` and `p=` are interpreted. All other tags are kept verbatim in
/// `tags` for reporting; unknown or ill-formed values are never rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DkimKeyRecord {
    pub key_type: KeyType,
    /// The raw, still Base64-encoded p= value. Empty for a revoked key.
    pub key_data: Box<str>,
    /// All tags of the record.
    pub tags: BTreeMap<String, String>,
}

impl DkimKeyRecord {
    pub fn from_tag_list(tag_list: &TagList<'_>) -> Result<Self, TagListParseError> {
        let mut key_type = KeyType::Rsa;
        let mut key_data = None;

        for &TagSpec { name, value } in tag_list.as_ref() {
            match name {
                "k" => key_type = KeyType::from_tag_value(value),
                "p" => key_data = Some(value.into()),
                _ => {}
            }
        }

        let key_data = key_data.ok_or(TagListParseError::MissingPTag)?;

        Ok(Self {
            key_type,
            key_data,
            tags: tag_list.to_map(),
        })
    }

    pub fn is_revoked(&self) -> bool {
        self.key_data.trim().is_empty()
    }
}

impl FromStr for DkimKeyRecord {
    type Err = TagListParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag_list = parse_tags(s)?;

        Self::from_tag_list(&tag_list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_dkim_record_first_candidate() {
        let records = ["v=DKIM1; p=abc", "unrelated text"];
        assert_eq!(select_dkim_record(&records), Ok("v=DKIM1; p=abc"));

        let records = ["google-site-verification=xyz", "k=rsa; p=one", "v=DKIM1; p=two"];
        assert_eq!(select_dkim_record(&records), Ok("k=rsa; p=one"));

        let records = ["v=DKIM1; k=rsa"];
        assert_eq!(select_dkim_record(&records), Ok("v=DKIM1; k=rsa"));
    }

    #[test]
    fn select_dkim_record_none() {
        let records = ["v=spf1 -all", "hello"];
        assert_eq!(select_dkim_record(&records), Err(SelectionError::NoDkimRecord));

        let records: [String; 0] = [];
        assert_eq!(select_dkim_record(&records), Err(SelectionError::NoDkimRecord));
    }

    #[test]
    fn select_dkim_record_enclosing_quotes() {
        let records = ["\"v=DKIM1; p=abc\""];
        assert_eq!(select_dkim_record(&records), Ok("v=DKIM1; p=abc"));

        // Only one pair is removed, and only when both ends are quoted.
        let records = ["\"\"p=abc\"\"", "\"v=DKIM1; p=abc"];
        assert_eq!(select_dkim_record(&records), Ok("\"p=abc\""));
        let records = ["\"v=DKIM1; p=abc"];
        assert_eq!(select_dkim_record(&records), Ok("\"v=DKIM1; p=abc"));
    }

    #[test]
    fn dkim_key_record_from_str_ok() {
        let record: DkimKeyRecord =
            "v=DKIM1; p=YWJj; s = email; t=y:s; h=SHA256; n = highly=20interesting;"
                .parse()
                .unwrap();

        assert_eq!(record.key_type, KeyType::Rsa);
        assert_eq!(record.key_data.as_ref(), "YWJj");
        assert_eq!(record.tags.len(), 6);
        assert_eq!(record.tags.get("t").map(String::as_str), Some("y:s"));
        assert_eq!(record.tags.get("n").map(String::as_str), Some("highly=20interesting"));
        assert!(!record.is_revoked());
    }

    #[test]
    fn dkim_key_record_lenient_values() {
        let record: DkimKeyRecord = "v=DKIM2; k=ed448; s=; n=bad=zz; p=".parse().unwrap();

        assert_eq!(record.key_type, KeyType::Other("ed448".into()));
        assert_eq!(record.tags.get("v").map(String::as_str), Some("DKIM2"));
        assert_eq!(record.tags.get("s").map(String::as_str), Some(""));
        assert!(record.is_revoked());

        let record: DkimKeyRecord = "k=Ed25519; p=YWJj".parse().unwrap();

        assert_eq!(record.key_type, KeyType::Ed25519);
    }

    #[test]
    fn dkim_key_record_folded() {
        // This is an actual record from mail._domainkey.circleshop.ch, folded
        // with bare LF and a stray space inside the key data.
        let s = "v=DKIM1; h=sha256; k=rsa; \n\t  p=MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAxjVprCb0VDFsrDawxGnwI6OoMUXIc7MKm6354dN9sDDxKi4w3jLQZhiMGHrc/j1JqxWX0CA6lGKfJxlmoLahSD3o92hBkG0b4b2B3erza26gzbKEkKr223WAhxNTfPllECF2HBXPp5tuvMVCQXGJ9uEi9WkgmD4Ns8Va9SLMOg9UKD/vbzE CGuf6jNCVhngzXTVli2vIL/OTE7\n\t  ZWOuXnRENt01sv/aiAQC4PFOMKs1ZVkpcgOQMIZO/5PrMKU/bjUx/9uaaIDLkLJ0RBFgkSJ2uXWtrm6kP7lI8H/7zGunbiDoLiEoAUU7PT98VR4TXvU0DDItzHVoiF/CZsLKwSvQIDAQAB";

        let record = DkimKeyRecord::from_str(s).unwrap();

        assert_eq!(record.key_type, KeyType::Rsa);
        assert!(record.key_data.starts_with("MIIBIjAN"));
        assert!(record.key_data.ends_with("IDAQAB"));
    }

    #[test]
    fn dkim_key_record_missing_p() {
        assert_eq!(
            DkimKeyRecord::from_str("v=DKIM1; k=rsa"),
            Err(TagListParseError::MissingPTag)
        );
    }
}
