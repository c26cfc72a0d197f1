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

//! Inspection of a DKIM public key: lookup, selection, parsing, decoding.

use crate::{
    crypto::{decode_key, DecodeError, DecodedKey, KeyAlgorithm},
    lookup::{look_up_records, DnsError, LookupTxt},
    query::DkimQuery,
    record::{select_dkim_record, DkimKeyRecord, KeyType, SelectionError},
    report::{OutputFormat, Report},
    tag_list::{parse_tags, TagListParseError},
};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};
use tracing::debug;

/// The result of a successful inspection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Inspection {
    pub record: DkimKeyRecord,
    pub key: DecodedKey,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InspectError {
    Dns(DnsError),
    Selection(SelectionError),
    Parse(TagListParseError),
    Decode(DecodeError),
}

impl InspectError {
    /// Returns the name of the error kind, as used in the `status` of JSON
    /// reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Dns(e) => match e {
                DnsError::Timeout => "timeout",
                DnsError::NxDomain => "nxdomain",
                DnsError::NoRecords => "no_records",
                DnsError::NetworkError(_) => "network_error",
                DnsError::InvalidName => "invalid_name",
            },
            Self::Selection(SelectionError::NoDkimRecord) => "no_dkim_record",
            Self::Parse(TagListParseError::MissingPTag) => "missing_p_tag",
            Self::Decode(DecodeError::InvalidBase64) => "invalid_base64",
            Self::Decode(DecodeError::UnsupportedOrInvalidKey(_)) => "unsupported_or_invalid_key",
        }
    }
}

impl Display for InspectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dns(e) => e.fmt(f),
            Self::Selection(e) => e.fmt(f),
            Self::Parse(e) => e.fmt(f),
            Self::Decode(e) => e.fmt(f),
        }
    }
}

impl Error for InspectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Dns(e) => Some(e),
            Self::Selection(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Decode(e) => Some(e),
        }
    }
}

impl From<DnsError> for InspectError {
    fn from(error: DnsError) -> Self {
        Self::Dns(error)
    }
}

impl From<SelectionError> for InspectError {
    fn from(error: SelectionError) -> Self {
        Self::Selection(error)
    }
}

impl From<TagListParseError> for InspectError {
    fn from(error: TagListParseError) -> Self {
        Self::Parse(error)
    }
}

impl From<DecodeError> for InspectError {
    fn from(error: DecodeError) -> Self {
        Self::Decode(error)
    }
}

/// Looks up the key record for the query and inspects the key in it.
pub async fn inspect<T: LookupTxt + ?Sized>(
    resolver: &T,
    query: &DkimQuery,
) -> Result<Inspection, InspectError> {
    let records = look_up_records(resolver, query).await?;

    inspect_records(&records)
}

/// Inspects the key in the DKIM key record found among the given TXT records.
pub fn inspect_records<S: AsRef<str>>(records: &[S]) -> Result<Inspection, InspectError> {
    let record = select_dkim_record(records)?;

    let tags = parse_tags(record)?;
    let record = DkimKeyRecord::from_tag_list(&tags)?;

    let key = match decode_key(&record.key_data) {
        Ok(key) => key,
        // Raw Ed25519 keys (RFC 8463) are not DER; name them after k=.
        Err(DecodeError::UnsupportedOrInvalidKey(KeyAlgorithm::Unknown))
            if record.key_type == KeyType::Ed25519 =>
        {
            return Err(DecodeError::UnsupportedOrInvalidKey(KeyAlgorithm::Ed25519).into());
        }
        Err(e) => return Err(e.into()),
    };

    if let DecodedKey::Key(key) = &key {
        if record.key_type != KeyType::Rsa {
            debug!(key_type = %record.key_type, "k= tag does not match RSA key data");
        }
        debug!(bit_length = key.bit_length, "key inspected");
    }

    Ok(Inspection { record, key })
}

/// The output of a complete check: what is to be written to standard output
/// and standard error, and whether the check succeeded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CheckOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

/// Inspects the key for the query, and renders the report in the given format.
///
/// In text format, errors go to standard error and standard output remains
/// empty. In JSON format, the report object always goes to standard output.
pub async fn check_key<T: LookupTxt + ?Sized>(
    resolver: &T,
    query: &DkimQuery,
    format: OutputFormat,
) -> CheckOutput {
    let result = inspect(resolver, query).await;

    render_result(query, &result, format)
}

pub fn render_result(
    query: &DkimQuery,
    result: &Result<Inspection, InspectError>,
    format: OutputFormat,
) -> CheckOutput {
    let report = Report::new(query, result);
    let rendered = report.render(format);
    let success = result.is_ok();

    match (format, success) {
        (OutputFormat::Text, false) => CheckOutput {
            stdout: String::new(),
            stderr: rendered,
            success,
        },
        _ => CheckOutput {
            stdout: rendered,
            stderr: String::new(),
            success,
        },
    }
}
