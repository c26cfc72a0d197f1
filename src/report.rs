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

//! Reports of inspection results.

use crate::{
    crypto::DecodedKey,
    inspect::{InspectError, Inspection},
    query::DkimQuery,
    util::CanonicalStr,
};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// The outcome of a check, as given in the `status` field of a report.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Status {
    Ok,
    Revoked,
    /// An error, with the error kind name.
    Error(&'static str),
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Revoked => "revoked",
            Self::Error(kind) => *kind,
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A report of the key found for a selector and domain.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Report {
    pub selector: String,
    pub domain: String,
    pub status: Status,
    pub algorithm: Option<&'static str>,
    pub bit_length: Option<usize>,
    pub pem: Option<String>,
    pub error: Option<String>,
    /// The tags of the key record.
    pub tags: Option<BTreeMap<String, String>>,
}

impl Report {
    pub fn new(query: &DkimQuery, result: &Result<Inspection, InspectError>) -> Self {
        let mut report = Self {
            selector: query.selector.clone(),
            domain: query.domain.clone(),
            status: Status::Ok,
            algorithm: None,
            bit_length: None,
            pem: None,
            error: None,
            tags: None,
        };

        match result {
            Ok(inspection) => {
                report.tags = Some(inspection.record.tags.clone());

                match &inspection.key {
                    DecodedKey::Revoked => {
                        report.status = Status::Revoked;
                    }
                    DecodedKey::Key(key) => {
                        report.algorithm = Some(key.algorithm.canonical_str());
                        report.bit_length = Some(key.bit_length);
                        report.pem = Some(key.pem.clone());
                    }
                }
            }
            Err(e) => {
                report.status = Status::Error(e.kind());
                report.error = Some(e.to_string());
            }
        }

        report
    }

    /// Returns the bit length label, eg `2048b`, or `revoked`.
    pub fn bit_length_label(&self) -> Option<String> {
        match (self.status, self.bit_length) {
            (Status::Revoked, _) => Some("revoked".into()),
            (_, Some(n)) => Some(format!("{n}b")),
            (_, None) => None,
        }
    }

    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => self.to_text(),
            OutputFormat::Json => self.to_json(),
        }
    }

    fn to_text(&self) -> String {
        let mut s = String::new();

        if let Some(pem) = &self.pem {
            s.push_str(pem);
        }

        match (self.bit_length_label(), &self.error) {
            (Some(label), _) => {
                s.push_str("DKIM Public Key Length: ");
                s.push_str(&label);
                s.push('\n');
            }
            (None, Some(error)) => {
                s.push_str("error: ");
                s.push_str(error);
                s.push('\n');
            }
            (None, None) => {}
        }

        s
    }

    fn to_json(&self) -> String {
        // only strings, integers, and string maps: serialisation cannot fail
        let mut s = serde_json::to_string(self).expect("failed to serialize report");
        s.push('\n');
        s
    }
}
