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

//! A library and command-line tool for checking the length of *DomainKeys
//! Identified Mail* (DKIM) public keys published in DNS, as described in
//! [RFC 6376].
//!
//! A check takes a selector and a domain, and proceeds as follows:
//!
//! 1. the TXT records at `<selector>._domainkey.<domain>` are looked up
//!    (module `lookup`);
//! 2. the DKIM key record among them is selected and parsed into its tags
//!    (module `record`);
//! 3. the key data in the p= tag is decoded, armored as PEM, and the key size
//!    determined (module `crypto`);
//! 4. the result is rendered as text or JSON (module `report`).
//!
//! A record with an empty p= tag denotes a revoked key. This is reported as
//! such, and is not an error.
//!
//! No key material is stored: everything is held in memory only for as long as
//! it takes to produce the report.
//!
//! # Usage
//!
//! The function [`inspect()`] runs the whole check against any [`LookupTxt`]
//! implementation, and [`Report`] renders its result.
//!
//! # Cargo features
//!
//! The default feature **`hickory-resolver`** makes an implementation of
//! [`LookupTxt`] available for the Hickory DNS resolver, and enables the
//! command-line tool.
//!
//! [RFC 6376]: https://www.rfc-editor.org/rfc/rfc6376

pub mod crypto;
pub mod inspect;
pub mod lookup;
pub mod query;
pub mod record;
pub mod report;
pub mod tag_list;
mod util;

pub use crate::{
    crypto::{decode_key, DecodeError, DecodedKey, KeyAlgorithm, PublicKeyMaterial},
    inspect::{check_key, inspect, inspect_records, CheckOutput, InspectError, Inspection},
    lookup::{look_up_records, DnsError, LookupTxt},
    query::DkimQuery,
    record::{select_dkim_record, DkimKeyRecord, SelectionError},
    report::{OutputFormat, Report, Status},
    tag_list::{parse_tags, TagListParseError},
    util::{decode_base64, Base64Error, CanonicalStr},
};
