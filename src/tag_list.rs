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

//! Tag=value lists as found in DKIM public key records.
//!
//! Parsing is tolerant: the list is split at `;`, and each segment is split at
//! its first `=` into tag name and value, with surrounding whitespace removed.
//! Segments without `=` are skipped. A later occurrence of a tag replaces an
//! earlier one.

use std::{
    collections::BTreeMap,
    error::Error,
    fmt::{self, Display, Formatter},
};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TagListParseError {
    MissingPTag,
}

impl Display for TagListParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPTag => write!(f, "p= tag missing"),
        }
    }
}

impl Error for TagListParseError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagSpec<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

/// A list of tags with unique names, in order of first appearance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagList<'a>(Vec<TagSpec<'a>>);

impl<'a> AsRef<[TagSpec<'a>]> for TagList<'a> {
    fn as_ref(&self) -> &[TagSpec<'a>] {
        &self.0
    }
}

impl<'a> TagList<'a> {
    pub fn parse(val: &'a str) -> Self {
        let mut tags: Vec<TagSpec<'a>> = vec![];

        for segment in val.split(';') {
            let Some((name, value)) = segment.split_once('=') else {
                continue;
            };

            let name = trim_fws(name);
            let value = trim_fws(value);

            if name.is_empty() {
                continue;
            }

            match tags.iter_mut().find(|t| t.name == name) {
                Some(tag) => tag.value = value,
                None => tags.push(TagSpec { name, value }),
            }
        }

        TagList(tags)
    }

    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.0.iter().find(|t| t.name == name).map(|t| t.value)
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|t| (t.name.into(), t.value.into()))
            .collect()
    }
}

/// Parses a DKIM key record into its tags, requiring the presence of `p=`.
///
/// An empty `p=` value is accepted here: it marks a revoked key.
pub fn parse_tags(record: &str) -> Result<TagList<'_>, TagListParseError> {
    let tags = TagList::parse(record);

    if tags.get("p").is_none() {
        return Err(TagListParseError::MissingPTag);
    }

    Ok(tags)
}

pub fn strip_fws_from_tag_value(value: &str) -> String {
    value.chars().filter(|&c| !is_fws_char(c)).collect()
}

fn trim_fws(s: &str) -> &str {
    s.trim_matches(is_fws_char)
}

fn is_fws_char(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}
