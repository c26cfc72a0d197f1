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

//! Decoding of DKIM public keys.
//!
//! # RSA key formats in DNS
//!
//! RFC 6376, section 3.6.1 states that the p= tag contains an RSA public key
//! in format RSAPublicKey (RFC 3447). However, the example in appendix C
//! installs an RSA public key in format SubjectPublicKeyInfo (RFC 5280) in the
//! DNS, and it is this second format that has become the de facto standard.
//!
//! Key data is therefore first read as SubjectPublicKeyInfo. If this fails it
//! is read as a bare RSAPublicKey.
//!
//! Ed25519 keys (RFC 8463) are recognised, but their size is not reported.

mod rsa;

pub use self::rsa::read_rsa_modulus_bits;

use crate::{
    tag_list::strip_fws_from_tag_value,
    util::{decode_base64, CanonicalStr},
};
use pkcs8::{
    der::pem::{self, LineEnding},
    spki::SubjectPublicKeyInfoRef,
    Document, ObjectIdentifier,
};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};
use tracing::trace;

/// The PEM label used for public keys in SubjectPublicKeyInfo format.
pub const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const ED25519_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KeyAlgorithm {
    Rsa,
    Ed25519,
    Unknown,
}

impl KeyAlgorithm {
    fn from_oid(oid: ObjectIdentifier) -> Self {
        if oid == RSA_ENCRYPTION_OID {
            Self::Rsa
        } else if oid == ED25519_OID {
            Self::Ed25519
        } else {
            Self::Unknown
        }
    }
}

impl CanonicalStr for KeyAlgorithm {
    fn canonical_str(&self) -> &'static str {
        match self {
            Self::Rsa => "rsa",
            Self::Ed25519 => "ed25519",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DecodeError {
    InvalidBase64,
    /// The key data is not an RSA key, or is not a well-formed key at all. The
    /// algorithm is `Unknown` in the latter case.
    UnsupportedOrInvalidKey(KeyAlgorithm),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBase64 => write!(f, "invalid Base64 string"),
            Self::UnsupportedOrInvalidKey(KeyAlgorithm::Rsa) => write!(f, "invalid RSA key data"),
            Self::UnsupportedOrInvalidKey(KeyAlgorithm::Unknown) => {
                write!(f, "unsupported or invalid key data")
            }
            Self::UnsupportedOrInvalidKey(alg) => {
                write!(f, "unsupported key algorithm {}", alg.canonical_str())
            }
        }
    }
}

impl Error for DecodeError {}

/// Public key material decoded from a DKIM key record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublicKeyMaterial {
    pub algorithm: KeyAlgorithm,
    /// The size of the key in bits; for RSA the bit length of the modulus.
    pub bit_length: usize,
    /// The key data armored as a PEM `PUBLIC KEY` document.
    pub pem: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DecodedKey {
    /// The p= tag was empty, the key has been revoked.
    Revoked,
    Key(PublicKeyMaterial),
}

/// Decodes the value of a p= tag and determines the key size.
///
/// Whitespace inside the value is ignored. An empty value is not an error but
/// yields [`DecodedKey::Revoked`].
pub fn decode_key(p: &str) -> Result<DecodedKey, DecodeError> {
    let p = strip_fws_from_tag_value(p);

    if p.is_empty() {
        trace!("empty key data, key revoked");
        return Ok(DecodedKey::Revoked);
    }

    let key_data = decode_base64(&p).map_err(|_| DecodeError::InvalidBase64)?;

    let pem = encode_pem(&key_data)?;

    let (algorithm, bit_length) = read_public_key_pem(&pem)?;

    trace!(algorithm = algorithm.canonical_str(), bit_length, "decoded public key");

    Ok(DecodedKey::Key(PublicKeyMaterial {
        algorithm,
        bit_length,
        pem,
    }))
}

/// Armors key data as a PEM `PUBLIC KEY` document, with 64-character lines and
/// a final line ending.
pub fn encode_pem(key_data: &[u8]) -> Result<String, DecodeError> {
    let mut pem = pem::encode_string(PUBLIC_KEY_LABEL, LineEnding::LF, key_data)
        .map_err(|_| DecodeError::UnsupportedOrInvalidKey(KeyAlgorithm::Unknown))?;

    if !pem.ends_with('\n') {
        pem.push('\n');
    }

    Ok(pem)
}

/// Reads a PEM `PUBLIC KEY` document, and returns the key algorithm and size.
pub fn read_public_key_pem(s: &str) -> Result<(KeyAlgorithm, usize), DecodeError> {
    let (label, doc) = Document::from_pem(s)
        .map_err(|_| DecodeError::UnsupportedOrInvalidKey(KeyAlgorithm::Unknown))?;

    if label != PUBLIC_KEY_LABEL {
        return Err(DecodeError::UnsupportedOrInvalidKey(KeyAlgorithm::Unknown));
    }

    read_public_key(doc.as_bytes())
}

/// Reads DER-encoded key data, and returns the key algorithm and size.
pub fn read_public_key(key_data: &[u8]) -> Result<(KeyAlgorithm, usize), DecodeError> {
    match SubjectPublicKeyInfoRef::try_from(key_data) {
        Ok(spki) => {
            let algorithm = KeyAlgorithm::from_oid(spki.algorithm.oid);

            if algorithm != KeyAlgorithm::Rsa {
                return Err(DecodeError::UnsupportedOrInvalidKey(algorithm));
            }

            let key = spki
                .subject_public_key
                .as_bytes()
                .ok_or(DecodeError::UnsupportedOrInvalidKey(KeyAlgorithm::Rsa))?;

            let bits = read_rsa_modulus_bits(key)
                .ok_or(DecodeError::UnsupportedOrInvalidKey(KeyAlgorithm::Rsa))?;

            Ok((KeyAlgorithm::Rsa, bits))
        }
        Err(_) => {
            trace!("key data not in SubjectPublicKeyInfo format, trying RSAPublicKey");

            let bits = read_rsa_modulus_bits(key_data)
                .ok_or(DecodeError::UnsupportedOrInvalidKey(KeyAlgorithm::Unknown))?;

            Ok((KeyAlgorithm::Rsa, bits))
        }
    }
}
