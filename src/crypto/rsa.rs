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

use rsa::{pkcs1::RsaPublicKey as RsaPublicKeyDer, BigUint};

/// Reads an RSAPublicKey structure and returns the bit length of its modulus.
///
/// The bit length is that of the modulus integer, not of its encoding: a
/// leading zero byte, as required by DER when the high bit is set, does not
/// count.
pub fn read_rsa_modulus_bits(key_data: &[u8]) -> Option<usize> {
    let public_key = RsaPublicKeyDer::try_from(key_data).ok()?;

    let n = BigUint::from_bytes_be(public_key.modulus.as_bytes());
    match n.bits() {
        0 => None,
        bits => Some(bits),
    }
}
