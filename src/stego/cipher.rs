// Copyright (c) 2026 the echoveil authors
// SPDX-License-Identifier: GPL-3.0-only

//! Extended Vigenère transform over the full byte range.
//!
//! `C[i] = (P[i] + K[i mod klen]) mod 256` and the wrapping inverse.
//! Length-preserving and involutive under a matching key. This is a
//! classical polyalphabetic substitution, not a secure cipher; it only
//! obscures the payload so extracted bytes don't read as plaintext.

/// Encrypt `data` by wrapping-adding the repeated key bytes.
///
/// Returns the input unchanged when `key` is empty (no keystream).
pub fn encrypt(data: &[u8], key: &str) -> Vec<u8> {
    transform(data, key, u8::wrapping_add)
}

/// Decrypt `data` by wrapping-subtracting the repeated key bytes.
pub fn decrypt(data: &[u8], key: &str) -> Vec<u8> {
    transform(data, key, u8::wrapping_sub)
}

fn transform(data: &[u8], key: &str, op: fn(u8, u8) -> u8) -> Vec<u8> {
    let key = key.as_bytes();
    if key.is_empty() {
        return data.to_vec();
    }
    data.iter()
        .zip(key.iter().cycle())
        .map(|(&b, &k)| op(b, k))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let msg = b"This is a secret message! 123 @#$%";
        let ct = encrypt(msg, "KEY123");
        assert_ne!(ct, msg.to_vec());
        assert_eq!(decrypt(&ct, "KEY123"), msg.to_vec());
    }

    #[test]
    fn length_preserving() {
        for len in [0usize, 1, 7, 256, 1000] {
            let data = vec![0xA5u8; len];
            assert_eq!(encrypt(&data, "k").len(), len);
        }
    }

    #[test]
    fn wrapping_bytes() {
        // 0xFF + 0x02 wraps to 0x01.
        let ct = encrypt(&[0xFF], "\u{2}");
        assert_eq!(ct, vec![0x01]);
        assert_eq!(decrypt(&ct, "\u{2}"), vec![0xFF]);
    }

    #[test]
    fn wrong_key_garbles() {
        let msg = b"hello world";
        let ct = encrypt(msg, "right");
        assert_ne!(decrypt(&ct, "wrong"), msg.to_vec());
    }

    #[test]
    fn key_repeats_over_long_data() {
        let data = vec![0u8; 9];
        let ct = encrypt(&data, "abc");
        assert_eq!(ct, vec![b'a', b'b', b'c', b'a', b'b', b'c', b'a', b'b', b'c']);
    }
}
