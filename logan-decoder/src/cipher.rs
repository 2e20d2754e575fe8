//! Per-block AES-128/CBC decryption
//!
//! Logan encrypts every block independently: the configured IV restarts the
//! CBC chain at each block boundary. That property is part of the wire
//! protocol (it is what makes per-block decryption order-independent), so the
//! chaining is implemented explicitly here on top of the raw AES primitive
//! instead of a whole-buffer CBC mode - padding is handled manually afterwards
//! and must not be validated by the cipher layer.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, KeyInit};
use aes::Aes128;

use crate::config::KeyMaterial;

/// AES block size in bytes
pub const AES_BLOCK_SIZE: usize = 16;

/// Decrypt one Logan block's ciphertext
///
/// Misaligned input is zero-padded up to the next 16-byte boundary before
/// decryption; the length field of real-world files sometimes slightly
/// overstates an already-padded block. Never fails: key material is validated
/// at construction and malformed PKCS7 padding is passed through unchanged.
pub fn decrypt(ciphertext: &[u8], keys: &KeyMaterial) -> Vec<u8> {
    let padded;
    let input: &[u8] = if ciphertext.len() % AES_BLOCK_SIZE != 0 {
        let target = (ciphertext.len() / AES_BLOCK_SIZE + 1) * AES_BLOCK_SIZE;
        let mut buf = ciphertext.to_vec();
        buf.resize(target, 0);
        padded = buf;
        &padded
    } else {
        ciphertext
    };

    let cipher = Aes128::new(GenericArray::from_slice(keys.key()));
    let mut plaintext = Vec::with_capacity(input.len());
    let mut chain = *keys.iv();

    for block in input.chunks_exact(AES_BLOCK_SIZE) {
        let mut buf = GenericArray::clone_from_slice(block);
        cipher.decrypt_block(&mut buf);
        // CBC: XOR with the previous ciphertext block (the IV for block 0)
        for (out, prev) in buf.iter_mut().zip(chain.iter()) {
            *out ^= prev;
        }
        plaintext.extend_from_slice(&buf);
        chain.copy_from_slice(block);
    }

    strip_pkcs7(plaintext)
}

/// Lenient PKCS7 unpad: strip the padding if it checks out, otherwise return
/// the data unchanged. Some producers omit padding entirely, so a malformed
/// tail means "no padding present", not an error.
fn strip_pkcs7(mut data: Vec<u8>) -> Vec<u8> {
    let Some(&last) = data.last() else {
        return data;
    };
    let pad = last as usize;
    if pad == 0 || pad > AES_BLOCK_SIZE || pad > data.len() {
        return data;
    }
    let start = data.len() - pad;
    if data[start..].iter().all(|&b| b == last) {
        data.truncate(start);
    }
    data
}
