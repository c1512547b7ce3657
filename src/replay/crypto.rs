use blowfish::cipher::generic_array::GenericArray;
use blowfish::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use blowfish::Blowfish;
use lazy_static::lazy_static;

use super::model::BLOCK_LENGTH;

// Baked into every client build, not configurable
const BLOWFISH_KEY: [u8; 16] = [
    0xDE, 0x72, 0xBE, 0xA0, 0xDE, 0x04, 0xBE, 0xB1, 0xDE, 0xFE, 0xBE, 0xEF, 0xDE, 0xAD, 0xBE,
    0xEF,
];

lazy_static! {
    static ref CIPHER: Blowfish = Blowfish::new_from_slice(&BLOWFISH_KEY).unwrap();
}

/// Decrypts the gameplay ciphertext tail into plaintext of exactly
/// `plaintext_length` bytes.
///
/// The chaining here is not CBC. Each 8 byte block is decrypted on its own
/// and then XORed with the *previous decrypted output*, not the previous
/// ciphertext block. A final short block is right padded with zeros before
/// decryption; whatever falls beyond `plaintext_length` is padding and is
/// discarded. A malformed tail length is not an error, the result is simply
/// the bytes that were available.
pub fn decrypt(ciphertext: &[u8], plaintext_length: usize) -> Vec<u8> {
    let mut plaintext = Vec::with_capacity(ciphertext.len() + BLOCK_LENGTH);
    let mut previous = [0u8; BLOCK_LENGTH];
    for chunk in ciphertext.chunks(BLOCK_LENGTH) {
        let mut block = [0u8; BLOCK_LENGTH];
        block[..chunk.len()].copy_from_slice(chunk);
        CIPHER.decrypt_block(GenericArray::from_mut_slice(&mut block));
        for (byte, prev) in block.iter_mut().zip(previous.iter()) {
            *byte ^= prev;
        }
        previous = block;
        plaintext.extend_from_slice(&block);
    }
    plaintext.truncate(plaintext_length);
    plaintext
}

/// Inverse of [`decrypt`], kept as a reference so the feedback mode can be
/// exercised both ways in tests. The recording format itself is only ever
/// decoded.
pub fn encrypt(plaintext: &[u8]) -> Vec<u8> {
    let mut ciphertext = Vec::with_capacity(plaintext.len() + BLOCK_LENGTH);
    let mut previous = [0u8; BLOCK_LENGTH];
    for chunk in plaintext.chunks(BLOCK_LENGTH) {
        let mut block = [0u8; BLOCK_LENGTH];
        block[..chunk.len()].copy_from_slice(chunk);
        let feedback = block;
        for (byte, prev) in block.iter_mut().zip(previous.iter()) {
            *byte ^= prev;
        }
        CIPHER.encrypt_block(GenericArray::from_mut_slice(&mut block));
        previous = feedback;
        ciphertext.extend_from_slice(&block);
    }
    ciphertext
}
