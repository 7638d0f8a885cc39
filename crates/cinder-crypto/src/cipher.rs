//! AES-256-CBC with PKCS#7 padding
//!
//! CBC on its own is malleable. It is only ever used behind the envelope's
//! HMAC tag, which is checked before `decrypt` is reached; the legacy path is
//! the one exception and is read-only.

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::Zeroizing;

use crate::keys::{IV_SIZE, KEY_SIZE};
use crate::{CodecError, Result};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Encrypt plaintext under `key` and `iv`.
///
/// Returns the padded ciphertext only; the IV travels separately.
pub fn encrypt(key: &[u8; KEY_SIZE], iv: &[u8; IV_SIZE], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256CbcEnc::new_from_slices(key, iv).map_err(|_| CodecError::Encoding)?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypt ciphertext produced by `encrypt()`.
///
/// Bad padding or a ragged length is a `Decryption` error.
pub fn decrypt(
    key: &[u8; KEY_SIZE],
    iv: &[u8; IV_SIZE],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let cipher = Aes256CbcDec::new_from_slices(key, iv).map_err(|_| CodecError::Decryption)?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| CodecError::Decryption)
}
