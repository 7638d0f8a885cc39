//! Legacy passphrase blobs
//!
//! Notes written before the envelope format were a bare OpenSSL-style
//! `Salted__` blob: 8-byte magic, 8-byte salt, AES-256-CBC ciphertext, with
//! key and IV from EVP_BytesToKey (MD5, one round) over the link key used as a
//! passphrase. There is no integrity check on this path, so it is decrypt-only.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use md5::{Digest, Md5};
use zeroize::Zeroizing;

use crate::cipher;
use crate::envelope::LegacyBlob;
use crate::keys::{IV_SIZE, KEY_SIZE};
use crate::{CodecError, Result};

const MAGIC: &[u8; 8] = b"Salted__";
const LEGACY_SALT_SIZE: usize = 8;
const HEADER_SIZE: usize = MAGIC.len() + LEGACY_SALT_SIZE;

/// Decrypt a legacy blob with the externally supplied key.
pub fn decrypt(blob: &LegacyBlob, passphrase: &str) -> Result<Zeroizing<String>> {
    let bytes = STANDARD
        .decode(blob.as_str())
        .map_err(|_| CodecError::Decryption)?;

    if bytes.len() <= HEADER_SIZE || &bytes[..MAGIC.len()] != MAGIC {
        return Err(CodecError::Decryption);
    }

    let (salt, ciphertext) = bytes[MAGIC.len()..].split_at(LEGACY_SALT_SIZE);
    let (key, iv) = derive_key_iv(passphrase.as_bytes(), salt);

    let plaintext = cipher::decrypt(&key, &iv, ciphertext)?;
    into_text(plaintext)
}

/// EVP_BytesToKey with MD5 and a single round, sized for AES-256-CBC.
fn derive_key_iv(passphrase: &[u8], salt: &[u8]) -> (Zeroizing<[u8; KEY_SIZE]>, [u8; IV_SIZE]) {
    let mut material = Zeroizing::new([0u8; KEY_SIZE + IV_SIZE]);
    let mut filled = 0;
    let mut previous: Zeroizing<Vec<u8>> = Zeroizing::new(Vec::new());

    while filled < material.len() {
        let mut hasher = Md5::new();
        hasher.update(previous.as_slice());
        hasher.update(passphrase);
        hasher.update(salt);
        let digest = hasher.finalize();

        let take = (material.len() - filled).min(digest.len());
        material[filled..filled + take].copy_from_slice(&digest[..take]);
        filled += take;
        *previous = digest.to_vec();
    }

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    let mut iv = [0u8; IV_SIZE];
    key.copy_from_slice(&material[..KEY_SIZE]);
    iv.copy_from_slice(&material[KEY_SIZE..]);
    (key, iv)
}

pub(crate) fn into_text(mut plaintext: Zeroizing<Vec<u8>>) -> Result<Zeroizing<String>> {
    let bytes = std::mem::take(&mut *plaintext);
    match String::from_utf8(bytes) {
        Ok(text) if !text.is_empty() => Ok(Zeroizing::new(text)),
        Ok(_) => Err(CodecError::Decryption),
        Err(e) => {
            drop(Zeroizing::new(e.into_bytes()));
            Err(CodecError::Decryption)
        }
    }
}

/// Produce a legacy blob, for exercising the read path.
#[cfg(test)]
pub(crate) fn seal(message: &str, passphrase: &str) -> String {
    let salt = [0x5a; LEGACY_SALT_SIZE];
    let (key, iv) = derive_key_iv(passphrase.as_bytes(), &salt);
    let ciphertext = cipher::encrypt(&key, &iv, message.as_bytes()).unwrap();

    let mut out = MAGIC.to_vec();
    out.extend_from_slice(&salt);
    out.extend(ciphertext);
    STANDARD.encode(out)
}
