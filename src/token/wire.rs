//! Binary layout of a version "04" provider ticket.
//!
//! ```text
//! "04" || base64( expire:i64 BE | nonce_len:u16 BE | nonce | ct_len:u16 BE | ciphertext||tag | mode:u8 )
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub const VERSION_FLAG: &str = "04";

/// Cipher nonce length for AES-GCM.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length, appended to the ciphertext.
pub const TAG_LEN: usize = 16;

/// Cipher mode byte. 0 was AES-CBC/PKCS5 and is no longer issued.
pub const MODE_AES_GCM: u8 = 1;

/// Pack the encrypted claim into the wire format and return the final ticket string.
pub fn pack(expire: i64, nonce: &[u8], ciphertext: &[u8]) -> String {
    let mut buf = Vec::with_capacity(8 + 2 + nonce.len() + 2 + ciphertext.len() + 1);
    buf.extend_from_slice(&expire.to_be_bytes());
    buf.extend_from_slice(&(nonce.len() as u16).to_be_bytes());
    buf.extend_from_slice(nonce);
    buf.extend_from_slice(&(ciphertext.len() as u16).to_be_bytes());
    buf.extend_from_slice(ciphertext);
    buf.push(MODE_AES_GCM);

    format!("{}{}", VERSION_FLAG, STANDARD.encode(buf))
}
