//! Note Encryption
//!
//! Encrypts note openings for the recipient using ECDH + ChaCha20-Poly1305.
//! The resulting blob rides along with an operation as its `memo` and is
//! served back out by the indexer for wallet scanning.
//!
//! ```text
//! Flow:
//! 1. Sender generates ephemeral keypair (epk, esk)
//! 2. Shared secret = ECDH(esk, recipient_pk)
//! 3. Encryption key = KDF(shared_secret, "umbra-note-v1")
//! 4. Ciphertext = ChaCha20-Poly1305(key, nonce, plaintext)
//! 5. Output = (epk, nonce, ciphertext, tag)
//! ```

use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead, KeyInit},
};
use serde::{Deserialize, Serialize};
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};

use crate::note::{Note, TokenId};

/// Maximum memo payload carried inside an encrypted note
pub const MAX_MEMO_LEN: usize = 512;

/// An encrypted note opening (published alongside the commitment)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedNote {
    /// Ephemeral public key for ECDH
    pub ephemeral_pk: [u8; 32],
    /// Nonce for ChaCha20-Poly1305
    pub nonce: [u8; 12],
    /// Encrypted note data with authentication tag
    pub ciphertext: Vec<u8>,
}

impl EncryptedNote {
    /// Size of encrypted note (fixed overhead): epk + nonce + tag
    pub const OVERHEAD: usize = 32 + 12 + 16;

    /// An empty placeholder for outputs without a recipient payload
    pub fn empty() -> Self {
        Self {
            ephemeral_pk: [0u8; 32],
            nonce: [0u8; 12],
            ciphertext: Vec::new(),
        }
    }

    /// Whether this is the empty placeholder
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }
}

/// Note plaintext format for encryption
#[derive(Debug, Clone)]
struct NotePlaintext {
    value: u64,
    token: [u8; 32],
    secret: [u8; 32],
    blinding: [u8; 32],
    memo: Vec<u8>,
}

/// Encrypt a note opening for a recipient
///
/// # Arguments
/// * `note` - The note to encrypt
/// * `recipient_pk` - Recipient's X25519 public key
/// * `memo` - Optional memo (max 512 bytes)
pub fn encrypt_note(note: &Note, recipient_pk: &[u8; 32], memo: Option<&[u8]>) -> EncryptedNote {
    let mut rng = rand::thread_rng();
    let ephemeral_secret = EphemeralSecret::random_from_rng(&mut rng);
    let ephemeral_pk = PublicKey::from(&ephemeral_secret);

    // ECDH shared secret
    let recipient_key = PublicKey::from(*recipient_pk);
    let shared_secret = ephemeral_secret.diffie_hellman(&recipient_key);

    let encryption_key = derive_note_key(shared_secret.as_bytes(), ephemeral_pk.as_bytes());

    let plaintext = NotePlaintext {
        value: note.value.0,
        token: note.token.0,
        secret: note.secret,
        blinding: note.blinding,
        memo: memo
            .map(|m| m[..m.len().min(MAX_MEMO_LEN)].to_vec())
            .unwrap_or_default(),
    };

    let plaintext_bytes = serialize_plaintext(&plaintext);

    let mut nonce_bytes = [0u8; 12];
    use rand::RngCore;
    rng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = ChaCha20Poly1305::new_from_slice(&encryption_key).expect("valid key length");

    let ciphertext = cipher
        .encrypt(nonce, plaintext_bytes.as_slice())
        .expect("encryption should not fail");

    EncryptedNote {
        ephemeral_pk: *ephemeral_pk.as_bytes(),
        nonce: nonce_bytes,
        ciphertext,
    }
}

/// Decrypt a note opening using the recipient's secret key
///
/// Returns the reconstructed note and the memo, or None if decryption fails
pub fn decrypt_note(
    encrypted: &EncryptedNote,
    recipient_sk: &[u8; 32],
    expected_owner_pk: [u8; 32],
) -> Option<(Note, Vec<u8>)> {
    let secret = StaticSecret::from(*recipient_sk);
    let ephemeral_pk = PublicKey::from(encrypted.ephemeral_pk);
    let shared_secret = secret.diffie_hellman(&ephemeral_pk);

    let decryption_key = derive_note_key(shared_secret.as_bytes(), &encrypted.ephemeral_pk);

    let cipher = ChaCha20Poly1305::new_from_slice(&decryption_key).ok()?;
    let nonce = Nonce::from_slice(&encrypted.nonce);

    let plaintext_bytes = cipher
        .decrypt(nonce, encrypted.ciphertext.as_slice())
        .ok()?;

    let plaintext = deserialize_plaintext(&plaintext_bytes)?;

    let note = Note::with_secrets(
        plaintext.value,
        TokenId(plaintext.token),
        expected_owner_pk,
        plaintext.secret,
        plaintext.blinding,
    );

    Some((note, plaintext.memo))
}

/// Try to decrypt a note (scan mode - for wallet scanning)
///
/// Returns the note if decryption succeeds and the commitment matches
pub fn try_decrypt_note(
    encrypted: &EncryptedNote,
    recipient_sk: &[u8; 32],
    expected_owner_pk: [u8; 32],
    expected_commitment: &[u8; 32],
) -> Option<(Note, Vec<u8>)> {
    let (note, memo) = decrypt_note(encrypted, recipient_sk, expected_owner_pk)?;

    if note.commitment().as_bytes() == expected_commitment {
        Some((note, memo))
    } else {
        None
    }
}

/// Derive encryption key from shared secret
fn derive_note_key(shared_secret: &[u8], ephemeral_pk: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key("umbra-note-v1");
    hasher.update(shared_secret);
    hasher.update(ephemeral_pk);
    *hasher.finalize().as_bytes()
}

/// Serialize plaintext for encryption
fn serialize_plaintext(pt: &NotePlaintext) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(8 + 32 + 32 + 32 + 2 + pt.memo.len());

    bytes.extend_from_slice(&pt.value.to_le_bytes());
    bytes.extend_from_slice(&pt.token);
    bytes.extend_from_slice(&pt.secret);
    bytes.extend_from_slice(&pt.blinding);

    let memo_len = pt.memo.len() as u16;
    bytes.extend_from_slice(&memo_len.to_le_bytes());
    bytes.extend_from_slice(&pt.memo);

    bytes
}

/// Deserialize plaintext after decryption
fn deserialize_plaintext(bytes: &[u8]) -> Option<NotePlaintext> {
    // 8 + 32 + 32 + 32 + 2 minimum
    if bytes.len() < 106 {
        return None;
    }

    let value = u64::from_le_bytes(bytes[0..8].try_into().ok()?);
    let token: [u8; 32] = bytes[8..40].try_into().ok()?;
    let secret: [u8; 32] = bytes[40..72].try_into().ok()?;
    let blinding: [u8; 32] = bytes[72..104].try_into().ok()?;
    let memo_len = u16::from_le_bytes(bytes[104..106].try_into().ok()?) as usize;

    if bytes.len() < 106 + memo_len {
        return None;
    }

    let memo = bytes[106..106 + memo_len].to_vec();

    Some(NotePlaintext {
        value,
        token,
        secret,
        blinding,
        memo,
    })
}
