//! Session ciphers for secure messaging.

use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use des::cipher::generic_array::GenericArray;
use des::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use des::{Des, TdesEde2};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{SmartcardError, SmartcardResult};
use crate::secure_frame::MAC_LENGTH;

/// Keys and initial counter agreed during card authentication.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKeys {
    pub encryption_key: [u8; 16],
    pub mac_key: [u8; 16],
    pub send_sequence_counter: [u8; 8],
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("encryption_key", &"[redacted]")
            .field("mac_key", &"[redacted]")
            .field("send_sequence_counter", &hex::encode(self.send_sequence_counter))
            .finish()
    }
}

/// Encryption and MAC primitive used by a secure channel.
///
/// `encrypt`, `decrypt` and `mac` expect input already padded to the block size.
pub trait ChannelCipher: Send {
    fn from_session(keys: &SessionKeys) -> Self
    where
        Self: Sized;

    fn block_size(&self) -> usize;

    fn encrypt(&self, plaintext: &[u8]) -> SmartcardResult<Vec<u8>>;

    fn decrypt(&self, ciphertext: &[u8]) -> SmartcardResult<Vec<u8>>;

    /// Truncated MAC over `ssc || data`.
    fn mac(&self, ssc: &[u8; 8], data: &[u8]) -> SmartcardResult<[u8; MAC_LENGTH]>;
}

const DES_BLOCK: usize = 8;

/// Two-key 3DES in CBC mode with a zero IV, and the ISO/IEC 9797-1
/// algorithm 3 retail MAC.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct TripleDesCipher {
    encryption_key: [u8; 16],
    mac_key: [u8; 16],
}

impl TripleDesCipher {
    fn check_aligned(&self, data: &[u8]) -> SmartcardResult<()> {
        if data.len() % DES_BLOCK != 0 {
            return Err(SmartcardError::Crypto(format!(
                "input of {} bytes is not a multiple of the block size",
                data.len()
            )));
        }
        Ok(())
    }
}

impl ChannelCipher for TripleDesCipher {
    fn from_session(keys: &SessionKeys) -> Self {
        Self {
            encryption_key: keys.encryption_key,
            mac_key: keys.mac_key,
        }
    }

    fn block_size(&self) -> usize {
        DES_BLOCK
    }

    fn encrypt(&self, plaintext: &[u8]) -> SmartcardResult<Vec<u8>> {
        self.check_aligned(plaintext)?;
        let encryptor = cbc::Encryptor::<TdesEde2>::new_from_slices(&self.encryption_key, &[0u8; DES_BLOCK])
            .map_err(|e| SmartcardError::Crypto(e.to_string()))?;
        Ok(encryptor.encrypt_padded_vec_mut::<NoPadding>(plaintext))
    }

    fn decrypt(&self, ciphertext: &[u8]) -> SmartcardResult<Vec<u8>> {
        self.check_aligned(ciphertext)?;
        let decryptor = cbc::Decryptor::<TdesEde2>::new_from_slices(&self.encryption_key, &[0u8; DES_BLOCK])
            .map_err(|e| SmartcardError::Crypto(e.to_string()))?;
        decryptor
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
            .map_err(|e| SmartcardError::Crypto(e.to_string()))
    }

    fn mac(&self, ssc: &[u8; 8], data: &[u8]) -> SmartcardResult<[u8; MAC_LENGTH]> {
        self.check_aligned(data)?;
        let k1 = Des::new_from_slice(&self.mac_key[..DES_BLOCK])
            .map_err(|e| SmartcardError::Crypto(e.to_string()))?;
        let k2 = Des::new_from_slice(&self.mac_key[DES_BLOCK..])
            .map_err(|e| SmartcardError::Crypto(e.to_string()))?;

        let mut state = [0u8; DES_BLOCK];
        for block in std::iter::once(&ssc[..]).chain(data.chunks(DES_BLOCK)) {
            for (s, b) in state.iter_mut().zip(block) {
                *s ^= b;
            }
            k1.encrypt_block(GenericArray::from_mut_slice(&mut state));
        }
        k2.decrypt_block(GenericArray::from_mut_slice(&mut state));
        k1.encrypt_block(GenericArray::from_mut_slice(&mut state));

        let mut mac = [0u8; MAC_LENGTH];
        mac.copy_from_slice(&state[..MAC_LENGTH]);
        state.zeroize();
        Ok(mac)
    }
}

/// ISO/IEC 7816-4 padding: `0x80` followed by zeros up to the block size.
pub fn pad(data: &[u8], block_size: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + block_size);
    out.extend_from_slice(data);
    out.push(0x80);
    while out.len() % block_size != 0 {
        out.push(0x00);
    }
    out
}

/// Strip ISO/IEC 7816-4 padding.
pub fn unpad(data: &[u8]) -> SmartcardResult<Vec<u8>> {
    let marker = data
        .iter()
        .rposition(|b| *b != 0x00)
        .filter(|i| data[*i] == 0x80)
        .ok_or_else(|| SmartcardError::MalformedResponse("missing padding marker".to_string()))?;
    Ok(data[..marker].to_vec())
}
