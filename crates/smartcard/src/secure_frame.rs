//! CWA-14890 protected command frame.
//!
//! The frame's data field is the cryptogram data objects followed by the
//! cryptographic checksum object: `cryptogram || 8E 04 || mac`. The encoding is
//! fixed once built; protected frames never carry a plain `Le`.

use std::fmt;

use crate::apdu::Apdu;
use crate::error::{SmartcardError, SmartcardResult};
use crate::tlv::TAG_CRYPTOGRAPHIC_CHECKSUM;

/// Length of the truncated secure messaging MAC.
pub const MAC_LENGTH: usize = 4;

/// Immutable secure messaging command.
#[derive(Clone, PartialEq, Eq)]
pub struct SecureFrame {
    header: [u8; 4],
    cryptogram: Vec<u8>,
    mac: [u8; MAC_LENGTH],
    data: Vec<u8>,
}

impl SecureFrame {
    /// Build a frame from the protected data objects and their MAC.
    ///
    /// `cryptogram` may be empty. The MAC is not verified here.
    pub fn build(
        cla: u8,
        ins: u8,
        p1: u8,
        p2: u8,
        cryptogram: impl Into<Vec<u8>>,
        mac: &[u8],
    ) -> SmartcardResult<Self> {
        let mac: [u8; MAC_LENGTH] = mac
            .try_into()
            .map_err(|_| SmartcardError::InvalidMacLength { actual: mac.len() })?;
        let cryptogram = cryptogram.into();

        let mut data = Vec::with_capacity(cryptogram.len() + 2 + MAC_LENGTH);
        data.extend_from_slice(&cryptogram);
        data.push(TAG_CRYPTOGRAPHIC_CHECKSUM);
        data.push(MAC_LENGTH as u8);
        data.extend_from_slice(&mac);

        Ok(Self {
            header: [cla, ins, p1, p2],
            cryptogram,
            mac,
            data,
        })
    }

    pub fn mac(&self) -> [u8; MAC_LENGTH] {
        self.mac
    }

    pub fn cryptogram(&self) -> Vec<u8> {
        self.cryptogram.clone()
    }
}

impl Apdu for SecureFrame {
    fn header(&self) -> [u8; 4] {
        self.header
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn le(&self) -> Option<u8> {
        None
    }

    fn set_le(&mut self, _le: u8) -> SmartcardResult<()> {
        Err(SmartcardError::UnsupportedInSecureMessaging)
    }
}

impl fmt::Debug for SecureFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureFrame")
            .field("header", &hex::encode(self.header))
            .field("cryptogram_len", &self.cryptogram.len())
            .field("mac", &hex::encode(self.mac))
            .finish()
    }
}
