//! Secure messaging channel over an authenticated card session.
//!
//! Commands are wrapped as:
//!
//! - `CLA | 0x0C`
//! - DO `87` = `01 || E(pad(data))` when the command has data
//! - DO `97` = `Le` when the command expects a response
//! - MAC over `SSC || pad(pad(header) || DO87 || DO97)`
//!
//! Responses carry DO `87` (optional), DO `99` (status word) and DO `8E` (MAC
//! over `SSC || pad(DO87 || DO99)`). The counter is incremented before each of
//! the two MAC computations. Any integrity failure aborts the session for good.

use subtle::ConstantTimeEq;
use tracing::{debug, error, info, warn};

use crate::apdu::{Apdu, CommandApdu, ResponseApdu, MAX_SHORT_DATA};
use crate::cipher::{pad, unpad, ChannelCipher, TripleDesCipher};
use crate::counter::SequenceCounter;
use crate::error::{SmartcardError, SmartcardResult};
use crate::secure_frame::{SecureFrame, MAC_LENGTH};
use crate::tlv::{self, TAG_CRYPTOGRAM, TAG_CRYPTOGRAPHIC_CHECKSUM, TAG_EXPECTED_LENGTH, TAG_STATUS_WORD};
use crate::transport::{Authenticator, CardTransport};

/// Class byte bits announcing a secure messaging command with authenticated header.
pub const CLA_SECURE_MESSAGING: u8 = 0x0C;

/// Padding-content indicator opening every DO `87` value.
pub const PADDING_INDICATOR: u8 = 0x01;

/// One secure messaging session with a card.
pub struct SecureChannel<T: CardTransport, C: ChannelCipher = TripleDesCipher> {
    transport: T,
    cipher: C,
    counter: SequenceCounter,
    aborted: bool,
}

impl<T: CardTransport> SecureChannel<T, TripleDesCipher> {
    /// Authenticate with the card and open a 3DES session.
    pub fn open(transport: T, authenticator: &mut dyn Authenticator) -> SmartcardResult<Self> {
        Self::open_with_cipher(transport, authenticator)
    }
}

impl<T: CardTransport, C: ChannelCipher> SecureChannel<T, C> {
    /// Authenticate with the card and open a session using cipher `C`.
    pub fn open_with_cipher(
        mut transport: T,
        authenticator: &mut dyn Authenticator,
    ) -> SmartcardResult<Self> {
        let keys = authenticator.establish_session(&mut transport)?;
        let cipher = C::from_session(&keys);
        let counter = SequenceCounter::new(keys.send_sequence_counter);
        info!("Secure messaging session established");

        Ok(Self {
            transport,
            cipher,
            counter,
            aborted: false,
        })
    }

    /// Protect `command`, send it and verify the response.
    ///
    /// A command whose protected form exceeds short encoding is refused with
    /// [`SmartcardError::ApduTooLong`] before the counter moves; the session
    /// stays usable. Every other failure aborts the session.
    pub fn transmit(&mut self, command: &CommandApdu) -> SmartcardResult<ResponseApdu> {
        if self.aborted {
            return Err(SmartcardError::SessionAborted);
        }

        let body = self.protect_body(command)?;
        let result = self.exchange(command, body);
        if let Err(e) = &result {
            self.abort(e);
        }
        result
    }

    fn exchange(&mut self, command: &CommandApdu, body: Vec<u8>) -> SmartcardResult<ResponseApdu> {
        let frame = self.wrap(command, body)?;
        debug!(
            ins = command.ins(),
            counter = ?self.counter,
            "Sending protected command"
        );
        let raw = self.transport.transmit(&frame.to_bytes()?)?;
        let response = ResponseApdu::from_bytes(&raw)?;
        self.unwrap(&response)
    }

    fn abort(&mut self, cause: &SmartcardError) {
        self.aborted = true;
        match cause {
            SmartcardError::IntegrityViolation(reason) => error!(
                reason = %reason,
                "Secure messaging integrity check failed, session aborted"
            ),
            other => error!(error = %other, "Secure messaging exchange failed, session aborted"),
        }
    }

    /// Data objects `87` and `97` for `command`, checked against the short
    /// encoding limit once the checksum object is appended.
    fn protect_body(&self, command: &CommandApdu) -> SmartcardResult<Vec<u8>> {
        let mut body = Vec::new();
        if !command.data().is_empty() {
            let mut value = vec![PADDING_INDICATOR];
            value.extend(self.cipher.encrypt(&pad(command.data(), self.cipher.block_size()))?);
            body.extend(tlv::encode(TAG_CRYPTOGRAM, &value)?);
        }
        if let Some(le) = command.le() {
            body.extend(tlv::encode(TAG_EXPECTED_LENGTH, &[le])?);
        }

        let length = body.len() + 2 + MAC_LENGTH;
        if length > MAX_SHORT_DATA {
            warn!(
                ins = command.ins(),
                plain_length = command.data().len(),
                protected_length = length,
                "Command too long once protected, not sent"
            );
            return Err(SmartcardError::ApduTooLong { length });
        }
        Ok(body)
    }

    /// Build the protected frame for `command` around its protected `body`.
    fn wrap(&mut self, command: &CommandApdu, body: Vec<u8>) -> SmartcardResult<SecureFrame> {
        let block_size = self.cipher.block_size();
        let cla = command.cla() | CLA_SECURE_MESSAGING;
        let header = [cla, command.ins(), command.p1(), command.p2()];

        let mut mac_input = pad(&header, block_size);
        mac_input.extend_from_slice(&body);
        let ssc = self.counter.increment()?;
        let mac = self.cipher.mac(&ssc, &pad(&mac_input, block_size))?;

        SecureFrame::build(header[0], header[1], header[2], header[3], body, &mac)
    }

    /// Verify and decrypt a protected response.
    fn unwrap(&mut self, response: &ResponseApdu) -> SmartcardResult<ResponseApdu> {
        let objects = tlv::parse(response.data())
            .map_err(|e| SmartcardError::IntegrityViolation(e.to_string()))?;

        let received_mac = tlv::find(&objects, TAG_CRYPTOGRAPHIC_CHECKSUM)
            .filter(|o| o.value.len() == MAC_LENGTH)
            .ok_or_else(|| {
                SmartcardError::IntegrityViolation(format!(
                    "response without checksum (SW {:04X})",
                    response.status_word()
                ))
            })?;
        let status = tlv::find(&objects, TAG_STATUS_WORD)
            .filter(|o| o.value.len() == 2)
            .ok_or_else(|| SmartcardError::IntegrityViolation("response without status word".to_string()))?;
        let cryptogram = tlv::find(&objects, TAG_CRYPTOGRAM);

        let mut mac_input = Vec::new();
        if let Some(cryptogram) = cryptogram {
            mac_input.extend_from_slice(cryptogram.raw);
        }
        mac_input.extend_from_slice(status.raw);

        let ssc = self.counter.increment()?;
        let expected = self
            .cipher
            .mac(&ssc, &pad(&mac_input, self.cipher.block_size()))?;
        if !bool::from(expected[..].ct_eq(received_mac.value)) {
            return Err(SmartcardError::IntegrityViolation("response MAC mismatch".to_string()));
        }

        let data = match cryptogram {
            Some(cryptogram) => self.decrypt_cryptogram(cryptogram.value)?,
            None => Vec::new(),
        };
        let status_word = u16::from_be_bytes([status.value[0], status.value[1]]);
        debug!(status_word, data_len = data.len(), "Protected response verified");

        Ok(ResponseApdu::new(data, status_word))
    }

    fn decrypt_cryptogram(&self, value: &[u8]) -> SmartcardResult<Vec<u8>> {
        match value {
            [PADDING_INDICATOR, ciphertext @ ..] => unpad(&self.cipher.decrypt(ciphertext)?),
            _ => Err(SmartcardError::MalformedResponse(
                "cryptogram without padding indicator".to_string(),
            )),
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Current value of the send sequence counter.
    pub fn sequence_counter(&self) -> [u8; 8] {
        self.counter.value()
    }

    /// End the session and hand back the transport. Session keys are zeroized.
    pub fn close(self) -> T {
        info!(aborted = self.aborted, "Secure messaging session closed");
        self.transport
    }
}
