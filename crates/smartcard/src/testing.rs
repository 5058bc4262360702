//! Card-side secure messaging for tests.
//!
//! [`SimulatedCard`] verifies protected commands, hands the plain command to a
//! handler and protects the handler's response, mirroring what a real card does
//! once a session is established.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::apdu::{Apdu, CommandApdu, ResponseApdu};
use crate::channel::{CLA_SECURE_MESSAGING, PADDING_INDICATOR};
use crate::cipher::{pad, unpad, ChannelCipher, SessionKeys, TripleDesCipher};
use crate::counter::SequenceCounter;
use crate::error::{SmartcardError, SmartcardResult};
use crate::tlv::{self, TAG_CRYPTOGRAM, TAG_CRYPTOGRAPHIC_CHECKSUM, TAG_EXPECTED_LENGTH, TAG_STATUS_WORD};
use crate::transport::{Authenticator, CardTransport};

/// Status word a card returns when secure messaging objects are wrong.
pub const SW_SM_DATA_INCORRECT: u16 = 0x6988;

/// Fixed keys for tests.
pub fn demo_session_keys() -> SessionKeys {
    SessionKeys {
        encryption_key: [
            0x59, 0x8F, 0x26, 0xE3, 0x6E, 0x11, 0xA8, 0xEC, 0x14, 0xB8, 0x1E, 0x19, 0xBD, 0xA2, 0x23,
            0xCA,
        ],
        mac_key: [
            0x5D, 0xE2, 0x93, 0x9A, 0x1E, 0xA0, 0x3A, 0x93, 0x0B, 0x88, 0x20, 0x6D, 0x8F, 0x73, 0xE8,
            0xA7,
        ],
        send_sequence_counter: [0xD3, 0x1A, 0xC8, 0xEC, 0x7B, 0xA0, 0xFE, 0x73],
    }
}

/// Authenticator that skips the protocol and returns preset keys.
#[derive(Debug, Clone)]
pub struct FixedSessionAuthenticator {
    keys: SessionKeys,
}

impl FixedSessionAuthenticator {
    pub fn new(keys: SessionKeys) -> Self {
        Self { keys }
    }
}

impl Authenticator for FixedSessionAuthenticator {
    fn establish_session(&mut self, _transport: &mut dyn CardTransport) -> SmartcardResult<SessionKeys> {
        Ok(self.keys.clone())
    }
}

/// Handle that makes a [`SimulatedCard`] corrupt its response MACs.
#[derive(Debug, Clone)]
pub struct TamperSwitch(Arc<AtomicBool>);

impl TamperSwitch {
    pub fn engage(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

type Handler = Box<dyn FnMut(&CommandApdu) -> ResponseApdu + Send + Sync>;

/// In-memory card speaking secure messaging.
pub struct SimulatedCard {
    cipher: TripleDesCipher,
    counter: SequenceCounter,
    handler: Handler,
    tampered: Arc<AtomicBool>,
    received: Vec<CommandApdu>,
}

impl SimulatedCard {
    pub fn new(
        keys: &SessionKeys,
        handler: impl FnMut(&CommandApdu) -> ResponseApdu + Send + Sync + 'static,
    ) -> Self {
        Self {
            cipher: TripleDesCipher::from_session(keys),
            counter: SequenceCounter::new(keys.send_sequence_counter),
            handler: Box::new(handler),
            tampered: Arc::new(AtomicBool::new(false)),
            received: Vec::new(),
        }
    }

    pub fn tamper_switch(&self) -> TamperSwitch {
        TamperSwitch(Arc::clone(&self.tampered))
    }

    /// Plain commands accepted so far, CLA without secure messaging bits.
    pub fn received(&self) -> &[CommandApdu] {
        &self.received
    }

    fn unprotect(&mut self, raw: &[u8]) -> SmartcardResult<CommandApdu> {
        let frame = CommandApdu::from_bytes(raw)?;
        if frame.cla() & CLA_SECURE_MESSAGING != CLA_SECURE_MESSAGING {
            return Err(SmartcardError::IntegrityViolation("command is not protected".to_string()));
        }
        let header = [frame.cla(), frame.ins(), frame.p1(), frame.p2()];
        let data = frame.data();
        let objects = tlv::parse(data)?;

        let mac = tlv::find(&objects, TAG_CRYPTOGRAPHIC_CHECKSUM)
            .ok_or_else(|| SmartcardError::IntegrityViolation("command without checksum".to_string()))?;
        let cryptogram = tlv::find(&objects, TAG_CRYPTOGRAM);
        let expected_length = tlv::find(&objects, TAG_EXPECTED_LENGTH);

        let block_size = self.cipher.block_size();
        let mut mac_input = pad(&header, block_size);
        for object in [cryptogram, expected_length].into_iter().flatten() {
            mac_input.extend_from_slice(object.raw);
        }
        let ssc = self.counter.increment()?;
        let expected = self.cipher.mac(&ssc, &pad(&mac_input, block_size))?;
        if !bool::from(expected[..].ct_eq(mac.value)) {
            return Err(SmartcardError::IntegrityViolation("command MAC mismatch".to_string()));
        }

        let plain = match cryptogram.map(|o| o.value) {
            Some([PADDING_INDICATOR, ciphertext @ ..]) => unpad(&self.cipher.decrypt(ciphertext)?)?,
            Some(_) => {
                return Err(SmartcardError::MalformedResponse(
                    "cryptogram without padding indicator".to_string(),
                ))
            }
            None => Vec::new(),
        };
        let le = expected_length.and_then(|o| o.value.first().copied());

        Ok(CommandApdu::new(
            frame.cla() & !CLA_SECURE_MESSAGING,
            frame.ins(),
            frame.p1(),
            frame.p2(),
            plain,
            le,
        ))
    }

    fn protect(&mut self, response: &ResponseApdu) -> SmartcardResult<Vec<u8>> {
        let block_size = self.cipher.block_size();
        let mut objects = Vec::new();
        if !response.data().is_empty() {
            let mut value = vec![PADDING_INDICATOR];
            value.extend(self.cipher.encrypt(&pad(response.data(), block_size))?);
            objects.extend(tlv::encode(TAG_CRYPTOGRAM, &value)?);
        }
        objects.extend(tlv::encode(TAG_STATUS_WORD, &response.status_word().to_be_bytes())?);

        let ssc = self.counter.increment()?;
        let mut mac = self.cipher.mac(&ssc, &pad(&objects, block_size))?;
        if self.tampered.load(Ordering::SeqCst) {
            mac[0] ^= 0xFF;
        }

        objects.extend(tlv::encode(TAG_CRYPTOGRAPHIC_CHECKSUM, &mac)?);
        objects.extend_from_slice(&[0x90, 0x00]);
        Ok(objects)
    }
}

impl CardTransport for SimulatedCard {
    fn transmit(&mut self, command: &[u8]) -> SmartcardResult<Vec<u8>> {
        let command = match self.unprotect(command) {
            Ok(command) => command,
            Err(_) => return Ok(SW_SM_DATA_INCORRECT.to_be_bytes().to_vec()),
        };

        let response = (self.handler)(&command);
        self.received.push(command);
        self.protect(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apdu::SW_SUCCESS;
    use crate::channel::SecureChannel;

    #[test]
    fn test_card_rejects_unprotected_command() {
        let mut card = SimulatedCard::new(&demo_session_keys(), |_: &CommandApdu| {
            ResponseApdu::new(vec![], SW_SUCCESS)
        });

        let plain = CommandApdu::new(0x00, 0xB0, 0x00, 0x00, vec![], Some(0x00));
        let response = card.transmit(&plain.to_bytes().unwrap()).unwrap();

        assert_eq!(response, vec![0x69, 0x88]);
        assert!(card.received().is_empty());
    }

    #[test]
    fn test_card_sees_plain_command() {
        let card = SimulatedCard::new(&demo_session_keys(), |command: &CommandApdu| {
            ResponseApdu::new(vec![command.p2()], SW_SUCCESS)
        });
        let mut authenticator = FixedSessionAuthenticator::new(demo_session_keys());
        let mut channel = SecureChannel::open(card, &mut authenticator).unwrap();

        let response = channel
            .transmit(&CommandApdu::new(0x00, 0xCA, 0x01, 0x7F, vec![], Some(0x00)))
            .unwrap();
        assert_eq!(response.data(), &[0x7F]);

        let card = channel.close();
        let seen = &card.received()[0];
        assert_eq!(seen.header(), [0x00, 0xCA, 0x01, 0x7F]);
        assert_eq!(seen.le(), Some(0x00));
        assert!(seen.data().is_empty());
    }
}
