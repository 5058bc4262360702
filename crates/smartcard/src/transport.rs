//! Collaborators of a secure channel: the raw card link and the
//! authentication protocol that yields session keys.

use crate::cipher::SessionKeys;
use crate::error::SmartcardResult;

/// Raw APDU exchange with a card reader.
pub trait CardTransport: Send {
    /// Send an encoded command APDU and return the encoded response.
    fn transmit(&mut self, command: &[u8]) -> SmartcardResult<Vec<u8>>;
}

impl<T: CardTransport + ?Sized> CardTransport for Box<T> {
    fn transmit(&mut self, command: &[u8]) -> SmartcardResult<Vec<u8>> {
        (**self).transmit(command)
    }
}

/// Mutual authentication with the card.
pub trait Authenticator {
    fn establish_session(&mut self, transport: &mut dyn CardTransport) -> SmartcardResult<SessionKeys>;
}
