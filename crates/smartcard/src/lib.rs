//! Smart card communication with CWA-14890 secure messaging.
//!
//! # Core Concepts
//!
//! - **APDU**: ISO/IEC 7816-4 command/response units, short length encoding
//! - **Secure Frame**: a protected command whose data field ends with the
//!   4-byte cryptographic checksum object `8E 04 <mac>`
//! - **Secure Channel**: wraps plain commands into secure frames and verifies
//!   protected responses with session keys from an [`Authenticator`]
//! - **Send Sequence Counter**: advanced before every MAC on both sides
//!
//! # Security Model
//!
//! A response that fails the integrity check aborts the channel. No retry is
//! attempted and every later call fails with
//! [`SmartcardError::SessionAborted`]; a fresh session must be opened.

pub mod apdu;
pub mod channel;
pub mod cipher;
pub mod counter;
pub mod error;
pub mod secure_frame;
pub mod tlv;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use apdu::{Apdu, CommandApdu, ResponseApdu, SW_SUCCESS};
pub use channel::SecureChannel;
pub use cipher::{ChannelCipher, SessionKeys, TripleDesCipher};
pub use counter::SequenceCounter;
pub use error::{SmartcardError, SmartcardResult};
pub use secure_frame::{SecureFrame, MAC_LENGTH};
pub use transport::{Authenticator, CardTransport};
