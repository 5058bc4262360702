//! Fixtures shared by the end-to-end tests.

use rand::{rngs::OsRng, RngCore};
use std::path::PathBuf;

use signcore_keystores::{Certificate, KeystoreError, KeystoreResult, TokenObject, TokenReader};
use signcore_smartcard::testing::{demo_session_keys, FixedSessionAuthenticator, SimulatedCard};
use signcore_smartcard::{CardTransport, CommandApdu, ResponseApdu, SecureChannel, SW_SUCCESS};

/// GET DATA instruction used by the simulated card to return its certificate.
pub const INS_GET_DATA: u8 = 0xCA;

/// On-card reference of the simulated card's signing key.
pub const CARD_KEY_REFERENCE: u8 = 0x01;

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// Unique temporary path for a store or configuration file.
pub fn temp_path(label: &str, extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!("signcore_it_{}_{}.{}", label, uuid::Uuid::new_v4(), extension))
}

/// Random 32-byte secret usable as a P-256 scalar or an Ed25519 seed.
pub fn random_secret() -> [u8; 32] {
    let mut secret = [0u8; 32];
    OsRng.fill_bytes(&mut secret);
    secret
}

/// Self-signed certificate for `common_name`, valid from 2020 through 2089.
pub fn issue_certificate(common_name: &str, serial: &[u8]) -> anyhow::Result<Certificate> {
    issue_certificate_valid(common_name, serial, 2020, 2090)
}

/// Self-signed certificate valid from January 1st of `from_year` until January
/// 1st of `until_year`.
pub fn issue_certificate_valid(
    common_name: &str,
    serial: &[u8],
    from_year: i32,
    until_year: i32,
) -> anyhow::Result<Certificate> {
    let mut params = rcgen::CertificateParams::new(vec!["signer.example".to_string()])?;
    let mut name = rcgen::DistinguishedName::new();
    name.push(rcgen::DnType::CommonName, common_name);
    params.distinguished_name = name;
    params.serial_number = Some(rcgen::SerialNumber::from(serial.to_vec()));
    params.not_before = rcgen::date_time_ymd(from_year, 1, 1);
    params.not_after = rcgen::date_time_ymd(until_year, 1, 1);

    let key_pair = rcgen::KeyPair::generate()?;
    let cert = params.self_signed(&key_pair)?;
    Ok(Certificate::from_der(cert.der().to_vec()))
}

/// Simulated card answering GET DATA with `certificate`.
pub fn card_holding(certificate: &Certificate) -> SimulatedCard {
    let der = certificate.as_der().to_vec();
    SimulatedCard::new(&demo_session_keys(), move |command: &CommandApdu| {
        if command.ins() == INS_GET_DATA {
            ResponseApdu::new(der.clone(), SW_SUCCESS)
        } else {
            ResponseApdu::new(Vec::new(), 0x6D00)
        }
    })
}

/// Token reader fetching the card certificate over secure messaging.
pub struct CardTokenReader<T: CardTransport> {
    label: String,
    channel: SecureChannel<T>,
}

impl<T: CardTransport> CardTokenReader<T> {
    pub fn connect(label: &str, transport: T) -> anyhow::Result<Self> {
        let mut authenticator = FixedSessionAuthenticator::new(demo_session_keys());
        let channel = SecureChannel::open(transport, &mut authenticator)?;
        tracing::debug!(label, "Card token reader connected");
        Ok(Self {
            label: label.to_string(),
            channel,
        })
    }

    pub fn channel(&self) -> &SecureChannel<T> {
        &self.channel
    }
}

impl<T: CardTransport + Sync> TokenReader for CardTokenReader<T> {
    fn label(&self) -> &str {
        &self.label
    }

    fn read_objects(&mut self) -> KeystoreResult<Vec<TokenObject>> {
        let command = CommandApdu::new(0x00, INS_GET_DATA, 0x01, 0x00, Vec::new(), Some(0x00));
        let response = self
            .channel
            .transmit(&command)
            .map_err(|e| KeystoreError::Token(e.to_string()))?;
        if !response.is_success() {
            return Err(KeystoreError::Token(format!(
                "GET DATA failed with status {:04X}",
                response.status_word()
            )));
        }

        Ok(vec![TokenObject {
            alias: "CardSignature".to_string(),
            certificate: Certificate::from_der(response.data().to_vec()),
            chain: Vec::new(),
            key_reference: Some(CARD_KEY_REFERENCE),
        }])
    }
}
