//! Hardware token behind a secure messaging channel.

use signcore_keystores::{
    CredentialAggregator, CredentialSource, FingerprintAlgorithm, KeyHandle, KeystoreError,
    SoftwareStore, StoredEntry, TokenReader, TokenStore,
};
use signcore_validation::{require_trusted, LocalValidator};

use crate::test_utils::{card_holding, init_tracing, issue_certificate, CardTokenReader, CARD_KEY_REFERENCE};

#[test]
fn test_token_certificate_wins_over_software_copy() {
    init_tracing();

    let card_certificate = issue_certificate("Card Holder", &[0x01, 0x02, 0x03]).unwrap();
    let other = issue_certificate("Other Holder", &[0x04]).unwrap();

    let software = SoftwareStore::from_entries(
        "browser-export",
        vec![
            StoredEntry::certificate_only("imported-copy", card_certificate.clone()),
            StoredEntry::certificate_only("other", other),
        ],
        false,
    );
    let mut aggregator = CredentialAggregator::with_primary(
        Box::new(software) as Box<dyn CredentialSource>,
        Some(FingerprintAlgorithm::Sha1),
    )
    .unwrap();

    let reader = CardTokenReader::connect("sim-card", card_holding(&card_certificate)).unwrap();
    let token = TokenStore::open(reader, true).unwrap();
    aggregator.push(Box::new(token));

    assert_eq!(
        aggregator.aliases(),
        vec!["other".to_string(), "CardSignature".to_string()]
    );
    assert!(aggregator.certificate("imported-copy").is_none());

    let certificate = aggregator.certificate("CardSignature").unwrap();
    assert_eq!(certificate, card_certificate);
    require_trusted(&LocalValidator::new(), &certificate).unwrap();

    let entry = aggregator.key_entry("CardSignature").unwrap().unwrap();
    assert!(entry.key.is_hardware());
    match entry.key {
        KeyHandle::Token { token, key_reference } => {
            assert_eq!(token, "sim-card");
            assert_eq!(key_reference, CARD_KEY_REFERENCE);
        }
        KeyHandle::Software(_) => panic!("Expected token key"),
    }
}

#[test]
fn test_tampered_card_response_aborts_token_session() {
    init_tracing();

    let card_certificate = issue_certificate("Card Holder", &[0x05]).unwrap();
    let card = card_holding(&card_certificate);
    let tamper = card.tamper_switch();

    let reader = CardTokenReader::connect("sim-card", card).unwrap();
    let mut token = TokenStore::open(reader, true).unwrap();
    assert_eq!(token.certificate("CardSignature"), Some(card_certificate.clone()));

    tamper.engage();
    let err = token.reload().unwrap_err();
    assert!(matches!(&err, KeystoreError::Reload { source_name, reason }
        if source_name == "sim-card" && reason.contains("integrity")));
    assert!(token.reader().channel().is_aborted());

    // Previously read objects are still served, but the session stays dead.
    assert_eq!(token.certificate("CardSignature"), Some(card_certificate));
    tamper.release();
    let err = token.reload().unwrap_err();
    assert!(matches!(&err, KeystoreError::Reload { reason, .. } if reason.contains("aborted")));
}

#[test]
fn test_refresh_stops_at_failing_token() {
    init_tracing();

    let card_certificate = issue_certificate("Card Holder", &[0x06]).unwrap();
    let card = card_holding(&card_certificate);
    let tamper = card.tamper_switch();

    let mut aggregator = CredentialAggregator::new(Some(FingerprintAlgorithm::Sha1));
    aggregator.add(
        Box::new(SoftwareStore::from_entries("empty", vec![], false)) as Box<dyn CredentialSource>,
        false,
    );
    let reader = CardTokenReader::connect("sim-card", card).unwrap();
    aggregator.add(
        Box::new(TokenStore::open(reader, true).unwrap()) as Box<dyn CredentialSource>,
        true,
    );

    aggregator.refresh().unwrap();

    tamper.engage();
    let err = aggregator.refresh().unwrap_err();
    assert!(matches!(err, KeystoreError::Reload { source_name, .. } if source_name == "sim-card"));
}

#[test]
fn test_reader_reports_label() {
    let card_certificate = issue_certificate("Card Holder", &[0x07]).unwrap();
    let mut reader = CardTokenReader::connect("reader-0", card_holding(&card_certificate)).unwrap();

    assert_eq!(reader.label(), "reader-0");
    let objects = reader.read_objects().unwrap();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].certificate, card_certificate);
}
