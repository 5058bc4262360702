//! Signing workflow: configuration, aggregation, trust gate, signature.

use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};

use signcore_core::Config;
use signcore_keystores::{
    CredentialAggregator, KeyAlgorithm, KeyHandle, SoftwareStore, StoredEntry,
};
use signcore_validation::{require_trusted, LocalValidator, TrustError, TrustOutcome};

use crate::test_utils::{init_tracing, issue_certificate, issue_certificate_valid, random_secret, temp_path};

fn config_for(stores: &[(&std::path::Path, bool)], validation: &str) -> Config {
    let mut toml = String::from("[keystores]\nfingerprint_algorithm = \"sha1\"\n");
    for (path, preferred) in stores {
        toml.push_str(&format!(
            "\n[[keystores.software]]\npath = '{}'\npreferred = {}\n",
            path.display(),
            preferred
        ));
    }
    toml.push_str("\n[validation]\n");
    toml.push_str(validation);
    Config::from_toml_str(&toml).unwrap()
}

#[test]
fn test_sign_with_trusted_certificate() {
    init_tracing();

    let certificate = issue_certificate("Signcore Signer", &[0x10, 0x01]).unwrap();
    let store_path = temp_path("signer", "json");
    SoftwareStore::write_file(
        &store_path,
        vec![StoredEntry::with_key(
            "signing",
            certificate.clone(),
            vec![],
            KeyAlgorithm::P256,
            &random_secret(),
        )],
    )
    .unwrap();

    let config = config_for(
        &[(store_path.as_path(), false)],
        "allowed_issuers = [\"CN=Signcore Signer\"]\n",
    );
    let aggregator = CredentialAggregator::from_config(&config.keystores).unwrap();
    let validator = LocalValidator::from_config(&config.validation);

    let leaf = aggregator.certificate("signing").unwrap();
    assert_eq!(leaf, certificate);
    require_trusted(&validator, &leaf).unwrap();

    let entry = aggregator.key_entry("signing").unwrap().unwrap();
    let key = match entry.key {
        KeyHandle::Software(key) => key,
        KeyHandle::Token { .. } => panic!("Expected software key"),
    };

    let document = b"contract to be signed";
    let signature = Signature::from_der(&key.sign(document)).unwrap();
    let verifying_key = VerifyingKey::from_sec1_bytes(&key.public_key()).unwrap();
    assert!(verifying_key.verify(document, &signature).is_ok());
    assert!(verifying_key.verify(b"tampered document", &signature).is_err());

    let _ = std::fs::remove_file(store_path);
}

#[test]
fn test_expired_certificate_is_refused() {
    init_tracing();

    let expired = issue_certificate_valid("Old Signer", &[0x20], 2010, 2015).unwrap();
    let store_path = temp_path("expired", "json");
    SoftwareStore::write_file(&store_path, vec![StoredEntry::certificate_only("old", expired)]).unwrap();

    let config = config_for(&[(store_path.as_path(), false)], "");
    let aggregator = CredentialAggregator::from_config(&config.keystores).unwrap();
    let validator = LocalValidator::from_config(&config.validation);

    let certificate = aggregator.certificate("old").unwrap();
    assert_eq!(require_trusted(&validator, &certificate), Err(TrustError::Expired));

    let report = TrustOutcome::Expired.report();
    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        serde_json::json!({ "ok": false, "reason": "Expired" })
    );

    let _ = std::fs::remove_file(store_path);
}

#[test]
fn test_revoked_and_foreign_certificates_are_refused() {
    init_tracing();

    let revoked = issue_certificate("Signcore Signer", &[0x0B, 0xAD]).unwrap();
    let foreign = issue_certificate("Unknown Issuer", &[0x0C]).unwrap();
    let store_path = temp_path("mixed", "json");
    SoftwareStore::write_file(
        &store_path,
        vec![
            StoredEntry::certificate_only("revoked", revoked),
            StoredEntry::certificate_only("foreign", foreign),
        ],
    )
    .unwrap();

    let config = config_for(
        &[(store_path.as_path(), false)],
        "allowed_issuers = [\"CN=Signcore Signer\"]\nrevoked_serials = [\"0b:ad\"]\n",
    );
    let aggregator = CredentialAggregator::from_config(&config.keystores).unwrap();
    let validator = LocalValidator::from_config(&config.validation);

    let revoked = aggregator.certificate("revoked").unwrap();
    assert!(matches!(
        require_trusted(&validator, &revoked),
        Err(TrustError::Untrusted {
            outcome: TrustOutcome::Revoked,
            ..
        })
    ));

    let foreign = aggregator.certificate("foreign").unwrap();
    assert!(matches!(
        require_trusted(&validator, &foreign),
        Err(TrustError::Untrusted {
            outcome: TrustOutcome::UnsupportedIssuer,
            ..
        })
    ));

    let _ = std::fs::remove_file(store_path);
}

#[test]
fn test_corrupt_store_entry_is_refused() {
    init_tracing();

    let store_path = temp_path("corrupt", "json");
    SoftwareStore::write_file(
        &store_path,
        vec![StoredEntry::certificate_only(
            "broken",
            signcore_keystores::Certificate::from_der(vec![0x30, 0x82, 0x01]),
        )],
    )
    .unwrap();

    let config = config_for(&[(store_path.as_path(), false)], "");
    let aggregator = CredentialAggregator::from_config(&config.keystores).unwrap();

    let certificate = aggregator.certificate("broken").unwrap();
    assert_eq!(
        require_trusted(&LocalValidator::new(), &certificate),
        Err(TrustError::Encoding)
    );

    let _ = std::fs::remove_file(store_path);
}
