//! Tests for AEAD, signature and MAC operations of the crypto service

use assert_matches::assert_matches;
use rand::RngCore;
use std::sync::Arc;
use tap_crypto::crypto::aead::{AeadAlgorithm, AEAD_KEY_SIZE, AEAD_TAG_SIZE};
use tap_crypto::keyset::{AeadKey, SymmetricKey};
use tap_crypto::{
    Crypto, Curve, DefaultCrypto, Error, KeyEntry, KeyHandle, KeyMaterial, KeyStatus, KeyTemplate,
    OutputPrefixType, WrapKeyOptions,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Encrypt/decrypt round trip for empty, short and 4 KiB inputs
#[test]
fn test_aead_round_trip() {
    init_logging();
    let crypto = DefaultCrypto::new();
    let inputs = [Vec::new(), b"short".to_vec(), random_bytes(4096)];

    for (template, nonce_size) in [
        (KeyTemplate::Aes256Gcm, 12),
        (KeyTemplate::XChaCha20Poly1305, 24),
    ] {
        let kh = KeyHandle::generate(template);
        for msg in &inputs {
            for aad in &inputs {
                let (ciphertext, nonce) = crypto.encrypt(msg, aad, &kh).expect("encrypt");
                assert_eq!(nonce.len(), nonce_size);
                assert_eq!(ciphertext.len(), msg.len() + AEAD_TAG_SIZE);

                let plaintext = crypto
                    .decrypt(&ciphertext, aad, &nonce, &kh)
                    .expect("decrypt");
                assert_eq!(&plaintext, msg);
            }
        }
    }
}

/// Any bit flip in ciphertext, tag, nonce or AAD fails decryption
#[test]
fn test_aead_tamper_detection() {
    let crypto = DefaultCrypto::new();
    for template in [KeyTemplate::Aes256Gcm, KeyTemplate::XChaCha20Poly1305] {
        let kh = KeyHandle::generate(template);
        let (ciphertext, nonce) = crypto.encrypt(b"attack at dawn", b"header", &kh).unwrap();

        let mut bad_ct = ciphertext.clone();
        bad_ct[3] ^= 0x01;
        assert_matches!(
            crypto.decrypt(&bad_ct, b"header", &nonce, &kh),
            Err(Error::DecryptionFailed(_))
        );

        let mut bad_tag = ciphertext.clone();
        let last = bad_tag.len() - 1;
        bad_tag[last] ^= 0x80;
        assert_matches!(
            crypto.decrypt(&bad_tag, b"header", &nonce, &kh),
            Err(Error::DecryptionFailed(_))
        );

        let mut bad_nonce = nonce.clone();
        bad_nonce[0] ^= 0x01;
        assert_matches!(
            crypto.decrypt(&ciphertext, b"header", &bad_nonce, &kh),
            Err(Error::DecryptionFailed(_))
        );

        assert_matches!(
            crypto.decrypt(&ciphertext, b"headex", &nonce, &kh),
            Err(Error::DecryptionFailed(_))
        );
    }
}

/// Ciphertext and nonce do not depend on the key's output prefix
#[test]
fn test_aead_output_is_prefix_independent() {
    let crypto = DefaultCrypto::new();
    let key = AeadKey::new(
        AeadAlgorithm::Aes256Gcm,
        SymmetricKey::random(AEAD_KEY_SIZE),
    );
    let tink = KeyHandle::new(vec![KeyEntry::new(
        7,
        KeyMaterial::Aead(key.clone()),
        OutputPrefixType::Tink,
        KeyStatus::Primary,
    )])
    .unwrap();
    let raw = KeyHandle::new(vec![KeyEntry::new(
        7,
        KeyMaterial::Aead(key),
        OutputPrefixType::Raw,
        KeyStatus::Primary,
    )])
    .unwrap();

    let (ciphertext, nonce) = crypto.encrypt(b"portable", b"", &tink).unwrap();
    assert_eq!(
        crypto.decrypt(&ciphertext, b"", &nonce, &raw).unwrap(),
        b"portable"
    );
}

/// Decryption with another key fails without saying why
#[test]
fn test_aead_wrong_key() {
    let crypto = DefaultCrypto::new();
    let kh = KeyHandle::generate(KeyTemplate::Aes256Gcm);
    let other = KeyHandle::generate(KeyTemplate::Aes256Gcm);
    let (ciphertext, nonce) = crypto.encrypt(b"secret", b"", &kh).unwrap();

    let err = crypto
        .decrypt(&ciphertext, b"", &nonce, &other)
        .unwrap_err();
    assert_eq!(err.to_string(), "decrypt: decryption failed");
}

/// Sign/verify for each signature scheme, with private and public handles
#[test]
fn test_sign_verify() {
    let crypto = DefaultCrypto::new();
    for template in KeyTemplate::signature_templates() {
        let kh = KeyHandle::generate(template);
        let public = kh.public().unwrap();
        let msg = b"transfer 100 USDC";

        let signature = crypto.sign(msg, &kh).expect("sign");
        crypto
            .verify(&signature, msg, &kh)
            .expect("verify with private handle");
        crypto
            .verify(&signature, msg, &public)
            .expect("verify with public handle");
        assert_matches!(crypto.sign(msg, &public), Err(Error::InvalidKeyHandle(_)));

        let mut altered = msg.to_vec();
        altered[0] ^= 0x01;
        assert_matches!(
            crypto.verify(&signature, &altered, &public),
            Err(Error::VerificationFailed(_))
        );

        let other = KeyHandle::generate(template);
        assert_matches!(
            crypto.verify(&signature, msg, &other),
            Err(Error::VerificationFailed(_))
        );
    }
}

/// Ed25519 signatures are `prefix || 64 bytes`
#[test]
#[cfg(feature = "crypto-ed25519")]
fn test_ed25519_signature_layout() {
    let crypto = DefaultCrypto::new();
    let kh = KeyHandle::generate(KeyTemplate::Ed25519);
    let signature = crypto.sign(b"msg", &kh).unwrap();
    assert_eq!(signature.len(), 5 + 64);
    assert_eq!(signature[0], 0x01);
    assert_eq!(&signature[1..5], &kh.primary().key_id().to_be_bytes());
}

/// MAC compute/verify, altered data and a different key
#[test]
fn test_mac() {
    let crypto = DefaultCrypto::new();
    let kh = KeyHandle::generate(KeyTemplate::HmacSha256);
    let other = KeyHandle::generate(KeyTemplate::HmacSha256);

    let tag = crypto.compute_mac(b"data", &kh).expect("compute_mac");
    crypto.verify_mac(&tag, b"data", &kh).expect("verify_mac");
    assert_matches!(
        crypto.verify_mac(&tag, b"datb", &kh),
        Err(Error::VerificationFailed(_))
    );
    assert_matches!(
        crypto.verify_mac(&tag, b"data", &other),
        Err(Error::VerificationFailed(_))
    );
}

/// MAC tags are deterministic for HMAC
#[test]
fn test_mac_deterministic() {
    let crypto = DefaultCrypto::new();
    let kh = KeyHandle::generate(KeyTemplate::HmacSha256);
    assert_eq!(
        crypto.compute_mac(b"data", &kh).unwrap(),
        crypto.compute_mac(b"data", &kh).unwrap()
    );
}

/// Every operation rejects a handle of the wrong kind
#[test]
fn test_wrong_handle_kind() {
    let crypto = DefaultCrypto::new();
    let ecdh = KeyHandle::generate(KeyTemplate::Ecdh(Curve::P256));
    let aead = KeyHandle::generate(KeyTemplate::Aes256Gcm);

    assert_matches!(
        crypto.encrypt(b"m", b"", &ecdh),
        Err(Error::InvalidKeyHandle(_))
    );
    assert_matches!(
        crypto.decrypt(b"c", b"", &[0; 12], &ecdh),
        Err(Error::InvalidKeyHandle(_))
    );
    assert_matches!(crypto.sign(b"m", &aead), Err(Error::InvalidKeyHandle(_)));
    assert_matches!(
        crypto.verify(b"s", b"m", &aead),
        Err(Error::InvalidKeyHandle(_))
    );
    assert_matches!(
        crypto.compute_mac(b"d", &aead),
        Err(Error::InvalidKeyHandle(_))
    );
    assert_matches!(
        crypto.verify_mac(b"t", b"d", &ecdh),
        Err(Error::InvalidKeyHandle(_))
    );
}

/// The service and key handles can be shared across threads
#[test]
fn test_concurrent_use() {
    let crypto: Arc<dyn Crypto> = Arc::new(DefaultCrypto::new());
    let aead = KeyHandle::generate(KeyTemplate::XChaCha20Poly1305);
    let recipient = KeyHandle::generate(KeyTemplate::Ecdh(Curve::X25519));
    let recipient_pub = recipient.primary_public_key().unwrap();

    std::thread::scope(|s| {
        for i in 0..8u8 {
            let crypto = Arc::clone(&crypto);
            let (aead, recipient, recipient_pub) = (&aead, &recipient, &recipient_pub);
            s.spawn(move || {
                let msg = vec![i; 64];
                let (ciphertext, nonce) = crypto.encrypt(&msg, b"", aead).unwrap();
                let plaintext = crypto.decrypt(&ciphertext, b"", &nonce, aead).unwrap();
                assert_eq!(plaintext, msg);

                let opts = WrapKeyOptions::new();
                let wrapped = crypto
                    .wrap_key(&msg[..32], b"", b"", Some(recipient_pub), opts)
                    .unwrap();
                let cek = crypto
                    .unwrap_key(&wrapped, recipient, WrapKeyOptions::new())
                    .unwrap();
                assert_eq!(cek, &msg[..32]);
            });
        }
    });
}
