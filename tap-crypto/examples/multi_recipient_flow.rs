//! Multi-recipient key wrapping example
//!
//! An originator encrypts a payload once and wraps the content encryption key
//! for two recipients on different curves, authenticating itself with
//! ECDH-1PU. Each recipient unwraps its own copy and decrypts.
//!
//! Run with: cargo run --example multi_recipient_flow

use tap_crypto::{
    Crypto, Curve, DefaultCrypto, KeyHandle, KeyTemplate, RecipientWrappedKey, WrapKeyOptions,
};

struct Party {
    name: &'static str,
    kid: String,
    keys: KeyHandle,
}

impl Party {
    fn new(name: &'static str, curve: Curve) -> Self {
        Self {
            name,
            kid: format!("did:example:{}#key-agreement-1", name.to_lowercase()),
            keys: KeyHandle::generate(KeyTemplate::Ecdh(curve)),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    println!("=== Multi-Recipient Key Wrapping Example ===\n");

    let crypto = DefaultCrypto::new();

    // The originator holds one agreement key per curve it talks on
    let originator_x25519 = Party::new("Originator", Curve::X25519);
    let originator_p256 = Party::new("Originator", Curve::P256);
    let beneficiary = Party::new("Beneficiary", Curve::X25519);
    let vasp = Party::new("VASP", Curve::P256);

    // Encrypt the payload once
    let content_key = KeyHandle::generate(KeyTemplate::XChaCha20Poly1305);
    let payload = br#"{"type":"Transfer","amount":"100.00"}"#;
    let (ciphertext, nonce) = crypto.encrypt(payload, b"tap-transfer", &content_key)?;
    println!(
        "Encrypted {} byte payload into {} bytes with a {} byte nonce",
        payload.len(),
        ciphertext.len(),
        nonce.len()
    );

    // A fresh CEK that would protect the JWE body in a real envelope
    let cek = [0x42u8; 32];

    let mut wrapped: Vec<(&Party, RecipientWrappedKey)> = Vec::new();
    for (recipient, sender) in [(&beneficiary, &originator_x25519), (&vasp, &originator_p256)] {
        let recipient_pub = recipient
            .keys
            .primary_public_key()?
            .with_kid(recipient.kid.clone());
        let opts = WrapKeyOptions::new().with_sender(&sender.keys);
        let wk = crypto.wrap_key(
            &cek,
            sender.kid.as_bytes(),
            recipient.kid.as_bytes(),
            Some(&recipient_pub),
            opts,
        )?;
        println!(
            "Wrapped CEK for {} ({}) with {}",
            recipient.name,
            wk.epk.curve.as_str(),
            wk.alg
        );
        wrapped.push((recipient, wk));
    }

    println!("\nRecipient header for {}:", wrapped[0].0.name);
    let header = serde_json::to_string_pretty(&wrapped[0].1.epk.to_jwk())?;
    println!("{}\n", header);

    // Each recipient knows the originator's public key for its curve
    let sender_public = [
        originator_x25519.keys.public()?,
        originator_p256.keys.public()?,
    ];
    for ((recipient, wk), sender) in wrapped.iter().zip(sender_public.iter()) {
        let opts = WrapKeyOptions::new().with_sender(sender);
        let unwrapped = crypto.unwrap_key(wk, &recipient.keys, opts)?;
        assert_eq!(unwrapped, cek);
        println!("{} recovered the CEK", recipient.name);
    }

    let plaintext = crypto.decrypt(&ciphertext, b"tap-transfer", &nonce, &content_key)?;
    println!(
        "\nDecrypted payload: {}",
        String::from_utf8_lossy(&plaintext)
    );

    Ok(())
}
