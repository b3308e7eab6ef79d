//! ECDH Key Derivation Function (Concat KDF)
//!
//! Implements the Concat KDF per NIST SP 800-56A and RFC 7518 Section 4.6.
//! This is used to derive key encryption keys (KEK) from ECDH shared secrets
//! for both ECDH-ES and ECDH-1PU key wrapping.

use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// SHA-256 output size
const HASH_LEN: usize = 32;

/// Derive a key using Concat KDF (NIST SP 800-56A)
///
/// This implements the single-step key derivation function specified in
/// NIST SP 800-56A Section 5.8.1 using SHA-256 as the hash function.
///
/// # Arguments
/// * `shared_secret` - The raw ECDH shared secret (Z value, `Ze || Zs` for 1PU)
/// * `algorithm_id` - The algorithm literal, e.g. `ECDH-ES+A256KW`
/// * `apu` - Agreement PartyU Info (sender identifier, can be empty)
/// * `apv` - Agreement PartyV Info (recipient identifier, can be empty)
/// * `key_data_len` - Desired output length in bits (must be multiple of 8)
///
/// # Returns
/// The derived key material of length `key_data_len / 8` bytes
///
/// # Algorithm
/// The OtherInfo structure per RFC 7518 Section 4.6.2:
/// - AlgorithmID: length (4 bytes) || algorithm_id
/// - PartyUInfo: length (4 bytes) || apu
/// - PartyVInfo: length (4 bytes) || apv
/// - SuppPubInfo: keydatalen in bits (4 bytes, big-endian)
///
/// DerivedKey = Hash(counter || Z || OtherInfo) for each round
pub fn concat_kdf(
    shared_secret: &[u8],
    algorithm_id: &[u8],
    apu: &[u8],
    apv: &[u8],
    key_data_len: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    if key_data_len == 0 || key_data_len % 8 != 0 {
        return Err(Error::InvalidLength(
            "concat_kdf: key_data_len must be a positive multiple of 8".to_string(),
        ));
    }
    let key_data_len_bits = u32::try_from(key_data_len).map_err(|_| {
        Error::InvalidLength(format!(
            "concat_kdf: key_data_len {} does not fit in 32 bits",
            key_data_len
        ))
    })?;

    let mut other_info = Vec::with_capacity(16 + algorithm_id.len() + apu.len() + apv.len());
    push_length_prefixed(&mut other_info, algorithm_id)?;
    push_length_prefixed(&mut other_info, apu)?;
    push_length_prefixed(&mut other_info, apv)?;
    other_info.extend_from_slice(&key_data_len_bits.to_be_bytes());

    let key_data_len_bytes = key_data_len / 8;
    let reps = key_data_len_bytes.div_ceil(HASH_LEN);

    let mut derived = Zeroizing::new(Vec::with_capacity(reps * HASH_LEN));

    for counter in 1..=reps as u32 {
        let mut hasher = Sha256::new();
        hasher.update(counter.to_be_bytes());
        hasher.update(shared_secret);
        hasher.update(&other_info);

        derived.extend_from_slice(&hasher.finalize());
    }

    // Truncate to exact requested length
    derived.truncate(key_data_len_bytes);
    Ok(derived)
}

fn push_length_prefixed(out: &mut Vec<u8>, data: &[u8]) -> Result<()> {
    let len = u32::try_from(data.len()).map_err(|_| {
        Error::InvalidLength("concat_kdf: OtherInfo field longer than 2^32 bytes".to_string())
    })?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(data);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kdf_basic() {
        let secret = [0x42u8; 32];
        let result = concat_kdf(&secret, b"ECDH-ES+A256KW", b"", b"", 256);
        assert_eq!(result.unwrap().len(), 32);
    }

    #[test]
    fn test_kdf_multi_round() {
        let secret = [0x42u8; 32];
        let long = concat_kdf(&secret, b"ECDH-ES+A256KW", b"a", b"b", 512).unwrap();
        assert_eq!(long.len(), 64);
        assert_ne!(&long[..32], &long[32..]);
    }

    #[test]
    fn test_kdf_invalid_length() {
        let secret = [0x42u8; 32];
        // 0 bits is invalid
        assert!(concat_kdf(&secret, b"ECDH-ES+A256KW", b"", b"", 0).is_err());
        // Non-multiple of 8 is invalid
        assert!(concat_kdf(&secret, b"ECDH-ES+A256KW", b"", b"", 100).is_err());
    }

    #[test]
    fn test_kdf_deterministic() {
        let secret = [0x42u8; 32];
        let k1 = concat_kdf(&secret, b"ECDH-1PU+A256KW", b"a", b"b", 256).unwrap();
        let k2 = concat_kdf(&secret, b"ECDH-1PU+A256KW", b"a", b"b", 256).unwrap();
        assert_eq!(*k1, *k2);
    }

    #[test]
    fn test_kdf_bound_to_algorithm_id() {
        let secret = [0x42u8; 32];
        let es = concat_kdf(&secret, b"ECDH-ES+A256KW", b"a", b"b", 256).unwrap();
        let one_pu = concat_kdf(&secret, b"ECDH-1PU+A256KW", b"a", b"b", 256).unwrap();
        assert_ne!(*es, *one_pu);
    }

    #[test]
    fn test_kdf_length_prefixes_prevent_shifting() {
        // apu="ab", apv="" must not collide with apu="a", apv="b"
        let secret = [0x42u8; 32];
        let k1 = concat_kdf(&secret, b"ECDH-ES+XC20PKW", b"ab", b"", 256).unwrap();
        let k2 = concat_kdf(&secret, b"ECDH-ES+XC20PKW", b"a", b"b", 256).unwrap();
        assert_ne!(*k1, *k2);
    }
}
