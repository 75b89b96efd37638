//! The `crypto` namespace: thin wrappers over the digest, MAC, and AEAD
//! primitives. Hashes and MACs render as lowercase hex; encrypted payloads
//! travel as base64(nonce || ciphertext).

use super::binaries::hex_encode;
use super::common::*;
use crate::error::{Error, Result};
use crate::value::Value;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Usage: hash("hello", "SHA-256") -> hex digest
pub fn hash(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let data = as_str(&args[0])?;
    let algorithm = as_str(&args[1])?;
    let digest = match algorithm.to_uppercase().as_str() {
        "SHA-1" | "SHA1" => Sha1::digest(data.as_bytes()).to_vec(),
        "SHA-256" | "SHA256" => Sha256::digest(data.as_bytes()).to_vec(),
        "SHA-384" | "SHA384" => Sha384::digest(data.as_bytes()).to_vec(),
        "SHA-512" | "SHA512" => Sha512::digest(data.as_bytes()).to_vec(),
        other => {
            return Err(Error::Domain(format!(
                "Unsupported hash algorithm: {}",
                other
            )))
        }
    };
    Ok(Value::string(hex_encode(&digest)))
}

/// Usage: hmac("data", "secret", "HmacSHA256") -> hex MAC
pub fn hmac(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 3)?;
    let data = as_str(&args[0])?;
    let secret = as_str(&args[1])?;
    let algorithm = as_str(&args[2])?;
    let mac = match algorithm.to_uppercase().as_str() {
        "HMACSHA1" => {
            let mut mac = Hmac::<Sha1>::new_from_slice(secret.as_bytes())
                .map_err(|e| Error::Domain(format!("Invalid HMAC key: {}", e)))?;
            mac.update(data.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        "HMACSHA256" => {
            let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
                .map_err(|e| Error::Domain(format!("Invalid HMAC key: {}", e)))?;
            mac.update(data.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        "HMACSHA512" => {
            let mut mac = Hmac::<Sha512>::new_from_slice(secret.as_bytes())
                .map_err(|e| Error::Domain(format!("Invalid HMAC key: {}", e)))?;
            mac.update(data.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        other => {
            return Err(Error::Domain(format!(
                "Unsupported HMAC algorithm: {}",
                other
            )))
        }
    };
    Ok(Value::string(hex_encode(&mac)))
}

fn derive_key(password: &str) -> [u8; 32] {
    let digest = Sha256::digest(password.as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    key
}

/// Authenticated AES-256-GCM with a random nonce.
/// Usage: encrypt("secret data", "password") -> base64 payload
pub fn encrypt(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let data = as_str(&args[0])?;
    let password = as_str(&args[1])?;

    let unbound = UnboundKey::new(&AES_256_GCM, &derive_key(password))
        .map_err(|_| Error::Domain("Could not build encryption key".to_string()))?;
    let key = LessSafeKey::new(unbound);

    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| Error::Domain("Could not generate nonce".to_string()))?;
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut buffer = data.as_bytes().to_vec();
    key.seal_in_place_append_tag(nonce, Aad::empty(), &mut buffer)
        .map_err(|_| Error::Domain("Encryption failed".to_string()))?;

    let mut payload = nonce_bytes.to_vec();
    payload.extend_from_slice(&buffer);
    Ok(Value::string(STANDARD.encode(payload)))
}

/// Usage: decrypt(encrypt("x", "pw"), "pw") -> "x"
pub fn decrypt(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let payload = as_str(&args[0])?;
    let password = as_str(&args[1])?;

    let bytes = STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| Error::Domain(format!("Could not decode payload: {}", e)))?;
    if bytes.len() < NONCE_LEN {
        return Err(Error::Domain("Payload too short".to_string()));
    }
    let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_LEN);

    let unbound = UnboundKey::new(&AES_256_GCM, &derive_key(password))
        .map_err(|_| Error::Domain("Could not build encryption key".to_string()))?;
    let key = LessSafeKey::new(unbound);
    let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
        .map_err(|_| Error::Domain("Invalid nonce".to_string()))?;

    let mut buffer = ciphertext.to_vec();
    let plaintext = key
        .open_in_place(nonce, Aad::empty(), &mut buffer)
        .map_err(|_| Error::Domain("Decryption failed".to_string()))?;
    String::from_utf8(plaintext.to_vec())
        .map(Value::string)
        .map_err(|e| Error::Domain(format!("Decrypted data is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::string(text)
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            hash(&[s("abc"), s("SHA-256")]).unwrap(),
            s("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn test_sha1_known_vector() {
        assert_eq!(
            hash(&[s("abc"), s("SHA-1")]).unwrap(),
            s("a9993e364706816aba3e25717850c26c9cd0d89d")
        );
    }

    #[test]
    fn test_unsupported_algorithm() {
        assert!(hash(&[s("abc"), s("MD5")]).is_err());
    }

    #[test]
    fn test_hmac_sha256_known_vector() {
        // RFC 4231 test case 2
        assert_eq!(
            hmac(&[s("what do ya want for nothing?"), s("Jefe"), s("HmacSHA256")]).unwrap(),
            s("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843")
        );
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let encrypted = encrypt(&[s("secret data"), s("password")]).unwrap();
        assert_ne!(encrypted, s("secret data"));
        assert_eq!(decrypt(&[encrypted, s("password")]).unwrap(), s("secret data"));
    }

    #[test]
    fn test_decrypt_with_wrong_password_fails() {
        let encrypted = encrypt(&[s("secret"), s("password")]).unwrap();
        assert!(decrypt(&[encrypted, s("wrong")]).is_err());
    }

    #[test]
    fn test_nonces_differ_between_calls() {
        let a = encrypt(&[s("x"), s("pw")]).unwrap();
        let b = encrypt(&[s("x"), s("pw")]).unwrap();
        assert_ne!(a, b);
    }
}
