//! RSA key material loading.
//!
//! RSA-SHA1 consumers keep their private key either as base64 PKCS#8 DER
//! (the consumer secret form) or as a PEM file (PKCS#8 or PKCS#1).

use std::path::Path;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::KeyError;

const PEM_PREFIX: &str = "-----BEGIN";

/// Load an RSA private key from a PEM file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or holds no valid key.
pub fn load_private_key_from_file(path: &Path) -> Result<RsaPrivateKey, KeyError> {
    let bytes = std::fs::read(path)?;
    let pem = std::str::from_utf8(&bytes)?;
    parse_private_key_pem(pem)
}

/// Parse a PEM private key, trying PKCS#8 first and PKCS#1 second.
fn parse_private_key_pem(pem: &str) -> Result<RsaPrivateKey, KeyError> {
    RsaPrivateKey::from_pkcs8_pem(pem).or_else(|pkcs8_err| {
        RsaPrivateKey::from_pkcs1_pem(pem).map_err(|_| KeyError::Pkcs8(pkcs8_err))
    })
}

/// Decode private key material given as a consumer secret.
///
/// Accepts PEM text or base64-encoded PKCS#8 DER. Whitespace inside the
/// base64 form is ignored.
pub fn decode_private_key(material: &str) -> Result<RsaPrivateKey, KeyError> {
    let material = material.trim();
    if material.starts_with(PEM_PREFIX) {
        return parse_private_key_pem(material);
    }
    let der = decode_base64(material)?;
    Ok(RsaPrivateKey::from_pkcs8_der(&der)?)
}

/// Decode an X.509 `SubjectPublicKeyInfo` public key (PEM or base64 DER).
pub fn decode_public_key(material: &str) -> Result<RsaPublicKey, KeyError> {
    let material = material.trim();
    if material.starts_with(PEM_PREFIX) {
        return Ok(RsaPublicKey::from_public_key_pem(material)?);
    }
    let der = decode_base64(material)?;
    Ok(RsaPublicKey::from_public_key_der(&der)?)
}

fn decode_base64(material: &str) -> Result<Vec<u8>, KeyError> {
    let compact: String = material.split_whitespace().collect();
    Ok(BASE64_STANDARD.decode(compact)?)
}
