/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Identity token verification against the provider's X.509 certificate.
//!
//! Every step is a hard gate, in this order:
//!
//! 1. split the token and parse its header ([`AuthError::TokenParse`])
//! 2. extract the RSA key from the certificate ([`AuthError::CertificateInvalid`])
//! 3. check the signature over `header.payload` ([`AuthError::SignatureInvalid`])
//! 4. decode the claims ([`AuthError::ClaimsMissing`])
//! 5. check `exp` ([`AuthError::TokenExpired`])
//! 6. decode the user record ([`AuthError::ClaimsDecode`])
//!
//! Claims are not looked at until the signature has been verified.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use jsonwebtoken::{crypto, decode_header, Algorithm, DecodingKey};
use rpa_auth_types::UserIdentity;
use x509_parser::pem::parse_x509_pem;
use x509_parser::public_key::PublicKey;

use crate::error::AuthError;

use super::certificate::Certificate;
use super::claims::ClaimsSet;

/// The three segments of a compact JWS.
struct TokenParts<'a> {
    header: &'a str,
    payload: &'a str,
    signature: &'a str,
}

impl<'a> TokenParts<'a> {
    fn split(token: &'a str) -> Result<Self, AuthError> {
        let mut segments = token.trim().split('.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(AuthError::TokenParse(
                "expected three dot-separated segments".into(),
            ));
        };

        if header.is_empty() || signature.is_empty() {
            return Err(AuthError::TokenParse("empty header or signature".into()));
        }
        for (name, segment) in [("payload", payload), ("signature", signature)] {
            URL_SAFE_NO_PAD
                .decode(segment)
                .map_err(|e| AuthError::TokenParse(format!("{name} is not base64url: {e}")))?;
        }

        Ok(Self {
            header,
            payload,
            signature,
        })
    }

    /// The signing input: `header.payload`.
    fn message(&self) -> String {
        format!("{}.{}", self.header, self.payload)
    }
}

/// Build a decoding key from the RSA public key inside a PEM certificate.
pub fn rsa_key_from_certificate(pem: &str) -> Result<DecodingKey, AuthError> {
    let (_, pem) = parse_x509_pem(pem.trim().as_bytes())
        .map_err(|e| AuthError::CertificateInvalid(format!("not a PEM block: {e}")))?;
    let cert = pem
        .parse_x509()
        .map_err(|e| AuthError::CertificateInvalid(format!("not an X.509 certificate: {e}")))?;
    let public_key = cert
        .public_key()
        .parsed()
        .map_err(|e| AuthError::CertificateInvalid(format!("unreadable public key: {e}")))?;

    match public_key {
        PublicKey::RSA(rsa) => {
            let modulus = strip_leading_zeros(rsa.modulus);
            let exponent = strip_leading_zeros(rsa.exponent);
            if modulus.is_empty() || exponent.is_empty() {
                return Err(AuthError::CertificateInvalid("empty RSA key component".into()));
            }
            Ok(DecodingKey::from_rsa_raw_components(modulus, exponent))
        }
        _ => Err(AuthError::CertificateInvalid(
            "certificate does not carry an RSA key".into(),
        )),
    }
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

fn is_rsa_algorithm(alg: Algorithm) -> bool {
    matches!(
        alg,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
    )
}

/// Verify `token` against `certificate` and return the identity it carries.
///
/// `now` is the instant `exp` is compared against.
pub fn verify_identity_token(
    token: &str,
    certificate: &Certificate,
    now: DateTime<Utc>,
) -> Result<UserIdentity, AuthError> {
    let parts = TokenParts::split(token)?;
    let header = decode_header(token.trim())
        .map_err(|e| AuthError::TokenParse(format!("invalid JWT header: {e}")))?;

    let key = rsa_key_from_certificate(&certificate.pem)?;
    if !is_rsa_algorithm(header.alg) {
        return Err(AuthError::SignatureInvalid(format!(
            "{:?} is not an RSA signature algorithm",
            header.alg
        )));
    }

    let verified = crypto::verify(parts.signature, parts.message().as_bytes(), &key, header.alg)
        .map_err(|e| AuthError::SignatureInvalid(e.to_string()))?;
    if !verified {
        return Err(AuthError::SignatureInvalid(
            "signature does not match certificate".into(),
        ));
    }

    let claims = ClaimsSet::decode(parts.payload)?;
    claims.ensure_not_expired(now.timestamp())?;
    claims.into_identity()
}

#[cfg(test)]
#[path = "../../tests/support/signing.rs"]
pub(crate) mod testing;
