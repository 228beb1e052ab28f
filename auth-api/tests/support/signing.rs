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

//! Signing keys and self-signed certificates for tests.
//!
//! Shared by the in-crate unit tests and the integration tests; the parent
//! module must have `Certificate` in scope.

use std::sync::OnceLock;

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use serde_json::Value;

use super::Certificate;

/// An RSA private key and a self-signed certificate for its public half.
pub struct SigningKey {
    encoding: EncodingKey,
    pub certificate_pem: String,
}

impl SigningKey {
    fn generate() -> Self {
        let private_key =
            RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("generate RSA key");
        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .expect("encode private key");

        let key_pair =
            rcgen::KeyPair::from_pem_and_sign_algo(&private_pem, &rcgen::PKCS_RSA_SHA256)
                .expect("load key into rcgen");
        let cert = rcgen::CertificateParams::new(vec!["casdoor".to_string()])
            .expect("certificate params")
            .self_signed(&key_pair)
            .expect("self-sign certificate");

        Self {
            encoding: EncodingKey::from_rsa_pem(private_pem.as_bytes())
                .expect("load encoding key"),
            certificate_pem: cert.pem(),
        }
    }

    pub fn certificate(&self, application: &str) -> Certificate {
        Certificate {
            application: application.to_string(),
            pem: self.certificate_pem.clone(),
        }
    }

    pub fn sign(&self, claims: &Value) -> String {
        encode(&Header::new(Algorithm::RS256), claims, &self.encoding).expect("sign token")
    }
}

/// The key whose certificate the provider publishes.
pub fn provider_key() -> &'static SigningKey {
    static KEY: OnceLock<SigningKey> = OnceLock::new();
    KEY.get_or_init(SigningKey::generate)
}

/// A key the provider's certificate does not match.
pub fn foreign_key() -> &'static SigningKey {
    static KEY: OnceLock<SigningKey> = OnceLock::new();
    KEY.get_or_init(SigningKey::generate)
}
