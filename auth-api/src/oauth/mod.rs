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

//! OAuth2/OIDC helpers: token endpoint encoding, signing certificates and
//! identity token verification.

pub mod certificate;
pub mod claims;
pub mod exchange;
pub mod verify;

pub use certificate::{Certificate, CertificateCache};
pub use claims::ClaimsSet;
pub use exchange::{build_signin_url, validate_callback, TokenPair};
pub use verify::verify_identity_token;
