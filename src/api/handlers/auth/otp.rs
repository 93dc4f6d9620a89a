//! One-time code generation and expiry policy.

use rand::{rngs::OsRng, Rng};

/// Codes expire a fixed 10 minutes after issuance; the TTL is bound into the
/// SQL that stores the challenge.
pub(super) const OTP_TTL_SECONDS: i64 = 10 * 60;

/// Generate a 6-digit code drawn uniformly from 000000-999999.
///
/// Uses the OS CSPRNG; the code is hashed before storage and only ever
/// leaves the service inside the OTP email.
pub(super) fn generate_otp() -> String {
    let code: u32 = OsRng.gen_range(0..1_000_000);
    format!("{code:06}")
}
