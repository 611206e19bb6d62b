//! Risk identifiers.
//!
//! `risk_id` is a random UUID and is the only identity. `risk_code` is a
//! readable label `<DOMAIN>-<JURISDICTION>-<SEQUENCE>` that may collide.

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use safetygraph_common::UnifiedDomain;

const SEQUENCE_MODULUS: u64 = 100_000_000;

pub fn generate_risk_id() -> Uuid {
    Uuid::new_v4()
}

/// Build a risk code. Without an explicit sequence one is derived from
/// `(domain, jurisdiction, now)`.
pub fn generate_risk_code(domain: UnifiedDomain, jurisdiction: &str, sequence: Option<u64>) -> String {
    let sequence = sequence.unwrap_or_else(|| derive_sequence(domain, jurisdiction, Utc::now()));
    format_risk_code(domain, jurisdiction, sequence)
}

pub fn format_risk_code(domain: UnifiedDomain, jurisdiction: &str, sequence: u64) -> String {
    let prefix: String = domain.code().chars().take(4).collect::<String>().to_uppercase();
    format!(
        "{}-{}-{:08}",
        prefix,
        jurisdiction.trim().to_uppercase(),
        sequence % SEQUENCE_MODULUS
    )
}

pub fn derive_sequence(domain: UnifiedDomain, jurisdiction: &str, at: DateTime<Utc>) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(domain.code().as_bytes());
    hasher.update(jurisdiction.as_bytes());
    hasher.update(at.to_rfc3339_opts(SecondsFormat::Nanos, true).as_bytes());
    let digest = hex::encode(hasher.finalize());
    // 8 hex digits always fit in a u64.
    u64::from_str_radix(&digest[..8], 16).unwrap_or_default() % SEQUENCE_MODULUS
}

/// True when `code` looks like `<1-4 letters>-<jurisdiction>-<8 digits>`.
pub fn is_well_formed_risk_code(code: &str) -> bool {
    let mut parts = code.splitn(3, '-');
    let (Some(prefix), Some(juris), Some(seq)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    let upper = |s: &str, digits_ok: bool| {
        !s.is_empty()
            && s.chars().all(|c| c.is_ascii_uppercase() || (digits_ok && c.is_ascii_digit()))
    };
    upper(prefix, false)
        && prefix.len() <= 4
        && upper(juris, true)
        && seq.len() == 8
        && seq.chars().all(|c| c.is_ascii_digit())
}
