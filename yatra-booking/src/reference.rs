use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const REFERENCE_PREFIX: &str = "TB";
pub const REFERENCE_LEN: usize = 14;

/// Fresh booking reference: `TB`, six digits of the clock, six hex chars of a random UUID.
///
/// Two references generated in the same second differ only in the random part,
/// so callers still rely on the unique index and regenerate on conflict.
pub fn generate_reference() -> String {
    generate_reference_at(Utc::now(), Uuid::new_v4())
}

pub fn generate_reference_at(at: DateTime<Utc>, nonce: Uuid) -> String {
    let seconds = at.timestamp().rem_euclid(1_000_000);
    let random: String = nonce
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect::<String>()
        .to_uppercase();
    format!("{}{:06}{}", REFERENCE_PREFIX, seconds, random)
}

pub fn is_well_formed(reference: &str) -> bool {
    let Some(rest) = reference.strip_prefix(REFERENCE_PREFIX) else {
        return false;
    };
    if reference.len() != REFERENCE_LEN || !reference.is_ascii() {
        return false;
    }
    let (clock, random) = rest.split_at(6);
    clock.chars().all(|c| c.is_ascii_digit())
        && random.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
}
