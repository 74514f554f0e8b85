//! Document numbers of the form `PREFIX-YYYYMMDD-NNNN`.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::errors::ServiceError;
use crate::models::EntityKind;

const MAX_ATTEMPTS: usize = 64;

/// Builds a number for `kind` dated `at` with a random four digit suffix.
pub fn document_number<G: Rng>(kind: EntityKind, at: DateTime<Utc>, rng: &mut G) -> String {
    format!(
        "{}-{}-{}",
        kind.number_prefix(),
        at.format("%Y%m%d"),
        rng.gen_range(1000..=9999)
    )
}

/// Generates a number that does not collide with any of `existing`.
pub fn unique_document_number<'a, I>(
    kind: EntityKind,
    at: DateTime<Utc>,
    existing: I,
) -> Result<String, ServiceError>
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: std::collections::HashSet<&str> = existing.into_iter().collect();
    let mut rng = rand::thread_rng();

    for _ in 0..MAX_ATTEMPTS {
        let candidate = document_number(kind, at, &mut rng);
        if !taken.contains(candidate.as_str()) {
            return Ok(candidate);
        }
    }

    Err(ServiceError::InvalidOperation(format!(
        "Could not allocate a free {} number for {}",
        kind.label(),
        at.format("%Y-%m-%d")
    )))
}
