//! Database entities for the catalog hierarchy (category > product > article)
//! plus the accounts used for token issuance.

use chrono::{DateTime, SubsecRound, Utc};

pub mod article;
pub mod category;
pub mod product;
pub mod user;

/// Current time at the precision the API exposes (microseconds), so a stored
/// timestamp always serializes to exactly what was written.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
