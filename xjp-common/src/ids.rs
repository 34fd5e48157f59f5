//! Record identifier utilities

use uuid::Uuid;

/// Length of the random part of a generated record id
const SHORT_ID_LEN: usize = 8;

/// Generate a new record id with the given prefix, e.g. `m_3f9a1c02`
///
/// Member ids use `m`, singles `s`, posts `p`.
pub fn generate(prefix: &str) -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &simple[..SHORT_ID_LEN])
}
