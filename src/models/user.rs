use serde::{Deserialize, Serialize};

/// A named identity recorded as creator of stored records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
}
