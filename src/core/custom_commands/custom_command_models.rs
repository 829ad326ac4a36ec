use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A guild-defined text trigger mapped to a canned response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomCommand {
    pub guild_id: u64,
    /// Always stored lower-cased.
    pub name: String,
    pub response: String,
    pub created_by: u64,
    pub uses: u64,
    pub created_at: DateTime<Utc>,
}

/// Command names are matched case-insensitively.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_folded() {
        assert_eq!(normalize_name("Greet"), "greet");
        assert_eq!(normalize_name("  GREET "), "greet");
    }
}
