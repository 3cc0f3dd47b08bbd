use std::fmt;

use serde_json::Value;

/// Upstream leaderboard formats, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    /// Historical snapshot: `{ scores: [...] }`.
    V1,
    /// Scraped page: `{ leaderboard: { competitors: [...] } }`.
    V2,
    /// GraphQL: `{ data: { leaderboard: { players: [...] } } }`.
    V3,
}

impl SchemaVersion {
    /// Detect the format from the location of the player container.
    pub fn detect(raw: &Value) -> Option<Self> {
        let root = raw.as_object()?;
        let is_array = |value: Option<&Value>| value.is_some_and(Value::is_array);

        if is_array(
            root.get("data")
                .and_then(|data| data.get("leaderboard"))
                .and_then(|board| board.get("players")),
        ) {
            Some(Self::V3)
        } else if is_array(
            root.get("leaderboard")
                .and_then(|board| board.get("competitors")),
        ) {
            Some(Self::V2)
        } else if is_array(root.get("scores")) {
            Some(Self::V1)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::V3 => "v3",
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn detects_each_version() {
        assert_eq!(SchemaVersion::detect(&json!({"scores": []})), Some(SchemaVersion::V1));
        assert_eq!(
            SchemaVersion::detect(&json!({"leaderboard": {"competitors": []}})),
            Some(SchemaVersion::V2)
        );
        assert_eq!(
            SchemaVersion::detect(&json!({"data": {"leaderboard": {"players": []}}})),
            Some(SchemaVersion::V3)
        );
    }

    #[test]
    fn rejects_unknown_payloads() {
        assert_eq!(SchemaVersion::detect(&json!([])), None);
        assert_eq!(SchemaVersion::detect(&json!({"scores": {}})), None);
        assert_eq!(SchemaVersion::detect(&json!({"leaderboard": {}})), None);
        assert_eq!(SchemaVersion::detect(&json!({"errors": [{"message": "x"}]})), None);
    }
}
