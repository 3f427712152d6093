//! Achievement wire record. The entity's `name` travels as `achievement_name`.

use super::fields::char_field;
use crate::error::FieldErrors;
use crate::models::{limits, Achievement};
use serde::Serialize;
use serde_json::Value;

pub const NAME_FIELD: &str = "achievement_name";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementRecord {
    pub id: i64,
    pub achievement_name: String,
}

impl From<&Achievement> for AchievementRecord {
    fn from(a: &Achievement) -> Self {
        AchievementRecord {
            id: a.id,
            achievement_name: a.name.clone(),
        }
    }
}

/// Validated inbound achievement: only the natural key is writable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementInput {
    pub name: String,
}

impl AchievementInput {
    /// Parse one list item; `path` prefixes error keys, e.g. `achievements[0]`.
    pub fn from_wire(item: &Value, path: &str, errors: &mut FieldErrors) -> Option<Self> {
        let Value::Object(map) = item else {
            errors.add(
                path,
                format!(
                    "Invalid data. Expected a dictionary, but got {}.",
                    super::fields::type_name(item)
                ),
            );
            return None;
        };
        let field_path = format!("{}.{}", path, NAME_FIELD);
        char_field(map, NAME_FIELD, &field_path, limits::ACHIEVEMENT_NAME, true, errors)
            .map(|name| AchievementInput { name })
    }
}

impl From<&AchievementRecord> for AchievementInput {
    fn from(record: &AchievementRecord) -> Self {
        AchievementInput {
            name: record.achievement_name.clone(),
        }
    }
}
