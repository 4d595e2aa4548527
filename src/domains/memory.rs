use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    pub id: String,
    pub category: String,
    pub content: String,
    /// 1..=10; heuristic, bumped by intensifiers at extraction time.
    pub importance: i64,
    pub evidence: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nickname {
    pub id: String,
    pub name: String,
    pub frequency: i64,
    pub last_used: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMilestone {
    pub id: String,
    pub milestone_type: String,
    pub description: String,
    pub affection: i64,
    pub occurred_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dislike {
    pub id: String,
    pub topic: String,
    /// 1..=5.
    pub severity: i64,
    pub evidence: String,
    pub recorded_at: i64,
}

/// Per-(user, character) aggregate. The aggregate is the unit of save:
/// child collections are cleared and re-inserted under `id` in one
/// transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LongTermMemory {
    pub id: String,
    pub user_id: String,
    pub character_id: String,
    pub preferences: Vec<Preference>,
    pub nicknames: Vec<Nickname>,
    pub milestones: Vec<MemoryMilestone>,
    pub dislikes: Vec<Dislike>,
    /// info_type → content (age, occupation, location, family, ...).
    pub personal_info: BTreeMap<String, String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl LongTermMemory {
    pub fn empty(user_id: &str, character_id: &str, now: i64) -> Self {
        Self {
            id: new_memory_id(),
            user_id: user_id.to_string(),
            character_id: character_id.to_string(),
            preferences: Vec::new(),
            nicknames: Vec::new(),
            milestones: Vec::new(),
            dislikes: Vec::new(),
            personal_info: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty()
            && self.nicknames.is_empty()
            && self.milestones.is_empty()
            && self.dislikes.is_empty()
            && self.personal_info.is_empty()
    }
}

pub fn new_memory_id() -> String {
    format!("mem_{}", uuid::Uuid::new_v4().simple())
}

pub fn new_memory_item_id() -> String {
    format!("mit_{}", uuid::Uuid::new_v4().simple())
}
