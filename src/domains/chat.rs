use serde::{Deserialize, Serialize};

use crate::domains::relationship::{Intimacy, Mood, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(MessageRole::User),
            "assistant" => Some(MessageRole::Assistant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    Active,
    Archived,
    Deleted,
}

impl ChatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatStatus::Active => "active",
            ChatStatus::Archived => "archived",
            ChatStatus::Deleted => "deleted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(ChatStatus::Active),
            "archived" => Some(ChatStatus::Archived),
            "deleted" => Some(ChatStatus::Deleted),
            _ => None,
        }
    }
}

/// Which of the two generation backends produced an assistant message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Safe,
    Adult,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Safe => "safe",
            EngineKind::Adult => "adult",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "safe" => Some(EngineKind::Safe),
            "adult" => Some(EngineKind::Adult),
            _ => None,
        }
    }
}

/// Snapshot of the relationship attached to an assistant message at the
/// moment it was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionalState {
    pub affection: i64,
    pub mood: Mood,
    pub relationship: Stage,
    pub intimacy_level: Intimacy,
}

#[derive(Debug, Clone)]
pub struct Chat {
    pub id: String,
    pub user_id: String,
    pub character_id: String,
    pub title: String,
    pub status: ChatStatus,
    pub message_count: i64,
    pub total_characters: i64,
    pub last_message_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub role: MessageRole,
    pub dialogue: String,
    pub character_action: Option<String>,
    pub scene_description: Option<String>,
    pub emotional_state: Option<EmotionalState>,
    pub engine: Option<EngineKind>,
    pub response_time_ms: Option<i64>,
    pub nsfw_level: u8,
    pub is_regenerated: bool,
    pub created_at: i64,
}

pub fn new_chat_id() -> String {
    format!("chat_{}", uuid::Uuid::new_v4().simple())
}

pub fn new_message_id() -> String {
    format!("msg_{}", uuid::Uuid::new_v4().simple())
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
