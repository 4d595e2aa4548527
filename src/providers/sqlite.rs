use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::{AsyncConnection, RunQueryDsl};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

use crate::domains::chat::{Chat, ChatStatus, EmotionalState, EngineKind, Message, MessageRole};
use crate::domains::memory::{Dislike, LongTermMemory, MemoryMilestone, Nickname, Preference};
use crate::domains::relationship::{EmotionData, Intimacy, Mood, Relationship, Stage};
use crate::error::{CoreError, Result};
use crate::interfaces::store::ConversationStore;

mod schema;
use schema::{
    chats, long_term_memories, memory_dislikes, memory_milestones, memory_nicknames,
    memory_personal_info, memory_preferences, messages, relationships,
};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

type SqliteAsyncConn = SyncConnectionWrapper<SqliteConnection>;
type SqlitePool = Pool<SqliteAsyncConn>;
type SqlitePooledConn<'a> = PooledConnection<'a, SqliteAsyncConn>;

#[derive(Queryable, Insertable)]
#[diesel(table_name = chats)]
struct ChatRow {
    id: String,
    user_id: String,
    character_id: String,
    title: String,
    status: String,
    message_count: i64,
    total_characters: i64,
    last_message_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = messages)]
struct MessageRow {
    id: String,
    chat_id: String,
    role: String,
    dialogue: String,
    character_action: Option<String>,
    scene_description: Option<String>,
    emotional_state: Option<String>,
    engine: Option<String>,
    response_time_ms: Option<i64>,
    nsfw_level: i32,
    is_regenerated: bool,
    created_at: i64,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = relationships)]
struct RelationshipRow {
    id: String,
    user_id: String,
    character_id: String,
    chat_id: String,
    affection: i64,
    mood: String,
    stage: String,
    intimacy: String,
    total_interactions: i64,
    emotion_data: String,
    last_interaction: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = long_term_memories)]
struct MemoryRow {
    id: String,
    user_id: String,
    character_id: String,
    created_at: i64,
    updated_at: i64,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = memory_preferences)]
struct PreferenceRow {
    id: String,
    memory_id: String,
    category: String,
    content: String,
    importance: i64,
    evidence: String,
    created_at: i64,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = memory_nicknames)]
struct NicknameRow {
    id: String,
    memory_id: String,
    name: String,
    frequency: i64,
    last_used: i64,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = memory_milestones)]
struct MilestoneRow {
    id: String,
    memory_id: String,
    milestone_type: String,
    description: String,
    affection: i64,
    occurred_at: i64,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = memory_personal_info)]
struct PersonalInfoRow {
    id: String,
    memory_id: String,
    info_type: String,
    content: String,
    updated_at: i64,
}

#[derive(Queryable, Insertable)]
#[diesel(table_name = memory_dislikes)]
struct DislikeRow {
    id: String,
    memory_id: String,
    topic: String,
    severity: i64,
    evidence: String,
    recorded_at: i64,
}

/// Diesel-backed store. SQLite allows one writer at a time, so every
/// writing method funnels through `write_gate` before opening its
/// transaction.
pub struct SqliteConversationStore {
    pool: SqlitePool,
    write_gate: Arc<tokio::sync::Mutex<()>>,
}

impl SqliteConversationStore {
    pub async fn new(sqlite_path: &str, pool_size: u32) -> Result<Self> {
        ensure_parent_dir(sqlite_path)?;
        run_migrations(sqlite_path).await?;

        let manager = AsyncDieselConnectionManager::<SqliteAsyncConn>::new(sqlite_path);
        let pool: SqlitePool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .await
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        info!(path = sqlite_path, pool_size, "sqlite store ready");

        Ok(Self {
            pool,
            write_gate: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    async fn conn(&self) -> Result<SqlitePooledConn<'_>> {
        self.pool
            .get()
            .await
            .map_err(|e| CoreError::Storage(e.to_string()))
    }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn find_chat_by_user_character(
        &self,
        user_id: &str,
        character_id: &str,
    ) -> Result<Option<Chat>> {
        let mut conn = self.conn().await?;
        let row = chats::table
            .filter(chats::user_id.eq(user_id))
            .filter(chats::character_id.eq(character_id))
            .filter(chats::status.ne(ChatStatus::Deleted.as_str()))
            .order(chats::created_at.desc())
            .first::<ChatRow>(&mut *conn)
            .await
            .optional()?;
        row.map(chat_from_row).transpose()
    }

    async fn find_chat(&self, chat_id: &str) -> Result<Option<Chat>> {
        let mut conn = self.conn().await?;
        let row = chats::table
            .find(chat_id)
            .first::<ChatRow>(&mut *conn)
            .await
            .optional()?;
        row.map(chat_from_row).transpose()
    }

    async fn create_chat(
        &self,
        chat: &Chat,
        relationship: &Relationship,
        welcome: Option<&Message>,
    ) -> Result<()> {
        let chat_row = chat_to_row(chat);
        let rel_row = relationship_to_row(relationship)?;
        let welcome_row = welcome.map(message_to_row).transpose()?;

        let _write = self.write_gate.lock().await;
        let mut conn = self.conn().await?;
        let conn = &mut *conn;
        conn.transaction::<_, CoreError, _>(|conn| {
            async move {
                diesel::insert_into(chats::table)
                    .values(&chat_row)
                    .execute(conn)
                    .await?;
                diesel::insert_into(relationships::table)
                    .values(&rel_row)
                    .execute(conn)
                    .await?;
                if let Some(row) = &welcome_row {
                    diesel::insert_into(messages::table)
                        .values(row)
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    async fn find_message(&self, message_id: &str) -> Result<Option<Message>> {
        let mut conn = self.conn().await?;
        let row = messages::table
            .find(message_id)
            .first::<MessageRow>(&mut *conn)
            .await
            .optional()?;
        row.map(message_from_row).transpose()
    }

    async fn list_recent_messages(&self, chat_id: &str, limit: i64) -> Result<Vec<Message>> {
        let mut conn = self.conn().await?;
        let rows = messages::table
            .filter(messages::chat_id.eq(chat_id))
            .order((messages::created_at.desc(), messages::id.desc()))
            .limit(limit)
            .load::<MessageRow>(&mut *conn)
            .await?;
        rows.into_iter().map(message_from_row).collect()
    }

    async fn find_relationship_by_chat(&self, chat_id: &str) -> Result<Option<Relationship>> {
        let mut conn = self.conn().await?;
        let row = relationships::table
            .filter(relationships::chat_id.eq(chat_id))
            .first::<RelationshipRow>(&mut *conn)
            .await
            .optional()?;
        row.map(relationship_from_row).transpose()
    }

    async fn upsert_relationship(&self, relationship: &Relationship) -> Result<()> {
        let row = relationship_to_row(relationship)?;
        let _write = self.write_gate.lock().await;
        let mut conn = self.conn().await?;
        upsert_relationship_row(&mut *conn, &row).await
    }

    async fn save_user_turn(&self, message: &Message) -> Result<()> {
        let row = message_to_row(message)?;
        let chars = message.dialogue.chars().count() as i64;

        let _write = self.write_gate.lock().await;
        let mut conn = self.conn().await?;
        let conn = &mut *conn;
        conn.transaction::<_, CoreError, _>(|conn| {
            async move {
                diesel::insert_into(messages::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                bump_chat_counters(conn, &row.chat_id, chars, row.created_at).await
            }
            .scope_boxed()
        })
        .await
    }

    async fn save_assistant_turn(
        &self,
        message: &Message,
        relationship: &Relationship,
        memory: &LongTermMemory,
    ) -> Result<()> {
        let msg_row = message_to_row(message)?;
        let chars = message.dialogue.chars().count() as i64;
        let rel_row = relationship_to_row(relationship)?;
        let memory = memory.clone();

        let _write = self.write_gate.lock().await;
        let mut conn = self.conn().await?;
        let conn = &mut *conn;
        conn.transaction::<_, CoreError, _>(|conn| {
            async move {
                diesel::insert_into(messages::table)
                    .values(&msg_row)
                    .execute(conn)
                    .await?;
                bump_chat_counters(conn, &msg_row.chat_id, chars, msg_row.created_at).await?;
                upsert_relationship_row(conn, &rel_row).await?;
                save_memory_tx(conn, &memory).await
            }
            .scope_boxed()
        })
        .await
    }

    async fn load_long_term_memory(
        &self,
        user_id: &str,
        character_id: &str,
    ) -> Result<Option<LongTermMemory>> {
        let mut conn = self.conn().await?;
        let parent = long_term_memories::table
            .filter(long_term_memories::user_id.eq(user_id))
            .filter(long_term_memories::character_id.eq(character_id))
            .first::<MemoryRow>(&mut *conn)
            .await
            .optional()?;
        let Some(parent) = parent else {
            return Ok(None);
        };

        let prefs = memory_preferences::table
            .filter(memory_preferences::memory_id.eq(&parent.id))
            .order(memory_preferences::created_at.asc())
            .load::<PreferenceRow>(&mut *conn)
            .await?;
        let nicknames = memory_nicknames::table
            .filter(memory_nicknames::memory_id.eq(&parent.id))
            .order(memory_nicknames::last_used.asc())
            .load::<NicknameRow>(&mut *conn)
            .await?;
        let milestones = memory_milestones::table
            .filter(memory_milestones::memory_id.eq(&parent.id))
            .order(memory_milestones::occurred_at.asc())
            .load::<MilestoneRow>(&mut *conn)
            .await?;
        let dislikes = memory_dislikes::table
            .filter(memory_dislikes::memory_id.eq(&parent.id))
            .order(memory_dislikes::recorded_at.asc())
            .load::<DislikeRow>(&mut *conn)
            .await?;
        let info = memory_personal_info::table
            .filter(memory_personal_info::memory_id.eq(&parent.id))
            .load::<PersonalInfoRow>(&mut *conn)
            .await?;

        Ok(Some(LongTermMemory {
            id: parent.id,
            user_id: parent.user_id,
            character_id: parent.character_id,
            preferences: prefs
                .into_iter()
                .map(|r| Preference {
                    id: r.id,
                    category: r.category,
                    content: r.content,
                    importance: r.importance,
                    evidence: r.evidence,
                    created_at: r.created_at,
                })
                .collect(),
            nicknames: nicknames
                .into_iter()
                .map(|r| Nickname {
                    id: r.id,
                    name: r.name,
                    frequency: r.frequency,
                    last_used: r.last_used,
                })
                .collect(),
            milestones: milestones
                .into_iter()
                .map(|r| MemoryMilestone {
                    id: r.id,
                    milestone_type: r.milestone_type,
                    description: r.description,
                    affection: r.affection,
                    occurred_at: r.occurred_at,
                })
                .collect(),
            dislikes: dislikes
                .into_iter()
                .map(|r| Dislike {
                    id: r.id,
                    topic: r.topic,
                    severity: r.severity,
                    evidence: r.evidence,
                    recorded_at: r.recorded_at,
                })
                .collect(),
            personal_info: info
                .into_iter()
                .map(|r| (r.info_type, r.content))
                .collect(),
            created_at: parent.created_at,
            updated_at: parent.updated_at,
        }))
    }

    async fn save_long_term_memory(&self, memory: &LongTermMemory) -> Result<()> {
        let memory = memory.clone();
        let _write = self.write_gate.lock().await;
        let mut conn = self.conn().await?;
        let conn = &mut *conn;
        conn.transaction::<_, CoreError, _>(|conn| {
            async move { save_memory_tx(conn, &memory).await }.scope_boxed()
        })
        .await
    }
}

async fn bump_chat_counters(
    conn: &mut SqliteAsyncConn,
    chat_id: &str,
    chars: i64,
    at: i64,
) -> Result<()> {
    let updated = diesel::update(chats::table.find(chat_id))
        .set((
            chats::message_count.eq(chats::message_count + 1),
            chats::total_characters.eq(chats::total_characters + chars),
            chats::last_message_at.eq(Some(at)),
            chats::updated_at.eq(at),
        ))
        .execute(conn)
        .await?;
    if updated == 0 {
        return Err(CoreError::NotFound(format!("chat {chat_id}")));
    }
    Ok(())
}

async fn upsert_relationship_row(
    conn: &mut SqliteAsyncConn,
    row: &RelationshipRow,
) -> Result<()> {
    diesel::insert_into(relationships::table)
        .values(row)
        .on_conflict(relationships::chat_id)
        .do_update()
        .set((
            relationships::affection.eq(&row.affection),
            relationships::mood.eq(&row.mood),
            relationships::stage.eq(&row.stage),
            relationships::intimacy.eq(&row.intimacy),
            relationships::total_interactions.eq(&row.total_interactions),
            relationships::emotion_data.eq(&row.emotion_data),
            relationships::last_interaction.eq(&row.last_interaction),
            relationships::updated_at.eq(&row.updated_at),
        ))
        .execute(conn)
        .await?;
    Ok(())
}

/// Clears the five child tables and re-inserts the aggregate under its
/// memory id, then upserts the parent row. Saving the same aggregate
/// twice lands in the same state.
async fn save_memory_tx(conn: &mut SqliteAsyncConn, memory: &LongTermMemory) -> Result<()> {
    let parent = MemoryRow {
        id: memory.id.clone(),
        user_id: memory.user_id.clone(),
        character_id: memory.character_id.clone(),
        created_at: memory.created_at,
        updated_at: memory.updated_at,
    };
    diesel::insert_into(long_term_memories::table)
        .values(&parent)
        .on_conflict((
            long_term_memories::user_id,
            long_term_memories::character_id,
        ))
        .do_update()
        .set(long_term_memories::updated_at.eq(parent.updated_at))
        .execute(conn)
        .await?;

    diesel::delete(memory_preferences::table.filter(memory_preferences::memory_id.eq(&memory.id)))
        .execute(conn)
        .await?;
    diesel::delete(memory_nicknames::table.filter(memory_nicknames::memory_id.eq(&memory.id)))
        .execute(conn)
        .await?;
    diesel::delete(memory_milestones::table.filter(memory_milestones::memory_id.eq(&memory.id)))
        .execute(conn)
        .await?;
    diesel::delete(memory_dislikes::table.filter(memory_dislikes::memory_id.eq(&memory.id)))
        .execute(conn)
        .await?;
    diesel::delete(
        memory_personal_info::table.filter(memory_personal_info::memory_id.eq(&memory.id)),
    )
    .execute(conn)
    .await?;

    for pref in &memory.preferences {
        let row = PreferenceRow {
            id: pref.id.clone(),
            memory_id: memory.id.clone(),
            category: pref.category.clone(),
            content: pref.content.clone(),
            importance: pref.importance,
            evidence: pref.evidence.clone(),
            created_at: pref.created_at,
        };
        diesel::insert_into(memory_preferences::table)
            .values(&row)
            .execute(conn)
            .await?;
    }
    for nick in &memory.nicknames {
        let row = NicknameRow {
            id: nick.id.clone(),
            memory_id: memory.id.clone(),
            name: nick.name.clone(),
            frequency: nick.frequency,
            last_used: nick.last_used,
        };
        diesel::insert_into(memory_nicknames::table)
            .values(&row)
            .execute(conn)
            .await?;
    }
    for milestone in &memory.milestones {
        let row = MilestoneRow {
            id: milestone.id.clone(),
            memory_id: memory.id.clone(),
            milestone_type: milestone.milestone_type.clone(),
            description: milestone.description.clone(),
            affection: milestone.affection,
            occurred_at: milestone.occurred_at,
        };
        diesel::insert_into(memory_milestones::table)
            .values(&row)
            .execute(conn)
            .await?;
    }
    for dislike in &memory.dislikes {
        let row = DislikeRow {
            id: dislike.id.clone(),
            memory_id: memory.id.clone(),
            topic: dislike.topic.clone(),
            severity: dislike.severity,
            evidence: dislike.evidence.clone(),
            recorded_at: dislike.recorded_at,
        };
        diesel::insert_into(memory_dislikes::table)
            .values(&row)
            .execute(conn)
            .await?;
    }
    for (info_type, content) in &memory.personal_info {
        // Keyed id keeps re-saves of an unchanged aggregate row-identical.
        let row = PersonalInfoRow {
            id: format!("{}:{}", memory.id, info_type),
            memory_id: memory.id.clone(),
            info_type: info_type.clone(),
            content: content.clone(),
            updated_at: memory.updated_at,
        };
        diesel::insert_into(memory_personal_info::table)
            .values(&row)
            .execute(conn)
            .await?;
    }
    Ok(())
}

fn chat_to_row(chat: &Chat) -> ChatRow {
    ChatRow {
        id: chat.id.clone(),
        user_id: chat.user_id.clone(),
        character_id: chat.character_id.clone(),
        title: chat.title.clone(),
        status: chat.status.as_str().to_string(),
        message_count: chat.message_count,
        total_characters: chat.total_characters,
        last_message_at: chat.last_message_at,
        created_at: chat.created_at,
        updated_at: chat.updated_at,
    }
}

fn chat_from_row(row: ChatRow) -> Result<Chat> {
    let status = ChatStatus::parse(&row.status)
        .ok_or_else(|| CoreError::Storage(format!("unknown chat status {}", row.status)))?;
    Ok(Chat {
        id: row.id,
        user_id: row.user_id,
        character_id: row.character_id,
        title: row.title,
        status,
        message_count: row.message_count,
        total_characters: row.total_characters,
        last_message_at: row.last_message_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn message_to_row(message: &Message) -> Result<MessageRow> {
    let emotional_state = message
        .emotional_state
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| CoreError::Storage(format!("emotional_state encode: {e}")))?;
    Ok(MessageRow {
        id: message.id.clone(),
        chat_id: message.chat_id.clone(),
        role: message.role.as_str().to_string(),
        dialogue: message.dialogue.clone(),
        character_action: message.character_action.clone(),
        scene_description: message.scene_description.clone(),
        emotional_state,
        engine: message.engine.map(|e| e.as_str().to_string()),
        response_time_ms: message.response_time_ms,
        nsfw_level: message.nsfw_level as i32,
        is_regenerated: message.is_regenerated,
        created_at: message.created_at,
    })
}

fn message_from_row(row: MessageRow) -> Result<Message> {
    let role = MessageRole::parse(&row.role)
        .ok_or_else(|| CoreError::Storage(format!("unknown message role {}", row.role)))?;
    let emotional_state: Option<EmotionalState> = row
        .emotional_state
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| CoreError::Storage(format!("emotional_state decode: {e}")))?;
    let engine = match row.engine.as_deref() {
        Some(value) => Some(
            EngineKind::parse(value)
                .ok_or_else(|| CoreError::Storage(format!("unknown engine {value}")))?,
        ),
        None => None,
    };
    Ok(Message {
        id: row.id,
        chat_id: row.chat_id,
        role,
        dialogue: row.dialogue,
        character_action: row.character_action,
        scene_description: row.scene_description,
        emotional_state,
        engine,
        response_time_ms: row.response_time_ms,
        nsfw_level: row.nsfw_level as u8,
        is_regenerated: row.is_regenerated,
        created_at: row.created_at,
    })
}

fn relationship_to_row(relationship: &Relationship) -> Result<RelationshipRow> {
    let emotion_data = serde_json::to_string(&relationship.emotion_data)
        .map_err(|e| CoreError::Storage(format!("emotion_data encode: {e}")))?;
    Ok(RelationshipRow {
        id: relationship.id.clone(),
        user_id: relationship.user_id.clone(),
        character_id: relationship.character_id.clone(),
        chat_id: relationship.chat_id.clone(),
        affection: relationship.affection,
        mood: relationship.mood.as_str().to_string(),
        stage: relationship.stage.as_str().to_string(),
        intimacy: relationship.intimacy.as_str().to_string(),
        total_interactions: relationship.total_interactions,
        emotion_data,
        last_interaction: relationship.last_interaction,
        created_at: relationship.created_at,
        updated_at: relationship.updated_at,
    })
}

fn relationship_from_row(row: RelationshipRow) -> Result<Relationship> {
    let mood = Mood::from_wire(&row.mood)
        .ok_or_else(|| CoreError::Storage(format!("unknown mood {}", row.mood)))?;
    let stage = Stage::parse(&row.stage)
        .ok_or_else(|| CoreError::Storage(format!("unknown stage {}", row.stage)))?;
    let intimacy = Intimacy::parse(&row.intimacy)
        .ok_or_else(|| CoreError::Storage(format!("unknown intimacy {}", row.intimacy)))?;
    let emotion_data: EmotionData = serde_json::from_str(&row.emotion_data)
        .map_err(|e| CoreError::Storage(format!("emotion_data decode: {e}")))?;
    Ok(Relationship {
        id: row.id,
        user_id: row.user_id,
        character_id: row.character_id,
        chat_id: row.chat_id,
        affection: row.affection,
        mood,
        stage,
        intimacy,
        total_interactions: row.total_interactions,
        emotion_data,
        last_interaction: row.last_interaction,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn ensure_parent_dir(path: &str) -> Result<()> {
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::Storage(e.to_string()))?;
        }
    }
    Ok(())
}

async fn run_migrations(database_url: &str) -> Result<()> {
    let database_url = database_url.to_string();
    tokio::task::spawn_blocking(move || {
        let mut conn = SqliteConnection::establish(&database_url)
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        diesel::connection::SimpleConnection::batch_execute(
            &mut conn,
            "PRAGMA foreign_keys = ON;",
        )
        .map_err(|e| CoreError::Storage(e.to_string()))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        Ok::<_, CoreError>(())
    })
    .await
    .map_err(|e| CoreError::Storage(e.to_string()))??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn personal_info_ids(store: &SqliteConversationStore) -> Vec<String> {
        let mut conn = store.conn().await.unwrap();
        memory_personal_info::table
            .select(memory_personal_info::id)
            .order(memory_personal_info::id.asc())
            .load::<String>(&mut *conn)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn resaving_memory_keeps_personal_info_row_ids() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("mem.db").to_string_lossy().to_string();
        let store = SqliteConversationStore::new(&path, 2).await.unwrap();

        let mut memory = LongTermMemory::empty("u1", "c_gentle", 1_000);
        memory
            .personal_info
            .insert("age".to_string(), "25".to_string());
        memory
            .personal_info
            .insert("location".to_string(), "台中".to_string());
        store.save_long_term_memory(&memory).await.unwrap();

        let first = personal_info_ids(&store).await;
        assert_eq!(first.len(), 2);
        store.save_long_term_memory(&memory).await.unwrap();
        assert_eq!(personal_info_ids(&store).await, first);
    }
}
