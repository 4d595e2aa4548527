use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domains::character::{CharacterConfig, CharacterRegistry};
use crate::domains::chat::{
    new_chat_id, new_message_id, now_ms, Chat, ChatStatus, EmotionalState, EngineKind, Message,
    MessageRole,
};
use crate::domains::memory::LongTermMemory;
use crate::domains::relationship::Relationship;
use crate::error::{CoreError, Result};
use crate::interfaces::engines::{ChatEngine, GenerationRequest};
use crate::interfaces::store::ConversationStore;
use crate::services::classifier::ContentClassifier;
use crate::services::prompt::{self, PromptContext, HISTORY_WINDOW};
use crate::services::selector::{select_engine, EngineChoice};
use crate::services::{memory as memory_service, relationship as relationship_service};

pub const MAX_MESSAGE_CHARS: usize = 2000;
const TURN_DEADLINE: Duration = Duration::from_secs(30);
const ADAPTER_DEADLINE: Duration = Duration::from_secs(25);
/// Messages fetched per turn; covers both the prompt window and the
/// intimacy ratio window.
const HISTORY_FETCH: i64 = 20;

/// What a finished turn hands back to the HTTP layer.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub message_id: String,
    pub chat_id: String,
    pub dialogue: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_description: Option<String>,
    pub emotional_state: EmotionalState,
    pub engine: EngineKind,
    pub nsfw_level: u8,
    pub response_time_ms: i64,
}

/// Glue for a whole turn: resolve the chat, classify, Phase 1, generate,
/// roll the relationship and memory forward, Phase 2. Turns within one
/// (user, character) pair serialise on a keyed lock held across both
/// phases; different pairs proceed in parallel.
pub struct ConversationService {
    store: Arc<dyn ConversationStore>,
    characters: Arc<CharacterRegistry>,
    classifier: ContentClassifier,
    safe_engine: Arc<dyn ChatEngine>,
    adult_engine: Arc<dyn ChatEngine>,
    chat_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    turn_deadline: Duration,
    adapter_deadline: Duration,
}

impl ConversationService {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        characters: Arc<CharacterRegistry>,
        safe_engine: Arc<dyn ChatEngine>,
        adult_engine: Arc<dyn ChatEngine>,
    ) -> Self {
        Self {
            store,
            characters,
            classifier: ContentClassifier::new(),
            safe_engine,
            adult_engine,
            chat_locks: Mutex::new(HashMap::new()),
            turn_deadline: TURN_DEADLINE,
            adapter_deadline: ADAPTER_DEADLINE,
        }
    }

    /// Test hook; production deadlines are fixed.
    pub fn with_deadlines(mut self, turn: Duration, adapter: Duration) -> Self {
        self.turn_deadline = turn;
        self.adapter_deadline = adapter;
        self
    }

    pub async fn process_message(
        &self,
        user_id: &str,
        character_id: &str,
        text: &str,
    ) -> Result<TurnOutcome> {
        validate_message(text)?;
        let character = self.character(character_id)?;

        let _guard = self.lock_pair(user_id, character_id).await;
        let deadline = self.turn_deadline;
        tokio::time::timeout(deadline, self.run_turn(user_id, &character, text, false, None))
            .await
            .map_err(|_| CoreError::Deadline("turn exceeded 30s".to_string()))?
    }

    /// Reuses the latest user message of the chat owning `message_id`
    /// and appends a fresh assistant message flagged as regenerated.
    /// There is no Phase 1; the prior user message already stands.
    pub async fn regenerate(&self, user_id: &str, message_id: &str) -> Result<TurnOutcome> {
        let message = self
            .store
            .find_message(message_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("message {message_id}")))?;
        let chat = self
            .store
            .find_chat(&message.chat_id)
            .await?
            .filter(|c| c.user_id == user_id)
            .ok_or_else(|| CoreError::NotFound(format!("chat {}", message.chat_id)))?;
        let character = self.character(&chat.character_id)?;

        let _guard = self.lock_pair(user_id, &chat.character_id).await;
        let deadline = self.turn_deadline;
        tokio::time::timeout(deadline, async {
            let recent = self.store.list_recent_messages(&chat.id, HISTORY_FETCH).await?;
            let last_user = recent
                .iter()
                .find(|m| m.role == MessageRole::User)
                .cloned()
                .ok_or_else(|| {
                    CoreError::NotFound(format!("no user message in chat {}", chat.id))
                })?;
            self.run_turn(user_id, &character, &last_user.dialogue, true, Some(chat.clone()))
                .await
        })
        .await
        .map_err(|_| CoreError::Deadline("turn exceeded 30s".to_string()))?
    }

    /// Read view for the relationship endpoints.
    pub async fn relationship_for_chat(
        &self,
        user_id: &str,
        chat_id: &str,
    ) -> Result<Relationship> {
        let chat = self
            .store
            .find_chat(chat_id)
            .await?
            .filter(|c| c.user_id == user_id && c.status != ChatStatus::Deleted)
            .ok_or_else(|| CoreError::NotFound(format!("chat {chat_id}")))?;
        self.store
            .find_relationship_by_chat(&chat.id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("relationship for chat {chat_id}")))
    }

    pub fn character_max_affection(&self, character_id: &str) -> i64 {
        self.characters
            .get(character_id)
            .map(|c| c.emotional.max_affection)
            .unwrap_or(100)
    }

    async fn run_turn(
        &self,
        user_id: &str,
        character: &Arc<CharacterConfig>,
        text: &str,
        is_regenerated: bool,
        existing_chat: Option<Chat>,
    ) -> Result<TurnOutcome> {
        let chat = match existing_chat {
            Some(chat) => chat,
            None => self.resolve_chat(user_id, character).await?,
        };

        let classification = self.classifier.classify(text);
        let choice = select_engine(&classification, character)?;
        info!(
            chat_id = %chat.id,
            level = classification.level,
            effective = choice.effective_level,
            engine = choice.engine.as_str(),
            confidence = classification.confidence,
            "message classified"
        );

        if !is_regenerated {
            let user_message = Message {
                id: new_message_id(),
                chat_id: chat.id.clone(),
                role: MessageRole::User,
                dialogue: text.to_string(),
                character_action: None,
                scene_description: None,
                emotional_state: None,
                engine: None,
                response_time_ms: None,
                nsfw_level: classification.level,
                is_regenerated: false,
                created_at: now_ms(),
            };
            self.store.save_user_turn(&user_message).await?;
        }

        let mut memory = self
            .store
            .load_long_term_memory(user_id, &character.id)
            .await?
            .unwrap_or_else(|| LongTermMemory::empty(user_id, &character.id, now_ms()));
        let recent = self.store.list_recent_messages(&chat.id, HISTORY_FETCH).await?;
        let relationship = match self.store.find_relationship_by_chat(&chat.id).await? {
            Some(rel) => rel,
            None => {
                warn!(chat_id = %chat.id, "relationship row missing, reseeding");
                relationship_service::initial_relationship(user_id, character, &chat.id, now_ms())
            }
        };

        let mut history: Vec<Message> = recent.iter().rev().cloned().collect();
        if history.len() > HISTORY_WINDOW {
            history.drain(..history.len() - HISTORY_WINDOW);
        }

        let built = prompt::build_prompt(&PromptContext {
            character,
            relationship: &relationship,
            memory: &memory,
            history: &history,
            level: choice.effective_level,
            engine: choice.engine,
            user_message: text,
        });

        let engine = self.engine_for(&choice);
        let request = GenerationRequest {
            system_prompt: built.system_prompt,
            user_prompt: built.user_prompt,
            temperature: built.temperature,
            max_tokens: built.max_tokens,
        };
        let started = Instant::now();
        let reply = tokio::time::timeout(self.adapter_deadline, engine.generate(&request))
            .await
            .map_err(|_| CoreError::Deadline("generation exceeded 25s".to_string()))??;
        let response_time_ms = started.elapsed().as_millis() as i64;

        let now = now_ms();
        let update = relationship_service::apply_turn(
            &relationship,
            character,
            reply.emotion_delta.as_ref(),
            text,
            &recent,
            now,
        );
        memory_service::consolidate(&mut memory, text, &reply.dialogue, &update.milestones, now);

        let emotional_state = EmotionalState {
            affection: update.relationship.affection,
            mood: update.relationship.mood,
            relationship: update.relationship.stage,
            intimacy_level: update.relationship.intimacy,
        };
        let assistant_message = Message {
            id: new_message_id(),
            chat_id: chat.id.clone(),
            role: MessageRole::Assistant,
            dialogue: reply.dialogue.clone(),
            character_action: reply.action.clone(),
            scene_description: reply.scene_description.clone(),
            emotional_state: Some(emotional_state.clone()),
            engine: Some(choice.engine),
            response_time_ms: Some(response_time_ms),
            nsfw_level: choice.effective_level,
            is_regenerated,
            created_at: now,
        };
        self.store
            .save_assistant_turn(&assistant_message, &update.relationship, &memory)
            .await?;

        info!(
            chat_id = %chat.id,
            message_id = %assistant_message.id,
            engine = choice.engine.as_str(),
            response_time_ms,
            affection = update.relationship.affection,
            "assistant turn committed"
        );

        Ok(TurnOutcome {
            message_id: assistant_message.id,
            chat_id: chat.id,
            dialogue: reply.dialogue,
            action: reply.action,
            scene_description: reply.scene_description,
            emotional_state,
            engine: choice.engine,
            nsfw_level: choice.effective_level,
            response_time_ms,
        })
    }

    /// One active chat per (user, character): reuse the existing row or
    /// create chat + relationship + welcome message in one transaction.
    /// Callers hold the pair lock, so creation cannot race itself.
    async fn resolve_chat(
        &self,
        user_id: &str,
        character: &Arc<CharacterConfig>,
    ) -> Result<Chat> {
        if let Some(chat) = self
            .store
            .find_chat_by_user_character(user_id, &character.id)
            .await?
        {
            return Ok(chat);
        }

        let now = now_ms();
        let chat_id = new_chat_id();
        let relationship =
            relationship_service::initial_relationship(user_id, character, &chat_id, now);

        let welcome = Message {
            id: new_message_id(),
            chat_id: chat_id.clone(),
            role: MessageRole::Assistant,
            dialogue: character.welcome.clone(),
            character_action: None,
            scene_description: None,
            emotional_state: Some(EmotionalState {
                affection: relationship.affection,
                mood: relationship.mood,
                relationship: relationship.stage,
                intimacy_level: relationship.intimacy,
            }),
            engine: Some(EngineKind::Safe),
            response_time_ms: None,
            nsfw_level: 1,
            is_regenerated: false,
            created_at: now,
        };
        let chat = Chat {
            id: chat_id,
            user_id: user_id.to_string(),
            character_id: character.id.clone(),
            title: format!("Chat with {}", character.name),
            status: ChatStatus::Active,
            message_count: 1,
            total_characters: welcome.dialogue.chars().count() as i64,
            last_message_at: Some(now),
            created_at: now,
            updated_at: now,
        };
        self.store
            .create_chat(&chat, &relationship, Some(&welcome))
            .await?;
        info!(chat_id = %chat.id, character_id = %character.id, "chat created");
        Ok(chat)
    }

    fn engine_for(&self, choice: &EngineChoice) -> Arc<dyn ChatEngine> {
        match choice.engine {
            EngineKind::Safe => Arc::clone(&self.safe_engine),
            EngineKind::Adult => Arc::clone(&self.adult_engine),
        }
    }

    fn character(&self, character_id: &str) -> Result<Arc<CharacterConfig>> {
        self.characters
            .get(character_id)
            .ok_or_else(|| CoreError::Validation(format!("unknown character {character_id}")))
    }

    async fn lock_pair(&self, user_id: &str, character_id: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let key = format!("{user_id}:{character_id}");
        let lock = {
            let mut locks = self.chat_locks.lock().await;
            Arc::clone(locks.entry(key).or_insert_with(|| Arc::new(Mutex::new(()))))
        };
        lock.lock_owned().await
    }
}

fn validate_message(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(CoreError::Validation("message is empty".to_string()));
    }
    let chars = text.chars().count();
    if chars > MAX_MESSAGE_CHARS {
        return Err(CoreError::Validation(format!(
            "message is {chars} characters, limit {MAX_MESSAGE_CHARS}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_at_limit_passes_and_over_fails() {
        let exactly = "a".repeat(MAX_MESSAGE_CHARS);
        assert!(validate_message(&exactly).is_ok());

        let over = "a".repeat(MAX_MESSAGE_CHARS + 1);
        let err = validate_message(&over).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn limit_counts_scalars_not_bytes() {
        let cjk = "好".repeat(MAX_MESSAGE_CHARS);
        assert!(cjk.len() > MAX_MESSAGE_CHARS);
        assert!(validate_message(&cjk).is_ok());
    }

    #[test]
    fn blank_message_is_rejected() {
        assert!(validate_message("   ").is_err());
    }
}
