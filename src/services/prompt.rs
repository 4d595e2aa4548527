use rand::{Rng, RngExt};

use crate::domains::character::{CharacterConfig, SceneTemplate, SpeechStyle};
use crate::domains::chat::{EngineKind, Message, MessageRole};
use crate::domains::memory::LongTermMemory;
use crate::domains::relationship::Relationship;

/// Messages of history included in the prompt, most recent last.
pub const HISTORY_WINDOW: usize = 10;

const DEFAULT_TEMPERATURE: f32 = 0.8;
const DEFAULT_MAX_TOKENS: u32 = 800;

pub struct PromptContext<'a> {
    pub character: &'a CharacterConfig,
    pub relationship: &'a Relationship,
    pub memory: &'a LongTermMemory,
    /// Oldest first; callers pass at most [`HISTORY_WINDOW`] entries.
    pub history: &'a [Message],
    /// Effective level after the character cap.
    pub level: u8,
    pub engine: EngineKind,
    pub user_message: &'a str,
}

#[derive(Debug, Clone)]
pub struct BuiltPrompt {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub engine: EngineKind,
}

/// Assembles the generation input in a fixed section order: identity and
/// speech style, NSFW guidance, emotional state, memory digest, scene
/// hint, then history and the new message on the user side.
pub fn build_prompt(ctx: &PromptContext<'_>) -> BuiltPrompt {
    build_prompt_with_rng(ctx, &mut rand::rng())
}

pub fn build_prompt_with_rng<R: Rng>(ctx: &PromptContext<'_>, rng: &mut R) -> BuiltPrompt {
    let character = ctx.character;
    let relationship = ctx.relationship;
    let mut system = String::new();

    system.push_str(&format!(
        "You are {} ({}), {}\n",
        character.name, character.character_type, character.persona
    ));
    if let Some(style) = pick_speech_style(character, relationship.affection, ctx.level) {
        system.push_str(&format!("Speech style ({}): {}\n", style.name, style.guidance));
    }

    match character.nsfw_level(ctx.level) {
        Some(level_cfg) => {
            system.push_str(&format!(
                "\nContent level {} — {}: {}\nGuidelines: {}\n",
                ctx.level, level_cfg.title, level_cfg.description, level_cfg.guidelines
            ));
            if !level_cfg.positive_keywords.is_empty() {
                system.push_str(&format!("Lean into: {}\n", level_cfg.positive_keywords.join(", ")));
            }
            if !level_cfg.negative_keywords.is_empty() {
                system.push_str(&format!("Avoid: {}\n", level_cfg.negative_keywords.join(", ")));
            }
        }
        None => {
            system.push_str(
                "\nThe requested content level is outside what this character engages \
                 with. Decline gently, in character, and steer the conversation back \
                 to safer ground.\n",
            );
        }
    }

    system.push_str(&format!(
        "\nCurrent state: affection {}/{} ({}), mood {}, intimacy {}.\n",
        relationship.affection,
        character.emotional.max_affection,
        relationship.stage.as_str(),
        relationship.mood.as_str(),
        relationship.intimacy.as_str()
    ));

    let digest = crate::services::memory::digest(ctx.memory);
    if !digest.is_empty() {
        system.push_str("\nWhat you remember about them:\n");
        system.push_str(&digest);
    }

    if let Some(scene) = pick_scene(character, relationship.affection, ctx.level, rng) {
        system.push_str(&format!("\nScene: {}", scene.description));
        if let Some(time) = &scene.time_of_day {
            system.push_str(&format!(" ({time})"));
        }
        system.push('\n');
    }

    system.push_str(
        "\nReply with a single JSON object: {\"dialogue\": string, \"action\": string?, \
         \"scene_description\": string?, \"emotion_delta\": {\"affection_delta\": int, \
         \"mood\": string?}}.\n",
    );

    let mut user = String::new();
    // The current message is already the newest persisted row; it renders
    // only as the trailing user line, never inside the history section.
    let history = match ctx.history.split_last() {
        Some((last, rest))
            if last.role == MessageRole::User && last.dialogue == ctx.user_message =>
        {
            rest
        }
        _ => ctx.history,
    };
    if !history.is_empty() {
        user.push_str("Recent conversation:\n");
        for message in history {
            let speaker = match message.role {
                MessageRole::User => "user",
                MessageRole::Assistant => character.name.as_str(),
            };
            user.push_str(&format!("{}: {}\n", speaker, message.dialogue));
        }
        user.push('\n');
    }
    user.push_str(&format!("user: {}", ctx.user_message));

    let temperature = character
        .nsfw_level(ctx.level)
        .map(|cfg| cfg.temperature)
        .unwrap_or(DEFAULT_TEMPERATURE);

    BuiltPrompt {
        system_prompt: system,
        user_prompt: user,
        temperature,
        max_tokens: DEFAULT_MAX_TOKENS,
        engine: ctx.engine,
    }
}

/// Highest-weight style whose affection and NSFW ranges both contain the
/// snapshot; first encountered wins a weight tie.
fn pick_speech_style(
    character: &CharacterConfig,
    affection: i64,
    level: u8,
) -> Option<&SpeechStyle> {
    let mut best: Option<&SpeechStyle> = None;
    for style in &character.speech_styles {
        if !style.covers(affection, level) {
            continue;
        }
        match best {
            Some(current) if current.weight >= style.weight => {}
            _ => best = Some(style),
        }
    }
    best
}

fn pick_scene<'a, R: Rng>(
    character: &'a CharacterConfig,
    affection: i64,
    level: u8,
    rng: &mut R,
) -> Option<&'a SceneTemplate> {
    let candidates: Vec<&SceneTemplate> = character
        .scenes
        .iter()
        .filter(|s| s.covers(affection, level))
        .collect();
    if candidates.is_empty() {
        return None;
    }

    let total: u32 = candidates.iter().map(|s| s.weight.max(1)).sum();
    let mut ticket = rng.random_range(0..total);
    for scene in &candidates {
        let weight = scene.weight.max(1);
        if ticket < weight {
            return Some(scene);
        }
        ticket -= weight;
    }
    candidates.last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::character::CharacterRegistry;
    use crate::domains::chat::now_ms;
    use crate::domains::relationship::{
        new_relationship_id, EmotionData, Intimacy, Mood, Stage,
    };
    struct FixedRng(u64);

    impl rand::TryRng for FixedRng {
        type Error = std::convert::Infallible;

        fn try_next_u32(&mut self) -> Result<u32, Self::Error> {
            Ok(self.0 as u32)
        }

        fn try_next_u64(&mut self) -> Result<u64, Self::Error> {
            Ok(self.0)
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Self::Error> {
            dest.fill(0);
            Ok(())
        }
    }

    fn relationship(affection: i64) -> Relationship {
        Relationship {
            id: new_relationship_id(),
            user_id: "u1".to_string(),
            character_id: "c_gentle".to_string(),
            chat_id: "chat_1".to_string(),
            affection,
            mood: Mood::Neutral,
            stage: Stage::from_affection(affection),
            intimacy: Intimacy::Casual,
            total_interactions: 3,
            emotion_data: EmotionData::default(),
            last_interaction: None,
            created_at: now_ms(),
            updated_at: now_ms(),
        }
    }

    #[test]
    fn sections_appear_in_order() {
        let registry = CharacterRegistry::load(None).unwrap();
        let lin = registry.get("c_gentle").unwrap();
        let rel = relationship(30);
        let memory = LongTermMemory::empty("u1", "c_gentle", now_ms());
        let ctx = PromptContext {
            character: &lin,
            relationship: &rel,
            memory: &memory,
            history: &[],
            level: 1,
            engine: EngineKind::Safe,
            user_message: "hello",
        };
        let mut rng = FixedRng(0);
        let built = build_prompt_with_rng(&ctx, &mut rng);

        let identity = built.system_prompt.find("You are Lin").unwrap();
        let style = built.system_prompt.find("Speech style").unwrap();
        let nsfw = built.system_prompt.find("Content level 1").unwrap();
        let state = built.system_prompt.find("Current state").unwrap();
        assert!(identity < style && style < nsfw && nsfw < state);
        assert!(built.user_prompt.ends_with("user: hello"));
        assert_eq!(built.engine, EngineKind::Safe);
        assert!((built.temperature - 0.8).abs() < 1e-6);
    }

    #[test]
    fn speech_style_respects_affection_band() {
        let registry = CharacterRegistry::load(None).unwrap();
        let lin = registry.get("c_gentle").unwrap();
        assert_eq!(pick_speech_style(&lin, 30, 1).unwrap().name, "reserved");
        assert_eq!(pick_speech_style(&lin, 80, 1).unwrap().name, "warm");
    }

    #[test]
    fn scene_filter_respects_level_cap() {
        let registry = CharacterRegistry::load(None).unwrap();
        let lin = registry.get("c_gentle").unwrap();
        let mut rng = FixedRng(0);
        // Level 3 excludes the rainy-cafe scene capped at level 2.
        let scene = pick_scene(&lin, 50, 3, &mut rng).unwrap();
        assert!(scene.description.contains("earphones"));
    }

    #[test]
    fn history_is_rendered_with_speaker_names() {
        let registry = CharacterRegistry::load(None).unwrap();
        let lin = registry.get("c_gentle").unwrap();
        let rel = relationship(30);
        let memory = LongTermMemory::empty("u1", "c_gentle", now_ms());
        let history = vec![crate::domains::chat::Message {
            id: "msg_1".to_string(),
            chat_id: "chat_1".to_string(),
            role: MessageRole::Assistant,
            dialogue: "welcome back".to_string(),
            character_action: None,
            scene_description: None,
            emotional_state: None,
            engine: Some(EngineKind::Safe),
            response_time_ms: Some(10),
            nsfw_level: 1,
            is_regenerated: false,
            created_at: now_ms(),
        }];
        let ctx = PromptContext {
            character: &lin,
            relationship: &rel,
            memory: &memory,
            history: &history,
            level: 1,
            engine: EngineKind::Safe,
            user_message: "hi again",
        };
        let mut rng = FixedRng(0);
        let built = build_prompt_with_rng(&ctx, &mut rng);
        assert!(built.user_prompt.contains("Lin: welcome back"));
    }

    #[test]
    fn current_message_is_not_repeated_in_history() {
        let registry = CharacterRegistry::load(None).unwrap();
        let lin = registry.get("c_gentle").unwrap();
        let rel = relationship(30);
        let memory = LongTermMemory::empty("u1", "c_gentle", now_ms());
        let message = |id: &str, role, dialogue: &str| crate::domains::chat::Message {
            id: id.to_string(),
            chat_id: "chat_1".to_string(),
            role,
            dialogue: dialogue.to_string(),
            character_action: None,
            scene_description: None,
            emotional_state: None,
            engine: None,
            response_time_ms: None,
            nsfw_level: 1,
            is_regenerated: false,
            created_at: now_ms(),
        };
        // The newest row is the message being answered right now.
        let history = vec![
            message("msg_1", MessageRole::Assistant, "welcome back"),
            message("msg_2", MessageRole::User, "hi again"),
        ];
        let ctx = PromptContext {
            character: &lin,
            relationship: &rel,
            memory: &memory,
            history: &history,
            level: 1,
            engine: EngineKind::Safe,
            user_message: "hi again",
        };
        let mut rng = FixedRng(0);
        let built = build_prompt_with_rng(&ctx, &mut rng);
        assert_eq!(built.user_prompt.matches("hi again").count(), 1);
        assert!(built.user_prompt.ends_with("user: hi again"));
        assert!(built.user_prompt.contains("Lin: welcome back"));
    }
}
