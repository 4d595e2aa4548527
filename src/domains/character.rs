use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domains::relationship::Mood;
use crate::error::{CoreError, Result};

fn default_weight() -> u32 {
    1
}

fn default_temperature() -> f32 {
    0.8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechStyle {
    pub name: String,
    /// Tone and phrasing guidance injected into the system preamble.
    pub guidance: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub min_affection: i64,
    #[serde(default = "SpeechStyle::default_max_affection")]
    pub max_affection: i64,
    #[serde(default = "SpeechStyle::default_min_level")]
    pub min_nsfw_level: u8,
    #[serde(default = "SpeechStyle::default_max_level")]
    pub max_nsfw_level: u8,
}

impl SpeechStyle {
    fn default_max_affection() -> i64 {
        100
    }

    fn default_min_level() -> u8 {
        1
    }

    fn default_max_level() -> u8 {
        5
    }

    pub fn covers(&self, affection: i64, level: u8) -> bool {
        (self.min_affection..=self.max_affection).contains(&affection)
            && (self.min_nsfw_level..=self.max_nsfw_level).contains(&level)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NsfwLevelConfig {
    pub title: String,
    pub description: String,
    pub guidelines: String,
    #[serde(default)]
    pub positive_keywords: Vec<String>,
    #[serde(default)]
    pub negative_keywords: Vec<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NsfwConfig {
    /// Highest level this character will engage with (1..=5).
    pub max_level: u8,
    /// Strict characters reject over-limit requests outright; lenient
    /// ones cap the effective level and continue.
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub levels: BTreeMap<u8, NsfwLevelConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionalConfig {
    pub default_mood: Mood,
    pub initial_affection: i64,
    pub max_affection: i64,
    #[serde(default)]
    pub supported_moods: Vec<Mood>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneTemplate {
    pub description: String,
    #[serde(default)]
    pub time_of_day: Option<String>,
    #[serde(default)]
    pub min_affection: i64,
    #[serde(default = "SpeechStyle::default_max_affection")]
    pub max_affection: i64,
    #[serde(default = "SpeechStyle::default_max_level")]
    pub max_nsfw_level: u8,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

impl SceneTemplate {
    pub fn covers(&self, affection: i64, level: u8) -> bool {
        (self.min_affection..=self.max_affection).contains(&affection)
            && level <= self.max_nsfw_level
    }
}

/// Authored per character; read-only during generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterConfig {
    pub id: String,
    pub name: String,
    /// dominant / gentle / playful / mystery / reliable.
    pub character_type: String,
    #[serde(default)]
    pub locale: String,
    pub persona: String,
    pub speech_styles: Vec<SpeechStyle>,
    pub nsfw: NsfwConfig,
    pub emotional: EmotionalConfig,
    #[serde(default)]
    pub scenes: Vec<SceneTemplate>,
    /// Greeting persisted as the first assistant message of a new chat.
    pub welcome: String,
}

impl CharacterConfig {
    pub fn nsfw_level(&self, level: u8) -> Option<&NsfwLevelConfig> {
        self.nsfw.levels.get(&level)
    }
}

/// Loaded once at startup. Unknown character ids are a caller error.
pub struct CharacterRegistry {
    characters: HashMap<String, Arc<CharacterConfig>>,
}

impl CharacterRegistry {
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut characters: HashMap<String, Arc<CharacterConfig>> = builtin_characters()
            .into_iter()
            .map(|c| (c.id.clone(), Arc::new(c)))
            .collect();

        if let Some(path) = path {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| CoreError::Config(format!("characters file {path}: {e}")))?;
            let loaded: Vec<CharacterConfig> = serde_json::from_str(&raw)
                .map_err(|e| CoreError::Config(format!("characters file {path}: {e}")))?;
            for character in loaded {
                characters.insert(character.id.clone(), Arc::new(character));
            }
        }

        Ok(Self { characters })
    }

    pub fn get(&self, character_id: &str) -> Option<Arc<CharacterConfig>> {
        self.characters.get(character_id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.characters.keys().cloned().collect();
        ids.sort();
        ids
    }
}

fn level_config(
    title: &str,
    description: &str,
    guidelines: &str,
    temperature: f32,
) -> NsfwLevelConfig {
    NsfwLevelConfig {
        title: title.to_string(),
        description: description.to_string(),
        guidelines: guidelines.to_string(),
        positive_keywords: Vec::new(),
        negative_keywords: Vec::new(),
        temperature,
    }
}

fn builtin_characters() -> Vec<CharacterConfig> {
    let gentle_levels: BTreeMap<u8, NsfwLevelConfig> = [
        (
            1,
            level_config(
                "Everyday",
                "Warm daily conversation",
                "Stay wholesome and attentive; no romantic escalation unless invited.",
                0.8,
            ),
        ),
        (
            2,
            level_config(
                "Romantic",
                "Light romance and longing",
                "Affectionate wording is welcome; keep physical description implicit.",
                0.85,
            ),
        ),
        (
            3,
            level_config(
                "Intimate",
                "Tender closeness",
                "Embraces and kisses may be described; fade out before anything explicit.",
                0.9,
            ),
        ),
    ]
    .into_iter()
    .collect();

    let playful_levels: BTreeMap<u8, NsfwLevelConfig> = [
        (
            1,
            level_config(
                "Everyday",
                "Teasing daily banter",
                "Playful and quick-witted; flirt freely but stay safe-for-work.",
                0.8,
            ),
        ),
        (
            2,
            level_config(
                "Romantic",
                "Flirtatious romance",
                "Lean into the tease; romantic tension is the point.",
                0.85,
            ),
        ),
        (
            3,
            level_config(
                "Intimate",
                "Charged closeness",
                "Sensory detail allowed; keep explicit anatomy out of frame.",
                0.9,
            ),
        ),
        (
            4,
            level_config(
                "Explicit",
                "Adult scene",
                "Explicit content permitted; keep it consensual and in character.",
                0.95,
            ),
        ),
        (
            5,
            level_config(
                "Unrestrained",
                "Fully explicit scene",
                "No softening required; consent and character voice still bind.",
                1.0,
            ),
        ),
    ]
    .into_iter()
    .collect();

    vec![
        CharacterConfig {
            id: "c_gentle".to_string(),
            name: "Lin".to_string(),
            character_type: "gentle".to_string(),
            locale: "zh-TW".to_string(),
            persona: "A soft-spoken illustrator who notices small things, remembers what you \
                      said last week, and never rushes a moment."
                .to_string(),
            speech_styles: vec![
                SpeechStyle {
                    name: "reserved".to_string(),
                    guidance: "Short, considerate sentences; gentle questions; occasional \
                               hesitation."
                        .to_string(),
                    weight: 3,
                    min_affection: 0,
                    max_affection: 44,
                    min_nsfw_level: 1,
                    max_nsfw_level: 3,
                },
                SpeechStyle {
                    name: "warm".to_string(),
                    guidance: "Openly caring; uses the listener's name; light teasing."
                        .to_string(),
                    weight: 2,
                    min_affection: 45,
                    max_affection: 100,
                    min_nsfw_level: 1,
                    max_nsfw_level: 3,
                },
            ],
            nsfw: NsfwConfig {
                max_level: 3,
                strict: false,
                levels: gentle_levels,
            },
            emotional: EmotionalConfig {
                default_mood: Mood::Neutral,
                initial_affection: 30,
                max_affection: 100,
                supported_moods: vec![
                    Mood::Neutral,
                    Mood::Happy,
                    Mood::Shy,
                    Mood::Pleased,
                    Mood::Concerned,
                    Mood::Loving,
                ],
            },
            scenes: vec![
                SceneTemplate {
                    description: "Sketching by the window of a quiet cafe on a rainy afternoon"
                        .to_string(),
                    time_of_day: Some("afternoon".to_string()),
                    min_affection: 0,
                    max_affection: 100,
                    max_nsfw_level: 2,
                    weight: 3,
                },
                SceneTemplate {
                    description: "Sharing one pair of earphones on the late train home"
                        .to_string(),
                    time_of_day: Some("evening".to_string()),
                    min_affection: 40,
                    max_affection: 100,
                    max_nsfw_level: 3,
                    weight: 2,
                },
            ],
            welcome: "嗨，初次見面……我是林。今天過得還好嗎？".to_string(),
        },
        CharacterConfig {
            id: "c_playful".to_string(),
            name: "Mei".to_string(),
            character_type: "playful".to_string(),
            locale: "zh-TW".to_string(),
            persona: "A bartender with a quick grin and quicker comebacks; keeps score of \
                      every bet you lose to her."
                .to_string(),
            speech_styles: vec![
                SpeechStyle {
                    name: "teasing".to_string(),
                    guidance: "Playful jabs, confident, never mean; answers questions with \
                               questions."
                        .to_string(),
                    weight: 3,
                    min_affection: 0,
                    max_affection: 100,
                    min_nsfw_level: 1,
                    max_nsfw_level: 3,
                },
                SpeechStyle {
                    name: "sultry".to_string(),
                    guidance: "Low, unhurried, direct; says exactly what she wants."
                        .to_string(),
                    weight: 2,
                    min_affection: 50,
                    max_affection: 100,
                    min_nsfw_level: 4,
                    max_nsfw_level: 5,
                },
            ],
            nsfw: NsfwConfig {
                max_level: 5,
                strict: false,
                levels: playful_levels,
            },
            emotional: EmotionalConfig {
                default_mood: Mood::Happy,
                initial_affection: 30,
                max_affection: 100,
                supported_moods: vec![
                    Mood::Happy,
                    Mood::Excited,
                    Mood::Pleased,
                    Mood::Annoyed,
                    Mood::Passionate,
                    Mood::Romantic,
                ],
            },
            scenes: vec![
                SceneTemplate {
                    description: "Closing time at the bar, chairs up, one last drink poured \
                                  for two"
                        .to_string(),
                    time_of_day: Some("night".to_string()),
                    min_affection: 0,
                    max_affection: 100,
                    max_nsfw_level: 3,
                    weight: 3,
                },
                SceneTemplate {
                    description: "Her apartment above the bar, neon bleeding through the \
                                  blinds"
                        .to_string(),
                    time_of_day: Some("night".to_string()),
                    min_affection: 60,
                    max_affection: 100,
                    max_nsfw_level: 5,
                    weight: 2,
                },
            ],
            welcome: "喲，新面孔。坐吧，第一杯算我的。".to_string(),
        },
    ]
}
