use serde::{Deserialize, Serialize};

/// Entries kept in the embedded change-history ring.
pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Stranger,
    Acquaintance,
    Friend,
    CloseFriend,
    RomanticInterest,
    Lover,
    Soulmate,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Stranger => "stranger",
            Stage::Acquaintance => "acquaintance",
            Stage::Friend => "friend",
            Stage::CloseFriend => "close_friend",
            Stage::RomanticInterest => "romantic_interest",
            Stage::Lover => "lover",
            Stage::Soulmate => "soulmate",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "stranger" => Some(Stage::Stranger),
            "acquaintance" => Some(Stage::Acquaintance),
            "friend" => Some(Stage::Friend),
            "close_friend" => Some(Stage::CloseFriend),
            "romantic_interest" => Some(Stage::RomanticInterest),
            "lover" => Some(Stage::Lover),
            "soulmate" => Some(Stage::Soulmate),
            _ => None,
        }
    }

    /// Band the affection value falls into, ignoring hysteresis.
    pub fn from_affection(affection: i64) -> Self {
        match affection {
            i64::MIN..=9 => Stage::Stranger,
            10..=24 => Stage::Acquaintance,
            25..=44 => Stage::Friend,
            45..=59 => Stage::CloseFriend,
            60..=74 => Stage::RomanticInterest,
            75..=89 => Stage::Lover,
            _ => Stage::Soulmate,
        }
    }

    /// Lower edge of the band, used for regression hysteresis and for
    /// the `/affection` view.
    pub fn min_affection(&self) -> i64 {
        match self {
            Stage::Stranger => 0,
            Stage::Acquaintance => 10,
            Stage::Friend => 25,
            Stage::CloseFriend => 45,
            Stage::RomanticInterest => 60,
            Stage::Lover => 75,
            Stage::Soulmate => 90,
        }
    }

    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Stranger => Some(Stage::Acquaintance),
            Stage::Acquaintance => Some(Stage::Friend),
            Stage::Friend => Some(Stage::CloseFriend),
            Stage::CloseFriend => Some(Stage::RomanticInterest),
            Stage::RomanticInterest => Some(Stage::Lover),
            Stage::Lover => Some(Stage::Soulmate),
            Stage::Soulmate => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Neutral,
    Happy,
    Shy,
    Pleased,
    Excited,
    Concerned,
    Annoyed,
    Loving,
    Passionate,
    Romantic,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Neutral => "neutral",
            Mood::Happy => "happy",
            Mood::Shy => "shy",
            Mood::Pleased => "pleased",
            Mood::Excited => "excited",
            Mood::Concerned => "concerned",
            Mood::Annoyed => "annoyed",
            Mood::Loving => "loving",
            Mood::Passionate => "passionate",
            Mood::Romantic => "romantic",
        }
    }

    /// Lenient parse for moods coming off the LLM wire; unknown labels
    /// yield `None` and the caller keeps the current mood.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "neutral" => Some(Mood::Neutral),
            "happy" | "joyful" | "cheerful" => Some(Mood::Happy),
            "shy" | "bashful" => Some(Mood::Shy),
            "pleased" | "content" => Some(Mood::Pleased),
            "excited" => Some(Mood::Excited),
            "concerned" | "worried" => Some(Mood::Concerned),
            "annoyed" | "upset" => Some(Mood::Annoyed),
            "loving" | "affectionate" => Some(Mood::Loving),
            "passionate" => Some(Mood::Passionate),
            "romantic" => Some(Mood::Romantic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intimacy {
    Distant,
    Casual,
    Familiar,
    Close,
    Intimate,
    DeeplyIntimate,
}

impl Intimacy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intimacy::Distant => "distant",
            Intimacy::Casual => "casual",
            Intimacy::Familiar => "familiar",
            Intimacy::Close => "close",
            Intimacy::Intimate => "intimate",
            Intimacy::DeeplyIntimate => "deeply_intimate",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "distant" => Some(Intimacy::Distant),
            "casual" => Some(Intimacy::Casual),
            "familiar" => Some(Intimacy::Familiar),
            "close" => Some(Intimacy::Close),
            "intimate" => Some(Intimacy::Intimate),
            "deeply_intimate" => Some(Intimacy::DeeplyIntimate),
            _ => None,
        }
    }

    pub fn step_up(&self) -> Intimacy {
        match self {
            Intimacy::Distant => Intimacy::Casual,
            Intimacy::Casual => Intimacy::Familiar,
            Intimacy::Familiar => Intimacy::Close,
            Intimacy::Close => Intimacy::Intimate,
            Intimacy::Intimate | Intimacy::DeeplyIntimate => Intimacy::DeeplyIntimate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub trigger_type: String,
    pub trigger_content: String,
    pub old_affection: i64,
    pub new_affection: i64,
    pub old_mood: Mood,
    pub new_mood: Mood,
    pub timestamp: i64,
}

/// Persisted inside the `emotion_data` JSON column. `awarded` records
/// milestone types already emitted so a re-crossing after regression
/// does not emit twice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmotionData {
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub awarded: Vec<String>,
}

impl EmotionData {
    pub fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Relationship {
    pub id: String,
    pub user_id: String,
    pub character_id: String,
    pub chat_id: String,
    pub affection: i64,
    pub mood: Mood,
    pub stage: Stage,
    pub intimacy: Intimacy,
    pub total_interactions: i64,
    pub emotion_data: EmotionData,
    pub last_interaction: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A first-time upward threshold crossing, handed to the memory manager
/// for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    pub milestone_type: String,
    pub description: String,
    pub affection: i64,
    pub occurred_at: i64,
}

pub fn new_relationship_id() -> String {
    format!("rel_{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_bands_match_thresholds() {
        assert_eq!(Stage::from_affection(0), Stage::Stranger);
        assert_eq!(Stage::from_affection(9), Stage::Stranger);
        assert_eq!(Stage::from_affection(10), Stage::Acquaintance);
        assert_eq!(Stage::from_affection(24), Stage::Acquaintance);
        assert_eq!(Stage::from_affection(25), Stage::Friend);
        assert_eq!(Stage::from_affection(44), Stage::Friend);
        assert_eq!(Stage::from_affection(45), Stage::CloseFriend);
        assert_eq!(Stage::from_affection(60), Stage::RomanticInterest);
        assert_eq!(Stage::from_affection(75), Stage::Lover);
        assert_eq!(Stage::from_affection(90), Stage::Soulmate);
        assert_eq!(Stage::from_affection(100), Stage::Soulmate);
    }

    #[test]
    fn history_ring_trims_to_limit() {
        let mut data = EmotionData::default();
        for i in 0..60 {
            data.push_history(HistoryEntry {
                trigger_type: "message".to_string(),
                trigger_content: format!("m{i}"),
                old_affection: i,
                new_affection: i + 1,
                old_mood: Mood::Neutral,
                new_mood: Mood::Neutral,
                timestamp: i,
            });
        }
        assert_eq!(data.history.len(), HISTORY_LIMIT);
        assert_eq!(data.history.first().unwrap().trigger_content, "m10");
        assert_eq!(data.history.last().unwrap().trigger_content, "m59");
    }

    #[test]
    fn wire_moods_parse_leniently() {
        assert_eq!(Mood::from_wire(" Happy "), Some(Mood::Happy));
        assert_eq!(Mood::from_wire("affectionate"), Some(Mood::Loving));
        assert_eq!(Mood::from_wire("grumpy"), None);
    }
}
