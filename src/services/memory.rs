//! Long-term memory: digest rendering for the prompt builder and
//! consolidation of new items out of a finished turn. Extraction is
//! deliberately pattern-based; anything smarter belongs upstream in the
//! providers, not here.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domains::memory::{
    new_memory_item_id, Dislike, LongTermMemory, MemoryMilestone, Nickname, Preference,
};
use crate::domains::relationship::Milestone;

const DIGEST_PREFERENCES: usize = 10;
const DIGEST_MILESTONES: usize = 5;
const BASE_IMPORTANCE: i64 = 3;
const INTENSIFIED_IMPORTANCE: i64 = 7;
const BASE_SEVERITY: i64 = 2;
const INTENSIFIED_SEVERITY: i64 = 4;

static NICKNAME_EN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)call me ([A-Za-z][A-Za-z0-9_-]{0,19})").unwrap());
static NICKNAME_ZH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"叫我([^，。！？,.!?\s]{1,10})").unwrap());
static LIKE_EN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)i (?:really |absolutely |just )?(?:like|love|enjoy) ([^,.!?\n]{1,40})").unwrap());
static LIKE_ZH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"我(?:真的|非常|特別|特别|超級|超级|最)?(?:喜歡|喜欢|愛|爱)([^，。！？,.!?\s]{1,20})").unwrap());
static DISLIKE_EN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)i (?:really )?(?:hate|can't stand|don't like|dislike) ([^,.!?\n]{1,40})").unwrap());
static DISLIKE_ZH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"我(?:真的|非常|特別|特别|超級|超级|最)?(?:討厭|讨厌|不喜歡|不喜欢|受不了)([^，。！？,.!?\s]{1,20})").unwrap());
static AGE_EN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)i(?:'m| am) (\d{1,2}) years old").unwrap());
static AGE_ZH: Lazy<Regex> = Lazy::new(|| Regex::new(r"我(?:今年)?(\d{1,2})[歲岁]").unwrap());
static OCCUPATION_EN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)i work as (?:an? )?([^,.!?\n]{1,40})").unwrap());
static OCCUPATION_ZH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"我是一[名個个位]([^，。！？,.!?\s]{1,20})").unwrap());
static LOCATION_EN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)i live in ([^,.!?\n]{1,40})").unwrap());
static LOCATION_ZH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"我住在([^，。！？,.!?\s]{1,20})").unwrap());
static FAMILY_EN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)my (mother|father|mom|dad|sister|brother|wife|husband|son|daughter) ([^,.!?\n]{1,40})")
        .unwrap()
});
static FAMILY_ZH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"我的?(媽媽|妈妈|爸爸|姊姊|姐姐|妹妹|哥哥|弟弟|老婆|老公|兒子|儿子|女兒|女儿)([^，。！？,.!?\s]{1,20})")
        .unwrap()
});

static INTENSIFIERS: &[&str] = &[
    "really", "absolutely", "so much", "totally", "非常", "特別", "特别", "超級", "超级", "最",
    "真的",
];

/// Flat digest for the prompt: top preferences by importance, the most
/// recent milestones, every dislike, and personal info as key:value
/// lines. Empty memory renders as an empty string.
pub fn digest(memory: &LongTermMemory) -> String {
    let mut out = String::new();

    if let Some(nick) = memory.nicknames.iter().max_by_key(|n| n.frequency) {
        out.push_str(&format!("- They like to be called {}\n", nick.name));
    }

    if !memory.preferences.is_empty() {
        let mut prefs: Vec<&Preference> = memory.preferences.iter().collect();
        prefs.sort_by(|a, b| b.importance.cmp(&a.importance));
        for pref in prefs.into_iter().take(DIGEST_PREFERENCES) {
            out.push_str(&format!(
                "- Likes {} (importance {})\n",
                pref.content, pref.importance
            ));
        }
    }

    if !memory.dislikes.is_empty() {
        for dislike in &memory.dislikes {
            out.push_str(&format!(
                "- Dislikes {} (severity {})\n",
                dislike.topic, dislike.severity
            ));
        }
    }

    if !memory.milestones.is_empty() {
        let mut stones: Vec<&MemoryMilestone> = memory.milestones.iter().collect();
        stones.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        for stone in stones.into_iter().take(DIGEST_MILESTONES) {
            out.push_str(&format!("- Milestone: {}\n", stone.description));
        }
    }

    for (info_type, content) in &memory.personal_info {
        out.push_str(&format!("- {info_type}: {content}\n"));
    }

    out
}

/// Consolidates one finished turn into the aggregate. Each rule runs
/// independently; nothing here touches storage.
pub fn consolidate(
    memory: &mut LongTermMemory,
    user_message: &str,
    assistant_dialogue: &str,
    milestones: &[Milestone],
    now: i64,
) {
    extract_nicknames(memory, user_message, assistant_dialogue, now);
    extract_preferences(memory, user_message, now);
    extract_dislikes(memory, user_message, now);
    extract_personal_info(memory, user_message);
    append_milestones(memory, milestones);
    memory.updated_at = now;
}

fn has_intensifier(text: &str) -> bool {
    let lower = text.to_lowercase();
    INTENSIFIERS.iter().any(|i| lower.contains(i))
}

fn extract_nicknames(memory: &mut LongTermMemory, user_message: &str, assistant: &str, now: i64) {
    for regex in [&*NICKNAME_EN, &*NICKNAME_ZH] {
        for caps in regex.captures_iter(user_message) {
            let name = caps[1].trim().to_string();
            if name.is_empty() {
                continue;
            }
            match memory.nicknames.iter_mut().find(|n| n.name == name) {
                Some(existing) => {
                    existing.frequency += 1;
                    existing.last_used = now;
                }
                None => memory.nicknames.push(Nickname {
                    id: new_memory_item_id(),
                    name,
                    frequency: 1,
                    last_used: now,
                }),
            }
        }
    }

    // A vocative use by the character refreshes the stored nickname.
    for nick in &mut memory.nicknames {
        if assistant.contains(nick.name.as_str()) {
            nick.frequency += 1;
            nick.last_used = now;
        }
    }
}

fn extract_preferences(memory: &mut LongTermMemory, user_message: &str, now: i64) {
    let importance = if has_intensifier(user_message) {
        INTENSIFIED_IMPORTANCE
    } else {
        BASE_IMPORTANCE
    };
    for regex in [&*LIKE_EN, &*LIKE_ZH] {
        for caps in regex.captures_iter(user_message) {
            let content = caps[1].trim().to_string();
            if content.is_empty() {
                continue;
            }
            if let Some(existing) = memory.preferences.iter_mut().find(|p| p.content == content) {
                existing.importance = existing.importance.max(importance);
                continue;
            }
            memory.preferences.push(Preference {
                id: new_memory_item_id(),
                category: "general".to_string(),
                content,
                importance,
                evidence: user_message.chars().take(120).collect(),
                created_at: now,
            });
        }
    }
}

fn extract_dislikes(memory: &mut LongTermMemory, user_message: &str, now: i64) {
    let severity = if has_intensifier(user_message) {
        INTENSIFIED_SEVERITY
    } else {
        BASE_SEVERITY
    };
    for regex in [&*DISLIKE_EN, &*DISLIKE_ZH] {
        for caps in regex.captures_iter(user_message) {
            let topic = caps[1].trim().to_string();
            if topic.is_empty() {
                continue;
            }
            if let Some(existing) = memory.dislikes.iter_mut().find(|d| d.topic == topic) {
                existing.severity = existing.severity.max(severity);
                continue;
            }
            memory.dislikes.push(Dislike {
                id: new_memory_item_id(),
                topic,
                severity,
                evidence: user_message.chars().take(120).collect(),
                recorded_at: now,
            });
        }
    }
}

fn extract_personal_info(memory: &mut LongTermMemory, user_message: &str) {
    for (regex, info_type) in [
        (&*AGE_EN, "age"),
        (&*AGE_ZH, "age"),
        (&*OCCUPATION_EN, "occupation"),
        (&*OCCUPATION_ZH, "occupation"),
        (&*LOCATION_EN, "location"),
        (&*LOCATION_ZH, "location"),
    ] {
        if let Some(caps) = regex.captures(user_message) {
            memory
                .personal_info
                .insert(info_type.to_string(), caps[1].trim().to_string());
        }
    }

    for regex in [&*FAMILY_EN, &*FAMILY_ZH] {
        if let Some(caps) = regex.captures(user_message) {
            let line = format!("{} {}", caps[1].trim(), caps[2].trim());
            memory.personal_info.insert("family".to_string(), line);
        }
    }
}

fn append_milestones(memory: &mut LongTermMemory, milestones: &[Milestone]) {
    for milestone in milestones {
        let exists = memory
            .milestones
            .iter()
            .any(|m| m.milestone_type == milestone.milestone_type);
        if exists {
            continue;
        }
        memory.milestones.push(MemoryMilestone {
            id: new_memory_item_id(),
            milestone_type: milestone.milestone_type.clone(),
            description: milestone.description.clone(),
            affection: milestone.affection,
            occurred_at: milestone.occurred_at,
        });
    }
}
