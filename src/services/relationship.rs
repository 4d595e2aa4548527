use tracing::debug;

use crate::domains::character::CharacterConfig;
use crate::domains::chat::Message;
use crate::domains::relationship::{
    HistoryEntry, Intimacy, Milestone, Mood, Relationship, Stage,
};
use crate::interfaces::engines::EmotionDelta;

/// Messages inspected for the recent level-4+ ratio.
const INTIMACY_WINDOW: usize = 20;
/// L4+ share of the window that bumps intimacy one step.
const INTIMACY_BUMP_RATIO: f64 = 0.3;
/// Points below a band's lower edge before a stage regresses.
const STAGE_HYSTERESIS: i64 = 5;
/// Affection values that mint a milestone when first crossed upward.
const AFFECTION_MILESTONES: &[i64] = &[20, 40, 60, 80, 100];
/// Trigger text is truncated to this many characters in history entries.
const TRIGGER_SNIPPET_CHARS: usize = 80;

#[derive(Debug, Clone)]
pub struct RelationshipUpdate {
    pub relationship: Relationship,
    pub milestones: Vec<Milestone>,
}

/// Applies one assistant turn to the relationship row. A missing or
/// malformed delta still counts the interaction; only the affection and
/// mood stay put.
pub fn apply_turn(
    current: &Relationship,
    character: &CharacterConfig,
    delta: Option<&EmotionDelta>,
    user_message: &str,
    recent_messages: &[Message],
    now: i64,
) -> RelationshipUpdate {
    let old_affection = current.affection;
    let old_mood = current.mood;

    let raw_delta = delta.map(|d| d.affection_delta).unwrap_or(0);
    let max_affection = character.emotional.max_affection.clamp(1, 100);
    let new_affection = (old_affection + raw_delta).clamp(0, max_affection);

    let new_stage = next_stage(current.stage, new_affection, current.intimacy);
    let new_intimacy = intimacy_for(new_stage, l4_ratio(recent_messages));

    let mut new_mood = delta
        .and_then(|d| d.mood.as_deref())
        .and_then(Mood::from_wire)
        .unwrap_or(old_mood);
    if new_stage > current.stage && raw_delta > 0 && new_mood == old_mood {
        // Stage advanced without an explicit mood from the provider.
        if let Some(nudged) = positive_mood(character) {
            new_mood = nudged;
        }
    }

    let mut relationship = current.clone();
    relationship.affection = new_affection;
    relationship.mood = new_mood;
    relationship.stage = new_stage;
    relationship.intimacy = new_intimacy;
    relationship.total_interactions += 1;
    relationship.last_interaction = Some(now);
    relationship.updated_at = now;

    relationship.emotion_data.push_history(HistoryEntry {
        trigger_type: "message".to_string(),
        trigger_content: truncate_chars(user_message, TRIGGER_SNIPPET_CHARS),
        old_affection,
        new_affection,
        old_mood,
        new_mood,
        timestamp: now,
    });

    let milestones = collect_milestones(&mut relationship, old_affection, current.stage, now);
    if !milestones.is_empty() {
        debug!(
            chat_id = %relationship.chat_id,
            count = milestones.len(),
            "relationship milestones emitted"
        );
    }

    RelationshipUpdate {
        relationship,
        milestones,
    }
}

/// Stage transition with one-band advancement, gating, and 5-point
/// regression hysteresis.
fn next_stage(current: Stage, affection: i64, intimacy: Intimacy) -> Stage {
    let target = Stage::from_affection(affection);
    if target > current {
        let candidate = current.next().unwrap_or(current);
        if advancement_permitted(candidate, intimacy) {
            return candidate;
        }
        return current;
    }
    if target < current && affection < current.min_affection() - STAGE_HYSTERESIS {
        return target;
    }
    current
}

/// Romantic stages need some established intimacy before they unlock:
/// romantic_interest and lover require at least familiar, soulmate at
/// least intimate.
fn advancement_permitted(candidate: Stage, intimacy: Intimacy) -> bool {
    match candidate {
        Stage::RomanticInterest | Stage::Lover => intimacy >= Intimacy::Familiar,
        Stage::Soulmate => intimacy >= Intimacy::Intimate,
        _ => true,
    }
}

/// Intimacy table: the stage sets a base band, and a recent level-4+
/// ratio of 0.3 or more bumps it one step.
///
/// | stage              | base            |
/// |--------------------|-----------------|
/// | stranger           | distant         |
/// | acquaintance       | distant         |
/// | friend             | casual          |
/// | close_friend       | familiar        |
/// | romantic_interest  | close           |
/// | lover              | intimate        |
/// | soulmate           | deeply_intimate |
fn intimacy_for(stage: Stage, l4_ratio: f64) -> Intimacy {
    let base = match stage {
        Stage::Stranger | Stage::Acquaintance => Intimacy::Distant,
        Stage::Friend => Intimacy::Casual,
        Stage::CloseFriend => Intimacy::Familiar,
        Stage::RomanticInterest => Intimacy::Close,
        Stage::Lover => Intimacy::Intimate,
        Stage::Soulmate => Intimacy::DeeplyIntimate,
    };
    if l4_ratio >= INTIMACY_BUMP_RATIO {
        base.step_up()
    } else {
        base
    }
}

fn l4_ratio(recent_messages: &[Message]) -> f64 {
    let window: Vec<&Message> = recent_messages.iter().take(INTIMACY_WINDOW).collect();
    if window.is_empty() {
        return 0.0;
    }
    let hot = window.iter().filter(|m| m.nsfw_level >= 4).count();
    hot as f64 / window.len() as f64
}

fn positive_mood(character: &CharacterConfig) -> Option<Mood> {
    const PREFERRED: &[Mood] = &[Mood::Happy, Mood::Pleased, Mood::Excited, Mood::Loving];
    PREFERRED
        .iter()
        .copied()
        .find(|m| character.emotional.supported_moods.contains(m))
}

fn collect_milestones(
    relationship: &mut Relationship,
    old_affection: i64,
    old_stage: Stage,
    now: i64,
) -> Vec<Milestone> {
    let mut milestones = Vec::new();

    if relationship.stage > old_stage {
        let stage_type = format!("stage_{}", relationship.stage.as_str());
        if !relationship.emotion_data.awarded.contains(&stage_type) {
            relationship.emotion_data.awarded.push(stage_type.clone());
            milestones.push(Milestone {
                milestone_type: stage_type,
                description: format!("Relationship reached {}", relationship.stage.as_str()),
                affection: relationship.affection,
                occurred_at: now,
            });
        }
    }

    for threshold in AFFECTION_MILESTONES {
        if old_affection < *threshold && relationship.affection >= *threshold {
            let affection_type = format!("affection_{threshold}");
            if relationship.emotion_data.awarded.contains(&affection_type) {
                continue;
            }
            relationship.emotion_data.awarded.push(affection_type.clone());
            milestones.push(Milestone {
                milestone_type: affection_type,
                description: format!("Affection reached {threshold}"),
                affection: relationship.affection,
                occurred_at: now,
            });
        }
    }

    milestones
}

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    text.chars().take(limit).collect()
}

/// Fresh relationship row for a newly created chat, seeded from the
/// character's emotional config.
pub fn initial_relationship(
    user_id: &str,
    character: &CharacterConfig,
    chat_id: &str,
    now: i64,
) -> Relationship {
    let affection = character.emotional.initial_affection.clamp(0, 100);
    // New relationships always open at stranger/distant; the stage then
    // catches up to the affection band one step per turn.
    Relationship {
        id: crate::domains::relationship::new_relationship_id(),
        user_id: user_id.to_string(),
        character_id: character.id.clone(),
        chat_id: chat_id.to_string(),
        affection,
        mood: character.emotional.default_mood,
        stage: Stage::Stranger,
        intimacy: Intimacy::Distant,
        total_interactions: 0,
        emotion_data: Default::default(),
        last_interaction: None,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::character::CharacterRegistry;
    use crate::domains::relationship::HISTORY_LIMIT;
    use std::sync::Arc;

    fn character() -> Arc<CharacterConfig> {
        CharacterRegistry::load(None).unwrap().get("c_gentle").unwrap()
    }

    fn base_relationship(affection: i64) -> Relationship {
        let mut rel = initial_relationship("u1", &character(), "chat_1", 1_000);
        rel.affection = affection;
        rel.stage = Stage::from_affection(affection);
        rel.intimacy = intimacy_for(rel.stage, 0.0);
        rel
    }

    fn delta(value: i64) -> EmotionDelta {
        EmotionDelta {
            affection_delta: value,
            mood: None,
        }
    }

    #[test]
    fn new_relationship_opens_at_stranger() {
        let rel = initial_relationship("u1", &character(), "chat_1", 1_000);
        assert_eq!(rel.affection, 30);
        assert_eq!(rel.stage, Stage::Stranger);
        assert_eq!(rel.intimacy, Intimacy::Distant);
        assert_eq!(rel.total_interactions, 0);
    }

    #[test]
    fn stage_catches_up_one_band_per_turn_from_seed() {
        let mut rel = initial_relationship("u1", &character(), "chat_1", 1_000);
        let first = apply_turn(&rel, &character(), Some(&delta(0)), "hi", &[], 2_000);
        assert_eq!(first.relationship.stage, Stage::Acquaintance);
        rel = first.relationship;
        let second = apply_turn(&rel, &character(), Some(&delta(0)), "hi", &[], 3_000);
        assert_eq!(second.relationship.stage, Stage::Friend);
    }

    #[test]
    fn crossing_into_friend_emits_stage_milestone() {
        let rel = base_relationship(24);
        let update = apply_turn(&rel, &character(), Some(&delta(2)), "hey", &[], 2_000);
        assert_eq!(update.relationship.affection, 26);
        assert_eq!(update.relationship.stage, Stage::Friend);
        assert!(update
            .milestones
            .iter()
            .any(|m| m.milestone_type == "stage_friend" && m.affection == 26));
    }

    #[test]
    fn huge_delta_clamps_without_error() {
        let rel = base_relationship(30);
        let update = apply_turn(&rel, &character(), Some(&delta(999)), "x", &[], 2_000);
        assert_eq!(update.relationship.affection, 100);
    }

    #[test]
    fn negative_delta_clamps_at_zero() {
        let rel = base_relationship(3);
        let update = apply_turn(&rel, &character(), Some(&delta(-50)), "x", &[], 2_000);
        assert_eq!(update.relationship.affection, 0);
    }

    #[test]
    fn missing_delta_still_counts_interaction() {
        let rel = base_relationship(30);
        let update = apply_turn(&rel, &character(), None, "x", &[], 2_000);
        assert_eq!(update.relationship.affection, 30);
        assert_eq!(update.relationship.mood, rel.mood);
        assert_eq!(update.relationship.total_interactions, 1);
        assert_eq!(update.relationship.last_interaction, Some(2_000));
        assert_eq!(update.relationship.emotion_data.history.len(), 1);
    }

    #[test]
    fn regression_waits_for_hysteresis() {
        // Friend band starts at 25; 22 is within the 5-point slack.
        let mut rel = base_relationship(25);
        let after = apply_turn(&rel, &character(), Some(&delta(-3)), "x", &[], 2_000);
        assert_eq!(after.relationship.stage, Stage::Friend);

        rel.affection = 25;
        let dropped = apply_turn(&rel, &character(), Some(&delta(-7)), "x", &[], 2_000);
        assert_eq!(dropped.relationship.affection, 18);
        assert_eq!(dropped.relationship.stage, Stage::Acquaintance);
    }

    #[test]
    fn stage_advances_one_band_per_turn() {
        let rel = base_relationship(24);
        let update = apply_turn(&rel, &character(), Some(&delta(40)), "x", &[], 2_000);
        assert_eq!(update.relationship.affection, 64);
        // Acquaintance -> friend only; romantic bands stay gated.
        assert_eq!(update.relationship.stage, Stage::Friend);
    }

    #[test]
    fn milestone_not_reemitted_after_regression() {
        let rel = base_relationship(24);
        let first = apply_turn(&rel, &character(), Some(&delta(2)), "x", &[], 2_000);
        let back = apply_turn(
            &first.relationship,
            &character(),
            Some(&delta(-10)),
            "x",
            &[],
            3_000,
        );
        assert_eq!(back.relationship.stage, Stage::Acquaintance);
        let again = apply_turn(
            &back.relationship,
            &character(),
            Some(&delta(12)),
            "x",
            &[],
            4_000,
        );
        assert_eq!(again.relationship.stage, Stage::Friend);
        assert!(again.milestones.iter().all(|m| m.milestone_type != "stage_friend"));
    }

    #[test]
    fn history_never_exceeds_fifty() {
        let mut rel = base_relationship(30);
        for i in 0..60 {
            let update = apply_turn(&rel, &character(), None, "m", &[], 2_000 + i);
            rel = update.relationship;
        }
        assert_eq!(rel.emotion_data.history.len(), HISTORY_LIMIT);
    }

    #[test]
    fn wire_mood_is_applied() {
        let rel = base_relationship(30);
        let delta = EmotionDelta {
            affection_delta: 1,
            mood: Some("Happy".to_string()),
        };
        let update = apply_turn(&rel, &character(), Some(&delta), "x", &[], 2_000);
        assert_eq!(update.relationship.mood, Mood::Happy);
    }

    #[test]
    fn hot_window_bumps_intimacy() {
        assert_eq!(intimacy_for(Stage::Friend, 0.0), Intimacy::Casual);
        assert_eq!(intimacy_for(Stage::Friend, 0.4), Intimacy::Familiar);
        assert_eq!(
            intimacy_for(Stage::Soulmate, 0.9),
            Intimacy::DeeplyIntimate
        );
    }

    #[test]
    fn trigger_content_is_truncated() {
        let rel = base_relationship(30);
        let long = "好".repeat(200);
        let update = apply_turn(&rel, &character(), None, &long, &[], 2_000);
        let entry = update.relationship.emotion_data.history.last().unwrap();
        assert_eq!(entry.trigger_content.chars().count(), 80);
    }
}
