use crate::domains::character::CharacterConfig;
use crate::domains::chat::EngineKind;
use crate::error::{CoreError, Result};
use crate::services::classifier::Classification;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineChoice {
    pub engine: EngineKind,
    /// Classifier level after the character cap; this is what the prompt
    /// builder and the persisted assistant message use. The raw level
    /// stays on the user message.
    pub effective_level: u8,
}

/// Levels 1-3 route to the safe engine, 4-5 to the adult one. A character
/// cap above the classified level either blocks (strict) or clamps.
pub fn select_engine(
    classification: &Classification,
    character: &CharacterConfig,
) -> Result<EngineChoice> {
    let max_level = character.nsfw.max_level.clamp(1, 5);
    let effective_level = if classification.level > max_level {
        if character.nsfw.strict {
            return Err(CoreError::ContentBlocked(format!(
                "character {} allows level {} at most, message classified {}",
                character.id, max_level, classification.level
            )));
        }
        max_level
    } else {
        classification.level
    };

    let engine = if effective_level >= 4 {
        EngineKind::Adult
    } else {
        EngineKind::Safe
    };

    Ok(EngineChoice {
        engine,
        effective_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::character::CharacterRegistry;
    use crate::services::classifier::ContentClassifier;

    fn classify(text: &str) -> Classification {
        ContentClassifier::new().classify(text)
    }

    #[test]
    fn low_levels_route_safe() {
        let registry = CharacterRegistry::load(None).unwrap();
        let mei = registry.get("c_playful").unwrap();
        let choice = select_engine(&classify("hello there"), &mei).unwrap();
        assert_eq!(choice.engine, EngineKind::Safe);
        assert_eq!(choice.effective_level, 1);
    }

    #[test]
    fn high_levels_route_adult() {
        let registry = CharacterRegistry::load(None).unwrap();
        let mei = registry.get("c_playful").unwrap();
        let choice = select_engine(&classify("wanna fuck"), &mei).unwrap();
        assert_eq!(choice.engine, EngineKind::Adult);
        assert_eq!(choice.effective_level, 4);
    }

    #[test]
    fn character_cap_clamps_and_reroutes() {
        let registry = CharacterRegistry::load(None).unwrap();
        let lin = registry.get("c_gentle").unwrap();
        let classification = classify("gangbang bondage");
        assert_eq!(classification.level, 5);
        let choice = select_engine(&classification, &lin).unwrap();
        assert_eq!(choice.effective_level, 3);
        assert_eq!(choice.engine, EngineKind::Safe);
    }

    #[test]
    fn strict_character_blocks_over_limit() {
        let registry = CharacterRegistry::load(None).unwrap();
        let mut lin = (*registry.get("c_gentle").unwrap()).clone();
        lin.nsfw.strict = true;
        let err = select_engine(&classify("gangbang"), &lin).unwrap_err();
        assert_eq!(err.code(), "CONTENT_BLOCKED");
    }
}
