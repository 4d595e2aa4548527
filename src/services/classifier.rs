use serde::Serialize;

use crate::services::keywords;

/// Classifier output for one message. `reason` is the comma-joined
/// matched keyword list, empty when nothing matched.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub level: u8,
    pub confidence: f64,
    pub matched_keywords: Vec<String>,
    pub reason: String,
}

/// Pure keyword classifier; holds no state and is safe to share across
/// tasks. Substring matching is deliberate: the corpus is largely CJK,
/// where whitespace tokenisation does not apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentClassifier;

impl ContentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, message: &str) -> Classification {
        let normalized = message.trim().to_lowercase();
        if normalized.is_empty() {
            return Classification {
                level: 1,
                confidence: base_confidence(1),
                matched_keywords: Vec::new(),
                reason: String::new(),
            };
        }

        let mut matched: Vec<String> = Vec::new();
        let mut level: u8 = 1;
        for (set, set_level) in keywords::leveled_sets() {
            for keyword in set {
                if normalized.contains(keyword) {
                    matched.push((*keyword).to_string());
                    if set_level > level {
                        level = set_level;
                    }
                }
            }
        }

        let confidence = if matched.is_empty() {
            base_confidence(1)
        } else {
            let extra = (matched.len() - 1) as f64 * 0.03;
            (base_confidence(level) + extra).min(0.99)
        };

        let reason = matched.join(", ");
        Classification {
            level,
            confidence,
            matched_keywords: matched,
            reason,
        }
    }
}

fn base_confidence(level: u8) -> f64 {
    match level {
        2 => 0.75,
        3 => 0.85,
        4 => 0.92,
        5 => 0.97,
        _ => 0.6,
    }
}
