//! Ranking policy: popularity, personalization, and the blend.

use ideadb_core::types::{Interaction, InteractionKind};
use serde::{Deserialize, Serialize};

pub use ideadb_core::types::popularity_score;

/// Blend weights. The similarity weight is derived as
/// `1 - popularity - personalization`; the auxiliary signals deliberately
/// under-weight the blend rather than being renormalized to sum to one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreWeights {
    pub popularity: f32,
    pub personalization: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self { popularity: 0.2, personalization: 0.05 }
    }
}

impl ScoreWeights {
    pub fn similarity(&self) -> f32 {
        (1.0 - self.popularity - self.personalization).max(0.0)
    }
}

/// `w_sim*sim + w_pop*pop + w_pers*pers`, non-decreasing in every signal.
pub fn blend(similarity: f32, popularity: f32, personalization: f32, weights: ScoreWeights) -> f32 {
    weights.similarity() * similarity
        + weights.popularity * popularity
        + weights.personalization * personalization
}

fn interaction_weight(kind: InteractionKind) -> f32 {
    match kind {
        InteractionKind::Like => 0.3,
        InteractionKind::Dislike => -0.3,
        InteractionKind::View => 0.1,
        InteractionKind::Share => 0.2,
    }
}

/// Weighted sum of `user_id`'s interactions with `item_id`, clamped to
/// [0,1]. A user with no history scores 0.
pub fn personalization_score(history: &[Interaction], user_id: &str, item_id: &str) -> f32 {
    let raw: f32 = history
        .iter()
        .filter(|i| i.user_id == user_id && i.item_id == item_id)
        .map(|i| interaction_weight(i.kind))
        .sum();
    raw.clamp(0.0, 1.0)
}
