use serde::Serialize;

/// Display tier derived from a fit score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    Excellent,
    Great,
    Good,
    Fair,
}

impl ScoreTier {
    /// Guidance line shown under the score.
    pub fn message(self) -> &'static str {
        match self {
            ScoreTier::Excellent => "Excellent match! Your profile aligns perfectly with this role.",
            ScoreTier::Great => "Great match! You have most of the required skills.",
            ScoreTier::Good => "Good match! Consider highlighting relevant experience.",
            ScoreTier::Fair => "Fair match. Focus on transferable skills and relevant experience.",
        }
    }
}

/// Maps any integer score to a tier. Total: out-of-range values fall into the outer tiers.
pub fn score_tier(score: i64) -> ScoreTier {
    if score >= 90 {
        ScoreTier::Excellent
    } else if score >= 80 {
        ScoreTier::Great
    } else if score >= 70 {
        ScoreTier::Good
    } else {
        ScoreTier::Fair
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_representative_scores() {
        assert_eq!(score_tier(95), ScoreTier::Excellent);
        assert_eq!(score_tier(85), ScoreTier::Great);
        assert_eq!(score_tier(75), ScoreTier::Good);
        assert_eq!(score_tier(65), ScoreTier::Fair);
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(score_tier(90), ScoreTier::Excellent);
        assert_eq!(score_tier(89), ScoreTier::Great);
        assert_eq!(score_tier(80), ScoreTier::Great);
        assert_eq!(score_tier(79), ScoreTier::Good);
        assert_eq!(score_tier(70), ScoreTier::Good);
        assert_eq!(score_tier(69), ScoreTier::Fair);
    }

    #[test]
    fn test_total_over_extremes() {
        assert_eq!(score_tier(i64::MAX), ScoreTier::Excellent);
        assert_eq!(score_tier(i64::MIN), ScoreTier::Fair);
        assert_eq!(score_tier(-1), ScoreTier::Fair);
        assert_eq!(score_tier(1_000), ScoreTier::Excellent);
    }

    #[test]
    fn test_labels_serialize_snake_case() {
        assert_eq!(serde_json::to_string(&ScoreTier::Great).unwrap(), r#""great""#);
        assert_eq!(serde_json::to_string(&ScoreTier::Fair).unwrap(), r#""fair""#);
        assert!(ScoreTier::Excellent.message().starts_with("Excellent match!"));
    }
}
