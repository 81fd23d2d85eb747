use crate::types::{EngagementCategory, MAX_SCORE};

/// Points awarded for one engagement of the given category
pub fn points_for(category: EngagementCategory) -> u8 {
    match category {
        EngagementCategory::InPerson => 15,
        EngagementCategory::VideoCall => 10,
        EngagementCategory::OnlineMessage => 5,
        EngagementCategory::Text => 3,
    }
}

/// Add points to a score, saturating at the ceiling
pub fn apply_points(score: u8, points: u8) -> u8 {
    score.saturating_add(points).min(MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_table() {
        assert_eq!(points_for(EngagementCategory::InPerson), 15);
        assert_eq!(points_for(EngagementCategory::VideoCall), 10);
        assert_eq!(points_for(EngagementCategory::OnlineMessage), 5);
        assert_eq!(points_for(EngagementCategory::Text), 3);
    }

    #[test]
    fn test_apply_points_saturates() {
        assert_eq!(apply_points(0, 15), 15);
        assert_eq!(apply_points(95, 15), 100);
        assert_eq!(apply_points(100, 3), 100);
        assert_eq!(apply_points(250, 15), 100);
    }

    #[test]
    fn test_accumulation_matches_clamped_sum() {
        let sequence = [
            EngagementCategory::Text,
            EngagementCategory::InPerson,
            EngagementCategory::VideoCall,
            EngagementCategory::OnlineMessage,
        ];

        for start in [0u8, 20, 60, 90, 100] {
            let mut score = start;
            let mut total = start as u32;
            for _ in 0..5 {
                for category in sequence {
                    let before = score;
                    score = apply_points(score, points_for(category));
                    total += points_for(category) as u32;
                    assert!(score >= before);
                    assert_eq!(score as u32, total.min(100));
                }
            }
        }
    }
}
