//! Pure answer / clarify / fallback decision over one scorer result.

use std::cmp::Ordering;

use qna_service::ScoredAnswer;

/// Absorbs float noise when comparing scores with thresholds.
const SCORE_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Nothing reached the threshold.
    Fallback,
    /// One clear winner.
    Answer(ScoredAnswer),
    /// Two or more distinct answers within the ambiguity band, best first.
    Clarify(Vec<ScoredAnswer>),
}

/// Decides how to respond to `candidates`.
///
/// A candidate qualifies when it reaches `threshold` and lies within `band`
/// of the best score. Qualifying candidates with identical text count once.
/// At most `top` qualifying candidates are kept.
pub fn decide(candidates: &[ScoredAnswer], threshold: f32, band: f32, top: usize) -> Decision {
    let mut ranked: Vec<&ScoredAnswer> = candidates.iter().filter(|c| c.score.is_finite()).collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let Some(best) = ranked.first().map(|c| c.score) else {
        return Decision::Fallback;
    };
    if best + SCORE_EPSILON < threshold {
        return Decision::Fallback;
    }

    let mut qualifying: Vec<ScoredAnswer> = Vec::new();
    for candidate in ranked {
        if qualifying.len() == top.max(1) {
            break;
        }
        let in_band = best - candidate.score <= band + SCORE_EPSILON;
        let above = candidate.score + SCORE_EPSILON >= threshold;
        if !(in_band && above) {
            break;
        }
        if qualifying.iter().any(|q| q.text.trim() == candidate.text.trim()) {
            continue;
        }
        qualifying.push(candidate.clone());
    }

    match qualifying.len() {
        0 => Decision::Fallback,
        1 => Decision::Answer(qualifying.remove(0)),
        _ => Decision::Clarify(qualifying),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(text: &str, score: f32) -> ScoredAnswer {
        ScoredAnswer::new(text, score, "1")
    }

    #[test]
    fn empty_or_weak_results_fall_back() {
        assert_eq!(decide(&[], 0.3, 0.05, 3), Decision::Fallback);
        assert_eq!(decide(&[scored("a", 0.29)], 0.3, 0.05, 3), Decision::Fallback);
        assert_eq!(decide(&[scored("a", f32::NAN)], 0.3, 0.05, 3), Decision::Fallback);
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(decide(&[scored("a", 0.3)], 0.3, 0.05, 3), Decision::Answer(scored("a", 0.3)));
    }

    #[test]
    fn clear_winner_is_answered() {
        let set = [scored("9-5", 0.91), scored("other", 0.5)];
        assert_eq!(decide(&set, 0.3, 0.05, 3), Decision::Answer(scored("9-5", 0.91)));
    }

    #[test]
    fn close_scores_need_clarification() {
        let set = [scored("B", 0.59), scored("A", 0.61), scored("C", 0.2)];
        match decide(&set, 0.3, 0.05, 3) {
            Decision::Clarify(c) => {
                let texts: Vec<_> = c.iter().map(|a| a.text.as_str()).collect();
                assert_eq!(texts, vec!["A", "B"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn band_edge_counts_as_ambiguous() {
        let set = [scored("A", 0.65), scored("B", 0.60)];
        assert!(matches!(decide(&set, 0.3, 0.05, 3), Decision::Clarify(_)));
    }

    #[test]
    fn candidates_below_threshold_never_qualify() {
        let set = [scored("A", 0.32), scored("B", 0.29)];
        assert_eq!(decide(&set, 0.3, 0.05, 3), Decision::Answer(scored("A", 0.32)));
    }

    #[test]
    fn duplicate_texts_count_once() {
        let set = [scored("Same", 0.7), scored("Same", 0.69)];
        assert_eq!(decide(&set, 0.3, 0.05, 3), Decision::Answer(scored("Same", 0.7)));
    }

    #[test]
    fn clarification_is_capped_at_top() {
        let set = [scored("a", 0.7), scored("b", 0.7), scored("c", 0.7)];
        match decide(&set, 0.3, 0.05, 2) {
            Decision::Clarify(c) => assert_eq!(c.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }
}
