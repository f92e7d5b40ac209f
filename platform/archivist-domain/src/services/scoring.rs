//! Pure scoring math for the Usefulness Scorer (C9). Kept free of I/O and
//! capability calls so every function here is exhaustively unit- and
//! property-testable.

/// Weights for the heuristic method; the caller is responsible for
/// ensuring they sum to 1 (§4.7), though clamping downstream makes a
/// mis-normalized config fail safe rather than panic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub engagement: f64,
    pub recency: f64,
    pub quality: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self { engagement: 0.5, recency: 0.3, quality: 0.2 }
    }
}

/// Monotone, bounded transform of likes/retweets/replies into `[0,1]`.
/// Retweets are weighted double likes and replies, matching the
/// total-engagement tie-break ordering required by §4.7.
pub fn engagement_score(like_count: u64, retweet_count: u64, reply_count: u64) -> f64 {
    let weighted = like_count as f64 + 2.0 * retweet_count as f64 + reply_count as f64;
    // log1p saturates slowly; divide by a constant chosen so a few
    // thousand weighted engagements approach 1.0 without ever reaching it.
    (weighted.ln_1p() / 10.0).min(1.0)
}

/// Monotone, bounded function of age: exponential decay toward 0.
pub fn recency_score(age_hours: f64, half_life_hours: f64) -> f64 {
    if age_hours <= 0.0 {
        return 1.0;
    }
    let half_life = half_life_hours.max(0.01);
    (-age_hours / half_life * std::f64::consts::LN_2).exp().clamp(0.0, 1.0)
}

/// Deterministic content-quality proxy in `[0,1]`: penalizes very short
/// (boilerplate-like) and excessively long text, rewards a mid-length
/// band.
pub fn quality_score(text: Option<&str>) -> f64 {
    let len = text.map(|t| t.trim().chars().count()).unwrap_or(0);
    match len {
        0..=5 => 0.05,
        6..=19 => 0.3 + (len as f64 - 5.0) / 14.0 * 0.3,
        20..=280 => 0.6 + ((280.0 - (len as f64 - 20.0).abs()) / 260.0).clamp(0.0, 1.0) * 0.4,
        _ => 0.5,
    }
    .clamp(0.0, 1.0)
}

/// `round(100 * (w_eng*engagement + w_rec*recency + w_q*quality))`,
/// clamped to `[0,100]`.
pub fn heuristic_score(engagement: f64, recency: f64, quality: f64, weights: &ScoringWeights) -> u8 {
    let raw = 100.0 * (weights.engagement * engagement + weights.recency * recency + weights.quality * quality);
    clamp_score(raw)
}

/// Clamps and rounds any real-valued score to an integer in `[0,100]`.
pub fn clamp_score(raw: f64) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}

/// Parses and clamps a language model's raw numeric response into
/// `[0,100]`. Returns `None` if the text contains no integer at all.
pub fn parse_and_clamp_lm_score(text: &str) -> Option<u8> {
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        let first_number: String = text
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        return first_number.parse::<i64>().ok().map(|n| clamp_score(n as f64));
    }
    digits.parse::<i64>().ok().map(|n| clamp_score(n as f64))
}

/// Blends a heuristic and an LM score by a configured mix weight
/// (`mix` = weight given to the LM score), clamped to `[0,100]`.
pub fn blend_scores(heuristic: u8, lm: u8, mix: f64) -> u8 {
    let mix = mix.clamp(0.0, 1.0);
    let raw = mix * lm as f64 + (1.0 - mix) * heuristic as f64;
    clamp_score(raw)
}
