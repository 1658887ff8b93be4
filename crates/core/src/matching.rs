//! Weighted producer scoring.
//!
//! Each factor is normalized to `[0, 1]` and combined with [`MatchWeights`].
//! Missing data scores a neutral `0.5` so that incomplete profiles are neither
//! buried nor promoted.

use serde::{Deserialize, Serialize};

use crate::geo::{GeoMatchError, Located, in_radius, measure_km};
use crate::types::Producer;

/// Neutral score for a factor with no data behind it.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Producers this close score full proximity.
pub const FULL_PROXIMITY_KM: f64 = 5.0;

/// Producers this far away score zero proximity.
pub const ZERO_PROXIMITY_KM: f64 = 50.0;

/// Reviews needed before the rating is fully trusted.
const FULL_CONFIDENCE_REVIEWS: f64 = 30.0;

/// Relative weight of each factor. Normalized by their sum when scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchWeights {
    pub capabilities: f64,
    pub proximity: f64,
    pub quality: f64,
    pub availability: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            capabilities: 0.30,
            proximity: 0.20,
            quality: 0.20,
            availability: 0.15,
        }
    }
}

impl MatchWeights {
    fn total(&self) -> f64 {
        self.capabilities + self.proximity + self.quality + self.availability
    }
}

/// Per-factor scores behind a match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorScores {
    pub capabilities: f64,
    pub proximity: f64,
    pub quality: f64,
    pub availability: f64,
}

impl FactorScores {
    /// Weighted mean of the factors. Zero if all weights are zero.
    #[must_use]
    pub fn combine(&self, weights: &MatchWeights) -> f64 {
        let total = weights.total();
        if total <= 0.0 {
            return 0.0;
        }
        (self.capabilities * weights.capabilities
            + self.proximity * weights.proximity
            + self.quality * weights.quality
            + self.availability * weights.availability)
            / total
    }
}

/// Proximity factor: full inside 5 km, zero beyond 50 km, linear between.
#[must_use]
pub fn proximity_score(distance_km: f64) -> f64 {
    if distance_km.is_nan() {
        return NEUTRAL_SCORE;
    }
    if distance_km <= FULL_PROXIMITY_KM {
        1.0
    } else if distance_km >= ZERO_PROXIMITY_KM {
        0.0
    } else {
        1.0 - (distance_km - FULL_PROXIMITY_KM) / (ZERO_PROXIMITY_KM - FULL_PROXIMITY_KM)
    }
}

/// Quality factor from star rating, discounted toward neutral when there are
/// few reviews.
#[must_use]
pub fn quality_score(rating: Option<f64>, review_count: u32) -> f64 {
    let Some(rating) = rating.filter(|r| *r > 0.0) else {
        return NEUTRAL_SCORE;
    };

    let rating_score = ((rating - 1.0) / 4.0).clamp(0.0, 1.0);
    let confidence = (f64::from(review_count) / FULL_CONFIDENCE_REVIEWS).min(1.0);

    rating_score * 0.8 * confidence + NEUTRAL_SCORE * (1.0 - confidence)
}

/// Availability factor: free capacity as a fraction, neutral when unknown.
#[must_use]
pub fn availability_score(availability_percent: Option<u8>) -> f64 {
    availability_percent.map_or(NEUTRAL_SCORE, |percent| f64::from(percent.min(100)) / 100.0)
}

/// Capability factor: the fraction of `required` the producer offers.
///
/// A requirement is met when it and one of the producer's capabilities
/// contain each other, ignoring case. Nothing required scores `1.0`; a
/// producer that lists no capabilities scores neutral.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn capability_score(required: &[String], offered: &[String]) -> f64 {
    let required: Vec<String> = required
        .iter()
        .map(|r| r.trim().to_lowercase())
        .filter(|r| !r.is_empty())
        .collect();
    if required.is_empty() {
        return 1.0;
    }

    let offered: Vec<String> = offered
        .iter()
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();
    if offered.is_empty() {
        return NEUTRAL_SCORE;
    }

    let matched = required
        .iter()
        .filter(|req| {
            offered
                .iter()
                .any(|cap| cap.contains(req.as_str()) || req.contains(cap.as_str()))
        })
        .count();

    matched as f64 / required.len() as f64
}

/// Options for [`score_producers`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOptions {
    pub weights: MatchWeights,
    /// Capabilities the job needs, such as `"letterpress"` or `"binding"`.
    pub required_capabilities: Vec<String>,
    /// Drop matches scoring below this.
    pub min_score: f64,
    /// Drop producers farther than this, if set.
    pub max_distance_km: Option<f64>,
    pub limit: Option<usize>,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            weights: MatchWeights::default(),
            required_capabilities: Vec::new(),
            min_score: 0.0,
            max_distance_km: None,
            limit: None,
        }
    }
}

/// A scored producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerMatch {
    pub producer: Producer,
    pub distance_km: f64,
    pub score: f64,
    pub factors: FactorScores,
}

/// Score the given producers against an origin, best first.
///
/// Producers without a location are skipped. Equal scores keep input order.
///
/// # Errors
///
/// Returns [`GeoMatchError::InvalidOrigin`] if `origin` has no usable
/// coordinates.
pub fn score_producers<I>(
    origin: &impl Located,
    producers: I,
    options: &MatchOptions,
) -> Result<Vec<ProducerMatch>, GeoMatchError>
where
    I: IntoIterator<Item = Producer>,
{
    let origin = origin.location().ok_or(GeoMatchError::InvalidOrigin)?;

    let mut matches: Vec<ProducerMatch> = producers
        .into_iter()
        .filter_map(|producer| {
            let distance_km = measure_km(origin, producer.location?);
            if options
                .max_distance_km
                .is_some_and(|max| !in_radius(distance_km, max))
            {
                return None;
            }

            let factors = FactorScores {
                capabilities: capability_score(
                    &options.required_capabilities,
                    &producer.capabilities,
                ),
                proximity: proximity_score(distance_km),
                quality: quality_score(producer.rating, producer.review_count),
                availability: availability_score(producer.availability_percent),
            };
            let score = factors.combine(&options.weights);

            (score >= options.min_score).then_some(ProducerMatch {
                producer,
                distance_km,
                score,
                factors,
            })
        })
        .collect();

    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    if let Some(limit) = options.limit {
        matches.truncate(limit);
    }

    Ok(matches)
}
