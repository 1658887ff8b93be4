//! Print producer records.

use serde::{Deserialize, Deserializer, Serialize};

use super::geo::{GeoPoint, LocationInput, RawCoordinate};
use super::id::ProducerId;

/// A print producer as far as matching is concerned.
///
/// The location is optional: records with missing or invalid coordinates are
/// kept in storage but never appear in proximity results. Distance is not a
/// field here; it only exists on query results.
///
/// Deserialization never fails on a malformed optional field. Unusable
/// values are dropped to `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub id: ProducerId,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_location")]
    pub location: Option<GeoPoint>,
    /// Free capacity, 0 to 100. `None` when the producer has not said.
    #[serde(default, deserialize_with = "clamped_percent")]
    pub availability_percent: Option<u8>,
    /// Average review score, 0 to 5.
    #[serde(default, deserialize_with = "clamped_rating")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl Producer {
    /// Highest representable rating.
    pub const MAX_RATING: f64 = 5.0;

    /// Create a producer with no ratings and unknown availability.
    #[must_use]
    pub fn new(id: ProducerId, name: impl Into<String>, location: Option<GeoPoint>) -> Self {
        Self {
            id,
            name: name.into(),
            location,
            availability_percent: None,
            rating: None,
            review_count: 0,
            capabilities: Vec::new(),
        }
    }

    /// Set availability, clamped to 100.
    #[must_use]
    pub fn with_availability(mut self, percent: u8) -> Self {
        self.availability_percent = Some(percent.min(100));
        self
    }

    /// Set rating and review count; the rating is clamped to `[0, 5]`.
    #[must_use]
    pub fn with_rating(mut self, rating: f64, review_count: u32) -> Self {
        self.rating = clamp_rating(rating);
        self.review_count = review_count;
        self
    }
}

pub(crate) fn clamp_rating(rating: f64) -> Option<f64> {
    rating
        .is_finite()
        .then(|| rating.clamp(0.0, Producer::MAX_RATING))
}

/// Round and clamp a percentage; non-finite input has no value.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_percent(value: f64) -> Option<u8> {
    value
        .is_finite()
        .then(|| value.round().clamp(0.0, 100.0) as u8)
}

fn lenient_location<'de, D>(deserializer: D) -> Result<Option<GeoPoint>, D::Error>
where
    D: Deserializer<'de>,
{
    let input: Option<LocationInput> = Option::deserialize(deserializer)?;
    Ok(input.and_then(|i| i.validate().ok()))
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawCoordinate> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|r| r.value()))
}

fn clamped_percent<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?.and_then(clamp_percent))
}

fn clamped_rating<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?.and_then(clamp_rating))
}
