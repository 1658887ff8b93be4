//! Producer persistence.
//!
//! Coordinates live in two nullable columns. A row missing either one loads
//! with no location; a row holding out-of-range values is corrupt.

use sqlx::FromRow;

use pressly_core::store::{Repository, StoreError};
use pressly_core::{GeoPoint, Producer, ProducerId};

use super::{PgStore, backend, non_negative};

#[derive(Debug, FromRow)]
struct ProducerRow {
    id: i64,
    name: String,
    lat: Option<f64>,
    lng: Option<f64>,
    availability_percent: Option<i16>,
    rating: Option<f64>,
    review_count: i32,
    capabilities: Vec<String>,
}

impl TryFrom<ProducerRow> for Producer {
    type Error = StoreError;

    fn try_from(row: ProducerRow) -> Result<Self, Self::Error> {
        let location = match (row.lat, row.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng).map_err(|e| {
                StoreError::DataCorruption(format!("producer {}: {e}", row.id))
            })?),
            _ => None,
        };

        let availability: Option<u8> = row
            .availability_percent
            .map(|percent| non_negative(percent, "availability_percent"))
            .transpose()?;
        let review_count: u32 = non_negative(row.review_count, "review_count")?;

        let mut producer = Self::new(ProducerId::new(row.id), row.name, location);
        if let Some(percent) = availability {
            producer = producer.with_availability(percent);
        }
        match row.rating {
            Some(rating) => producer = producer.with_rating(rating, review_count),
            None => producer.review_count = review_count,
        }
        producer.capabilities = row.capabilities;

        Ok(producer)
    }
}

const SELECT_PRODUCERS: &str = r"
    SELECT id, name, lat, lng, availability_percent, rating, review_count, capabilities
    FROM producers
";

impl PgStore {
    /// Delete every producer row.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the query fails.
    pub async fn clear_producers(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM producers")
            .execute(self.pool())
            .await
            .map_err(backend)?;
        Ok(result.rows_affected())
    }
}

impl Repository<Producer> for PgStore {
    async fn get(&self, id: ProducerId) -> Result<Option<Producer>, StoreError> {
        let row = sqlx::query_as::<_, ProducerRow>(&format!("{SELECT_PRODUCERS} WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(self.pool())
            .await
            .map_err(backend)?;

        row.map(Producer::try_from).transpose()
    }

    async fn put(&self, producer: Producer) -> Result<(), StoreError> {
        let review_count = i32::try_from(producer.review_count).unwrap_or(i32::MAX);

        sqlx::query(
            r"
            INSERT INTO producers
                (id, name, lat, lng, availability_percent, rating, review_count, capabilities)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                lat = EXCLUDED.lat,
                lng = EXCLUDED.lng,
                availability_percent = EXCLUDED.availability_percent,
                rating = EXCLUDED.rating,
                review_count = EXCLUDED.review_count,
                capabilities = EXCLUDED.capabilities,
                updated_at = NOW()
            ",
        )
        .bind(producer.id.as_i64())
        .bind(&producer.name)
        .bind(producer.location.map(|p| p.lat()))
        .bind(producer.location.map(|p| p.lng()))
        .bind(producer.availability_percent.map(i16::from))
        .bind(producer.rating)
        .bind(review_count)
        .bind(&producer.capabilities)
        .execute(self.pool())
        .await
        .map_err(backend)?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Producer>, StoreError> {
        let rows = sqlx::query_as::<_, ProducerRow>(&format!("{SELECT_PRODUCERS} ORDER BY id"))
            .fetch_all(self.pool())
            .await
            .map_err(backend)?;

        rows.into_iter().map(Producer::try_from).collect()
    }
}
