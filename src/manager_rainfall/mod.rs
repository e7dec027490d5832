pub mod errors;
mod models;

use std::time::Duration;
use chrono::{Datelike, NaiveDate, TimeDelta, Utc};
use log::{debug, warn};
use reqwest::Client;
use crate::cache::{prune_cache_data, read_cache_data, store_cache_data};
use crate::initialization::RainfallConfig;
use crate::manager_rainfall::errors::RainfallError;
use crate::manager_rainfall::models::ArchiveResponse;
use crate::models::{Coordinates, RainfallOutcome};

const CACHE_PREFIX: &str = "rain";

/// Rainfall manager, resolves the annual rainfall for a coordinate pair
///
pub struct Rainfall {
    client: Client,
    base_url: String,
    fallback_mm: f64,
    cache_max_age: TimeDelta,
}

impl Rainfall {

    /// Returns a new instance of Rainfall
    ///
    /// # Arguments
    ///
    /// * 'config' - rainfall configuration
    pub fn new(config: &RainfallConfig) -> Result<Self, RainfallError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let cache_max_age = TimeDelta::try_hours(config.cache_hours)
            .filter(|age| *age >= TimeDelta::zero())
            .ok_or_else(|| RainfallError(format!("invalid cache_hours {}", config.cache_hours)))?;

        Ok(Self {
            client,
            base_url: config.base_url.to_string(),
            fallback_mm: config.fallback_mm,
            cache_max_age,
        })
    }

    /// Returns last calendar year's rainfall in mm for the given coordinates.
    ///
    /// Never fails, any problem talking to the archive yields the fallback value
    ///
    /// # Arguments
    ///
    /// * 'coordinates' - location to get rainfall for
    /// * 'cache_dir' - directory to store/fetch earlier results to/from
    pub async fn resolve(&self, coordinates: Coordinates, cache_dir: &str) -> RainfallOutcome {
        self.resolve_for(coordinates, Utc::now().date_naive(), cache_dir).await
    }

    async fn resolve_for(&self, coordinates: Coordinates, today: NaiveDate, cache_dir: &str) -> RainfallOutcome {
        match self.get_annual_rainfall(coordinates, today, cache_dir).await {
            Ok(mm) => RainfallOutcome::Resolved(mm),
            Err(e) => {
                warn!("rainfall lookup for {}, {} failed, using fallback {} mm: {}",
                    coordinates.lat, coordinates.lon, self.fallback_mm, e);
                RainfallOutcome::Fallback { mm: self.fallback_mm, reason: e.to_string() }
            }
        }
    }

    /// Fetches the daily precipitation of last year from the archive and sums it
    ///
    /// # Arguments
    ///
    /// * 'coordinates' - location to get rainfall for
    /// * 'today' - date the lookup is made, last year is relative to this
    /// * 'cache_dir' - directory to store/fetch earlier results to/from
    async fn get_annual_rainfall(&self, coordinates: Coordinates, today: NaiveDate, cache_dir: &str) -> Result<f64, RainfallError> {
        let (from, to) = last_full_year(today)?;
        let coordinates = request_coordinates(coordinates);
        let key = cache_key(coordinates, from, to);

        match read_cache_data::<f64>(cache_dir, CACHE_PREFIX, &key, self.cache_max_age).await {
            Ok(Some(mm)) => {
                debug!("rainfall cache hit for {}", key);
                return Ok(mm);
            }
            Ok(None) => (),
            Err(e) => warn!("unable to read rainfall cache for {}: {}", key, e),
        }

        let req = self.client.get(&self.base_url)
            .query(&archive_query(coordinates, from, to))
            .send().await?;

        let status = req.status();
        if !status.is_success() {
            return Err(RainfallError(format!("{:?}", status)));
        }

        let json = req.text().await?;
        let mm = sum_precipitation(&json)?;

        if let Err(e) = store_cache_data(cache_dir, CACHE_PREFIX, &key, &mm).await {
            warn!("unable to store rainfall cache for {}: {}", key, e);
        }
        match prune_cache_data(cache_dir, CACHE_PREFIX, self.cache_max_age).await {
            Ok(0) => (),
            Ok(removed) => debug!("pruned {} expired rainfall cache entries", removed),
            Err(e) => warn!("unable to prune rainfall cache: {}", e),
        }

        Ok(mm)
    }
}

/// Returns first and last day of the most recently completed calendar year
///
/// # Arguments
///
/// * 'today' - the reference date
pub fn last_full_year(today: NaiveDate) -> Result<(NaiveDate, NaiveDate), RainfallError> {
    let year = today.year() - 1;
    let from = NaiveDate::from_ymd_opt(year, 1, 1).ok_or("invalid start date")?;
    let to = NaiveDate::from_ymd_opt(year, 12, 31).ok_or("invalid end date")?;

    Ok((from, to))
}

/// Rounds coordinates to 4 decimals (about 11 m), the precision both the
/// cache key and the archive request use
fn request_coordinates(coordinates: Coordinates) -> Coordinates {
    Coordinates {
        lat: (coordinates.lat * 10000.0).round() / 10000.0,
        lon: (coordinates.lon * 10000.0).round() / 10000.0,
    }
}

fn cache_key(coordinates: Coordinates, from: NaiveDate, to: NaiveDate) -> String {
    format!("{:.4}_{:.4}_{}_{}", coordinates.lat, coordinates.lon, from, to)
}

fn archive_query(coordinates: Coordinates, from: NaiveDate, to: NaiveDate) -> Vec<(&'static str, String)> {
    vec![
        ("latitude", coordinates.lat.to_string()),
        ("longitude", coordinates.lon.to_string()),
        ("start_date", from.to_string()),
        ("end_date", to.to_string()),
        ("daily", "precipitation_sum".to_string()),
        ("timezone", "GMT".to_string()),
    ]
}

/// Sums an archive response's daily precipitation, rounded to whole mm.
/// Days without a value are skipped, a series without any value is an error
///
/// # Arguments
///
/// * 'json' - archive response body
fn sum_precipitation(json: &str) -> Result<f64, RainfallError> {
    let archive: ArchiveResponse = serde_json::from_str(json)?;

    let values = archive.daily.precipitation_sum
        .into_iter()
        .flatten()
        .collect::<Vec<f64>>();

    if values.is_empty() {
        return Err(RainfallError::from("no precipitation values in archive response"));
    }

    Ok(values.iter().sum::<f64>().round())
}
