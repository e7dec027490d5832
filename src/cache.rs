use chrono::{DateTime, TimeDelta, Utc};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use tokio::fs::{create_dir_all, read_dir, read_to_string, remove_file, write};
use crate::serialize_timestamp;

#[derive(Serialize, Deserialize)]
struct CacheEntry<T> {
    #[serde(with = "serialize_timestamp")]
    stored_at: DateTime<Utc>,
    data: T,
}

/// Writes data to file together with the time it was stored
///
/// # Arguments
///
/// * 'cache_dir' - directory to store data in
/// * 'prefix' - prefix to identify source
/// * 'key' - key identifying the data within the source
/// * 'data' - data to store
pub async fn store_cache_data<T: Serialize>(cache_dir: &str, prefix: &str, key: &str, data: &T) -> Result<(), std::io::Error> {
    create_dir_all(cache_dir).await?;
    let path = format!("{}{}-{}.json", cache_dir, prefix, key);

    let entry = CacheEntry { stored_at: Utc::now(), data };
    let json = serde_json::to_string(&entry)?;
    write(path, json).await?;

    Ok(())
}

/// Tries to read data from file, entries older than max_age count as missing
///
/// # Arguments
///
/// * 'cache_dir' - directory to read data from
/// * 'prefix' - prefix to identify source
/// * 'key' - key identifying the data within the source
/// * 'max_age' - how long an entry stays valid
pub async fn read_cache_data<T: DeserializeOwned>(cache_dir: &str, prefix: &str, key: &str, max_age: TimeDelta) -> Result<Option<T>, std::io::Error> {
    let path = format!("{}{}-{}.json", cache_dir, prefix, key);

    if let Ok(json) = read_to_string(path).await {
        let entry: CacheEntry<T> = serde_json::from_str(&json)?;
        if Utc::now() - entry.stored_at > max_age {
            Ok(None)
        } else {
            Ok(Some(entry.data))
        }
    } else {
        Ok(None)
    }
}

/// Removes a source's entries older than max_age, unreadable entries go as well
///
/// Returns the number of files removed
///
/// # Arguments
///
/// * 'cache_dir' - directory holding the cache files
/// * 'prefix' - prefix to identify source, other sources are left alone
/// * 'max_age' - how long an entry stays valid
pub async fn prune_cache_data(cache_dir: &str, prefix: &str, max_age: TimeDelta) -> Result<usize, std::io::Error> {
    let start = format!("{}-", prefix);
    let mut entries = read_dir(cache_dir).await?;
    let mut removed: usize = 0;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.starts_with(&start) || !name.ends_with(".json") {
            continue;
        }

        let expired = match read_to_string(entry.path()).await {
            Ok(json) => match serde_json::from_str::<CacheEntry<IgnoredAny>>(&json) {
                Ok(stored) => Utc::now() - stored.stored_at > max_age,
                Err(_) => true,
            },
            Err(_) => false,
        };

        if expired {
            remove_file(entry.path()).await?;
            removed += 1;
        }
    }

    Ok(removed)
}
