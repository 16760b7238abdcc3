//! Bulk geocoding in rate-limited batches.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt as _};
use streetcar_delay_source::progress::ProgressCallback;
use streetcar_delay_transit_models::GeoPoint;
use tokio::time::Instant;

use crate::Geocoder;
use crate::address::is_geocodable;
use crate::service_registry::BatchOptions;

/// Geocodes every distinct description.
///
/// Descriptions are processed in batches of `options.batch_size` with up
/// to `options.concurrency` requests in flight. Every batch except the
/// last takes at least `options.cooldown()`, sleeping out the remainder
/// if it finished early. Failures are logged and recorded as `None`, so
/// every input description is a key of the result.
pub async fn geocode_all<G, I, S>(
    geocoder: &G,
    descriptions: I,
    options: &BatchOptions,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> BTreeMap<String, Option<GeoPoint>>
where
    G: Geocoder + ?Sized,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let unique: Vec<String> = descriptions
        .into_iter()
        .map(Into::into)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut results = BTreeMap::new();
    let (queries, skipped): (Vec<String>, Vec<String>) =
        unique.into_iter().partition(|d| is_geocodable(d));
    for description in skipped {
        results.insert(description, None);
    }

    if let Some(p) = &progress {
        p.set_total(queries.len() as u64);
    }

    let batch_size = options.batch_size.max(1);
    let concurrency = options.concurrency.max(1);
    let batch_count = queries.len().div_ceil(batch_size);
    log::info!(
        "Geocoding {} descriptions in {batch_count} batches of up to {batch_size} \
         (concurrency={concurrency})",
        queries.len()
    );

    for (batch_index, batch) in queries.chunks(batch_size).enumerate() {
        let started = Instant::now();

        let batch_results: Vec<_> = stream::iter(batch.iter().map(|description| async move {
            (description, geocoder.geocode(description).await)
        }))
        .buffer_unordered(concurrency)
        .collect()
        .await;

        let mut resolved = 0usize;
        for (description, result) in batch_results {
            let point = match result {
                Ok(Some(point)) => {
                    resolved += 1;
                    Some(point)
                }
                Ok(None) => {
                    log::debug!("No match for '{description}'");
                    None
                }
                Err(e) => {
                    log::warn!("Geocoding failed for '{description}': {e}");
                    None
                }
            };
            results.insert(description.clone(), point);
        }

        if let Some(p) = &progress {
            p.inc(batch.len() as u64);
        }
        log::info!(
            "Batch {}/{batch_count}: {resolved}/{} resolved",
            batch_index + 1,
            batch.len()
        );

        let is_last = batch_index + 1 == batch_count;
        let elapsed = started.elapsed();
        let cooldown = options.cooldown();
        if !is_last && elapsed < cooldown {
            let wait = cooldown - elapsed;
            log::debug!("Cooling down for {wait:?}");
            tokio::time::sleep(wait).await;
        }
    }

    if let Some(p) = &progress {
        let resolved = results.values().filter(|point| point.is_some()).count();
        p.finish(format!("{resolved}/{} geocoded", results.len()));
    }

    results
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::GeocodeError;

    #[derive(Default)]
    struct FakeGeocoder {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Geocoder for FakeGeocoder {
        async fn geocode(&self, description: &str) -> Result<Option<GeoPoint>, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if description.starts_with("fail") {
                return Err(GeocodeError::RateLimited);
            }
            if description.starts_with("lake") {
                return Ok(None);
            }
            #[allow(clippy::cast_precision_loss)]
            let offset = description.len() as f64 * 1e-4;
            Ok(Some(GeoPoint::from_lat_lng(43.6 + offset, -79.4)))
        }
    }

    fn options(batch_size: usize, cooldown_secs: u64) -> BatchOptions {
        BatchOptions {
            batch_size,
            cooldown_secs,
            concurrency: 8,
        }
    }

    #[tokio::test]
    async fn every_description_is_in_the_result() {
        let geocoder = FakeGeocoder::default();
        let descriptions: Vec<String> = (0..567).map(|i| format!("Stop {i}")).collect();

        let results = geocode_all(&geocoder, descriptions.clone(), &options(31, 0), None).await;

        assert_eq!(results.len(), 567);
        assert!(descriptions.iter().all(|d| results[d].is_some()));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 567);
    }

    #[tokio::test]
    async fn deduplicates_and_records_failures() {
        let geocoder = FakeGeocoder::default();
        let descriptions = [
            "Queen and Bathurst",
            "Queen and Bathurst",
            "fail here",
            "lake ontario",
            "unknown",
        ];

        let results = geocode_all(&geocoder, descriptions, &options(2, 0), None).await;

        assert_eq!(results.len(), 4);
        assert!(results["Queen and Bathurst"].is_some());
        assert_eq!(results["fail here"], None);
        assert_eq!(results["lake ontario"], None);
        assert_eq!(results["unknown"], None);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_input_is_empty_output() {
        let geocoder = FakeGeocoder::default();
        let results = geocode_all(&geocoder, Vec::<String>::new(), &options(10, 30), None).await;
        assert!(results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn every_batch_but_the_last_lasts_the_cooldown() {
        let geocoder = FakeGeocoder::default();
        let started = Instant::now();

        let results =
            geocode_all(&geocoder, ["Queen St", "King St", "Dundas St"], &options(1, 30), None)
                .await;

        assert_eq!(results.len(), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(60), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(90), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn single_batch_does_not_cool_down() {
        let geocoder = FakeGeocoder::default();
        let started = Instant::now();
        let results = geocode_all(&geocoder, ["a", "b", "c"], &options(10, 30), None).await;
        assert_eq!(results.len(), 3);
        assert!(started.elapsed() < Duration::from_secs(30));
    }
}
