//! The archived-record entity

use crate::core::detection::{ArchivedDetection, DetectionSnapshot, DetectionSummary};
use crate::core::ids::RecordId;
use crate::core::quality::QualityClass;
use crate::core::snapshot::RecordSnapshot;
use crate::core::temporal::Timestamp;
use crate::enrichment::EnrichmentContext;
use crate::error::{Error, Result};
use crate::geo::{GeoResolver, IntensityEstimator};
use crate::query::{compare_for_display, DisplayConfig, DisplayFilter};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, warn};

/// A finalized seismic event kept for display and analysis.
///
/// Seismic parameters are fixed at construction. The derived attributes
/// (`region`, `peak_intensity`) are filled in later and each is replaced as
/// a whole, so concurrent readers see either the old or the new value.
pub struct ArchivedRecord {
    id: RecordId,
    latitude: f64,
    longitude: f64,
    depth: f64,
    origin_time: Timestamp,
    magnitude: f64,
    quality_class: QualityClass,
    max_association_ratio: f64,
    detections: Vec<ArchivedDetection>,

    region: RwLock<Option<Arc<str>>>,
    /// `f64` bits
    peak_intensity: AtomicU64,
    intensity_written: AtomicBool,
    invalidated: AtomicBool,

    context: OnceLock<EnrichmentContext>,
}

impl ArchivedRecord {
    /// Archive a live detection summary and schedule its intensity enrichment.
    ///
    /// The contributing detections are copied here, once; the record never
    /// looks at the upstream cluster again.
    pub fn from_summary(summary: &DetectionSummary, context: EnrichmentContext) -> Result<Arc<Self>> {
        summary.validate()?;

        let (detections, max_association_ratio) = freeze_detections(summary.detections.as_deref());
        let record = Self {
            max_association_ratio,
            detections,
            ..Self::bare(
                summary.id,
                summary.latitude,
                summary.longitude,
                summary.depth,
                summary.magnitude,
                summary.origin_time,
                summary.quality_class.unwrap_or(QualityClass::WORST),
            )
        };

        Ok(Self::activate(record, context))
    }

    /// Minimal reconstruction without detection context; schedules enrichment.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: RecordId,
        latitude: f64,
        longitude: f64,
        depth: f64,
        magnitude: f64,
        origin_time: Timestamp,
        quality_class: QualityClass,
        context: EnrichmentContext,
    ) -> Arc<Self> {
        let record = Self::bare(id, latitude, longitude, depth, magnitude, origin_time, quality_class);
        Self::activate(record, context)
    }

    /// Rebuild a persisted record and bind it to the live collaborators.
    ///
    /// Persisted `region` and `peak_intensity` are trusted; nothing is
    /// scheduled until [`ArchivedRecord::request_enrichment`] is called.
    pub fn restore(snapshot: RecordSnapshot, context: EnrichmentContext) -> Arc<Self> {
        let record = Self::from_snapshot(snapshot);
        record.bind(context);
        Arc::new(record)
    }

    /// Rebuild a persisted record without binding it
    pub fn from_snapshot(snapshot: RecordSnapshot) -> Self {
        Self {
            max_association_ratio: snapshot.max_association_ratio,
            detections: snapshot.detections,
            region: RwLock::new(snapshot.region.map(Arc::<str>::from)),
            peak_intensity: AtomicU64::new(snapshot.peak_intensity.to_bits()),
            intensity_written: AtomicBool::new(snapshot.enriched),
            invalidated: AtomicBool::new(snapshot.invalidated),
            ..Self::bare(
                snapshot.id,
                snapshot.latitude,
                snapshot.longitude,
                snapshot.depth,
                snapshot.magnitude,
                snapshot.origin_time,
                snapshot.quality_class,
            )
        }
    }

    fn bare(
        id: RecordId,
        latitude: f64,
        longitude: f64,
        depth: f64,
        magnitude: f64,
        origin_time: Timestamp,
        quality_class: QualityClass,
    ) -> Self {
        Self {
            id,
            latitude,
            longitude,
            depth,
            origin_time,
            magnitude,
            quality_class,
            max_association_ratio: 0.0,
            detections: Vec::new(),
            region: RwLock::new(None),
            peak_intensity: AtomicU64::new(0f64.to_bits()),
            intensity_written: AtomicBool::new(false),
            invalidated: AtomicBool::new(false),
            context: OnceLock::new(),
        }
    }

    fn activate(record: Self, context: EnrichmentContext) -> Arc<Self> {
        record.bind(context);
        let record = Arc::new(record);
        record.schedule_intensity_enrichment();
        record
    }

    /// Bind the enrichment context. Returns `false` if one was already bound.
    pub fn bind(&self, context: EnrichmentContext) -> bool {
        let bound = self.context.set(context).is_ok();
        if !bound {
            debug!(record_id = %self.id, "Enrichment context already bound");
        }
        bound
    }

    /// Whether an enrichment context is bound
    pub fn is_bound(&self) -> bool {
        self.context.get().is_some()
    }

    fn bound_context(&self) -> Result<&EnrichmentContext> {
        self.context.get().ok_or(Error::Unbound(self.id))
    }

    fn schedule_intensity_enrichment(self: &Arc<Self>) {
        let result = self
            .bound_context()
            .and_then(|context| self.submit_enrichment(context));

        if let Err(e) = result {
            warn!(record_id = %self.id, error = %e, "Intensity enrichment not scheduled");
        }
    }

    /// Explicitly (re)trigger intensity enrichment, e.g. for a reloaded record
    /// whose persisted intensity was never computed. A record that is already
    /// enriched is left alone.
    pub fn request_enrichment(self: &Arc<Self>) -> Result<()> {
        let context = self.bound_context()?;
        if self.is_enriched() {
            debug!(record_id = %self.id, "Enrichment already complete");
            return Ok(());
        }
        self.submit_enrichment(context)
    }

    fn submit_enrichment(self: &Arc<Self>, context: &EnrichmentContext) -> Result<()> {
        let record = Arc::downgrade(self);
        let geo = Arc::clone(&context.geo);
        let intensity = Arc::clone(&context.intensity);

        context.queue.submit(move || match record.upgrade() {
            Some(record) => record.enrich_intensity(geo.as_ref(), intensity.as_ref()),
            None => debug!("Record dropped before enrichment ran"),
        })
    }

    fn enrich_intensity(&self, geo: &dyn GeoResolver, intensity: &dyn IntensityEstimator) {
        if self.is_enriched() {
            return;
        }

        let distance = match geo.resolve(self.latitude, self.longitude, self.depth) {
            Ok(resolution) => resolution.ocean_distance_km,
            Err(e) => {
                warn!(record_id = %self.id, error = %e, "Distance lookup failed, intensity left unset");
                return;
            }
        };

        let value = match intensity.estimate(self.magnitude, distance, self.depth) {
            Ok(value) if value.is_finite() => value,
            Ok(value) => {
                warn!(record_id = %self.id, value, "Estimator returned a non-finite intensity");
                return;
            }
            Err(e) => {
                warn!(record_id = %self.id, error = %e, "Intensity estimation failed");
                return;
            }
        };

        self.peak_intensity.store(value.to_bits(), Ordering::Release);
        self.intensity_written.store(true, Ordering::Release);
        debug!(record_id = %self.id, distance, peak_intensity = value, "Record enriched");
    }

    /// Look up the region synchronously and replace the cached name
    pub fn resolve_region(&self) -> Result<()> {
        let context = self.bound_context()?;

        match context.geo.resolve(self.latitude, self.longitude, self.depth) {
            Ok(resolution) => {
                let region: Arc<str> = Arc::from(resolution.region);
                *self.region.write().unwrap_or_else(PoisonError::into_inner) = Some(region);
                Ok(())
            }
            Err(e) => {
                warn!(record_id = %self.id, error = %e, "Region resolution failed");
                Err(e)
            }
        }
    }

    /// Unique id of the event
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Epicenter latitude in degrees
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Epicenter longitude in degrees
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Hypocenter depth in km
    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Origin time of the event
    pub fn origin_time(&self) -> Timestamp {
        self.origin_time
    }

    /// Event magnitude
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// Hypocenter quality class, fixed at construction
    pub fn quality_class(&self) -> QualityClass {
        self.quality_class
    }

    /// Largest association ratio among archived detections, at least 1.0
    /// when any were archived; 0.0 when the event came without detections.
    pub fn max_association_ratio(&self) -> f64 {
        self.max_association_ratio
    }

    /// Detections copied from the event at archive time
    pub fn archived_detections(&self) -> &[ArchivedDetection] {
        &self.detections
    }

    /// Number of stations whose detections were archived with the event
    pub fn assigned_stations(&self) -> usize {
        self.detections.len()
    }

    /// Region name, once resolved
    pub fn region(&self) -> Option<Arc<str>> {
        self.region
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Estimated peak ground acceleration; 0.0 until enrichment completes
    pub fn peak_intensity(&self) -> f64 {
        f64::from_bits(self.peak_intensity.load(Ordering::Acquire))
    }

    /// Whether the intensity estimate has been written
    pub fn is_enriched(&self) -> bool {
        self.intensity_written.load(Ordering::Acquire)
    }

    /// Flag the record as erroneous. There is no way back.
    pub fn invalidate(&self) {
        if !self.invalidated.swap(true, Ordering::AcqRel) {
            debug!(record_id = %self.id, "Record invalidated");
        }
    }

    /// Whether the record was flagged as erroneous
    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::Acquire)
    }

    /// Whether the record passes the display thresholds in `config`
    pub fn is_display_eligible(&self, config: &DisplayConfig) -> bool {
        DisplayFilter.evaluate(self, config)
    }

    /// Display order: newest first, ties broken by id
    pub fn compare_for_display_order(&self, other: &ArchivedRecord) -> CmpOrdering {
        compare_for_display(self, other)
    }

    /// Capture the persistent state of this record
    pub fn snapshot(&self) -> RecordSnapshot {
        RecordSnapshot {
            id: self.id,
            latitude: self.latitude,
            longitude: self.longitude,
            depth: self.depth,
            origin_time: self.origin_time,
            magnitude: self.magnitude,
            quality_class: self.quality_class,
            max_association_ratio: self.max_association_ratio,
            detections: self.detections.clone(),
            region: self.region().map(|r| r.to_string()),
            peak_intensity: self.peak_intensity(),
            enriched: self.is_enriched(),
            invalidated: self.is_invalidated(),
        }
    }
}

fn freeze_detections(snapshot: Option<&[DetectionSnapshot]>) -> (Vec<ArchivedDetection>, f64) {
    let Some(snapshot) = snapshot else {
        return (Vec::new(), 0.0);
    };

    let detections: Vec<ArchivedDetection> = snapshot
        .iter()
        .filter(|d| d.valid)
        .map(ArchivedDetection::from)
        .collect();
    let max_ratio = detections.iter().map(|d| d.ratio).fold(1.0, f64::max);

    (detections, max_ratio)
}

impl Serialize for ArchivedRecord {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.snapshot().serialize(serializer)
    }
}

/// Deserialized records come back unbound; see [`ArchivedRecord::bind`].
impl<'de> Deserialize<'de> for ArchivedRecord {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RecordSnapshot::deserialize(deserializer).map(Self::from_snapshot)
    }
}

impl fmt::Debug for ArchivedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchivedRecord")
            .field("id", &self.id)
            .field("latitude", &self.latitude)
            .field("longitude", &self.longitude)
            .field("depth", &self.depth)
            .field("origin_time", &self.origin_time)
            .field("magnitude", &self.magnitude)
            .field("quality_class", &self.quality_class)
            .field("max_association_ratio", &self.max_association_ratio)
            .field("region", &self.region())
            .field("peak_intensity", &self.peak_intensity())
            .field("invalidated", &self.is_invalidated())
            .finish()
    }
}

impl fmt::Display for ArchivedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "M{:.1} {} ({:.3}, {:.3}) depth {:.1} km at {} [{}]",
            self.magnitude,
            self.region().as_deref().unwrap_or("unknown region"),
            self.latitude,
            self.longitude,
            self.depth,
            self.origin_time,
            self.quality_class,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::EnrichmentQueue;
    use crate::geo::{GeoResolution, MockGeoResolver, MockIntensityEstimator};
    use mockall::predicate::eq;
    use std::collections::HashSet;
    use std::time::Duration;

    const ORIGIN: i64 = 1_700_000_000_000;
    const DISTANCE: f64 = 123.4;

    fn context(
        queue: &EnrichmentQueue,
        geo: MockGeoResolver,
        intensity: MockIntensityEstimator,
    ) -> EnrichmentContext {
        EnrichmentContext::new(queue.handle(), Arc::new(geo), Arc::new(intensity))
    }

    fn honshu_geo() -> MockGeoResolver {
        let mut geo = MockGeoResolver::new();
        geo.expect_resolve().returning(|_, _, _| {
            Ok(GeoResolution {
                region: "Honshu, Japan".to_string(),
                ocean_distance_km: DISTANCE,
            })
        });
        geo
    }

    fn summary() -> DetectionSummary {
        DetectionSummary::new(
            RecordId::new(),
            35.0,
            139.0,
            10.0,
            6.5,
            Timestamp::from_millis(ORIGIN),
        )
        .with_quality(QualityClass::S)
    }

    fn snapshot(enriched: bool) -> RecordSnapshot {
        RecordSnapshot {
            id: RecordId::new(),
            latitude: 35.0,
            longitude: 139.0,
            depth: 10.0,
            origin_time: Timestamp::from_millis(ORIGIN),
            magnitude: 6.5,
            quality_class: QualityClass::A,
            max_association_ratio: 4.0,
            detections: vec![ArchivedDetection {
                latitude: 35.5,
                longitude: 139.5,
                ratio: 4.0,
                arrival_time: Timestamp::from_millis(ORIGIN + 5_000),
            }],
            region: Some("Persisted region".to_string()),
            peak_intensity: if enriched { 0.8 } else { 0.0 },
            enriched,
            invalidated: false,
        }
    }

    #[tokio::test]
    async fn test_intensity_is_written_after_drain() {
        let queue = EnrichmentQueue::start();
        let mut geo = MockGeoResolver::new();
        geo.expect_resolve()
            .with(eq(35.0), eq(139.0), eq(10.0))
            .times(1)
            .returning(|_, _, _| {
                Ok(GeoResolution {
                    region: "Honshu, Japan".to_string(),
                    ocean_distance_km: DISTANCE,
                })
            });
        let mut intensity = MockIntensityEstimator::new();
        intensity
            .expect_estimate()
            .with(eq(6.5), eq(DISTANCE), eq(10.0))
            .times(1)
            .returning(|_, _, _| Ok(0.42));

        let record = ArchivedRecord::from_summary(&summary(), context(&queue, geo, intensity)).unwrap();

        // The worker has not had a chance to run yet on this single-threaded runtime.
        assert_eq!(record.peak_intensity(), 0.0);
        assert!(!record.is_enriched());

        queue.drain().await.unwrap();

        assert_eq!(record.peak_intensity(), 0.42);
        assert!(record.is_enriched());
        assert_eq!(record.quality_class(), QualityClass::S);
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_association_ratio_frozen_from_valid_detections() {
        let queue = EnrichmentQueue::start();
        let mut intensity = MockIntensityEstimator::new();
        intensity.expect_estimate().returning(|_, _, _| Ok(1.0));
        let ctx = context(&queue, honshu_geo(), intensity);
        let arrival = Timestamp::from_millis(ORIGIN + 3_000);

        let with_detections = summary().with_detections(vec![
            DetectionSnapshot::new(35.1, 139.1, 2.5, arrival),
            DetectionSnapshot::new(35.2, 139.2, 7.0, arrival).invalid(),
            DetectionSnapshot::new(35.3, 139.3, 3.1, arrival),
        ]);
        let record = ArchivedRecord::from_summary(&with_detections, ctx.clone()).unwrap();
        assert_eq!(record.assigned_stations(), 2);
        assert_eq!(record.max_association_ratio(), 3.1);

        let weak = summary().with_detections(vec![DetectionSnapshot::new(35.1, 139.1, 0.4, arrival)]);
        let record = ArchivedRecord::from_summary(&weak, ctx.clone()).unwrap();
        assert_eq!(record.max_association_ratio(), 1.0);

        let without = ArchivedRecord::from_summary(&summary(), ctx).unwrap();
        assert!(without.archived_detections().is_empty());
        assert_eq!(without.max_association_ratio(), 0.0);

        queue.drain().await.unwrap();
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_invalid_summary_fails_fast() {
        let queue = EnrichmentQueue::start();
        let ctx = context(&queue, MockGeoResolver::new(), MockIntensityEstimator::new());
        let mut bad = summary();
        bad.latitude = f64::NAN;

        let result = ArchivedRecord::from_summary(&bad, ctx);
        assert!(matches!(result, Err(Error::InvalidSummary(_))));
        assert_eq!(queue.submitted(), 0);
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_quality_degrades_to_worst() {
        let queue = EnrichmentQueue::start();
        let mut intensity = MockIntensityEstimator::new();
        intensity.expect_estimate().returning(|_, _, _| Ok(1.0));
        let mut no_quality = summary();
        no_quality.quality_class = None;

        let record =
            ArchivedRecord::from_summary(&no_quality, context(&queue, honshu_geo(), intensity)).unwrap();
        assert_eq!(record.quality_class(), QualityClass::WORST);
        queue.drain().await.unwrap();
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_estimation_leaves_default() {
        let queue = EnrichmentQueue::start();
        let mut intensity = MockIntensityEstimator::new();
        intensity
            .expect_estimate()
            .times(1)
            .returning(|_, _, _| Err(Error::Intensity("model unavailable".to_string())));

        let record = ArchivedRecord::from_summary(&summary(), context(&queue, honshu_geo(), intensity)).unwrap();
        queue.drain().await.unwrap();

        assert_eq!(record.peak_intensity(), 0.0);
        assert!(!record.is_enriched());
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_distance_lookup_skips_estimator() {
        let queue = EnrichmentQueue::start();
        let mut geo = MockGeoResolver::new();
        geo.expect_resolve()
            .returning(|_, _, _| Err(Error::Geo("lookup table unavailable".to_string())));
        let mut intensity = MockIntensityEstimator::new();
        intensity.expect_estimate().never();

        let record = ArchivedRecord::from_summary(&summary(), context(&queue, geo, intensity)).unwrap();
        queue.drain().await.unwrap();

        assert_eq!(record.peak_intensity(), 0.0);
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_every_record_enriched_exactly_once() {
        let queue = EnrichmentQueue::start();
        let mut intensity = MockIntensityEstimator::new();
        intensity
            .expect_estimate()
            .times(25)
            .returning(|magnitude, _, _| Ok(magnitude / 10.0));
        let ctx = context(&queue, honshu_geo(), intensity);

        let records: Vec<_> = (0..25)
            .map(|i| {
                ArchivedRecord::new(
                    RecordId::new(),
                    35.0,
                    139.0,
                    10.0,
                    i as f64,
                    Timestamp::from_millis(ORIGIN + i),
                    QualityClass::B,
                    ctx.clone(),
                )
            })
            .collect();
        queue.drain().await.unwrap();

        for (i, record) in records.iter().enumerate() {
            assert!(record.is_enriched());
            assert_eq!(record.peak_intensity(), i as f64 / 10.0);
        }
        assert_eq!(queue.completed(), 25);
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_resolve_region_is_idempotent() {
        let queue = EnrichmentQueue::start();
        let mut intensity = MockIntensityEstimator::new();
        intensity.expect_estimate().returning(|_, _, _| Ok(1.0));
        let record = ArchivedRecord::from_summary(&summary(), context(&queue, honshu_geo(), intensity)).unwrap();

        assert_eq!(record.region(), None);
        record.resolve_region().unwrap();
        let first = record.region();
        record.resolve_region().unwrap();

        assert_eq!(first.as_deref(), Some("Honshu, Japan"));
        assert_eq!(record.region(), first);
        queue.drain().await.unwrap();
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_region_resolution_keeps_previous_value() {
        let queue = EnrichmentQueue::start();
        let mut geo = MockGeoResolver::new();
        geo.expect_resolve()
            .returning(|_, _, _| Err(Error::Geo("offline".to_string())));
        let record = ArchivedRecord::restore(snapshot(true), context(&queue, geo, MockIntensityEstimator::new()));

        assert!(record.resolve_region().is_err());
        assert_eq!(record.region().as_deref(), Some("Persisted region"));
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_restore_trusts_persisted_values() {
        let queue = EnrichmentQueue::start();
        let mut intensity = MockIntensityEstimator::new();
        intensity.expect_estimate().never();
        let record = ArchivedRecord::restore(
            snapshot(true),
            context(&queue, MockGeoResolver::new(), intensity),
        );

        assert!(record.is_bound());
        assert_eq!(queue.submitted(), 0);
        assert_eq!(record.peak_intensity(), 0.8);
        assert_eq!(record.region().as_deref(), Some("Persisted region"));
        assert_eq!(record.max_association_ratio(), 4.0);

        // Already enriched: an explicit request does not recompute.
        record.request_enrichment().unwrap();
        queue.drain().await.unwrap();
        assert_eq!(queue.submitted(), 0);
        assert_eq!(record.peak_intensity(), 0.8);
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_request_enrichment_on_restored_record() {
        let queue = EnrichmentQueue::start();
        let mut intensity = MockIntensityEstimator::new();
        intensity.expect_estimate().times(1).returning(|_, _, _| Ok(0.3));
        let record = ArchivedRecord::restore(snapshot(false), context(&queue, honshu_geo(), intensity));

        record.request_enrichment().unwrap();
        queue.drain().await.unwrap();

        assert!(record.is_enriched());
        assert_eq!(record.peak_intensity(), 0.3);
        queue.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_reader_sees_only_default_or_estimate() {
        const ESTIMATE: f64 = 0.123456789;

        let queue = EnrichmentQueue::start();
        let mut intensity = MockIntensityEstimator::new();
        intensity.expect_estimate().times(1).returning(|_, _, _| {
            std::thread::sleep(Duration::from_millis(5));
            Ok(ESTIMATE)
        });
        let record = ArchivedRecord::restore(snapshot(false), context(&queue, honshu_geo(), intensity));

        let reader = {
            let record = Arc::clone(&record);
            std::thread::spawn(move || {
                let mut seen = HashSet::new();
                loop {
                    let done = record.is_enriched();
                    seen.insert(record.peak_intensity().to_bits());
                    if done {
                        return seen;
                    }
                }
            })
        };

        record.request_enrichment().unwrap();
        queue.drain().await.unwrap();
        let seen = reader.join().unwrap();

        let allowed: HashSet<u64> = [0f64.to_bits(), ESTIMATE.to_bits()].into_iter().collect();
        assert!(seen.is_subset(&allowed), "unexpected values: {:?}", seen);
        assert!(seen.contains(&ESTIMATE.to_bits()));
        assert_eq!(record.peak_intensity(), ESTIMATE);
        queue.shutdown().await;
    }

    #[test]
    fn test_unbound_record_refuses_work() {
        let record = Arc::new(ArchivedRecord::from_snapshot(snapshot(false)));

        assert!(!record.is_bound());
        assert!(matches!(record.resolve_region(), Err(Error::Unbound(_))));
        assert!(matches!(record.request_enrichment(), Err(Error::Unbound(_))));
    }

    #[tokio::test]
    async fn test_deserialized_record_must_be_bound() {
        let original = ArchivedRecord::from_snapshot(snapshot(true));
        let json = serde_json::to_string(&original).unwrap();
        let reloaded: ArchivedRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(reloaded.snapshot(), original.snapshot());
        assert!(!reloaded.is_bound());

        let queue = EnrichmentQueue::start();
        assert!(reloaded.bind(context(&queue, honshu_geo(), MockIntensityEstimator::new())));
        assert!(!reloaded.bind(context(&queue, honshu_geo(), MockIntensityEstimator::new())));
        reloaded.resolve_region().unwrap();
        assert_eq!(reloaded.region().as_deref(), Some("Honshu, Japan"));
        queue.shutdown().await;
    }

    #[test]
    fn test_invalidation_is_sticky() {
        let record = ArchivedRecord::from_snapshot(snapshot(false));
        assert!(!record.is_invalidated());
        record.invalidate();
        record.invalidate();
        assert!(record.is_invalidated());
        assert!(record.snapshot().invalidated);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_non_fatal() {
        let queue = EnrichmentQueue::start();
        let handle = queue.handle();
        queue.shutdown().await;

        let ctx = EnrichmentContext::new(
            handle,
            Arc::new(MockGeoResolver::new()),
            Arc::new(MockIntensityEstimator::new()),
        );
        let record = ArchivedRecord::from_summary(&summary(), ctx).unwrap();

        assert!(!record.is_enriched());
        assert!(matches!(record.request_enrichment(), Err(Error::QueueClosed)));
    }
}
