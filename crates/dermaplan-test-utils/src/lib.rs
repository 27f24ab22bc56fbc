//! Testing utilities for the Dermaplan workspace
//!
//! Shared fixtures, a scripted vision provider, and proptest strategies.

#![allow(missing_docs)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use dermaplan_core::error::VisionError;
use dermaplan_core::{
    Concern, Metric, QualitySignal, RawMetricVector, ScanId, Sensitivity, SkinMetricSet,
    SkinProfile, SkinType,
};
use dermaplan_core::vision::{ImageSet, VisionProvider};
use proptest::prelude::*;
use std::collections::BTreeMap;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Noon UTC on the given day
pub fn at_noon(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap())
}

/// Every metric at `base`, with overrides
pub fn scores(base: f64, overrides: &[(Metric, f64)]) -> BTreeMap<Metric, f64> {
    let mut map: BTreeMap<Metric, f64> = Metric::ALL.iter().map(|m| (*m, base)).collect();
    map.extend(overrides.iter().copied());
    map
}

/// Passing scan captured at noon on `day`
pub fn scan_on(day: NaiveDate, scores: BTreeMap<Metric, f64>) -> SkinMetricSet {
    SkinMetricSet::new(ScanId::new(), scores, 90.0, QualitySignal::pass(), at_noon(day))
}

/// Passing scan with every metric at 20 except the overrides
pub fn scan_with(day: NaiveDate, overrides: &[(Metric, f64)]) -> SkinMetricSet {
    scan_on(day, scores(20.0, overrides))
}

pub fn raw_vector(day: NaiveDate, scores: BTreeMap<Metric, f64>, confidence: f64) -> RawMetricVector {
    RawMetricVector {
        scores,
        confidence,
        quality: QualitySignal::pass(),
        captured_at: at_noon(day),
        summary: None,
    }
}

pub fn profile(skin_type: SkinType, primary: Concern) -> SkinProfile {
    SkinProfile::new(skin_type, primary)
}

pub fn sensitive_profile(skin_type: SkinType, primary: Concern) -> SkinProfile {
    SkinProfile::new(skin_type, primary).with_sensitivity(Sensitivity::High)
}

pub fn images() -> ImageSet {
    ImageSet::new("scans/front.jpg", "scans/left.jpg", "scans/right.jpg")
}

/// Vision provider returning a fixed answer
#[derive(Debug, Clone)]
pub struct ScriptedVision {
    response: Result<RawMetricVector, VisionError>,
}

impl ScriptedVision {
    pub fn returning(raw: RawMetricVector) -> Self {
        Self { response: Ok(raw) }
    }

    pub fn failing(err: VisionError) -> Self {
        Self { response: Err(err) }
    }
}

impl VisionProvider for ScriptedVision {
    fn analyze(&self, _images: &ImageSet) -> Result<RawMetricVector, VisionError> {
        self.response.clone()
    }
}

pub fn arb_metric() -> impl Strategy<Value = Metric> {
    prop_oneof![
        Just(Metric::Acne),
        Just(Metric::Redness),
        Just(Metric::Oiliness),
        Just(Metric::Dryness),
        Just(Metric::Texture),
        Just(Metric::Pores),
        Just(Metric::DarkSpots),
    ]
}

pub fn arb_concern() -> impl Strategy<Value = Concern> {
    arb_metric().prop_map(Concern::from_metric)
}

pub fn arb_skin_type() -> impl Strategy<Value = SkinType> {
    prop_oneof![
        Just(SkinType::Oily),
        Just(SkinType::Dry),
        Just(SkinType::Combination),
        Just(SkinType::Normal),
    ]
}

pub fn arb_sensitivity() -> impl Strategy<Value = Sensitivity> {
    prop_oneof![Just(Sensitivity::Low), Just(Sensitivity::Moderate), Just(Sensitivity::High)]
}

/// Full metric vector with scores in [0, 100]
pub fn arb_scores() -> impl Strategy<Value = BTreeMap<Metric, f64>> {
    proptest::collection::vec(0.0f64..=100.0, Metric::ALL.len())
        .prop_map(|values| Metric::ALL.iter().copied().zip(values).collect())
}

pub fn arb_profile() -> impl Strategy<Value = SkinProfile> {
    (
        arb_skin_type(),
        arb_sensitivity(),
        arb_concern(),
        proptest::collection::vec(arb_concern(), 0..4),
        any::<bool>(),
    )
        .prop_map(|(skin_type, sensitivity, primary, extra, irritation)| {
            SkinProfile::new(skin_type, primary)
                .with_sensitivity(sensitivity)
                .with_concerns(extra.into_iter().filter(|c| *c != primary))
                .with_irritation(irritation)
        })
}
