//! Linear ink consumption model.
//!
//! Ink drains at a fixed rate while the pen is writing. The empty date is
//! projected from the average drain over the whole observed period.

use crate::estimation::EstimationError;
use crate::estimation::model::{EstimationModel, EstimationParams};
use crate::state::{ActivitySample, PenStatus, ReplacementSuggestion};
use time::{Duration, OffsetDateTime};

#[derive(Debug, Clone)]
pub struct LinearInkModel {
    pub params: EstimationParams,
}

impl LinearInkModel {
    pub fn new(params: EstimationParams) -> Self {
        Self { params }
    }

    pub fn with_defaults() -> Self {
        Self::new(EstimationParams::default())
    }
}

impl EstimationModel for LinearInkModel {
    fn estimate(
        &self,
        device_id: &str,
        samples: &[ActivitySample],
    ) -> Result<PenStatus, EstimationError> {
        let ordered = sort_by_timestamp(samples);
        let (Some(first), Some(last)) = (ordered.first(), ordered.last()) else {
            return Err(EstimationError::NoSamples);
        };

        let consumed = writing_seconds(&ordered) * self.params.consumption_rate_per_second;
        let ink_level = (self.params.initial_level - consumed).max(0.0);

        let estimated_empty_date = if consumed > 0.0 {
            project_empty_date(first.timestamp, last.timestamp, consumed, ink_level)
        } else {
            None
        };

        Ok(PenStatus {
            device_id: device_id.to_string(),
            ink_level: round_to_hundredths(ink_level),
            estimated_empty_date,
            replacement_suggestion: ReplacementSuggestion::for_level(
                ink_level,
                self.params.replacement_threshold,
            ),
            last_updated_at: last.raw_timestamp.clone(),
        })
    }

    fn params(&self) -> &EstimationParams {
        &self.params
    }
}

/// Stable sort by instant; samples sharing a timestamp keep their input order.
pub fn sort_by_timestamp(samples: &[ActivitySample]) -> Vec<&ActivitySample> {
    let mut ordered: Vec<&ActivitySample> = samples.iter().collect();
    ordered.sort_by_key(|sample| sample.timestamp);
    ordered
}

/// Total seconds attributed to writing. Each interval belongs to the sample
/// that opens it, so the last sample's flag never counts.
pub fn writing_seconds(ordered: &[&ActivitySample]) -> f64 {
    ordered
        .windows(2)
        .filter(|pair| pair[0].is_writing)
        .map(|pair| (pair[1].timestamp - pair[0].timestamp).as_seconds_f64().max(0.0))
        .sum()
}

/// Project when the ink runs out at the average rate seen between `first`
/// and `last`. Returns `None` for a zero-length period or a projection that
/// falls outside the representable date range.
pub fn project_empty_date(
    first: OffsetDateTime,
    last: OffsetDateTime,
    consumed: f64,
    ink_level: f64,
) -> Option<OffsetDateTime> {
    let total_period = (last - first).as_seconds_f64();
    if total_period <= 0.0 {
        return None;
    }

    let average_rate = consumed / total_period;
    if average_rate <= 0.0 {
        return None;
    }

    let remaining_seconds = ink_level / average_rate;
    let remaining = Duration::microseconds((remaining_seconds * 1_000_000.0).round() as i64);
    last.checked_add(remaining)
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::format_description::well_known::Rfc3339;

    fn sample(timestamp: &str, is_writing: bool) -> ActivitySample {
        ActivitySample::parse("pen-1", timestamp, is_writing).expect("valid test timestamp")
    }

    fn instant(timestamp: &str) -> OffsetDateTime {
        OffsetDateTime::parse(timestamp, &Rfc3339).expect("valid test timestamp")
    }

    #[test]
    fn one_minute_of_writing_consumes_half_a_percent() -> Result<(), EstimationError> {
        let model = LinearInkModel::with_defaults();
        let samples = vec![
            sample("2024-01-01T00:00:00Z", true),
            sample("2024-01-01T00:01:00Z", false),
        ];

        let status = model.estimate("pen-1", &samples)?;

        assert_eq!(status.ink_level, 99.5);
        assert_eq!(
            status.replacement_suggestion,
            ReplacementSuggestion::NotNeeded
        );
        // 99.5 remaining at 0.5 per 60s of wall time: 11940s after the last sample.
        assert_eq!(
            status.estimated_empty_date,
            Some(instant("2024-01-01T03:20:00Z"))
        );
        assert_eq!(status.last_updated_at, "2024-01-01T00:01:00Z");
        Ok(())
    }

    #[test]
    fn single_sample_is_full_without_projection() -> Result<(), EstimationError> {
        let model = LinearInkModel::with_defaults();
        let samples = vec![sample("2024-01-01T00:00:00Z", true)];

        let status = model.estimate("pen-1", &samples)?;

        assert_eq!(status.ink_level, 100.0);
        assert_eq!(status.estimated_empty_date, None);
        assert_eq!(
            status.replacement_suggestion,
            ReplacementSuggestion::NotNeeded
        );
        Ok(())
    }

    #[test]
    fn idle_pen_stays_full() -> Result<(), EstimationError> {
        let model = LinearInkModel::with_defaults();
        let samples = vec![
            sample("2024-01-01T00:00:00Z", false),
            sample("2024-02-01T00:00:00Z", false),
            sample("2024-03-01T00:00:00Z", false),
        ];

        let status = model.estimate("pen-1", &samples)?;

        assert_eq!(status.ink_level, 100.0);
        assert_eq!(status.estimated_empty_date, None);
        Ok(())
    }

    #[test]
    fn long_writing_session_depletes_ink() -> Result<(), EstimationError> {
        let model = LinearInkModel::with_defaults();
        // 12000s of writing consumes exactly 100%; run past it.
        let samples = vec![
            sample("2024-01-01T00:00:00Z", true),
            sample("2024-01-01T05:00:00Z", false),
        ];

        let status = model.estimate("pen-1", &samples)?;

        assert_eq!(status.ink_level, 0.0);
        assert_eq!(
            status.replacement_suggestion,
            ReplacementSuggestion::Depleted
        );
        assert_eq!(
            status.estimated_empty_date,
            Some(instant("2024-01-01T05:00:00Z"))
        );
        Ok(())
    }

    #[test]
    fn level_exactly_at_threshold_is_not_low() -> Result<(), EstimationError> {
        let model = LinearInkModel::with_defaults();
        // 9600s of writing consumes 80%.
        let samples = vec![
            sample("2024-01-01T00:00:00Z", true),
            sample("2024-01-01T02:40:00Z", false),
        ];

        let status = model.estimate("pen-1", &samples)?;

        assert_eq!(status.ink_level, 20.0);
        assert_eq!(
            status.replacement_suggestion,
            ReplacementSuggestion::NotNeeded
        );
        Ok(())
    }

    #[test]
    fn level_below_threshold_is_low() -> Result<(), EstimationError> {
        let model = LinearInkModel::with_defaults();
        // 10800s of writing consumes 90%.
        let samples = vec![
            sample("2024-01-01T00:00:00Z", true),
            sample("2024-01-01T03:00:00Z", false),
        ];

        let status = model.estimate("pen-1", &samples)?;

        assert_eq!(status.ink_level, 10.0);
        assert_eq!(status.replacement_suggestion, ReplacementSuggestion::Low);
        Ok(())
    }

    #[test]
    fn input_order_is_not_trusted() -> Result<(), EstimationError> {
        let model = LinearInkModel::with_defaults();
        let shuffled = vec![
            sample("2024-01-01T00:02:00Z", false),
            sample("2024-01-01T00:00:00Z", true),
            sample("2024-01-01T00:01:00Z", true),
        ];

        let status = model.estimate("pen-1", &shuffled)?;

        // Both writing intervals count: 120s -> 1%.
        assert_eq!(status.ink_level, 99.0);
        assert_eq!(status.last_updated_at, "2024-01-01T00:02:00Z");
        Ok(())
    }

    #[test]
    fn mixed_offsets_sort_by_instant() -> Result<(), EstimationError> {
        let model = LinearInkModel::with_defaults();
        // 09:00+09:00 is midnight UTC, one minute before 00:01Z.
        let samples = vec![
            sample("2024-01-01T00:01:00Z", false),
            sample("2024-01-01T09:00:00+09:00", true),
        ];

        let status = model.estimate("pen-1", &samples)?;

        assert_eq!(status.ink_level, 99.5);
        assert_eq!(status.last_updated_at, "2024-01-01T00:01:00Z");
        Ok(())
    }

    #[test]
    fn equal_timestamps_keep_input_order() -> Result<(), EstimationError> {
        let model = LinearInkModel::with_defaults();
        let writing_first = vec![
            sample("2024-01-01T00:00:00Z", true),
            sample("2024-01-01T00:01:00Z", true),
            sample("2024-01-01T00:01:00Z", false),
            sample("2024-01-01T00:02:00Z", false),
        ];
        let idle_first = vec![
            sample("2024-01-01T00:00:00Z", true),
            sample("2024-01-01T00:01:00Z", false),
            sample("2024-01-01T00:01:00Z", true),
            sample("2024-01-01T00:02:00Z", false),
        ];

        let a = model.estimate("pen-1", &writing_first)?;
        let b = model.estimate("pen-1", &idle_first)?;

        // The later of the tied samples opens the 00:01 -> 00:02 interval.
        assert_eq!(a.ink_level, 99.5);
        assert_eq!(b.ink_level, 99.0);
        Ok(())
    }

    #[test]
    fn last_sample_flag_is_ignored() -> Result<(), EstimationError> {
        let model = LinearInkModel::with_defaults();
        let samples = vec![
            sample("2024-01-01T00:00:00Z", false),
            sample("2024-01-01T00:10:00Z", true),
        ];

        let status = model.estimate("pen-1", &samples)?;

        assert_eq!(status.ink_level, 100.0);
        assert_eq!(status.estimated_empty_date, None);
        Ok(())
    }

    #[test]
    fn empty_samples_are_rejected() {
        let model = LinearInkModel::with_defaults();

        let result = model.estimate("pen-1", &[]);

        assert!(matches!(result, Err(EstimationError::NoSamples)));
    }

    #[test]
    fn estimate_is_idempotent() -> Result<(), EstimationError> {
        let model = LinearInkModel::with_defaults();
        let samples = vec![
            sample("2024-01-01T00:00:00Z", true),
            sample("2024-01-01T00:00:45Z", false),
            sample("2024-01-01T00:03:00Z", true),
            sample("2024-01-01T00:03:20Z", false),
        ];

        let first = model.estimate("pen-1", &samples)?;
        let second = model.estimate("pen-1", &samples)?;

        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn custom_params_change_rate_and_threshold() -> Result<(), EstimationError> {
        let model = LinearInkModel::new(EstimationParams {
            initial_level: 100.0,
            consumption_rate_per_second: 1.0,
            replacement_threshold: 50.0,
        });
        let samples = vec![
            sample("2024-01-01T00:00:00Z", true),
            sample("2024-01-01T00:01:00Z", false),
        ];

        let status = model.estimate("pen-1", &samples)?;

        assert_eq!(status.ink_level, 40.0);
        assert_eq!(status.replacement_suggestion, ReplacementSuggestion::Low);
        Ok(())
    }

    #[test]
    fn params_reports_configured_values() {
        let params = EstimationParams {
            initial_level: 80.0,
            consumption_rate_per_second: 0.25,
            replacement_threshold: 10.0,
        };
        let model: Box<dyn EstimationModel> = Box::new(LinearInkModel::new(params));

        assert_eq!(model.params(), &params);
    }

    #[test]
    fn ink_level_stays_in_range() -> Result<(), EstimationError> {
        let model = LinearInkModel::with_defaults();
        let mut samples = Vec::new();
        for hour in 0..24 {
            samples.push(sample(&format!("2024-01-01T{hour:02}:00:00Z"), hour % 3 != 0));
        }

        let status = model.estimate("pen-1", &samples)?;

        assert!((0.0..=100.0).contains(&status.ink_level));
        Ok(())
    }

    #[test]
    fn projection_requires_positive_period() {
        let at = instant("2024-01-01T00:00:00Z");

        assert_eq!(project_empty_date(at, at, 1.0, 99.0), None);
    }
}
