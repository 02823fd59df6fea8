//! Rolling chart series synthesis
//!
//! The backend keeps no per-minute history, so the chart is a plausible
//! recent-trend visualization: preceding points are carried forward from the
//! previous series or estimated, and only the newest point is a true sample.

use chrono::{DateTime, Duration, Local, Utc};
use rand::Rng;
use std::ops::Range;

use crate::models::{ChartPoint, Incident, SummarySnapshot};

/// Number of points in a series
pub const SERIES_LEN: usize = 24;

/// Spacing between two points (24 points cover one hour)
pub const POINT_INTERVAL_SECS: i64 = 150;

/// Shape of the synthetic estimates.
///
/// cpu = `cpu_baseline + cpu_amplitude * sin(0.5 i) + U[0, cpu_jitter)`,
/// memory = `memory_baseline + memory_amplitude * cos(0.3 i) + U[0, memory_jitter)`,
/// pods = `pods_baseline + floor(pods_amplitude * sin(0.4 i))`.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticProfile {
    pub cpu_baseline: f64,
    pub cpu_amplitude: f64,
    pub cpu_jitter: f64,
    pub memory_baseline: f64,
    pub memory_amplitude: f64,
    pub memory_jitter: f64,
    pub pods_baseline: i64,
    pub pods_amplitude: f64,
}

impl Default for SyntheticProfile {
    fn default() -> Self {
        Self {
            cpu_baseline: 30.0,
            cpu_amplitude: 15.0,
            cpu_jitter: 10.0,
            memory_baseline: 50.0,
            memory_amplitude: 12.0,
            memory_jitter: 8.0,
            pods_baseline: 4,
            pods_amplitude: 1.5,
        }
    }
}

impl SyntheticProfile {
    /// Range every synthetic cpu value falls into (15..55 by default)
    pub fn cpu_bounds(&self) -> Range<f64> {
        let low = self.cpu_baseline - self.cpu_amplitude;
        low..self.cpu_baseline + self.cpu_amplitude + self.cpu_jitter
    }

    /// Range every synthetic memory value falls into (38..70 by default)
    pub fn memory_bounds(&self) -> Range<f64> {
        let low = self.memory_baseline - self.memory_amplitude;
        low..self.memory_baseline + self.memory_amplitude + self.memory_jitter
    }

    /// Inclusive pod range (2..=5 by default)
    pub fn pods_bounds(&self) -> std::ops::RangeInclusive<u32> {
        let swing = self.pods_amplitude.abs().ceil() as i64;
        let low = (self.pods_baseline - swing).max(0) as u32;
        let high = (self.pods_baseline + swing).max(0) as u32;
        low..=high
    }

    fn cpu<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> f64 {
        self.cpu_baseline
            + (index as f64 * 0.5).sin() * self.cpu_amplitude
            + jitter(rng, self.cpu_jitter)
    }

    fn memory<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> f64 {
        self.memory_baseline
            + (index as f64 * 0.3).cos() * self.memory_amplitude
            + jitter(rng, self.memory_jitter)
    }

    fn pods(&self, index: usize) -> u32 {
        let swing = ((index as f64 * 0.4).sin() * self.pods_amplitude).floor() as i64;
        (self.pods_baseline + swing).max(0) as u32
    }
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, width: f64) -> f64 {
    if width > 0.0 {
        rng.gen_range(0.0..width)
    } else {
        0.0
    }
}

/// Build the rolling series ending at `now`.
///
/// Values of a full-length `prior` series are carried forward, shifted left
/// by the number of interval boundaries crossed since it was built; slots it
/// cannot fill get synthetic estimates. When `current` is given, the last
/// point holds its values exactly.
pub fn build_series<R: Rng + ?Sized>(
    prior: &[ChartPoint],
    incidents: &[Incident],
    current: Option<&SummarySnapshot>,
    now: DateTime<Utc>,
    profile: &SyntheticProfile,
    rng: &mut R,
) -> Vec<ChartPoint> {
    let shift = carried_shift(prior, now);
    let interval = Duration::seconds(POINT_INTERVAL_SECS);

    (0..SERIES_LEN)
        .map(|i| {
            let timestamp = now - interval * (SERIES_LEN - 1 - i) as i32;
            let is_latest = i == SERIES_LEN - 1;

            let (mut cpu, mut memory, mut pods) = match shift.and_then(|s| prior.get(i + s)) {
                Some(carried) => (carried.cpu, carried.memory, carried.pods),
                None => (profile.cpu(i, rng), profile.memory(i, rng), profile.pods(i)),
            };

            if is_latest {
                if let Some(summary) = current {
                    cpu = summary.cpu.unwrap_or(cpu);
                    memory = summary.memory.unwrap_or(memory);
                    pods = summary.pods.unwrap_or(pods);
                }
            }

            ChartPoint {
                timestamp,
                time: timestamp.with_timezone(&Local).format("%H:%M").to_string(),
                cpu,
                memory,
                pods,
                incidents: incidents_in_window(incidents, timestamp - interval, timestamp),
            }
        })
        .collect()
}

/// How far a prior series moves left when rebuilt at `now`.
///
/// Counts interval boundaries (on the absolute 150 s grid) crossed since the
/// prior's newest point. `None` when the prior is unusable or fully expired.
fn carried_shift(prior: &[ChartPoint], now: DateTime<Utc>) -> Option<usize> {
    if prior.len() != SERIES_LEN {
        return None;
    }
    let newest = prior.last()?.timestamp;
    let steps = (now.timestamp().div_euclid(POINT_INTERVAL_SECS)
        - newest.timestamp().div_euclid(POINT_INTERVAL_SECS))
    .max(0) as usize;

    (steps < SERIES_LEN).then_some(steps)
}

/// Incidents that occurred in `(start, end]`
fn incidents_in_window(incidents: &[Incident], start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    incidents
        .iter()
        .filter_map(|incident| incident.occurred_at)
        .filter(|at| *at > start && *at <= end)
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IncidentCategory, IncidentSeverity};
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn incident_at(at: DateTime<Utc>) -> Incident {
        Incident {
            id: at.timestamp().to_string(),
            timestamp: "12:00:00".to_string(),
            occurred_at: Some(at),
            category: IncidentCategory::Scale,
            severity: IncidentSeverity::Error,
            title: "Cpu Overload Detected".to_string(),
            action_text: "Scaled nginx-demo: 2 → 4 pods".to_string(),
            resolved_in: "1.2s".to_string(),
        }
    }

    #[test]
    fn test_series_has_fixed_length_and_spacing() {
        let mut rng = StdRng::seed_from_u64(7);
        let series = build_series(&[], &[], None, now(), &SyntheticProfile::default(), &mut rng);

        assert_eq!(series.len(), SERIES_LEN);
        assert_eq!(series.last().unwrap().timestamp, now());
        assert_eq!(series[0].timestamp, now() - Duration::seconds(23 * POINT_INTERVAL_SECS));
        for pair in series.windows(2) {
            assert_eq!(
                pair[1].timestamp - pair[0].timestamp,
                Duration::seconds(POINT_INTERVAL_SECS)
            );
        }
    }

    #[test]
    fn test_synthetic_points_stay_in_bounds() {
        let profile = SyntheticProfile::default();
        assert_eq!(profile.cpu_bounds(), 15.0..55.0);
        assert_eq!(profile.memory_bounds(), 38.0..70.0);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let series = build_series(&[], &[], None, now(), &profile, &mut rng);

            for point in &series {
                assert!(profile.cpu_bounds().contains(&point.cpu), "cpu {}", point.cpu);
                assert!(
                    profile.memory_bounds().contains(&point.memory),
                    "memory {}",
                    point.memory
                );
                assert!(profile.pods_bounds().contains(&point.pods), "pods {}", point.pods);
                assert!((2..=7).contains(&point.pods));
            }
        }
    }

    #[test]
    fn test_last_point_is_current_sample() {
        let mut rng = StdRng::seed_from_u64(1);
        let summary = SummarySnapshot {
            cpu: Some(88.8),
            memory: Some(91.0),
            pods: Some(12),
            ..Default::default()
        };

        let series = build_series(
            &[],
            &[],
            Some(&summary),
            now(),
            &SyntheticProfile::default(),
            &mut rng,
        );

        let last = series.last().unwrap();
        assert_eq!(last.cpu, 88.8);
        assert_eq!(last.memory, 91.0);
        assert_eq!(last.pods, 12);
        // Only the last point is the true sample
        assert!(series[..SERIES_LEN - 1].iter().all(|p| p.cpu < 55.0));
    }

    #[test]
    fn test_prior_series_is_carried_forward() {
        let mut rng = StdRng::seed_from_u64(3);
        let profile = SyntheticProfile::default();
        let first = build_series(&[], &[], None, now(), &profile, &mut rng);

        let summary = SummarySnapshot {
            cpu: Some(42.0),
            memory: Some(44.0),
            pods: Some(3),
            ..Default::default()
        };
        let later = now() + Duration::seconds(3);
        let second = build_series(&first, &[], Some(&summary), later, &profile, &mut rng);

        assert_eq!(second.len(), SERIES_LEN);
        for (old, new) in first.iter().zip(&second).take(SERIES_LEN - 1) {
            assert_eq!(old.cpu, new.cpu);
            assert_eq!(old.memory, new.memory);
            assert_eq!(old.pods, new.pods);
        }
        assert_eq!(second.last().unwrap().cpu, 42.0);
        assert_eq!(second.last().unwrap().timestamp, later);
    }

    #[test]
    fn test_prior_series_rolls_across_interval_boundaries() {
        let mut rng = StdRng::seed_from_u64(4);
        let profile = SyntheticProfile::default();
        let first = build_series(&[], &[], None, now(), &profile, &mut rng);

        let later = now() + Duration::seconds(2 * POINT_INTERVAL_SECS);
        let second = build_series(&first, &[], None, later, &profile, &mut rng);

        for j in 0..SERIES_LEN - 2 {
            assert_eq!(second[j].cpu, first[j + 2].cpu);
            assert_eq!(second[j].pods, first[j + 2].pods);
        }
        for point in &second[SERIES_LEN - 2..] {
            assert!(profile.cpu_bounds().contains(&point.cpu));
        }
    }

    #[test]
    fn test_expired_prior_series_is_replaced() {
        let mut rng = StdRng::seed_from_u64(6);
        let profile = SyntheticProfile::default();
        let summary = SummarySnapshot {
            cpu: Some(99.0),
            ..Default::default()
        };
        let first = build_series(&[], &[], Some(&summary), now(), &profile, &mut rng);

        let much_later = now() + Duration::hours(2);
        let second = build_series(&first, &[], None, much_later, &profile, &mut rng);

        assert!(second.iter().all(|p| profile.cpu_bounds().contains(&p.cpu)));
    }

    #[test]
    fn test_short_prior_series_is_regenerated() {
        let mut rng = StdRng::seed_from_u64(5);
        let profile = SyntheticProfile::default();
        let full = build_series(&[], &[], None, now(), &profile, &mut rng);

        let series = build_series(&full[..10], &[], None, now(), &profile, &mut rng);
        assert_eq!(series.len(), SERIES_LEN);
    }

    #[test]
    fn test_incidents_are_bucketed_by_interval() {
        let mut rng = StdRng::seed_from_u64(9);
        let incidents = vec![
            incident_at(now()),
            incident_at(now() - Duration::seconds(10)),
            incident_at(now() - Duration::seconds(POINT_INTERVAL_SECS + 1)),
            // Outside the hour
            incident_at(now() - Duration::hours(3)),
        ];

        let series = build_series(
            &[],
            &incidents,
            None,
            now(),
            &SyntheticProfile::default(),
            &mut rng,
        );

        assert_eq!(series[SERIES_LEN - 1].incidents, 2);
        assert_eq!(series[SERIES_LEN - 2].incidents, 1);
        assert_eq!(series.iter().map(|p| p.incidents).sum::<u32>(), 3);
    }

    #[test]
    fn test_custom_profile_bounds() {
        let profile = SyntheticProfile {
            cpu_baseline: 60.0,
            cpu_amplitude: 5.0,
            cpu_jitter: 0.0,
            ..SyntheticProfile::default()
        };
        let mut rng = StdRng::seed_from_u64(11);
        let series = build_series(&[], &[], None, now(), &profile, &mut rng);

        assert!(series.iter().all(|p| (55.0..=65.0).contains(&p.cpu)));
    }
}
