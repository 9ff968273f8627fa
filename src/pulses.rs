//! Glottal pulse train and perturbation measures.
//!
//! Documentation sources:
//! - Praat manual: Sound & Pitch: To PointProcess (cc)...
//! - Praat manual: PointProcess: Get jitter (local)... and siblings
//! - Praat manual: Sound & PointProcess: Get shimmer (local)... and siblings
//!
//! Pulse detection walks each voiced interval of the pitch contour
//! outward from its midpoint: the absolute waveform extremum within half
//! a period of the midpoint seeds the train, and every further pulse is
//! the extremum within [0.8·T, 1.25·T] of the previous one, T taken from
//! the local F0. Peak positions and amplitudes are refined by parabolic
//! interpolation.
//!
//! Perturbation measures follow the MDVP-style definitions used by
//! Praat. An inter-pulse interval only counts as a period when it lies
//! within [period_floor, period_ceiling], and neighboring periods (or
//! pulse amplitudes, for shimmer) must not differ by more than the
//! maximum period (amplitude) factor. Measures with no admissible data
//! are undefined and reported as `None`, distinct from zero.

use crate::pitch::Pitch;
use crate::sound::Sound;

/// Admissibility limits for periods and amplitudes.
///
/// Defaults are the conventional Praat values: periods between 0.1 ms
/// and 20 ms, at most a factor 1.3 between neighboring periods and a
/// factor 1.6 between neighboring pulse amplitudes.
#[derive(Debug, Clone, Copy)]
pub struct PerturbationParams {
    /// Shortest admissible period in seconds.
    pub period_floor: f64,
    /// Longest admissible period in seconds.
    pub period_ceiling: f64,
    /// Largest admissible ratio between neighboring periods.
    pub max_period_factor: f64,
    /// Largest admissible ratio between neighboring pulse amplitudes.
    pub max_amplitude_factor: f64,
}

impl Default for PerturbationParams {
    fn default() -> Self {
        Self {
            period_floor: 1e-4,
            period_ceiling: 0.02,
            max_period_factor: 1.3,
            max_amplitude_factor: 1.6,
        }
    }
}

/// Jitter measures as raw fractions (seconds for `local_absolute`).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Jitter {
    /// Mean absolute period difference over the mean period.
    pub local: Option<f64>,
    /// Mean absolute period difference in seconds.
    pub local_absolute: Option<f64>,
    /// Relative average perturbation (3-point).
    pub rap: Option<f64>,
    /// Five-point period perturbation quotient.
    pub ppq5: Option<f64>,
    /// Difference of differences of periods; 3 × rap.
    pub ddp: Option<f64>,
}

/// Shimmer measures as raw fractions (`local_db` in dB).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Shimmer {
    /// Mean absolute amplitude difference over the mean amplitude.
    pub local: Option<f64>,
    /// Mean absolute base-20 log amplitude ratio, in dB.
    pub local_db: Option<f64>,
    /// Three-point amplitude perturbation quotient.
    pub apq3: Option<f64>,
    /// Five-point amplitude perturbation quotient.
    pub apq5: Option<f64>,
    /// Eleven-point amplitude perturbation quotient.
    pub apq11: Option<f64>,
    /// Difference of differences of amplitudes; 3 × apq3.
    pub dda: Option<f64>,
}

/// A train of glottal pulse times within a signal.
#[derive(Debug, Clone)]
pub struct PointProcess {
    /// Pulse times in seconds, ascending.
    times: Vec<f64>,
    /// Duration of the signal the pulses came from.
    total_duration: f64,
}

impl PointProcess {
    /// Create a point process from pulse times; the times are sorted.
    pub fn new(mut times: Vec<f64>, total_duration: f64) -> Self {
        times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        Self {
            times,
            total_duration,
        }
    }

    /// Number of pulses.
    #[inline]
    pub fn n_points(&self) -> usize {
        self.times.len()
    }

    /// Pulse times in seconds.
    #[inline]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Duration of the source signal in seconds.
    #[inline]
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    /// All inter-pulse intervals, unfiltered.
    pub fn intervals(&self) -> Vec<f64> {
        self.times.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Intervals admissible as periods (within the floor/ceiling range).
    pub fn periods(&self, params: &PerturbationParams) -> Vec<f64> {
        self.intervals()
            .into_iter()
            .filter(|&p| p >= params.period_floor && p <= params.period_ceiling)
            .collect()
    }

    /// Mean of the admissible periods; `None` without any.
    pub fn mean_period(&self, params: &PerturbationParams) -> Option<f64> {
        let periods = self.periods(params);
        if periods.is_empty() {
            None
        } else {
            Some(periods.iter().sum::<f64>() / periods.len() as f64)
        }
    }

    /// Sample standard deviation of the admissible periods; `None` below
    /// two periods.
    pub fn stdev_period(&self, params: &PerturbationParams) -> Option<f64> {
        let periods = self.periods(params);
        if periods.len() < 2 {
            return None;
        }
        let mean = periods.iter().sum::<f64>() / periods.len() as f64;
        let var = periods.iter().map(|p| (p - mean) * (p - mean)).sum::<f64>()
            / (periods.len() - 1) as f64;
        Some(var.sqrt())
    }
}

/// Whether two positive values differ by at most `max_factor`.
fn ratio_ok(a: f64, b: f64, max_factor: f64) -> bool {
    if a <= 0.0 || b <= 0.0 {
        return false;
    }
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    hi / lo <= max_factor
}

/// Whether an interval is admissible as a period.
fn period_ok(p: f64, params: &PerturbationParams) -> bool {
    p >= params.period_floor && p <= params.period_ceiling
}

/// Mean absolute difference between consecutive admissible values.
///
/// A pair is admissible when both values pass `valid` and their ratio
/// stays within `max_factor`.
fn mean_abs_pair_difference(
    values: &[f64],
    valid: impl Fn(f64) -> bool,
    max_factor: f64,
) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for w in values.windows(2) {
        if valid(w[0]) && valid(w[1]) && ratio_ok(w[0], w[1], max_factor) {
            sum += (w[1] - w[0]).abs();
            count += 1;
        }
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// k-point perturbation quotient: mean |center − window mean| over
/// admissible windows of k consecutive values.
///
/// A window is admissible when every value passes `valid` and every
/// adjacent pair stays within `max_factor`.
fn perturbation_quotient(
    values: &[f64],
    k: usize,
    valid: impl Fn(f64) -> bool,
    max_factor: f64,
) -> Option<f64> {
    if values.len() < k {
        return None;
    }
    let mut sum = 0.0;
    let mut count = 0usize;
    for w in values.windows(k) {
        let admissible = w.iter().all(|&v| valid(v))
            && w.windows(2).all(|pair| ratio_ok(pair[0], pair[1], max_factor));
        if admissible {
            let mean = w.iter().sum::<f64>() / k as f64;
            sum += (w[k / 2] - mean).abs();
            count += 1;
        }
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Compute all jitter measures of a pulse train.
pub fn jitter_measures(pulses: &PointProcess, params: &PerturbationParams) -> Jitter {
    let intervals = pulses.intervals();
    let mean_period = pulses.mean_period(params);

    let valid = |p: f64| period_ok(p, params);
    let local_absolute =
        mean_abs_pair_difference(&intervals, valid, params.max_period_factor);
    let rap_absolute = perturbation_quotient(&intervals, 3, valid, params.max_period_factor);
    let ppq5_absolute = perturbation_quotient(&intervals, 5, valid, params.max_period_factor);

    let relative = |abs: Option<f64>| match (abs, mean_period) {
        (Some(a), Some(m)) if m > 0.0 => Some(a / m),
        _ => None,
    };

    let rap = relative(rap_absolute);
    Jitter {
        local: relative(local_absolute),
        local_absolute,
        rap,
        ppq5: relative(ppq5_absolute),
        ddp: rap.map(|r| 3.0 * r),
    }
}

/// Peak amplitude of the waveform around each pulse.
///
/// The search half-width per pulse is half the smaller adjacent
/// interval, so neighboring pulses never share a peak.
fn pulse_amplitudes(sound: &Sound, times: &[f64]) -> Vec<f64> {
    let samples = sound.as_slice();
    let sample_rate = sound.sample_rate();

    times
        .iter()
        .enumerate()
        .map(|(i, &t)| {
            let left = (i > 0).then(|| t - times[i - 1]);
            let right = (i + 1 < times.len()).then(|| times[i + 1] - t);
            let half_width = match (left, right) {
                (Some(l), Some(r)) => 0.5 * l.min(r),
                (Some(l), None) => 0.5 * l,
                (None, Some(r)) => 0.5 * r,
                (None, None) => 0.001,
            };
            find_extremum(samples, sample_rate, t - half_width, t + half_width)
                .map_or(0.0, |(_, amp)| amp)
        })
        .collect()
}

/// Compute all shimmer measures of a pulse train against its waveform.
///
/// Amplitude pairs and windows are additionally gated by the periods
/// connecting the pulses: a pair only counts when the interval between
/// its pulses is an admissible period.
pub fn shimmer_measures(
    sound: &Sound,
    pulses: &PointProcess,
    params: &PerturbationParams,
) -> Shimmer {
    let times = pulses.times();
    if times.len() < 2 {
        return Shimmer::default();
    }

    let amplitudes = pulse_amplitudes(sound, times);
    let intervals = pulses.intervals();

    // Amplitudes of pulses that bound at least one admissible period;
    // their mean normalizes the relative measures.
    let participating: Vec<f64> = amplitudes
        .iter()
        .enumerate()
        .filter(|&(i, _)| {
            let left = i.checked_sub(1).map(|j| intervals[j]);
            let right = intervals.get(i).copied();
            left.map_or(false, |p| period_ok(p, params))
                || right.map_or(false, |p| period_ok(p, params))
        })
        .map(|(_, &a)| a)
        .collect();
    if participating.is_empty() {
        return Shimmer::default();
    }
    let mean_amplitude = participating.iter().sum::<f64>() / participating.len() as f64;
    if mean_amplitude <= 0.0 {
        return Shimmer::default();
    }

    // Pairwise measures walk amplitude pairs gated by their connecting
    // period and the amplitude factor.
    let mut abs_diff_sum = 0.0;
    let mut db_sum = 0.0;
    let mut pair_count = 0usize;
    for i in 0..amplitudes.len() - 1 {
        let (a1, a2) = (amplitudes[i], amplitudes[i + 1]);
        if period_ok(intervals[i], params)
            && ratio_ok(a1, a2, params.max_amplitude_factor)
        {
            abs_diff_sum += (a2 - a1).abs();
            db_sum += (20.0 * (a2 / a1).log10()).abs();
            pair_count += 1;
        }
    }
    let (local, local_db) = if pair_count > 0 {
        (
            Some(abs_diff_sum / pair_count as f64 / mean_amplitude),
            Some(db_sum / pair_count as f64),
        )
    } else {
        (None, None)
    };

    // Window measures: every connecting period admissible, every
    // adjacent amplitude pair within the amplitude factor.
    let apq = |k: usize| -> Option<f64> {
        if amplitudes.len() < k {
            return None;
        }
        let mut sum = 0.0;
        let mut count = 0usize;
        for i in 0..=amplitudes.len() - k {
            let window = &amplitudes[i..i + k];
            let periods_admissible =
                intervals[i..i + k - 1].iter().all(|&p| period_ok(p, params));
            let amps_admissible = window
                .windows(2)
                .all(|pair| ratio_ok(pair[0], pair[1], params.max_amplitude_factor));
            if periods_admissible && amps_admissible {
                let mean = window.iter().sum::<f64>() / k as f64;
                sum += (window[k / 2] - mean).abs();
                count += 1;
            }
        }
        if count == 0 {
            None
        } else {
            Some(sum / count as f64 / mean_amplitude)
        }
    };

    let apq3 = apq(3);
    Shimmer {
        local,
        local_db,
        apq3,
        apq5: apq(5),
        apq11: apq(11),
        dda: apq3.map(|v| 3.0 * v),
    }
}

/// Absolute waveform extremum within a time window.
///
/// Sample i is taken to sit at time (i + 0.5)·dx. The peak position and
/// magnitude are refined by parabolic interpolation over |x|. `None`
/// when the window holds no samples or only zeros.
fn find_extremum(samples: &[f64], sample_rate: f64, t_from: f64, t_to: f64) -> Option<(f64, f64)> {
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as isize;
    let i_from = (t_from * sample_rate - 0.5).ceil().max(0.0) as isize;
    let i_to = ((t_to * sample_rate - 0.5).floor() as isize).min(n - 1);
    if i_from > i_to {
        return None;
    }

    let mut best_idx = i_from as usize;
    let mut best_val = 0.0f64;
    for i in i_from as usize..=i_to as usize {
        let v = samples[i].abs();
        if v > best_val {
            best_val = v;
            best_idx = i;
        }
    }
    if best_val <= 0.0 {
        return None;
    }

    // Parabolic refinement over the absolute values, interior peaks only.
    let (mut time_idx, mut amp) = (best_idx as f64, best_val);
    if best_idx > 0 && best_idx + 1 < samples.len() {
        let a = samples[best_idx - 1].abs();
        let b = best_val;
        let c = samples[best_idx + 1].abs();
        let denom = a - 2.0 * b + c;
        if denom.abs() > 1e-30 {
            let delta = 0.5 * (a - c) / denom;
            if delta.abs() < 1.0 {
                time_idx += delta;
                amp = b - 0.25 * (a - c) * delta;
            }
        }
    }

    Some(((time_idx + 0.5) / sample_rate, amp))
}

/// Voiced intervals of a pitch contour as (first, last) frame times.
fn voiced_intervals(pitch: &Pitch) -> Vec<(f64, f64)> {
    let mut intervals = Vec::new();
    let mut start: Option<f64> = None;
    let mut last = 0.0;
    for frame in pitch.frames() {
        if frame.voiced() {
            if start.is_none() {
                start = Some(frame.time);
            }
            last = frame.time;
        } else if let Some(s) = start.take() {
            intervals.push((s, last));
        }
    }
    if let Some(s) = start {
        intervals.push((s, last));
    }
    intervals
}

/// Detect glottal pulses from a sound and its pitch contour.
///
/// Within each voiced interval the train is seeded at the absolute
/// waveform extremum near the interval midpoint and extended outward
/// period by period; the local F0 sets the step. Intervals whose
/// midpoint F0 cannot be established contribute no pulses, as do
/// windows that contain only silence.
pub fn sound_to_point_process_cc(sound: &Sound, pitch: &Pitch) -> PointProcess {
    let samples = sound.as_slice();
    let sample_rate = sound.sample_rate();

    let mut times: Vec<f64> = Vec::new();

    for (start_t, end_t) in voiced_intervals(pitch) {
        let mid = 0.5 * (start_t + end_t);
        let Some(f_mid) = pitch.value_at_time(mid).filter(|&f| f > 0.0) else {
            continue;
        };
        let seed_period = 1.0 / f_mid;

        let Some((t0, _)) = find_extremum(
            samples,
            sample_rate,
            mid - 0.5 * seed_period,
            mid + 0.5 * seed_period,
        ) else {
            continue;
        };
        times.push(t0);

        // Walk right, one period at a time.
        let mut t = t0;
        loop {
            let f = pitch.value_at_time(t).filter(|&f| f > 0.0).unwrap_or(f_mid);
            let period = 1.0 / f;
            let w_start = t + 0.8 * period;
            if w_start > end_t + 0.5 * period {
                break;
            }
            match find_extremum(samples, sample_rate, w_start, t + 1.25 * period) {
                Some((tp, _)) => {
                    times.push(tp);
                    t = tp;
                }
                None => break,
            }
        }

        // Walk left symmetrically.
        t = t0;
        loop {
            let f = pitch.value_at_time(t).filter(|&f| f > 0.0).unwrap_or(f_mid);
            let period = 1.0 / f;
            let w_end = t - 0.8 * period;
            if w_end < start_t - 0.5 * period {
                break;
            }
            match find_extremum(samples, sample_rate, t - 1.25 * period, w_end) {
                Some((tp, _)) => {
                    times.push(tp);
                    t = tp;
                }
                None => break,
            }
        }
    }

    times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    // Interval edges can produce near-coincident picks; keep the first.
    let min_spacing = 0.8 / pitch.pitch_ceiling();
    let mut deduped: Vec<f64> = Vec::with_capacity(times.len());
    for t in times {
        if deduped.last().map_or(true, |&prev| t - prev >= min_spacing) {
            deduped.push(t);
        }
    }

    log::debug!("detected {} glottal pulses", deduped.len());
    PointProcess::new(deduped, sound.duration())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train(periods: &[f64]) -> PointProcess {
        let mut t = 0.1;
        let mut times = vec![t];
        for &p in periods {
            t += p;
            times.push(t);
        }
        PointProcess::new(times, t + 0.1)
    }

    #[test]
    fn periodic_train_has_zero_jitter() {
        let pulses = train(&[0.01; 50]);
        let jitter = jitter_measures(&pulses, &PerturbationParams::default());
        assert!(jitter.local.expect("defined") < 1e-12);
        assert!(jitter.local_absolute.expect("defined") < 1e-12);
        assert!(jitter.rap.expect("defined") < 1e-12);
        assert!(jitter.ppq5.expect("defined") < 1e-12);
        assert!(jitter.ddp.expect("defined") < 1e-12);

        let params = PerturbationParams::default();
        assert!((pulses.mean_period(&params).expect("defined") - 0.01).abs() < 1e-12);
        assert!(pulses.stdev_period(&params).expect("defined") < 1e-12);
    }

    #[test]
    fn alternating_periods_match_hand_computed_quotients() {
        // Periods alternate 10 ms / 11 ms.
        let periods: Vec<f64> = (0..40)
            .map(|i| if i % 2 == 0 { 0.010 } else { 0.011 })
            .collect();
        let pulses = train(&periods);
        let jitter = jitter_measures(&pulses, &PerturbationParams::default());

        let mean_period = 0.0105;
        assert!((jitter.local.expect("defined") - 0.001 / mean_period).abs() < 1e-9);
        assert!((jitter.local_absolute.expect("defined") - 0.001).abs() < 1e-12);
        // Every 3-window deviates from its mean by 0.001·2/3.
        let rap = jitter.rap.expect("defined");
        assert!((rap - 0.001 * 2.0 / 3.0 / mean_period).abs() < 1e-9);
        assert!((jitter.ddp.expect("defined") - 3.0 * rap).abs() < 1e-12);
        // Every 5-window deviates by 0.001·2/5.
        assert!((jitter.ppq5.expect("defined") - 0.001 * 2.0 / 5.0 / mean_period).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_intervals_are_not_periods() {
        // A long silence gap in the middle is not a period.
        let pulses = train(&[0.01, 0.01, 0.5, 0.01, 0.01]);
        let params = PerturbationParams::default();
        assert_eq!(pulses.periods(&params).len(), 4);
        assert_eq!(pulses.intervals().len(), 5);
        assert!((pulses.mean_period(&params).expect("defined") - 0.01).abs() < 1e-12);
    }

    #[test]
    fn too_few_periods_leave_statistics_undefined() {
        let pulses = train(&[0.01]);
        let params = PerturbationParams::default();
        assert!(pulses.mean_period(&params).is_some());
        assert!(pulses.stdev_period(&params).is_none());

        let lone = PointProcess::new(vec![0.5], 1.0);
        assert!(lone.mean_period(&params).is_none());
        let jitter = jitter_measures(&lone, &params);
        assert!(jitter.local.is_none());
        assert!(jitter.ddp.is_none());
    }

    #[test]
    fn shimmer_of_a_steady_sine_is_near_zero() {
        let sample_rate = 16000.0;
        let freq = 100.0;
        let samples: Vec<f64> = (0..16000)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate).sin())
            .collect();
        let sound = Sound::from_slice(&samples, sample_rate);

        // Pulses at the positive peaks: t = (k + 0.25) / freq.
        let times: Vec<f64> = (5..90).map(|k| (k as f64 + 0.25) / freq).collect();
        let pulses = PointProcess::new(times, sound.duration());

        let shimmer = shimmer_measures(&sound, &pulses, &PerturbationParams::default());
        assert!(shimmer.local.expect("defined") < 1e-3);
        assert!(shimmer.local_db.expect("defined") < 0.01);
        assert!(shimmer.apq3.expect("defined") < 1e-3);
        assert!(shimmer.apq11.expect("defined") < 1e-3);
        let dda = shimmer.dda.expect("defined");
        assert!((dda - 3.0 * shimmer.apq3.expect("defined")).abs() < 1e-12);
    }

    #[test]
    fn shimmer_needs_at_least_two_pulses() {
        let sound = Sound::from_slice(&vec![0.1; 1600], 16000.0);
        let lone = PointProcess::new(vec![0.05], sound.duration());
        let shimmer = shimmer_measures(&sound, &lone, &PerturbationParams::default());
        assert!(shimmer.local.is_none());
        assert!(shimmer.apq11.is_none());
    }

    #[test]
    fn extremum_refinement_stays_inside_the_window() {
        let sample_rate = 1000.0;
        let samples: Vec<f64> = (0..100)
            .map(|i| if i == 50 { 1.0 } else { 0.0 })
            .collect();
        let (t, amp) = find_extremum(&samples, sample_rate, 0.02, 0.08).expect("peak found");
        assert!((t - 0.0505).abs() < 1e-3);
        assert!((amp - 1.0).abs() < 1e-6);
        assert!(find_extremum(&samples, sample_rate, 0.0, 0.01).is_none());
    }
}
