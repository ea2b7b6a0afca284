use std::f32::consts::TAU;

use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use synthesis::{PenState, StrokeNormalization};

use crate::config::{MAX_SLANT_DEGREES, PostProcessConfig};

/// An absolute `[x, y]` position.
pub type Point = [f32; 2];

/// A continuous pen-down run of points.
pub type Stroke = Vec<Point>;

/// Vertical swing of the baseline at `baseline_drift = 1`, in drawing units.
pub const DRIFT_AMPLITUDE: f32 = 2.;

/// Horizontal distance over which the baseline completes one swing.
pub const DRIFT_WAVELENGTH: f32 = 40.;

/// Standard deviation of the fatigue jitter on the last point of a drawing.
pub const FATIGUE_SPREAD: f32 = 0.5;

/// Mixed into the generation seed for the humanization draws.
const HUMANIZE_SALT: u64 = 0x5eed_f00d_ba5e_d1ce;

/// Per-request irregularities layered over the generated geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Humanization {
    /// Replaces the configured slant, within `MAX_SLANT_DEGREES` either way.
    pub slant_degrees: Option<f32>,
    /// Strength of a slow sinusoidal wander of the baseline, in `[0, 1]`.
    pub baseline_drift: f32,
    /// Adds jitter that grows from nothing at the first point to `FATIGUE_SPREAD` at the last.
    pub fatigue: bool,
}

impl Humanization {
    /// Checks every field is within its range.
    ///
    /// # Returns
    /// A description of the first offending field.
    pub fn check(&self) -> Result<(), String> {
        if let Some(degrees) = self.slant_degrees {
            if !(degrees.is_finite() && degrees.abs() <= MAX_SLANT_DEGREES) {
                return Err(format!(
                    "slant_degrees must be within {MAX_SLANT_DEGREES} either way, got {degrees}"
                ));
            }
        }

        if !(0. ..=1.).contains(&self.baseline_drift) {
            return Err(format!(
                "baseline_drift must be within [0, 1], got {}",
                self.baseline_drift
            ));
        }

        Ok(())
    }
}

/// Turns generated offsets into renderable stroke geometry.
#[derive(Debug, Clone, Default)]
pub struct PostProcessor {
    config: PostProcessConfig,
}

impl PostProcessor {
    pub fn new(config: PostProcessConfig) -> Self {
        Self { config }
    }

    /// Integrates a trace into absolute strokes with no humanization.
    pub fn process(&self, trace: &[PenState]) -> Vec<Stroke> {
        self.process_with(trace, &Humanization::default(), 0)
    }

    /// Integrates a trace into absolute strokes: shear, drift the baseline, add fatigue, split
    /// at lifts, then resample and smooth every stroke as configured.
    ///
    /// # Arguments
    /// * `trace` - Offsets in drawing units, starting with the origin.
    /// * `humanize` - Irregularities to apply.
    /// * `seed` - Seeds the drift phase and the fatigue jitter.
    pub fn process_with(
        &self,
        trace: &[PenState],
        humanize: &Humanization,
        seed: u64,
    ) -> Vec<Stroke> {
        let mut rng = StdRng::seed_from_u64(seed ^ HUMANIZE_SALT);

        let mut points = to_absolute(trace);
        let slant = humanize.slant_degrees.unwrap_or(self.config.slant_degrees);
        shear(&mut points, slant);
        drift(&mut points, humanize.baseline_drift, &mut rng);
        if humanize.fatigue {
            fatigue(&mut points, &mut rng);
        }

        segment(&points)
            .into_iter()
            .map(|stroke| match self.config.resample_spacing {
                Some(spacing) => resample(&stroke, spacing),
                None => stroke,
            })
            .map(|stroke| smooth(&stroke, self.config.smoothing_window))
            .collect()
    }
}

/// Maps model-space offsets back to drawing units. The origin anchor is left untouched.
pub fn denormalize(trace: &[PenState], norm: &StrokeNormalization) -> Vec<PenState> {
    trace
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if i == 0 {
                return *p;
            }
            let (dx, dy) = norm.denormalize(p.dx, p.dy);
            PenState::new(dx, dy, p.lift)
        })
        .collect()
}

/// Cumulative sum of the offsets, keeping each point's lift flag.
pub fn to_absolute(trace: &[PenState]) -> Vec<(Point, bool)> {
    let mut at = [0., 0.];
    trace
        .iter()
        .map(|p| {
            at = [at[0] + p.dx, at[1] + p.dy];
            (at, p.lift)
        })
        .collect()
}

/// Splits at lifts: a lifted point is the last one of its stroke.
pub fn segment(points: &[(Point, bool)]) -> Vec<Stroke> {
    let mut strokes = Vec::new();
    let mut current = Vec::new();

    for &(point, lift) in points {
        current.push(point);
        if lift {
            strokes.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        strokes.push(current);
    }

    strokes
}

/// Shears `x` by `y · tan(degrees)`, with `degrees` clamped to `MAX_SLANT_DEGREES`.
pub fn shear(points: &mut [(Point, bool)], degrees: f32) {
    if degrees == 0. {
        return;
    }

    let k = degrees
        .clamp(-MAX_SLANT_DEGREES, MAX_SLANT_DEGREES)
        .to_radians()
        .tan();

    for (point, _) in points {
        point[0] += point[1] * k;
    }
}

/// Moves `y` along a sinusoid of `x` with a random phase, shifted so the origin stays put.
pub fn drift<R: Rng>(points: &mut [(Point, bool)], strength: f32, rng: &mut R) {
    if strength == 0. {
        return;
    }

    let phase = rng.random_range(0. ..TAU);
    let amplitude = strength * DRIFT_AMPLITUDE;
    let wave = |x: f32| (x / DRIFT_WAVELENGTH * TAU + phase).sin();
    let at_origin = wave(0.);

    for (point, _) in points {
        point[1] += amplitude * (wave(point[0]) - at_origin);
    }
}

/// Jitters every point with Gaussian noise whose spread grows linearly along the drawing.
/// The first point is left where it is.
pub fn fatigue<R: Rng>(points: &mut [(Point, bool)], rng: &mut R) {
    let last = points.len().saturating_sub(1).max(1) as f32;

    for (i, (point, _)) in points.iter_mut().enumerate() {
        let spread = FATIGUE_SPREAD * i as f32 / last;
        let (nx, ny): (f32, f32) = (rng.sample(StandardNormal), rng.sample(StandardNormal));
        point[0] += spread * nx;
        point[1] += spread * ny;
    }
}

fn distance(a: Point, b: Point) -> f32 {
    (b[0] - a[0]).hypot(b[1] - a[1])
}

fn lerp(a: Point, b: Point, t: f32) -> Point {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
}

/// Resamples a stroke to points `spacing` apart along its arc. The first and last points are
/// kept as they are, so the final gap may be shorter.
pub fn resample(stroke: &[Point], spacing: f32) -> Stroke {
    if stroke.len() < 2 {
        return stroke.to_vec();
    }
    let (first, last) = (stroke[0], stroke[stroke.len() - 1]);

    let mut out = vec![first];
    // Arc length walked since the last emitted point.
    let mut walked = 0.;

    for pair in stroke.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let len = distance(a, b);
        if len == 0. {
            continue;
        }

        // Distance into this segment of its first sample.
        let start = (spacing - walked).max(0.);
        if start > len {
            walked += len;
            continue;
        }

        let samples = ((len - start) / spacing) as usize + 1;
        for i in 0..samples {
            let at = start + i as f32 * spacing;
            out.push(lerp(a, b, at / len));
        }
        walked = len - (start + (samples - 1) as f32 * spacing);
    }

    if out.len() == 1 || out.last() != Some(&last) {
        out.push(last);
    }
    out
}

/// Centered moving average over `window` points. The first and last points stay exact.
pub fn smooth(stroke: &[Point], window: usize) -> Stroke {
    let n = stroke.len();
    if window <= 1 || n <= 2 {
        return stroke.to_vec();
    }

    let half = window / 2;
    (0..n)
        .map(|i| {
            if i == 0 || i == n - 1 {
                return stroke[i];
            }

            let lo = i.saturating_sub(half);
            let hi = (i + half).min(n - 1);
            let count = (hi - lo + 1) as f32;
            let sum = stroke[lo..=hi]
                .iter()
                .fold([0., 0.], |acc, p| [acc[0] + p[0], acc[1] + p[1]]);

            [sum[0] / count, sum[1] / count]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace() -> Vec<PenState> {
        vec![
            PenState::origin(),
            PenState::new(1., 0., false),
            PenState::new(1., 1., true),
            PenState::new(0., 2., false),
            PenState::new(1., 0., false),
        ]
    }

    #[test]
    fn strokes_split_at_lifts() {
        let strokes = PostProcessor::default().process(&trace());
        assert_eq!(
            strokes,
            vec![
                vec![[0., 0.], [1., 0.], [2., 1.]],
                vec![[2., 3.], [3., 3.]],
            ]
        );
    }

    #[test]
    fn trailing_lift_leaves_no_empty_stroke() {
        let points = to_absolute(&[PenState::origin(), PenState::new(1., 1., true)]);
        assert_eq!(segment(&points), vec![vec![[0., 0.], [1., 1.]]]);
    }

    #[test]
    fn resampling_is_uniform_and_keeps_ends() {
        let stroke = vec![[0., 0.], [10., 0.], [10., 5.]];
        let out = resample(&stroke, 2.);

        assert_eq!(out.first(), Some(&[0., 0.]));
        assert_eq!(out.last(), Some(&[10., 5.]));
        // 15 units long: 7 interior samples plus both ends, the last gap is 1.
        assert_eq!(out.len(), 9);
        for pair in out[..out.len() - 1].windows(2) {
            assert!((distance(pair[0], pair[1]) - 2.).abs() < 1e-4);
        }
    }

    #[test]
    fn resampling_degenerate_strokes() {
        assert_eq!(resample(&[[1., 1.]], 0.5), vec![[1., 1.]]);
        assert_eq!(resample(&[[1., 1.], [1., 1.]], 0.5), vec![[1., 1.], [1., 1.]]);
        assert!(resample(&[], 0.5).is_empty());
    }

    #[test]
    fn smoothing_keeps_ends() {
        let stroke = vec![[0., 0.], [1., 3.], [2., 0.], [3., 3.], [4., 0.]];
        let out = smooth(&stroke, 3);

        assert_eq!(out[0], stroke[0]);
        assert_eq!(out[4], stroke[4]);
        assert_eq!(out[1], [1., 1.]);
        assert_eq!(out[2], [2., 2.]);
        assert_eq!(smooth(&stroke, 0), stroke);
    }

    #[test]
    fn slant_is_clamped() {
        let mut points = vec![([0., 1.], false)];
        shear(&mut points, 80.);
        assert!((points[0].0[0] - 30f32.to_radians().tan()).abs() < 1e-6);
    }

    #[test]
    fn origin_survives_denormalization() {
        let norm = StrokeNormalization {
            mean: [1., 1.],
            std: [2., 2.],
        };
        let out = denormalize(&[PenState::origin(), PenState::new(1., 0., true)], &norm);
        assert_eq!(out, vec![PenState::origin(), PenState::new(3., 1., true)]);
    }

    #[test]
    fn resampling_counts_samples_up_front() {
        let out = resample(&[[0., 0.], [1., 0.]], 0.3);
        assert_eq!(out.len(), 5);
        for (point, x) in out.iter().zip([0., 0.3, 0.6, 0.9, 1.]) {
            assert!((point[0] - x).abs() < 1e-6, "{out:?}");
        }

        // A segment shorter than the spacing only carries its length over.
        let out = resample(&[[0., 0.], [0.5, 0.], [1.5, 0.], [3., 0.]], 1.);
        assert_eq!(out, vec![[0., 0.], [1., 0.], [2., 0.], [3., 0.]]);
    }

    fn line(n: usize) -> Vec<PenState> {
        std::iter::once(PenState::origin())
            .chain((1..n).map(|_| PenState::new(0.5, 0., false)))
            .collect()
    }

    #[test]
    fn no_humanization_changes_nothing() {
        let processor = PostProcessor::default();
        let trace = trace();
        assert_eq!(
            processor.process_with(&trace, &Humanization::default(), 99),
            processor.process(&trace)
        );
    }

    #[test]
    fn slant_override_replaces_configured_slant() {
        let processor = PostProcessor::new(PostProcessConfig {
            slant_degrees: 10.,
            ..Default::default()
        });
        let trace = [PenState::origin(), PenState::new(0., 1., false)];
        let humanize = Humanization {
            slant_degrees: Some(-20.),
            ..Default::default()
        };

        let strokes = processor.process_with(&trace, &humanize, 0);
        let x = strokes[0][1][0];
        assert!((x - (-20f32).to_radians().tan()).abs() < 1e-6);
    }

    #[test]
    fn baseline_drift_bends_y_only() {
        let trace = line(200);
        let humanize = Humanization {
            baseline_drift: 1.,
            ..Default::default()
        };

        let flat = PostProcessor::default().process(&trace);
        let drifted = PostProcessor::default().process_with(&trace, &humanize, 5);

        assert_eq!(drifted[0][0], [0., 0.]);
        assert!(flat[0].iter().zip(&drifted[0]).all(|(a, b)| a[0] == b[0]));

        let swing = drifted[0].iter().map(|p| p[1].abs()).fold(0., f32::max);
        assert!(swing > 0.5 && swing <= 2. * DRIFT_AMPLITUDE + 1e-4, "{swing}");
        assert_eq!(
            drifted,
            PostProcessor::default().process_with(&trace, &humanize, 5)
        );
    }

    #[test]
    fn fatigue_grows_along_the_drawing() {
        let trace = line(1000);
        let humanize = Humanization {
            fatigue: true,
            ..Default::default()
        };

        let tired = PostProcessor::default().process_with(&trace, &humanize, 11);
        let points = &tired[0];
        assert_eq!(points[0], [0., 0.]);

        let jitter = |range: std::ops::Range<usize>| {
            let n = range.len() as f32;
            range.map(|i| points[i][1].abs()).sum::<f32>() / n
        };
        assert!(jitter(900..1000) > 4. * jitter(0..100));

        let again = PostProcessor::default().process_with(&trace, &humanize, 11);
        assert_eq!(&again, &tired);
        let other = PostProcessor::default().process_with(&trace, &humanize, 12);
        assert_ne!(other, tired);
    }

    #[test]
    fn humanization_ranges() {
        let ok = Humanization {
            slant_degrees: Some(-30.),
            baseline_drift: 1.,
            fatigue: true,
        };
        assert!(ok.check().is_ok());

        let bad = [
            Humanization {
                slant_degrees: Some(31.),
                ..Default::default()
            },
            Humanization {
                slant_degrees: Some(f32::NAN),
                ..Default::default()
            },
            Humanization {
                baseline_drift: 1.5,
                ..Default::default()
            },
            Humanization {
                baseline_drift: -0.1,
                ..Default::default()
            },
        ];
        for humanize in bad {
            assert!(humanize.check().is_err(), "{humanize:?}");
        }
    }
}
