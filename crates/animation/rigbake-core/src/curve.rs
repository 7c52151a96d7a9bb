//! Weight curves: sorted (frame, weight) control points with forward-only evaluation.
//!
//! Curves are filled once by the notetrack compiler (append, then a single
//! stable `sort`) and afterwards only read. Evaluation takes a cursor hint so
//! a full bake pass, which queries non-decreasing frames, costs O(1)
//! amortized per query instead of a binary search.
//!
//! Cursors are only valid for non-decreasing query times. `CurveCursor`
//! rewinds itself when it sees an earlier time; a raw `usize` cursor that is
//! ahead of the query time restarts its scan from the first point.

use serde::{Deserialize, Serialize};

use crate::interp::functions::lerp_f32;

/// One control point of a weight curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightPoint {
    pub frame: f32,
    pub weight: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightCurve {
    points: Vec<WeightPoint>,
    min: f32,
    max: f32,
}

impl Default for WeightCurve {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightCurve {
    /// Empty curve bounded to [0, 1].
    pub fn new() -> Self {
        Self::with_bounds(0.0, 1.0)
    }

    pub fn with_bounds(min: f32, max: f32) -> Self {
        Self {
            points: Vec::new(),
            min: min.min(max),
            max: max.max(min),
        }
    }

    /// Append a control point. No ordering or duplicate checks.
    #[inline]
    pub fn add(&mut self, frame: f32, weight: f32) {
        self.points.push(WeightPoint { frame, weight });
    }

    /// Stable sort by frame; points sharing a frame keep insertion order.
    pub fn sort(&mut self) {
        self.points.sort_by(|a, b| a.frame.total_cmp(&b.frame));
    }

    #[inline]
    pub fn points(&self) -> &[WeightPoint] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn bounds(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Evaluate at `time` starting the scan at `cursor`; returns the weight and
    /// the advanced cursor to pass to the next (non-decreasing) query.
    pub fn evaluate(&self, time: f32, cursor: usize) -> (f32, usize) {
        let n = self.points.len();
        if n == 0 {
            return (0.0, 0);
        }
        let mut i = cursor.min(n - 1);
        if self.points[i].frame > time {
            i = 0;
        }
        while i + 1 < n && self.points[i + 1].frame <= time {
            i += 1;
        }
        (self.weight_from(i, time), i)
    }

    /// Stateless evaluation by binary search. Same result as `evaluate`.
    pub fn evaluate_at(&self, time: f32) -> f32 {
        if self.points.is_empty() {
            return 0.0;
        }
        let idx = self.points.partition_point(|p| p.frame <= time);
        self.weight_from(idx.saturating_sub(1), time)
    }

    /// Weight at `time` given `i`, the last point with frame <= time (or 0).
    fn weight_from(&self, i: usize, time: f32) -> f32 {
        let p0 = self.points[i];
        let w = if time <= p0.frame {
            p0.weight
        } else if let Some(p1) = self.points.get(i + 1) {
            let span = p1.frame - p0.frame;
            if span > 0.0 {
                lerp_f32(p0.weight, p1.weight, (time - p0.frame) / span)
            } else {
                p1.weight
            }
        } else {
            p0.weight
        };
        w.clamp(self.min, self.max)
    }

    /// Borrowing sampler for a sequence of non-decreasing times.
    pub fn sampler(&self) -> CurveSampler<'_> {
        CurveSampler {
            curve: self,
            cursor: CurveCursor::new(),
        }
    }
}

/// Forward-only evaluation state kept next to a curve by its owner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CurveCursor {
    index: usize,
    last_time: Option<f32>,
}

impl CurveCursor {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Evaluate `curve` at `time`, advancing the cursor.
    /// A time earlier than the previous query rewinds to the start first.
    pub fn sample(&mut self, curve: &WeightCurve, time: f32) -> f32 {
        if self.last_time.is_some_and(|last| time < last) {
            self.index = 0;
        }
        let (weight, next) = curve.evaluate(time, self.index);
        self.index = next;
        self.last_time = Some(time);
        weight
    }
}

/// A curve plus its cursor, for callers that do not store the cursor themselves.
#[derive(Clone, Debug)]
pub struct CurveSampler<'a> {
    curve: &'a WeightCurve,
    cursor: CurveCursor,
}

impl<'a> CurveSampler<'a> {
    #[inline]
    pub fn sample(&mut self, time: f32) -> f32 {
        self.cursor.sample(self.curve, time)
    }

    /// Map a sequence of non-decreasing times to weights.
    pub fn samples<I>(mut self, times: I) -> impl Iterator<Item = f32> + 'a
    where
        I: IntoIterator<Item = f32>,
        I::IntoIter: 'a,
    {
        times.into_iter().map(move |t| self.sample(t))
    }
}
