//! Composite (single or dual) model used by every calibration step.
//!
//! Purpose
//! -------
//! Couple an upstream "head" simulator and a local "tail" simulator into one
//! parameterized model of a sub-basin outlet. The head branch is lagged by a
//! delay parameter before both branches are averaged with area weights.
//!
//! Conventions
//! -----------
//! - Parameter layout is `[head.., delay, tail..]`; a single model has only
//!   the head block.
//! - `output = (delay(head)·A_h + tail·A_t) / (A_h + A_t)`.
//! - When there is no tail, or `A_t == 0`, the output is exactly the head
//!   output: neither the delay nor the tail simulator is run.
use crate::models::{
    errors::{ModelError, ModelResult},
    forcing::Forcing,
    simulator::{Delay, Simulator},
};
use ndarray::{Array1, ArrayView1, s};

/// Local branch of a dual model.
#[derive(Clone, Copy)]
pub struct Tail<'a> {
    pub simulator: &'a dyn Simulator,
    pub delay: &'a dyn Delay,
}

/// Parameter vector split into its blocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamBlocks<'p> {
    pub head: ArrayView1<'p, f64>,
    pub delay: Option<f64>,
    pub tail: Option<ArrayView1<'p, f64>>,
}

/// `CompositeModel` — head simulator plus optional lagged, area-weighted tail.
///
/// Invariants
/// ----------
/// - Area weights are finite and non-negative with a positive sum.
/// - `n_params()` never depends on the chain position: it is the head block,
///   plus one delay and the tail block for dual models.
#[derive(Clone, Copy)]
pub struct CompositeModel<'a> {
    head: &'a dyn Simulator,
    tail: Option<Tail<'a>>,
    area_head: f64,
    area_tail: f64,
}

impl<'a> CompositeModel<'a> {
    /// Model made of the head simulator alone.
    pub fn single(head: &'a dyn Simulator) -> Self {
        Self { head, tail: None, area_head: 1.0, area_tail: 0.0 }
    }

    /// Dual model `(delay(head)·area_head + tail·area_tail) / (area_head + area_tail)`.
    ///
    /// # Errors
    /// - [`ModelError::InvalidArea`] for a negative or non-finite weight.
    /// - [`ModelError::ZeroTotalArea`] if both weights are zero.
    pub fn dual(
        head: &'a dyn Simulator, tail: &'a dyn Simulator, delay: &'a dyn Delay, area_head: f64,
        area_tail: f64,
    ) -> ModelResult<Self> {
        validate_area("head", area_head)?;
        validate_area("tail", area_tail)?;
        if area_head + area_tail <= 0.0 {
            return Err(ModelError::ZeroTotalArea);
        }
        Ok(Self { head, tail: Some(Tail { simulator: tail, delay }), area_head, area_tail })
    }

    pub fn is_dual(&self) -> bool {
        self.tail.is_some()
    }

    /// Length of the head block.
    pub fn head_len(&self) -> usize {
        self.head.n_params()
    }

    /// Total parameter count `[head.., delay, tail..]`.
    pub fn n_params(&self) -> usize {
        self.head_len() + self.tail.map_or(0, |t| 1 + t.simulator.n_params())
    }

    pub fn areas(&self) -> (f64, f64) {
        (self.area_head, self.area_tail)
    }

    /// Split `params` into head, delay and tail blocks.
    ///
    /// # Errors
    /// - [`ModelError::ParamLengthMismatch`] if `params.len() != n_params()`.
    pub fn split<'p>(&self, params: ArrayView1<'p, f64>) -> ModelResult<ParamBlocks<'p>> {
        let expected = self.n_params();
        if params.len() != expected {
            return Err(ModelError::ParamLengthMismatch { expected, actual: params.len() });
        }
        let h = self.head_len();
        if self.tail.is_none() {
            return Ok(ParamBlocks { head: params, delay: None, tail: None });
        }
        let (head, rest) = params.split_at(ndarray::Axis(0), h);
        Ok(ParamBlocks { head, delay: Some(rest[0]), tail: Some(rest.slice_move(s![1..])) })
    }

    /// Simulated outlet series for `params`.
    ///
    /// # Errors
    /// - [`ModelError::ParamLengthMismatch`] from [`CompositeModel::split`].
    pub fn simulate(&self, params: ArrayView1<f64>, forcing: &Forcing) -> ModelResult<Array1<f64>> {
        let blocks = self.split(params)?;
        let head_out = self.head.run(blocks.head, forcing);
        let (Some(tail), Some(lag), Some(tail_params)) = (self.tail, blocks.delay, blocks.tail)
        else {
            return Ok(head_out);
        };
        if self.area_tail == 0.0 {
            return Ok(head_out);
        }
        let lagged = tail.delay.run(head_out.view(), lag);
        let tail_out = tail.simulator.run(tail_params, forcing);
        let total = self.area_head + self.area_tail;
        Ok((lagged * self.area_head + tail_out * self.area_tail) / total)
    }

    /// Output of the head simulator alone (no delay, no weighting).
    pub fn simulate_head(
        &self, params: ArrayView1<f64>, forcing: &Forcing,
    ) -> ModelResult<Array1<f64>> {
        let blocks = self.split(params)?;
        Ok(self.head.run(blocks.head, forcing))
    }
}

fn validate_area(which: &'static str, value: f64) -> ModelResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ModelError::InvalidArea { which, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lag::LinearLag;
    use ndarray::array;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Constant series equal to the first parameter, counting its calls.
    struct Level {
        calls: AtomicUsize,
    }

    impl Level {
        fn new() -> Self {
            Self { calls: AtomicUsize::new(0) }
        }
    }

    impl Simulator for Level {
        fn n_params(&self) -> usize {
            1
        }

        fn run(&self, params: ArrayView1<f64>, forcing: &Forcing) -> Array1<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Array1::from_elem(forcing.len(), params[0])
        }
    }

    /// Linear ramp `a·t`, to make the delay visible.
    struct Ramp;

    impl Simulator for Ramp {
        fn n_params(&self) -> usize {
            1
        }

        fn run(&self, params: ArrayView1<f64>, forcing: &Forcing) -> Array1<f64> {
            Array1::from_iter((0..forcing.len()).map(|t| params[0] * t as f64))
        }
    }

    fn forcing(n: usize) -> Forcing {
        Forcing::new(Array1::zeros(n), Array1::zeros(n)).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // With a zero tail area the dual output equals the head output exactly and
    // the tail simulator is never run.
    fn zero_tail_area_returns_head_output() {
        let head = Ramp;
        let tail = Level::new();
        let model = CompositeModel::dual(&head, &tail, &LinearLag, 3.0, 0.0).unwrap();
        let f = forcing(5);
        let params = array![2.0, 1.5, 9.0];
        let out = model.simulate(params.view(), &f).unwrap();
        assert_eq!(out, head.run(array![2.0].view(), &f));
        assert_eq!(tail.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    // Purpose
    // -------
    // A single model reproduces its head simulator.
    fn single_model_is_head_output() {
        let model = CompositeModel::single(&Ramp);
        let f = forcing(4);
        assert_eq!(model.n_params(), 1);
        assert_eq!(model.simulate(array![0.5].view(), &f).unwrap(), array![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    // Purpose
    // -------
    // Dual output is the area-weighted average of the lagged head and the tail.
    //
    // Given
    // -----
    // - head = ramp 1·t lagged by 1 step → [0, 0, 1, 2].
    // - tail = constant 4.
    // - areas (1, 1).
    //
    // Expect
    // ------
    // - [2, 2, 2.5, 3].
    fn dual_output_is_weighted_average_of_lagged_head_and_tail() {
        let tail = Level::new();
        let model = CompositeModel::dual(&Ramp, &tail, &LinearLag, 1.0, 1.0).unwrap();
        assert_eq!(model.n_params(), 3);
        let out = model.simulate(array![1.0, 1.0, 4.0].view(), &forcing(4)).unwrap();
        assert_eq!(out, array![2.0, 2.0, 2.5, 3.0]);
    }

    #[test]
    // Purpose
    // -------
    // Parameter blocks follow `[head.., delay, tail..]`; wrong lengths error.
    fn split_follows_layout() {
        let tail = Level::new();
        let model = CompositeModel::dual(&Ramp, &tail, &LinearLag, 2.0, 1.0).unwrap();
        let p = array![1.0, 0.5, 3.0];
        let blocks = model.split(p.view()).unwrap();
        assert_eq!(blocks.head, array![1.0]);
        assert_eq!(blocks.delay, Some(0.5));
        assert_eq!(blocks.tail, Some(array![3.0].view()));
        assert_eq!(
            model.split(array![1.0].view()).unwrap_err(),
            ModelError::ParamLengthMismatch { expected: 3, actual: 1 }
        );
    }

    #[test]
    // Purpose
    // -------
    // Area weights must be finite, non-negative, and not both zero.
    fn dual_validates_areas() {
        let tail = Level::new();
        assert!(matches!(
            CompositeModel::dual(&Ramp, &tail, &LinearLag, -1.0, 1.0),
            Err(ModelError::InvalidArea { which: "head", .. })
        ));
        assert_eq!(
            CompositeModel::dual(&Ramp, &tail, &LinearLag, 0.0, 0.0).err(),
            Some(ModelError::ZeroTotalArea)
        );
    }
}
