//! GR4J — four-parameter daily lumped rainfall-runoff model.
//!
//! Purpose
//! -------
//! Provide a concrete [`Simulator`] for sub-basin calibration. Each run starts
//! from the same initial state, so the model is a pure function of its
//! parameters and forcing.
//!
//! Parameters
//! ----------
//! - `x1` (> 0): production store capacity.
//! - `x2`: groundwater exchange coefficient (any sign).
//! - `x3` (> 0): routing store capacity.
//! - `x4` (> 0): unit hydrograph time base.
//!
//! Structure per timestep
//! ----------------------
//! 1. Net rainfall / net evaporation against the production store.
//! 2. Percolation leakage from the production store.
//! 3. Routing input split 90/10 between unit hydrographs UH1 and UH2.
//! 4. Groundwater exchange `F = x2 (R/x3)^(7/2)`.
//! 5. Non-linear routing store outflow plus the direct branch.
//!
//! Invalid parameters (`x1`, `x3` or `x4` non-positive, or any non-finite)
//! return an all-`+inf` series so the likelihood rejects the draw.
use crate::models::{forcing::Forcing, simulator::Simulator};
use ndarray::{Array1, ArrayView1};

/// Exponent of the unit-hydrograph S-curves.
const S_CURVE_EXPONENT: f64 = 2.5;

/// Exponent of the groundwater exchange term.
const EXCHANGE_EXPONENT: f64 = 3.5;

/// Share of routed rainfall sent through UH1 and the routing store.
const ROUTED_SHARE: f64 = 0.9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Gr4j;

impl Gr4j {
    pub const N_PARAMS: usize = 4;

    pub fn new() -> Self {
        Gr4j
    }
}

impl Simulator for Gr4j {
    fn n_params(&self) -> usize {
        Self::N_PARAMS
    }

    fn run(&self, params: ArrayView1<f64>, forcing: &Forcing) -> Array1<f64> {
        let n = forcing.len();
        let Some(x) = Gr4jParams::from_view(params) else {
            return Array1::from_elem(n, f64::INFINITY);
        };
        let mut state = Gr4jState::new(&x);
        let p = forcing.precipitation();
        let e = forcing.potential_evapotranspiration();
        Array1::from_iter((0..n).map(|t| state.step(&x, p[t], e[t])))
    }
}

// ---- Parameters and state ----

struct Gr4jParams {
    x1: f64,
    x2: f64,
    x3: f64,
    x4: f64,
}

impl Gr4jParams {
    fn from_view(params: ArrayView1<f64>) -> Option<Self> {
        if params.len() < Gr4j::N_PARAMS || params.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let (x1, x2, x3, x4) = (params[0], params[1], params[2], params[3]);
        if x1 <= 0.0 || x3 <= 0.0 || x4 <= 0.0 {
            return None;
        }
        Some(Self { x1, x2, x3, x4 })
    }
}

struct Gr4jState {
    production: f64,
    routing: f64,
    /// UH1 ordinates (length ⌊x4⌋ + 1).
    uh1: Vec<f64>,
    /// UH2 ordinates (length ⌊2·x4⌋ + 1).
    uh2: Vec<f64>,
    /// Past routing inputs, most recent first (length ⌊2·x4⌋).
    history: Vec<f64>,
}

impl Gr4jState {
    fn new(x: &Gr4jParams) -> Self {
        let l = x.x4.floor() as usize + 1;
        let m = (2.0 * x.x4).floor() as usize + 1;
        let uh1 = (1..=l).map(|j| s_curve1(j as f64, x.x4) - s_curve1(j as f64 - 1.0, x.x4)).collect();
        let uh2 = (1..=m).map(|j| s_curve2(j as f64, x.x4) - s_curve2(j as f64 - 1.0, x.x4)).collect();
        Self {
            production: 0.5 * x.x1,
            routing: 0.5 * x.x3,
            uh1,
            uh2,
            history: vec![0.0; m - 1],
        }
    }

    fn step(&mut self, x: &Gr4jParams, p: f64, e: f64) -> f64 {
        let x1 = x.x1;

        // Production store.
        let (pn, ps) = if p > e {
            let pn = p - e;
            let ratio = self.production / x1;
            let th = (pn / x1).tanh();
            let ps = x1 * (1.0 - ratio * ratio) * th / (1.0 + ratio * th);
            self.production += ps;
            (pn, ps)
        } else {
            if p < e {
                let en = e - p;
                let ratio = self.production / x1;
                let th = (en / x1).tanh();
                let es = self.production * (2.0 - ratio) * th / (1.0 + (1.0 - ratio) * th);
                self.production = (self.production - es).max(0.0);
            }
            (0.0, 0.0)
        };

        // Percolation.
        let r = 4.0 * self.production / (9.0 * x1);
        let perc = self.production * (1.0 - (1.0 + r.powi(4)).powf(-0.25));
        self.production -= perc;
        let pr = perc + pn - ps;

        // Unit hydrograph convolution.
        let mut q9 = 0.0;
        let mut q1 = 0.0;
        for (i, &w2) in self.uh2.iter().enumerate() {
            let pr_i = if i == 0 { pr } else { self.history[i - 1] };
            if let Some(w1) = self.uh1.get(i) {
                q9 += w1 * pr_i;
            }
            q1 += w2 * pr_i;
        }
        q9 *= ROUTED_SHARE;
        q1 *= 1.0 - ROUTED_SHARE;

        // Exchange and routing store.
        let exchange = x.x2 * (self.routing / x.x3).powf(EXCHANGE_EXPONENT);
        self.routing = (self.routing + q9 + exchange).max(0.0);
        let rr = self.routing / x.x3;
        let qr = self.routing * (1.0 - (1.0 + rr.powi(4)).powf(-0.25));
        self.routing -= qr;
        let qd = (q1 + exchange).max(0.0);

        if !self.history.is_empty() {
            self.history.rotate_right(1);
            self.history[0] = pr;
        }

        qr + qd
    }
}

fn s_curve1(t: f64, x4: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else if t < x4 {
        (t / x4).powf(S_CURVE_EXPONENT)
    } else {
        1.0
    }
}

fn s_curve2(t: f64, x4: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else if t < x4 {
        0.5 * (t / x4).powf(S_CURVE_EXPONENT)
    } else if t < 2.0 * x4 {
        1.0 - 0.5 * (2.0 - t / x4).powf(S_CURVE_EXPONENT)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Invalid parameter handling (`+inf` series).
    // - Unit hydrograph normalization.
    // - Output shape, finiteness and purity across repeated runs.
    // -------------------------------------------------------------------------

    fn rainy_forcing(n: usize) -> Forcing {
        let p = Array1::from_iter((0..n).map(|t| if t % 7 < 2 { 12.0 } else { 0.0 }));
        let e = Array1::from_elem(n, 2.5);
        Forcing::new(p, e).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Non-positive capacities or time base produce an all-`+inf` series.
    fn invalid_parameters_yield_infinite_series() {
        let forcing = rainy_forcing(20);
        for bad in [
            array![0.0, 0.0, 50.0, 2.0],
            array![300.0, 0.0, -1.0, 2.0],
            array![300.0, 0.0, 50.0, 0.0],
            array![300.0, f64::NAN, 50.0, 2.0],
        ] {
            let q = Gr4j.run(bad.view(), &forcing);
            assert_eq!(q.len(), 20);
            assert!(q.iter().all(|v| *v == f64::INFINITY));
        }
    }

    #[test]
    // Purpose
    // -------
    // Both unit hydrographs distribute exactly one unit of input.
    //
    // Given
    // -----
    // - x4 = 2.7 (non-integer time base).
    fn unit_hydrographs_sum_to_one() {
        let x = Gr4jParams { x1: 300.0, x2: 0.0, x3: 50.0, x4: 2.7 };
        let state = Gr4jState::new(&x);
        assert_eq!(state.uh1.len(), 3);
        assert_eq!(state.uh2.len(), 6);
        assert!((state.uh1.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((state.uh2.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // A valid run is finite, non-negative, and identical when repeated.
    fn valid_run_is_finite_and_pure() {
        let forcing = rainy_forcing(365);
        let theta = array![320.0, -0.5, 70.0, 1.8];
        let q1 = Gr4j.run(theta.view(), &forcing);
        let q2 = Gr4j.run(theta.view(), &forcing);
        assert_eq!(q1.len(), 365);
        assert!(q1.iter().all(|v| v.is_finite() && *v >= 0.0));
        assert!(q1.sum() > 0.0);
        assert_eq!(q1, q2);
    }

    #[test]
    // Purpose
    // -------
    // Without rain the flow recedes once the unit hydrographs have emptied.
    fn dry_forcing_recedes() {
        let forcing = Forcing::new(Array1::zeros(60), Array1::from_elem(60, 1.0)).unwrap();
        let q = Gr4j.run(array![250.0, 0.0, 40.0, 1.5].view(), &forcing);
        for t in 10..59 {
            assert!(q[t + 1] <= q[t] + 1e-12, "t = {t}");
        }
    }
}
