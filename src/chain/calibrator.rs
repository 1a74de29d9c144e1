//! Forward pass, backward pass and smoothing along a linear chain.
//!
//! Every calibration step builds a [`LogPosterior`], starts the sampler at
//! the prior modes (optionally MAP-refined) and records a [`NodeReport`].
//! The forward stream is seeded with `ChainConfig::seed`; the backward
//! stream is the same seed advanced by `long_jump()`, so the two passes
//! never share draws and each is reproducible on its own.
use crate::{
    calibration::{
        driver::{Calibration, calibrate, refine_start},
        ensemble::Ensemble,
        errors::CalibrationError,
        likelihood::{LikelihoodConfig, LogPosterior},
    },
    chain::{
        config::ChainConfig,
        data::{ChainInputs, NodeData},
        errors::{ChainError, ChainResult},
        report::{ChainOutcome, NodeReport, SmoothedNode, StepKind},
        store::{Direction, EnsembleStore},
    },
    density::{
        distribution::Density,
        priors::{prior_modes, proposal_steps},
    },
    models::{
        composite::CompositeModel,
        forcing::Forcing,
        simulator::{Delay, Simulator},
    },
};
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::{debug, info, warn};

/// `ChainCalibrator` — hierarchical calibration of `N` nested sub-basins.
///
/// Every node runs the same `simulator`; dual models couple the accumulated
/// upstream model (head) and the local model (tail) through `delay`.
///
/// Invariants
/// ----------
/// - The sampled parameter vector is at most `2·p + 1` long for a `p`
///   parameter simulator, whatever the chain length: dual posteriors are
///   reduced to single models before they become head priors.
/// - Each pass writes exactly one ensemble per node into the store.
pub struct ChainCalibrator<'s> {
    config: ChainConfig,
    simulator: &'s dyn Simulator,
    delay: &'s dyn Delay,
}

impl<'s> ChainCalibrator<'s> {
    /// # Errors
    /// - Any [`ChainConfig::validate`] error.
    /// - [`ChainError::BoundsLengthMismatch`] if head or tail bounds do not
    ///   match `simulator.n_params()`.
    pub fn new(
        config: ChainConfig, simulator: &'s dyn Simulator, delay: &'s dyn Delay,
    ) -> ChainResult<Self> {
        config.validate()?;
        config.bounds.check_len(simulator.n_params())?;
        Ok(Self { config, simulator, delay })
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Forward pass then backward pass then smoothing.
    pub fn run(&self, inputs: &ChainInputs) -> ChainResult<ChainOutcome> {
        let mut store = EnsembleStore::new();
        let forward = self.forward(inputs, &mut store)?;
        let backward = self.backward(inputs, &mut store)?;
        let smoothed = self.smooth(&mut store)?;
        Ok(ChainOutcome { forward, backward, smoothed })
    }

    /// Downstream pass: node 0 alone, then one dual model per node with the
    /// previous node's (reduced) posterior as head prior.
    ///
    /// # Errors
    /// - Input validation errors from [`ChainInputs::check`].
    /// - [`ChainError::Node`] for any failing calibration step.
    /// - [`ChainError::DuplicateEnsemble`] if `store` already holds a
    ///   forward ensemble for some node.
    pub fn forward(
        &self, inputs: &ChainInputs, store: &mut EnsembleStore,
    ) -> ChainResult<Vec<NodeReport>> {
        inputs.check(&self.config)?;
        let direction = Direction::Forward;
        let forcing = &inputs.forcing;
        let last = self.config.n_nodes - 1;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);
        let mut head_prior = self.config.bounds.flat_head()?;
        let mut reports = Vec::with_capacity(2 * self.config.n_nodes);

        for (node, data) in inputs.nodes.iter().enumerate() {
            let likelihood = self.observed(node, direction, data)?;
            let head = std::mem::take(&mut head_prior);
            let (kind, model, priors) = if node == 0 {
                (StepKind::Single, CompositeModel::single(self.simulator), head)
            } else {
                (StepKind::Dual, self.dual(node)?, self.dual_priors(head)?)
            };
            let (cal, report) =
                self.step(node, direction, kind, likelihood, priors, model, forcing, &mut rng)?;
            reports.push(report);

            if node < last {
                let samples = if node == 0 {
                    cal.samples
                } else {
                    let (reduced, report) =
                        self.reduce(node, direction, &cal.ensemble, forcing, &mut rng)?;
                    reports.push(report);
                    reduced.samples
                };
                head_prior = kde_priors(node, direction, &samples)?;
            }
            store.insert(node, direction, cal.ensemble)?;
        }
        Ok(reports)
    }

    /// Upstream pass from node `N-1` down to node 0.
    ///
    /// Nodes `N-1` and `N-2` are first calibrated directly on their
    /// observations; the first gives node `N-1`'s backward ensemble, the
    /// second the first head prior. Each dual step at node `i` then targets
    /// node `i`'s backward ensemble and re-runs the head block of every draw
    /// to get node `i-1`'s ensemble, reduced unless `i-1` is the source.
    ///
    /// # Errors
    /// Same as [`ChainCalibrator::forward`], for backward ensembles.
    pub fn backward(
        &self, inputs: &ChainInputs, store: &mut EnsembleStore,
    ) -> ChainResult<Vec<NodeReport>> {
        inputs.check(&self.config)?;
        let direction = Direction::Backward;
        let forcing = &inputs.forcing;
        let last = self.config.n_nodes - 1;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);
        rng.long_jump();
        let mut reports = Vec::with_capacity(2 * self.config.n_nodes);

        let (outlet, report) = self.single_on_observations(last, inputs, &mut rng)?;
        reports.push(report);
        if last == 0 {
            store.insert(0, direction, outlet.ensemble)?;
            return Ok(reports);
        }
        let mut target = outlet.ensemble.stats().map_err(ChainError::at(last, direction))?;
        store.insert(last, direction, outlet.ensemble)?;

        let (neighbour, report) = self.single_on_observations(last - 1, inputs, &mut rng)?;
        reports.push(report);
        let mut head_prior = kde_priors(last - 1, direction, &neighbour.samples)?;

        for node in (1..=last).rev() {
            let likelihood = LikelihoodConfig::from_stats(&target, self.config.warmup)
                .map_err(ChainError::at(node, direction))?;
            let model = self.dual(node)?;
            let priors = self.dual_priors(std::mem::take(&mut head_prior))?;
            let (cal, report) = self.step(
                node,
                direction,
                StepKind::Dual,
                likelihood,
                priors,
                model,
                forcing,
                &mut rng,
            )?;
            reports.push(report);

            let upstream = node - 1;
            let ensemble = head_ensemble(&model, &cal.samples, forcing)
                .map_err(ChainError::at(upstream, direction))?;
            if upstream == 0 {
                store.insert(0, direction, ensemble)?;
                continue;
            }
            let (reduced, report) = self.reduce(upstream, direction, &ensemble, forcing, &mut rng)?;
            reports.push(report);
            target = reduced.ensemble.stats().map_err(ChainError::at(upstream, direction))?;
            head_prior = kde_priors(upstream, direction, &reduced.samples)?;
            store.insert(upstream, direction, reduced.ensemble)?;
        }
        Ok(reports)
    }

    /// Pool the forward and backward ensembles of every node.
    ///
    /// Both ensembles are removed from `store`.
    ///
    /// # Errors
    /// - [`ChainError::MissingEnsemble`] if a pass did not run.
    /// - [`ChainError::Smoothing`] if pooling or the statistics fail.
    pub fn smooth(&self, store: &mut EnsembleStore) -> ChainResult<Vec<SmoothedNode>> {
        (0..self.config.n_nodes)
            .map(|node| -> ChainResult<SmoothedNode> {
                let forward = store.take(node, Direction::Forward)?;
                let backward = store.take(node, Direction::Backward)?;
                let smoothing = |source| ChainError::Smoothing { node, source };
                let pooled = Ensemble::pool(&[&forward, &backward]).map_err(smoothing)?;
                let stats = pooled.stats().map_err(smoothing)?;
                debug!(node, members = pooled.n_members(), "smoothed");
                Ok(SmoothedNode {
                    node,
                    mean: stats.mean,
                    std: stats.std,
                    n_members: pooled.n_members(),
                })
            })
            .collect()
    }

    fn observed(
        &self, node: usize, direction: Direction, data: &NodeData,
    ) -> ChainResult<LikelihoodConfig> {
        LikelihoodConfig::new(
            data.observations.clone(),
            data.uncertainty.clone(),
            self.config.warmup,
        )
        .map_err(ChainError::at(node, direction))
    }

    fn single_on_observations(
        &self, node: usize, inputs: &ChainInputs, rng: &mut Xoshiro256PlusPlus,
    ) -> ChainResult<(Calibration, NodeReport)> {
        let direction = Direction::Backward;
        let likelihood = self.observed(node, direction, &inputs.nodes[node])?;
        self.step(
            node,
            direction,
            StepKind::Single,
            likelihood,
            self.config.bounds.flat_head()?,
            CompositeModel::single(self.simulator),
            &inputs.forcing,
            rng,
        )
    }

    /// Refit a single model against the mean and spread of `ensemble`.
    fn reduce(
        &self, node: usize, direction: Direction, ensemble: &Ensemble, forcing: &Forcing,
        rng: &mut Xoshiro256PlusPlus,
    ) -> ChainResult<(Calibration, NodeReport)> {
        let stats = ensemble.stats().map_err(ChainError::at(node, direction))?;
        let likelihood = LikelihoodConfig::from_stats(&stats, self.config.warmup)
            .map_err(ChainError::at(node, direction))?;
        self.step(
            node,
            direction,
            StepKind::Reduction,
            likelihood,
            self.config.bounds.flat_head()?,
            CompositeModel::single(self.simulator),
            forcing,
            rng,
        )
    }

    fn dual(&self, node: usize) -> ChainResult<CompositeModel<'s>> {
        let areas = self.config.areas[node];
        Ok(CompositeModel::dual(
            self.simulator,
            self.simulator,
            self.delay,
            areas.head,
            areas.tail,
        )?)
    }

    /// `head ++ [delay] ++ tail` priors of a dual model.
    fn dual_priors(&self, head: Vec<Density>) -> ChainResult<Vec<Density>> {
        let mut priors = head;
        priors.push(self.config.bounds.flat_delay()?);
        priors.extend(self.config.bounds.flat_tail()?);
        Ok(priors)
    }

    #[allow(clippy::too_many_arguments)]
    fn step(
        &self, node: usize, direction: Direction, kind: StepKind, likelihood: LikelihoodConfig,
        priors: Vec<Density>, model: CompositeModel<'_>, forcing: &Forcing,
        rng: &mut Xoshiro256PlusPlus,
    ) -> ChainResult<(Calibration, NodeReport)> {
        let at = ChainError::at(node, direction);
        let observed = likelihood.observed_count();
        if observed == 0 {
            warn!(node, %direction, ?kind, "no observations in likelihood window; posterior is the prior");
        }
        let posterior = LogPosterior::new(likelihood, priors, model).map_err(&at)?;
        let mut x0 = prior_modes(posterior.priors());
        if let Some(opts) = &self.config.map_refinement {
            x0 = refine_start(&posterior, forcing, &x0, opts);
        }
        let steps = proposal_steps(posterior.priors(), self.config.sampler.proposal_scale);
        let cal = calibrate(&posterior, forcing, &x0, &steps, &self.config.sampler, rng)
            .map_err(&at)?;
        info!(
            node,
            %direction,
            ?kind,
            acceptance = cal.acceptance_rate,
            observed,
            "calibration step finished"
        );
        let report = NodeReport {
            node,
            direction,
            kind,
            samples: cal.samples.clone(),
            acceptance_rate: cal.acceptance_rate,
            observed,
            empty_window: observed == 0,
        };
        Ok((cal, report))
    }
}

/// One kernel density per parameter column of the draws made at `node`.
fn kde_priors(
    node: usize, direction: Direction, samples: &Array2<f64>,
) -> ChainResult<Vec<Density>> {
    let at = ChainError::at(node, direction);
    samples
        .axis_iter(Axis(1))
        .map(|column| Density::from_samples(&column.to_vec()).map_err(|e| at(e.into())))
        .collect()
}

/// Head-simulator output of every draw, as an ensemble.
fn head_ensemble(
    model: &CompositeModel<'_>, samples: &Array2<f64>, forcing: &Forcing,
) -> Result<Ensemble, CalibrationError> {
    let rows = samples
        .rows()
        .into_iter()
        .map(|theta| model.simulate_head(theta, forcing))
        .collect::<Result<Vec<Array1<f64>>, _>>()?;
    Ensemble::from_rows(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        calibration::sampler::SamplerOptions,
        chain::config::ParameterBounds,
        density::errors::DensityError,
        models::lag::LinearLag,
    };
    use ndarray::{ArrayView1, array};

    /// Constant series equal to the only parameter.
    struct Level;

    impl Simulator for Level {
        fn n_params(&self) -> usize {
            1
        }

        fn run(&self, params: ArrayView1<f64>, forcing: &Forcing) -> Array1<f64> {
            Array1::from_elem(forcing.len(), params[0])
        }
    }

    fn config(n_nodes: usize) -> ChainConfig {
        let sampler = SamplerOptions::new(200, 200, 0.1, true, 1).unwrap();
        let bounds = ParameterBounds::shared(vec![(0.0, 10.0)], (0.0, 2.0)).unwrap();
        ChainConfig::new(n_nodes, 2, sampler, bounds, 11).unwrap()
    }

    fn inputs(levels: &[f64], len: usize) -> ChainInputs {
        let forcing = Forcing::new(Array1::ones(len), Array1::zeros(len)).unwrap();
        let nodes = levels
            .iter()
            .map(|&q| NodeData::with_constant_uncertainty(Array1::from_elem(len, q), 0.2))
            .collect();
        ChainInputs::new(forcing, nodes).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Each pass records one ensemble per node; smoothing pools both.
    //
    // Given
    // -----
    // - A 3-node chain of constant-level simulators.
    //
    // Expect
    // ------
    // - Forward: single, dual + reduction, dual (last node not reduced).
    // - Backward: two singles, dual + reduction, dual.
    // - Smoothed nodes carry forward + backward members.
    fn passes_fill_the_store_once_per_node() {
        let chain = ChainCalibrator::new(config(3), &Level, &LinearLag).unwrap();
        let data = inputs(&[3.0, 4.0, 5.0], 20);
        let mut store = EnsembleStore::new();

        let forward = chain.forward(&data, &mut store).unwrap();
        let kinds: Vec<_> = forward.iter().map(|r| (r.node, r.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (0, StepKind::Single),
                (1, StepKind::Dual),
                (1, StepKind::Reduction),
                (2, StepKind::Dual)
            ]
        );

        let backward = chain.backward(&data, &mut store).unwrap();
        let kinds: Vec<_> = backward.iter().map(|r| (r.node, r.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (2, StepKind::Single),
                (1, StepKind::Single),
                (2, StepKind::Dual),
                (1, StepKind::Reduction),
                (1, StepKind::Dual)
            ]
        );
        assert_eq!(store.len(), 6);
        for report in forward.iter().chain(&backward) {
            let expected = if report.kind == StepKind::Dual { 3 } else { 1 };
            assert_eq!(report.samples.ncols(), expected);
        }

        let smoothed = chain.smooth(&mut store).unwrap();
        assert!(store.is_empty());
        assert_eq!(smoothed.len(), 3);
        for node in &smoothed {
            assert_eq!(node.n_members, 400);
            assert_eq!(node.mean.len(), 20);
            assert!(node.std.iter().all(|&s| s > 0.0));
        }
    }

    #[test]
    // Purpose
    // -------
    // A second pass into the same store is refused.
    fn rerunning_a_pass_into_the_same_store_fails() {
        let chain = ChainCalibrator::new(config(1), &Level, &LinearLag).unwrap();
        let data = inputs(&[3.0], 10);
        let mut store = EnsembleStore::new();
        chain.forward(&data, &mut store).unwrap();
        assert_eq!(
            chain.forward(&data, &mut store).unwrap_err(),
            ChainError::DuplicateEnsemble { node: 0, direction: Direction::Forward }
        );
    }

    #[test]
    // Purpose
    // -------
    // Failures inside a step name the node and direction.
    //
    // Given
    // -----
    // - Node 1 has a zero uncertainty at an observed timestep.
    //
    // Expect
    // ------
    // - `ChainError::Node { node: 1, direction: Forward, .. }`.
    fn step_errors_carry_node_index() {
        let chain = ChainCalibrator::new(config(2), &Level, &LinearLag).unwrap();
        let mut data = inputs(&[3.0, 4.0], 10);
        data.nodes[1].uncertainty[5] = 0.0;
        let err = chain.forward(&data, &mut EnsembleStore::new()).unwrap_err();
        assert_eq!(
            err,
            ChainError::Node {
                node: 1,
                direction: Direction::Forward,
                source: CalibrationError::InvalidUncertainty { index: 5, value: 0.0 },
            }
        );
    }

    #[test]
    // Purpose
    // -------
    // Smoothing without a backward pass reports the missing ensemble.
    fn smoothing_requires_both_passes() {
        let chain = ChainCalibrator::new(config(1), &Level, &LinearLag).unwrap();
        let mut store = EnsembleStore::new();
        chain.forward(&inputs(&[3.0], 10), &mut store).unwrap();
        assert_eq!(
            chain.smooth(&mut store).unwrap_err(),
            ChainError::MissingEnsemble { node: 0, direction: Direction::Backward }
        );
    }

    #[test]
    // Purpose
    // -------
    // Bounds must match the simulator's parameter count.
    fn new_checks_bounds_against_simulator() {
        let mut cfg = config(2);
        cfg.bounds.tail = vec![(0.0, 1.0), (0.0, 1.0)];
        assert!(matches!(
            ChainCalibrator::new(cfg, &Level, &LinearLag),
            Err(ChainError::BoundsLengthMismatch { class: "tail", expected: 1, actual: 2 })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Head ensembles re-run only the head block of each draw.
    fn head_ensemble_uses_head_parameters() {
        let model = CompositeModel::dual(&Level, &Level, &LinearLag, 1.0, 1.0).unwrap();
        let forcing = Forcing::new(Array1::ones(3), Array1::zeros(3)).unwrap();
        let samples = array![[1.0, 0.5, 9.0], [2.0, 0.0, 9.0]];
        let ensemble = head_ensemble(&model, &samples, &forcing).unwrap();
        assert_eq!(ensemble.members(), &array![[1.0, 1.0, 1.0], [2.0, 2.0, 2.0]]);
    }

    #[test]
    // Purpose
    // -------
    // Draws that cannot be turned into a kernel prior are reported against
    // the node and direction that produced them.
    //
    // Given
    // -----
    // - Two parameter columns; the second holds a NaN draw.
    //
    // Expect
    // ------
    // - `ChainError::Node { node: 2, direction: Backward }` wrapping the
    //   density error for row 1.
    fn kde_prior_errors_carry_node_index() {
        let samples = array![[1.0, 0.5], [2.0, f64::NAN], [3.0, 0.7]];
        let err = kde_priors(2, Direction::Backward, &samples).unwrap_err();
        match err {
            ChainError::Node {
                node: 2,
                direction: Direction::Backward,
                source: CalibrationError::Density(DensityError::NonFiniteSample { index: 1, value }),
            } => assert!(value.is_nan()),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(kde_priors(0, Direction::Forward, &array![[1.0], [2.0]]).unwrap().len(), 1);
    }
}
