//! Generational search over bend placements.
//!
//! The optimizer owns a population of specimens (bend map + realized
//! geometry), a seeded RNG, and a specimen id sequence; every stochastic
//! decision flows through the injected generator, so equal seeds replay
//! identical runs. Specimen grading and construction are embarrassingly
//! parallel and fan out through rayon, with results assembled in index
//! order to keep runs reproducible.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::config::{CostWeights, OptimizerSettings};
use crate::cost::{BendMap, CostBreakdown, CostEngine};
use crate::errors::{LayoutError, LayoutResult};
use crate::layout::TreeLayout;
use crate::util::search::merged;

/// Bend fractions are sampled and kept inside this band; cuts too close to
/// either branch end degenerate into the unbent layout.
const FRACTION_LO: f64 = 0.1;
const FRACTION_HI: f64 = 0.9;

/// Step size of the ±perturbation applied to inherited bend fractions.
const PERTURBATION: f64 = 0.05;

/// One candidate layout in the population.
#[derive(Debug)]
pub struct Specimen {
    /// Generation-unique id from the optimizer-owned sequence.
    pub id: u64,
    /// Bend placements this specimen realizes.
    pub bends: BendMap,
    /// Geometry realized by applying `bends` to the base diagram.
    pub engine: CostEngine,
    cost: Option<CostBreakdown>,
}

impl Specimen {
    /// Cached cost; present once the specimen has been graded.
    pub fn cost(&self) -> Option<&CostBreakdown> {
        self.cost.as_ref()
    }
}

/// Observer of the optimizer's per-generation phases.
///
/// Purely for observability: observers see the population but cannot affect
/// the outcome. All methods default to no-ops.
pub trait PhaseObserver {
    fn after_grade(&mut self, _population: &[Specimen]) {}
    fn after_select(&mut self, _population: &[Specimen]) {}
    fn after_breed(&mut self, _population: &[Specimen]) {}
}

/// The do-nothing observer.
pub struct NoopObserver;

impl PhaseObserver for NoopObserver {}

/// Population-based search for low-cost bend placements.
pub struct Optimizer {
    base: TreeLayout,
    weights: CostWeights,
    settings: OptimizerSettings,
    eligible: Vec<String>,
    population: Vec<Specimen>,
    rng: Pcg32,
    specimen_seq: u64,
}

impl Optimizer {
    /// Create an optimizer with a randomly initialized population.
    #[instrument(level = "debug", skip(base), fields(population = settings.population_size))]
    pub fn new(
        base: TreeLayout,
        weights: CostWeights,
        settings: OptimizerSettings,
    ) -> LayoutResult<Self> {
        if settings.population_size == 0 {
            return Err(LayoutError::InvalidSettings(
                "population_size must be positive".to_string(),
            ));
        }
        for (label, p) in [
            ("mutation_prob", settings.mutation_prob),
            ("branch_prob", settings.branch_prob),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(LayoutError::InvalidSettings(format!(
                    "{label} must lie in [0, 1], got {p}"
                )));
            }
        }

        let eligible = base.arena().visible_names();
        let mut optimizer = Self {
            base,
            weights,
            settings,
            eligible,
            population: Vec::new(),
            rng: Pcg32::seed_from_u64(settings.seed),
            specimen_seq: 0,
        };

        let maps: Vec<BendMap> = (0..settings.population_size)
            .map(|_| optimizer.random_bend_map())
            .collect();
        optimizer.population = optimizer.build_specimens(maps)?;
        Ok(optimizer)
    }

    pub fn population(&self) -> &[Specimen] {
        &self.population
    }

    /// Minimum-cost specimen among the graded population.
    pub fn best(&self) -> Option<&Specimen> {
        self.population
            .iter()
            .filter(|s| s.cost.is_some())
            .min_by(|a, b| {
                let ca = a.cost.map(|c| c.total).unwrap_or(f64::INFINITY);
                let cb = b.cost.map(|c| c.total).unwrap_or(f64::INFINITY);
                ca.total_cmp(&cb)
            })
    }

    /// Run up to `generations` grade → select → breed cycles.
    ///
    /// After each cycle `step_cb` receives the generation index and the
    /// population's cost totals; returning `false` stops early. The observer
    /// fires between phases.
    #[instrument(level = "debug", skip(self, step_cb, observer))]
    pub fn learn<F>(
        &mut self,
        generations: usize,
        mut step_cb: F,
        observer: &mut dyn PhaseObserver,
    ) -> LayoutResult<()>
    where
        F: FnMut(usize, &[f64]) -> bool,
    {
        for generation in 0..generations {
            self.step(observer)?;

            let costs: Vec<f64> = self
                .population
                .iter()
                .map(|s| s.cost.map(|c| c.total).unwrap_or(f64::INFINITY))
                .collect();
            let best = costs.iter().cloned().fold(f64::INFINITY, f64::min);
            debug!(generation, best, "generation complete");

            if !step_cb(generation, &costs) {
                debug!(generation, "stopped early by step callback");
                break;
            }
        }
        Ok(())
    }

    /// One full generation: grade, select, breed, re-grade.
    fn step(&mut self, observer: &mut dyn PhaseObserver) -> LayoutResult<()> {
        self.grade()?;
        observer.after_grade(&self.population);

        self.select();
        observer.after_select(&self.population);

        self.breed()?;
        observer.after_breed(&self.population);

        self.grade()
    }

    /// Compute and cache the cost of every ungraded specimen.
    fn grade(&mut self) -> LayoutResult<()> {
        let weights = self.weights;
        let graded: Vec<Option<LayoutResult<CostBreakdown>>> = self
            .population
            .par_iter()
            .map(|s| match s.cost {
                Some(_) => None,
                None => Some(s.engine.cost(&weights)),
            })
            .collect();

        for (specimen, result) in self.population.iter_mut().zip(graded) {
            if let Some(result) = result {
                specimen.cost = Some(result?);
            }
        }
        Ok(())
    }

    /// Fitness-proportionate stochastic culling.
    ///
    /// A specimen survives a draw `u ∈ [0,1)` iff `cost < u · max_cost`, so
    /// expensive layouts are disproportionately likely to drop while cheap
    /// ones may still die — the escape hatch out of local optima. The
    /// minimum-cost specimen is exempt (elitism), so the population never
    /// collapses to empty.
    fn select(&mut self) {
        let totals: Vec<f64> = self
            .population
            .iter()
            .map(|s| s.cost.map(|c| c.total).unwrap_or(f64::INFINITY))
            .collect();
        let max_cost = totals.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let best_idx = totals
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);

        let draws: Vec<f64> = (0..self.population.len())
            .map(|_| self.rng.random::<f64>())
            .collect();

        let before = self.population.len();
        let mut index = 0;
        self.population.retain(|_| {
            let keep = index == best_idx || totals[index] < draws[index] * max_cost;
            index += 1;
            keep
        });
        debug!(
            survivors = self.population.len(),
            culled = before - self.population.len(),
            "selection complete"
        );
    }

    /// Refill the population by recombining survivor bend maps.
    fn breed(&mut self) -> LayoutResult<()> {
        let missing = self
            .settings
            .population_size
            .saturating_sub(self.population.len());
        if missing == 0 {
            return Ok(());
        }

        let maps: Vec<BendMap> = (0..missing).map(|_| self.child_bend_map()).collect();
        let children = self.build_specimens(maps)?;
        self.population.extend(children);
        Ok(())
    }

    /// Sample a fresh bend map: each eligible node independently with
    /// probability `mutation_prob`, fractions uniform in the working band.
    fn random_bend_map(&mut self) -> BendMap {
        let mut bends = BendMap::new();
        for name in &self.eligible {
            if self.rng.random::<f64>() < self.settings.mutation_prob {
                bends.insert(name.clone(), self.rng.random_range(FRACTION_LO..FRACTION_HI));
            }
        }
        bends
    }

    /// Crossover plus mutation of two survivor bend maps.
    fn child_bend_map(&mut self) -> BendMap {
        let (first, second) = self.pick_parents();

        // Each parent's keys are inherited independently with p = 0.5; on
        // collision the second parent's entry wins.
        let mut from_first = BendMap::new();
        for (name, &fraction) in &self.population[first].bends {
            if self.rng.random::<f64>() < 0.5 {
                from_first.insert(name.clone(), fraction);
            }
        }
        let mut from_second = BendMap::new();
        for (name, &fraction) in &self.population[second].bends {
            if self.rng.random::<f64>() < 0.5 {
                from_second.insert(name.clone(), fraction);
            }
        }
        let mut child = merged(from_first, from_second);

        // Perturb inherited fractions.
        for fraction in child.values_mut() {
            if self.rng.random::<f64>() < self.settings.mutation_prob {
                let delta = if self.rng.random::<bool>() {
                    PERTURBATION
                } else {
                    -PERTURBATION
                };
                *fraction = (*fraction + delta).clamp(FRACTION_LO, FRACTION_HI);
            }
        }

        // Occasionally drop one bend.
        if self.rng.random::<f64>() < self.settings.branch_prob && !child.is_empty() {
            let victim = self.rng.random_range(0..child.len());
            if let Some(name) = child.keys().nth(victim).cloned() {
                child.remove(&name);
            }
        }

        // And occasionally bend one more node.
        if self.rng.random::<f64>() < self.settings.branch_prob {
            let candidates: Vec<&String> = self
                .eligible
                .iter()
                .filter(|name| !child.contains_key(*name))
                .collect();
            if !candidates.is_empty() {
                let pick = self.rng.random_range(0..candidates.len());
                child.insert(
                    candidates[pick].clone(),
                    self.rng.random_range(FRACTION_LO..FRACTION_HI),
                );
            }
        }

        child
    }

    /// Two distinct survivors chosen uniformly; a lone survivor pairs with
    /// itself.
    fn pick_parents(&mut self) -> (usize, usize) {
        let len = self.population.len();
        if len <= 1 {
            return (0, 0);
        }
        let first = self.rng.random_range(0..len);
        let mut second = self.rng.random_range(0..len);
        while second == first {
            second = self.rng.random_range(0..len);
        }
        (first, second)
    }

    /// Realize bend maps as specimens: ids are assigned sequentially, the
    /// engines are built in parallel and reassembled in index order.
    fn build_specimens(&mut self, maps: Vec<BendMap>) -> LayoutResult<Vec<Specimen>> {
        let ids: Vec<u64> = maps
            .iter()
            .map(|_| {
                let id = self.specimen_seq;
                self.specimen_seq += 1;
                id
            })
            .collect();

        let base = &self.base;
        let engines: Vec<LayoutResult<CostEngine>> = maps
            .par_iter()
            .map(|bends| {
                let mut engine = CostEngine::new(base.clone());
                engine.introduce_breaks(bends)?;
                Ok(engine)
            })
            .collect();

        let mut specimens = Vec::with_capacity(maps.len());
        for ((id, bends), engine) in ids.into_iter().zip(maps).zip(engines) {
            specimens.push(Specimen {
                id,
                bends,
                engine: engine?,
                cost: None,
            });
        }
        Ok(specimens)
    }
}
