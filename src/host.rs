//! Hosts carrying a virus population.
//!
//! A [`Host`] advances its population one time step at a time:
//!
//! 1. Clearance: each particle is independently removed with its clearance probability.
//! 2. Density: the post-clearance size divided by the capacity, fixed for the rest of the step.
//! 3. Reproduction: each surviving particle attempts reproduction at that density.
//!    Offspring join the population only after the pass, so they never reproduce
//!    in the step they are born.
//!
//! A [`TreatedHost`] runs the same step while a growing set of prescribed drugs
//! suppresses reproduction of non-resistant particles.

use crate::virus::{Drugs, Virus};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;

/// Compute the population density of `n_viruses` particles in a host of capacity `max_pop`.
///
/// A host without capacity is always saturated.
pub fn population_density(n_viruses: usize, max_pop: usize) -> f64 {
    if max_pop == 0 {
        return f64::INFINITY;
    }
    n_viruses as f64 / max_pop as f64
}

/// Untreated host.
///
/// `max_pop` only scales the population density; the population may exceed it.
#[derive(Debug, Clone)]
pub struct Host<V> {
    population: Vec<V>,
    max_pop: usize,
    rng: ChaCha12Rng,
}

impl<V: Virus> Host<V> {
    /// Create a new host with a random number generator seeded from the OS.
    pub fn new(population: Vec<V>, max_pop: usize) -> Result<Self> {
        let rng = ChaCha12Rng::try_from_os_rng().context("failed to seed rng")?;
        Ok(Self::with_rng(population, max_pop, rng))
    }

    /// Create a new host drawing from the given random number generator.
    pub fn with_rng(population: Vec<V>, max_pop: usize, rng: ChaCha12Rng) -> Self {
        Self {
            population,
            max_pop,
            rng,
        }
    }

    pub fn population(&self) -> &[V] {
        &self.population
    }

    pub fn max_pop(&self) -> usize {
        self.max_pop
    }

    pub fn total_population(&self) -> usize {
        self.population.len()
    }

    /// Advance the population by one time step and return its new size.
    pub fn update(&mut self) -> usize {
        self.perform_step(None)
    }

    fn perform_step(&mut self, active_drugs: Option<&Drugs>) -> usize {
        let rng = &mut self.rng;

        // Remove cleared particles, evaluating each one exactly once.
        self.population.retain(|virus| !virus.does_clear(rng));

        let pop_density = population_density(self.population.len(), self.max_pop);

        // Collect offspring of the survivors before adding them.
        let offspring: Vec<V> = self
            .population
            .iter()
            .filter_map(|virus| {
                virus
                    .try_reproduce(pop_density, active_drugs, rng)
                    .offspring()
            })
            .collect();
        self.population.extend(offspring);

        let n_viruses = self.total_population();
        log::trace!("density {pop_density:.4}, population {n_viruses}");
        n_viruses
    }
}

/// Host under drug treatment.
#[derive(Debug, Clone)]
pub struct TreatedHost<V> {
    host: Host<V>,
    prescriptions: Drugs,
}

impl<V: Virus> TreatedHost<V> {
    /// Create a new treated host, initially without prescriptions,
    /// with a random number generator seeded from the OS.
    pub fn new(population: Vec<V>, max_pop: usize) -> Result<Self> {
        Ok(Self::from_host(Host::new(population, max_pop)?))
    }

    /// Create a new treated host drawing from the given random number generator.
    pub fn with_rng(population: Vec<V>, max_pop: usize, rng: ChaCha12Rng) -> Self {
        Self::from_host(Host::with_rng(population, max_pop, rng))
    }

    fn from_host(host: Host<V>) -> Self {
        Self {
            host,
            prescriptions: Drugs::new(),
        }
    }

    pub fn population(&self) -> &[V] {
        self.host.population()
    }

    pub fn max_pop(&self) -> usize {
        self.host.max_pop()
    }

    pub fn total_population(&self) -> usize {
        self.host.total_population()
    }

    pub fn prescriptions(&self) -> &Drugs {
        &self.prescriptions
    }

    /// Administer a drug for all subsequent steps.
    ///
    /// Returns `false` if the drug was already prescribed.
    pub fn add_prescription<S: Into<String>>(&mut self, drug: S) -> bool {
        let drug = drug.into();
        let added = self.prescriptions.insert(drug.clone());
        if added {
            log::debug!("prescribed {drug}");
        }
        added
    }

    /// Count the particles resistant to every one of `drugs`.
    pub fn resistant_population_count<S: AsRef<str>>(&self, drugs: &[S]) -> usize {
        self.population()
            .iter()
            .filter(|virus| virus.is_resistant_to_all(drugs))
            .count()
    }

    /// Advance the population by one time step under the current prescriptions
    /// and return its new size.
    pub fn update(&mut self) -> usize {
        self.host.perform_step(Some(&self.prescriptions))
    }
}
