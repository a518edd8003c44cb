//! Virus particles and their per-step stochastic behavior.

use crate::utils::check_prob;
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_distr::Bernoulli;
use std::collections::{BTreeMap, BTreeSet};

/// Resistance traits of a particle, keyed by drug name.
pub type Resistances = BTreeMap<String, bool>;

/// Set of drugs acting on a population.
pub type Drugs = BTreeSet<String>;

/// Outcome of a reproduction attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Birth<V> {
    /// The particle reproduced.
    Offspring(V),
    /// The particle does not reproduce this step.
    NoOffspring,
}

impl<V> Birth<V> {
    pub fn offspring(self) -> Option<V> {
        match self {
            Birth::Offspring(virus) => Some(virus),
            Birth::NoOffspring => None,
        }
    }

    pub fn is_offspring(&self) -> bool {
        matches!(self, Birth::Offspring(_))
    }
}

/// Capabilities a host needs from the particles it carries.
pub trait Virus: Sized {
    /// Decide whether the particle is cleared from the host this step.
    fn does_clear<R: Rng + ?Sized>(&self, rng: &mut R) -> bool;

    /// Attempt reproduction, optionally constrained by a set of active drugs.
    ///
    /// A particle must be resistant to every active drug to reproduce at all.
    fn try_reproduce<R: Rng + ?Sized>(
        &self,
        pop_density: f64,
        active_drugs: Option<&Drugs>,
        rng: &mut R,
    ) -> Birth<Self>;

    /// Get the resistance of the particle to a drug.
    fn is_resistant_to(&self, drug: &str) -> bool;

    /// Check resistance to all the given drugs (vacuously true for none).
    fn is_resistant_to_all<I, S>(&self, drugs: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        drugs
            .into_iter()
            .all(|drug| self.is_resistant_to(drug.as_ref()))
    }
}

// A negative or NaN chance never succeeds.
fn draw_birth<R: Rng + ?Sized>(max_birth_prob: f64, pop_density: f64, rng: &mut R) -> bool {
    let birth_chance = max_birth_prob * (1.0 - pop_density);
    rng.random::<f64>() < birth_chance
}

/// Virus without any drug resistance.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleVirus {
    max_birth_prob: f64,
    clear_prob: f64,
    clear_dist: Bernoulli,
}

impl SimpleVirus {
    /// Create a new virus.
    ///
    /// # Errors
    /// Returns an error if either probability lies outside `[0, 1]`.
    pub fn new(max_birth_prob: f64, clear_prob: f64) -> Result<Self> {
        check_prob(max_birth_prob).context("invalid maximum birth probability")?;
        check_prob(clear_prob).context("invalid clearance probability")?;
        let clear_dist = Bernoulli::new(clear_prob)?;
        Ok(Self {
            max_birth_prob,
            clear_prob,
            clear_dist,
        })
    }

    pub fn max_birth_prob(&self) -> f64 {
        self.max_birth_prob
    }

    pub fn clear_prob(&self) -> f64 {
        self.clear_prob
    }

    /// Returns `true` with probability `clear_prob`.
    pub fn does_clear<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        self.clear_dist.sample(rng)
    }

    /// Reproduce with probability `max_birth_prob * (1 - pop_density)`.
    ///
    /// The offspring carries the same parameters as its parent.
    pub fn reproduce<R: Rng + ?Sized>(&self, pop_density: f64, rng: &mut R) -> Birth<Self> {
        if draw_birth(self.max_birth_prob, pop_density, rng) {
            Birth::Offspring(self.clone())
        } else {
            Birth::NoOffspring
        }
    }
}

impl Virus for SimpleVirus {
    fn does_clear<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        SimpleVirus::does_clear(self, rng)
    }

    fn try_reproduce<R: Rng + ?Sized>(
        &self,
        pop_density: f64,
        active_drugs: Option<&Drugs>,
        rng: &mut R,
    ) -> Birth<Self> {
        if let Some(drugs) = active_drugs
            && !self.is_resistant_to_all(drugs)
        {
            return Birth::NoOffspring;
        }
        self.reproduce(pop_density, rng)
    }

    fn is_resistant_to(&self, _drug: &str) -> bool {
        false
    }
}

/// Virus carrying heritable drug resistance traits.
#[derive(Debug, Clone, PartialEq)]
pub struct ResistantVirus {
    base: SimpleVirus,
    resistances: Resistances,
    mut_prob: f64,
    mut_dist: Bernoulli,
}

impl ResistantVirus {
    /// Create a new resistant virus.
    ///
    /// `mut_prob` is the per-trait probability that an offspring flips
    /// a resistance inherited from this particle.
    ///
    /// # Errors
    /// Returns an error if any probability lies outside `[0, 1]`.
    pub fn new(
        max_birth_prob: f64,
        clear_prob: f64,
        resistances: Resistances,
        mut_prob: f64,
    ) -> Result<Self> {
        let base = SimpleVirus::new(max_birth_prob, clear_prob)?;
        check_prob(mut_prob).context("invalid mutation probability")?;
        let mut_dist = Bernoulli::new(mut_prob)?;
        Ok(Self {
            base,
            resistances,
            mut_prob,
            mut_dist,
        })
    }

    pub fn max_birth_prob(&self) -> f64 {
        self.base.max_birth_prob()
    }

    pub fn clear_prob(&self) -> f64 {
        self.base.clear_prob()
    }

    pub fn mut_prob(&self) -> f64 {
        self.mut_prob
    }

    pub fn resistances(&self) -> &Resistances {
        &self.resistances
    }

    pub fn resistances_mut(&mut self) -> &mut Resistances {
        &mut self.resistances
    }

    /// Returns `false` for drugs this particle carries no trait for.
    pub fn is_resistant_to(&self, drug: &str) -> bool {
        self.resistances.get(drug).copied().unwrap_or(false)
    }

    /// Reproduce under the given active drugs.
    ///
    /// Fails without drawing if the particle lacks resistance to any active drug.
    /// Otherwise reproduces with probability `max_birth_prob * (1 - pop_density)`;
    /// each trait of the offspring flips with probability `mut_prob`.
    pub fn reproduce<R: Rng + ?Sized>(
        &self,
        pop_density: f64,
        active_drugs: &Drugs,
        rng: &mut R,
    ) -> Birth<Self> {
        if !self.is_resistant_to_all(active_drugs) {
            return Birth::NoOffspring;
        }
        if !draw_birth(self.max_birth_prob(), pop_density, rng) {
            return Birth::NoOffspring;
        }

        let resistances = self
            .resistances
            .iter()
            .map(|(drug, &resistant)| (drug.clone(), resistant ^ self.mut_dist.sample(rng)))
            .collect();

        Birth::Offspring(Self {
            base: self.base.clone(),
            resistances,
            mut_prob: self.mut_prob,
            mut_dist: self.mut_dist,
        })
    }
}

impl Virus for ResistantVirus {
    fn does_clear<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        self.base.does_clear(rng)
    }

    fn try_reproduce<R: Rng + ?Sized>(
        &self,
        pop_density: f64,
        active_drugs: Option<&Drugs>,
        rng: &mut R,
    ) -> Birth<Self> {
        match active_drugs {
            Some(drugs) => self.reproduce(pop_density, drugs, rng),
            None => self.reproduce(pop_density, &Drugs::new(), rng),
        }
    }

    fn is_resistant_to(&self, drug: &str) -> bool {
        ResistantVirus::is_resistant_to(self, drug)
    }
}
