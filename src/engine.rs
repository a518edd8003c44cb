use crate::config::Config;
use crate::host::{Host, TreatedHost};
use crate::model::{Record, Trajectory};
use crate::virus::{ResistantVirus, SimpleVirus};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rmp_serde::encode;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Simulation engine.
///
/// Holds the configuration and the random number generator of a single trial,
/// and provides methods to run trials and save their trajectories.
pub struct Engine {
    cfg: Config,
    run: usize,
    trial: usize,
    rng: ChaCha12Rng,
}

impl Engine {
    /// Create a new `Engine` for the given trial of the given run.
    ///
    /// If the configuration has a seed, the trial is seeded with a value derived
    /// from it and the run and trial indices, and from the OS otherwise.
    pub fn new(cfg: Config, run: usize, trial: usize) -> Result<Self> {
        let rng = match cfg.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(trial_seed(seed, run, trial)),
            None => ChaCha12Rng::try_from_os_rng()?,
        };
        Ok(Self {
            cfg,
            run,
            trial,
            rng,
        })
    }

    /// Run `n_trials` trials of run `run` starting at `first_trial` and save
    /// their trajectories to a binary file.
    pub fn perform_batch<P: AsRef<Path>>(
        cfg: &Config,
        run: usize,
        first_trial: usize,
        file: P,
    ) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        let n_trials = cfg.output.n_trials;
        for i_trial in 0..n_trials {
            let engine = Engine::new(cfg.clone(), run, first_trial + i_trial)
                .context("failed to construct engine")?;
            let trajectory = engine.perform_trial().context("failed to perform trial")?;

            encode::write(&mut writer, &trajectory).context("failed to serialize trajectory")?;

            let progress = 100.0 * (i_trial + 1) as f64 / n_trials as f64;
            log::info!("completed {progress:06.2}%");
        }

        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }

    /// Run the trial and return its trajectory.
    pub fn perform_trial(self) -> Result<Trajectory> {
        log::debug!("performing trial {} of run {}", self.trial, self.run);
        let records = match self.cfg.treatment {
            None => self.perform_untreated()?,
            Some(_) => self.perform_treated()?,
        };
        Ok(Trajectory {
            trial: self.trial,
            records,
        })
    }

    fn perform_untreated(&self) -> Result<Vec<Record>> {
        let model = &self.cfg.model;
        let virus = SimpleVirus::new(model.max_birth_prob, model.clear_prob)
            .context("failed to construct virus")?;
        let population = vec![virus; self.cfg.init.n_viruses];
        let mut host = Host::with_rng(population, model.max_pop, self.rng.clone());

        let records = (0..self.cfg.n_steps())
            .map(|step| Record {
                step,
                total: host.update(),
                resistant: None,
            })
            .collect();
        Ok(records)
    }

    fn perform_treated(&self) -> Result<Vec<Record>> {
        let model = &self.cfg.model;
        let treatment = self
            .cfg
            .treatment
            .as_ref()
            .context("missing treatment parameters")?;

        let virus = ResistantVirus::new(
            model.max_birth_prob,
            model.clear_prob,
            treatment.resistances.clone(),
            treatment.mut_prob,
        )
        .context("failed to construct virus")?;
        let population = vec![virus; self.cfg.init.n_viruses];
        let mut host = TreatedHost::with_rng(population, model.max_pop, self.rng.clone());

        let mut records = Vec::with_capacity(treatment.n_steps());
        for step in 0..treatment.n_steps() {
            if step == treatment.steps_before {
                for drug in &treatment.drugs {
                    host.add_prescription(drug.as_str());
                }
            }

            let total = host.update();
            let resistant = host.resistant_population_count(treatment.drugs.as_slice());
            records.push(Record {
                step,
                total,
                resistant: Some(resistant),
            });
        }
        Ok(records)
    }
}

// Runs occupy disjoint blocks of 2^32 trial seeds.
fn trial_seed(seed: u64, run: usize, trial: usize) -> u64 {
    seed.wrapping_add((run as u64) << 32).wrapping_add(trial as u64)
}
