use crate::config::Config;
use crate::model::Trajectory;
use crate::stats::{Accumulator, AccumulatorReport};
use anyhow::{Context, Result, bail};
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Per-step observable averaged across trials.
pub trait Obs {
    fn update(&mut self, trajectory: &Trajectory) -> Result<()>;
    fn report(&self) -> ObsReport;
}

/// Per-step averages of an observable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObsReport {
    pub name: String,
    pub steps: Vec<AccumulatorReport>,
}

fn step_accumulators(cfg: &Config) -> Vec<Accumulator> {
    let mut acc_vec = Vec::new();
    acc_vec.resize_with(cfg.n_steps(), Accumulator::new);
    acc_vec
}

fn check_len(trajectory: &Trajectory, acc_vec: &[Accumulator]) -> Result<()> {
    let len = trajectory.records.len();
    if len != acc_vec.len() {
        bail!(
            "trajectory of trial {} must have {} records, but has {len}",
            trajectory.trial,
            acc_vec.len()
        );
    }
    Ok(())
}

pub struct TotalPop {
    acc_vec: Vec<Accumulator>,
}

impl TotalPop {
    pub fn new(cfg: &Config) -> Self {
        Self {
            acc_vec: step_accumulators(cfg),
        }
    }
}

impl Obs for TotalPop {
    fn update(&mut self, trajectory: &Trajectory) -> Result<()> {
        check_len(trajectory, &self.acc_vec)?;
        for (acc, record) in self.acc_vec.iter_mut().zip(&trajectory.records) {
            acc.add(record.total as f64);
        }
        Ok(())
    }

    fn report(&self) -> ObsReport {
        ObsReport {
            name: "total".to_string(),
            steps: self.acc_vec.iter().map(|acc| acc.report()).collect(),
        }
    }
}

pub struct ResistantPop {
    drugs: Vec<String>,
    acc_vec: Vec<Accumulator>,
}

impl ResistantPop {
    pub fn new(cfg: &Config, drugs: Vec<String>) -> Self {
        Self {
            drugs,
            acc_vec: step_accumulators(cfg),
        }
    }
}

impl Obs for ResistantPop {
    fn update(&mut self, trajectory: &Trajectory) -> Result<()> {
        check_len(trajectory, &self.acc_vec)?;
        for (acc, record) in self.acc_vec.iter_mut().zip(&trajectory.records) {
            let resistant = record
                .resistant
                .with_context(|| format!("missing resistant count at step {}", record.step))?;
            acc.add(resistant as f64);
        }
        Ok(())
    }

    fn report(&self) -> ObsReport {
        ObsReport {
            name: format!("resistant:{}", self.drugs.join("+")),
            steps: self.acc_vec.iter().map(|acc| acc.report()).collect(),
        }
    }
}

/// Averages trajectories of a run step by step.
pub struct Analyzer {
    cfg: Config,
    obs_ptr_vec: Vec<Box<dyn Obs>>,
}

impl Analyzer {
    pub fn new(cfg: Config) -> Self {
        let mut obs_ptr_vec: Vec<Box<dyn Obs>> = vec![Box::new(TotalPop::new(&cfg))];
        if let Some(treatment) = &cfg.treatment {
            obs_ptr_vec.push(Box::new(ResistantPop::new(&cfg, treatment.drugs.clone())));
        }
        Self { cfg, obs_ptr_vec }
    }

    pub fn add_trajectory(&mut self, trajectory: &Trajectory) -> Result<()> {
        for obs in &mut self.obs_ptr_vec {
            obs.update(trajectory)
                .context("failed to update observable")?;
        }
        Ok(())
    }

    pub fn add_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);

        for _ in 0..self.cfg.output.n_trials {
            let trajectory: Trajectory =
                decode::from_read(&mut reader).context("failed to read trajectory")?;
            self.add_trajectory(&trajectory)?;
        }
        Ok(())
    }

    pub fn reports(&self) -> Vec<ObsReport> {
        self.obs_ptr_vec.iter().map(|obs| obs.report()).collect()
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        encode::write(&mut writer, &self.reports()).context("failed to serialize results")?;

        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }
}
