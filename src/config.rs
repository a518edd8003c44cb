use crate::utils::{check_num, check_prob};
use crate::virus::Resistances;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Base seed of the trial random number generators (random if absent).
    #[serde(default)]
    pub seed: Option<u64>,

    /// Virus and host parameters.
    pub model: ModelConfig,
    /// Initial condition parameters.
    pub init: InitConfig,
    /// Output parameters.
    pub output: OutputConfig,

    /// Drug treatment parameters (untreated simulation if absent).
    #[serde(default)]
    pub treatment: Option<TreatmentConfig>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Maximum reproduction probability.
    pub max_birth_prob: f64,
    /// Clearance probability.
    pub clear_prob: f64,
    /// Host capacity.
    pub max_pop: usize,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitConfig {
    /// Initial number of viruses.
    pub n_viruses: usize,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Number of trials per batch.
    pub n_trials: usize,
    /// Number of steps of an untreated trial (300 if absent).
    ///
    /// Treated trials take their length from the treatment schedule instead.
    #[serde(default)]
    pub n_steps: Option<usize>,
}

const DEFAULT_N_STEPS: usize = 300;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreatmentConfig {
    /// Mutation probability of each resistance trait.
    pub mut_prob: f64,
    /// Initial resistance traits of every virus.
    #[serde(default)]
    pub resistances: Resistances,
    /// Number of steps before the drugs are prescribed.
    pub steps_before: usize,
    /// Number of steps after the drugs are prescribed.
    pub steps_after: usize,
    /// Drugs prescribed after `steps_before` steps.
    pub drugs: Vec<String>,
}

impl TreatmentConfig {
    pub fn n_steps(&self) -> usize {
        self.steps_before + self.steps_after
    }
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be a TOML document describing a [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a [`Config`] from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    /// Number of steps of every trial.
    pub fn n_steps(&self) -> usize {
        match &self.treatment {
            Some(treatment) => treatment.n_steps(),
            None => self.output.n_steps.unwrap_or(DEFAULT_N_STEPS),
        }
    }

    fn validate(&self) -> Result<()> {
        check_prob(self.model.max_birth_prob).context("invalid maximum birth probability")?;
        check_prob(self.model.clear_prob).context("invalid clearance probability")?;

        check_num(self.init.n_viruses, 1..10_000_000).context("invalid initial number of viruses")?;

        check_num(self.output.n_trials, 1..100_000).context("invalid number of trials")?;
        check_num(self.n_steps(), 1..1_000_000).context("invalid number of steps")?;

        if let Some(treatment) = &self.treatment {
            check_prob(treatment.mut_prob).context("invalid mutation probability")?;
            if self.output.n_steps.is_some() {
                bail!("number of steps is set by the treatment schedule, not by the output");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNTREATED: &str = r#"
[model]
max_birth_prob = 0.1
clear_prob = 0.05
max_pop = 1000

[init]
n_viruses = 100

[output]
n_trials = 10
"#;

    const TREATED: &str = r#"
seed = 7

[model]
max_birth_prob = 0.1
clear_prob = 0.05
max_pop = 1000

[init]
n_viruses = 100

[output]
n_trials = 10

[treatment]
mut_prob = 0.005
resistances = { guttagonol = false, srinol = true }
steps_before = 150
steps_after = 100
drugs = ["guttagonol"]
"#;

    #[test]
    fn parses_untreated_config() {
        let cfg = Config::from_toml(UNTREATED).unwrap();
        assert_eq!(cfg.seed, None);
        assert_eq!(cfg.model.max_pop, 1000);
        assert_eq!(cfg.output.n_steps, None);
        assert_eq!(cfg.n_steps(), 300);
        assert!(cfg.treatment.is_none());
    }

    #[test]
    fn parses_treated_config() {
        let cfg = Config::from_toml(TREATED).unwrap();
        assert_eq!(cfg.seed, Some(7));
        let treatment = cfg.treatment.as_ref().unwrap();
        assert_eq!(treatment.resistances.get("srinol"), Some(&true));
        assert_eq!(treatment.drugs, vec!["guttagonol".to_string()]);
        assert_eq!(cfg.n_steps(), 250);
    }

    #[test]
    fn rejects_invalid_values() {
        let bad_prob = UNTREATED.replace("clear_prob = 0.05", "clear_prob = 1.5");
        assert!(Config::from_toml(&bad_prob).is_err());

        let no_viruses = UNTREATED.replace("n_viruses = 100", "n_viruses = 0");
        assert!(Config::from_toml(&no_viruses).is_err());

        let bad_mut = TREATED.replace("mut_prob = 0.005", "mut_prob = -0.1");
        assert!(Config::from_toml(&bad_mut).is_err());

        let unknown = UNTREATED.replace("[init]", "[init]\nn_hosts = 3");
        assert!(Config::from_toml(&unknown).is_err());
    }

    #[test]
    fn treatment_schedule_owns_number_of_steps() {
        let untreated = UNTREATED.replace("n_trials = 10", "n_trials = 10\nn_steps = 40");
        assert_eq!(Config::from_toml(&untreated).unwrap().n_steps(), 40);

        let treated = TREATED.replace("n_trials = 10", "n_trials = 10\nn_steps = 40");
        assert!(Config::from_toml(&treated).is_err());
    }
}
