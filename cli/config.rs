/*!
This module defines the `Config` struct, which is read from the YAML file passed to `scorer train --config`. Every key is optional. Keys that are present replace the corresponding default in [`TrainOptions`].
*/

use anyhow::{Context, Result};
use scorer_tree::{Objective, TrainOptions};
use std::path::Path;

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
	pub learning_rate: Option<f64>,
	pub max_depth: Option<usize>,
	pub min_child_weight: Option<f64>,
	pub num_rounds: Option<usize>,
	pub objective: Option<Objective>,
	pub compute_loss: Option<bool>,
}

impl Config {
	/// Overwrite the fields of `options` that are set in this config.
	pub fn apply(&self, options: &mut TrainOptions) {
		if let Some(learning_rate) = self.learning_rate {
			options.learning_rate = learning_rate;
		}
		if let Some(max_depth) = self.max_depth {
			options.max_depth = max_depth;
		}
		if let Some(min_child_weight) = self.min_child_weight {
			options.min_child_weight = min_child_weight;
		}
		if let Some(num_rounds) = self.num_rounds {
			options.num_rounds = num_rounds;
		}
		if let Some(objective) = self.objective {
			options.objective = objective;
		}
		if let Some(compute_loss) = self.compute_loss {
			options.compute_loss = compute_loss;
		}
	}
}

pub fn load_config(config_path: Option<&Path>) -> Result<Option<Config>> {
	if let Some(config_path) = config_path {
		let config = std::fs::read_to_string(config_path)
			.with_context(|| format!("failed to read config file {}", config_path.display()))?;
		let config = serde_yaml::from_str(&config)
			.with_context(|| format!("failed to parse config file {}", config_path.display()))?;
		Ok(Some(config))
	} else {
		Ok(None)
	}
}

#[test]
fn test_apply() {
	let config: Config = serde_yaml::from_str("learning_rate: 0.05\nobjective: regression\n").unwrap();
	let mut options = TrainOptions::default();
	config.apply(&mut options);
	assert_eq!(
		options,
		TrainOptions {
			learning_rate: 0.05,
			objective: Objective::Regression,
			..Default::default()
		}
	);
}

#[test]
fn test_unknown_keys() {
	assert!(serde_yaml::from_str::<Config>("learning_rate: 0.1\nmax_leaf_nodes: 4\n").is_err());
	assert!(serde_yaml::from_str::<Config>("objective: multiclass\n").is_err());
}

#[test]
fn test_load_config() {
	assert!(load_config(None).unwrap().is_none());
	let path = std::env::temp_dir().join(format!("scorer_config_test_{}.yaml", std::process::id()));
	std::fs::write(&path, "num_rounds: 12\nmax_depth: 6\n").unwrap();
	let config = load_config(Some(&path));
	std::fs::remove_file(&path).unwrap();
	let config = config.unwrap().unwrap();
	assert_eq!(config.num_rounds, Some(12));
	assert_eq!(config.max_depth, Some(6));
	assert_eq!(config.learning_rate, None);
}
