//! This module contains the main entrypoint to the scorer cli.

use self::{config::load_config, dataset::load_dataset, progress_view::ProgressView};
use anyhow::{format_err, Context, Result};
use clap::Parser;
use colored::Colorize;
use scorer_tree::{Model, Objective, TrainOptions};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod config;
mod credit;
mod dataset;
mod progress_view;

#[derive(Parser)]
#[command(
	about = "Train gradient boosted trees and score credit applications.",
	disable_help_subcommand = true
)]
enum Options {
	#[command(name = "train")]
	Train(TrainArgs),
	#[command(name = "predict")]
	Predict(PredictArgs),
	#[command(name = "importance")]
	Importance(ImportanceArgs),
	#[command(name = "demo", about = "train on the built-in credit data and score the test scenarios")]
	Demo,
}

#[derive(clap::Args, Debug)]
#[command(about = "train a model", long_about = "train a model from a csv file")]
struct TrainArgs {
	#[arg(short, long, help = "the path to your .csv file")]
	file: PathBuf,
	#[arg(short, long, help = "the name of the column to predict")]
	target: String,
	#[arg(short, long, help = "the path to a config file")]
	config: Option<PathBuf>,
	#[arg(long, value_enum, help = "the loss to train with")]
	objective: Option<ObjectiveArg>,
	#[arg(long)]
	learning_rate: Option<f64>,
	#[arg(long)]
	max_depth: Option<usize>,
	#[arg(long)]
	min_child_weight: Option<f64>,
	#[arg(long)]
	num_rounds: Option<usize>,
	#[arg(
		short,
		long,
		help = "the path to write the model to, as json if it ends in .json"
	)]
	output: Option<PathBuf>,
	#[arg(long = "no-progress", action = clap::ArgAction::SetFalse, help = "disable progress logging")]
	progress: bool,
}

#[derive(clap::Args, Debug)]
#[command(about = "print one probability per row of a csv file")]
struct PredictArgs {
	#[arg(short, long, help = "the path to a model file")]
	model: PathBuf,
	#[arg(short, long, help = "the path to your .csv file")]
	file: PathBuf,
	#[arg(short, long, help = "a column to drop before predicting")]
	target: Option<String>,
}

#[derive(clap::Args, Debug)]
#[command(about = "print the feature importances of a model")]
struct ImportanceArgs {
	#[arg(short, long, help = "the path to a model file")]
	model: PathBuf,
	#[arg(short, long, help = "the .csv file the model was trained on")]
	file: PathBuf,
	#[arg(short, long, help = "the name of the column the model predicts")]
	target: String,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum ObjectiveArg {
	Binary,
	Regression,
}

impl From<ObjectiveArg> for Objective {
	fn from(value: ObjectiveArg) -> Objective {
		match value {
			ObjectiveArg::Binary => Objective::Binary,
			ObjectiveArg::Regression => Objective::Regression,
		}
	}
}

fn main() {
	init_tracing();
	let options = Options::parse();
	let result = match options {
		Options::Train(args) => cli_train(args),
		Options::Predict(args) => cli_predict(args),
		Options::Importance(args) => cli_importance(args),
		Options::Demo => cli_demo(),
	};
	if let Err(error) = result {
		eprintln!("{}: {:#}", "error".red().bold(), error);
		std::process::exit(1);
	}
}

/// Log to stderr so stdout only carries results. The filter comes from `RUST_LOG` and defaults to `info`.
fn init_tracing() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

fn cli_train(args: TrainArgs) -> Result<()> {
	// Defaults, then the config file, then the command line.
	let mut options = TrainOptions::default();
	if let Some(config) = load_config(args.config.as_deref())? {
		config.apply(&mut options);
	}
	if let Some(objective) = args.objective {
		options.objective = objective.into();
	}
	if let Some(learning_rate) = args.learning_rate {
		options.learning_rate = learning_rate;
	}
	if let Some(max_depth) = args.max_depth {
		options.max_depth = max_depth;
	}
	if let Some(min_child_weight) = args.min_child_weight {
		options.min_child_weight = min_child_weight;
	}
	if let Some(num_rounds) = args.num_rounds {
		options.num_rounds = num_rounds;
	}

	let dataset = load_dataset(&args.file, Some(&args.target))?;
	let labels = dataset
		.labels
		.as_ref()
		.ok_or_else(|| format_err!("the dataset has no target column"))?;
	let mut model = Model::new(options);
	{
		let mut progress_view = if args.progress {
			Some(ProgressView::new())
		} else {
			None
		};
		model.train_with_progress(dataset.features.view(), labels.view(), &mut |progress| {
			if let Some(progress_view) = progress_view.as_mut() {
				progress_view.update(progress)
			}
		})?;
	}

	let output_path = match args.output {
		Some(output) => output,
		None => {
			let name = args
				.file
				.file_stem()
				.and_then(|stem| stem.to_str())
				.unwrap_or("model");
			available_path(&std::env::current_dir()?, name, "scorer")?
		}
	};
	write_model(&model, &output_path)?;
	eprintln!("Your model was written to {}.", output_path.display());

	if let Some(losses) = model.losses() {
		if let Some(final_loss) = losses.last() {
			tracing::info!(final_loss, "training loss");
		}
		print!("{}", format_losses(losses));
		println!();
	}
	print_importances(&dataset.feature_names, &model.feature_importances());
	Ok(())
}

fn cli_predict(args: PredictArgs) -> Result<()> {
	let model = read_model(&args.model)?;
	let dataset = load_dataset(&args.file, args.target.as_deref())?;
	for probability in model.predict(dataset.features.view()).iter() {
		println!("{}", probability);
	}
	Ok(())
}

fn cli_importance(args: ImportanceArgs) -> Result<()> {
	let mut model = read_model(&args.model)?;
	let dataset = load_dataset(&args.file, Some(&args.target))?;
	let n_features = dataset.feature_names.len();
	match model.n_features() {
		Some(model_n_features) if model_n_features != n_features => {
			return Err(format_err!(
				"the model was trained with {} features but {} has {}",
				model_n_features,
				args.file.display(),
				n_features
			));
		}
		Some(_) => {}
		None => {
			let labels = dataset
				.labels
				.as_ref()
				.ok_or_else(|| format_err!("the dataset has no target column"))?
				.to_vec();
			model.attach_training_summary(&labels, n_features);
		}
	}
	print_importances(&dataset.feature_names, &model.feature_importances());
	Ok(())
}

fn cli_demo() -> Result<()> {
	let (features, labels) = credit::training_data();
	let mut model = Model::new(credit::demo_options());
	model.train(features.view(), labels.view())?;

	println!("Credit Score Predictions");
	println!("========================");
	for (index, scenario) in credit::SCENARIOS.iter().enumerate() {
		let probability = model.predict_one(&scenario.features);
		println!();
		println!("Scenario {}: {}", index + 1, scenario.description);
		println!(
			"  Thresholds met: {}/8",
			credit::thresholds_met(&scenario.features)
		);
		println!("  Probability: {:.1}%", probability * 100.0);
		println!("  Category: {}", credit::outcome(probability));
		println!("  Expected: {}", scenario.expected_outcome);
		println!(
			"  Credit score: {}",
			credit::probability_to_credit_score(probability)
		);
	}
	println!();
	let feature_names: Vec<String> = credit::FEATURE_NAMES
		.iter()
		.map(|name| name.to_string())
		.collect();
	print_importances(&feature_names, &model.feature_importances());
	Ok(())
}

/// The training loss after each round, one round per line.
fn format_losses(losses: &[f64]) -> String {
	let mut output = String::from("Training Loss\n=============\n");
	for (round_index, loss) in losses.iter().enumerate() {
		output.push_str(&format!("round {}: {:.6}\n", round_index + 1, loss));
	}
	output
}

/// Print the importances by column name, most important first.
fn print_importances(feature_names: &[String], importances: &[f64]) {
	let mut rows: Vec<(&str, f64)> = feature_names
		.iter()
		.map(|name| name.as_str())
		.zip(importances.iter().copied())
		.collect();
	rows.sort_by(|a, b| b.1.total_cmp(&a.1));
	println!("Feature Importances");
	println!("===================");
	for (name, importance) in rows {
		println!("{}: {:.2}%", name, importance);
	}
}

fn is_json(path: &Path) -> bool {
	path.extension().and_then(|extension| extension.to_str()) == Some("json")
}

fn write_model(model: &Model, path: &Path) -> Result<()> {
	if is_json(path) {
		let json = model.to_json_pretty()?;
		std::fs::write(path, json)
			.with_context(|| format!("failed to write model to {}", path.display()))?;
	} else {
		model
			.to_file(path)
			.with_context(|| format!("failed to write model to {}", path.display()))?;
	}
	Ok(())
}

fn read_model(path: &Path) -> Result<Model> {
	let model = if is_json(path) {
		let json = std::fs::read_to_string(path)
			.with_context(|| format!("failed to read model from {}", path.display()))?;
		Model::from_json(&json)
	} else {
		Model::from_path(path)
	};
	model.with_context(|| format!("failed to load model from {}", path.display()))
}

/// This function checks if a file with the given name and extension already exists in `dir`, and if it does, it appends " 1", " 2", etc. to it until it finds a name that will not overwrite an existing file.
fn available_path(dir: &Path, name: &str, extension: &str) -> Result<PathBuf> {
	let mut i = 0;
	loop {
		let filename = if i > 0 {
			format!("{} {}.{}", name, i, extension)
		} else {
			format!("{}.{}", name, extension)
		};
		let path = dir.join(filename);
		match std::fs::metadata(&path) {
			Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(path),
			Err(error) => return Err(error.into()),
			Ok(_) => i += 1,
		}
	}
}

#[test]
fn test_available_path() {
	let dir = std::env::temp_dir().join(format!("scorer_cli_test_{}", std::process::id()));
	std::fs::create_dir_all(&dir).unwrap();
	let first = available_path(&dir, "credit", "scorer").unwrap();
	assert_eq!(first, dir.join("credit.scorer"));
	std::fs::write(&first, b"").unwrap();
	let second = available_path(&dir, "credit", "scorer").unwrap();
	std::fs::remove_dir_all(&dir).unwrap();
	assert_eq!(second, dir.join("credit 1.scorer"));
}

#[test]
fn test_format_losses() {
	insta::assert_snapshot!(format_losses(&[0.6931471805599453, 0.5, 0.125]).trim_end(), @r###"
 Training Loss
 =============
 round 1: 0.693147
 round 2: 0.500000
 round 3: 0.125000
 "###);
}

#[test]
fn test_losses_from_config() {
	let config: config::Config = serde_yaml::from_str("num_rounds: 4\ncompute_loss: true\n").unwrap();
	let mut options = credit::demo_options();
	config.apply(&mut options);
	let (features, labels) = credit::training_data();
	let mut model = Model::new(options);
	model.train(features.view(), labels.view()).unwrap();
	let losses = model.losses().unwrap();
	assert_eq!(losses.len(), 4);
	assert_eq!(format_losses(losses).lines().count(), 6);
}

#[test]
fn test_model_files() {
	let (features, labels) = credit::training_data();
	let mut model = Model::new(TrainOptions {
		num_rounds: 5,
		..credit::demo_options()
	});
	model.train(features.view(), labels.view()).unwrap();
	let dir = std::env::temp_dir();
	for name in ["scorer_cli_model.json", "scorer_cli_model.scorer"].iter() {
		let path = dir.join(format!("{}_{}", std::process::id(), name));
		write_model(&model, &path).unwrap();
		let restored = read_model(&path);
		std::fs::remove_file(&path).unwrap();
		let restored = restored.unwrap();
		assert_eq!(restored.trees(), model.trees());
		assert_eq!(
			restored.predict(features.view()),
			model.predict(features.view())
		);
	}
}

#[test]
fn test_demo_model_separates_scenarios() {
	let (features, labels) = credit::training_data();
	let mut model = Model::new(credit::demo_options());
	model.train(features.view(), labels.view()).unwrap();
	// The first two scenarios meet eight and two thresholds.
	let good = model.predict_one(&credit::SCENARIOS[0].features);
	let bad = model.predict_one(&credit::SCENARIOS[1].features);
	assert!(good > bad);
	assert!((0.0..=1.0).contains(&good));
	assert!((0.0..=1.0).contains(&bad));
}
