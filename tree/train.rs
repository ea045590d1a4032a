use self::tree::{compute_sorted_examples, train_tree};
use crate::{
	binary_classifier, model::compute_bias, regressor, Error, Model, Objective, ProgressCounter,
	RoundError, TrainProgress, Tree,
};
use ndarray::prelude::*;

mod split;
mod tree;

/// Added to denominators so a node with no examples never divides by zero.
pub(crate) const EPSILON: f64 = 1e-10;

impl Model {
	/// Train `num_rounds` more trees on `features` and `labels`, appending them to the trees already in the model.
	pub fn train(&mut self, features: ArrayView2<f64>, labels: ArrayView1<f64>) -> Result<(), Error> {
		self.train_with_progress(features, labels, &mut |_| {})
	}

	/// Like [`Model::train`], but `update_progress` is called with a counter of completed rounds before the first round.
	///
	/// If a round fails, the error is returned and the trees from the rounds before it stay in the model.
	pub fn train_with_progress(
		&mut self,
		features: ArrayView2<f64>,
		labels: ArrayView1<f64>,
		update_progress: &mut dyn FnMut(TrainProgress),
	) -> Result<(), Error> {
		self.check_training_data(features, labels)?;
		let n_examples = features.nrows();
		let n_features = features.ncols();
		let n_rounds = self.options.num_rounds;

		let bias = compute_bias(self.options.objective, &labels.to_vec());
		self.bias = Some(bias);
		self.n_features = Some(n_features);
		if self.options.compute_loss && self.losses.is_none() {
			self.losses = Some(Vec::new());
		}

		// Before the first round, fill the predictions with the bias.
		let mut predictions = vec![bias; n_examples];
		let mut gradients = vec![0.0; n_examples];

		tracing::info!(
			n_examples,
			n_features,
			n_rounds,
			objective = ?self.options.objective,
			n_trees = self.trees.len(),
			"training started"
		);
		let round_counter = ProgressCounter::new(n_rounds as u64);
		update_progress(TrainProgress::Training(round_counter.clone()));
		for round_index in 0..n_rounds {
			if let Err(source) =
				self.train_round(round_index, features, labels, &mut predictions, &mut gradients)
			{
				tracing::error!(round = round_index, error = %source, "training round failed");
				return Err(Error::Round {
					round: round_index,
					source,
				});
			}
			round_counter.inc(1);
		}
		tracing::info!(n_trees = self.trees.len(), "training finished");
		Ok(())
	}

	fn check_training_data(
		&self,
		features: ArrayView2<f64>,
		labels: ArrayView1<f64>,
	) -> Result<(), Error> {
		if features.nrows() == 0 || labels.is_empty() {
			return Err(Error::InvalidInput("the training data is empty".to_owned()));
		}
		if features.ncols() == 0 {
			return Err(Error::InvalidInput(
				"the feature matrix has no columns".to_owned(),
			));
		}
		if features.nrows() != labels.len() {
			return Err(Error::InvalidInput(format!(
				"the feature matrix has {} rows but there are {} labels",
				features.nrows(),
				labels.len()
			)));
		}
		if let Some(example) = labels.iter().position(|label| !label.is_finite()) {
			return Err(Error::InvalidInput(format!(
				"the label for example {} is not finite",
				example
			)));
		}
		if let Some(n_features) = self.n_features {
			if n_features != features.ncols() {
				return Err(Error::InvalidInput(format!(
					"the model was trained with {} features but the feature matrix has {}",
					n_features,
					features.ncols()
				)));
			}
		}
		Ok(())
	}

	fn train_round(
		&mut self,
		round_index: usize,
		features: ArrayView2<f64>,
		labels: ArrayView1<f64>,
		predictions: &mut [f64],
		gradients: &mut [f64],
	) -> Result<(), RoundError> {
		match self.options.objective {
			Objective::Binary => {
				binary_classifier::compute_gradients(gradients, labels, predictions)
			}
			Objective::Regression => regressor::compute_gradients(gradients, labels, predictions),
		}
		if let Some(example) = gradients.iter().position(|gradient| !gradient.is_finite()) {
			return Err(RoundError::NonFiniteGradient { example });
		}

		let sorted_examples = compute_sorted_examples(features);
		let tree = train_tree(features, gradients, sorted_examples, &self.options);

		// Update the predictions with the raw leaf values of the tree just trained.
		let learning_rate = self.options.learning_rate;
		for (prediction, example) in predictions.iter_mut().zip(features.axis_iter(Axis(0))) {
			*prediction += learning_rate * tree.predict_view(example);
		}

		let loss = if self.options.compute_loss {
			let loss = compute_loss(self.options.objective, labels, predictions);
			if let Some(losses) = self.losses.as_mut() {
				losses.push(loss);
			}
			Some(loss)
		} else {
			None
		};
		tracing::debug!(
			round = round_index,
			n_nodes = tree.nodes.len(),
			n_branches = tree.n_branches(),
			loss = ?loss,
			"trained tree"
		);
		self.trees.push(tree);
		Ok(())
	}
}

fn compute_loss(objective: Objective, labels: ArrayView1<f64>, predictions: &[f64]) -> f64 {
	match objective {
		Objective::Binary => binary_classifier::compute_loss(labels, predictions),
		Objective::Regression => regressor::compute_loss(labels, predictions),
	}
}

impl Tree {
	pub(crate) fn n_branches(&self) -> usize {
		self.nodes.iter().filter(|node| !node.is_leaf()).count()
	}
}

#[test]
fn test_single_split() {
	use crate::{Node, TrainOptions};
	let features = arr2(&[[1.0], [2.0], [3.0], [4.0]]);
	let labels = arr1(&[0.0, 0.0, 1.0, 1.0]);
	let mut model = Model::new(TrainOptions {
		max_depth: 1,
		num_rounds: 1,
		min_child_weight: 1.0,
		objective: Objective::Binary,
		..Default::default()
	});
	model.train(features.view(), labels.view()).unwrap();
	assert_eq!(model.trees().len(), 1);
	let tree = &model.trees()[0];
	let root = tree.nodes[0].as_branch().unwrap();
	assert_eq!(root.feature_index, 0);
	assert_eq!(root.split_value, 2.5);
	assert!(matches!(tree.nodes[root.left_child_index], Node::Leaf(_)));
	assert!(matches!(tree.nodes[root.right_child_index], Node::Leaf(_)));
	assert!(model.predict_one(&[1.0]) < model.predict_one(&[4.0]));
}

#[test]
fn test_train_appends_trees() {
	use crate::TrainOptions;
	let features = arr2(&[[1.0, 0.5], [2.0, 0.1], [3.0, 0.9], [4.0, 0.3]]);
	let labels = arr1(&[0.0, 1.0, 0.0, 1.0]);
	let mut model = Model::new(TrainOptions {
		num_rounds: 3,
		..Default::default()
	});
	model.train(features.view(), labels.view()).unwrap();
	model.train(features.view(), labels.view()).unwrap();
	assert_eq!(model.trees().len(), 6);
}

#[test]
fn test_zero_rounds_predicts_bias() {
	use crate::TrainOptions;
	let features = arr2(&[[1.0, 10.0], [2.0, 20.0], [3.0, 30.0]]);
	let labels = arr1(&[0.2, 0.4, 0.3]);

	let mut model = Model::new(TrainOptions {
		num_rounds: 0,
		..Default::default()
	});
	model.train(features.view(), labels.view()).unwrap();
	assert!(model.trees().is_empty());
	let expected = binary_classifier::sigmoid(0.5);
	for prediction in model.predict(features.view()).iter() {
		assert_eq!(*prediction, expected);
	}

	let mut model = Model::new(TrainOptions {
		num_rounds: 0,
		objective: Objective::Regression,
		..Default::default()
	});
	model.train(features.view(), labels.view()).unwrap();
	let expected = (0.2 + 0.4 + 0.3) / 3.0;
	for prediction in model.predict(features.view()).iter() {
		assert!((prediction - expected).abs() < 1e-12);
	}
	assert_eq!(model.predict_one(&[100.0, 100.0]), model.predict_one(&[1.0, 10.0]));
}

#[test]
fn test_invalid_input_leaves_model_untouched() {
	use crate::TrainOptions;
	let mut model = Model::new(TrainOptions {
		num_rounds: 2,
		..Default::default()
	});
	let features = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
	let labels = arr1(&[0.0, 1.0]);
	model.train(features.view(), labels.view()).unwrap();
	let trees = model.trees().to_vec();

	let empty = Array2::<f64>::zeros((0, 2));
	let no_labels = Array1::<f64>::zeros(0);
	let result = model.train(empty.view(), no_labels.view());
	assert!(matches!(result, Err(Error::InvalidInput(_))));

	let result = model.train(features.view(), arr1(&[0.0]).view());
	assert!(matches!(result, Err(Error::InvalidInput(_))));

	let narrow = arr2(&[[1.0], [3.0]]);
	let result = model.train(narrow.view(), labels.view());
	assert!(matches!(result, Err(Error::InvalidInput(_))));

	let no_columns = Array2::<f64>::zeros((2, 0));
	let result = model.train(no_columns.view(), labels.view());
	assert!(matches!(result, Err(Error::InvalidInput(_))));

	let result = model.train(features.view(), arr1(&[0.0, std::f64::NAN]).view());
	assert!(matches!(result, Err(Error::InvalidInput(_))));
	let result = model.train(features.view(), arr1(&[std::f64::INFINITY, 1.0]).view());
	assert!(matches!(result, Err(Error::InvalidInput(_))));

	assert_eq!(model.trees(), trees.as_slice());
	assert_eq!(model.n_features(), Some(2));
	assert_eq!(model.bias, Some(binary_classifier::BIAS));
}

#[test]
fn test_failed_round_keeps_earlier_trees() {
	use crate::TrainOptions;
	// The label equals the prediction of the bias, so every gradient and every leaf is exactly 0.
	let features = arr2(&[[1.0]]);
	let labels = arr1(&[binary_classifier::sigmoid(binary_classifier::BIAS)]);
	let mut model = Model::new(TrainOptions {
		num_rounds: 3,
		..Default::default()
	});
	model.train(features.view(), labels.view()).unwrap();
	assert_eq!(model.trees().len(), 3);
	// An infinite learning rate times a zero leaf makes the predictions NaN after the first round.
	model.options.learning_rate = std::f64::INFINITY;
	let result = model.train(features.view(), labels.view());
	match result {
		Err(Error::Round {
			round: 1,
			source: RoundError::NonFiniteGradient { example: 0 },
		}) => {}
		other => panic!("unexpected result {:?}", other),
	}
	assert_eq!(model.trees().len(), 4);
}

#[test]
fn test_progress_and_losses() {
	use crate::TrainOptions;
	let features = arr2(&[[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]]);
	let labels = arr1(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
	let mut model = Model::new(TrainOptions {
		num_rounds: 5,
		compute_loss: true,
		..Default::default()
	});
	let mut counters = Vec::new();
	model
		.train_with_progress(features.view(), labels.view(), &mut |progress| {
			counters.push(progress)
		})
		.unwrap();
	assert_eq!(counters.len(), 1);
	let TrainProgress::Training(counter) = &counters[0];
	assert_eq!(counter.total(), 5);
	assert!(counter.is_done());
	let losses = model.losses().unwrap();
	assert_eq!(losses.len(), 5);
	assert!(losses[4] < losses[0]);
	assert!(model.trees().iter().map(Tree::n_branches).sum::<usize>() > 0);
}
