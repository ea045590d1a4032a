use crate::{binary_classifier, regressor, Objective, TrainOptions, Tree};

/// A `Model` is an ensemble of trees along with the options used to train them.
///
/// The bias and the number of features from the most recent call to [`Model::train`] are saved along with the trees, so a deserialized model predicts exactly like the one that was saved. Both are absent until the model is trained.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Model {
	pub(crate) trees: Vec<Tree>,
	pub(crate) options: TrainOptions,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub(crate) n_features: Option<usize>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub(crate) bias: Option<f64>,
	#[serde(skip)]
	pub(crate) losses: Option<Vec<f64>>,
}

impl Model {
	/// Create an untrained model.
	pub fn new(options: TrainOptions) -> Self {
		Self {
			trees: Vec::new(),
			options,
			n_features: None,
			bias: None,
			losses: None,
		}
	}

	/// Remove all trees and forget the training data summary, keeping the options.
	pub fn reset(&mut self) {
		self.trees.clear();
		self.n_features = None;
		self.bias = None;
		self.losses = None;
	}

	/// The trees in the order they were trained.
	pub fn trees(&self) -> &[Tree] {
		&self.trees
	}

	pub fn options(&self) -> &TrainOptions {
		&self.options
	}

	/// The number of features seen by the most recent call to [`Model::train`].
	pub fn n_features(&self) -> Option<usize> {
		self.n_features
	}

	/// The training loss after each round, if `compute_loss` was enabled.
	pub fn losses(&self) -> Option<&[f64]> {
		self.losses.as_deref()
	}

	/// Recompute the bias and feature count from the training data, for models whose file does not record them.
	pub fn attach_training_summary(&mut self, labels: &[f64], n_features: usize) {
		self.bias = Some(compute_bias(self.options.objective, labels));
		self.n_features = Some(n_features);
	}

	/// The output of the model before any tree is added, in logit space for binary models. A regression model that does not know its bias uses 0.
	pub(crate) fn bias(&self) -> f64 {
		self.bias.unwrap_or_else(|| compute_bias(self.options.objective, &[]))
	}
}

pub(crate) fn compute_bias(objective: Objective, labels: &[f64]) -> f64 {
	match objective {
		Objective::Binary => binary_classifier::BIAS,
		Objective::Regression => regressor::compute_bias(labels),
	}
}

#[test]
fn test_reset() {
	use ndarray::prelude::*;
	let mut model = Model::new(TrainOptions {
		num_rounds: 2,
		compute_loss: true,
		..Default::default()
	});
	let features = arr2(&[[1.0, 5.0], [2.0, 6.0]]);
	let labels = arr1(&[0.0, 1.0]);
	model.train(features.view(), labels.view()).unwrap();
	assert_eq!(model.trees().len(), 2);
	assert_eq!(model.n_features(), Some(2));
	model.reset();
	assert!(model.trees().is_empty());
	assert_eq!(model.n_features(), None);
	assert_eq!(model.losses(), None);
	assert_eq!(model.options().num_rounds, 2);
	// After a reset the model accepts a different number of features.
	let features = arr2(&[[1.0], [2.0]]);
	model.train(features.view(), labels.view()).unwrap();
	assert_eq!(model.n_features(), Some(1));
}
