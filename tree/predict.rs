use crate::{binary_classifier, regressor, BranchNode, LeafNode, Model, Node, Objective, Tree};
use ndarray::prelude::*;

impl Tree {
	/// Return the value of the leaf `example` reaches. An example that cannot be routed, because it is missing the feature a branch needs or because the tree is malformed, contributes 0.
	pub fn predict(&self, example: &[f64]) -> f64 {
		self.predict_with(|feature_index| example.get(feature_index).copied())
	}

	pub(crate) fn predict_view(&self, example: ArrayView1<f64>) -> f64 {
		self.predict_with(|feature_index| example.get(feature_index).copied())
	}

	fn predict_with(&self, feature_value: impl Fn(usize) -> Option<f64>) -> f64 {
		// Start at the root node.
		let mut node_index = 0;
		// Traverse the tree until we get to a leaf.
		loop {
			match self.nodes.get(node_index) {
				Some(Node::Branch(BranchNode {
					feature_index,
					split_value,
					left_child_index,
					right_child_index,
				})) => {
					let value = match feature_value(*feature_index) {
						Some(value) => value,
						None => return 0.0,
					};
					let child_index = if value <= *split_value {
						*left_child_index
					} else {
						*right_child_index
					};
					// Children always come after their parent, so this also rules out cycles.
					if child_index <= node_index {
						return 0.0;
					}
					node_index = child_index;
				}
				Some(Node::Leaf(LeafNode { value })) => return *value,
				None => return 0.0,
			}
		}
	}
}

impl Model {
	/// Predict a single example. Binary models return a probability and regression models return a value clamped to `[0, 1]`.
	///
	/// A model that has never been trained returns 0.
	pub fn predict_one(&self, example: &[f64]) -> f64 {
		self.predict_with(|tree| tree.predict(example))
	}

	/// Predict each row of `features`, in order.
	pub fn predict(&self, features: ArrayView2<f64>) -> Array1<f64> {
		features
			.axis_iter(Axis(0))
			.map(|example| self.predict_with(|tree| tree.predict_view(example)))
			.collect()
	}

	fn predict_with(&self, tree_output: impl Fn(&Tree) -> f64) -> f64 {
		if self.trees.is_empty() && self.n_features.is_none() {
			return 0.0;
		}
		let learning_rate = self.options.learning_rate;
		let mut output = self.bias();
		for tree in &self.trees {
			output += learning_rate * tree_output(tree);
		}
		match self.options.objective {
			Objective::Binary => binary_classifier::transform(output),
			Objective::Regression => regressor::transform(output),
		}
	}
}

#[cfg(test)]
fn stump() -> Tree {
	Tree {
		nodes: vec![
			Node::Branch(BranchNode {
				feature_index: 1,
				split_value: 2.5,
				left_child_index: 1,
				right_child_index: 2,
			}),
			Node::Leaf(LeafNode { value: -1.0 }),
			Node::Leaf(LeafNode { value: 1.0 }),
		],
	}
}

#[test]
fn test_tree_predict() {
	let tree = stump();
	assert_eq!(tree.predict(&[0.0, 2.5]), -1.0);
	assert_eq!(tree.predict(&[0.0, 2.6]), 1.0);
	// The example is missing feature 1.
	assert_eq!(tree.predict(&[0.0]), 0.0);
	let features = arr2(&[[9.0, 1.0]]);
	assert_eq!(tree.predict_view(features.row(0)), -1.0);
}

#[test]
fn test_tree_predict_malformed() {
	let dangling = Tree {
		nodes: vec![Node::Branch(BranchNode {
			feature_index: 0,
			split_value: 0.0,
			left_child_index: 5,
			right_child_index: 6,
		})],
	};
	assert_eq!(dangling.predict(&[1.0]), 0.0);
	let cycle = Tree {
		nodes: vec![
			Node::Branch(BranchNode {
				feature_index: 0,
				split_value: 0.0,
				left_child_index: 1,
				right_child_index: 1,
			}),
			Node::Branch(BranchNode {
				feature_index: 0,
				split_value: 0.0,
				left_child_index: 0,
				right_child_index: 0,
			}),
		],
	};
	assert_eq!(cycle.predict(&[1.0]), 0.0);
	assert_eq!(Tree { nodes: Vec::new() }.predict(&[1.0]), 0.0);
}

#[test]
fn test_model_predict() {
	use crate::TrainOptions;
	let untrained = Model::new(TrainOptions::default());
	assert_eq!(untrained.predict_one(&[1.0, 2.0]), 0.0);

	let mut model = Model::new(TrainOptions {
		learning_rate: 0.5,
		..Default::default()
	});
	model.trees.push(stump());
	model.trees.push(stump());
	// 0.5 + 0.5 * -1 + 0.5 * -1
	assert_eq!(model.predict_one(&[0.0, 0.0]), binary_classifier::sigmoid(-0.5));
	let predictions = model.predict(arr2(&[[0.0, 3.0], [0.0, 0.0]]).view());
	assert_eq!(predictions.len(), 2);
	assert_eq!(predictions[0], binary_classifier::sigmoid(1.5));
	assert_eq!(predictions[1], binary_classifier::sigmoid(-0.5));

	let mut model = Model::new(TrainOptions {
		objective: Objective::Regression,
		..Default::default()
	});
	model.trees.push(stump());
	model.attach_training_summary(&[0.9, 1.0], 2);
	// The outputs are clamped.
	assert_eq!(model.predict_one(&[0.0, 3.0]), 1.0);
	model.attach_training_summary(&[0.0, 0.1], 2);
	assert_eq!(model.predict_one(&[0.0, 0.0]), 0.0);
}

#[test]
fn test_predictions_are_probabilities() {
	use crate::TrainOptions;
	let features = arr2(&[
		[1.0, 0.3],
		[2.0, 0.1],
		[3.0, 0.8],
		[4.0, 0.4],
		[5.0, 0.9],
		[6.0, 0.2],
	]);
	let binary_labels = arr1(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0]);
	let regression_labels = arr1(&[-4.0, 0.2, 0.5, 3.0, 0.9, 1.7]);
	let held_out = arr2(&[[-100.0, -100.0], [0.5, 0.5], [100.0, 100.0]]);
	for (objective, labels) in [
		(Objective::Binary, binary_labels),
		(Objective::Regression, regression_labels),
	]
	.iter()
	{
		let mut model = Model::new(TrainOptions {
			objective: *objective,
			num_rounds: 20,
			learning_rate: 1.0,
			..Default::default()
		});
		model.train(features.view(), labels.view()).unwrap();
		for prediction in model
			.predict(features.view())
			.iter()
			.chain(model.predict(held_out.view()).iter())
		{
			assert!((0.0..=1.0).contains(prediction));
		}
	}
}
