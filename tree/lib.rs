/*!
This crate implements the gradient boosted decision tree engine used to score business credit applications. A [`Model`] is an ensemble of regression trees, each one fit to the gradients of the loss left over by the trees before it.

There are two objectives:

1. [`Objective::Binary`]: labels are 0 or 1 and predictions are probabilities.
2. [`Objective::Regression`]: labels are real numbers and predictions are clamped to `[0, 1]`.

```
use ndarray::prelude::*;
use scorer_tree::{Model, TrainOptions};

let features = arr2(&[[1.0], [2.0], [3.0], [4.0]]);
let labels = arr1(&[0.0, 0.0, 1.0, 1.0]);
let mut model = Model::new(TrainOptions {
	max_depth: 1,
	num_rounds: 10,
	..Default::default()
});
model.train(features.view(), labels.view()).unwrap();
assert!(model.predict_one(&[1.0]) < model.predict_one(&[4.0]));
```

## Training

Training begins from a bias. For regression the bias is the mean of the labels. For binary classification the bias is the constant `0.5`, which is used as a raw logit.

Each round computes the gradient of the loss for every example, sorts the examples by each feature, and grows one tree by recursive greedy split search over those sorted orders. The tree's leaf values, scaled by the learning rate, are added to the running predictions before the next round.

Calling [`Model::train`] again continues training: new trees are appended to the ones already in the model. Use [`Model::reset`] to start over.
*/

mod binary_classifier;
mod error;
mod feature_importances;
mod model;
mod predict;
mod progress;
mod regressor;
mod serialize;
mod train;

pub use self::error::{Error, RoundError};
pub use self::model::Model;
pub use self::progress::{ProgressCounter, TrainProgress};

/// These are the options passed to [`Model::new`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainOptions {
	/// The learning rate scales the leaf values to control the effect each tree has on the output.
	pub learning_rate: f64,
	/// The depth of a single tree will never exceed this value.
	pub max_depth: usize,
	/// A node with fewer examples than this value will not be split.
	pub min_child_weight: f64,
	/// This is the number of rounds of training that occur in each call to [`Model::train`]. One tree is trained per round.
	pub num_rounds: usize,
	/// The loss and output transform.
	pub objective: Objective,
	/// If true, the model will record the loss on the training data after each round.
	pub compute_loss: bool,
}

impl Default for TrainOptions {
	fn default() -> Self {
		Self {
			learning_rate: 0.3,
			max_depth: 4,
			min_child_weight: 1.0,
			num_rounds: 100,
			objective: Objective::default(),
			compute_loss: false,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Objective {
	/// Logistic loss. Predictions are `sigmoid(logit)`.
	#[serde(rename = "binary")]
	Binary,
	/// Damped residuals. Predictions are clamped to `[0, 1]`.
	#[serde(rename = "regression")]
	Regression,
}

impl Default for Objective {
	fn default() -> Self {
		Objective::Binary
	}
}

/// Trees are stored as a `Vec` of `Node`s in pre-order, with the root at index 0. Each branch has two indexes into the `Vec`, one for each of its children, and both are greater than the branch's own index.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tree {
	pub nodes: Vec<Node>,
}

/// A node is either a branch or a leaf.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum Node {
	#[serde(rename = "branch")]
	Branch(BranchNode),
	#[serde(rename = "leaf")]
	Leaf(LeafNode),
}

impl Node {
	pub fn as_branch(&self) -> Option<&BranchNode> {
		match self {
			Node::Branch(branch) => Some(branch),
			Node::Leaf(_) => None,
		}
	}

	pub fn as_branch_mut(&mut self) -> Option<&mut BranchNode> {
		match self {
			Node::Branch(branch) => Some(branch),
			Node::Leaf(_) => None,
		}
	}

	pub fn is_leaf(&self) -> bool {
		matches!(self, Node::Leaf(_))
	}
}

/// A `BranchNode` takes the value of a single feature and compares it with `split_value`. If the value is <= `split_value` the example is sent to the left child, otherwise it is sent to the right child.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BranchNode {
	/// This is the index of the feature to get the value for.
	pub feature_index: usize,
	/// This is the threshold value of the split.
	pub split_value: f64,
	/// This is the index in the tree's node vector for this node's left child.
	pub left_child_index: usize,
	/// This is the index in the tree's node vector for this node's right child.
	pub right_child_index: usize,
}

/// The leaves in a tree hold the values to output for examples that get sent to them.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LeafNode {
	pub value: f64,
}
