use crate::{BranchNode, Model, Node, Tree};

impl Model {
	/// The importance of each feature as a percentage of all the splits in the model. The entries sum to 100 if the model has any split and are all 0 otherwise.
	pub fn feature_importances(&self) -> Vec<f64> {
		compute_feature_importances(&self.trees, self.n_features.unwrap_or(0))
	}
}

/// This function computes feature importances using the "split" method, where a feature's importance is proportional to the number of branch nodes that use it to split. Only nodes reachable from each tree's root are counted.
pub fn compute_feature_importances(trees: &[Tree], n_features: usize) -> Vec<f64> {
	let mut feature_importances = vec![0.0; n_features];
	for tree in trees.iter() {
		let mut stack = vec![0];
		while let Some(node_index) = stack.pop() {
			if let Some(Node::Branch(BranchNode {
				feature_index,
				left_child_index,
				right_child_index,
				..
			})) = tree.nodes.get(node_index)
			{
				if let Some(feature_importance) = feature_importances.get_mut(*feature_index) {
					*feature_importance += 1.0;
				}
				for child_index in [*right_child_index, *left_child_index].iter() {
					if *child_index > node_index {
						stack.push(*child_index);
					}
				}
			}
		}
	}
	// Normalize the feature importances.
	let total: f64 = feature_importances.iter().sum();
	if total > 0.0 {
		for feature_importance in feature_importances.iter_mut() {
			*feature_importance = *feature_importance / total * 100.0;
		}
	}
	feature_importances
}

#[test]
fn test_feature_importances() {
	use crate::LeafNode;
	let branch = |feature_index, left_child_index, right_child_index| {
		Node::Branch(BranchNode {
			feature_index,
			split_value: 0.0,
			left_child_index,
			right_child_index,
		})
	};
	let leaf = || Node::Leaf(LeafNode { value: 0.0 });
	let trees = vec![
		Tree {
			nodes: vec![branch(0, 1, 4), branch(2, 2, 3), leaf(), leaf(), leaf()],
		},
		Tree {
			nodes: vec![branch(0, 1, 2), leaf(), leaf()],
		},
		Tree {
			// The last node is unreachable and a split on feature 9 is out of range.
			nodes: vec![branch(9, 1, 2), leaf(), leaf(), branch(1, 0, 0)],
		},
	];
	insta::assert_debug_snapshot!(compute_feature_importances(&trees, 3), @r###"
 [
     66.66666666666666,
     0.0,
     33.33333333333333,
 ]
 "###);
}

#[test]
fn test_feature_importances_without_splits() {
	use crate::{LeafNode, TrainOptions};
	use ndarray::prelude::*;
	let trees = vec![Tree {
		nodes: vec![Node::Leaf(LeafNode { value: 1.0 })],
	}];
	assert_eq!(compute_feature_importances(&trees, 2), vec![0.0, 0.0]);
	assert_eq!(compute_feature_importances(&[], 3), vec![0.0, 0.0, 0.0]);
	let mut model = Model::new(TrainOptions {
		num_rounds: 0,
		..Default::default()
	});
	assert!(model.feature_importances().is_empty());
	let features = arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
	model.train(features.view(), arr1(&[0.0, 1.0]).view()).unwrap();
	assert_eq!(model.feature_importances(), vec![0.0, 0.0, 0.0]);
}

#[test]
fn test_feature_importances_sum_to_100() {
	use crate::TrainOptions;
	use ndarray::prelude::*;
	let features = arr2(&[
		[1.0, 9.0, 0.5],
		[2.0, 3.0, 0.1],
		[3.0, 7.0, 0.7],
		[4.0, 1.0, 0.2],
		[5.0, 8.0, 0.9],
		[6.0, 2.0, 0.4],
		[7.0, 6.0, 0.3],
		[8.0, 4.0, 0.8],
	]);
	let labels = arr1(&[0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0]);
	let mut model = Model::new(TrainOptions {
		num_rounds: 10,
		..Default::default()
	});
	model.train(features.view(), labels.view()).unwrap();
	let feature_importances = model.feature_importances();
	assert_eq!(feature_importances.len(), 3);
	let total: f64 = feature_importances.iter().sum();
	assert!((total - 100.0).abs() < 1e-6);
}
