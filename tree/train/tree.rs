use super::{
	split::{choose_best_split, ChooseBestSplitOutput},
	EPSILON,
};
use crate::{BranchNode, LeafNode, Node, TrainOptions, Tree};
use ndarray::prelude::*;

/// A node whose gradients sum to less than this in absolute value becomes a leaf.
const MIN_ABS_SUM_GRADIENTS: f64 = 1e-10;

/// For each feature, compute the indexes of all examples sorted by that feature's value. Ties keep their original order.
pub fn compute_sorted_examples(features: ArrayView2<f64>) -> Vec<Vec<usize>> {
	features
		.axis_iter(Axis(1))
		.map(|values| {
			let mut examples: Vec<usize> = (0..values.len()).collect();
			examples.sort_by(|a, b| values[*a].total_cmp(&values[*b]));
			examples
		})
		.collect()
}

/// Grow a single tree fit to `gradients`. `sorted_examples` must come from [`compute_sorted_examples`] for the same `features`.
pub fn train_tree(
	features: ArrayView2<f64>,
	gradients: &[f64],
	sorted_examples: Vec<Vec<usize>>,
	options: &TrainOptions,
) -> Tree {
	let mut builder = TreeBuilder {
		features: features.reborrow(),
		gradients,
		options,
		nodes: Vec::new(),
		goes_left: vec![false; features.nrows()],
	};
	builder.grow(sorted_examples, 0);
	Tree {
		nodes: builder.nodes,
	}
}

struct TreeBuilder<'a> {
	features: ArrayView2<'a, f64>,
	gradients: &'a [f64],
	options: &'a TrainOptions,
	nodes: Vec<Node>,
	/// Scratch space indexed by example, marking which side of the current split each example is sent to.
	goes_left: Vec<bool>,
}

impl<'a> TreeBuilder<'a> {
	/// Add the node for the examples in `sorted_examples`, and recursively its children, returning its index. Every entry of `sorted_examples` holds the same set of examples, each in a different order.
	fn grow(&mut self, sorted_examples: Vec<Vec<usize>>, depth: usize) -> usize {
		let node_index = self.nodes.len();
		let examples = sorted_examples.first().map(Vec::as_slice).unwrap_or(&[]);
		let n_examples = examples.len();
		let sum_gradients: f64 = examples.iter().map(|example| self.gradients[*example]).sum();

		let should_stop = depth >= self.options.max_depth
			|| (n_examples as f64) < self.options.min_child_weight
			|| sum_gradients.abs() < MIN_ABS_SUM_GRADIENTS
			|| n_examples < 2;
		if should_stop {
			self.nodes.push(leaf(sum_gradients, n_examples));
			return node_index;
		}

		let best_split = choose_best_split(
			self.features,
			self.gradients,
			&sorted_examples,
			sum_gradients,
			n_examples,
		);
		let best_split = match best_split {
			Some(best_split) => best_split,
			None => {
				self.nodes.push(leaf(sum_gradients, n_examples));
				return node_index;
			}
		};

		// The left child is always the next node. The right child's index is known once the left subtree is complete.
		self.nodes.push(Node::Branch(BranchNode {
			feature_index: best_split.feature_index,
			split_value: best_split.split_value,
			left_child_index: node_index + 1,
			right_child_index: node_index + 1,
		}));
		let (left_sorted_examples, right_sorted_examples) =
			partition_sorted_examples(sorted_examples, &best_split, &mut self.goes_left);
		self.grow(left_sorted_examples, depth + 1);
		let right_child_index = self.grow(right_sorted_examples, depth + 1);
		if let Some(branch) = self.nodes[node_index].as_branch_mut() {
			branch.right_child_index = right_child_index;
		}
		node_index
	}
}

fn leaf(sum_gradients: f64, n_examples: usize) -> Node {
	Node::Leaf(LeafNode {
		value: sum_gradients / (n_examples as f64 + EPSILON),
	})
}

/// Split every feature's sorted examples into the examples sent left and right by `split`, keeping each feature's order. The children therefore search exactly their own examples, in sorted order, without sorting again.
fn partition_sorted_examples(
	sorted_examples: Vec<Vec<usize>>,
	split: &ChooseBestSplitOutput,
	goes_left: &mut [bool],
) -> (Vec<Vec<usize>>, Vec<Vec<usize>>) {
	let (left, right) = sorted_examples[split.feature_index].split_at(split.left_n_examples);
	for example in left {
		goes_left[*example] = true;
	}
	for example in right {
		goes_left[*example] = false;
	}
	let goes_left = &*goes_left;
	sorted_examples
		.into_iter()
		.map(|examples| {
			examples
				.into_iter()
				.partition::<Vec<usize>, _>(|example| goes_left[*example])
		})
		.unzip()
}

#[test]
fn test_compute_sorted_examples() {
	let features = arr2(&[[3.0, 1.0], [1.0, 1.0], [2.0, 0.0]]);
	let sorted_examples = compute_sorted_examples(features.view());
	assert_eq!(sorted_examples, vec![vec![1, 2, 0], vec![2, 0, 1]]);
}

#[test]
fn test_single_example_is_leaf() {
	let features = arr2(&[[5.0, 1.0]]);
	let gradients = [0.75];
	let options = TrainOptions {
		max_depth: 10,
		min_child_weight: 0.0,
		..Default::default()
	};
	let tree = train_tree(
		features.view(),
		&gradients,
		compute_sorted_examples(features.view()),
		&options,
	);
	assert_eq!(tree.nodes.len(), 1);
	match &tree.nodes[0] {
		Node::Leaf(LeafNode { value }) => assert!((value - 0.75).abs() < 1e-9),
		node => panic!("expected a leaf, got {:?}", node),
	}
}

#[test]
fn test_stopping_conditions() {
	let features = arr2(&[[1.0], [2.0], [3.0], [4.0]]);
	let sorted_examples = compute_sorted_examples(features.view());
	let gradients = [-1.0, -1.0, 1.0, 2.0];
	// Too deep.
	let options = TrainOptions {
		max_depth: 0,
		..Default::default()
	};
	let tree = train_tree(features.view(), &gradients, sorted_examples.clone(), &options);
	assert_eq!(tree.nodes.len(), 1);
	// Too few examples.
	let options = TrainOptions {
		min_child_weight: 5.0,
		..Default::default()
	};
	let tree = train_tree(features.view(), &gradients, sorted_examples.clone(), &options);
	assert_eq!(tree.nodes.len(), 1);
	// Gradients that cancel out.
	let gradients = [-1.0, -1.0, 1.0, 1.0];
	let tree = train_tree(
		features.view(),
		&gradients,
		sorted_examples,
		&TrainOptions::default(),
	);
	assert_eq!(tree.nodes.len(), 1);
	assert_eq!(tree.nodes[0], Node::Leaf(LeafNode { value: 0.0 }));
}

#[test]
fn test_children_search_their_own_examples() {
	// The root splits on feature 0 between 3 and 4. The left child holds examples 0, 1 and 2, and its best split separates example 1 from the others on feature 1.
	let features = arr2(&[[1.0, 30.0], [2.0, 10.0], [3.0, 20.0], [4.0, 25.0]]);
	let gradients = [-1.0, -6.0, -1.0, 6.0];
	let options = TrainOptions {
		max_depth: 2,
		..Default::default()
	};
	let tree = train_tree(
		features.view(),
		&gradients,
		compute_sorted_examples(features.view()),
		&options,
	);
	assert_eq!(tree.nodes.len(), 5);
	let root = tree.nodes[0].as_branch().unwrap();
	assert_eq!(root.feature_index, 0);
	assert_eq!(root.split_value, 3.5);
	assert_eq!(root.left_child_index, 1);
	assert_eq!(root.right_child_index, 4);
	let left = tree.nodes[1].as_branch().unwrap();
	assert_eq!(left.feature_index, 1);
	assert_eq!(left.split_value, 15.0);
	assert_eq!(
		tree.nodes[left.left_child_index],
		Node::Leaf(LeafNode {
			value: -6.0 / (1.0 + EPSILON)
		})
	);
	assert_eq!(
		tree.nodes[left.right_child_index],
		Node::Leaf(LeafNode {
			value: -2.0 / (2.0 + EPSILON)
		})
	);
	assert_eq!(
		tree.nodes[4],
		Node::Leaf(LeafNode {
			value: 6.0 / (1.0 + EPSILON)
		})
	);
}
