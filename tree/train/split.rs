use super::EPSILON;
use itertools::Itertools;
use ndarray::prelude::*;

/// A split is only made if its gain is at least this value.
const MIN_GAIN_TO_SPLIT: f64 = 1e-10;

#[derive(Debug)]
pub struct ChooseBestSplitOutput {
	pub gain: f64,
	pub feature_index: usize,
	pub split_value: f64,
	/// The number of examples sent left. They are the first `left_n_examples` entries of `sorted_examples[feature_index]`.
	pub left_n_examples: usize,
}

/// Find the split with the highest gain across all features, if one exists.
///
/// `sorted_examples[feature_index]` lists the node's examples in ascending order of that feature's value. Every boundary between two adjacent examples with different values is a candidate. The first candidate with the strictly highest gain wins, so ties go to the lower feature index and then to the leftmost boundary.
pub fn choose_best_split(
	features: ArrayView2<f64>,
	gradients: &[f64],
	sorted_examples: &[Vec<usize>],
	sum_gradients: f64,
	n_examples: usize,
) -> Option<ChooseBestSplitOutput> {
	let parent_score = score(sum_gradients, n_examples);
	let mut best_split: Option<ChooseBestSplitOutput> = None;
	let mut best_gain = 0.0;
	for (feature_index, examples) in sorted_examples.iter().enumerate() {
		let values = features.column(feature_index);
		let mut left_sum_gradients = 0.0;
		let mut left_n_examples = 0;
		for (&example, &next_example) in examples.iter().tuple_windows() {
			left_sum_gradients += gradients[example];
			left_n_examples += 1;
			let value = values[example];
			let next_value = values[next_example];
			// There is no threshold that separates equal values.
			if value == next_value {
				continue;
			}
			let right_sum_gradients = sum_gradients - left_sum_gradients;
			let right_n_examples = n_examples - left_n_examples;
			let gain = score(left_sum_gradients, left_n_examples)
				+ score(right_sum_gradients, right_n_examples)
				- parent_score;
			if gain > best_gain {
				best_gain = gain;
				best_split = Some(ChooseBestSplitOutput {
					gain,
					feature_index,
					split_value: (value + next_value) / 2.0,
					left_n_examples,
				});
			}
		}
	}
	best_split.filter(|split| split.gain >= MIN_GAIN_TO_SPLIT)
}

fn score(sum_gradients: f64, n_examples: usize) -> f64 {
	sum_gradients * sum_gradients / (n_examples as f64 + EPSILON)
}

#[test]
fn test_choose_best_split() {
	let features = arr2(&[[1.0, 7.0], [2.0, 7.0], [3.0, 7.0], [4.0, 7.0]]);
	let gradients = [-1.0, -1.0, 1.0, 1.0];
	let sorted_examples = vec![vec![0, 1, 2, 3], vec![0, 1, 2, 3]];
	let split = choose_best_split(features.view(), &gradients, &sorted_examples, 0.0, 4).unwrap();
	assert_eq!(split.feature_index, 0);
	assert_eq!(split.split_value, 2.5);
	assert_eq!(split.left_n_examples, 2);
	assert!((split.gain - 4.0).abs() < 1e-8);
}

#[test]
fn test_choose_best_split_skips_equal_values() {
	// The only boundary with distinct values on either side is between 1 and 2.
	let features = arr2(&[[1.0], [1.0], [1.0], [2.0]]);
	let gradients = [-1.0, 1.0, -1.0, 1.0];
	let sorted_examples = vec![vec![0, 1, 2, 3]];
	let split = choose_best_split(features.view(), &gradients, &sorted_examples, 0.0, 4).unwrap();
	assert_eq!(split.split_value, 1.5);
	assert_eq!(split.left_n_examples, 3);
	assert!((split.gain - (1.0 / 3.0 + 1.0)).abs() < 1e-8);
}

#[test]
fn test_choose_best_split_none() {
	// Every value is the same, so there are no candidate boundaries.
	let features = arr2(&[[3.0], [3.0], [3.0]]);
	let gradients = [-1.0, 0.5, 1.0];
	let sorted_examples = vec![vec![0, 1, 2]];
	assert!(choose_best_split(features.view(), &gradients, &sorted_examples, 0.5, 3).is_none());
	// Identical gradients everywhere give no gain.
	let features = arr2(&[[1.0], [2.0], [3.0]]);
	let gradients = [0.25, 0.25, 0.25];
	assert!(choose_best_split(features.view(), &gradients, &sorted_examples, 0.75, 3).is_none());
}
