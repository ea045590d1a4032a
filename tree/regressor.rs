//! Functions used by the shared training and prediction code when the objective is [`Objective::Regression`](crate::Objective::Regression).

use itertools::izip;
use ndarray::prelude::*;
use num_traits::clamp;

/// Each residual is scaled by this value before a tree is fit to it.
const GRADIENT_DAMPING: f64 = 0.1;

/// The bias is the mean of the labels. Without labels it is 0.
pub fn compute_bias(labels: &[f64]) -> f64 {
	if labels.is_empty() {
		return 0.0;
	}
	labels.iter().sum::<f64>() / labels.len() as f64
}

/// Compute the gradients for each example given the labels and the current predictions. The gradient is the damped residual between the label and the prediction clamped to `[0, 1]`.
pub fn compute_gradients(
	// (n_examples)
	gradients: &mut [f64],
	// (n_examples)
	labels: ArrayView1<f64>,
	// (n_examples)
	predictions: &[f64],
) {
	izip!(gradients.iter_mut(), labels.iter(), predictions.iter()).for_each(
		|(gradient, label, prediction)| {
			*gradient = (label - clamp(*prediction, 0.0, 1.0)) * GRADIENT_DAMPING;
		},
	);
}

/// Compute the mean squared error of the clamped predictions.
pub fn compute_loss(labels: ArrayView1<f64>, predictions: &[f64]) -> f64 {
	let mut loss = 0.0;
	for (label, prediction) in labels.iter().zip(predictions) {
		loss += (label - transform(*prediction)).powi(2);
	}
	loss / labels.len() as f64
}

pub fn transform(prediction: f64) -> f64 {
	clamp(prediction, 0.0, 1.0)
}

#[test]
fn test_bias() {
	assert_eq!(compute_bias(&[0.25, 0.75, 0.5]), 0.5);
	assert_eq!(compute_bias(&[]), 0.0);
}

#[test]
fn test_gradients() {
	let labels = arr1(&[1.0, 0.0, 0.5]);
	// The second prediction is clamped to 1 before the residual is taken.
	let predictions = [0.5, 3.0, 0.5];
	let mut gradients = [0.0; 3];
	compute_gradients(&mut gradients, labels.view(), &predictions);
	assert!((gradients[0] - 0.05).abs() < 1e-12);
	assert!((gradients[1] + 0.1).abs() < 1e-12);
	assert_eq!(gradients[2], 0.0);
}

#[test]
fn test_loss() {
	let labels = arr1(&[1.0, 0.0]);
	assert_eq!(compute_loss(labels.view(), &[2.0, -2.0]), 0.0);
	assert_eq!(compute_loss(labels.view(), &[0.0, 1.0]), 1.0);
}
