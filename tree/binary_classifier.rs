//! Functions used by the shared training and prediction code when the objective is [`Objective::Binary`](crate::Objective::Binary).

use itertools::izip;
use ndarray::prelude::*;
use num_traits::clamp;
use std::ops::Neg;

/// The initial logit. It is a raw value fed through the sigmoid, so the untrained model predicts `sigmoid(0.5)` rather than `0.5`.
pub const BIAS: f64 = 0.5;

/// Compute the gradients for each example given the labels and the current logits. The gradient is the negative gradient of the log loss, `label - sigmoid(logit)`.
pub fn compute_gradients(
	// (n_examples)
	gradients: &mut [f64],
	// (n_examples)
	labels: ArrayView1<f64>,
	// (n_examples)
	logits: &[f64],
) {
	izip!(gradients.iter_mut(), labels.iter(), logits.iter()).for_each(
		|(gradient, label, logit)| {
			*gradient = label - sigmoid(*logit);
		},
	);
}

/// Compute the binary cross entropy loss.
pub fn compute_loss(labels: ArrayView1<f64>, logits: &[f64]) -> f64 {
	let mut total = 0.0;
	for (label, logit) in labels.iter().zip(logits) {
		let probability = clamp(sigmoid(*logit), std::f64::EPSILON, 1.0 - std::f64::EPSILON);
		total += -1.0 * label * probability.ln() + -1.0 * (1.0 - label) * (1.0 - probability).ln();
	}
	total / labels.len() as f64
}

/// Turn an accumulated logit into a probability.
pub fn transform(logit: f64) -> f64 {
	sigmoid(logit)
}

pub fn sigmoid(value: f64) -> f64 {
	1.0 / (value.neg().exp() + 1.0)
}

#[test]
fn test_gradients() {
	let labels = arr1(&[0.0, 1.0]);
	let logits = [0.0, 0.0];
	let mut gradients = [0.0; 2];
	compute_gradients(&mut gradients, labels.view(), &logits);
	assert_eq!(gradients, [-0.5, 0.5]);
}

#[test]
fn test_loss() {
	let labels = arr1(&[0.0, 1.0]);
	let loss = compute_loss(labels.view(), &[0.0, 0.0]);
	assert!((loss - 2.0f64.ln()).abs() < 1e-12);
	// Confident, correct logits drive the loss toward zero without producing infinities.
	let loss = compute_loss(labels.view(), &[-1000.0, 1000.0]);
	assert!(loss.is_finite());
	assert!(loss < 1e-10);
}

#[test]
fn test_sigmoid() {
	assert_eq!(sigmoid(0.0), 0.5);
	assert!(sigmoid(-1000.0) >= 0.0);
	assert!(sigmoid(1000.0) <= 1.0);
}
