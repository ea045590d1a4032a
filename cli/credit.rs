/*!
The built-in small business credit data used by `scorer demo`. Each example has eight business metrics. An example is labeled good credit when it meets at least seven of the eight thresholds below.
*/

use ndarray::prelude::*;
use num_traits::clamp;
use scorer_tree::{Objective, TrainOptions};

pub const FEATURE_NAMES: [&str; 8] = [
	"Annual Revenue",
	"Debt to Equity",
	"Payment History",
	"Cash Reserves",
	"Years in Business",
	"Industry Risk",
	"Late Payments",
	"Credit Utilization",
];

/// Millions.
const MIN_ANNUAL_REVENUE: f64 = 1.0;
const MAX_DEBT_TO_EQUITY: f64 = 1.3;
/// The fraction of payments made on time.
const MIN_PAYMENT_HISTORY: f64 = 0.78;
/// Millions.
const MIN_CASH_RESERVES: f64 = 0.5;
const MIN_YEARS_IN_BUSINESS: f64 = 2.0;
/// On a scale from 1 to 10.
const MAX_INDUSTRY_RISK: f64 = 7.0;
const MAX_LATE_PAYMENTS: f64 = 6.0;
const MAX_CREDIT_UTILIZATION: f64 = 0.65;

const MIN_THRESHOLDS_FOR_GOOD_CREDIT: usize = 7;

const TRAINING_EXAMPLES: [[f64; 8]; 25] = [
	// boundary cases
	[1.0, 0.8, 0.78, 0.5, 2.0, 7.0, 6.0, 0.65],
	[1.1, 1.3, 0.79, 0.51, 3.0, 6.0, 5.0, 0.64],
	[0.9, 1.4, 0.77, 0.49, 1.0, 8.0, 7.0, 0.66],
	// strong performers
	[50.0, 0.5, 0.95, 5.0, 10.0, 3.0, 1.0, 0.30],
	[30.0, 0.7, 0.93, 3.0, 8.0, 4.0, 2.0, 0.40],
	[20.0, 0.6, 0.94, 2.5, 7.0, 3.0, 1.0, 0.35],
	[1.5, 0.4, 0.98, 0.6, 3.0, 4.0, 0.0, 0.25],
	[1.2, 0.5, 0.96, 0.55, 2.0, 3.0, 1.0, 0.30],
	[1.8, 0.3, 0.97, 0.7, 4.0, 5.0, 0.0, 0.35],
	// mixed performance
	[15.0, 1.8, 0.75, 0.3, 5.0, 8.0, 7.0, 0.80],
	[12.0, 1.6, 0.77, 0.4, 4.0, 7.0, 8.0, 0.75],
	[1.3, 0.6, 0.92, 0.6, 3.0, 4.0, 2.0, 0.45],
	[1.6, 0.7, 0.90, 0.55, 2.0, 5.0, 3.0, 0.50],
	// industry risk
	[8.0, 0.8, 0.93, 1.2, 6.0, 8.0, 2.0, 0.45],
	[6.0, 0.9, 0.91, 1.0, 5.0, 9.0, 3.0, 0.50],
	[7.0, 1.7, 0.76, 0.3, 4.0, 3.0, 7.0, 0.85],
	[5.0, 1.8, 0.75, 0.2, 3.0, 4.0, 8.0, 0.90],
	// payment history
	[4.0, 0.9, 0.95, 0.8, 5.0, 6.0, 1.0, 0.55],
	[3.0, 1.0, 0.94, 0.7, 4.0, 5.0, 2.0, 0.60],
	[6.0, 1.4, 0.70, 0.9, 6.0, 7.0, 9.0, 0.70],
	[5.0, 1.5, 0.72, 0.8, 5.0, 6.0, 8.0, 0.75],
	// cash reserves
	[10.0, 1.1, 0.88, 2.5, 7.0, 5.0, 3.0, 0.60],
	[8.0, 1.2, 0.87, 2.0, 6.0, 6.0, 4.0, 0.62],
	[12.0, 1.3, 0.86, 0.2, 8.0, 7.0, 5.0, 0.68],
	[9.0, 1.4, 0.85, 0.1, 7.0, 8.0, 6.0, 0.70],
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
	Good,
	Bad,
}

impl std::fmt::Display for Outcome {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Outcome::Good => write!(f, "GOOD"),
			Outcome::Bad => write!(f, "BAD"),
		}
	}
}

pub struct Scenario {
	pub description: &'static str,
	pub features: [f64; 8],
	pub expected_outcome: Outcome,
}

pub const SCENARIOS: [Scenario; 16] = [
	Scenario {
		description: "Well-balanced business with multiple strengths",
		features: [5.0, 0.5, 0.94, 0.8, 4.0, 4.0, 1.0, 0.4],
		expected_outcome: Outcome::Good,
	},
	Scenario {
		description: "High revenue but poor risk management",
		features: [25.0, 2.2, 0.76, 0.2, 5.0, 8.0, 7.0, 0.9],
		expected_outcome: Outcome::Bad,
	},
	Scenario {
		description: "Small but excellently managed business",
		features: [1.8, 0.4, 0.96, 0.4, 6.0, 3.0, 0.0, 0.3],
		expected_outcome: Outcome::Good,
	},
	Scenario {
		description: "Growing business with cash flow issues",
		features: [12.0, 1.1, 0.91, 0.15, 3.0, 7.0, 5.0, 0.8],
		expected_outcome: Outcome::Bad,
	},
	Scenario {
		description: "Conservative mid-sized business",
		features: [3.0, 0.7, 0.93, 1.5, 5.0, 5.0, 2.0, 0.5],
		expected_outcome: Outcome::Good,
	},
	Scenario {
		description: "Established business showing decline",
		features: [7.0, 1.8, 0.79, 0.1, 8.0, 6.0, 6.0, 0.85],
		expected_outcome: Outcome::Bad,
	},
	Scenario {
		description: "Strong payment history",
		features: [9.0, 1.0, 0.97, 0.7, 8.0, 6.0, 4.0, 0.65],
		expected_outcome: Outcome::Good,
	},
	Scenario {
		description: "Fast-growing business with weak risk management",
		features: [15.0, 2.5, 0.88, 0.3, 7.0, 8.0, 5.0, 0.7],
		expected_outcome: Outcome::Bad,
	},
	Scenario {
		description: "Small business with recent growth",
		features: [4.0, 0.6, 0.94, 0.5, 6.0, 5.0, 3.0, 0.6],
		expected_outcome: Outcome::Good,
	},
	Scenario {
		description: "Established business with cash flow issues",
		features: [18.0, 1.9, 0.85, 0.1, 8.0, 7.0, 6.0, 0.7],
		expected_outcome: Outcome::Bad,
	},
	Scenario {
		description: "Random test 1",
		features: [10.0, 1.4, 0.92, 0.75, 5.0, 4.0, 3.0, 0.55],
		expected_outcome: Outcome::Good,
	},
	Scenario {
		description: "Random test 2",
		features: [6.0, 0.8, 0.95, 0.8, 7.0, 5.0, 4.0, 0.7],
		expected_outcome: Outcome::Bad,
	},
	Scenario {
		description: "Random test 3",
		features: [8.0, 1.2, 0.87, 0.6, 6.0, 7.0, 5.0, 0.75],
		expected_outcome: Outcome::Good,
	},
	Scenario {
		description: "Random test 4",
		features: [2.0, 0.9, 0.89, 0.5, 5.0, 6.0, 3.0, 0.8],
		expected_outcome: Outcome::Bad,
	},
	Scenario {
		description: "Random test 5",
		features: [11.0, 1.3, 0.92, 0.6, 7.0, 6.0, 5.0, 0.75],
		expected_outcome: Outcome::Good,
	},
	Scenario {
		description: "Random test 6",
		features: [3.0, 0.8, 0.95, 0.9, 6.0, 5.0, 4.0, 0.7],
		expected_outcome: Outcome::Bad,
	},
];

/// Count how many of the eight good credit thresholds `features` meets.
pub fn thresholds_met(features: &[f64; 8]) -> usize {
	let checks = [
		features[0] >= MIN_ANNUAL_REVENUE,
		features[1] <= MAX_DEBT_TO_EQUITY,
		features[2] >= MIN_PAYMENT_HISTORY,
		features[3] >= MIN_CASH_RESERVES,
		features[4] >= MIN_YEARS_IN_BUSINESS,
		features[5] <= MAX_INDUSTRY_RISK,
		features[6] <= MAX_LATE_PAYMENTS,
		features[7] <= MAX_CREDIT_UTILIZATION,
	];
	checks.iter().filter(|check| **check).count()
}

pub fn label(features: &[f64; 8]) -> f64 {
	if thresholds_met(features) >= MIN_THRESHOLDS_FOR_GOOD_CREDIT {
		1.0
	} else {
		0.0
	}
}

/// The training features and their labels.
pub fn training_data() -> (Array2<f64>, Array1<f64>) {
	let features = Array2::from_shape_fn((TRAINING_EXAMPLES.len(), 8), |(row, column)| {
		TRAINING_EXAMPLES[row][column]
	});
	let labels = TRAINING_EXAMPLES.iter().map(label).collect();
	(features, labels)
}

pub fn demo_options() -> TrainOptions {
	TrainOptions {
		learning_rate: 0.05,
		max_depth: 6,
		min_child_weight: 2.0,
		num_rounds: 100,
		objective: Objective::Binary,
		compute_loss: false,
	}
}

pub fn outcome(probability: f64) -> Outcome {
	if probability >= 0.5 {
		Outcome::Good
	} else {
		Outcome::Bad
	}
}

/// Map a probability to a credit score between 300 and 850. The sigmoid spreads out probabilities near 0.5.
pub fn probability_to_credit_score(probability: f64) -> u32 {
	let probability = clamp(probability, 0.0, 1.0);
	let scaled = 1.0 / (1.0 + (-12.0 * (probability - 0.5)).exp());
	(300.0 + 550.0 * scaled).round() as u32
}

#[test]
fn test_thresholds_met() {
	assert_eq!(thresholds_met(&SCENARIOS[0].features), 8);
	assert_eq!(thresholds_met(&SCENARIOS[1].features), 2);
	assert_eq!(thresholds_met(&TRAINING_EXAMPLES[0]), 8);
}

#[test]
fn test_training_data() {
	let (features, labels) = training_data();
	assert_eq!(features.dim(), (25, 8));
	assert_eq!(features[[3, 0]], 50.0);
	assert_eq!(labels[0], 1.0);
	assert_eq!(labels[1], 1.0);
	assert_eq!(labels[2], 0.0);
	assert_eq!(labels[3], 1.0);
	assert_eq!(labels[9], 0.0);
}

#[test]
fn test_probability_to_credit_score() {
	assert_eq!(probability_to_credit_score(0.5), 575);
	assert_eq!(probability_to_credit_score(1.0), 849);
	assert_eq!(probability_to_credit_score(0.0), 301);
	assert_eq!(probability_to_credit_score(1.5), 849);
	assert_eq!(probability_to_credit_score(-0.5), 301);
	assert_eq!(outcome(0.5), Outcome::Good);
	assert_eq!(outcome(0.49), Outcome::Bad);
}
