/*!
Models are saved either as JSON or as a binary model file. The binary format is a single byte holding the major version followed by the model encoded with MessagePack.

The trees, the options, the bias, and the number of features are saved. The training losses are not.
*/

use crate::{Error, Model, Node, Tree};
use std::{
	io::{Read, Write},
	path::Path,
};

const MAJOR_VERSION: u8 = 0;

impl Model {
	pub fn to_json(&self) -> Result<String, Error> {
		Ok(serde_json::to_string(self)?)
	}

	pub fn to_json_pretty(&self) -> Result<String, Error> {
		Ok(serde_json::to_string_pretty(self)?)
	}

	/// Deserialize a `Model` from JSON, checking that every tree is well formed.
	pub fn from_json(json: &str) -> Result<Self, Error> {
		let model: Model = serde_json::from_str(json)?;
		model.check_trees()?;
		Ok(model)
	}

	/// Serialize this `Model` to the binary model format.
	pub fn to_vec(&self) -> Result<Vec<u8>, Error> {
		let mut bytes = vec![MAJOR_VERSION];
		rmp_serde::encode::write_named(&mut bytes, self)?;
		Ok(bytes)
	}

	/// Deserialize a `Model` from a slice in the binary model format.
	pub fn from_slice(slice: &[u8]) -> Result<Self, Error> {
		let (major_version, mut slice) = slice
			.split_first()
			.ok_or_else(|| Error::InvalidModel("the model is empty".to_owned()))?;
		if *major_version != MAJOR_VERSION {
			return Err(Error::UnknownVersion(*major_version));
		}
		let model: Model = rmp_serde::from_read(&mut slice)?;
		model.check_trees()?;
		Ok(model)
	}

	/// Write this model to the file at `path` in the binary model format.
	pub fn to_file(&self, path: &Path) -> Result<(), Error> {
		let file = std::fs::File::create(path)?;
		let mut writer = std::io::BufWriter::new(file);
		writer.write_all(&[MAJOR_VERSION])?;
		rmp_serde::encode::write_named(&mut writer, self)?;
		writer.flush()?;
		Ok(())
	}

	/// Deserialize a `Model` by reading the file at `path` in the binary model format.
	pub fn from_path(path: &Path) -> Result<Self, Error> {
		let file = std::fs::File::open(path)?;
		let mut reader = std::io::BufReader::new(file);
		let mut major_version = [0u8; 1];
		reader.read_exact(&mut major_version)?;
		let major_version = major_version[0];
		if major_version != MAJOR_VERSION {
			return Err(Error::UnknownVersion(major_version));
		}
		let model: Model = rmp_serde::from_read(&mut reader)?;
		model.check_trees()?;
		Ok(model)
	}

	fn check_trees(&self) -> Result<(), Error> {
		for (tree_index, tree) in self.trees.iter().enumerate() {
			check_tree(tree).map_err(|message| {
				Error::InvalidModel(format!("tree {}: {}", tree_index, message))
			})?;
		}
		Ok(())
	}
}

/// A tree is well formed if it has a root and every branch's children come after it and exist.
fn check_tree(tree: &Tree) -> Result<(), String> {
	if tree.nodes.is_empty() {
		return Err("the tree has no nodes".to_owned());
	}
	let n_nodes = tree.nodes.len();
	for (node_index, node) in tree.nodes.iter().enumerate() {
		if let Node::Branch(branch) = node {
			for child_index in [branch.left_child_index, branch.right_child_index].iter() {
				if *child_index <= node_index || *child_index >= n_nodes {
					return Err(format!(
						"node {} has an invalid child index {}",
						node_index, child_index
					));
				}
			}
		}
	}
	Ok(())
}

#[cfg(test)]
fn trained_model(objective: crate::Objective) -> (Model, ndarray::Array2<f64>) {
	use crate::TrainOptions;
	use ndarray::prelude::*;
	let features = arr2(&[
		[1.0, 0.9, 3.0],
		[2.0, 0.4, 1.0],
		[3.0, 0.7, 4.0],
		[4.0, 0.1, 1.0],
		[5.0, 0.5, 5.0],
		[6.0, 0.2, 9.0],
		[7.0, 0.8, 2.0],
		[8.0, 0.3, 6.0],
	]);
	let labels = arr1(&[1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
	let mut model = Model::new(TrainOptions {
		num_rounds: 15,
		max_depth: 3,
		objective,
		..Default::default()
	});
	model.train(features.view(), labels.view()).unwrap();
	(model, features)
}

#[test]
fn test_json_round_trip() {
	use crate::Objective;
	let (model, features) = trained_model(Objective::Binary);
	let json = model.to_json().unwrap();
	let restored = Model::from_json(&json).unwrap();
	assert_eq!(restored.trees(), model.trees());
	assert_eq!(restored.options(), model.options());
	assert_eq!(restored.n_features(), Some(3));
	let held_out = ndarray::arr2(&[[0.0, 0.0, 0.0], [4.5, 0.45, 2.5], [10.0, 1.0, 10.0]]);
	assert_eq!(restored.predict(features.view()), model.predict(features.view()));
	assert_eq!(restored.predict(held_out.view()), model.predict(held_out.view()));
}

#[test]
fn test_binary_round_trip() {
	use crate::Objective;
	let (model, features) = trained_model(Objective::Regression);
	let bytes = model.to_vec().unwrap();
	assert_eq!(bytes[0], MAJOR_VERSION);
	let restored = Model::from_slice(&bytes).unwrap();
	assert_eq!(restored.trees(), model.trees());
	assert_eq!(restored.bias, model.bias);
	assert_eq!(restored.predict(features.view()), model.predict(features.view()));
	assert_eq!(restored.feature_importances(), model.feature_importances());
}

#[test]
fn test_file_round_trip() {
	use crate::Objective;
	let (model, features) = trained_model(Objective::Binary);
	let path = std::env::temp_dir().join(format!("scorer_tree_test_{}.model", std::process::id()));
	model.to_file(&path).unwrap();
	let restored = Model::from_path(&path);
	std::fs::remove_file(&path).unwrap();
	let restored = restored.unwrap();
	for example in features.genrows() {
		let example = example.to_vec();
		assert_eq!(restored.predict_one(&example), model.predict_one(&example));
	}
}

#[test]
fn test_zero_tree_round_trip() {
	use crate::{Objective, TrainOptions};
	use ndarray::prelude::*;
	let features = arr2(&[[1.0, 10.0], [2.0, 20.0], [3.0, 30.0]]);
	let labels = arr1(&[0.2, 0.4, 0.3]);
	for objective in [Objective::Binary, Objective::Regression].iter() {
		let mut model = Model::new(TrainOptions {
			num_rounds: 0,
			objective: *objective,
			..Default::default()
		});
		model.train(features.view(), labels.view()).unwrap();
		let from_json = Model::from_json(&model.to_json().unwrap()).unwrap();
		let from_slice = Model::from_slice(&model.to_vec().unwrap()).unwrap();
		for example in features.genrows() {
			let example = example.to_vec();
			let expected = model.predict_one(&example);
			assert_eq!(from_json.predict_one(&example), expected);
			assert_eq!(from_slice.predict_one(&example), expected);
		}
	}
	let model = Model::new(TrainOptions::default());
	let restored = Model::from_json(&model.to_json().unwrap()).unwrap();
	assert_eq!(restored.predict_one(&[1.0, 10.0]), 0.0);
}

#[test]
fn test_attach_training_summary() {
	use crate::TrainOptions;
	let json = r#"{"trees":[],"options":{"objective":"regression","num_rounds":0}}"#;
	let mut model = Model::from_json(json).unwrap();
	assert_eq!(model.predict_one(&[1.0]), 0.0);
	assert_eq!(model.feature_importances(), Vec::<f64>::new());
	model.attach_training_summary(&[0.2, 0.6], 2);
	assert!((model.predict_one(&[1.0, 2.0]) - 0.4).abs() < 1e-12);
	assert_eq!(model.feature_importances(), vec![0.0, 0.0]);
	assert_eq!(model.options(), &TrainOptions {
		objective: crate::Objective::Regression,
		num_rounds: 0,
		..Default::default()
	});
}

#[test]
fn test_json_format() {
	use crate::{BranchNode, LeafNode, TrainOptions};
	let mut model = Model::new(TrainOptions::default());
	model.trees.push(Tree {
		nodes: vec![
			Node::Branch(BranchNode {
				feature_index: 0,
				split_value: 2.5,
				left_child_index: 1,
				right_child_index: 2,
			}),
			Node::Leaf(LeafNode { value: -0.5 }),
			Node::Leaf(LeafNode { value: 0.25 }),
		],
	});
	insta::assert_snapshot!(model.to_json_pretty().unwrap(), @r###"
 {
   "trees": [
     {
       "nodes": [
         {
           "type": "branch",
           "feature_index": 0,
           "split_value": 2.5,
           "left_child_index": 1,
           "right_child_index": 2
         },
         {
           "type": "leaf",
           "value": -0.5
         },
         {
           "type": "leaf",
           "value": 0.25
         }
       ]
     }
   ],
   "options": {
     "learning_rate": 0.3,
     "max_depth": 4,
     "min_child_weight": 1.0,
     "num_rounds": 100,
     "objective": "binary",
     "compute_loss": false
   }
 }
 "###);
}

#[test]
fn test_invalid_models() {
	let json = r#"{"trees":[{"nodes":[{"type":"branch","feature_index":0,"split_value":1.0,"left_child_index":0,"right_child_index":1},{"type":"leaf","value":1.0}]}],"options":{}}"#;
	assert!(matches!(Model::from_json(json), Err(Error::InvalidModel(_))));
	let json = r#"{"trees":[{"nodes":[]}],"options":{}}"#;
	assert!(matches!(Model::from_json(json), Err(Error::InvalidModel(_))));
	let json = r#"{"trees":[],"options":{"num_rounds":7}}"#;
	let model = Model::from_json(json).unwrap();
	assert_eq!(model.options().num_rounds, 7);
	assert_eq!(model.options().learning_rate, 0.3);
	assert!(matches!(Model::from_slice(&[]), Err(Error::InvalidModel(_))));
	assert!(matches!(Model::from_slice(&[1, 2, 3]), Err(Error::UnknownVersion(1))));
	assert!(matches!(Model::from_json("[1, 2"), Err(Error::Json(_))));
}
