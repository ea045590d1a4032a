use anyhow::{format_err, Context, Result};
use ndarray::prelude::*;
use std::path::Path;

/// A numeric table loaded from a csv file. Every column other than the target is a feature, in file order.
#[derive(Debug)]
pub struct Dataset {
	pub feature_names: Vec<String>,
	pub features: Array2<f64>,
	pub labels: Option<Array1<f64>>,
}

/// Load the csv file at `path`. The first row must be a header. If `target_column_name` is given, that column is returned as the labels.
pub fn load_dataset(path: &Path, target_column_name: Option<&str>) -> Result<Dataset> {
	let mut reader = csv::Reader::from_path(path)
		.with_context(|| format!("failed to open csv file {}", path.display()))?;
	let headers = reader.headers()?.clone();
	let target_column_index = match target_column_name {
		Some(target_column_name) => Some(
			headers
				.iter()
				.position(|header| header == target_column_name)
				.ok_or_else(|| {
					format_err!(
						"did not find target column \"{}\" in {}",
						target_column_name,
						path.display()
					)
				})?,
		),
		None => None,
	};
	let feature_names: Vec<String> = headers
		.iter()
		.enumerate()
		.filter(|(column_index, _)| Some(*column_index) != target_column_index)
		.map(|(_, header)| header.to_owned())
		.collect();

	let mut values = Vec::new();
	let mut labels = Vec::new();
	let mut n_rows = 0;
	for record in reader.records() {
		let record = record.with_context(|| format!("failed to read {}", path.display()))?;
		for (column_index, field) in record.iter().enumerate() {
			let value: f64 = field.trim().parse().with_context(|| {
				format!(
					"row {}, column \"{}\": \"{}\" is not a number",
					n_rows + 1,
					headers.get(column_index).unwrap_or_default(),
					field
				)
			})?;
			if Some(column_index) == target_column_index {
				labels.push(value);
			} else {
				values.push(value);
			}
		}
		n_rows += 1;
	}
	let features = Array2::from_shape_vec((n_rows, feature_names.len()), values)?;
	let labels = target_column_index.map(|_| Array1::from(labels));
	Ok(Dataset {
		feature_names,
		features,
		labels,
	})
}

#[cfg(test)]
fn write_csv(name: &str, contents: &str) -> std::path::PathBuf {
	let path = std::env::temp_dir().join(format!("scorer_{}_{}.csv", name, std::process::id()));
	std::fs::write(&path, contents).unwrap();
	path
}

#[test]
fn test_load_dataset() {
	let path = write_csv("load", "revenue,label,risk\n1.5,0,7\n3, 1 ,2\n");
	let with_target = load_dataset(&path, Some("label"));
	let without_target = load_dataset(&path, None);
	let missing_target = load_dataset(&path, Some("score"));
	std::fs::remove_file(&path).unwrap();

	let dataset = with_target.unwrap();
	assert_eq!(dataset.feature_names, vec!["revenue", "risk"]);
	assert_eq!(dataset.features, arr2(&[[1.5, 7.0], [3.0, 2.0]]));
	assert_eq!(dataset.labels, Some(arr1(&[0.0, 1.0])));

	let dataset = without_target.unwrap();
	assert_eq!(dataset.features.ncols(), 3);
	assert!(dataset.labels.is_none());

	assert!(missing_target.is_err());
}

#[test]
fn test_load_dataset_errors() {
	let path = write_csv("not_a_number", "a,b\n1,x\n");
	let result = load_dataset(&path, None);
	std::fs::remove_file(&path).unwrap();
	let message = format!("{:#}", result.unwrap_err());
	assert!(message.contains("\"x\" is not a number"));

	let path = write_csv("ragged", "a,b\n1,2\n3\n");
	let result = load_dataset(&path, None);
	std::fs::remove_file(&path).unwrap();
	assert!(result.is_err());
}
