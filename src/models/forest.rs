//! Tree ensemble classifier loaded from a JSON artifact.
//!
//! Each tree is a flat node array. Every node stores the class probability
//! distribution of the training samples that reached it, so predictions are
//! leaf distributions averaged across trees and attributions are the
//! per-split changes in that distribution along the decision path.

use crate::error::{DashboardError, Result};
use crate::models::{AttributionOutput, Classifier};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;

/// Split condition of an internal node. Rows with
/// `features[feature] <= threshold` go left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub feature: usize,
    pub threshold: f64,
    pub left: usize,
    pub right: usize,
}

/// Tree node; leaves have no split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// `[P(legit), P(fraud)]` among training samples at this node
    pub value: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<Split>,
}

impl TreeNode {
    pub fn leaf(p_fraud: f64) -> Self {
        Self {
            value: [1.0 - p_fraud, p_fraud],
            split: None,
        }
    }

    pub fn split(p_fraud: f64, feature: usize, threshold: f64, left: usize, right: usize) -> Self {
        Self {
            value: [1.0 - p_fraud, p_fraud],
            split: Some(Split {
                feature,
                threshold,
                left,
                right,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Node indices visited from the root to a leaf
    fn path(&self, row: &[f64]) -> Vec<usize> {
        let mut path = vec![0];
        let mut idx = 0;
        while let Some(split) = &self.nodes[idx].split {
            idx = if row[split.feature] <= split.threshold {
                split.left
            } else {
                split.right
            };
            path.push(idx);
        }
        path
    }

    fn leaf_value(&self, row: &[f64]) -> [f64; 2] {
        let path = self.path(row);
        self.nodes[path[path.len() - 1]].value
    }
}

/// Averaging ensemble of binary classification trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default = "default_model_name")]
    pub name: String,
    pub feature_names: Vec<String>,
    pub trees: Vec<DecisionTree>,
}

fn default_model_name() -> String {
    "tree_ensemble".to_string()
}

impl TreeEnsemble {
    /// Build and validate an ensemble
    pub fn new(name: &str, feature_names: Vec<String>, trees: Vec<DecisionTree>) -> Result<Self> {
        let model = Self {
            name: name.to_string(),
            feature_names,
            trees,
        };
        model.validate()?;
        Ok(model)
    }

    /// Load an ensemble from a JSON artifact
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let model: Self = serde_json::from_reader(reader)?;
        model.validate()?;

        info!(
            model = %model.name,
            path = %path.display(),
            trees = model.trees.len(),
            features = model.feature_names.len(),
            "Tree ensemble loaded"
        );

        Ok(model)
    }

    /// Write the ensemble as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Structural checks. Children must come after their parent, which also
    /// rules out cycles.
    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(DashboardError::Model("ensemble has no trees".to_string()));
        }

        let n_features = self.feature_names.len();
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(DashboardError::Model(format!("tree {} has no nodes", t)));
            }

            for (i, node) in tree.nodes.iter().enumerate() {
                if node.value.iter().any(|p| !(0.0..=1.0).contains(p)) {
                    return Err(DashboardError::Model(format!(
                        "tree {} node {} has invalid class distribution {:?}",
                        t, i, node.value
                    )));
                }

                if let Some(split) = &node.split {
                    if split.feature >= n_features {
                        return Err(DashboardError::Model(format!(
                            "tree {} node {} splits on feature {} but the model has {} features",
                            t, i, split.feature, n_features
                        )));
                    }
                    for child in [split.left, split.right] {
                        if child <= i || child >= tree.nodes.len() {
                            return Err(DashboardError::Model(format!(
                                "tree {} node {} has invalid child {}",
                                t, i, child
                            )));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn check_width(&self, row: &[f64]) -> Result<()> {
        if row.len() != self.feature_names.len() {
            return Err(DashboardError::Model(format!(
                "expected {} features, got {}",
                self.feature_names.len(),
                row.len()
            )));
        }
        Ok(())
    }

    /// Path contributions for one row.
    ///
    /// Returns the bias (mean root distribution) and a `[features, classes]`
    /// matrix such that `bias + column sums == predicted distribution`.
    pub fn contributions(&self, row: &[f64]) -> Result<(Array1<f64>, Array2<f64>)> {
        self.check_width(row)?;

        let mut bias = Array1::<f64>::zeros(2);
        let mut contrib = Array2::<f64>::zeros((self.feature_names.len(), 2));

        for tree in &self.trees {
            let path = tree.path(row);
            let root = &tree.nodes[0];
            bias[0] += root.value[0];
            bias[1] += root.value[1];

            for pair in path.windows(2) {
                let parent = &tree.nodes[pair[0]];
                let child = &tree.nodes[pair[1]];
                if let Some(split) = &parent.split {
                    for class in 0..2 {
                        contrib[[split.feature, class]] += child.value[class] - parent.value[class];
                    }
                }
            }
        }

        let n_trees = self.trees.len() as f64;
        bias /= n_trees;
        contrib /= n_trees;

        Ok((bias, contrib))
    }
}

impl Classifier for TreeEnsemble {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<[f64; 2]>> {
        let n_trees = self.trees.len() as f64;

        rows.iter()
            .map(|row| {
                self.check_width(row)?;
                let mut sum = [0.0, 0.0];
                for tree in &self.trees {
                    let value = tree.leaf_value(row);
                    sum[0] += value[0];
                    sum[1] += value[1];
                }
                Ok([
                    (sum[0] / n_trees).clamp(0.0, 1.0),
                    (sum[1] / n_trees).clamp(0.0, 1.0),
                ])
            })
            .collect()
    }

    fn attributions(&self, row: &[f64]) -> Result<AttributionOutput> {
        let (_, contrib) = self.contributions(row)?;
        let per_class = contrib
            .axis_iter(Axis(1))
            .map(|column| column.to_owned().into_dyn())
            .collect();
        Ok(AttributionOutput::PerClass(per_class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Two trees over (V1, V2):
    ///   tree 0: V1 <= 0.5 ? 0.1 : (V2 <= 1.0 ? 0.5 : 0.9)
    ///   tree 1: V2 <= 0.0 ? 0.2 : 0.8
    fn model() -> TreeEnsemble {
        let t0 = DecisionTree {
            nodes: vec![
                TreeNode::split(0.3, 0, 0.5, 1, 2),
                TreeNode::leaf(0.1),
                TreeNode::split(0.7, 1, 1.0, 3, 4),
                TreeNode::leaf(0.5),
                TreeNode::leaf(0.9),
            ],
        };
        let t1 = DecisionTree {
            nodes: vec![
                TreeNode::split(0.4, 1, 0.0, 1, 2),
                TreeNode::leaf(0.2),
                TreeNode::leaf(0.8),
            ],
        };
        TreeEnsemble::new("random_forest", names(&["V1", "V2"]), vec![t0, t1]).unwrap()
    }

    #[test]
    fn test_predict_proba_averages_leaves() {
        let model = model();
        let probs = model
            .predict_proba(&[vec![0.0, -1.0], vec![1.0, 2.0], vec![1.0, 0.5]])
            .unwrap();

        assert!((probs[0][1] - 0.15).abs() < 1e-12);
        assert!((probs[1][1] - 0.85).abs() < 1e-12);
        assert!((probs[2][1] - 0.65).abs() < 1e-12);
        for p in &probs {
            assert!((p[0] + p[1] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_contributions_sum_to_prediction() {
        let model = model();
        for row in [vec![0.0, -1.0], vec![1.0, 2.0], vec![1.0, 0.5], vec![0.2, 3.0]] {
            let (bias, contrib) = model.contributions(&row).unwrap();
            let proba = model.predict_proba(&[row.clone()]).unwrap()[0];
            for class in 0..2 {
                let total = bias[class] + contrib.column(class).sum();
                assert!((total - proba[class]).abs() < 1e-12, "row {:?}", row);
            }
        }
    }

    #[test]
    fn test_attributions_per_class() {
        let model = model();
        let output = model.attributions(&[1.0, 2.0]).unwrap();
        let AttributionOutput::PerClass(arrays) = output.clone() else {
            panic!("expected per-class attributions");
        };
        assert_eq!(arrays.len(), 2);
        assert_eq!(arrays[1].len(), 2);

        // tree 0: V1 +0.4 (0.3 -> 0.7), V2 +0.2 (0.7 -> 0.9); tree 1: V2 +0.4
        let fraud = output.fraud_class_values();
        assert!((fraud[0] - 0.2).abs() < 1e-12);
        assert!((fraud[1] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_wrong_row_width() {
        let model = model();
        assert!(matches!(
            model.predict_proba(&[vec![1.0]]),
            Err(DashboardError::Model(_))
        ));
    }

    #[test]
    fn test_validation_rejects_bad_structure() {
        let cyclic = DecisionTree {
            nodes: vec![TreeNode::split(0.5, 0, 0.0, 0, 1), TreeNode::leaf(0.5)],
        };
        assert!(TreeEnsemble::new("bad", names(&["V1"]), vec![cyclic]).is_err());

        let bad_feature = DecisionTree {
            nodes: vec![
                TreeNode::split(0.5, 3, 0.0, 1, 2),
                TreeNode::leaf(0.1),
                TreeNode::leaf(0.9),
            ],
        };
        assert!(TreeEnsemble::new("bad", names(&["V1"]), vec![bad_feature]).is_err());

        assert!(TreeEnsemble::new("empty", names(&["V1"]), Vec::new()).is_err());
    }

    #[test]
    fn test_json_artifact() {
        let json = r#"{
            "feature_names": ["V1"],
            "trees": [{"nodes": [
                {"value": [0.5, 0.5], "split": {"feature": 0, "threshold": 0.0, "left": 1, "right": 2}},
                {"value": [0.9, 0.1]},
                {"value": [0.2, 0.8]}
            ]}]
        }"#;
        let model: TreeEnsemble = serde_json::from_str(json).unwrap();
        model.validate().unwrap();
        assert_eq!(model.name(), "tree_ensemble");
        assert_eq!(model.predict_proba(&[vec![1.0]]).unwrap()[0][1], 0.8);
    }
}
