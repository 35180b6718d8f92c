use crate::services::nlp_env;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug)]
pub enum PredictionApiError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed model file: {0}")]
    MalformedModel(#[from] serde_json::Error),
    #[error("Labels file defines no categories")]
    EmptyLabels,
    #[error("Model references label index {index} but only {count} labels are defined")]
    LabelOutOfRange { index: usize, count: usize },
    #[error("NLP environment has not been initialized")]
    EnvironmentMissing,
    #[error("No category matched the description")]
    NoMatch,
}

#[derive(Deserialize)]
struct ModelFile {
    /// Per-token contributions to label scores.
    tokens: HashMap<String, Vec<LabelWeight>>,
    /// Baseline score per label index, applied to every prediction.
    #[serde(default)]
    bias: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct LabelWeight {
    label: usize,
    weight: f64,
}

/// Loaded classification model. Stands in for the external prediction
/// library: constructed from two absolute file paths, exposing one call
/// that maps a description and quantity to a category path.
///
/// The labels file holds one category path per line; the model file is a
/// JSON table of token weights over label indices. Both are read fully at
/// construction, so the handle never touches the filesystem afterwards.
#[derive(Debug)]
pub struct PredictionApi {
    labels: Vec<String>,
    tokens: HashMap<String, Vec<LabelWeight>>,
    bias: Vec<f64>,
    tokenizer: Regex,
    model_path: PathBuf,
    labels_path: PathBuf,
}

impl PredictionApi {
    pub fn new(model_path: &Path, labels_path: &Path) -> Result<Self, PredictionApiError> {
        if nlp_env::current().is_none() {
            return Err(PredictionApiError::EnvironmentMissing);
        }

        let labels: Vec<String> = fs::read_to_string(labels_path)?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        if labels.is_empty() {
            return Err(PredictionApiError::EmptyLabels);
        }

        let model: ModelFile = serde_json::from_str(&fs::read_to_string(model_path)?)?;
        for weights in model.tokens.values() {
            for entry in weights {
                if entry.label >= labels.len() {
                    return Err(PredictionApiError::LabelOutOfRange {
                        index: entry.label,
                        count: labels.len(),
                    });
                }
            }
        }
        if model.bias.len() > labels.len() {
            return Err(PredictionApiError::LabelOutOfRange {
                index: model.bias.len() - 1,
                count: labels.len(),
            });
        }

        Ok(Self {
            labels,
            tokens: model.tokens,
            bias: model.bias,
            tokenizer: Regex::new(r"[\p{L}\p{N}]+").expect("hard-coded regex should compile"),
            model_path: model_path.to_path_buf(),
            labels_path: labels_path.to_path_buf(),
        })
    }

    /// Maps a product description and quantity to a category path.
    /// Fails when no token of the description carries any model signal.
    pub fn process_and_predict(
        &self,
        description: &str,
        quantity: i64,
    ) -> Result<String, PredictionApiError> {
        trace!(
            "scoring description of {} chars, quantity {}",
            description.chars().count(),
            quantity
        );

        let mut scores = vec![0.0_f64; self.labels.len()];
        for (index, bias) in self.bias.iter().enumerate() {
            scores[index] = *bias;
        }

        let mut matched = !self.bias.is_empty();
        for token in self.tokenizer.find_iter(&description.to_lowercase()) {
            if let Some(weights) = self.tokens.get(token.as_str()) {
                matched = true;
                for entry in weights {
                    scores[entry.label] += entry.weight;
                }
            }
        }
        if !matched {
            return Err(PredictionApiError::NoMatch);
        }

        let best = scores
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(index, _)| index)
            .ok_or(PredictionApiError::NoMatch)?;
        Ok(self.labels[best].clone())
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn labels_path(&self) -> &Path {
        &self.labels_path
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs;
    use std::path::{Path, PathBuf};

    pub const MODEL_FILE: &str = "category.model.json";
    pub const LABELS_FILE: &str = "category.labels";

    /// Writes a small two-label model into `dir` and returns both paths.
    /// "widget" maps to Electronics/Widgets, "sprocket" to Hardware/Sprockets.
    pub fn write_model_files(dir: &Path) -> (PathBuf, PathBuf) {
        let model_path = dir.join(MODEL_FILE);
        let labels_path = dir.join(LABELS_FILE);
        fs::write(
            &model_path,
            r#"{
                "tokens": {
                    "widget": [{"label": 0, "weight": 2.0}],
                    "sprocket": [{"label": 1, "weight": 2.0}]
                }
            }"#,
        )
        .unwrap();
        fs::write(&labels_path, "Electronics/Widgets\nHardware/Sprockets\n").unwrap();
        (model_path, labels_path)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::write_model_files;
    use super::*;

    fn loaded_api(dir: &Path) -> PredictionApi {
        nlp_env::initialize().unwrap();
        let (model_path, labels_path) = write_model_files(dir);
        PredictionApi::new(&model_path, &labels_path).unwrap()
    }

    #[test]
    fn matching_token_yields_category_path() {
        let dir = tempfile::tempdir().unwrap();
        let api = loaded_api(dir.path());
        let path = api.process_and_predict("widget", 5).unwrap();
        assert_eq!(path, "Electronics/Widgets");
    }

    #[test]
    fn tokenization_is_case_and_punctuation_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let api = loaded_api(dir.path());
        let path = api.process_and_predict("Steel SPROCKET, boxed", 12).unwrap();
        assert_eq!(path, "Hardware/Sprockets");
    }

    #[test]
    fn unknown_tokens_fail_with_no_match() {
        let dir = tempfile::tempdir().unwrap();
        let api = loaded_api(dir.path());
        let err = api.process_and_predict("completely unknown", 1).unwrap_err();
        assert!(matches!(err, PredictionApiError::NoMatch));
    }

    #[test]
    fn empty_labels_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        nlp_env::initialize().unwrap();
        let (model_path, labels_path) = write_model_files(dir.path());
        fs::write(&labels_path, "\n\n").unwrap();
        let err = PredictionApi::new(&model_path, &labels_path).unwrap_err();
        assert!(matches!(err, PredictionApiError::EmptyLabels));
    }

    #[test]
    fn out_of_range_label_index_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        nlp_env::initialize().unwrap();
        let (model_path, labels_path) = write_model_files(dir.path());
        fs::write(
            &model_path,
            r#"{"tokens": {"widget": [{"label": 7, "weight": 1.0}]}}"#,
        )
        .unwrap();
        let err = PredictionApi::new(&model_path, &labels_path).unwrap_err();
        assert!(matches!(
            err,
            PredictionApiError::LabelOutOfRange { index: 7, count: 2 }
        ));
    }

    #[test]
    fn malformed_model_json_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        nlp_env::initialize().unwrap();
        let (model_path, labels_path) = write_model_files(dir.path());
        fs::write(&model_path, "not json").unwrap();
        let err = PredictionApi::new(&model_path, &labels_path).unwrap_err();
        assert!(matches!(err, PredictionApiError::MalformedModel(_)));
    }
}
