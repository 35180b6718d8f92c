use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, info};

/// Process-wide properties the external segmenter library needs before
/// the first model construction. Set exactly once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NlpEnvironment {
    pub segment_dictionary: String,
    pub segment_model: String,
    pub properties_file: String,
}

const SEGMENT_DICTIONARY_KEY: &str = "SEGMENT_SER_DICTIONARY";
const SEGMENT_MODEL_KEY: &str = "SEGMENT_MODEL";
const PROPERTIES_FILE_KEY: &str = "NLP_PROPERTIES_FILE";

const DEFAULT_SEGMENT_DICTIONARY: &str = "nlp/models/segmenter/dict-chris6.ser.gz";
const DEFAULT_SEGMENT_MODEL: &str = "nlp/models/segmenter/ctb.gz";
const DEFAULT_PROPERTIES_FILE: &str = "segmenter-chinese.properties";

static ENVIRONMENT: OnceLock<NlpEnvironment> = OnceLock::new();

#[derive(Error, Debug)]
pub enum EnvironmentInitError {
    #[error("NLP property `{0}` is overridden with an empty value")]
    EmptyOverride(&'static str),
    #[error("NLP property `{0}` is not valid unicode")]
    InvalidOverride(&'static str),
}

/// Publishes the segmenter configuration for the rest of the process.
/// Idempotent, later calls are no-ops. Failure here is fatal to startup.
pub fn initialize() -> Result<(), EnvironmentInitError> {
    if ENVIRONMENT.get().is_some() {
        debug!("NLP environment already initialized");
        return Ok(());
    }

    let environment = NlpEnvironment {
        segment_dictionary: resolve(SEGMENT_DICTIONARY_KEY, DEFAULT_SEGMENT_DICTIONARY)?,
        segment_model: resolve(SEGMENT_MODEL_KEY, DEFAULT_SEGMENT_MODEL)?,
        properties_file: resolve(PROPERTIES_FILE_KEY, DEFAULT_PROPERTIES_FILE)?,
    };

    // A lost race stores identical values, so the discarded set is harmless.
    let _ = ENVIRONMENT.set(environment);
    info!("NLP environment configured");
    Ok(())
}

/// The currently published environment, if `initialize` has run.
pub fn current() -> Option<&'static NlpEnvironment> {
    ENVIRONMENT.get()
}

fn resolve(key: &'static str, default: &str) -> Result<String, EnvironmentInitError> {
    match std::env::var(key) {
        Ok(value) => validate_override(key, Some(&value)),
        Err(std::env::VarError::NotPresent) => Ok(default.to_string()),
        Err(std::env::VarError::NotUnicode(_)) => {
            Err(EnvironmentInitError::InvalidOverride(key))
        }
    }
}

fn validate_override(
    key: &'static str,
    value: Option<&str>,
) -> Result<String, EnvironmentInitError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(EnvironmentInitError::EmptyOverride(key)),
        Some(v) => Ok(v.to_string()),
        None => Err(EnvironmentInitError::EmptyOverride(key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_is_idempotent() {
        initialize().unwrap();
        let first = current().unwrap().clone();
        initialize().unwrap();
        assert_eq!(current().unwrap(), &first);
    }

    #[test]
    fn defaults_are_published() {
        initialize().unwrap();
        let env = current().unwrap();
        assert!(!env.segment_dictionary.is_empty());
        assert!(!env.segment_model.is_empty());
        assert!(env.properties_file.ends_with(".properties"));
    }

    #[test]
    fn empty_override_is_rejected() {
        assert!(matches!(
            validate_override(SEGMENT_MODEL_KEY, Some("  ")),
            Err(EnvironmentInitError::EmptyOverride(_))
        ));
    }

    #[test]
    fn non_empty_override_is_kept() {
        let value = validate_override(SEGMENT_MODEL_KEY, Some("custom/ctb.gz")).unwrap();
        assert_eq!(value, "custom/ctb.gz");
    }
}
