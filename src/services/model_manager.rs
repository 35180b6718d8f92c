use crate::config::config::Config;
use crate::model::PredictionResult;
use crate::services::nlp_env;
use crate::services::nlp_env::EnvironmentInitError;
use crate::services::prediction_api::{PredictionApi, PredictionApiError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use std::{fs, io};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error, info};

const MAX_RETRY_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model or labels file not found (model: {model}, labels: {labels})")]
    ModelFilesNotFound { model: String, labels: String },
    #[error("NLP environment setup failed: {0}")]
    EnvironmentInit(#[from] EnvironmentInitError),
    #[error("Model reload failed: {0}")]
    Reload(String),
    #[error("Model has not been initialized")]
    NotInitialized,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Model construction failed: {0}")]
    Construction(#[from] PredictionApiError),
}

pub type ModelManagerState = Arc<ModelManager>;

/// Owns the current model handle. Loads and reloads serialize on one
/// async mutex; predictions only read the published `Arc`, so they never
/// wait on a load in progress.
pub struct ModelManager {
    config: Config,
    work_dir: PathBuf,
    resource_dir: Option<PathBuf>,
    retry_delay: Duration,
    current: RwLock<Option<Arc<PredictionApi>>>,
    load_lock: Mutex<()>,
    initialized: AtomicBool,
}

impl ModelManager {
    pub fn new(config: Config) -> Self {
        let work_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let resource_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join("resources")));
        Self::with_dirs(config, work_dir, resource_dir, RETRY_DELAY)
    }

    fn with_dirs(
        config: Config,
        work_dir: PathBuf,
        resource_dir: Option<PathBuf>,
        retry_delay: Duration,
    ) -> Self {
        Self {
            config,
            work_dir,
            resource_dir,
            retry_delay,
            current: RwLock::new(None),
            load_lock: Mutex::new(()),
            initialized: AtomicBool::new(false),
        }
    }

    /// Startup entry point. Never propagates an error: a failed first load
    /// falls into the bounded retry loop, and exhausting that leaves the
    /// manager unready until an external `reload` or a process restart.
    pub async fn initialize(&self) {
        match self.try_initialize().await {
            Ok(()) => info!("model initialization complete"),
            Err(err) => {
                error!("model initialization failed: {}", err);
                self.log_system_environment();
                self.retry_load().await;
            }
        }
    }

    async fn try_initialize(&self) -> Result<(), ModelError> {
        nlp_env::initialize()?;
        self.load().await
    }

    /// Resolves the model files, constructs a fresh handle, and publishes
    /// it. Mutually exclusive with `reload`.
    pub async fn load(&self) -> Result<(), ModelError> {
        let _guard = self.load_lock.lock().await;
        self.load_locked()
    }

    /// Re-runs `load` under the same lock. Failure is reported to the
    /// caller; the previously published handle stays current because a
    /// failed attempt never reaches the publish step.
    pub async fn reload(&self) -> Result<(), ModelError> {
        let _guard = self.load_lock.lock().await;
        info!("reloading model");
        match self.load_locked() {
            Ok(()) => {
                info!("model reload complete");
                Ok(())
            }
            Err(err) => {
                error!("model reload failed: {}", err);
                Err(ModelError::Reload(err.to_string()))
            }
        }
    }

    fn load_locked(&self) -> Result<(), ModelError> {
        let (model_file, labels_file) = self.resolve_model_files()?;
        debug!("loading model file: {}", model_file.display());
        debug!("loading labels file: {}", labels_file.display());

        // Construct fully before publishing so readers never observe a
        // half-built handle.
        let api = PredictionApi::new(&model_file, &labels_file)?;
        *self
            .current
            .write()
            .expect("model handle lock poisoned") = Some(Arc::new(api));
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Two-tier file resolution: bundled resources copied to temp files,
    /// else plain files under the working directory.
    fn resolve_model_files(&self) -> Result<(PathBuf, PathBuf), ModelError> {
        if let Some(paths) = self.resolve_bundled()? {
            return Ok(paths);
        }

        let model_file = self.work_dir.join(self.config.model_path());
        let labels_file = self.work_dir.join(self.config.labels_path());
        if !model_file.exists() || !labels_file.exists() {
            return Err(ModelError::ModelFilesNotFound {
                model: model_file.display().to_string(),
                labels: labels_file.display().to_string(),
            });
        }
        Ok((model_file, labels_file))
    }

    fn resolve_bundled(&self) -> Result<Option<(PathBuf, PathBuf)>, ModelError> {
        let Some(resource_dir) = self.resource_dir.as_deref() else {
            return Ok(None);
        };
        let model_resource = resource_dir.join(self.config.model_path());
        let labels_resource = resource_dir.join(self.config.labels_path());
        if !model_resource.exists() || !labels_resource.exists() {
            return Ok(None);
        }

        let model_file = copy_to_temp(&model_resource, "model")?;
        let labels_file = copy_to_temp(&labels_resource, "labels")?;
        Ok(Some((model_file, labels_file)))
    }

    /// Bounded retry after a failed startup. Exhausting the attempts is
    /// terminal for this process lifetime unless `reload` is called.
    async fn retry_load(&self) {
        for attempt in 1..=MAX_RETRY_ATTEMPTS {
            info!(
                "retrying model load (attempt {}/{})",
                attempt, MAX_RETRY_ATTEMPTS
            );
            sleep(self.retry_delay).await;
            match self.load().await {
                Ok(()) => {
                    info!("model load succeeded on attempt {}", attempt);
                    return;
                }
                Err(err) => error!(
                    "retry failed (attempt {}/{}): {}",
                    attempt, MAX_RETRY_ATTEMPTS, err
                ),
            }
        }
        error!("all retry attempts failed, model unavailable until reload");
    }

    /// Maps a description and quantity to a prediction result. A delegate
    /// failure is folded into an `ERROR`-status result, never an `Err`;
    /// the only error this returns is `NotInitialized`.
    pub fn process_and_predict(
        &self,
        description: &str,
        quantity: i64,
    ) -> Result<PredictionResult, ModelError> {
        let api = self.current_handle()?;
        match api.process_and_predict(description, quantity) {
            Ok(path) => Ok(PredictionResult::success(description, path, quantity)),
            Err(err) => {
                error!(
                    "prediction failed [description: {}, quantity: {}]: {}",
                    description, quantity, err
                );
                Ok(PredictionResult::failure(description, quantity, err))
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn current_handle(&self) -> Result<Arc<PredictionApi>, ModelError> {
        if !self.is_initialized() {
            return Err(ModelError::NotInitialized);
        }
        self.current
            .read()
            .expect("model handle lock poisoned")
            .clone()
            .ok_or(ModelError::NotInitialized)
    }

    fn log_system_environment(&self) {
        error!("=== system environment ===");
        error!("os: {}", std::env::consts::OS);
        error!("arch: {}", std::env::consts::ARCH);
        error!("service version: {}", env!("CARGO_PKG_VERSION"));
        error!("working directory: {}", self.work_dir.display());
        error!("configured model path: {}", self.config.model_path());
        error!("configured labels path: {}", self.config.labels_path());
    }
}

fn copy_to_temp(source: &Path, prefix: &str) -> io::Result<PathBuf> {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let file_name = format!(
        "{}-{}-{}.tmp",
        prefix,
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let destination = std::env::temp_dir().join(file_name);
    fs::copy(source, &destination)?;
    Ok(destination)
}
