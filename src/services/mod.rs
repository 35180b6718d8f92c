pub mod model_manager;
pub mod nlp_env;
pub mod prediction_api;
