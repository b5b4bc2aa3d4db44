use biolit_core::BiolitConfig;
use biolit_pipeline::Pipeline;

#[derive(Clone)]
pub struct AppState {
    pub config: BiolitConfig,
    pub pipeline: Pipeline,
}
