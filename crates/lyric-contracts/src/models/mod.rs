mod registry;

pub use registry::{
    ModelRegistry, ModelSpec, Stage, DEFAULT_ANALYSIS_MODEL, DEFAULT_IMAGE_MODEL,
    DEFAULT_PROMPT_MODEL,
};
