use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Credential Store Args ---
    /// Credential store backend (file, memory)
    #[arg(long, env = "AUTH_STORE", default_value = "file")]
    pub auth_store: String,

    /// Directory holding the persisted credential store
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    pub data_dir: String,

    // --- Inference API Args ---
    /// Base URL of the hosted inference API
    #[arg(long, env = "API_BASE_URL", default_value = "https://api-inference.huggingface.co")]
    pub api_base_url: String,

    /// Bearer token for the hosted inference API
    #[arg(long, env = "API_TOKEN", default_value = "")]
    pub api_token: String,

    /// Model id used for text generation
    #[arg(long, env = "TEXT_MODEL", default_value = "mistralai/Mistral-7B-Instruct-v0.2")]
    pub text_model: String,

    /// Model id used for image generation
    #[arg(long, env = "IMAGE_MODEL", default_value = "stabilityai/stable-diffusion-xl-base-1.0")]
    pub image_model: String,

    /// Directory where generated image blobs are written
    #[arg(long, env = "BLOB_DIR", default_value = "data/blobs")]
    pub blob_dir: String,

    // --- General App Args ---
    /// Skip the startup probe that wakes both models from a cold start
    #[arg(long, env = "NO_WARM_UP", default_value = "false")]
    pub no_warm_up: bool,
}
