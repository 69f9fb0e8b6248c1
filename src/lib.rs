pub mod app;
pub mod cli;
pub mod console;
pub mod generation;
pub mod models;
pub mod storage;
pub mod store;

use app::ChatApp;
use cli::Args;
use log::info;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Auth Store Type: {}", args.auth_store);
    info!("Data Directory: {}", args.data_dir);
    info!("Inference API Base URL: {}", args.api_base_url);
    info!("Text Model: {}", args.text_model);
    info!("Image Model: {}", args.image_model);
    info!("Blob Directory: {}", args.blob_dir);
    info!("Model Warm-up: {}", !args.no_warm_up);
    info!("-------------------------");

    let mut app = ChatApp::new(&args).await?;
    if !args.no_warm_up {
        app.generation().warm_up().await;
    }

    console::run_loop(&mut app).await
}
