use crate::cli::Args;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::{ info, warn };
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };
use std::fs;
use std::path::{ Path, PathBuf };
use thiserror::Error;
use uuid::Uuid;

/// Marker closing the instruction template; the model's continuation is
/// whatever follows its first occurrence in the raw output.
const INSTRUCTION_CLOSE: &str = "[/INST]";

const FALLBACK_REPLY: &str =
    "I apologize, but I couldn't generate a response. Please try again.";

const NEGATIVE_PROMPT: &str = "blurry, bad quality, distorted";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("failed to generate text")] Text(#[source] reqwest::Error),
    #[error("failed to generate image")] Image(#[source] reqwest::Error),
    #[error("text generation returned no sequences")] EmptyCompletion,
    #[error("failed to store generated image: {0}")] Blob(#[from] std::io::Error),
}

#[derive(Serialize)]
struct TextGenerationRequest {
    inputs: String,
    parameters: TextGenerationParameters,
}

#[derive(Serialize)]
struct TextGenerationParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct TextGenerationResponse {
    generated_text: String,
}

#[derive(Serialize)]
struct ImageGenerationRequest<'a> {
    inputs: &'a str,
    parameters: ImageGenerationParameters<'a>,
}

#[derive(Serialize)]
struct ImageGenerationParameters<'a> {
    negative_prompt: &'a str,
}

/// Handle to a generated image written to the local blob directory. The file
/// is transient: nothing cleans it up before process exit, and nothing
/// depends on it surviving past the session.
#[derive(Clone, Debug)]
pub struct ImageBlob {
    path: PathBuf,
    mime: String,
}

impl ImageBlob {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// The string form stored as message content.
    pub fn reference(&self) -> String {
        self.path.display().to_string()
    }

    /// Re-encodes the blob as a `data:` URL for in-page display.
    pub fn to_data_url(&self) -> Result<String, std::io::Error> {
        let bytes = fs::read(&self.path)?;
        Ok(format!("data:{};base64,{}", self.mime, BASE64.encode(bytes)))
    }
}

/// Stateless wrapper over the hosted inference endpoints. The bearer token is
/// installed once as a default header; every call is a single request with no
/// retry, timeout, or backoff.
pub struct GenerationClient {
    http: HttpClient,
    base_url: String,
    text_model: String,
    image_model: String,
    blob_dir: PathBuf,
}

impl GenerationClient {
    pub fn new(args: &Args) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", args.api_token))
                .map_err(|e| format!("Invalid API token format: {}", e))?
        );

        let http = HttpClient::builder().default_headers(headers).build()?;

        let blob_dir = PathBuf::from(&args.blob_dir);
        fs::create_dir_all(&blob_dir)?;

        Ok(Self {
            http,
            base_url: args.api_base_url.trim_end_matches('/').to_string(),
            text_model: args.text_model.clone(),
            image_model: args.image_model.clone(),
            blob_dir,
        })
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url, model)
    }

    /// Sends the instruction-wrapped prompt to the text model and returns the
    /// trimmed continuation after the instruction-closing marker.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
        let req = TextGenerationRequest {
            inputs: format!("<s>[INST] {} [/INST]", prompt),
            parameters: TextGenerationParameters {
                max_new_tokens: 512,
                temperature: 0.7,
                top_p: 0.95,
            },
        };

        let sequences = self.http
            .post(self.model_url(&self.text_model))
            .json(&req)
            .send().await
            .map_err(GenerationError::Text)?
            .error_for_status()
            .map_err(GenerationError::Text)?
            .json::<Vec<TextGenerationResponse>>().await
            .map_err(GenerationError::Text)?;

        let raw = &sequences.first().ok_or(GenerationError::EmptyCompletion)?.generated_text;
        Ok(extract_completion(raw))
    }

    /// Sends the prompt to the image model and writes the returned bytes to a
    /// fresh blob file.
    pub async fn generate_image(&self, prompt: &str) -> Result<ImageBlob, GenerationError> {
        let req = ImageGenerationRequest {
            inputs: prompt,
            parameters: ImageGenerationParameters {
                negative_prompt: NEGATIVE_PROMPT,
            },
        };

        let resp = self.http
            .post(self.model_url(&self.image_model))
            .json(&req)
            .send().await
            .map_err(GenerationError::Image)?
            .error_for_status()
            .map_err(GenerationError::Image)?;

        let mime = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        let bytes = resp.bytes().await.map_err(GenerationError::Image)?;

        let path = self.blob_dir.join(format!("{}.{}", Uuid::new_v4(), extension_for(&mime)));
        fs::write(&path, &bytes)?;

        Ok(ImageBlob { path, mime })
    }

    /// Fires one tiny request at each model so a cold deployment starts
    /// loading before the first real prompt. Failure is only a warning.
    pub async fn warm_up(&self) {
        info!("Warming up inference models...");
        let text = self.generate_text("Hi");
        let image = self.generate_image("test");
        match futures::try_join!(text, image) {
            Ok(_) => info!("Inference models are ready"),
            Err(e) => {
                warn!("Models are still warming up, first responses may take longer: {}", e);
            }
        }
    }
}

fn extract_completion(raw: &str) -> String {
    match raw.find(INSTRUCTION_CLOSE) {
        Some(pos) => {
            let completion = raw[pos + INSTRUCTION_CLOSE.len()..].trim();
            if completion.is_empty() {
                FALLBACK_REPLY.to_string()
            } else {
                completion.to_string()
            }
        }
        None => FALLBACK_REPLY.to_string(),
    }
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{ AsyncReadExt, AsyncWriteExt };
    use tokio::net::TcpListener;

    fn test_args(base_url: &str, temp_dir: &tempfile::TempDir) -> Args {
        Args {
            auth_store: "memory".to_string(),
            data_dir: temp_dir.path().display().to_string(),
            api_base_url: base_url.to_string(),
            api_token: String::new(),
            text_model: "test/text-model".to_string(),
            image_model: "test/image-model".to_string(),
            blob_dir: temp_dir.path().join("blobs").display().to_string(),
            no_warm_up: true,
        }
    }

    /// Minimal local endpoint that answers every request with the same
    /// canned HTTP response.
    async fn spawn_canned_server(response: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn non_2xx_response_is_an_error_for_both_endpoints() {
        let base_url = spawn_canned_server(
            b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
        ).await;
        let temp_dir = tempfile::TempDir::new().unwrap();
        let client = GenerationClient::new(&test_args(&base_url, &temp_dir)).unwrap();

        assert!(client.generate_text("hi").await.is_err());
        assert!(client.generate_image("a cat").await.is_err());
    }

    #[tokio::test]
    async fn generated_image_bytes_land_in_a_blob_file() {
        let base_url = spawn_canned_server(
            b"HTTP/1.1 200 OK\r\ncontent-type: image/png\r\ncontent-length: 7\r\nconnection: close\r\n\r\npngdata"
        ).await;
        let temp_dir = tempfile::TempDir::new().unwrap();
        let client = GenerationClient::new(&test_args(&base_url, &temp_dir)).unwrap();

        let blob = client.generate_image("a cat").await.unwrap();
        assert_eq!(blob.mime(), "image/png");
        assert_eq!(blob.path().extension().and_then(|e| e.to_str()), Some("png"));
        assert_eq!(fs::read(blob.path()).unwrap(), b"pngdata");
    }

    #[test]
    fn extract_completion_takes_text_after_marker() {
        let raw = "<s>[INST] What is Rust? [/INST] A systems programming language.";
        assert_eq!(extract_completion(raw), "A systems programming language.");
    }

    #[test]
    fn extract_completion_uses_first_marker_only() {
        let raw = "[INST] hi [/INST] first [/INST] second";
        assert_eq!(extract_completion(raw), "first [/INST] second");
    }

    #[test]
    fn extract_completion_falls_back_without_marker() {
        assert_eq!(extract_completion("no marker here"), FALLBACK_REPLY);
    }

    #[test]
    fn extract_completion_falls_back_on_empty_continuation() {
        assert_eq!(extract_completion("<s>[INST] hi [/INST]   "), FALLBACK_REPLY);
    }

    #[test]
    fn extension_matches_mime() {
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("application/octet-stream"), "bin");
    }

    #[test]
    fn data_url_encodes_blob_contents() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("blob.png");
        fs::write(&path, b"pngdata").unwrap();

        let blob = ImageBlob {
            path,
            mime: "image/png".to_string(),
        };
        assert_eq!(blob.to_data_url().unwrap(), format!("data:image/png;base64,{}", BASE64.encode(b"pngdata")));
    }
}
