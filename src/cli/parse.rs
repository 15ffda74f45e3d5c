use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::ai::{ActionExtractor, UserImage};
use crate::core::AppConfig;

/// Read an image from disk, the MIME type comes from the extension
pub async fn load_image(path: &Path) -> Result<UserImage> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    let image = match extension.as_deref() {
        Some("png") => UserImage::new("image/png", data),
        Some("webp") => UserImage::new("image/webp", data),
        _ => UserImage::jpeg(data),
    };
    Ok(image)
}

pub async fn run(text: String, image: Option<PathBuf>, config: AppConfig) -> Result<()> {
    let image = match image {
        Some(path) => Some(load_image(&path).await?),
        None => None,
    };

    let extractor = ActionExtractor::from_config(&config);
    let batch = extractor.extract(&text, image, chrono::Utc::now()).await?;

    println!("{}", serde_json::to_string_pretty(&batch)?);

    Ok(())
}
