use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{ApiError, Error, TypeError};

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpeg", "jpg", "gif", "webp"];

/// Filesystem-backed storage for recipe images posted as base64 data URIs.
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Decodes and stores an uploaded image, returning the relative path kept
    /// on the recipe row.
    pub async fn store_recipe_image(&self, data_uri: &str) -> Result<String, Error> {
        let (extension, payload) = parse_data_uri(data_uri).map_err(|e| e.into())?;
        let bytes = STANDARD
            .decode(payload)
            .map_err(|_| ApiError::InvalidRequest.new("Invalid base64 image payload"))?;

        let relative = format!("recipes/{}.{}", uuid::Uuid::new_v4(), extension);
        let path = self.root.join(&relative);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ApiError::InternalServerError.new(&format!("{e}")))?;
        }

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ApiError::InternalServerError.new(&format!("{e}")))?;

        Ok(relative)
    }
}

/// Splits `data:image/<ext>;base64,<payload>` into its extension and payload.
pub fn parse_data_uri(data_uri: &str) -> Result<(&str, &str), TypeError> {
    let rest = data_uri
        .strip_prefix("data:image/")
        .ok_or_else(|| TypeError::new("Expected an image data URI"))?;

    let (extension, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| TypeError::new("Expected a base64 data URI"))?;

    if !ALLOWED_EXTENSIONS.contains(&extension) {
        return Err(TypeError::new("Unsupported image format"));
    }
    if payload.is_empty() {
        return Err(TypeError::new("Empty image payload"));
    }

    Ok((extension, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PIXEL: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn parses_valid_data_uri() {
        let uri = format!("data:image/png;base64,{PIXEL}");
        let (ext, payload) = parse_data_uri(&uri).unwrap();
        assert_eq!(ext, "png");
        assert_eq!(payload, PIXEL);
    }

    #[test]
    fn rejects_non_image_uris() {
        assert!(parse_data_uri("data:text/plain;base64,aGk=").is_err());
        assert!(parse_data_uri("not a data uri").is_err());
        assert!(parse_data_uri("data:image/png;base64,").is_err());
        assert!(parse_data_uri("data:image/exe;base64,aGk=").is_err());
    }

    #[tokio::test]
    async fn stores_decoded_image_under_media_root() {
        let root = std::env::temp_dir().join(format!("media-{}", uuid::Uuid::new_v4()));
        let store = MediaStore::new(&root);

        let uri = format!("data:image/png;base64,{PIXEL}");
        let relative = store.store_recipe_image(&uri).await.unwrap();

        assert!(relative.starts_with("recipes/"));
        assert!(relative.ends_with(".png"));
        assert!(root.join(&relative).exists());

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn malformed_payload_is_a_client_error() {
        let store = MediaStore::new(std::env::temp_dir());
        let err = store
            .store_recipe_image("data:image/png;base64,@@@@")
            .await
            .unwrap_err();

        assert_eq!(err.code, 400);
    }
}
