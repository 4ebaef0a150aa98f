use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use tracing::warn;
use uuid::Uuid;

use crate::state::AppState;

/// Image payload decoded from a `data:image/...;base64,` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub body: Bytes,
    pub content_type: String,
    pub ext: &'static str,
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

pub fn decode_data_uri(value: &str) -> Result<DecodedImage, String> {
    let rest = value
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| "Expected a data:image/...;base64 URI.".to_string())?;
    let (content_type, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| "Expected a data:image/...;base64 URI.".to_string())?;
    let content_type = content_type.to_ascii_lowercase();
    let ext = ext_from_mime(&content_type)
        .ok_or_else(|| format!("Unsupported image type {content_type}."))?;
    let body = STANDARD
        .decode(payload.trim())
        .map_err(|_| "Image is not valid base64.".to_string())?;
    if body.is_empty() {
        return Err("Image is empty.".into());
    }
    Ok(DecodedImage {
        body: Bytes::from(body),
        content_type,
        ext,
    })
}

/// Uploads the image and returns its object key.
pub async fn store_image(st: &AppState, author_id: i64, image: DecodedImage) -> anyhow::Result<String> {
    let key = format!("recipes/{}/{}.{}", author_id, Uuid::new_v4(), image.ext);
    st.storage
        .put_object(&key, image.body, &image.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    Ok(key)
}

/// Deletes an object, logging instead of failing; used after the database is already consistent.
pub async fn discard_image(st: &AppState, key: &str) {
    if let Err(e) = st.storage.delete_object(key).await {
        warn!(error = %e, key, "failed to delete recipe image");
    }
}

pub async fn image_url(st: &AppState, key: &str) -> anyhow::Result<String> {
    st.storage
        .presign_get(key, st.config.image_url_ttl_secs)
        .await
        .with_context(|| format!("presign url for {}", key))
}

#[cfg(test)]
mod image_tests {
    use super::*;

    const PNG_1PX: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn decodes_png_data_uri() {
        let img = decode_data_uri(&format!("data:image/png;base64,{PNG_1PX}")).unwrap();
        assert_eq!(img.ext, "png");
        assert_eq!(img.content_type, "image/png");
        assert_eq!(&img.body[1..4], b"PNG");
    }

    #[test]
    fn rejects_bad_uris() {
        assert!(decode_data_uri(PNG_1PX).is_err());
        assert!(decode_data_uri("data:text/plain;base64,aGVsbG8=").is_err());
        assert!(decode_data_uri("data:image/png;base64,@@@").is_err());
        assert!(decode_data_uri("data:image/png;base64,").is_err());
    }

    #[tokio::test]
    async fn store_and_presign_with_fake_storage() {
        let state = AppState::fake();
        let img = decode_data_uri(&format!("data:image/png;base64,{PNG_1PX}")).unwrap();
        let key = store_image(&state, 9, img).await.unwrap();
        assert!(key.starts_with("recipes/9/"));
        assert!(key.ends_with(".png"));

        let url = image_url(&state, &key).await.unwrap();
        assert!(url.contains(&key));
        discard_image(&state, &key).await;
    }
}
