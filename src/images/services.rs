use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::access::{authorize, Actor, Operation};
use crate::error::{MarketError, MarketResult};
use crate::storage::StorageClient;

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

pub(crate) fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Stores every image and returns their public URLs in upload order.
/// Nothing stays behind when one of them fails.
pub async fn upload_images(
    storage: &dyn StorageClient,
    actor: &Actor,
    images: Vec<UploadItem>,
) -> MarketResult<Vec<String>> {
    authorize(Some(actor), Operation::UploadImages)?;
    if images.is_empty() {
        return Err(MarketError::validation("no images provided"));
    }

    let mut planned = Vec::with_capacity(images.len());
    for img in images {
        let ext = ext_from_mime(&img.content_type).ok_or_else(|| {
            MarketError::validation(format!("unsupported image type '{}'", img.content_type))
        })?;
        let key = format!("listings/{}/{}.{}", actor.id, Uuid::new_v4(), ext);
        planned.push((key, img));
    }

    let mut stored: Vec<String> = Vec::with_capacity(planned.len());
    for (key, img) in planned {
        if let Err(e) = storage.put_object(&key, img.body, &img.content_type).await {
            for done in &stored {
                if let Err(cleanup) = storage.delete_object(done).await {
                    warn!(key = %done, error = %cleanup, "orphaned upload");
                }
            }
            return Err(MarketError::Upload(format!("{e:#}")));
        }
        stored.push(key);
    }

    info!(user_id = %actor.id, count = stored.len(), "images uploaded");
    Ok(stored.iter().map(|k| storage.public_url(k)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FakeStorage;
    use crate::users::repo_types::Role;

    fn actor() -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role: Role::Client,
            name: "Mona".into(),
        }
    }

    fn item(ct: &str) -> UploadItem {
        UploadItem {
            body: Bytes::from_static(b"\x89PNG"),
            content_type: ct.into(),
        }
    }

    #[test]
    fn known_image_types_map_to_extensions() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/gif"), Some("gif"));
        assert_eq!(ext_from_mime("application/pdf"), None);
    }

    #[tokio::test]
    async fn uploads_land_under_the_actor_prefix() {
        let storage = FakeStorage::default();
        let actor = actor();
        let urls = upload_images(&storage, &actor, vec![item("image/png"), item("image/webp")])
            .await
            .unwrap();

        assert_eq!(urls.len(), 2);
        let prefix = format!("https://fake.local/bucket/listings/{}/", actor.id);
        assert!(urls[0].starts_with(&prefix) && urls[0].ends_with(".png"));
        assert!(urls[1].ends_with(".webp"));
        assert_eq!(storage.objects.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn bad_type_or_empty_batch_is_rejected_before_storing() {
        let storage = FakeStorage::default();
        let res = upload_images(&storage, &actor(), vec![item("image/png"), item("text/plain")]).await;
        assert!(matches!(res, Err(MarketError::Validation(_))));
        assert!(matches!(
            upload_images(&storage, &actor(), vec![]).await,
            Err(MarketError::Validation(_))
        ));
        assert!(storage.objects.lock().await.is_empty());
    }

    #[tokio::test]
    async fn failed_batch_removes_what_was_stored() {
        let storage = FakeStorage {
            fail_after: Some(1),
            ..Default::default()
        };
        let res = upload_images(&storage, &actor(), vec![item("image/png"), item("image/png")]).await;
        assert!(matches!(res, Err(MarketError::Upload(_))));
        assert!(storage.objects.lock().await.is_empty());
    }
}
