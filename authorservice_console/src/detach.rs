//! Detaching a book or prize from its author before deleting it.
//!
//! The author relation on those documents is served in one of three shapes
//! (single reference, bare foreign key, reference list) and nothing tells the
//! client which one a given deployment uses. Instead of a schema lookup the
//! detach runs a fixed, ordered list of rewrites against the conditional
//! update and keeps the first one the server accepts.

use anyhow::bail;
use serde_json::{json, Value};

use authorservice_catalog::resource::{update_resource_with, ResourceApi};

fn blank_foreign_key(doc: &mut Value) {
    if let Some(map) = doc.as_object_mut() {
        if map.contains_key("authorId") {
            map.insert("authorId".to_string(), Value::Null);
        }
    }
}

/// Strategy 1: null the single reference, null the foreign key if present
fn clear_single_reference(doc: &mut Value) {
    if let Some(map) = doc.as_object_mut() {
        map.insert("author".to_string(), Value::Null);
    }
    blank_foreign_key(doc);
}

/// Strategy 2: drop the single-reference key entirely, null the foreign key
/// if present
fn drop_single_reference(doc: &mut Value) {
    // A merge-patch null removes the key instead of storing a null
    json_patch::merge(doc, &json!({ "author": null }));
    blank_foreign_key(doc);
}

/// Strategy 3: empty the reference list when there is one, and clean up the
/// other two shapes as in strategy 2
fn clear_reference_list(doc: &mut Value) {
    if let Some(map) = doc.as_object_mut() {
        if map.get("authors").map(Value::is_array).unwrap_or(false) {
            map.insert("authors".to_string(), json!([]));
        }
    }
    drop_single_reference(doc);
}

/// Detaches the resource at `path` from its author and deletes it.
///
/// Each detach attempt is a full conditional-update round trip; a rejected
/// write means "try the next shape". When every shape is rejected the delete
/// is attempted anyway, with whatever happens server-side deciding the
/// outcome. The delete always re-fetches a fresh token first, since the
/// attempts may have rotated it. A rejected delete is an error carrying the
/// status and response body.
pub async fn detach_and_delete<A>(api: &A, path: &str) -> anyhow::Result<()>
where
    A: ResourceApi + Sync + ?Sized,
{
    let strategies = [
        clear_single_reference as fn(&mut Value),
        drop_single_reference,
        clear_reference_list,
    ];

    let mut detached = false;
    for strategy in strategies {
        let outcome = update_resource_with(api, path, strategy).await?;
        if outcome.is_success() {
            detached = true;
            break;
        }
        tracing::debug!(
            "Detach attempt on {} rejected with status {}",
            path,
            outcome.status
        );
    }
    if !detached {
        tracing::warn!("Could not detach {} from its author, deleting anyway", path);
    }

    let etag = api.fetch_etag(path).await;
    let outcome = api.conditional_delete(path, etag.as_deref()).await?;
    if !outcome.is_success() {
        bail!(
            "Failed to delete {}: status {} body {}",
            path,
            outcome.status,
            outcome.body
        );
    }
    Ok(())
}
