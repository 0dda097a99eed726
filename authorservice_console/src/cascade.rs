//! Cascading author deletion.
//!
//! The API has no server-side cascade: deleting an author leaves its books
//! and prizes dangling (or is refused outright where referential integrity
//! is enforced). The client therefore walks the author's relations itself,
//! prizes first, then books, then the author. There is no rollback; a
//! failure partway leaves the earlier deletions in place and aborts the
//! rest.

use anyhow::{bail, Context};

use authorservice_catalog::api::{author_path, book_path, prize_path, Author, AuthorId};
use authorservice_catalog::resource::ResourceApi;

use crate::detach::detach_and_delete;

/// Deletes the author and everything associated with it, strictly
/// sequentially.
///
/// The author document and its token are captured once up front; the final
/// delete is conditional on that original token even though the relation
/// deletions happened in between. Any failure raises immediately and leaves
/// the author in place.
pub async fn delete_author_cascade<A>(api: &A, author_id: AuthorId) -> anyhow::Result<()>
where
    A: ResourceApi + Sync + ?Sized,
{
    let path = author_path(author_id);
    let fetched = api
        .fetch(&path)
        .await
        .with_context(|| format!("Failed to read author {}", author_id))?;
    let author: Author = serde_json::from_value(fetched.body.clone())
        .context("Failed to deserialize author")?;

    for prize in author.prizes.iter().flatten() {
        detach_and_delete(api, &prize_path(prize.id)).await?;
    }
    for book in author.books.iter().flatten() {
        detach_and_delete(api, &book_path(book.id)).await?;
    }

    let outcome = api
        .conditional_delete(&path, fetched.etag.as_deref())
        .await?;
    if !outcome.is_success() {
        bail!(
            "Failed to delete author {}: status {} body {}",
            author_id,
            outcome.status,
            outcome.body
        );
    }
    Ok(())
}
