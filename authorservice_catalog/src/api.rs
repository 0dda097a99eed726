use serde::{Deserialize, Serialize};

pub type AuthorId = i32;
pub type BookId = i32;
pub type PrizeId = i32;

pub const AUTHORS_PATH: &str = "/api/authors";

pub fn author_path(author_id: AuthorId) -> String {
    format!("/api/authors/{}", author_id)
}

pub fn book_path(book_id: BookId) -> String {
    format!("/api/books/{}", book_id)
}

pub fn prize_path(prize_id: PrizeId) -> String {
    format!("/api/prizes/{}", prize_id)
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
/// Lightweight reference to a book associated with an author
pub struct BookLite {
    pub id: BookId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
/// Lightweight reference to a prize associated with an author
pub struct PrizeLite {
    pub id: PrizeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
/// An author as served by the API, together with lightweight references
/// to the books and prizes associated with it
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub description: String,
    /// ISO-8601 calendar date, e.g. "1899-07-21"
    pub birth_date: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub books: Option<Vec<BookLite>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prizes: Option<Vec<PrizeLite>>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Payload for creating or editing an author, everything of [`Author`] minus the id
pub struct AuthorDetails {
    pub name: String,
    pub description: String,
    pub birth_date: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub books: Option<Vec<BookLite>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prizes: Option<Vec<PrizeLite>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
/// Reference to an author as embedded in book and prize documents
pub struct AuthorRef {
    pub id: AuthorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
/// A book as served by the API. The author relation arrives in one of three
/// shapes depending on the backing store: a single nullable reference
/// (`author`), a bare foreign key (`authorId`) or a list of references
/// (`authors`). Callers that care about the relation should work on the raw
/// JSON document instead of this struct.
pub struct Book {
    pub id: BookId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<AuthorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<AuthorRef>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
/// A prize as served by the API, with the same ambiguous author relation as [`Book`]
pub struct Prize {
    pub id: PrizeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<AuthorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<AuthorRef>>,
}
