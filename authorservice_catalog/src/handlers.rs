use std::sync::Arc;

use actix_web::http::header;
use actix_web::web::Data;
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::{json, Value};

use crate::api::AuthorDetails;
use crate::documents_repository::{
    Collection, DocumentId, DocumentsRepository, DocumentsRepositoryError, Precondition, Revision,
};
use crate::etag::normalize_etag;

type Repository = Data<Arc<dyn DocumentsRepository + Send + Sync>>;

fn revision_etag(revision: Revision) -> String {
    format!("\"{}\"", revision)
}

/// If-Match parsed into a repository precondition. A missing header or `*`
/// means unconditional; a token that does not parse as a revision can never
/// match.
fn precondition(req: &HttpRequest) -> Precondition {
    match req
        .headers()
        .get(header::IF_MATCH)
        .and_then(|value| value.to_str().ok())
    {
        None => Precondition::Any,
        Some(raw) if raw.trim() == "*" => Precondition::Any,
        Some(raw) => {
            let revision = normalize_etag(Some(raw))
                .and_then(|token| token.trim_matches('"').parse().ok());
            Precondition::Revision(revision.unwrap_or(-1))
        }
    }
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn get_document_response(
    repository: &Repository,
    collection: Collection,
    id: DocumentId,
) -> HttpResponse {
    match repository.get_document(collection, id).await {
        Ok(document) => HttpResponse::Ok()
            .append_header((header::ETAG, revision_etag(document.revision)))
            .json(document.body),
        Err(DocumentsRepositoryError::NotFound(..)) => HttpResponse::NotFound().finish(),
        Err(err) => {
            tracing::error!("Get {} {} failed {}", collection, id, err);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn head_document_response(
    repository: &Repository,
    collection: Collection,
    id: DocumentId,
) -> HttpResponse {
    match repository.get_document(collection, id).await {
        Ok(document) => HttpResponse::Ok()
            .append_header((header::ETAG, revision_etag(document.revision)))
            .finish(),
        Err(DocumentsRepositoryError::NotFound(..)) => HttpResponse::NotFound().finish(),
        Err(err) => {
            tracing::error!("Head {} {} failed {}", collection, id, err);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn put_document_response(
    repository: &Repository,
    collection: Collection,
    id: DocumentId,
    req: &HttpRequest,
    mut body: Value,
) -> HttpResponse {
    // The path, not the payload, owns the id
    if let Some(map) = body.as_object_mut() {
        map.insert("id".to_string(), json!(id));
    }
    match repository
        .put_document(collection, id, body, precondition(req))
        .await
    {
        Ok(revision) => HttpResponse::NoContent()
            .append_header((header::ETAG, revision_etag(revision)))
            .finish(),
        Err(DocumentsRepositoryError::NotFound(..)) => HttpResponse::NotFound().finish(),
        Err(DocumentsRepositoryError::RevisionMismatch { .. }) => {
            HttpResponse::PreconditionFailed().finish()
        }
        Err(err) => {
            tracing::error!("Update {} {} failed {}", collection, id, err);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn delete_document_response(
    repository: &Repository,
    collection: Collection,
    id: DocumentId,
    req: &HttpRequest,
) -> HttpResponse {
    match repository
        .delete_document(collection, id, precondition(req))
        .await
    {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(DocumentsRepositoryError::NotFound(..)) => HttpResponse::NotFound().finish(),
        Err(DocumentsRepositoryError::RevisionMismatch { .. }) => {
            HttpResponse::PreconditionFailed().finish()
        }
        Err(err) => {
            tracing::error!("Delete {} {} failed {}", collection, id, err);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn list_documents_response(repository: &Repository, collection: Collection) -> HttpResponse {
    match repository.list_documents(collection).await {
        Ok(documents) => {
            let bodies: Vec<Value> = documents.into_iter().map(|document| document.body).collect();
            HttpResponse::Ok().json(bodies)
        }
        Err(err) => {
            tracing::error!("List {} failed {}", collection, err);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn add_document_response(
    repository: &Repository,
    collection: Collection,
    body: Value,
) -> HttpResponse {
    match repository.add_document(collection, body).await {
        Ok(id) => HttpResponse::Created()
            .append_header((header::LOCATION, format!("/api/{}/{}", collection, id)))
            .finish(),
        Err(err) => {
            tracing::error!("Add to {} failed {}", collection, err);
            HttpResponse::InternalServerError().finish()
        }
    }
}

pub async fn get_all_authors(repository: Repository) -> HttpResponse {
    list_documents_response(&repository, Collection::Authors).await
}

pub async fn add_author(repository: Repository, details: web::Json<AuthorDetails>) -> HttpResponse {
    let body = match serde_json::to_value(details.into_inner()) {
        Ok(body) => body,
        Err(err) => {
            tracing::error!("Failed to serialize author {}", err);
            return HttpResponse::InternalServerError().finish();
        }
    };
    add_document_response(&repository, Collection::Authors, body).await
}

pub async fn get_author(repository: Repository, author_id: web::Path<DocumentId>) -> HttpResponse {
    get_document_response(&repository, Collection::Authors, author_id.into_inner()).await
}

pub async fn head_author(repository: Repository, author_id: web::Path<DocumentId>) -> HttpResponse {
    head_document_response(&repository, Collection::Authors, author_id.into_inner()).await
}

pub async fn update_author(
    repository: Repository,
    author_id: web::Path<DocumentId>,
    req: HttpRequest,
    body: web::Json<Value>,
) -> HttpResponse {
    put_document_response(
        &repository,
        Collection::Authors,
        author_id.into_inner(),
        &req,
        body.into_inner(),
    )
    .await
}

pub async fn delete_author(
    repository: Repository,
    author_id: web::Path<DocumentId>,
    req: HttpRequest,
) -> HttpResponse {
    delete_document_response(&repository, Collection::Authors, author_id.into_inner(), &req).await
}

pub async fn get_all_books(repository: Repository) -> HttpResponse {
    list_documents_response(&repository, Collection::Books).await
}

// Book and prize documents are stored as-is: the author relation shape is
// up to whoever writes them
pub async fn add_book(repository: Repository, body: web::Json<Value>) -> HttpResponse {
    add_document_response(&repository, Collection::Books, body.into_inner()).await
}

pub async fn get_book(repository: Repository, book_id: web::Path<DocumentId>) -> HttpResponse {
    get_document_response(&repository, Collection::Books, book_id.into_inner()).await
}

pub async fn head_book(repository: Repository, book_id: web::Path<DocumentId>) -> HttpResponse {
    head_document_response(&repository, Collection::Books, book_id.into_inner()).await
}

pub async fn update_book(
    repository: Repository,
    book_id: web::Path<DocumentId>,
    req: HttpRequest,
    body: web::Json<Value>,
) -> HttpResponse {
    put_document_response(
        &repository,
        Collection::Books,
        book_id.into_inner(),
        &req,
        body.into_inner(),
    )
    .await
}

pub async fn delete_book(
    repository: Repository,
    book_id: web::Path<DocumentId>,
    req: HttpRequest,
) -> HttpResponse {
    delete_document_response(&repository, Collection::Books, book_id.into_inner(), &req).await
}

pub async fn get_all_prizes(repository: Repository) -> HttpResponse {
    list_documents_response(&repository, Collection::Prizes).await
}

pub async fn add_prize(repository: Repository, body: web::Json<Value>) -> HttpResponse {
    add_document_response(&repository, Collection::Prizes, body.into_inner()).await
}

pub async fn get_prize(repository: Repository, prize_id: web::Path<DocumentId>) -> HttpResponse {
    get_document_response(&repository, Collection::Prizes, prize_id.into_inner()).await
}

pub async fn head_prize(repository: Repository, prize_id: web::Path<DocumentId>) -> HttpResponse {
    head_document_response(&repository, Collection::Prizes, prize_id.into_inner()).await
}

pub async fn update_prize(
    repository: Repository,
    prize_id: web::Path<DocumentId>,
    req: HttpRequest,
    body: web::Json<Value>,
) -> HttpResponse {
    put_document_response(
        &repository,
        Collection::Prizes,
        prize_id.into_inner(),
        &req,
        body.into_inner(),
    )
    .await
}

pub async fn delete_prize(
    repository: Repository,
    prize_id: web::Path<DocumentId>,
    req: HttpRequest,
) -> HttpResponse {
    delete_document_response(&repository, Collection::Prizes, prize_id.into_inner(), &req).await
}

#[cfg(test)]
mod handler_tests {
    use std::sync::Arc;

    use actix_web::http::header;
    use actix_web::web::Data;
    use actix_web::{test, App};
    use serde_json::json;

    use crate::api::{Author, AuthorDetails};
    use crate::app_config::config_app;
    use crate::documents_repository::{DocumentsRepository, InMemoryDocumentsRepository};

    fn repository() -> Arc<dyn DocumentsRepository + Send + Sync> {
        Arc::new(InMemoryDocumentsRepository::default())
    }

    fn author_details(name: &str) -> AuthorDetails {
        AuthorDetails {
            name: name.to_string(),
            description: "wrote things".to_string(),
            birth_date: "1899-07-21".to_string(),
            image_url: "https://example.com/portrait.jpg".to_string(),
            ..AuthorDetails::default()
        }
    }

    #[tokio::test]
    async fn test_add_and_get_author_serves_etag() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(repository()))
                .configure(config_app),
        )
        .await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/authors")
                .set_json(author_details("Ernest"))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), 201);
        let location = response
            .headers()
            .get(header::LOCATION)
            .expect("No location header")
            .to_str()
            .unwrap()
            .to_string();

        let response = test::call_service(
            &app,
            test::TestRequest::get().uri(&location).to_request(),
        )
        .await;
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get(header::ETAG).unwrap().to_str().unwrap(),
            "\"1\""
        );
        let author: Author = test::read_body_json(response).await;
        assert_eq!(author.name, "Ernest");
    }

    #[tokio::test]
    async fn test_put_honors_if_match() {
        let repo = repository();
        let app = test::init_service(
            App::new().app_data(Data::new(repo.clone())).configure(config_app),
        )
        .await;

        let id = repo
            .add_document(
                crate::documents_repository::Collection::Authors,
                serde_json::to_value(author_details("Ernest")).unwrap(),
            )
            .await
            .expect("Failed to seed author");
        let uri = format!("/api/authors/{}", id);

        // Fresh token is accepted and rotates the revision
        let response = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&uri)
                .insert_header((header::IF_MATCH, "\"1\""))
                .set_json(json!({"name": "Ernest Hemingway"}))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), 204);
        assert_eq!(
            response.headers().get(header::ETAG).unwrap().to_str().unwrap(),
            "\"2\""
        );

        // The old token is now stale
        let response = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&uri)
                .insert_header((header::IF_MATCH, "\"1\""))
                .set_json(json!({"name": "stale"}))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), 412);

        // Weak and wildcard forms are accepted
        let response = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&uri)
                .insert_header((header::IF_MATCH, "W/\"2\""))
                .set_json(json!({"name": "weak token"}))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), 204);

        let response = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&uri)
                .insert_header((header::IF_MATCH, "*"))
                .set_json(json!({"name": "wildcard"}))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), 204);
    }

    #[tokio::test]
    async fn test_delete_honors_if_match_and_head_serves_token() {
        let repo = repository();
        let app = test::init_service(
            App::new().app_data(Data::new(repo.clone())).configure(config_app),
        )
        .await;

        let id = repo
            .add_document(
                crate::documents_repository::Collection::Books,
                json!({"name": "The Old Man and the Sea", "author": {"id": 1}}),
            )
            .await
            .expect("Failed to seed book");
        let uri = format!("/api/books/{}", id);

        let response = test::call_service(
            &app,
            test::TestRequest::with_uri(&uri)
                .method(actix_web::http::Method::HEAD)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get(header::ETAG).unwrap().to_str().unwrap(),
            "\"1\""
        );

        let response = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&uri)
                .insert_header((header::IF_MATCH, "\"9\""))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), 412);

        let response = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&uri)
                .insert_header((header::IF_MATCH, "\"1\""))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), 204);

        let response =
            test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(response.status(), 404);
    }
}
