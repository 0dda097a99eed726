use actix_web::web;

use crate::handlers;

pub fn config_app(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(
            web::scope("/api")
                .service(
                    web::resource("/authors")
                        .route(web::get().to(handlers::get_all_authors))
                        .route(web::post().to(handlers::add_author)),
                )
                .service(
                    web::resource("/authors/{author_id}")
                        .route(web::get().to(handlers::get_author))
                        .route(web::head().to(handlers::head_author))
                        .route(web::put().to(handlers::update_author))
                        .route(web::delete().to(handlers::delete_author)),
                )
                .service(
                    web::resource("/books")
                        .route(web::get().to(handlers::get_all_books))
                        .route(web::post().to(handlers::add_book)),
                )
                .service(
                    web::resource("/books/{book_id}")
                        .route(web::get().to(handlers::get_book))
                        .route(web::head().to(handlers::head_book))
                        .route(web::put().to(handlers::update_book))
                        .route(web::delete().to(handlers::delete_book)),
                )
                .service(
                    web::resource("/prizes")
                        .route(web::get().to(handlers::get_all_prizes))
                        .route(web::post().to(handlers::add_prize)),
                )
                .service(
                    web::resource("/prizes/{prize_id}")
                        .route(web::get().to(handlers::get_prize))
                        .route(web::head().to(handlers::head_prize))
                        .route(web::put().to(handlers::update_prize))
                        .route(web::delete().to(handlers::delete_prize)),
                ),
        );
}
