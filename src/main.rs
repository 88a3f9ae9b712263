#[macro_use]
extern crate diesel;
extern crate dotenv;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod claims;
mod config;
mod db;
mod error;
mod helpers;
mod models;
mod pagination;
mod routes;
mod schema;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let addr = config::bind_addr();
    info!(%addr, "starting server");

    HttpServer::new(|| {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .service(
                web::scope("/videos")
                    // Literal paths must come before the /{video_id} routes.
                    .service(routes::videos::create_video)
                    .service(routes::videos::update_video)
                    .service(routes::videos::restore_thumbnail)
                    .service(routes::videos::revalidate)
                    .service(routes::videos::get_trending)
                    .service(routes::videos::get_subscribed_feed)
                    .service(routes::videos::get_feed)
                    .service(routes::videos::get_video)
                    .service(routes::videos::remove_video),
            )
            .service(web::scope("/categories").service(routes::categories::get_categories))
            .service(web::scope("/search").service(routes::search::search_videos))
            .service(web::scope("/suggestions").service(routes::suggestions::get_suggestions))
            .service(
                web::scope("/studio")
                    .service(routes::studio::get_own_videos)
                    .service(routes::studio::get_own_video),
            )
            .service(
                web::scope("/comments")
                    .service(routes::comments::create_comment)
                    .service(routes::comments::get_comments)
                    .service(routes::comments::remove_comment),
            )
            .service(
                web::scope("/reactions")
                    .service(routes::reactions::react_to_video)
                    .service(routes::reactions::react_to_comment),
            )
            .service(
                web::scope("/subscriptions")
                    .service(routes::subscriptions::toggle_subscription)
                    .service(routes::subscriptions::get_subscriptions),
            )
            .service(
                web::scope("/playlists")
                    .service(routes::playlists::create_playlist)
                    .service(routes::playlists::get_playlists)
                    .service(routes::playlists::get_playlists_for_video)
                    .service(routes::playlists::get_history)
                    .service(routes::playlists::get_liked)
                    .service(routes::playlists::add_video)
                    .service(routes::playlists::remove_video)
                    .service(routes::playlists::get_playlist_videos)
                    .service(routes::playlists::get_playlist)
                    .service(routes::playlists::remove_playlist),
            )
            .service(web::scope("/views").service(routes::views::record_view))
            .service(
                web::scope("/users")
                    .service(routes::users::upload_banner)
                    .service(routes::users::get_user),
            )
            .service(
                web::scope("/webhooks")
                    .service(routes::webhooks::identity_webhook)
                    .service(routes::webhooks::video_webhook),
            )
    })
    .bind(addr)?
    .run()
    .await
}
