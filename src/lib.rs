#[macro_use]
extern crate rocket;
#[macro_use]
extern crate diesel;
#[macro_use]
extern crate rocket_sync_db_pools;
#[macro_use]
extern crate validator_derive;

pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod logger;
pub mod models;
pub mod routes;
pub mod schema;

use rocket::serde::json::{json, Value};
use rocket::{Build, Rocket};
use rocket_cors::Cors;

#[catch(400)]
fn bad_request() -> Value {
    json!({ "errors": { "message": "Bad request" } })
}

#[catch(401)]
fn unauthorized() -> Value {
    json!({ "errors": { "message": "Unauthorized" } })
}

#[catch(403)]
fn forbidden() -> Value {
    json!({ "errors": { "message": "Forbidden" } })
}

#[catch(404)]
fn not_found() -> Value {
    json!({ "errors": { "message": "Not found" } })
}

#[catch(422)]
fn unprocessable_entity() -> Value {
    json!({ "errors": { "message": "Unable to process the request body" } })
}

#[catch(500)]
fn internal_server_error() -> Value {
    json!({ "errors": { "message": "Internal server error" } })
}

fn cors_fairing() -> Cors {
    rocket_cors::CorsOptions::default()
        .to_cors()
        .expect("Cors fairing cannot be created")
}

pub fn rocket() -> Rocket<Build> {
    let config = config::AppConfig::from_env();
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let figment = rocket::Config::figment().merge((
        "databases.diesel_postgres_pool",
        rocket_sync_db_pools::Config {
            url: database_url,
            pool_size: 10,
            timeout: 5,
        },
    ));
    let prefix = config.api_prefix.clone();

    rocket::custom(figment)
        .attach(database::Db::fairing())
        .attach(cors_fairing())
        .manage(config)
        .mount(
            prefix.as_str(),
            routes![
                routes::users::register,
                routes::users::login,
                routes::users::read_user,
                routes::users::update_user,
                routes::profiles::read_profile,
                routes::profiles::follow_user,
                routes::profiles::unfollow_user,
                routes::articles::list_articles,
                routes::articles::feed_articles,
                routes::articles::read_article,
                routes::articles::create_article,
                routes::articles::update_article,
                routes::articles::delete_article,
                routes::articles::favorite_article,
                routes::articles::unfavorite_article,
                routes::comments::list_comments,
                routes::comments::add_comment,
                routes::comments::delete_comment,
                routes::tags::list_tags,
            ],
        )
        .mount("/", routes![routes::health::health])
        .register(
            "/",
            catchers![
                bad_request,
                unauthorized,
                forbidden,
                not_found,
                unprocessable_entity,
                internal_server_error,
            ],
        )
}
