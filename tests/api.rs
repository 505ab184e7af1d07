//! End to end tests against a real Postgres database. They are skipped
//! when `DATABASE_URL` is unset or unreachable, so `cargo test` still
//! passes on a machine without a database.

use diesel::prelude::*;
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use once_cell::sync::Lazy;
use rocket::http::{ContentType, Header, Status};
use rocket::local::blocking::Client;
use rocket::serde::json::{json, Value};

use conduit::schema::{articles, comments, follows, users};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

static DB_AVAILABLE: Lazy<bool> = Lazy::new(|| {
    dotenv::dotenv().ok();
    std::env::set_var("API_PREFIX", "/api");
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("skipping: DATABASE_URL is not set");
            return false;
        }
    };
    let mut conn = match PgConnection::establish(&url) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("skipping: cannot reach test database: {}", err);
            return false;
        }
    };
    conn.run_pending_migrations(MIGRATIONS)
        .expect("running migrations");
    true
});

macro_rules! client {
    () => {
        match test_client() {
            Some(client) => client,
            None => return,
        }
    };
}

fn test_client() -> Option<Client> {
    if !*DB_AVAILABLE {
        return None;
    }
    Some(Client::tracked(conduit::rocket()).expect("valid rocket instance"))
}

fn db() -> PgConnection {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
    PgConnection::establish(&url).expect("test database")
}

/// Usernames must be unique across test runs against a persistent database.
fn unique(prefix: &str) -> String {
    use rand::distributions::Alphanumeric;
    use rand::{thread_rng, Rng};
    let suffix: String = thread_rng()
        .sample_iter(Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("{}{}", prefix, suffix.to_lowercase())
}

fn token_header(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Token {}", token))
}

fn register(client: &Client, username: &str) -> (String, String) {
    let email = format!("{}@example.com", username);
    let response = client
        .post("/api/users/register")
        .header(ContentType::JSON)
        .body(
            json!({ "user": { "username": username, "email": email, "password": "password" } })
                .to_string(),
        )
        .dispatch();
    assert_eq!(response.status(), Status::Created);
    let body: Value = response.into_json().unwrap();
    let token = body["user"]["token"].as_str().unwrap().to_string();
    (token, email)
}

fn create_article(client: &Client, token: &str, title: &str) -> String {
    let response = client
        .post("/api/articles")
        .header(ContentType::JSON)
        .header(token_header(token))
        .body(
            json!({ "article": { "title": title, "description": "d", "body": "b", "tagList": [] } })
                .to_string(),
        )
        .dispatch();
    assert_eq!(response.status(), Status::Created);
    let body: Value = response.into_json().unwrap();
    body["article"]["slug"].as_str().unwrap().to_string()
}

fn user_id(conn: &mut PgConnection, username: &str) -> i32 {
    users::table
        .filter(users::username.eq(username))
        .select(users::id)
        .first(conn)
        .unwrap()
}

#[test]
fn duplicate_registration_names_the_taken_field() {
    let client = client!();
    let username = unique("dup");
    register(&client, &username);

    // Same username, fresh email: the username is the taken field.
    let response = client
        .post("/api/users/register")
        .header(ContentType::JSON)
        .body(
            json!({ "user": {
                "username": username,
                "email": format!("{}@other.example.com", username),
                "password": "password",
            }})
            .to_string(),
        )
        .dispatch();
    assert_eq!(response.status(), Status::UnprocessableEntity);
    let body: Value = response.into_json().unwrap();
    assert_eq!(body["errors"]["username"], json!(["has already been taken"]));

    // Same email, fresh username: the email is reported, and first.
    let other = unique("dup");
    let response = client
        .post("/api/users/register")
        .header(ContentType::JSON)
        .body(
            json!({ "user": {
                "username": other,
                "email": format!("{}@example.com", username),
                "password": "password",
            }})
            .to_string(),
        )
        .dispatch();
    assert_eq!(response.status(), Status::UnprocessableEntity);
    let body: Value = response.into_json().unwrap();
    assert_eq!(body["errors"]["email"], json!(["has already been taken"]));
}

#[test]
fn login_failures_share_one_body() {
    let client = client!();
    let username = unique("login");
    let (_token, email) = register(&client, &username);

    let wrong_password = client
        .post("/api/users/login")
        .header(ContentType::JSON)
        .body(json!({ "user": { "email": email, "password": "not-the-password" } }).to_string())
        .dispatch();
    assert_eq!(wrong_password.status(), Status::Unauthorized);
    let wrong_password: Value = wrong_password.into_json().unwrap();

    let unknown_email = client
        .post("/api/users/login")
        .header(ContentType::JSON)
        .body(
            json!({ "user": { "email": format!("{}@example.com", unique("ghost")), "password": "password" } })
                .to_string(),
        )
        .dispatch();
    assert_eq!(unknown_email.status(), Status::Unauthorized);
    let unknown_email: Value = unknown_email.into_json().unwrap();

    // The reply never says which side failed.
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(
        wrong_password["errors"]["message"],
        json!("Email or password is invalid")
    );
}

#[test]
fn follow_is_idempotent_and_unfollow_leaves_no_rows() {
    let client = client!();
    let follower = unique("fan");
    let followed = unique("star");
    let (token, _) = register(&client, &follower);
    register(&client, &followed);

    for _ in 0..2 {
        let response = client
            .post(format!("/api/profiles/{}/follow", followed))
            .header(token_header(&token))
            .dispatch();
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().unwrap();
        assert_eq!(body["profile"]["following"], json!(true));
    }

    let mut conn = db();
    let follower_id = user_id(&mut conn, &follower);
    let followed_id = user_id(&mut conn, &followed);
    let pair = follows::table
        .filter(follows::follower_id.eq(follower_id))
        .filter(follows::followed_id.eq(followed_id));
    let rows: i64 = pair.count().get_result(&mut conn).unwrap();
    assert_eq!(rows, 1);

    for _ in 0..2 {
        let response = client
            .delete(format!("/api/profiles/{}/follow", followed))
            .header(token_header(&token))
            .dispatch();
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().unwrap();
        assert_eq!(body["profile"]["following"], json!(false));
    }

    let rows: i64 = pair.count().get_result(&mut conn).unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn author_filter_is_scoped_and_newest_first() {
    let client = client!();
    let author = unique("author");
    let other = unique("writer");
    let (token, _) = register(&client, &author);
    let (other_token, _) = register(&client, &other);

    create_article(&client, &token, "First post");
    std::thread::sleep(std::time::Duration::from_millis(10));
    create_article(&client, &token, "Second post");
    create_article(&client, &other_token, "Unrelated post");

    let response = client
        .get(format!("/api/articles?author={}", author))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().unwrap();
    assert_eq!(body["articlesCount"], json!(2));
    let listed = body["articles"].as_array().unwrap();
    assert_eq!(listed.len(), 2);
    for article in listed {
        assert_eq!(article["author"]["username"], json!(author.clone()));
    }
    assert_eq!(listed[0]["title"], json!("Second post"));
    assert_eq!(listed[1]["title"], json!("First post"));
}

#[test]
fn favoriting_twice_does_not_double_count() {
    let client = client!();
    let (author_token, _) = register(&client, &unique("author"));
    let (reader_token, _) = register(&client, &unique("reader"));
    let slug = create_article(&client, &author_token, "Counted once");

    for _ in 0..2 {
        let response = client
            .post(format!("/api/articles/{}/favorite", slug))
            .header(token_header(&reader_token))
            .dispatch();
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().unwrap();
        assert_eq!(body["article"]["favorited"], json!(true));
        assert_eq!(body["article"]["favoritesCount"], json!(1));
    }

    let response = client
        .delete(format!("/api/articles/{}/favorite", slug))
        .header(token_header(&reader_token))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().unwrap();
    assert_eq!(body["article"]["favorited"], json!(false));
    assert_eq!(body["article"]["favoritesCount"], json!(0));
}

#[test]
fn deleting_an_article_deletes_its_comments() {
    let client = client!();
    let (token, _) = register(&client, &unique("author"));
    let slug = create_article(&client, &token, "Soon gone");

    for body in ["first!", "second!"] {
        let response = client
            .post(format!("/api/articles/{}/comments", slug))
            .header(ContentType::JSON)
            .header(token_header(&token))
            .body(json!({ "comment": { "body": body } }).to_string())
            .dispatch();
        assert_eq!(response.status(), Status::Created);
    }

    let mut conn = db();
    let article_id: i32 = articles::table
        .filter(articles::slug.eq(&slug))
        .select(articles::id)
        .first(&mut conn)
        .unwrap();

    let response = client
        .delete(format!("/api/articles/{}", slug))
        .header(token_header(&token))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);

    let remaining: i64 = comments::table
        .filter(comments::article_id.eq(article_id))
        .count()
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(remaining, 0);

    let response = client
        .get(format!("/api/articles/{}/comments", slug))
        .dispatch();
    assert_eq!(response.status(), Status::NotFound);
}

#[test]
fn non_author_is_forbidden_to_modify() {
    let client = client!();
    let (author_token, _) = register(&client, &unique("author"));
    let (intruder_token, _) = register(&client, &unique("intruder"));
    let slug = create_article(&client, &author_token, "Hands off");

    let response = client
        .put(format!("/api/articles/{}", slug))
        .header(ContentType::JSON)
        .header(token_header(&intruder_token))
        .body(json!({ "article": { "title": "Defaced" } }).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Forbidden);
    let body: Value = response.into_json().unwrap();
    assert_eq!(
        body["errors"]["message"],
        json!("You are not authorized to update this article")
    );

    let response = client
        .delete(format!("/api/articles/{}", slug))
        .header(token_header(&intruder_token))
        .dispatch();
    assert_eq!(response.status(), Status::Forbidden);

    let response = client
        .post(format!("/api/articles/{}/comments", slug))
        .header(ContentType::JSON)
        .header(token_header(&author_token))
        .body(json!({ "comment": { "body": "mine" } }).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Created);
    let comment: Value = response.into_json().unwrap();
    let comment_id = comment["comment"]["id"].as_i64().unwrap();

    let response = client
        .delete(format!("/api/articles/{}/comments/{}", slug, comment_id))
        .header(token_header(&intruder_token))
        .dispatch();
    assert_eq!(response.status(), Status::Forbidden);
}

#[test]
fn feed_without_follows_is_empty() {
    let client = client!();
    let (token, _) = register(&client, &unique("loner"));
    let response = client
        .get("/api/articles/feed")
        .header(token_header(&token))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().unwrap();
    assert_eq!(body, json!({ "articles": [], "articlesCount": 0 }));
}

#[test]
fn count_survives_pages_past_the_end() {
    let client = client!();
    let author = unique("pager");
    let (token, _) = register(&client, &author);
    create_article(&client, &token, "Page one");
    create_article(&client, &token, "Page two");

    let response = client
        .get(format!("/api/articles?author={}&offset=50", author))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().unwrap();
    assert_eq!(body["articles"], json!([]));
    assert_eq!(body["articlesCount"], json!(2));
}

#[test]
fn malformed_json_gets_the_bad_request_envelope() {
    let client = client!();
    let response = client
        .post("/api/users/login")
        .header(ContentType::JSON)
        .body("{not json")
        .dispatch();
    assert_eq!(response.status(), Status::BadRequest);
    let body: Value = response.into_json().unwrap();
    assert_eq!(body, json!({ "errors": { "message": "Bad request" } }));
}
