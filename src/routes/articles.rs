use crate::auth::Auth;
use crate::database::articles::{self, ArticleChanges, FeedArticles, FindArticles};
use crate::database::Db;
use crate::errors::{Error, FieldValidator};
use crate::models::article::ArticleJson;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::{json, Json, Value};
use serde::Deserialize;
use validator::Validate;

#[get("/articles?<params..>")]
pub async fn list_articles(
    params: FindArticles,
    auth: Option<Auth>,
    db: Db,
) -> Result<Value, Error> {
    let user_id = auth.map(|auth| auth.id);
    let (articles, articles_count) = db
        .run(move |conn| articles::find(conn, &params, user_id))
        .await?;
    Ok(json!({ "articles": articles, "articlesCount": articles_count }))
}

#[get("/articles/feed?<params..>")]
pub async fn feed_articles(params: FeedArticles, auth: Auth, db: Db) -> Result<Value, Error> {
    let user_id = auth.id;
    let (articles, articles_count) = db
        .run(move |conn| articles::feed(conn, &params, user_id))
        .await?;
    Ok(json!({ "articles": articles, "articlesCount": articles_count }))
}

#[get("/articles/<slug>")]
pub async fn read_article(slug: String, auth: Option<Auth>, db: Db) -> Result<Value, Error> {
    let user_id = auth.map(|auth| auth.id);
    let article = db
        .run(move |conn| -> Result<ArticleJson, Error> {
            let article = articles::find_by_slug(conn, &slug)?
                .ok_or_else(|| Error::not_found("Article not found"))?;
            Ok(articles::populate(conn, article, user_id)?)
        })
        .await?;
    Ok(json!({ "article": article }))
}

#[derive(Deserialize)]
pub struct NewArticle {
    article: NewArticleData,
}

#[derive(Deserialize, Validate)]
struct NewArticleData {
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    title: Option<String>,
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    description: Option<String>,
    #[validate(length(min = 1, message = "can't be blank"))]
    body: Option<String>,
    #[serde(rename = "tagList", default)]
    tag_list: Vec<String>,
}

#[post("/articles", data = "<new_article>")]
pub async fn create_article(
    new_article: Json<NewArticle>,
    auth: Auth,
    db: Db,
) -> Result<Custom<Value>, Error> {
    let new_article = new_article.into_inner().article;

    let mut extractor = FieldValidator::validate(&new_article);
    let title = extractor.extract("title", new_article.title);
    let description = extractor.extract("description", new_article.description);
    let body = extractor.extract("body", new_article.body);
    extractor.check()?;

    let author_id = auth.id;
    let tag_list = new_article.tag_list;
    let article = db
        .run(move |conn| articles::create(conn, author_id, &title, &description, &body, &tag_list))
        .await?;
    Ok(Custom(Status::Created, json!({ "article": article })))
}

#[derive(Deserialize)]
pub struct UpdateArticle {
    article: UpdateArticleData,
}

#[derive(Deserialize, Validate, Default)]
struct UpdateArticleData {
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    title: Option<String>,
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    description: Option<String>,
    #[validate(length(min = 1, message = "can't be blank"))]
    body: Option<String>,
    // When present, replaces the article's tag set wholesale.
    #[serde(rename = "tagList")]
    tag_list: Option<Vec<String>>,
}

#[put("/articles/<slug>", data = "<article>")]
pub async fn update_article(
    slug: String,
    article: Json<UpdateArticle>,
    auth: Auth,
    db: Db,
) -> Result<Value, Error> {
    let data = article.into_inner().article;
    FieldValidator::validate(&data).check()?;
    let user_id = auth.id;

    let article = db
        .run(move |conn| -> Result<ArticleJson, Error> {
            let existing = articles::find_by_slug(conn, &slug)?
                .ok_or_else(|| Error::not_found("Article not found"))?;
            if existing.author_id != user_id {
                return Err(Error::forbidden(
                    "You are not authorized to update this article",
                ));
            }
            let changes = ArticleChanges {
                title: data.title,
                description: data.description,
                body: data.body,
            };
            Ok(articles::update(
                conn,
                &existing,
                &changes,
                data.tag_list.as_deref(),
                user_id,
            )?)
        })
        .await?;
    Ok(json!({ "article": article }))
}

#[delete("/articles/<slug>")]
pub async fn delete_article(slug: String, auth: Auth, db: Db) -> Result<Value, Error> {
    let user_id = auth.id;
    db.run(move |conn| -> Result<(), Error> {
        let article = articles::find_by_slug(conn, &slug)?
            .ok_or_else(|| Error::not_found("Article not found"))?;
        if article.author_id != user_id {
            return Err(Error::forbidden(
                "You are not authorized to delete this article",
            ));
        }
        articles::delete(conn, article.id)?;
        Ok(())
    })
    .await?;
    Ok(json!({ "message": "Article deleted successfully" }))
}

#[post("/articles/<slug>/favorite")]
pub async fn favorite_article(slug: String, auth: Auth, db: Db) -> Result<Value, Error> {
    let user_id = auth.id;
    let article = db
        .run(move |conn| -> Result<ArticleJson, Error> {
            let article = articles::find_by_slug(conn, &slug)?
                .ok_or_else(|| Error::not_found("Article not found"))?;
            articles::favorite(conn, user_id, article.id)?;
            Ok(articles::populate(conn, article, Some(user_id))?)
        })
        .await?;
    Ok(json!({ "article": article }))
}

#[delete("/articles/<slug>/favorite")]
pub async fn unfavorite_article(slug: String, auth: Auth, db: Db) -> Result<Value, Error> {
    let user_id = auth.id;
    let article = db
        .run(move |conn| -> Result<ArticleJson, Error> {
            let article = articles::find_by_slug(conn, &slug)?
                .ok_or_else(|| Error::not_found("Article not found"))?;
            articles::unfavorite(conn, user_id, article.id)?;
            Ok(articles::populate(conn, article, Some(user_id))?)
        })
        .await?;
    Ok(json!({ "article": article }))
}
