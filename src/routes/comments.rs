use crate::auth::Auth;
use crate::database::{articles, comments, Db};
use crate::errors::{Error, FieldValidator};
use crate::models::comment::CommentJson;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::{json, Json, Value};
use serde::Deserialize;
use validator::Validate;

#[get("/articles/<slug>/comments")]
pub async fn list_comments(slug: String, auth: Option<Auth>, db: Db) -> Result<Value, Error> {
    let user_id = auth.map(|auth| auth.id);
    let comments = db
        .run(move |conn| -> Result<Vec<CommentJson>, Error> {
            let article = articles::find_by_slug(conn, &slug)?
                .ok_or_else(|| Error::not_found("Article not found"))?;
            Ok(comments::find_by_article(conn, article.id, user_id)?)
        })
        .await?;
    Ok(json!({ "comments": comments }))
}

#[derive(Deserialize)]
pub struct NewComment {
    comment: NewCommentData,
}

#[derive(Deserialize, Validate)]
struct NewCommentData {
    #[validate(length(min = 1, max = 1000, message = "must be between 1 and 1000 characters"))]
    body: Option<String>,
}

#[post("/articles/<slug>/comments", data = "<new_comment>")]
pub async fn add_comment(
    slug: String,
    new_comment: Json<NewComment>,
    auth: Auth,
    db: Db,
) -> Result<Custom<Value>, Error> {
    let new_comment = new_comment.into_inner().comment;

    let mut extractor = FieldValidator::validate(&new_comment);
    let body = extractor.extract("body", new_comment.body);
    extractor.check()?;

    let author_id = auth.id;
    let comment = db
        .run(move |conn| -> Result<CommentJson, Error> {
            let article = articles::find_by_slug(conn, &slug)?
                .ok_or_else(|| Error::not_found("Article not found"))?;
            Ok(comments::create(conn, article.id, author_id, &body)?)
        })
        .await?;
    Ok(Custom(Status::Created, json!({ "comment": comment })))
}

#[delete("/articles/<slug>/comments/<id>")]
pub async fn delete_comment(slug: String, id: i32, auth: Auth, db: Db) -> Result<Value, Error> {
    let user_id = auth.id;
    db.run(move |conn| -> Result<(), Error> {
        let article = articles::find_by_slug(conn, &slug)?
            .ok_or_else(|| Error::not_found("Article not found"))?;
        let comment = comments::find_scoped(conn, article.id, id)?
            .ok_or_else(|| Error::not_found("Comment not found"))?;
        if comment.author_id != user_id {
            return Err(Error::forbidden(
                "You are not authorized to delete this comment",
            ));
        }
        comments::delete(conn, comment.id)?;
        Ok(())
    })
    .await?;
    Ok(json!({ "message": "Comment deleted successfully" }))
}
