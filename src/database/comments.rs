use crate::database::profiles::is_following;
use crate::models::comment::{Comment, CommentJson};
use crate::models::user::User;
use crate::schema::{comments, users};
use diesel::prelude::*;

#[derive(Insertable)]
#[diesel(table_name = comments)]
struct NewComment<'a> {
    body: &'a str,
    article_id: i32,
    author_id: i32,
}

/// Newest first, each author profile annotated with the caller's
/// following status.
pub fn find_by_article(
    conn: &mut PgConnection,
    article_id: i32,
    user_id: Option<i32>,
) -> QueryResult<Vec<CommentJson>> {
    let rows = comments::table
        .filter(comments::article_id.eq(article_id))
        .order(comments::created_at.desc())
        .load::<Comment>(conn)?;

    let mut result = Vec::with_capacity(rows.len());
    for comment in rows {
        let author: User = users::table.find(comment.author_id).first(conn)?;
        let following = match user_id {
            Some(uid) => is_following(conn, uid, author.id)?,
            None => false,
        };
        result.push(comment.attributes(author.to_profile(following)));
    }
    Ok(result)
}

pub fn create(
    conn: &mut PgConnection,
    article_id: i32,
    author_id: i32,
    body: &str,
) -> QueryResult<CommentJson> {
    let comment: Comment = diesel::insert_into(comments::table)
        .values(&NewComment {
            body,
            article_id,
            author_id,
        })
        .get_result(conn)?;
    let author: User = users::table.find(author_id).first(conn)?;
    // One's own comment: the author profile carries following=false.
    Ok(comment.attributes(author.to_profile(false)))
}

/// Scoped to the article so a comment id from another article 404s.
pub fn find_scoped(
    conn: &mut PgConnection,
    article_id: i32,
    comment_id: i32,
) -> QueryResult<Option<Comment>> {
    comments::table
        .filter(comments::id.eq(comment_id))
        .filter(comments::article_id.eq(article_id))
        .first::<Comment>(conn)
        .optional()
}

pub fn delete(conn: &mut PgConnection, comment_id: i32) -> QueryResult<usize> {
    diesel::delete(comments::table.find(comment_id)).execute(conn)
}
