use crate::schema::{article_tags, tags};
use diesel::prelude::*;

/// All distinct tag names, alphabetical. Tags are never deleted, so names
/// of articles long gone keep showing up here.
pub fn all(conn: &mut PgConnection) -> QueryResult<Vec<String>> {
    tags::table
        .select(tags::name)
        .order(tags::name.asc())
        .load(conn)
}

/// Get-or-create by normalized name. Returns `None` for names that are
/// empty after trimming.
pub fn ensure(conn: &mut PgConnection, name: &str) -> QueryResult<Option<i32>> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return Ok(None);
    }
    diesel::insert_into(tags::table)
        .values(tags::name.eq(&name))
        .on_conflict(tags::name)
        .do_nothing()
        .execute(conn)?;
    tags::table
        .filter(tags::name.eq(&name))
        .select(tags::id)
        .first(conn)
        .map(Some)
}

/// Replaces the article's tag set wholesale; an update with a tag list is
/// never a merge.
pub fn set_tags(conn: &mut PgConnection, article_id: i32, names: &[String]) -> QueryResult<()> {
    diesel::delete(article_tags::table.filter(article_tags::article_id.eq(article_id)))
        .execute(conn)?;
    for name in names {
        if let Some(tag_id) = ensure(conn, name)? {
            diesel::insert_into(article_tags::table)
                .values((
                    article_tags::article_id.eq(article_id),
                    article_tags::tag_id.eq(tag_id),
                ))
                .on_conflict((article_tags::article_id, article_tags::tag_id))
                .do_nothing()
                .execute(conn)?;
        }
    }
    Ok(())
}

pub fn of_article(conn: &mut PgConnection, article_id: i32) -> QueryResult<Vec<String>> {
    article_tags::table
        .inner_join(tags::table)
        .filter(article_tags::article_id.eq(article_id))
        .select(tags::name)
        .order(tags::name.asc())
        .load(conn)
}
