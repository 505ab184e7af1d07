use crate::database::profiles::{followed_ids, is_following};
use crate::database::tags::{of_article, set_tags};
use crate::database::{CountSubselect, OffsetLimit};
use crate::models::article::{Article, ArticleJson};
use crate::models::user::User;
use crate::schema::{article_tags, articles, favorites, tags, users};
use diesel::dsl::exists;
use diesel::pg::Pg;
use diesel::prelude::*;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

const DEFAULT_LIMIT: i64 = 20;
const SUFFIX_LEN: usize = 6;

#[derive(FromForm, Default)]
pub struct FindArticles {
    pub tag: Option<String>,
    pub author: Option<String>,
    pub favorited: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(FromForm, Default)]
pub struct FeedArticles {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Insertable)]
#[diesel(table_name = articles)]
struct NewArticle<'a> {
    slug: &'a str,
    title: &'a str,
    description: &'a str,
    body: &'a str,
    author_id: i32,
}

/// Supplied fields overwrite, absent ones are kept. The slug is never
/// part of the changeset: it stays as minted at creation.
#[derive(AsChangeset, Default)]
#[diesel(table_name = articles)]
pub struct ArticleChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
}

/// Filters compose as AND; an unknown author or favoriting user short
/// circuits to the empty result. Count covers the whole filtered set, not
/// the returned page.
pub fn find(
    conn: &mut PgConnection,
    params: &FindArticles,
    user_id: Option<i32>,
) -> QueryResult<(Vec<ArticleJson>, i64)> {
    let author_id = match &params.author {
        Some(author) => match user_id_by_name(conn, author)? {
            Some(author_id) => Some(author_id),
            None => return Ok((vec![], 0)),
        },
        None => None,
    };
    let fan_id = match &params.favorited {
        Some(favorited) => match user_id_by_name(conn, favorited)? {
            Some(fan_id) => Some(fan_id),
            None => return Ok((vec![], 0)),
        },
        None => None,
    };
    let tag = params.tag.clone();

    let build = move || {
        let mut query = articles::table
            .order(articles::created_at.desc())
            .into_boxed();
        if let Some(author_id) = author_id {
            query = query.filter(articles::author_id.eq(author_id));
        }
        if let Some(tag) = &tag {
            let tagged = article_tags::table
                .inner_join(tags::table)
                .filter(tags::name.eq(tag.clone()))
                .select(article_tags::article_id);
            query = query.filter(articles::id.eq_any(tagged));
        }
        if let Some(fan_id) = fan_id {
            let favorited_ids = favorites::table
                .filter(favorites::user_id.eq(fan_id))
                .select(favorites::article_id);
            query = query.filter(articles::id.eq_any(favorited_ids));
        }
        query
    };

    load_page(
        conn,
        build,
        params.offset.unwrap_or(0),
        params.limit.unwrap_or(DEFAULT_LIMIT),
        user_id,
    )
}

/// Articles authored by users the caller follows. Following nobody never
/// touches the articles table.
pub fn feed(
    conn: &mut PgConnection,
    params: &FeedArticles,
    user_id: i32,
) -> QueryResult<(Vec<ArticleJson>, i64)> {
    let followed = followed_ids(conn, user_id)?;
    if followed.is_empty() {
        return Ok((vec![], 0));
    }

    let build = move || {
        articles::table
            .filter(articles::author_id.eq_any(followed.clone()))
            .order(articles::created_at.desc())
            .into_boxed()
    };
    load_page(
        conn,
        build,
        params.offset.unwrap_or(0),
        params.limit.unwrap_or(DEFAULT_LIMIT),
        Some(user_id),
    )
}

pub fn find_by_slug(conn: &mut PgConnection, slug: &str) -> QueryResult<Option<Article>> {
    articles::table
        .filter(articles::slug.eq(slug))
        .first::<Article>(conn)
        .optional()
}

pub fn create(
    conn: &mut PgConnection,
    author_id: i32,
    title: &str,
    description: &str,
    body: &str,
    tag_list: &[String],
) -> QueryResult<ArticleJson> {
    let slug = slugify(title);
    let article: Article = diesel::insert_into(articles::table)
        .values(&NewArticle {
            slug: &slug,
            title,
            description,
            body,
            author_id,
        })
        .get_result(conn)?;
    set_tags(conn, article.id, tag_list)?;
    populate(conn, article, Some(author_id))
}

pub fn update(
    conn: &mut PgConnection,
    article: &Article,
    changes: &ArticleChanges,
    tag_list: Option<&[String]>,
    user_id: i32,
) -> QueryResult<ArticleJson> {
    let updated: Article = diesel::update(articles::table.find(article.id))
        .set((changes, articles::updated_at.eq(diesel::dsl::now)))
        .get_result(conn)?;
    if let Some(names) = tag_list {
        set_tags(conn, updated.id, names)?;
    }
    populate(conn, updated, Some(user_id))
}

/// Comments, tag links and favorites go with it through the cascading
/// foreign keys.
pub fn delete(conn: &mut PgConnection, article_id: i32) -> QueryResult<usize> {
    diesel::delete(articles::table.find(article_id)).execute(conn)
}

pub fn favorite(conn: &mut PgConnection, user_id: i32, article_id: i32) -> QueryResult<usize> {
    diesel::insert_into(favorites::table)
        .values((
            favorites::user_id.eq(user_id),
            favorites::article_id.eq(article_id),
        ))
        .on_conflict((favorites::user_id, favorites::article_id))
        .do_nothing()
        .execute(conn)
}

pub fn unfavorite(conn: &mut PgConnection, user_id: i32, article_id: i32) -> QueryResult<usize> {
    diesel::delete(favorites::table.find((user_id, article_id))).execute(conn)
}

/// Annotates a row for the calling user: tag list, live favorites count,
/// the caller's `favorited` flag and the author profile with `following`.
pub fn populate(
    conn: &mut PgConnection,
    article: Article,
    user_id: Option<i32>,
) -> QueryResult<ArticleJson> {
    let author: User = users::table.find(article.author_id).first(conn)?;
    let tag_list = of_article(conn, article.id)?;
    let favorites_count: i64 = favorites::table
        .filter(favorites::article_id.eq(article.id))
        .count()
        .get_result(conn)?;
    let favorited = match user_id {
        Some(uid) => {
            diesel::select(exists(favorites::table.find((uid, article.id)))).get_result(conn)?
        }
        None => false,
    };
    let following = match user_id {
        Some(uid) => is_following(conn, uid, author.id)?,
        None => false,
    };
    Ok(article.attributes(author.to_profile(following), tag_list, favorited, favorites_count))
}

fn load_page<F>(
    conn: &mut PgConnection,
    build: F,
    offset: i64,
    limit: i64,
    user_id: Option<i32>,
) -> QueryResult<(Vec<ArticleJson>, i64)>
where
    F: Fn() -> articles::BoxedQuery<'static, Pg>,
{
    let (rows, mut count) = build()
        .offset_and_limit(offset, limit)
        .load_and_count::<Article>(conn)?;
    // The window count rides on the returned rows; a page past the end of
    // the filtered set has none, so recount without the pagination.
    if rows.is_empty() && offset > 0 {
        count = build().count_subselect().get_result(conn)?;
    }
    let mut result = Vec::with_capacity(rows.len());
    for article in rows {
        result.push(populate(conn, article, user_id)?);
    }
    Ok((result, count))
}

fn user_id_by_name(conn: &mut PgConnection, username: &str) -> QueryResult<Option<i32>> {
    users::table
        .filter(users::username.eq(username))
        .select(users::id)
        .first(conn)
        .optional()
}

/// URL-safe identifier derived from the title, unique per creation even
/// for duplicate titles thanks to the random suffix.
fn slugify(title: &str) -> String {
    if cfg!(feature = "random-suffix") {
        format!("{}-{}", slug::slugify(title), generate_suffix(SUFFIX_LEN))
    } else {
        slug::slugify(title)
    }
}

fn generate_suffix(len: usize) -> String {
    let mut rng = thread_rng();
    (0..len)
        .map(|_| rng.sample(Alphanumeric) as char)
        .collect::<String>()
        .to_lowercase()
}
