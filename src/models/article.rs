use crate::config::DATE_FORMAT;
use crate::models::user::Profile;
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = crate::schema::articles)]
pub struct Article {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub author_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// The wire shape of an article, annotated for the calling user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleJson {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub favorited: bool,
    pub favorites_count: i64,
    pub author: Profile,
}

impl Article {
    pub fn attributes(
        self,
        author: Profile,
        tag_list: Vec<String>,
        favorited: bool,
        favorites_count: i64,
    ) -> ArticleJson {
        ArticleJson {
            slug: self.slug,
            title: self.title,
            description: self.description,
            body: self.body,
            tag_list,
            created_at: self.created_at.format(DATE_FORMAT).to_string(),
            updated_at: self.updated_at.format(DATE_FORMAT).to_string(),
            favorited,
            favorites_count,
            author,
        }
    }
}
