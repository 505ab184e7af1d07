use crate::config::DATE_FORMAT;
use crate::models::user::Profile;
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = crate::schema::comments)]
pub struct Comment {
    pub id: i32,
    pub body: String,
    pub article_id: i32,
    pub author_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentJson {
    pub id: i32,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
    pub author: Profile,
}

impl Comment {
    pub fn attributes(self, author: Profile) -> CommentJson {
        CommentJson {
            id: self.id,
            body: self.body,
            created_at: self.created_at.format(DATE_FORMAT).to_string(),
            updated_at: self.updated_at.format(DATE_FORMAT).to_string(),
            author,
        }
    }
}
