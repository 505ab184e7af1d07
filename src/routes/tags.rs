use crate::database::{tags, Db};
use crate::errors::Error;
use rocket::serde::json::{json, Value};

#[get("/tags")]
pub async fn list_tags(db: Db) -> Result<Value, Error> {
    let tags = db.run(tags::all).await?;
    Ok(json!({ "tags": tags }))
}
