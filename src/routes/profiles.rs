use crate::auth::Auth;
use crate::database::{profiles, users, Db};
use crate::errors::Error;
use crate::models::user::Profile;
use rocket::serde::json::{json, Value};

#[get("/profiles/<username>")]
pub async fn read_profile(
    username: String,
    auth: Option<Auth>,
    db: Db,
) -> Result<Value, Error> {
    let user_id = auth.map(|auth| auth.id);
    let profile = db
        .run(move |conn| -> Result<Profile, Error> {
            let user = users::find_by_username(conn, &username)?
                .ok_or_else(|| Error::not_found("User not found"))?;
            let following = match user_id {
                Some(id) => profiles::is_following(conn, id, user.id)?,
                None => false,
            };
            Ok(user.to_profile(following))
        })
        .await?;
    Ok(json!({ "profile": profile }))
}

#[post("/profiles/<username>/follow")]
pub async fn follow_user(username: String, auth: Auth, db: Db) -> Result<Value, Error> {
    let user_id = auth.id;
    let profile = db
        .run(move |conn| -> Result<Profile, Error> {
            let target = users::find_by_username(conn, &username)?
                .ok_or_else(|| Error::not_found("User not found"))?;
            if target.id == user_id {
                return Err(Error::validation("username", "You can't follow yourself"));
            }
            profiles::follow(conn, user_id, target.id)?;
            Ok(target.to_profile(true))
        })
        .await?;
    Ok(json!({ "profile": profile }))
}

#[delete("/profiles/<username>/follow")]
pub async fn unfollow_user(username: String, auth: Auth, db: Db) -> Result<Value, Error> {
    let user_id = auth.id;
    let profile = db
        .run(move |conn| -> Result<Profile, Error> {
            let target = users::find_by_username(conn, &username)?
                .ok_or_else(|| Error::not_found("User not found"))?;
            profiles::unfollow(conn, user_id, target.id)?;
            Ok(target.to_profile(false))
        })
        .await?;
    Ok(json!({ "profile": profile }))
}
