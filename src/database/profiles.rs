use crate::schema::follows;
use diesel::dsl::exists;
use diesel::prelude::*;

pub fn is_following(conn: &mut PgConnection, follower: i32, followed: i32) -> QueryResult<bool> {
    diesel::select(exists(follows::table.find((follower, followed)))).get_result(conn)
}

/// Idempotent: re-following is a no-op, the composite key is the only
/// guard against duplicate rows under concurrent requests.
pub fn follow(conn: &mut PgConnection, follower: i32, followed: i32) -> QueryResult<usize> {
    diesel::insert_into(follows::table)
        .values((
            follows::follower_id.eq(follower),
            follows::followed_id.eq(followed),
        ))
        .on_conflict((follows::follower_id, follows::followed_id))
        .do_nothing()
        .execute(conn)
}

pub fn unfollow(conn: &mut PgConnection, follower: i32, followed: i32) -> QueryResult<usize> {
    diesel::delete(follows::table.find((follower, followed))).execute(conn)
}

pub fn followed_ids(conn: &mut PgConnection, follower: i32) -> QueryResult<Vec<i32>> {
    follows::table
        .filter(follows::follower_id.eq(follower))
        .select(follows::followed_id)
        .load(conn)
}
