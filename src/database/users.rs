use crate::models::user::User;
use crate::schema::users;
use diesel::prelude::*;

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub hash: &'a str,
}

/// Only fields present in the request body are written; `None` leaves the
/// column untouched.
#[derive(AsChangeset, Default)]
#[diesel(table_name = users)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub hash: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
}

pub fn find(conn: &mut PgConnection, id: i32) -> QueryResult<Option<User>> {
    users::table.find(id).first::<User>(conn).optional()
}

pub fn find_by_email(conn: &mut PgConnection, email: &str) -> QueryResult<Option<User>> {
    users::table
        .filter(users::email.eq(email))
        .first::<User>(conn)
        .optional()
}

pub fn find_by_username(conn: &mut PgConnection, username: &str) -> QueryResult<Option<User>> {
    users::table
        .filter(users::username.eq(username))
        .first::<User>(conn)
        .optional()
}

pub fn create(conn: &mut PgConnection, user: &NewUser) -> QueryResult<User> {
    diesel::insert_into(users::table)
        .values(user)
        .get_result(conn)
}

pub fn update(conn: &mut PgConnection, id: i32, changes: &UserChanges) -> QueryResult<User> {
    diesel::update(users::table.find(id))
        .set((changes, users::updated_at.eq(diesel::dsl::now)))
        .get_result(conn)
}
