use diesel::{Connection, PgConnection, RunQueryDsl, connection::SimpleConnection, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    postgres_connection::{PgPoolSquad, establish_connection},
    schema::users,
};

const SCHEMA_SQL: &str =
    include_str!("../../../../migrations/2025-06-01-000000_create_gym_schema/up.sql");

/// Drops the per-test schema when the test ends.
pub struct ScratchSchema {
    admin_url: String,
    name: String,
}

impl Drop for ScratchSchema {
    fn drop(&mut self) {
        if let Ok(mut conn) = PgConnection::establish(&self.admin_url) {
            let _ = conn.batch_execute(&format!("DROP SCHEMA IF EXISTS {} CASCADE", self.name));
        }
    }
}

pub fn test_database_url() -> String {
    dotenvy::dotenv().ok();
    std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL")
}

pub fn scratch_pool(admin_url: &str) -> (ScratchSchema, Arc<PgPoolSquad>) {
    let name = format!("gym_test_{}", Uuid::new_v4().simple());
    let mut admin = PgConnection::establish(admin_url).expect("connect TEST_DATABASE_URL");
    admin
        .batch_execute(&format!("CREATE SCHEMA {name}"))
        .expect("create scratch schema");

    let mut scoped = url::Url::parse(admin_url).expect("TEST_DATABASE_URL must be a URL");
    scoped
        .query_pairs_mut()
        .append_pair("options", &format!("-csearch_path={name},public"));

    let pool = establish_connection(scoped.as_str()).expect("build pool");
    pool.get()
        .expect("pooled connection")
        .batch_execute(SCHEMA_SQL)
        .expect("apply schema");

    (
        ScratchSchema {
            admin_url: admin_url.to_string(),
            name,
        },
        Arc::new(pool),
    )
}

pub fn seed_user(conn: &mut PgConnection, email: &str) -> Uuid {
    insert_into(users::table)
        .values((
            users::email.eq(email),
            users::password_hash.eq("x"),
            users::membership_status.eq("inactive"),
        ))
        .returning(users::id)
        .get_result(conn)
        .expect("seed user")
}
