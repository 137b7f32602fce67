pub mod postgres_connection;
pub mod schema;
#[cfg(test)]
pub mod test_support;
