pub mod auth;
pub mod password;
pub mod todo;
pub mod user;

#[cfg(test)]
pub mod test_util;
