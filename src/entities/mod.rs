pub mod prelude;

pub mod access_logs;
pub mod user_sessions;
pub mod users;
