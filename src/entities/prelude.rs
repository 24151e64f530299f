pub use super::access_logs::Entity as AccessLogs;
pub use super::user_sessions::Entity as UserSessions;
pub use super::users::Entity as Users;
