pub mod chat;
pub mod history;
pub mod login;
pub mod sidebar;
