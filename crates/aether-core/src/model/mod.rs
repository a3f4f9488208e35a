mod chat;
mod file;
mod user;

pub use chat::*;
pub use file::*;
pub use user::*;
