use crate::error::Result;

/// Durable client-side key/value storage (what `localStorage` is to the web
/// client). Calls are synchronous: every mutation is written through before
/// the caller continues.
pub trait ClientStorage: Send + Sync {
    /// Raw value for `key`, or `None` if it was never set or has been removed.
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
