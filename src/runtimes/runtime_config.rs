//! Runtime configuration resolved from the environment.

/// Which checkpoint store backing an engine is built with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StoreKind {
    /// Volatile in-process storage. The only backend shipped here; durable
    /// backends plug in through the `CheckpointStore` trait.
    #[default]
    InMemory,
}

/// Engine construction settings.
///
/// `from_env` consults `REVIEWGATE_STORE` (via `dotenvy`, so a local `.env`
/// file works); unknown values fall back to the in-memory store with a
/// warning rather than failing startup.
#[derive(Clone, Debug, Default)]
pub struct RuntimeConfig {
    pub store: StoreKind,
}

impl RuntimeConfig {
    #[must_use]
    pub fn new(store: StoreKind) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let store = match std::env::var("REVIEWGATE_STORE").as_deref() {
            Ok("memory") | Err(_) => StoreKind::InMemory,
            Ok(other) => {
                tracing::warn!(value = %other, "unknown REVIEWGATE_STORE, using in-memory store");
                StoreKind::InMemory
            }
        };
        Self { store }
    }
}
