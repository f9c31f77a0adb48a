pub mod conte;
pub mod devinette;
pub mod remote;

use serde::{de::DeserializeOwned, Serialize};

pub use conte::{AudioTrack, Conte, ContePage, Language};
pub use devinette::{Devinette, DevinetteAnswer, Difficulty};
pub use remote::{HttpRemoteSource, RemoteSource};

/// A cacheable catalog entry (story or riddle).
///
/// The associated constants describe how a collection is addressed on the
/// wire and in the local store: its endpoint path, the JSON envelope fields
/// for list and detail responses, and the fixed cache key of its partition.
pub trait CatalogItem: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Path segment of the collection endpoint, e.g. `contes`.
    const COLLECTION: &'static str;

    /// Envelope field holding a list response, e.g. `{ "contes": [...] }`.
    const LIST_FIELD: &'static str;

    /// Envelope field holding a detail response, e.g. `{ "conte": {...} }`.
    const ITEM_FIELD: &'static str;

    /// Key of the single cache partition for this collection.
    const CACHE_KEY: &'static str;

    fn id(&self) -> &str;

    fn is_premium(&self) -> bool;
}

/// Split a catalog into free and premium subsets, keeping relative order.
pub fn partition_by_premium<T: CatalogItem>(items: Vec<T>) -> (Vec<T>, Vec<T>) {
    items.into_iter().partition(|item| !item.is_premium())
}
