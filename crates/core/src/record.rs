//! Record trait: a storable shape plus its partial-update companion.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A record that any CRUD store can hold.
///
/// The serialized form of `Self` is the stored body (without id); field names
/// are the serde names, which is also what filters refer to.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    /// Partial update: serializes to an object holding only the supplied fields.
    type Patch: Serialize + Send + Sync;
}
