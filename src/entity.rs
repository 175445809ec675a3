use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// A domain type that templates can map query results into.
///
/// `TYPE` is the discriminator stored alongside every document; templates
/// restrict each query to documents carrying the discriminator of the
/// requested type.
pub trait Entity:
    Debug + Clone + Serialize + DeserializeOwned + Send + Sync + Unpin + 'static
{
    const TYPE: &'static str;

    fn id(&self) -> String;
}
