//! Domain model descriptors used to validate and reshape returned documents.

use crate::error::{CollectionError, Result};
use bson::Document;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

type ReshapeFn = fn(Document) -> Result<Document>;

/// A named validate-and-reshape capability for raw documents.
///
/// # Example
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct User {
///     #[serde(rename = "_id")]
///     id: String,
///     name: String,
///     #[serde(default)]
///     age: i32,
/// }
///
/// let model = ModelDescriptor::of::<User>();
/// let shaped = model.reshape(doc! { "_id": "u1", "name": "Ann", "extra": 1 })?;
/// assert_eq!(shaped, doc! { "_id": "u1", "name": "Ann", "age": 0 });
/// ```
#[derive(Clone, Copy)]
pub struct ModelDescriptor {
    name: &'static str,
    reshape: ReshapeFn,
}

impl ModelDescriptor {
    /// Create a descriptor from a name and a reshape function.
    pub fn new(name: &'static str, reshape: ReshapeFn) -> Self {
        Self { name, reshape }
    }

    /// Descriptor for a serde model, named after the type.
    pub fn of<T>() -> Self
    where
        T: Serialize + DeserializeOwned,
    {
        Self::named::<T>(short_type_name::<T>())
    }

    /// Descriptor for a serde model with an explicit name.
    pub fn named<T>(name: &'static str) -> Self
    where
        T: Serialize + DeserializeOwned,
    {
        Self::new(name, reshape_as::<T>)
    }

    /// Identity descriptor: documents pass through untouched.
    pub fn document() -> Self {
        Self::new("Document", Ok)
    }

    /// The model name forwarded to the server.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Validate a raw document and return its reshaped form.
    pub fn reshape(&self, doc: Document) -> Result<Document> {
        (self.reshape)(doc)
    }

    /// Reshape every document of a list, failing on the first rejection.
    pub fn reshape_all(&self, docs: Vec<Document>) -> Result<Vec<Document>> {
        docs.into_iter().map(|doc| self.reshape(doc)).collect()
    }
}

impl fmt::Debug for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDescriptor")
            .field("name", &self.name)
            .finish()
    }
}

fn reshape_as<T>(doc: Document) -> Result<Document>
where
    T: Serialize + DeserializeOwned,
{
    let model: T = bson::from_document(doc).map_err(|e| {
        CollectionError::validation(format!("{}: {}", short_type_name::<T>(), e))
    })?;
    Ok(bson::to_document(&model)?)
}

/// Last path segment of the type name, without generic arguments.
fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize)]
    struct User {
        #[serde(rename = "_id")]
        id: String,
        name: String,
        #[serde(default)]
        age: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Strict {
        name: String,
    }

    #[test]
    fn test_reshape_drops_extra_and_fills_defaults() {
        let model = ModelDescriptor::of::<User>();
        let shaped = model
            .reshape(doc! { "_id": "u1", "name": "Ann", "extra": true })
            .unwrap();
        assert_eq!(shaped, doc! { "_id": "u1", "name": "Ann", "age": 0_i64 });
    }

    #[test]
    fn test_reshape_rejects_missing_field() {
        let err = ModelDescriptor::of::<User>()
            .reshape(doc! { "_id": "u1" })
            .unwrap_err();
        assert!(matches!(err, CollectionError::Validation(_)));
        assert!(err.to_string().contains("User"));
    }

    #[test]
    fn test_strict_model_rejects_unknown_field() {
        let err = ModelDescriptor::of::<Strict>()
            .reshape(doc! { "name": "a", "other": 1 })
            .unwrap_err();
        assert!(matches!(err, CollectionError::Validation(_)));
    }

    #[test]
    fn test_names() {
        assert_eq!(ModelDescriptor::of::<User>().name(), "User");
        assert_eq!(ModelDescriptor::named::<User>("UserView").name(), "UserView");
        assert_eq!(ModelDescriptor::document().name(), "Document");
        assert_eq!(short_type_name::<Vec<User>>(), "Vec");
    }

    #[test]
    fn test_document_descriptor_is_identity() {
        let doc = doc! { "anything": [1, 2], "z": "last" };
        assert_eq!(ModelDescriptor::document().reshape(doc.clone()).unwrap(), doc);
    }

    #[test]
    fn test_reshape_all_stops_on_rejection() {
        let docs = vec![
            doc! { "_id": "1", "name": "a" },
            doc! { "_id": "2" },
        ];
        assert!(ModelDescriptor::of::<User>().reshape_all(docs).is_err());
    }
}
