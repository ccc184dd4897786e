//! # collection-client
//!
//! MongoDB-shaped document operations over a remote collection server.
//!
//! This crate exposes inserts, lookups, updates, deletes and aggregation
//! pipelines on untyped BSON documents, and carries them to a
//! `collection.CollectionServer` gRPC service instead of a direct database
//! connection.
//!
//! ## Features
//!
//! - Async/await support with tokio
//! - One uniform response envelope per operation: failures are data, not errors
//! - Optional validation and reshaping of results through serde models
//! - Decoding of tagged values into native BSON values
//! - Task-scoped access to the active client
//!
//! ## Quick Start
//!
//! ```ignore
//! use collection_client::prelude::*;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct User {
//!     #[serde(rename = "_id")]
//!     id: String,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> collection_client::Result<()> {
//!     let options = ClientOptions::parse("localhost:50051")?;
//!     let client = CollectionClient::connect(&options, ModelDescriptor::of::<User>())?;
//!
//!     let res = client.insert_one(doc! { "name": "John" }).await;
//!     if !res.is_success() {
//!         eprintln!("insert failed: {}", res.message);
//!     }
//!
//!     let page = client
//!         .get_many(doc! {}, GetManyOptions::builder().page(20, 1).build())
//!         .await;
//!     println!("{} of {}", page.doc_list.len(), page.total_count);
//!
//!     client.close();
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod codec;
pub mod collection;
pub mod context;
pub mod envelope;
pub mod error;
pub mod model;
pub mod proto;
pub mod tag;
pub mod transport;

// Re-export main types
pub use client::{ClientOptions, ClientOptionsBuilder, CollectionClient};
pub use collection::{
    GetManyOptions, GetManyOptionsBuilder, UpdateRequest, UpdateSpec, UpdateSpecBuilder,
};
pub use envelope::{
    CountResponse, DocListResponse, DocResponse, Envelope, IdListResponse, IdResponse,
};
pub use error::{CollectionError, ErrorKind, Result};
pub use model::ModelDescriptor;
pub use tag::ValueTag;
pub use transport::{CollectionTransport, GrpcTransport};

// Re-export bson for convenience
pub use bson;
pub use bson::doc;

/// Prelude module for common imports.
pub mod prelude {
    pub use super::client::{ClientOptions, CollectionClient};
    pub use super::collection::{GetManyOptions, UpdateRequest, UpdateSpec};
    pub use super::context;
    pub use super::envelope::{
        CountResponse, DocListResponse, DocResponse, Envelope, IdListResponse, IdResponse,
    };
    pub use super::error::{CollectionError, Result};
    pub use super::model::ModelDescriptor;
    pub use bson::{doc, Document};
    pub use serde::{Deserialize, Serialize};
}

/// Get the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), "0.1.0");
    }

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let _: Result<()> = Ok(());
        let _doc: Document = doc! { "test": 1 };
        let _spec = UpdateSpec::builder().set(doc! { "a": 1 }).build();
    }
}
