//! Protobuf messages of the `collection.CollectionServer` service.
//!
//! Documents travel as `google.protobuf.Struct`. Every response carries
//! `code` and `message` followed by an operation-specific payload.

use prost_types::Struct;

/// Fully-qualified gRPC service name.
pub const SERVICE_NAME: &str = "collection.CollectionServer";

/// Request carrying a single document.
#[derive(Clone, PartialEq, prost::Message)]
pub struct DocRequest {
    #[prost(message, optional, tag = "1")]
    pub doc: Option<Struct>,
}

/// Request carrying an ordered batch of documents.
#[derive(Clone, PartialEq, prost::Message)]
pub struct DocListRequest {
    #[prost(message, repeated, tag = "1")]
    pub doc_list: Vec<Struct>,
}

/// Tag projection over `field_list` for documents matching `query`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct TagRequest {
    #[prost(string, repeated, tag = "1")]
    pub field_list: Vec<String>,
    #[prost(message, optional, tag = "2")]
    pub query: Option<Struct>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct IdRequest {
    #[prost(string, tag = "1")]
    pub doc_id: String,
}

/// Filtered, optionally sorted and paginated query.
#[derive(Clone, PartialEq, prost::Message)]
pub struct QueryRequest {
    #[prost(message, optional, tag = "1")]
    pub query: Option<Struct>,
    #[prost(string, optional, tag = "2")]
    pub project_model: Option<String>,
    #[prost(string, repeated, tag = "3")]
    pub sort: Vec<String>,
    #[prost(int32, optional, tag = "4")]
    pub page_size: Option<i32>,
    #[prost(int32, optional, tag = "5")]
    pub page_num: Option<i32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UpdateRequest {
    #[prost(message, optional, tag = "1")]
    pub query: Option<Struct>,
    #[prost(message, optional, tag = "2")]
    pub set: Option<Struct>,
    #[prost(message, optional, tag = "3")]
    pub unset: Option<Struct>,
    #[prost(message, optional, tag = "4")]
    pub push: Option<Struct>,
    #[prost(message, optional, tag = "5")]
    pub array_filter: Option<Struct>,
    #[prost(bool, optional, tag = "6")]
    pub upsert: Option<bool>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UpdateManyRequest {
    #[prost(message, repeated, tag = "1")]
    pub update_request_list: Vec<UpdateRequest>,
    /// Stop at the first failing update when set.
    #[prost(bool, tag = "2")]
    pub ordered: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AggregateRequest {
    #[prost(message, repeated, tag = "1")]
    pub pipeline: Vec<Struct>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct IdResponse {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(string, tag = "3")]
    pub id: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct IdListResponse {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(string, repeated, tag = "3")]
    pub id_list: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DocResponse {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(message, optional, tag = "3")]
    pub doc: Option<Struct>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DocListResponse {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(message, repeated, tag = "3")]
    pub doc_list: Vec<Struct>,
    /// Match count before pagination.
    #[prost(int64, tag = "4")]
    pub total_count: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CountResponse {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(int64, tag = "3")]
    pub count: i64,
}
