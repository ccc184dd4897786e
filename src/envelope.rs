//! Response envelopes and failure normalization.
//!
//! Every collection operation returns one of the envelope types below. A
//! failed operation produces the same type with `code` and `message` filled
//! in and the payload left empty.

use crate::codec::{optional_struct_to_document, struct_to_document};
use crate::error::{CollectionError, Result};
use crate::proto;
use bson::Document;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Common accessors shared by all response envelopes.
pub trait Envelope: Default + Serialize {
    /// Response code. 2xx means success.
    fn code(&self) -> i32;

    /// Diagnostic message.
    fn message(&self) -> &str;

    /// Build an envelope with an empty payload.
    fn failure(code: i32, message: String) -> Self;

    /// Whether the code is in the 2xx range.
    fn is_success(&self) -> bool {
        self.code() / 100 == 2
    }

    /// Render the envelope as a JSON mapping with every field present.
    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

macro_rules! impl_envelope {
    ($($ty:ty),+ $(,)?) => {$(
        impl Envelope for $ty {
            fn code(&self) -> i32 {
                self.code
            }

            fn message(&self) -> &str {
                &self.message
            }

            fn failure(code: i32, message: String) -> Self {
                Self {
                    code,
                    message,
                    ..Default::default()
                }
            }
        }
    )+};
}

/// Envelope carrying a single inserted identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdResponse {
    pub code: i32,
    pub message: String,
    pub id: String,
}

/// Envelope carrying the identifiers of a batch insert, in request order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdListResponse {
    pub code: i32,
    pub message: String,
    pub id_list: Vec<String>,
}

/// Envelope carrying one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocResponse {
    pub code: i32,
    pub message: String,
    pub doc: Document,
}

/// Envelope carrying a list of documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocListResponse {
    pub code: i32,
    pub message: String,
    pub doc_list: Vec<Document>,
    /// Number of matches before pagination, when the server reports it.
    pub total_count: i64,
}

/// Envelope carrying an affected-document count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountResponse {
    pub code: i32,
    pub message: String,
    pub count: i64,
}

impl_envelope!(
    IdResponse,
    IdListResponse,
    DocResponse,
    DocListResponse,
    CountResponse,
);

impl From<proto::IdResponse> for IdResponse {
    fn from(res: proto::IdResponse) -> Self {
        Self {
            code: res.code,
            message: res.message,
            id: res.id,
        }
    }
}

impl From<proto::IdListResponse> for IdListResponse {
    fn from(res: proto::IdListResponse) -> Self {
        Self {
            code: res.code,
            message: res.message,
            id_list: res.id_list,
        }
    }
}

impl From<proto::DocResponse> for DocResponse {
    fn from(res: proto::DocResponse) -> Self {
        Self {
            code: res.code,
            doc: optional_struct_to_document(res.doc.as_ref()),
            message: res.message,
        }
    }
}

impl From<proto::DocListResponse> for DocListResponse {
    fn from(res: proto::DocListResponse) -> Self {
        Self {
            code: res.code,
            message: res.message,
            doc_list: res.doc_list.iter().map(struct_to_document).collect(),
            total_count: res.total_count,
        }
    }
}

impl From<proto::CountResponse> for CountResponse {
    fn from(res: proto::CountResponse) -> Self {
        Self {
            code: res.code,
            message: res.message,
            count: res.count,
        }
    }
}

/// Run an operation and convert any failure into an envelope.
///
/// Transport failures become code 400 with the gRPC status code and detail.
/// Every other error, including a panic inside the operation, becomes code
/// 500. A successful envelope, whatever its code, is returned unchanged.
pub async fn normalize<R, F>(operation: &'static str, fut: F) -> R
where
    R: Envelope,
    F: Future<Output = Result<R>>,
{
    let outcome = AssertUnwindSafe(fut).catch_unwind().await;
    let err = match outcome {
        Ok(Ok(response)) => return response,
        Ok(Err(err)) => err,
        Err(panic) => CollectionError::internal(panic_message(panic.as_ref())),
    };
    let (code, message) = failure_message(operation, &err);
    tracing::warn!(operation, code, %message, "operation failed");
    R::failure(code, message)
}

fn failure_message(operation: &str, err: &CollectionError) -> (i32, String) {
    let message = match err {
        CollectionError::Transport(status) => format!(
            "{operation} gRPC Error: {:?} - {}",
            status.code(),
            status.message()
        ),
        other => format!("{operation} Error: {other}"),
    };
    (err.status_code(), message)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "operation panicked".to_string()
    }
}
