//! Transport channel to the collection server.

use crate::client::ClientOptions;
use crate::error::{CollectionError, Result};
use crate::proto::{
    AggregateRequest, CountResponse, DocListRequest, DocListResponse, DocRequest, DocResponse,
    IdListResponse, IdRequest, IdResponse, QueryRequest, TagRequest, UpdateManyRequest,
    UpdateRequest,
};
use async_trait::async_trait;
use std::sync::Mutex;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::Status;

/// One round trip per method; implementations never retry.
#[async_trait]
pub trait CollectionTransport: Send + Sync {
    async fn insert_one(&self, request: DocRequest) -> std::result::Result<IdResponse, Status>;

    async fn insert_many(
        &self,
        request: DocListRequest,
    ) -> std::result::Result<IdListResponse, Status>;

    async fn get_tag(&self, request: TagRequest) -> std::result::Result<DocResponse, Status>;

    async fn get_one(&self, request: IdRequest) -> std::result::Result<DocResponse, Status>;

    async fn get_many(&self, request: QueryRequest)
        -> std::result::Result<DocListResponse, Status>;

    async fn update_one(&self, request: UpdateRequest)
        -> std::result::Result<CountResponse, Status>;

    async fn update_many(
        &self,
        request: UpdateManyRequest,
    ) -> std::result::Result<CountResponse, Status>;

    async fn delete_one(&self, request: QueryRequest) -> std::result::Result<CountResponse, Status>;

    async fn delete_many(&self, request: QueryRequest)
        -> std::result::Result<CountResponse, Status>;

    async fn aggregate(
        &self,
        request: AggregateRequest,
    ) -> std::result::Result<DocListResponse, Status>;

    /// Release the underlying connection.
    ///
    /// Must be idempotent. Calls made after `close` fail with a transport
    /// error instead of reconnecting.
    fn close(&self) {}
}

mod path {
    pub const INSERT_ONE: &str = "/collection.CollectionServer/InsertOne";
    pub const INSERT_MANY: &str = "/collection.CollectionServer/InsertMany";
    pub const GET_TAG: &str = "/collection.CollectionServer/GetTag";
    pub const GET_ONE: &str = "/collection.CollectionServer/GetOne";
    pub const GET_MANY: &str = "/collection.CollectionServer/GetMany";
    pub const UPDATE_ONE: &str = "/collection.CollectionServer/UpdateOne";
    pub const UPDATE_MANY: &str = "/collection.CollectionServer/UpdateMany";
    pub const DELETE_ONE: &str = "/collection.CollectionServer/DeleteOne";
    pub const DELETE_MANY: &str = "/collection.CollectionServer/DeleteMany";
    pub const AGGREGATE: &str = "/collection.CollectionServer/Aggregate";
}

/// gRPC transport over a single tonic channel.
///
/// `close` drops the channel, which tears down its connection once in-flight
/// calls holding a clone of it finish.
#[derive(Debug)]
pub struct GrpcTransport {
    channel: Mutex<Option<Channel>>,
    uri: String,
}

impl GrpcTransport {
    /// Build a lazily-connected channel for the configured host and port.
    pub fn open(options: &ClientOptions) -> Result<Self> {
        let uri = options.endpoint_uri();
        let mut endpoint = Endpoint::from_shared(uri.clone())
            .map_err(|e| CollectionError::connection(format!("{uri}: {e}")))?;
        if let Some(timeout) = options.connect_timeout() {
            endpoint = endpoint.connect_timeout(timeout);
        }
        if let Some(timeout) = options.request_timeout() {
            endpoint = endpoint.timeout(timeout);
        }

        tracing::debug!(uri = %uri, "opening collection channel");
        Ok(Self {
            channel: Mutex::new(Some(endpoint.connect_lazy())),
            uri,
        })
    }

    /// The URI this transport connects to.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Whether `close` has released the channel.
    pub fn is_closed(&self) -> bool {
        self.channel.lock().map_or(true, |slot| slot.is_none())
    }

    fn channel(&self) -> std::result::Result<Channel, Status> {
        self.channel
            .lock()
            .ok()
            .and_then(|slot| slot.clone())
            .ok_or_else(|| Status::unavailable(format!("channel to {} is closed", self.uri)))
    }

    async fn unary<Req, Resp>(
        &self,
        path: &'static str,
        request: Req,
    ) -> std::result::Result<Resp, Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = tonic::client::Grpc::new(self.channel()?);
        grpc.ready()
            .await
            .map_err(|e| Status::unknown(format!("Service was not ready: {e}")))?;
        let codec = tonic::codec::ProstCodec::<Req, Resp>::default();
        let response = grpc
            .unary(
                tonic::Request::new(request),
                PathAndQuery::from_static(path),
                codec,
            )
            .await?;
        Ok(response.into_inner())
    }
}

#[async_trait]
impl CollectionTransport for GrpcTransport {
    async fn insert_one(&self, request: DocRequest) -> std::result::Result<IdResponse, Status> {
        self.unary(path::INSERT_ONE, request).await
    }

    async fn insert_many(
        &self,
        request: DocListRequest,
    ) -> std::result::Result<IdListResponse, Status> {
        self.unary(path::INSERT_MANY, request).await
    }

    async fn get_tag(&self, request: TagRequest) -> std::result::Result<DocResponse, Status> {
        self.unary(path::GET_TAG, request).await
    }

    async fn get_one(&self, request: IdRequest) -> std::result::Result<DocResponse, Status> {
        self.unary(path::GET_ONE, request).await
    }

    async fn get_many(
        &self,
        request: QueryRequest,
    ) -> std::result::Result<DocListResponse, Status> {
        self.unary(path::GET_MANY, request).await
    }

    async fn update_one(
        &self,
        request: UpdateRequest,
    ) -> std::result::Result<CountResponse, Status> {
        self.unary(path::UPDATE_ONE, request).await
    }

    async fn update_many(
        &self,
        request: UpdateManyRequest,
    ) -> std::result::Result<CountResponse, Status> {
        self.unary(path::UPDATE_MANY, request).await
    }

    async fn delete_one(
        &self,
        request: QueryRequest,
    ) -> std::result::Result<CountResponse, Status> {
        self.unary(path::DELETE_ONE, request).await
    }

    async fn delete_many(
        &self,
        request: QueryRequest,
    ) -> std::result::Result<CountResponse, Status> {
        self.unary(path::DELETE_MANY, request).await
    }

    async fn aggregate(
        &self,
        request: AggregateRequest,
    ) -> std::result::Result<DocListResponse, Status> {
        self.unary(path::AGGREGATE, request).await
    }

    fn close(&self) {
        let released = match self.channel.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if released.is_some() {
            tracing::debug!(uri = %self.uri, "releasing collection channel");
        }
    }
}
