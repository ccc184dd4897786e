//! Collection operations of [`CollectionClient`].
//!
//! Each public operation performs at most one round trip and always returns
//! an envelope; see [`crate::envelope::normalize`] for how failures are
//! reported.

use crate::client::CollectionClient;
use crate::codec::document_to_struct;
use crate::envelope::{
    normalize, CountResponse, DocListResponse, DocResponse, Envelope, IdListResponse, IdResponse,
};
use crate::error::{CollectionError, Result};
use crate::model::ModelDescriptor;
use crate::proto;
use crate::tag::decode_tag_document;
use bson::Document;

/// Operator part of an update: at least one of `set`, `unset` or `push`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSpec {
    /// `$set` operand.
    pub set: Option<Document>,
    /// `$unset` operand.
    pub unset: Option<Document>,
    /// `$push` operand.
    pub push: Option<Document>,
    /// Array filters for updating nested arrays.
    pub array_filter: Option<Document>,
    /// Whether to insert if no documents match.
    pub upsert: Option<bool>,
}

impl UpdateSpec {
    /// Create a builder.
    pub fn builder() -> UpdateSpecBuilder {
        UpdateSpecBuilder::default()
    }

    /// Reject a spec carrying none of `set`, `unset` and `push`.
    pub fn validate(&self) -> Result<()> {
        if self.set.is_none() && self.unset.is_none() && self.push.is_none() {
            return Err(CollectionError::invalid_argument(
                "set, unset or push is required",
            ));
        }
        Ok(())
    }

    fn to_request(&self, query: &Document) -> proto::UpdateRequest {
        proto::UpdateRequest {
            query: Some(document_to_struct(query)),
            set: self.set.as_ref().map(document_to_struct),
            unset: self.unset.as_ref().map(document_to_struct),
            push: self.push.as_ref().map(document_to_struct),
            array_filter: self.array_filter.as_ref().map(document_to_struct),
            upsert: self.upsert,
        }
    }
}

/// Builder for UpdateSpec.
#[derive(Debug, Clone, Default)]
pub struct UpdateSpecBuilder {
    spec: UpdateSpec,
}

impl UpdateSpecBuilder {
    /// Set the `$set` operand.
    pub fn set(mut self, set: Document) -> Self {
        self.spec.set = Some(set);
        self
    }

    /// Set the `$unset` operand.
    pub fn unset(mut self, unset: Document) -> Self {
        self.spec.unset = Some(unset);
        self
    }

    /// Set the `$push` operand.
    pub fn push(mut self, push: Document) -> Self {
        self.spec.push = Some(push);
        self
    }

    /// Set array filters.
    pub fn array_filter(mut self, filter: Document) -> Self {
        self.spec.array_filter = Some(filter);
        self
    }

    /// Set upsert option.
    pub fn upsert(mut self, upsert: bool) -> Self {
        self.spec.upsert = Some(upsert);
        self
    }

    /// Build the spec.
    pub fn build(self) -> UpdateSpec {
        self.spec
    }
}

/// One element of an `update_many` batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateRequest {
    pub query: Document,
    pub update: UpdateSpec,
}

impl UpdateRequest {
    pub fn new(query: Document, update: UpdateSpec) -> Self {
        Self { query, update }
    }
}

/// Options for `get_many`.
#[derive(Debug, Clone)]
pub struct GetManyOptions {
    /// Projection model; its name is forwarded and it reshapes the results.
    pub project_model: Option<ModelDescriptor>,
    /// Sort keys such as `"-created_at"`.
    pub sort: Option<Vec<String>>,
    /// Page size. Requires `page_num`.
    pub page_size: Option<u32>,
    /// 1-based page number.
    pub page_num: Option<u32>,
    /// Reshape results through the projection or bound model.
    pub model_validation: bool,
}

impl Default for GetManyOptions {
    fn default() -> Self {
        Self {
            project_model: None,
            sort: None,
            page_size: None,
            page_num: None,
            model_validation: true,
        }
    }
}

impl GetManyOptions {
    /// Create a builder.
    pub fn builder() -> GetManyOptionsBuilder {
        GetManyOptionsBuilder::default()
    }

    fn pagination(&self) -> Result<(Option<i32>, Option<i32>)> {
        let Some(page_size) = self.page_size else {
            return Ok((None, None));
        };
        let page_num = self.page_num.ok_or_else(|| {
            CollectionError::invalid_argument("page_num is required with page_size")
        })?;
        if page_size == 0 || page_num == 0 {
            return Err(CollectionError::invalid_argument(
                "page_size and page_num must be at least 1",
            ));
        }
        let to_wire = |v: u32, name: &str| {
            i32::try_from(v).map_err(|_| {
                CollectionError::invalid_argument(format!("{name} out of range: {v}"))
            })
        };
        Ok((
            Some(to_wire(page_size, "page_size")?),
            Some(to_wire(page_num, "page_num")?),
        ))
    }
}

/// Builder for GetManyOptions.
#[derive(Debug, Clone, Default)]
pub struct GetManyOptionsBuilder {
    options: GetManyOptions,
}

impl GetManyOptionsBuilder {
    /// Set the projection model.
    pub fn project_model(mut self, model: ModelDescriptor) -> Self {
        self.options.project_model = Some(model);
        self
    }

    /// Set the sort keys.
    pub fn sort<I, S>(mut self, sort: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.sort = Some(sort.into_iter().map(Into::into).collect());
        self
    }

    /// Request one page of `page_size` documents.
    pub fn page(mut self, page_size: u32, page_num: u32) -> Self {
        self.options.page_size = Some(page_size);
        self.options.page_num = Some(page_num);
        self
    }

    /// Enable or disable model validation.
    pub fn model_validation(mut self, enabled: bool) -> Self {
        self.options.model_validation = enabled;
        self
    }

    /// Build the options.
    pub fn build(self) -> GetManyOptions {
        self.options
    }
}

impl CollectionClient {
    /// Insert a single document and return its assigned id.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let res = client.insert_one(doc! { "name": "John" }).await;
    /// println!("Inserted ID: {}", res.id);
    /// ```
    pub async fn insert_one(&self, doc: Document) -> IdResponse {
        normalize("insert_one", self.try_insert_one(doc)).await
    }

    /// Insert documents in order and return their ids in the same order.
    pub async fn insert_many(&self, doc_list: Vec<Document>) -> IdListResponse {
        normalize("insert_many", self.try_insert_many(doc_list)).await
    }

    /// Fetch tagged values of `field_list` and decode them to native values.
    ///
    /// A tag without a converter fails the whole call.
    pub async fn get_tag<I, S>(&self, field_list: I, query: Document) -> DocResponse
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let field_list = field_list.into_iter().map(Into::into).collect();
        normalize("get_tag", self.try_get_tag(field_list, query)).await
    }

    /// Fetch a document by id, reshaped by the bound model when
    /// `model_validation` is set.
    pub async fn get_one(&self, doc_id: &str, model_validation: bool) -> DocResponse {
        normalize("get_one", self.try_get_one(doc_id, model_validation)).await
    }

    /// Find documents matching a query.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let options = GetManyOptions::builder()
    ///     .sort(["-created_at"])
    ///     .page(20, 1)
    ///     .build();
    /// let res = client.get_many(doc! { "status": "active" }, options).await;
    /// ```
    pub async fn get_many(
        &self,
        query: Document,
        options: impl Into<Option<GetManyOptions>>,
    ) -> DocListResponse {
        let options = options.into().unwrap_or_default();
        normalize("get_many", self.try_get_many(query, options)).await
    }

    /// Update the first document matching `query`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let res = client.update_one(
    ///     doc! { "_id": id },
    ///     UpdateSpec::builder().set(doc! { "name": "Jane" }).build(),
    /// ).await;
    /// ```
    pub async fn update_one(&self, query: Document, update: UpdateSpec) -> CountResponse {
        normalize("update_one", self.try_update_one(query, update)).await
    }

    /// Send a batch of updates in one request.
    ///
    /// With `ordered` the server stops at the first failing update.
    pub async fn update_many(
        &self,
        update_request_list: Vec<UpdateRequest>,
        ordered: bool,
    ) -> CountResponse {
        normalize(
            "update_many",
            self.try_update_many(update_request_list, ordered),
        )
        .await
    }

    /// Delete the first document matching `query`.
    pub async fn delete_one(&self, query: Document) -> CountResponse {
        normalize("delete_one", self.try_delete_one(query)).await
    }

    /// Delete every document matching `query`.
    pub async fn delete_many(&self, query: Document) -> CountResponse {
        normalize("delete_many", self.try_delete_many(query)).await
    }

    /// Run an aggregation pipeline. Results are returned as-is.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let pipeline = vec![
    ///     doc! { "$match": { "status": "active" } },
    ///     doc! { "$group": { "_id": "$category", "count": { "$sum": 1 } } },
    /// ];
    /// let res = client.aggregate(pipeline).await;
    /// ```
    pub async fn aggregate(&self, pipeline: Vec<Document>) -> DocListResponse {
        normalize("aggregate", self.try_aggregate(pipeline)).await
    }

    async fn try_insert_one(&self, doc: Document) -> Result<IdResponse> {
        tracing::debug!(operation = "insert_one", "sending request");
        let request = proto::DocRequest {
            doc: Some(document_to_struct(&doc)),
        };
        Ok(self.transport.insert_one(request).await?.into())
    }

    async fn try_insert_many(&self, doc_list: Vec<Document>) -> Result<IdListResponse> {
        tracing::debug!(operation = "insert_many", docs = doc_list.len(), "sending request");
        let request = proto::DocListRequest {
            doc_list: doc_list.iter().map(document_to_struct).collect(),
        };
        Ok(self.transport.insert_many(request).await?.into())
    }

    async fn try_get_tag(&self, field_list: Vec<String>, query: Document) -> Result<DocResponse> {
        tracing::debug!(operation = "get_tag", fields = field_list.len(), "sending request");
        let request = proto::TagRequest {
            field_list,
            query: Some(document_to_struct(&query)),
        };
        let mut res: DocResponse = self.transport.get_tag(request).await?.into();
        if !res.is_success() {
            return Ok(res);
        }
        res.doc = decode_tag_document(&res.doc)?;
        Ok(res)
    }

    async fn try_get_one(&self, doc_id: &str, model_validation: bool) -> Result<DocResponse> {
        tracing::debug!(operation = "get_one", doc_id, "sending request");
        let request = proto::IdRequest {
            doc_id: doc_id.to_string(),
        };
        let mut res: DocResponse = self.transport.get_one(request).await?.into();
        if !res.is_success() || !model_validation {
            return Ok(res);
        }
        res.doc = self.model.reshape(res.doc)?;
        Ok(res)
    }

    async fn try_get_many(
        &self,
        query: Document,
        options: GetManyOptions,
    ) -> Result<DocListResponse> {
        let (page_size, page_num) = options.pagination()?;
        tracing::debug!(operation = "get_many", ?page_size, ?page_num, "sending request");
        let request = proto::QueryRequest {
            query: Some(document_to_struct(&query)),
            project_model: options.project_model.map(|m| m.name().to_string()),
            sort: options.sort.unwrap_or_default(),
            page_size,
            page_num,
        };
        let mut res: DocListResponse = self.transport.get_many(request).await?.into();
        if !res.is_success() || !options.model_validation {
            return Ok(res);
        }
        let model = options.project_model.unwrap_or(self.model);
        res.doc_list = model.reshape_all(res.doc_list)?;
        Ok(res)
    }

    async fn try_update_one(&self, query: Document, update: UpdateSpec) -> Result<CountResponse> {
        update.validate()?;
        tracing::debug!(operation = "update_one", "sending request");
        let request = update.to_request(&query);
        Ok(self.transport.update_one(request).await?.into())
    }

    async fn try_update_many(
        &self,
        update_request_list: Vec<UpdateRequest>,
        ordered: bool,
    ) -> Result<CountResponse> {
        let mut requests = Vec::with_capacity(update_request_list.len());
        for (index, item) in update_request_list.iter().enumerate() {
            item.update.validate().map_err(|err| match err {
                CollectionError::InvalidArgument(msg) => CollectionError::invalid_argument(
                    format!("update_request_list[{index}]: {msg}"),
                ),
                other => other,
            })?;
            requests.push(item.update.to_request(&item.query));
        }
        tracing::debug!(
            operation = "update_many",
            updates = requests.len(),
            ordered,
            "sending request"
        );
        let request = proto::UpdateManyRequest {
            update_request_list: requests,
            ordered,
        };
        Ok(self.transport.update_many(request).await?.into())
    }

    async fn try_delete_one(&self, query: Document) -> Result<CountResponse> {
        tracing::debug!(operation = "delete_one", "sending request");
        Ok(self.transport.delete_one(query_request(&query)).await?.into())
    }

    async fn try_delete_many(&self, query: Document) -> Result<CountResponse> {
        tracing::debug!(operation = "delete_many", "sending request");
        Ok(self.transport.delete_many(query_request(&query)).await?.into())
    }

    async fn try_aggregate(&self, pipeline: Vec<Document>) -> Result<DocListResponse> {
        tracing::debug!(operation = "aggregate", stages = pipeline.len(), "sending request");
        let request = proto::AggregateRequest {
            pipeline: pipeline.iter().map(document_to_struct).collect(),
        };
        Ok(self.transport.aggregate(request).await?.into())
    }
}

fn query_request(query: &Document) -> proto::QueryRequest {
    proto::QueryRequest {
        query: Some(document_to_struct(query)),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_update_spec_requires_an_operator() {
        let err = UpdateSpec::default().validate().unwrap_err();
        assert!(matches!(err, CollectionError::InvalidArgument(_)));

        let only_upsert = UpdateSpec::builder().upsert(true).build();
        assert!(only_upsert.validate().is_err());
    }

    #[test]
    fn test_update_spec_single_operator_is_enough() {
        for spec in [
            UpdateSpec::builder().set(doc! { "a": 1 }).build(),
            UpdateSpec::builder().unset(doc! { "a": "" }).build(),
            UpdateSpec::builder().push(doc! { "tags": "x" }).build(),
        ] {
            assert!(spec.validate().is_ok(), "{spec:?}");
        }
    }

    #[test]
    fn test_update_spec_to_request() {
        let spec = UpdateSpec::builder()
            .set(doc! { "items.$[e].done": true })
            .array_filter(doc! { "e.id": 4 })
            .upsert(false)
            .build();
        let req = spec.to_request(&doc! { "_id": "x" });
        assert!(req.query.is_some());
        assert!(req.set.is_some());
        assert!(req.unset.is_none());
        assert!(req.push.is_none());
        assert!(req.array_filter.is_some());
        assert_eq!(req.upsert, Some(false));
    }

    #[test]
    fn test_get_many_options_default() {
        let options = GetManyOptions::default();
        assert!(options.project_model.is_none());
        assert!(options.sort.is_none());
        assert!(options.model_validation);
        assert_eq!(options.pagination().unwrap(), (None, None));
    }

    #[test]
    fn test_get_many_options_builder() {
        let options = GetManyOptions::builder()
            .project_model(ModelDescriptor::document())
            .sort(["-created_at", "+name"])
            .page(20, 3)
            .model_validation(false)
            .build();

        assert_eq!(options.project_model.unwrap().name(), "Document");
        assert_eq!(
            options.sort.as_deref(),
            Some(&["-created_at".to_string(), "+name".to_string()][..])
        );
        assert!(!options.model_validation);
        assert_eq!(options.pagination().unwrap(), (Some(20), Some(3)));
    }

    #[test]
    fn test_pagination_requires_page_num() {
        let options = GetManyOptions {
            page_size: Some(10),
            ..Default::default()
        };
        assert!(matches!(
            options.pagination(),
            Err(CollectionError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_pagination_is_one_based() {
        let options = GetManyOptions::builder().page(10, 0).build();
        assert!(options.pagination().is_err());
    }

    #[test]
    fn test_page_num_without_size_is_ignored() {
        let options = GetManyOptions {
            page_num: Some(2),
            ..Default::default()
        };
        assert_eq!(options.pagination().unwrap(), (None, None));
    }
}
