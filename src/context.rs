//! Task-scoped access to the active [`CollectionClient`].
//!
//! A scope binds a client for the duration of a future. Code running inside
//! the future reaches the client through [`current`] instead of taking it as a
//! parameter. Scopes nest: leaving an inner scope restores the client the
//! outer scope bound, and leaving the outermost scope leaves nothing active.
//! The binding is task-local, so concurrent tasks never see each other's
//! client.
//!
//! # Example
//!
//! ```ignore
//! use collection_client::context;
//!
//! async fn rename(id: &str, name: &str) -> CountResponse {
//!     let client = context::current().expect("no active collection client");
//!     let update = UpdateSpec::builder().set(doc! { "name": name }).build();
//!     client.update_one(doc! { "_id": id }, update).await
//! }
//!
//! let options = ClientOptions::parse("localhost:50051")?;
//! context::with_collection_client(&options, ModelDescriptor::of::<User>(), || async {
//!     rename("u1", "Ann").await
//! })
//! .await?;
//! ```

use crate::client::{ClientOptions, CollectionClient};
use crate::error::Result;
use crate::model::ModelDescriptor;
use std::future::Future;
use std::sync::{Arc, Weak};

tokio::task_local! {
    static ACTIVE_CLIENT: Weak<CollectionClient>;
}

/// The client bound by the innermost enclosing scope, if any.
pub fn current() -> Option<Arc<CollectionClient>> {
    ACTIVE_CLIENT.try_with(Weak::upgrade).ok().flatten()
}

/// Run `fut` with `client` as the active client.
///
/// The registry only holds a weak reference; `client` is kept alive by this
/// call until `fut` completes. The previously active client is restored when
/// `fut` completes, panics or is dropped.
pub async fn scope<F>(client: Arc<CollectionClient>, fut: F) -> F::Output
where
    F: Future,
{
    tracing::debug!(model = client.model().name(), "entering collection client scope");
    ACTIVE_CLIENT.scope(Arc::downgrade(&client), fut).await
}

/// Synchronous counterpart of [`scope`].
pub fn sync_scope<F, R>(client: Arc<CollectionClient>, f: F) -> R
where
    F: FnOnce() -> R,
{
    ACTIVE_CLIENT.sync_scope(Arc::downgrade(&client), f)
}

/// Bind `client` for the duration of `f`, then close it.
///
/// The transport is closed on every exit path, including a panic in `f` or
/// the returned future being dropped. Handles to the client obtained through
/// [`current`] stay valid but their operations fail once it is closed.
pub async fn with_client<F, Fut>(client: CollectionClient, f: F) -> Fut::Output
where
    F: FnOnce() -> Fut,
    Fut: Future,
{
    let client = Arc::new(client);
    let release = Release(Arc::clone(&client));
    let output = scope(client, async move { f().await }).await;
    drop(release);
    output
}

/// Open a channel, bind a client over it for the duration of `f`, then
/// release the channel.
pub async fn with_collection_client<F, Fut>(
    options: &ClientOptions,
    model: ModelDescriptor,
    f: F,
) -> Result<Fut::Output>
where
    F: FnOnce() -> Fut,
    Fut: Future,
{
    let client = CollectionClient::connect(options, model)?;
    Ok(with_client(client, f).await)
}

/// Closes the client's transport when dropped.
struct Release(Arc<CollectionClient>);

impl Drop for Release {
    fn drop(&mut self) {
        tracing::debug!(
            model = self.0.model().name(),
            "leaving collection client scope"
        );
        self.0.transport.close();
    }
}
