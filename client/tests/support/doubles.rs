//! Recording doubles for the driven ports.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use client::domain::ports::{
    Collection, FixtureResourceGateway, LoginError, LoginService, Record, RemoteCallError,
    ResourceGateway,
};
use client::domain::{AuthTokens, LoginCredentials, SessionContext};
use resource_query::ResourceQuery;

use super::recording_double_macro::recording_double;

recording_double! {
    /// Scripted answer for [`RecordingLoginService`].
    pub enum LoginResponse {
        Ok(AuthTokens),
        Err(LoginError),
    }

    /// Login double recording the username/password pairs it receives.
    pub struct RecordingLoginService {
        records: (String, String),
        implements: LoginService,
        method: authenticate(&self, credentials: &LoginCredentials)
            -> Result<AuthTokens, LoginError>,
        record: (
            credentials.username().to_owned(),
            credentials.password().to_owned()
        ),
    }
}

/// Kind of gateway call observed by [`RecordingGateway`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMethod {
    FindAll,
    Create,
    Update,
}

/// One observed gateway call.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayCall {
    pub method: GatewayMethod,
    pub collection: Collection,
    pub credential: Option<String>,
    pub record: Option<Record>,
}

/// Gateway that records calls and delegates to an in-memory fixture unless a
/// failure has been scripted for the collection.
#[derive(Clone, Default)]
pub struct RecordingGateway {
    inner: Arc<FixtureResourceGateway>,
    calls: Arc<Mutex<Vec<GatewayCall>>>,
    failures: Arc<Mutex<HashMap<Collection, RemoteCallError>>>,
}

impl RecordingGateway {
    pub fn with_records(records: impl IntoIterator<Item = (Collection, Record)>) -> Self {
        Self {
            inner: Arc::new(FixtureResourceGateway::with_records(records)),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().expect("gateway calls lock").clone()
    }

    pub fn calls_to(&self, collection: Collection) -> Vec<GatewayCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.collection == collection)
            .collect()
    }

    pub fn stored(&self, collection: Collection) -> Vec<Record> {
        self.inner.records(collection)
    }

    pub fn fail(&self, collection: Collection, error: RemoteCallError) {
        self.failures
            .lock()
            .expect("gateway failures lock")
            .insert(collection, error);
    }

    pub fn recover(&self, collection: Collection) {
        self.failures
            .lock()
            .expect("gateway failures lock")
            .remove(&collection);
    }

    fn observe(
        &self,
        method: GatewayMethod,
        context: &SessionContext,
        collection: Collection,
        record: Option<&Record>,
    ) -> Result<(), RemoteCallError> {
        self.calls
            .lock()
            .expect("gateway calls lock")
            .push(GatewayCall {
                method,
                collection,
                credential: context.credential().map(|token| token.expose().to_owned()),
                record: record.cloned(),
            });
        match self
            .failures
            .lock()
            .expect("gateway failures lock")
            .get(&collection)
        {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ResourceGateway for RecordingGateway {
    async fn find_all(
        &self,
        context: &SessionContext,
        collection: Collection,
        query: &ResourceQuery,
    ) -> Result<Vec<Record>, RemoteCallError> {
        self.observe(GatewayMethod::FindAll, context, collection, None)?;
        self.inner.find_all(context, collection, query).await
    }

    async fn create(
        &self,
        context: &SessionContext,
        collection: Collection,
        record: Record,
    ) -> Result<Record, RemoteCallError> {
        self.observe(GatewayMethod::Create, context, collection, Some(&record))?;
        self.inner.create(context, collection, record).await
    }

    async fn update(
        &self,
        context: &SessionContext,
        collection: Collection,
        record: Record,
    ) -> Result<Record, RemoteCallError> {
        self.observe(GatewayMethod::Update, context, collection, Some(&record))?;
        self.inner.update(context, collection, record).await
    }
}
