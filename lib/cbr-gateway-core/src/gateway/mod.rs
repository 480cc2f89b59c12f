use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

mod builder;
pub use self::builder::GatewayBuilder;

mod registry;
pub use self::registry::{SchemaDescriptor, SchemaId, SchemaRegistry};

mod connection;
pub use self::connection::{Connector, RemoteClient, RemoteFault};

mod cache;
use self::cache::SchemaCache;

mod contract;
pub use self::contract::{MethodContract, MethodContracts, ParamType};

mod arguments;
pub use self::arguments::CallArguments;

mod date;
pub use self::date::{DEFAULT_SERVICE_OFFSET_SECONDS, DateCoercion, DateInput, coerce_date};

mod dispatcher;
pub use self::dispatcher::{Dispatcher, PendingInvocation};

mod courses;
pub use self::courses::{COURSES_METHOD, CURRENCY_CODE_FIELD, NOMINAL_FIELD, RATE_FIELD};

mod result;
pub use self::result::{RawResult, XML_PAYLOAD_FIELD};

mod xml;
pub use self::xml::XmlNode;

mod http;
pub use self::http::{HTTP_FAULT_CODE, HttpConnector, HttpRemoteClient};

mod error;
pub use self::error::GatewayError;

#[cfg(test)]
pub(crate) mod mock;

/// `tracing` target of every gateway event.
pub const LOG_TARGET: &str = "cbr";

/// Gateway to the central bank web services.
///
/// A `Gateway` is a cheap, clonable handle: clones share the connection cache (one
/// [`RemoteClient`] per schema) and the contract cache (one discovery per schema).
/// Calls go through a [`Dispatcher`], see [`Gateway::dispatcher`].
///
/// # Example
///
/// ```rust,no_run
/// use cbr_gateway_core::{CallArguments, Gateway};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = Gateway::builder().build()?;
///
/// // Current US dollar rate
/// let usd = gateway.course_rate("USD", None).await?;
///
/// // Any method of any schema
/// let mut dispatcher = gateway.dispatcher();
/// let auctions = dispatcher
///     .market()
///     .select_method(
///         "DirRepoAuctionParam",
///         CallArguments::new()
///             .add_arg("DateFrom", "01.02.2014")
///             .add_arg("DateTo", "15.09.2015"),
///     )
///     .as_xml_fragment()
///     .await?;
/// # Ok(())
/// # }
/// ```
///
/// # Thread Safety
///
/// Caches are guarded per schema, concurrent dispatchers never open a second client
/// nor run a second discovery for the same schema.
#[derive(Debug)]
pub struct Gateway<C: Connector = HttpConnector> {
    inner: Arc<Shared<C>>,
}

#[derive(Debug)]
struct Shared<C: Connector> {
    registry: SchemaRegistry,
    dates: DateCoercion,
    connector: C,
    clients: SchemaCache<C::Client>,
    contracts: SchemaCache<MethodContracts>,
}

impl<C: Connector> Clone for Gateway<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

// Create
impl Gateway {
    /// Starts configuring a gateway.
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }
}

impl<C: Connector> Gateway<C> {
    pub(in crate::gateway) fn new(registry: SchemaRegistry, dates: DateCoercion, connector: C) -> Self {
        let shared = Shared {
            registry,
            dates,
            connector,
            clients: SchemaCache::default(),
            contracts: SchemaCache::default(),
        };
        Self {
            inner: Arc::new(shared),
        }
    }

    /// The schema registry.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.inner.registry
    }

    /// The date coercion applied to `dateTime` parameters.
    pub fn date_coercion(&self) -> DateCoercion {
        self.inner.dates
    }

    /// The connector opening remote clients.
    pub fn connector(&self) -> &C {
        &self.inner.connector
    }

    /// Creates a dispatcher with no schema selected.
    pub fn dispatcher(&self) -> Dispatcher<C> {
        Dispatcher::new(self.clone())
    }

    /// Coerces a date argument the way `dateTime` parameters are coerced.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DateParse`] if the value cannot be read as a date.
    pub fn coerce_date(&self, value: &Value) -> Result<String, GatewayError> {
        self.inner.dates.coerce(value)
    }
}

// Caches
impl<C: Connector> Gateway<C> {
    /// Returns the client of `schema`, opening it on first access.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RemoteCall`] if the connection cannot be opened; nothing
    /// is cached then, so the next access tries again.
    pub async fn get_client(&self, schema: SchemaId) -> Result<Arc<C::Client>, GatewayError> {
        let descriptor = self.inner.registry.descriptor(schema)?;
        self.inner
            .clients
            .get_or_try_init(schema, || async {
                debug!(target: LOG_TARGET, %schema, endpoint = %descriptor.endpoint(), "opening remote client");
                let client = self.inner.connector.connect(&descriptor).await?;
                Ok(client)
            })
            .await
    }

    /// Returns the method contracts of `schema`, discovering them on first access.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RemoteCall`] if the metadata cannot be retrieved, and
    /// [`GatewayError::ContractParse`] if any metadata entry is malformed.
    pub async fn get_contracts(
        &self,
        schema: SchemaId,
    ) -> Result<Arc<MethodContracts>, GatewayError> {
        let client = self.get_client(schema).await?;
        self.inner
            .contracts
            .get_or_try_init(schema, || async move {
                let types = client.types().await?;
                let contracts = MethodContracts::parse(&types)?;
                debug!(target: LOG_TARGET, %schema, methods = contracts.len(), "contracts discovered");
                Ok(contracts)
            })
            .await
    }

    /// Whether a client of `schema` is already open.
    pub fn is_connected(&self, schema: SchemaId) -> bool {
        self.inner.clients.contains(schema)
    }
}

// Convenience lookups
impl<C: Connector> Gateway<C> {
    /// Currency rates of the day, see [`Dispatcher::list_courses`].
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::list_courses`].
    pub async fn list_courses(&self, date: Option<DateInput>) -> Result<Vec<XmlNode>, GatewayError> {
        self.dispatcher().list_courses(date).await
    }

    /// Rate of one currency, see [`Dispatcher::course_rate`].
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::course_rate`].
    pub async fn course_rate(
        &self,
        currency: &str,
        date: Option<DateInput>,
    ) -> Result<Option<f64>, GatewayError> {
        self.dispatcher().course_rate(currency, date).await
    }
}
