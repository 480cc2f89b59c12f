use std::time::Duration;

use chrono::FixedOffset;
use indexmap::IndexMap;

use super::{
    Connector, DateCoercion, Gateway, GatewayError, HttpConnector, SchemaId, SchemaRegistry,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for [`Gateway`].
///
/// # Default Configuration
///
/// - **Endpoints**: the central bank published WSDL locations, see [`SchemaId::default_endpoint`]
/// - **Service offset**: `+03:00` (Moscow), used to read timestamps as calendar dates
/// - **Timeout**: 30 seconds per HTTP request
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
///
/// use cbr_gateway_core::{Gateway, SchemaId};
///
/// # fn example() -> Result<(), cbr_gateway_core::GatewayError> {
/// let gateway = Gateway::builder()
///     .with_endpoint(SchemaId::Daily, "http://localhost:8080/DailyInfo.asmx?WSDL")
///     .with_timeout(Duration::from_secs(5))
///     .build()?;
///
/// let endpoint = gateway.registry().resolve_endpoint("daily")?;
/// assert_eq!(endpoint.host_str(), Some("localhost"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GatewayBuilder {
    endpoints: IndexMap<SchemaId, String>,
    dates: DateCoercion,
    timeout: Duration,
    client: Option<reqwest::Client>,
}

impl GatewayBuilder {
    /// Builds a gateway talking SOAP over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidEndpoint`] if an overridden endpoint is not a URL,
    /// and [`GatewayError::ReqwestError`] if the HTTP client cannot be created.
    pub fn build(self) -> Result<Gateway, GatewayError> {
        let client = match &self.client {
            Some(client) => client.clone(),
            None => reqwest::Client::builder().timeout(self.timeout).build()?,
        };
        self.build_with_connector(HttpConnector::new(client))
    }

    /// Builds a gateway opening its remote clients with `connector`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidEndpoint`] if an overridden endpoint is not a URL.
    pub fn build_with_connector<C>(self, connector: C) -> Result<Gateway<C>, GatewayError>
    where
        C: Connector,
    {
        let Self {
            endpoints, dates, ..
        } = self;
        let registry = SchemaRegistry::with_overrides(&endpoints)?;

        Ok(Gateway::new(registry, dates, connector))
    }

    /// Overrides the WSDL location of `schema`.
    pub fn with_endpoint(mut self, schema: SchemaId, endpoint: impl Into<String>) -> Self {
        self.endpoints.insert(schema, endpoint.into());
        self
    }

    /// Sets the service local time offset used to read timestamps as calendar dates.
    pub fn with_service_offset(mut self, offset: FixedOffset) -> Self {
        self.dates = DateCoercion::new(offset);
        self
    }

    /// Sets the HTTP request timeout.
    ///
    /// Ignored when a client is supplied with [`Self::with_http_client`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Uses a preconfigured HTTP client.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self {
            endpoints: IndexMap::new(),
            dates: DateCoercion::default(),
            timeout: DEFAULT_TIMEOUT,
            client: None,
        }
    }
}
