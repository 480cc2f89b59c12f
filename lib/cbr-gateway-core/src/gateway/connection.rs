use std::fmt::Debug;
use std::future::Future;

use indexmap::IndexMap;
use serde_json::Value;

use super::SchemaDescriptor;

/// A structured error returned by the remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("[{code}] {message}")]
pub struct RemoteFault {
    /// The fault code, e.g. `soap:Client`, `soap:Server` or `HTTP` for transport failures.
    pub code: String,
    /// The human readable fault message.
    pub message: String,
}

impl RemoteFault {
    /// Creates a fault.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// An opened handle on one remote schema.
///
/// The gateway keeps exactly one client per schema for its whole lifetime,
/// see [`Gateway::get_client`](super::Gateway::get_client).
///
/// # Example
///
/// ```rust
/// use cbr_gateway_core::{RemoteClient, RemoteFault};
/// use indexmap::IndexMap;
/// use serde_json::{Value, json};
///
/// #[derive(Debug)]
/// struct FixedClient;
///
/// impl RemoteClient for FixedClient {
///     async fn types(&self) -> Result<Vec<String>, RemoteFault> {
///         Ok(vec!["struct GetLatestDate {\n}".to_string()])
///     }
///
///     async fn invoke(
///         &self,
///         method: &str,
///         _arguments: &IndexMap<String, Value>,
///     ) -> Result<Value, RemoteFault> {
///         Ok(json!({ format!("{method}Result"): "2014-09-01T00:00:00" }))
///     }
/// }
/// ```
pub trait RemoteClient: Debug + Send + Sync + 'static {
    /// Retrieves the schema type metadata.
    ///
    /// Each entry describes one structure as `struct Name {\n type field;\n}`;
    /// the request structure of a remote method is named after the method.
    fn types(&self) -> impl Future<Output = Result<Vec<String>, RemoteFault>> + Send;

    /// Invokes the remote procedure `method` with named arguments.
    ///
    /// The arguments are already validated against the method contract,
    /// in contract declaration order.
    fn invoke(
        &self,
        method: &str,
        arguments: &IndexMap<String, Value>,
    ) -> impl Future<Output = Result<Value, RemoteFault>> + Send;

    /// The names of the invocable operations, when the transport knows them.
    ///
    /// Type metadata also describes responses and shared structures; these names
    /// tell the methods apart. `None` means every discovered structure is a method.
    fn operations(&self) -> Option<Vec<String>> {
        None
    }
}

/// Opens [`RemoteClient`]s.
///
/// This is the seam between the dispatcher and the transport: the gateway only
/// ever talks to remote services through a connector, so tests and alternative
/// transports plug in by implementing this trait and building the gateway with
/// [`GatewayBuilder::build_with_connector`](super::GatewayBuilder::build_with_connector).
pub trait Connector: Debug + Send + Sync + 'static {
    /// The client type opened by this connector.
    type Client: RemoteClient;

    /// Opens a client on `schema`, performing whatever handshake the transport needs.
    fn connect(
        &self,
        schema: &SchemaDescriptor,
    ) -> impl Future<Output = Result<Self::Client, RemoteFault>> + Send;
}
