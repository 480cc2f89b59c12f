use super::{CallArguments, Connector, Gateway, HttpConnector, RawResult, SchemaId};

mod builder;
mod execution;

/// One call sequence against the gateway schemas.
///
/// `Dispatcher` captures a deferred invocation and materializes it on demand:
///
/// # Method Groups
///
/// ## Schema Selection
/// - [`select_schema(id)`](Self::select_schema) - Select the active schema
/// - [`daily()`](Self::daily), [`regions()`](Self::regions),
///   [`organizations()`](Self::organizations), [`market()`](Self::market) - Shortcuts
///
/// ## Method Selection
/// - [`select_method(name, args)`](Self::select_method) - Capture the invocation
///
/// ## Materialization
/// - [`as_structured()`](Self::as_structured) - The structured response
/// - [`as_json::<T>()`](Self::as_json) - The response deserialized into `T`
/// - [`as_xml_fragment()`](Self::as_xml_fragment) - The XML held in `<method>Result.any`
///
/// ## Introspection
/// - [`describe_method()`](Self::describe_method) - Signature of the selected method
/// - [`available_methods()`](Self::available_methods) - Methods of the selected schema
///
/// # Execution
///
/// The first materialization validates the invocation against the discovered contract,
/// coerces `dateTime` arguments and performs the remote call. The result is memoized:
/// later materializations of the same invocation never call the service again.
/// Selecting a schema or a method drops the memoized result.
///
/// # Example
///
/// ```rust,no_run
/// use cbr_gateway_core::{CallArguments, Gateway};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = Gateway::builder().build()?;
/// let mut dispatcher = gateway.dispatcher();
///
/// let metals = dispatcher
///     .daily()
///     .select_method(
///         "DragMetDynamic",
///         CallArguments::new()
///             .push_arg("01.09.2014")
///             .push_arg("10.12.2015"),
///     )
///     .as_xml_fragment()
///     .await?;
///
/// // same invocation, no second remote call
/// let raw = dispatcher.as_structured().await?;
/// println!("{}", raw.value());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Dispatcher<C: Connector = HttpConnector> {
    gateway: Gateway<C>,
    schema: Option<SchemaId>,
    pending: Option<PendingInvocation>,
    result: Option<RawResult>,
}

impl<C: Connector> Dispatcher<C> {
    pub(in crate::gateway) fn new(gateway: Gateway<C>) -> Self {
        Self {
            gateway,
            schema: None,
            pending: None,
            result: None,
        }
    }

    /// The gateway this dispatcher calls through.
    pub fn gateway(&self) -> &Gateway<C> {
        &self.gateway
    }

    /// The selected schema.
    pub fn schema(&self) -> Option<SchemaId> {
        self.schema
    }

    /// The captured invocation.
    pub fn pending(&self) -> Option<&PendingInvocation> {
        self.pending.as_ref()
    }

    /// Whether the captured invocation was already executed.
    pub fn is_executed(&self) -> bool {
        self.result.is_some()
    }
}

/// A method name with its arguments, waiting for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingInvocation {
    method: String,
    arguments: CallArguments,
}

impl PendingInvocation {
    /// Captures an invocation.
    pub fn new(method: impl Into<String>, arguments: impl Into<CallArguments>) -> Self {
        Self {
            method: method.into(),
            arguments: arguments.into(),
        }
    }

    /// The remote method name.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The supplied arguments.
    pub fn arguments(&self) -> &CallArguments {
        &self.arguments
    }
}
