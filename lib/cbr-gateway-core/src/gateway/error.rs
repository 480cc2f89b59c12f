use std::fmt::Debug;

use super::connection::RemoteFault;

/// Errors that can occur when using the [`Gateway`](super::Gateway).
///
/// Every variant is terminal for the current call: nothing in the gateway retries.
/// Local validation failures are reported before any remote call is attempted,
/// remote faults are wrapped into [`GatewayError::RemoteCall`] with their original code and message.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum GatewayError {
    /// HTTP client error from the underlying reqwest library.
    ///
    /// Occurs when the HTTP client cannot be configured.
    ReqwestError(reqwest::Error),

    /// An endpoint locator is not a valid URL.
    InvalidEndpoint(url::ParseError),

    /// The schema identifier is not one of `daily`, `regions`, `organizations`, `market`.
    #[display("Unknown WSDL schema '{schema}'")]
    #[from(skip)]
    UnknownSchema {
        /// The rejected identifier.
        schema: String,
    },

    /// A terminal operation was requested before any schema was selected.
    #[display("WSDL schema is not set")]
    #[from(skip)]
    NoSchemaSelected,

    /// A terminal operation was requested before any method was selected.
    #[display("No method selected")]
    #[from(skip)]
    NoMethodSelected,

    /// The selected method is not part of the discovered contracts.
    #[display("Function name {method} unavailable in this schema ({endpoint})")]
    #[from(skip)]
    UnknownMethod {
        /// The requested method.
        method: String,
        /// The endpoint of the selected schema.
        endpoint: String,
    },

    /// The number of supplied arguments differs from the contract.
    #[display(
        "Method {method} requires {expected_count} parameters ({}), but {given} given",
        expected.join(",")
    )]
    #[from(skip)]
    ArityMismatch {
        /// The requested method.
        method: String,
        /// The contract parameter names, in declaration order.
        expected: Vec<String>,
        /// The contract parameter count.
        expected_count: usize,
        /// The supplied argument count.
        given: usize,
    },

    /// A contract parameter is absent from the supplied arguments.
    #[display("Parameter \"{parameter}\" with type \"{param_type}\" for method {method} not passed")]
    #[from(skip)]
    MissingParameter {
        /// The requested method.
        method: String,
        /// The missing parameter name.
        parameter: String,
        /// The declared type of the missing parameter.
        param_type: String,
    },

    /// A value for a `dateTime` parameter cannot be read as a date.
    #[display("Cannot read '{value}' as a date: {reason}")]
    #[from(skip)]
    DateParse {
        /// The rejected value, as supplied.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An entry of the schema type metadata does not follow `struct Name { type field; }`.
    #[display("Malformed type metadata ({reason}): {entry}")]
    #[from(skip)]
    ContractParse {
        /// The offending metadata entry.
        entry: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The remote service answered with a fault, or could not be reached.
    #[display("Remote call failed [{code}]: {message}")]
    #[from(skip)]
    RemoteCall {
        /// The fault code (`soap:Client`, `soap:Server`, `HTTP`, ...).
        code: String,
        /// The fault message.
        message: String,
    },

    /// The structured result does not carry an XML payload in `<method>Result.any`.
    #[display("Cannot get the {method} result as XML: {reason}")]
    #[from(skip)]
    XmlExtraction {
        /// The method whose result was inspected.
        method: String,
        /// What is missing or invalid.
        reason: String,
    },

    /// The expected data is absent from the response.
    #[display("No data found in the {method} response")]
    #[from(skip)]
    EmptyResult {
        /// The method whose response was empty.
        method: String,
    },

    /// A currency entry carries a non numeric value.
    #[display("Invalid {field} '{value}' for currency {currency}")]
    #[from(skip)]
    InvalidCourseValue {
        /// The currency code of the entry.
        currency: String,
        /// The field name (`Vcurs` or `Vnom`).
        field: &'static str,
        /// The raw field value.
        value: String,
    },

    /// The structured result cannot be deserialized into the requested type.
    #[display("Failed to deserialize the {method} result at '{path}': {error}")]
    #[from(skip)]
    TypedResult {
        /// The method whose result was deserialized.
        method: String,
        /// The path of the failing value.
        path: String,
        /// The underlying JSON error.
        error: serde_json::Error,
    },
}

impl From<RemoteFault> for GatewayError {
    fn from(fault: RemoteFault) -> Self {
        let RemoteFault { code, message } = fault;
        Self::RemoteCall { code, message }
    }
}
