//! # CBR Gateway Core
//!
//! Call the Central Bank of Russia web services through one uniform, schema-driven convention.
//!
//! The bank publishes several SOAP services (daily rates, regional statistics, credit
//! organizations, securities market). This crate discovers the methods of each service from
//! its type metadata, validates and coerces the arguments of a call, performs it, and renders
//! the response as a structured value, a typed value or an XML fragment.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cbr_gateway_core::{CallArguments, DateInput, Gateway};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = Gateway::builder().build()?;
//!
//! // Currency rate shortcut
//! let usd = gateway
//!     .course_rate("USD", Some(DateInput::from("01.09.2014")))
//!     .await?;
//! println!("USD: {usd:?}");
//!
//! // Any method of any schema
//! let mut dispatcher = gateway.dispatcher();
//! let regions = dispatcher
//!     .regions()
//!     .select_method("GetBankCount", CallArguments::new())
//!     .as_xml_fragment()
//!     .await?;
//! println!("{regions}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Schemas
//!
//! | Identifier      | Service                          |
//! |-----------------|----------------------------------|
//! | `daily`         | Daily data (rates, metals, ...)  |
//! | `regions`       | Regional statistics              |
//! | `organizations` | Credit organizations directory   |
//! | `market`        | Securities market information    |
//!
//! ## Calls
//!
//! A [`Dispatcher`] captures a method name with its [`CallArguments`], named or positional.
//! Nothing is sent until a materialization is requested:
//!
//! - [`Dispatcher::as_structured`] - the response as a [`RawResult`]
//! - [`Dispatcher::as_json`] - the response deserialized into your type
//! - [`Dispatcher::as_xml_fragment`] - the XML held in the `<method>Result.any` field
//!
//! Before the call, the arguments are checked against the method contract (arity, missing
//! parameters) and every `dateTime` argument is normalized to `YYYY-MM-DDT00:00:00`:
//! Unix timestamps and texts like `01.09.2014` or `2014-09-01` are accepted, see [`DateCoercion`].
//! The result is memoized, so materializing it again never calls the service twice.
//!
//! ## Transport
//!
//! The gateway talks to the services through a [`Connector`]. The default one,
//! [`HttpConnector`], speaks SOAP 1.1 over HTTP; plug your own with
//! [`GatewayBuilder::build_with_connector`].
//!
//! ## Logging
//!
//! Every call emits `tracing` events with the `cbr` target: `[START]` with the method and its
//! arguments, `[END]` with the elapsed time, `[ERROR]` with the fault code and message.

mod gateway;

pub use self::gateway::{
    COURSES_METHOD, CURRENCY_CODE_FIELD, CallArguments, Connector, DEFAULT_SERVICE_OFFSET_SECONDS,
    DateCoercion, DateInput, Dispatcher, Gateway, GatewayBuilder, GatewayError, HTTP_FAULT_CODE,
    HttpConnector, HttpRemoteClient, LOG_TARGET, MethodContract, MethodContracts, NOMINAL_FIELD,
    ParamType, PendingInvocation, RATE_FIELD, RawResult, RemoteClient, RemoteFault,
    SchemaDescriptor, SchemaId, SchemaRegistry, XML_PAYLOAD_FIELD, XmlNode, coerce_date,
};
