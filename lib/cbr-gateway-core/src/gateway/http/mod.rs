use std::sync::LazyLock;

use headers::{ContentType, HeaderMapExt};
use http::header::{HeaderName, HeaderValue};
use http::{Method, StatusCode};
use indexmap::IndexMap;
use mime::Mime;
use reqwest::{Body, Request};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{Connector, LOG_TARGET, RemoteClient, RemoteFault, SchemaDescriptor, SchemaId};

mod envelope;
mod wsdl;

use self::envelope::XML_FAULT_CODE;
use self::wsdl::{ServiceDescription, WSDL_FAULT_CODE};

/// Fault code of transport failures and of non-2xx answers without a SOAP fault.
pub const HTTP_FAULT_CODE: &str = "HTTP";

const BODY_MAX_LENGTH: usize = 1024;
const SOAP_ACTION: &str = "soapaction";

static TEXT_XML_UTF_8: LazyLock<Mime> =
    LazyLock::new(|| "text/xml; charset=utf-8".parse().expect("a valid mime"));

/// Opens SOAP 1.1 clients over HTTP.
///
/// Connecting downloads and parses the schema WSDL; the type metadata, the service
/// address and the `SOAPAction` of every operation come from it.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    client: reqwest::Client,
}

impl HttpConnector {
    /// Creates a connector sending requests with `client`.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Connector for HttpConnector {
    type Client = HttpRemoteClient;

    async fn connect(&self, schema: &SchemaDescriptor) -> Result<Self::Client, RemoteFault> {
        let endpoint = schema.endpoint();
        debug!(target: LOG_TARGET, %endpoint, "loading WSDL");

        let response = self
            .client
            .get(endpoint.clone())
            .send()
            .await
            .map_err(transport_fault)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_fault)?;
        if !status.is_success() {
            return Err(status_fault(status, &text));
        }

        let description = ServiceDescription::parse(&text)?;
        let address = match description.address() {
            Some(address) => Url::parse(address).map_err(|err| {
                RemoteFault::new(WSDL_FAULT_CODE, format!("invalid address '{address}': {err}"))
            })?,
            None => {
                let mut address = endpoint.clone();
                address.set_query(None);
                address
            }
        };
        debug!(
            target: LOG_TARGET,
            %address,
            types = description.types().len(),
            "WSDL loaded"
        );

        Ok(HttpRemoteClient {
            client: self.client.clone(),
            schema: schema.id(),
            address,
            description,
        })
    }
}

/// A SOAP 1.1 client bound to one schema.
#[derive(Debug)]
pub struct HttpRemoteClient {
    client: reqwest::Client,
    schema: SchemaId,
    address: Url,
    description: ServiceDescription,
}

impl HttpRemoteClient {
    /// The schema this client is bound to.
    pub fn schema(&self) -> SchemaId {
        self.schema
    }

    /// The address requests are posted to.
    pub fn address(&self) -> &Url {
        &self.address
    }

    fn build_request(
        &self,
        method: &str,
        arguments: &IndexMap<String, Value>,
    ) -> Result<Request, RemoteFault> {
        let namespace = self.description.target_namespace();
        let action = self.description.soap_action(method).map_or_else(
            || format!("{}/{method}", namespace.trim_end_matches('/')),
            str::to_string,
        );

        let mut request = Request::new(Method::POST, self.address.clone());
        let headers = request.headers_mut();
        headers.typed_insert(ContentType::from(TEXT_XML_UTF_8.clone()));
        let action = HeaderValue::from_str(&format!("\"{action}\"")).map_err(|err| {
            RemoteFault::new(HTTP_FAULT_CODE, format!("invalid SOAPAction: {err}"))
        })?;
        headers.insert(HeaderName::from_static(SOAP_ACTION), action);

        let body = request.body_mut();
        *body = Some(Body::from(envelope::request(namespace, method, arguments)));

        Ok(request)
    }
}

impl RemoteClient for HttpRemoteClient {
    async fn types(&self) -> Result<Vec<String>, RemoteFault> {
        Ok(self.description.types().to_vec())
    }

    fn operations(&self) -> Option<Vec<String>> {
        let operations = self.description.operations();
        (!operations.is_empty()).then(|| operations.to_vec())
    }

    async fn invoke(
        &self,
        method: &str,
        arguments: &IndexMap<String, Value>,
    ) -> Result<Value, RemoteFault> {
        let request = self.build_request(method, arguments)?;

        debug!(target: LOG_TARGET, ?request, "sending...");
        let response = self.client.execute(request).await.map_err(transport_fault)?;
        debug!(target: LOG_TARGET, ?response, "...receiving");

        let status = response.status();
        let text = response.text().await.map_err(transport_fault)?;
        let decoded = envelope::decode(method, &text);
        if status.is_success() {
            return decoded;
        }

        match decoded {
            Err(fault) if fault.code != XML_FAULT_CODE => Err(fault),
            _ => Err(status_fault(status, &text)),
        }
    }
}

fn transport_fault(error: reqwest::Error) -> RemoteFault {
    RemoteFault::new(HTTP_FAULT_CODE, error.to_string())
}

fn status_fault(status: StatusCode, body: &str) -> RemoteFault {
    let body = match body.char_indices().nth(BODY_MAX_LENGTH) {
        Some((index, _)) => format!("{}... (truncated)", body.get(..index).unwrap_or_default()),
        None => body.to_string(),
    };
    RemoteFault::new(HTTP_FAULT_CODE, format!("{status}: {body}"))
}
