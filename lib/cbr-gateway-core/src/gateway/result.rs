use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{GatewayError, XmlNode};

/// Field holding the serialized XML of a result, by convention.
pub const XML_PAYLOAD_FIELD: &str = "any";

/// The structured response of a successful remote call.
///
/// The dispatcher memoizes it, so every representation below is an adapter over the
/// same value and never re-issues the call.
///
/// # Example
///
/// ```rust
/// use cbr_gateway_core::RawResult;
/// use serde_json::json;
///
/// # fn example() -> Result<(), cbr_gateway_core::GatewayError> {
/// let result = RawResult::new(
///     "GetCursOnDate",
///     json!({ "GetCursOnDateResult": { "any": "<ValuteData><ValuteCursOnDate/></ValuteData>" } }),
/// );
///
/// let xml = result.to_xml_fragment()?;
/// assert_eq!(xml.local_name(), "ValuteData");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RawResult {
    method: String,
    value: Value,
}

impl RawResult {
    /// Wraps the response of `method`.
    pub fn new(method: impl Into<String>, value: Value) -> Self {
        Self {
            method: method.into(),
            value,
        }
    }

    /// The method that produced this result.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The structured response.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the result, returning the structured response.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// The top level field `name` of the response.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.value.get(name)
    }

    /// The name of the field carrying the method result: `<method>Result`.
    pub fn result_field_name(&self) -> String {
        format!("{}Result", self.method)
    }

    /// The `<method>Result` field of the response.
    pub fn result_field(&self) -> Option<&Value> {
        self.value.get(self.result_field_name())
    }

    /// Deserializes the structured response into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TypedResult`] with the path of the first failing value.
    pub fn to_json<T>(&self) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
    {
        serde_path_to_error::deserialize(&self.value).map_err(|err| {
            let path = err.path().to_string();
            GatewayError::TypedResult {
                method: self.method.clone(),
                path,
                error: err.into_inner(),
            }
        })
    }

    /// Parses the XML held in `<method>Result.any` and returns its root element.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::XmlExtraction`] if either field is absent, or if the
    /// payload is not well-formed XML with at least one element.
    pub fn to_xml_fragment(&self) -> Result<XmlNode, GatewayError> {
        let extraction_error = |reason: String| GatewayError::XmlExtraction {
            method: self.method.clone(),
            reason,
        };

        let result_name = self.result_field_name();
        let result = self
            .value
            .get(&result_name)
            .ok_or_else(|| extraction_error(format!("missing field '{result_name}'")))?;
        let payload = result
            .get(XML_PAYLOAD_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                extraction_error(format!(
                    "missing field '{result_name}.{XML_PAYLOAD_FIELD}'"
                ))
            })?;

        XmlNode::parse(payload)
            .map_err(|err| extraction_error(err.to_string()))?
            .ok_or_else(|| extraction_error("empty XML payload".to_string()))
    }
}
