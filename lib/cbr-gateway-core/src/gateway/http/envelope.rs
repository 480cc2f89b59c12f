use indexmap::IndexMap;
use quick_xml::escape::escape;
use serde_json::map::Entry;
use serde_json::{Map, Value};

use crate::gateway::xml::write_fragment;
use crate::gateway::{RemoteFault, XML_PAYLOAD_FIELD, XmlNode};

/// Fault code of a response that is not a SOAP envelope.
pub(super) const XML_FAULT_CODE: &str = "XML";

const ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const DEFAULT_FAULT_CODE: &str = "soap:Server";

/// Renders a document/literal request for `method`.
///
/// Strings are escaped, `null` becomes `xsi:nil`, objects become child elements
/// and arrays repeat the element once per item.
pub(super) fn request(namespace: &str, method: &str, arguments: &IndexMap<String, Value>) -> String {
    let mut body = String::new();
    for (name, value) in arguments {
        write_value(&mut body, name, value);
    }

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><soap:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:soap="{ENVELOPE_NAMESPACE}"><soap:Body><{method} xmlns="{}">{body}</{method}></soap:Body></soap:Envelope>"#,
        escape(namespace)
    )
}

fn write_value(out: &mut String, name: &str, value: &Value) {
    match value {
        Value::Null => out.push_str(&format!(r#"<{name} xsi:nil="true"/>"#)),
        Value::Array(items) => {
            for item in items {
                write_value(out, name, item);
            }
        }
        Value::Object(fields) => {
            out.push_str(&format!("<{name}>"));
            for (field, field_value) in fields {
                write_value(out, field, field_value);
            }
            out.push_str(&format!("</{name}>"));
        }
        Value::String(text) => out.push_str(&format!("<{name}>{}</{name}>", escape(text.as_str()))),
        Value::Bool(_) | Value::Number(_) => out.push_str(&format!("<{name}>{value}</{name}>")),
    }
}

/// Decodes the response envelope of `method`.
///
/// A `soap:Fault` is returned as a fault with its own code and message.
/// The `<method>Response` children become the fields of the returned object.
pub(super) fn decode(method: &str, xml: &str) -> Result<Value, RemoteFault> {
    let malformed = |reason: String| RemoteFault::new(XML_FAULT_CODE, reason);

    let root = XmlNode::parse(xml)
        .map_err(|err| malformed(err.to_string()))?
        .ok_or_else(|| malformed("empty response".to_string()))?;
    let body = root
        .child("Body")
        .ok_or_else(|| malformed(format!("missing soap:Body in '{}'", root.name())))?;

    if let Some(fault) = body.child("Fault") {
        return Err(RemoteFault::new(
            fault.child_text("faultcode").unwrap_or(DEFAULT_FAULT_CODE),
            fault.child_text("faultstring").unwrap_or_default(),
        ));
    }

    let response_name = format!("{method}Response");
    let response = body
        .child(&response_name)
        .ok_or_else(|| malformed(format!("missing {response_name} element")))?;

    Ok(Value::Object(fields_of(response)))
}

fn fields_of(node: &XmlNode) -> Map<String, Value> {
    let mut fields = Map::new();
    for child in node.children() {
        let value = to_json(child);
        match fields.entry(child.local_name()) {
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
            Entry::Occupied(mut entry) => match entry.get_mut() {
                Value::Array(items) => items.push(value),
                existing => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            },
        }
    }
    fields
}

// Text-only elements become strings; others keep their serialized children under `any`.
fn to_json(node: &XmlNode) -> Value {
    if node.children().is_empty() {
        return Value::String(node.text().to_string());
    }

    let mut fields = fields_of(node);
    fields.entry(XML_PAYLOAD_FIELD).or_insert_with(|| {
        let payload = node
            .children()
            .iter()
            .filter(|child| child.local_name() != "schema");
        Value::String(write_fragment(payload))
    });
    Value::Object(fields)
}
