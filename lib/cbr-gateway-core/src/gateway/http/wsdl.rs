use std::collections::HashMap;

use crate::gateway::xml::local_name;
use crate::gateway::{RemoteFault, XmlNode};

/// Fault code of an unusable service description.
pub(super) const WSDL_FAULT_CODE: &str = "WSDL";

const SOAP_11_BINDING_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/soap/";
const ANY_XML_TYPE: &str = "<anyXML>";
const ANY_TYPE: &str = "anyType";

/// What a WSDL document tells about a SOAP 1.1 service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct ServiceDescription {
    target_namespace: String,
    address: Option<String>,
    actions: HashMap<String, String>,
    operations: Vec<String>,
    types: Vec<String>,
}

impl ServiceDescription {
    pub(super) fn parse(wsdl: &str) -> Result<Self, RemoteFault> {
        let invalid = |reason: String| RemoteFault::new(WSDL_FAULT_CODE, reason);

        let root = XmlNode::parse(wsdl)
            .map_err(|err| invalid(err.to_string()))?
            .ok_or_else(|| invalid("empty document".to_string()))?;
        if root.local_name() != "definitions" {
            return Err(invalid(format!(
                "expected 'definitions' root element, got '{}'",
                root.name()
            )));
        }

        let target_namespace = root
            .attribute("targetNamespace")
            .unwrap_or_default()
            .to_string();
        let types = root
            .children_named("types")
            .flat_map(|types| types.children_named("schema"))
            .flat_map(render_schema)
            .collect();

        Ok(Self {
            target_namespace,
            address: soap_address(&root).map(str::to_string),
            actions: soap_actions(&root),
            operations: operation_names(&root),
            types,
        })
    }

    /// The namespace of request and response elements.
    pub(super) fn target_namespace(&self) -> &str {
        &self.target_namespace
    }

    /// The SOAP 1.1 endpoint address.
    pub(super) fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// The `SOAPAction` of `operation`.
    pub(super) fn soap_action(&self, operation: &str) -> Option<&str> {
        self.actions.get(operation).map(String::as_str)
    }

    /// The operations declared by port types and bindings, in document order.
    pub(super) fn operations(&self) -> &[String] {
        &self.operations
    }

    /// Type metadata, one `struct Name {\n type field;\n}` entry per structure.
    pub(super) fn types(&self) -> &[String] {
        &self.types
    }
}

fn soap_address(root: &XmlNode) -> Option<&str> {
    let soap_prefix = root.attributes().find_map(|(key, value)| {
        key.strip_prefix("xmlns:")
            .filter(|_| value == SOAP_11_BINDING_NAMESPACE)
    });
    let addresses = root
        .children_named("service")
        .flat_map(|service| service.children_named("port"))
        .flat_map(|port| port.children_named("address"))
        .collect::<Vec<_>>();

    addresses
        .iter()
        .find(|address| prefix(address.name()) == soap_prefix)
        .or_else(|| addresses.first())
        .copied()
        .and_then(|address| address.attribute("location"))
}

fn soap_actions(root: &XmlNode) -> HashMap<String, String> {
    let mut actions = HashMap::new();
    let operations = root
        .children_named("binding")
        .flat_map(|binding| binding.children_named("operation"));
    for operation in operations {
        let name = operation.attribute("name");
        let action = operation
            .child("operation")
            .and_then(|soap| soap.attribute("soapAction"));
        if let (Some(name), Some(action)) = (name, action) {
            actions
                .entry(name.to_string())
                .or_insert_with(|| action.to_string());
        }
    }
    actions
}

fn operation_names(root: &XmlNode) -> Vec<String> {
    let mut names = Vec::<String>::new();
    let operations = root
        .children()
        .iter()
        .filter(|child| matches!(child.local_name(), "portType" | "binding"))
        .flat_map(|parent| parent.children_named("operation"))
        .filter_map(|operation| operation.attribute("name"));
    for name in operations {
        if !names.iter().any(|known| known == name) {
            names.push(name.to_string());
        }
    }
    names
}

fn prefix(name: &str) -> Option<&str> {
    name.split_once(':').map(|(prefix, _)| prefix)
}

fn render_schema(schema: &XmlNode) -> Vec<String> {
    let mut rendered = Vec::new();
    for child in schema.children() {
        let Some(name) = child.attribute("name") else {
            continue;
        };
        match child.local_name() {
            "element" => {
                if let Some(complex) = child.child("complexType") {
                    rendered.extend(render_struct(name, complex));
                }
            }
            "complexType" => rendered.extend(render_struct(name, child)),
            _ => {}
        }
    }
    rendered
}

// The structure comes first, then the structures declared inline in it.
fn render_struct(name: &str, complex: &XmlNode) -> Vec<String> {
    let mut body = String::new();
    let mut nested = Vec::new();
    collect_fields(complex, &mut body, &mut nested);

    let mut rendered = vec![format!("struct {name} {{\n{body}}}")];
    rendered.append(&mut nested);
    rendered
}

fn collect_fields(node: &XmlNode, body: &mut String, nested: &mut Vec<String>) {
    for child in node.children() {
        match child.local_name() {
            "sequence" | "all" | "choice" => collect_fields(child, body, nested),
            "element" => {
                if let Some(reference) = child.attribute("ref") {
                    let name = local_name(reference);
                    push_field(body, name, name);
                } else if let Some(name) = child.attribute("name") {
                    let field_type = match (child.attribute("type"), child.child("complexType")) {
                        (Some(tag), _) => local_name(tag),
                        (None, Some(complex)) => {
                            nested.extend(render_struct(name, complex));
                            name
                        }
                        (None, None) => ANY_TYPE,
                    };
                    push_field(body, field_type, name);
                }
            }
            "any" => push_field(body, ANY_XML_TYPE, "any"),
            _ => {}
        }
    }
}

fn push_field(body: &mut String, field_type: &str, name: &str) {
    body.push_str(&format!(" {field_type} {name};\n"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MethodContracts;

    const DAILY_WSDL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<wsdl:definitions xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/" xmlns:tns="http://web.cbr.ru/" xmlns:s="http://www.w3.org/2001/XMLSchema" xmlns:soap12="http://schemas.xmlsoap.org/wsdl/soap12/" xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/" targetNamespace="http://web.cbr.ru/">
  <wsdl:types>
    <s:schema elementFormDefault="qualified" targetNamespace="http://web.cbr.ru/">
      <s:element name="GetCursOnDate">
        <s:complexType>
          <s:sequence>
            <s:element minOccurs="1" maxOccurs="1" name="On_date" type="s:dateTime" />
          </s:sequence>
        </s:complexType>
      </s:element>
      <s:element name="GetCursOnDateResponse">
        <s:complexType>
          <s:sequence>
            <s:element minOccurs="0" maxOccurs="1" name="GetCursOnDateResult">
              <s:complexType>
                <s:sequence>
                  <s:element ref="s:schema" />
                  <s:any />
                </s:sequence>
              </s:complexType>
            </s:element>
          </s:sequence>
        </s:complexType>
      </s:element>
      <s:element name="GetLatestDateTime">
        <s:complexType />
      </s:element>
      <s:complexType name="ArrayOfInt">
        <s:sequence>
          <s:element minOccurs="0" maxOccurs="unbounded" name="int" type="s:int" />
        </s:sequence>
      </s:complexType>
      <s:element name="dateTime" type="s:dateTime" />
    </s:schema>
  </wsdl:types>
  <wsdl:binding name="DailyInfoSoap12" type="tns:DailyInfoSoap">
    <soap12:binding transport="http://schemas.xmlsoap.org/soap/http" />
    <wsdl:operation name="GetCursOnDate">
      <soap12:operation soapAction="http://web.cbr.ru/GetCursOnDate" style="document" />
    </wsdl:operation>
  </wsdl:binding>
  <wsdl:binding name="DailyInfoSoap" type="tns:DailyInfoSoap">
    <soap:binding transport="http://schemas.xmlsoap.org/soap/http" />
    <wsdl:operation name="GetLatestDateTime">
      <soap:operation soapAction="http://web.cbr.ru/GetLatestDateTime" style="document" />
    </wsdl:operation>
  </wsdl:binding>
  <wsdl:service name="DailyInfo">
    <wsdl:port name="DailyInfoSoap12" binding="tns:DailyInfoSoap12">
      <soap12:address location="http://www.cbr.ru/DailyInfoWebServ/DailyInfo.asmx?soap12" />
    </wsdl:port>
    <wsdl:port name="DailyInfoSoap" binding="tns:DailyInfoSoap">
      <soap:address location="http://www.cbr.ru/DailyInfoWebServ/DailyInfo.asmx" />
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>"#;

    #[test]
    fn test_render_types() {
        let description = ServiceDescription::parse(DAILY_WSDL).expect("valid wsdl");

        insta::assert_snapshot!(description.types().join("\n"), @r"
        struct GetCursOnDate {
         dateTime On_date;
        }
        struct GetCursOnDateResponse {
         GetCursOnDateResult GetCursOnDateResult;
        }
        struct GetCursOnDateResult {
         schema schema;
         <anyXML> any;
        }
        struct GetLatestDateTime {
        }
        struct ArrayOfInt {
         int int;
        }
        ");
    }

    #[test]
    fn test_rendered_types_are_valid_contracts() {
        let description = ServiceDescription::parse(DAILY_WSDL).expect("valid wsdl");

        let contracts = MethodContracts::parse(description.types()).expect("valid contracts");

        assert_eq!(
            contracts
                .get("GetCursOnDate")
                .map(crate::gateway::MethodContract::signature),
            Some("GetCursOnDate(dateTime On_date)".to_string())
        );
    }

    #[test]
    fn test_soap_11_address_is_preferred() {
        let description = ServiceDescription::parse(DAILY_WSDL).expect("valid wsdl");

        assert_eq!(
            description.address(),
            Some("http://www.cbr.ru/DailyInfoWebServ/DailyInfo.asmx")
        );
        assert_eq!(description.target_namespace(), "http://web.cbr.ru/");
    }

    #[test]
    fn test_soap_actions_from_every_binding() {
        let description = ServiceDescription::parse(DAILY_WSDL).expect("valid wsdl");

        assert_eq!(
            description.soap_action("GetCursOnDate"),
            Some("http://web.cbr.ru/GetCursOnDate")
        );
        assert_eq!(
            description.soap_action("GetLatestDateTime"),
            Some("http://web.cbr.ru/GetLatestDateTime")
        );
        assert_eq!(description.soap_action("Unknown"), None);
    }

    #[test]
    fn test_operations_from_bindings() {
        let description = ServiceDescription::parse(DAILY_WSDL).expect("valid wsdl");

        assert_eq!(description.operations(), ["GetCursOnDate", "GetLatestDateTime"]);
    }

    #[test]
    fn test_reject_non_wsdl_document() {
        let result = ServiceDescription::parse("<html><body>Not found</body></html>");

        let fault = result.expect_err("should fail");
        assert_eq!(fault.code, WSDL_FAULT_CODE);
        insta::assert_snapshot!(fault.message, @"expected 'definitions' root element, got 'html'");
    }

    #[test]
    fn test_reject_malformed_document() {
        let result = ServiceDescription::parse("<wsdl:definitions><wsdl:types>");

        assert!(matches!(result, Err(RemoteFault { code, .. }) if code == WSDL_FAULT_CODE));
    }
}
