use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use super::GatewayError;

static STRUCT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*struct\s+(?<name>\S+)\s*\{(?<fields>.*)\}\s*$").expect("a valid regex")
});

/// Declared type of a contract parameter.
///
/// Common XML schema types get their own variant, anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// `string`
    String,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `decimal`
    Decimal,
    /// `double`
    Double,
    /// `boolean`
    Boolean,
    /// `dateTime`, values are coerced before the call.
    DateTime,
    /// Any other type tag.
    Other(String),
}

impl ParamType {
    /// The type tag as declared in the schema.
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Long => "long",
            Self::Decimal => "decimal",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::DateTime => "dateTime",
            Self::Other(name) => name,
        }
    }

    /// Whether values of this type go through date coercion.
    pub fn is_date_time(&self) -> bool {
        matches!(self, Self::DateTime)
    }
}

impl From<&str> for ParamType {
    fn from(value: &str) -> Self {
        match value {
            "string" => Self::String,
            "int" => Self::Int,
            "long" => Self::Long,
            "decimal" => Self::Decimal,
            "double" => Self::Double,
            "boolean" => Self::Boolean,
            "dateTime" => Self::DateTime,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ParamType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// The ordered parameters required by one remote method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodContract {
    name: String,
    parameters: IndexMap<String, ParamType>,
}

impl MethodContract {
    /// Creates a contract from `(parameter, type)` pairs, in declaration order.
    pub fn new<I, P, T>(name: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = (P, T)>,
        P: Into<String>,
        T: Into<ParamType>,
    {
        Self {
            name: name.into(),
            parameters: parameters
                .into_iter()
                .map(|(param, param_type)| (param.into(), param_type.into()))
                .collect(),
        }
    }

    /// The method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterates over `(parameter, type)` pairs, in declaration order.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &ParamType)> {
        self.parameters
            .iter()
            .map(|(param, param_type)| (param.as_str(), param_type))
    }

    /// The parameter names, in declaration order.
    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters.keys().cloned().collect()
    }

    /// The declared type of `parameter`.
    pub fn param_type(&self, parameter: &str) -> Option<&ParamType> {
        self.parameters.get(parameter)
    }

    /// The number of parameters.
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Whether the method takes no parameter.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Renders the contract as a signature, e.g. `GetCursOnDate(dateTime On_date)`.
    pub fn signature(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|(param, param_type)| format!("{param_type} {param}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({params})", self.name)
    }

    /// Parses one type metadata entry: `struct <Name> { (<type> <field>;)* }`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ContractParse`] if the entry does not follow the grammar.
    pub fn parse(entry: &str) -> Result<Self, GatewayError> {
        let malformed = |reason: &str| GatewayError::ContractParse {
            entry: entry.to_string(),
            reason: reason.to_string(),
        };

        let captures = STRUCT_RE
            .captures(entry)
            .ok_or_else(|| malformed("expected 'struct <name> { ... }'"))?;
        let name = &captures["name"];
        let fields = &captures["fields"];

        let mut declarations = fields.split(';').collect::<Vec<_>>();
        // the piece after the last ';' must be blank
        if declarations
            .pop()
            .is_some_and(|trailing| !trailing.trim().is_empty())
        {
            return Err(malformed("field declaration not terminated by ';'"));
        }

        let mut parameters = IndexMap::with_capacity(declarations.len());
        for declaration in declarations {
            let tokens = declaration.split_whitespace().collect::<Vec<_>>();
            let [param_type, param] = tokens.as_slice() else {
                return Err(malformed("expected '<type> <name>;'"));
            };
            parameters.insert((*param).to_string(), ParamType::from(*param_type));
        }

        Ok(Self {
            name: name.to_string(),
            parameters,
        })
    }
}

/// Every contract discovered for one schema, by method name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodContracts {
    methods: IndexMap<String, MethodContract>,
}

impl MethodContracts {
    /// Parses a whole type metadata sequence.
    ///
    /// A single malformed entry aborts the pass: no partial contract set is ever produced.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ContractParse`] naming the first malformed entry.
    pub fn parse<I, S>(entries: I) -> Result<Self, GatewayError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        entries
            .into_iter()
            .map(|entry| MethodContract::parse(entry.as_ref()))
            .collect()
    }

    /// The contract of `method`.
    pub fn get(&self, method: &str) -> Option<&MethodContract> {
        self.methods.get(method)
    }

    /// Method names, in discovery order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// The number of discovered contracts.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether nothing was discovered.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl FromIterator<MethodContract> for MethodContracts {
    fn from_iter<I: IntoIterator<Item = MethodContract>>(iter: I) -> Self {
        let methods = iter
            .into_iter()
            .map(|contract| (contract.name.clone(), contract))
            .collect();
        Self { methods }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_parameter() {
        let contract =
            MethodContract::parse("struct GetCursOnDate {\n dateTime On_date;\n}").expect("valid entry");

        assert_eq!(contract.name(), "GetCursOnDate");
        assert_eq!(contract.len(), 1);
        assert_eq!(contract.param_type("On_date"), Some(&ParamType::DateTime));
    }

    #[test]
    fn test_parse_keeps_declaration_order() {
        let contract = MethodContract::parse(
            "struct DragMetDynamic {\n dateTime fromDate;\n dateTime ToDate;\n}",
        )
        .expect("valid entry");

        assert_eq!(contract.parameter_names(), vec!["fromDate", "ToDate"]);
    }

    #[test]
    fn test_parse_empty_struct() {
        let contract = MethodContract::parse("struct GetLatestDateTime {\n}").expect("valid entry");

        assert!(contract.is_empty());
        insta::assert_snapshot!(contract.signature(), @"GetLatestDateTime()");
    }

    #[test]
    fn test_parse_any_xml_field() {
        let contract = MethodContract::parse(
            "struct GetCursOnDateResult {\n schema schema;\n <anyXML> any;\n}",
        )
        .expect("valid entry");

        assert_eq!(
            contract.param_type("any"),
            Some(&ParamType::Other("<anyXML>".to_string()))
        );
    }

    #[test]
    fn test_signature() {
        let contract = MethodContract::new(
            "SearchByName",
            [("NamePart", "string"), ("ShowAll", "boolean")],
        );

        insta::assert_snapshot!(contract.signature(), @"SearchByName(string NamePart, boolean ShowAll)");
    }

    #[test]
    fn test_parse_rejects_missing_struct_keyword() {
        let result = MethodContract::parse("string ArrayOfString[]");

        assert!(matches!(result, Err(GatewayError::ContractParse { .. })));
    }

    #[test]
    fn test_parse_rejects_unterminated_field() {
        let result = MethodContract::parse("struct Broken {\n string Name\n}");

        assert!(matches!(result, Err(GatewayError::ContractParse { .. })));
    }

    #[test]
    fn test_parse_rejects_field_without_type() {
        let result = MethodContract::parse("struct Broken {\n Name;\n}");

        assert!(matches!(result, Err(GatewayError::ContractParse { .. })));
    }

    #[test]
    fn test_contracts_abort_on_first_malformed_entry() {
        let entries = [
            "struct GetCursOnDate {\n dateTime On_date;\n}",
            "garbage",
            "struct GetLatestDate {\n}",
        ];

        let result = MethodContracts::parse(entries);

        assert!(matches!(
            result,
            Err(GatewayError::ContractParse { entry, .. }) if entry == "garbage"
        ));
    }

    #[test]
    fn test_contracts_by_name() {
        let entries = [
            "struct GetCursOnDate {\n dateTime On_date;\n}",
            "struct GetLatestDate {\n}",
        ];

        let contracts = MethodContracts::parse(entries).expect("valid entries");

        assert_eq!(contracts.len(), 2);
        assert_eq!(
            contracts.names().collect::<Vec<_>>(),
            vec!["GetCursOnDate", "GetLatestDate"]
        );
        assert!(contracts.get("GetLatestDate").is_some_and(MethodContract::is_empty));
        assert!(contracts.get("Unknown").is_none());
    }

    #[test]
    fn test_param_type_round_trip() {
        for tag in ["string", "int", "long", "decimal", "double", "boolean", "dateTime", "ArrayOfInt"] {
            assert_eq!(ParamType::from(tag).as_str(), tag);
        }
    }
}
