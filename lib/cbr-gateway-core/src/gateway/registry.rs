use std::str::FromStr;

use indexmap::IndexMap;
use url::Url;

use super::GatewayError;

/// Identifier of one of the central bank web services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum SchemaId {
    /// Daily data: currency rates, precious metals, reserves...
    #[display("daily")]
    Daily,
    /// Regional statistics: number of banks, branches...
    #[display("regions")]
    Regions,
    /// Credit organizations directory: bank list, search...
    #[display("organizations")]
    Organizations,
    /// Securities market information.
    #[display("market")]
    Market,
}

impl SchemaId {
    /// All known schemas, in registry order.
    pub const ALL: [Self; 4] = [Self::Daily, Self::Regions, Self::Organizations, Self::Market];

    /// The published WSDL location of this schema.
    pub fn default_endpoint(self) -> &'static str {
        match self {
            Self::Daily => "http://www.cbr.ru/DailyInfoWebServ/DailyInfo.asmx?WSDL",
            Self::Regions => "http://www.cbr.ru/RegionWebServ/regional.asmx?WSDL",
            Self::Organizations => "http://www.cbr.ru/CreditInfoWebServ/CreditOrgInfo.asmx?WSDL",
            Self::Market => "http://www.cbr.ru/secinfo/secinfo.asmx?WSDL",
        }
    }
}

impl FromStr for SchemaId {
    type Err = GatewayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|schema| schema.to_string() == value)
            .ok_or_else(|| GatewayError::UnknownSchema {
                schema: value.to_string(),
            })
    }
}

/// A schema identifier bound to its endpoint locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    id: SchemaId,
    endpoint: Url,
}

impl SchemaDescriptor {
    /// Creates a descriptor.
    pub fn new(id: SchemaId, endpoint: Url) -> Self {
        Self { id, endpoint }
    }

    /// The schema identifier.
    pub fn id(&self) -> SchemaId {
        self.id
    }

    /// The WSDL location.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Static mapping from schema identifier to endpoint locator.
///
/// The registry always knows every [`SchemaId`]; endpoints default to the
/// central bank's published locations and can be overridden through the
/// [`GatewayBuilder`](super::GatewayBuilder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRegistry {
    endpoints: IndexMap<SchemaId, Url>,
}

impl SchemaRegistry {
    /// Builds the registry with the published endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidEndpoint`] if an endpoint cannot be parsed.
    pub fn with_defaults() -> Result<Self, GatewayError> {
        Self::with_overrides(&IndexMap::new())
    }

    pub(in crate::gateway) fn with_overrides(
        overrides: &IndexMap<SchemaId, String>,
    ) -> Result<Self, GatewayError> {
        let mut endpoints = IndexMap::with_capacity(SchemaId::ALL.len());
        for schema in SchemaId::ALL {
            let location = overrides
                .get(&schema)
                .map_or(schema.default_endpoint(), String::as_str);
            endpoints.insert(schema, Url::parse(location)?);
        }

        Ok(Self { endpoints })
    }

    /// Resolves the endpoint a call on `schema` should target.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownSchema`] if `schema` is not a known identifier.
    pub fn resolve_endpoint(&self, schema: &str) -> Result<&Url, GatewayError> {
        let id = schema.parse::<SchemaId>()?;
        self.endpoints
            .get(&id)
            .ok_or_else(|| GatewayError::UnknownSchema {
                schema: schema.to_string(),
            })
    }

    /// Returns the descriptor of `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownSchema`] if the registry has no endpoint for it.
    pub fn descriptor(&self, schema: SchemaId) -> Result<SchemaDescriptor, GatewayError> {
        let endpoint = self
            .endpoints
            .get(&schema)
            .ok_or_else(|| GatewayError::UnknownSchema {
                schema: schema.to_string(),
            })?;

        Ok(SchemaDescriptor::new(schema, endpoint.clone()))
    }

    /// Iterates over every descriptor, in registry order.
    pub fn descriptors(&self) -> impl Iterator<Item = SchemaDescriptor> + '_ {
        self.endpoints
            .iter()
            .map(|(id, endpoint)| SchemaDescriptor::new(*id, endpoint.clone()))
    }
}
