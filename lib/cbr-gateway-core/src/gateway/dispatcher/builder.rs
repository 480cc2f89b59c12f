use super::{Dispatcher, PendingInvocation};
use crate::gateway::{CallArguments, Connector, GatewayError, SchemaId};

// Schema selection
impl<C: Connector> Dispatcher<C> {
    /// Selects the active schema.
    ///
    /// Any captured invocation and memoized result are dropped.
    pub fn select_schema(&mut self, schema: SchemaId) -> &mut Self {
        self.schema = Some(schema);
        self.pending = None;
        self.result = None;
        self
    }

    /// Selects the active schema by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownSchema`] if `schema` is not a known identifier.
    pub fn select_schema_named(&mut self, schema: &str) -> Result<&mut Self, GatewayError> {
        let schema = schema.parse()?;
        Ok(self.select_schema(schema))
    }

    /// Selects the daily data schema.
    pub fn daily(&mut self) -> &mut Self {
        self.select_schema(SchemaId::Daily)
    }

    /// Selects the regional statistics schema.
    pub fn regions(&mut self) -> &mut Self {
        self.select_schema(SchemaId::Regions)
    }

    /// Selects the credit organizations schema.
    pub fn organizations(&mut self) -> &mut Self {
        self.select_schema(SchemaId::Organizations)
    }

    /// Selects the securities market schema.
    pub fn market(&mut self) -> &mut Self {
        self.select_schema(SchemaId::Market)
    }
}

// Method selection
impl<C: Connector> Dispatcher<C> {
    /// Captures an invocation of `method` with `arguments`.
    ///
    /// Nothing is sent until a materialization is requested; any previously
    /// memoized result is dropped.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cbr_gateway_core::{CallArguments, Gateway};
    ///
    /// # fn example() -> Result<(), cbr_gateway_core::GatewayError> {
    /// let gateway = Gateway::builder().build()?;
    /// let mut dispatcher = gateway.dispatcher();
    ///
    /// dispatcher
    ///     .organizations()
    ///     .select_method("SearchByName", [("NamePart", "Сбербанк")]);
    ///
    /// assert_eq!(dispatcher.pending().map(|it| it.method()), Some("SearchByName"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn select_method(
        &mut self,
        method: impl Into<String>,
        arguments: impl Into<CallArguments>,
    ) -> &mut Self {
        self.pending = Some(PendingInvocation::new(method, arguments));
        self.result = None;
        self
    }
}
