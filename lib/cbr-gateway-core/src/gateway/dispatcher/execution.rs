use std::time::Instant;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info};

use super::{Dispatcher, PendingInvocation};
use crate::gateway::{
    Connector, GatewayError, LOG_TARGET, MethodContract, ParamType, RawResult, RemoteClient,
    SchemaId, XmlNode,
};

// Materialization
impl<C: Connector> Dispatcher<C> {
    /// Returns the structured response of the captured invocation.
    ///
    /// The invocation is executed on first access only; the result is memoized
    /// until another schema or method is selected.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - no schema or no method is selected
    /// - the method is unknown to the schema, or the arguments do not match its contract
    /// - a `dateTime` argument cannot be read as a date
    /// - the remote service fails
    pub async fn as_structured(&mut self) -> Result<&RawResult, GatewayError> {
        let result = match self.result.take() {
            Some(result) => result,
            None => self.execute().await?,
        };
        Ok(self.result.insert(result))
    }

    /// Deserializes the structured response into `T`.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use cbr_gateway_core::{CallArguments, Gateway};
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct LatestDate {
    ///     #[serde(rename = "GetLatestDateTimeResult")]
    ///     latest: String,
    /// }
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), cbr_gateway_core::GatewayError> {
    /// let gateway = Gateway::builder().build()?;
    /// let latest: LatestDate = gateway
    ///     .dispatcher()
    ///     .daily()
    ///     .select_method("GetLatestDateTime", CallArguments::new())
    ///     .as_json()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Same as [`Self::as_structured`], plus [`GatewayError::TypedResult`] when the
    /// response does not fit `T`.
    pub async fn as_json<T>(&mut self) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
    {
        self.as_structured().await?.to_json()
    }

    /// Returns the root element of the XML held in `<method>Result.any`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::as_structured`], plus [`GatewayError::XmlExtraction`] when the
    /// response carries no parsable XML payload.
    pub async fn as_xml_fragment(&mut self) -> Result<XmlNode, GatewayError> {
        self.as_structured().await?.to_xml_fragment()
    }
}

// Introspection
impl<C: Connector> Dispatcher<C> {
    /// Renders the signature of the selected method, e.g. `GetCursOnDate(dateTime On_date)`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NoSchemaSelected`] or [`GatewayError::NoMethodSelected`]
    /// when nothing is selected, and [`GatewayError::UnknownMethod`] when the schema
    /// has no such method.
    pub async fn describe_method(&self) -> Result<String, GatewayError> {
        let schema = self.selected_schema()?;
        let invocation = self.selected_invocation()?;
        let contracts = self.gateway.get_contracts(schema).await?;

        contracts
            .get(invocation.method())
            .map(MethodContract::signature)
            .ok_or_else(|| self.unknown_method(schema, invocation.method()))
    }

    /// Lists the methods of the selected schema, in discovery order.
    ///
    /// When the remote client knows its operations (see [`RemoteClient::operations`]),
    /// response and shared structures are left out.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NoSchemaSelected`] when no schema is selected, and any
    /// error of the contract discovery.
    pub async fn available_methods(&self) -> Result<Vec<String>, GatewayError> {
        let schema = self.selected_schema()?;
        let client = self.gateway.get_client(schema).await?;
        let contracts = self.gateway.get_contracts(schema).await?;

        let names = contracts.names();
        let methods = match client.operations() {
            Some(operations) => names
                .filter(|name| operations.iter().any(|operation| operation == name))
                .map(str::to_string)
                .collect(),
            None => names.map(str::to_string).collect(),
        };
        Ok(methods)
    }
}

impl<C: Connector> Dispatcher<C> {
    fn selected_schema(&self) -> Result<SchemaId, GatewayError> {
        self.schema.ok_or(GatewayError::NoSchemaSelected)
    }

    fn selected_invocation(&self) -> Result<&PendingInvocation, GatewayError> {
        self.pending.as_ref().ok_or(GatewayError::NoMethodSelected)
    }

    fn unknown_method(&self, schema: SchemaId, method: &str) -> GatewayError {
        let endpoint = self
            .gateway
            .registry()
            .descriptor(schema)
            .map(|descriptor| descriptor.endpoint().to_string())
            .unwrap_or_else(|_| schema.to_string());
        GatewayError::UnknownMethod {
            method: method.to_string(),
            endpoint,
        }
    }

    async fn execute(&self) -> Result<RawResult, GatewayError> {
        let schema = self.selected_schema()?;
        let invocation = self.selected_invocation()?;
        let method = invocation.method();

        info!(
            target: LOG_TARGET,
            %schema,
            method,
            arguments = ?invocation.arguments(),
            "[START]"
        );
        let started = Instant::now();

        let outcome = self.perform(schema, invocation).await;
        match &outcome {
            Ok(_) => info!(
                target: LOG_TARGET,
                %schema,
                method,
                elapsed = ?started.elapsed(),
                "[END]"
            ),
            Err(GatewayError::RemoteCall { code, message }) => error!(
                target: LOG_TARGET,
                %schema,
                method,
                %code,
                %message,
                "[ERROR]"
            ),
            Err(error) => error!(target: LOG_TARGET, %schema, method, %error, "[ERROR]"),
        }

        outcome
    }

    async fn perform(
        &self,
        schema: SchemaId,
        invocation: &PendingInvocation,
    ) -> Result<RawResult, GatewayError> {
        let method = invocation.method();
        let client = self.gateway.get_client(schema).await?;
        let contracts = self.gateway.get_contracts(schema).await?;
        let contract = contracts
            .get(method)
            .ok_or_else(|| self.unknown_method(schema, method))?;

        let mut arguments = invocation.arguments().bind(contract)?;
        let dates = self.gateway.date_coercion();
        for (param, value) in &mut arguments {
            if contract.param_type(param).is_some_and(ParamType::is_date_time) {
                *value = Value::String(dates.coerce(value)?);
            }
        }
        debug!(target: LOG_TARGET, method, ?arguments, "arguments validated");

        let value = client.invoke(method, &arguments).await?;

        Ok(RawResult::new(method, value))
    }
}
