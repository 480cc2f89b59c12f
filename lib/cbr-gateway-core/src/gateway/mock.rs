//! In-memory [`Connector`] counting every remote interaction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexMap;
use serde_json::Value;

use super::{Connector, RemoteClient, RemoteFault, SchemaDescriptor, SchemaId};

type Arguments = IndexMap<String, Value>;

#[derive(Debug, Default)]
struct MockState {
    types: HashMap<SchemaId, Vec<String>>,
    operations: HashMap<SchemaId, Vec<String>>,
    responses: HashMap<String, Result<Value, RemoteFault>>,
    failing: Vec<SchemaId>,
    connects: HashMap<SchemaId, usize>,
    type_fetches: HashMap<SchemaId, usize>,
    invocations: Vec<(String, Arguments)>,
}

/// Connector whose clients answer from canned metadata and responses.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    fn with_state<R>(&self, action: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        action(&mut state)
    }

    pub(crate) fn with_types(self, schema: SchemaId, types: Vec<String>) -> Self {
        self.with_state(|state| state.types.insert(schema, types));
        self
    }

    pub(crate) fn with_operations(self, schema: SchemaId, operations: &[&str]) -> Self {
        let operations = operations.iter().map(|name| (*name).to_string()).collect();
        self.with_state(|state| state.operations.insert(schema, operations));
        self
    }

    pub(crate) fn with_response(self, method: &str, response: Value) -> Self {
        self.with_state(|state| state.responses.insert(method.to_string(), Ok(response)));
        self
    }

    pub(crate) fn with_fault(self, method: &str, fault: RemoteFault) -> Self {
        self.with_state(|state| state.responses.insert(method.to_string(), Err(fault)));
        self
    }

    pub(crate) fn failing_connect(self, schema: SchemaId) -> Self {
        self.with_state(|state| state.failing.push(schema));
        self
    }

    pub(crate) fn connect_count(&self, schema: SchemaId) -> usize {
        self.with_state(|state| state.connects.get(&schema).copied().unwrap_or_default())
    }

    pub(crate) fn types_count(&self, schema: SchemaId) -> usize {
        self.with_state(|state| state.type_fetches.get(&schema).copied().unwrap_or_default())
    }

    pub(crate) fn invoke_count(&self) -> usize {
        self.with_state(|state| state.invocations.len())
    }

    pub(crate) fn invocations(&self) -> Vec<(String, Arguments)> {
        self.with_state(|state| state.invocations.clone())
    }
}

impl Connector for MockConnector {
    type Client = MockClient;

    async fn connect(&self, schema: &SchemaDescriptor) -> Result<Self::Client, RemoteFault> {
        let id = schema.id();
        let failing = self.with_state(|state| {
            *state.connects.entry(id).or_default() += 1;
            state.failing.contains(&id)
        });
        if failing {
            return Err(RemoteFault::new("WSDL", format!("cannot load {}", schema.endpoint())));
        }

        Ok(MockClient {
            schema: id,
            connector: self.clone(),
        })
    }
}

/// Client opened by [`MockConnector`].
#[derive(Debug)]
pub(crate) struct MockClient {
    schema: SchemaId,
    connector: MockConnector,
}

impl MockClient {
    pub(crate) fn schema(&self) -> SchemaId {
        self.schema
    }
}

impl RemoteClient for MockClient {
    async fn types(&self) -> Result<Vec<String>, RemoteFault> {
        let schema = self.schema;
        let types = self.connector.with_state(|state| {
            *state.type_fetches.entry(schema).or_default() += 1;
            state.types.get(&schema).cloned().unwrap_or_default()
        });
        Ok(types)
    }

    fn operations(&self) -> Option<Vec<String>> {
        let schema = self.schema;
        self.connector
            .with_state(|state| state.operations.get(&schema).cloned())
    }

    async fn invoke(&self, method: &str, arguments: &Arguments) -> Result<Value, RemoteFault> {
        self.connector.with_state(|state| {
            state
                .invocations
                .push((method.to_string(), arguments.clone()));
            state.responses.get(method).cloned().unwrap_or_else(|| {
                Err(RemoteFault::new(
                    "soap:Client",
                    format!("no canned response for {method}"),
                ))
            })
        })
    }
}

/// Type metadata of a reduced daily schema.
pub(crate) fn daily_types() -> Vec<String> {
    [
        "struct GetCursOnDate {\n dateTime On_date;\n}",
        "struct GetCursOnDateResponse {\n GetCursOnDateResult GetCursOnDateResult;\n}",
        "struct GetLatestDateTime {\n}",
        "struct DragMetDynamic {\n dateTime fromDate;\n dateTime ToDate;\n}",
        "struct Sample {\n string A;\n dateTime B;\n}",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}
