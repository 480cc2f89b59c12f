use indexmap::IndexMap;
use serde_json::Value;

use super::{GatewayError, MethodContract};

/// Arguments of a remote method call.
///
/// Arguments are either named, or positional: positional values are bound to the
/// contract parameters in declaration order when the call is validated.
///
/// # Example
///
/// ```rust
/// use cbr_gateway_core::CallArguments;
///
/// let by_name = CallArguments::new()
///     .add_arg("DateFrom", "01.02.2014")
///     .add_arg("DateTo", "15.09.2015");
///
/// let by_position = CallArguments::new()
///     .push_arg("01.09.2014")
///     .push_arg("10.12.2015");
///
/// assert_eq!(by_name.len(), by_position.len());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArguments {
    named: IndexMap<String, Value>,
    positional: Vec<Value>,
}

impl CallArguments {
    /// Creates an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named argument, replacing any previous value with the same name.
    pub fn add_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    /// Appends a positional argument.
    pub fn push_arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// The number of supplied arguments, named and positional.
    pub fn len(&self) -> usize {
        self.named.len() + self.positional.len()
    }

    /// Whether no argument was supplied.
    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.positional.is_empty()
    }

    /// The value of a named argument.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.named.get(name)
    }

    /// Binds the arguments to `contract` parameters.
    ///
    /// The result follows the contract declaration order.
    pub(in crate::gateway) fn bind(
        &self,
        contract: &MethodContract,
    ) -> Result<IndexMap<String, Value>, GatewayError> {
        if self.len() != contract.len() {
            return Err(GatewayError::ArityMismatch {
                method: contract.name().to_string(),
                expected: contract.parameter_names(),
                expected_count: contract.len(),
                given: self.len(),
            });
        }

        let mut bound = IndexMap::with_capacity(contract.len());
        for (index, (param, param_type)) in contract.parameters().enumerate() {
            let value = self
                .positional
                .get(index)
                .or_else(|| self.named.get(param))
                .ok_or_else(|| GatewayError::MissingParameter {
                    method: contract.name().to_string(),
                    parameter: param.to_string(),
                    param_type: param_type.to_string(),
                })?;
            bound.insert(param.to_string(), value.clone());
        }

        Ok(bound)
    }
}

impl<K, V> FromIterator<(K, V)> for CallArguments
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |args, (name, value)| args.add_arg(name, value))
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for CallArguments
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(values: [(K, V); N]) -> Self {
        values.into_iter().collect()
    }
}
