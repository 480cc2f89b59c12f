use serde_json::Value;
use tracing::debug;

use super::{Connector, DateInput, Dispatcher, GatewayError, LOG_TARGET, XmlNode};

/// The daily schema method listing currency rates.
pub const COURSES_METHOD: &str = "GetCursOnDate";
/// Currency letter code of a rate entry, e.g. `USD`.
pub const CURRENCY_CODE_FIELD: &str = "VchCode";
/// Rate of a rate entry, for `Vnom` units.
pub const RATE_FIELD: &str = "Vcurs";
/// Nominal of a rate entry.
pub const NOMINAL_FIELD: &str = "Vnom";

const DATE_PARAM: &str = "On_date";
const DATA_ELEMENT: &str = "ValuteData";
const ENTRY_ELEMENT: &str = "ValuteCursOnDate";

impl<C: Connector> Dispatcher<C> {
    /// Lists the currency rates of `date` (default: now), one `ValuteCursOnDate` element per currency.
    ///
    /// This selects the daily schema and the [`COURSES_METHOD`] method.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EmptyResult`] if the response holds no rate entry,
    /// and any error of [`Self::as_xml_fragment`].
    pub async fn list_courses(
        &mut self,
        date: Option<DateInput>,
    ) -> Result<Vec<XmlNode>, GatewayError> {
        let date = date.unwrap_or_else(DateInput::now);
        let root = self
            .daily()
            .select_method(COURSES_METHOD, [(DATE_PARAM, Value::from(date))])
            .as_xml_fragment()
            .await?;

        let data = if root.local_name() == DATA_ELEMENT {
            Some(&root)
        } else {
            root.child(DATA_ELEMENT)
        };
        let entries = data
            .map(|data| data.children_named(ENTRY_ELEMENT).cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        if entries.is_empty() {
            return Err(GatewayError::EmptyResult {
                method: COURSES_METHOD.to_string(),
            });
        }

        debug!(target: LOG_TARGET, count = entries.len(), "currency rates listed");
        Ok(entries)
    }

    /// Rate of one unit of `currency` (letter code, e.g. `USD`) on `date` (default: now),
    /// rounded to 4 decimals.
    ///
    /// Returns `Ok(None)` when the currency is not listed.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidCourseValue`] if the entry rate or nominal is not
    /// a number, and any error of [`Self::list_courses`].
    pub async fn course_rate(
        &mut self,
        currency: &str,
        date: Option<DateInput>,
    ) -> Result<Option<f64>, GatewayError> {
        let courses = self.list_courses(date).await?;

        courses
            .iter()
            .find(|entry| entry.child_text(CURRENCY_CODE_FIELD) == Some(currency))
            .map(|entry| unit_rate(currency, entry))
            .transpose()
    }
}

fn unit_rate(currency: &str, entry: &XmlNode) -> Result<f64, GatewayError> {
    let rate = decimal_field(currency, entry, RATE_FIELD)?;
    let nominal = decimal_field(currency, entry, NOMINAL_FIELD)?;
    if nominal == 0.0 {
        return Err(invalid_value(currency, entry, NOMINAL_FIELD));
    }

    Ok(round_to_4_decimals(rate / nominal))
}

fn decimal_field(currency: &str, entry: &XmlNode, field: &'static str) -> Result<f64, GatewayError> {
    entry
        .child_text(field)
        .and_then(|raw| raw.replace(',', ".").parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .ok_or_else(|| invalid_value(currency, entry, field))
}

fn invalid_value(currency: &str, entry: &XmlNode, field: &'static str) -> GatewayError {
    GatewayError::InvalidCourseValue {
        currency: currency.to_string(),
        field,
        value: entry.child_text(field).unwrap_or_default().to_string(),
    }
}

fn round_to_4_decimals(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
