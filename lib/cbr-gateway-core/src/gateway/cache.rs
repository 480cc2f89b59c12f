use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

use super::{GatewayError, SchemaId};

/// A lazily initialized value per schema.
///
/// The map lock is only held to fetch the cell; initialization runs under the cell,
/// so concurrent callers on one schema wait for a single initializer while other
/// schemas proceed independently. A failed initialization leaves the cell empty.
pub(in crate::gateway) struct SchemaCache<T> {
    cells: Mutex<HashMap<SchemaId, Arc<OnceCell<Arc<T>>>>>,
}

impl<T> Default for SchemaCache<T> {
    fn default() -> Self {
        Self {
            cells: Mutex::default(),
        }
    }
}

impl<T> Debug for SchemaCache<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        let initialized = cells
            .iter()
            .filter(|(_, cell)| cell.initialized())
            .map(|(schema, _)| *schema)
            .collect::<Vec<_>>();
        formatter
            .debug_struct("SchemaCache")
            .field("initialized", &initialized)
            .finish()
    }
}

impl<T> SchemaCache<T> {
    fn cell(&self, schema: SchemaId) -> Arc<OnceCell<Arc<T>>> {
        let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cells.entry(schema).or_default())
    }

    pub(in crate::gateway) async fn get_or_try_init<F, Fut>(
        &self,
        schema: SchemaId,
        init: F,
    ) -> Result<Arc<T>, GatewayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let cell = self.cell(schema);
        let value = cell
            .get_or_try_init(|| async { init().await.map(Arc::new) })
            .await?;

        Ok(Arc::clone(value))
    }

    pub(in crate::gateway) fn contains(&self, schema: SchemaId) -> bool {
        let cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells.get(&schema).is_some_and(|cell| cell.initialized())
    }
}
