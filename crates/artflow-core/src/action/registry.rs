//! Registry for the named browser operations.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use artflow_browser::Page;

use crate::action::{Action, describe_action};
use crate::error::{AutomationError, Result};

/// Mapping from action name to implementation.
///
/// Instantiated per controller; registration happens once at construction
/// and the registry is immutable afterwards. Listing order is registration
/// order, which is why names are kept in a `Vec` beside the lookup map.
#[derive(Default)]
pub struct ActionRegistry {
    ordered: Vec<Arc<dyn Action>>,
    index: HashMap<String, usize>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action; a duplicate name is an error, never a silent
    /// replacement.
    pub fn register<A: Action + 'static>(&mut self, action: A) -> Result<()> {
        self.register_arc(Arc::new(action))
    }

    pub fn register_arc(&mut self, action: Arc<dyn Action>) -> Result<()> {
        let name = action.name().to_string();
        if self.index.contains_key(&name) {
            return Err(AutomationError::DuplicateAction(name));
        }
        self.index.insert(name, self.ordered.len());
        self.ordered.push(action);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.index.get(name).map(|&i| self.ordered[i].clone())
    }

    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Action names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.ordered.iter().map(|a| a.name()).collect()
    }

    /// Catalog of every action (name, description, schema fields) in
    /// registration order; stable across calls.
    pub fn describe_all(&self) -> String {
        self.ordered
            .iter()
            .map(|a| describe_action(a.as_ref()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Validate `raw` against the action's schema and run it.
    pub async fn invoke(&self, name: &str, raw: Value, page: &dyn Page) -> Result<Value> {
        let action = self
            .get(name)
            .ok_or_else(|| AutomationError::ActionNotFound(name.to_string()))?;
        let params = action.schema().validate(&raw)?;
        action.execute(params, page).await
    }
}
