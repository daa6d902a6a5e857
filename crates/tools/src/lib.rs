//! Built-in task capabilities for taskrelay.
//!
//! Each capability wraps a shared [`TaskStore`] and declares `user_id` as a
//! required parameter; the orchestrator fills it from the caller identity.

pub mod add_task;
pub mod bulk;
pub mod complete_task;
pub mod delete_task;
pub mod get_task;
pub mod list_tasks;
pub mod params;
pub mod update_task;

use std::sync::Arc;
use taskrelay_core::registry::CapabilityRegistry;
use taskrelay_core::store::TaskStore;

pub use add_task::AddTaskCapability;
pub use bulk::{BulkAddTasksCapability, BulkUpdateTasksCapability};
pub use complete_task::CompleteTaskCapability;
pub use delete_task::DeleteTaskCapability;
pub use get_task::GetTaskCapability;
pub use list_tasks::ListTasksCapability;
pub use params::USER_ID;
pub use update_task::UpdateTaskCapability;

/// Create a registry with every built-in task capability, backed by `store`.
pub fn default_registry(store: Arc<dyn TaskStore>) -> CapabilityRegistry {
    CapabilityRegistry::builder()
        .with_capability(Arc::new(AddTaskCapability::new(store.clone())))
        .with_capability(Arc::new(ListTasksCapability::new(store.clone())))
        .with_capability(Arc::new(GetTaskCapability::new(store.clone())))
        .with_capability(Arc::new(CompleteTaskCapability::new(store.clone())))
        .with_capability(Arc::new(UpdateTaskCapability::new(store.clone())))
        .with_capability(Arc::new(DeleteTaskCapability::new(store.clone())))
        .with_capability(Arc::new(BulkAddTasksCapability::new(store.clone())))
        .with_capability(Arc::new(BulkUpdateTasksCapability::new(store)))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskrelay_store::InMemoryTaskStore;

    #[test]
    fn default_registry_has_all_capabilities() {
        let registry = default_registry(Arc::new(InMemoryTaskStore::new()));
        assert_eq!(
            registry.names(),
            vec![
                "add_task",
                "list_tasks",
                "get_task",
                "complete_task",
                "update_task",
                "delete_task",
                "bulk_add_tasks",
                "bulk_update_tasks",
            ]
        );
    }

    #[test]
    fn every_capability_expects_user_id() {
        let registry = default_registry(Arc::new(InMemoryTaskStore::new()));
        for descriptor in registry.list() {
            assert!(descriptor.expects(USER_ID), "{} lacks user_id", descriptor.name());
            assert!(!descriptor.description().is_empty());
        }
    }
}
