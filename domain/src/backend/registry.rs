//! Capability Registry: read-only lookup of backend descriptors.

use super::descriptor::AgentDescriptor;
use super::kind::BackendKind;
use crate::core::error::DomainError;
use std::collections::BTreeMap;

/// Table mapping each backend identity to its declared capabilities.
///
/// Built once at startup and shared read-only between concurrent delegations.
/// Reconfiguration produces a new registry via [`CapabilityRegistry::with_descriptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityRegistry {
    descriptors: BTreeMap<BackendKind, AgentDescriptor>,
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::empty()
            .with_descriptor(
                AgentDescriptor::new(BackendKind::RemoteApi)
                    .with_async(true)
                    .with_plan_approval(true)
                    .with_max_context_size(100_000)
                    .with_requires_credential(true),
            )
            .with_descriptor(
                AgentDescriptor::new(BackendKind::LocalHeadless).with_max_context_size(10_000),
            )
            .with_descriptor(
                AgentDescriptor::new(BackendKind::LocalInteractive).with_max_context_size(10_000),
            )
    }
}

impl CapabilityRegistry {
    pub fn empty() -> Self {
        Self {
            descriptors: BTreeMap::new(),
        }
    }

    /// Insert or replace the descriptor for its kind.
    pub fn with_descriptor(mut self, descriptor: AgentDescriptor) -> Self {
        self.descriptors.insert(descriptor.kind, descriptor);
        self
    }

    pub fn descriptor(&self, kind: BackendKind) -> Result<&AgentDescriptor, DomainError> {
        self.descriptors
            .get(&kind)
            .ok_or_else(|| DomainError::UnknownBackend(kind.to_string()))
    }

    /// Look up a descriptor by its textual backend id (e.g. `"cli_headless"`).
    pub fn descriptor_by_id(&self, id: &str) -> Result<&AgentDescriptor, DomainError> {
        let kind: BackendKind = id.parse()?;
        self.descriptor(kind)
    }

    /// All registered descriptors, ordered by kind.
    pub fn capability_matrix(&self) -> Vec<&AgentDescriptor> {
        self.descriptors.values().collect()
    }

    /// Largest context any synchronous backend declares, if any is registered.
    pub fn max_sync_context_size(&self) -> Option<u64> {
        self.descriptors
            .values()
            .filter(|d| !d.supports_async)
            .map(|d| d.max_context_size)
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let registry = CapabilityRegistry::default();
        let remote = registry.descriptor(BackendKind::RemoteApi).unwrap();
        assert!(remote.supports_async);
        assert!(remote.supports_plan_approval);
        assert!(remote.requires_credential);

        let headless = registry.descriptor(BackendKind::LocalHeadless).unwrap();
        assert!(!headless.supports_async);
        assert!(!headless.supports_plan_approval);
        assert_eq!(registry.capability_matrix().len(), 3);
    }

    #[test]
    fn test_unknown_backend_id() {
        let registry = CapabilityRegistry::default();
        assert!(matches!(
            registry.descriptor_by_id("qwen"),
            Err(DomainError::UnknownBackend(_))
        ));
        assert_eq!(
            registry.descriptor_by_id("cli").unwrap().kind,
            BackendKind::LocalHeadless
        );
    }

    #[test]
    fn test_missing_descriptor_is_unknown() {
        let registry = CapabilityRegistry::empty();
        assert!(registry.descriptor(BackendKind::RemoteApi).is_err());
        assert_eq!(registry.max_sync_context_size(), None);
    }

    #[test]
    fn test_reconfiguration_replaces_descriptor() {
        let registry = CapabilityRegistry::default().with_descriptor(
            AgentDescriptor::new(BackendKind::LocalHeadless).with_max_context_size(20_000),
        );
        assert_eq!(registry.max_sync_context_size(), Some(20_000));
    }
}
