use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::types::HubEntity;
use crate::context::ArcGISContext;
use crate::error::{Error, Result};
use crate::permissions::{
    CheckOptions, EntityPermissionPolicy, Permission, PermissionAccessResponse, PolicyRegistry,
    check_permission,
};
use crate::portal::PortalClient;

/// Lifecycle state of an [`EntityInstance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Active,
    Destroyed,
}

/// A live entity bound to a context and a policy registry.
#[derive(Debug, Clone)]
pub struct EntityInstance {
    entity: HubEntity,
    state: EntityState,
    registry: Arc<PolicyRegistry>,
    context: ArcGISContext,
}

impl EntityInstance {
    pub fn new(entity: HubEntity, registry: Arc<PolicyRegistry>, context: ArcGISContext) -> Self {
        Self {
            entity,
            state: EntityState::Active,
            registry,
            context,
        }
    }

    pub fn from_json(
        json: Value,
        registry: Arc<PolicyRegistry>,
        context: ArcGISContext,
    ) -> Result<Self> {
        Ok(Self::new(serde_json::from_value(json)?, registry, context))
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    fn ensure_active(&self) -> Result<()> {
        match self.state {
            EntityState::Active => Ok(()),
            EntityState::Destroyed => Err(Error::Destroyed),
        }
    }

    pub fn entity(&self) -> Result<&HubEntity> {
        self.ensure_active()?;
        Ok(&self.entity)
    }

    pub fn to_json(&self) -> Result<Value> {
        self.ensure_active()?;
        Ok(serde_json::to_value(&self.entity)?)
    }

    /// Shallow merge `changes` over the entity's top-level fields.
    pub fn update(&mut self, changes: Value) -> Result<()> {
        self.ensure_active()?;
        let mut current = serde_json::to_value(&self.entity)?;
        if let (Value::Object(target), Value::Object(changes)) = (&mut current, changes) {
            for (key, value) in changes {
                // the variant tag is fixed for the life of the instance
                if key != "entityType" {
                    target.insert(key, value);
                }
            }
        }
        self.entity = serde_json::from_value(current)?;
        Ok(())
    }

    pub fn permissions(&self) -> Result<&[EntityPermissionPolicy]> {
        self.ensure_active()?;
        Ok(&self.entity.base().permissions)
    }

    /// Add a grant, replacing any grant of the same permission to the same
    /// collaborator.
    pub fn add_permission_policy(&mut self, policy: EntityPermissionPolicy) -> Result<()> {
        self.ensure_active()?;
        let grants = &mut self.entity.base_mut().permissions;
        grants.retain(|g| {
            !(g.permission == policy.permission
                && g.collaboration_type == policy.collaboration_type
                && g.collaboration_id == policy.collaboration_id)
        });
        grants.push(policy);
        Ok(())
    }

    /// Remove the grant of `permission` to `collaboration_id`.
    pub fn remove_permission_policy(
        &mut self,
        permission: &Permission,
        collaboration_id: &str,
    ) -> Result<()> {
        self.ensure_active()?;
        self.entity
            .base_mut()
            .permissions
            .retain(|g| !(&g.permission == permission && g.collaboration_id == collaboration_id));
        Ok(())
    }

    /// Evaluate a permission with this entity supplying owner, edit rights,
    /// features and grants.
    pub fn check_permission(&self, permission: &Permission) -> Result<PermissionAccessResponse> {
        let entity = self.to_json()?;
        Ok(check_permission(
            &self.registry,
            permission,
            &self.context,
            CheckOptions::entity(&entity).with_label(self.entity.id()),
        ))
    }

    /// Remove the backing item or group from the Portal. The instance is
    /// unusable afterwards.
    pub async fn delete(&mut self) -> Result<()> {
        self.ensure_active()?;
        let client = PortalClient::from_request_options(&self.context.hub_request_options())?;
        let base = self.entity.base();
        if self.entity.is_group() {
            client.remove_group(&base.id).await?;
        } else {
            client.remove_item(&base.id, &base.owner).await?;
        }
        info!(id = %base.id, family = %self.entity.family(), "entity deleted");
        self.state = EntityState::Destroyed;
        Ok(())
    }
}
