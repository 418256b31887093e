use tracing::info;

use super::{conflict_on_unique, ServiceError, ServiceResult};
use crate::database::models::Role;
use crate::database::repository::RoleRepository;
use crate::database::DatabaseManager;
use crate::types::{new_id, now_iso};

#[derive(Clone)]
pub struct RoleService {
    repo: RoleRepository,
}

impl RoleService {
    pub fn new(db: DatabaseManager) -> Self {
        Self {
            repo: RoleRepository::new(db),
        }
    }

    pub async fn list(&self) -> ServiceResult<Vec<Role>> {
        Ok(self.repo.list().await?)
    }

    pub async fn create(&self, name: &str, description: Option<String>) -> ServiceResult<Role> {
        let role = Role {
            id: new_id(),
            name: name.to_string(),
            description,
            created_at: now_iso(),
        };
        self.repo
            .insert(&role)
            .await
            .map_err(|e| conflict_on_unique(e, name))?;

        info!("Created role {} ({})", role.name, role.id);
        Ok(role)
    }

    pub async fn update(&self, id: &str, name: &str, description: Option<&str>) -> ServiceResult<()> {
        let changed = self
            .repo
            .update(id, name, description)
            .await
            .map_err(|e| conflict_on_unique(e, name))?;
        if changed == 0 {
            return Err(ServiceError::not_found());
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        if self.repo.delete(id).await? == 0 {
            return Err(ServiceError::not_found());
        }
        info!("Deleted role {}", id);
        Ok(())
    }
}
