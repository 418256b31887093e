use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::Role;

#[derive(Clone)]
pub struct RoleRepository {
    db: DatabaseManager,
}

impl RoleRepository {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<Role>, DatabaseError> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, name, description, created_at FROM roles ORDER BY created_at DESC, name ASC",
        )
        .fetch_all(self.db.pool())
        .await?;
        Ok(roles)
    }

    pub async fn insert(&self, role: &Role) -> Result<(), DatabaseError> {
        let pool = self.db.pool();
        self.db
            .with_retry(|| {
                sqlx::query("INSERT INTO roles (id, name, description, created_at) VALUES (?, ?, ?, ?)")
                    .bind(&role.id)
                    .bind(&role.name)
                    .bind(role.description.as_deref())
                    .bind(&role.created_at)
                    .execute(pool)
            })
            .await?;
        Ok(())
    }

    /// Returns the number of rows changed.
    pub async fn update(&self, id: &str, name: &str, description: Option<&str>) -> Result<u64, DatabaseError> {
        let pool = self.db.pool();
        let result = self
            .db
            .with_retry(|| {
                sqlx::query("UPDATE roles SET name = ?, description = ? WHERE id = ?")
                    .bind(name)
                    .bind(description)
                    .bind(id)
                    .execute(pool)
            })
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(&self, id: &str) -> Result<u64, DatabaseError> {
        let pool = self.db.pool();
        let result = self
            .db
            .with_retry(|| sqlx::query("DELETE FROM roles WHERE id = ?").bind(id).execute(pool))
            .await?;
        Ok(result.rows_affected())
    }
}
