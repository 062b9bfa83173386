use std::time::Duration;

use moka::future::Cache;
use sqlx::MySqlPool;

use crate::error::AppError;
use crate::model::employee::EmployeeIdentity;

/// Looks up who an employee is expected to be on camera.
#[allow(async_fn_in_trait)]
pub trait EmployeeDirectory {
    async fn identity(&self, employee_id: u64) -> Result<Option<EmployeeIdentity>, AppError>;
}

/// Employees table lookups, memoized for `ttl`.
#[derive(Clone)]
pub struct MySqlEmployeeDirectory {
    pool: MySqlPool,
    cache: Cache<u64, EmployeeIdentity>,
}

impl MySqlEmployeeDirectory {
    pub fn new(pool: MySqlPool, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(50_000)
            .time_to_live(ttl)
            .build();

        Self { pool, cache }
    }
}

impl EmployeeDirectory for MySqlEmployeeDirectory {
    async fn identity(&self, employee_id: u64) -> Result<Option<EmployeeIdentity>, AppError> {
        if let Some(identity) = self.cache.get(&employee_id).await {
            return Ok(Some(identity));
        }

        let identity = sqlx::query_as::<_, EmployeeIdentity>(
            r#"
            SELECT id, employee_code, full_name, first_name, last_name
            FROM employees
            WHERE id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(identity) = &identity {
            self.cache.insert(employee_id, identity.clone()).await;
        }

        Ok(identity)
    }
}
