use chrono::NaiveDate;
use sqlx::MySqlPool;
use tracing::debug;

use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, Transition};

/// Persistence for per-employee, per-day attendance records.
#[allow(async_fn_in_trait)]
pub trait AttendanceStore {
    /// Loads (or lazily creates) the record for `employee_id` on `date`,
    /// runs `apply` on it and persists the result, all as one unit of work.
    ///
    /// If `apply` fails nothing is written, not even the lazily created row.
    async fn reconcile<F>(
        &self,
        employee_id: u64,
        date: NaiveDate,
        apply: F,
    ) -> Result<(AttendanceRecord, Transition), AppError>
    where
        F: FnOnce(&mut AttendanceRecord) -> Result<Transition, AppError>;
}

#[derive(Debug, Default, Clone)]
pub struct AttendanceFilter {
    pub employee_id: Option<u64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug)]
enum Bind {
    U64(u64),
    Date(NaiveDate),
}

const RECORD_COLUMNS: &str = "id, employee_id, date, check_in, check_out, worked_seconds, late";

#[derive(Clone)]
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// One page of records, newest first, plus the total matching count.
    pub async fn list(
        &self,
        filter: &AttendanceFilter,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<AttendanceRecord>, i64), AppError> {
        let mut conditions = Vec::new();
        let mut bindings = Vec::new();

        if let Some(employee_id) = filter.employee_id {
            conditions.push("employee_id = ?");
            bindings.push(Bind::U64(employee_id));
        }
        if let Some(from) = filter.from {
            conditions.push("date >= ?");
            bindings.push(Bind::Date(from));
        }
        if let Some(to) = filter.to {
            conditions.push("date <= ?");
            bindings.push(Bind::Date(to));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM attendance {where_clause}");
        debug!(sql = %count_sql, bindings = ?bindings, "Counting attendance");

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for b in &bindings {
            count_query = match b {
                Bind::U64(v) => count_query.bind(*v),
                Bind::Date(v) => count_query.bind(*v),
            };
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let data_sql = format!(
            "SELECT {RECORD_COLUMNS} FROM attendance {where_clause} \
             ORDER BY date DESC, id DESC LIMIT ? OFFSET ?"
        );
        let offset = page_offset(page, per_page);
        debug!(sql = %data_sql, page, per_page, offset, "Fetching attendance");

        let mut data_query = sqlx::query_as::<_, AttendanceRecord>(&data_sql);
        for b in &bindings {
            data_query = match b {
                Bind::U64(v) => data_query.bind(*v),
                Bind::Date(v) => data_query.bind(*v),
            };
        }
        let records = data_query
            .bind(u64::from(per_page))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((records, total))
    }
}

/// Rows to skip for a 1-based page; widened so huge pages cannot overflow.
fn page_offset(page: u32, per_page: u32) -> u64 {
    u64::from(page.max(1) - 1) * u64::from(per_page)
}

impl AttendanceStore for MySqlAttendanceStore {
    async fn reconcile<F>(
        &self,
        employee_id: u64,
        date: NaiveDate,
        apply: F,
    ) -> Result<(AttendanceRecord, Transition), AppError>
    where
        F: FnOnce(&mut AttendanceRecord) -> Result<Transition, AppError>,
    {
        let mut tx = self.pool.begin().await?;

        // (employee_id, date) is unique. The no-op update takes an exclusive
        // lock on an existing row, so concurrent actions for the same day
        // queue here instead of deadlocking on a shared lock upgrade.
        sqlx::query(
            "INSERT INTO attendance (employee_id, date) VALUES (?, ?) \
             ON DUPLICATE KEY UPDATE id = id",
        )
        .bind(employee_id)
        .bind(date)
        .execute(&mut *tx)
        .await?;

        let select_sql = format!(
            "SELECT {RECORD_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ? FOR UPDATE"
        );
        let mut record = sqlx::query_as::<_, AttendanceRecord>(&select_sql)
            .bind(employee_id)
            .bind(date)
            .fetch_one(&mut *tx)
            .await?;

        let transition = match apply(&mut record) {
            Ok(transition) => transition,
            Err(e) => {
                tx.rollback().await?;
                return Err(e);
            }
        };

        if transition.changed() {
            sqlx::query(
                r#"
                UPDATE attendance
                SET check_in = ?, check_out = ?, worked_seconds = ?, late = ?
                WHERE id = ?
                "#,
            )
            .bind(record.check_in)
            .bind(record.check_out)
            .bind(record.worked_seconds)
            .bind(record.late)
            .bind(record.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok((record, transition))
    }
}
