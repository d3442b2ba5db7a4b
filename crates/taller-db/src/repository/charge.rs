//! # Repair-Intake Charges
//!
//! A charge is opened when a device enters the shop. The deposit
//! (anticipo) is usually collected before the technician has quoted the
//! work, so the estimate is nullable and the balance is recomputed when
//! the quote lands.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  intake          create(deposit, estimate: None)   balance = 0      │
//! │     │                                                               │
//! │     ▼                                                               │
//! │  quote ready     set_estimate(id, estimate)                         │
//! │                  rejects estimate < deposit                         │
//! │                  balance = max(0, estimate − deposit)               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! When the estimate is already known at intake, `create` enforces the
//! same bound as checkout: the deposit may never exceed what is owed.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, EngineResult};
use taller_core::{CoreError, Money, NewRepairCharge, RepairCharge, ValidationError};

/// Repository for repair-intake charges.
#[derive(Debug, Clone)]
pub struct ChargeRepository {
    pool: SqlitePool,
}

const CHARGE_COLUMNS: &str = "id, client_ref, device_ref, estimate_cents, deposit_cents, \
     balance_cents, payment_method, created_at, updated_at";

impl ChargeRepository {
    /// Creates a new ChargeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ChargeRepository { pool }
    }

    /// Opens a charge at device intake.
    ///
    /// With an estimate present, rejects `deposit > estimate` before
    /// writing anything. Without one, any non-negative deposit is accepted
    /// and the balance stays zero until [`set_estimate`] runs.
    ///
    /// [`set_estimate`]: ChargeRepository::set_estimate
    pub async fn create(&self, new: &NewRepairCharge) -> EngineResult<RepairCharge> {
        if new.deposit_cents < 0 {
            return Err(CoreError::from(ValidationError::MustBeNonNegative {
                field: "deposit".to_string(),
            })
            .into());
        }

        if let Some(estimate) = new.estimate_cents {
            if estimate < 0 {
                return Err(CoreError::from(ValidationError::MustBeNonNegative {
                    field: "estimate".to_string(),
                })
                .into());
            }
            if new.deposit_cents > estimate {
                return Err(CoreError::InvalidDeposit {
                    deposit_cents: new.deposit_cents,
                    total_cents: estimate,
                }
                .into());
            }
        }

        let now = Utc::now();
        let balance_cents = match new.estimate_cents {
            Some(estimate) => Money::from_cents(estimate)
                .sub_clamped(Money::from_cents(new.deposit_cents))
                .cents(),
            None => 0,
        };

        let charge = RepairCharge {
            id: Uuid::new_v4().to_string(),
            client_ref: new.client_ref.clone(),
            device_ref: new.device_ref.clone(),
            estimate_cents: new.estimate_cents,
            deposit_cents: new.deposit_cents,
            balance_cents,
            payment_method: new.payment_method,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %charge.id, deposit = %charge.deposit_cents, "Opening repair charge");

        sqlx::query(
            r#"
            INSERT INTO repair_charges (
                id, client_ref, device_ref, estimate_cents, deposit_cents,
                balance_cents, payment_method, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&charge.id)
        .bind(&charge.client_ref)
        .bind(&charge.device_ref)
        .bind(charge.estimate_cents)
        .bind(charge.deposit_cents)
        .bind(charge.balance_cents)
        .bind(charge.payment_method)
        .bind(charge.created_at)
        .bind(charge.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(charge)
    }

    /// Records the repair quote and recomputes the balance.
    ///
    /// Rejects an estimate below the deposit already collected - the shop
    /// does not owe refunds through this flow.
    pub async fn set_estimate(&self, id: &str, estimate_cents: i64) -> EngineResult<RepairCharge> {
        if estimate_cents < 0 {
            return Err(CoreError::from(ValidationError::MustBeNonNegative {
                field: "estimate".to_string(),
            })
            .into());
        }

        let current = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("RepairCharge", id))?;

        if estimate_cents < current.deposit_cents {
            return Err(CoreError::InvalidEstimate {
                estimate_cents,
                deposit_cents: current.deposit_cents,
            }
            .into());
        }

        let balance_cents = Money::from_cents(estimate_cents)
            .sub_clamped(Money::from_cents(current.deposit_cents))
            .cents();
        let now = Utc::now();

        debug!(id = %id, estimate = %estimate_cents, balance = %balance_cents, "Setting repair estimate");

        sqlx::query(
            r#"
            UPDATE repair_charges
            SET estimate_cents = ?2, balance_cents = ?3, updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(estimate_cents)
        .bind(balance_cents)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(RepairCharge {
            estimate_cents: Some(estimate_cents),
            balance_cents,
            updated_at: now,
            ..current
        })
    }

    /// Gets a charge by ID.
    pub async fn get_by_id(&self, id: &str) -> EngineResult<Option<RepairCharge>> {
        let charge = sqlx::query_as::<_, RepairCharge>(&format!(
            "SELECT {CHARGE_COLUMNS} FROM repair_charges WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(charge)
    }

    /// Lists the most recent charges.
    pub async fn list_recent(&self, limit: u32) -> EngineResult<Vec<RepairCharge>> {
        let charges = sqlx::query_as::<_, RepairCharge>(&format!(
            "SELECT {CHARGE_COLUMNS} FROM repair_charges ORDER BY created_at DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(charges)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::pool::{Database, DbConfig};
    use taller_core::PaymentMethod;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn intake(deposit_cents: i64, estimate_cents: Option<i64>) -> NewRepairCharge {
        NewRepairCharge {
            client_ref: Some("cliente-42".to_string()),
            device_ref: Some("iPhone 12 pantalla rota".to_string()),
            estimate_cents,
            deposit_cents,
            payment_method: PaymentMethod::Cash,
        }
    }

    #[tokio::test]
    async fn test_deposit_only_intake() {
        let db = test_db().await;
        let charges = db.charges();

        // $150.00 anticipo, no quote yet
        let charge = charges.create(&intake(15_000, None)).await.unwrap();
        assert_eq!(charge.deposit_cents, 15_000);
        assert_eq!(charge.estimate_cents, None);
        assert_eq!(charge.balance_cents, 0);

        let stored = charges.get_by_id(&charge.id).await.unwrap().unwrap();
        assert_eq!(stored.balance_cents, 0);
    }

    #[tokio::test]
    async fn test_set_estimate_recomputes_balance() {
        let db = test_db().await;
        let charges = db.charges();

        let charge = charges.create(&intake(15_000, None)).await.unwrap();
        let updated = charges.set_estimate(&charge.id, 60_000).await.unwrap();

        assert_eq!(updated.estimate_cents, Some(60_000));
        assert_eq!(updated.balance_cents, 45_000);

        let stored = charges.get_by_id(&charge.id).await.unwrap().unwrap();
        assert_eq!(stored.balance_cents, 45_000);
    }

    #[tokio::test]
    async fn test_estimate_below_deposit_rejected() {
        let db = test_db().await;
        let charges = db.charges();

        let charge = charges.create(&intake(15_000, None)).await.unwrap();
        let err = charges.set_estimate(&charge.id, 10_000).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected(CoreError::InvalidEstimate { .. })
        ));

        // Balance untouched
        let stored = charges.get_by_id(&charge.id).await.unwrap().unwrap();
        assert_eq!(stored.estimate_cents, None);
        assert_eq!(stored.balance_cents, 0);
    }

    #[tokio::test]
    async fn test_quoted_intake_enforces_deposit_bound() {
        let db = test_db().await;
        let charges = db.charges();

        let err = charges
            .create(&intake(70_000, Some(60_000)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected(CoreError::InvalidDeposit { .. })
        ));

        // Within bound: balance derived immediately
        let charge = charges.create(&intake(15_000, Some(60_000))).await.unwrap();
        assert_eq!(charge.balance_cents, 45_000);
    }

    #[tokio::test]
    async fn test_set_estimate_unknown_charge() {
        let db = test_db().await;
        let err = db.charges().set_estimate("ghost", 1000).await.unwrap_err();
        assert!(matches!(err, EngineError::Db(DbError::NotFound { .. })));
    }
}
