// Plan-derived quota enforcement for resource creation.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::OwnedMutexGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionPlan {
    Free,
    Pro,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "FREE",
            SubscriptionPlan::Pro => "PRO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FREE" => Some(SubscriptionPlan::Free),
            "PRO" => Some(SubscriptionPlan::Pro),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error(
        "Note limit reached. FREE plan allows maximum {limit} notes per user. \
         Upgrade to PRO for unlimited notes."
    )]
    LimitExceeded { limit: i64 },
    #[error("unrecognized subscription plan '{0}'")]
    UnrecognizedPlan(String),
}

/// Decides whether a tenant/user may create another resource, and serializes
/// admission per (tenant, user) so the cap holds under concurrent creates.
pub struct QuotaEnforcer {
    free_note_limit: i64,
    admissions: Mutex<HashMap<(i64, i64), Arc<tokio::sync::Mutex<()>>>>,
}

impl QuotaEnforcer {
    pub fn new(free_note_limit: i64) -> Self {
        Self {
            free_note_limit,
            admissions: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the admission lock for one (tenant, user) key. The caller
    /// holds the guard across its count-then-create unit of work; without it
    /// two concurrent creates could both observe `count - 1` and both pass.
    pub async fn admission(&self, tenant_id: i64, user_id: i64) -> OwnedMutexGuard<()> {
        let slot = {
            let mut admissions = self.admissions.lock().expect("admission registry poisoned");
            admissions
                .entry((tenant_id, user_id))
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        slot.lock_owned().await
    }

    /// Admit or reject a creation given the tenant's stored plan and the
    /// current usage count for the plan's enforcement scope (per-user for
    /// FREE). Unknown plan text fails closed.
    pub fn check(&self, plan: &str, current_count: i64) -> Result<(), QuotaError> {
        match SubscriptionPlan::parse(plan) {
            Some(SubscriptionPlan::Free) => {
                if current_count < self.free_note_limit {
                    Ok(())
                } else {
                    Err(QuotaError::LimitExceeded {
                        limit: self.free_note_limit,
                    })
                }
            }
            Some(SubscriptionPlan::Pro) => Ok(()),
            None => Err(QuotaError::UnrecognizedPlan(plan.to_string())),
        }
    }
}
