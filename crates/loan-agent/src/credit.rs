//! Credit bureau collaborator

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::persona::PERSONAS;

/// Score and pre-approved limit for one applicant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditReport {
    /// Out of 900
    pub credit_score: u32,
    pub pre_approved_amount: u64,
}

/// Credit lookups by user id
pub trait CreditBureau: Send + Sync {
    fn credit_score(&self, user_id: u64) -> Result<u32>;

    fn pre_approved_amount(&self, user_id: u64) -> Result<u64>;

    /// Both lookups together
    fn report(&self, user_id: u64) -> Result<CreditReport> {
        Ok(CreditReport {
            credit_score: self.credit_score(user_id)?,
            pre_approved_amount: self.pre_approved_amount(user_id)?,
        })
    }
}

/// In-memory bureau keyed by user id
#[derive(Debug, Clone, Default)]
pub struct StaticCreditBureau {
    reports: HashMap<u64, CreditReport>,
}

impl StaticCreditBureau {
    pub fn new(reports: HashMap<u64, CreditReport>) -> Self {
        Self { reports }
    }

    /// Bureau answering for the built-in personas
    pub fn from_personas() -> Self {
        Self::new(
            PERSONAS
                .iter()
                .map(|p| {
                    (
                        p.user_id,
                        CreditReport {
                            credit_score: p.credit_score,
                            pre_approved_amount: p.pre_approved_amount,
                        },
                    )
                })
                .collect(),
        )
    }

    fn lookup(&self, user_id: u64) -> Result<&CreditReport> {
        self.reports
            .get(&user_id)
            .ok_or_else(|| Error::credit_lookup(user_id, "no bureau record"))
    }
}

impl CreditBureau for StaticCreditBureau {
    fn credit_score(&self, user_id: u64) -> Result<u32> {
        Ok(self.lookup(user_id)?.credit_score)
    }

    fn pre_approved_amount(&self, user_id: u64) -> Result<u64> {
        Ok(self.lookup(user_id)?.pre_approved_amount)
    }
}
