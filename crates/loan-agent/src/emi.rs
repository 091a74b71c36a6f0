//! Equated monthly installment arithmetic

use thiserror::Error;

use crate::profile::UserProfile;

/// Digest written when the inputs are missing or unusable
pub const EMI_UNAVAILABLE: &str = "Unable to calculate EMI. Please verify the loan details.";

/// Why an EMI could not be computed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmiError {
    #[error("missing {0}")]
    Missing(&'static str),

    #[error("invalid {field}: {value}")]
    Invalid { field: &'static str, value: f64 },
}

/// Validated calculator inputs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmiInputs {
    pub principal: f64,
    /// Annual rate in percent
    pub annual_rate: f64,
    pub tenure_months: u32,
}

impl EmiInputs {
    /// Pull loan amount, interest rate and tenure out of a profile
    pub fn from_profile(profile: &UserProfile) -> Result<Self, EmiError> {
        let principal = profile.loan_amount.ok_or(EmiError::Missing("loan_amount"))?;
        let annual_rate = profile
            .interest_rate
            .ok_or(EmiError::Missing("interest_rate"))?;
        let tenure_months = profile.loan_tenure.ok_or(EmiError::Missing("loan_tenure"))?;

        if !principal.is_finite() || principal <= 0.0 {
            return Err(EmiError::Invalid {
                field: "loan_amount",
                value: principal,
            });
        }
        if !annual_rate.is_finite() || annual_rate < 0.0 {
            return Err(EmiError::Invalid {
                field: "interest_rate",
                value: annual_rate,
            });
        }
        if tenure_months == 0 {
            return Err(EmiError::Invalid {
                field: "loan_tenure",
                value: 0.0,
            });
        }
        Ok(Self {
            principal,
            annual_rate,
            tenure_months,
        })
    }
}

/// Unrounded monthly installment for an amortized loan
pub fn monthly_installment(principal: f64, annual_rate: f64, tenure_months: u32) -> f64 {
    if tenure_months == 0 {
        return 0.0;
    }
    let n = f64::from(tenure_months);
    let r = annual_rate / 1200.0;
    if r == 0.0 {
        return principal / n;
    }
    let growth = (1.0 + r).powf(n);
    principal * r * growth / (growth - 1.0)
}

/// Installment with totals, in whole currency units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmiBreakdown {
    pub inputs: EmiInputs,
    pub emi: f64,
    pub total_payment: f64,
    pub total_interest: f64,
}

impl EmiBreakdown {
    pub fn calculate(inputs: EmiInputs) -> Self {
        let emi = monthly_installment(inputs.principal, inputs.annual_rate, inputs.tenure_months)
            .round();
        let total_payment = emi * f64::from(inputs.tenure_months);
        Self {
            inputs,
            emi,
            total_payment,
            total_interest: total_payment - inputs.principal,
        }
    }

    /// Fixed-layout summary for the sales prompt
    pub fn to_digest(&self) -> String {
        format!(
            "EMI calculation:\n\
             Loan amount: ₹{}\n\
             Interest rate: {}% p.a.\n\
             Tenure: {} months\n\
             Monthly EMI: ₹{}\n\
             Total payment: ₹{}\n\
             Total interest: ₹{}",
            format_amount(self.inputs.principal),
            self.inputs.annual_rate,
            self.inputs.tenure_months,
            format_amount(self.emi),
            format_amount(self.total_payment),
            format_amount(self.total_interest),
        )
    }
}

/// Whole-unit amount with thousands separators: `553728.4` -> `"553,728"`
pub fn format_amount(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
