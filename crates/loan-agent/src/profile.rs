//! Structured applicant profile built up from free-text messages

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What the assistant knows about the applicant.
///
/// Well-known fields are typed; anything else the extractor pulls out of a
/// message lands in `extra` so it is not lost.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    /// Monthly income
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_type: Option<String>,
    /// Tenure in months
    #[serde(
        default,
        alias = "tenure",
        alias = "tenure_months",
        skip_serializing_if = "Option::is_none"
    )]
    pub loan_tenure: Option<u32>,
    /// Annual interest rate in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_approved_amount: Option<u64>,
    /// Extracted attributes without a dedicated field
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl UserProfile {
    /// Build a profile from an extracted JSON object.
    ///
    /// Keys are matched case-insensitively with a few common aliases. Nulls
    /// are skipped so they never erase a known value on merge. Values that do
    /// not coerce to the field's type are kept verbatim in `extra`. Credit
    /// score and pre-approved amount are never taken from extraction.
    pub fn from_json_map(map: Map<String, Value>) -> Self {
        let mut profile = Self::default();
        for (raw_key, value) in map {
            if value.is_null() {
                continue;
            }
            let key = normalize_key(&raw_key);
            let applied = match key.as_str() {
                // Orchestration metadata, tracked on the conversation state.
                "credit_score_checked" => true,
                // Bureau-owned; only underwriting writes these.
                "credit_score" | "pre_approved_amount" => {
                    tracing::debug!(key = %raw_key, %value, "ignoring extracted credit field");
                    true
                }
                "name" | "full_name" | "customer_name" => set(&mut profile.name, text(&value)),
                "phone" | "phone_number" | "mobile" | "mobile_number" => {
                    set(&mut profile.phone, text(&value))
                }
                "email" | "email_address" => set(&mut profile.email, text(&value)),
                "user_id" | "userid" | "customer_id" => set(&mut profile.user_id, whole(&value)),
                "income" | "monthly_income" | "salary" | "monthly_salary" => {
                    set(&mut profile.income, amount(&value))
                }
                "employment_type" | "employment" | "occupation" => {
                    set(&mut profile.employment_type, text(&value))
                }
                "loan_amount" | "amount" | "principal" => set(&mut profile.loan_amount, amount(&value)),
                "loan_type" | "loan_purpose" => set(&mut profile.loan_type, text(&value)),
                "loan_tenure" | "tenure" | "tenure_months" | "loan_tenure_months" => {
                    set(&mut profile.loan_tenure, tenure_months(&value, 1))
                }
                "tenure_years" | "loan_tenure_years" => {
                    set(&mut profile.loan_tenure, tenure_months(&value, 12))
                }
                "interest_rate" | "rate" | "rate_of_interest" => {
                    set(&mut profile.interest_rate, amount(&value))
                }
                "property_value" => set(&mut profile.property_value, amount(&value)),
                _ => {
                    profile.extra.insert(key.clone(), value.clone());
                    true
                }
            };
            if !applied {
                tracing::debug!(key = %raw_key, %value, "profile value did not coerce, keeping as extra");
                profile.extra.insert(key, value);
            }
        }
        profile
    }

    /// Overlay `update` onto this profile. Fields the update leaves unset keep
    /// their current value.
    pub fn merge(&mut self, update: UserProfile) {
        overlay(&mut self.name, update.name);
        overlay(&mut self.phone, update.phone);
        overlay(&mut self.email, update.email);
        overlay(&mut self.user_id, update.user_id);
        overlay(&mut self.income, update.income);
        overlay(&mut self.employment_type, update.employment_type);
        overlay(&mut self.loan_amount, update.loan_amount);
        overlay(&mut self.loan_type, update.loan_type);
        overlay(&mut self.loan_tenure, update.loan_tenure);
        overlay(&mut self.interest_rate, update.interest_rate);
        overlay(&mut self.property_value, update.property_value);
        overlay(&mut self.credit_score, update.credit_score);
        overlay(&mut self.pre_approved_amount, update.pre_approved_amount);
        self.extra.extend(update.extra);
        self.prune_shadowed_extra();
    }

    /// Drop raw `extra` entries that a typed field now answers.
    fn prune_shadowed_extra(&mut self) {
        let typed = [
            ("name", self.name.is_some()),
            ("phone", self.phone.is_some()),
            ("email", self.email.is_some()),
            ("user_id", self.user_id.is_some()),
            ("income", self.income.is_some()),
            ("employment_type", self.employment_type.is_some()),
            ("loan_amount", self.loan_amount.is_some()),
            ("loan_type", self.loan_type.is_some()),
            ("loan_tenure", self.loan_tenure.is_some()),
            ("interest_rate", self.interest_rate.is_some()),
            ("property_value", self.property_value.is_some()),
            ("credit_score", self.credit_score.is_some()),
            ("pre_approved_amount", self.pre_approved_amount.is_some()),
        ];
        for (key, present) in typed {
            if present {
                self.extra.remove(key);
            }
        }
    }

    /// Non-mutating [`merge`](Self::merge)
    pub fn merged(&self, update: UserProfile) -> Self {
        let mut next = self.clone();
        next.merge(update);
        next
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Compact JSON, as fed back to the model
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Indented JSON for prompts and summaries
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

fn overlay<T>(slot: &mut Option<T>, update: Option<T>) {
    if update.is_some() {
        *slot = update;
    }
}

/// Store a coerced value; `false` means coercion failed.
fn set<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match value {
        Some(v) => {
            *slot = Some(v);
            true
        }
        None => false,
    }
}

fn normalize_key(key: &str) -> String {
    key.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

fn whole(value: &Value) -> Option<u64> {
    let v = amount(value)?;
    (v >= 0.0 && v.fract() == 0.0).then_some(v as u64)
}

fn tenure_months(value: &Value, default_scale: u32) -> Option<u32> {
    let (number, unit) = match value {
        Value::Number(n) => (n.as_f64()?, String::new()),
        Value::String(s) => split_number(&s.trim().to_lowercase())?,
        _ => return None,
    };
    let scale = match unit.as_str() {
        "" => default_scale,
        "m" | "mo" | "month" | "months" => 1,
        "y" | "yr" | "yrs" | "year" | "years" => 12,
        _ => return None,
    };
    let months = (number * f64::from(scale)).round();
    (months >= 0.0 && months <= f64::from(u32::MAX)).then_some(months as u32)
}

/// Parse a human-written amount such as `"₹5,00,000"`, `"5 lakh"`,
/// `"1.2 crore"`, `"50k"` or `"10.5%"`.
pub fn parse_amount(input: &str) -> Option<f64> {
    let cleaned = input.trim().to_lowercase().replace([',', '₹'], "");
    let cleaned = ["rs.", "rs", "inr"]
        .iter()
        .find_map(|prefix| cleaned.strip_prefix(prefix))
        .unwrap_or(&cleaned)
        .trim()
        .to_string();

    let (number, unit) = split_number(&cleaned)?;
    let scale = match unit.as_str() {
        "" => 1.0,
        "k" | "thousand" => 1e3,
        "l" | "lac" | "lacs" | "lakh" | "lakhs" => 1e5,
        "cr" | "crore" | "crores" => 1e7,
        u if u.starts_with('%') => 1.0,
        _ => return None,
    };
    Some(number * scale)
}

/// Split a leading decimal number from its trailing unit.
fn split_number(s: &str) -> Option<(f64, String)> {
    let end = s
        .char_indices()
        .find(|&(_, c)| !(c.is_ascii_digit() || c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let number = s[..end].parse::<f64>().ok()?;
    Some((number, s[end..].trim().to_string()))
}
