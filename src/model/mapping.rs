use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid work order '{0}', expected XXXX-XXXXX-XXX (e.g., 1234-56789-001)")]
pub struct InvalidCostCenter(pub String);

/// Unit4 work order ("ArbAuft") a worklog is booked against.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CostCenterCode(String);

impl CostCenterCode {
    pub fn parse(s: &str) -> Result<Self, InvalidCostCenter> {
        let s = s.trim();
        let digits = |part: &str, len: usize| part.len() == len && part.bytes().all(|b| b.is_ascii_digit());
        let parts: Vec<&str> = s.split('-').collect();
        match parts.as_slice() {
            [a, b, c] if digits(a, 4) && digits(b, 5) && digits(c, 3) => Ok(Self(s.to_string())),
            _ => Err(InvalidCostCenter(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CostCenterCode {
    type Err = InvalidCostCenter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CostCenterCode {
    type Error = InvalidCostCenter;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CostCenterCode> for String {
    fn from(code: CostCenterCode) -> Self {
        code.0
    }
}

impl fmt::Display for CostCenterCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// One row of the mapping file, keyed by Tempo account id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMapping {
    #[serde(rename = "unit4_arbauft")]
    pub cost_center: CostCenterCode,
    /// Account name as shown in Tempo, kept for human review.
    #[serde(rename = "tempo_name", default)]
    pub display_name: String,
    /// A ticket the mapping was first seen on.
    #[serde(rename = "sample_ticket", default, skip_serializing_if = "Option::is_none")]
    pub sample_reference: Option<String>,
}
