use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeductionKind {
    Personal,
    Donation,
    KReceipt,
}

impl DeductionKind {
    /// Name the deduction table is keyed by.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "Personal",
            Self::Donation => "Donation",
            Self::KReceipt => "K-Receipt",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Personal" => Some(Self::Personal),
            "Donation" => Some(Self::Donation),
            "K-Receipt" => Some(Self::KReceipt),
            _ => None,
        }
    }
}

/// Deduction policy as configured by an administrator.
///
/// `amount` is the cap applied to a matching claim (or the flat amount for
/// the personal deduction). `minimum_amount` and `maximum_amount` only bound
/// what `amount` may be set to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionPolicy {
    pub deduction_type: String,
    pub minimum_amount: Decimal,
    pub maximum_amount: Decimal,
    pub amount: Decimal,
}

impl DeductionPolicy {
    pub fn is_kind(&self, kind: DeductionKind) -> bool {
        self.deduction_type == kind.as_str()
    }

    /// The part of `claimed` this policy allows to be deducted.
    pub fn cap(&self, claimed: Decimal) -> Decimal {
        claimed.min(self.amount)
    }
}
