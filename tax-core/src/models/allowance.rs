use super::DeductionKind;

/// Allowance categories a taxpayer may claim on top of the personal
/// deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllowanceType {
    Donation,
    KReceipt,
}

impl AllowanceType {
    /// Lower-case request spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Donation => "donation",
            Self::KReceipt => "k-receipt",
        }
    }

    /// Case-insensitive parse of the request spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "donation" => Some(Self::Donation),
            "k-receipt" => Some(Self::KReceipt),
            _ => None,
        }
    }

    /// The deduction policy that caps this allowance.
    pub fn deduction_kind(&self) -> DeductionKind {
        match self {
            Self::Donation => DeductionKind::Donation,
            Self::KReceipt => DeductionKind::KReceipt,
        }
    }
}
