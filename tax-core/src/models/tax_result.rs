use rust_decimal::Decimal;

/// Outcome of netting computed tax against withholding. Exactly one of the
/// two amounts exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Tax still owed (may be zero).
    Due(Decimal),
    /// Withholding exceeded the computed tax by this (positive) amount.
    Refund(Decimal),
}

impl Settlement {
    /// `total_tax - wht`; a negative balance becomes a refund.
    pub fn reconcile(
        total_tax: Decimal,
        wht: Decimal,
    ) -> Self {
        let net = total_tax - wht;
        if net < Decimal::ZERO {
            Self::Refund(-net)
        } else {
            Self::Due(net)
        }
    }

    pub fn tax(&self) -> Decimal {
        match self {
            Self::Due(amount) => *amount,
            Self::Refund(_) => Decimal::ZERO,
        }
    }

    pub fn tax_refund(&self) -> Decimal {
        match self {
            Self::Due(_) => Decimal::ZERO,
            Self::Refund(amount) => *amount,
        }
    }

    /// Signed balance: positive when due, negative when refunded.
    pub fn net(&self) -> Decimal {
        self.tax() - self.tax_refund()
    }
}

/// Tax attributed to one bracket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxLevel {
    pub label: String,
    pub tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxResult {
    /// Income after personal and allowance deductions. May be zero or negative.
    pub taxable_income: Decimal,
    /// Sum of all bracket contributions, before withholding.
    pub total_tax: Decimal,
    pub settlement: Settlement,
    /// One entry per bracket, in schedule order.
    pub levels: Vec<TaxLevel>,
}

impl TaxResult {
    /// Tax still owed after withholding; zero when refunded.
    pub fn tax(&self) -> Decimal {
        self.settlement.tax()
    }

    /// Withholding returned to the taxpayer; zero when tax is due.
    pub fn tax_refund(&self) -> Decimal {
        self.settlement.tax_refund()
    }
}
