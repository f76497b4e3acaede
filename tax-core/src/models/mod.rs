mod allowance;
mod deduction;
mod tax_bracket;
mod tax_request;
mod tax_result;

pub use allowance::AllowanceType;
pub use deduction::{DeductionKind, DeductionPolicy};
pub use tax_bracket::TaxBracket;
pub use tax_request::{AllowanceClaim, TaxRequest};
pub use tax_result::{Settlement, TaxLevel, TaxResult};
