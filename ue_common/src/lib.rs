mod rupees;

pub mod op;

pub use rupees::{Rupees, RupeesConversionError, INR_CURRENCY_CODE, INR_CURRENCY_CODE_LOWER};
