//! Business-rule validation for coerced POS report rows.
//!
//! [`BusinessRuleValidator`] runs the rules listed in a report profile.
//! [`build_report`] combines every issue recorded for a file with its
//! summary into a [`pos_model::ValidationReport`].

pub mod checks;
mod summary;
mod validator;

pub use checks::ACTUAL_AMOUNT;
pub use checks::balance::side_channel_income;
pub use summary::{FileContext, MEMBER_STORE_FIELD, build_report, summarize};
pub use validator::BusinessRuleValidator;
