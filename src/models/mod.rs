pub mod ledger;
pub mod reference;
