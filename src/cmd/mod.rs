pub mod branches;
pub mod checkout;
