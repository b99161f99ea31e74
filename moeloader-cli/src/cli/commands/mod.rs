pub mod account;
pub mod search;
pub mod suggest;
