//! Wallet accounts

pub mod wallet;

pub use wallet::Wallet;
