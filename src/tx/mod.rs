//! Transaction pipeline: build, nonce, sign and submit

mod builder;
mod nonce;
mod submitter;

pub use builder::{build_id, Transaction, TransactionBuilder};
pub use nonce::NonceResolver;
pub use submitter::{
    Registration, TransactionSubmitter, REGISTER_WALLET_ACTION, REGISTER_WALLET_TYPE,
};
