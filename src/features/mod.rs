mod account;
mod account_number;
mod persistence;
mod store;
mod user;

pub use self::{
    account::{Account, AccountError, AccountKind, AccountNumber, BalanceView},
    account_number::generate_account_number,
    persistence::{PersistenceError, RecordError, WriteMode},
    store::{Access, Store, StoreConfig, StoreError, StoreResult, ACCOUNTS_FILE, USERS_FILE},
    user::{Role, User},
};
