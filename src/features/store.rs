use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::prelude::*;
use thiserror::Error;

use super::{
    account::{Account, AccountError, AccountKind, AccountNumber, BalanceView},
    account_number::generate_account_number,
    persistence::{read_records, write_records, PersistenceError, WriteMode},
    user::{Role, User},
};

pub const ACCOUNTS_FILE: &str = "accounts.txt";
pub const USERS_FILE: &str = "users.txt";

/// Seeded into an empty users file so a fresh install can log in.
/// Well known credentials: change the password after first start.
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// What a caller lacked when an operation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Session,
    Admin { action: &'static str },
}

impl Access {
    pub const CREATE_ACCOUNT: Access = Access::Admin {
        action: "create accounts",
    };
    pub const CLOSE_ACCOUNT: Access = Access::Admin {
        action: "close accounts",
    };
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Session => f.write_str("Please login first."),
            Access::Admin { action } => write!(f, "Only admins can {action}."),
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Account(#[from] AccountError),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Username '{0}' already exists! Please choose a different username.")]
    UsernameTaken(String),

    #[error("Invalid role '{0}'! Role must be 'admin' or 'user'.")]
    InvalidRole(String),

    #[error("Unauthorized! {0}")]
    Unauthorized(Access),

    #[error("Changes were not saved: {0}")]
    Persistence(#[from] PersistenceError),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the accounts and users files
    pub data_dir: PathBuf,
    /// Kind given to accounts opened through [`Store::create_account`]
    pub account_kind: AccountKind,
    pub write_mode: WriteMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            account_kind: AccountKind::Savings,
            write_mode: WriteMode::Overwrite,
        }
    }
}

/// Owns every account and user, and the current session.
/// Each successful mutation is written back to disk before it returns.
#[derive(Debug)]
pub struct Store {
    config: StoreConfig,
    /// Kept in creation order, which is also file order
    accounts: Vec<Account>,
    users: BTreeMap<String, User>,
    /// Username of the logged in user
    session: Option<String>,
    rng: StdRng,
}

impl Store {
    /// Builds a store and loads both files from `config.data_dir`.
    pub fn open(config: StoreConfig) -> Result<Self, PersistenceError> {
        Self::open_with_rng(config, StdRng::from_entropy())
    }

    pub fn open_with_rng(config: StoreConfig, rng: StdRng) -> Result<Self, PersistenceError> {
        let mut store = Self {
            config,
            accounts: Vec::new(),
            users: BTreeMap::new(),
            session: None,
            rng,
        };
        store.load_accounts()?;
        store.load_users()?;
        Ok(store)
    }

    fn accounts_path(&self) -> PathBuf {
        self.config.data_dir.join(ACCOUNTS_FILE)
    }

    fn users_path(&self) -> PathBuf {
        self.config.data_dir.join(USERS_FILE)
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    pub fn load_accounts(&mut self) -> Result<(), PersistenceError> {
        let path = self.accounts_path();
        self.accounts = read_records(&path)?.unwrap_or_default();
        info!("loaded {} accounts from {}", self.accounts.len(), path.display());
        Ok(())
    }

    /// Loads users, seeding the default admin when the file does not exist yet.
    pub fn load_users(&mut self) -> Result<(), PersistenceError> {
        let path = self.users_path();
        match read_records::<User>(&path)? {
            Some(users) => {
                self.users = users
                    .into_iter()
                    .map(|user| (user.username().to_string(), user))
                    .collect();
                info!("loaded {} users from {}", self.users.len(), path.display());
            }
            None => {
                warn!(
                    "no users file at {}, creating default '{DEFAULT_ADMIN_USERNAME}' user",
                    path.display()
                );
                let admin = User::new(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD, Role::Admin);
                self.users = BTreeMap::from([(DEFAULT_ADMIN_USERNAME.to_string(), admin)]);
                // The admin stays usable for this run even if it cannot be written
                if let Err(e) = self.save_users() {
                    warn!("default admin was not saved: {e}");
                }
            }
        }
        Ok(())
    }

    pub fn save_accounts(&self) -> Result<(), PersistenceError> {
        write_records(&self.accounts_path(), &self.accounts, self.config.write_mode)
    }

    pub fn save_users(&self) -> Result<(), PersistenceError> {
        write_records(&self.users_path(), self.users.values(), self.config.write_mode)
    }

    pub fn register_user(&mut self, username: &str, password: &str, role: &str) -> StoreResult<()> {
        if self.users.contains_key(username) {
            return Err(StoreError::UsernameTaken(username.to_string()));
        }
        let role: Role = role.parse().map_err(StoreError::InvalidRole)?;

        self.users
            .insert(username.to_string(), User::new(username, password, role));
        if let Err(e) = self.save_users() {
            self.users.remove(username);
            return Err(e.into());
        }

        info!("registered {role} '{username}'");
        Ok(())
    }

    /// Starts a session for `username` if the password matches.
    pub fn login(&mut self, username: &str, password: &str) -> bool {
        match self.users.get(username) {
            Some(user) if user.authenticate(password) => {
                info!("'{username}' logged in");
                self.session = Some(username.to_string());
                true
            }
            _ => {
                warn!("failed login attempt for '{username}'");
                false
            }
        }
    }

    pub fn logout(&mut self) {
        if let Some(username) = self.session.take() {
            info!("'{username}' logged out");
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session
            .as_deref()
            .and_then(|username| self.users.get(username))
    }

    /// Checks the session against `access` without doing anything else.
    pub fn check_access(&self, access: Access) -> StoreResult<&User> {
        match (access, self.current_user()) {
            (Access::Session, Some(user)) => Ok(user),
            (Access::Admin { .. }, Some(user)) if user.is_admin() => Ok(user),
            (_, user) => {
                warn!(
                    "refused {} access to {}",
                    match access {
                        Access::Session => "session",
                        Access::Admin { .. } => "admin",
                    },
                    user.map_or("anonymous caller", User::username)
                );
                Err(StoreError::Unauthorized(access))
            }
        }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn account(&self, acc_num: &str) -> Option<&Account> {
        self.accounts.iter().find(|account| account.number() == acc_num)
    }

    fn position(&self, acc_num: &str) -> StoreResult<usize> {
        self.accounts
            .iter()
            .position(|account| account.number() == acc_num)
            .ok_or_else(|| StoreError::AccountNotFound(acc_num.to_string()))
    }

    /// Opens an account of the configured kind. Admin only.
    pub fn create_account(&mut self, holder_name: &str, initial_balance: Decimal) -> StoreResult<AccountNumber> {
        self.create_account_of_kind(holder_name, initial_balance, self.config.account_kind)
    }

    pub fn create_account_of_kind(
        &mut self,
        holder_name: &str,
        initial_balance: Decimal,
        kind: AccountKind,
    ) -> StoreResult<AccountNumber> {
        self.check_access(Access::CREATE_ACCOUNT)?;
        if initial_balance < Decimal::ZERO {
            return Err(AccountError::InvalidAmount(initial_balance).into());
        }

        let number = generate_account_number(&mut self.rng, &self.accounts);
        self.accounts.push(Account::new(
            number.clone(),
            holder_name,
            initial_balance,
            kind,
        ));
        if let Err(e) = self.save_accounts() {
            self.accounts.pop();
            return Err(e.into());
        }

        info!("opened {kind} account {number} for '{holder_name}'");
        Ok(number)
    }

    /// Applies `op` to one account and saves, restoring the old account if the save fails.
    fn update_account<F>(&mut self, acc_num: &str, op: F) -> StoreResult<Decimal>
    where
        F: FnOnce(&mut Account) -> Result<Decimal, AccountError>,
    {
        self.check_access(Access::Session)?;
        let index = self.position(acc_num)?;

        let before = self.accounts[index].clone();
        let balance = op(&mut self.accounts[index])?;
        if let Err(e) = self.save_accounts() {
            self.accounts[index] = before;
            return Err(e.into());
        }
        Ok(balance)
    }

    /// Returns the balance after the deposit.
    pub fn deposit_to_account(&mut self, acc_num: &str, amount: Decimal) -> StoreResult<Decimal> {
        let balance = self.update_account(acc_num, |account| account.deposit(amount))?;
        info!("deposited {amount} into {acc_num}");
        Ok(balance)
    }

    /// Returns the balance after the withdrawal.
    pub fn withdraw_from_account(&mut self, acc_num: &str, amount: Decimal) -> StoreResult<Decimal> {
        let balance = self.update_account(acc_num, |account| account.withdraw(amount))?;
        info!("withdrew {amount} from {acc_num}");
        Ok(balance)
    }

    pub fn check_balance(&self, acc_num: &str) -> StoreResult<BalanceView> {
        self.check_access(Access::Session)?;
        let index = self.position(acc_num)?;
        Ok(self.accounts[index].display_balance())
    }

    /// Removes the account and returns it. Admin only.
    pub fn close_account(&mut self, acc_num: &str) -> StoreResult<Account> {
        self.check_access(Access::CLOSE_ACCOUNT)?;
        let index = self.position(acc_num)?;

        let closed = self.accounts.remove(index);
        if let Err(e) = self.save_accounts() {
            self.accounts.insert(index, closed);
            return Err(e.into());
        }

        info!("closed account {acc_num}");
        Ok(closed)
    }
}
