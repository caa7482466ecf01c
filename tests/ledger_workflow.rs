//! End to end runs against a real data directory, including restarts.

use std::fs;

use bank_ledger::features::{
    AccountError, AccountKind, Store, StoreConfig, StoreError, ACCOUNTS_FILE, USERS_FILE,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal_macros::dec;
use tempfile::TempDir;

fn open(dir: &TempDir, seed: u64) -> Store {
    let config = StoreConfig {
        data_dir: dir.path().to_path_buf(),
        ..StoreConfig::default()
    };
    Store::open_with_rng(config, StdRng::seed_from_u64(seed)).unwrap()
}

/// Fresh install → admin opens an account → a plain user operates it → restart
#[test]
fn test_full_workflow_survives_restart() {
    let dir = TempDir::new().unwrap();

    // 1. First start seeds the admin
    let mut store = open(&dir, 1);
    assert_eq!(
        fs::read_to_string(dir.path().join(USERS_FILE)).unwrap(),
        "admin,admin123,admin\n"
    );

    // 2. Admin registers a teller and opens an account
    assert!(store.login("admin", "admin123"));
    store.register_user("teller", "t3ller", "user").unwrap();
    let number = store.create_account("Alice", dec!(100)).unwrap();
    store.logout();

    // 3. Teller moves money
    assert!(store.login("teller", "t3ller"));
    assert_eq!(store.deposit_to_account(number.as_str(), dec!(50)).unwrap(), dec!(150));
    assert!(matches!(
        store.withdraw_from_account(number.as_str(), dec!(121)),
        Err(StoreError::Account(AccountError::LimitExceeded { .. }))
    ));
    assert_eq!(store.withdraw_from_account(number.as_str(), dec!(120)).unwrap(), dec!(30));
    drop(store);

    assert_eq!(
        fs::read_to_string(dir.path().join(ACCOUNTS_FILE)).unwrap(),
        format!("{number},Alice,30\n")
    );

    // 4. Restart: state comes back from disk, session does not
    let mut store = open(&dir, 2);
    assert!(store.current_user().is_none());
    assert!(store.login("teller", "t3ller"));
    let view = store.check_balance(number.as_str()).unwrap();
    assert_eq!(view.holder_name, "Alice");
    assert_eq!(view.balance, dec!(30));
    assert_eq!(store.account(number.as_str()).unwrap().kind(), AccountKind::Savings);

    // 5. Only the admin may close it
    assert!(matches!(
        store.close_account(number.as_str()),
        Err(StoreError::Unauthorized(_))
    ));
    store.logout();
    assert!(store.login("admin", "admin123"));
    store.close_account(number.as_str()).unwrap();
    drop(store);

    let store = open(&dir, 3);
    assert!(store.accounts().is_empty());
}

#[test]
fn test_existing_users_file_is_not_reseeded() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(USERS_FILE), "boss,hunter2,admin\n").unwrap();

    let mut store = open(&dir, 1);
    assert!(!store.login("admin", "admin123"));
    assert!(store.login("boss", "hunter2"));
    assert_eq!(
        fs::read_to_string(dir.path().join(USERS_FILE)).unwrap(),
        "boss,hunter2,admin\n"
    );
}
