use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use thiserror::Error;

use super::persistence::{Record, RecordError};

/// Share of the current balance a savings account may release in one withdrawal.
const SAVINGS_WITHDRAWAL_SHARE: Decimal = dec!(0.8);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("Amount must be a positive number, got {0}")]
    InvalidAmount(Decimal),

    #[error("Insufficient balance! You cannot withdraw {requested}, only {available} is available")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },

    #[error(
        "Withdrawal amount {requested} exceeds 80% of balance in Savings Account (limit {})",
        .limit.normalize()
    )]
    LimitExceeded { requested: Decimal, limit: Decimal },

    #[error("Depositing {amount} would take the balance of {balance} past the largest representable amount")]
    BalanceOverflow { amount: Decimal, balance: Decimal },
}

type AccountResult<T> = Result<T, AccountError>;

/// Eight digit identifier handed out by the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountNumber(String);

impl AccountNumber {
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for AccountNumber {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountKind {
    /// A single withdrawal may take at most 80% of the balance.
    #[default]
    Savings,

    /// A single withdrawal may take the whole balance.
    Current,
}

impl AccountKind {
    /// The largest amount one withdrawal may take from `balance`.
    pub fn max_withdraw(self, balance: Decimal) -> Decimal {
        match self {
            AccountKind::Savings => balance * SAVINGS_WITHDRAWAL_SHARE,
            AccountKind::Current => balance,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            AccountKind::Savings => "savings",
            AccountKind::Current => "current",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "savings" => Ok(AccountKind::Savings),
            "current" => Ok(AccountKind::Current),
            other => Err(format!("unknown account kind '{other}' (expected savings or current)")),
        }
    }
}

/// Read-only projection returned by balance checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceView {
    pub account_number: AccountNumber,
    pub holder_name: String,
    pub balance: Decimal,
}

impl fmt::Display for BalanceView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Account Number: {}", self.account_number)?;
        writeln!(f, "Account Holder: {}", self.holder_name)?;
        write!(f, "Current Balance: {}", self.balance.normalize())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    number: AccountNumber,
    holder_name: String,
    /// Never negative: every withdrawal is checked against the kind's limit first
    balance: Decimal,
    kind: AccountKind,
}

impl Account {
    pub(crate) fn new(
        number: AccountNumber,
        holder_name: impl Into<String>,
        balance: Decimal,
        kind: AccountKind,
    ) -> Self {
        Self {
            number,
            holder_name: holder_name.into(),
            balance,
            kind,
        }
    }

    pub fn number(&self) -> &AccountNumber {
        &self.number
    }

    pub fn holder_name(&self) -> &str {
        &self.holder_name
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    /// Returns the new balance. The caller is responsible for persisting it.
    pub(crate) fn deposit(&mut self, amount: Decimal) -> AccountResult<Decimal> {
        if amount <= Decimal::ZERO {
            return Err(AccountError::InvalidAmount(amount));
        }

        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(AccountError::BalanceOverflow {
                amount,
                balance: self.balance,
            })?;
        Ok(self.balance)
    }

    /// Returns the new balance. The caller is responsible for persisting it.
    pub(crate) fn withdraw(&mut self, amount: Decimal) -> AccountResult<Decimal> {
        if amount <= Decimal::ZERO {
            return Err(AccountError::InvalidAmount(amount));
        }

        let limit = self.kind.max_withdraw(self.balance);
        if amount > limit {
            return Err(match self.kind {
                AccountKind::Savings => AccountError::LimitExceeded {
                    requested: amount,
                    limit,
                },
                AccountKind::Current => AccountError::InsufficientFunds {
                    requested: amount,
                    available: self.balance,
                },
            });
        }

        self.balance -= amount;
        Ok(self.balance)
    }

    pub fn display_balance(&self) -> BalanceView {
        BalanceView {
            account_number: self.number.clone(),
            holder_name: self.holder_name.clone(),
            balance: self.balance,
        }
    }
}

impl Record for Account {
    fn to_fields(&self) -> Vec<String> {
        let mut fields = vec![
            self.number.to_string(),
            self.holder_name.clone(),
            self.balance.normalize().to_string(),
        ];
        // Savings lines keep the three column layout older files use
        if self.kind != AccountKind::Savings {
            fields.push(self.kind.to_string());
        }
        fields
    }

    fn from_fields(fields: &csv::StringRecord) -> Result<Self, RecordError> {
        let (number, holder_name, balance) = match (fields.get(0), fields.get(1), fields.get(2)) {
            (Some(number), Some(holder_name), Some(balance)) => (number, holder_name, balance),
            _ => return Err(RecordError::MissingField { expected: 3, found: fields.len() }),
        };

        let balance = Decimal::from_str(balance.trim())
            .map_err(|e| RecordError::InvalidField { field: "balance", reason: e.to_string() })?;
        if balance < Decimal::ZERO {
            return Err(RecordError::InvalidField {
                field: "balance",
                reason: format!("{balance} is negative"),
            });
        }

        let kind = match fields.get(3) {
            Some(kind) if !kind.trim().is_empty() => kind
                .parse()
                .map_err(|reason| RecordError::InvalidField { field: "kind", reason })?,
            _ => AccountKind::Savings,
        };

        Ok(Account::new(AccountNumber::new(number), holder_name, balance, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::persistence::{decode_line, encode_line};
    use test_case::test_case;

    fn account(kind: AccountKind, balance: Decimal) -> Account {
        Account::new(AccountNumber::new("12345678"), "Alice", balance, kind)
    }

    #[test_case(AccountKind::Savings, dec!(100), dec!(80) ; "savings releases eighty percent")]
    #[test_case(AccountKind::Current, dec!(100), dec!(100) ; "current releases everything")]
    #[test_case(AccountKind::Savings, dec!(0), dec!(0) ; "empty savings")]
    fn max_withdraw_follows_kind(kind: AccountKind, balance: Decimal, expected: Decimal) {
        assert_eq!(kind.max_withdraw(balance), expected);
    }

    #[test_case(dec!(0) ; "zero")]
    #[test_case(dec!(-5) ; "negative")]
    fn deposit_rejects_non_positive_amounts(amount: Decimal) {
        let mut acc = account(AccountKind::Savings, dec!(10));
        assert_eq!(acc.deposit(amount), Err(AccountError::InvalidAmount(amount)));
        assert_eq!(acc.balance(), dec!(10));
    }

    #[test_case(AccountKind::Savings ; "savings")]
    #[test_case(AccountKind::Current ; "current")]
    fn withdraw_rejects_non_positive_amounts(kind: AccountKind) {
        let mut acc = account(kind, dec!(10));
        assert_eq!(acc.withdraw(dec!(0)), Err(AccountError::InvalidAmount(dec!(0))));
        assert_eq!(acc.withdraw(dec!(-1)), Err(AccountError::InvalidAmount(dec!(-1))));
        assert_eq!(acc.balance(), dec!(10));
    }

    #[test_case(Decimal::MAX, Decimal::ONE ; "one past the maximum")]
    #[test_case(Decimal::MAX - dec!(10), dec!(11) ; "near the maximum")]
    #[test_case(dec!(1), Decimal::MAX ; "maximum deposit")]
    fn deposit_overflow_leaves_balance(balance: Decimal, amount: Decimal) {
        let mut acc = account(AccountKind::Current, balance);
        assert_eq!(
            acc.deposit(amount),
            Err(AccountError::BalanceOverflow { amount, balance })
        );
        assert_eq!(acc.balance(), balance);
    }

    #[test]
    fn deposit_up_to_the_maximum_succeeds() {
        let mut acc = account(AccountKind::Current, Decimal::MAX - Decimal::ONE);
        assert_eq!(acc.deposit(Decimal::ONE), Ok(Decimal::MAX));
    }

    #[test]
    fn savings_withdrawal_boundary() {
        let mut acc = account(AccountKind::Savings, dec!(150));
        assert_eq!(
            acc.withdraw(dec!(120.01)),
            Err(AccountError::LimitExceeded {
                requested: dec!(120.01),
                limit: dec!(120)
            })
        );
        assert_eq!(acc.balance(), dec!(150));

        assert_eq!(acc.withdraw(dec!(120)), Ok(dec!(30)));
    }

    #[test]
    fn current_withdrawal_can_empty_the_account() {
        let mut acc = account(AccountKind::Current, dec!(75.5));
        assert_eq!(acc.withdraw(dec!(75.5)), Ok(dec!(0)));
        assert_eq!(
            acc.withdraw(dec!(0.01)),
            Err(AccountError::InsufficientFunds {
                requested: dec!(0.01),
                available: dec!(0)
            })
        );
    }

    #[test_case(AccountKind::Savings, dec!(40) ; "savings")]
    #[test_case(AccountKind::Current, dec!(100) ; "current")]
    fn deposit_then_withdraw_restores_balance(kind: AccountKind, amount: Decimal) {
        let mut acc = account(kind, dec!(100));
        acc.deposit(amount).unwrap();
        acc.withdraw(amount).unwrap();
        assert_eq!(acc.balance(), dec!(100));
    }

    #[test]
    fn display_balance_is_a_projection() {
        let acc = account(AccountKind::Savings, dec!(1500.50));
        let view = acc.display_balance();
        assert_eq!(view.balance, dec!(1500.5));
        assert_eq!(
            view.to_string(),
            "Account Number: 12345678\nAccount Holder: Alice\nCurrent Balance: 1500.5"
        );
    }

    #[test]
    fn savings_line_keeps_three_columns() {
        let acc = account(AccountKind::Savings, dec!(1500.50));
        assert_eq!(encode_line(&acc).unwrap(), "12345678,Alice,1500.5");
    }

    #[test]
    fn current_line_carries_kind() {
        let acc = account(AccountKind::Current, dec!(3));
        let line = encode_line(&acc).unwrap();
        assert_eq!(line, "12345678,Alice,3,current");
        assert_eq!(decode_line::<Account>(&line).unwrap(), acc);
    }

    #[test]
    fn decodes_fixed_point_balances() {
        let acc: Account = decode_line("87654321,Bob Smith,100.000000").unwrap();
        assert_eq!(acc.number(), "87654321");
        assert_eq!(acc.holder_name(), "Bob Smith");
        assert_eq!(acc.balance(), dec!(100));
        assert_eq!(acc.kind(), AccountKind::Savings);
    }

    #[test]
    fn holder_names_with_commas_survive() {
        let acc = Account::new(
            AccountNumber::new("11112222"),
            "Smith, Jane",
            dec!(1),
            AccountKind::Savings,
        );
        let line = encode_line(&acc).unwrap();
        assert_eq!(line, "11112222,\"Smith, Jane\",1");
        assert_eq!(decode_line::<Account>(&line).unwrap(), acc);
    }

    #[test]
    fn leading_quote_in_old_unescaped_line_is_read_as_quoting() {
        let acc: Account = decode_line("12345678,\"Bo\" Smith,5.000000").unwrap();
        assert_eq!(acc.holder_name(), "Bo Smith");
        assert_eq!(encode_line(&acc).unwrap(), "12345678,Bo Smith,5");
    }

    #[test_case("12345678,Alice" ; "missing balance")]
    #[test_case("12345678,Alice,lots" ; "unparsable balance")]
    #[test_case("12345678,Alice,-3" ; "negative balance")]
    #[test_case("12345678,Alice,3,checking" ; "unknown kind")]
    fn rejects_malformed_lines(line: &str) {
        assert!(decode_line::<Account>(line).is_err());
    }
}
