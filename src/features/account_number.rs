use rand::Rng;

use super::account::{Account, AccountNumber};

const LOWEST: u32 = 10_000_000;
const HIGHEST: u32 = 99_999_999;

/// Draws eight digit numbers until one is not used by any of `accounts`.
pub fn generate_account_number<R: Rng + ?Sized>(rng: &mut R, accounts: &[Account]) -> AccountNumber {
    loop {
        let candidate = rng.gen_range(LOWEST..=HIGHEST).to_string();
        if accounts.iter().all(|account| account.number() != candidate.as_str()) {
            return AccountNumber::new(candidate);
        }
        trace!("account number {candidate} already taken, drawing again");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::account::AccountKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal::Decimal;
    use std::collections::HashSet;

    #[test]
    fn numbers_have_eight_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let number = generate_account_number(&mut rng, &[]);
            assert_eq!(number.as_str().len(), 8);
            assert!(number.as_str().chars().all(|c| c.is_ascii_digit()));
            assert!(!number.as_str().starts_with('0'));
        }
    }

    #[test]
    fn never_repeats_an_existing_number() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut accounts = Vec::new();
        let mut seen = HashSet::new();

        for _ in 0..1000 {
            let number = generate_account_number(&mut rng, &accounts);
            assert!(seen.insert(number.clone()), "{number} was handed out twice");
            accounts.push(Account::new(number, "holder", Decimal::ZERO, AccountKind::Savings));
        }
    }

    #[test]
    fn skips_colliding_draws() {
        let seed = 3;
        let first = generate_account_number(&mut StdRng::seed_from_u64(seed), &[]);
        let taken = vec![Account::new(first.clone(), "holder", Decimal::ZERO, AccountKind::Current)];

        let second = generate_account_number(&mut StdRng::seed_from_u64(seed), &taken);
        assert_ne!(first, second);
    }
}
