use std::io::{BufRead, Write};
use std::str::FromStr;

use anyhow::Context;
use rust_decimal::Decimal;

use crate::features::{Access, AccountKind, Store};

const MENU: &str = "
1. Register
2. Login
3. Create Account
4. Deposit
5. Withdraw
6. Check Balance
7. Close Account
8. Logout
9. Exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Register,
    Login,
    CreateAccount,
    Deposit,
    Withdraw,
    CheckBalance,
    CloseAccount,
    Logout,
    Exit,
}

impl FromStr for Choice {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Choice::*;

        match s.trim().parse::<u8>().map_err(|_| ())? {
            1 => Ok(Register),
            2 => Ok(Login),
            3 => Ok(CreateAccount),
            4 => Ok(Deposit),
            5 => Ok(Withdraw),
            6 => Ok(CheckBalance),
            7 => Ok(CloseAccount),
            8 => Ok(Logout),
            9 => Ok(Exit),
            _ => Err(()),
        }
    }
}

/// Interactive front end over a [`Store`]. Reads one answer per line.
pub struct Menu<'a, R, W> {
    store: &'a mut Store,
    input: R,
    output: W,
    ask_account_kind: bool,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(store: &'a mut Store, input: R, output: W) -> Self {
        Self {
            store,
            input,
            output,
            ask_account_kind: false,
        }
    }

    /// Prompt for savings/current on every new account instead of using the configured kind.
    pub fn ask_account_kind(mut self, ask: bool) -> Self {
        self.ask_account_kind = ask;
        self
    }

    /// Runs until Exit is chosen or the input ends.
    pub fn run(&mut self) -> anyhow::Result<()> {
        loop {
            writeln!(self.output, "{MENU}")?;
            let line = match self.prompt("your choice")? {
                Some(line) => line,
                None => break,
            };

            let choice = match line.parse::<Choice>() {
                Ok(choice) => choice,
                Err(()) => {
                    writeln!(self.output, "Invalid choice! Please try again.")?;
                    continue;
                }
            };
            debug!("menu choice {choice:?}");

            let flow = match choice {
                Choice::Register => self.register()?,
                Choice::Login => self.login()?,
                Choice::CreateAccount => self.create_account()?,
                Choice::Deposit => self.deposit()?,
                Choice::Withdraw => self.withdraw()?,
                Choice::CheckBalance => self.check_balance()?,
                Choice::CloseAccount => self.close_account()?,
                Choice::Logout => {
                    self.store.logout();
                    writeln!(self.output, "Logged out successfully.")?;
                    Flow::Continue
                }
                Choice::Exit => Flow::Exit,
            };
            if flow == Flow::Exit {
                break;
            }
        }
        Ok(())
    }

    /// Writes `Enter {label}: ` and reads the trimmed answer. `None` at end of input.
    fn prompt(&mut self, label: &str) -> anyhow::Result<Option<String>> {
        write!(self.output, "Enter {label}: ")?;
        self.output.flush().context("failed to flush output")?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed to read input")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Prompts for a decimal amount, reporting text that does not parse.
    fn prompt_amount(&mut self, label: &str) -> anyhow::Result<Answer<Decimal>> {
        let text = match self.prompt(label)? {
            Some(text) => text,
            None => return Ok(Answer::Eof),
        };
        match Decimal::from_str(&text) {
            Ok(amount) => Ok(Answer::Value(amount)),
            Err(_) => {
                writeln!(self.output, "Error: '{text}' is not a valid amount.")?;
                Ok(Answer::Rejected)
            }
        }
    }

    fn denied(&mut self, access: Access) -> anyhow::Result<bool> {
        match self.store.check_access(access) {
            Ok(_) => Ok(false),
            Err(e) => {
                writeln!(self.output, "{e}")?;
                Ok(true)
            }
        }
    }

    fn register(&mut self) -> anyhow::Result<Flow> {
        let Some(username) = self.prompt("Username")? else {
            return Ok(Flow::Exit);
        };
        let Some(password) = self.prompt("Password")? else {
            return Ok(Flow::Exit);
        };
        let Some(role) = self.prompt("Role (admin/user)")? else {
            return Ok(Flow::Exit);
        };

        match self.store.register_user(&username, &password, &role) {
            Ok(()) => writeln!(self.output, "User registered successfully!")?,
            Err(e) => writeln!(self.output, "{e}")?,
        }
        Ok(Flow::Continue)
    }

    fn login(&mut self) -> anyhow::Result<Flow> {
        let Some(username) = self.prompt("Username")? else {
            return Ok(Flow::Exit);
        };
        let Some(password) = self.prompt("Password")? else {
            return Ok(Flow::Exit);
        };

        if self.store.login(&username, &password) {
            writeln!(self.output, "Login successful! Welcome, {username}.")?;
        } else {
            writeln!(self.output, "Login failed! Invalid username or password.")?;
        }
        Ok(Flow::Continue)
    }

    fn create_account(&mut self) -> anyhow::Result<Flow> {
        if self.denied(Access::CREATE_ACCOUNT)? {
            return Ok(Flow::Continue);
        }

        let Some(holder_name) = self.prompt("Account Holder Name")? else {
            return Ok(Flow::Exit);
        };
        let initial_balance = match self.prompt_amount("Initial Balance")? {
            Answer::Value(amount) => amount,
            Answer::Rejected => return Ok(Flow::Continue),
            Answer::Eof => return Ok(Flow::Exit),
        };
        let result = if self.ask_account_kind {
            let Some(answer) = self.prompt("Account Type (savings/current)")? else {
                return Ok(Flow::Exit);
            };
            match answer.parse::<AccountKind>() {
                Ok(kind) => self
                    .store
                    .create_account_of_kind(&holder_name, initial_balance, kind),
                Err(e) => {
                    writeln!(self.output, "Error: {e}")?;
                    return Ok(Flow::Continue);
                }
            }
        } else {
            self.store.create_account(&holder_name, initial_balance)
        };

        match result {
            Ok(number) => {
                writeln!(self.output, "Account created successfully!")?;
                writeln!(self.output, "Generated Account Number: {number}")?;
            }
            Err(e) => writeln!(self.output, "{e}")?,
        }
        Ok(Flow::Continue)
    }

    fn deposit(&mut self) -> anyhow::Result<Flow> {
        if self.denied(Access::Session)? {
            return Ok(Flow::Continue);
        }

        let Some(acc_num) = self.prompt("Account Number")? else {
            return Ok(Flow::Exit);
        };
        let amount = match self.prompt_amount("Deposit Amount")? {
            Answer::Value(amount) => amount,
            Answer::Rejected => return Ok(Flow::Continue),
            Answer::Eof => return Ok(Flow::Exit),
        };
        match self.store.deposit_to_account(&acc_num, amount) {
            Ok(balance) => writeln!(
                self.output,
                "Amount deposited: {}. Current balance: {}",
                amount.normalize(),
                balance.normalize()
            )?,
            Err(e) => writeln!(self.output, "Error: {e}")?,
        }
        Ok(Flow::Continue)
    }

    fn withdraw(&mut self) -> anyhow::Result<Flow> {
        if self.denied(Access::Session)? {
            return Ok(Flow::Continue);
        }

        let Some(acc_num) = self.prompt("Account Number")? else {
            return Ok(Flow::Exit);
        };
        let amount = match self.prompt_amount("Withdrawal Amount")? {
            Answer::Value(amount) => amount,
            Answer::Rejected => return Ok(Flow::Continue),
            Answer::Eof => return Ok(Flow::Exit),
        };
        match self.store.withdraw_from_account(&acc_num, amount) {
            Ok(balance) => writeln!(
                self.output,
                "Amount withdrawn: {}. Current balance: {}",
                amount.normalize(),
                balance.normalize()
            )?,
            Err(e) => writeln!(self.output, "Error: {e}")?,
        }
        Ok(Flow::Continue)
    }

    fn check_balance(&mut self) -> anyhow::Result<Flow> {
        if self.denied(Access::Session)? {
            return Ok(Flow::Continue);
        }

        let Some(acc_num) = self.prompt("Account Number")? else {
            return Ok(Flow::Exit);
        };
        match self.store.check_balance(&acc_num) {
            Ok(view) => writeln!(self.output, "{view}")?,
            Err(e) => writeln!(self.output, "{e}")?,
        }
        Ok(Flow::Continue)
    }

    fn close_account(&mut self) -> anyhow::Result<Flow> {
        if self.denied(Access::CLOSE_ACCOUNT)? {
            return Ok(Flow::Continue);
        }

        let Some(acc_num) = self.prompt("Account Number")? else {
            return Ok(Flow::Exit);
        };
        match self.store.close_account(&acc_num) {
            Ok(_) => writeln!(self.output, "Account closed successfully.")?,
            Err(e) => writeln!(self.output, "{e}")?,
        }
        Ok(Flow::Continue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

enum Answer<T> {
    Value(T),
    Rejected,
    Eof,
}
