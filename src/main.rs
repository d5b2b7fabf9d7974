use std::error::Error;
use std::io;
use std::process;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rusty_ledger::config::{AccountArgs, CliArgs, Command, Config, ManagerArgs, Role, StaffCommand};
use rusty_ledger::{Account, AccountUpdate, RecordStore};

fn main() {
    let cli = CliArgs::parse();
    let config = Config::load(&cli);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();

    if let Err(err) = run(cli.command, &config) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn run(command: Command, config: &Config) -> Result<(), Box<dyn Error>> {
    tracing::debug!(path = %config.store.path.display(), "opening ledger");
    let mut store = RecordStore::open_file(&config.store.path, config.manager_credentials())?;

    match command {
        Command::Create {
            name,
            age,
            email,
            pin,
        } => {
            let account = store.create_account(&name, age, &email, pin)?;
            println!("Account created. Please note down your account number.");
            print_account(&account);
        }
        Command::Deposit {
            account: AccountArgs { account, pin },
            amount,
        } => {
            let balance = store.deposit(&account, pin, amount)?;
            println!("Deposited {}. New balance: {}", amount, balance);
        }
        Command::Withdraw {
            account: AccountArgs { account, pin },
            amount,
        } => {
            let balance = store.withdraw(&account, pin, amount)?;
            println!("Withdrew {}. New balance: {}", amount, balance);
        }
        Command::Details {
            account: AccountArgs { account, pin },
        } => print_account(store.get_details(&account, pin)?),
        Command::Update {
            account,
            name,
            email,
            pin,
            age,
        } => {
            let updated = store.update_account(
                &account,
                AccountUpdate {
                    name,
                    email,
                    pin,
                    age,
                },
            )?;
            println!("Account updated.");
            print_account(&updated);
        }
        Command::Delete {
            account: AccountArgs { account, pin },
        } => {
            store.delete_account(&account, pin)?;
            println!("Account {} deleted.", account);
        }
        Command::Remove { account, manager } => {
            require_manager(&store, &manager)?;
            store.remove_account(&account)?;
            println!("Account {} removed.", account);
        }
        Command::ResetPin {
            account,
            old_pin,
            new_pin,
        } => {
            store.reset_pin(&account, old_pin, new_pin)?;
            println!("PIN updated.");
        }
        Command::Search { name, account } => {
            let mut found = 0;
            for account in store.search(name.as_deref(), account.as_deref()) {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    account.number, account.name, account.age, account.email, account.balance
                );
                found += 1;
            }
            if found == 0 {
                println!("No matching accounts.");
            }
        }
        Command::Export => rusty_ledger::export(&store, io::stdout())?,
        Command::Batch { input } => rusty_ledger::run(&mut store, input, io::stdout())?,
        Command::Login { role, id, password } => {
            let ok = match role {
                Role::Manager => store.check_manager_login(&id, &password),
                Role::Staff => store.check_staff_login(&id, &password),
            };
            if !ok {
                return Err("Invalid credentials".into());
            }
            println!("Login successful.");
        }
        Command::Staff { manager, command } => {
            require_manager(&store, &manager)?;
            match command {
                StaffCommand::Add { id, password, name } => {
                    store.add_staff(&id, &password, &name)?;
                    println!("Staff member {} added.", id);
                }
                StaffCommand::Edit { id, name, password } => {
                    store.edit_staff(&id, name.as_deref(), password.as_deref())?;
                    println!("Staff member {} updated.", id);
                }
                StaffCommand::Remove { id } => {
                    store.remove_staff(&id)?;
                    println!("Staff member {} removed.", id);
                }
            }
        }
    }
    Ok(())
}

fn require_manager(store: &RecordStore, manager: &ManagerArgs) -> Result<(), Box<dyn Error>> {
    if store.check_manager_login(&manager.manager_id, &manager.manager_password) {
        Ok(())
    } else {
        tracing::warn!(id = %manager.manager_id, "manager login rejected");
        Err("Invalid manager credentials".into())
    }
}

fn print_account(account: &Account) {
    println!("name: {}", account.name);
    println!("age: {}", account.age);
    println!("email: {}", account.email);
    println!("pin: {}", account.pin);
    println!("account number: {}", account.number);
    println!("balance: {}", account.balance);
}
