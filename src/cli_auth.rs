use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cd_catalog_server::user::{SqliteUserStore, UserManager};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite user database.
    #[clap(value_parser = parse_path)]
    pub path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Creates a user with the given handle.
    AddUser { user_handle: String },

    /// Sets or replaces the password of a user.
    SetPassword {
        user_handle: String,
        password: String,
    },

    /// Verifies the password of a given user without creating any token.
    CheckPassword {
        user_handle: String,
        password: String,
    },

    /// Deletes a user together with its credentials and tokens.
    DeleteUser { user_handle: String },

    /// Shows all user handles.
    ListUsers,
}

fn execute(command: Command, user_manager: &UserManager) -> Result<()> {
    match command {
        Command::AddUser { user_handle } => {
            let user_id = user_manager.add_user(&user_handle)?;
            println!("Created user {} with id {}", user_handle, user_id);
        }
        Command::SetPassword {
            user_handle,
            password,
        } => {
            user_manager.set_password(&user_handle, &password)?;
            println!("Password updated for {}", user_handle);
        }
        Command::CheckPassword {
            user_handle,
            password,
        } => {
            if user_manager.check_password(&user_handle, &password)? {
                println!("Password is correct");
            } else {
                bail!("Password is NOT correct");
            }
        }
        Command::DeleteUser { user_handle } => {
            if !user_manager.delete_user(&user_handle)? {
                bail!("User {} not found", user_handle);
            }
            println!("Deleted user {}", user_handle);
        }
        Command::ListUsers => {
            for handle in user_manager.get_all_user_handles()? {
                println!("{}", handle);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    let user_store = SqliteUserStore::new(&cli_args.path)
        .with_context(|| format!("Failed to open user db at {:?}", cli_args.path))?;
    let user_manager = UserManager::new(Box::new(user_store));

    execute(cli_args.command, &user_manager)
}
