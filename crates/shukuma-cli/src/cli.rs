//! Command-line argument parsing.

use anyhow::{bail, Result};
use shukuma_core::ExerciseFilter;

pub const USAGE: &str = "\
Usage: shukuma <command>

Account:
  login [username]        Sign in and store the session token
  register                Create an account
  logout                  Remove the stored token and profile
  status                  Show whether you are signed in
  whoami                  Print the cached profile

Workouts (signed in):
  daily                   Today's exercise
  exercises [--difficulty LEVEL | --type TYPE]
  exercise <id>
  random                  A random exercise
  progress                Your progress

Environment:
  SHUKUMA_API_URL, SHUKUMA_BACKEND (keyring | encrypted-file | memory),
  SHUKUMA_VAULT_PASSPHRASE, RUST_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: Option<String> },
    Register,
    Logout,
    Status,
    Whoami,
    Daily,
    Exercises(ExerciseFilter),
    Exercise { id: String },
    Random,
    Progress,
    Help,
}

impl Command {
    /// Parse the arguments after the program name
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };

        let command = match (name.as_str(), rest) {
            ("login", []) => Command::Login { username: None },
            ("login", [username]) => Command::Login {
                username: Some(username.clone()),
            },
            ("register", []) => Command::Register,
            ("logout", []) => Command::Logout,
            ("status", []) => Command::Status,
            ("whoami", []) => Command::Whoami,
            ("daily", []) => Command::Daily,
            ("exercises", []) => Command::Exercises(ExerciseFilter::All),
            ("exercises", [flag, value]) if flag == "--difficulty" => {
                Command::Exercises(ExerciseFilter::Difficulty(value.clone()))
            }
            ("exercises", [flag, value]) if flag == "--type" => {
                Command::Exercises(ExerciseFilter::Type(value.clone()))
            }
            ("exercise", [id]) => Command::Exercise { id: id.clone() },
            ("random", []) => Command::Random,
            ("progress", []) => Command::Progress,
            ("help" | "--help" | "-h", _) => Command::Help,
            (name, _) => bail!("Unrecognized command or arguments: {}\n\n{}", name, USAGE),
        };
        Ok(command)
    }
}
