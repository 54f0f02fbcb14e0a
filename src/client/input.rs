//! User input parsing
//!
//! Maps interactive shell input, including the short aliases `ls`, `cd`
//! and `get`, onto session operations.

/// Help text printed by the interactive front end.
pub const HELP: &str = "\
Below is a list of available commands. All commands are case insensitive.

get/retr [file] ->  Retrieves [file] from the server into the download directory.
ls/list         ->  Lists the files and directories in the server's working directory.
cd/cwd [dir]    ->  Changes the server's working directory to [dir].
cdup            ->  Goes up one directory. \"cd ..\" also works.
pwd             ->  Prints the server's current working directory.
port            ->  Uses active mode for the next transfers.
pasv            ->  Uses passive mode for the next transfers.
ext on|off      ->  Enables or disables EPSV/EPRT.
h/help          ->  Prints this message.
quit            ->  Closes the connection to the FTP server.";

/// A command typed at the interactive prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum UserCommand {
    Retrieve(String),
    List,
    ChangeDirectory(String),
    ParentDirectory,
    PrintDirectory,
    Active,
    Passive,
    Extended(bool),
    Help,
    Quit,
    Empty,
    MissingArgument(String),
    Invalid(String),
}

/// Parses one line of user input.
pub fn parse_user_input(raw: &str) -> UserCommand {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_ascii_lowercase();
    let arg = parts.next().unwrap_or("").trim();

    match cmd.as_str() {
        "" => UserCommand::Empty,
        "get" | "retr" if arg.is_empty() => UserCommand::MissingArgument(cmd.clone()),
        "get" | "retr" => UserCommand::Retrieve(arg.to_string()),
        "ls" | "list" => UserCommand::List,
        "cd" | "cwd" if arg == ".." => UserCommand::ParentDirectory,
        "cd" | "cwd" if arg.is_empty() => UserCommand::MissingArgument(cmd.clone()),
        "cd" | "cwd" => UserCommand::ChangeDirectory(arg.to_string()),
        "cdup" => UserCommand::ParentDirectory,
        "pwd" => UserCommand::PrintDirectory,
        "port" | "active" => UserCommand::Active,
        "pasv" | "passive" => UserCommand::Passive,
        "ext" => match arg.to_ascii_lowercase().as_str() {
            "on" => UserCommand::Extended(true),
            "off" => UserCommand::Extended(false),
            _ => UserCommand::MissingArgument(cmd.clone()),
        },
        "h" | "help" => UserCommand::Help,
        "quit" | "q" => UserCommand::Quit,
        _ => UserCommand::Invalid(trimmed.to_string()),
    }
}
