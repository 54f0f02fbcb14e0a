//! RAX FTP Client - Entry Point
//!
//! Interactive FTP client: `rax-ftp-client <host> [port]`.

use log::{error, info};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use rax_ftp_client::client::input::HELP;
use rax_ftp_client::client::{UserCommand, parse_user_input};
use rax_ftp_client::error::FtpClientError;
use rax_ftp_client::error::handlers::{handle_error, server_reply};
use rax_ftp_client::protocol::Reply;
use rax_ftp_client::{ClientConfig, FtpSession};

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    if let Err(e) = run().await {
        handle_error(&e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), FtpClientError> {
    let mut config = ClientConfig::load()?;
    let mut args = std::env::args().skip(1);
    match args.next() {
        Some(host) => config.host = host,
        None => {
            println!("Usage: rax-ftp-client <host> [port]");
            return Ok(());
        }
    }
    if let Some(port) = args.next() {
        match port.parse() {
            Ok(port) => config.control_port = port,
            Err(_) => {
                println!("{} is not a valid port number.", port);
                return Ok(());
            }
        }
    }
    config.validate()?;

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let user = prompt(&mut input, "Enter a username: ").await;
    let password = prompt(&mut input, "Enter a password: ").await;

    info!("Launching FTP client for {}:{}", config.host, config.control_port);
    let (mut session, greeting) = FtpSession::connect(&config).await?;
    println!("{}", greeting);

    let (user_reply, pass_reply) = session.login(&user, &password).await?;
    println!("{}\n{}\n\n{}\n", user_reply, pass_reply, HELP);

    loop {
        let line = prompt(&mut input, "> ").await;
        match parse_user_input(&line) {
            UserCommand::Quit => break,
            command => {
                if let Err(e) = execute(&mut session, command).await {
                    report(&e);
                    if matches!(e, FtpClientError::Connection(_)) {
                        return Err(e);
                    }
                }
            }
        }
    }

    let reply = session.disconnect().await?;
    println!("{}", reply);
    Ok(())
}

async fn execute(session: &mut FtpSession, command: UserCommand) -> Result<(), FtpClientError> {
    match command {
        UserCommand::Retrieve(path) => {
            let outcome = session.retrieve_file(&path).await?;
            print_replies(&[&outcome.preliminary, &outcome.completion]);
            println!("{} bytes received", outcome.bytes_written);
        }
        UserCommand::List => {
            let listing = session.list_directory().await?;
            println!("{}", listing.preliminary);
            for line in &listing.lines {
                println!("{}", line);
            }
            println!("{}", listing.completion);
        }
        UserCommand::ChangeDirectory(path) => {
            println!("{}", session.change_directory(&path).await?);
        }
        UserCommand::ParentDirectory => {
            println!("{}", session.change_to_parent_directory().await?);
        }
        UserCommand::PrintDirectory => {
            println!("{}", session.print_working_directory().await?);
        }
        UserCommand::Active => {
            let mode = session.transfer_mode().with_passive(false);
            session.set_transfer_mode(mode);
            println!("Using {} mode", mode);
        }
        UserCommand::Passive => {
            let mode = session.transfer_mode().with_passive(true);
            session.set_transfer_mode(mode);
            println!("Using {} mode", mode);
        }
        UserCommand::Extended(enabled) => {
            let mode = session.transfer_mode().with_extended(enabled);
            session.set_transfer_mode(mode);
            println!("Using {} mode", mode);
        }
        UserCommand::Help => println!("{}", HELP),
        UserCommand::MissingArgument(cmd) => {
            println!("The \"{}\" command needs an argument. Type \"help\" for usage.", cmd)
        }
        UserCommand::Invalid(input) => println!("Invalid command {}", input),
        UserCommand::Empty | UserCommand::Quit => {}
    }
    Ok(())
}

fn report(err: &FtpClientError) {
    handle_error(err);
    match server_reply(err) {
        Some(reply) => println!("{}\n{}", reply, err),
        None => println!("{}", err),
    }
}

fn print_replies(replies: &[&Reply]) {
    for reply in replies {
        println!("{}", reply);
    }
}

/// Prints `msg` and reads one line; end of input reads as "quit".
async fn prompt(input: &mut Input, msg: &str) -> String {
    print!("{}", msg);
    let _ = std::io::stdout().flush();
    match input.next_line().await {
        Ok(Some(line)) => line,
        Ok(None) => "quit".to_string(),
        Err(e) => {
            error!("Failed to read input: {}", e);
            "quit".to_string()
        }
    }
}
