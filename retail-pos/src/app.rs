use anyhow::Result;
use retail_auth::Authenticator;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast::error::RecvError;

use crate::commands::executor::{execute_command, Services};
use crate::commands::handlers::parse_command;
use crate::events::AppCommand;
use crate::input::read_hidden;
use crate::state::AppState;

type Input = Lines<BufReader<Stdin>>;

pub struct App {
    services: Services,
}

impl App {
    pub fn new(auth: Authenticator) -> Self {
        Self {
            services: Services::new(auth),
        }
    }

    pub async fn run(&self) -> Result<()> {
        tracing::info!("retail-pos starting");

        let mut input = BufReader::new(tokio::io::stdin()).lines();
        let mut events = self.services.auth.subscribe();
        let mut state = AppState::new();

        if self.services.auth.ensure_fresh().await {
            if let Some(user) = self.services.auth.store().user() {
                println!("Welcome back, {}", user.username);
                state.signed_in(user);
            }
        } else {
            self.sign_in(&mut input, &mut state).await?;
        }
        println!("Type `help` for commands.");

        loop {
            prompt(&state)?;

            tokio::select! {
                line = input.next_line() => {
                    let Some(line) = line? else {
                        tracing::info!("Input closed");
                        break;
                    };
                    match parse_command(&line) {
                        Ok(None) => {}
                        Ok(Some(AppCommand::SignInPrompt)) => {
                            self.sign_in(&mut input, &mut state).await?
                        }
                        Ok(Some(command)) => {
                            for line in execute_command(command, &self.services, &mut state).await {
                                println!("{}", line);
                            }
                        }
                        Err(message) => println!("{}", message),
                    }
                }
                event = events.recv() => match event {
                    Ok(event) => {
                        println!();
                        println!("{}", state.reduce_session_event(event));
                        println!("Type `login` to sign in again.");
                    }
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!("Missed {} session events", missed);
                    }
                    Err(RecvError::Closed) => {
                        anyhow::bail!("Session event channel closed");
                    }
                },
            }

            if state.should_quit {
                tracing::info!("Quit requested");
                break;
            }
        }

        Ok(())
    }

    async fn sign_in(&self, input: &mut Input, state: &mut AppState) -> Result<()> {
        let Some(username) = ask(input, "Username: ").await? else {
            return Ok(());
        };

        print!("Password: ");
        std::io::stdout().flush()?;
        let password = match tokio::task::spawn_blocking(read_hidden).await? {
            Ok(Some(password)) => password,
            Ok(None) => {
                println!("Sign-in cancelled");
                return Ok(());
            }
            Err(e) => {
                tracing::error!("Failed to read password: {}", e);
                println!("Cannot read the password from this terminal: {}", e);
                return Ok(());
            }
        };

        let command = AppCommand::SignIn { username, password };
        for line in execute_command(command, &self.services, state).await {
            println!("{}", line);
        }
        Ok(())
    }
}

fn prompt(state: &AppState) -> Result<()> {
    match &state.user {
        Some(user) => print!("{}> ", user.username),
        None => print!("> "),
    }
    std::io::stdout().flush()?;
    Ok(())
}

async fn ask(input: &mut Input, question: &str) -> Result<Option<String>> {
    print!("{}", question);
    std::io::stdout().flush()?;
    Ok(input.next_line().await?.map(|s| s.trim().to_string()))
}
