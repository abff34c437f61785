mod client;
mod commands;
mod render;

use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use client::{base_url_from, ClientError, GatewayClient, SessionSummary};
use commands::{Command, HELP};

struct Chat {
    client: GatewayClient,
    current: Option<SessionSummary>,
}

impl Chat {
    fn prompt(&self) -> String {
        match &self.current {
            Some(session) => format!("you ({})> ", session.display_name),
            None => "you (no session)> ".to_string(),
        }
    }

    fn report(&self, err: ClientError) {
        match err {
            ClientError::Api { status, body } => {
                eprintln!("{}", format!("Gateway error {}", status).red());
                if let Some(section) = render::error_section(&body) {
                    eprintln!("{}", section);
                } else {
                    eprintln!("{}", body);
                }
            }
            ClientError::Unreachable(e) => {
                eprintln!(
                    "{}",
                    format!(
                        "Could not reach the gateway at {}; is it running? ({})",
                        self.client.base_url(),
                        e
                    )
                    .red()
                );
            }
        }
    }

    async fn search(&self, query: &str, use_session: bool) {
        let session = self
            .current
            .as_ref()
            .filter(|_| use_session)
            .map(|s| s.name.as_str());

        match self.client.search(query, session).await {
            Ok(body) => println!("\n{}", render::search_response(&body)),
            Err(e) => self.report(e),
        }
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Exit | Command::Empty => {}
            Command::Help => println!("{}", HELP),
            Command::New(name) => match self.client.create_session(name.as_deref()).await {
                Ok(session) => {
                    println!(
                        "{}",
                        format!("New session: {}", session.display_name).green()
                    );
                    println!("Session ID: {}", session.name);
                    self.current = Some(session);
                }
                Err(e) => self.report(e),
            },
            Command::List => match self.client.list_sessions().await {
                Ok(sessions) => {
                    let current = self.current.as_ref().map(|s| s.name.as_str());
                    println!("{}", render::session_list(&sessions, current));
                }
                Err(e) => self.report(e),
            },
            Command::Single(None) => println!("Usage: /single <query>"),
            Command::Single(Some(query)) => {
                println!("{}", "Searching without session...".bright_black());
                self.search(&query, false).await;
            }
            Command::Ask(query) => {
                println!("{}", "Thinking...".bright_black());
                self.search(&query, true).await;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr and stay quiet unless RUST_LOG asks for more
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let base_url = base_url_from(std::env::var("API_URL").ok().as_deref());
    tracing::info!(base_url = %base_url, "Using search gateway");

    let mut chat = Chat {
        client: GatewayClient::new(base_url),
        current: None,
    };

    let mut rl = DefaultEditor::new()?;

    println!("{}", "=== Enterprise Search Chat ===".bright_magenta().bold());
    println!(
        "{}",
        "Start a session with '/new', or just ask to search without one. '/help' lists commands."
            .bright_black()
    );
    println!();

    loop {
        match rl.readline(&chat.prompt()) {
            Ok(line) => {
                let command = Command::parse(&line);
                if command == Command::Exit {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
                if command == Command::Empty {
                    println!("Ask a question or type /help.");
                    continue;
                }

                let _ = rl.add_history_entry(line.trim());
                chat.handle(command).await;
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}
