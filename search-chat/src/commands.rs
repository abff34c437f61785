/// One line of user input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Help,
    /// Create a session and make it current.
    New(Option<String>),
    List,
    /// Search without the current session. `None` when no query was given.
    Single(Option<String>),
    /// Search within the current session, if any.
    Ask(String),
    Empty,
}

fn argument(rest: &str) -> Option<String> {
    let rest = rest.trim();
    (!rest.is_empty()).then(|| rest.to_string())
}

/// Strip `/name` when followed by whitespace or end of input.
fn command_argument<'a>(input: &'a str, name: &str) -> Option<&'a str> {
    let rest = input.strip_prefix(name)?;
    (rest.is_empty() || rest.starts_with(char::is_whitespace)).then_some(rest)
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let input = line.trim();

        if input.is_empty() {
            return Command::Empty;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            return Command::Exit;
        }
        if input == "/help" {
            return Command::Help;
        }
        if input == "/list" {
            return Command::List;
        }
        if let Some(rest) = command_argument(input, "/new") {
            return Command::New(argument(rest));
        }
        if let Some(rest) = command_argument(input, "/single") {
            return Command::Single(argument(rest));
        }

        Command::Ask(input.to_string())
    }
}

pub const HELP: &str = "\
Commands:
  /new [name]      Start a new conversation session
  /list            List sessions
  /single <query>  Search once without the current session
  /help            Show this help
  exit | quit      Leave

Plain input is searched within the current session, or on its own when none is active.";
