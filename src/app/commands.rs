//! Shell command parsing.
//!
//! One line of input maps to one [`ShellCommand`]. Parsing never touches the synchronizer, so
//! malformed lines are reported without reaching the poll service.

/// Commands understood by the pollsync shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List,
    Refresh,
    Status,
    Create { title: String, options: Vec<String> },
    Vote { poll_id: u64, option_id: u64 },
    Close { poll_id: u64 },
    Help,
    Quit,
    NoAction,
    Invalid(String),
}

pub const HELP: &str = "\
commands:
  list                          show cached polls
  refresh                       re-read all polls from the service
  status                        show loading/busy state and the last error
  create <title> | <opt> | ...  create a poll with at least two options
  vote <poll> <option>          vote for an option
  close <poll>                  close a poll
  help                          show this help
  quit                          leave the shell";

impl ShellCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "" => ShellCommand::NoAction,
            "list" | "ls" => no_args(rest, ShellCommand::List),
            "refresh" | "r" => no_args(rest, ShellCommand::Refresh),
            "status" => no_args(rest, ShellCommand::Status),
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            "create" => parse_create(rest),
            "vote" => match parse_ids(rest, ["poll", "option"]) {
                Ok([poll_id, option_id]) => ShellCommand::Vote { poll_id, option_id },
                Err(message) => ShellCommand::Invalid(message),
            },
            "close" => match parse_ids(rest, ["poll"]) {
                Ok([poll_id]) => ShellCommand::Close { poll_id },
                Err(message) => ShellCommand::Invalid(message),
            },
            other => ShellCommand::Invalid(format!("unknown command '{}', try 'help'", other)),
        }
    }
}

fn no_args(rest: &str, command: ShellCommand) -> ShellCommand {
    if rest.is_empty() {
        command
    } else {
        ShellCommand::Invalid(format!("unexpected arguments: {}", rest))
    }
}

/// `create <title> | <opt> | <opt>`. Empty segments are kept so the synchronizer's validation
/// reports them.
fn parse_create(rest: &str) -> ShellCommand {
    let mut parts = rest.split('|').map(|part| part.trim().to_string());
    let title = parts.next().unwrap_or_default();
    if title.is_empty() {
        return ShellCommand::Invalid("usage: create <title> | <option> | <option> ...".into());
    }
    ShellCommand::Create {
        title,
        options: parts.collect(),
    }
}

/// One id per name, in order.
fn parse_ids<const N: usize>(rest: &str, names: [&str; N]) -> Result<[u64; N], String> {
    let args: Vec<&str> = rest.split_whitespace().collect();
    if args.len() != names.len() {
        return Err(format!(
            "expected {}, got {} argument(s)",
            names
                .iter()
                .map(|name| format!("<{}>", name))
                .collect::<Vec<_>>()
                .join(" "),
            args.len()
        ));
    }
    let mut ids = [0; N];
    for ((id, arg), name) in ids.iter_mut().zip(&args).zip(names) {
        *id = arg
            .parse::<u64>()
            .map_err(|_| format!("{} id must be a non-negative integer, got '{}'", name, arg))?;
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_commands() {
        assert_eq!(ShellCommand::parse("list"), ShellCommand::List);
        assert_eq!(ShellCommand::parse("  LS "), ShellCommand::List);
        assert_eq!(ShellCommand::parse("r"), ShellCommand::Refresh);
        assert_eq!(ShellCommand::parse("quit"), ShellCommand::Quit);
        assert_eq!(ShellCommand::parse(""), ShellCommand::NoAction);
        assert!(matches!(
            ShellCommand::parse("list everything"),
            ShellCommand::Invalid(_)
        ));
    }

    #[test]
    fn parses_create_with_options() {
        assert_eq!(
            ShellCommand::parse("create Lunch today | Pizza | Salad "),
            ShellCommand::Create {
                title: "Lunch today".to_string(),
                options: vec!["Pizza".to_string(), "Salad".to_string()],
            }
        );
        assert_eq!(
            ShellCommand::parse("create Lunch | Pizza ||"),
            ShellCommand::Create {
                title: "Lunch".to_string(),
                options: vec!["Pizza".to_string(), String::new(), String::new()],
            }
        );
        assert!(matches!(
            ShellCommand::parse("create | Pizza | Salad"),
            ShellCommand::Invalid(_)
        ));
    }

    #[test]
    fn parses_vote_and_close_ids() {
        assert_eq!(
            ShellCommand::parse("vote 0 1"),
            ShellCommand::Vote {
                poll_id: 0,
                option_id: 1
            }
        );
        assert_eq!(
            ShellCommand::parse("close 3"),
            ShellCommand::Close { poll_id: 3 }
        );
    }

    #[test]
    fn rejects_malformed_ids() {
        for line in ["vote 0", "vote 0 -1", "vote a b", "close", "close 1 2"] {
            assert!(
                matches!(ShellCommand::parse(line), ShellCommand::Invalid(_)),
                "{line}"
            );
        }
    }

    #[test]
    fn id_errors_name_the_argument() {
        assert_eq!(
            ShellCommand::parse("vote 0"),
            ShellCommand::Invalid("expected <poll> <option>, got 1 argument(s)".to_string())
        );
        assert_eq!(
            ShellCommand::parse("vote 1 x"),
            ShellCommand::Invalid("option id must be a non-negative integer, got 'x'".to_string())
        );
        assert_eq!(
            ShellCommand::parse("close y"),
            ShellCommand::Invalid("poll id must be a non-negative integer, got 'y'".to_string())
        );
    }

    #[test]
    fn unknown_command_mentions_help() {
        match ShellCommand::parse("frobnicate 1") {
            ShellCommand::Invalid(message) => assert!(message.contains("help")),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
