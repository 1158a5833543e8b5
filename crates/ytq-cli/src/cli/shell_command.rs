//! Line parser for `ytq shell`.

use std::path::PathBuf;

/// Option toggled with `toggle <name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Playlist,
    Thumbnail,
    Subs,
    Keep,
    Open,
    WindowsFilenames,
}

impl Toggle {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "playlist" => Some(Toggle::Playlist),
            "thumbnail" | "embed-thumbnail" => Some(Toggle::Thumbnail),
            "subs" | "embed-subs" => Some(Toggle::Subs),
            "keep" => Some(Toggle::Keep),
            "open" => Some(Toggle::Open),
            "windows-filenames" => Some(Toggle::WindowsFilenames),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Toggle::Playlist => "playlist",
            Toggle::Thumbnail => "embed-thumbnail",
            Toggle::Subs => "embed-subs",
            Toggle::Keep => "keep",
            Toggle::Open => "open",
            Toggle::WindowsFilenames => "windows-filenames",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Add { url: String, format: Option<String> },
    Format(String),
    Dir(PathBuf),
    Subfolder(String),
    Toggle(Toggle),
    Threads(u32),
    /// `None` clears the limit.
    Rate(Option<String>),
    Queue,
    Clear,
    Start,
    Stop,
    Status,
    Formats,
    Help,
    Quit,
    Empty,
}

pub const HELP: &str = "\
commands:
  add <url> [format]     queue a URL (optionally with a format id)
  format <id>            set the format for new jobs
  dir <path>             set the download root folder
  subfolder <name>       set the subfolder under the root
  toggle <option>        flip playlist, embed-thumbnail, embed-subs, keep, open, windows-filenames
  threads <n>            concurrent fragment downloads (1-32)
  rate <limit|off>       rate limit such as 5M, or off
  queue                  list queued jobs
  clear                  empty the queue
  start                  download the queue
  stop                   stop the current download
  status                 show run state and settings
  formats                list format ids
  help                   show this help
  quit                   leave (stops a running download)";

/// Parses one input line. Errors are messages meant for the user.
pub fn parse_line(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    let command = match word.to_ascii_lowercase().as_str() {
        "" => ShellCommand::Empty,
        "add" | "a" => {
            let mut parts = rest.split_whitespace();
            let url = parts.next().ok_or("usage: add <url> [format]")?;
            let format = parts.next().map(String::from);
            if parts.next().is_some() {
                return Err("usage: add <url> [format]".into());
            }
            ShellCommand::Add {
                url: url.to_string(),
                format,
            }
        }
        "format" | "f" => ShellCommand::Format(required(rest, "usage: format <id>")?.to_string()),
        "dir" => ShellCommand::Dir(PathBuf::from(required(rest, "usage: dir <path>")?)),
        "subfolder" => ShellCommand::Subfolder(required(rest, "usage: subfolder <name>")?.to_string()),
        "toggle" => {
            let name = required(rest, "usage: toggle <option>")?;
            ShellCommand::Toggle(Toggle::parse(name).ok_or_else(|| format!("unknown option '{name}'"))?)
        }
        "threads" => {
            let n = required(rest, "usage: threads <n>")?;
            ShellCommand::Threads(n.parse().map_err(|_| format!("'{n}' is not a number"))?)
        }
        "rate" => match required(rest, "usage: rate <limit|off>")? {
            r if r.eq_ignore_ascii_case("off") => ShellCommand::Rate(None),
            r => ShellCommand::Rate(Some(r.to_string())),
        },
        "queue" | "ls" => ShellCommand::Queue,
        "clear" => ShellCommand::Clear,
        "start" | "go" => ShellCommand::Start,
        "stop" => ShellCommand::Stop,
        "status" => ShellCommand::Status,
        "formats" => ShellCommand::Formats,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(command)
}

fn required<'a>(rest: &'a str, usage: &str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(usage.to_string())
    } else {
        Ok(rest)
    }
}
