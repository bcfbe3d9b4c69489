//! Line-oriented console front end.
//!
//! Each input line is one [`Command`]. Plain text is a chat turn; a leading
//! `/` selects one of the built-in actions:
//!
//! | Line                      | Command                          |
//! |---------------------------|----------------------------------|
//! | `/remember <note>`        | store a note                     |
//! | `/forget [filter]`        | erase all, or matching, memories |
//! | `/affinity`               | report affinity                  |
//! | `/emotion [label]`        | read or set the emotion          |
//! | `/song <lyric> [\| mood]` | compose a MIDI sketch            |
//! | `/help`                   | list commands                    |
//! | `/quit`                   | leave                            |

use nunu_core::UserId;
use tracing::warn;

use crate::engine::Engine;
use crate::replies;

/// Help text printed for `/help` and unknown commands.
pub const HELP: &str = "\
/remember <note>       tie a note to your soul
/forget [filter]       snip all threads, or only those mentioning <filter>
/affinity              how fond Nunu is of you
/emotion [label]       read or change Nunu's mood
/song <lyric> [| mood] hum a tiny melody into a .mid file
/quit                  leave
anything else          talk to Nunu";

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Free-form chat input.
    Chat(String),
    /// `/remember <note>`.
    Remember(String),
    /// `/forget [filter]`.
    Forget(Option<String>),
    /// `/affinity`.
    Affinity,
    /// `/emotion [label]`.
    Emotion(Option<String>),
    /// `/song <lyric> [| mood]`.
    Song {
        /// Text the melody is derived from.
        lyric: String,
        /// Mood seed, if given.
        mood: Option<String>,
    },
    /// `/help`.
    Help,
    /// `/quit` or `/exit`.
    Quit,
    /// A `/word` that is not a known command.
    Unknown(String),
    /// Blank line.
    Empty,
}

impl Command {
    /// Parse one console line.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Chat(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        let arg_opt = (!arg.is_empty()).then(|| arg.to_string());

        match name.to_ascii_lowercase().as_str() {
            "remember" if !arg.is_empty() => Self::Remember(arg.to_string()),
            "remember" => Self::Unknown("remember needs a note".to_string()),
            "forget" => Self::Forget(arg_opt),
            "affinity" => Self::Affinity,
            "emotion" => Self::Emotion(arg_opt),
            "song" => {
                let (lyric, mood) = match arg.split_once('|') {
                    Some((lyric, mood)) => {
                        let mood = mood.trim();
                        (lyric.trim(), (!mood.is_empty()).then(|| mood.to_string()))
                    }
                    None => (arg, None),
                };
                Self::Song {
                    lyric: lyric.to_string(),
                    mood,
                }
            }
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Run `command` for `user` and return the line to print, if any.
///
/// Failures are logged and answered with the generic failure line; they
/// never end the session.
pub async fn handle(engine: &Engine, user: UserId, command: Command) -> Option<String> {
    let reply = match command {
        Command::Empty | Command::Quit => return None,
        Command::Help => HELP.to_string(),
        Command::Unknown(what) => format!("Unknown spell `{what}`.\n{HELP}"),
        Command::Chat(input) => match engine.chat(user, &input).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(user = %user, error = %e, "Chat failed");
                replies::FAILURE.to_string()
            }
        },
        Command::Remember(note) => match engine.remember(user, &note) {
            Ok(()) => replies::REMEMBERED.to_string(),
            Err(e) => {
                warn!(user = %user, error = %e, "Remember failed");
                replies::FAILURE.to_string()
            }
        },
        Command::Forget(filter) => match engine.forget(user, filter.as_deref()) {
            Ok(count) => replies::forgotten(count),
            Err(e) => {
                warn!(user = %user, error = %e, "Forget failed");
                replies::FAILURE.to_string()
            }
        },
        Command::Affinity => replies::affinity(engine.affinity(user)),
        Command::Emotion(set) => replies::emotion(&engine.emotion(set.as_deref())),
        Command::Song { lyric, mood } => {
            let path = engine.compose_song(&lyric, mood.as_deref());
            replies::song(path.as_deref())
        }
    };
    Some(reply)
}
