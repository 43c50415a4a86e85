//! Shell command parsing: `verb [kind] [id] key=value ...`.
//! Values may be double-quoted to include spaces.

use catalog_core::{AlbumDraft, EntityKind, SongDraft, Subject};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unterminated quote")]
    UnterminatedQuote,

    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid id: {0}")]
    BadId(String),

    #[error("unknown field `{field}` for {kind}")]
    UnknownField { kind: EntityKind, field: String },

    #[error("expected key=value, got `{0}`")]
    BadField(String),

    #[error("invalid yes/no value: {0}")]
    BadFlag(String),
}

pub const HELP: &str = "\
commands:
  albums | songs                        list and refresh
  delete album|song <id>                run twice to confirm
  add album title=.. date=.. [cover=..] run twice to confirm
  add song title=.. duration=.. track=.. album=.. [single=yes|no]
  edit album|song <id> key=value ...    run twice to confirm
  cancel [album|song <id> | new album|song]
  status                                armed and pending actions
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List(EntityKind),
    Delete(Subject),
    Add {
        kind: EntityKind,
        fields: Vec<(String, String)>,
    },
    Edit {
        kind: EntityKind,
        id: i64,
        fields: Vec<(String, String)>,
    },
    /// `None` cancels every armed or pending gate.
    Cancel(Option<Subject>),
    Status,
    Help,
    Quit,
}

/// Split on whitespace, honouring double quotes (`title="Abbey Road"`).
pub fn tokenize(line: &str) -> Result<Vec<String>, CommandError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_quotes {
        return Err(CommandError::UnterminatedQuote);
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<ShellCommand>, CommandError> {
    let tokens = tokenize(line)?;
    let Some((verb, rest)) = tokens.split_first() else {
        return Ok(None);
    };

    let cmd = match verb.to_ascii_lowercase().as_str() {
        "albums" | "ls-albums" => ShellCommand::List(EntityKind::Album),
        "songs" | "ls-songs" => ShellCommand::List(EntityKind::Song),
        "ls" | "list" => match rest {
            [kind] => ShellCommand::List(parse_kind(kind, "ls albums|songs")?),
            _ => return Err(CommandError::Usage("ls albums|songs")),
        },
        "delete" | "rm" => match rest {
            [kind, id] => ShellCommand::Delete(Subject::Existing {
                kind: parse_kind(kind, "delete album|song <id>")?,
                id: parse_id(id)?,
            }),
            _ => return Err(CommandError::Usage("delete album|song <id>")),
        },
        "add" | "new" => match rest {
            [kind, fields @ ..] => ShellCommand::Add {
                kind: parse_kind(kind, "add album|song key=value ...")?,
                fields: parse_fields(fields)?,
            },
            [] => return Err(CommandError::Usage("add album|song key=value ...")),
        },
        "edit" => match rest {
            [kind, id, fields @ ..] => ShellCommand::Edit {
                kind: parse_kind(kind, "edit album|song <id> key=value ...")?,
                id: parse_id(id)?,
                fields: parse_fields(fields)?,
            },
            _ => return Err(CommandError::Usage("edit album|song <id> key=value ...")),
        },
        "cancel" => match rest {
            [] => ShellCommand::Cancel(None),
            [new, kind] if new.eq_ignore_ascii_case("new") => ShellCommand::Cancel(Some(
                Subject::New(parse_kind(kind, "cancel new album|song")?),
            )),
            [kind, id] => ShellCommand::Cancel(Some(Subject::Existing {
                kind: parse_kind(kind, "cancel album|song <id>")?,
                id: parse_id(id)?,
            })),
            _ => return Err(CommandError::Usage("cancel [album|song <id> | new album|song]")),
        },
        "status" => ShellCommand::Status,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(cmd))
}

fn parse_kind(raw: &str, usage: &'static str) -> Result<EntityKind, CommandError> {
    raw.parse().map_err(|_| CommandError::Usage(usage))
}

fn parse_id(raw: &str) -> Result<i64, CommandError> {
    raw.parse()
        .map_err(|_| CommandError::BadId(raw.to_string()))
}

fn parse_fields(raw: &[String]) -> Result<Vec<(String, String)>, CommandError> {
    raw.iter()
        .map(|token| {
            token
                .split_once('=')
                .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                .ok_or_else(|| CommandError::BadField(token.clone()))
        })
        .collect()
}

fn parse_flag(raw: &str) -> Result<bool, CommandError> {
    match raw.to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Ok(true),
        "no" | "n" | "false" | "0" => Ok(false),
        _ => Err(CommandError::BadFlag(raw.to_string())),
    }
}

pub fn apply_album_fields(
    draft: &mut AlbumDraft,
    fields: &[(String, String)],
) -> Result<(), CommandError> {
    for (key, value) in fields {
        match key.as_str() {
            "title" => draft.title = value.clone(),
            "date" | "release_date" => draft.release_date = value.clone(),
            "cover" | "coverart_url" => draft.coverart_url = value.clone(),
            _ => {
                return Err(CommandError::UnknownField {
                    kind: EntityKind::Album,
                    field: key.clone(),
                });
            }
        }
    }
    Ok(())
}

pub fn apply_song_fields(
    draft: &mut SongDraft,
    fields: &[(String, String)],
) -> Result<(), CommandError> {
    for (key, value) in fields {
        match key.as_str() {
            "title" => draft.title = value.clone(),
            "duration" | "duration_seconds" => draft.duration_seconds = value.clone(),
            "track" | "track_number" => draft.track_number = value.clone(),
            "single" | "is_single" => draft.is_single = parse_flag(value)?,
            "album" | "album_id" => draft.album_id = value.clone(),
            _ => {
                return Err(CommandError::UnknownField {
                    kind: EntityKind::Song,
                    field: key.clone(),
                });
            }
        }
    }
    Ok(())
}
