//! Line-oriented command shell over `MapScreen`.
//!
//! # Responsibility
//! - Parse one text command per line.
//! - Drive the screen the way button clicks, map taps and prompts would.
//!
//! # Invariants
//! - Command failures produce an `error:` line; they never end the session.
//! - List positions are 1-based, matching what the list UI shows.

use chrono::NaiveDate;
use incident_map_core::{
    Coordinate, IncidentId, MapScreen, MercatorPoint, RegistryResult, TapOutcome,
};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub const HELP: &str = "\
commands:
  add                      enter pin placement mode
  cancel                   leave pin placement mode
  tap <lat> <lon>          tap the map at degrees
  tap-world <x> <y>        tap the map at Spherical Mercator metres
  rename <n> <title...>    rename the n-th incident
  remove <n>               remove the n-th incident
  list                     show list rows
  search [text] [--date YYYY-MM-DD]
  markers                  show map pins
  home                     show initial map center
  help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Add,
    Cancel,
    Tap(Coordinate),
    TapWorld(MercatorPoint),
    Rename { position: usize, title: String },
    Remove { position: usize },
    List,
    Search { text: String, date: Option<NaiveDate> },
    Markers,
    Home,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCommandError(String);

impl Display for ParseCommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseCommandError {}

fn parse_error(message: impl Into<String>) -> ParseCommandError {
    ParseCommandError(message.into())
}

fn parse_number(value: Option<&str>, what: &str) -> Result<f64, ParseCommandError> {
    let value = value.ok_or_else(|| parse_error(format!("missing {what}")))?;
    value
        .parse::<f64>()
        .map_err(|_| parse_error(format!("invalid {what} `{value}`")))
}

fn parse_position(value: Option<&str>) -> Result<usize, ParseCommandError> {
    let value = value.ok_or_else(|| parse_error("missing list position"))?;
    match value.parse::<usize>() {
        Ok(position) if position >= 1 => Ok(position),
        _ => Err(parse_error(format!(
            "list position must be a number >= 1, got `{value}`"
        ))),
    }
}

/// Splits off the first word, returning it and the untouched remainder.
fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(at) => (&text[..at], &text[at..]),
        None => (text, ""),
    }
}

impl FromStr for ShellCommand {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(parse_error("empty command"));
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "add" => Self::Add,
            "cancel" => Self::Cancel,
            "tap" => Self::Tap(Coordinate {
                latitude: parse_number(words.next(), "latitude")?,
                longitude: parse_number(words.next(), "longitude")?,
            }),
            "tap-world" => Self::TapWorld(MercatorPoint {
                x: parse_number(words.next(), "x")?,
                y: parse_number(words.next(), "y")?,
            }),
            "rename" => {
                // Title keeps its inner spacing; the registry trims the ends.
                let (_, rest) = split_word(line);
                let (position, title) = split_word(rest);
                let position = parse_position(Some(position).filter(|p| !p.is_empty()))?;
                return Ok(Self::Rename {
                    position,
                    title: title.trim_start().to_string(),
                });
            }
            "remove" => Self::Remove {
                position: parse_position(words.next())?,
            },
            "list" => Self::List,
            "search" => {
                let (_, mut rest) = split_word(line);
                let mut text = String::new();
                let mut date = None;
                loop {
                    let (word, after) = split_word(rest);
                    if word.is_empty() {
                        break;
                    }
                    if word == "--date" {
                        let (raw, remaining) = split_word(after);
                        if raw.is_empty() {
                            return Err(parse_error("missing value for --date"));
                        }
                        let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                            .map_err(|_| parse_error(format!("invalid date `{raw}`")))?;
                        date = Some(parsed);
                        rest = remaining;
                    } else {
                        text.push_str(&rest[..rest.len() - after.len()]);
                        rest = after;
                    }
                }
                return Ok(Self::Search {
                    text: text.trim().to_string(),
                    date,
                });
            }
            "markers" => Self::Markers,
            "home" => Self::Home,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(parse_error(format!("unknown command `{other}`"))),
        };

        if let Some(extra) = words.next() {
            return Err(parse_error(format!("unexpected argument `{extra}`")));
        }
        Ok(command)
    }
}

/// What the shell wants printed next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Output(String),
    Quit,
}

#[derive(Serialize)]
struct HomeView {
    center: Coordinate,
    world: MercatorPoint,
}

pub struct Shell {
    screen: MapScreen,
}

impl Shell {
    pub fn new(screen: MapScreen) -> Self {
        Self { screen }
    }

    pub fn execute(&mut self, command: ShellCommand) -> Reply {
        let output = match command {
            ShellCommand::Add => {
                self.screen.begin_placing_pin();
                "tap the map to place the incident".to_string()
            }
            ShellCommand::Cancel => {
                self.screen.cancel_placing_pin();
                "placement cancelled".to_string()
            }
            ShellCommand::Tap(location) => describe_tap(self.screen.handle_tap(location)),
            ShellCommand::TapWorld(point) => describe_tap(self.screen.handle_world_tap(point)),
            ShellCommand::Rename { position, title } => match self.id_at(position) {
                Ok(id) => match self.screen.submit_rename(id, Some(&title)) {
                    Ok(incident) => to_json(&incident),
                    Err(err) => format!("error: {err}"),
                },
                Err(message) => message,
            },
            ShellCommand::Remove { position } => match self.id_at(position) {
                Ok(id) => match self.screen.remove(id) {
                    Ok(incident) => to_json(&incident),
                    Err(err) => format!("error: {err}"),
                },
                Err(message) => message,
            },
            ShellCommand::List => to_json(&self.screen.list().rows()),
            ShellCommand::Search { text, date } => to_json(&self.screen.search(&text, date)),
            ShellCommand::Markers => to_json(&self.screen.markers().markers()),
            ShellCommand::Home => to_json(&HomeView {
                center: self.screen.home(),
                world: self.screen.home_world(),
            }),
            ShellCommand::Help => HELP.to_string(),
            ShellCommand::Quit => return Reply::Quit,
        };
        Reply::Output(output)
    }

    fn id_at(&self, position: usize) -> Result<IncidentId, String> {
        self.screen
            .incident_at(position - 1)
            .map(|incident| incident.id())
            .ok_or_else(|| format!("error: no incident at position {position}"))
    }
}

fn describe_tap(outcome: RegistryResult<TapOutcome>) -> String {
    match outcome {
        Ok(TapOutcome::Placed(incident)) => to_json(&incident),
        Ok(TapOutcome::Ignored) => "ignored: run `add` before tapping".to_string(),
        Err(err) => format!("error: {err}"),
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| format!("error: {err}"))
}
