use derive_more::{Display, Error};
use std::str::FromStr;

/// Something the user (or the page) did to the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    Toggle,
    Open,
    Close,
    OutsideClick,
    Escape,
    Refresh,
    Retry,
    DismissError,
    RowClick(i32),
    MarkRead(i32),
    MarkAllRead,
    Delete(i32),
    Follow(i32),
    Shutdown,
}

#[derive(Debug, Display, Error, PartialEq, Eq)]
#[display(fmt = "无法识别的命令: {}", line)]
pub struct CommandError {
    pub line: String,
}

impl FromStr for PanelEvent {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let err = || CommandError {
            line: line.to_string(),
        };
        let mut parts = line.split_whitespace();
        let name = parts.next().ok_or_else(err)?;
        let id = parts.next().map(|v| v.parse::<i32>().map_err(|_| err()));
        if parts.next().is_some() {
            return Err(err());
        }

        let event = match (name, id) {
            ("toggle", None) => Self::Toggle,
            ("open", None) => Self::Open,
            ("close", None) => Self::Close,
            ("outside", None) => Self::OutsideClick,
            ("esc", None) | ("escape", None) => Self::Escape,
            ("refresh", None) => Self::Refresh,
            ("retry", None) => Self::Retry,
            ("dismiss", None) => Self::DismissError,
            ("read-all", None) => Self::MarkAllRead,
            ("quit", None) | ("exit", None) => Self::Shutdown,
            ("row", Some(id)) => Self::RowClick(id?),
            ("read", Some(id)) => Self::MarkRead(id?),
            ("delete", Some(id)) => Self::Delete(id?),
            ("follow", Some(id)) => Self::Follow(id?),
            _ => return Err(err()),
        };
        Ok(event)
    }
}
