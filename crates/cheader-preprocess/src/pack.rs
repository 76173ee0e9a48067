//! `#pragma pack` handling.
//!
//! Follows the MSVC reading of the pragma: `push` saves the current value
//! (optionally under an identifier) before applying a new one, `pop`
//! restores the most recent save, and `pop` with an identifier unwinds
//! back past the most recent save made under that identifier.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Ordered `(line, pack)` transitions for one file.
///
/// Lines are 0-based; `None` is the compiler's default packing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackingLog {
    entries: Vec<(usize, Option<u32>)>,
}

impl Default for PackingLog {
    fn default() -> Self {
        Self {
            entries: vec![(0, None)],
        }
    }
}

impl PackingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, line: usize, pack: Option<u32>) {
        self.entries.push((line, pack));
    }

    /// Pack value in effect at `line`: the last transition at or before it
    pub fn packing_at(&self, line: usize) -> Option<u32> {
        self.entries
            .iter()
            .take_while(|(at, _)| *at <= line)
            .last()
            .and_then(|(_, pack)| *pack)
    }

    pub fn entries(&self) -> &[(usize, Option<u32>)] {
        &self.entries
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PackAction {
    Set,
    Push,
    Pop,
    Show,
}

/// Parsed `pack(...)` arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PackPragma {
    pub action: PackAction,
    pub id: Option<SmolStr>,
    pub value: Option<u32>,
}

/// Why a `pack` pragma was not applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PackIssue {
    InvalidValue(String),
    Underflow,
}

/// Parse the text after `#pragma`. Returns `None` for other pragmas.
pub(crate) fn parse_pack(rest: &str) -> Option<Result<PackPragma, PackIssue>> {
    let args = rest.trim_start().strip_prefix("pack")?.trim_start();
    let args = args.strip_prefix('(')?;
    let args = &args[..args.find(')')?];

    let mut pragma = PackPragma {
        action: PackAction::Set,
        id: None,
        value: None,
    };
    for opt in args.split(',').map(str::trim).filter(|o| !o.is_empty()) {
        match opt {
            "push" => pragma.action = PackAction::Push,
            "pop" => pragma.action = PackAction::Pop,
            "show" => pragma.action = PackAction::Show,
            _ if opt.bytes().all(|b| b.is_ascii_digit()) => match opt.parse::<u32>() {
                Ok(v) if v.is_power_of_two() => pragma.value = Some(v),
                _ => return Some(Err(PackIssue::InvalidValue(opt.to_string()))),
            },
            _ => pragma.id = Some(SmolStr::new(opt)),
        }
    }
    Some(Ok(pragma))
}

/// Saved pack values
#[derive(Debug, Clone, Default)]
pub(crate) struct PackStack {
    current: Option<u32>,
    saved: Vec<(Option<u32>, Option<SmolStr>)>,
}

impl PackStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a pragma and return the resulting pack value. A failed pop
    /// leaves the state unchanged.
    pub fn apply(&mut self, pragma: &PackPragma) -> Result<Option<u32>, PackIssue> {
        match pragma.action {
            PackAction::Show => {}
            PackAction::Set => self.current = pragma.value,
            PackAction::Push => {
                self.saved.push((self.current, pragma.id.clone()));
                if pragma.value.is_some() {
                    self.current = pragma.value;
                }
            }
            PackAction::Pop => {
                let index = match &pragma.id {
                    Some(id) => self
                        .saved
                        .iter()
                        .rposition(|(_, saved_id)| saved_id.as_ref() == Some(id)),
                    None => self.saved.len().checked_sub(1),
                };
                let index = index.ok_or(PackIssue::Underflow)?;
                self.current = self.saved[index].0;
                self.saved.truncate(index);
                if pragma.value.is_some() {
                    self.current = pragma.value;
                }
            }
        }
        Ok(self.current)
    }
}
