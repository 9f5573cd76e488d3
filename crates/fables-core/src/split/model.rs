//! Split list model and JSON loading.
//!
//! ```json
//! {
//!   "mode": "all",
//!   "ids": { "end_room": 42 },
//!   "splits": [
//!     { "name": "Zombiant", "group": "Chapter 1", "room": 12, "enemies": [3] }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoEnumIterator};

use crate::error::{Error, Result};
use crate::game::GameIds;
use crate::offset::GameVersion;
use crate::offset::layout::encounter::ENEMY_SLOTS;

/// Which decisions `should_split` evaluates.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SplitMode {
    /// Intermediate splits, then the end sequence on the final split
    #[default]
    All,
    /// Only the end sequence
    StartEndOnly,
}

/// One intermediate split and the conditions that fire it.
///
/// Absent constraints are vacuously satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub name: String,
    #[serde(default)]
    pub group: String,
    #[serde(default, rename = "room", skip_serializing_if = "Option::is_none")]
    pub required_room: Option<i32>,
    #[serde(default, rename = "flags", skip_serializing_if = "Vec::is_empty")]
    pub required_flags: Vec<usize>,
    /// Enemies whose defeat count must rise since the last resync
    #[serde(default, rename = "enemies", skip_serializing_if = "Vec::is_empty")]
    pub required_enemies: Vec<usize>,
}

impl Split {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: String::new(),
            required_room: None,
            required_flags: Vec::new(),
            required_enemies: Vec::new(),
        }
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn room(mut self, room: i32) -> Self {
        self.required_room = Some(room);
        self
    }

    pub fn flags(mut self, flags: &[usize]) -> Self {
        self.required_flags = flags.to_vec();
        self
    }

    pub fn enemies(mut self, enemies: &[usize]) -> Self {
        self.required_enemies = enemies.to_vec();
        self
    }

    fn validate(&self, index: usize, num_flags: usize) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::SplitConfig(format!("split #{} has no name", index)));
        }
        if let Some(&flag) = self.required_flags.iter().find(|&&f| f >= num_flags) {
            return Err(Error::SplitConfig(format!(
                "split '{}': flag {} out of range (0..{})",
                self.name, flag, num_flags
            )));
        }
        if let Some(&enemy) = self.required_enemies.iter().find(|&&e| e >= ENEMY_SLOTS) {
            return Err(Error::SplitConfig(format!(
                "split '{}': enemy {} out of range (0..{})",
                self.name, enemy, ENEMY_SLOTS
            )));
        }
        Ok(())
    }
}

/// Ordered splits plus the evaluation mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitList {
    #[serde(default)]
    pub mode: SplitMode,
    #[serde(default)]
    pub ids: GameIds,
    #[serde(default)]
    pub splits: Vec<Split>,
}

impl SplitList {
    pub fn new(mode: SplitMode, splits: Vec<Split>) -> Self {
        Self {
            mode,
            ids: GameIds::default(),
            splits,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        Self::parse(&content)
    }

    /// Parse and validate a split file's contents.
    pub fn parse(content: &str) -> Result<Self> {
        let list: SplitList = serde_json::from_str(content)?;
        list.validate()?;
        Ok(list)
    }

    /// Check every index against the flag array and encounter table bounds.
    pub fn validate(&self) -> Result<()> {
        let num_flags = GameVersion::iter()
            .map(|v| v.table().num_flags)
            .min()
            .unwrap_or(0);

        if self.ids.new_game_started_flag >= num_flags {
            return Err(Error::SplitConfig(format!(
                "new_game_started_flag {} out of range (0..{})",
                self.ids.new_game_started_flag, num_flags
            )));
        }
        for (i, split) in self.splits.iter().enumerate() {
            split.validate(i, num_flags)?;
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&Split> {
        self.splits.get(index)
    }

    pub fn len(&self) -> usize {
        self.splits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }
}
