//! In-memory model of a unit file and its lookup and mutation interfaces.
use crate::error::{ReadFileSnafu, Result, ValueSnafu};
use crate::parser::{parse_lines, Line};
use crate::split::{escape_words, split_words};
use basic::config::{parse_boolean, parse_u32};
use snafu::ResultExt;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// A named group of ordered `key=value` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitGroup {
    name: String,
    entries: Vec<(String, String)>,
}

impl UnitGroup {
    /// Create an empty group.
    pub fn new(name: &str) -> Self {
        UnitGroup {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    /// Name of the group, without brackets.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All entries in file order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Distinct keys in order of first appearance.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for (k, _) in self.entries.iter() {
            if !keys.contains(&k.as_str()) {
                keys.push(k);
            }
        }
        keys
    }

    fn values(&self, key: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    fn add(&mut self, key: &str, value: &str) {
        self.entries.push((key.to_string(), value.to_string()));
    }

    fn set(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().rev().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.add(key, value),
        }
    }

    fn unset(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }
}

/// A parsed unit file: groups in file order.
///
/// A group header that appears more than once re-opens the existing group, so
/// every group name is present at most once. Values are stored verbatim, the
/// `*_args`, `*_strv` and `*_key_val` lookups split them into words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitFile {
    groups: Vec<UnitGroup>,
}

impl UnitFile {
    /// Create an empty unit file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse unit file content.
    pub fn parse(content: &str) -> Result<Self> {
        let mut unit = UnitFile::new();
        let mut current = None;

        for line in parse_lines(content)? {
            match line {
                Line::Group(name) => current = Some(unit.ensure_group(&name)),
                Line::Entry(key, value) => {
                    /* the parser rejects entries before the first group */
                    if let Some(index) = current {
                        unit.groups[index].add(&key, &value);
                    }
                }
            }
        }

        Ok(unit)
    }

    /// Read and parse the file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context(ReadFileSnafu { path })?;
        Self::parse(&content)
    }

    fn ensure_group(&mut self, name: &str) -> usize {
        match self.groups.iter().position(|g| g.name == name) {
            Some(index) => index,
            None => {
                self.groups.push(UnitGroup::new(name));
                self.groups.len() - 1
            }
        }
    }

    /// All groups in order.
    pub fn groups(&self) -> impl Iterator<Item = &UnitGroup> {
        self.groups.iter()
    }

    /// The group called `name`.
    pub fn group(&self, name: &str) -> Option<&UnitGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.group(name).is_some()
    }

    pub fn has_key(&self, group: &str, key: &str) -> bool {
        self.lookup_first(group, key).is_some()
    }

    fn values(&self, group: &str, key: &str) -> Vec<&str> {
        self.group(group)
            .map(|g| g.values(key))
            .unwrap_or_default()
    }

    pub fn lookup_first(&self, group: &str, key: &str) -> Option<&str> {
        self.group(group)
            .and_then(|g| g.values(key).first().copied())
    }

    /// The value assigned last, which overrides all earlier ones.
    pub fn lookup_last(&self, group: &str, key: &str) -> Option<&str> {
        self.group(group)
            .and_then(|g| g.values(key).last().copied())
    }

    /// Every value of the key in assignment order.
    pub fn lookup_all(&self, group: &str, key: &str) -> Vec<&str> {
        self.values(group, key)
    }

    /// The last value split into words.
    pub fn lookup_last_args(&self, group: &str, key: &str) -> Result<Option<Vec<String>>> {
        self.lookup_last(group, key).map(split_words).transpose()
    }

    /// Every value split into words, concatenated.
    pub fn lookup_all_args(&self, group: &str, key: &str) -> Result<Vec<String>> {
        let mut result = Vec::new();
        for value in self.values(group, key) {
            result.extend(split_words(value)?);
        }
        Ok(result)
    }

    /// Like [`UnitFile::lookup_all_args`], but an empty assignment drops
    /// everything collected before it.
    pub fn lookup_all_strv(&self, group: &str, key: &str) -> Result<Vec<String>> {
        let mut result = Vec::new();
        for value in self.values(group, key) {
            if value.is_empty() {
                result.clear();
                continue;
            }
            result.extend(split_words(value)?);
        }
        Ok(result)
    }

    /// Collect `KEY=VALUE` words of every assignment, a later assignment of
    /// the same key wins.
    pub fn lookup_all_key_val(&self, group: &str, key: &str) -> Result<BTreeMap<String, String>> {
        let mut result = BTreeMap::new();
        for word in self.lookup_all_args(group, key)? {
            match word.split_once('=') {
                Some((k, v)) => {
                    result.insert(k.to_string(), v.to_string());
                }
                None => log::warn!("Ignoring {} '{}' in group {}: no '='", key, word, group),
            }
        }
        Ok(result)
    }

    /// The last value as a boolean, an empty value counts as unset.
    pub fn lookup_bool(&self, group: &str, key: &str) -> Result<Option<bool>> {
        match self.lookup_last(group, key) {
            None | Some("") => Ok(None),
            Some(value) => parse_boolean(value).map(Some).map_err(|_| {
                ValueSnafu {
                    group,
                    key,
                    value,
                }
                .build()
            }),
        }
    }

    pub fn lookup_u32(&self, group: &str, key: &str) -> Result<Option<u32>> {
        match self.lookup_last(group, key) {
            None | Some("") => Ok(None),
            Some(value) => parse_u32(value).map(Some).map_err(|_| {
                ValueSnafu {
                    group,
                    key,
                    value,
                }
                .build()
            }),
        }
    }

    /// Append a value, creating the group when needed.
    pub fn add(&mut self, group: &str, key: &str, value: &str) {
        let index = self.ensure_group(group);
        self.groups[index].add(key, value);
    }

    /// Replace the last value of the key, or append it if there is none.
    pub fn set(&mut self, group: &str, key: &str, value: &str) {
        let index = self.ensure_group(group);
        self.groups[index].set(key, value);
    }

    /// Replace every value of the key with `values`.
    pub fn set_many<S: AsRef<str>>(&mut self, group: &str, key: &str, values: &[S]) {
        let index = self.ensure_group(group);
        self.groups[index].unset(key);
        for value in values {
            self.groups[index].add(key, value.as_ref());
        }
    }

    /// Append a command line, escaped so that it splits back into `args`.
    pub fn add_cmdline<S: AsRef<str>>(&mut self, group: &str, key: &str, args: &[S]) {
        self.add(group, key, &escape_words(args));
    }

    /// Rename a group. Entries are appended to an existing group of the new
    /// name.
    pub fn rename_group(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        let index = match self.groups.iter().position(|g| g.name == from) {
            Some(index) => index,
            None => return,
        };

        if let Some(target) = self.groups.iter().position(|g| g.name == to) {
            let moved = self.groups.remove(index);
            let target = if target > index { target - 1 } else { target };
            self.groups[target].entries.extend(moved.entries);
        } else {
            self.groups[index].name = to.to_string();
        }
    }
}

impl FromStr for UnitFile {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        UnitFile::parse(s)
    }
}

impl Display for UnitFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "[{}]", group.name)?;
            for (key, value) in group.entries.iter() {
                writeln!(f, "{}={}", key, value)?;
            }
        }
        Ok(())
    }
}
