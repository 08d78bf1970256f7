// TZINDEX: Contract value transcoding for indexers of Michelson-based chains
//
// SPDX-License-Identifier: Apache-2.0
//
// Copyright (C) 2024-2025 TZINDEX contributors.
// All rights under the above copyrights are reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except
// in compliance with the License. You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License
// is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express
// or implied. See the License for the specific language governing permissions and limitations under
// the License.

use core::fmt::{self, Display, Formatter};
use core::ops::Deref;
use core::str::FromStr;

/// Single step of a binary path.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub enum PathStep {
    /// First branch of a pair or `Left` branch of an or.
    #[display("0")]
    Left,
    /// Second branch of a pair or `Right` branch of an or.
    #[display("1")]
    Right,
    #[display("k")]
    Key,
    #[display("v")]
    Value,
    #[display("l")]
    ListItem,
    #[display("s")]
    SetItem,
    #[display("o")]
    Some,
}

impl PathStep {
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '0' => PathStep::Left,
            '1' => PathStep::Right,
            'k' => PathStep::Key,
            'v' => PathStep::Value,
            'l' => PathStep::ListItem,
            's' => PathStep::SetItem,
            'o' => PathStep::Some,
            _ => return None,
        })
    }

    pub fn is_branch(self) -> bool { matches!(self, PathStep::Left | PathStep::Right) }
}

/// Address of a node inside a comb-normalized type tree.
///
/// Paths start with `0` for the root and are extended with `/`-separated [`PathStep`]s.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BinPath(String);

#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display("invalid binary path '{0}'")]
pub struct InvalidPath(pub String);

impl BinPath {
    pub const ROOT: &'static str = "0";

    pub fn root() -> Self { BinPath(Self::ROOT.to_owned()) }

    pub fn is_root(&self) -> bool { self.0 == Self::ROOT }

    pub fn as_str(&self) -> &str { self.0.as_str() }

    pub fn join(&self, step: PathStep) -> Self { BinPath(format!("{}/{step}", self.0)) }

    pub fn join_all(&self, steps: impl IntoIterator<Item = PathStep>) -> Self {
        let mut path = self.clone();
        for step in steps {
            path = path.join(step);
        }
        path
    }

    /// Steps leading from the root to this path.
    pub fn steps(&self) -> impl Iterator<Item = PathStep> + '_ {
        self.0
            .split('/')
            .skip(1)
            .filter_map(|s| s.chars().next().and_then(PathStep::from_char))
    }

    pub fn depth(&self) -> usize { self.steps().count() }

    pub fn parent(&self) -> Option<Self> { self.0.rsplit_once('/').map(|(head, _)| BinPath(head.to_owned())) }

    /// Steps leading from `ancestor` to this path, or `None` if `ancestor` is not a prefix of the
    /// path. An empty vector is returned when both paths are equal.
    pub fn steps_from(&self, ancestor: &BinPath) -> Option<Vec<PathStep>> {
        if self == ancestor {
            return Some(vec![]);
        }
        let rest = self
            .0
            .strip_prefix(ancestor.as_str())?
            .strip_prefix('/')?;
        Some(
            rest.split('/')
                .filter_map(|s| s.chars().next().and_then(PathStep::from_char))
                .collect(),
        )
    }
}

impl Deref for BinPath {
    type Target = str;

    fn deref(&self) -> &Self::Target { self.0.as_str() }
}

impl Display for BinPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl FromStr for BinPath {
    type Err = InvalidPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = s.split('/');
        if segments.next() != Some(Self::ROOT) {
            return Err(InvalidPath(s.to_owned()));
        }
        for segment in segments {
            let mut chars = segment.chars();
            match (chars.next().and_then(PathStep::from_char), chars.next()) {
                (Some(_), None) => {}
                _ => return Err(InvalidPath(s.to_owned())),
            }
        }
        Ok(BinPath(s.to_owned()))
    }
}

impl TryFrom<String> for BinPath {
    type Error = InvalidPath;

    fn try_from(value: String) -> Result<Self, Self::Error> { Self::from_str(&value) }
}

impl From<BinPath> for String {
    fn from(path: BinPath) -> Self { path.0 }
}
