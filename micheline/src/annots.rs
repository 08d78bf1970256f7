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

/// Annotations attached to a primitive application.
///
/// Michelson distinguishes annotations by their leading sigil: `%` for field (and entrypoint)
/// names, `:` for type names and `@` for variable names. Only the first annotation of each kind is
/// retained; an annotation consisting of the sigil alone is treated as absent.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
#[derive(Serialize, Deserialize)]
pub struct Annotations {
    pub field: Option<String>,
    pub type_name: Option<String>,
    pub var: Option<String>,
}

impl Annotations {
    pub fn parse<'a>(annots: impl IntoIterator<Item = &'a str>) -> Self {
        let mut me = Self::default();
        for annot in annots {
            let (slot, name) = match annot.split_at_checked(1) {
                Some(("%", name)) => (&mut me.field, name),
                Some((":", name)) => (&mut me.type_name, name),
                Some(("@", name)) => (&mut me.var, name),
                _ => continue,
            };
            if slot.is_none() && !name.is_empty() {
                *slot = Some(name.to_owned());
            }
        }
        me
    }

    pub fn is_empty(&self) -> bool { self.field.is_none() && self.type_name.is_none() && self.var.is_none() }
}

#[cfg(test)]
mod test {
    #![cfg_attr(coverage_nightly, coverage(off))]
    use super::*;

    #[test]
    fn parse() {
        let annots = Annotations::parse(["%from", ":address", "@sender", "%to"]);
        assert_eq!(annots.field.as_deref(), Some("from"));
        assert_eq!(annots.type_name.as_deref(), Some("address"));
        assert_eq!(annots.var.as_deref(), Some("sender"));
    }

    #[test]
    fn empty_annotations() {
        let annots = Annotations::parse(["%", ":", "x"]);
        assert!(annots.is_empty());
        assert!(Annotations::parse(Vec::<&str>::new()).is_empty());
    }
}
