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

use crate::{DiffKind, Node, Shape};

/// Compares a decoded tree against its previous version.
///
/// Returns a copy of `current` with diff marks. Without a previous version, or when the two roots
/// differ in primitive, shape or name, the whole tree is marked as created. Children of maps and
/// big maps are matched by name, other children by position; previous children without a match
/// are appended marked as deleted. Scalar values of big map nodes are never compared.
pub fn diff(current: &Node, previous: Option<&Node>) -> Node {
    match previous {
        Some(previous) if same_identity(current, previous) => compare(current, previous),
        _ => marked(current, DiffKind::Created),
    }
}

fn same_identity(a: &Node, b: &Node) -> bool { a.prim == b.prim && a.shape == b.shape && a.name == b.name }

fn marked(node: &Node, kind: DiffKind) -> Node {
    let mut node = node.clone();
    node.mark(kind);
    node
}

fn compare(current: &Node, previous: &Node) -> Node {
    let mut node = Node { children: vec![], diff: None, previous_value: None, ..current.clone() };
    if current.shape != Shape::BigMap && current.value != previous.value {
        node.diff = Some(DiffKind::Updated);
        node.previous_value = previous.value.clone();
    }
    node.children = if current.shape.is_mapping() {
        by_name(&current.children, &previous.children)
    } else {
        by_position(&current.children, &previous.children)
    };
    node
}

fn by_name(current: &[Node], previous: &[Node]) -> Vec<Node> {
    let mut matched = vec![false; previous.len()];
    let mut children = Vec::with_capacity(current.len());
    for child in current {
        let found = previous
            .iter()
            .enumerate()
            .find(|(no, prev)| !matched[*no] && prev.name == child.name);
        match found {
            Some((no, prev)) => {
                matched[no] = true;
                children.push(diff(child, Some(prev)));
            }
            None => children.push(marked(child, DiffKind::Created)),
        }
    }
    children.extend(
        previous
            .iter()
            .zip(matched)
            .filter(|(_, matched)| !matched)
            .map(|(prev, _)| marked(prev, DiffKind::Deleted)),
    );
    children
}

fn by_position(current: &[Node], previous: &[Node]) -> Vec<Node> {
    let mut children = Vec::with_capacity(current.len().max(previous.len()));
    let mut deleted = vec![];
    for (no, child) in current.iter().enumerate() {
        match previous.get(no) {
            Some(prev) if same_identity(child, prev) => children.push(compare(child, prev)),
            Some(prev) => {
                deleted.push(marked(prev, DiffKind::Deleted));
                children.push(marked(child, DiffKind::Created));
            }
            None => children.push(marked(child, DiffKind::Created)),
        }
    }
    children.extend(deleted);
    children.extend(
        previous
            .iter()
            .skip(current.len())
            .map(|prev| marked(prev, DiffKind::Deleted)),
    );
    children
}

#[cfg(test)]
mod test {
    #![cfg_attr(coverage_nightly, coverage(off))]
    use micheline::Micheline;
    use serde_json::json;

    use super::*;
    use crate::meta::test::ty;
    use crate::{Metadata, Scalar};

    fn storage() -> Metadata {
        Metadata::build(&ty(json!({"prim": "pair", "args": [
            {"prim": "nat", "annots": ["%counter"]},
            {"prim": "map", "annots": ["%balances"], "args": [{"prim": "string"}, {"prim": "nat"}]},
            {"prim": "big_map", "annots": ["%ledger"], "args": [{"prim": "nat"}, {"prim": "bytes"}]}
        ]})))
        .unwrap()
    }

    fn value(counter: i64, balances: &[(&str, i64)], ledger: i64) -> Micheline {
        Micheline::seq([
            Micheline::int(counter),
            Micheline::seq(
                balances
                    .iter()
                    .map(|(key, val)| Micheline::elt(Micheline::string(*key), Micheline::int(*val))),
            ),
            Micheline::int(ledger),
        ])
    }

    #[test]
    fn identical() {
        let meta = storage();
        let node = meta.decode(&value(1, &[("a", 1)], 5)).unwrap();
        let result = diff(&node, Some(&node));
        assert!(!result.has_changes());
        assert_eq!(result, node);
    }

    #[test]
    fn no_previous() {
        let meta = storage();
        let node = meta.decode(&value(1, &[("a", 1)], 5)).unwrap();
        let result = diff(&node, None);
        assert_eq!(result.diff, Some(DiffKind::Created));
        assert!(result.children[1].children.iter().all(|c| c.diff == Some(DiffKind::Created)));
    }

    #[test]
    fn changes() {
        let meta = storage();
        let prev = meta.decode(&value(1, &[("a", 1), ("b", 2)], 5)).unwrap();
        let cur = meta.decode(&value(2, &[("b", 3), ("c", 4)], 6)).unwrap();
        let result = diff(&cur, Some(&prev));
        assert_eq!(result.diff, None);

        let counter = result.child("counter").unwrap();
        assert_eq!(counter.diff, Some(DiffKind::Updated));
        assert_eq!(counter.previous_value, Some(Scalar::from(1)));

        let balances = result.child("balances").unwrap();
        let marks = balances
            .children
            .iter()
            .map(|c| (c.name.as_deref().unwrap(), c.diff))
            .collect::<Vec<_>>();
        assert_eq!(marks, vec![
            ("b", Some(DiffKind::Updated)),
            ("c", Some(DiffKind::Created)),
            ("a", Some(DiffKind::Deleted))
        ]);
        assert_eq!(balances.children[0].previous_value, Some(Scalar::from(2)));

        // pointer change of a big map is not a value update
        assert_eq!(result.child("ledger").unwrap().diff, None);
    }

    #[test]
    fn variant_switch() {
        let meta = Metadata::build(&ty(json!({"prim": "or", "args": [
            {"prim": "nat", "annots": ["%a"]}, {"prim": "string", "annots": ["%b"]}
        ]})))
        .unwrap();
        let prev = meta.decode(&Micheline::left(Micheline::int(1))).unwrap();
        let cur = meta.decode(&Micheline::right(Micheline::string("x"))).unwrap();
        let result = diff(&cur, Some(&prev));
        assert_eq!(result.children.len(), 2);
        assert_eq!(result.children[0].name.as_deref(), Some("b"));
        assert_eq!(result.children[0].diff, Some(DiffKind::Created));
        assert_eq!(result.children[1].name.as_deref(), Some("a"));
        assert_eq!(result.children[1].diff, Some(DiffKind::Deleted));
    }

    #[test]
    fn list_growth() {
        let meta = Metadata::build(&ty(json!({"prim": "list", "args": [{"prim": "int"}]}))).unwrap();
        let prev = meta
            .decode(&Micheline::seq([Micheline::int(1), Micheline::int(2), Micheline::int(3)]))
            .unwrap();
        let cur = meta.decode(&Micheline::seq([Micheline::int(1), Micheline::int(5)])).unwrap();
        let result = diff(&cur, Some(&prev));
        let marks = result.children.iter().map(|c| c.diff).collect::<Vec<_>>();
        assert_eq!(marks, vec![None, Some(DiffKind::Updated), Some(DiffKind::Deleted)]);

        let shrunk = diff(&prev, Some(&cur));
        assert_eq!(shrunk.children[2].diff, Some(DiffKind::Created));
    }
}
