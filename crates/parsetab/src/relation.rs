//! Binary relations over symbols and the closure algebra used by the analyses.

use crate::types::{Map, Set};
use std::hash::Hash;

/// A directed relation stored as an adjacency map.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation<T: Hash + Eq> {
    edges: Map<T, Set<T>>,
}

impl<T: Hash + Eq> Default for Relation<T> {
    fn default() -> Self {
        Self {
            edges: Map::default(),
        }
    }
}

impl<T> Relation<T>
where
    T: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the edge `left -> right`. Returns `false` if it was already present.
    pub fn add(&mut self, left: T, right: T) -> bool {
        self.edges.entry(left).or_default().insert(right)
    }

    pub fn contains(&self, left: &T, right: &T) -> bool {
        self.edges
            .get(left)
            .map_or(false, |targets| targets.contains(right))
    }

    pub fn get(&self, key: &T) -> Option<&Set<T>> {
        self.edges.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, &Set<T>)> + '_ {
        self.edges.iter()
    }

    pub fn into_map(self) -> Map<T, Set<T>> {
        self.edges
    }

    /// Transitive closure.
    ///
    /// Every node that occurs as a target also gets an entry, possibly empty.
    #[tracing::instrument(skip_all)]
    pub fn closure(&self) -> Self {
        let mut result = self.edges.clone();
        for target in self.edges.values().flatten() {
            if !result.contains_key(target) {
                result.insert(target.clone(), Set::default());
            }
        }

        for k in 0..result.len() {
            let (key, via) = match result.get_index(k) {
                Some((key, via)) if !via.is_empty() => (key.clone(), via.clone()),
                _ => continue,
            };
            for targets in result.values_mut() {
                if targets.contains(&key) {
                    targets.extend(via.iter().cloned());
                }
            }
        }

        Self { edges: result }
    }

    /// Spread the direct contributions in `self` along `propagation`.
    ///
    /// For every `s`, the result holds `self[s]` plus `self[t]` for each `t`
    /// reachable from `s` in `propagation`.
    #[tracing::instrument(skip_all)]
    pub fn propagate(&self, propagation: &Relation<T>) -> Self {
        let mut result = self.edges.clone();
        for (s, reachable) in propagation.closure().edges {
            for t in &reachable {
                if let Some(immediate) = self.edges.get(t) {
                    result
                        .entry(s.clone())
                        .or_default()
                        .extend(immediate.iter().cloned());
                }
            }
        }
        Self { edges: result }
    }

    /// Find a cycle by depth-first search.
    ///
    /// The witness is the search path ending with the node that closes the
    /// cycle, e.g. `[A, B, A]`. Returns an empty vector if the relation is acyclic.
    pub fn cycle(&self) -> Vec<T> {
        let mut done = Set::default();
        let mut path = vec![];
        for key in self.edges.keys() {
            if self.find_cycle(key, &mut path, &mut done) {
                return path;
            }
        }
        vec![]
    }

    fn find_cycle(&self, node: &T, path: &mut Vec<T>, done: &mut Set<T>) -> bool {
        if done.contains(node) {
            return false;
        }
        if path.contains(node) {
            path.push(node.clone());
            return true;
        }

        path.push(node.clone());
        if let Some(targets) = self.edges.get(node) {
            for target in targets {
                if self.find_cycle(target, path, done) {
                    return true;
                }
            }
        }
        path.pop();
        done.insert(node.clone());
        false
    }
}

impl<T> FromIterator<(T, T)> for Relation<T>
where
    T: Clone + Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = (T, T)>>(iter: I) -> Self {
        let mut relation = Self::new();
        for (left, right) in iter {
            relation.add(left, right);
        }
        relation
    }
}
