//! # Object Dependency Graph
//!
//! Orders manifest objects so every object type runs after the types its relation
//! fields point at. Types are grouped into levels; types within one level do not depend
//! on each other and may be migrated concurrently.
//!
//! Self references never create an edge. A cycle between types is broken by releasing
//! the earliest object in manifest order that lies on the cycle; the references it makes
//! into the cycle are then resolved through deferral. Objects that merely depend on a
//! cycle keep waiting until every type they reference has been submitted.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::manifest::Manifest;

#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Object names in manifest order
    objects: Vec<String>,
    /// Indices each object depends on
    dependencies: Vec<HashSet<usize>>,
}

/// Processing order computed from a [`DependencyGraph`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingPlan {
    pub levels: Vec<Vec<String>>,
    /// Objects released early to break a dependency cycle
    pub cycle_breaks: Vec<String>,
}

impl ProcessingPlan {
    /// Flattened processing order
    pub fn order(&self) -> Vec<&str> {
        self.levels
            .iter()
            .flat_map(|level| level.iter().map(String::as_str))
            .collect()
    }
}

impl DependencyGraph {
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let objects: Vec<String> = manifest
            .objects
            .iter()
            .map(|object| object.api_name.clone())
            .collect();
        let index: HashMap<String, usize> = objects
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_ascii_lowercase(), i))
            .collect();

        let dependencies = manifest
            .objects
            .iter()
            .map(|object| {
                object
                    .dependencies()
                    .into_iter()
                    .filter_map(|dependency| {
                        let found = index.get(&dependency.to_ascii_lowercase()).copied();
                        if found.is_none() {
                            debug!(
                                object_type = %object.api_name,
                                dependency = %dependency,
                                "Dependency is not part of the manifest; references to it will be reported as orphans"
                            );
                        }
                        found
                    })
                    .collect()
            })
            .collect();

        Self {
            objects,
            dependencies,
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Compute dependency levels (Kahn's algorithm, level by level)
    pub fn plan(&self) -> ProcessingPlan {
        let mut remaining = self.dependencies.clone();
        let mut done = vec![false; self.objects.len()];
        let mut plan = ProcessingPlan::default();

        while done.iter().any(|finished| !finished) {
            let mut level: Vec<usize> = (0..self.objects.len())
                .filter(|&i| !done[i] && remaining[i].is_empty())
                .collect();

            if level.is_empty() {
                // Every pending object is blocked, so at least one of them sits on a cycle
                let Some(released) =
                    (0..self.objects.len()).find(|&i| !done[i] && on_cycle(&remaining, i))
                else {
                    break;
                };
                let name = &self.objects[released];
                warn!(
                    object_type = %name,
                    waiting_on = ?remaining[released]
                        .iter()
                        .map(|&i| self.objects[i].as_str())
                        .collect::<Vec<_>>(),
                    "Dependency cycle detected; releasing object early and deferring its references"
                );
                plan.cycle_breaks.push(name.clone());
                level.push(released);
            }

            for &i in &level {
                done[i] = true;
            }
            for dependencies in remaining.iter_mut() {
                for i in &level {
                    dependencies.remove(i);
                }
            }

            plan.levels
                .push(level.into_iter().map(|i| self.objects[i].clone()).collect());
        }

        plan
    }
}

/// Whether `start` can reach itself through the unresolved dependency edges
fn on_cycle(remaining: &[HashSet<usize>], start: usize) -> bool {
    let mut visited = HashSet::new();
    let mut stack: Vec<usize> = remaining[start].iter().copied().collect();
    while let Some(node) = stack.pop() {
        if node == start {
            return true;
        }
        if visited.insert(node) {
            stack.extend(remaining[node].iter().copied());
        }
    }
    false
}
