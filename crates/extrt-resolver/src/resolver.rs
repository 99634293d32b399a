//! The dependency resolver (spec §4.2), grounded in
//! `original_source/include/plugify/dependency_resolver.hpp`'s
//! `IDependencyResolver::Resolve` contract and in the graph-construction
//! style of `resolvo`-family resolvers.

use petgraph::graph::{DiGraph, NodeIndex};

use rustc_hash::{FxHashMap, FxHashSet};

use extrt_core::{DependencyIssue, Extension, ResolutionReport};
use extrt_types::UniqueId;

/// Stateless: every call to [`DependencyResolver::resolve`] is a pure
/// function of its input (spec §4.2 "Determinism").
#[derive(Debug, Default, Clone, Copy)]
pub struct DependencyResolver;

impl DependencyResolver {
    pub fn new() -> Self {
        Self
    }

    /// Run the full resolution algorithm over `extensions`, which must
    /// already be in `Parsed` state (manifests present). Never mutates its
    /// input; the caller (`ResolutionStage`) applies the resulting states.
    pub fn resolve(&self, extensions: &[Extension]) -> ResolutionReport {
        let mut report = ResolutionReport::default();
        if extensions.is_empty() {
            report.is_load_order_valid = true;
            return report;
        }

        let by_id: FxHashMap<UniqueId, &Extension> = extensions
            .iter()
            .map(|e| (e.id().clone(), e))
            .collect();

        // Step 1: index by name, demote all but the highest version.
        let mut by_name: FxHashMap<&str, Vec<&Extension>> = FxHashMap::default();
        for ext in extensions {
            by_name.entry(ext.name()).or_default().push(ext);
        }

        let mut viable: FxHashMap<&str, &Extension> = FxHashMap::default();
        for (name, group) in &by_name {
            if group.len() == 1 {
                viable.insert(name, group[0]);
                continue;
            }
            let mut sorted = group.clone();
            sorted.sort_by(|a, b| {
                b.manifest().unwrap().version.cmp(&a.manifest().unwrap().version)
            });
            viable.insert(name, sorted[0]);
            for dup in &sorted[1..] {
                report.add_issue(DependencyIssue::blocking(
                    dup.id().clone(),
                    "Duplicate name",
                    format!(
                        "'{name}' has {} candidates; only the highest version ({}) is used",
                        group.len(),
                        sorted[0].manifest().unwrap().version
                    ),
                ));
            }
        }

        // Step 2: synthesize plugin -> language-module dependency edges.
        let mut modules_by_language: FxHashMap<&str, &Extension> = FxHashMap::default();
        for ext in viable.values() {
            let manifest = ext.manifest().unwrap();
            if manifest.is_module() {
                modules_by_language.entry(manifest.language.as_str()).or_insert(ext);
            }
        }

        let mut dep_edges: Vec<(UniqueId, UniqueId)> = Vec::new();
        for ext in viable.values() {
            let manifest = ext.manifest().unwrap();
            if !manifest.is_plugin() {
                continue;
            }
            match modules_by_language.get(manifest.language.as_str()) {
                Some(module) => dep_edges.push((ext.id().clone(), module.id().clone())),
                None => report.add_issue(DependencyIssue::blocking(
                    ext.id().clone(),
                    "Missing language module",
                    format!("Language module '{}' is missing", manifest.language),
                )),
            }
        }

        // Step 3: obsoletes.
        for ext in viable.values() {
            let manifest = ext.manifest().unwrap();
            for obsolete in &manifest.obsoletes {
                let Some(target) = viable.get(obsolete.name.as_str()) else {
                    continue;
                };
                if target.id() == ext.id() {
                    continue;
                }
                let target_version = &target.manifest().unwrap().version;
                if obsolete.constraint.matches(target_version) {
                    report.add_issue(
                        DependencyIssue::blocking(
                            target.id().clone(),
                            "Obsoleted",
                            format!("obsoleted by '{}'", ext.name()),
                        )
                        .involving(ext.id().clone()),
                    );
                }
            }
        }

        // Step 4: conflicts.
        for ext in viable.values() {
            let manifest = ext.manifest().unwrap();
            for conflict in &manifest.conflicts {
                let Some(other) = viable.get(conflict.name.as_str()) else {
                    continue;
                };
                if other.id() == ext.id() {
                    continue;
                }
                let other_version = &other.manifest().unwrap().version;
                if conflict.constraint.matches(other_version) {
                    report.add_issue(
                        DependencyIssue::blocking(
                            ext.id().clone(),
                            "Conflict",
                            format!("conflicts with '{}'", other.name()),
                        )
                        .involving(other.id().clone()),
                    );
                }
            }
        }

        let mut blocked: FxHashSet<UniqueId> = report
            .issues
            .iter()
            .filter(|(_, issues)| issues.iter().any(|i| i.is_blocking))
            .map(|(id, _)| id.clone())
            .collect();

        // Step 5: check explicit dependencies.
        for ext in viable.values() {
            let manifest = ext.manifest().unwrap();
            for dep in &manifest.dependencies {
                match viable.get(dep.name.as_str()) {
                    None => {
                        if !dep.optional {
                            report.add_issue(DependencyIssue::blocking(
                                ext.id().clone(),
                                "Missing dependency",
                                extrt_foundation::ExtError::missing_dependency(dep.name.as_str())
                                    .message,
                            ));
                            blocked.insert(ext.id().clone());
                        }
                    }
                    Some(target) => {
                        let target_version = &target.manifest().unwrap().version;
                        if dep.constraint.matches(target_version) {
                            dep_edges.push((ext.id().clone(), target.id().clone()));
                        } else if !dep.optional {
                            let available: Vec<String> = by_name
                                .get(dep.name.as_str())
                                .into_iter()
                                .flatten()
                                .map(|e| e.manifest().unwrap().version.to_string())
                                .collect();
                            report.add_issue(DependencyIssue::blocking(
                                ext.id().clone(),
                                "Version conflict",
                                extrt_foundation::ExtError::version_conflict(
                                    dep.name.as_str(),
                                    dep.constraint.to_string(),
                                    available.join(", "),
                                )
                                .message,
                            ));
                            blocked.insert(ext.id().clone());
                        }
                    }
                }
            }
        }

        let resolved_ids: FxHashSet<UniqueId> = viable
            .values()
            .map(|e| e.id().clone())
            .filter(|id| !blocked.contains(id))
            .collect();

        let deps_of: FxHashMap<UniqueId, Vec<UniqueId>> = {
            let mut map: FxHashMap<UniqueId, Vec<UniqueId>> = FxHashMap::default();
            for (u, v) in &dep_edges {
                if resolved_ids.contains(u) && resolved_ids.contains(v) {
                    map.entry(u.clone()).or_default().push(v.clone());
                }
            }
            map
        };
        let dependents_of: FxHashMap<UniqueId, Vec<UniqueId>> = {
            let mut map: FxHashMap<UniqueId, Vec<UniqueId>> = FxHashMap::default();
            for (u, v) in &dep_edges {
                if resolved_ids.contains(u) && resolved_ids.contains(v) {
                    map.entry(v.clone()).or_default().push(u.clone());
                }
            }
            map
        };

        // Step 6: cycle detection (Tarjan SCC) restricted to resolved ids.
        let mut graph: DiGraph<UniqueId, ()> = DiGraph::new();
        let mut node_of: FxHashMap<UniqueId, NodeIndex> = FxHashMap::default();
        for id in &resolved_ids {
            let idx = graph.add_node(id.clone());
            node_of.insert(id.clone(), idx);
        }
        for (u, v) in &deps_of
            .iter()
            .flat_map(|(u, vs)| vs.iter().map(move |v| (u.clone(), v.clone())))
            .collect::<Vec<_>>()
        {
            if let (Some(&a), Some(&b)) = (node_of.get(u), node_of.get(v)) {
                graph.add_edge(a, b, ());
            }
        }

        let self_loops: FxHashSet<UniqueId> = deps_of
            .iter()
            .filter(|(u, vs)| vs.iter().any(|v| v == *u))
            .map(|(u, _)| u.clone())
            .collect();

        // SCC membership per cyclic id, used to render one concrete cycle path.
        let mut cyclic: FxHashSet<UniqueId> = self_loops.clone();
        let mut scc_of: FxHashMap<UniqueId, FxHashSet<UniqueId>> = FxHashMap::default();
        for component in petgraph::algo::tarjan_scc(&graph) {
            if component.len() > 1 {
                let members: FxHashSet<UniqueId> =
                    component.iter().map(|idx| graph[*idx].clone()).collect();
                for member in &members {
                    cyclic.insert(member.clone());
                    scc_of.insert(member.clone(), members.clone());
                }
            }
        }
        for id in &self_loops {
            scc_of.entry(id.clone()).or_insert_with(|| {
                let mut single = FxHashSet::default();
                single.insert(id.clone());
                single
            });
        }

        let mut reported_cycles: FxHashSet<Vec<UniqueId>> = FxHashSet::default();
        for id in &cyclic {
            let scc = scc_of.get(id).cloned().unwrap_or_else(|| {
                let mut single = FxHashSet::default();
                single.insert(id.clone());
                single
            });
            let cycle_path = find_cycle(&scc, &deps_of);
            if reported_cycles.insert(cycle_path.clone()) {
                let rendered = cycle_path
                    .iter()
                    .map(|member| by_id.get(member).map(|e| e.name().to_string()).unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join(" -> ");
                for member in &cycle_path[..cycle_path.len().saturating_sub(1)] {
                    report.add_issue(DependencyIssue::blocking(
                        member.clone(),
                        "Circular dependency",
                        format!("cycle detected: {rendered}"),
                    ));
                }
            }
        }

        // Step 7: topological sort (modules first, then name) over the
        // acyclic remainder.
        let eligible: FxHashSet<UniqueId> =
            resolved_ids.difference(&cyclic).cloned().collect();

        let mut in_degree: FxHashMap<UniqueId, usize> = eligible
            .iter()
            .map(|id| {
                let count = deps_of
                    .get(id)
                    .into_iter()
                    .flatten()
                    .filter(|d| eligible.contains(*d))
                    .count();
                (id.clone(), count)
            })
            .collect();

        let sort_key = |id: &UniqueId| -> (u8, String) {
            let ext = by_id[id];
            (if ext.is_module() { 0 } else { 1 }, ext.name().to_string())
        };

        let mut ready: Vec<UniqueId> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(id, _)| id.clone())
            .collect();

        let mut load_order = Vec::new();
        while !ready.is_empty() {
            ready.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
            let next = ready.remove(0);
            load_order.push(next.clone());
            if let Some(dependents) = dependents_of.get(&next) {
                for dependent in dependents {
                    if !eligible.contains(dependent) {
                        continue;
                    }
                    if let Some(d) = in_degree.get_mut(dependent) {
                        *d -= 1;
                        if *d == 0 {
                            ready.push(dependent.clone());
                        }
                    }
                }
            }
        }

        report.dependency_graph = deps_of;
        report.reverse_dependency_graph = dependents_of;
        report.load_order = load_order;
        report.is_load_order_valid = cyclic.is_empty();

        report
    }
}

/// Reconstruct one concrete cycle within `scc` for diagnostics, starting at
/// the smallest id (spec §4.2 step 6 "canonical rotation").
fn find_cycle(scc: &FxHashSet<UniqueId>, deps_of: &FxHashMap<UniqueId, Vec<UniqueId>>) -> Vec<UniqueId> {
    let mut ordered: Vec<UniqueId> = scc.iter().cloned().collect();
    ordered.sort_by_key(|id| id.value());
    let start = ordered[0].clone();

    let mut path = vec![start.clone()];
    let mut seen: FxHashSet<UniqueId> = FxHashSet::default();
    seen.insert(start.clone());
    let mut current = start.clone();

    loop {
        let next = deps_of
            .get(&current)
            .into_iter()
            .flatten()
            .find(|n| scc.contains(n));
        match next {
            Some(n) if *n == start => {
                path.push(start.clone());
                return path;
            }
            Some(n) if !seen.contains(n) => {
                seen.insert(n.clone());
                path.push(n.clone());
                current = n.clone();
            }
            Some(n) => {
                if let Some(pos) = path.iter().position(|p| p == n) {
                    let mut cycle = path[pos..].to_vec();
                    cycle.push(n.clone());
                    return cycle;
                }
                return path;
            }
            None => return path,
        }
    }
}
