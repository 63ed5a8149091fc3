//! Stable topological ordering.

use std::collections::HashMap;
use std::hash::Hash;

/// Result of [`stable_topological`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering<K> {
    pub order: Vec<K>,
    /// Edges `(dependent, dependency)` ignored to break cycles
    pub broken: Vec<(K, K)>,
}

/// Order `items` so every dependency comes before its dependents, otherwise
/// keeping the input order. Dependencies outside `items` are ignored.
///
/// Strongly connected components are found depth-first (Tarjan) with an
/// explicit stack. A component larger than one item is a cycle: its items are
/// emitted together in input order, and every edge pointing forward inside it
/// is reported as broken.
pub fn stable_topological<K, F>(items: &[K], mut dependencies: F) -> Ordering<K>
where
    K: Copy + Eq + Hash,
    F: FnMut(K) -> Vec<K>,
{
    let mut position: HashMap<K, usize> = HashMap::with_capacity(items.len());
    for (i, &item) in items.iter().enumerate() {
        position.entry(item).or_insert(i);
    }

    let edges: Vec<Vec<usize>> = items
        .iter()
        .enumerate()
        .map(|(i, &item)| {
            if position[&item] != i {
                return Vec::new();
            }
            dependencies(item)
                .into_iter()
                .filter_map(|d| position.get(&d).copied())
                .filter(|&d| d != i)
                .collect()
        })
        .collect();

    let mut index: Vec<Option<usize>> = vec![None; items.len()];
    let mut low = vec![0; items.len()];
    let mut on_stack = vec![false; items.len()];
    let mut component_stack: Vec<usize> = Vec::new();
    let mut counter = 0;

    let mut order = Vec::with_capacity(position.len());
    let mut broken = Vec::new();

    for start in 0..items.len() {
        if position[&items[start]] != start || index[start].is_some() {
            continue;
        }

        index[start] = Some(counter);
        low[start] = counter;
        counter += 1;
        on_stack[start] = true;
        component_stack.push(start);

        // (item, index of the next dependency to visit)
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

        while let Some((node, next)) = stack.pop() {
            if let Some(&dep) = edges[node].get(next) {
                stack.push((node, next + 1));
                match index[dep] {
                    None => {
                        index[dep] = Some(counter);
                        low[dep] = counter;
                        counter += 1;
                        on_stack[dep] = true;
                        component_stack.push(dep);
                        stack.push((dep, 0));
                    }
                    Some(dep_index) if on_stack[dep] => {
                        low[node] = low[node].min(dep_index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            if let Some(&(parent, _)) = stack.last() {
                low[parent] = low[parent].min(low[node]);
            }
            if index[node] != Some(low[node]) {
                continue;
            }

            let mut component = Vec::new();
            while let Some(member) = component_stack.pop() {
                on_stack[member] = false;
                component.push(member);
                if member == node {
                    break;
                }
            }
            component.sort_unstable();

            if component.len() > 1 {
                for &member in &component {
                    for &dep in &edges[member] {
                        if dep > member && component.binary_search(&dep).is_ok() {
                            broken.push((items[member], items[dep]));
                        }
                    }
                }
            }
            order.extend(component.into_iter().map(|member| items[member]));
        }
    }

    Ordering { order, broken }
}
