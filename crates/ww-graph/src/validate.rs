//! Structural checks run when a builder is frozen.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use ww_core::{PortId, PortKind, TankId, WwError, WwResult};

use crate::graph::{Port, Tank};

/// Kahn's algorithm over the tank dependency graph.
///
/// Ready tanks are taken lowest id first, so the order is deterministic and
/// follows creation order wherever dependencies allow. `None` if a cycle
/// leaves tanks unscheduled.
pub(crate) fn topological_order(deps: &DiGraph<TankId, ()>) -> Option<Vec<TankId>> {
    let mut indegree: Vec<usize> = deps
        .node_indices()
        .map(|n| deps.neighbors_directed(n, Direction::Incoming).count())
        .collect();
    let mut ready: BinaryHeap<Reverse<usize>> = indegree
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(deps.node_count());
    while let Some(Reverse(i)) = ready.pop() {
        let node = NodeIndex::new(i);
        order.push(deps[node]);
        for next in deps.neighbors_directed(node, Direction::Outgoing) {
            let d = &mut indegree[next.index()];
            *d -= 1;
            if *d == 0 {
                ready.push(Reverse(next.index()));
            }
        }
    }
    (order.len() == deps.node_count()).then_some(order)
}

/// Check ids, ownership and the producer/consumer tables agree.
pub(crate) fn validate_structure(
    tanks: &[Tank],
    ports: &[Port],
    producer: &[Option<PortId>],
    consumers: &[Vec<PortId>],
) -> WwResult<()> {
    let broken = |what| Err(WwError::Invariant { what });

    if producer.len() != ports.len() || consumers.len() != ports.len() {
        return broken("port tables have different lengths");
    }
    for (i, tank) in tanks.iter().enumerate() {
        if tank.id.slot() != i {
            return broken("tank ids are not contiguous");
        }
        for (&id, kind) in tank
            .slots
            .iter()
            .map(|id| (id, PortKind::Slot))
            .chain(tank.tubes.iter().map(|id| (id, PortKind::Tube)))
        {
            match ports.get(id.slot()) {
                Some(port) if port.tank == tank.id && port.kind() == kind => {}
                _ => return broken("tank lists a port it does not own"),
            }
        }
    }
    for (i, port) in ports.iter().enumerate() {
        if port.id.slot() != i {
            return broken("port ids are not contiguous");
        }
        if port.tank.slot() >= tanks.len() {
            return broken("port refers to a missing tank");
        }
        match port.kind() {
            PortKind::Slot => {
                if !consumers[i].is_empty() {
                    return broken("slot has consumers");
                }
                if let Some(tube) = producer[i] {
                    let fed = ports.get(tube.slot()).is_some_and(|t| t.kind() == PortKind::Tube)
                        && consumers[tube.slot()].contains(&port.id);
                    if !fed {
                        return broken("slot producer does not list the slot as consumer");
                    }
                }
            }
            PortKind::Tube => {
                if producer[i].is_some() {
                    return broken("tube has a producer");
                }
                for &slot in &consumers[i] {
                    if producer.get(slot.slot()).copied().flatten() != Some(port.id) {
                        return broken("tube consumer is fed by another tube");
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ww_core::Id;

    fn chain(edges: &[(u32, u32)], nodes: u32) -> DiGraph<TankId, ()> {
        let mut g = DiGraph::new();
        for i in 0..nodes {
            g.add_node(Id::from_index(i));
        }
        for &(a, b) in edges {
            g.update_edge(NodeIndex::new(a as usize), NodeIndex::new(b as usize), ());
        }
        g
    }

    #[test]
    fn order_prefers_creation_order() {
        let g = chain(&[(2, 0), (1, 0)], 4);
        let order: Vec<u32> = topological_order(&g).unwrap().iter().map(|id| id.index()).collect();
        assert_eq!(order, vec![1, 2, 0, 3]);
    }

    #[test]
    fn cycle_detected() {
        let g = chain(&[(0, 1), (1, 2), (2, 0)], 3);
        assert!(topological_order(&g).is_none());
    }

    #[test]
    fn empty_structure_is_valid() {
        assert!(validate_structure(&[], &[], &[], &[]).is_ok());
    }
}
