//! Structural queries over an immutable snapshot of a workflow graph.
//!
//! [`WorkflowGraph`] indexes nodes and connections once so both engines can
//! ask "what leaves this node?" without rescanning the connection list.
//! Adjacency lists keep connection order, which is what makes traversal
//! deterministic.

use std::collections::{HashMap, HashSet, VecDeque};

use nodes::Handle;

use crate::models::{Connection, Node};

/// Borrowed, indexed view of `(nodes, connections)`.
#[derive(Debug)]
pub struct WorkflowGraph<'a> {
    nodes: &'a [Node],
    /// First node carrying each ID.
    index: HashMap<&'a str, &'a Node>,
    outgoing: HashMap<&'a str, Vec<&'a Connection>>,
    incoming: HashMap<&'a str, Vec<&'a Connection>>,
}

impl<'a> WorkflowGraph<'a> {
    pub fn new(nodes: &'a [Node], connections: &'a [Connection]) -> Self {
        let mut index: HashMap<&str, &Node> = HashMap::with_capacity(nodes.len());
        for node in nodes {
            index.entry(node.id.as_str()).or_insert(node);
        }

        // Build adjacency lists in connection order.
        let mut outgoing: HashMap<&str, Vec<&Connection>> = HashMap::new();
        let mut incoming: HashMap<&str, Vec<&Connection>> = HashMap::new();
        for conn in connections {
            outgoing.entry(conn.from.as_str()).or_default().push(conn);
            incoming.entry(conn.to.as_str()).or_default().push(conn);
        }

        Self { nodes, index, outgoing, incoming }
    }

    pub fn nodes(&self) -> &'a [Node] {
        self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&'a Node> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Connections leaving `id`, in connection order.
    pub fn outgoing(&self, id: &str) -> &[&'a Connection] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Connections entering `id`, in connection order.
    pub fn incoming(&self, id: &str) -> &[&'a Connection] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_incoming(&self, id: &str) -> bool {
        !self.incoming(id).is_empty()
    }

    /// Trigger nodes, in node order.
    pub fn triggers(&self) -> impl Iterator<Item = &'a Node> + '_ {
        self.nodes.iter().filter(|n| n.is_trigger())
    }

    /// First connection leaving `id` through `handle`.
    pub fn branch_connection(&self, id: &str, handle: Handle) -> Option<&'a Connection> {
        self.outgoing(id)
            .iter()
            .copied()
            .find(|conn| conn.from_handle == handle)
    }

    /// IDs reachable from `starts` (inclusive), following every outgoing
    /// connection regardless of handle.
    pub fn reachable_from<I>(&self, starts: I) -> HashSet<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = starts.into_iter().collect();

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            for conn in self.outgoing(id) {
                if !seen.contains(conn.to.as_str()) {
                    queue.push_back(conn.to.as_str());
                }
            }
        }

        seen
    }

    /// Whether any directed cycle exists.
    ///
    /// Depth-first from every node in node order, keeping the current DFS
    /// path separate from the set of finished nodes. Stops at the first
    /// back-edge; the cycle itself is not reported.
    pub fn has_cycle(&self) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut on_stack: HashSet<&str> = HashSet::new();

        for root in self.nodes {
            let root = root.id.as_str();
            if !visited.insert(root) {
                continue;
            }
            on_stack.insert(root);

            // (node, index of the next outgoing connection to explore)
            let mut stack: Vec<(&'a str, usize)> = vec![(root, 0)];

            while let Some(top) = stack.last_mut() {
                let (id, cursor) = *top;
                match self.outgoing(id).get(cursor) {
                    Some(&conn) => {
                        top.1 += 1;
                        let target = conn.to.as_str();
                        if on_stack.contains(target) {
                            return true;
                        }
                        if visited.insert(target) {
                            on_stack.insert(target);
                            stack.push((target, 0));
                        }
                    }
                    None => {
                        on_stack.remove(id);
                        stack.pop();
                    }
                }
            }
        }

        false
    }
}
