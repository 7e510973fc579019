//! Track signal-chain topology.
//!
//! Every stage a track could ever use is allocated once in a node arena owned
//! by the track. Toggling an effect never creates or frees nodes: the chain is
//! rewired by dropping every connection and reconnecting the enabled stages in
//! their fixed order.

use alloc::vec;
use alloc::vec::Vec;
use arrayvec::ArrayVec;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Node identifier in a chain arena.
    pub struct NodeId;
}

/// Number of distinct stage kinds.
pub const STAGE_COUNT: usize = 10;

/// Maximum number of stages a wired chain can contain.
pub const MAX_STAGES: usize = STAGE_COUNT;

/// A processing stage of a track chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Track gain (volume after solo/mute resolution).
    Input,
    /// Noise gate / downward expander.
    Expander,
    /// Noise reduction high-pass.
    Highpass,
    /// Noise reduction low-pass.
    Lowpass,
    /// Stereo panner.
    Pan,
    EqLow,
    EqMid,
    EqHigh,
    Limiter,
    /// Hand-off to the master bus.
    Output,
}

impl StageKind {
    /// Every kind, in chain order.
    pub const ORDER: [StageKind; STAGE_COUNT] = [
        StageKind::Input,
        StageKind::Expander,
        StageKind::Highpass,
        StageKind::Lowpass,
        StageKind::Pan,
        StageKind::EqLow,
        StageKind::EqMid,
        StageKind::EqHigh,
        StageKind::Limiter,
        StageKind::Output,
    ];

    const fn index(self) -> usize {
        self as usize
    }

    /// Short display label.
    pub const fn label(self) -> &'static str {
        match self {
            StageKind::Input => "Input",
            StageKind::Expander => "Gate",
            StageKind::Highpass => "HPF",
            StageKind::Lowpass => "LPF",
            StageKind::Pan => "Pan",
            StageKind::EqLow => "EQ Low",
            StageKind::EqMid => "EQ Mid",
            StageKind::EqHigh => "EQ High",
            StageKind::Limiter => "Limiter",
            StageKind::Output => "Out",
        }
    }
}

/// Which optional stages are enabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageFlags {
    pub expander: bool,
    pub highpass: bool,
    pub lowpass: bool,
    pub eq: bool,
    pub limiter: bool,
}

/// The ordered stage list for a set of enable flags.
///
/// Always starts with `Input` and ends with `Output`, with `Pan` in between.
pub fn plan_stages(flags: StageFlags) -> ArrayVec<StageKind, MAX_STAGES> {
    StageKind::ORDER
        .iter()
        .copied()
        .filter(|kind| match kind {
            StageKind::Input | StageKind::Pan | StageKind::Output => true,
            StageKind::Expander => flags.expander,
            StageKind::Highpass => flags.highpass,
            StageKind::Lowpass => flags.lowpass,
            StageKind::EqLow | StageKind::EqMid | StageKind::EqHigh => flags.eq,
            StageKind::Limiter => flags.limiter,
        })
        .collect()
}

/// Directed edge between two stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Connection {
    pub from: NodeId,
    pub to: NodeId,
}

/// Node arena plus the current wiring of one track chain.
#[derive(Clone, Debug)]
pub struct ChainGraph {
    nodes: SlotMap<NodeId, StageKind>,
    by_kind: [NodeId; STAGE_COUNT],
    connections: Vec<Connection>,
}

impl ChainGraph {
    /// Allocate one node per stage kind. Nothing is connected yet.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let mut by_kind = [NodeId::default(); STAGE_COUNT];
        for kind in StageKind::ORDER {
            by_kind[kind.index()] = nodes.insert(kind);
        }
        Self { nodes, by_kind, connections: Vec::new() }
    }

    /// The node allocated for a stage kind.
    pub fn node(&self, kind: StageKind) -> NodeId {
        self.by_kind[kind.index()]
    }

    /// Stage kind of a node.
    pub fn kind(&self, id: NodeId) -> Option<StageKind> {
        self.nodes.get(id).copied()
    }

    /// Number of allocated nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Remove every connection.
    pub fn disconnect_all(&mut self) {
        self.connections.clear();
    }

    /// Rewire the chain for the given flags.
    pub fn rebuild(&mut self, flags: StageFlags) {
        self.disconnect_all();
        let stages = plan_stages(flags);
        for pair in stages.windows(2) {
            let (from, to) = (self.node(pair[0]), self.node(pair[1]));
            self.connections.push(Connection { from, to });
        }
    }

    /// Connected nodes in processing order (sources first, `Output` last).
    pub fn processing_order(&self) -> ArrayVec<NodeId, MAX_STAGES> {
        topological_sort(self)
            .into_iter()
            .filter(|&id| self.connections.iter().any(|c| c.from == id || c.to == id))
            .collect()
    }
}

impl Default for ChainGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Topological sort via Kahn's algorithm.
///
/// Returns nodes ordered so that every source appears before its consumers.
/// Unconnected nodes are included; nodes on a cycle are not.
pub fn topological_sort(graph: &ChainGraph) -> Vec<NodeId> {
    let ids: Vec<NodeId> = StageKind::ORDER.iter().map(|&k| graph.node(k)).collect();
    let position = |id: NodeId| ids.iter().position(|&n| n == id);

    let mut in_degree = vec![0u32; ids.len()];
    for conn in &graph.connections {
        if let Some(i) = position(conn.to) {
            in_degree[i] += 1;
        }
    }

    // Seed in reverse so the LIFO pop visits nodes in stage order.
    let mut queue: Vec<NodeId> = ids
        .iter()
        .rev()
        .copied()
        .filter(|&id| position(id).is_some_and(|i| in_degree[i] == 0))
        .collect();

    let mut result = Vec::with_capacity(ids.len());
    while let Some(node_id) = queue.pop() {
        result.push(node_id);
        for conn in &graph.connections {
            if conn.from == node_id {
                if let Some(i) = position(conn.to) {
                    in_degree[i] -= 1;
                    if in_degree[i] == 0 {
                        queue.push(conn.to);
                    }
                }
            }
        }
    }
    result
}
