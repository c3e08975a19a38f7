use crate::problem::node::NodeIdx;

/// Read access to a candidate route, as seen by the route status scan.
pub trait NodeSequence {
    /// Whether the scan may swap an unusable station for another ranked station.
    const SUBSTITUTES_STATIONS: bool = false;

    fn len(&self) -> usize;

    fn node(&self, index: usize) -> NodeIdx;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn replace(&mut self, _index: usize, _node: NodeIdx) {}
}

/// A plain node list.
pub struct Nodes<'a>(pub &'a [NodeIdx]);

impl NodeSequence for Nodes<'_> {
    #[inline]
    fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    fn node(&self, index: usize) -> NodeIdx {
        self.0[index]
    }
}

/// A node list with `node` virtually inserted before `position`.
///
/// ```text
/// nodes:    [D, a, b, D]        position = 2
/// sequence: [D, a, node, b, D]
/// ```
pub struct WithInsertion<'a> {
    nodes: &'a [NodeIdx],
    node: NodeIdx,
    position: usize,
}

impl<'a> WithInsertion<'a> {
    /// `None` when `position` is outside of the route interior.
    pub fn new(nodes: &'a [NodeIdx], node: NodeIdx, position: usize) -> Option<Self> {
        if position == 0 || position >= nodes.len() {
            return None;
        }

        Some(WithInsertion {
            nodes,
            node,
            position,
        })
    }
}

impl NodeSequence for WithInsertion<'_> {
    #[inline]
    fn len(&self) -> usize {
        self.nodes.len() + 1
    }

    #[inline]
    fn node(&self, index: usize) -> NodeIdx {
        match index.cmp(&self.position) {
            std::cmp::Ordering::Less => self.nodes[index],
            std::cmp::Ordering::Equal => self.node,
            std::cmp::Ordering::Greater => self.nodes[index - 1],
        }
    }
}

/// A mutable node list in which stations may be substituted while scanning.
pub struct SubstitutingNodes<'a>(pub &'a mut [NodeIdx]);

impl NodeSequence for SubstitutingNodes<'_> {
    const SUBSTITUTES_STATIONS: bool = true;

    #[inline]
    fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    fn node(&self, index: usize) -> NodeIdx {
        self.0[index]
    }

    fn replace(&mut self, index: usize, node: NodeIdx) {
        self.0[index] = node;
    }
}
