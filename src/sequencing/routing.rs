/// Fixed-point gain that maps to 1.0.
pub const ROUTING_UNITY: u16 = 16_384;

/// One send from a track's output into another track's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoutingEdge {
    pub destination: usize,
    pub source: usize,
    /// Gain in 1/16384 steps.
    pub gain: u16,
}

impl RoutingEdge {
    pub fn new(destination: usize, source: usize, gain: u16) -> Self {
        Self {
            destination,
            source,
            gain,
        }
    }

    /// Full-level send.
    pub fn unity(destination: usize, source: usize) -> Self {
        Self::new(destination, source, ROUTING_UNITY)
    }

    #[inline]
    pub fn level(&self) -> f32 {
        self.gain as f32 / ROUTING_UNITY as f32
    }

    /// Table form `(destination, source, gain)`.
    pub fn from_table(table: &[[u16; 3]]) -> Vec<RoutingEdge> {
        table
            .iter()
            .map(|&[destination, source, gain]| {
                RoutingEdge::new(destination as usize, source as usize, gain)
            })
            .collect()
    }
}
