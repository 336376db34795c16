//! Trace replay driver

use crate::config::SimConfig;
use crate::error::SimulatorResult;
use crate::memory::hierarchy::Hierarchy;
use crate::memory::Access;

/// Replays a trace against a hierarchy, one record at a time
#[derive(Debug)]
pub struct Simulator {
    hierarchy: Hierarchy,
    operations: Vec<Access>,
    /// Block addresses of every record, for optimal lookahead
    block_addresses: Vec<u64>,
    position: usize,
}

impl Simulator {
    pub fn make(
        config: &SimConfig,
        operations: Vec<Access>,
    ) -> SimulatorResult<Self> {
        config.validate()?;

        let hierarchy = Hierarchy::make(config);
        let block_addresses = operations
            .iter()
            .map(|access| hierarchy.block_address(access.address))
            .collect();

        Ok(Self { hierarchy, operations, block_addresses, position: 0 })
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn into_hierarchy(self) -> Hierarchy {
        self.hierarchy
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.operations.len()
    }

    /// Replay the next record. Returns false once the trace is exhausted.
    pub fn step(&mut self) -> bool {
        let Some(access) = self.operations.get(self.position) else {
            return false;
        };

        self.hierarchy.access(access.op, access.address, &self.block_addresses);
        self.hierarchy.advance();
        self.position += 1;
        true
    }

    /// Replay the rest of the trace
    pub fn run(&mut self) {
        log::info!(
            "replaying {} accesses from position {}",
            self.operations.len() - self.position.min(self.operations.len()),
            self.position
        );
        while self.step() {}
        log::info!("replay finished after {} accesses", self.position);
    }
}
