//! Static hierarchy configuration

use crate::error::ConfigError;
use crate::memory::geometry::is_pow_2;
use crate::memory::replacement::ReplacementPolicyKind;
use crate::memory::InclusionPolicy;

/// Size and associativity of one level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelConfig {
    pub size: u64,
    pub associativity: usize,
}

impl LevelConfig {
    pub fn make(size: u64, associativity: usize) -> Self {
        Self { size, associativity }
    }

    /// Bytes covered by one set, `None` if that overflows
    pub fn set_bytes(&self, block_size: u64) -> Option<u64> {
        block_size.checked_mul(self.associativity as u64)
    }

    pub fn num_sets(&self, block_size: u64) -> usize {
        match self.set_bytes(block_size) {
            None | Some(0) => 0,
            Some(set_bytes) => (self.size / set_bytes) as usize,
        }
    }

    pub fn validate(
        &self,
        level: &'static str,
        block_size: u64,
    ) -> Result<(), ConfigError> {
        if self.associativity == 0 {
            return Err(ConfigError::ZeroAssociativity(level));
        }
        // A set wider than any representable size cannot fit
        let Some(set_bytes) = self.set_bytes(block_size) else {
            return Err(ConfigError::NoSets(level));
        };
        if self.size % set_bytes != 0 {
            return Err(ConfigError::UnevenSize {
                level,
                size: self.size,
                set_bytes,
            });
        }
        let num_sets = self.num_sets(block_size) as u64;
        if num_sets == 0 {
            return Err(ConfigError::NoSets(level));
        }
        if !is_pow_2(num_sets) {
            return Err(ConfigError::SetsNotPowerOfTwo(level, num_sets));
        }
        Ok(())
    }
}

/// Whole hierarchy configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimConfig {
    pub block_size: u64,
    pub l1: LevelConfig,
    /// No L2 when absent
    pub l2: Option<LevelConfig>,
    pub replacement: ReplacementPolicyKind,
    pub inclusion: InclusionPolicy,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::make(
            32,
            LevelConfig::make(1024, 2),
            LevelConfig::make(8192, 4),
            ReplacementPolicyKind::default(),
            InclusionPolicy::default(),
        )
    }
}

impl SimConfig {
    /// A zero-sized L2 means a single-level hierarchy
    pub fn make(
        block_size: u64,
        l1: LevelConfig,
        l2: LevelConfig,
        replacement: ReplacementPolicyKind,
        inclusion: InclusionPolicy,
    ) -> Self {
        Self {
            block_size,
            l1,
            l2: (l2.size > 0).then_some(l2),
            replacement,
            inclusion,
        }
    }

    pub fn single_level(
        block_size: u64,
        l1: LevelConfig,
        replacement: ReplacementPolicyKind,
    ) -> Self {
        Self {
            block_size,
            l1,
            l2: None,
            replacement,
            inclusion: InclusionPolicy::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_pow_2(self.block_size) {
            return Err(ConfigError::BlockSizeNotPowerOfTwo(self.block_size));
        }
        self.l1.validate("L1", self.block_size)?;
        if let Some(l2) = &self.l2 {
            l2.validate("L2", self.block_size)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_zero_l2_size_means_single_level() {
        let config = SimConfig::make(
            16,
            LevelConfig::make(256, 1),
            LevelConfig::make(0, 0),
            ReplacementPolicyKind::Lru,
            InclusionPolicy::NonInclusive,
        );
        assert_eq!(config.l2, None);
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.l1.num_sets(config.block_size), 16);
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let mut config = SimConfig::default();
        config.block_size = 24;
        assert_eq!(
            config.validate(),
            Err(ConfigError::BlockSizeNotPowerOfTwo(24))
        );

        let mut config = SimConfig::default();
        config.l1.associativity = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroAssociativity("L1")));

        let mut config = SimConfig::default();
        config.l1 = LevelConfig::make(1000, 2);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnevenSize { level: "L1", .. })
        ));

        let mut config = SimConfig::default();
        config.l2 = Some(LevelConfig::make(3 * 32 * 4, 4));
        assert_eq!(
            config.validate(),
            Err(ConfigError::SetsNotPowerOfTwo("L2", 3))
        );

        let mut config = SimConfig::default();
        config.l1 = LevelConfig::make(0, 2);
        assert_eq!(config.validate(), Err(ConfigError::NoSets("L1")));
    }

    #[test]
    fn test_huge_set_is_rejected_without_overflow() {
        let mut config = SimConfig::default();
        config.block_size = 1 << 62;
        config.l1 = LevelConfig::make(1 << 62, 8);
        assert_eq!(config.l1.set_bytes(config.block_size), None);
        assert_eq!(config.l1.num_sets(config.block_size), 0);
        assert_eq!(config.validate(), Err(ConfigError::NoSets("L1")));
    }
}
