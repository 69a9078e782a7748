// This module encapsulates the bitflags API
// so that we don't leak details that may
// affect semver later on.

use bitflags::bitflags;

bitflags! {
    #[repr(transparent)]
    #[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
    struct RegistryBitFlags: u32 {
        const EMPTY = 0;
        const STRICT_VALIDATION = 1 << 1;
        const VALIDATE_ON_FINALIZE = 1 << 2;
    }
}

#[repr(transparent)]
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct RegistryOptions(RegistryBitFlags);

impl RegistryOptions {
    /// Require every recombination node to have both parents
    /// when the registry is validated.
    pub fn with_strict_validation(self) -> Self {
        Self(self.0 | RegistryBitFlags::STRICT_VALIDATION)
    }

    /// Check the neighbourhood of each node right after it is finalized.
    pub fn with_validate_on_finalize(self) -> Self {
        Self(self.0 | RegistryBitFlags::VALIDATE_ON_FINALIZE)
    }

    pub fn strict_validation(&self) -> bool {
        self.0.contains(RegistryBitFlags::STRICT_VALIDATION)
    }

    pub fn validate_on_finalize(&self) -> bool {
        self.0.contains(RegistryBitFlags::VALIDATE_ON_FINALIZE)
    }
}
