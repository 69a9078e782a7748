use crate::flags::RegistryOptions;

/// Settings fixed for the lifetime of a [`Registry`](crate::Registry).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RegistryConfig {
    time_tolerance: f64,
    capacity: usize,
    options: RegistryOptions,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            time_tolerance: 0.0,
            capacity: 0,
            options: RegistryOptions::default(),
        }
    }
}

impl RegistryConfig {
    /// Returns `None` if `time_tolerance` is negative or not finite.
    ///
    /// A node may be inserted with a time up to `time_tolerance`
    /// smaller than the previously inserted node. This absorbs
    /// floating point noise from drivers that compute event times
    /// in different populations independently.
    pub fn new(time_tolerance: f64) -> Option<Self> {
        if time_tolerance.is_finite() && time_tolerance >= 0.0 {
            Some(Self {
                time_tolerance,
                ..Self::default()
            })
        } else {
            None
        }
    }

    /// Pre-allocate room for `capacity` nodes.
    pub fn with_capacity(self, capacity: usize) -> Self {
        Self { capacity, ..self }
    }

    pub fn with_options(self, options: RegistryOptions) -> Self {
        Self { options, ..self }
    }

    pub fn time_tolerance(&self) -> f64 {
        self.time_tolerance
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn options(&self) -> RegistryOptions {
        self.options
    }
}
