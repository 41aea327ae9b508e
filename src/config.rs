//! Container-wide settings

/// Container behaviour switches.
///
/// # Examples
///
/// ```rust
/// use component_injector::{Container, ContainerConfig};
///
/// let config = ContainerConfig::default()
///     .with_lenient_constructor_resolution(false)
///     .with_allow_circular_references(false);
///
/// let container = Container::with_config(config);
/// assert!(!container.config().lenient_constructor_resolution);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Register early references for singletons in creation so setter cycles resolve
    pub allow_circular_references: bool,
    /// Tolerate an early reference that differs from the final (wrapped) instance
    pub allow_raw_injection_despite_wrapping: bool,
    /// Default constructor resolution mode for descriptors that do not set one
    pub lenient_constructor_resolution: bool,
    /// Whether non-public constructors are candidates by default
    pub non_public_access_allowed: bool,
    /// Queue property injections that target a singleton still in its constructor
    pub defer_cyclic_property_injection: bool,
    /// Whether registering an existing name replaces its descriptor
    pub allow_descriptor_overriding: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            allow_circular_references: true,
            allow_raw_injection_despite_wrapping: false,
            lenient_constructor_resolution: true,
            non_public_access_allowed: true,
            defer_cyclic_property_injection: true,
            allow_descriptor_overriding: true,
        }
    }
}

impl ContainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allow_circular_references(mut self, allow: bool) -> Self {
        self.allow_circular_references = allow;
        self
    }

    pub fn with_allow_raw_injection_despite_wrapping(mut self, allow: bool) -> Self {
        self.allow_raw_injection_despite_wrapping = allow;
        self
    }

    pub fn with_lenient_constructor_resolution(mut self, lenient: bool) -> Self {
        self.lenient_constructor_resolution = lenient;
        self
    }

    pub fn with_non_public_access_allowed(mut self, allowed: bool) -> Self {
        self.non_public_access_allowed = allowed;
        self
    }

    pub fn with_defer_cyclic_property_injection(mut self, defer: bool) -> Self {
        self.defer_cyclic_property_injection = defer;
        self
    }

    pub fn with_allow_descriptor_overriding(mut self, allow: bool) -> Self {
        self.allow_descriptor_overriding = allow;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ContainerConfig::default();
        assert!(config.allow_circular_references);
        assert!(!config.allow_raw_injection_despite_wrapping);
        assert!(config.lenient_constructor_resolution);
        assert!(config.defer_cyclic_property_injection);
    }

    #[test]
    fn test_builder_chain() {
        let config = ContainerConfig::new()
            .with_allow_descriptor_overriding(false)
            .with_non_public_access_allowed(false);
        assert!(!config.allow_descriptor_overriding);
        assert!(!config.non_public_access_allowed);
        assert_eq!(config.allow_circular_references, ContainerConfig::default().allow_circular_references);
    }
}
