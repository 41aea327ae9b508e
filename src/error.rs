//! Error types for component creation, wiring and teardown

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Boxed error returned by user callbacks (constructors, setters, lifecycle methods, interceptors)
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Shared error source; `Arc` keeps [`DiError`] cheaply cloneable
pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

/// What an [`DiError::Ambiguous`] failure was choosing between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbiguityKind {
    /// More than one component qualifies for a dependency
    Dependency,
    /// More than one constructor binds with the same weight
    Constructor,
    /// More than one factory method binds with the same weight
    FactoryMethod,
}

impl fmt::Display for AmbiguityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dependency => f.write_str("dependency"),
            Self::Constructor => f.write_str("constructor"),
            Self::FactoryMethod => f.write_str("factory method"),
        }
    }
}

/// Errors that can occur while resolving, creating or destroying components
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// No descriptor or instance is registered under the name
    #[error("No component named '{name}' is defined")]
    NotFound { name: String },

    /// A by-type lookup found no candidate
    #[error("No qualifying component of type {type_name} is available")]
    NoComponentOfType { type_name: &'static str },

    /// Cyclic request for a name that cannot be exposed early
    #[error("Requested component '{name}' is currently in creation: {reason}")]
    CurrentlyInCreation { name: String, reason: String },

    /// Several equally qualified candidates
    #[error("Ambiguous {kind} for '{name}': expected a single match but found {}", .candidates.join(", "))]
    Ambiguous {
        name: String,
        kind: AmbiguityKind,
        candidates: Vec<String>,
    },

    /// The constructor, factory method or a lifecycle callback failed
    #[error("Error creating component '{name}': {reason}")]
    CreationFailed {
        name: String,
        reason: String,
        #[source]
        cause: Option<SharedError>,
        related: Vec<DiError>,
    },

    /// A constructor or factory parameter could not be satisfied
    #[error("Unsatisfied dependency of component '{name}' through {injection_point}: {reason}")]
    UnsatisfiedDependency {
        name: String,
        injection_point: String,
        reason: String,
        #[source]
        cause: Option<SharedError>,
        related: Vec<DiError>,
    },

    /// `register_singleton` collided with an existing instance
    #[error("Could not register object under name '{name}': there is already an object bound")]
    IdentityCollision { name: String },

    /// Singleton creation was attempted during `destroy_all`
    #[error(
        "Creation of singleton '{name}' is not allowed while singletons of this container are in destruction \
         (do not request a component from a destroy callback)"
    )]
    DestructionInProgress { name: String },

    /// Singleton creation was attempted after the container was destroyed
    #[error("Container has been destroyed; cannot create singleton '{name}'")]
    ContainerDestroyed { name: String },

    /// A destroy callback failed; collected, never propagated out of `destroy_all`
    #[error("Destroy method on component '{name}' failed: {reason}")]
    DestructionFailed {
        name: String,
        reason: String,
        #[source]
        cause: Option<SharedError>,
    },

    /// A resolved instance is not of the requested type
    #[error("Component '{name}' is not of required type {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    /// The descriptor cannot be acted upon
    #[error("Invalid descriptor for component '{name}': {reason}")]
    InvalidDescriptor { name: String, reason: String },

    /// The descriptor names a scope that was never registered
    #[error("No scope registered for scope name '{scope}' (component '{name}')")]
    ScopeNotActive { name: String, scope: String },

    /// Internal error
    #[error("Internal container error: {0}")]
    Internal(String),
}

impl DiError {
    /// Create a NotFound error
    #[inline]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create a CurrentlyInCreation error
    #[inline]
    pub fn in_creation(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CurrentlyInCreation {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a CreationFailed error without an underlying cause
    #[inline]
    pub fn creation_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            name: name.into(),
            reason: reason.into(),
            cause: None,
            related: Vec::new(),
        }
    }

    /// Wrap a user callback failure into CreationFailed
    pub fn creation_caused_by(name: impl Into<String>, reason: impl Into<String>, cause: BoxError) -> Self {
        Self::CreationFailed {
            name: name.into(),
            reason: reason.into(),
            cause: Some(Arc::from(cause)),
            related: Vec::new(),
        }
    }

    /// Wrap a destroy callback failure
    pub fn destruction_failed(name: impl Into<String>, reason: impl Into<String>, cause: BoxError) -> Self {
        Self::DestructionFailed {
            name: name.into(),
            reason: reason.into(),
            cause: Some(Arc::from(cause)),
        }
    }

    /// Create an UnsatisfiedDependency error
    pub fn unsatisfied(
        name: impl Into<String>,
        injection_point: impl Into<String>,
        reason: impl Into<String>,
        cause: Option<DiError>,
    ) -> Self {
        Self::UnsatisfiedDependency {
            name: name.into(),
            injection_point: injection_point.into(),
            reason: reason.into(),
            cause: cause.map(|c| Arc::new(c) as SharedError),
            related: Vec::new(),
        }
    }

    /// Create an InvalidDescriptor error
    #[inline]
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a TypeMismatch error for a type
    #[inline]
    pub fn type_mismatch<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::TypeMismatch {
            name: name.into(),
            expected: std::any::type_name::<T>(),
        }
    }

    /// Whether a constructor candidate failing with this error may be skipped
    /// in favour of the next candidate.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::NoComponentOfType { .. }
                | Self::UnsatisfiedDependency { .. }
                | Self::TypeMismatch { .. }
        )
    }

    /// Attach earlier failures as related causes.
    ///
    /// Only creation-class errors carry related causes; other variants are
    /// returned unchanged.
    pub fn with_related(mut self, causes: Vec<DiError>) -> Self {
        if causes.is_empty() {
            return self;
        }
        match &mut self {
            Self::CreationFailed { related, .. } | Self::UnsatisfiedDependency { related, .. } => {
                related.extend(causes);
            }
            _ => {}
        }
        self
    }

    /// Related causes gathered from earlier failed attempts
    pub fn related(&self) -> &[DiError] {
        match self {
            Self::CreationFailed { related, .. } | Self::UnsatisfiedDependency { related, .. } => related,
            _ => &[],
        }
    }

    /// Name of the component the error is about, if any
    pub fn component_name(&self) -> Option<&str> {
        match self {
            Self::NotFound { name }
            | Self::CurrentlyInCreation { name, .. }
            | Self::Ambiguous { name, .. }
            | Self::CreationFailed { name, .. }
            | Self::UnsatisfiedDependency { name, .. }
            | Self::IdentityCollision { name }
            | Self::DestructionInProgress { name }
            | Self::ContainerDestroyed { name }
            | Self::DestructionFailed { name, .. }
            | Self::TypeMismatch { name, .. }
            | Self::InvalidDescriptor { name, .. }
            | Self::ScopeNotActive { name, .. } => Some(name),
            Self::NoComponentOfType { .. } | Self::Internal(_) => None,
        }
    }

    /// Walk the `source` chain looking for a CurrentlyInCreation failure
    pub fn is_currently_in_creation(&self) -> bool {
        let mut current: Option<&(dyn StdError + 'static)> = Some(self);
        while let Some(mut err) = current {
            // shared sources surface as the `Arc` itself; look through it
            if let Some(shared) = err.downcast_ref::<SharedError>() {
                err = &**shared;
            }
            if let Some(DiError::CurrentlyInCreation { .. }) = err.downcast_ref::<DiError>() {
                return true;
            }
            current = err.source();
        }
        false
    }
}

/// Result type alias for container operations
pub type Result<T> = std::result::Result<T, DiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_message_lists_candidates() {
        let err = DiError::Ambiguous {
            name: "repo".into(),
            kind: AmbiguityKind::Dependency,
            candidates: vec!["primaryDb".into(), "replicaDb".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("dependency"));
        assert!(msg.contains("primaryDb, replicaDb"));
    }

    #[test]
    fn test_with_related_only_on_creation_errors() {
        let related = vec![DiError::not_found("a"), DiError::not_found("b")];

        let err = DiError::creation_failed("x", "boom").with_related(related.clone());
        assert_eq!(err.related().len(), 2);

        let err = DiError::not_found("x").with_related(related);
        assert!(err.related().is_empty());
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(DiError::not_found("a").is_recoverable());
        assert!(DiError::unsatisfied("a", "parameter 0", "missing", None).is_recoverable());
        assert!(!DiError::in_creation("a", "cycle").is_recoverable());
        assert!(!DiError::creation_failed("a", "boom").is_recoverable());
    }

    #[test]
    fn test_in_creation_found_through_source_chain() {
        let inner = DiError::in_creation("a", "cycle");
        let outer = DiError::unsatisfied("b", "parameter 0", "cycle", Some(inner));
        assert!(outer.is_currently_in_creation());
        assert!(!DiError::not_found("a").is_currently_in_creation());
    }

    #[test]
    fn test_creation_caused_by_keeps_source() {
        let cause: BoxError = "disk on fire".into();
        let err = DiError::creation_caused_by("db", "constructor failed", cause);
        let source = StdError::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("disk on fire"));
        assert_eq!(err.component_name(), Some("db"));
    }
}
