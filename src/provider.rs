//! Provider traits and component scopes
//!
//! These define what can be stored in the container and how long an
//! instance lives.

use std::any::TypeId;
use std::fmt;

/// Marker trait for types that can be managed by the container.
///
/// This is automatically implemented for all types that are `Send + Sync + 'static`.
/// You never need to implement this manually.
///
/// # Examples
///
/// ```rust
/// // Any type that is Send + Sync + 'static works automatically
/// struct MyService {
///     name: String,
/// }
///
/// // No impl needed - it just works!
/// ```
pub trait Injectable: Send + Sync + 'static {
    /// Returns the TypeId of this type (for internal use)
    #[inline]
    fn type_id_of() -> TypeId
    where
        Self: Sized,
    {
        TypeId::of::<Self>()
    }

    /// Returns the type name for debugging
    #[inline]
    fn type_name_of() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }
}

// Blanket implementation - everything that's Send + Sync + 'static is Injectable
impl<T: Send + Sync + 'static> Injectable for T {}

/// Component scope
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// One instance per name for the container's lifetime
    #[default]
    Singleton,

    /// New instance built on every request
    Prototype,

    /// Instance lifetime delegated to a registered [`CustomScope`](crate::CustomScope)
    Custom(String),
}

impl Scope {
    /// Custom scope by name
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    #[inline]
    pub fn is_singleton(&self) -> bool {
        matches!(self, Self::Singleton)
    }

    #[inline]
    pub fn is_prototype(&self) -> bool {
        matches!(self, Self::Prototype)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singleton => f.write_str("singleton"),
            Self::Prototype => f.write_str("prototype"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}
