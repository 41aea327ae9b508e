//! Runtime type information for components and arguments
//!
//! Rust has no class hierarchy to reflect over, so every component type
//! carries an explicit [`TypeInfo`]: its own [`TypeKey`], an optional parent
//! lineage and the interfaces (traits) it declares. Assignability checks and
//! the type-difference weight used by constructor selection are computed
//! from this table.

use crate::{DiError, Injectable, Result};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Type-erased component instance.
///
/// Identity is pointer identity of the `Arc`; compare with [`same_instance`].
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Wrap a value as an [`Instance`]
#[inline]
pub fn instance<T: Injectable>(value: T) -> Instance {
    Arc::new(value)
}

/// Reference identity of two instances
#[inline]
pub fn same_instance(a: &Instance, b: &Instance) -> bool {
    Arc::ptr_eq(a, b)
}

/// Downcast an instance resolved for `name` to `Arc<T>`
#[inline]
pub fn downcast<T: Injectable>(name: &str, instance: Instance) -> Result<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| DiError::type_mismatch::<T>(name))
}

/// Identity of a type: `TypeId` plus its name for diagnostics
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for `T` (unsized types such as `dyn Trait` are allowed)
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[derive(Clone)]
struct TypeInfoInner {
    key: TypeKey,
    parent: Option<TypeInfo>,
    interfaces: Vec<TypeKey>,
    interface: bool,
}

/// Type lineage of a component or parameter type.
///
/// # Examples
///
/// ```rust
/// use component_injector::TypeInfo;
///
/// trait Repository: Send + Sync {}
/// struct BaseRepo;
/// struct SqlRepo;
///
/// let base = TypeInfo::of::<BaseRepo>().implements::<dyn Repository>();
/// let sql = TypeInfo::of::<SqlRepo>().extends(base.clone());
///
/// assert!(sql.is_assignable_to(&base));
/// assert!(sql.is_assignable_to(&TypeInfo::interface::<dyn Repository>()));
/// assert!(!base.is_assignable_to(&sql));
/// ```
#[derive(Clone)]
pub struct TypeInfo(Arc<TypeInfoInner>);

impl TypeInfo {
    /// Concrete type with no declared lineage
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(Arc::new(TypeInfoInner {
            key: TypeKey::of::<T>(),
            parent: None,
            interfaces: Vec::new(),
            interface: false,
        }))
    }

    /// Interface type (usually `dyn Trait`); widening to an interface costs
    /// one extra weight point during constructor selection.
    pub fn interface<T: ?Sized + 'static>() -> Self {
        Self(Arc::new(TypeInfoInner {
            key: TypeKey::of::<T>(),
            parent: None,
            interfaces: Vec::new(),
            interface: true,
        }))
    }

    /// Declare the parent type
    pub fn extends(mut self, parent: TypeInfo) -> Self {
        Arc::make_mut(&mut self.0).parent = Some(parent);
        self
    }

    /// Declare an implemented interface
    pub fn implements<I: ?Sized + 'static>(mut self) -> Self {
        Arc::make_mut(&mut self.0).interfaces.push(TypeKey::of::<I>());
        self
    }

    #[inline]
    pub fn key(&self) -> TypeKey {
        self.0.key
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.0.key.name()
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.0.key.id()
    }

    #[inline]
    pub fn parent(&self) -> Option<&TypeInfo> {
        self.0.parent.as_ref()
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.0.interface
    }

    /// Whether this is exactly `T`
    #[inline]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.0.key.id() == TypeId::of::<T>()
    }

    /// Whether a value of this type may be bound where `key` is expected
    pub fn is_assignable_to_key(&self, key: TypeKey) -> bool {
        let mut current = Some(self);
        while let Some(ty) = current {
            if ty.0.key == key || ty.0.interfaces.contains(&key) {
                return true;
            }
            current = ty.parent();
        }
        false
    }

    /// Whether a value of this type may be bound where `target` is expected
    #[inline]
    pub fn is_assignable_to(&self, target: &TypeInfo) -> bool {
        self.is_assignable_to_key(target.key())
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.0.key == other.0.key
    }
}

impl Eq for TypeInfo {}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("TypeInfo");
        s.field("name", &self.name());
        if let Some(parent) = self.parent() {
            s.field("parent", &parent.name());
        }
        if !self.0.interfaces.is_empty() {
            s.field("interfaces", &self.0.interfaces);
        }
        s.finish()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value together with the type it should be matched as
#[derive(Clone)]
pub struct TypedValue {
    value: Instance,
    ty: TypeInfo,
}

impl TypedValue {
    /// Literal value of type `T`
    pub fn new<T: Injectable>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            ty: TypeInfo::of::<T>(),
        }
    }

    /// Already erased value with an explicit type
    pub fn with_type(value: Instance, ty: TypeInfo) -> Self {
        Self { value, ty }
    }

    #[inline]
    pub fn value(&self) -> &Instance {
        &self.value
    }

    #[inline]
    pub fn ty(&self) -> &TypeInfo {
        &self.ty
    }

    #[inline]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn into_parts(self) -> (Instance, TypeInfo) {
        (self.value, self.ty)
    }
}

impl fmt::Debug for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedValue").field("type", &self.ty.name()).finish()
    }
}

// =============================================================================
// Type-difference weights
// =============================================================================

/// Weight of a rejected match
pub const MAX_WEIGHT: i32 = i32::MAX;

/// Bonus granted to a candidate whose raw (unconverted) arguments already fit
pub const RAW_MATCH_BONUS: i32 = 1024;

/// Weight of binding a value of type `arg` to a parameter of type `param`.
///
/// Exact match is 0, each step up the lineage adds 2 and widening to an
/// interface adds 1. `None` stands for a value that matches by construction
/// (an absent optional or a collection built for the parameter).
pub fn param_weight(param: &TypeInfo, arg: Option<&TypeInfo>) -> i32 {
    let Some(arg) = arg else { return 0 };
    if !arg.is_assignable_to(param) {
        return MAX_WEIGHT;
    }
    let mut weight = 0;
    let mut ancestor = arg.parent();
    while let Some(ty) = ancestor {
        if ty.key() == param.key() {
            weight += 2;
            break;
        } else if ty.is_assignable_to(param) {
            weight += 2;
            ancestor = ty.parent();
        } else {
            break;
        }
    }
    if param.is_interface() {
        weight += 1;
    }
    weight
}

/// Sum of [`param_weight`] over a signature; [`MAX_WEIGHT`] when any position is unassignable
pub fn type_difference_weight(params: &[TypeInfo], args: &[Option<TypeInfo>]) -> i32 {
    let mut total: i32 = 0;
    for (param, arg) in params.iter().zip(args) {
        let w = param_weight(param, arg.as_ref());
        if w == MAX_WEIGHT {
            return MAX_WEIGHT;
        }
        total = total.saturating_add(w);
    }
    total
}

/// Strict-mode weight: assignability only, no conversion distances
pub fn assignability_weight(
    params: &[TypeInfo],
    args: &[Option<TypeInfo>],
    raw_args: &[Option<TypeInfo>],
) -> i32 {
    let fits = |values: &[Option<TypeInfo>]| {
        params
            .iter()
            .zip(values)
            .all(|(p, v)| v.as_ref().is_none_or(|v| v.is_assignable_to(p)))
    };
    if !fits(args) {
        MAX_WEIGHT
    } else if !fits(raw_args) {
        MAX_WEIGHT - 512
    } else {
        MAX_WEIGHT - RAW_MATCH_BONUS
    }
}

/// Lenient-mode weight: the better of the converted weight and the raw weight minus the raw-match bonus
pub fn lenient_weight(
    params: &[TypeInfo],
    args: &[Option<TypeInfo>],
    raw_args: &[Option<TypeInfo>],
) -> i32 {
    let converted = type_difference_weight(params, args);
    let raw = type_difference_weight(params, raw_args).saturating_sub(RAW_MATCH_BONUS);
    converted.min(raw)
}

// =============================================================================
// Type conversion
// =============================================================================

/// Converts literal argument values to a required parameter type
pub trait TypeConverter: Send + Sync {
    /// Convert `value` to `target`, or `None` when no conversion applies
    fn convert(&self, value: &TypedValue, target: &TypeInfo) -> Option<TypedValue>;
}

/// Converter for strings to primitives and integer widening
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultConverter;

impl TypeConverter for DefaultConverter {
    fn convert(&self, value: &TypedValue, target: &TypeInfo) -> Option<TypedValue> {
        if value.ty().is_assignable_to(target) {
            return Some(value.clone());
        }
        let text = value
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| value.downcast_ref::<&'static str>().copied());
        if let Some(text) = text {
            return parse_into(text, target.key());
        }
        as_i128(value).and_then(|n| integer_into(n, target.key()))
    }
}

fn parse_into(text: &str, target: TypeKey) -> Option<TypedValue> {
    macro_rules! try_parse {
        ($($t:ty),*) => {
            $(
                if target == TypeKey::of::<$t>() {
                    return text.trim().parse::<$t>().ok().map(TypedValue::new);
                }
            )*
        };
    }
    try_parse!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char);
    if target == TypeKey::of::<String>() {
        return Some(TypedValue::new(text.to_owned()));
    }
    None
}

fn as_i128(value: &TypedValue) -> Option<i128> {
    macro_rules! widen {
        ($($t:ty),*) => {
            $(
                if let Some(v) = value.downcast_ref::<$t>() {
                    return i128::try_from(*v).ok();
                }
            )*
        };
    }
    widen!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
    None
}

fn integer_into(n: i128, target: TypeKey) -> Option<TypedValue> {
    macro_rules! narrow {
        ($($t:ty),*) => {
            $(
                if target == TypeKey::of::<$t>() {
                    return <$t>::try_from(n).ok().map(TypedValue::new);
                }
            )*
        };
    }
    narrow!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);
    None
}
