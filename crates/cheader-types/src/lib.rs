//! C Header Type Model
//!
//! Canonical representation of the declarations extracted from C headers.
//!
//! ## Types
//!
//! A [`Type`] is a base name (`"unsigned int"`, `"struct point"`, a typedef
//! name) plus an ordered list of [`Modifier`]s applied base-outward and one
//! [`QualifierSet`] per level. `int *const a[4]` is the base `int` with the
//! modifiers `[Pointer, Array(4)]` and the qualifier sets `[{}, {const}, {}]`.
//!
//! Typedef chasing ([`Type::resolve`]) splices typedef modifiers in front of
//! the referring type's own, and [`Type::c_repr`] renders a type back to C
//! declaration syntax.
//!
//! ## Values
//!
//! [`Value`] holds evaluated constants, and [`eval`] evaluates the constant
//! expressions found in macro bodies, `#if` lines, array bounds, enum
//! members and initializers.
//!
//! ## Aggregates and macros
//!
//! [`Compound`] (struct/union layout), [`EnumDef`], [`Macro`] and
//! [`FnMacro`] (function-like macro with a precompiled substitution
//! template).

mod compound;
mod error;
pub mod eval;
mod macros;
mod render;
mod resolve;
mod ty;
mod value;
mod vocab;

pub use compound::{Compound, EnumDef, Field};
pub use error::{EvalError, EvalResult, MacroError, TypeError, TypeResult};
pub use eval::{eval_str, eval_tokens, ValueLookup};
pub use macros::{FnMacro, Macro, VA_ARGS};
pub use resolve::TypeLookup;
pub use ty::{FunctionSig, Modifier, Param, QualifierSet, Type};
pub use value::Value;
pub use vocab::{TypeVocabulary, BASE_TYPES, FIXED_WIDTH_TYPES, SIGN_MODIFIERS, SIZE_MODIFIERS};
