//! Opaque type wrappers
//!
//! A wrapper holds exactly one host reference and nothing else. Wrapping is a
//! cast: it is recorded in the expression so lowering can erase it, and it
//! never produces a runtime artifact of its own.

use std::marker::PhantomData;

use crate::descriptor::{HostArg, MemberDescriptor};
use crate::expr::{Arg, Expr};
use crate::value::CheapClone;

/// A typed façade over one host value
pub trait Opaque: Sized {
    /// The host type this wrapper stands for
    const TYPE_NAME: &'static str;

    /// Adopt a host expression without recording a cast
    fn from_host(host: Expr) -> Self;

    fn host(&self) -> &Expr;

    fn into_host(self) -> Expr;

    /// The opaque cast `new T(value)`. Lowering erases it.
    fn wrap(value: impl Into<HostArg>) -> Self {
        Self::from_host(Expr::wrap(Self::TYPE_NAME, value.into().0))
    }

    /// Reinterpret as another opaque type
    fn cast<U: Opaque>(self) -> U {
        U::wrap(self.into_host())
    }

    fn get(&self, member: &MemberDescriptor) -> Expr {
        member.with(self.host())
    }

    /// Read an object-valued member as its own wrapper
    fn get_as<U: Opaque>(&self, member: &MemberDescriptor) -> U {
        U::from_host(member.with(self.host()))
    }

    fn set(&self, member: &MemberDescriptor, value: impl Into<Expr>) -> Expr {
        member.assign(self.host(), value)
    }

    /// Forward a method call; arguments keep their order
    fn call(&self, member: &MemberDescriptor, args: Vec<Arg>) -> Expr {
        member.call(self.host(), args)
    }

    /// `value instanceof T`
    fn instance_of(value: impl Into<HostArg>) -> Expr {
        Expr::instance_of(value.into().0, Self::TYPE_NAME)
    }

    /// `T.class`; rejected by every lowering
    fn class_object() -> Expr {
        Expr::class_of(Self::TYPE_NAME)
    }
}

impl<T: Opaque> From<&T> for HostArg {
    fn from(wrapper: &T) -> Self {
        HostArg(wrapper.host().cheap_clone())
    }
}

/// Declare an opaque wrapper type.
///
/// ```
/// use hostbind::{opaque_type, Opaque, Expr};
///
/// opaque_type!(CSSStyleSheet);
///
/// let sheet = CSSStyleSheet::wrap(Expr::ident("sheet"));
/// assert_eq!(sheet.host().erased(), &Expr::ident("sheet"));
/// ```
#[macro_export]
macro_rules! opaque_type {
    ($(#[$meta:meta])* $name:ident) => {
        $crate::opaque_type!($(#[$meta])* $name = stringify!($name));
    };
    ($(#[$meta:meta])* $name:ident = $host_name:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        #[repr(transparent)]
        pub struct $name($crate::Expr);

        impl $crate::Opaque for $name {
            const TYPE_NAME: &'static str = $host_name;

            fn from_host(host: $crate::Expr) -> Self {
                Self(host)
            }

            fn host(&self) -> &$crate::Expr {
                &self.0
            }

            fn into_host(self) -> $crate::Expr {
                self.0
            }
        }
    };
}

opaque_type!(
    /// Untyped host value; every member access is dynamic
    HostObject = "Object"
);

/// Typed handle used where the opaque type is only known as a type parameter
#[derive(Debug, Clone, PartialEq)]
#[repr(transparent)]
pub struct Js<T> {
    host: Expr,
    marker: PhantomData<T>,
}

impl<T: Opaque> Js<T> {
    pub fn new(value: impl Into<HostArg>) -> Self {
        Self {
            host: Expr::wrap(T::TYPE_NAME, value.into().0),
            marker: PhantomData,
        }
    }

    /// Convert into the concrete wrapper
    pub fn get(self) -> T {
        T::from_host(self.host)
    }

    pub fn host(&self) -> &Expr {
        &self.host
    }
}
