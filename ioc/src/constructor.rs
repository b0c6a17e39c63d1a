//! Declared constructors.
//!
//! Any closure whose parameters all implement [`Param`] and which returns
//! `Result<Arc<I>, E>` can be registered as the constructor of `I`. The
//! parameter list is the declaration of the dependencies: they are resolved
//! in order before the closure is called.

use crate::container::WeakContainer;
use crate::context::Context;
use crate::core::{downcast, erase, type_key, Instance};
use crate::error::{BoxError, Error, Result};
use std::any::Any;
use std::sync::Arc;

/// What a constructor parameter asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
  /// A registered dependency, looked up by name.
  Dependency { name: String, type_name: &'static str },
  /// A weak handle to the container performing the resolution.
  Container,
  /// The active resolution context.
  Context,
}

/// A resolved constructor argument.
pub enum Arg {
  Instance {
    name: String,
    value: Instance,
    actual: &'static str,
  },
  Container(WeakContainer),
  Context(Context),
}

impl Arg {
  fn describe(&self) -> &'static str {
    match self {
      Arg::Instance { actual, .. } => *actual,
      Arg::Container(_) => std::any::type_name::<WeakContainer>(),
      Arg::Context(_) => std::any::type_name::<Context>(),
    }
  }
}

/// A type that can appear as a constructor parameter.
pub trait Param: Sized + 'static {
  fn kind() -> ParamKind;
  fn from_arg(arg: Arg) -> Result<Self>;
}

impl<T: ?Sized + Any + Send + Sync> Param for Arc<T> {
  fn kind() -> ParamKind {
    ParamKind::Dependency {
      name: type_key::<T>(),
      type_name: std::any::type_name::<T>(),
    }
  }

  fn from_arg(arg: Arg) -> Result<Self> {
    match arg {
      Arg::Instance {
        name,
        value,
        actual,
      } => downcast::<T>(&value).ok_or(Error::TypeMismatch {
        name,
        expected: std::any::type_name::<T>(),
        actual,
      }),
      other => Err(mismatch::<Self>(&other)),
    }
  }
}

impl Param for WeakContainer {
  fn kind() -> ParamKind {
    ParamKind::Container
  }

  fn from_arg(arg: Arg) -> Result<Self> {
    match arg {
      Arg::Container(container) => Ok(container),
      other => Err(mismatch::<Self>(&other)),
    }
  }
}

impl Param for Context {
  fn kind() -> ParamKind {
    ParamKind::Context
  }

  fn from_arg(arg: Arg) -> Result<Self> {
    match arg {
      Arg::Context(ctx) => Ok(ctx),
      other => Err(mismatch::<Self>(&other)),
    }
  }
}

fn mismatch<P: Param>(arg: &Arg) -> Error {
  Error::TypeMismatch {
    name: match P::kind() {
      ParamKind::Dependency { name, .. } => name,
      ParamKind::Container => "container".to_owned(),
      ParamKind::Context => "context".to_owned(),
    },
    expected: std::any::type_name::<P>(),
    actual: arg.describe(),
  }
}

/// A constructor of `I` taking the parameters `Args`.
pub trait Constructor<I: ?Sized, Args>: Send + Sync + 'static {
  /// The declared parameters, in call order.
  fn params(&self) -> Vec<ParamKind>;

  /// Calls the constructor of the dependency `owner` with resolved `args`.
  fn construct(&self, owner: &str, args: Vec<Arg>) -> Result<Arc<I>>;
}

macro_rules! impl_constructor {
  ($($ty:ident $var:ident),*) => {
    impl<F, I, E, $($ty,)*> Constructor<I, ($($ty,)*)> for F
    where
      F: Fn($($ty),*) -> std::result::Result<Arc<I>, E> + Send + Sync + 'static,
      I: ?Sized + Any + Send + Sync,
      E: Into<BoxError>,
      $($ty: Param,)*
    {
      fn params(&self) -> Vec<ParamKind> {
        vec![$(<$ty as Param>::kind()),*]
      }

      #[allow(unused_mut, unused_variables)]
      fn construct(&self, owner: &str, args: Vec<Arg>) -> Result<Arc<I>> {
        let mut args = args.into_iter();
        $(
          let $var = match args.next() {
            Some(arg) => <$ty as Param>::from_arg(arg)?,
            None => return Err(Error::construction(owner, "constructor called with too few arguments")),
          };
        )*
        (self)($($var),*).map_err(|err| Error::construction(owner, err))
      }
    }
  };
}

impl_constructor!();
impl_constructor!(A1 a1);
impl_constructor!(A1 a1, A2 a2);
impl_constructor!(A1 a1, A2 a2, A3 a3);
impl_constructor!(A1 a1, A2 a2, A3 a3, A4 a4);
impl_constructor!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
impl_constructor!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);
impl_constructor!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7);
impl_constructor!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8);

/// A type-erased constructor stored on a descriptor.
#[derive(Clone)]
pub(crate) struct ConstructorPlan {
  pub(crate) params: Arc<Vec<ParamKind>>,
  call: Arc<dyn Fn(&str, Vec<Arg>) -> Result<Instance> + Send + Sync>,
}

impl ConstructorPlan {
  pub(crate) fn new<I, Args, C>(ctor: C) -> Self
  where
    I: ?Sized + Any + Send + Sync,
    C: Constructor<I, Args>,
  {
    Self {
      params: Arc::new(ctor.params()),
      call: Arc::new(move |owner: &str, args: Vec<Arg>| ctor.construct(owner, args).map(erase)),
    }
  }

  pub(crate) fn call(&self, owner: &str, args: Vec<Arg>) -> Result<Instance> {
    (self.call)(owner, args)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Engine;
  struct Car {
    _engine: Arc<Engine>,
  }

  #[test]
  fn params_are_declared_in_order() {
    let ctor = |engine: Arc<Engine>, _c: WeakContainer, _ctx: Context| {
      Ok::<_, Error>(Arc::new(Car { _engine: engine }))
    };
    let plan = ConstructorPlan::new::<Car, _, _>(ctor);
    assert_eq!(
      *plan.params,
      vec![
        ParamKind::Dependency {
          name: type_key::<Engine>(),
          type_name: std::any::type_name::<Engine>(),
        },
        ParamKind::Container,
        ParamKind::Context,
      ]
    );
  }

  #[test]
  fn mismatched_argument_is_a_type_error() {
    let ctor = |engine: Arc<Engine>| Ok::<_, Error>(Arc::new(Car { _engine: engine }));
    let plan = ConstructorPlan::new::<Car, _, _>(ctor);
    let arg = Arg::Instance {
      name: "engine".to_owned(),
      value: erase(Arc::new(42_u8)),
      actual: "u8",
    };
    match plan.call("car", vec![arg]) {
      Err(Error::TypeMismatch { name, actual, .. }) => {
        assert_eq!(name, "engine");
        assert_eq!(actual, "u8");
      }
      Err(other) => panic!("unexpected error: {other}"),
      Ok(_) => panic!("expected a type mismatch"),
    }
  }
}
