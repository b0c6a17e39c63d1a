//! The resolution engine.
//!
//! `resolve` validates a descriptor against the resolution chain of the
//! current thread, then produces its instance from the cache matching its
//! lifecycle or from its creation strategy.

use crate::constructor::{Arg, ParamKind};
use crate::context::Context;
use crate::core::{Instance, Link, ResolutionGuard};
use crate::descriptor::{Descriptor, Strategy};
use crate::error::{Error, Result};
use crate::lifecycle::Lifecycle;
use std::sync::Arc;

/// Resolves `descriptor` in the container and scope of `ctx`.
pub(crate) fn resolve(ctx: &Context, descriptor: &Arc<Descriptor>) -> Result<Instance> {
  let container = ctx.container();
  let name = descriptor.name();
  let lifecycle = descriptor.lifecycle();
  let ancestors = ResolutionGuard::ancestors(container.uid());

  if let Some(start) = ancestors.iter().position(|link| link.name == name) {
    let mut chain: Vec<String> = ancestors[start..].iter().map(|link| link.name.clone()).collect();
    chain.push(name.to_owned());
    return Err(Error::CircularDependency {
      name: name.to_owned(),
      chain,
    });
  }

  if let Some(owner) = ancestors
    .iter()
    .find(|link| !lifecycle.can_be_held_by(link.lifecycle))
  {
    let err = Error::CaptiveDependency {
      name: name.to_owned(),
      lifecycle,
      ancestor: owner.name.clone(),
      ancestor_lifecycle: owner.lifecycle,
    };
    if !container.config().allow_captive_dependencies {
      return Err(err);
    }
    container.logger().warn(err.to_string());
  }

  let _guard = ResolutionGuard::enter(Link {
    container: container.uid(),
    name: name.to_owned(),
    lifecycle,
  });

  match lifecycle {
    Lifecycle::Singleton => {
      if let Some(instance) = descriptor.cached.get() {
        tracing::trace!(target: "fibre_inject", name, "singleton cache hit");
        return Ok(instance.clone());
      }
      descriptor
        .cached
        .get_or_try_init(|| construct(ctx, descriptor))
        .cloned()
    }
    Lifecycle::Scoped => {
      let slot = container.scopes().slot(ctx.scope(), name)?;
      if let Some(instance) = slot.get() {
        tracing::trace!(target: "fibre_inject", name, scope = ctx.scope().get(), "scoped cache hit");
        return Ok(instance.clone());
      }
      slot.get_or_try_init(|| construct(ctx, descriptor)).cloned()
    }
    Lifecycle::Transient => construct(ctx, descriptor),
  }
}

/// Runs the creation strategy of `descriptor`. Nothing is cached here.
fn construct(ctx: &Context, descriptor: &Descriptor) -> Result<Instance> {
  let name = descriptor.name();
  tracing::trace!(
    target: "fibre_inject",
    name,
    lifecycle = descriptor.lifecycle().as_str(),
    "constructing"
  );

  match &descriptor.strategy {
    Strategy::Instance(value) => Ok(value.clone()),
    Strategy::Factory(factory) => factory(ctx, name),
    Strategy::Constructor(plan) => {
      let mut args = Vec::with_capacity(plan.params.len());
      for param in plan.params.iter() {
        args.push(argument(ctx, name, param)?);
      }
      plan.call(name, args)
    }
    Strategy::Component(plan) => plan.build(ctx, name),
  }
}

fn argument(ctx: &Context, owner: &str, param: &ParamKind) -> Result<Arg> {
  match param {
    ParamKind::Container => Ok(Arg::Container(ctx.container().downgrade())),
    ParamKind::Context => Ok(Arg::Context(ctx.clone())),
    ParamKind::Dependency { name, .. } => {
      let descriptor = ctx
        .container()
        .lookup(name)
        .ok_or_else(|| Error::MissingDependency {
          owner: owner.to_owned(),
          dependency: name.clone(),
        })?;
      let value = resolve(ctx, &descriptor)?;
      Ok(Arg::Instance {
        name: name.clone(),
        value,
        actual: descriptor.interface().name(),
      })
    }
  }
}
