//! Models, their definitions and the capability registry.
//!
//! A model declares variables and capabilities in a [`Definition`]. Models can inherit from other
//! models. The definitions of all ancestors are merged into a single flat definition when a
//! [`Solver`](crate::Solver) is created.
use rustc_hash::FxHashSet;

use eqfork_expr::Equation;

use crate::scope::Scope;

/// An equation capability returns the equation `lhs = rhs` built from the current branch.
pub type EquationFn = Box<dyn Fn(&Scope) -> anyhow::Result<Equation>>;

/// A function capability can read and write variables of the current branch or discard it.
pub type FunctionFn = Box<dyn Fn(&mut Scope) -> anyhow::Result<()>>;

pub enum CapabilityKind {
    Equation(EquationFn),
    Function(FunctionFn),
}

/// A named equation or function.
pub struct Capability {
    name: String,
    kind: CapabilityKind,
}

impl Capability {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &CapabilityKind {
        &self.kind
    }

    pub fn is_equation(&self) -> bool {
        match self.kind {
            CapabilityKind::Equation(_) => true,
            CapabilityKind::Function(_) => false,
        }
    }
}

/// The capability registry.
///
/// Fixed once the solver is constructed.
#[derive(Default)]
pub struct Capabilities {
    capabilities: Vec<Capability>,
}

impl Capabilities {
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Equation capabilities in registry order.
    pub fn equations(&self) -> impl Iterator<Item = &Capability> {
        self.capabilities.iter().filter(|cap| cap.is_equation())
    }

    /// Function capabilities in registry order.
    pub fn functions(&self) -> impl Iterator<Item = &Capability> {
        self.capabilities.iter().filter(|cap| !cap.is_equation())
    }
}

/// Variables and capabilities declared by a model.
#[derive(Default)]
pub struct Definition {
    variables: Vec<(String, String)>,
    capabilities: Vec<Capability>,
}

impl Definition {
    pub fn new() -> Definition {
        Definition::default()
    }

    /// Declares a variable with a description.
    pub fn variable(&mut self, name: &str, description: &str) -> &mut Definition {
        self.variables
            .push((name.to_owned(), description.to_owned()));
        self
    }

    /// Declares variables without description.
    pub fn variables(&mut self, names: &[&str]) -> &mut Definition {
        for name in names {
            self.variable(name, "");
        }
        self
    }

    /// Adds an equation capability.
    ///
    /// A capability with the same name replaces an earlier one, keeping its position.
    pub fn equation(
        &mut self,
        name: &str,
        equation: impl Fn(&Scope) -> anyhow::Result<Equation> + 'static,
    ) -> &mut Definition {
        self.add(Capability {
            name: name.to_owned(),
            kind: CapabilityKind::Equation(Box::new(equation)),
        })
    }

    /// Adds a function capability.
    ///
    /// A capability with the same name replaces an earlier one, keeping its position.
    pub fn function(
        &mut self,
        name: &str,
        function: impl Fn(&mut Scope) -> anyhow::Result<()> + 'static,
    ) -> &mut Definition {
        self.add(Capability {
            name: name.to_owned(),
            kind: CapabilityKind::Function(Box::new(function)),
        })
    }

    fn add(&mut self, capability: Capability) -> &mut Definition {
        match self
            .capabilities
            .iter_mut()
            .find(|existing| existing.name == capability.name)
        {
            Some(existing) => *existing = capability,
            None => self.capabilities.push(capability),
        }
        self
    }

    /// Adds everything declared in `other` after the declarations of `self`.
    pub fn merge(&mut self, other: Definition) {
        self.variables.extend(other.variables);
        for capability in other.capabilities {
            self.add(capability);
        }
    }

    /// Names of the declared capabilities in registry order.
    pub fn capability_names(&self) -> Vec<&str> {
        self.capabilities.iter().map(|cap| cap.name()).collect()
    }

    /// Splits the definition into declared variables and the capability registry.
    pub(crate) fn into_parts(self) -> (Vec<(String, String)>, Capabilities) {
        (
            self.variables,
            Capabilities {
                capabilities: self.capabilities,
            },
        )
    }
}

/// A system of equations.
///
/// ```
/// use eqfork::{Definition, Equation, Model};
///
/// struct Rectangle;
///
/// impl Model for Rectangle {
///     fn name(&self) -> &str {
///         "rectangle"
///     }
///
///     fn define(&self, def: &mut Definition) {
///         def.variable("w", "width")
///             .variable("h", "height")
///             .variable("area", "")
///             .equation("area", |s| {
///                 Ok(Equation::new(s.var("area")?, s.var("w")? * s.var("h")?))
///             });
///     }
/// }
/// ```
pub trait Model {
    /// Name of the model, used to merge diamond-shaped inheritance once.
    fn name(&self) -> &str;

    /// Models whose variables and capabilities this model inherits.
    fn parents(&self) -> Vec<Box<dyn Model>> {
        vec![]
    }

    fn define(&self, def: &mut Definition);
}

/// Merges the definitions of a model and all its ancestors.
///
/// Ancestors are visited depth-first, parents before children and each model only once.
pub fn flatten(model: &dyn Model) -> Definition {
    let mut seen = FxHashSet::default();
    let mut definition = Definition::default();
    flatten_into(model, &mut seen, &mut definition);
    definition
}

fn flatten_into(model: &dyn Model, seen: &mut FxHashSet<String>, definition: &mut Definition) {
    if !seen.insert(model.name().to_owned()) {
        return;
    }
    for parent in model.parents() {
        flatten_into(&*parent, seen, definition);
    }
    let mut own = Definition::default();
    model.define(&mut own);
    definition.merge(own);
}
