//! Symbolic expressions.
use std::collections::BTreeSet;
use std::{fmt, ops, rc::Rc};

use num_complex::Complex64;
use num_rational::Rational64;

use crate::number::Number;
use crate::symbol::Symbol;

/// Elementary functions that can appear in an expression.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Func {
    Exp,
    Ln,
    Sin,
    Cos,
    Tan,
    Abs,
}

impl Func {
    pub fn name(self) -> &'static str {
        match self {
            Func::Exp => "exp",
            Func::Ln => "ln",
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Abs => "abs",
        }
    }

    /// Numeric value of the function.
    pub fn apply(self, value: Complex64) -> Complex64 {
        match self {
            Func::Exp => value.exp(),
            Func::Ln => value.ln(),
            Func::Sin => value.sin(),
            Func::Cos => value.cos(),
            Func::Tan => value.tan(),
            Func::Abs => Complex64::new(value.norm(), 0.0),
        }
    }

    /// Constant folding.
    ///
    /// Exact arguments only fold where the result is exact, otherwise the call stays symbolic.
    fn fold(self, value: Number) -> Option<Number> {
        match value {
            Number::Exact(exact) => match self {
                Func::Abs => Some(Number::Exact(if exact < Rational64::from_integer(0) {
                    -exact
                } else {
                    exact
                })),
                Func::Exp | Func::Cos if value.is_zero() => Some(Number::one()),
                Func::Sin | Func::Tan if value.is_zero() => Some(Number::zero()),
                Func::Ln if value.is_one() => Some(Number::zero()),
                _ => None,
            },
            Number::Approx(approx) => {
                let result = Number::Approx(self.apply(approx));
                if result.is_finite() {
                    Some(result)
                } else {
                    None
                }
            }
        }
    }
}

/// A node of an expression tree.
#[derive(Clone, PartialEq, Debug)]
pub enum Node {
    /// Numeric constant.
    Num(Number),
    /// An unknown that can be solved for.
    Var(Symbol),
    /// An opaque unit atom, carried through but never solved for.
    Unit(Symbol),
    /// Sum of at least two terms, at most one of them numeric.
    Add(Vec<Expr>),
    /// Product of at least two factors, a numeric factor always comes first.
    Mul(Vec<Expr>),
    Pow(Expr, Expr),
    Call(Func, Expr),
}

/// An immutable symbolic expression.
///
/// Expressions are built using the constructors of this type or the overloaded arithmetic
/// operators. Construction flattens nested sums and products, combines like terms and folds
/// numeric constants, but performs no expansion.
#[derive(Clone, PartialEq)]
pub struct Expr(Rc<Node>);

impl Expr {
    fn new(node: Node) -> Expr {
        Expr(Rc::new(node))
    }

    pub fn node(&self) -> &Node {
        &self.0
    }

    pub fn num(value: impl Into<Number>) -> Expr {
        Expr::new(Node::Num(value.into()))
    }

    pub fn zero() -> Expr {
        Expr::num(Number::zero())
    }

    pub fn one() -> Expr {
        Expr::num(Number::one())
    }

    /// The unknown with the given name.
    pub fn var(name: &str) -> Expr {
        Expr::new(Node::Var(Symbol::new(name)))
    }

    pub fn var_symbol(symbol: Symbol) -> Expr {
        Expr::new(Node::Var(symbol))
    }

    /// An opaque unit such as `cm` or `s`.
    pub fn unit(name: &str) -> Expr {
        Expr::new(Node::Unit(Symbol::new(name)))
    }

    /// Sum of the given terms.
    pub fn sum(terms: impl IntoIterator<Item = Expr>) -> Expr {
        let mut constant = Number::zero();
        let mut collected: Vec<(Expr, Number)> = vec![];

        let mut add_term = |term: &Expr, constant: &mut Number| match term.node() {
            Node::Num(value) => *constant = constant.add(*value),
            _ => {
                let (coefficient, rest) = split_coefficient(term);
                match collected.iter_mut().find(|(existing, _)| *existing == rest) {
                    Some((_, existing)) => *existing = existing.add(coefficient),
                    None => collected.push((rest, coefficient)),
                }
            }
        };

        for term in terms {
            match term.node() {
                Node::Add(inner) => {
                    for term in inner.iter() {
                        add_term(term, &mut constant);
                    }
                }
                _ => add_term(&term, &mut constant),
            }
        }

        let mut terms = vec![];
        for (rest, coefficient) in collected {
            if coefficient.is_zero() {
                continue;
            }
            if coefficient.is_one() {
                terms.push(rest);
            } else {
                terms.push(Expr::product(vec![Expr::num(coefficient), rest]));
            }
        }

        if !constant.is_zero() || terms.is_empty() {
            terms.push(Expr::num(constant));
        }

        if terms.len() == 1 {
            terms.pop().unwrap_or_else(Expr::zero)
        } else {
            Expr::new(Node::Add(terms))
        }
    }

    /// Product of the given factors.
    pub fn product(factors: impl IntoIterator<Item = Expr>) -> Expr {
        let mut constant = Number::one();
        let mut powers: Vec<(Expr, Expr)> = vec![];

        for factor in factors {
            match factor.node() {
                Node::Mul(inner) => {
                    for factor in inner.iter() {
                        collect_factor(factor, &mut constant, &mut powers);
                    }
                }
                _ => collect_factor(&factor, &mut constant, &mut powers),
            }
        }

        if constant.is_zero() {
            return Expr::num(constant);
        }

        let mut factors = vec![];
        for (base, exponent) in powers {
            let factor = Expr::pow(base, exponent);
            match factor.node() {
                Node::Num(value) => constant = constant.mul(*value),
                _ => factors.push(factor),
            }
        }

        if constant.is_zero() || factors.is_empty() {
            return Expr::num(constant);
        }
        if !constant.is_one() {
            factors.insert(0, Expr::num(constant));
        }

        if factors.len() == 1 {
            factors.pop().unwrap_or_else(Expr::one)
        } else {
            Expr::new(Node::Mul(factors))
        }
    }

    /// `base` raised to `exponent`.
    pub fn pow(base: Expr, exponent: Expr) -> Expr {
        if let Some(value) = exponent.as_number() {
            if value.is_zero() {
                return Expr::one();
            }
            if value.is_one() {
                return base;
            }
        }

        match (base.node(), exponent.node()) {
            (Node::Num(base_value), Node::Num(exponent_value)) => {
                if let Some(value) = fold_power(*base_value, *exponent_value) {
                    return Expr::num(value);
                }
            }
            (Node::Num(base_value), _) if base_value.is_one() => return Expr::one(),
            (Node::Pow(inner_base, inner_exponent), Node::Num(value))
                if value.as_integer().is_some() =>
            {
                return Expr::pow(
                    inner_base.clone(),
                    Expr::product(vec![inner_exponent.clone(), exponent.clone()]),
                );
            }
            (Node::Mul(factors), Node::Num(value)) if value.as_integer().is_some() => {
                return Expr::product(
                    factors
                        .iter()
                        .map(|factor| Expr::pow(factor.clone(), exponent.clone())),
                );
            }
            _ => (),
        }

        Expr::new(Node::Pow(base, exponent))
    }

    /// Application of an elementary function.
    pub fn call(func: Func, arg: Expr) -> Expr {
        if let Some(value) = arg.as_number() {
            if let Some(result) = func.fold(*value) {
                return Expr::num(result);
            }
        }
        Expr::new(Node::Call(func, arg))
    }

    /// Shortcut for `Expr::pow(self, exponent.into())`.
    pub fn pow_of(self, exponent: impl Into<Expr>) -> Expr {
        Expr::pow(self, exponent.into())
    }

    pub fn powi(self, exponent: i64) -> Expr {
        Expr::pow(self, Expr::num(exponent))
    }

    /// Principal square root.
    pub fn sqrt(self) -> Expr {
        let half = Number::fraction(1, 2).unwrap_or_else(|| Number::from(0.5));
        Expr::pow(self, Expr::num(half))
    }

    pub fn exp(self) -> Expr {
        Expr::call(Func::Exp, self)
    }

    pub fn ln(self) -> Expr {
        Expr::call(Func::Ln, self)
    }

    pub fn sin(self) -> Expr {
        Expr::call(Func::Sin, self)
    }

    pub fn cos(self) -> Expr {
        Expr::call(Func::Cos, self)
    }

    pub fn tan(self) -> Expr {
        Expr::call(Func::Tan, self)
    }

    pub fn abs(self) -> Expr {
        Expr::call(Func::Abs, self)
    }

    /// The numeric value, if this is a constant number.
    pub fn as_number(&self) -> Option<&Number> {
        match self.node() {
            Node::Num(value) => Some(value),
            _ => None,
        }
    }

    /// The variable name, if this is a single variable.
    pub fn as_var(&self) -> Option<&Symbol> {
        match self.node() {
            Node::Var(symbol) => Some(symbol),
            _ => None,
        }
    }

    /// All variables appearing in the expression.
    pub fn free_vars(&self) -> BTreeSet<Symbol> {
        let mut vars = BTreeSet::new();
        self.visit_atoms(&mut |node| {
            if let Node::Var(symbol) = node {
                vars.insert(symbol.clone());
            }
        });
        vars
    }

    /// All units appearing in the expression.
    pub fn units(&self) -> BTreeSet<Symbol> {
        let mut units = BTreeSet::new();
        self.visit_atoms(&mut |node| {
            if let Node::Unit(symbol) = node {
                units.insert(symbol.clone());
            }
        });
        units
    }

    pub fn contains_var(&self, name: &str) -> bool {
        let mut found = false;
        self.visit_atoms(&mut |node| {
            if let Node::Var(symbol) = node {
                found |= symbol.as_str() == name;
            }
        });
        found
    }

    /// Whether no variable appears in the expression.
    pub fn is_constant(&self) -> bool {
        let mut constant = true;
        self.visit_atoms(&mut |node| {
            if let Node::Var(_) = node {
                constant = false;
            }
        });
        constant
    }

    fn visit_atoms(&self, f: &mut impl FnMut(&Node)) {
        match self.node() {
            Node::Num(_) | Node::Var(_) | Node::Unit(_) => f(self.node()),
            Node::Add(children) | Node::Mul(children) => {
                for child in children.iter() {
                    child.visit_atoms(f);
                }
            }
            Node::Pow(base, exponent) => {
                base.visit_atoms(f);
                exponent.visit_atoms(f);
            }
            Node::Call(_, arg) => arg.visit_atoms(f),
        }
    }

    /// Rebuilds the expression bottom-up, replacing every atom for which `f` returns a value.
    ///
    /// The result is constructed using the smart constructors, so replacing variables by numbers
    /// folds all constant subexpressions.
    pub fn map_atoms<F>(&self, f: &mut F) -> Expr
    where
        F: FnMut(&Expr) -> Option<Expr>,
    {
        match self.node() {
            Node::Num(_) | Node::Var(_) | Node::Unit(_) => f(self).unwrap_or_else(|| self.clone()),
            Node::Add(terms) => Expr::sum(terms.iter().map(|term| term.map_atoms(f)).collect::<Vec<_>>()),
            Node::Mul(factors) => Expr::product(
                factors
                    .iter()
                    .map(|factor| factor.map_atoms(f))
                    .collect::<Vec<_>>(),
            ),
            Node::Pow(base, exponent) => Expr::pow(base.map_atoms(f), exponent.map_atoms(f)),
            Node::Call(func, arg) => Expr::call(*func, arg.map_atoms(f)),
        }
    }
}

/// Splits a term into numeric coefficient and remaining factors.
fn split_coefficient(term: &Expr) -> (Number, Expr) {
    if let Node::Mul(factors) = term.node() {
        if let Node::Num(coefficient) = factors[0].node() {
            let rest = if factors.len() == 2 {
                factors[1].clone()
            } else {
                Expr::new(Node::Mul(factors[1..].to_vec()))
            };
            return (*coefficient, rest);
        }
    }
    (Number::one(), term.clone())
}

/// Adds a single non-product factor to the factors collected by [`Expr::product`].
fn collect_factor(factor: &Expr, constant: &mut Number, powers: &mut Vec<(Expr, Expr)>) {
    let (base, exponent) = match factor.node() {
        Node::Num(value) => {
            *constant = constant.mul(*value);
            return;
        }
        Node::Pow(base, exponent) => (base.clone(), exponent.clone()),
        _ => (factor.clone(), Expr::one()),
    };

    for (existing_base, existing_exponent) in powers.iter_mut() {
        if *existing_base != base {
            continue;
        }
        if let (Some(a), Some(b)) = (existing_exponent.as_number(), exponent.as_number()) {
            *existing_exponent = Expr::num(a.add(*b));
            return;
        }
    }
    powers.push((base, exponent));
}

/// Folds a power of two numbers, `None` if the result should stay symbolic.
fn fold_power(base: Number, exponent: Number) -> Option<Number> {
    if let Some(exponent) = exponent.as_integer() {
        return base.powi(exponent);
    }
    if let (Some(_), Some(exponent)) = (base.as_rational(), exponent.as_rational()) {
        // Exact radicals stay symbolic unless they have an exact value.
        if *exponent.denom() == 2 {
            return base.exact_sqrt()?.powi(*exponent.numer());
        }
        return None;
    }
    if base.is_zero() && exponent.to_complex().re <= 0.0 {
        return None;
    }
    let result = base.powc(exponent);
    if result.is_finite() {
        Some(result)
    } else {
        None
    }
}

impl From<Number> for Expr {
    fn from(value: Number) -> Expr {
        Expr::num(value)
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Expr {
        Expr::num(value)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Expr {
        Expr::num(value)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Expr {
        Expr::num(value)
    }
}

impl From<Complex64> for Expr {
    fn from(value: Complex64) -> Expr {
        Expr::num(value)
    }
}

impl From<Rational64> for Expr {
    fn from(value: Rational64) -> Expr {
        Expr::num(value)
    }
}

impl From<&Expr> for Expr {
    fn from(value: &Expr) -> Expr {
        value.clone()
    }
}

fn add_exprs(a: Expr, b: Expr) -> Expr {
    Expr::sum(vec![a, b])
}

fn sub_exprs(a: Expr, b: Expr) -> Expr {
    Expr::sum(vec![a, -b])
}

fn mul_exprs(a: Expr, b: Expr) -> Expr {
    Expr::product(vec![a, b])
}

fn div_exprs(a: Expr, b: Expr) -> Expr {
    Expr::product(vec![a, b.powi(-1)])
}

macro_rules! impl_binary_op {
    ($op:ident, $method:ident, $build:path) => {
        impl ops::$op<Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                $build(self, rhs)
            }
        }

        impl<'a> ops::$op<&'a Expr> for &'a Expr {
            type Output = Expr;
            fn $method(self, rhs: &'a Expr) -> Expr {
                $build(self.clone(), rhs.clone())
            }
        }

        impl_binary_op!(@scalar $op, $method, $build, i64);
        impl_binary_op!(@scalar $op, $method, $build, f64);
    };
    (@scalar $op:ident, $method:ident, $build:path, $scalar:ty) => {
        impl ops::$op<$scalar> for Expr {
            type Output = Expr;
            fn $method(self, rhs: $scalar) -> Expr {
                $build(self, Expr::from(rhs))
            }
        }

        impl ops::$op<Expr> for $scalar {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                $build(Expr::from(self), rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, add_exprs);
impl_binary_op!(Sub, sub, sub_exprs);
impl_binary_op!(Mul, mul, mul_exprs);
impl_binary_op!(Div, div, div_exprs);

impl ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::product(vec![Expr::num(-1), self])
    }
}

impl<'a> ops::Neg for &'a Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        -self.clone()
    }
}

/// Binding strength used to decide where parentheses are needed.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Sum,
    Product,
    Power,
    Atom,
}

fn is_negative_term(expr: &Expr) -> bool {
    match expr.node() {
        Node::Num(value) => value.is_negative(),
        Node::Mul(factors) => factors[0]
            .as_number()
            .map_or(false, |value| value.is_negative()),
        _ => false,
    }
}

fn prec_of(expr: &Expr) -> Prec {
    match expr.node() {
        Node::Add(_) => Prec::Sum,
        Node::Mul(_) if is_negative_term(expr) => Prec::Sum,
        Node::Mul(_) => Prec::Product,
        Node::Pow(_, exponent) if is_half(exponent) => Prec::Atom,
        Node::Pow(_, _) => Prec::Power,
        Node::Num(value) => match value {
            Number::Exact(exact) if exact < &Rational64::from_integer(0) => Prec::Sum,
            Number::Exact(exact) if !exact.is_integer() => Prec::Product,
            Number::Exact(_) => Prec::Atom,
            Number::Approx(approx) if approx.im != 0.0 => Prec::Sum,
            Number::Approx(approx) if approx.re < 0.0 => Prec::Sum,
            Number::Approx(_) => Prec::Atom,
        },
        Node::Var(_) | Node::Unit(_) | Node::Call(_, _) => Prec::Atom,
    }
}

fn is_half(expr: &Expr) -> bool {
    expr.as_number() == Number::fraction(1, 2).as_ref()
}

fn write_expr(f: &mut fmt::Formatter, expr: &Expr, context: Prec) -> fmt::Result {
    if prec_of(expr) < context {
        f.write_str("(")?;
        write_inner(f, expr)?;
        f.write_str(")")
    } else {
        write_inner(f, expr)
    }
}

fn write_inner(f: &mut fmt::Formatter, expr: &Expr) -> fmt::Result {
    match expr.node() {
        Node::Num(value) => write!(f, "{}", value),
        Node::Var(symbol) | Node::Unit(symbol) => write!(f, "{}", symbol),
        Node::Add(terms) => {
            for (index, term) in terms.iter().enumerate() {
                if index == 0 {
                    write_expr(f, term, Prec::Sum)?;
                } else if is_negative_term(term) {
                    f.write_str(" - ")?;
                    write_expr(f, &-term, Prec::Product)?;
                } else {
                    f.write_str(" + ")?;
                    write_expr(f, term, Prec::Product)?;
                }
            }
            Ok(())
        }
        Node::Mul(_) if is_negative_term(expr) => {
            f.write_str("-")?;
            write_expr(f, &-expr, Prec::Product)
        }
        Node::Mul(factors) => {
            let mut numerator = vec![];
            let mut denominator = vec![];
            for factor in factors.iter() {
                match factor.node() {
                    Node::Pow(base, exponent)
                        if exponent.as_number().map_or(false, |e| e.is_negative()) =>
                    {
                        denominator.push(Expr::pow(base.clone(), -exponent))
                    }
                    _ => numerator.push(factor.clone()),
                }
            }
            if numerator.is_empty() {
                f.write_str("1")?;
            }
            for (index, factor) in numerator.iter().enumerate() {
                if index > 0 {
                    f.write_str("*")?;
                }
                write_expr(f, factor, Prec::Power)?;
            }
            match denominator.len() {
                0 => Ok(()),
                1 => {
                    f.write_str("/")?;
                    write_expr(f, &denominator[0], Prec::Atom)
                }
                _ => {
                    f.write_str("/(")?;
                    for (index, factor) in denominator.iter().enumerate() {
                        if index > 0 {
                            f.write_str("*")?;
                        }
                        write_expr(f, factor, Prec::Power)?;
                    }
                    f.write_str(")")
                }
            }
        }
        Node::Pow(base, exponent) if is_half(exponent) => {
            f.write_str("sqrt(")?;
            write_expr(f, base, Prec::Sum)?;
            f.write_str(")")
        }
        Node::Pow(base, exponent) => {
            write_expr(f, base, Prec::Atom)?;
            f.write_str("^")?;
            write_expr(f, exponent, Prec::Atom)
        }
        Node::Call(func, arg) => {
            write!(f, "{}(", func.name())?;
            write_expr(f, arg, Prec::Sum)?;
            f.write_str(")")
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_expr(f, self, Prec::Sum)
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_fold() {
        let expr = Expr::from(2) * 3 + Expr::from(1) / 2;
        assert_eq!(expr.as_number(), Number::fraction(13, 2).as_ref());

        let expr = Expr::from(0.5) * -9.8;
        assert!((expr.as_number().unwrap().to_complex().re + 4.9).abs() < 1e-12);
    }

    #[test]
    fn like_terms_combine() {
        let x = Expr::var("x");
        assert_eq!(&x + &x, 2 * x.clone());
        assert_eq!(&x - &x, Expr::zero());
        assert_eq!(&x * &x, x.clone().powi(2));
        assert_eq!(x.clone() / x.clone(), Expr::one());
    }

    #[test]
    fn integer_literals_on_either_side() {
        let x = Expr::var("x");
        let expr = 2 * x.clone() + x.clone() * 3 - 1 + 4 / x.clone();
        assert_eq!(expr, 5 * x.clone() - 1 + 4 * x.powi(-1));
    }

    #[test]
    fn radicals_stay_exact() {
        let root = Expr::from(1969).sqrt();
        assert!(root.as_number().is_none());
        assert_eq!(root.clone() * root, Expr::from(1969));
        assert_eq!(Expr::from(16).sqrt(), Expr::from(4));
        assert_eq!(Expr::from(1) / Expr::from(4).sqrt(), Expr::num(Number::fraction(1, 2).unwrap()));
    }

    #[test]
    fn integer_powers_distribute() {
        let x = Expr::var("x");
        assert_eq!((2 * x.clone()).powi(2), 4 * x.clone().powi(2));
        assert_eq!(x.clone().powi(2).powi(3), x.powi(6));
    }

    #[test]
    fn division_by_zero_stays_symbolic() {
        let expr = Expr::from(1) / Expr::zero();
        assert!(expr.as_number().is_none());
    }

    #[test]
    fn free_vars_and_units() {
        let expr = Expr::var("y") * Expr::unit("cm") + Expr::var("x").sin();
        let vars: Vec<_> = expr.free_vars().into_iter().map(|s| s.to_string()).collect();
        assert_eq!(vars, vec!["x", "y"]);
        let units: Vec<_> = expr.units().into_iter().map(|s| s.to_string()).collect();
        assert_eq!(units, vec!["cm"]);
        assert!(expr.contains_var("x"));
        assert!(!expr.contains_var("cm"));
        assert!(!expr.is_constant());
        assert!((Expr::from(3) * Expr::unit("m")).is_constant());
    }

    #[test]
    fn map_atoms_folds() {
        let expr = Expr::var("x").powi(2) + Expr::var("x") * 3;
        let folded = expr.map_atoms(&mut |atom| atom.as_var().map(|_| Expr::from(2)));
        assert_eq!(folded, Expr::from(10));
    }

    #[test]
    fn display() {
        let x = Expr::var("x");
        let y = Expr::var("y");
        assert_eq!((&x + &y).to_string(), "x + y");
        assert_eq!((&x - &y).to_string(), "x - y");
        assert_eq!((2 * (&x + &y)).to_string(), "2*(x + y)");
        assert_eq!((&x / &y).to_string(), "x/y");
        assert_eq!((-x.clone()).to_string(), "-x");
        assert_eq!(x.clone().powi(2).to_string(), "x^2");
        assert_eq!(Expr::from(2).sqrt().to_string(), "sqrt(2)");
        assert_eq!((x.sin() + 1).to_string(), "sin(x) + 1");
    }
}
