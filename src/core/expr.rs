//! Schedule-agnostic expression trees.
//!
//! A kernel's value at a coordinate is described by an [`Expr`]: a tagged
//! tree of constants, coordinates, runtime parameters, boundary-extended
//! samples, arithmetic, casts and selects. Expressions never fail to
//! evaluate; division by zero yields zero and narrowing casts saturate.

use crate::core::types::{Dim, ScalarType, ScalarValue};
use indexmap::IndexMap;
use std::fmt;
use std::ops::{Add, Div, Mul, Shl, Shr, Sub};

/// Binary operators understood by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// Euclidean division; dividing by zero gives zero.
    Div,
    Shl,
    Shr,
    Min,
    Max,
    Lt,
    Le,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Min => "min",
            BinaryOp::Max => "max",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    /// Apply the operator to two concrete values.
    ///
    /// Operands are first promoted to a common type.
    pub fn apply(self, lhs: ScalarValue, rhs: ScalarValue) -> ScalarValue {
        match self {
            BinaryOp::And => return ScalarValue::Bool(lhs.as_bool() && rhs.as_bool()),
            BinaryOp::Or => return ScalarValue::Bool(lhs.as_bool() || rhs.as_bool()),
            _ => {}
        }

        let ty = lhs.scalar_type().promote(rhs.scalar_type());
        if ty == ScalarType::Float32 {
            let (a, b) = (lhs.as_f32(), rhs.as_f32());
            let value = match self {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Shl => a * 2f32.powi(b as i32),
                BinaryOp::Shr => a / 2f32.powi(b as i32),
                BinaryOp::Min => a.min(b),
                BinaryOp::Max => a.max(b),
                BinaryOp::Lt => return ScalarValue::Bool(a < b),
                BinaryOp::Le => return ScalarValue::Bool(a <= b),
                BinaryOp::Eq => return ScalarValue::Bool(a == b),
                BinaryOp::Ne => return ScalarValue::Bool(a != b),
                BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
            };
            return ScalarValue::Float32(value);
        }

        let (a, b) = (lhs.as_i64(), rhs.as_i64());
        if self.is_comparison() {
            return ScalarValue::Bool(match self {
                BinaryOp::Lt => a < b,
                BinaryOp::Le => a <= b,
                BinaryOp::Eq => a == b,
                _ => a != b,
            });
        }
        let value = match self {
            BinaryOp::Add => a.wrapping_add(b),
            BinaryOp::Sub => a.wrapping_sub(b),
            BinaryOp::Mul => a.wrapping_mul(b),
            BinaryOp::Div => {
                if b == 0 {
                    0
                } else {
                    a.div_euclid(b)
                }
            }
            BinaryOp::Shl => a.wrapping_shl(b.clamp(0, 63) as u32),
            BinaryOp::Shr => a >> b.clamp(0, 63),
            BinaryOp::Min => a.min(b),
            BinaryOp::Max => a.max(b),
            _ => unreachable!("comparisons and logic handled above"),
        };
        ScalarValue::wrap_int(value, ty)
    }
}

/// Read access to a boundary-extended source image.
pub trait Sampler {
    /// Sample the source at any coordinate; total by contract.
    fn sample(&self, x: i32, y: i32, ch: i32) -> ScalarValue;
}

/// A node of a kernel's value expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value.
    Const(ScalarValue),
    /// The output coordinate along one axis.
    Coord(Dim),
    /// A named runtime scalar, replaced by [`Expr::bind_params`].
    Param { name: String, ty: ScalarType },
    /// A read of the boundary-extended source.
    Sample {
        x: Box<Expr>,
        y: Box<Expr>,
        ch: Box<Expr>,
    },
    /// Arithmetic, comparison or logic.
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Explicit type conversion.
    Cast { ty: ScalarType, value: Box<Expr> },
    /// `cond ? then : otherwise`.
    Select {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

// ============================================================================
// Constructors
// ============================================================================

/// The x coordinate.
pub fn x() -> Expr {
    Expr::Coord(Dim::X)
}

/// The y coordinate.
pub fn y() -> Expr {
    Expr::Coord(Dim::Y)
}

/// The channel coordinate.
pub fn ch() -> Expr {
    Expr::Coord(Dim::Channel)
}

/// A runtime parameter reference.
pub fn param(name: impl Into<String>, ty: ScalarType) -> Expr {
    Expr::Param {
        name: name.into(),
        ty,
    }
}

/// A read of the source at `(x, y, ch)`.
pub fn sample(x: impl Into<Expr>, y: impl Into<Expr>, ch: impl Into<Expr>) -> Expr {
    Expr::Sample {
        x: Box::new(x.into()),
        y: Box::new(y.into()),
        ch: Box::new(ch.into()),
    }
}

/// Convert `value` to `ty`.
pub fn cast(ty: ScalarType, value: impl Into<Expr>) -> Expr {
    Expr::Cast {
        ty,
        value: Box::new(value.into()),
    }
}

/// Smaller of two values.
pub fn min(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    Expr::binary(BinaryOp::Min, a.into(), b.into())
}

/// Larger of two values.
pub fn max(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    Expr::binary(BinaryOp::Max, a.into(), b.into())
}

/// Clamp `value` into `[lo, hi]`.
pub fn clamp(value: impl Into<Expr>, lo: impl Into<Expr>, hi: impl Into<Expr>) -> Expr {
    max(min(value, hi), lo)
}

/// Conditional value.
pub fn select(cond: impl Into<Expr>, then: impl Into<Expr>, otherwise: impl Into<Expr>) -> Expr {
    Expr::Select {
        cond: Box::new(cond.into()),
        then: Box::new(then.into()),
        otherwise: Box::new(otherwise.into()),
    }
}

impl Expr {
    /// Build a binary node.
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// `self < rhs`
    pub fn lt(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Lt, self, rhs.into())
    }

    /// `self <= rhs`
    pub fn le(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Le, self, rhs.into())
    }

    /// `self == rhs`
    pub fn equals(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Eq, self, rhs.into())
    }

    /// `self && rhs`
    pub fn and(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::And, self, rhs.into())
    }

    // ========================================================================
    // Analysis
    // ========================================================================

    /// Static result type of the expression.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Expr::Const(v) => v.scalar_type(),
            Expr::Coord(_) => ScalarType::Int32,
            Expr::Param { ty, .. } => *ty,
            Expr::Sample { .. } => ScalarType::UInt8,
            Expr::Binary { op, lhs, rhs } => match op {
                BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::And
                | BinaryOp::Or => ScalarType::Bool,
                _ => lhs.scalar_type().promote(rhs.scalar_type()),
            },
            Expr::Cast { ty, .. } => *ty,
            Expr::Select { then, otherwise, .. } => {
                then.scalar_type().promote(otherwise.scalar_type())
            }
        }
    }

    /// Every parameter referenced by the expression, in first-use order.
    pub fn params(&self) -> IndexMap<String, ScalarType> {
        let mut found = IndexMap::new();
        self.collect_params(&mut found);
        found
    }

    fn collect_params(&self, found: &mut IndexMap<String, ScalarType>) {
        match self {
            Expr::Param { name, ty } => {
                found.entry(name.clone()).or_insert(*ty);
            }
            Expr::Const(_) | Expr::Coord(_) => {}
            Expr::Sample { x, y, ch } => {
                x.collect_params(found);
                y.collect_params(found);
                ch.collect_params(found);
            }
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_params(found);
                rhs.collect_params(found);
            }
            Expr::Cast { value, .. } => value.collect_params(found),
            Expr::Select {
                cond,
                then,
                otherwise,
            } => {
                cond.collect_params(found);
                then.collect_params(found);
                otherwise.collect_params(found);
            }
        }
    }

    /// Replace parameters by constants taken from `values`.
    ///
    /// Values are converted to the parameter's declared type. Returns the name
    /// of the first parameter with no value.
    pub fn bind_params(&self, values: &IndexMap<String, ScalarValue>) -> Result<Expr, String> {
        Ok(match self {
            Expr::Param { name, ty } => match values.get(name) {
                Some(value) => Expr::Const(value.cast(*ty)),
                None => return Err(name.clone()),
            },
            Expr::Const(_) | Expr::Coord(_) => self.clone(),
            Expr::Sample { x, y, ch } => Expr::Sample {
                x: Box::new(x.bind_params(values)?),
                y: Box::new(y.bind_params(values)?),
                ch: Box::new(ch.bind_params(values)?),
            },
            Expr::Binary { op, lhs, rhs } => {
                Expr::binary(*op, lhs.bind_params(values)?, rhs.bind_params(values)?)
            }
            Expr::Cast { ty, value } => cast(*ty, value.bind_params(values)?),
            Expr::Select {
                cond,
                then,
                otherwise,
            } => select(
                cond.bind_params(values)?,
                then.bind_params(values)?,
                otherwise.bind_params(values)?,
            ),
        }
        .fold_constants())
    }

    /// Evaluate subtrees that depend on neither coordinates nor samples.
    pub fn fold_constants(self) -> Expr {
        match self.constant_value() {
            Some(value) => Expr::Const(value),
            None => self,
        }
    }

    /// Value of the expression if it is coordinate- and sample-free.
    pub fn constant_value(&self) -> Option<ScalarValue> {
        match self {
            Expr::Const(v) => Some(*v),
            Expr::Coord(_) | Expr::Param { .. } | Expr::Sample { .. } => None,
            Expr::Binary { op, lhs, rhs } => {
                Some(op.apply(lhs.constant_value()?, rhs.constant_value()?))
            }
            Expr::Cast { ty, value } => Some(value.constant_value()?.cast(*ty)),
            Expr::Select {
                cond,
                then,
                otherwise,
            } => {
                if cond.constant_value()?.as_bool() {
                    then.constant_value()
                } else {
                    otherwise.constant_value()
                }
            }
        }
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Evaluate at output coordinate `(x, y, ch)`.
    ///
    /// Unbound parameters evaluate to zero of their type; binding is checked
    /// before any kernel reaches the evaluator.
    pub fn eval<S: Sampler + ?Sized>(&self, coord: [i32; 3], source: &S) -> ScalarValue {
        match self {
            Expr::Const(v) => *v,
            Expr::Coord(dim) => ScalarValue::Int32(coord[dim.index()]),
            Expr::Param { ty, .. } => ScalarValue::zero(*ty),
            Expr::Sample { x, y, ch } => {
                let sx = to_coord(x.eval(coord, source));
                let sy = to_coord(y.eval(coord, source));
                let sc = to_coord(ch.eval(coord, source));
                source.sample(sx, sy, sc)
            }
            Expr::Binary { op, lhs, rhs } => {
                op.apply(lhs.eval(coord, source), rhs.eval(coord, source))
            }
            Expr::Cast { ty, value } => value.eval(coord, source).cast(*ty),
            Expr::Select {
                cond,
                then,
                otherwise,
            } => {
                if cond.eval(coord, source).as_bool() {
                    then.eval(coord, source)
                } else {
                    otherwise.eval(coord, source)
                }
            }
        }
    }
}

fn to_coord(value: ScalarValue) -> i32 {
    value.as_i64().clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

// ============================================================================
// Conversions and operators
// ============================================================================

impl From<ScalarValue> for Expr {
    fn from(v: ScalarValue) -> Self {
        Expr::Const(v)
    }
}

impl From<u8> for Expr {
    fn from(v: u8) -> Self {
        Expr::Const(ScalarValue::UInt8(v))
    }
}

impl From<i32> for Expr {
    fn from(v: i32) -> Self {
        Expr::Const(ScalarValue::Int32(v))
    }
}

impl From<f32> for Expr {
    fn from(v: f32) -> Self {
        Expr::Const(ScalarValue::Float32(v))
    }
}

impl From<&Expr> for Expr {
    fn from(e: &Expr) -> Self {
        e.clone()
    }
}

macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<R: Into<Expr>> $trait<R> for Expr {
            type Output = Expr;

            fn $method(self, rhs: R) -> Expr {
                Expr::binary($op, self, rhs.into())
            }
        }

        impl<R: Into<Expr>> $trait<R> for &Expr {
            type Output = Expr;

            fn $method(self, rhs: R) -> Expr {
                Expr::binary($op, self.clone(), rhs.into())
            }
        }
    };
}

impl_binary_operator!(Add, add, BinaryOp::Add);
impl_binary_operator!(Sub, sub, BinaryOp::Sub);
impl_binary_operator!(Mul, mul, BinaryOp::Mul);
impl_binary_operator!(Div, div, BinaryOp::Div);
impl_binary_operator!(Shl, shl, BinaryOp::Shl);
impl_binary_operator!(Shr, shr, BinaryOp::Shr);

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(v) => write!(f, "{}", v),
            Expr::Coord(dim) => write!(f, "{}", dim),
            Expr::Param { name, .. } => write!(f, "{}", name),
            Expr::Sample { x, y, ch } => write!(f, "src({}, {}, {})", x, y, ch),
            Expr::Binary { op, lhs, rhs } => match op {
                BinaryOp::Min | BinaryOp::Max => write!(f, "{}({}, {})", op.symbol(), lhs, rhs),
                _ => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
            },
            Expr::Cast { ty, value } => write!(f, "cast<{}>({})", ty, value),
            Expr::Select {
                cond,
                then,
                otherwise,
            } => write!(f, "select({}, {}, {})", cond, then, otherwise),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Source whose sample value encodes its coordinate.
    struct Ramp;

    impl Sampler for Ramp {
        fn sample(&self, x: i32, y: i32, ch: i32) -> ScalarValue {
            ScalarValue::UInt8((x + 10 * y + 100 * ch) as u8)
        }
    }

    #[test]
    fn test_eval_arithmetic_promotes() {
        let e = cast(ScalarType::Int32, sample(x(), y(), 0)) * 76 >> 8;
        assert_eq!(e.scalar_type(), ScalarType::Int32);
        // sample(3, 0, 0) = 3 -> 3 * 76 >> 8 = 0
        assert_eq!(e.eval([3, 0, 0], &Ramp), ScalarValue::Int32(0));
        // sample(5, 2, 0) = 25 -> 1900 >> 8 = 7
        assert_eq!(e.eval([5, 2, 0], &Ramp), ScalarValue::Int32(7));
    }

    #[test]
    fn test_integer_division_by_zero_is_zero() {
        let e = Expr::from(7) / 0;
        assert_eq!(e.eval([0, 0, 0], &Ramp), ScalarValue::Int32(0));
        let e = Expr::from(-7) / 2;
        assert_eq!(e.eval([0, 0, 0], &Ramp), ScalarValue::Int32(-4));
    }

    #[test]
    fn test_select_and_comparisons() {
        let e = select(x().lt(2).and(y().equals(0)), 1u8, 0u8);
        assert_eq!(e.eval([1, 0, 0], &Ramp), ScalarValue::UInt8(1));
        assert_eq!(e.eval([2, 0, 0], &Ramp), ScalarValue::UInt8(0));
        assert_eq!(e.eval([1, 1, 0], &Ramp), ScalarValue::UInt8(0));
    }

    #[test]
    fn test_bind_params_folds_constants() {
        let e = clamp(param("factor", ScalarType::Float32), 0.0f32, 1.0f32);
        assert_eq!(e.params().get("factor"), Some(&ScalarType::Float32));

        let mut values = IndexMap::new();
        values.insert("factor".to_string(), ScalarValue::Float32(2.5));
        let bound = e.bind_params(&values).unwrap();
        assert_eq!(bound, Expr::Const(ScalarValue::Float32(1.0)));
    }

    #[test]
    fn test_bind_params_reports_missing() {
        let e = param("width", ScalarType::Int32) - 1;
        assert_eq!(e.bind_params(&IndexMap::new()), Err("width".to_string()));
    }

    #[test]
    fn test_bind_params_converts_to_declared_type() {
        let e = param("width", ScalarType::Int32) - 1;
        let mut values = IndexMap::new();
        values.insert("width".to_string(), ScalarValue::Float32(8.0));
        assert_eq!(
            e.bind_params(&values).unwrap(),
            Expr::Const(ScalarValue::Int32(7))
        );
    }

    #[test]
    fn test_display() {
        let e = cast(ScalarType::UInt8, sample(x(), y(), ch()) + 1);
        assert_eq!(e.to_string(), "cast<uint8>((src(x, y, ch) + 1))");
    }
}
