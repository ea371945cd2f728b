//! Expressions over earlier bindings: collection lengths and nested-record arguments.

use std::ops::{Add, Mul, Sub};

use crate::{env::Env, errors::ReadError, value::Value};

/// An expression evaluated against the [Env] of the record being read.
///
/// Every name an expression mentions is visible through [Expr::dependencies], which lets
/// [crate::schema::Schema::compile] reject forward references before anything is parsed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Expr {
    Const(i64),
    /// Value bound to a field or extra argument.
    Ref(String),
    /// Number of elements of an array binding.
    Len(String),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn field(name: &str) -> Self {
        Expr::Ref(name.to_string())
    }

    pub fn len_of(name: &str) -> Self {
        Expr::Len(name.to_string())
    }

    /// Names this expression reads.
    pub fn dependencies(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_dependencies(&mut out);
        out
    }

    fn collect_dependencies<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Const(_) => {}
            Expr::Ref(name) | Expr::Len(name) => out.push(name),
            Expr::Add(lhs, rhs) | Expr::Sub(lhs, rhs) | Expr::Mul(lhs, rhs) => {
                lhs.collect_dependencies(out);
                rhs.collect_dependencies(out);
            }
        }
    }

    /// Evaluates to a value. `Ref` yields the bound value unchanged; arithmetic yields `I64`.
    pub fn evaluate(&self, env: &Env) -> Result<Value, ReadError> {
        match self {
            Expr::Const(v) => Ok(Value::I64(*v)),
            Expr::Ref(name) => env.require(name).cloned(),
            Expr::Len(_) | Expr::Add(..) | Expr::Sub(..) | Expr::Mul(..) => {
                let v = self.integer(env)?;
                i64::try_from(v).map(Value::I64).map_err(|_| ReadError::Overflow)
            }
        }
    }

    fn integer(&self, env: &Env) -> Result<i128, ReadError> {
        match self {
            Expr::Const(v) => Ok((*v).into()),
            Expr::Ref(name) => env.integer(name),
            Expr::Len(name) => Ok(env.array(name)?.len() as i128),
            Expr::Add(lhs, rhs) => lhs
                .integer(env)?
                .checked_add(rhs.integer(env)?)
                .ok_or(ReadError::Overflow),
            Expr::Sub(lhs, rhs) => lhs
                .integer(env)?
                .checked_sub(rhs.integer(env)?)
                .ok_or(ReadError::Overflow),
            Expr::Mul(lhs, rhs) => lhs
                .integer(env)?
                .checked_mul(rhs.integer(env)?)
                .ok_or(ReadError::Overflow),
        }
    }

    /// Evaluates as a collection length.
    ///
    /// Integers must be non-negative; floats must also have no fractional part.
    /// Anything else is [ReadError::InvalidLength].
    pub fn evaluate_length(&self, env: &Env) -> Result<usize, ReadError> {
        let value = self.evaluate(env)?;

        if let Some(n) = value.as_integer() {
            return usize::try_from(n).map_err(|_| ReadError::InvalidLength(n.to_string()));
        }

        match value.as_float() {
            Some(f) if f.is_finite() && f.fract() == 0.0 && f >= 0.0 && f <= usize::MAX as f64 => {
                Ok(f as usize)
            }
            Some(f) => Err(ReadError::InvalidLength(f.to_string())),
            None => Err(ReadError::InvalidLength(value.kind_name().to_string())),
        }
    }
}

impl From<i64> for Expr {
    fn from(v: i64) -> Self {
        Expr::Const(v)
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        Expr::field(name)
    }
}

macro_rules! impl_op {
    ($($trait:ident :: $method:ident => $variant:ident),* $(,)?) => {
        $(
            impl $trait for Expr {
                type Output = Expr;

                fn $method(self, rhs: Expr) -> Expr {
                    Expr::$variant(Box::new(self), Box::new(rhs))
                }
            }
        )*
    };
}

impl_op!(Add::add => Add, Sub::sub => Sub, Mul::mul => Mul);
