use dyn_clone::DynClone;
use num_complex::Complex32;
use serde::Deserialize;
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// PMT Any trait
///
/// Implemented for every clonable, thread-safe type so that foreign values can travel inside a
/// [`Pmt::Any`].
pub trait PmtAny: Any + DynClone + Send + Sync + 'static {
    /// Cast to [`Any`](std::any::Any)
    fn as_any(&self) -> &dyn Any;
    /// Consume `self`, converting to a `Box<dyn Any>`
    fn to_any(self: Box<Self>) -> Box<dyn Any>;
}
dyn_clone::clone_trait_object!(PmtAny);

impl<T: Any + DynClone + Send + Sync + 'static> PmtAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn to_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl fmt::Debug for Box<dyn PmtAny> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Box<dyn Any>")
    }
}

impl dyn PmtAny {
    /// Determine if this `PmtAny` has the given concrete type.
    pub fn is<T: PmtAny>(&self) -> bool {
        self.as_any().is::<T>()
    }
    /// Try to cast the [`Pmt::Any`] to the given type.
    pub fn downcast_ref<T: PmtAny>(&self) -> Option<&T> {
        (*self).as_any().downcast_ref::<T>()
    }
    /// Consuming `self`, try to take ownership of the value as the given type.
    pub fn take<T: PmtAny>(self: Box<Self>) -> Option<Box<T>> {
        self.to_any().downcast::<T>().ok()
    }
}

/// PMT -- Polymorphic Type
///
/// The value model of legacy stream tags. Tag keys are symbols, tag values can be any variant.
/// The `Any` variant is ignored for de-/serialization.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Pmt {
    /// Null, the legacy `PMT_NIL`.
    Null,
    /// Boolean
    Bool(bool),
    /// Symbol
    Symbol(String),
    /// Signed 64-bit integer
    I64(i64),
    /// Unsigned 64-bit integer
    U64(u64),
    /// F32, 32-bit float
    F32(f32),
    /// F64, 64-bit float
    F64(f64),
    /// 32-bit complex float
    Complex(Complex32),
    /// Pair of PMTs
    Pair(Box<Pmt>, Box<Pmt>),
    /// Vector of 32-bit complex floats.
    VecCF32(Vec<Complex32>),
    /// Vector of 32-bit floats.
    VecF32(Vec<f32>),
    /// Vector of 64-bit unsigned integers.
    VecU64(Vec<u64>),
    /// Binary data blob
    Blob(Vec<u8>),
    /// Vector of [`Pmts`](Pmt)
    Vector(Vec<Pmt>),
    /// Dictionary (String -> Pmt)
    Dict(HashMap<String, Pmt>),
    /// Any type
    ///
    /// Wrap anything that implements [`Any`](std::any::Any) in a Pmt. Use
    /// `downcast_ref/mut()` to extract.
    #[serde(skip)]
    Any(Box<dyn PmtAny>),
}

impl Pmt {
    /// Create a symbol.
    pub fn symbol(s: impl Into<String>) -> Pmt {
        Pmt::Symbol(s.into())
    }

    /// Create a pair.
    pub fn pair(car: impl Into<Pmt>, cdr: impl Into<Pmt>) -> Pmt {
        Pmt::Pair(Box::new(car.into()), Box::new(cdr.into()))
    }

    /// Check for [`Pmt::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Pmt::Null)
    }

    /// Check for [`Pmt::Symbol`].
    pub fn is_symbol(&self) -> bool {
        matches!(self, Pmt::Symbol(_))
    }

    /// Symbol name, if this is a symbol.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Pmt::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Get the PMT variant kind without associated data.
    pub fn kind(&self) -> PmtKind {
        match self {
            Pmt::Null => PmtKind::Null,
            Pmt::Bool(_) => PmtKind::Bool,
            Pmt::Symbol(_) => PmtKind::Symbol,
            Pmt::I64(_) => PmtKind::I64,
            Pmt::U64(_) => PmtKind::U64,
            Pmt::F32(_) => PmtKind::F32,
            Pmt::F64(_) => PmtKind::F64,
            Pmt::Complex(_) => PmtKind::Complex,
            Pmt::Pair(..) => PmtKind::Pair,
            Pmt::VecCF32(_) => PmtKind::VecCF32,
            Pmt::VecF32(_) => PmtKind::VecF32,
            Pmt::VecU64(_) => PmtKind::VecU64,
            Pmt::Blob(_) => PmtKind::Blob,
            Pmt::Vector(_) => PmtKind::Vector,
            Pmt::Dict(_) => PmtKind::Dict,
            Pmt::Any(_) => PmtKind::Any,
        }
    }
}

impl fmt::Display for Pmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pmt::Null => write!(f, "()"),
            Pmt::Bool(v) => write!(f, "{v}"),
            Pmt::Symbol(v) => write!(f, "{v}"),
            Pmt::I64(v) => write!(f, "{v}"),
            Pmt::U64(v) => write!(f, "{v}"),
            Pmt::F32(v) => write!(f, "{v}"),
            Pmt::F64(v) => write!(f, "{v}"),
            Pmt::Complex(v) => write!(f, "{v}"),
            Pmt::Pair(car, cdr) => write!(f, "({car} . {cdr})"),
            Pmt::VecCF32(v) => write!(f, "{v:?}"),
            Pmt::VecF32(v) => write!(f, "{v:?}"),
            Pmt::VecU64(v) => write!(f, "{v:?}"),
            Pmt::Blob(v) => write!(f, "{v:?}"),
            Pmt::Vector(v) => write!(f, "{v:?}"),
            Pmt::Dict(v) => write!(f, "{v:?}"),
            Pmt::Any(v) => write!(f, "{v:?}"),
        }
    }
}

impl PartialEq for Pmt {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Pmt::Null, Pmt::Null) => true,
            (Pmt::Bool(x), Pmt::Bool(y)) => x == y,
            (Pmt::Symbol(x), Pmt::Symbol(y)) => x == y,
            (Pmt::I64(x), Pmt::I64(y)) => x == y,
            (Pmt::U64(x), Pmt::U64(y)) => x == y,
            (Pmt::F32(x), Pmt::F32(y)) => x == y,
            (Pmt::F64(x), Pmt::F64(y)) => x == y,
            (Pmt::Complex(x), Pmt::Complex(y)) => x == y,
            (Pmt::Pair(a, b), Pmt::Pair(c, d)) => a == c && b == d,
            (Pmt::VecF32(x), Pmt::VecF32(y)) => x == y,
            (Pmt::VecU64(x), Pmt::VecU64(y)) => x == y,
            (Pmt::VecCF32(x), Pmt::VecCF32(y)) => x == y,
            (Pmt::Blob(x), Pmt::Blob(y)) => x == y,
            (Pmt::Vector(x), Pmt::Vector(y)) => x == y,
            (Pmt::Dict(x), Pmt::Dict(y)) => x == y,
            _ => false,
        }
    }
}

impl std::str::FromStr for Pmt {
    type Err = PmtConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "()" | "Null" | "null" => return Ok(Pmt::Null),
            "true" | "#t" => return Ok(Pmt::Bool(true)),
            "false" | "#f" => return Ok(Pmt::Bool(false)),
            _ => (),
        }

        if let Ok(p) = serde_json::from_str(s) {
            return Ok(p);
        }

        if let Some((a, b)) = s.split_once(':') {
            let s = format!("{{ \"{}\": {}}}", a.trim(), b.trim());
            if let Ok(p) = serde_json::from_str(&s) {
                return Ok(p);
            }
        }
        Err(PmtConversionError)
    }
}

/// PMT conversion error.
///
/// This error is returned, if conversion to/from PMTs fail.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("PMT conversion error")]
pub struct PmtConversionError;

impl TryFrom<&Pmt> for f64 {
    type Error = PmtConversionError;

    fn try_from(value: &Pmt) -> Result<f64, Self::Error> {
        match value {
            Pmt::F32(f) => Ok(*f as f64),
            Pmt::F64(f) => Ok(*f),
            Pmt::I64(f) => Ok(*f as f64),
            Pmt::U64(f) => Ok(*f as f64),
            _ => Err(PmtConversionError),
        }
    }
}

impl TryFrom<Pmt> for f64 {
    type Error = PmtConversionError;

    fn try_from(value: Pmt) -> Result<f64, Self::Error> {
        (&value).try_into()
    }
}

impl TryFrom<&Pmt> for u64 {
    type Error = PmtConversionError;

    fn try_from(value: &Pmt) -> Result<u64, Self::Error> {
        match value {
            Pmt::U64(v) => Ok(*v),
            Pmt::I64(v) => u64::try_from(*v).map_err(|_| PmtConversionError),
            _ => Err(PmtConversionError),
        }
    }
}

impl TryFrom<Pmt> for u64 {
    type Error = PmtConversionError;

    fn try_from(value: Pmt) -> Result<u64, Self::Error> {
        (&value).try_into()
    }
}

impl TryFrom<&Pmt> for usize {
    type Error = PmtConversionError;

    fn try_from(value: &Pmt) -> Result<usize, Self::Error> {
        let v: u64 = value.try_into()?;
        usize::try_from(v).map_err(|_| PmtConversionError)
    }
}

impl TryFrom<Pmt> for usize {
    type Error = PmtConversionError;

    fn try_from(value: Pmt) -> Result<usize, Self::Error> {
        (&value).try_into()
    }
}

impl TryFrom<&Pmt> for i64 {
    type Error = PmtConversionError;

    fn try_from(value: &Pmt) -> Result<i64, Self::Error> {
        match value {
            Pmt::I64(v) => Ok(*v),
            Pmt::U64(v) => i64::try_from(*v).map_err(|_| PmtConversionError),
            _ => Err(PmtConversionError),
        }
    }
}

impl TryFrom<Pmt> for i64 {
    type Error = PmtConversionError;

    fn try_from(value: Pmt) -> Result<i64, Self::Error> {
        (&value).try_into()
    }
}

impl TryFrom<&Pmt> for bool {
    type Error = PmtConversionError;

    fn try_from(value: &Pmt) -> Result<bool, Self::Error> {
        match value {
            Pmt::Bool(b) => Ok(*b),
            _ => Err(PmtConversionError),
        }
    }
}

impl TryFrom<Pmt> for bool {
    type Error = PmtConversionError;

    fn try_from(value: Pmt) -> Result<bool, Self::Error> {
        (&value).try_into()
    }
}

impl From<()> for Pmt {
    fn from(_: ()) -> Self {
        Pmt::Null
    }
}

impl From<bool> for Pmt {
    fn from(b: bool) -> Self {
        Pmt::Bool(b)
    }
}

impl From<&str> for Pmt {
    fn from(s: &str) -> Self {
        Pmt::Symbol(s.to_string())
    }
}

impl From<f32> for Pmt {
    fn from(f: f32) -> Self {
        Pmt::F32(f)
    }
}

impl From<f64> for Pmt {
    fn from(f: f64) -> Self {
        Pmt::F64(f)
    }
}

impl From<i64> for Pmt {
    fn from(v: i64) -> Self {
        Pmt::I64(v)
    }
}

impl From<u64> for Pmt {
    fn from(v: u64) -> Self {
        Pmt::U64(v)
    }
}

impl From<usize> for Pmt {
    fn from(v: usize) -> Self {
        Pmt::U64(v as u64)
    }
}

impl From<Complex32> for Pmt {
    fn from(v: Complex32) -> Self {
        Pmt::Complex(v)
    }
}

impl From<Vec<f32>> for Pmt {
    fn from(v: Vec<f32>) -> Self {
        Pmt::VecF32(v)
    }
}

impl From<Vec<u64>> for Pmt {
    fn from(v: Vec<u64>) -> Self {
        Pmt::VecU64(v)
    }
}

impl From<Vec<Complex32>> for Pmt {
    fn from(v: Vec<Complex32>) -> Self {
        Pmt::VecCF32(v)
    }
}

/// PMT types that do not wrap values.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PmtKind {
    /// Null
    Null,
    /// Bool
    Bool,
    /// Symbol
    Symbol,
    /// I64
    I64,
    /// U64
    U64,
    /// F32
    F32,
    /// F64
    F64,
    /// Complex
    Complex,
    /// Pair
    Pair,
    /// VecCF32
    VecCF32,
    /// VecF32
    VecF32,
    /// VecU64
    VecU64,
    /// Blob
    Blob,
    /// Vector
    Vector,
    /// Dict
    Dict,
    /// Any
    Any,
}

impl From<&Pmt> for PmtKind {
    fn from(value: &Pmt) -> Self {
        value.kind()
    }
}

impl fmt::Display for PmtKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Pmt::Null.to_string(), "()");
        assert_eq!(Pmt::symbol("rx_time").to_string(), "rx_time");
        assert_eq!(Pmt::pair(1u64, 0.5f64).to_string(), "(1 . 0.5)");
    }

    #[test]
    fn parse_json() {
        assert_eq!("{ \"U64\": 123 }".parse::<Pmt>(), Ok(Pmt::U64(123)));
        assert_eq!("Bool: true".parse::<Pmt>(), Ok(Pmt::Bool(true)));
        assert_eq!("F64: 123".parse::<Pmt>(), Ok(Pmt::F64(123.0)));
        assert_eq!("Blob: [1,2,3]".parse::<Pmt>(), Ok(Pmt::Blob(vec![1, 2, 3])));
        assert_eq!("#t".parse::<Pmt>(), Ok(Pmt::Bool(true)));
        assert!("garbage".parse::<Pmt>().is_err());
    }

    #[test]
    fn eq() {
        assert_eq!(Pmt::Null, Pmt::Null);
        assert_ne!(Pmt::U64(1), Pmt::I64(1));
        assert_eq!(Pmt::pair("a", 1u64), Pmt::pair("a", 1u64));
        assert_ne!(Pmt::pair("a", 1u64), Pmt::pair("a", 2u64));
        assert_ne!(Pmt::Any(Box::new(1u8)), Pmt::Any(Box::new(1u8)));

        let d1 = Pmt::Dict(HashMap::from([("k".to_string(), Pmt::F32(0.5))]));
        let d2 = Pmt::Dict(HashMap::from([("k".to_string(), Pmt::F32(0.5))]));
        assert_eq!(d1, d2);
    }

    #[test]
    fn try_into_numbers() {
        assert_eq!(u64::try_from(&Pmt::I64(7)), Ok(7));
        assert_eq!(u64::try_from(&Pmt::I64(-7)), Err(PmtConversionError));
        assert_eq!(usize::try_from(Pmt::U64(3)), Ok(3));
        assert_eq!(f64::try_from(Pmt::F32(0.5)), Ok(0.5));
        assert_eq!(i64::try_from(&Pmt::U64(u64::MAX)), Err(PmtConversionError));
    }

    #[test]
    fn kind() {
        assert_eq!(Pmt::symbol("x").kind(), PmtKind::Symbol);
        assert_eq!(PmtKind::from(&Pmt::pair(1u64, 2u64)), PmtKind::Pair);
        assert_eq!(PmtKind::Vector.to_string(), "Vector");
    }

    #[test]
    fn take_any() {
        let p = Pmt::Any(Box::new(vec![1u8]));

        let Pmt::Any(p_any) = p else { unreachable!() };
        assert!(p_any.is::<Vec<u8>>());

        let v = p_any.take::<Vec<u8>>().unwrap();
        assert_eq!(v[0], 1u8)
    }
}
