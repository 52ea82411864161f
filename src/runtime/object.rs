use num_complex::Complex32;
use std::any::Any;
use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::runtime::Pmt;

/// Opaque host value.
///
/// The payload type of host labels. Cloning shares the underlying value.
#[derive(Clone, Default)]
pub struct Object {
    value: Option<Arc<dyn Any + Send + Sync>>,
    type_name: &'static str,
}

impl Object {
    /// The null object.
    pub fn null() -> Object {
        Object::default()
    }

    /// Wrap a value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Object {
        Object {
            value: Some(Arc::new(value)),
            type_name: type_name::<T>(),
        }
    }

    /// Check whether the object holds no value.
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Check the concrete type of the value.
    pub fn is<T: Any>(&self) -> bool {
        self.value.as_ref().is_some_and(|v| v.is::<T>())
    }

    /// Borrow the value as `T`.
    pub fn extract<T: Any>(&self) -> Option<&T> {
        self.value.as_ref().and_then(|v| v.downcast_ref::<T>())
    }

    /// Name of the wrapped type, `"null"` for the null object.
    pub fn type_name(&self) -> &'static str {
        if self.value.is_none() {
            "null"
        } else {
            self.type_name
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object<{}>", self.type_name())
    }
}

/// Convert a tag value into a host object.
pub fn pmt_to_object(p: &Pmt) -> Object {
    match p {
        Pmt::Null => Object::null(),
        Pmt::Bool(v) => Object::new(*v),
        Pmt::Symbol(v) => Object::new(v.clone()),
        Pmt::I64(v) => Object::new(*v),
        Pmt::U64(v) => Object::new(*v),
        Pmt::F32(v) => Object::new(*v),
        Pmt::F64(v) => Object::new(*v),
        Pmt::Complex(v) => Object::new(*v),
        Pmt::Pair(car, cdr) => Object::new((pmt_to_object(car), pmt_to_object(cdr))),
        Pmt::VecCF32(v) => Object::new(v.clone()),
        Pmt::VecF32(v) => Object::new(v.clone()),
        Pmt::VecU64(v) => Object::new(v.clone()),
        Pmt::Blob(v) => Object::new(v.clone()),
        Pmt::Vector(v) => Object::new(v.iter().map(pmt_to_object).collect::<Vec<Object>>()),
        Pmt::Dict(v) => Object::new(
            v.iter()
                .map(|(k, v)| (k.clone(), pmt_to_object(v)))
                .collect::<HashMap<String, Object>>(),
        ),
        Pmt::Any(v) => match v.downcast_ref::<Object>() {
            Some(o) => o.clone(),
            None => Object::new(v.clone()),
        },
        #[allow(unreachable_patterns)]
        _ => {
            warn!("pmt_to_object: unsupported pmt kind {}", p.kind());
            Object::null()
        }
    }
}

/// Convert a host object into a tag value.
///
/// Objects of types without a native PMT representation are wrapped in [`Pmt::Any`].
pub fn object_to_pmt(o: &Object) -> Pmt {
    if o.is_null() {
        return Pmt::Null;
    }
    if let Some(v) = o.extract::<bool>() {
        return Pmt::Bool(*v);
    }
    if let Some(v) = o.extract::<String>() {
        return Pmt::Symbol(v.clone());
    }
    if let Some(v) = o.extract::<i64>() {
        return Pmt::I64(*v);
    }
    if let Some(v) = o.extract::<u64>() {
        return Pmt::U64(*v);
    }
    if let Some(v) = o.extract::<f32>() {
        return Pmt::F32(*v);
    }
    if let Some(v) = o.extract::<f64>() {
        return Pmt::F64(*v);
    }
    if let Some(v) = o.extract::<Complex32>() {
        return Pmt::Complex(*v);
    }
    if let Some((car, cdr)) = o.extract::<(Object, Object)>() {
        return Pmt::Pair(Box::new(object_to_pmt(car)), Box::new(object_to_pmt(cdr)));
    }
    if let Some(v) = o.extract::<Vec<Complex32>>() {
        return Pmt::VecCF32(v.clone());
    }
    if let Some(v) = o.extract::<Vec<f32>>() {
        return Pmt::VecF32(v.clone());
    }
    if let Some(v) = o.extract::<Vec<u64>>() {
        return Pmt::VecU64(v.clone());
    }
    if let Some(v) = o.extract::<Vec<u8>>() {
        return Pmt::Blob(v.clone());
    }
    if let Some(v) = o.extract::<Vec<Object>>() {
        return Pmt::Vector(v.iter().map(object_to_pmt).collect());
    }
    if let Some(v) = o.extract::<HashMap<String, Object>>() {
        return Pmt::Dict(
            v.iter()
                .map(|(k, v)| (k.clone(), object_to_pmt(v)))
                .collect(),
        );
    }
    if let Some(v) = o.extract::<Box<dyn blockbridge_types::PmtAny>>() {
        return Pmt::Any(v.clone());
    }
    Pmt::Any(Box::new(o.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(p: Pmt) {
        assert_eq!(object_to_pmt(&pmt_to_object(&p)), p);
    }

    #[test]
    fn scalars() {
        roundtrip(Pmt::Null);
        roundtrip(Pmt::Bool(true));
        roundtrip(Pmt::symbol("burst"));
        roundtrip(Pmt::I64(-3));
        roundtrip(Pmt::U64(3));
        roundtrip(Pmt::F32(0.25));
        roundtrip(Pmt::F64(1e9));
        roundtrip(Pmt::Complex(Complex32::new(1.0, -1.0)));
    }

    #[test]
    fn containers() {
        roundtrip(Pmt::pair(Pmt::U64(12), Pmt::F64(0.5)));
        roundtrip(Pmt::VecF32(vec![1.0, 2.0]));
        roundtrip(Pmt::VecU64(vec![1, 2]));
        roundtrip(Pmt::VecCF32(vec![Complex32::new(0.0, 1.0)]));
        roundtrip(Pmt::Blob(vec![0xde, 0xad]));
        roundtrip(Pmt::Vector(vec![Pmt::symbol("a"), Pmt::Null]));
        roundtrip(Pmt::Dict(HashMap::from([
            ("freq".to_string(), Pmt::F64(2.4e9)),
            ("nested".to_string(), Pmt::Vector(vec![Pmt::Bool(false)])),
        ])));
    }

    #[test]
    fn native_values() {
        let o = pmt_to_object(&Pmt::symbol("rx_time"));
        assert_eq!(o.extract::<String>().map(String::as_str), Some("rx_time"));
        assert!(pmt_to_object(&Pmt::Null).is_null());
        assert_eq!(pmt_to_object(&Pmt::Null).type_name(), "null");
    }

    #[test]
    fn foreign_objects() {
        #[derive(Clone, Debug, PartialEq)]
        struct Timestamp(u64);

        let o = Object::new(Timestamp(7));
        let p = object_to_pmt(&o);
        let Pmt::Any(ref any) = p else {
            panic!("expected Pmt::Any, got {p:?}");
        };
        assert!(any.is::<Object>());

        let back = pmt_to_object(&p);
        assert_eq!(back.extract::<Timestamp>(), Some(&Timestamp(7)));
    }
}
