//! Default coercion between field shapes and property values.
//!
//! The supported field shapes form a closed set; each shape accepts exactly
//! the property variants listed on its implementation and nothing else. The
//! exhaustive matches here replace the "impossible state" failure paths a
//! runtime-reflective implementation would need.

use chrono::{DateTime, Utc};
use property_model::{GeoPoint, Key, PropertyValue};

/// Result of coercing one property value toward a field.
pub enum Coerced<T> {
    /// Assign the coerced value to the field.
    Set(T),
    /// Leave the field untouched (a null arriving at a key-like field).
    Keep,
}

/// A field shape with default property coercion rules.
///
/// Implemented for the closed set of supported shapes: the signed integer
/// widths, `bool`, `String`, the float widths, `Option<Key>`,
/// `DateTime<Utc>`, `GeoPoint` and `Vec<u8>`. Repeated fields apply the same
/// rules per element.
pub trait PropertyPrimitive: Sized + 'static {
    /// Shape name used in mismatch diagnostics.
    fn shape() -> &'static str;

    fn to_value(&self) -> PropertyValue;

    /// Coerces `value` toward this shape, or explains the mismatch.
    fn from_value(value: &PropertyValue) -> Result<Coerced<Self>, String>;
}

fn mismatch<T: PropertyPrimitive>(value: &PropertyValue) -> String {
    format!("type mismatch: {} versus {}", value.kind(), T::shape())
}

macro_rules! narrow_int_primitive {
    ($ty:ty, $shape:literal) => {
        impl PropertyPrimitive for $ty {
            fn shape() -> &'static str {
                $shape
            }

            fn to_value(&self) -> PropertyValue {
                PropertyValue::Int(*self as i64)
            }

            fn from_value(value: &PropertyValue) -> Result<Coerced<Self>, String> {
                match value {
                    PropertyValue::Int(x) => <$ty>::try_from(*x).map(Coerced::Set).map_err(|_| {
                        format!("value {} overflows field of type {}", x, $shape)
                    }),
                    other => Err(mismatch::<Self>(other)),
                }
            }
        }
    };
}

narrow_int_primitive!(i8, "int8");
narrow_int_primitive!(i16, "int16");
narrow_int_primitive!(i32, "int32");

impl PropertyPrimitive for i64 {
    fn shape() -> &'static str {
        "int64"
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::Int(*self)
    }

    fn from_value(value: &PropertyValue) -> Result<Coerced<Self>, String> {
        match value {
            PropertyValue::Int(x) => Ok(Coerced::Set(*x)),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl PropertyPrimitive for bool {
    fn shape() -> &'static str {
        "bool"
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::Bool(*self)
    }

    fn from_value(value: &PropertyValue) -> Result<Coerced<Self>, String> {
        match value {
            PropertyValue::Bool(b) => Ok(Coerced::Set(*b)),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl PropertyPrimitive for String {
    fn shape() -> &'static str {
        "string"
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::Str(self.clone())
    }

    /// Strings also accept a key, coerced to its string form.
    fn from_value(value: &PropertyValue) -> Result<Coerced<Self>, String> {
        match value {
            PropertyValue::Str(s) => Ok(Coerced::Set(s.clone())),
            PropertyValue::Key(k) => Ok(Coerced::Set(k.as_str().to_string())),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl PropertyPrimitive for f64 {
    fn shape() -> &'static str {
        "float64"
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::Float(*self)
    }

    fn from_value(value: &PropertyValue) -> Result<Coerced<Self>, String> {
        match value {
            PropertyValue::Float(x) => Ok(Coerced::Set(*x)),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl PropertyPrimitive for f32 {
    fn shape() -> &'static str {
        "float32"
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::Float(*self as f64)
    }

    fn from_value(value: &PropertyValue) -> Result<Coerced<Self>, String> {
        match value {
            PropertyValue::Float(x) => {
                let narrowed = *x as f32;
                if narrowed.is_infinite() && x.is_finite() {
                    Err(format!("value {} overflows field of type float32", x))
                } else {
                    Ok(Coerced::Set(narrowed))
                }
            }
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl PropertyPrimitive for Option<Key> {
    fn shape() -> &'static str {
        "key"
    }

    fn to_value(&self) -> PropertyValue {
        match self {
            Some(k) => PropertyValue::Key(k.clone()),
            None => PropertyValue::Null,
        }
    }

    /// A null leaves the field untouched rather than clearing it.
    fn from_value(value: &PropertyValue) -> Result<Coerced<Self>, String> {
        match value {
            PropertyValue::Key(k) => Ok(Coerced::Set(Some(k.clone()))),
            PropertyValue::Null => Ok(Coerced::Keep),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl PropertyPrimitive for DateTime<Utc> {
    fn shape() -> &'static str {
        "timestamp"
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::Time(*self)
    }

    fn from_value(value: &PropertyValue) -> Result<Coerced<Self>, String> {
        match value {
            PropertyValue::Time(t) => Ok(Coerced::Set(*t)),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl PropertyPrimitive for GeoPoint {
    fn shape() -> &'static str {
        "geo-point"
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::Geo(*self)
    }

    fn from_value(value: &PropertyValue) -> Result<Coerced<Self>, String> {
        match value {
            PropertyValue::Geo(g) => Ok(Coerced::Set(*g)),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl PropertyPrimitive for Vec<u8> {
    fn shape() -> &'static str {
        "bytes"
    }

    fn to_value(&self) -> PropertyValue {
        PropertyValue::Bytes(self.clone())
    }

    fn from_value(value: &PropertyValue) -> Result<Coerced<Self>, String> {
        match value {
            PropertyValue::Bytes(b) => Ok(Coerced::Set(b.clone())),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set<T: PropertyPrimitive>(value: &PropertyValue) -> T {
        match T::from_value(value) {
            Ok(Coerced::Set(v)) => v,
            Ok(Coerced::Keep) => panic!("unexpected keep"),
            Err(reason) => panic!("unexpected mismatch: {}", reason),
        }
    }

    #[test]
    fn test_narrow_int_overflow_is_checked() {
        assert_eq!(set::<i8>(&PropertyValue::Int(127)), 127);
        let err = i8::from_value(&PropertyValue::Int(128)).err().unwrap();
        assert!(err.contains("overflows"), "{}", err);
        assert_eq!(set::<i16>(&PropertyValue::Int(-32768)), -32768);
    }

    #[test]
    fn test_string_accepts_key_string_form() {
        assert_eq!(
            set::<String>(&PropertyValue::Key(Key::new("k:1"))),
            "k:1".to_string()
        );
    }

    #[test]
    fn test_float32_overflow_is_checked() {
        let err = f32::from_value(&PropertyValue::Float(1e300)).err().unwrap();
        assert!(err.contains("overflows"), "{}", err);
        assert_eq!(set::<f32>(&PropertyValue::Float(1.5)), 1.5f32);
        // Infinity is representable, not an overflow.
        assert!(set::<f32>(&PropertyValue::Float(f64::INFINITY)).is_infinite());
    }

    #[test]
    fn test_null_keeps_key_fields_untouched() {
        assert!(matches!(
            Option::<Key>::from_value(&PropertyValue::Null),
            Ok(Coerced::Keep)
        ));
    }

    #[test]
    fn test_shape_mismatch_names_both_sides() {
        let err = bool::from_value(&PropertyValue::Int(1)).err().unwrap();
        assert_eq!(err, "type mismatch: int versus bool");
    }
}
