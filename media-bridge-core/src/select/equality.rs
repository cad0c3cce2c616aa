//! Selection equality.
//!
//! A selector's result only propagates when it differs from the previous
//! one. The default test is [`SameValue`]: plain equality, except that NaN
//! equals NaN and `+0.0` differs from `-0.0`, and shared pointers compare
//! by identity. Composite values compare element by element under the same
//! rules, so `Option<f64>` holding NaN is stable too.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::store::{HostHandle, MediaValue, StreamType, TextTrack, VolumeLevel};

/// Equality used to decide whether a new selection replaces the old one.
pub type EqualityFn<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// Value equality for selections.
///
/// Owned collections (`Vec`, slices, tuples, `IndexMap`) compare by
/// content, so a freshly allocated but equal collection does not
/// propagate. Select an `Arc` to propagate on every new allocation: `Arc`
/// compares by identity.
pub trait SameValue {
    fn same_value(&self, other: &Self) -> bool;
}

/// `a.same_value(b)` as a free function, usable as an [`EqualityFn`].
pub fn same_value<T: SameValue + ?Sized>(a: &T, b: &T) -> bool {
    a.same_value(b)
}

/// The default [`EqualityFn`] for `T`.
pub fn same_value_fn<T: SameValue + 'static>() -> EqualityFn<T> {
    Arc::new(|a: &T, b: &T| a.same_value(b))
}

macro_rules! same_value_by_eq {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SameValue for $ty {
                #[inline]
                fn same_value(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

same_value_by_eq!(
    (), bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, str, String,
    TextTrack, HostHandle, VolumeLevel, StreamType,
);

impl SameValue for f64 {
    #[inline]
    fn same_value(&self, other: &Self) -> bool {
        (self.is_nan() && other.is_nan()) || self.to_bits() == other.to_bits()
    }
}

impl SameValue for f32 {
    #[inline]
    fn same_value(&self, other: &Self) -> bool {
        (self.is_nan() && other.is_nan()) || self.to_bits() == other.to_bits()
    }
}

impl<T: SameValue> SameValue for Option<T> {
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same_value(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: SameValue> SameValue for [T] {
    fn same_value(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.same_value(b))
    }
}

impl<T: SameValue> SameValue for Vec<T> {
    fn same_value(&self, other: &Self) -> bool {
        self.as_slice().same_value(other.as_slice())
    }
}

impl<T: ?Sized> SameValue for Arc<T> {
    fn same_value(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<A: SameValue, B: SameValue> SameValue for (A, B) {
    fn same_value(&self, other: &Self) -> bool {
        self.0.same_value(&other.0) && self.1.same_value(&other.1)
    }
}

impl<A: SameValue, B: SameValue, C: SameValue> SameValue for (A, B, C) {
    fn same_value(&self, other: &Self) -> bool {
        self.0.same_value(&other.0) && self.1.same_value(&other.1) && self.2.same_value(&other.2)
    }
}

impl<V: SameValue> SameValue for IndexMap<String, V> {
    fn same_value(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other)
                .all(|((ka, va), (kb, vb))| ka == kb && va.same_value(vb))
    }
}

impl SameValue for MediaValue {
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (MediaValue::Null, MediaValue::Null) => true,
            (MediaValue::Bool(a), MediaValue::Bool(b)) => a == b,
            (MediaValue::Number(a), MediaValue::Number(b)) => a.same_value(b),
            (MediaValue::Text(a), MediaValue::Text(b)) => a == b,
            (MediaValue::List(a), MediaValue::List(b)) => a.same_value(b),
            (MediaValue::Map(a), MediaValue::Map(b)) => a.same_value(b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_is_same_as_nan() {
        assert!(f64::NAN.same_value(&f64::NAN));
        assert!(Some(f64::NAN).same_value(&Some(f64::NAN)));
        assert!(MediaValue::Number(f64::NAN).same_value(&MediaValue::Number(f64::NAN)));
    }

    #[test]
    fn signed_zeros_differ() {
        assert!(!0.0_f64.same_value(&-0.0));
        assert!(1.5_f64.same_value(&1.5));
    }

    #[test]
    fn option_distinguishes_none() {
        assert!(!Some(false).same_value(&None));
        assert!(None::<bool>.same_value(&None));
    }

    #[test]
    fn arcs_compare_by_identity() {
        let a = Arc::new(vec![1, 2]);
        let b = Arc::new(vec![1, 2]);
        assert!(a.same_value(&a.clone()));
        assert!(!a.same_value(&b));
    }

    #[test]
    fn fresh_vec_is_same_but_fresh_arc_is_not() {
        let tracks = || vec![TextTrack::new("captions", "English", "en")];
        assert!(tracks().same_value(&tracks()));
        assert!(!Arc::new(tracks()).same_value(&Arc::new(tracks())));
    }

    #[test]
    fn lists_compare_element_wise() {
        let a = MediaValue::List(vec![MediaValue::Number(f64::NAN), MediaValue::from("x")]);
        let b = MediaValue::List(vec![MediaValue::Number(f64::NAN), MediaValue::from("x")]);
        let c = MediaValue::List(vec![MediaValue::Number(f64::NAN)]);
        assert!(a.same_value(&b));
        assert!(!a.same_value(&c));
    }

    #[test]
    fn variants_never_match_across_kinds() {
        assert!(!MediaValue::Bool(false).same_value(&MediaValue::Null));
        assert!(!MediaValue::Number(1.0).same_value(&MediaValue::from("1")));
    }

    #[test]
    fn equality_fn_wraps_trait() {
        let eq = same_value_fn::<Option<f64>>();
        assert!(eq(&Some(f64::NAN), &Some(f64::NAN)));
        assert!(!eq(&Some(1.0), &None));
    }
}
