//! Typed flat arrays and the runtime-tagged [`AttributeArray`].
//!
//! A [`DataArray<T>`] stores `tuples * components` elements contiguously.
//! Filters that do not care about the element type (relocation, scalar
//! comparison) work through [`AttributeArray`], which dispatches on a runtime
//! [`DataType`] tag instead of one code path per type.

use serde::{Deserialize, Serialize};

/// Element type tag of an [`AttributeArray`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    Bool,
}

/// Element types that can live in an [`AttributeArray`].
pub trait Element: Copy + Default + PartialEq + Send + Sync + std::fmt::Debug + 'static {
    const DATA_TYPE: DataType;

    /// `|a - b| <= tolerance`, with the tolerance converted to `Self` first
    /// (integers truncate it, `bool` compares by equality).
    fn within_tolerance(a: Self, b: Self, tolerance: f64) -> bool;

    fn wrap(array: DataArray<Self>) -> AttributeArray;
    fn unwrap_ref(array: &AttributeArray) -> Option<&DataArray<Self>>;
    fn unwrap_mut(array: &mut AttributeArray) -> Option<&mut DataArray<Self>>;
}

/// Flat array of `tuples * components` elements.
#[derive(Clone, Debug, PartialEq)]
pub struct DataArray<T> {
    components: usize,
    data: Vec<T>,
}

impl<T: Element> DataArray<T> {
    /// Default-initialised array.
    pub fn new(tuples: usize, components: usize) -> Self {
        assert!(components > 0, "arrays need at least one component");
        Self {
            components,
            data: vec![T::default(); tuples * components],
        }
    }

    /// Array filled with `value`.
    pub fn filled(tuples: usize, components: usize, value: T) -> Self {
        assert!(components > 0, "arrays need at least one component");
        Self {
            components,
            data: vec![value; tuples * components],
        }
    }

    /// Wraps existing storage; `data.len()` must be a multiple of `components`.
    pub fn from_vec(data: Vec<T>, components: usize) -> Self {
        assert!(components > 0, "arrays need at least one component");
        assert!(
            data.len() % components == 0,
            "array length {} is not a multiple of {} components",
            data.len(),
            components
        );
        Self { components, data }
    }

    #[inline]
    pub fn num_tuples(&self) -> usize {
        self.data.len() / self.components
    }

    #[inline]
    pub fn components(&self) -> usize {
        self.components
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    #[inline]
    pub fn tuple(&self, idx: usize) -> &[T] {
        let start = idx * self.components;
        &self.data[start..start + self.components]
    }

    #[inline]
    pub fn tuple_mut(&mut self, idx: usize) -> &mut [T] {
        let start = idx * self.components;
        &mut self.data[start..start + self.components]
    }

    /// Copies the whole tuple at `src` over the tuple at `dst`.
    #[inline]
    pub fn copy_tuple(&mut self, src: usize, dst: usize) {
        let c = self.components;
        self.data.copy_within(src * c..src * c + c, dst * c);
    }

    /// Resets every component of the tuple at `idx` to the zero value.
    #[inline]
    pub fn reset_tuple(&mut self, idx: usize) {
        self.tuple_mut(idx).fill(T::default());
    }
}

macro_rules! int_element {
    ($t:ty, $tag:ident) => {
        impl Element for $t {
            const DATA_TYPE: DataType = DataType::$tag;

            #[inline]
            fn within_tolerance(a: Self, b: Self, tolerance: f64) -> bool {
                let tol = tolerance as $t as i128;
                (a as i128 - b as i128).abs() <= tol
            }

            fn wrap(array: DataArray<Self>) -> AttributeArray {
                AttributeArray::$tag(array)
            }

            fn unwrap_ref(array: &AttributeArray) -> Option<&DataArray<Self>> {
                match array {
                    AttributeArray::$tag(inner) => Some(inner),
                    _ => None,
                }
            }

            fn unwrap_mut(array: &mut AttributeArray) -> Option<&mut DataArray<Self>> {
                match array {
                    AttributeArray::$tag(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

macro_rules! float_element {
    ($t:ty, $tag:ident) => {
        impl Element for $t {
            const DATA_TYPE: DataType = DataType::$tag;

            #[inline]
            fn within_tolerance(a: Self, b: Self, tolerance: f64) -> bool {
                let tol = tolerance as $t;
                if a >= b {
                    a - b <= tol
                } else {
                    b - a <= tol
                }
            }

            fn wrap(array: DataArray<Self>) -> AttributeArray {
                AttributeArray::$tag(array)
            }

            fn unwrap_ref(array: &AttributeArray) -> Option<&DataArray<Self>> {
                match array {
                    AttributeArray::$tag(inner) => Some(inner),
                    _ => None,
                }
            }

            fn unwrap_mut(array: &mut AttributeArray) -> Option<&mut DataArray<Self>> {
                match array {
                    AttributeArray::$tag(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

int_element!(i8, Int8);
int_element!(u8, UInt8);
int_element!(i16, Int16);
int_element!(u16, UInt16);
int_element!(i32, Int32);
int_element!(u32, UInt32);
int_element!(i64, Int64);
int_element!(u64, UInt64);
float_element!(f32, Float32);
float_element!(f64, Float64);

impl Element for bool {
    const DATA_TYPE: DataType = DataType::Bool;

    #[inline]
    fn within_tolerance(a: Self, b: Self, _tolerance: f64) -> bool {
        a == b
    }

    fn wrap(array: DataArray<Self>) -> AttributeArray {
        AttributeArray::Bool(array)
    }

    fn unwrap_ref(array: &AttributeArray) -> Option<&DataArray<Self>> {
        match array {
            AttributeArray::Bool(inner) => Some(inner),
            _ => None,
        }
    }

    fn unwrap_mut(array: &mut AttributeArray) -> Option<&mut DataArray<Self>> {
        match array {
            AttributeArray::Bool(inner) => Some(inner),
            _ => None,
        }
    }
}

/// A [`DataArray`] of any supported element type.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeArray {
    Int8(DataArray<i8>),
    UInt8(DataArray<u8>),
    Int16(DataArray<i16>),
    UInt16(DataArray<u16>),
    Int32(DataArray<i32>),
    UInt32(DataArray<u32>),
    Int64(DataArray<i64>),
    UInt64(DataArray<u64>),
    Float32(DataArray<f32>),
    Float64(DataArray<f64>),
    Bool(DataArray<bool>),
}

macro_rules! dispatch {
    ($value:expr, $arr:ident => $body:expr) => {
        match $value {
            AttributeArray::Int8($arr) => $body,
            AttributeArray::UInt8($arr) => $body,
            AttributeArray::Int16($arr) => $body,
            AttributeArray::UInt16($arr) => $body,
            AttributeArray::Int32($arr) => $body,
            AttributeArray::UInt32($arr) => $body,
            AttributeArray::Int64($arr) => $body,
            AttributeArray::UInt64($arr) => $body,
            AttributeArray::Float32($arr) => $body,
            AttributeArray::Float64($arr) => $body,
            AttributeArray::Bool($arr) => $body,
        }
    };
}

impl AttributeArray {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Int8(_) => DataType::Int8,
            Self::UInt8(_) => DataType::UInt8,
            Self::Int16(_) => DataType::Int16,
            Self::UInt16(_) => DataType::UInt16,
            Self::Int32(_) => DataType::Int32,
            Self::UInt32(_) => DataType::UInt32,
            Self::Int64(_) => DataType::Int64,
            Self::UInt64(_) => DataType::UInt64,
            Self::Float32(_) => DataType::Float32,
            Self::Float64(_) => DataType::Float64,
            Self::Bool(_) => DataType::Bool,
        }
    }

    pub fn num_tuples(&self) -> usize {
        dispatch!(self, a => a.num_tuples())
    }

    pub fn components(&self) -> usize {
        dispatch!(self, a => a.components())
    }

    pub fn copy_tuple(&mut self, src: usize, dst: usize) {
        dispatch!(self, a => a.copy_tuple(src, dst))
    }

    pub fn reset_tuple(&mut self, idx: usize) {
        dispatch!(self, a => a.reset_tuple(idx))
    }

    /// Scalar tolerance test between two tuples of a single-component array.
    ///
    /// Multi-component arrays and out-of-range indices never compare equal.
    pub fn within_tolerance(&self, a: usize, b: usize, tolerance: f64) -> bool {
        if self.components() != 1 {
            return false;
        }
        dispatch!(self, arr => {
            let data = arr.as_slice();
            match (data.get(a), data.get(b)) {
                (Some(&va), Some(&vb)) => Element::within_tolerance(va, vb, tolerance),
                _ => false,
            }
        })
    }

    pub fn downcast_ref<T: Element>(&self) -> Option<&DataArray<T>> {
        T::unwrap_ref(self)
    }

    pub fn downcast_mut<T: Element>(&mut self) -> Option<&mut DataArray<T>> {
        T::unwrap_mut(self)
    }
}

impl<T: Element> From<DataArray<T>> for AttributeArray {
    fn from(array: DataArray<T>) -> Self {
        T::wrap(array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_and_reset_move_whole_tuples() {
        let mut quats = DataArray::<f32>::from_vec((0..12).map(|v| v as f32).collect(), 4);
        assert_eq!(quats.num_tuples(), 3);
        quats.copy_tuple(2, 0);
        assert_eq!(quats.tuple(0), &[8.0, 9.0, 10.0, 11.0]);
        quats.reset_tuple(1);
        assert_eq!(quats.tuple(1), &[0.0; 4]);
        assert_eq!(quats.tuple(2), &[8.0, 9.0, 10.0, 11.0]);
    }

    #[test]
    fn tolerance_is_inclusive_and_typed() {
        assert!(f32::within_tolerance(0.0, 0.5, 0.5));
        assert!(!f32::within_tolerance(0.0, 0.5 + 1e-4, 0.5));
        assert!(f64::within_tolerance(10.0, 7.5, 2.5));
        // Integer tolerances truncate like the element type would.
        assert!(!i32::within_tolerance(3, 4, 0.9));
        assert!(i32::within_tolerance(3, 4, 1.0));
        assert!(!i8::within_tolerance(-128, 127, 255.0));
        assert!(u64::within_tolerance(u64::MAX, u64::MAX - 2, 2.0));
        assert!(bool::within_tolerance(true, true, 0.0));
        assert!(!bool::within_tolerance(true, false, 10.0));
    }

    #[test]
    fn tagged_array_dispatches_on_runtime_type() {
        let array: AttributeArray = DataArray::from_vec(vec![1u16, 4, 9], 1).into();
        assert_eq!(array.data_type(), DataType::UInt16);
        assert!(array.within_tolerance(0, 1, 3.0));
        assert!(!array.within_tolerance(1, 2, 4.0));
        assert!(!array.within_tolerance(0, 7, 100.0));
        assert!(array.downcast_ref::<u16>().is_some());
        assert!(array.downcast_ref::<i16>().is_none());

        let vectors: AttributeArray = DataArray::<f32>::new(2, 3).into();
        assert!(!vectors.within_tolerance(0, 1, 1.0));
    }
}
