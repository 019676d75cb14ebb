use super::array::{AttributeArray, DataArray, Element};
use crate::error::{ReconError, ReconResult};
use std::collections::BTreeMap;

/// Named arrays sharing one tuple count (one tuple per voxel for cell data).
///
/// Arrays are kept in name order so iteration, and therefore any report built
/// from it, is deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeMatrix {
    tuples: usize,
    arrays: BTreeMap<String, AttributeArray>,
}

impl AttributeMatrix {
    pub fn new(tuples: usize) -> Self {
        Self {
            tuples,
            arrays: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn num_tuples(&self) -> usize {
        self.tuples
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.arrays.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arrays.keys().map(String::as_str)
    }

    /// Inserts or replaces an array, returning the previous one.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        array: impl Into<AttributeArray>,
    ) -> ReconResult<Option<AttributeArray>> {
        let name = name.into();
        let array = array.into();
        if array.num_tuples() != self.tuples {
            return Err(ReconError::TupleMismatch {
                name,
                expected: self.tuples,
                actual: array.num_tuples(),
            });
        }
        Ok(self.arrays.insert(name, array))
    }

    pub fn remove(&mut self, name: &str) -> Option<AttributeArray> {
        self.arrays.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&AttributeArray> {
        self.arrays.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut AttributeArray> {
        self.arrays.get_mut(name)
    }

    /// Looks up an array and checks its element type and component count.
    pub fn typed<T: Element>(&self, name: &str, components: usize) -> ReconResult<&DataArray<T>> {
        let array = self.require(name)?;
        check_shape::<T>(name, array, components)?;
        array.downcast_ref::<T>().ok_or_else(|| ReconError::TypeMismatch {
            name: name.to_string(),
            expected: T::DATA_TYPE,
            actual: array.data_type(),
        })
    }

    /// Mutable counterpart of [`Self::typed`].
    pub fn typed_mut<T: Element>(
        &mut self,
        name: &str,
        components: usize,
    ) -> ReconResult<&mut DataArray<T>> {
        let array = self
            .arrays
            .get_mut(name)
            .ok_or_else(|| ReconError::MissingArray {
                name: name.to_string(),
            })?;
        check_shape::<T>(name, array, components)?;
        let actual = array.data_type();
        array
            .downcast_mut::<T>()
            .ok_or_else(|| ReconError::TypeMismatch {
                name: name.to_string(),
                expected: T::DATA_TYPE,
                actual,
            })
    }

    /// Looks up an array of any type.
    pub fn require(&self, name: &str) -> ReconResult<&AttributeArray> {
        self.arrays.get(name).ok_or_else(|| ReconError::MissingArray {
            name: name.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeArray)> {
        self.arrays.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn arrays_mut(&mut self) -> &mut BTreeMap<String, AttributeArray> {
        &mut self.arrays
    }
}

fn check_shape<T: Element>(name: &str, array: &AttributeArray, components: usize) -> ReconResult<()> {
    if array.data_type() != T::DATA_TYPE {
        return Err(ReconError::TypeMismatch {
            name: name.to_string(),
            expected: T::DATA_TYPE,
            actual: array.data_type(),
        });
    }
    if array.components() != components {
        return Err(ReconError::ComponentMismatch {
            name: name.to_string(),
            expected: components,
            actual: array.components(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataType;

    #[test]
    fn insert_rejects_wrong_tuple_count() {
        let mut matrix = AttributeMatrix::new(8);
        let err = matrix
            .insert("Phases", DataArray::<i32>::new(7, 1))
            .unwrap_err();
        assert_eq!(err.code(), -11002);
        assert!(matrix.insert("Phases", DataArray::<i32>::new(8, 1)).unwrap().is_none());
        assert!(matrix.contains("Phases"));
    }

    #[test]
    fn typed_lookup_checks_type_and_components() {
        let mut matrix = AttributeMatrix::new(4);
        matrix.insert("Quats", DataArray::<f32>::new(4, 4)).unwrap();
        assert!(matrix.typed::<f32>("Quats", 4).is_ok());
        match matrix.typed::<f64>("Quats", 4) {
            Err(ReconError::TypeMismatch { expected, actual, .. }) => {
                assert_eq!(expected, DataType::Float64);
                assert_eq!(actual, DataType::Float32);
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert!(matches!(
            matrix.typed::<f32>("Quats", 3),
            Err(ReconError::ComponentMismatch { expected: 3, actual: 4, .. })
        ));
        assert!(matches!(
            matrix.typed_mut::<bool>("Mask", 1),
            Err(ReconError::MissingArray { .. })
        ));
    }
}
