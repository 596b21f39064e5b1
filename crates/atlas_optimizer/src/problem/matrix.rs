use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixDimension {
    Time,
    Distance,
    Value,
}

/// Square travel matrices stored row-major in flat vectors.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Matrix {
    id: String,
    size: usize,
    #[serde(default)]
    time: Option<Vec<f64>>,
    #[serde(default)]
    distance: Option<Vec<f64>>,
    #[serde(default)]
    value: Option<Vec<f64>>,
}

impl Matrix {
    pub fn new(id: impl Into<String>, size: usize) -> Self {
        Matrix {
            id: id.into(),
            size,
            time: None,
            distance: None,
            value: None,
        }
    }

    pub fn with_time(mut self, time: Vec<f64>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_distance(mut self, distance: Vec<f64>) -> Self {
        self.distance = Some(distance);
        self
    }

    pub fn with_value(mut self, value: Vec<f64>) -> Self {
        self.value = Some(value);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn dimension(&self, dimension: MatrixDimension) -> Option<&[f64]> {
        match dimension {
            MatrixDimension::Time => self.time.as_deref(),
            MatrixDimension::Distance => self.distance.as_deref(),
            MatrixDimension::Value => self.value.as_deref(),
        }
    }

    pub fn has_dimension(&self, dimension: MatrixDimension) -> bool {
        self.dimension(dimension).is_some()
    }

    pub fn get(&self, dimension: MatrixDimension, from: usize, to: usize) -> Option<f64> {
        if from >= self.size || to >= self.size {
            return None;
        }

        self.dimension(dimension)
            .and_then(|values| values.get(from * self.size + to).copied())
    }

    pub fn time(&self, from: usize, to: usize) -> Option<f64> {
        self.get(MatrixDimension::Time, from, to)
    }

    pub fn distance(&self, from: usize, to: usize) -> Option<f64> {
        self.get(MatrixDimension::Distance, from, to)
    }

    /// Every provided dimension holds exactly `size * size` cells.
    pub fn is_square(&self) -> bool {
        [self.time.as_ref(), self.distance.as_ref(), self.value.as_ref()]
            .into_iter()
            .flatten()
            .all(|values| values.len() == self.size * self.size)
    }
}
