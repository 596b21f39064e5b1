use serde::{Deserialize, Serialize};

use super::location::Location;

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Point {
    id: String,
    #[serde(default)]
    location: Option<Location>,
    #[serde(default)]
    matrix_index: Option<usize>,
}

impl Point {
    pub fn new(id: impl Into<String>, location: Option<Location>, matrix_index: Option<usize>) -> Self {
        Point {
            id: id.into(),
            location,
            matrix_index,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn matrix_index(&self) -> Option<usize> {
        self.matrix_index
    }
}
