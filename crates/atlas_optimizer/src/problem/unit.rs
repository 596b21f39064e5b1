use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Unit {
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    counting: bool,
}

impl Unit {
    pub fn new(id: impl Into<String>) -> Self {
        Unit {
            id: id.into(),
            label: None,
            counting: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn counting(&self) -> bool {
        self.counting
    }
}
