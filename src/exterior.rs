use crate::trackable::Trackable;
use vesicle_common::ExteriorConfig;

/// The medium surrounding the vesicle. Its pH does not change during a run.
#[derive(Debug, Clone)]
pub struct Exterior {
    display_name: String,
    ph: f64,
}

impl Exterior {
    pub fn new(config: &ExteriorConfig) -> Self {
        Exterior {
            display_name: config.display_name.clone(),
            ph: config.ph,
        }
    }

    pub fn ph(&self) -> f64 {
        self.ph
    }
}

impl Trackable for Exterior {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn current_state(&self) -> Vec<(&'static str, f64)> {
        vec![("pH", self.ph)]
    }
}
