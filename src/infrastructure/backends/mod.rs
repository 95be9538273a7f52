pub mod timothy;

use anyhow::Result;

use crate::domain::models::BackendBox;

pub struct BackendManager {}

impl BackendManager {
    pub fn get() -> Result<BackendBox> {
        return Ok(Box::new(timothy::Timothy::from_config()?));
    }
}
