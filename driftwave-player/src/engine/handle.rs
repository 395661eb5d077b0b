//! Exclusively-owned engine reference

use driftwave_common::{Error, Result};

/// Slot holding the facade's engine
///
/// Absent until `Player::create` binds the initialized engine, then bound for
/// the rest of the facade's life. The handle is not `Clone`: one engine, one
/// facade.
#[derive(Debug)]
pub struct EngineHandle<E> {
    engine: Option<E>,
}

impl<E> EngineHandle<E> {
    pub(crate) fn absent() -> Self {
        Self { engine: None }
    }

    /// Bind the engine; a handle is bound at most once
    pub(crate) fn bind(&mut self, engine: E) -> Result<()> {
        if self.engine.is_some() {
            return Err(Error::EngineInit(
                "engine handle is already bound".to_string(),
            ));
        }
        self.engine = Some(engine);
        Ok(())
    }

    pub fn is_present(&self) -> bool {
        self.engine.is_some()
    }

    pub fn get(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    pub(crate) fn get_mut(&mut self) -> Option<&mut E> {
        self.engine.as_mut()
    }
}
