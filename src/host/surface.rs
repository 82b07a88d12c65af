use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("host surface `{id}` is not connected to a document")]
    Disconnected { id: String },

    #[error("host surface `{id}` is already bound to engine `{engine}`")]
    AlreadyBound { id: String, engine: String },
}

/// How the surface currently renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceMode {
    /// Plain text input, rendered by the host.
    Plain,
    /// Hidden and replaced by an engine's own rendering.
    Bound { engine: String },
}

/// A textarea-like element an engine binds to.
///
/// While bound, the host stops rendering the plain input. Unbinding hands the
/// engine's final text back so the element can be reused or removed.
#[derive(Debug, Clone)]
pub struct HostSurface {
    id: String,
    value: String,
    connected: bool,
    mode: SurfaceMode,
}

impl HostSurface {
    /// A connected, plain textarea with the given id.
    pub fn textarea(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: String::new(),
            connected: true,
            mode: SurfaceMode::Plain,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: &str) {
        value.clone_into(&mut self.value);
    }

    pub const fn mode(&self) -> &SurfaceMode {
        &self.mode
    }

    pub const fn is_bound(&self) -> bool {
        matches!(self.mode, SurfaceMode::Bound { .. })
    }

    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Remove the element from its document.
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    /// Hide the plain input and hand rendering to `engine`.
    ///
    /// # Errors
    /// Fails when the surface is detached from its document or another engine
    /// already owns it.
    pub fn bind(&mut self, engine: &str) -> Result<(), SurfaceError> {
        if !self.connected {
            return Err(SurfaceError::Disconnected {
                id: self.id.clone(),
            });
        }
        if let SurfaceMode::Bound { engine: current } = &self.mode {
            return Err(SurfaceError::AlreadyBound {
                id: self.id.clone(),
                engine: current.clone(),
            });
        }
        self.mode = SurfaceMode::Bound {
            engine: engine.to_string(),
        };
        Ok(())
    }

    /// Return to plain mode holding `value`.
    pub fn restore(&mut self, value: &str) {
        self.set_value(value);
        self.mode = SurfaceMode::Plain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_and_restore() {
        let mut surface = HostSurface::textarea("body");
        surface.bind("rope-md").unwrap();
        assert!(surface.is_bound());
        surface.restore("final text");
        assert_eq!(surface.mode(), &SurfaceMode::Plain);
        assert_eq!(surface.value(), "final text");
    }

    #[test]
    fn test_bind_twice_fails() {
        let mut surface = HostSurface::textarea("body");
        surface.bind("rope-md").unwrap();
        let err = surface.bind("other").unwrap_err();
        assert!(matches!(err, SurfaceError::AlreadyBound { .. }));
    }

    #[test]
    fn test_bind_disconnected_fails() {
        let mut surface = HostSurface::textarea("body");
        surface.disconnect();
        assert_eq!(
            surface.bind("rope-md"),
            Err(SurfaceError::Disconnected {
                id: "body".to_string()
            })
        );
    }
}
