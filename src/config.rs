//! Window and host options.

use crate::geometry::Size;
use cgmath::Vector2;

/// Options for opening a window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    /// Initial logical size of the content area.
    pub size: Size,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            size: Vector2::new(640., 480.),
            title: "wren".into(),
        }
    }
}

impl WindowConfig {
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = Vector2::new(width, height);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Options for a [`Host`](crate::Host).
#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    /// Reject every window but the first, for platforms that only have one.
    pub single_window: bool,

    /// Screen extent that the full digitizer range maps to.
    pub digitizer_extent: Size,
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            single_window: false,
            digitizer_extent: Vector2::new(5120., 2880.),
        }
    }
}

impl HostConfig {
    pub fn single_window(mut self, single_window: bool) -> Self {
        self.single_window = single_window;
        self
    }

    pub fn with_digitizer_extent(mut self, width: f64, height: f64) -> Self {
        self.digitizer_extent = Vector2::new(width, height);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let window = WindowConfig::default();
        assert_eq!(window.size, Vector2::new(640., 480.));
        assert_eq!(window.title, "wren");

        let host = HostConfig::default();
        assert!(!host.single_window);
        assert_eq!(host.digitizer_extent, Vector2::new(5120., 2880.));
    }

    #[test]
    fn builders() {
        let window = WindowConfig::default()
            .with_size(100., 200.)
            .with_title("canvas");
        assert_eq!(window.size, Vector2::new(100., 200.));
        assert_eq!(window.title, "canvas");

        let host = HostConfig::default().single_window(true);
        assert!(host.single_window);
    }
}
