//! Font cache configuration

/// Settings shared by every page of a [`Font`](crate::Font)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontConfig {
    /// Width and height of a freshly created page atlas
    pub initial_page_size: u32,
    /// Upper bound for atlas growth, on top of the texture's own maximum
    pub max_texture_size: u32,
    /// Bilinear filtering for page atlases
    pub smooth: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            initial_page_size: 128,
            max_texture_size: u32::MAX,
            smooth: true,
        }
    }
}

impl FontConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial atlas size
    pub fn with_initial_page_size(mut self, size: u32) -> Self {
        self.initial_page_size = size;
        self
    }

    /// Cap atlas growth below the texture maximum
    pub fn with_max_texture_size(mut self, size: u32) -> Self {
        self.max_texture_size = size;
        self
    }

    /// Set texture filtering
    pub fn with_smooth(mut self, smooth: bool) -> Self {
        self.smooth = smooth;
        self
    }
}
