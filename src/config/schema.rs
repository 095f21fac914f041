use serde::{Deserialize, Serialize};

/// One `statusline.yaml` file. Every field is optional so that a project
/// file can override just the fields it names.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ConfigLayer {
    pub single_line: Option<bool>,
    pub show: Option<Vec<String>>,
    pub hide: Option<Vec<String>>,
    pub bar_style: Option<BarStyle>,
    pub bar_width: Option<usize>,
    pub time_format: Option<String>,
    pub update_check_url: Option<String>,
    pub composers: Option<Vec<ComposerConfig>>,
    pub cells: Option<Vec<CellConfig>>,
}

/// A user-defined composer. A `separator` makes it a join over `inputs`;
/// otherwise `template` is rendered.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ComposerConfig {
    pub name: String,
    pub inputs: Vec<String>,
    #[serde(default)]
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
}

/// A user-defined grid placement.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CellConfig {
    pub name: String,
    pub row: usize,
    pub col: usize,
    #[serde(default = "default_true")]
    pub optional: bool,
}

fn default_true() -> bool {
    true
}

/// Glyph set used by the context progress bar.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BarStyle {
    #[default]
    Blocks,
    Ascii,
    Dots,
}

impl BarStyle {
    /// `(filled, empty)` glyphs.
    pub fn glyphs(self) -> (char, char) {
        match self {
            BarStyle::Blocks => ('\u{2588}', '\u{2591}'),
            BarStyle::Ascii => ('#', '-'),
            BarStyle::Dots => ('\u{25CF}', '\u{25CB}'),
        }
    }
}

/// Fully resolved configuration after layering over the defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatuslineConfig {
    pub single_line: bool,
    pub show: Vec<String>,
    pub hide: Vec<String>,
    pub bar_style: BarStyle,
    pub bar_width: usize,
    pub time_format: String,
    pub update_check_url: Option<String>,
    pub composers: Vec<ComposerConfig>,
    pub cells: Vec<CellConfig>,
}

impl Default for StatuslineConfig {
    fn default() -> Self {
        Self {
            single_line: false,
            show: Vec::new(),
            hide: vec!["clock".to_string()],
            bar_style: BarStyle::Blocks,
            bar_width: 10,
            time_format: "%H:%M".to_string(),
            update_check_url: None,
            composers: Vec::new(),
            cells: Vec::new(),
        }
    }
}

impl StatuslineConfig {
    /// Overlay every field `layer` sets. Lists replace, they do not merge.
    pub fn apply(&mut self, layer: ConfigLayer) {
        if let Some(v) = layer.single_line {
            self.single_line = v;
        }
        if let Some(v) = layer.show {
            self.show = v;
        }
        if let Some(v) = layer.hide {
            self.hide = v;
        }
        if let Some(v) = layer.bar_style {
            self.bar_style = v;
        }
        if let Some(v) = layer.bar_width {
            self.bar_width = v.clamp(1, 40);
        }
        if let Some(v) = layer.time_format {
            self.time_format = v;
        }
        if layer.update_check_url.is_some() {
            self.update_check_url = layer.update_check_url;
        }
        if let Some(v) = layer.composers {
            self.composers = v;
        }
        if let Some(v) = layer.cells {
            self.cells = v;
        }
    }
}
