//! Inline and computed style
//!
//! Only the properties that decide whether an element is rendered are typed
//! (`display`, `visibility`, `position`); every other declaration is kept as
//! text so `cssText` round-trips.

/// `display`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Inline,
    Block,
    InlineBlock,
    Flex,
    Grid,
    None,
}

impl Display {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inline" => Some(Self::Inline),
            "block" => Some(Self::Block),
            "inline-block" => Some(Self::InlineBlock),
            "flex" => Some(Self::Flex),
            "grid" => Some(Self::Grid),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Block => "block",
            Self::InlineBlock => "inline-block",
            Self::Flex => "flex",
            Self::Grid => "grid",
            Self::None => "none",
        }
    }

    /// User-agent default for a tag
    pub fn default_for(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "head" | "script" | "style" | "title" | "meta" | "link" | "template" => Self::None,
            "html" | "body" | "div" | "p" | "section" | "article" | "nav" | "main" | "header"
            | "footer" | "form" | "ul" | "ol" | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                Self::Block
            }
            "button" | "input" | "select" | "textarea" => Self::InlineBlock,
            _ => Self::Inline,
        }
    }
}

/// `visibility`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    Collapse,
}

impl Visibility {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "visible" => Some(Self::Visible),
            "hidden" => Some(Self::Hidden),
            "collapse" => Some(Self::Collapse),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Collapse => "collapse",
        }
    }
}

/// `position`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

impl Position {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "static" => Some(Self::Static),
            "relative" => Some(Self::Relative),
            "absolute" => Some(Self::Absolute),
            "fixed" => Some(Self::Fixed),
            "sticky" => Some(Self::Sticky),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Relative => "relative",
            Self::Absolute => "absolute",
            Self::Fixed => "fixed",
            Self::Sticky => "sticky",
        }
    }
}

/// Inline style (`element.style`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    pub display: Option<Display>,
    pub visibility: Option<Visibility>,
    pub position: Option<Position>,
    /// Untyped declarations in insertion order
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `cssText`. Declarations that fail to parse are dropped.
    pub fn parse(css_text: &str) -> Self {
        let mut style = Self::new();
        for decl in css_text.split(';') {
            if let Some((name, value)) = decl.split_once(':') {
                style.set(name, value);
            }
        }
        style
    }

    /// Set one property
    pub fn set(&mut self, name: &str, value: &str) {
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        if name.is_empty() || value.is_empty() {
            return;
        }
        match name.as_str() {
            "display" => self.display = Display::parse(value).or(self.display),
            "visibility" => self.visibility = Visibility::parse(value).or(self.visibility),
            "position" => self.position = Position::parse(value).or(self.position),
            _ => match self.declarations.iter_mut().find(|(n, _)| *n == name) {
                Some((_, v)) => *v = value.to_string(),
                None => self.declarations.push((name, value.to_string())),
            },
        }
    }

    /// Read one property back as text
    pub fn get(&self, name: &str) -> Option<String> {
        match name.trim().to_ascii_lowercase().as_str() {
            "display" => self.display.map(|d| d.as_str().to_string()),
            "visibility" => self.visibility.map(|v| v.as_str().to_string()),
            "position" => self.position.map(|p| p.as_str().to_string()),
            other => self
                .declarations
                .iter()
                .find(|(n, _)| n == other)
                .map(|(_, v)| v.clone()),
        }
    }

    /// Serialize to `cssText`
    pub fn css_text(&self) -> String {
        let mut parts = Vec::new();
        if let Some(d) = self.display {
            parts.push(format!("display: {}", d.as_str()));
        }
        if let Some(v) = self.visibility {
            parts.push(format!("visibility: {}", v.as_str()));
        }
        if let Some(p) = self.position {
            parts.push(format!("position: {}", p.as_str()));
        }
        for (name, value) in &self.declarations {
            parts.push(format!("{}: {}", name, value));
        }
        if parts.is_empty() {
            String::new()
        } else {
            format!("{};", parts.join("; "))
        }
    }
}

/// Computed values the DOM cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputedStyle {
    pub display: Display,
    pub visibility: Visibility,
    pub position: Position,
}
