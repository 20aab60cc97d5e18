//! Form Controls
//!
//! Classifies elements by the kind of input they accept. This replaces
//! "is this an HTMLInputElement / HTMLSelectElement" checks with one table.

/// HTML input types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputType {
    #[default]
    Text,
    Password,
    Email,
    Number,
    Tel,
    Url,
    Search,
    Date,
    Time,
    DatetimeLocal,
    Month,
    Week,
    Color,
    Range,
    File,
    Hidden,
    Checkbox,
    Radio,
    Submit,
    Reset,
    Button,
    Image,
}

impl InputType {
    /// Parse from the `type` attribute; unknown values are `text`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "password" => Self::Password,
            "email" => Self::Email,
            "number" => Self::Number,
            "tel" => Self::Tel,
            "url" => Self::Url,
            "search" => Self::Search,
            "date" => Self::Date,
            "time" => Self::Time,
            "datetime-local" => Self::DatetimeLocal,
            "month" => Self::Month,
            "week" => Self::Week,
            "color" => Self::Color,
            "range" => Self::Range,
            "file" => Self::File,
            "hidden" => Self::Hidden,
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            "submit" => Self::Submit,
            "reset" => Self::Reset,
            "button" => Self::Button,
            "image" => Self::Image,
            _ => Self::Text,
        }
    }

    /// Check if this is a button type
    pub fn is_button(&self) -> bool {
        matches!(self, Self::Submit | Self::Reset | Self::Button | Self::Image)
    }

    /// Check if this is a checkbox or radio
    pub fn is_toggle(&self) -> bool {
        matches!(self, Self::Checkbox | Self::Radio)
    }
}

/// What kind of input an element accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    /// `<textarea>` or a value-carrying `<input>`
    TextEntry,
    /// `<select>`
    ChoiceList,
    /// `<input type=checkbox|radio>`
    Toggle,
    /// `<input type=file>`
    FileInput,
    /// Anything else (buttons, links, plain elements)
    Other,
}

impl ControlKind {
    /// Classify by tag name and `type` attribute
    pub fn classify(tag: &str, input_type: Option<&str>) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "textarea" => Self::TextEntry,
            "select" => Self::ChoiceList,
            "input" => {
                let input_type = InputType::parse(input_type.unwrap_or("text"));
                if input_type.is_toggle() {
                    Self::Toggle
                } else if input_type == InputType::File {
                    Self::FileInput
                } else if input_type.is_button() {
                    Self::Other
                } else {
                    Self::TextEntry
                }
            }
            _ => Self::Other,
        }
    }

    /// Human-readable description of the element kind
    pub fn describe(&self) -> &'static str {
        match self {
            Self::TextEntry => "input or textarea",
            Self::ChoiceList => "select",
            Self::Toggle => "checkbox or radio input",
            Self::FileInput => "file input",
            Self::Other => "element",
        }
    }
}

/// A file attached to a file input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileData {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileData {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}
