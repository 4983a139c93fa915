//! Editable-field predicate.
//!
//! Hosts describe a node with a [`NodeDescriptor`]; [`classify`] decides
//! whether it is a field and of which kind. The predicate is a heuristic: it
//! covers native text controls, content-editable hosts and the roots of a
//! few common rich-text editors, and makes no promise beyond that.

use smol_str::SmolStr;

use crate::types::FieldKind;

/// `<input type=...>` values treated as free text. A missing type means `text`.
pub const TEXT_INPUT_TYPES: &[&str] = &["text", "email", "search", "url"];

/// Marker classes carried by the editable root of common web editors.
pub const RICH_EDITOR_CLASSES: &[&str] = &[
    "ql-editor",                  // Quill
    "public-DraftEditor-content", // Draft.js
    "ProseMirror",
];

/// `contenteditable` attribute values that make a node editable.
const EDITABLE_VALUES: &[&str] = &["", "true", "plaintext-only"];

/// Snapshot of the node attributes the predicate looks at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeDescriptor {
    /// Lowercase tag name.
    pub tag: SmolStr,
    /// Raw `type` attribute, for inputs.
    pub input_type: Option<SmolStr>,
    /// Raw `contenteditable` attribute, if present.
    pub content_editable: Option<SmolStr>,
    pub role: Option<SmolStr>,
    pub classes: Vec<SmolStr>,
    pub disabled: bool,
    pub read_only: bool,
    /// Some ancestor is already an editable host; the host is the field, not us.
    pub inside_editable_host: bool,
}

impl NodeDescriptor {
    pub fn element(tag: &str) -> Self {
        Self {
            tag: SmolStr::new(tag.to_ascii_lowercase()),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, input_type: &str) -> Self {
        self.input_type = Some(SmolStr::new(input_type));
        self
    }

    pub fn with_content_editable(mut self, value: &str) -> Self {
        self.content_editable = Some(SmolStr::new(value));
        self
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role = Some(SmolStr::new(role));
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(SmolStr::new(class));
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn nested(mut self) -> Self {
        self.inside_editable_host = true;
        self
    }

    /// Whether this node would make its descendants part of an editable host.
    pub fn is_editable_host(&self) -> bool {
        classify(self) == Some(FieldKind::ContentEditable)
    }
}

/// Decide whether a node is an editable text field.
pub fn classify(node: &NodeDescriptor) -> Option<FieldKind> {
    if node.inside_editable_host {
        return None;
    }

    match node.tag.as_str() {
        "textarea" => {
            return (!node.disabled && !node.read_only).then_some(FieldKind::TextArea);
        }
        "input" => {
            let input_type = node
                .input_type
                .as_deref()
                .map(|t| t.trim().to_ascii_lowercase())
                .unwrap_or_else(|| "text".to_string());
            let is_text = TEXT_INPUT_TYPES.contains(&input_type.as_str());
            return (is_text && !node.disabled && !node.read_only)
                .then_some(FieldKind::PlainInput);
        }
        _ => {}
    }

    let editable_attr = node.content_editable.as_deref().is_some_and(|value| {
        EDITABLE_VALUES.contains(&value.trim().to_ascii_lowercase().as_str())
    });
    let textbox_role = node
        .role
        .as_deref()
        .is_some_and(|r| r.eq_ignore_ascii_case("textbox"));
    let editor_class = node
        .classes
        .iter()
        .any(|c| RICH_EDITOR_CLASSES.contains(&c.as_str()));

    (editable_attr || textbox_role || editor_class).then_some(FieldKind::ContentEditable)
}
