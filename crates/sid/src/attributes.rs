//! Attribute Parser
//!
//! Reads the `data-sid-*` markup contract off a single node. Invalid values
//! never fail the parse: they fall back to a default and produce an
//! [`AttributeDiagnostic`], so one bad element cannot stop discovery.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sid_dom::{Document, NodeId};

use crate::SidError;

pub const ATTR_ID: &str = "data-sid";
pub const ATTR_DESC: &str = "data-sid-desc";
pub const ATTR_DESC_LONG: &str = "data-sid-desc-long";
pub const ATTR_ACTION: &str = "data-sid-action";
pub const ATTR_INPUT: &str = "data-sid-input";
pub const ATTR_OPTIONS: &str = "data-sid-options";
pub const ATTR_TRACKING: &str = "data-sid-tracking";
pub const ATTR_DESTINATION: &str = "data-sid-destination";
pub const ATTR_HUMAN: &str = "data-sid-human";
pub const ATTR_DISABLED: &str = "data-sid-disabled";
pub const ATTR_DISABLED_DESC: &str = "data-sid-disabled-desc";

/// Every attribute the registry watches for changes
pub const OBSERVED_ATTRIBUTES: [&str; 11] = [
    ATTR_ID,
    ATTR_DESC,
    ATTR_DESC_LONG,
    ATTR_ACTION,
    ATTR_INPUT,
    ATTR_OPTIONS,
    ATTR_TRACKING,
    ATTR_DESTINATION,
    ATTR_HUMAN,
    ATTR_DISABLED,
    ATTR_DISABLED_DESC,
];

/// Supported interaction kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    #[default]
    Click,
    Fill,
    Select,
    Check,
    Hover,
    Upload,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Click,
        ActionKind::Fill,
        ActionKind::Select,
        ActionKind::Check,
        ActionKind::Hover,
        ActionKind::Upload,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Fill => "fill",
            ActionKind::Select => "select",
            ActionKind::Check => "check",
            ActionKind::Hover => "hover",
            ActionKind::Upload => "upload",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = SidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SidError::UnknownAction(s.to_string()))
    }
}

/// Data type expected by an action's input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputDataType {
    Text,
    Number,
    Date,
    Email,
    Password,
    File,
}

impl InputDataType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "number" => Some(Self::Number),
            "date" => Some(Self::Date),
            "email" => Some(Self::Email),
            "password" => Some(Self::Password),
            "file" => Some(Self::File),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Email => "email",
            Self::Password => "password",
            Self::File => "file",
        }
    }
}

/// Input constraint for an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSpec {
    pub data_type: InputDataType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl InputSpec {
    /// Parse `"<dataType>,<required|optional>"`
    pub fn parse(raw: &str) -> Result<Self, String> {
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        let [data_type, flag] = parts.as_slice() else {
            return Err(format!("expected \"<type>,<required|optional>\", got {raw:?}"));
        };
        let data_type = InputDataType::parse(data_type)
            .ok_or_else(|| format!("unknown input type {data_type:?}"))?;
        let required = match flag.to_ascii_lowercase().as_str() {
            "required" => true,
            "optional" => false,
            _ => return Err(format!("expected \"required\" or \"optional\", got {flag:?}")),
        };
        Ok(Self { data_type, required, options: None })
    }

    /// Markup encoding, without options
    pub fn encode(&self) -> String {
        format!("{},{}", self.data_type.as_str(), if self.required { "required" } else { "optional" })
    }
}

/// How completion of an interaction is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingKind {
    /// Wait for the application to signal completion
    #[default]
    Async,
    /// The action navigates away
    Navigation,
    /// The action hands off to something outside the page
    External,
    /// Fire and forget
    None,
}

impl TrackingKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "async" => Some(Self::Async),
            "navigation" => Some(Self::Navigation),
            "external" => Some(Self::External),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

/// Interaction that needs a human to supply data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanInputRequirement {
    pub reason: String,
    pub schema: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_hints: Option<Map<String, Value>>,
}

impl HumanInputRequirement {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let value: Value = serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))?;
        let Value::Object(mut object) = value else {
            return Err("expected a JSON object".into());
        };
        let reason = match object.remove("reason") {
            Some(Value::String(reason)) => reason,
            _ => return Err("missing string \"reason\"".into()),
        };
        let schema = match object.remove("schema") {
            Some(Value::Object(schema)) => schema,
            _ => return Err("missing object \"schema\"".into()),
        };
        let ui_hints = match object.remove("uiHints") {
            Some(Value::Object(hints)) => Some(hints),
            _ => None,
        };
        Ok(Self { reason, schema, ui_hints })
    }
}

/// Parsed markup of one annotated element
#[derive(Debug, Clone, PartialEq)]
pub struct SidAttributes {
    pub id: String,
    pub desc: String,
    pub desc_long: Option<String>,
    pub action: ActionKind,
    /// Input constraint, with options merged in
    pub input: Option<InputSpec>,
    pub options: Option<Vec<String>>,
    pub tracking: TrackingKind,
    pub destination: Option<String>,
    pub human_input: Option<HumanInputRequirement>,
    pub disabled: bool,
    pub disabled_desc: Option<String>,
}

/// A markup value that was rejected and replaced by a default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDiagnostic {
    pub element_id: String,
    pub attribute: &'static str,
    pub message: String,
}

impl fmt::Display for AttributeDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element {:?}: {}: {}", self.element_id, self.attribute, self.message)
    }
}

/// Parse a node, logging diagnostics as warnings
pub fn parse_attributes(doc: &Document, node: NodeId) -> Option<SidAttributes> {
    let mut diagnostics = Vec::new();
    let parsed = parse_attributes_with_diagnostics(doc, node, &mut diagnostics);
    for diagnostic in &diagnostics {
        tracing::warn!(
            element = %diagnostic.element_id,
            attribute = diagnostic.attribute,
            "{}",
            diagnostic.message
        );
    }
    parsed
}

/// Parse a node, collecting diagnostics instead of logging them
pub fn parse_attributes_with_diagnostics(
    doc: &Document,
    node: NodeId,
    diagnostics: &mut Vec<AttributeDiagnostic>,
) -> Option<SidAttributes> {
    let id = doc.get_attribute(node, ATTR_ID).filter(|id| !id.is_empty())?.to_string();
    let attr = |name: &str| doc.get_attribute(node, name);
    let mut reject = |attribute: &'static str, message: String| {
        diagnostics.push(AttributeDiagnostic { element_id: id.clone(), attribute, message });
    };

    let action = match attr(ATTR_ACTION) {
        Some(raw) => ActionKind::from_str(raw).unwrap_or_else(|_| {
            reject(ATTR_ACTION, format!("unknown action {raw:?}, using \"click\""));
            ActionKind::Click
        }),
        None => {
            reject(ATTR_ACTION, "no action declared, using \"click\"".into());
            ActionKind::Click
        }
    };

    let mut input = attr(ATTR_INPUT).and_then(|raw| {
        InputSpec::parse(raw)
            .map_err(|message| reject(ATTR_INPUT, message))
            .ok()
    });

    let options = attr(ATTR_OPTIONS)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|options| !options.is_empty());
    if let Some(input) = input.as_mut() {
        input.options = options.clone();
    }

    let tracking = match attr(ATTR_TRACKING) {
        Some(raw) => TrackingKind::parse(raw).unwrap_or_else(|| {
            reject(ATTR_TRACKING, format!("unknown tracking {raw:?}, using \"async\""));
            TrackingKind::Async
        }),
        None => TrackingKind::Async,
    };

    let human_input = attr(ATTR_HUMAN).and_then(|raw| {
        HumanInputRequirement::parse(raw)
            .map_err(|message| reject(ATTR_HUMAN, message))
            .ok()
    });

    Some(SidAttributes {
        desc: attr(ATTR_DESC).unwrap_or_default().to_string(),
        desc_long: attr(ATTR_DESC_LONG).map(str::to_string),
        action,
        input,
        options,
        tracking,
        destination: attr(ATTR_DESTINATION).map(str::to_string),
        human_input,
        disabled: attr(ATTR_DISABLED) == Some("true"),
        disabled_desc: attr(ATTR_DISABLED_DESC).map(str::to_string),
        id,
    })
}

/// Tracking mode and destination as currently written on the node
pub fn live_tracking(doc: &Document, node: NodeId) -> (TrackingKind, Option<String>) {
    let tracking = doc
        .get_attribute(node, ATTR_TRACKING)
        .and_then(TrackingKind::parse)
        .unwrap_or_default();
    let destination = doc.get_attribute(node, ATTR_DESTINATION).map(str::to_string);
    (tracking, destination)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with(attrs: &[(&str, &str)]) -> (Document, NodeId) {
        let mut doc = Document::default();
        let node = doc.create_element("input");
        for (name, value) in attrs {
            doc.set_attribute(node, name, value).unwrap();
        }
        let body = doc.body().unwrap();
        doc.append_child(body, node).unwrap();
        (doc, node)
    }

    fn parse(attrs: &[(&str, &str)]) -> (Option<SidAttributes>, Vec<AttributeDiagnostic>) {
        let (doc, node) = node_with(attrs);
        let mut diagnostics = Vec::new();
        let parsed = parse_attributes_with_diagnostics(&doc, node, &mut diagnostics);
        (parsed, diagnostics)
    }

    #[test]
    fn test_no_identifier() {
        assert_eq!(parse(&[("data-sid-action", "fill")]).0, None);
        assert_eq!(parse(&[("data-sid", "")]).0, None);
    }

    #[test]
    fn test_defaults() {
        let (parsed, diagnostics) = parse(&[("data-sid", "e1")]);
        let parsed = parsed.unwrap();

        assert_eq!(parsed.id, "e1");
        assert_eq!(parsed.desc, "");
        assert_eq!(parsed.action, ActionKind::Click);
        assert_eq!(parsed.tracking, TrackingKind::Async);
        assert_eq!(parsed.input, None);
        assert!(!parsed.disabled);
        // a missing action is reported, a missing tracking mode is not
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, ATTR_ACTION);
    }

    #[test]
    fn test_full_markup() {
        let (parsed, diagnostics) = parse(&[
            ("data-sid", "country"),
            ("data-sid-desc", "Country"),
            ("data-sid-desc-long", "Country of residence"),
            ("data-sid-action", "select"),
            ("data-sid-input", " text , REQUIRED "),
            ("data-sid-options", "us, fr,, de ,"),
            ("data-sid-tracking", "none"),
            ("data-sid-disabled", "false"),
        ]);
        let parsed = parsed.unwrap();

        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(parsed.action, ActionKind::Select);
        assert_eq!(parsed.tracking, TrackingKind::None);
        assert_eq!(parsed.desc_long.as_deref(), Some("Country of residence"));
        let options = vec!["us".to_string(), "fr".to_string(), "de".to_string()];
        assert_eq!(parsed.options, Some(options.clone()));
        assert_eq!(parsed.input, Some(InputSpec {
            data_type: InputDataType::Text,
            required: true,
            options: Some(options),
        }));
        assert!(!parsed.disabled);
    }

    #[test]
    fn test_invalid_action_and_tracking() {
        let (parsed, diagnostics) = parse(&[
            ("data-sid", "x"),
            ("data-sid-action", "drag"),
            ("data-sid-tracking", "sometimes"),
        ]);
        let parsed = parsed.unwrap();

        assert_eq!(parsed.action, ActionKind::Click);
        assert_eq!(parsed.tracking, TrackingKind::Async);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[0].message.contains("drag"));
    }

    #[test]
    fn test_invalid_input_constraint_is_absent() {
        for raw in ["email", "email,required,extra", "phone,required", "email,maybe", ""] {
            let (parsed, diagnostics) = parse(&[
                ("data-sid", "x"),
                ("data-sid-action", "fill"),
                ("data-sid-input", raw),
            ]);
            assert_eq!(parsed.unwrap().input, None, "input {raw:?}");
            assert_eq!(diagnostics.len(), 1, "input {raw:?}");
        }
    }

    #[test]
    fn test_empty_options_are_absent() {
        let (parsed, _) = parse(&[("data-sid", "x"), ("data-sid-action", "select"), ("data-sid-options", " , ,")]);
        assert_eq!(parsed.unwrap().options, None);
    }

    #[test]
    fn test_input_spec_round_trip() {
        for data_type in ["text", "number", "date", "email", "password", "file"] {
            for flag in ["required", "optional"] {
                let spec = InputSpec::parse(&format!("{data_type},{flag}")).unwrap();
                assert_eq!(InputSpec::parse(&spec.encode()).unwrap(), spec);
            }
        }
    }

    #[test]
    fn test_disabled_only_exact_true() {
        for (raw, expected) in [("true", true), ("TRUE", false), ("1", false), ("", false)] {
            let (parsed, _) = parse(&[("data-sid", "x"), ("data-sid-disabled", raw)]);
            assert_eq!(parsed.unwrap().disabled, expected, "value {raw:?}");
        }
    }

    #[test]
    fn test_human_input() {
        let raw = r#"{"reason":"2FA code","schema":{"type":"string"},"uiHints":{"label":"Code"}}"#;
        let (parsed, diagnostics) = parse(&[("data-sid", "otp"), ("data-sid-action", "fill"), ("data-sid-human", raw)]);
        let human = parsed.unwrap().human_input.unwrap();

        assert!(diagnostics.is_empty());
        assert_eq!(human.reason, "2FA code");
        assert_eq!(human.schema.get("type"), Some(&Value::String("string".into())));
        assert!(human.ui_hints.is_some());
    }

    #[test]
    fn test_human_input_shape_mismatch() {
        for raw in ["{not json", "[1,2]", r#"{"reason":1,"schema":{}}"#, r#"{"reason":"r","schema":"s"}"#] {
            let (parsed, diagnostics) = parse(&[("data-sid", "x"), ("data-sid-action", "click"), ("data-sid-human", raw)]);
            assert_eq!(parsed.unwrap().human_input, None, "value {raw:?}");
            assert_eq!(diagnostics.len(), 1, "value {raw:?}");
            assert_eq!(diagnostics[0].attribute, ATTR_HUMAN);
        }
    }

    #[test]
    fn test_action_kind_from_str() {
        assert_eq!("upload".parse::<ActionKind>().unwrap(), ActionKind::Upload);
        assert!(matches!("Click".parse::<ActionKind>(), Err(SidError::UnknownAction(_))));
    }

    #[test]
    fn test_live_tracking() {
        let (mut doc, node) = node_with(&[("data-sid", "x")]);
        assert_eq!(live_tracking(&doc, node), (TrackingKind::Async, None));

        doc.set_attribute(node, "data-sid-tracking", "navigation").unwrap();
        doc.set_attribute(node, "data-sid-destination", "/x").unwrap();
        assert_eq!(live_tracking(&doc, node), (TrackingKind::Navigation, Some("/x".to_string())));
    }
}
