//! Block model and the static template catalog
//!
//! A `BlockInstance` is the interchange shape shared by the palette, the list
//! editor and the engine: `{id, text, inputTypes, category, color, inputs}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Placeholder marking an input slot inside block text
pub const PLACEHOLDER: &str = "___";

/// Text of the only event block the interpreter starts on
pub const WHEN_FLAG_CLICKED: &str = "When ▶️ clicked";

/// Block categories (palette sections)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockCategory {
    Motion,
    Looks,
    Event,
    Control,
}

impl BlockCategory {
    pub const ALL: [BlockCategory; 4] = [
        BlockCategory::Motion,
        BlockCategory::Looks,
        BlockCategory::Event,
        BlockCategory::Control,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockCategory::Motion => "Motion",
            BlockCategory::Looks => "Looks",
            BlockCategory::Event => "Event",
            BlockCategory::Control => "Control",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "motion" => Some(BlockCategory::Motion),
            "looks" => Some(BlockCategory::Looks),
            "event" | "events" => Some(BlockCategory::Event),
            "control" => Some(BlockCategory::Control),
            _ => None,
        }
    }

    /// Display tag used by the renderer
    pub fn color(&self) -> &'static str {
        match self {
            BlockCategory::Motion => "bg-blue-400",
            BlockCategory::Looks => "bg-purple-400",
            BlockCategory::Event => "bg-yellow-400",
            BlockCategory::Control => "bg-green-400",
        }
    }
}

/// Kind of value an input slot accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Number,
    Text,
}

/// A catalog entry describing a kind of instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTemplate {
    pub text: &'static str,
    pub input_types: &'static [InputType],
    pub category: BlockCategory,
}

impl BlockTemplate {
    pub fn color(&self) -> &'static str {
        self.category.color()
    }

    /// Copy this template into a fresh instance with empty inputs
    pub fn instantiate(&self, id: impl Into<String>) -> BlockInstance {
        BlockInstance {
            id: id.into(),
            text: self.text.to_string(),
            input_types: self.input_types.to_vec(),
            category: self.category,
            color: self.color().to_string(),
            inputs: BTreeMap::new(),
        }
    }
}

pub const MOVE_STEPS: BlockTemplate = BlockTemplate {
    text: "Move ___ steps",
    input_types: &[InputType::Number],
    category: BlockCategory::Motion,
};

pub const TURN_DEGREES: BlockTemplate = BlockTemplate {
    text: "Turn ___ degree",
    input_types: &[InputType::Number],
    category: BlockCategory::Motion,
};

pub const GO_TO_XY: BlockTemplate = BlockTemplate {
    text: "Go to x: ___ y: ___",
    input_types: &[InputType::Number, InputType::Number],
    category: BlockCategory::Motion,
};

pub const SAY_FOR_SECS: BlockTemplate = BlockTemplate {
    text: "Say ___ for ___ sec",
    input_types: &[InputType::Text, InputType::Number],
    category: BlockCategory::Looks,
};

pub const SAY_HELLO: BlockTemplate = BlockTemplate {
    text: "Say Hello",
    input_types: &[],
    category: BlockCategory::Looks,
};

pub const WHEN_CLICKED: BlockTemplate = BlockTemplate {
    text: WHEN_FLAG_CLICKED,
    input_types: &[],
    category: BlockCategory::Event,
};

pub const REPEAT_TIMES: BlockTemplate = BlockTemplate {
    text: "Repeat ___ times",
    input_types: &[InputType::Number],
    category: BlockCategory::Control,
};

/// The full palette, in display order
pub static CATALOG: [BlockTemplate; 7] = [
    MOVE_STEPS,
    TURN_DEGREES,
    GO_TO_XY,
    SAY_FOR_SECS,
    SAY_HELLO,
    WHEN_CLICKED,
    REPEAT_TIMES,
];

/// Templates of one palette section
pub fn templates_in(category: BlockCategory) -> impl Iterator<Item = &'static BlockTemplate> {
    CATALOG.iter().filter(move |t| t.category == category)
}

/// Look up a template by palette section and position within it
pub fn template(category: BlockCategory, index: usize) -> Option<&'static BlockTemplate> {
    templates_in(category).nth(index)
}

/// A concrete block placed in a sprite's program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInstance {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub input_types: Vec<InputType>,
    pub category: BlockCategory,
    #[serde(default)]
    pub color: String,
    /// Placeholder index -> raw value as typed
    #[serde(default)]
    pub inputs: BTreeMap<usize, String>,
}

/// What a block does when executed, recognized from category and text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOp {
    WhenFlagClicked,
    Move,
    Turn,
    GoTo,
    SayFor,
    SayHello,
    Repeat,
    Unknown,
}

impl BlockInstance {
    /// Recognize the operation. Unrecognized text is `Unknown`, never an error.
    pub fn op(&self) -> BlockOp {
        let text = self.text.as_str();
        match self.category {
            BlockCategory::Event if text.contains(WHEN_FLAG_CLICKED) => BlockOp::WhenFlagClicked,
            BlockCategory::Motion if text.contains("Move ___ steps") => BlockOp::Move,
            BlockCategory::Motion if text.contains("Turn ___ degree") => BlockOp::Turn,
            BlockCategory::Motion if text.contains("Go to x:") => BlockOp::GoTo,
            BlockCategory::Looks if text.contains("Say ___ for ___ sec") => BlockOp::SayFor,
            BlockCategory::Looks if text.contains("Say Hello") => BlockOp::SayHello,
            BlockCategory::Control if text.contains("Repeat ___ times") => BlockOp::Repeat,
            _ => BlockOp::Unknown,
        }
    }

    /// Whether the collision monitor treats this as a movement carrier
    pub fn is_move_carrier(&self) -> bool {
        self.category == BlockCategory::Motion && self.text.contains("Move")
    }

    /// Number of `___` slots in the text
    pub fn slot_count(&self) -> usize {
        self.text.matches(PLACEHOLDER).count()
    }

    /// Type of slot `index`; slots without a declared type are text
    pub fn input_type(&self, index: usize) -> InputType {
        self.input_types.get(index).copied().unwrap_or(InputType::Text)
    }

    /// Numeric value of slot `index`, or `default` when absent or unparsable
    pub fn number_input(&self, index: usize, default: f32) -> f32 {
        self.inputs
            .get(&index)
            .and_then(|raw| raw.trim().parse::<f32>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(default)
    }

    /// Text value of slot `index`, or `default` when absent or empty
    pub fn text_input<'a>(&'a self, index: usize, default: &'a str) -> &'a str {
        match self.inputs.get(&index) {
            Some(raw) if !raw.is_empty() => raw.as_str(),
            _ => default,
        }
    }

    /// Store a slot value, formatted like the editor writes numbers
    pub fn set_number(&mut self, index: usize, value: f32) {
        self.inputs.insert(index, format_number(value));
    }

    /// Step count of a Move block
    pub fn move_steps(&self) -> f32 {
        self.number_input(0, DEFAULT_MOVE_STEPS)
    }
}

/// Format a number the way the editor shows it: `20`, not `20.0`
pub fn format_number(value: f32) -> String {
    format!("{}", value)
}

/// Keep digits and the first decimal point, drop everything else.
pub fn sanitize_number_input(raw: &str) -> String {
    let mut seen_dot = false;
    raw.chars()
        .filter(|c| match c {
            '0'..='9' => true,
            '.' if !seen_dot => {
                seen_dot = true;
                true
            }
            _ => false,
        })
        .collect()
}
