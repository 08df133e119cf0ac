// Source code generation from the target AST
// Binary operators keep the padding recorded on the node; call arguments are
// separated by ", ".

use super::*;

/// Trait for types that can generate their source code representation
pub trait ToSource {
    fn to_source(&self) -> String;
}

/// Quote and escape `value` as a double-quoted target string literal
pub fn escape_string_literal(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 2);
    result.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => result.push_str(&format!("\\u{{{:x}}}", c as u32)),
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

impl ToSource for TargetNode {
    fn to_source(&self) -> String {
        match self {
            TargetNode::Identifier(name) => name.clone(),
            TargetNode::Number(text) => text.clone(),
            TargetNode::StringLiteral(value) => escape_string_literal(value),
            TargetNode::Boolean(value) => value.to_string(),
            TargetNode::Nil => "nil".to_string(),
            TargetNode::Binary {
                left,
                operator,
                right,
                padding,
            } => format!(
                "{}{}{}{}{}",
                left.to_source(),
                " ".repeat(padding.before as usize),
                operator,
                " ".repeat(padding.after as usize),
                right.to_source()
            ),
            TargetNode::Call { callee, args } => {
                let args_str = args
                    .iter()
                    .map(|arg| arg.to_source())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}({})", callee.to_source(), args_str)
            }
        }
    }
}
