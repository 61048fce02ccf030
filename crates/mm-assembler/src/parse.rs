//! Turns a `pest` parse tree for `grammar.pest` into the [`crate::ast`]
//! types `assemble` works with.

use pest::iterators::Pair;
use pest::Parser;

use crate::ast::{InstructionAst, Label, LineBody, OperandAst, ParsedLine, Value};
use crate::error::AsmError;
use crate::pest_parser::{AsmParser, Rule};

fn parse_int_literal(text: &str) -> i128 {
    let (neg, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        i128::from_str_radix(hex, 16).unwrap_or(0)
    } else {
        rest.parse().unwrap_or(0)
    };
    if neg {
        -magnitude
    } else {
        magnitude
    }
}

fn parse_register(pair: Pair<Rule>) -> u8 {
    let text = pair.as_str();
    u8::from_str_radix(&text[1..], 16).unwrap_or(0)
}

fn parse_label_ref(pair: Pair<Rule>) -> Label {
    let inner = pair.into_inner().next().expect("label_ref always wraps one alternative");
    match inner.as_rule() {
        Rule::scoped_ref => {
            let text = inner.as_str();
            let mut parts = text.splitn(2, '.');
            let scope = parts.next().unwrap_or_default().to_string();
            let name = parts.next().unwrap_or_default().to_string();
            Label::Scoped(scope, name)
        }
        Rule::local_ref => Label::Local(inner.as_str().trim_start_matches('.').to_string()),
        Rule::global_ref => Label::Global(inner.as_str().to_string()),
        other => unreachable!("unexpected label_ref alternative {other:?}"),
    }
}

fn label_from_def(pair: Pair<Rule>) -> Label {
    match pair.as_rule() {
        Rule::scoped_ref => {
            let text = pair.as_str();
            let mut parts = text.splitn(2, '.');
            let scope = parts.next().unwrap_or_default().to_string();
            let name = parts.next().unwrap_or_default().to_string();
            Label::Scoped(scope, name)
        }
        Rule::local_ref => Label::Local(pair.as_str().trim_start_matches('.').to_string()),
        Rule::global_ref => Label::Global(pair.as_str().to_string()),
        other => unreachable!("unexpected label_def alternative {other:?}"),
    }
}

fn parse_value(pair: Pair<Rule>) -> Value {
    let inner = pair.into_inner().next().expect("value always wraps one alternative");
    match inner.as_rule() {
        Rule::label_ref => Value::Label(parse_label_ref(inner)),
        Rule::int_literal => Value::Int(parse_int_literal(inner.as_str())),
        other => unreachable!("unexpected value alternative {other:?}"),
    }
}

fn parse_operand(pair: Pair<Rule>) -> OperandAst {
    let inner = pair.into_inner().next().expect("operand always wraps one alternative");
    match inner.as_rule() {
        Rule::indexed_operand => {
            let mut parts = inner.into_inner();
            let value = parse_value(parts.next().expect("indexed_operand has a value"));
            let reg = parse_register(parts.next().expect("indexed_operand has a register"));
            OperandAst::Indexed(value, reg)
        }
        Rule::register => OperandAst::Register(parse_register(inner)),
        Rule::value => OperandAst::Value(parse_value(inner)),
        Rule::imm_operand => {
            let value = parse_value(inner.into_inner().next().expect("imm_operand wraps one value"));
            OperandAst::Immediate(value)
        }
        other => unreachable!("unexpected operand alternative {other:?}"),
    }
}

pub fn parse_source(source: &str) -> Result<Vec<ParsedLine>, AsmError> {
    let mut file_pairs = AsmParser::parse(Rule::file, source).map_err(|e| AsmError::Syntax(e.to_string()))?;
    let file_pair = file_pairs.next().expect("file rule always produces one pair");

    let mut lines = Vec::new();
    for line_pair in file_pair.into_inner() {
        if line_pair.as_rule() != Rule::line {
            continue;
        }
        let (line_no, _) = line_pair.as_span().start_pos().line_col();
        let source_text = line_pair.as_str().trim().to_string();
        let mut parsed = ParsedLine::default();
        for part in line_pair.into_inner() {
            match part.as_rule() {
                Rule::label_def => {
                    let inner = part.into_inner().next().expect("label_def wraps one alternative");
                    parsed.labels.push(label_from_def(inner));
                }
                Rule::line_body => {
                    let inner = part.into_inner().next().expect("line_body wraps one alternative");
                    parsed.body = Some(match inner.as_rule() {
                        Rule::word_directive => {
                            let values = inner.into_inner().map(parse_value).collect();
                            LineBody::Word(values, line_no)
                        }
                        Rule::instruction => {
                            let mut parts = inner.into_inner();
                            let mnemonic = parts.next().expect("instruction has a mnemonic").as_str().to_ascii_lowercase();
                            let operands = parts
                                .next()
                                .map(|list| list.into_inner().map(parse_operand).collect())
                                .unwrap_or_default();
                            LineBody::Instruction(InstructionAst { mnemonic, operands, line: line_no, source: source_text.clone() })
                        }
                        other => unreachable!("unexpected line_body alternative {other:?}"),
                    });
                }
                other => unreachable!("unexpected line alternative {other:?}"),
            }
        }
        lines.push(parsed);
    }
    Ok(lines)
}
