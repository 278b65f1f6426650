//! `.proto` text parsing.
//!
//! A small hand-rolled lexer and recursive-descent parser covering the
//! surface the registry compares: syntax, package, imports, messages
//! with nested types, oneofs, maps and reserved statements, enums, and
//! services. Options are recognized and skipped; custom options and
//! aggregate values do not affect comparison.

use crate::model::{
    qualify, Cardinality, EnumDescriptor, FieldDescriptor, FieldType, FileDescriptor,
    MessageDescriptor, MethodDescriptor, NamedType, ProtoSchema, ServiceDescriptor, Syntax,
};
use std::collections::BTreeMap;
use thiserror::Error;

/// Any error that may happen when parsing `.proto` text.
#[derive(Debug, Error)]
#[error("line {line}: {message}")]
pub struct ProtoParseError {
    pub line: usize,
    pub message: String,
}

/// Parse a standalone `.proto` file.
pub fn parse(text: &str) -> Result<ProtoSchema, ProtoParseError> {
    parse_with_dependencies(text, &[])
}

/// Parse a `.proto` file whose imports are satisfied by already-parsed
/// dependency schemas.
pub fn parse_with_dependencies(
    text: &str,
    dependencies: &[&ProtoSchema],
) -> Result<ProtoSchema, ProtoParseError> {
    let tokens = tokenize(text)?;
    let mut parser = Parser { tokens, pos: 0 };
    let file = parser.parse_file()?;

    let mut types: BTreeMap<String, NamedType> = BTreeMap::new();
    for dependency in dependencies {
        for (fqn, ty) in &dependency.types {
            types.entry(fqn.clone()).or_insert_with(|| ty.clone());
        }
    }
    index_file(&file, &mut types);

    Ok(ProtoSchema { file, types })
}

fn index_file(file: &FileDescriptor, types: &mut BTreeMap<String, NamedType>) {
    let prefix = file.package.clone().unwrap_or_default();
    for parsed in &file.enums {
        types.insert(qualify(&prefix, &parsed.name), NamedType::Enum(parsed.clone()));
    }
    for message in &file.messages {
        index_message(&prefix, message, types);
    }
}

fn index_message(prefix: &str, message: &MessageDescriptor, types: &mut BTreeMap<String, NamedType>) {
    let fqn = qualify(prefix, &message.name);
    for parsed in &message.nested_enums {
        types.insert(qualify(&fqn, &parsed.name), NamedType::Enum(parsed.clone()));
    }
    for nested in &message.nested_messages {
        index_message(&fqn, nested, types);
    }
    types.insert(fqn, NamedType::Message(message.clone()));
}

// ---------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Sym(char),
}

#[derive(Debug, Clone)]
struct Spanned {
    tok: Tok,
    line: usize,
}

fn tokenize(text: &str) -> Result<Vec<Spanned>, ProtoParseError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1usize;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '/' => {
                chars.next();
                match chars.peek() {
                    Some('/') => {
                        for c in chars.by_ref() {
                            if c == '\n' {
                                line += 1;
                                break;
                            }
                        }
                    }
                    Some('*') => {
                        chars.next();
                        let mut prev = '\0';
                        let mut closed = false;
                        for c in chars.by_ref() {
                            if c == '\n' {
                                line += 1;
                            }
                            if prev == '*' && c == '/' {
                                closed = true;
                                break;
                            }
                            prev = c;
                        }
                        if !closed {
                            return Err(ProtoParseError {
                                line,
                                message: "unterminated block comment".to_string(),
                            });
                        }
                    }
                    _ => {
                        return Err(ProtoParseError {
                            line,
                            message: "unexpected '/'".to_string(),
                        })
                    }
                }
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    if c == quote {
                        closed = true;
                        break;
                    }
                    if c == '\n' {
                        line += 1;
                    }
                    if c == '\\' {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    } else {
                        value.push(c);
                    }
                }
                if !closed {
                    return Err(ProtoParseError {
                        line,
                        message: "unterminated string literal".to_string(),
                    });
                }
                tokens.push(Spanned {
                    tok: Tok::Str(value),
                    line,
                });
            }
            c if c.is_ascii_digit() => {
                let mut literal = String::new();
                let mut is_float = false;
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        literal.push(c);
                        chars.next();
                    } else if c == '.' {
                        is_float = true;
                        literal.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let tok = if is_float {
                    Tok::Float(literal.parse::<f64>().map_err(|_| ProtoParseError {
                        line,
                        message: format!("invalid number '{literal}'"),
                    })?)
                } else if let Some(hex) = literal.strip_prefix("0x").or_else(|| literal.strip_prefix("0X")) {
                    Tok::Int(i64::from_str_radix(hex, 16).map_err(|_| ProtoParseError {
                        line,
                        message: format!("invalid number '{literal}'"),
                    })?)
                } else {
                    Tok::Int(literal.parse::<i64>().map_err(|_| ProtoParseError {
                        line,
                        message: format!("invalid number '{literal}'"),
                    })?)
                };
                tokens.push(Spanned { tok, line });
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Spanned {
                    tok: Tok::Ident(ident),
                    line,
                });
            }
            '{' | '}' | '(' | ')' | '[' | ']' | '<' | '>' | '=' | ';' | ',' | '.' | '-' | '+'
            | ':' => {
                chars.next();
                tokens.push(Spanned {
                    tok: Tok::Sym(c),
                    line,
                });
            }
            other => {
                return Err(ProtoParseError {
                    line,
                    message: format!("unexpected character '{other}'"),
                })
            }
        }
    }
    Ok(tokens)
}

// ---------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn parse_file(&mut self) -> Result<FileDescriptor, ProtoParseError> {
        let mut file = FileDescriptor {
            syntax: Syntax::Proto2,
            ..FileDescriptor::default()
        };
        // Default syntax when the statement is absent is proto2.
        if self.peek_ident("syntax") {
            self.next();
            self.expect_sym('=')?;
            let edition = self.expect_string()?;
            file.syntax = match edition.as_str() {
                "proto2" => Syntax::Proto2,
                "proto3" => Syntax::Proto3,
                other => {
                    return Err(self.error(format!("unsupported syntax '{other}'")));
                }
            };
            self.expect_sym(';')?;
        }

        while !self.at_end() {
            if self.accept_sym(';') {
                continue;
            }
            let ident = self.expect_ident()?;
            match ident.as_str() {
                "package" => {
                    file.package = Some(self.parse_qualified_name()?);
                    self.expect_sym(';')?;
                }
                "import" => {
                    // `import public` / `import weak` both pin the path.
                    if self.peek_ident("public") || self.peek_ident("weak") {
                        self.next();
                    }
                    file.imports.push(self.expect_string()?);
                    self.expect_sym(';')?;
                }
                "option" => self.skip_option()?,
                "message" => file.messages.push(self.parse_message()?),
                "enum" => file.enums.push(self.parse_enum()?),
                "service" => file.services.push(self.parse_service()?),
                "extend" => self.skip_block()?,
                other => {
                    return Err(self.error(format!("unexpected '{other}' at file scope")));
                }
            }
        }
        Ok(file)
    }

    fn parse_message(&mut self) -> Result<MessageDescriptor, ProtoParseError> {
        let name = self.expect_ident()?;
        self.expect_sym('{')?;
        let mut message = MessageDescriptor {
            name,
            fields: Vec::new(),
            oneofs: Vec::new(),
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
            reserved_numbers: Vec::new(),
            reserved_names: Vec::new(),
        };

        while !self.accept_sym('}') {
            if self.accept_sym(';') {
                continue;
            }
            if self.peek_ident("message") {
                self.next();
                message.nested_messages.push(self.parse_message()?);
            } else if self.peek_ident("enum") {
                self.next();
                message.nested_enums.push(self.parse_enum()?);
            } else if self.peek_ident("oneof") {
                self.next();
                self.parse_oneof(&mut message)?;
            } else if self.peek_ident("reserved") {
                self.next();
                self.parse_reserved(
                    &mut message.reserved_numbers,
                    &mut message.reserved_names,
                )?;
            } else if self.peek_ident("extensions") {
                self.next();
                self.skip_statement()?;
            } else if self.peek_ident("option") {
                self.next();
                self.skip_option()?;
            } else {
                let field = self.parse_field(true)?;
                message.fields.push(field);
            }
        }
        Ok(message)
    }

    fn parse_oneof(&mut self, message: &mut MessageDescriptor) -> Result<(), ProtoParseError> {
        let oneof_name = self.expect_ident()?;
        message.oneofs.push(oneof_name.clone());
        self.expect_sym('{')?;
        while !self.accept_sym('}') {
            if self.accept_sym(';') {
                continue;
            }
            if self.peek_ident("option") {
                self.next();
                self.skip_option()?;
                continue;
            }
            let mut field = self.parse_field(false)?;
            field.oneof = Some(oneof_name.clone());
            message.fields.push(field);
        }
        Ok(())
    }

    fn parse_field(&mut self, allow_label: bool) -> Result<FieldDescriptor, ProtoParseError> {
        let mut cardinality = Cardinality::Singular;
        if allow_label {
            if self.peek_ident("repeated") {
                self.next();
                cardinality = Cardinality::Repeated;
            } else if self.peek_ident("optional") {
                self.next();
                cardinality = Cardinality::Optional;
            } else if self.peek_ident("required") {
                self.next();
                cardinality = Cardinality::Required;
            }
        }

        let ty = self.parse_type()?;
        let name = self.expect_ident()?;
        self.expect_sym('=')?;
        let number = self.expect_int()?;
        if self.accept_sym('[') {
            self.skip_until_matching('[', ']')?;
        }
        self.expect_sym(';')?;

        Ok(FieldDescriptor {
            name,
            number: number as i32,
            cardinality,
            ty,
            oneof: None,
        })
    }

    fn parse_type(&mut self) -> Result<FieldType, ProtoParseError> {
        if self.peek_ident("map") && self.peek_sym_at(1, '<') {
            self.next();
            self.expect_sym('<')?;
            let key = self.parse_type()?;
            self.expect_sym(',')?;
            let value = self.parse_type()?;
            self.expect_sym('>')?;
            return Ok(FieldType::Map(Box::new(key), Box::new(value)));
        }

        if self.accept_sym('.') {
            let name = self.parse_qualified_name()?;
            return Ok(FieldType::Named(format!(".{name}")));
        }

        let first = self.expect_ident()?;
        if self.peek_sym('.') {
            let mut name = first;
            while self.accept_sym('.') {
                name.push('.');
                name.push_str(&self.expect_ident()?);
            }
            return Ok(FieldType::Named(name));
        }

        Ok(match first.as_str() {
            "double" => FieldType::Double,
            "float" => FieldType::Float,
            "int32" => FieldType::Int32,
            "int64" => FieldType::Int64,
            "uint32" => FieldType::Uint32,
            "uint64" => FieldType::Uint64,
            "sint32" => FieldType::Sint32,
            "sint64" => FieldType::Sint64,
            "fixed32" => FieldType::Fixed32,
            "fixed64" => FieldType::Fixed64,
            "sfixed32" => FieldType::Sfixed32,
            "sfixed64" => FieldType::Sfixed64,
            "bool" => FieldType::Bool,
            "string" => FieldType::String,
            "bytes" => FieldType::Bytes,
            "group" => {
                return Err(self.error("proto2 group fields are not supported".to_string()))
            }
            _ => FieldType::Named(first),
        })
    }

    fn parse_enum(&mut self) -> Result<EnumDescriptor, ProtoParseError> {
        let name = self.expect_ident()?;
        self.expect_sym('{')?;
        let mut parsed = EnumDescriptor {
            name,
            values: Vec::new(),
            reserved_numbers: Vec::new(),
            reserved_names: Vec::new(),
        };
        while !self.accept_sym('}') {
            if self.accept_sym(';') {
                continue;
            }
            if self.peek_ident("option") {
                self.next();
                self.skip_option()?;
                continue;
            }
            if self.peek_ident("reserved") {
                self.next();
                self.parse_reserved(&mut parsed.reserved_numbers, &mut parsed.reserved_names)?;
                continue;
            }
            let symbol = self.expect_ident()?;
            self.expect_sym('=')?;
            let number = self.expect_int()?;
            if self.accept_sym('[') {
                self.skip_until_matching('[', ']')?;
            }
            self.expect_sym(';')?;
            parsed.values.push((symbol, number as i32));
        }
        Ok(parsed)
    }

    fn parse_service(&mut self) -> Result<ServiceDescriptor, ProtoParseError> {
        let name = self.expect_ident()?;
        self.expect_sym('{')?;
        let mut service = ServiceDescriptor {
            name,
            methods: Vec::new(),
        };
        while !self.accept_sym('}') {
            if self.accept_sym(';') {
                continue;
            }
            if self.peek_ident("option") {
                self.next();
                self.skip_option()?;
                continue;
            }
            let keyword = self.expect_ident()?;
            if keyword != "rpc" {
                return Err(self.error(format!("unexpected '{keyword}' in service body")));
            }
            let method_name = self.expect_ident()?;
            self.expect_sym('(')?;
            let client_streaming = self.accept_keyword("stream");
            let input = self.parse_type_name()?;
            self.expect_sym(')')?;
            let returns = self.expect_ident()?;
            if returns != "returns" {
                return Err(self.error("expected 'returns'".to_string()));
            }
            self.expect_sym('(')?;
            let server_streaming = self.accept_keyword("stream");
            let output = self.parse_type_name()?;
            self.expect_sym(')')?;
            if self.accept_sym('{') {
                self.skip_until_matching('{', '}')?;
            } else {
                self.expect_sym(';')?;
            }
            service.methods.push(MethodDescriptor {
                name: method_name,
                input,
                output,
                client_streaming,
                server_streaming,
            });
        }
        Ok(service)
    }

    fn parse_reserved(
        &mut self,
        numbers: &mut Vec<(i32, i32)>,
        names: &mut Vec<String>,
    ) -> Result<(), ProtoParseError> {
        loop {
            match self.peek() {
                Some(Tok::Str(_)) => {
                    names.push(self.expect_string()?);
                }
                Some(Tok::Int(_)) => {
                    let low = self.expect_int()? as i32;
                    let high = if self.accept_keyword("to") {
                        if self.accept_keyword("max") {
                            536_870_911
                        } else {
                            self.expect_int()? as i32
                        }
                    } else {
                        low
                    };
                    numbers.push((low, high));
                }
                _ => return Err(self.error("expected reserved range or name".to_string())),
            }
            if self.accept_sym(',') {
                continue;
            }
            self.expect_sym(';')?;
            return Ok(());
        }
    }

    fn parse_qualified_name(&mut self) -> Result<String, ProtoParseError> {
        let mut name = self.expect_ident()?;
        while self.accept_sym('.') {
            name.push('.');
            name.push_str(&self.expect_ident()?);
        }
        Ok(name)
    }

    fn parse_type_name(&mut self) -> Result<String, ProtoParseError> {
        if self.accept_sym('.') {
            Ok(format!(".{}", self.parse_qualified_name()?))
        } else {
            self.parse_qualified_name()
        }
    }

    /// Skip an `option` statement, including aggregate `{ ... }` values.
    fn skip_option(&mut self) -> Result<(), ProtoParseError> {
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            match tok {
                Tok::Sym('{') => depth += 1,
                Tok::Sym('}') => depth = depth.saturating_sub(1),
                Tok::Sym(';') if depth == 0 => {
                    self.next();
                    return Ok(());
                }
                _ => {}
            }
            self.next();
        }
        Err(self.error("unterminated option".to_string()))
    }

    fn skip_statement(&mut self) -> Result<(), ProtoParseError> {
        while let Some(tok) = self.peek() {
            if matches!(tok, Tok::Sym(';')) {
                self.next();
                return Ok(());
            }
            self.next();
        }
        Err(self.error("unterminated statement".to_string()))
    }

    fn skip_block(&mut self) -> Result<(), ProtoParseError> {
        // Consume up to and including a balanced `{ ... }`.
        while let Some(tok) = self.peek() {
            if matches!(tok, Tok::Sym('{')) {
                self.next();
                return self.skip_until_matching('{', '}');
            }
            self.next();
        }
        Err(self.error("unterminated block".to_string()))
    }

    fn skip_until_matching(&mut self, open: char, close: char) -> Result<(), ProtoParseError> {
        let mut depth = 1usize;
        while let Some(tok) = self.peek() {
            if *tok == Tok::Sym(open) {
                depth += 1;
            } else if *tok == Tok::Sym(close) {
                depth -= 1;
                if depth == 0 {
                    self.next();
                    return Ok(());
                }
            }
            self.next();
        }
        Err(self.error(format!("unterminated '{open}'")))
    }

    // Token helpers.

    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|spanned| &spanned.tok)
    }

    fn peek_ident(&self, expected: &str) -> bool {
        matches!(self.peek(), Some(Tok::Ident(ident)) if ident == expected)
    }

    fn peek_sym(&self, expected: char) -> bool {
        matches!(self.peek(), Some(Tok::Sym(sym)) if *sym == expected)
    }

    fn peek_sym_at(&self, offset: usize, expected: char) -> bool {
        matches!(
            self.tokens.get(self.pos + offset).map(|spanned| &spanned.tok),
            Some(Tok::Sym(sym)) if *sym == expected
        )
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).map(|spanned| spanned.tok.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn accept_sym(&mut self, expected: char) -> bool {
        if self.peek_sym(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn accept_keyword(&mut self, expected: &str) -> bool {
        if self.peek_ident(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_sym(&mut self, expected: char) -> Result<(), ProtoParseError> {
        if self.accept_sym(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{expected}'")))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ProtoParseError> {
        match self.next() {
            Some(Tok::Ident(ident)) => Ok(ident),
            _ => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.error("expected identifier".to_string()))
            }
        }
    }

    fn expect_int(&mut self) -> Result<i64, ProtoParseError> {
        let negative = self.accept_sym('-');
        match self.next() {
            Some(Tok::Int(value)) => Ok(if negative { -value } else { value }),
            _ => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.error("expected integer".to_string()))
            }
        }
    }

    fn expect_string(&mut self) -> Result<String, ProtoParseError> {
        match self.next() {
            Some(Tok::Str(value)) => Ok(value),
            _ => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.error("expected string literal".to_string()))
            }
        }
    }

    fn error(&self, message: String) -> ProtoParseError {
        let line = self
            .tokens
            .get(self.pos.min(self.tokens.len().saturating_sub(1)))
            .map(|spanned| spanned.line)
            .unwrap_or(0);
        ProtoParseError { line, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cardinality, FieldType, Syntax};

    #[test]
    fn parses_a_proto3_file() {
        let schema = parse(
            r#"
            syntax = "proto3";
            package com.acme.events;

            import "google/protobuf/timestamp.proto";

            // An order event.
            message OrderEvent {
                string id = 1;
                repeated Line lines = 2;
                map<string, int64> totals = 3;

                oneof payment {
                    string card_token = 4;
                    string iban = 5;
                }

                message Line {
                    string sku = 1;
                    int32 quantity = 2;
                }

                enum Status {
                    STATUS_UNSPECIFIED = 0;
                    PLACED = 1;
                }

                reserved 9, 20 to 29;
                reserved "legacy_total";
            }
            "#,
        )
        .unwrap();

        assert_eq!(schema.file.syntax, Syntax::Proto3);
        assert_eq!(schema.file.package.as_deref(), Some("com.acme.events"));
        assert_eq!(schema.file.imports.len(), 1);

        let message = &schema.file.messages[0];
        assert_eq!(message.name, "OrderEvent");
        assert_eq!(message.fields.len(), 5);
        assert_eq!(message.oneofs, vec!["payment".to_string()]);
        assert!(message.reserves_number(25));
        assert!(message.reserves_number(9));
        assert!(!message.reserves_number(8));

        let lines = message.field_by_number(2).unwrap();
        assert_eq!(lines.cardinality, Cardinality::Repeated);
        assert_eq!(lines.ty, FieldType::Named("Line".to_string()));

        let totals = message.field_by_number(3).unwrap();
        assert!(matches!(totals.ty, FieldType::Map(_, _)));

        let card = message.field_by_number(4).unwrap();
        assert_eq!(card.oneof.as_deref(), Some("payment"));

        assert!(schema.types.contains_key("com.acme.events.OrderEvent"));
        assert!(schema.types.contains_key("com.acme.events.OrderEvent.Line"));
        assert!(schema.types.contains_key("com.acme.events.OrderEvent.Status"));
    }

    #[test]
    fn parses_proto2_labels() {
        let schema = parse(
            r#"
            syntax = "proto2";
            message Legacy {
                required string id = 1;
                optional int32 count = 2 [default = 5];
                repeated string tags = 3;
            }
            "#,
        )
        .unwrap();
        let message = &schema.file.messages[0];
        assert_eq!(message.fields[0].cardinality, Cardinality::Required);
        assert_eq!(message.fields[1].cardinality, Cardinality::Optional);
        assert_eq!(message.fields[2].cardinality, Cardinality::Repeated);
    }

    #[test]
    fn parses_services_with_streaming() {
        let schema = parse(
            r#"
            syntax = "proto3";
            package rpc;
            message Req {}
            message Resp {}
            service Search {
                rpc Lookup (Req) returns (Resp);
                rpc Watch (Req) returns (stream Resp);
                rpc Upload (stream Req) returns (Resp) {
                    option deadline = 30.0;
                }
            }
            "#,
        )
        .unwrap();
        let service = &schema.file.services[0];
        assert_eq!(service.methods.len(), 3);
        let watch = service.method("Watch").unwrap();
        assert!(!watch.client_streaming);
        assert!(watch.server_streaming);
        let upload = service.method("Upload").unwrap();
        assert!(upload.client_streaming);
    }

    #[test]
    fn missing_syntax_defaults_to_proto2() {
        let schema = parse("message M { optional int32 a = 1; }").unwrap();
        assert_eq!(schema.file.syntax, Syntax::Proto2);
    }

    #[test]
    fn name_resolution_walks_scopes_outward() {
        let schema = parse(
            r#"
            syntax = "proto3";
            package p;
            message Outer {
                message Inner { string v = 1; }
                Inner inner = 1;
            }
            "#,
        )
        .unwrap();
        let (fqn, _) = schema.resolve("p.Outer", "Inner").unwrap();
        assert_eq!(fqn, "p.Outer.Inner");
        let (fqn, _) = schema.resolve("p", "Outer.Inner").unwrap();
        assert_eq!(fqn, "p.Outer.Inner");
        assert!(schema.resolve("p", "Missing").is_none());
    }

    #[test]
    fn dependency_types_are_visible() {
        let address = parse(
            r#"
            syntax = "proto3";
            package common;
            message Address { string street = 1; }
            "#,
        )
        .unwrap();
        let order = parse_with_dependencies(
            r#"
            syntax = "proto3";
            package shop;
            import "common/address.proto";
            message Order { common.Address ship_to = 1; }
            "#,
            &[&address],
        )
        .unwrap();
        let (fqn, _) = order.resolve("shop.Order", "common.Address").unwrap();
        assert_eq!(fqn, "common.Address");
    }

    #[test]
    fn adversarial_input_does_not_panic() {
        for text in [
            "",
            "syntax",
            "syntax = \"proto4\";",
            "message {",
            "message M { string = 1; }",
            "message M { group G = 1 {} }",
            "service S { rpc }",
            "/* unterminated",
            "\"unterminated",
        ] {
            let _ = parse(text);
        }
    }
}
