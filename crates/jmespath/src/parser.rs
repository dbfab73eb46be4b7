//! Pratt parser producing an [`Ast`].
//!
//! Every token carries a left binding power (see [`Token::lbp`]). Projections
//! keep absorbing the tokens that follow them until one binds more loosely
//! than [`PROJECTION_STOP`], which is how `a[*].b.c | d` projects `.b.c` but
//! not `| d`.

use crate::ast::{Ast, KeyValuePair, Projection, Slice};
use crate::error::ParseError;
use crate::lexer::{tokenize, Spanned, Token};
use crate::operators::{BinaryOperator, RegexMatcher, UnaryOperator, PROJECTION_STOP};
use crate::types::{check_arity, FunctionMap};
use serde_json::Value;

/// Parses `input`, resolving function calls against `functions`.
pub fn parse(input: &str, functions: &FunctionMap, max_depth: usize) -> Result<Ast, ParseError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        max_depth,
        functions,
    };
    let ast = parser.expr(0)?;
    match parser.peek() {
        Token::Eof => Ok(ast),
        other => Err(parser.error_here(format!("Unexpected {other}"))),
    }
}

struct Parser<'f> {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
    max_depth: usize,
    functions: &'f FunctionMap,
}

impl<'f> Parser<'f> {
    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        // The lexer always terminates the vector with `Eof`.
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + offset).min(last)].token
    }

    fn advance(&mut self) -> Spanned {
        let last = self.tokens.len() - 1;
        let spanned = self.tokens[self.pos.min(last)].clone();
        if self.pos < last {
            self.pos += 1;
        }
        spanned
    }

    fn error_at(spanned: &Spanned, message: impl Into<String>) -> ParseError {
        ParseError::new(message, spanned.line, spanned.column)
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        let last = self.tokens.len() - 1;
        Self::error_at(&self.tokens[self.pos.min(last)], message)
    }

    fn expect(&mut self, wanted: Token) -> Result<Spanned, ParseError> {
        if *self.peek() == wanted {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!("Expected {wanted}, found {}", self.peek())))
        }
    }

    /// `depth` counts both recursive calls and the nodes stacked by a
    /// left-associative chain, so it bounds the height of the finished tree.
    fn expr(&mut self, rbp: u8) -> Result<Ast, ParseError> {
        self.descend()?;
        let result = self.expr_inner(rbp);
        self.depth -= 1;
        result
    }

    fn expr_inner(&mut self, rbp: u8) -> Result<Ast, ParseError> {
        let mut left = self.nud()?;
        let mut links = 0;
        let result = loop {
            if rbp >= self.peek().lbp() {
                break Ok(left);
            }
            if let Err(e) = self.descend() {
                break Err(e);
            }
            links += 1;
            match self.led(left) {
                Ok(node) => left = node,
                Err(e) => break Err(e),
            }
        };
        self.depth -= links;
        result
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        if self.depth >= self.max_depth {
            return Err(self.error_here(format!(
                "Expression nesting exceeds the maximum depth of {}",
                self.max_depth
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn nud(&mut self) -> Result<Ast, ParseError> {
        let Spanned { token, line, column } = self.advance();
        match token {
            Token::At => Ok(Ast::CurrentNode),
            Token::Identifier(name) => {
                if *self.peek() == Token::Lparen {
                    self.function(name, line, column)
                } else {
                    Ok(Ast::Identifier(name))
                }
            }
            Token::QuotedIdentifier(name) => {
                if *self.peek() == Token::Lparen {
                    return Err(ParseError::new(
                        "Quoted identifiers cannot name functions",
                        line,
                        column,
                    ));
                }
                Ok(Ast::Identifier(name))
            }
            Token::RawString(s) => Ok(Ast::Literal(Value::String(s))),
            Token::Literal(value) => Ok(Ast::Literal(value)),
            Token::Star => {
                let rhs = self.projection_rhs(Token::Star.lbp())?;
                Ok(Ast::projection(Projection::Object, Ast::CurrentNode, rhs))
            }
            Token::Lbracket => match (self.peek(), self.peek_at(1)) {
                (Token::Number(_) | Token::Colon, _) => self.index_or_slice(Ast::CurrentNode),
                (Token::Star, Token::Rbracket) => {
                    self.advance();
                    self.advance();
                    let rhs = self.projection_rhs(Token::Star.lbp())?;
                    Ok(Ast::projection(Projection::List, Ast::CurrentNode, rhs))
                }
                _ => self.multi_select_list(),
            },
            Token::Flatten => {
                let rhs = self.projection_rhs(Token::Flatten.lbp())?;
                Ok(Ast::projection(Projection::Flatten, Ast::CurrentNode, rhs))
            }
            Token::Filter => self.filter(Ast::CurrentNode),
            Token::Lbrace => self.multi_select_hash(),
            Token::Ampersand => Ok(Ast::ExpressionRef(Box::new(self.expr(0)?))),
            Token::Not => {
                let operand = self.expr(UnaryOperator::Not.precedence())?;
                Ok(Ast::unary(UnaryOperator::Not, operand))
            }
            Token::Lparen => {
                let inner = self.expr(0)?;
                self.expect(Token::Rparen)?;
                Ok(inner)
            }
            Token::Eof => Err(ParseError::new("Unexpected end of expression", line, column)),
            other => Err(ParseError::new(format!("Unexpected {other}"), line, column)),
        }
    }

    fn led(&mut self, left: Ast) -> Result<Ast, ParseError> {
        let spanned = self.advance();
        match spanned.token {
            Token::Dot => {
                if *self.peek() == Token::Star {
                    self.advance();
                    let rhs = self.projection_rhs(Token::Star.lbp())?;
                    Ok(Ast::projection(Projection::Object, left, rhs))
                } else {
                    let rhs = self.parse_dot(Token::Dot.lbp())?;
                    Ok(Ast::subexpr(left, rhs))
                }
            }
            Token::Lbracket => match (self.peek(), self.peek_at(1)) {
                (Token::Number(_) | Token::Colon, _) => self.index_or_slice(left),
                (Token::Star, Token::Rbracket) => {
                    self.advance();
                    self.advance();
                    let rhs = self.projection_rhs(Token::Star.lbp())?;
                    Ok(Ast::projection(Projection::List, left, rhs))
                }
                _ => Err(self.error_here(format!(
                    "Expected a number, ':' or '*', found {}",
                    self.peek()
                ))),
            },
            Token::Flatten => {
                let rhs = self.projection_rhs(Token::Flatten.lbp())?;
                Ok(Ast::projection(Projection::Flatten, left, rhs))
            }
            Token::Filter => self.filter(left),
            Token::Pipe => {
                let rhs = self.expr(Token::Pipe.lbp())?;
                Ok(Ast::pipe(left, rhs))
            }
            Token::Match => {
                let pattern = self.advance();
                let Token::RawString(text) = &pattern.token else {
                    return Err(Self::error_at(
                        &pattern,
                        format!(
                            "Expected a raw string pattern after '=~', found {}",
                            pattern.token
                        ),
                    ));
                };
                let matcher = RegexMatcher::new(text)
                    .map_err(|e| Self::error_at(&pattern, format!("Invalid regex: {e}")))?;
                Ok(Ast::unary(UnaryOperator::Regex(matcher), left))
            }
            ref token => match binary_operator(token) {
                Some(op) => {
                    let rhs = self.expr(op.precedence())?;
                    Ok(Ast::binary(op, left, rhs))
                }
                None => Err(Self::error_at(&spanned, format!("Unexpected {token}"))),
            },
        }
    }

    /// Parses what follows a projection: nothing (when the next token binds
    /// below [`PROJECTION_STOP`]), a `.` chain, or a bracket.
    fn projection_rhs(&mut self, lbp: u8) -> Result<Ast, ParseError> {
        match self.peek() {
            t if t.lbp() < PROJECTION_STOP => Ok(Ast::CurrentNode),
            Token::Dot => {
                self.advance();
                self.parse_dot(lbp)
            }
            Token::Lbracket | Token::Filter => self.expr(lbp),
            other => Err(self.error_here(format!("Unexpected {other} after projection"))),
        }
    }

    /// Parses the right side of `.`: an identifier, a function call, `*`, or
    /// a multi-select.
    fn parse_dot(&mut self, lbp: u8) -> Result<Ast, ParseError> {
        match self.peek() {
            Token::Lbracket => {
                self.advance();
                self.multi_select_list()
            }
            Token::Lbrace => {
                self.advance();
                self.multi_select_hash()
            }
            Token::Identifier(_) | Token::QuotedIdentifier(_) | Token::Star => self.expr(lbp),
            other => Err(self.error_here(format!(
                "Expected an identifier, '*', '[' or '{{' after '.', found {other}"
            ))),
        }
    }

    fn filter(&mut self, lhs: Ast) -> Result<Ast, ParseError> {
        let predicate = self.expr(0)?;
        self.expect(Token::Rbracket)?;
        let rhs = self.projection_rhs(Token::Filter.lbp())?;
        Ok(Ast::projection(Projection::Filter(Box::new(predicate)), lhs, rhs))
    }

    /// `[n]` or `[start:stop:step]`; the opening bracket is already consumed.
    fn index_or_slice(&mut self, lhs: Ast) -> Result<Ast, ParseError> {
        let mut parts: [Option<i64>; 3] = [None; 3];
        let mut step_at: Option<Spanned> = None;
        let mut part = 0;
        loop {
            let spanned = self.advance();
            match spanned.token {
                Token::Number(n) if parts[part].is_none() => {
                    if part == 2 {
                        step_at = Some(spanned.clone());
                    }
                    parts[part] = Some(n);
                }
                Token::Colon if part < 2 => part += 1,
                Token::Rbracket => break,
                ref other => {
                    return Err(Self::error_at(&spanned, format!("Unexpected {other} in slice")))
                }
            }
        }

        if part == 0 {
            let index = parts[0].ok_or_else(|| self.error_here("Expected an index"))?;
            return Ok(match lhs {
                Ast::CurrentNode => Ast::Index(index),
                lhs => Ast::subexpr(lhs, Ast::Index(index)),
            });
        }

        if let (Some(0), Some(at)) = (parts[2], &step_at) {
            return Err(Self::error_at(at, "Slice step cannot be 0"));
        }
        let slice = Slice::new(parts[0], parts[1], parts[2]);
        let rhs = self.projection_rhs(Token::Star.lbp())?;
        Ok(Ast::projection(Projection::Slice(slice), lhs, rhs))
    }

    /// `[a, b, ...]`; the opening bracket is already consumed.
    fn multi_select_list(&mut self) -> Result<Ast, ParseError> {
        let mut items = Vec::new();
        loop {
            items.push(self.expr(0)?);
            let spanned = self.advance();
            match spanned.token {
                Token::Comma => continue,
                Token::Rbracket => break,
                ref other => {
                    let message = format!("Expected ',' or ']', found {other}");
                    return Err(Self::error_at(&spanned, message));
                }
            }
        }
        Ok(Ast::MultiSelectList(items))
    }

    /// `{key: expr, ...}`; the opening brace is already consumed.
    fn multi_select_hash(&mut self) -> Result<Ast, ParseError> {
        let mut pairs = Vec::new();
        loop {
            let key_token = self.advance();
            let key = match key_token.token {
                Token::Identifier(key) | Token::QuotedIdentifier(key) => key,
                ref other => {
                    return Err(Self::error_at(
                        &key_token,
                        format!("Expected a key name, found {other}"),
                    ))
                }
            };
            self.expect(Token::Colon)?;
            let value = self.expr(0)?;
            pairs.push(KeyValuePair { key, value });

            let spanned = self.advance();
            match spanned.token {
                Token::Comma => continue,
                Token::Rbrace => break,
                ref other => {
                    let message = format!("Expected ',' or '}}', found {other}");
                    return Err(Self::error_at(&spanned, message));
                }
            }
        }
        Ok(Ast::MultiSelectHash(pairs))
    }

    /// `name(args...)`; `name` is consumed, the next token is `(`.
    fn function(&mut self, name: String, line: usize, column: usize) -> Result<Ast, ParseError> {
        self.expect(Token::Lparen)?;
        let mut args = Vec::new();
        if *self.peek() == Token::Rparen {
            self.advance();
        } else {
            loop {
                args.push(self.expr(0)?);
                let spanned = self.advance();
                match spanned.token {
                    Token::Comma => continue,
                    Token::Rparen => break,
                    ref other => {
                        return Err(Self::error_at(
                            &spanned,
                            format!("Expected ',' or ')', found {other}"),
                        ))
                    }
                }
            }
        }

        let def = self
            .functions
            .get(&name)
            .ok_or_else(|| ParseError::new(format!("Unknown function: {name}"), line, column))?;
        check_arity(&name, def.arity, args.len())
            .map_err(|msg| ParseError::new(msg, line, column))?;
        Ok(Ast::Function { name, args })
    }
}

fn binary_operator(token: &Token) -> Option<BinaryOperator> {
    Some(match token {
        Token::Or => BinaryOperator::Or,
        Token::And => BinaryOperator::And,
        Token::Eq => BinaryOperator::Eq,
        Token::Ne => BinaryOperator::Ne,
        Token::Lt => BinaryOperator::Lt,
        Token::Lte => BinaryOperator::Lte,
        Token::Gt => BinaryOperator::Gt,
        Token::Gte => BinaryOperator::Gte,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::functions_map;
    use serde_json::json;

    fn ast(input: &str) -> Ast {
        parse(input, &functions_map(true), 256)
            .unwrap_or_else(|e| panic!("parse failed for '{input}': {e}"))
    }

    fn err(input: &str) -> ParseError {
        match parse(input, &functions_map(true), 256) {
            Ok(ast) => panic!("expected '{input}' to fail, got {ast:?}"),
            Err(e) => e,
        }
    }

    fn id(name: &str) -> Ast {
        Ast::Identifier(name.into())
    }

    #[test]
    fn subexpressions_nest_left() {
        assert_eq!(ast("a.b.c"), Ast::subexpr(Ast::subexpr(id("a"), id("b")), id("c")));
    }

    #[test]
    fn projection_absorbs_until_pipe() {
        assert_eq!(
            ast("a[*].b | c"),
            Ast::pipe(Ast::projection(Projection::List, id("a"), id("b")), id("c"))
        );
        assert_eq!(
            ast("a.*.b[0]"),
            Ast::projection(Projection::Object, id("a"), Ast::subexpr(id("b"), Ast::Index(0)))
        );
    }

    #[test]
    fn flatten_stops_an_outer_projection() {
        assert_eq!(
            ast("a[*].b[].c"),
            Ast::projection(
                Projection::Flatten,
                Ast::projection(Projection::List, id("a"), id("b")),
                id("c")
            )
        );
    }

    #[test]
    fn brackets() {
        assert_eq!(ast("[0]"), Ast::Index(0));
        assert_eq!(ast("a[-1]"), Ast::subexpr(id("a"), Ast::Index(-1)));
        assert_eq!(
            ast("[::-1]"),
            Ast::projection(
                Projection::Slice(Slice::new(None, None, Some(-1))),
                Ast::CurrentNode,
                Ast::CurrentNode
            )
        );
        assert_eq!(ast("[a, b]"), Ast::MultiSelectList(vec![id("a"), id("b")]));
        assert_eq!(
            ast("*"),
            Ast::projection(Projection::Object, Ast::CurrentNode, Ast::CurrentNode)
        );
    }

    #[test]
    fn filters_and_comparators() {
        assert_eq!(
            ast("a[?b > `1` && c].d"),
            Ast::projection(
                Projection::Filter(Box::new(Ast::binary(
                    BinaryOperator::And,
                    Ast::binary(BinaryOperator::Gt, id("b"), Ast::Literal(json!(1))),
                    id("c")
                ))),
                id("a"),
                id("d")
            )
        );
        assert_eq!(
            ast("a || b && c"),
            Ast::binary(
                BinaryOperator::Or,
                id("a"),
                Ast::binary(BinaryOperator::And, id("b"), id("c"))
            )
        );
    }

    #[test]
    fn functions_and_expression_references() {
        assert_eq!(
            ast("sort_by(people, &age)"),
            Ast::Function {
                name: "sort_by".into(),
                args: vec![id("people"), Ast::ExpressionRef(Box::new(id("age")))],
            }
        );
        assert_eq!(
            ast("powertools_json(body).id"),
            Ast::subexpr(
                Ast::Function { name: "powertools_json".into(), args: vec![id("body")] },
                id("id")
            )
        );
    }

    #[test]
    fn multi_select_hash_keeps_declaration_order() {
        match ast("{z: a, \"quoted key\": b}") {
            Ast::MultiSelectHash(pairs) => {
                let keys: Vec<&str> = pairs.iter().map(|p| p.key.as_str()).collect();
                assert_eq!(keys, vec!["z", "quoted key"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn regex_match_operator() {
        match ast("name =~ '^a.*'") {
            Ast::Unary { op: UnaryOperator::Regex(m), operand } => {
                assert_eq!(m.pattern(), "^a.*");
                assert_eq!(*operand, id("name"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err("a =~ b").column, 6);
        assert!(err("a =~ '('").message.contains("Invalid regex"));
    }

    #[test]
    fn function_errors_point_at_the_name() {
        let e = err("foo.nope(@)");
        assert_eq!((e.line, e.column, e.message.as_str()), (1, 5, "Unknown function: nope"));
        let e = err("abs(a, b)");
        assert_eq!((e.line, e.column), (1, 1));
        assert_eq!(e.message, "Function \"abs\" expects 1 argument, got 2");
        assert_eq!(err("\"abs\"(a)").message, "Quoted identifiers cannot name functions");
    }

    #[test]
    fn syntax_errors() {
        assert_eq!(err("[::0]").column, 4);
        assert_eq!(err("a b").column, 3);
        assert!(err("a.").message.contains("after '.'"));
        assert!(err("a[").message.contains("Expected"));
        assert!(err("{a b}").message.contains("Expected"));
        assert!(err("").message.contains("end of expression"));
        let e = err("a\n  | ]");
        assert_eq!((e.line, e.column), (2, 5));
    }

    #[test]
    fn nesting_depth_is_bounded() {
        let deep = format!("{}a{}", "(".repeat(20), ")".repeat(20));
        assert!(parse(&deep, &functions_map(true), 256).is_ok());
        let e = parse(&deep, &functions_map(true), 10).unwrap_err();
        assert!(e.message.contains("maximum depth"));
    }

    #[test]
    fn left_associative_chains_count_towards_depth() {
        let functions = functions_map(true);
        let chain = format!("a{}", ".a".repeat(3_000));
        let e = parse(&chain, &functions, 256).unwrap_err();
        assert!(e.message.contains("maximum depth"));
        // Each `.a` link also opens a nested `expr` for its identifier.
        assert!(parse(&format!("a{}", ".a".repeat(8)), &functions, 10).is_ok());
        assert!(parse(&format!("a{}", ".a".repeat(10)), &functions, 10).is_err());
        assert!(parse(&format!("a{}", " || a".repeat(10)), &functions, 10).is_err());
    }
}
