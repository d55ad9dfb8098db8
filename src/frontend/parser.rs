//! Recursive descent parser for the set/relation notation.

use crate::frontend::lexer::{Lexer, Token, TokenKind};
use crate::frontend::ParseError;
use crate::polyhedral::{
    AffineExpr, BasicRegion, BasicRelation, Constraint, Region, Relation, Space,
};

/// A parser for the set/relation notation.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

/// Name resolution context for constraint expressions.
struct NameEnv {
    space: Space,
}

impl NameEnv {
    fn resolve(&self, name: &str) -> Option<AffineExpr> {
        let n_var = self.space.n_var();
        let n_param = self.space.n_param;
        if let Some(i) = self.space.in_names.iter().position(|n| n == name) {
            return Some(AffineExpr::var(i, n_var, n_param));
        }
        if let Some(j) = self.space.out_names.iter().position(|n| n == name) {
            return Some(AffineExpr::var(self.space.n_in + j, n_var, n_param));
        }
        if let Some(p) = self.space.param_names.iter().position(|n| n == name) {
            return Some(AffineExpr::param(p, n_var, n_param));
        }
        None
    }
}

impl<'a> Parser<'a> {
    /// Create a parser over the given source.
    pub fn new(source: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parse relation notation with two tuples.
    pub fn parse_relation(mut self) -> Result<Relation, ParseError> {
        let (space, conjunctions) = self.parse_input(true)?;
        let mut rel = Relation::empty(space.clone());
        for constraints in conjunctions {
            let mut piece = BasicRelation::universe(space.clone());
            for c in constraints {
                piece.add_constraint(c);
            }
            rel.add_piece(piece);
        }
        Ok(rel)
    }

    /// Parse region notation with one tuple.
    pub fn parse_region(mut self) -> Result<Region, ParseError> {
        let (space, conjunctions) = self.parse_input(false)?;
        let mut region = Region::empty(space.clone());
        for constraints in conjunctions {
            let mut piece = BasicRegion::universe(space.clone());
            for c in constraints {
                piece.add_constraint(c);
            }
            region.add_piece(piece);
        }
        Ok(region)
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current.kind == kind
    }

    fn match_token(&mut self, kind: &TokenKind) -> Result<bool, ParseError> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn consume(&mut self, kind: &TokenKind, message: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            self.advance()
        } else {
            Err(ParseError::new(message, self.current.offset))
        }
    }

    fn consume_ident(&mut self, message: &str) -> Result<String, ParseError> {
        match self.current.kind.clone() {
            TokenKind::Ident(name) => {
                self.advance()?;
                Ok(name)
            }
            _ => Err(ParseError::new(message, self.current.offset)),
        }
    }

    /// `[ name, name, ... ]`, possibly empty.
    fn parse_tuple(&mut self) -> Result<Vec<String>, ParseError> {
        self.consume(&TokenKind::LBracket, "expected '['")?;
        let mut names = Vec::new();
        if !self.check(&TokenKind::RBracket) {
            loop {
                names.push(self.consume_ident("expected dimension name")?);
                if !self.match_token(&TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.consume(&TokenKind::RBracket, "expected ']'")?;
        Ok(names)
    }

    fn parse_input(
        &mut self,
        relation: bool,
    ) -> Result<(Space, Vec<Vec<Constraint>>), ParseError> {
        let start = self.current.offset;
        let params = if self.check(&TokenKind::LBracket) {
            let names = self.parse_tuple()?;
            self.consume(&TokenKind::Arrow, "expected '->' after parameter list")?;
            names
        } else {
            Vec::new()
        };

        self.consume(&TokenKind::LBrace, "expected '{'")?;
        let first = self.parse_tuple()?;
        let (in_names, out_names) = if relation {
            self.consume(&TokenKind::Arrow, "expected '->' between input and output tuples")?;
            (first, self.parse_tuple()?)
        } else {
            if self.check(&TokenKind::Arrow) {
                return Err(ParseError::new(
                    "unexpected '->' in region notation",
                    self.current.offset,
                ));
            }
            (Vec::new(), first)
        };

        let mut all = params.clone();
        all.extend(in_names.iter().cloned());
        all.extend(out_names.iter().cloned());
        for (i, name) in all.iter().enumerate() {
            if all[..i].contains(name) {
                return Err(ParseError::new(format!("duplicate name '{}'", name), start));
            }
        }

        let space = Space::relation_with_params(in_names.len(), out_names.len(), params.len())
            .with_param_names(params)
            .with_in_names(in_names)
            .with_out_names(out_names);
        let env = NameEnv { space: space.clone() };

        let conjunctions = if self.match_token(&TokenKind::Colon)? {
            self.parse_disjunction(&env)?
        } else {
            vec![Vec::new()]
        };

        self.consume(&TokenKind::RBrace, "expected '}'")?;
        if !self.check(&TokenKind::Eof) {
            return Err(ParseError::new(
                "unexpected input after '}'",
                self.current.offset,
            ));
        }
        Ok((space, conjunctions))
    }

    fn parse_disjunction(&mut self, env: &NameEnv) -> Result<Vec<Vec<Constraint>>, ParseError> {
        let mut pieces = Vec::new();
        loop {
            let mut constraints = Vec::new();
            loop {
                self.parse_chain(env, &mut constraints)?;
                if !self.match_token(&TokenKind::And)? {
                    break;
                }
            }
            pieces.push(constraints);
            if !self.match_token(&TokenKind::Or)? {
                break;
            }
        }
        Ok(pieces)
    }

    /// A comparison chain `a <= b < c`, one constraint per adjacent pair.
    fn parse_chain(
        &mut self,
        env: &NameEnv,
        out: &mut Vec<Constraint>,
    ) -> Result<(), ParseError> {
        let mut lhs = self.parse_sum(env)?;
        let mut any = false;
        loop {
            let op = match self.current.kind {
                TokenKind::Le
                | TokenKind::Lt
                | TokenKind::Ge
                | TokenKind::Gt
                | TokenKind::Equal => self.advance()?.kind,
                _ => break,
            };
            let rhs = self.parse_sum(env)?;
            let constraint = match op {
                TokenKind::Le => Constraint::le(lhs.clone(), rhs.clone()),
                TokenKind::Ge => Constraint::ge(lhs.clone(), rhs.clone()),
                TokenKind::Equal => Constraint::eq(lhs.clone(), rhs.clone()),
                TokenKind::Lt => {
                    let mut e = rhs.clone() - lhs.clone();
                    e.constant -= 1;
                    Constraint::ge_zero(e)
                }
                TokenKind::Gt => {
                    let mut e = lhs.clone() - rhs.clone();
                    e.constant -= 1;
                    Constraint::ge_zero(e)
                }
                _ => unreachable!("filtered above"),
            };
            out.push(constraint);
            lhs = rhs;
            any = true;
        }
        if any {
            Ok(())
        } else {
            Err(ParseError::new(
                "expected comparison operator",
                self.current.offset,
            ))
        }
    }

    fn parse_sum(&mut self, env: &NameEnv) -> Result<AffineExpr, ParseError> {
        let mut expr = AffineExpr::zero(env.space.n_var(), env.space.n_param);
        let mut negative = self.match_token(&TokenKind::Minus)?;
        loop {
            let term = self.parse_term(env)?;
            expr = if negative { expr - term } else { expr + term };
            if self.match_token(&TokenKind::Plus)? {
                negative = false;
            } else if self.match_token(&TokenKind::Minus)? {
                negative = true;
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_term(&mut self, env: &NameEnv) -> Result<AffineExpr, ParseError> {
        match self.current.kind.clone() {
            TokenKind::Int(value) => {
                self.advance()?;
                if self.match_token(&TokenKind::Star)? {
                    let offset = self.current.offset;
                    let name = self.consume_ident("expected name after '*'")?;
                    let var = env.resolve(&name).ok_or_else(|| {
                        ParseError::new(format!("unknown name '{}'", name), offset)
                    })?;
                    Ok(var.scale(value))
                } else {
                    Ok(AffineExpr::constant(
                        value,
                        env.space.n_var(),
                        env.space.n_param,
                    ))
                }
            }
            TokenKind::Ident(name) => {
                let offset = self.current.offset;
                self.advance()?;
                env.resolve(&name)
                    .ok_or_else(|| ParseError::new(format!("unknown name '{}'", name), offset))
            }
            _ => Err(ParseError::new(
                "expected integer or name",
                self.current.offset,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{parse_region, parse_relation};

    #[test]
    fn test_parse_relation() {
        let rel = parse_relation("{ [x] -> [y] : 0 <= y and y <= 10 }").expect("parse");
        assert_eq!(rel.space().n_in, 1);
        assert_eq!(rel.space().n_out, 1);
        assert_eq!(rel.n_pieces(), 1);
        assert!(rel.contains(&[3], &[10], &[]));
        assert!(!rel.contains(&[3], &[11], &[]));
    }

    #[test]
    fn test_parse_chain() {
        let region = parse_region("{ [x] : 0 <= x <= 5 }").expect("parse");
        assert!(region.contains(&[0], &[]));
        assert!(region.contains(&[5], &[]));
        assert!(!region.contains(&[6], &[]));
    }

    #[test]
    fn test_parse_union() {
        let region = parse_region("{ [x] : 0 <= x <= 5 or 3 <= x <= 8 }").expect("parse");
        assert_eq!(region.n_pieces(), 2);
        assert!(region.contains(&[8], &[]));
        assert!(!region.contains(&[9], &[]));
    }

    #[test]
    fn test_parse_params() {
        let rel = parse_relation("[N] -> { [i] -> [j] : 0 <= j <= N and j >= i }").expect("parse");
        assert_eq!(rel.space().param_names, vec!["N".to_string()]);
        assert!(rel.contains(&[2], &[2], &[7]));
        assert!(!rel.contains(&[2], &[8], &[7]));
    }

    #[test]
    fn test_parse_arithmetic() {
        // j = 2*i - 1 + N
        let rel = parse_relation("[N] -> { [i] -> [j] : j = 2*i - 1 + N }").expect("parse");
        assert!(rel.contains(&[3], &[9], &[4]));
        assert!(!rel.contains(&[3], &[8], &[4]));
    }

    #[test]
    fn test_parse_strict_bounds() {
        let region = parse_region("{ [x] : 0 < x < 4 }").expect("parse");
        assert!(!region.contains(&[0], &[]));
        assert!(region.contains(&[1], &[]));
        assert!(region.contains(&[3], &[]));
        assert!(!region.contains(&[4], &[]));
    }

    #[test]
    fn test_parse_universe_piece() {
        let region = parse_region("{ [x, y] }").expect("parse");
        assert!(region.contains(&[-100, 100], &[]));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_relation("{ [x] : x >= 0 }").is_err()); // missing arrow
        assert!(parse_region("{ [x] -> [y] }").is_err()); // unexpected arrow
        assert!(parse_region("{ [x] : y >= 0 }").is_err()); // unknown name
        assert!(parse_region("{ [x, x] }").is_err()); // duplicate name
        assert!(parse_region("{ [x] : x }").is_err()); // missing comparison
        assert!(parse_region("{ [x] } trailing").is_err());
    }

    #[test]
    fn test_empty_piece_dropped() {
        let region = parse_region("{ [x] : 1 = 0 }").expect("parse");
        assert!(region.is_plain_empty());
    }
}
