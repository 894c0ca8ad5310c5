use crate::ast::*;
use crate::error::SyntaxErrorKind;
use crate::lexer::{Token, TokenKind};
use miette::SourceSpan;

/// The error has already been recorded; the caller only needs to recover.
#[derive(Debug)]
pub struct Reported;

type PResult<T> = Result<T, Reported>;

/// Words that start a top-level item; recovery stops in front of them.
const ITEM_STARTS: &[&str] = &[
    "export", "import", "interface", "type", "enum", "declare", "class", "const", "let", "var", "function",
];

/// Hand-rolled recursive-descent parser over the token stream.
///
/// Errors are recorded rather than returned so a single pass reports every
/// problem in the file. Recovery happens at item and member boundaries.
pub struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
    source_len: usize,
    errors: Vec<(SyntaxErrorKind, SourceSpan)>,
}

impl<'t, 'a> Parser<'t, 'a> {
    pub fn new(tokens: &'t [Token<'a>], source_len: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            source_len,
            errors: Vec::new(),
        }
    }

    pub fn into_errors(self) -> Vec<(SyntaxErrorKind, SourceSpan)> {
        self.errors
    }

    fn peek(&self) -> Option<&'t Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&'t Token<'a>> {
        self.tokens.get(self.pos + offset)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn at_word(&self, word: &str) -> bool {
        self.peek().is_some_and(|t| t.is_word(word))
    }

    fn next(&mut self) -> Option<&'t Token<'a>> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.at_word(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn report(&mut self, kind: SyntaxErrorKind, span: SourceSpan) {
        self.errors.push((kind, span));
    }

    fn error<T>(&mut self, kind: SyntaxErrorKind, span: SourceSpan) -> PResult<T> {
        self.report(kind, span);
        Err(Reported)
    }

    fn unexpected<T>(&mut self, expected: &str) -> PResult<T> {
        match self.peek() {
            Some(tok) => self.error(
                SyntaxErrorKind::UnexpectedToken {
                    expected: expected.to_string(),
                    found: format!("`{}`", tok.lexeme),
                },
                tok.span,
            ),
            None => {
                let span = SourceSpan::new(self.source_len.into(), 0);
                self.error(SyntaxErrorKind::UnexpectedEof(expected.to_string()), span)
            }
        }
    }

    /// Expect the next token to be of a specific kind.
    fn expect(&mut self, expected: TokenKind) -> PResult<&'t Token<'a>> {
        match self.peek() {
            Some(t) if t.kind == expected => {
                self.pos += 1;
                Ok(t)
            }
            _ => self.unexpected(expected.describe()),
        }
    }

    fn expect_ident(&mut self) -> PResult<Ident<'a>> {
        let tok = self.expect(TokenKind::Ident)?;
        Ok(Ident {
            name: tok.lexeme,
            span: tok.span,
        })
    }

    fn current_offset(&self) -> usize {
        self.peek().map_or(self.source_len, |t| t.span.offset())
    }

    /// Span from `start` to the end of the last consumed token.
    fn span_from(&self, start: usize) -> SourceSpan {
        let end = match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(t) => t.span.offset() + t.span.len(),
            None => start,
        };
        SourceSpan::new(start.into(), end.saturating_sub(start))
    }

    //--------------------------------------------------------------------------
    // <File> ::= <Item>*
    //--------------------------------------------------------------------------

    pub fn parse_file(&mut self) -> SchemaFile<'a> {
        let mut items = Vec::new();
        while self.peek().is_some() {
            let start = self.pos;
            match self.parse_item() {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(Reported) => self.recover_item(start),
            }
        }
        SchemaFile { items }
    }

    fn parse_item(&mut self) -> PResult<Option<Item<'a>>> {
        if self.eat(TokenKind::Semi) {
            return Ok(None);
        }
        if self.at_word("import") {
            return self.parse_import().map(|i| Some(Item::Import(i)));
        }
        if self.eat_word("export") {
            if self.eat_word("default") {
                let registration = self.parse_registration()?;
                self.eat(TokenKind::Semi);
                return Ok(Some(Item::Registration(registration)));
            }
            if let Some(tok) = self.peek() {
                if matches!(tok.kind, TokenKind::LBrace | TokenKind::Star) {
                    return self.error(SyntaxErrorKind::UnsupportedDeclaration("re-export".into()), tok.span);
                }
            }
        }
        self.eat_word("declare");

        let Some(tok) = self.peek() else {
            return self.unexpected("declaration");
        };
        if tok.kind != TokenKind::Ident {
            return self.unexpected("declaration");
        }
        match tok.lexeme {
            "interface" => self.parse_interface().map(|d| Some(Item::Interface(d))),
            "type" => self.parse_type_alias().map(|d| Some(Item::TypeAlias(d))),
            "enum" => self.parse_enum().map(|d| Some(Item::Enum(d))),
            "const" if self.peek_at(1).is_some_and(|t| t.is_word("enum")) => {
                self.next();
                self.parse_enum().map(|d| Some(Item::Enum(d)))
            }
            "const" | "let" | "var" => {
                self.next();
                self.expect_ident()?;
                if self.eat(TokenKind::Colon) {
                    self.parse_type()?;
                }
                self.expect(TokenKind::Eq)?;
                let registration = self.parse_registration()?;
                self.eat(TokenKind::Semi);
                Ok(Some(Item::Registration(registration)))
            }
            "class" | "abstract" => {
                self.next();
                self.eat_word("class");
                self.error(SyntaxErrorKind::ClassDeclaration, tok.span)
            }
            "function" | "namespace" | "module" | "async" => {
                self.next();
                self.error(SyntaxErrorKind::UnsupportedDeclaration(tok.lexeme.to_string()), tok.span)
            }
            _ => self.unexpected("declaration"),
        }
    }

    /// Skip to the end of a broken item: a `;` or a closing `}` at depth zero,
    /// or the start of the next item.
    fn recover_item(&mut self, start: usize) {
        if self.pos == start {
            self.pos += 1;
        }
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            match tok.kind {
                TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RBrace if depth <= 1 => {
                    self.pos += 1;
                    self.eat(TokenKind::Semi);
                    return;
                }
                TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                TokenKind::Semi if depth == 0 => {
                    self.pos += 1;
                    return;
                }
                TokenKind::Ident if depth == 0 && ITEM_STARTS.iter().any(|w| *w == tok.lexeme) => return,
                _ => {}
            }
            self.pos += 1;
        }
    }

    //--------------------------------------------------------------------------
    // <Import> ::= "import" "type"? <Clause> "from" <Str> ";"?
    //            | "import" <Str> ";"?
    //--------------------------------------------------------------------------

    fn parse_import(&mut self) -> PResult<ImportDecl<'a>> {
        self.next();
        let mut decl = ImportDecl {
            source: String::new(),
            names: Vec::new(),
            namespace: None,
            default: None,
        };

        if let Some(tok) = self.peek().filter(|t| t.kind == TokenKind::Str) {
            self.next();
            decl.source = tok.string_value();
            self.eat(TokenKind::Semi);
            return Ok(decl);
        }

        // `import type { X }`, but not `import type from '...'`
        if self.at_word("type") && !self.peek_at(1).is_some_and(|t| t.is_word("from")) {
            self.next();
        }

        loop {
            if self.eat(TokenKind::Star) {
                if !self.eat_word("as") {
                    return self.unexpected("`as`");
                }
                decl.namespace = Some(self.expect_ident()?.name);
            } else if self.eat(TokenKind::LBrace) {
                while !self.at(TokenKind::RBrace) {
                    if self.at_word("type") && self.peek_at(1).is_some_and(|t| t.kind == TokenKind::Ident) {
                        self.next();
                    }
                    let imported = self.expect_ident()?.name;
                    let local = if self.eat_word("as") {
                        self.expect_ident()?.name
                    } else {
                        imported
                    };
                    decl.names.push((imported, local));
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RBrace)?;
            } else {
                decl.default = Some(self.expect_ident()?.name);
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        if !self.eat_word("from") {
            return self.unexpected("`from`");
        }
        decl.source = self.expect(TokenKind::Str)?.string_value();
        self.eat(TokenKind::Semi);
        Ok(decl)
    }

    //--------------------------------------------------------------------------
    // <Interface> ::= "interface" <Ident> <TypeParams>? ("extends" <Type> ("," <Type>)*)? <Members>
    // <Alias>     ::= "type" <Ident> <TypeParams>? "=" <Type> ";"?
    // <Enum>      ::= "enum" <Ident> "{" (<EnumMember> ","?)* "}"
    //--------------------------------------------------------------------------

    fn parse_interface(&mut self) -> PResult<InterfaceDecl<'a>> {
        self.next();
        let name = self.expect_ident()?;
        let type_params = self.parse_type_params()?;
        let mut extends = Vec::new();
        if self.eat_word("extends") {
            loop {
                extends.push(self.parse_type()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        let members = self.parse_members()?;
        Ok(InterfaceDecl {
            name,
            type_params,
            extends,
            members,
        })
    }

    fn parse_type_alias(&mut self) -> PResult<TypeAliasDecl<'a>> {
        self.next();
        let name = self.expect_ident()?;
        let type_params = self.parse_type_params()?;
        self.expect(TokenKind::Eq)?;
        let ty = self.parse_type()?;
        self.eat(TokenKind::Semi);
        Ok(TypeAliasDecl { name, type_params, ty })
    }

    fn parse_enum(&mut self) -> PResult<EnumDecl<'a>> {
        self.next();
        let name = self.expect_ident()?;
        self.expect(TokenKind::LBrace)?;
        let mut members = Vec::new();
        while !self.at(TokenKind::RBrace) {
            let member_name = self.parse_member_name()?;
            let init = if self.eat(TokenKind::Eq) {
                Some(self.parse_enum_init())
            } else {
                None
            };
            members.push(EnumMember {
                name: member_name,
                init,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(EnumDecl { name, members })
    }

    fn parse_enum_init(&mut self) -> EnumInit {
        let start = self.current_offset();
        match (self.peek(), self.peek_at(1)) {
            (Some(tok), _) if tok.kind == TokenKind::Str => {
                self.next();
                EnumInit::Str(tok.string_value(), tok.span)
            }
            (Some(tok), _) if tok.kind == TokenKind::Number => {
                self.next();
                match parse_number(tok.lexeme) {
                    Some(n) => EnumInit::Number(n, tok.span),
                    None => EnumInit::Other(tok.span),
                }
            }
            (Some(minus), Some(tok)) if minus.kind == TokenKind::Minus && tok.kind == TokenKind::Number => {
                self.pos += 2;
                let span = self.span_from(start);
                match parse_number(tok.lexeme) {
                    Some(n) => EnumInit::Number(-n, span),
                    None => EnumInit::Other(span),
                }
            }
            _ => {
                self.skip_until_separator(&[TokenKind::Comma, TokenKind::RBrace]);
                EnumInit::Other(self.span_from(start))
            }
        }
    }

    fn parse_type_params(&mut self) -> PResult<Vec<Ident<'a>>> {
        let mut params = Vec::new();
        if !self.eat(TokenKind::Lt) {
            return Ok(params);
        }
        while !self.at(TokenKind::Gt) {
            params.push(self.expect_ident()?);
            if self.eat_word("extends") {
                self.parse_type()?;
            }
            if self.eat(TokenKind::Eq) {
                self.parse_type()?;
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Gt)?;
        Ok(params)
    }

    //--------------------------------------------------------------------------
    // <Members> ::= "{" (<Member> (";" | ",")?)* "}"
    // <Member>  ::= <Name> "?"? ":" <Type>
    //             | <Name> "?"? <TypeParams>? "(" <Params> ")" ":" <Type>
    //--------------------------------------------------------------------------

    fn parse_members(&mut self) -> PResult<Vec<Member<'a>>> {
        self.expect(TokenKind::LBrace)?;
        let mut members = Vec::new();
        loop {
            match self.peek_kind() {
                None => return self.unexpected("`}`"),
                Some(TokenKind::RBrace) => {
                    self.next();
                    break;
                }
                Some(TokenKind::Semi) | Some(TokenKind::Comma) => {
                    self.next();
                }
                Some(_) => {
                    let start = self.pos;
                    match self.parse_member() {
                        Ok(member) => members.push(member),
                        Err(Reported) => self.recover_member(start),
                    }
                }
            }
        }
        Ok(members)
    }

    fn parse_member(&mut self) -> PResult<Member<'a>> {
        if let Some(tok) = self.peek().filter(|t| t.kind == TokenKind::LBracket) {
            return self.error(SyntaxErrorKind::ComputedMember, tok.span);
        }
        // `readonly` is a modifier unless it is the member's own name.
        if self.at_word("readonly")
            && self
                .peek_at(1)
                .is_some_and(|t| matches!(t.kind, TokenKind::Ident | TokenKind::Str | TokenKind::LBracket))
        {
            self.next();
            return self.parse_member();
        }

        let name = self.parse_member_name()?;
        let optional = self.eat(TokenKind::Question);

        if self.at(TokenKind::LParen) || self.at(TokenKind::Lt) {
            let type_params = self.parse_type_params()?;
            self.expect(TokenKind::LParen)?;
            let params = self.parse_params()?;
            self.expect(TokenKind::RParen)?;
            self.expect(TokenKind::Colon)?;
            let ret = self.parse_type()?;
            return Ok(Member::Method {
                name,
                optional,
                type_params,
                params,
                ret,
            });
        }

        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        Ok(Member::Property { name, optional, ty })
    }

    fn parse_member_name(&mut self) -> PResult<Ident<'a>> {
        match self.peek() {
            Some(tok) if tok.kind == TokenKind::Ident => {
                self.next();
                Ok(Ident {
                    name: tok.lexeme,
                    span: tok.span,
                })
            }
            Some(tok) if tok.kind == TokenKind::Str => {
                self.next();
                Ok(Ident {
                    name: &tok.lexeme[1..tok.lexeme.len() - 1],
                    span: tok.span,
                })
            }
            _ => self.unexpected("name"),
        }
    }

    fn parse_params(&mut self) -> PResult<Vec<Param<'a>>> {
        let mut params = Vec::new();
        while !self.at(TokenKind::RParen) {
            let name = self.expect_ident()?;
            let optional = self.eat(TokenKind::Question);
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type()?;
            params.push(Param { name, optional, ty });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    /// Skip the rest of a broken member, leaving a closing `}` in place.
    fn recover_member(&mut self, start: usize) {
        if self.pos == start {
            self.pos += 1;
        }
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            match tok.kind {
                TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RBrace if depth == 0 => return,
                TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                TokenKind::Semi | TokenKind::Comma if depth == 0 => {
                    self.pos += 1;
                    return;
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    fn skip_until_separator(&mut self, stops: &[TokenKind]) {
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            if depth == 0 && stops.contains(&tok.kind) {
                return;
            }
            match tok.kind {
                TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.pos += 1;
        }
    }

    //--------------------------------------------------------------------------
    // <Type>         ::= "|"? <Intersection> ("|" <Intersection>)*
    // <Intersection> ::= <Postfix> ("&" <Postfix>)*
    // <Postfix>      ::= <Primary> ("[" "]")*
    //--------------------------------------------------------------------------

    pub fn parse_type(&mut self) -> PResult<TypeExpr<'a>> {
        let start = self.current_offset();
        self.eat(TokenKind::Pipe);
        let first = self.parse_intersection()?;
        if !self.at(TokenKind::Pipe) {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.eat(TokenKind::Pipe) {
            members.push(self.parse_intersection()?);
        }
        Ok(TypeExpr {
            kind: TypeExprKind::Union(members),
            span: self.span_from(start),
        })
    }

    fn parse_intersection(&mut self) -> PResult<TypeExpr<'a>> {
        let start = self.current_offset();
        self.eat(TokenKind::Amp);
        let first = self.parse_postfix()?;
        if !self.at(TokenKind::Amp) {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.eat(TokenKind::Amp) {
            members.push(self.parse_postfix()?);
        }
        Ok(TypeExpr {
            kind: TypeExprKind::Intersection(members),
            span: self.span_from(start),
        })
    }

    fn parse_postfix(&mut self) -> PResult<TypeExpr<'a>> {
        let start = self.current_offset();
        let mut ty = self.parse_primary()?;
        while self.at(TokenKind::LBracket) && self.peek_at(1).is_some_and(|t| t.kind == TokenKind::RBracket) {
            self.pos += 2;
            ty = TypeExpr {
                kind: TypeExprKind::Array(Box::new(ty)),
                span: self.span_from(start),
            };
        }
        Ok(ty)
    }

    //--------------------------------------------------------------------------
    // <Primary> ::= <Path> ("<" <Type> ("," <Type>)* ">")?
    //             | "(" <Type> ")" | "(" <Params> ")" "=>" <Type>
    //             | "[" <Types> "]" | <Members> | <Literal>
    //--------------------------------------------------------------------------

    fn parse_primary(&mut self) -> PResult<TypeExpr<'a>> {
        let start = self.current_offset();
        let Some(tok) = self.peek() else {
            return self.unexpected("type");
        };

        match tok.kind {
            TokenKind::Ident if tok.lexeme == "new" => {
                self.next();
                self.parse_function_type(start)
            }
            TokenKind::Ident => {
                let mut path = vec![tok.lexeme];
                self.next();
                while self.eat(TokenKind::Dot) {
                    path.push(self.expect_ident()?.name);
                }
                let mut args = Vec::new();
                if self.eat(TokenKind::Lt) {
                    loop {
                        args.push(self.parse_type()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::Gt)?;
                }
                Ok(TypeExpr {
                    kind: TypeExprKind::Named { path, args },
                    span: self.span_from(start),
                })
            }
            TokenKind::Str | TokenKind::Number => {
                self.next();
                Ok(TypeExpr {
                    kind: TypeExprKind::Literal(tok.lexeme),
                    span: tok.span,
                })
            }
            TokenKind::Minus if self.peek_at(1).is_some_and(|t| t.kind == TokenKind::Number) => {
                self.pos += 2;
                Ok(TypeExpr {
                    kind: TypeExprKind::Literal(self.tokens[self.pos - 1].lexeme),
                    span: self.span_from(start),
                })
            }
            TokenKind::LBracket => {
                self.next();
                let mut elements = Vec::new();
                while !self.at(TokenKind::RBracket) {
                    // labelled elements: `[x: number, y: number]`
                    if self.peek().is_some_and(|t| t.kind == TokenKind::Ident)
                        && self.peek_at(1).is_some_and(|t| t.kind == TokenKind::Colon)
                    {
                        self.pos += 2;
                    }
                    elements.push(self.parse_type()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RBracket)?;
                Ok(TypeExpr {
                    kind: TypeExprKind::Tuple(elements),
                    span: self.span_from(start),
                })
            }
            TokenKind::LBrace => {
                let members = self.parse_members()?;
                Ok(TypeExpr {
                    kind: TypeExprKind::Object(members),
                    span: self.span_from(start),
                })
            }
            TokenKind::LParen if self.is_function_type() => self.parse_function_type(start),
            TokenKind::LParen => {
                self.next();
                let inner = self.parse_type()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Lt => self.parse_function_type(start),
            _ => self.unexpected("type"),
        }
    }

    /// At `(`: does the matching `)` precede `=>`?
    fn is_function_type(&self) -> bool {
        let mut depth = 0usize;
        for (i, tok) in self.tokens[self.pos..].iter().enumerate() {
            match tok.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self.peek_at(i + 1).is_some_and(|t| t.kind == TokenKind::Arrow);
                    }
                }
                _ => {}
            }
        }
        false
    }

    /// `<T>(a: A) => R`, already past any `new`. Parameters are skipped.
    fn parse_function_type(&mut self, start: usize) -> PResult<TypeExpr<'a>> {
        self.parse_type_params()?;
        self.expect(TokenKind::LParen)?;
        self.skip_until_separator(&[TokenKind::RParen]);
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Arrow)?;
        self.parse_type()?;
        Ok(TypeExpr {
            kind: TypeExprKind::Function,
            span: self.span_from(start),
        })
    }

    //--------------------------------------------------------------------------
    // <Registration> ::= <Path> ("<" <Type> ">")? "(" (<Arg> ("," <Arg>)*)? ")"
    //--------------------------------------------------------------------------

    fn parse_registration(&mut self) -> PResult<Registration<'a>> {
        let start = self.current_offset();
        let mut callee = vec![self.expect_ident()?.name];
        while self.eat(TokenKind::Dot) {
            callee.push(self.expect_ident()?.name);
        }
        let mut type_args = Vec::new();
        if self.eat(TokenKind::Lt) {
            loop {
                type_args.push(self.parse_type()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::Gt)?;
        }
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        while !self.at(TokenKind::RParen) {
            let arg_start = self.current_offset();
            match self.peek() {
                Some(tok)
                    if tok.kind == TokenKind::Str
                        && self
                            .peek_at(1)
                            .is_some_and(|t| matches!(t.kind, TokenKind::Comma | TokenKind::RParen)) =>
                {
                    self.next();
                    args.push(CallArg::Str(tok.string_value(), tok.span));
                }
                Some(_) => {
                    self.skip_until_separator(&[TokenKind::Comma, TokenKind::RParen]);
                    args.push(CallArg::Other(self.span_from(arg_start)));
                }
                None => return self.unexpected("`)`"),
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(Registration {
            callee,
            type_args,
            args,
            span: self.span_from(start),
        })
    }
}

/// Parse a numeric literal as written in a schema: decimal, exponent, hex, `_` separators.
pub fn parse_number(lexeme: &str) -> Option<f64> {
    let cleaned: String = lexeme.chars().filter(|c| *c != '_').collect();
    if let Some(hex) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok().map(|n| n as f64);
    }
    cleaned.parse().ok()
}
