use std::iter::Peekable;
use std::net::IpAddr;
use std::str::FromStr;

use crate::conf::types::*;
use crate::diagnostics::Diagnostics;

impl Config {
    /// Parse a string of `named.conf` data.
    ///
    /// This implementation only understands `zone`, `options`, `acl`,
    /// `view`, and `include`, and only some of the statements inside
    /// them.  Everything else, at any depth, is skipped and reported to
    /// `diagnostics` as `Irrelevant statement skipped: <keyword>`.
    ///
    /// `include` directives are parsed but not followed: callers
    /// wanting them inlined should do that to the text first.
    ///
    /// # Errors
    ///
    /// If a string, comment, or block is unterminated, or if the braces
    /// do not balance.
    pub fn deserialise(data: &str, diagnostics: &mut Diagnostics) -> Result<Self, Error> {
        let tokens = tokenise(data)?;
        let closing = match_braces(&tokens)?;
        let mut parser = Parser {
            tokens: &tokens,
            closing,
            diagnostics,
        };

        Ok(Config {
            statements: parser.parse_top_level(),
        })
    }
}

/// Recursive-descent parser over the token stream.
///
/// Every rule works on a half-open range of tokens, `pos..end`, where
/// `end` is the closing brace of the enclosing block (or the end of
/// input).  A rule returns `None` if it does not match, in which case
/// the statement is skipped by `skip_unknown` instead.
struct Parser<'a> {
    tokens: &'a [(Token, usize)],
    /// For every `{`, the position of the matching `}`.  Built once per
    /// parse, before any rule runs, so skipping a block is a constant
    /// time jump and a rule which fails never causes a rescan.
    closing: Vec<Option<usize>>,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> Parser<'a> {
    /// ```text
    /// zone ...;
    /// options ...;
    /// acl ...;
    /// view ...;
    /// include ...;
    /// <anything else>
    /// ```
    fn parse_top_level(&mut self) -> Vec<Statement> {
        let end = self.tokens.len();
        let mut statements = Vec::new();
        let mut pos = 0;

        while pos < end {
            if self.is(pos, end, &Token::Semi) {
                pos += 1;
                continue;
            }

            let parsed = match self.keyword(pos, end) {
                Some("zone") => self
                    .zone(pos, end)
                    .map(|(zone, next)| (Statement::Zone(zone), next)),
                Some("options") => self
                    .options(pos, end)
                    .map(|(options, next)| (Statement::Options(options), next)),
                Some("acl") => self
                    .acl(pos, end)
                    .map(|(acl, next)| (Statement::Acl(acl), next)),
                Some("view") => self
                    .view(pos, end)
                    .map(|(view, next)| (Statement::View(view), next)),
                Some("include") => self
                    .include(pos, end)
                    .map(|(include, next)| (Statement::Include(include), next)),
                _ => None,
            };

            pos = if let Some((statement, next)) = parsed {
                statements.push(statement);
                next
            } else {
                let (keyword, next) = self.skip_unknown(pos, end);
                statements.push(Statement::Unknown(UnknownStatement { keyword }));
                next
            };
        }

        statements
    }

    /// Parse the statements in a block body, `start..end`, where `end`
    /// is the closing brace.  `recognise` tries a single statement,
    /// given its keyword, and returns the position after it.
    fn parse_body<F>(&mut self, start: usize, end: usize, mut recognise: F)
    where
        F: FnMut(&mut Self, &'a str, usize, usize) -> Option<usize>,
    {
        let mut pos = start;
        while pos < end {
            if self.is(pos, end, &Token::Semi) {
                pos += 1;
                continue;
            }

            let recognised = match self.keyword(pos, end) {
                Some(keyword) => recognise(self, keyword, pos, end),
                None => None,
            };

            pos = match recognised {
                Some(next) => next,
                None => self.skip_unknown(pos, end).1,
            };
        }
    }

    /// ```text
    /// zone <name> [<class>] { <statement>; ... };
    /// ```
    fn zone(&mut self, pos: usize, end: usize) -> Option<(ZoneBlock, usize)> {
        let name = self.value(pos + 1, end)?;
        let (class, open) = match self.value(pos + 2, end) {
            Some(class) => (Some(class.to_string()), pos + 3),
            None => (None, pos + 2),
        };
        let close = self.terminated_block(open, end)?;

        let mut zone = ZoneBlock {
            name: name.to_string(),
            class,
            ..ZoneBlock::default()
        };
        self.parse_body(open + 1, close, |parser, keyword, pos, end| {
            parser.zone_statement(&mut zone, keyword, pos, end)
        });

        Some((zone, close + 2))
    }

    fn zone_statement(
        &self,
        zone: &mut ZoneBlock,
        keyword: &str,
        pos: usize,
        end: usize,
    ) -> Option<usize> {
        match keyword {
            "type" => {
                let (value, next) = self.keyword_value(pos, end)?;
                zone.zone_type = Some(value);
                Some(next)
            }
            "file" => {
                let (value, next) = self.keyword_value(pos, end)?;
                zone.file = Some(value);
                Some(next)
            }
            "masters" | "primaries" => {
                let list = self.address_list(pos + 1, end)?;
                zone.masters = list.addresses;
                Some(list.next)
            }
            "forwarders" => {
                let list = self.address_list(pos + 1, end)?;
                zone.forwarders = list.addresses;
                Some(list.next)
            }
            "also-notify" => {
                let list = self.address_list(pos + 1, end)?;
                zone.also_notify = list.addresses;
                Some(list.next)
            }
            "allow-transfer" => {
                let list = self.address_list(pos + 1, end)?;
                zone.allow_transfer = list.addresses;
                Some(list.next)
            }
            _ => None,
        }
    }

    /// ```text
    /// options { <statement>; ... };
    /// ```
    fn options(&mut self, pos: usize, end: usize) -> Option<(OptionsBlock, usize)> {
        let close = self.terminated_block(pos + 1, end)?;

        let mut options = OptionsBlock::default();
        self.parse_body(pos + 2, close, |parser, keyword, pos, end| {
            parser.options_statement(&mut options, keyword, pos, end)
        });

        Some((options, close + 2))
    }

    fn options_statement(
        &self,
        options: &mut OptionsBlock,
        keyword: &str,
        pos: usize,
        end: usize,
    ) -> Option<usize> {
        let list = match keyword {
            "forwarders" | "also-notify" | "allow-transfer" | "listen-on" | "listen-on-v6" => {
                self.address_list(pos + 1, end)?
            }
            _ => return None,
        };

        match keyword {
            "forwarders" => options.forwarders = list.addresses,
            "also-notify" => options.also_notify = list.addresses,
            "allow-transfer" => options.allow_transfer = list.addresses,
            "listen-on" => options.listen_on.push(ListenOn {
                port: list.port,
                addresses: list.addresses,
            }),
            _ => options.listen_on_v6.push(ListenOn {
                port: list.port,
                addresses: list.addresses,
            }),
        }

        Some(list.next)
    }

    /// ```text
    /// acl <name> { <entry>; ... };
    /// ```
    fn acl(&self, pos: usize, end: usize) -> Option<(AclBlock, usize)> {
        let name = self.value(pos + 1, end)?;
        let close = self.terminated_block(pos + 2, end)?;
        let entries = self.list_elements(pos + 3, close, ElementForm::Literal)?;

        Some((
            AclBlock {
                name: name.to_string(),
                entries,
            },
            close + 2,
        ))
    }

    /// ```text
    /// view <name> [<class>] { <statement>; ... };
    /// ```
    ///
    /// Views do not nest, but may contain zones.
    fn view(&mut self, pos: usize, end: usize) -> Option<(ViewBlock, usize)> {
        let name = self.value(pos + 1, end)?;
        let (class, open) = match self.value(pos + 2, end) {
            Some(class) => (Some(class.to_string()), pos + 3),
            None => (None, pos + 2),
        };
        let close = self.terminated_block(open, end)?;

        let mut view = ViewBlock {
            name: name.to_string(),
            class,
            ..ViewBlock::default()
        };
        self.parse_body(open + 1, close, |parser, keyword, pos, end| {
            parser.view_statement(&mut view, keyword, pos, end)
        });

        Some((view, close + 2))
    }

    fn view_statement(
        &mut self,
        view: &mut ViewBlock,
        keyword: &str,
        pos: usize,
        end: usize,
    ) -> Option<usize> {
        match keyword {
            "zone" => {
                let (zone, next) = self.zone(pos, end)?;
                view.zones.push(zone);
                Some(next)
            }
            "also-notify" => {
                let list = self.address_list(pos + 1, end)?;
                view.also_notify = list.addresses;
                Some(list.next)
            }
            "allow-transfer" => {
                let list = self.address_list(pos + 1, end)?;
                view.allow_transfer = list.addresses;
                Some(list.next)
            }
            "forwarders" => {
                let list = self.address_list(pos + 1, end)?;
                view.forwarders = list.addresses;
                Some(list.next)
            }
            "server" => {
                let (address, next) = self.server(pos, end)?;
                view.servers.push(address);
                Some(next)
            }
            _ => None,
        }
    }

    /// ```text
    /// server <address> [{ ... }];
    /// ```
    ///
    /// The body, if there is one, is discarded.
    fn server(&self, pos: usize, end: usize) -> Option<(String, usize)> {
        let address = self.value(pos + 1, end).filter(|a| is_address(a))?;

        if self.is(pos + 2, end, &Token::Semi) {
            return Some((address.to_string(), pos + 3));
        }

        let close = self.terminated_block(pos + 2, end)?;
        Some((address.to_string(), close + 2))
    }

    /// ```text
    /// include <path>;
    /// ```
    fn include(&self, pos: usize, end: usize) -> Option<(IncludeDirective, usize)> {
        let (path, next) = self.keyword_value(pos, end)?;
        Some((IncludeDirective { path }, next))
    }

    /// ```text
    /// <keyword> <value>;
    /// ```
    fn keyword_value(&self, pos: usize, end: usize) -> Option<(String, usize)> {
        let value = self.value(pos + 1, end)?;
        if self.is(pos + 2, end, &Token::Semi) {
            Some((value.to_string(), pos + 3))
        } else {
            None
        }
    }

    /// ```text
    /// [port <port>] [dscp <n>] { <address> [port <port>] [key <key>]; ... };
    /// ```
    ///
    /// Starts after the statement keyword.  Only the address of each
    /// element is kept.
    fn address_list(&self, mut pos: usize, end: usize) -> Option<AddressList> {
        let mut port = None;
        while let Some(modifier @ ("port" | "dscp" | "tls" | "http")) = self.keyword(pos, end) {
            let value = self.value(pos + 1, end)?;
            if modifier == "port" {
                port = Some(value.to_string());
            }
            pos += 2;
        }

        let close = self.terminated_block(pos, end)?;
        let addresses = self.list_elements(pos + 1, close, ElementForm::Address)?;

        Some(AddressList {
            port,
            addresses,
            next: close + 2,
        })
    }

    /// The `;`-terminated elements of a list body, `start..close`.
    /// Nested `{ ... };` groups are flattened into the result.
    ///
    /// In address lists, `key <name>;` and `tls <name>;` elements name
    /// no address and are dropped.
    fn list_elements(&self, start: usize, close: usize, form: ElementForm) -> Option<Vec<String>> {
        let mut elements = Vec::new();
        let mut pos = start;
        // closing `}` of each enclosing group, innermost last
        let mut groups = vec![close];

        while let Some(&group_end) = groups.last() {
            if pos >= group_end {
                groups.pop();
                pos = group_end + 2;
                continue;
            }

            match self.token(pos) {
                Some(Token::Semi) => pos += 1,
                Some(Token::LBrace) => {
                    groups.push(self.terminated_block(pos, group_end)?);
                    pos += 1;
                }
                _ => {
                    let mut words = Vec::new();
                    while let Some(word) = self.value(pos, group_end) {
                        words.push(word);
                        pos += 1;
                    }
                    if words.is_empty() || !self.is(pos, group_end, &Token::Semi) {
                        return None;
                    }
                    pos += 1;

                    match form {
                        ElementForm::Address => {
                            if !matches!(words[0].to_ascii_lowercase().as_str(), "key" | "tls") {
                                elements.push(words[0].to_string());
                            }
                        }
                        ElementForm::Literal => elements.push(words.join(" ")),
                    }
                }
            }
        }

        Some(elements)
    }

    /// Skip a statement which is not understood, reporting it.
    ///
    /// ```text
    /// <keyword> <token>* ;
    /// <keyword> <token>* { ... } [;]
    /// ```
    ///
    /// A statement cut short by the end of its block, or of the input,
    /// ends there.
    fn skip_unknown(&mut self, pos: usize, end: usize) -> (String, usize) {
        let keyword = match self.token(pos) {
            Some(Token::Word(s) | Token::Quoted(s) | Token::Other(s)) => s.clone(),
            Some(Token::LBrace) => "{".to_string(),
            Some(Token::RBrace) => "}".to_string(),
            Some(Token::Semi) => ";".to_string(),
            None => String::new(),
        };
        self.diagnostics
            .warn(format!("Irrelevant statement skipped: {keyword}"));

        let mut i = pos;
        while i < end {
            match self.token(i) {
                Some(Token::Semi) => return (keyword, i + 1),
                Some(Token::LBrace) => {
                    let close = self.block_end(i).unwrap_or(end);
                    let next = if self.is(close + 1, end, &Token::Semi) {
                        close + 2
                    } else {
                        close + 1
                    };
                    return (keyword, next);
                }
                _ => i += 1,
            }
        }

        (keyword, end)
    }

    /// If there is a `{` at `open` whose block is followed by a `;`,
    /// the position of its `}`.
    fn terminated_block(&self, open: usize, end: usize) -> Option<usize> {
        if !self.is(open, end, &Token::LBrace) {
            return None;
        }
        let close = self.block_end(open)?;
        if self.is(close + 1, end, &Token::Semi) {
            Some(close)
        } else {
            None
        }
    }

    fn block_end(&self, open: usize) -> Option<usize> {
        self.closing.get(open).copied().flatten()
    }

    fn token(&self, pos: usize) -> Option<&'a Token> {
        let tokens: &'a [(Token, usize)] = self.tokens;
        tokens.get(pos).map(|(token, _)| token)
    }

    fn is(&self, pos: usize, end: usize, expected: &Token) -> bool {
        pos < end && self.token(pos) == Some(expected)
    }

    /// A bare word at `pos`, if there is one before `end`.
    fn keyword(&self, pos: usize, end: usize) -> Option<&'a str> {
        if pos >= end {
            return None;
        }
        match self.token(pos) {
            Some(Token::Word(word)) => Some(word.as_str()),
            _ => None,
        }
    }

    /// A bare word or quoted string at `pos`, if there is one before
    /// `end`.
    fn value(&self, pos: usize, end: usize) -> Option<&'a str> {
        if pos >= end {
            return None;
        }
        match self.token(pos) {
            Some(Token::Word(value) | Token::Quoted(value)) => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Result of `Parser::address_list`.
struct AddressList {
    port: Option<String>,
    addresses: Vec<String>,
    next: usize,
}

/// How to turn the words of a list element into a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementForm {
    /// Just the first word, dropping `port`/`key` modifiers.  Elements
    /// which are only a `key` or `tls` reference are dropped whole.
    Address,
    /// All the words, space-separated.
    Literal,
}

/// An IPv4 or IPv6 address, optionally with a prefix length.
fn is_address(value: &str) -> bool {
    let address = value.split_once('/').map_or(value, |(address, _)| address);
    IpAddr::from_str(address).is_ok()
}

/// Find the matching `}` of every `{`.
///
/// # Errors
///
/// If there is a `}` with no `{`, or a `{` with no `}`.
fn match_braces(tokens: &[(Token, usize)]) -> Result<Vec<Option<usize>>, Error> {
    let mut closing = vec![None; tokens.len()];
    let mut open = Vec::new();

    for (i, (token, line)) in tokens.iter().enumerate() {
        match token {
            Token::LBrace => open.push(i),
            Token::RBrace => match open.pop() {
                Some(o) => closing[o] = Some(i),
                None => return Err(Error::UnbalancedBrace { line: *line }),
            },
            _ => (),
        }
    }

    if let Some(&o) = open.first() {
        return Err(Error::UnterminatedBlock { line: tokens[o].1 });
    }

    Ok(closing)
}

/// Split the input into tokens, each paired with the line it starts
/// on.  Comments (`/* */`, `//`, and `#`) and whitespace separate
/// tokens and are otherwise dropped.
///
/// # Errors
///
/// If a quoted string or a block comment is not terminated.
fn tokenise(data: &str) -> Result<Vec<(Token, usize)>, Error> {
    let mut tokeniser = Tokeniser {
        stream: data.chars().peekable(),
        tokens: Vec::new(),
        token_string: String::new(),
        token_line: 1,
        line: 1,
    };
    let mut state = State::Initial;

    while let Some(c) = tokeniser.stream.next() {
        state = match (state, c) {
            (State::Initial, c) => tokeniser.start_token(c),

            (State::Bare, c) if is_bare_char(c) => {
                tokeniser.token_string.push(c);
                State::Bare
            }
            (State::Bare, c) => {
                tokeniser.finish_word();
                tokeniser.start_token(c)
            }

            (State::Other, c) if is_other_char(c) => {
                tokeniser.token_string.push(c);
                State::Other
            }
            (State::Other, c) => {
                tokeniser.finish_other();
                tokeniser.start_token(c)
            }

            (State::Quoted { quote }, c) if c == quote => {
                let string = std::mem::take(&mut tokeniser.token_string);
                tokeniser.push(Token::Quoted(string));
                State::Initial
            }
            (State::Quoted { quote }, '\\') => {
                if let Some(escaped) = tokeniser.stream.next() {
                    if escaped == '\n' {
                        tokeniser.line += 1;
                    }
                    tokeniser.token_string.push(escaped);
                }
                State::Quoted { quote }
            }
            (State::Quoted { quote }, c) => {
                tokeniser.token_string.push(c);
                State::Quoted { quote }
            }

            (State::LineComment, '\n') => State::Initial,
            (State::LineComment, _) => State::LineComment,

            (State::BlockComment, '*') if tokeniser.stream.peek() == Some(&'/') => {
                tokeniser.stream.next();
                State::Initial
            }
            (State::BlockComment, _) => State::BlockComment,
        };

        if c == '\n' {
            tokeniser.line += 1;
        }
    }

    match state {
        State::Bare => tokeniser.finish_word(),
        State::Other => tokeniser.finish_other(),
        State::Quoted { .. } => {
            return Err(Error::UnterminatedString {
                line: tokeniser.token_line,
            })
        }
        State::BlockComment => {
            return Err(Error::UnterminatedComment {
                line: tokeniser.token_line,
            })
        }
        State::Initial | State::LineComment => (),
    }

    Ok(tokeniser.tokens)
}

struct Tokeniser<I: Iterator<Item = char>> {
    stream: Peekable<I>,
    tokens: Vec<(Token, usize)>,
    token_string: String,
    token_line: usize,
    line: usize,
}

impl<I: Iterator<Item = char>> Tokeniser<I> {
    /// Handle the first character of a new token (or of whitespace or
    /// a comment).
    fn start_token(&mut self, c: char) -> State {
        self.token_line = self.line;
        match c {
            '{' => {
                self.push(Token::LBrace);
                State::Initial
            }
            '}' => {
                self.push(Token::RBrace);
                State::Initial
            }
            ';' => {
                self.push(Token::Semi);
                State::Initial
            }
            '"' | '\'' => State::Quoted { quote: c },
            '#' => State::LineComment,
            '/' if self.stream.peek() == Some(&'/') => {
                self.stream.next();
                State::LineComment
            }
            '/' if self.stream.peek() == Some(&'*') => {
                self.stream.next();
                State::BlockComment
            }
            c if c.is_whitespace() => State::Initial,
            c if is_bare_char(c) => {
                self.token_string.push(c);
                State::Bare
            }
            c => {
                self.token_string.push(c);
                State::Other
            }
        }
    }

    fn finish_word(&mut self) {
        let word = std::mem::take(&mut self.token_string);
        self.push(Token::Word(word));
    }

    fn finish_other(&mut self) {
        let other = std::mem::take(&mut self.token_string);
        self.push(Token::Other(other));
    }

    fn push(&mut self, token: Token) {
        self.tokens.push((token, self.token_line));
    }
}

/// `[A-Za-z0-9_./:\-!]`
fn is_bare_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/' | ':' | '-' | '!')
}

/// Anything which cannot start or continue some other kind of token.
fn is_other_char(c: char) -> bool {
    !c.is_whitespace() && !is_bare_char(c) && !matches!(c, '{' | '}' | ';' | '"' | '\'' | '#')
}

/// States the tokeniser can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Bare,
    Other,
    Quoted { quote: char },
    LineComment,
    BlockComment,
}

/// A token.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// `[A-Za-z0-9_./:\-!]+`: keywords, addresses, CIDRs, ACL names.
    Word(String),
    /// A single- or double-quoted string, without the quotes.
    Quoted(String),
    /// A run of other characters, such as `90%`'s `%`.  Never a value,
    /// so never matched by a recognised rule.
    Other(String),
    LBrace,
    RBrace,
    Semi,
}

/// An error that can occur reading a `named.conf`.  All of these are
/// structural: anything else is skipped with a diagnostic instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    UnterminatedString { line: usize },
    UnterminatedComment { line: usize },
    UnbalancedBrace { line: usize },
    UnterminatedBlock { line: usize },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::UnterminatedString { line } => {
                write!(f, "unterminated string starting on line {line}")
            }
            Error::UnterminatedComment { line } => {
                write!(f, "unterminated comment starting on line {line}")
            }
            Error::UnbalancedBrace { line } => write!(f, "unexpected '}}' on line {line}"),
            Error::UnterminatedBlock { line } => {
                write!(f, "block opened on line {line} is never closed")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}
